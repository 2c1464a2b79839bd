// HostFs backed by a directory on the host machine

use super::fd_table::{FdTable, FileDescriptor, OpenFlags};
use super::path::{base_name, normalize_path};
use super::HostFs;
use crate::errno::{Errno, HostError, HostResult};
use crate::stat::{FileInfo, FileMode};
use std::fs::{self, OpenOptions, Permissions};
use std::io::{self, Read, Write};
use std::os::unix::fs::{DirBuilderExt, FileExt, OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Exposes the tree under `root` as the guest's `/`.
#[derive(Debug)]
pub struct OsFs {
    root: PathBuf,
    read_only: bool,
    fd_table: Mutex<FdTable>,
}

impl OsFs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), read_only: false, fd_table: Mutex::new(FdTable::new()) }
    }

    /// Reject every call that would modify the tree with `EROFS`.
    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Number of files the guest currently has open.
    pub fn open_files(&self) -> usize {
        self.fds().len()
    }

    fn fds(&self) -> MutexGuard<'_, FdTable> {
        self.fd_table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Map a guest path to its host path and make sure the host path stays
    /// under the root once symlinks are resolved. With `follow` the final
    /// component is resolved too; otherwise only its parent directory is.
    fn resolve(&self, op: &'static str, path: &str, follow: bool) -> HostResult<(String, PathBuf)> {
        let normalized = normalize_path(path)
            .map_err(|e| HostError::path(op, path, e.unwrap_once().clone()))?;
        let host = self.root.join(normalized.trim_start_matches('/'));
        if normalized != "/" {
            self.confine(op, path, &host, follow)?;
        }
        Ok((normalized, host))
    }

    fn confine(&self, op: &'static str, path: &str, host: &Path, follow: bool) -> HostResult<()> {
        let wrap = |e: io::Error| HostError::path(op, path, e);
        let root = fs::canonicalize(&self.root).map_err(wrap)?;

        let real = match fs::canonicalize(host) {
            Ok(real) if follow => real,
            // Only a name that does not exist at all falls through to its
            // parent; a dangling symlink is never followed.
            Err(e)
                if follow
                    && (e.kind() != io::ErrorKind::NotFound
                        || fs::symlink_metadata(host).is_ok()) =>
            {
                return Err(wrap(e));
            }
            _ => {
                let (Some(parent), Some(name)) = (host.parent(), host.file_name()) else {
                    return Err(HostError::path(op, path, Errno::EINVAL));
                };
                fs::canonicalize(parent).map_err(wrap)?.join(name)
            }
        };

        if !real.starts_with(&root) {
            tracing::warn!(op, path, host = %real.display(), "path escapes filesystem root");
            return Err(HostError::path(op, path, Errno::EACCES));
        }
        Ok(())
    }

    fn check_writable(&self, op: &'static str, path: &str) -> HostResult<()> {
        if self.read_only {
            return Err(HostError::path(op, path, Errno::EROFS));
        }
        Ok(())
    }

    fn info(&self, op: &'static str, path: &str, follow: bool) -> HostResult<FileInfo> {
        let (normalized, host) = self.resolve(op, path, follow)?;
        let metadata = if follow { fs::metadata(&host) } else { fs::symlink_metadata(&host) };
        let metadata = metadata.map_err(|e| HostError::path(op, path, e))?;
        Ok(FileInfo::from_metadata(base_name(&normalized), &metadata))
    }
}

impl HostFs for OsFs {
    fn stat(&self, path: &str) -> HostResult<FileInfo> {
        self.info("stat", path, true)
    }

    fn lstat(&self, path: &str) -> HostResult<FileInfo> {
        self.info("lstat", path, false)
    }

    fn chmod(&self, path: &str, mode: FileMode) -> HostResult<()> {
        self.check_writable("chmod", path)?;
        let (_, host) = self.resolve("chmod", path, true)?;
        let mut bits = mode.perm();
        if mode.contains(FileMode::SETUID) {
            bits |= libc::S_ISUID as u32;
        }
        if mode.contains(FileMode::SETGID) {
            bits |= libc::S_ISGID as u32;
        }
        if mode.contains(FileMode::STICKY) {
            bits |= libc::S_ISVTX as u32;
        }
        fs::set_permissions(&host, Permissions::from_mode(bits))
            .map_err(|e| HostError::path("chmod", path, e))
    }

    fn fstat(&self, fd: u32) -> HostResult<FileInfo> {
        let fds = self.fds();
        let descriptor = fds.get(fd)?;
        let metadata =
            descriptor.file.metadata().map_err(|e| HostError::path("fstat", &descriptor.path, e))?;
        Ok(FileInfo::from_metadata(base_name(&descriptor.path), &metadata))
    }

    fn open(&self, path: &str, flags: OpenFlags, perm: FileMode) -> HostResult<u32> {
        if flags.mutates() {
            self.check_writable("open", path)?;
        }
        let (normalized, host) = self.resolve("open", path, true)?;

        let mut options = OpenOptions::new();
        options.read(flags.read).write(flags.write).append(flags.append).mode(perm.perm());
        if flags.write || flags.append {
            options.truncate(flags.truncate);
            if flags.create && flags.exclusive {
                options.create_new(true);
            } else {
                options.create(flags.create);
            }
        } else {
            // OpenOptions refuses creation flags without write access, open(2) does not.
            let mut custom = 0;
            if flags.create {
                custom |= libc::O_CREAT;
                if flags.exclusive {
                    custom |= libc::O_EXCL;
                }
            }
            if flags.truncate {
                custom |= libc::O_TRUNC;
            }
            options.custom_flags(custom);
        }

        let file = options.open(&host).map_err(|e| HostError::path("open", path, e))?;
        let fd = self
            .fds()
            .allocate(FileDescriptor::new(normalized, flags, file))
            .map_err(|e| HostError::path("open", path, e))?;
        tracing::debug!(fd, path, "opened host file");
        Ok(fd)
    }

    fn close(&self, fd: u32) -> HostResult<()> {
        let descriptor = self.fds().close(fd)?;
        tracing::debug!(fd, path = %descriptor.path, "closed host file");
        Ok(())
    }

    fn read(&self, fd: u32, buf: &mut [u8], position: Option<u64>) -> HostResult<usize> {
        if fd == FdTable::STDIN {
            return io::stdin().read(buf).map_err(HostError::from);
        }

        let mut fds = self.fds();
        let descriptor = fds.get_mut(fd)?;
        if !descriptor.can_read() {
            return Err(HostError::path("read", &descriptor.path, Errno::EBADF));
        }
        let result = match position {
            Some(offset) => descriptor.file.read_at(buf, offset),
            None => descriptor.file.read(buf),
        };
        result.map_err(|e| HostError::path("read", &descriptor.path, e))
    }

    fn write(&self, fd: u32, data: &[u8], position: Option<u64>) -> HostResult<usize> {
        match fd {
            FdTable::STDOUT => return write_stdio(io::stdout().lock(), data),
            FdTable::STDERR => return write_stdio(io::stderr().lock(), data),
            _ => {}
        }

        let mut fds = self.fds();
        let descriptor = fds.get_mut(fd)?;
        if !descriptor.can_write() {
            return Err(HostError::path("write", &descriptor.path, Errno::EBADF));
        }
        let result = match position {
            Some(offset) if !descriptor.flags.append => {
                descriptor.file.write_all_at(data, offset).map(|()| data.len())
            }
            _ => descriptor.file.write_all(data).map(|()| data.len()),
        };
        result.map_err(|e| HostError::path("write", &descriptor.path, e))
    }

    fn readdir(&self, path: &str) -> HostResult<Vec<String>> {
        let (_, host) = self.resolve("readdir", path, true)?;
        let entries = fs::read_dir(&host).map_err(|e| HostError::path("readdir", path, e))?;

        let mut names = entries
            .map(|entry| entry.map(|e| e.file_name().to_string_lossy().into_owned()))
            .collect::<io::Result<Vec<_>>>()
            .map_err(|e| HostError::path("readdir", path, e))?;
        names.sort();
        Ok(names)
    }

    fn mkdir(&self, path: &str, perm: FileMode) -> HostResult<()> {
        self.check_writable("mkdir", path)?;
        let (_, host) = self.resolve("mkdir", path, false)?;
        fs::DirBuilder::new()
            .mode(perm.perm())
            .create(&host)
            .map_err(|e| HostError::path("mkdir", path, e))
    }

    fn rmdir(&self, path: &str) -> HostResult<()> {
        self.check_writable("rmdir", path)?;
        let (_, host) = self.resolve("rmdir", path, false)?;
        fs::remove_dir(&host).map_err(|e| HostError::path("rmdir", path, e))
    }

    fn unlink(&self, path: &str) -> HostResult<()> {
        self.check_writable("unlink", path)?;
        let (_, host) = self.resolve("unlink", path, false)?;
        fs::remove_file(&host).map_err(|e| HostError::path("unlink", path, e))
    }
}

fn write_stdio(mut out: impl Write, data: &[u8]) -> HostResult<usize> {
    out.write_all(data)?;
    out.flush()?;
    Ok(data.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::fd_table::{O_CREAT, O_EXCL, O_RDONLY, O_TRUNC, O_WRONLY};
    use std::os::unix::fs::symlink;
    use tempfile::TempDir;

    fn flags(bits: u32) -> OpenFlags {
        OpenFlags::from_bits(bits).unwrap()
    }

    fn setup() -> (TempDir, OsFs) {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("hello.txt"), b"hello world").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        let os = OsFs::new(dir.path());
        (dir, os)
    }

    #[test]
    fn test_stat_file() {
        let (_dir, fs) = setup();
        let info = fs.stat("/hello.txt").unwrap();
        assert_eq!(info.name, "hello.txt");
        assert_eq!(info.size, 11);
        assert!(info.mode.is_regular());
    }

    #[test]
    fn test_stat_root_is_directory() {
        let (_dir, fs) = setup();
        let info = fs.stat("/").unwrap();
        assert_eq!(info.name, "/");
        assert!(info.is_dir());
    }

    #[test]
    fn test_stat_missing_is_wrapped_not_found() {
        let (_dir, fs) = setup();
        let err = fs.stat("/missing").unwrap_err();
        assert!(matches!(err, HostError::Path { op: "stat", .. }));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_paths_cannot_escape_root() {
        let (dir, fs) = setup();
        let info = fs.stat("/../../hello.txt").unwrap();
        assert_eq!(info.size, 11);
        assert_eq!(fs.root(), dir.path());
    }

    #[test]
    fn test_lstat_does_not_follow_symlinks() {
        let (dir, fs) = setup();
        symlink("hello.txt", dir.path().join("link")).unwrap();
        assert!(fs.lstat("/link").unwrap().mode.is_symlink());
        assert!(fs.stat("/link").unwrap().mode.is_regular());
    }

    #[test]
    fn test_chmod() {
        let (dir, fs) = setup();
        fs.chmod("/hello.txt", FileMode::from_bits(0o600)).unwrap();
        let mode = std::fs::metadata(dir.path().join("hello.txt")).unwrap().permissions().mode();
        assert_eq!(mode & 0o7777, 0o600);
        assert_eq!(fs.stat("/hello.txt").unwrap().mode.perm(), 0o600);
    }

    #[test]
    fn test_chmod_missing() {
        let (_dir, fs) = setup();
        assert!(fs.chmod("/nope", FileMode::from_bits(0o644)).unwrap_err().is_not_found());
    }

    #[test]
    fn test_open_read_close() {
        let (_dir, fs) = setup();
        let fd = fs.open("/hello.txt", flags(O_RDONLY), FileMode::default()).unwrap();
        assert!(fd >= 3);

        let mut buf = [0u8; 5];
        assert_eq!(fs.read(fd, &mut buf, None).unwrap(), 5);
        assert_eq!(&buf, b"hello");
        assert_eq!(fs.read(fd, &mut buf, Some(6)).unwrap(), 5);
        assert_eq!(&buf, b"world");
        // positional reads leave the cursor alone
        assert_eq!(fs.read(fd, &mut buf, None).unwrap(), 5);
        assert_eq!(&buf, b" worl");

        assert_eq!(fs.fstat(fd).unwrap().size, 11);
        fs.close(fd).unwrap();
        assert_eq!(fs.open_files(), 0);
        assert_eq!(fs.close(fd).unwrap_err(), HostError::Errno(Errno::EBADF));
    }

    #[test]
    fn test_open_create_write() {
        let (dir, fs) = setup();
        let fd = fs.open("/new.txt", flags(O_WRONLY | O_CREAT), FileMode::from_bits(0o644)).unwrap();
        assert_eq!(fs.write(fd, b"abc", None).unwrap(), 3);
        assert_eq!(fs.write(fd, b"Z", Some(0)).unwrap(), 1);
        fs.close(fd).unwrap();
        assert_eq!(std::fs::read(dir.path().join("new.txt")).unwrap(), b"Zbc");
    }

    #[test]
    fn test_open_exclusive_existing() {
        let (_dir, fs) = setup();
        let err = fs
            .open("/hello.txt", flags(O_WRONLY | O_CREAT | O_EXCL), FileMode::from_bits(0o644))
            .unwrap_err();
        assert_eq!(err.unwrap_once(), &HostError::Errno(Errno::EEXIST));
    }

    #[test]
    fn test_read_on_write_only_fd() {
        let (_dir, fs) = setup();
        let fd = fs.open("/hello.txt", flags(O_WRONLY), FileMode::default()).unwrap();
        let err = fs.read(fd, &mut [0; 1], None).unwrap_err();
        assert_eq!(err.unwrap_once(), &HostError::Errno(Errno::EBADF));
    }

    #[test]
    fn test_bad_fd() {
        let (_dir, fs) = setup();
        assert_eq!(fs.read(99, &mut [0; 1], None).unwrap_err(), HostError::Errno(Errno::EBADF));
        assert_eq!(fs.fstat(99).unwrap_err(), HostError::Errno(Errno::EBADF));
    }

    #[test]
    fn test_readdir_sorted() {
        let (_dir, fs) = setup();
        assert_eq!(fs.readdir("/").unwrap(), vec!["hello.txt", "sub"]);
        assert!(fs.readdir("/sub").unwrap().is_empty());
    }

    #[test]
    fn test_mkdir_rmdir_unlink() {
        let (dir, fs) = setup();
        fs.mkdir("/made", FileMode::from_bits(0o755)).unwrap();
        assert!(dir.path().join("made").is_dir());
        fs.rmdir("/made").unwrap();
        assert!(!dir.path().join("made").exists());

        fs.unlink("/hello.txt").unwrap();
        assert!(fs.stat("/hello.txt").unwrap_err().is_not_found());
    }

    #[test]
    fn test_rmdir_not_empty() {
        let (dir, fs) = setup();
        std::fs::write(dir.path().join("sub/f"), b"").unwrap();
        let err = fs.rmdir("/sub").unwrap_err();
        assert_eq!(err.unwrap_once(), &HostError::Errno(Errno::ENOTEMPTY));
    }

    #[test]
    fn test_read_only_rejects_mutation() {
        let (_dir, fs) = setup();
        let fs = fs.read_only(true);
        assert!(fs.is_read_only());

        let erofs = HostError::Errno(Errno::EROFS);
        assert_eq!(fs.chmod("/hello.txt", FileMode::PERM).unwrap_err().unwrap_once(), &erofs);
        assert_eq!(fs.mkdir("/d", FileMode::PERM).unwrap_err().unwrap_once(), &erofs);
        assert_eq!(fs.unlink("/hello.txt").unwrap_err().unwrap_once(), &erofs);
        assert_eq!(
            fs.open("/x", flags(O_WRONLY | O_CREAT), FileMode::PERM).unwrap_err().unwrap_once(),
            &erofs
        );

        let fd = fs.open("/hello.txt", flags(O_RDONLY), FileMode::default()).unwrap();
        fs.close(fd).unwrap();
    }

    #[test]
    fn test_invalid_path_is_wrapped_einval() {
        let (_dir, fs) = setup();
        let err = fs.stat("").unwrap_err();
        assert!(matches!(err, HostError::Path { op: "stat", .. }));
        assert_eq!(err.unwrap_once(), &HostError::Errno(Errno::EINVAL));
    }

    #[test]
    fn test_open_read_only_create() {
        let (dir, fs) = setup();
        let fd =
            fs.open("/fresh.txt", flags(O_RDONLY | O_CREAT), FileMode::from_bits(0o640)).unwrap();
        assert!(dir.path().join("fresh.txt").is_file());
        assert_eq!(fs.read(fd, &mut [0; 4], None).unwrap(), 0);
        let err = fs.write(fd, b"x", None).unwrap_err();
        assert_eq!(err.unwrap_once(), &HostError::Errno(Errno::EBADF));
        fs.close(fd).unwrap();

        let err = fs
            .open("/fresh.txt", flags(O_RDONLY | O_CREAT | O_EXCL), FileMode::from_bits(0o640))
            .unwrap_err();
        assert_eq!(err.unwrap_once(), &HostError::Errno(Errno::EEXIST));
    }

    #[test]
    fn test_open_read_only_truncate() {
        let (dir, fs) = setup();
        let fd = fs.open("/hello.txt", flags(O_RDONLY | O_TRUNC), FileMode::default()).unwrap();
        fs.close(fd).unwrap();
        assert_eq!(std::fs::metadata(dir.path().join("hello.txt")).unwrap().len(), 0);
    }

    #[test]
    fn test_symlink_inside_root_is_followed() {
        let (dir, fs) = setup();
        symlink(dir.path().join("sub"), dir.path().join("alias")).unwrap();
        std::fs::write(dir.path().join("sub/f"), b"x").unwrap();
        assert_eq!(fs.readdir("/alias").unwrap(), vec!["f"]);
        assert_eq!(fs.stat("/alias/f").unwrap().size, 1);
    }

    #[test]
    fn test_symlink_out_of_root_is_eacces() {
        let (dir, fs) = setup();
        let outside = tempfile::tempdir().unwrap();
        std::fs::write(outside.path().join("secret"), b"s").unwrap();
        std::fs::set_permissions(outside.path().join("secret"), Permissions::from_mode(0o600))
            .unwrap();
        symlink(outside.path(), dir.path().join("link")).unwrap();

        let eacces = HostError::Errno(Errno::EACCES);
        assert_eq!(fs.readdir("/link").unwrap_err().unwrap_once(), &eacces);
        assert_eq!(fs.stat("/link").unwrap_err().unwrap_once(), &eacces);
        assert_eq!(fs.stat("/link/secret").unwrap_err().unwrap_once(), &eacces);
        assert_eq!(
            fs.chmod("/link/secret", FileMode::from_bits(0o777)).unwrap_err().unwrap_once(),
            &eacces
        );
        assert_eq!(
            fs.open("/link/new", flags(O_WRONLY | O_CREAT), FileMode::PERM)
                .unwrap_err()
                .unwrap_once(),
            &eacces
        );
        assert_eq!(fs.mkdir("/link/d", FileMode::PERM).unwrap_err().unwrap_once(), &eacces);
        assert_eq!(fs.unlink("/link/secret").unwrap_err().unwrap_once(), &eacces);

        let mode = std::fs::metadata(outside.path().join("secret")).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert!(!outside.path().join("new").exists());
        assert!(outside.path().join("secret").exists());

        // the link itself lives inside the root
        assert!(fs.lstat("/link").unwrap().mode.is_symlink());
        fs.unlink("/link").unwrap();
        assert!(outside.path().exists());
    }

    #[test]
    fn test_dangling_symlink_is_not_created_through() {
        let (dir, fs) = setup();
        let outside = tempfile::tempdir().unwrap();
        let target = outside.path().join("planted");
        symlink(&target, dir.path().join("trap")).unwrap();

        let err = fs.open("/trap", flags(O_WRONLY | O_CREAT), FileMode::PERM).unwrap_err();
        assert!(err.is_not_found());
        assert!(!target.exists());
        assert!(fs.lstat("/trap").unwrap().mode.is_symlink());
    }
}
