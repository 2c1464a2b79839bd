// Host filesystem abstraction
//
// The bridge only ever talks to a `HostFs`. `OsFs` exposes a directory of the
// host machine; embedders can supply any other implementation.

pub mod fd_table;
pub mod os;
pub mod path;

pub use fd_table::{FdTable, FileDescriptor, OpenFlags};
pub use os::OsFs;
pub use path::normalize_path;

use crate::errno::{Errno, HostError, HostResult};
use crate::stat::{FileInfo, FileMode};

/// A filesystem the host exposes to the guest.
///
/// Calls are synchronous and return once the operation has completed. Only
/// `stat` and `chmod` are required; the rest report `ENOSYS` unless
/// implemented.
#[cfg_attr(any(test, feature = "mockall"), mockall::automock)]
pub trait HostFs: Send + Sync {
    fn stat(&self, path: &str) -> HostResult<FileInfo>;

    fn chmod(&self, path: &str, mode: FileMode) -> HostResult<()>;

    /// Like `stat`, but does not follow a trailing symlink.
    fn lstat(&self, path: &str) -> HostResult<FileInfo> {
        self.stat(path)
    }

    fn fstat(&self, _fd: u32) -> HostResult<FileInfo> {
        Err(HostError::Errno(Errno::ENOSYS))
    }

    fn open(&self, _path: &str, _flags: OpenFlags, _perm: FileMode) -> HostResult<u32> {
        Err(HostError::Errno(Errno::ENOSYS))
    }

    fn close(&self, _fd: u32) -> HostResult<()> {
        Err(HostError::Errno(Errno::ENOSYS))
    }

    /// Read into `buf`, at `position` or else at the current file offset.
    fn read(&self, _fd: u32, _buf: &mut [u8], _position: Option<u64>) -> HostResult<usize> {
        Err(HostError::Errno(Errno::ENOSYS))
    }

    /// Write `data`, at `position` or else at the current file offset.
    fn write(&self, _fd: u32, _data: &[u8], _position: Option<u64>) -> HostResult<usize> {
        Err(HostError::Errno(Errno::ENOSYS))
    }

    /// Names of the entries in a directory.
    fn readdir(&self, _path: &str) -> HostResult<Vec<String>> {
        Err(HostError::Errno(Errno::ENOSYS))
    }

    fn mkdir(&self, _path: &str, _perm: FileMode) -> HostResult<()> {
        Err(HostError::Errno(Errno::ENOSYS))
    }

    fn rmdir(&self, _path: &str) -> HostResult<()> {
        Err(HostError::Errno(Errno::ENOSYS))
    }

    fn unlink(&self, _path: &str) -> HostResult<()> {
        Err(HostError::Errno(Errno::ENOSYS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    struct StatOnly;

    impl HostFs for StatOnly {
        fn stat(&self, path: &str) -> HostResult<FileInfo> {
            Ok(FileInfo {
                name: path.to_string(),
                size: 0,
                mode: FileMode::from_bits(0o644),
                mod_time: Utc::now(),
            })
        }

        fn chmod(&self, _path: &str, _mode: FileMode) -> HostResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_optional_operations_report_enosys() {
        let fs = StatOnly;
        let enosys = HostError::Errno(Errno::ENOSYS);
        assert_eq!(fs.fstat(3).unwrap_err(), enosys);
        assert_eq!(fs.open("/a", OpenFlags::default(), FileMode::default()).unwrap_err(), enosys);
        assert_eq!(fs.close(3).unwrap_err(), enosys);
        assert_eq!(fs.read(3, &mut [0; 4], None).unwrap_err(), enosys);
        assert_eq!(fs.write(3, b"x", Some(0)).unwrap_err(), enosys);
        assert_eq!(fs.readdir("/").unwrap_err(), enosys);
        assert_eq!(fs.mkdir("/d", FileMode::PERM).unwrap_err(), enosys);
        assert_eq!(fs.rmdir("/d").unwrap_err(), enosys);
        assert_eq!(fs.unlink("/a").unwrap_err(), enosys);
    }

    #[test]
    fn test_lstat_defaults_to_stat() {
        let fs = StatOnly;
        assert_eq!(fs.lstat("/a").unwrap().name, "/a");
    }

    #[test]
    fn test_mock_host_fs() {
        let mut fs = MockHostFs::new();
        fs.expect_chmod()
            .withf(|path, mode| path == "/x" && mode.perm() == 0o600)
            .times(1)
            .returning(|_, _| Ok(()));
        assert!(fs.chmod("/x", FileMode::from_bits(0o600)).is_ok());
    }
}
