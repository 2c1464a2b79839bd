// File descriptor table for host-backed files

use crate::errno::{Errno, HostError, HostResult};
use std::collections::HashMap;
use std::fs::File;

/// `open` flag bits as the guest runtime encodes them.
pub const O_RDONLY: u32 = 0;
pub const O_WRONLY: u32 = 1;
pub const O_RDWR: u32 = 2;
pub const O_CREAT: u32 = 64;
pub const O_EXCL: u32 = 128;
pub const O_TRUNC: u32 = 512;
pub const O_APPEND: u32 = 1024;

const O_ACCMODE: u32 = O_WRONLY | O_RDWR;

/// Open flags for files
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenFlags {
    /// Read access
    pub read: bool,
    /// Write access
    pub write: bool,
    /// Append mode
    pub append: bool,
    /// Create if not exists
    pub create: bool,
    /// Fail if it exists (with `create`)
    pub exclusive: bool,
    /// Truncate on open
    pub truncate: bool,
}

impl Default for OpenFlags {
    fn default() -> Self {
        Self { read: true, write: false, append: false, create: false, exclusive: false, truncate: false }
    }
}

impl OpenFlags {
    /// Decode the guest's numeric `O_*` flags.
    pub fn from_bits(bits: u32) -> HostResult<Self> {
        let (read, write) = match bits & O_ACCMODE {
            O_RDONLY => (true, false),
            O_WRONLY => (false, true),
            O_RDWR => (true, true),
            _ => return Err(HostError::Errno(Errno::EINVAL)),
        };
        Ok(Self {
            read,
            write,
            append: bits & O_APPEND != 0,
            create: bits & O_CREAT != 0,
            exclusive: bits & O_EXCL != 0,
            truncate: bits & O_TRUNC != 0,
        })
    }

    /// Whether opening with these flags can modify the filesystem.
    pub fn mutates(&self) -> bool {
        self.write || self.append || self.create || self.truncate
    }
}

/// An open file
#[derive(Debug)]
pub struct FileDescriptor {
    /// Guest path the file was opened with
    pub path: String,
    pub flags: OpenFlags,
    pub file: File,
}

impl FileDescriptor {
    pub fn new(path: String, flags: OpenFlags, file: File) -> Self {
        Self { path, flags, file }
    }

    pub fn can_read(&self) -> bool {
        self.flags.read
    }

    pub fn can_write(&self) -> bool {
        self.flags.write || self.flags.append
    }
}

/// File descriptor table
///
/// Descriptors 0, 1 and 2 belong to the host's stdio and are never allocated.
#[derive(Debug)]
pub struct FdTable {
    fds: HashMap<u32, FileDescriptor>,
    next_fd: u32,
}

impl Default for FdTable {
    fn default() -> Self {
        Self::new()
    }
}

impl FdTable {
    pub const STDIN: u32 = 0;
    pub const STDOUT: u32 = 1;
    pub const STDERR: u32 = 2;

    pub fn new() -> Self {
        Self { fds: HashMap::new(), next_fd: 3 }
    }

    /// Register `descriptor` under the next unused number. Numbers are never
    /// reused; once they run out every allocation fails with `EMFILE`.
    pub fn allocate(&mut self, descriptor: FileDescriptor) -> HostResult<u32> {
        let fd = self.next_fd;
        self.next_fd = fd.checked_add(1).ok_or(HostError::Errno(Errno::EMFILE))?;
        self.fds.insert(fd, descriptor);
        Ok(fd)
    }

    pub fn get(&self, fd: u32) -> HostResult<&FileDescriptor> {
        self.fds.get(&fd).ok_or(HostError::Errno(Errno::EBADF))
    }

    pub fn get_mut(&mut self, fd: u32) -> HostResult<&mut FileDescriptor> {
        self.fds.get_mut(&fd).ok_or(HostError::Errno(Errno::EBADF))
    }

    pub fn close(&mut self, fd: u32) -> HostResult<FileDescriptor> {
        self.fds.remove(&fd).ok_or(HostError::Errno(Errno::EBADF))
    }

    pub fn len(&self) -> usize {
        self.fds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fds.is_empty()
    }
}
