// File metadata as the host reports it, and its projection into the
// `fs.Stats` object the guest expects.

pub mod projector;

pub use projector::{BLOCK_SIZE, STAT_FIELDS, block_count, js_mode, js_stat};

use chrono::{DateTime, Utc};
use std::fmt;
use std::ops::{BitAnd, BitOr};

/// POSIX `st_mode` file type bits, as laid out for the guest.
pub const S_IFMT: u32 = 0o170000;
pub const S_IFSOCK: u32 = 0o140000;
pub const S_IFLNK: u32 = 0o120000;
pub const S_IFREG: u32 = 0o100000;
pub const S_IFBLK: u32 = 0o060000;
pub const S_IFDIR: u32 = 0o040000;
pub const S_IFCHR: u32 = 0o020000;
pub const S_IFIFO: u32 = 0o010000;

/// Portable file mode: type flags in the high bits, permissions in the low
/// nine bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FileMode(u32);

impl FileMode {
    pub const DIR: FileMode = FileMode(1 << 31);
    pub const APPEND: FileMode = FileMode(1 << 30);
    pub const EXCLUSIVE: FileMode = FileMode(1 << 29);
    pub const TEMPORARY: FileMode = FileMode(1 << 28);
    pub const SYMLINK: FileMode = FileMode(1 << 27);
    pub const DEVICE: FileMode = FileMode(1 << 26);
    pub const NAMED_PIPE: FileMode = FileMode(1 << 25);
    pub const SOCKET: FileMode = FileMode(1 << 24);
    pub const SETUID: FileMode = FileMode(1 << 23);
    pub const SETGID: FileMode = FileMode(1 << 22);
    pub const CHAR_DEVICE: FileMode = FileMode(1 << 21);
    pub const STICKY: FileMode = FileMode(1 << 20);
    pub const IRREGULAR: FileMode = FileMode(1 << 19);

    /// All type bits. A mode with none of them set is a regular file.
    pub const TYPE: FileMode = FileMode(
        Self::DIR.0
            | Self::SYMLINK.0
            | Self::NAMED_PIPE.0
            | Self::SOCKET.0
            | Self::DEVICE.0
            | Self::CHAR_DEVICE.0
            | Self::IRREGULAR.0,
    );

    pub const PERM: FileMode = FileMode(0o777);

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(&self) -> u32 {
        self.0
    }

    pub const fn contains(&self, other: FileMode) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_dir(&self) -> bool {
        self.contains(Self::DIR)
    }

    pub fn is_symlink(&self) -> bool {
        self.contains(Self::SYMLINK)
    }

    pub fn is_regular(&self) -> bool {
        self.0 & Self::TYPE.0 == 0
    }

    pub fn perm(&self) -> u32 {
        self.0 & Self::PERM.0
    }

    /// Build a portable mode from a host `st_mode`.
    pub fn from_unix_mode(st_mode: u32) -> Self {
        let mut mode = FileMode(st_mode & Self::PERM.0);
        mode = mode
            | match st_mode & S_IFMT {
                S_IFBLK => Self::DEVICE,
                S_IFCHR => Self::DEVICE | Self::CHAR_DEVICE,
                S_IFDIR => Self::DIR,
                S_IFIFO => Self::NAMED_PIPE,
                S_IFLNK => Self::SYMLINK,
                S_IFSOCK => Self::SOCKET,
                _ => FileMode(0),
            };
        if st_mode & libc::S_ISUID as u32 != 0 {
            mode = mode | Self::SETUID;
        }
        if st_mode & libc::S_ISGID as u32 != 0 {
            mode = mode | Self::SETGID;
        }
        if st_mode & libc::S_ISVTX as u32 != 0 {
            mode = mode | Self::STICKY;
        }
        mode
    }
}

impl BitOr for FileMode {
    type Output = FileMode;

    fn bitor(self, rhs: FileMode) -> FileMode {
        FileMode(self.0 | rhs.0)
    }
}

impl BitAnd for FileMode {
    type Output = FileMode;

    fn bitand(self, rhs: FileMode) -> FileMode {
        FileMode(self.0 & rhs.0)
    }
}

impl fmt::Display for FileMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#o}", self.0)
    }
}

/// Metadata of a single filesystem entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub name: String,
    pub size: i64,
    pub mode: FileMode,
    pub mod_time: DateTime<Utc>,
}

impl FileInfo {
    pub fn is_dir(&self) -> bool {
        self.mode.is_dir()
    }

    /// Build from host metadata, as returned by `symlink_metadata` or `metadata`.
    #[cfg(unix)]
    pub fn from_metadata(name: impl Into<String>, metadata: &std::fs::Metadata) -> Self {
        use std::os::unix::fs::MetadataExt;

        let mod_time = metadata
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
        Self {
            name: name.into(),
            size: i64::try_from(metadata.len()).unwrap_or(i64::MAX),
            mode: FileMode::from_unix_mode(metadata.mode()),
            mod_time,
        }
    }
}
