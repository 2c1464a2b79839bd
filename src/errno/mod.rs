// POSIX errno symbols and host error translation
//
// The guest runtime dispatches on symbolic errno names ("ENOENT", "EACCES"),
// not on numbers, so host errors are normalised to the symbols below before
// they cross the boundary.

pub mod error;
pub mod response;

pub use error::{HostError, HostResult};
pub use response::{ErrorResponse, fs_error_response};

use std::fmt;
use std::str::FromStr;

/// POSIX error codes understood by the guest runtime.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Errno {
    EPERM,
    ENOENT,
    EIO,
    EBADF,
    EAGAIN,
    ENOMEM,
    EACCES,
    EBUSY,
    EEXIST,
    EXDEV,
    ENOTDIR,
    EISDIR,
    EINVAL,
    ENFILE,
    EMFILE,
    EFBIG,
    ENOSPC,
    ESPIPE,
    EROFS,
    EMLINK,
    EPIPE,
    ENAMETOOLONG,
    ENOSYS,
    ENOTEMPTY,
    ELOOP,
    ENOTSUP,
    ETIMEDOUT,
}

impl Errno {
    pub const ALL: [Errno; 27] = [
        Errno::EPERM,
        Errno::ENOENT,
        Errno::EIO,
        Errno::EBADF,
        Errno::EAGAIN,
        Errno::ENOMEM,
        Errno::EACCES,
        Errno::EBUSY,
        Errno::EEXIST,
        Errno::EXDEV,
        Errno::ENOTDIR,
        Errno::EISDIR,
        Errno::EINVAL,
        Errno::ENFILE,
        Errno::EMFILE,
        Errno::EFBIG,
        Errno::ENOSPC,
        Errno::ESPIPE,
        Errno::EROFS,
        Errno::EMLINK,
        Errno::EPIPE,
        Errno::ENAMETOOLONG,
        Errno::ENOSYS,
        Errno::ENOTEMPTY,
        Errno::ELOOP,
        Errno::ENOTSUP,
        Errno::ETIMEDOUT,
    ];

    /// Canonical symbolic name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Errno::EPERM => "EPERM",
            Errno::ENOENT => "ENOENT",
            Errno::EIO => "EIO",
            Errno::EBADF => "EBADF",
            Errno::EAGAIN => "EAGAIN",
            Errno::ENOMEM => "ENOMEM",
            Errno::EACCES => "EACCES",
            Errno::EBUSY => "EBUSY",
            Errno::EEXIST => "EEXIST",
            Errno::EXDEV => "EXDEV",
            Errno::ENOTDIR => "ENOTDIR",
            Errno::EISDIR => "EISDIR",
            Errno::EINVAL => "EINVAL",
            Errno::ENFILE => "ENFILE",
            Errno::EMFILE => "EMFILE",
            Errno::EFBIG => "EFBIG",
            Errno::ENOSPC => "ENOSPC",
            Errno::ESPIPE => "ESPIPE",
            Errno::EROFS => "EROFS",
            Errno::EMLINK => "EMLINK",
            Errno::EPIPE => "EPIPE",
            Errno::ENAMETOOLONG => "ENAMETOOLONG",
            Errno::ENOSYS => "ENOSYS",
            Errno::ENOTEMPTY => "ENOTEMPTY",
            Errno::ELOOP => "ELOOP",
            Errno::ENOTSUP => "ENOTSUP",
            Errno::ETIMEDOUT => "ETIMEDOUT",
        }
    }

    /// Host errno number.
    pub fn raw(&self) -> i32 {
        match self {
            Errno::EPERM => libc::EPERM,
            Errno::ENOENT => libc::ENOENT,
            Errno::EIO => libc::EIO,
            Errno::EBADF => libc::EBADF,
            Errno::EAGAIN => libc::EAGAIN,
            Errno::ENOMEM => libc::ENOMEM,
            Errno::EACCES => libc::EACCES,
            Errno::EBUSY => libc::EBUSY,
            Errno::EEXIST => libc::EEXIST,
            Errno::EXDEV => libc::EXDEV,
            Errno::ENOTDIR => libc::ENOTDIR,
            Errno::EISDIR => libc::EISDIR,
            Errno::EINVAL => libc::EINVAL,
            Errno::ENFILE => libc::ENFILE,
            Errno::EMFILE => libc::EMFILE,
            Errno::EFBIG => libc::EFBIG,
            Errno::ENOSPC => libc::ENOSPC,
            Errno::ESPIPE => libc::ESPIPE,
            Errno::EROFS => libc::EROFS,
            Errno::EMLINK => libc::EMLINK,
            Errno::EPIPE => libc::EPIPE,
            Errno::ENAMETOOLONG => libc::ENAMETOOLONG,
            Errno::ENOSYS => libc::ENOSYS,
            Errno::ENOTEMPTY => libc::ENOTEMPTY,
            Errno::ELOOP => libc::ELOOP,
            Errno::ENOTSUP => libc::ENOTSUP,
            Errno::ETIMEDOUT => libc::ETIMEDOUT,
        }
    }

    /// Map a host errno number to its symbol, if the guest knows it.
    pub fn from_raw_os_error(raw: i32) -> Option<Errno> {
        use nix::errno::Errno as Sys;

        let errno = match Sys::from_raw(raw) {
            Sys::EPERM => Errno::EPERM,
            Sys::ENOENT => Errno::ENOENT,
            Sys::EIO => Errno::EIO,
            Sys::EBADF => Errno::EBADF,
            Sys::EAGAIN => Errno::EAGAIN,
            Sys::ENOMEM => Errno::ENOMEM,
            Sys::EACCES => Errno::EACCES,
            Sys::EBUSY => Errno::EBUSY,
            Sys::EEXIST => Errno::EEXIST,
            Sys::EXDEV => Errno::EXDEV,
            Sys::ENOTDIR => Errno::ENOTDIR,
            Sys::EISDIR => Errno::EISDIR,
            Sys::EINVAL => Errno::EINVAL,
            Sys::ENFILE => Errno::ENFILE,
            Sys::EMFILE => Errno::EMFILE,
            Sys::EFBIG => Errno::EFBIG,
            Sys::ENOSPC => Errno::ENOSPC,
            Sys::ESPIPE => Errno::ESPIPE,
            Sys::EROFS => Errno::EROFS,
            Sys::EMLINK => Errno::EMLINK,
            Sys::EPIPE => Errno::EPIPE,
            Sys::ENAMETOOLONG => Errno::ENAMETOOLONG,
            Sys::ENOSYS => Errno::ENOSYS,
            Sys::ENOTEMPTY => Errno::ENOTEMPTY,
            Sys::ELOOP => Errno::ELOOP,
            Sys::ENOTSUP => Errno::ENOTSUP,
            Sys::ETIMEDOUT => Errno::ETIMEDOUT,
            _ => return None,
        };
        Some(errno)
    }

    /// Human-readable description from the host's errno table.
    pub fn description(&self) -> &'static str {
        nix::errno::Errno::from_raw(self.raw()).desc()
    }
}

impl fmt::Display for Errno {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Errno {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Errno::ALL
            .iter()
            .find(|errno| errno.as_str() == s)
            .copied()
            .ok_or_else(|| format!("Unknown errno symbol: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errno_symbols() {
        assert_eq!(Errno::ENOENT.as_str(), "ENOENT");
        assert_eq!(Errno::EACCES.as_str(), "EACCES");
        assert_eq!(Errno::ENOSYS.to_string(), "ENOSYS");
    }

    #[test]
    fn test_errno_from_str() {
        assert_eq!("EEXIST".parse::<Errno>().unwrap(), Errno::EEXIST);
        assert_eq!("ENAMETOOLONG".parse::<Errno>().unwrap(), Errno::ENAMETOOLONG);
        assert!("enoent".parse::<Errno>().is_err());
        assert!("EWHATEVER".parse::<Errno>().unwrap_err().contains("EWHATEVER"));
    }

    #[test]
    fn test_errno_raw_values() {
        assert_eq!(Errno::ENOENT.raw(), libc::ENOENT);
        assert_eq!(Errno::EACCES.raw(), libc::EACCES);
        assert_eq!(Errno::ENOTEMPTY.raw(), libc::ENOTEMPTY);
    }

    #[test]
    fn test_errno_from_raw_os_error() {
        assert_eq!(Errno::from_raw_os_error(libc::ENOENT), Some(Errno::ENOENT));
        assert_eq!(Errno::from_raw_os_error(libc::EPERM), Some(Errno::EPERM));
        assert_eq!(Errno::from_raw_os_error(libc::EROFS), Some(Errno::EROFS));
        assert_eq!(Errno::from_raw_os_error(0), None);
        assert_eq!(Errno::from_raw_os_error(-1), None);
    }

    #[test]
    fn test_all_errnos_roundtrip_through_host_numbers() {
        for errno in Errno::ALL {
            assert_eq!(Errno::from_raw_os_error(errno.raw()), Some(errno), "{}", errno);
            assert_eq!(errno.as_str().parse::<Errno>(), Ok(errno));
            assert!(!errno.description().is_empty());
        }
    }
}
