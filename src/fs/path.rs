use crate::errno::{Errno, HostError, HostResult};

const MAX_PATH_LENGTH: usize = 4096;
const MAX_FILENAME_LENGTH: usize = 255;

/// Normalise a guest path to an absolute path with no `.` or `..` segments.
///
/// Relative paths are taken relative to `/`, and `..` never climbs above it.
pub fn normalize_path(path: &str) -> HostResult<String> {
    if path.is_empty() {
        return Err(HostError::path("normalize", path, Errno::EINVAL));
    }

    if path.contains('\0') {
        return Err(HostError::path("normalize", path.replace('\0', "\\0"), Errno::EINVAL));
    }

    if path.len() > MAX_PATH_LENGTH {
        return Err(HostError::path("normalize", path, Errno::ENAMETOOLONG));
    }

    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            name if name.len() > MAX_FILENAME_LENGTH => {
                return Err(HostError::path("normalize", path, Errno::ENAMETOOLONG));
            }
            name => parts.push(name),
        }
    }

    Ok(format!("/{}", parts.join("/")))
}

/// Last component of a normalised path, `/` for the root.
pub fn base_name(path: &str) -> &str {
    match path.rsplit('/').next() {
        Some("") | None => "/",
        Some(name) => name,
    }
}
