// FileInfo -> fs.Stats projection

use super::{FileInfo, FileMode, S_IFCHR, S_IFDIR, S_IFIFO, S_IFLNK, S_IFSOCK};
use crate::value::{JsObject, Value, bool_func, func_false};

/// Block size reported in `blksize` and used to compute `blocks`.
pub const BLOCK_SIZE: i64 = 4096;

/// Every field of a projected stat object.
pub const STAT_FIELDS: [&str; 20] = [
    "dev",
    "ino",
    "mode",
    "nlink",
    "uid",
    "gid",
    "rdev",
    "size",
    "blksize",
    "blocks",
    "atimeMs",
    "mtimeMs",
    "ctimeMs",
    "isBlockDevice",
    "isCharacterDevice",
    "isDirectory",
    "isFIFO",
    "isFile",
    "isSocket",
    "isSymbolicLink",
];

const MODE_BIT_TRANSLATION: [(FileMode, u32); 5] = [
    (FileMode::DIR, S_IFDIR),
    (FileMode::CHAR_DEVICE, S_IFCHR),
    (FileMode::NAMED_PIPE, S_IFIFO),
    (FileMode::SYMLINK, S_IFLNK),
    (FileMode::SOCKET, S_IFSOCK),
];

/// Rewrite portable type bits into their `st_mode` equivalents.
///
/// Bits outside the translation table, including permissions, are kept. The
/// `S_IF*` bits all sit below the portable type bits, so a value that is
/// already in `st_mode` layout comes back unchanged.
pub fn js_mode(mode: FileMode) -> u32 {
    MODE_BIT_TRANSLATION.iter().fold(mode.bits(), |bits, &(host, posix)| {
        if bits & host.bits() == host.bits() { (bits & !host.bits()) | posix } else { bits }
    })
}

/// Number of `block_size` blocks needed to hold `size` bytes, rounded up.
pub fn block_count(size: i64, block_size: i64) -> i64 {
    let blocks = size / block_size;
    if size % block_size > 0 { blocks + 1 } else { blocks }
}

/// Project file metadata into the guest's stat object.
///
/// Returns `None` when no metadata is available.
pub fn js_stat(info: Option<&FileInfo>) -> Option<JsObject> {
    let info = info?;
    let mod_time = info.mod_time.timestamp_millis();

    Some(JsObject::from_iter([
        ("dev", Value::int(0)),
        ("ino", Value::int(0)),
        ("mode", Value::from(js_mode(info.mode))),
        ("nlink", Value::int(1)),
        // uid/gid are not tracked by the host abstraction
        ("uid", Value::int(0)),
        ("gid", Value::int(0)),
        ("rdev", Value::int(0)),
        ("size", Value::int(info.size)),
        ("blksize", Value::int(BLOCK_SIZE)),
        ("blocks", Value::int(block_count(info.size, BLOCK_SIZE))),
        ("atimeMs", Value::int(mod_time)),
        ("mtimeMs", Value::int(mod_time)),
        ("ctimeMs", Value::int(mod_time)),
        ("isBlockDevice", Value::from(func_false())),
        ("isCharacterDevice", Value::from(func_false())),
        ("isDirectory", Value::from(bool_func(info.mode.is_dir()))),
        ("isFIFO", Value::from(func_false())),
        ("isFile", Value::from(bool_func(info.mode.is_regular()))),
        ("isSocket", Value::from(func_false())),
        ("isSymbolicLink", Value::from(bool_func(info.mode.is_symlink()))),
    ]))
}
