// Syscall bridge
//
// Builds the `fs` object the guest's runtime glue calls into. Each property
// is a host function following the guest's callback convention; see
// `syscalls` for the per-call contracts.

pub mod args;
pub mod sink;
pub mod syscalls;

pub use args::{ArgError, Args};
pub use sink::{ErrorSink, Module, TracingSink};
pub use syscalls::{
    SharedFs, error_callback, fs_chmod, fs_close, fs_fstat, fs_lstat, fs_mkdir, fs_open, fs_read,
    fs_readdir, fs_rmdir, fs_stat, fs_unlink, fs_write,
};

use crate::fs::HostFs;
use crate::fs::fd_table::{O_APPEND, O_CREAT, O_EXCL, O_RDONLY, O_RDWR, O_TRUNC, O_WRONLY};
use crate::value::{JsFunction, JsObject, Value};
use std::sync::Arc;

/// Names of the host functions exposed on the `fs` object.
pub const FS_FUNCTIONS: [&str; 12] = [
    "chmod", "stat", "lstat", "fstat", "open", "close", "read", "write", "readdir", "mkdir",
    "rmdir", "unlink",
];

/// The guest-facing filesystem: a module context plus an optional host
/// filesystem. Without one, every call fails with `ENOSYS`.
#[derive(Clone, Default)]
pub struct FsBridge {
    module: Module,
    host: SharedFs,
}

impl FsBridge {
    pub fn new(module: Module, host: Option<Arc<dyn HostFs>>) -> Self {
        Self { module, host }
    }

    pub fn has_host(&self) -> bool {
        self.host.is_some()
    }

    /// Build the host function registered under `name`.
    pub fn function(&self, name: &str) -> Option<JsFunction> {
        let build: fn(&Module, SharedFs) -> JsFunction = match name {
            "chmod" => fs_chmod,
            "stat" => fs_stat,
            "lstat" => fs_lstat,
            "fstat" => fs_fstat,
            "open" => fs_open,
            "close" => fs_close,
            "read" => fs_read,
            "write" => fs_write,
            "readdir" => fs_readdir,
            "mkdir" => fs_mkdir,
            "rmdir" => fs_rmdir,
            "unlink" => fs_unlink,
            _ => return None,
        };
        Some(build(&self.module, self.host.clone()))
    }

    /// The `constants` object: `open` flag values.
    pub fn constants() -> JsObject {
        JsObject::from_iter([
            ("O_RDONLY", Value::from(O_RDONLY)),
            ("O_WRONLY", Value::from(O_WRONLY)),
            ("O_RDWR", Value::from(O_RDWR)),
            ("O_CREAT", Value::from(O_CREAT)),
            ("O_EXCL", Value::from(O_EXCL)),
            ("O_TRUNC", Value::from(O_TRUNC)),
            ("O_APPEND", Value::from(O_APPEND)),
        ])
    }

    /// Assemble the complete `fs` object.
    pub fn into_object(self) -> JsObject {
        let mut properties: Vec<(&str, Value)> = FS_FUNCTIONS
            .iter()
            .filter_map(|&name| self.function(name).map(|f| (name, Value::from(f))))
            .collect();
        properties.push(("constants", Value::object(Self::constants())));
        JsObject::from_iter(properties)
    }
}

impl std::fmt::Debug for FsBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsBridge").field("has_host", &self.has_host()).finish()
    }
}
