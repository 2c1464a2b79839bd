// Per-syscall host functions
//
// Every function takes a fixed-length argument vector whose last element is
// the guest's callback. Malformed vectors are reported to the module's error
// sink and dropped without calling back. Filesystem failures are reported
// and then delivered to the callback as an error response.

use super::args::{ArgError, Args};
use super::sink::Module;
use crate::errno::{Errno, ErrorResponse, HostError, fs_error_response};
use crate::fs::{HostFs, OpenFlags};
use crate::stat::{FileInfo, FileMode, js_stat};
use crate::value::{JsFunction, Value};
use std::sync::Arc;

/// Shared handle to the host filesystem, absent when none is configured.
pub type SharedFs = Option<Arc<dyn HostFs>>;

enum CallError {
    Args(ArgError),
    Host(HostError),
}

impl From<ArgError> for CallError {
    fn from(err: ArgError) -> Self {
        CallError::Args(err)
    }
}

impl From<HostError> for CallError {
    fn from(err: HostError) -> Self {
        CallError::Host(err)
    }
}

type CallResult = Result<Vec<Value>, CallError>;

/// A function that fails every call with `errno`, for syscalls whose
/// filesystem capability is not wired up.
pub fn error_callback(module: &Module, op: &'static str, errno: Errno) -> JsFunction {
    let module = module.clone();
    JsFunction::new(move |values| {
        let callback = match values.last().and_then(Value::as_function) {
            Some(callback) => callback,
            None => {
                let got = values.last().map_or("undefined", Value::type_name);
                module.error(ArgError::Type {
                    op,
                    index: values.len().saturating_sub(1),
                    expected: "function",
                    got,
                });
                return Value::Undefined;
            }
        };
        module.error(format_args!("fs.{}: {}", op, errno.description()));
        callback.call(&ErrorResponse::errno(errno).into_args());
        Value::Undefined
    })
}

/// Wrap a syscall body with arity checking, callback extraction and error
/// routing. The body must decode all of its arguments before touching `fs`.
fn syscall<F>(module: &Module, host: SharedFs, op: &'static str, arity: usize, body: F) -> JsFunction
where
    F: Fn(&dyn HostFs, &Args<'_>) -> CallResult + Send + Sync + 'static,
{
    let Some(host) = host else {
        return error_callback(module, op, Errno::ENOSYS);
    };
    let module = module.clone();

    JsFunction::new(move |values| {
        let args = match Args::new(op, values, arity) {
            Ok(args) => args,
            Err(err) => {
                module.error(err);
                return Value::Undefined;
            }
        };
        let callback = match args.callback() {
            Ok(callback) => callback,
            Err(err) => {
                module.error(err);
                return Value::Undefined;
            }
        };

        tracing::debug!(op, "fs call");
        match body(host.as_ref(), &args) {
            Ok(result) => {
                callback.call(&result);
            }
            Err(CallError::Args(err)) => module.error(err),
            Err(CallError::Host(err)) => {
                module.error(format_args!("fs.{}: {}", op, err));
                callback.call(&fs_error_response(&err).into_args());
            }
        }
        Value::Undefined
    })
}

fn stat_result(info: &FileInfo) -> Vec<Value> {
    vec![js_stat(Some(info)).map(Value::object).unwrap_or_default()]
}

fn buffer_range(offset: usize, length: usize, len: usize) -> Result<std::ops::Range<usize>, HostError> {
    match offset.checked_add(length) {
        Some(end) if end <= len => Ok(offset..end),
        _ => Err(HostError::Errno(Errno::EINVAL)),
    }
}

/// `chmod(path, mode, callback)`; calls back with `null` on success.
pub fn fs_chmod(module: &Module, host: SharedFs) -> JsFunction {
    syscall(module, host, "chmod", 3, |fs, args| {
        let path = args.string(0)?;
        let mode = args.u32(1)?;
        fs.chmod(path, FileMode::from_unix_mode(mode))?;
        Ok(vec![Value::Null])
    })
}

/// `stat(path, callback)`; calls back with the stat object.
pub fn fs_stat(module: &Module, host: SharedFs) -> JsFunction {
    syscall(module, host, "stat", 2, |fs, args| {
        let path = args.string(0)?;
        Ok(stat_result(&fs.stat(path)?))
    })
}

/// `lstat(path, callback)`; like `stat` without following a final symlink.
pub fn fs_lstat(module: &Module, host: SharedFs) -> JsFunction {
    syscall(module, host, "lstat", 2, |fs, args| {
        let path = args.string(0)?;
        Ok(stat_result(&fs.lstat(path)?))
    })
}

/// `fstat(fd, callback)`
pub fn fs_fstat(module: &Module, host: SharedFs) -> JsFunction {
    syscall(module, host, "fstat", 2, |fs, args| {
        let fd = args.u32(0)?;
        Ok(stat_result(&fs.fstat(fd)?))
    })
}

/// `open(path, flags, mode, callback)`; calls back with `(null, fd)`.
pub fn fs_open(module: &Module, host: SharedFs) -> JsFunction {
    syscall(module, host, "open", 4, |fs, args| {
        let path = args.string(0)?;
        let flags = args.u32(1)?;
        let perm = args.u32(2)?;
        let flags = OpenFlags::from_bits(flags).map_err(|e| HostError::path("open", path, e))?;
        let fd = fs.open(path, flags, FileMode::from_unix_mode(perm))?;
        Ok(vec![Value::Null, Value::from(fd)])
    })
}

/// `close(fd, callback)`
pub fn fs_close(module: &Module, host: SharedFs) -> JsFunction {
    syscall(module, host, "close", 2, |fs, args| {
        let fd = args.u32(0)?;
        fs.close(fd)?;
        Ok(vec![Value::Null])
    })
}

/// `read(fd, buffer, offset, length, position, callback)`; fills
/// `buffer[offset..offset + length]` and calls back with `(null, bytesRead)`.
pub fn fs_read(module: &Module, host: SharedFs) -> JsFunction {
    syscall(module, host, "read", 6, |fs, args| {
        let fd = args.u32(0)?;
        let buffer = args.buffer(1)?;
        let offset = args.usize(2)?;
        let length = args.usize(3)?;
        let position = args.position(4)?;

        let mut bytes = buffer.lock();
        let range = buffer_range(offset, length, bytes.len())?;
        let n = fs.read(fd, &mut bytes[range], position)?;
        Ok(vec![Value::Null, Value::int(n as i64)])
    })
}

/// `write(fd, buffer, offset, length, position, callback)`; calls back with
/// `(null, bytesWritten)`.
pub fn fs_write(module: &Module, host: SharedFs) -> JsFunction {
    syscall(module, host, "write", 6, |fs, args| {
        let fd = args.u32(0)?;
        let buffer = args.buffer(1)?;
        let offset = args.usize(2)?;
        let length = args.usize(3)?;
        let position = args.position(4)?;

        let bytes = buffer.lock();
        let range = buffer_range(offset, length, bytes.len())?;
        let n = fs.write(fd, &bytes[range], position)?;
        Ok(vec![Value::Null, Value::int(n as i64)])
    })
}

/// `readdir(path, callback)`; calls back with `(null, names)`.
pub fn fs_readdir(module: &Module, host: SharedFs) -> JsFunction {
    syscall(module, host, "readdir", 2, |fs, args| {
        let path = args.string(0)?;
        let names = fs.readdir(path)?.into_iter().map(Value::from).collect();
        Ok(vec![Value::Null, Value::Array(names)])
    })
}

/// `mkdir(path, perm, callback)`
pub fn fs_mkdir(module: &Module, host: SharedFs) -> JsFunction {
    syscall(module, host, "mkdir", 3, |fs, args| {
        let path = args.string(0)?;
        let perm = args.u32(1)?;
        fs.mkdir(path, FileMode::from_unix_mode(perm))?;
        Ok(vec![Value::Null])
    })
}

/// `rmdir(path, callback)`
pub fn fs_rmdir(module: &Module, host: SharedFs) -> JsFunction {
    syscall(module, host, "rmdir", 2, |fs, args| {
        fs.rmdir(args.string(0)?)?;
        Ok(vec![Value::Null])
    })
}

/// `unlink(path, callback)`
pub fn fs_unlink(module: &Module, host: SharedFs) -> JsFunction {
    syscall(module, host, "unlink", 2, |fs, args| {
        fs.unlink(args.string(0)?)?;
        Ok(vec![Value::Null])
    })
}
