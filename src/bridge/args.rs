// Argument vector validation

use crate::value::{JsBuffer, JsFunction, Value};
use thiserror::Error;

/// An argument vector that does not match a host function's signature.
///
/// These are integration errors: they are reported to the error sink and the
/// guest's callback is never invoked.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArgError {
    #[error("fs.{op}: {got}: invalid number of arguments, expected {expected}")]
    Arity { op: &'static str, expected: usize, got: usize },

    #[error("fs.{op}: argument {index}: {got}: not type {expected}")]
    Type { op: &'static str, index: usize, expected: &'static str, got: &'static str },
}

/// A positional argument vector of verified length.
#[derive(Debug, Clone, Copy)]
pub struct Args<'a> {
    op: &'static str,
    values: &'a [Value],
}

impl<'a> Args<'a> {
    /// Check that exactly `arity` arguments were passed.
    pub fn new(op: &'static str, values: &'a [Value], arity: usize) -> Result<Self, ArgError> {
        if values.len() != arity {
            return Err(ArgError::Arity { op, expected: arity, got: values.len() });
        }
        Ok(Self { op, values })
    }

    fn value(&self, index: usize) -> &'a Value {
        &self.values[index]
    }

    fn mismatch(&self, index: usize, expected: &'static str) -> ArgError {
        ArgError::Type { op: self.op, index, expected, got: self.value(index).type_name() }
    }

    /// A UTF-8 string argument, such as a path.
    pub fn string(&self, index: usize) -> Result<&'a str, ArgError> {
        self.value(index).as_str().ok_or_else(|| self.mismatch(index, "string"))
    }

    /// A non-negative integer fitting in 32 bits: modes, flags, descriptors.
    pub fn u32(&self, index: usize) -> Result<u32, ArgError> {
        self.value(index).as_u32().ok_or_else(|| self.mismatch(index, "uint32"))
    }

    /// A non-negative integer used as a buffer offset or length.
    pub fn usize(&self, index: usize) -> Result<usize, ArgError> {
        self.value(index)
            .as_i64()
            .and_then(|i| usize::try_from(i).ok())
            .ok_or_else(|| self.mismatch(index, "uint"))
    }

    /// A file position, or `None` for `null`/`undefined`.
    pub fn position(&self, index: usize) -> Result<Option<u64>, ArgError> {
        match self.value(index) {
            Value::Null | Value::Undefined => Ok(None),
            value => value
                .as_i64()
                .and_then(|i| u64::try_from(i).ok())
                .map(Some)
                .ok_or_else(|| self.mismatch(index, "uint or null")),
        }
    }

    pub fn buffer(&self, index: usize) -> Result<&'a JsBuffer, ArgError> {
        self.value(index).as_buffer().ok_or_else(|| self.mismatch(index, "Uint8Array"))
    }

    pub fn function(&self, index: usize) -> Result<&'a JsFunction, ArgError> {
        self.value(index).as_function().ok_or_else(|| self.mismatch(index, "function"))
    }

    /// The trailing callback every bridged syscall takes.
    pub fn callback(&self) -> Result<&'a JsFunction, ArgError> {
        match self.values.len() {
            0 => Err(ArgError::Arity { op: self.op, expected: 1, got: 0 }),
            n => self.function(n - 1),
        }
    }
}
