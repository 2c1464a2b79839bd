// Guest-visible error responses

use super::{Errno, HostError};
use crate::value::{JsObject, Value};
use std::fmt;

/// The value handed to a callback when an operation fails.
///
/// Errno-bearing responses set both `error` and `code` to the symbol.
/// Errors with no POSIX equivalent carry only their message under `error`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
    pub code: Option<Errno>,
}

impl ErrorResponse {
    pub fn errno(errno: Errno) -> Self {
        Self { error: errno.as_str().to_string(), code: Some(errno) }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self { error: message.into(), code: None }
    }

    pub fn into_object(self) -> JsObject {
        match self.code {
            Some(code) => JsObject::from_iter([
                ("error", Value::from(self.error)),
                ("code", Value::from(code.as_str())),
            ]),
            None => JsObject::from_iter([("error", Value::from(self.error))]),
        }
    }

    /// The callback argument vector: a single error bag.
    pub fn into_args(self) -> Vec<Value> {
        vec![Value::object(self.into_object())]
    }
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.error)
    }
}

/// Translate a host error into the response the guest sees.
///
/// Not-found errors always become `ENOENT`. Otherwise one level of wrapping
/// is removed and a carried errno becomes its symbol; anything else is passed
/// through as a message.
pub fn fs_error_response(err: &HostError) -> ErrorResponse {
    if err.is_not_found() {
        return ErrorResponse::errno(Errno::ENOENT);
    }
    let err = err.unwrap_once();
    match err.errno() {
        Some(errno) => ErrorResponse::errno(errno),
        None => ErrorResponse::message(err.to_string()),
    }
}
