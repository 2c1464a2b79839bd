//! Host-side emulation of the filesystem calls a WebAssembly module built for
//! a JavaScript host expects to make.
//!
//! The guest's runtime glue calls host functions with JS-like values and a
//! trailing callback. This crate provides the value model ([`value`]), errno
//! translation ([`errno`]), stat projection ([`stat`]), the host filesystem
//! abstraction ([`fs`]) and the host functions themselves ([`bridge`]).

pub mod bridge;
pub mod config;
pub mod errno;
pub mod fs;
pub mod stat;
pub mod value;

pub use bridge::{ErrorSink, FsBridge, Module, TracingSink};
pub use errno::{Errno, ErrorResponse, HostError, HostResult};
pub use fs::{HostFs, OsFs};
pub use stat::{FileInfo, FileMode};
pub use value::{JsFunction, JsObject, Value};
