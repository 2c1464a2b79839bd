// Dynamically-typed values exchanged across the host/guest boundary
//
// The guest runtime glue expects a small JavaScript-like object system:
// strings, numbers, booleans, property bags, callable functions and typed
// byte arrays. Prototype chains and coercion rules are not modelled; callers
// type-check every value explicitly.

pub mod function;
pub mod object;

pub use function::{JsFunction, bool_func, func_false, func_true};
pub use object::{JsObject, PropertyBag};

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

/// A numeric value.
///
/// Integers are kept exact so that sizes and timestamps survive the trip
/// without rounding through `f64`.
#[derive(Debug, Clone, Copy)]
pub enum JsNumber {
    Int(i64),
    Float(f64),
}

impl JsNumber {
    /// Integer view, accepting floats only when they hold an exact integer.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            JsNumber::Int(i) => Some(i),
            JsNumber::Float(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
                Some(f as i64)
            }
            JsNumber::Float(_) => None,
        }
    }

    pub fn as_f64(&self) -> f64 {
        match *self {
            JsNumber::Int(i) => i as f64,
            JsNumber::Float(f) => f,
        }
    }
}

impl PartialEq for JsNumber {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (JsNumber::Int(a), JsNumber::Int(b)) => a == b,
            _ => self.as_f64() == other.as_f64(),
        }
    }
}

/// An immutable byte string.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct JsString(Arc<[u8]>);

impl JsString {
    pub fn new(data: impl AsRef<[u8]>) -> Self {
        Self(Arc::from(data.as_ref()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// UTF-8 view of the string, if it is valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.0).ok()
    }
}

impl fmt::Debug for JsString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", String::from_utf8_lossy(&self.0))
    }
}

impl fmt::Display for JsString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

/// Host view of a guest `Uint8Array`.
///
/// Unlike every other value this one is shared and mutable: `read` fills the
/// guest's buffer in place.
#[derive(Clone, Default)]
pub struct JsBuffer(Arc<Mutex<Vec<u8>>>);

impl JsBuffer {
    pub fn new(data: Vec<u8>) -> Self {
        Self(Arc::new(Mutex::new(data)))
    }

    pub fn zeroed(len: usize) -> Self {
        Self::new(vec![0; len])
    }

    /// Lock the underlying bytes.
    pub fn lock(&self) -> MutexGuard<'_, Vec<u8>> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.lock().clone()
    }
}

impl PartialEq for JsBuffer {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for JsBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Uint8Array({})", self.len())
    }
}

/// A value crossing the host/guest boundary.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Boolean(bool),
    Number(JsNumber),
    String(JsString),
    Bytes(JsBuffer),
    Array(Vec<Value>),
    Object(Arc<JsObject>),
    Function(JsFunction),
}

impl Value {
    pub fn string(s: impl AsRef<[u8]>) -> Self {
        Value::String(JsString::new(s))
    }

    pub fn int(i: impl Into<i64>) -> Self {
        Value::Number(JsNumber::Int(i.into()))
    }

    pub fn float(f: f64) -> Self {
        Value::Number(JsNumber::Float(f))
    }

    pub fn object(obj: JsObject) -> Self {
        Value::Object(Arc::new(obj))
    }

    /// Name of the value's runtime type, as used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Bytes(_) => "Uint8Array",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Function(_) => "function",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<JsNumber> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_number().and_then(|n| n.as_i64())
    }

    /// Non-negative integer that fits in a `u32` (modes, fds, flags).
    pub fn as_u32(&self) -> Option<u32> {
        self.as_i64().and_then(|i| u32::try_from(i).ok())
    }

    pub fn as_js_string(&self) -> Option<&JsString> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_js_string().and_then(JsString::as_str)
    }

    pub fn as_buffer(&self) -> Option<&JsBuffer> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&JsObject> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&JsFunction> {
        match self {
            Value::Function(func) => Some(func),
            _ => None,
        }
    }

    /// Render the value as JSON for logging and the CLI.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;

        match self {
            Value::Undefined | Value::Null => Json::Null,
            Value::Boolean(b) => Json::Bool(*b),
            Value::Number(JsNumber::Int(i)) => Json::from(*i),
            Value::Number(JsNumber::Float(f)) => Json::from(*f),
            Value::String(s) => Json::String(s.to_string()),
            Value::Bytes(b) => Json::Array(b.lock().iter().map(|&byte| Json::from(byte)).collect()),
            Value::Array(items) => Json::Array(items.iter().map(Value::to_json).collect()),
            Value::Object(obj) => {
                let mut map: Vec<_> = obj.iter().collect();
                map.sort_by(|a, b| a.0.cmp(b.0));
                Json::Object(map.into_iter().map(|(k, v)| (k.clone(), v.to_json())).collect())
            }
            Value::Function(_) => Json::String("[Function]".to_string()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::int(i)
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::int(i)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::string(s)
    }
}

impl From<JsObject> for Value {
    fn from(obj: JsObject) -> Self {
        Value::object(obj)
    }
}

impl From<JsFunction> for Value {
    fn from(func: JsFunction) -> Self {
        Value::Function(func)
    }
}

impl From<JsBuffer> for Value {
    fn from(buf: JsBuffer) -> Self {
        Value::Bytes(buf)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}
