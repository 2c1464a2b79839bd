// Callable values

use super::Value;
use std::fmt;
use std::sync::{Arc, LazyLock};

type Callable = dyn Fn(&[Value]) -> Value + Send + Sync;

/// A host-side closure the guest can invoke with a positional argument vector.
#[derive(Clone)]
pub struct JsFunction(Arc<Callable>);

impl JsFunction {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Invoke the function. Functions with no result return `Value::Undefined`.
    pub fn call(&self, args: &[Value]) -> Value {
        (self.0)(args)
    }

    /// Whether both handles refer to the same closure.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for JsFunction {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for JsFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("JsFunction")
    }
}

static FUNC_TRUE: LazyLock<JsFunction> = LazyLock::new(|| JsFunction::new(|_| Value::Boolean(true)));
static FUNC_FALSE: LazyLock<JsFunction> =
    LazyLock::new(|| JsFunction::new(|_| Value::Boolean(false)));

/// Shared function that always returns `true`.
pub fn func_true() -> JsFunction {
    FUNC_TRUE.clone()
}

/// Shared function that always returns `false`.
pub fn func_false() -> JsFunction {
    FUNC_FALSE.clone()
}

/// The shared predicate function returning `b`.
pub fn bool_func(b: bool) -> JsFunction {
    if b { func_true() } else { func_false() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_call_passes_arguments() {
        let sum = JsFunction::new(|args| {
            Value::int(args.iter().filter_map(Value::as_i64).sum::<i64>())
        });
        assert_eq!(sum.call(&[Value::int(2), Value::int(3)]), Value::int(5));
    }

    #[test]
    fn test_call_without_result_is_undefined() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let func = JsFunction::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Value::Undefined
        });
        assert!(func.call(&[]).is_undefined());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_bool_singletons_are_shared() {
        assert!(func_true().ptr_eq(&func_true()));
        assert!(func_false().ptr_eq(&func_false()));
        assert!(!func_true().ptr_eq(&func_false()));
        assert!(bool_func(true).ptr_eq(&func_true()));
        assert!(bool_func(false).ptr_eq(&func_false()));
    }

    #[test]
    fn test_bool_singletons_ignore_arguments() {
        assert_eq!(func_true().call(&[]), Value::Boolean(true));
        assert_eq!(func_false().call(&[Value::int(1)]), Value::Boolean(false));
    }

    #[test]
    fn test_distinct_closures_are_not_equal() {
        let a = JsFunction::new(|_| Value::Null);
        let b = JsFunction::new(|_| Value::Null);
        assert_ne!(a, b);
        assert_eq!(a.clone(), a);
    }
}
