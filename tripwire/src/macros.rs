//! Call-site macros.
//!
//! These expand to a fire on a failpoint handle plus the handling every call
//! site needs: sleep on a delay, panic on a panic, and optionally return
//! early on a value. A disabled failpoint costs one uncontended lock.

/// Fire a failpoint and act on the outcome.
///
/// ```rust
/// use tripwire::{Registry, Value, fail_point};
///
/// fn read_block(fp: &tripwire::Failpoint) -> Result<Vec<u8>, String> {
///     fail_point!(fp, |v: Value| Err(format!("injected: {v}")));
///     Ok(vec![0; 512])
/// }
///
/// let registry = Registry::new();
/// let fp = registry.register("disk::read");
/// assert!(read_block(&fp).is_ok());
///
/// registry.enable("disk::read", r#"1*return("eio")"#).unwrap();
/// assert_eq!(read_block(&fp), Err("injected: eio".to_string()));
/// assert!(read_block(&fp).is_ok());
/// ```
///
/// Forms:
/// - `fail_point!(fp)`: delays and panics only; values are ignored.
/// - `fail_point!(fp, |value| expr)`: `return expr` on a value.
/// - `fail_point!(fp, if cond, |value| expr)`: as above, only when `cond` holds.
#[macro_export]
macro_rules! fail_point {
    ($fp:expr, if $cond:expr, $handler:expr) => {
        if $cond {
            $crate::fail_point!($fp, $handler);
        }
    };
    ($fp:expr) => {
        if let Some(outcome) = $crate::Failpoint::fire(&$fp) {
            let _ = outcome.apply_blocking();
        }
    };
    ($fp:expr, $handler:expr) => {
        if let Some(outcome) = $crate::Failpoint::fire(&$fp) {
            if let Some(value) = outcome.apply_blocking() {
                return ($handler)(value);
            }
        }
    };
}

/// [`fail_point!`] for async code: delays sleep on the tokio timer.
#[macro_export]
macro_rules! fail_point_async {
    ($fp:expr, if $cond:expr, $handler:expr) => {
        if $cond {
            $crate::fail_point_async!($fp, $handler);
        }
    };
    ($fp:expr) => {
        if let Some(outcome) = $crate::Failpoint::fire(&$fp) {
            let _ = outcome.apply_async().await;
        }
    };
    ($fp:expr, $handler:expr) => {
        if let Some(outcome) = $crate::Failpoint::fire(&$fp) {
            if let Some(value) = outcome.apply_async().await {
                return ($handler)(value);
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::{Registry, Value};
    use std::time::{Duration, Instant};

    fn guarded(fp: &crate::Failpoint, enabled: bool) -> i64 {
        fail_point!(fp, if enabled, |v: Value| v.as_int().unwrap_or(-1));
        0
    }

    #[test]
    fn test_return_form() {
        let registry = Registry::builder().seed(3).build();
        let fp = registry.register("calc");

        fn compute(fp: &crate::Failpoint) -> i64 {
            fail_point!(fp, |v: Value| v.as_int().unwrap_or(-1));
            10
        }

        assert_eq!(compute(&fp), 10);
        registry.enable("calc", "2*return(7)").unwrap();
        assert_eq!(compute(&fp), 7);
        assert_eq!(compute(&fp), 7);
        assert_eq!(compute(&fp), 10);
    }

    #[test]
    fn test_conditional_form() {
        let registry = Registry::builder().seed(3).build();
        let fp = registry.register("calc");
        registry.enable("calc", "return(5)").unwrap();
        assert_eq!(guarded(&fp, false), 0);
        assert_eq!(guarded(&fp, true), 5);
    }

    #[test]
    fn test_bare_form_sleeps() {
        let registry = Registry::builder().seed(3).build();
        let fp = registry.register("slow");
        registry.enable("slow", "1*sleep(20ms)").unwrap();
        let start = Instant::now();
        fail_point!(fp);
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    #[should_panic(expected = "injected crash")]
    fn test_bare_form_panics() {
        let registry = Registry::builder().seed(3).build();
        let fp = registry.register("crash");
        registry.enable("crash", "panic(\"injected crash\")").unwrap();
        fail_point!(fp);
    }

    #[tokio::test]
    async fn test_async_form() {
        let registry = Registry::builder().seed(3).build();
        let fp = registry.register("rpc");

        async fn call(fp: &crate::Failpoint) -> Result<u8, String> {
            fail_point_async!(fp, |v: Value| Err(v.to_string()));
            Ok(1)
        }

        registry.enable("rpc", "1*sleep(1)->1*return(\"timeout\")").unwrap();
        assert_eq!(call(&fp).await, Ok(1));
        assert_eq!(call(&fp).await, Err("timeout".to_string()));
        assert_eq!(call(&fp).await, Ok(1));
    }

    #[tokio::test]
    async fn test_async_conditional_form() {
        let registry = Registry::builder().seed(3).build();
        let fp = registry.register("rpc");
        registry.enable("rpc", "return(\"refused\")").unwrap();

        async fn call(fp: &crate::Failpoint, primary: bool) -> Result<u8, String> {
            fail_point_async!(fp, if primary, |v: Value| Err(v.to_string()));
            Ok(1)
        }

        assert_eq!(call(&fp, false).await, Ok(1));
        assert_eq!(call(&fp, true).await, Err("refused".to_string()));
        assert_eq!(registry.count("rpc").unwrap(), 1);
    }
}
