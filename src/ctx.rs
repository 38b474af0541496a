//! Error context for `anyhow` in closure position.
//!
//! `.map_err(ctx!("loading {path:?}"))` is equivalent to
//! `.with_context(|| format!("loading {path:?}"))`, but also works on
//! error types that are not yet `anyhow::Error`.

#[macro_export]
macro_rules! ctx {
    ($fmt:tt) => {
        |e| anyhow::Context::context(Result::<(), _>::Err(e), format!($fmt))
            .err().expect("constructed as Err")
    };
    ($fmt:tt, $($arg:tt)*) => {
        |e| anyhow::Context::context(Result::<(), _>::Err(e), format!($fmt, $($arg)*))
            .err().expect("constructed as Err")
    };
}
