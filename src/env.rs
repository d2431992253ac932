use std::ffi::OsStr;
use std::sync::OnceLock;

#[derive(Clone, Copy, Debug)]
struct Env {
    trace_enabled: bool,
}

/// Must only be set within `init`.
///
/// Not thread-local, as it is read from the engine thread.
static ENV: OnceLock<Env> = OnceLock::new();

pub fn init() {
    let value = Env {
        trace_enabled: var_is("VM8085_TRACE", "1"),
    };
    if ENV.set(value).is_err() {
        panic!("tried to initialize environment state multiple times");
    }
}

/// Whether every executed instruction should be logged.
pub fn is_trace_enabled() -> bool {
    with_env(|env| env.trace_enabled)
}

fn with_env<F, R>(callback: F) -> R
where
    F: Fn(&Env) -> R,
{
    let env = ENV.get().unwrap_or_else(|| {
        panic!("tried to access environment state before initialization");
    });
    callback(env)
}

fn var_is(name: impl AsRef<OsStr>, value: impl AsRef<str>) -> bool {
    std::env::var(name.as_ref()).is_ok_and(|v| v == value.as_ref())
}
