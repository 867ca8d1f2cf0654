//! Precision configuration.
//!
//! This module holds the one piece of ambient configuration the crate reads:
//! whether 64-bit types are enabled by default.
//!
//! # Resolution
//!
//! - The innermost [`X64Scope`] active on the calling thread wins.
//! - Otherwise the process-wide default applies. It is set through
//!   [`set_enable_x64`], and starts from the `ARBOR_ENABLE_X64` environment
//!   variable (disabled when unset).
//!
//! The global default is stored in an `AtomicBool`. Scopes live in a
//! thread-local stack, so threads can run with different precisions side by
//! side.

use crate::error::{ArborError, Result};
use core::cell::RefCell;
use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use lazy_static::lazy_static;

/// Environment variable consulted once for the initial global default.
pub const ENABLE_X64_ENV: &str = "ARBOR_ENABLE_X64";

lazy_static! {
    /// Process-wide default. Relaxed ordering suffices: the flag carries no
    /// data dependencies and is expected to change rarely.
    static ref GLOBAL_ENABLE_X64: AtomicBool = AtomicBool::new(initial_enable_x64());
}

static SCOPE_COUNTER: AtomicUsize = AtomicUsize::new(1);

thread_local! {
    // (scope id, enabled), innermost last.
    static X64_OVERRIDES: RefCell<Vec<(usize, bool)>> = const { RefCell::new(Vec::new()) };
}

fn initial_enable_x64() -> bool {
    match std::env::var(ENABLE_X64_ENV) {
        Ok(raw) => parse_flag(&raw).unwrap_or_else(|err| {
            log::warn!("ignoring {ENABLE_X64_ENV}: {err}");
            false
        }),
        Err(_) => false,
    }
}

/// Parses a boolean configuration value.
///
/// Accepts `1/true/yes/on` and `0/false/no/off`, ignoring case and
/// surrounding whitespace.
///
/// # Errors
/// Returns [`ArborError::Config`] for anything else.
///
/// # Example
/// ```
/// use arbor::config::parse_flag;
/// assert_eq!(parse_flag(" On "), Ok(true));
/// assert!(parse_flag("maybe").is_err());
/// ```
pub fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ArborError::Config(format!(
            "expected a boolean flag, got {other:?}"
        ))),
    }
}

/// Sets the process-wide default for 64-bit mode.
///
/// Threads inside an [`X64Scope`] keep seeing their scoped value.
pub fn set_enable_x64(enabled: bool) {
    log::debug!("global enable_x64 set to {enabled}");
    GLOBAL_ENABLE_X64.store(enabled, Ordering::Relaxed);
}

/// Returns whether 64-bit mode is active for the calling thread.
///
/// # Example
/// ```
/// use arbor::config::{enable_x64, with_x64};
/// assert!(with_x64(true, enable_x64));
/// ```
pub fn enable_x64() -> bool {
    X64_OVERRIDES
        .with(|stack| stack.borrow().last().map(|&(_, enabled)| enabled))
        .unwrap_or_else(|| GLOBAL_ENABLE_X64.load(Ordering::Relaxed))
}

/// RAII guard overriding 64-bit mode on the current thread.
///
/// Guards nest. Dropping one removes only its own override, so the most
/// recently created scope that is still alive stays in force.
#[must_use = "the override ends when the scope is dropped"]
#[derive(Debug)]
pub struct X64Scope {
    id: usize,
    // Scopes are bound to the thread whose stack they pushed onto.
    _not_send: core::marker::PhantomData<*const ()>,
}

impl X64Scope {
    pub fn new(enabled: bool) -> Self {
        let id = SCOPE_COUNTER.fetch_add(1, Ordering::Relaxed);
        X64_OVERRIDES.with(|stack| stack.borrow_mut().push((id, enabled)));
        log::debug!("entered enable_x64={enabled} scope");
        Self {
            id,
            _not_send: core::marker::PhantomData,
        }
    }
}

impl Drop for X64Scope {
    fn drop(&mut self) {
        X64_OVERRIDES.with(|stack| {
            let mut stack = stack.borrow_mut();
            if let Some(pos) = stack.iter().rposition(|&(id, _)| id == self.id) {
                stack.remove(pos);
            }
        });
    }
}

/// Runs `f` with 64-bit mode forced to `enabled` on this thread.
pub fn with_x64<R>(enabled: bool, f: impl FnOnce() -> R) -> R {
    let _scope = X64Scope::new(enabled);
    f()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scopes_nest_and_restore() {
        let outer = enable_x64();
        {
            let _a = X64Scope::new(true);
            assert!(enable_x64());
            {
                let _b = X64Scope::new(false);
                assert!(!enable_x64());
            }
            assert!(enable_x64());
        }
        assert_eq!(enable_x64(), outer);
    }

    #[test]
    fn dropping_an_outer_scope_keeps_the_inner_override() {
        let outer = X64Scope::new(true);
        let inner = X64Scope::new(false);
        drop(outer);
        assert!(!enable_x64());
        let innermost = X64Scope::new(true);
        drop(inner);
        assert!(enable_x64());
        drop(innermost);
        X64_OVERRIDES.with(|stack| assert!(stack.borrow().is_empty()));
    }

    #[test]
    fn scopes_are_thread_local() {
        let _scope = X64Scope::new(true);
        let other = std::thread::spawn(|| with_x64(false, enable_x64))
            .join()
            .unwrap();
        assert!(!other);
        assert!(enable_x64());
    }

    #[test]
    fn parse_flag_rejects_garbage() {
        assert_eq!(parse_flag("YES"), Ok(true));
        assert_eq!(parse_flag("0"), Ok(false));
        assert!(matches!(parse_flag("2"), Err(ArborError::Config(_))));
    }
}
