#![forbid(unsafe_code)]

//! Diagnostics for the engine.
//!
//! The engine logs what it deliberately ignores or discards: unsupported
//! sequences (`debug`), alternate-screen transitions and resizes (`debug`),
//! residue carried between chunks and scrollback eviction (`trace`), and
//! rejected configuration or change-queue overflow (`warn`). Each `Terminal`
//! feed runs inside a `shterm.feed` trace span.
//!
//! Enable the `tracing` feature to route these through `tracing`; without it
//! the macros expand to nothing.

#[cfg(feature = "tracing")]
pub use tracing::{debug, trace, trace_span, warn};

#[cfg(not(feature = "tracing"))]
mod noop_macros {
    /// No-op debug macro when tracing is disabled.
    #[macro_export]
    macro_rules! debug {
        ($($arg:tt)*) => {};
    }

    /// No-op trace macro when tracing is disabled.
    #[macro_export]
    macro_rules! trace {
        ($($arg:tt)*) => {};
    }

    /// No-op warn macro when tracing is disabled.
    #[macro_export]
    macro_rules! warn {
        ($($arg:tt)*) => {};
    }

    /// No-op trace_span macro when tracing is disabled.
    #[macro_export]
    macro_rules! trace_span {
        ($($arg:tt)*) => {
            $crate::logging::NoopSpan
        };
    }
}

/// Stand-in for `tracing::Span` when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub struct NoopSpan;

#[cfg(not(feature = "tracing"))]
impl NoopSpan {
    pub fn enter(&self) -> NoopGuard {
        NoopGuard
    }
}

#[cfg(not(feature = "tracing"))]
pub struct NoopGuard;

/// Install a JSON subscriber filtered by `RUST_LOG` (defaults to `info`).
///
/// For hosts and tools; returns `false` if a global subscriber was already set.
#[cfg(feature = "tracing-json")]
pub fn init_json_subscriber() -> bool {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .try_init()
        .is_ok()
}
