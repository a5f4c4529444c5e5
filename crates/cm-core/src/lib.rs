//! # cm-core
//!
//! Core types shared by every climind crate: the floating-point alias, the
//! error taxonomy, the missing-value sentinel, the notice channel for
//! recoverable conditions, and the two-phase [`Deferred`] handle.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Public modules ───────────────────────────────────────────────────────────

/// Deferred (build now, force later) evaluation handle.
pub mod deferred;

/// Error types and the `ensure!` / `fail!` / `ensure_post!` macros.
pub mod errors;

/// Missing-value sentinel.
pub mod missing;

/// Notice sinks for recoverable conditions.
pub mod notice;

// ── Primitive type aliases ────────────────────────────────────────────────────

/// Floating-point type used for all data values.
pub type Real = f64;

/// Alias used for array sizes / indices.
pub type Size = usize;

// ── Re-exports for convenience ────────────────────────────────────────────────

pub use deferred::Deferred;
pub use errors::{Error, Result, Stage};
pub use missing::Missing;
pub use notice::{CollectingSink, Notice, NoticeSink, Severity, TracingSink};
