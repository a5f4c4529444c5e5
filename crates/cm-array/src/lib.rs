//! # cm-array
//!
//! The labeled-array collaborator: values over a calendar-aware time axis
//! and named spatial axes, carrying units, attributes, a declared physical
//! kind and provenance. Provides elementwise arithmetic, unit conversion,
//! rolling windows and per-period reductions with valid-value counts.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// `LabeledArray` and its builder.
pub mod array;

/// Elementwise and along-time operations.
pub mod ops;

/// Per-period reductions.
pub mod reduce;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use array::{LabeledArray, LabeledArrayBuilder, Provenance, SpatialAxis};
pub use ops::{RollingOp, Window};
pub use reduce::{period_axis, Reducer, ValidCounts};
