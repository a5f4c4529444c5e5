//! # cm-indices
//!
//! Raw climate indices: pure reductions of a [`cm_array::LabeledArray`] over
//! the periods of a [`cm_time::Grouping`], taking thresholds already
//! expressed in the input's units. They neither convert units nor mask
//! incomplete periods; the checked indicators of `cm-indicators` wrap them
//! for that.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// Resample ops, threshold counts and rate integration.
pub mod generic;

/// Streamflow and snow indices.
pub mod hydrology;

/// Precipitation indices.
pub mod precip;

/// Temperature indices.
pub mod temperature;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use generic::{mark_day_of_year, rate_to_amount, sampling_of, select_resample_op, threshold_count, Comparison, ResampleOp};
