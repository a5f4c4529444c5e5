//! # cm-indicators
//!
//! Checked climate indicators. An indicator wraps a raw index from
//! `cm-indices` and, around it, checks the inputs' physical kind and
//! sampling frequency, resolves threshold units into the inputs' own units,
//! masks periods with too few valid samples and writes CF-style metadata.
//!
//! ```no_run
//! use cm_indicators::{catalog, MissingPolicy};
//! # fn run(tasmax: &cm_array::LabeledArray) -> cm_core::Result<()> {
//! let summer_days = catalog()?
//!     .get("tx_days_above")?
//!     .call()
//!     .input("tasmax", tasmax)
//!     .param("thresh", "25 degC")
//!     .missing(MissingPolicy::Threshold { tolerance: 0.05 })
//!     .compute()?;
//! # Ok(()) }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// Built-in indicator catalog.
pub mod catalog;

/// Indicator definitions, calls and the validation pipeline.
pub mod indicator;

/// Output metadata.
pub mod metadata;

/// Missing-data validation.
pub mod missing;

/// Process-wide options.
pub mod options;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use catalog::{catalog, Catalog};
pub use indicator::{
    ArgValue, ComputeFn, IndexArgs, Indicator, IndicatorCall, IndicatorDefinition, InputSpec, ParamKind, ParamSpec,
    ParamValue,
};
pub use metadata::{annotate, fill_template, CallSummary, UnitRule};
pub use missing::{mask_invalid, validate, MissingPolicy, Validity};
pub use options::{Options, ScopedOptions, Settings, ValidationMode};
