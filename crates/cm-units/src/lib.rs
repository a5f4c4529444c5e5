//! # cm-units
//!
//! Unit strings, dimensions, conversions (including affine temperature
//! scales and water-equivalent bridges), quantities and physical kinds.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// Physical dimensions.
pub mod dimension;

/// Physical kinds of input variables.
pub mod kind;

/// `Quantity`: a magnitude with a unit.
pub mod quantity;

/// Rate ↔ amount conversions.
pub mod rate;

/// Unit registry, parsing and conversion.
pub mod registry;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use dimension::Dimension;
pub use kind::{KindFamily, PhysicalKind};
pub use quantity::Quantity;
pub use rate::AmountConversion;
pub use registry::{registry, Context, Converter, Term, Unit, UnitDef, UnitRegistry, WATER_DENSITY};

use cm_core::{Real, Result};

/// Convert `value` from `from` to `to` with the global registry.
pub fn convert(value: Real, from: &str, to: &str) -> Result<Real> {
    registry().convert(value, from, to)
}

/// Dimension of a unit string, using the global registry.
pub fn dimension_of(unit: &str) -> Result<Dimension> {
    registry().dimension_of(unit)
}

/// `true` if `from` converts to `to` under strict dimensional analysis.
pub fn are_convertible(from: &str, to: &str) -> bool {
    registry().are_convertible(from, to)
}
