//! Error types for climind.
//!
//! Every fallible operation in the workspace returns [`Error`]. The variants
//! fall into four classes that callers can match on through the helper
//! predicates:
//!
//! | Class | Variants |
//! |-------|----------|
//! | unit error | `UnparseableUnit`, `IncompatibleUnits`, `MissingUnits` |
//! | frequency error | `Frequency` |
//! | input-kind error | `InputKind` |
//! | everything else | `FrequencyMismatch`, `Precondition`, `Calendar`, … |
//!
//! Masked output periods are never errors; they are ordinary values equal to
//! the missing sentinel (see [`crate::missing`]).

use thiserror::Error;

/// The processing stage at which a checked indicator call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Input physical kind or units dimension check.
    KindCheck,
    /// Input sampling-frequency check.
    FrequencyCheck,
    /// Conversion of parameters and inputs into native units.
    UnitResolution,
    /// Parsing of the resampling frequency and period resolution.
    FrequencyResolution,
    /// Numeric reduction, masking or annotation.
    Computation,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::KindCheck => "kind check",
            Stage::FrequencyCheck => "frequency check",
            Stage::UnitResolution => "unit resolution",
            Stage::FrequencyResolution => "frequency resolution",
            Stage::Computation => "computation",
        };
        f.write_str(s)
    }
}

/// The top-level error type used throughout climind.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// A unit string could not be parsed.
    #[error("unit error: cannot parse `{unit}`: {reason}")]
    UnparseableUnit {
        /// The offending unit string.
        unit: String,
        /// What went wrong.
        reason: String,
    },

    /// Two units do not belong to the same dimension.
    #[error("unit error: `{from}` {from_dimension} is not convertible to `{to}` {to_dimension}")]
    IncompatibleUnits {
        /// Source unit.
        from: String,
        /// Target unit.
        to: String,
        /// Dimension of the source unit.
        from_dimension: String,
        /// Dimension of the target unit.
        to_dimension: String,
    },

    /// A variable that must carry units has none.
    #[error("unit error: variable `{variable}` has no units")]
    MissingUnits {
        /// Name of the variable.
        variable: String,
    },

    /// An unsupported or malformed frequency code.
    #[error("frequency error: `{code}`: {reason}")]
    Frequency {
        /// The offending frequency code.
        code: String,
        /// What went wrong.
        reason: String,
    },

    /// An input's physical kind is incompatible with the indicator.
    #[error("input kind error: `{indicator}` expects {expected} for `{parameter}`, got {found}")]
    InputKind {
        /// Indicator identifier.
        indicator: String,
        /// Input parameter name.
        parameter: String,
        /// What the indicator accepts.
        expected: String,
        /// What was supplied.
        found: String,
    },

    /// The input sampling frequency differs from the expected one and the
    /// data-validation mode is set to raise.
    #[error("frequency mismatch: `{indicator}` expects `{expected}` input, got `{found}`")]
    FrequencyMismatch {
        /// Indicator identifier.
        indicator: String,
        /// Expected sampling frequency code.
        expected: String,
        /// Inferred sampling frequency code (or `irregular`).
        found: String,
    },

    /// Calendar or date error.
    #[error("calendar error: {0}")]
    Calendar(String),

    /// Array shapes or axes do not line up.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// General runtime error.
    #[error("{0}")]
    Runtime(String),

    /// Precondition violated.
    #[error("precondition not satisfied: {0}")]
    Precondition(String),

    /// Postcondition violated.
    #[error("postcondition not satisfied: {0}")]
    Postcondition(String),

    /// Invalid argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    /// `true` for unparseable, inconvertible or absent units.
    pub fn is_unit_error(&self) -> bool {
        matches!(
            self,
            Error::UnparseableUnit { .. } | Error::IncompatibleUnits { .. } | Error::MissingUnits { .. }
        )
    }

    /// `true` for unsupported or malformed frequency codes.
    pub fn is_frequency_error(&self) -> bool {
        matches!(self, Error::Frequency { .. })
    }

    /// `true` when an input's physical kind is incompatible.
    pub fn is_input_kind_error(&self) -> bool {
        matches!(self, Error::InputKind { .. })
    }

    /// The checked-indicator stage this error belongs to.
    pub fn stage(&self) -> Stage {
        match self {
            Error::InputKind { .. } | Error::MissingUnits { .. } => Stage::KindCheck,
            Error::FrequencyMismatch { .. } => Stage::FrequencyCheck,
            Error::UnparseableUnit { .. } | Error::IncompatibleUnits { .. } => {
                Stage::UnitResolution
            }
            Error::Frequency { .. } | Error::Calendar(_) => Stage::FrequencyResolution,
            _ => Stage::Computation,
        }
    }

    /// Build an [`Error::UnparseableUnit`].
    pub fn unparseable_unit(unit: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::UnparseableUnit {
            unit: unit.into(),
            reason: reason.into(),
        }
    }

    /// Build an [`Error::Frequency`].
    pub fn frequency(code: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Frequency {
            code: code.into(),
            reason: reason.into(),
        }
    }
}

/// Shorthand `Result` type used throughout climind.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Returns `Err(Error::Precondition(...))` if `$cond` is false.
///
/// # Example
/// ```
/// use cm_core::{ensure, errors::Error};
/// fn positive(x: f64) -> cm_core::errors::Result<f64> {
///     ensure!(x > 0.0, "x must be positive, got {x}");
///     Ok(x)
/// }
/// assert!(positive(1.0).is_ok());
/// assert!(matches!(positive(-1.0), Err(Error::Precondition(_))));
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $($msg:tt)*) => {
        if !$cond {
            return Err($crate::errors::Error::Precondition(
                format!($($msg)*)
            ));
        }
    };
}

/// Returns `Err(Error::Postcondition(...))` if `$cond` is false.
#[macro_export]
macro_rules! ensure_post {
    ($cond:expr, $($msg:tt)*) => {
        if !$cond {
            return Err($crate::errors::Error::Postcondition(
                format!($($msg)*)
            ));
        }
    };
}

/// Returns `Err(Error::Runtime(...))` immediately.
///
/// # Example
/// ```
/// use cm_core::fail;
/// fn always_err() -> cm_core::errors::Result<()> {
///     fail!("something went wrong");
/// }
/// assert!(always_err().is_err());
/// ```
#[macro_export]
macro_rules! fail {
    ($($msg:tt)*) => {
        return Err($crate::errors::Error::Runtime(format!($($msg)*)))
    };
}
