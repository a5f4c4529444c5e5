//! Missing-data validation: decide, per output period, whether the reduced
//! value stands or is replaced by the missing sentinel.

use std::fmt;
use std::str::FromStr;

use cm_array::{LabeledArray, ValidCounts};
use cm_core::errors::{Error, Result};
use cm_core::{ensure, Real};
use cm_time::{Grouping, Period};
use serde::{Deserialize, Serialize};

/// Masking policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum MissingPolicy {
    /// Mask a period as soon as one expected sample is missing.
    #[default]
    AnyMissing,
    /// Mask only if the missing fraction exceeds `tolerance` (in `[0, 1]`).
    Threshold {
        /// Largest tolerated missing fraction.
        tolerance: Real,
    },
    /// Mask unless at least `n` valid samples are present.
    AtLeastN {
        /// Minimum number of valid samples.
        n: usize,
    },
    /// Never mask.
    None,
}

/// Outcome of [`validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Validity {
    /// The reduced value stands.
    Valid,
    /// The output is replaced by the missing sentinel.
    Masked,
}

impl MissingPolicy {
    /// Build a policy from its name. `parameter` is the tolerance of
    /// `threshold` and the count of `at_least_n`.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] for an unknown name, a missing parameter or
    /// a tolerance outside `[0, 1]`.
    pub fn from_name(name: &str, parameter: Option<Real>) -> Result<Self> {
        let policy = match name.trim().to_ascii_lowercase().as_str() {
            "any_missing" | "any" => MissingPolicy::AnyMissing,
            "threshold" | "pct" => MissingPolicy::Threshold {
                tolerance: parameter.ok_or_else(|| required(name, "a tolerance"))?,
            },
            "at_least_n" => {
                let n = parameter.ok_or_else(|| required(name, "a sample count"))?;
                if n < 0.0 || n.fract() != 0.0 {
                    return Err(Error::InvalidArgument(format!("`at_least_n` needs a whole count, got {n}")));
                }
                MissingPolicy::AtLeastN { n: n as usize }
            }
            "none" | "skip" => MissingPolicy::None,
            other => return Err(Error::InvalidArgument(format!("unknown missing-data policy `{other}`"))),
        };
        policy.check()?;
        Ok(policy)
    }

    /// Canonical name.
    pub fn name(&self) -> &'static str {
        match self {
            MissingPolicy::AnyMissing => "any_missing",
            MissingPolicy::Threshold { .. } => "threshold",
            MissingPolicy::AtLeastN { .. } => "at_least_n",
            MissingPolicy::None => "none",
        }
    }

    /// Fail on out-of-range parameters.
    pub fn check(&self) -> Result<()> {
        if let MissingPolicy::Threshold { tolerance } = self {
            if !(0.0..=1.0).contains(tolerance) {
                return Err(Error::InvalidArgument(format!(
                    "missing-data tolerance must lie in [0, 1], got {tolerance}"
                )));
            }
        }
        Ok(())
    }

    /// Decide on one period given its valid and expected sample counts.
    pub fn decide(&self, valid: usize, expected: usize) -> Validity {
        let masked = match *self {
            MissingPolicy::AnyMissing => expected == 0 || valid < expected,
            MissingPolicy::Threshold { tolerance } => {
                if expected == 0 {
                    valid == 0
                } else {
                    let missing = expected.saturating_sub(valid) as Real;
                    missing / expected as Real > tolerance
                }
            }
            MissingPolicy::AtLeastN { n } => valid < n.max(1),
            MissingPolicy::None => false,
        };
        if masked {
            Validity::Masked
        } else {
            Validity::Valid
        }
    }
}

fn required(name: &str, what: &str) -> Error {
    Error::InvalidArgument(format!("missing-data policy `{name}` needs {what}"))
}

impl FromStr for MissingPolicy {
    type Err = Error;

    /// Parse `name` or `name:parameter` (`threshold:0.05`, `at_least_n:10`).
    fn from_str(s: &str) -> Result<Self> {
        match s.split_once(':') {
            Some((name, param)) => {
                let value = param
                    .trim()
                    .parse::<Real>()
                    .map_err(|_| Error::InvalidArgument(format!("bad missing-data parameter `{param}`")))?;
                Self::from_name(name, Some(value))
            }
            None => Self::from_name(s, None),
        }
    }
}

impl fmt::Display for MissingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingPolicy::Threshold { tolerance } => write!(f, "threshold:{tolerance}"),
            MissingPolicy::AtLeastN { n } => write!(f, "at_least_n:{n}"),
            other => f.write_str(other.name()),
        }
    }
}

/// Decide whether `period`'s output is valid.
///
/// `expected` is usually [`Period::expected`]; it is passed separately so a
/// caller can validate against another sampling assumption.
pub fn validate(period: &Period, valid: usize, expected: usize, policy: MissingPolicy) -> Validity {
    let validity = policy.decide(valid, expected);
    if validity == Validity::Masked {
        tracing::trace!(
            period = %period.label(),
            valid,
            expected,
            policy = policy.name(),
            "period masked"
        );
    }
    validity
}

/// Mask the periods of `output` that any input fails under `policy`.
///
/// `counts` holds one valid-count matrix per input, each with one row per
/// period of `grouping` and one column per location of `output`.
///
/// # Errors
/// [`Error::ShapeMismatch`] if a count matrix does not match `output`.
pub fn mask_invalid(
    output: &LabeledArray,
    grouping: &Grouping,
    counts: &[ValidCounts],
    policy: MissingPolicy,
) -> Result<LabeledArray> {
    ensure!(
        output.n_times() == grouping.len(),
        "output of `{}` has {} steps for {} periods",
        output.name(),
        output.n_times(),
        grouping.len()
    );
    for c in counts {
        if c.shape() != (grouping.len(), output.n_locations()) {
            return Err(Error::ShapeMismatch(format!(
                "valid counts are {:?}, output `{}` is {:?}",
                c.shape(),
                output.name(),
                (grouping.len(), output.n_locations())
            )));
        }
    }
    if policy == MissingPolicy::None {
        return Ok(output.clone());
    }
    let periods = grouping.periods();
    Ok(output.mask_where(|t, loc| {
        let period = &periods[t];
        counts
            .iter()
            .any(|c| validate(period, c[(t, loc)], period.expected(), policy) == Validity::Masked)
    }))
}
