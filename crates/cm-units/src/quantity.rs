//! `Quantity`: a magnitude paired with a unit, parsed from literals such as
//! `"25 C"`, `"293.15 K"` or `"1.5mm/d"`.

use std::str::FromStr;

use cm_core::errors::{Error, Result};
use cm_core::Real;
use serde::{Deserialize, Serialize};

use crate::dimension::Dimension;
use crate::registry::{registry, Context};

/// A physical quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quantity {
    magnitude: Real,
    units: String,
}

impl Quantity {
    /// Build a quantity. The unit is validated lazily by the operations that
    /// need it; use [`Quantity::parse`] for validated construction.
    pub fn new(magnitude: Real, units: impl Into<String>) -> Self {
        Self {
            magnitude,
            units: units.into(),
        }
    }

    /// Parse `"<number> <unit>"`. Whitespace between the number and the unit
    /// is optional; a bare number is dimensionless.
    ///
    /// # Errors
    /// [`Error::UnparseableUnit`] when the literal has no leading number or
    /// the unit is unknown.
    pub fn parse(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        let candidate_len = trimmed
            .char_indices()
            .find(|&(_, c)| !(c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E')))
            .map(|(i, _)| i)
            .unwrap_or(trimmed.len());
        // Back off until the prefix is a number ("2e" in "2em" is not).
        let mut split = candidate_len;
        let magnitude = loop {
            if split == 0 {
                return Err(Error::unparseable_unit(
                    text,
                    "expected a quantity of the form `<number> <unit>`",
                ));
            }
            if let Ok(value) = trimmed[..split].parse::<Real>() {
                break value;
            }
            split -= 1;
        };
        let units = trimmed[split..].trim().to_string();
        registry().parse(&units)?;
        Ok(Self { magnitude, units })
    }

    /// The numeric magnitude.
    pub fn magnitude(&self) -> Real {
        self.magnitude
    }

    /// The unit string, as written.
    pub fn units(&self) -> &str {
        &self.units
    }

    /// The dimension of the unit.
    pub fn dimension(&self) -> Result<Dimension> {
        registry().dimension_of(&self.units)
    }

    /// The magnitude expressed in `units`.
    pub fn value_in(&self, units: &str) -> Result<Real> {
        self.value_in_with(units, Context::None)
    }

    /// The magnitude expressed in `units` under a conversion context.
    pub fn value_in_with(&self, units: &str, context: Context) -> Result<Real> {
        registry().convert_with(self.magnitude, &self.units, units, context)
    }

    /// The same quantity expressed in `units`.
    pub fn to(&self, units: &str) -> Result<Quantity> {
        Ok(Quantity::new(self.value_in(units)?, units))
    }
}

impl FromStr for Quantity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Quantity::parse(s)
    }
}

impl std::fmt::Display for Quantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.units.is_empty() {
            write!(f, "{}", self.magnitude)
        } else {
            write!(f, "{} {}", self.magnitude, self.units)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn parses_literals() {
        let q = Quantity::parse("25 C").unwrap();
        assert_eq!(q.magnitude(), 25.0);
        assert_eq!(q.units(), "C");

        let q: Quantity = "293.15 K".parse().unwrap();
        assert_eq!(q.magnitude(), 293.15);
        assert_eq!(q.dimension().unwrap(), Dimension::TEMPERATURE);

        let q = Quantity::parse("1.5mm/d").unwrap();
        assert_eq!(q.magnitude(), 1.5);
        assert_eq!(q.units(), "mm/d");

        let q = Quantity::parse("-2e-3 kg m-2 s-1").unwrap();
        assert_relative_eq!(q.magnitude(), -2e-3);

        let q = Quantity::parse("5").unwrap();
        assert!(q.dimension().unwrap().is_dimensionless());
    }

    #[test]
    fn rejects_garbage() {
        assert!(Quantity::parse("degC").is_err());
        assert!(Quantity::parse("20 parsecs-ish").is_err());
        assert!(Quantity::parse("").is_err());
    }

    #[test]
    fn converts_between_scales() {
        let q = Quantity::parse("20 degC").unwrap();
        assert_relative_eq!(q.value_in("K").unwrap(), 293.15, epsilon = 1e-9);
        let back = q.to("K").unwrap().to("degC").unwrap();
        assert_relative_eq!(back.magnitude(), 20.0, epsilon = 1e-9);
        assert!(q.value_in("mm/d").unwrap_err().is_unit_error());
    }

    #[test]
    fn display() {
        assert_eq!(Quantity::new(25.0, "degC").to_string(), "25 degC");
        assert_eq!(Quantity::new(0.5, "").to_string(), "0.5");
    }
}
