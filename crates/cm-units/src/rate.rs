//! Conversions between rates and accumulated amounts.
//!
//! A rate (`mm/d`, `kg m-2 s-1`) integrated over a sampling step becomes an
//! amount (`mm`, `kg m-2`). The amount keeps the rate's non-time terms; the
//! time term is absorbed into a multiplicative factor.

use cm_core::errors::{Error, Result};
use cm_core::Real;

use crate::dimension::Dimension;
use crate::registry::{format_terms, Term, Unit, UnitRegistry};

/// Result of a rate/amount conversion: multiply values by `factor` and label
/// them with `units`.
#[derive(Debug, Clone, PartialEq)]
pub struct AmountConversion {
    /// Multiplier applied to every value.
    pub factor: Real,
    /// Units of the converted values.
    pub units: String,
}

impl UnitRegistry {
    /// Units and factor that turn a rate sampled every `step_seconds` into
    /// the amount accumulated during one step.
    ///
    /// # Errors
    /// [`Error::IncompatibleUnits`] when `rate_unit` has no `[time]^-1` term.
    pub fn rate_to_amount(&self, rate_unit: &str, step_seconds: Real) -> Result<AmountConversion> {
        let unit = self.parse(rate_unit)?;
        let position = unit
            .terms()
            .iter()
            .rposition(|t| t.exponent == -1 && self.is_time_symbol(&t.symbol))
            .ok_or_else(|| not_a_rate(&unit, "a rate"))?;
        let time_term = &unit.terms()[position];
        let seconds = self.seconds_in(&time_term.symbol)?;

        let remaining: Vec<Term> = unit
            .terms()
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != position)
            .map(|(_, t)| t.clone())
            .collect();
        Ok(AmountConversion {
            factor: unit.scale() * step_seconds / seconds,
            units: render(&remaining),
        })
    }

    /// Units and factor that turn an amount accumulated over one step of
    /// `step_symbol` (`d`, `h`, `s`...) into a rate per `step_symbol`.
    ///
    /// # Errors
    /// [`Error::UnparseableUnit`] if either unit is unknown and
    /// [`Error::IncompatibleUnits`] if `step_symbol` is not a time unit.
    pub fn amount_to_rate(&self, amount_unit: &str, step_symbol: &str) -> Result<AmountConversion> {
        let unit = self.parse(amount_unit)?;
        let step = self.parse(step_symbol)?;
        if step.dimension() != Dimension::TIME || step.terms().len() != 1 {
            return Err(not_a_rate(&step, "a time step"));
        }
        let mut terms = unit.terms().to_vec();
        let symbol = step.terms()[0].symbol.clone();
        match terms.iter_mut().find(|t| t.symbol == symbol) {
            Some(existing) => existing.exponent -= 1,
            None => terms.push(Term { symbol, exponent: -1 }),
        }
        terms.retain(|t| t.exponent != 0);
        Ok(AmountConversion {
            factor: unit.scale() / step.scale(),
            units: render(&terms),
        })
    }

    fn is_time_symbol(&self, symbol: &str) -> bool {
        self.lookup(symbol)
            .map(|(_, def)| def.dimension == Dimension::TIME)
            .unwrap_or(false)
    }

    fn seconds_in(&self, symbol: &str) -> Result<Real> {
        self.lookup(symbol)
            .map(|(_, def)| def.factor)
            .ok_or_else(|| Error::unparseable_unit(symbol, "unknown symbol"))
    }
}

fn render(terms: &[Term]) -> String {
    if terms.is_empty() {
        String::new()
    } else {
        format_terms(terms)
    }
}

fn not_a_rate(unit: &Unit, wanted: &str) -> Error {
    Error::IncompatibleUnits {
        from: unit.source().to_string(),
        to: wanted.to_string(),
        from_dimension: unit.dimension().to_string(),
        to_dimension: if wanted == "a rate" {
            "[...] / [time]".to_string()
        } else {
            Dimension::TIME.to_string()
        },
    }
}
