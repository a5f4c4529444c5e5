//! The unit registry: parsing, dimension lookup and conversion.
//!
//! Unit strings follow udunits-like conventions. A string is a product of
//! terms, each a known symbol with an optional integer exponent:
//!
//! | Text | Terms |
//! |------|-------|
//! | `mm/d` | `mm`, `d^-1` |
//! | `mm d-1` | `mm`, `d^-1` |
//! | `kg m-2 s-1` | `kg`, `m^-2`, `s^-1` |
//! | `m^3/s`, `m**3 s-1`, `m3.s-1` | `m^3`, `s^-1` |
//! | `degC`, `°C`, `C`, `deg_C` | `degC` |
//!
//! Temperature scales are affine: the additive offset only applies when the
//! temperature symbol stands alone. Inside a compound unit (`K d`, `degC/d`)
//! the temperature is treated as a difference.

use std::collections::HashMap;
use std::sync::OnceLock;

use cm_core::errors::{Error, Result};
use cm_core::Real;
use serde::{Deserialize, Serialize};

use crate::dimension::Dimension;

/// Density of liquid water in kg m-3, used by [`Context::Hydro`].
pub const WATER_DENSITY: Real = 1000.0;

/// Definition of a single symbol relative to SI base units.
///
/// A value `v` in this unit equals `v * factor + offset` in SI.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitDef {
    /// Multiplicative factor to SI.
    pub factor: Real,
    /// Additive offset to SI (non-zero only for temperature scales).
    pub offset: Real,
    /// Dimension of the symbol.
    pub dimension: Dimension,
}

/// Extra conversion rules that bridge otherwise distinct dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Context {
    /// Strict dimensional analysis.
    #[default]
    None,
    /// Water-equivalent conversions: mass fluxes ↔ length rates and
    /// areal masses ↔ lengths through the density of water.
    Hydro,
}

type Builtin = (&'static str, &'static [&'static str], Real, Real, Dimension);

const PRESSURE: Dimension = Dimension::from_exponents([-1, 1, -2, 0, 0]);
const POWER: Dimension = Dimension::from_exponents([2, 1, -3, 0, 0]);
const ENERGY: Dimension = Dimension::from_exponents([2, 1, -2, 0, 0]);

const BUILTINS: &[Builtin] = &[
    // length
    ("m", &["meter", "meters", "metre", "metres"], 1.0, 0.0, Dimension::LENGTH),
    ("km", &["kilometer", "kilometers", "kilometre", "kilometres"], 1e3, 0.0, Dimension::LENGTH),
    ("cm", &["centimeter", "centimeters", "centimetre", "centimetres"], 1e-2, 0.0, Dimension::LENGTH),
    ("mm", &["millimeter", "millimeters", "millimetre", "millimetres"], 1e-3, 0.0, Dimension::LENGTH),
    ("um", &["µm", "micrometer", "micrometers"], 1e-6, 0.0, Dimension::LENGTH),
    ("in", &["inch", "inches"], 0.0254, 0.0, Dimension::LENGTH),
    ("ft", &["foot", "feet"], 0.3048, 0.0, Dimension::LENGTH),
    // mass
    ("kg", &["kilogram", "kilograms"], 1.0, 0.0, Dimension::MASS),
    ("g", &["gram", "grams"], 1e-3, 0.0, Dimension::MASS),
    ("mg", &["milligram", "milligrams"], 1e-6, 0.0, Dimension::MASS),
    ("t", &["tonne", "tonnes"], 1e3, 0.0, Dimension::MASS),
    // time
    ("s", &["sec", "second", "seconds"], 1.0, 0.0, Dimension::TIME),
    ("min", &["minute", "minutes"], 60.0, 0.0, Dimension::TIME),
    ("h", &["hr", "hour", "hours"], 3_600.0, 0.0, Dimension::TIME),
    ("d", &["day", "days"], 86_400.0, 0.0, Dimension::TIME),
    ("week", &["weeks"], 604_800.0, 0.0, Dimension::TIME),
    // temperature
    (
        "K",
        &["kelvin", "degK", "deg_K", "degree_K", "degrees_K", "degree_Kelvin", "degrees_Kelvin"],
        1.0,
        0.0,
        Dimension::TEMPERATURE,
    ),
    (
        "degC",
        &[
            "°C",
            "C",
            "celsius",
            "deg_C",
            "degree_C",
            "degrees_C",
            "degree_Celsius",
            "degrees_Celsius",
        ],
        1.0,
        273.15,
        Dimension::TEMPERATURE,
    ),
    (
        "degF",
        &[
            "°F",
            "F",
            "fahrenheit",
            "deg_F",
            "degree_F",
            "degrees_F",
            "degree_Fahrenheit",
            "degrees_Fahrenheit",
        ],
        5.0 / 9.0,
        459.67 * 5.0 / 9.0,
        Dimension::TEMPERATURE,
    ),
    // substance
    ("mol", &["mole", "moles"], 1.0, 0.0, Dimension::SUBSTANCE),
    // dimensionless
    ("%", &["percent", "pct"], 0.01, 0.0, Dimension::NONE),
    // derived
    ("Pa", &["pascal"], 1.0, 0.0, PRESSURE),
    ("hPa", &["hectopascal", "mbar"], 100.0, 0.0, PRESSURE),
    ("W", &["watt", "watts"], 1.0, 0.0, POWER),
    ("J", &["joule", "joules"], 1.0, 0.0, ENERGY),
];

/// One `symbol^exponent` factor of a unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Term {
    /// Canonical symbol, e.g. `degC` for `°C`.
    pub symbol: String,
    /// Integer exponent (never zero).
    pub exponent: i32,
}

/// A parsed unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    source: String,
    terms: Vec<Term>,
    scale: Real,
    factor: Real,
    offset: Real,
    dimension: Dimension,
}

impl Unit {
    /// The text the unit was parsed from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The symbol terms, in order of first appearance.
    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// Leading numeric scale (`1` unless the text carried a number).
    pub fn scale(&self) -> Real {
        self.scale
    }

    /// Factor to SI, including any numeric scale.
    pub fn factor(&self) -> Real {
        self.factor
    }

    /// Offset to SI (non-zero only for a lone temperature scale).
    pub fn offset(&self) -> Real {
        self.offset
    }

    /// Dimension of the unit.
    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    /// `true` for a lone affine temperature scale such as `degC`.
    pub fn is_affine(&self) -> bool {
        self.offset != 0.0
    }

    /// `true` when the unit is a temperature on an absolute scale
    /// (`K`, `degC`, `degF` standing alone).
    pub fn is_temperature_on_scale(&self) -> bool {
        self.dimension == Dimension::TEMPERATURE
            && self.terms.len() == 1
            && self.terms[0].exponent == 1
            && self.scale == 1.0
    }

    /// Canonical text of the unit (`kg m-2 s-1` style).
    pub fn canonical(&self) -> String {
        let body = format_terms(&self.terms);
        if self.scale == 1.0 {
            body
        } else if self.terms.is_empty() {
            format!("{}", self.scale)
        } else {
            format!("{} {body}", self.scale)
        }
    }
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.canonical())
    }
}

/// Render terms as `sym sym2 sym-1`. An empty list renders as `1`.
pub fn format_terms(terms: &[Term]) -> String {
    if terms.is_empty() {
        return "1".to_string();
    }
    terms
        .iter()
        .map(|t| {
            if t.exponent == 1 {
                t.symbol.clone()
            } else {
                format!("{}{}", t.symbol, t.exponent)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// An affine map `v ↦ v * scale + shift` between two units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Converter {
    scale: Real,
    shift: Real,
}

impl Converter {
    /// The identity conversion.
    pub const IDENTITY: Converter = Converter {
        scale: 1.0,
        shift: 0.0,
    };

    /// Multiplicative part.
    pub fn scale(&self) -> Real {
        self.scale
    }

    /// Additive part.
    pub fn shift(&self) -> Real {
        self.shift
    }

    /// `true` if applying the converter leaves values unchanged.
    pub fn is_identity(&self) -> bool {
        self.scale == 1.0 && self.shift == 0.0
    }

    /// Convert one value. The missing sentinel passes through unchanged.
    #[inline]
    pub fn apply(&self, value: Real) -> Real {
        if self.is_identity() {
            value
        } else {
            value * self.scale + self.shift
        }
    }

    /// Convert every value in place.
    pub fn apply_slice(&self, values: &mut [Real]) {
        if self.is_identity() {
            return;
        }
        for v in values.iter_mut() {
            *v = *v * self.scale + self.shift;
        }
    }

    /// The conversion in the opposite direction.
    pub fn inverse(&self) -> Converter {
        Converter {
            scale: 1.0 / self.scale,
            shift: -self.shift / self.scale,
        }
    }
}

/// Symbol table plus parsing and conversion rules.
///
/// Most callers use the process-wide registry returned by [`registry`];
/// build a private one with [`UnitRegistry::new`] to [`define`][Self::define]
/// extra symbols.
#[derive(Debug, Clone)]
pub struct UnitRegistry {
    canonical: HashMap<String, UnitDef>,
    aliases: HashMap<String, String>,
}

impl Default for UnitRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl UnitRegistry {
    /// A registry holding the built-in symbols.
    pub fn new() -> Self {
        let mut reg = Self {
            canonical: HashMap::new(),
            aliases: HashMap::new(),
        };
        for &(symbol, aliases, factor, offset, dimension) in BUILTINS {
            reg.define(
                symbol,
                aliases,
                UnitDef {
                    factor,
                    offset,
                    dimension,
                },
            );
        }
        reg
    }

    /// Add (or replace) a symbol and its aliases.
    pub fn define(&mut self, symbol: &str, aliases: &[&str], def: UnitDef) {
        self.canonical.insert(symbol.to_string(), def);
        self.aliases.insert(symbol.to_string(), symbol.to_string());
        for alias in aliases {
            self.aliases.insert((*alias).to_string(), symbol.to_string());
        }
    }

    /// Look up a symbol or alias, returning its canonical name and definition.
    pub fn lookup(&self, symbol: &str) -> Option<(&str, UnitDef)> {
        let canonical = self
            .aliases
            .get(symbol)
            .or_else(|| self.aliases.get(&symbol.to_lowercase()))?;
        let def = self.canonical.get(canonical)?;
        Some((canonical.as_str(), *def))
    }

    /// Parse a unit string.
    ///
    /// The empty string and `1` parse as dimensionless.
    ///
    /// # Errors
    /// [`Error::UnparseableUnit`] for unknown symbols or malformed exponents.
    pub fn parse(&self, text: &str) -> Result<Unit> {
        let normalized = text.trim().replace("**", "^");
        let mut terms: Vec<Term> = Vec::new();
        let mut scale: Real = 1.0;
        let mut invert_next = false;

        for chunk in normalized.split(|c: char| c.is_whitespace() || c == '*') {
            if chunk.is_empty() {
                continue;
            }
            if let Ok(number) = chunk.parse::<Real>() {
                if number == 0.0 || !number.is_finite() {
                    return Err(Error::unparseable_unit(text, "scale factor must be finite and non-zero"));
                }
                scale = if invert_next { scale / number } else { scale * number };
                invert_next = false;
                continue;
            }
            for (i, part) in chunk.split('/').enumerate() {
                if i > 0 {
                    invert_next = true;
                }
                if part.is_empty() {
                    continue;
                }
                for factor in part.split('.') {
                    if factor.is_empty() {
                        return Err(Error::unparseable_unit(text, "empty factor"));
                    }
                    let (symbol, mut exponent) = split_exponent(factor)
                        .ok_or_else(|| Error::unparseable_unit(text, format!("malformed term `{factor}`")))?;
                    if invert_next {
                        exponent = -exponent;
                    }
                    if symbol == "1" {
                        continue;
                    }
                    let (canonical, _) = self
                        .lookup(symbol)
                        .ok_or_else(|| Error::unparseable_unit(text, format!("unknown symbol `{symbol}`")))?;
                    push_term(&mut terms, canonical, exponent);
                }
                invert_next = false;
            }
        }
        if invert_next {
            return Err(Error::unparseable_unit(text, "dangling `/`"));
        }

        let mut factor = scale;
        let mut dimension = Dimension::NONE;
        for term in &terms {
            let (_, def) = self
                .lookup(&term.symbol)
                .ok_or_else(|| Error::unparseable_unit(text, format!("unknown symbol `{}`", term.symbol)))?;
            factor *= def.factor.powi(term.exponent);
            let exp = i8::try_from(term.exponent)
                .map_err(|_| Error::unparseable_unit(text, "exponent out of range"))?;
            dimension = dimension.mul(def.dimension.powi(exp));
        }
        let offset = match terms.as_slice() {
            [only] if only.exponent == 1 && scale == 1.0 => {
                self.lookup(&only.symbol).map(|(_, d)| d.offset).unwrap_or(0.0)
            }
            _ => 0.0,
        };

        Ok(Unit {
            source: text.to_string(),
            terms,
            scale,
            factor,
            offset,
            dimension,
        })
    }

    /// Dimension of a unit string.
    pub fn dimension_of(&self, unit: &str) -> Result<Dimension> {
        Ok(self.parse(unit)?.dimension())
    }

    /// `true` if values in `a` can be converted to `b` under strict
    /// dimensional analysis. Unparseable units are never convertible.
    pub fn are_convertible(&self, a: &str, b: &str) -> bool {
        self.are_convertible_with(a, b, Context::None)
    }

    /// [`are_convertible`][Self::are_convertible] under a conversion context.
    pub fn are_convertible_with(&self, a: &str, b: &str, context: Context) -> bool {
        self.converter_with(a, b, context).is_ok()
    }

    /// `true` if both strings denote exactly the same unit (`mm/d` vs `mm d-1`).
    pub fn same_units(&self, a: &str, b: &str) -> bool {
        match (self.parse(a), self.parse(b)) {
            (Ok(ua), Ok(ub)) => {
                ua.dimension == ub.dimension
                    && relative_eq(ua.factor, ub.factor)
                    && relative_eq(ua.offset, ub.offset)
            }
            _ => false,
        }
    }

    /// Build the conversion from `from` to `to`.
    pub fn converter(&self, from: &str, to: &str) -> Result<Converter> {
        self.converter_with(from, to, Context::None)
    }

    /// Build the conversion from `from` to `to` under `context`.
    ///
    /// # Errors
    /// [`Error::UnparseableUnit`] or [`Error::IncompatibleUnits`].
    pub fn converter_with(&self, from: &str, to: &str, context: Context) -> Result<Converter> {
        let uf = self.parse(from)?;
        let ut = self.parse(to)?;
        self.converter_between(&uf, &ut, context)
    }

    /// Build the conversion between two parsed units.
    pub fn converter_between(&self, from: &Unit, to: &Unit, context: Context) -> Result<Converter> {
        let bridge = if from.dimension == to.dimension {
            1.0
        } else {
            match context {
                Context::Hydro if from.dimension == to.dimension.mul(Dimension::DENSITY) => {
                    1.0 / WATER_DENSITY
                }
                Context::Hydro if to.dimension == from.dimension.mul(Dimension::DENSITY) => {
                    WATER_DENSITY
                }
                _ => {
                    return Err(Error::IncompatibleUnits {
                        from: from.source.clone(),
                        to: to.source.clone(),
                        from_dimension: from.dimension.to_string(),
                        to_dimension: to.dimension.to_string(),
                    })
                }
            }
        };
        if from.source == to.source && bridge == 1.0 {
            return Ok(Converter::IDENTITY);
        }
        Ok(Converter {
            scale: from.factor * bridge / to.factor,
            shift: (from.offset * bridge - to.offset) / to.factor,
        })
    }

    /// Convert a single value.
    pub fn convert(&self, value: Real, from: &str, to: &str) -> Result<Real> {
        Ok(self.converter(from, to)?.apply(value))
    }

    /// Convert a single value under `context`.
    pub fn convert_with(&self, value: Real, from: &str, to: &str, context: Context) -> Result<Real> {
        Ok(self.converter_with(from, to, context)?.apply(value))
    }
}

/// The process-wide registry of built-in units.
pub fn registry() -> &'static UnitRegistry {
    static INSTANCE: OnceLock<UnitRegistry> = OnceLock::new();
    INSTANCE.get_or_init(UnitRegistry::new)
}

fn push_term(terms: &mut Vec<Term>, symbol: &str, exponent: i32) {
    if let Some(existing) = terms.iter_mut().find(|t| t.symbol == symbol) {
        existing.exponent += exponent;
    } else {
        terms.push(Term {
            symbol: symbol.to_string(),
            exponent,
        });
    }
    terms.retain(|t| t.exponent != 0);
}

/// Split `m2`, `s-1`, `m^3` into symbol and exponent.
fn split_exponent(token: &str) -> Option<(&str, i32)> {
    if token == "1" {
        return Some(("1", 1));
    }
    let start = token
        .char_indices()
        .find(|&(_, c)| c == '^' || c == '-' || c == '+' || c.is_ascii_digit())
        .map(|(i, _)| i);
    match start {
        None => Some((token, 1)),
        Some(0) => None,
        Some(i) => {
            let exponent: i32 = token[i..].trim_start_matches('^').parse().ok()?;
            if exponent == 0 {
                return None;
            }
            Some((&token[..i], exponent))
        }
    }
}

fn relative_eq(a: Real, b: Real) -> bool {
    (a - b).abs() <= 1e-12 * a.abs().max(b.abs()).max(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn parses_compound_forms() {
        let reg = UnitRegistry::new();
        for text in ["mm/d", "mm d-1", "mm.d-1", "mm / d", "mm*d^-1", "mm d**-1"] {
            let u = reg.parse(text).unwrap();
            assert_eq!(u.dimension(), Dimension::PRECIPITATION, "{text}");
            assert_relative_eq!(u.factor(), 1e-3 / 86_400.0, max_relative = 1e-12);
            assert_eq!(u.canonical(), "mm d-1", "{text}");
        }
        let flux = reg.parse("kg m-2 s-1").unwrap();
        assert_eq!(flux.dimension(), Dimension::MASS_FLUX);
        let q = reg.parse("m^3/s").unwrap();
        assert_eq!(q.dimension(), Dimension::DISCHARGE);
    }

    #[test]
    fn dimensionless_forms() {
        let reg = UnitRegistry::new();
        assert!(reg.parse("").unwrap().dimension().is_dimensionless());
        assert!(reg.parse("1").unwrap().dimension().is_dimensionless());
        assert_relative_eq!(reg.parse("%").unwrap().factor(), 0.01, max_relative = 1e-12);
    }

    #[test]
    fn unknown_symbols_fail() {
        let reg = UnitRegistry::new();
        assert!(matches!(reg.parse("furlong"), Err(Error::UnparseableUnit { .. })));
        assert!(matches!(reg.parse("mm/"), Err(Error::UnparseableUnit { .. })));
        assert!(matches!(reg.parse("m^x"), Err(Error::UnparseableUnit { .. })));
    }

    #[test]
    fn temperature_is_affine_only_when_alone() {
        let reg = UnitRegistry::new();
        assert!(reg.parse("degC").unwrap().is_affine());
        assert!(reg.parse("°C").unwrap().is_affine());
        assert!(!reg.parse("degC d").unwrap().is_affine());
        assert!(!reg.parse("K").unwrap().is_affine());
    }

    #[test]
    fn temperature_conversions() {
        let reg = UnitRegistry::new();
        assert_relative_eq!(reg.convert(20.0, "degC", "K").unwrap(), 293.15, epsilon = 1e-9);
        assert_relative_eq!(reg.convert(293.15, "K", "C").unwrap(), 20.0, epsilon = 1e-12);
        assert_relative_eq!(reg.convert(212.0, "degF", "degC").unwrap(), 100.0, epsilon = 1e-9);
        assert_relative_eq!(reg.convert(-40.0, "degC", "degF").unwrap(), -40.0, epsilon = 1e-9);
        // differences ignore the offset
        assert_relative_eq!(reg.convert(1.0, "degC/d", "K/d").unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn rate_conversion_uses_time_basis() {
        let reg = UnitRegistry::new();
        assert_relative_eq!(reg.convert(1.0, "mm/s", "mm/d").unwrap(), 86_400.0, max_relative = 1e-12);
        assert_relative_eq!(reg.convert(86_400.0, "mm d-1", "mm/s").unwrap(), 1.0, max_relative = 1e-12);
    }

    #[test]
    fn incompatible_dimensions() {
        let reg = UnitRegistry::new();
        let err = reg.convert(1.0, "mm/d", "K").unwrap_err();
        assert!(err.is_unit_error());
        assert!(!reg.are_convertible("mm/d", "K"));
        assert!(reg.are_convertible("mm/d", "m s-1"));
        assert!(!reg.are_convertible("nonsense", "K"));
    }

    #[test]
    fn hydro_context_bridges_mass_flux() {
        let reg = UnitRegistry::new();
        assert!(!reg.are_convertible("kg m-2 s-1", "mm/d"));
        assert!(reg.are_convertible_with("kg m-2 s-1", "mm/d", Context::Hydro));
        // 1 kg m-2 of water is 1 mm.
        assert_relative_eq!(
            reg.convert_with(1.0, "kg m-2 s-1", "mm/s", Context::Hydro).unwrap(),
            1.0,
            epsilon = 1e-12
        );
        assert_relative_eq!(
            reg.convert_with(1.0, "mm", "kg m-2", Context::Hydro).unwrap(),
            1.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn same_units_ignores_spelling() {
        let reg = UnitRegistry::new();
        assert!(reg.same_units("mm/d", "mm d-1"));
        assert!(reg.same_units("degC", "°C"));
        assert!(!reg.same_units("degC", "K"));
    }

    #[test]
    fn converter_inverse() {
        let reg = UnitRegistry::new();
        let c = reg.converter("degF", "K").unwrap();
        let back = c.inverse();
        assert_relative_eq!(back.apply(c.apply(71.3)), 71.3, epsilon = 1e-10);
    }

    #[test]
    fn custom_definitions() {
        let mut reg = UnitRegistry::new();
        reg.define(
            "fortnight",
            &["fortnights"],
            UnitDef {
                factor: 14.0 * 86_400.0,
                offset: 0.0,
                dimension: Dimension::TIME,
            },
        );
        assert_relative_eq!(reg.convert(1.0, "fortnight", "d").unwrap(), 14.0, max_relative = 1e-12);
    }
}
