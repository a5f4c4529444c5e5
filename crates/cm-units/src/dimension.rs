//! Physical dimensions as vectors of base-dimension exponents.

use serde::{Deserialize, Serialize};

/// Base dimensions, in storage order.
const BASE_NAMES: [&str; 5] = ["length", "mass", "time", "temperature", "substance"];

/// A class of mutually convertible units, e.g. `[length]/[time]`.
///
/// Stored as integer exponents of the base dimensions
/// (length, mass, time, temperature, amount of substance).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Dimension([i8; 5]);

impl Dimension {
    /// Dimensionless (`[]`).
    pub const NONE: Dimension = Dimension([0, 0, 0, 0, 0]);
    /// `[length]`.
    pub const LENGTH: Dimension = Dimension([1, 0, 0, 0, 0]);
    /// `[mass]`.
    pub const MASS: Dimension = Dimension([0, 1, 0, 0, 0]);
    /// `[time]`.
    pub const TIME: Dimension = Dimension([0, 0, 1, 0, 0]);
    /// `[temperature]`.
    pub const TEMPERATURE: Dimension = Dimension([0, 0, 0, 1, 0]);
    /// `[substance]`.
    pub const SUBSTANCE: Dimension = Dimension([0, 0, 0, 0, 1]);
    /// `[length]/[time]`, e.g. precipitation rate.
    pub const PRECIPITATION: Dimension = Dimension([1, 0, -1, 0, 0]);
    /// `[mass]/[length]^2/[time]`, precipitation mass flux.
    pub const MASS_FLUX: Dimension = Dimension([-2, 1, -1, 0, 0]);
    /// `[length]^3/[time]`, e.g. river discharge.
    pub const DISCHARGE: Dimension = Dimension([3, 0, -1, 0, 0]);
    /// `[mass]/[length]^2`, e.g. snow amount.
    pub const AREAL_MASS: Dimension = Dimension([-2, 1, 0, 0, 0]);
    /// `[mass]/[length]^3`, density.
    pub const DENSITY: Dimension = Dimension([-3, 1, 0, 0, 0]);

    /// Build from raw exponents `(length, mass, time, temperature, substance)`.
    pub const fn from_exponents(exps: [i8; 5]) -> Self {
        Dimension(exps)
    }

    /// The raw exponents.
    pub fn exponents(&self) -> [i8; 5] {
        self.0
    }

    /// Return `true` for `[]`.
    pub fn is_dimensionless(&self) -> bool {
        self.0 == [0; 5]
    }

    /// Exponent of `[time]`.
    pub fn time_exponent(&self) -> i8 {
        self.0[2]
    }

    /// Exponent of `[temperature]`.
    pub fn temperature_exponent(&self) -> i8 {
        self.0[3]
    }

    /// Dimension of `self * other`.
    pub fn mul(self, other: Dimension) -> Dimension {
        let mut out = self.0;
        for (o, e) in out.iter_mut().zip(other.0) {
            *o += e;
        }
        Dimension(out)
    }

    /// Dimension of `self / other`.
    pub fn div(self, other: Dimension) -> Dimension {
        self.mul(other.powi(-1))
    }

    /// Dimension of `self ^ n`.
    pub fn powi(self, n: i8) -> Dimension {
        let mut out = self.0;
        for o in out.iter_mut() {
            *o *= n;
        }
        Dimension(out)
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_dimensionless() {
            return f.write_str("[]");
        }
        let render = |name: &str, e: i8| {
            if e == 1 {
                format!("[{name}]")
            } else {
                format!("[{name}]^{e}")
            }
        };
        let num: Vec<String> = BASE_NAMES
            .iter()
            .zip(self.0)
            .filter(|(_, e)| *e > 0)
            .map(|(n, e)| render(*n, e))
            .collect();
        let den: Vec<String> = BASE_NAMES
            .iter()
            .zip(self.0)
            .filter(|(_, e)| *e < 0)
            .map(|(n, e)| render(*n, -e))
            .collect();
        let mut out = if num.is_empty() {
            "1".to_string()
        } else {
            num.join(" * ")
        };
        for d in den {
            out.push_str(" / ");
            out.push_str(&d);
        }
        f.write_str(&out)
    }
}
