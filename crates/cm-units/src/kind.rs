//! Recognised physical kinds of input variables.
//!
//! A kind is declared explicitly on an array and checked against what an
//! indicator accepts. Kinds are grouped into families: two kinds of the
//! same family (daily mean vs. daily maximum temperature) are compatible
//! with a warning, kinds of different families are not.

use serde::{Deserialize, Serialize};

use crate::dimension::Dimension;
use crate::registry::Context;

/// Family of physically comparable kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KindFamily {
    /// Air temperature of any statistic.
    Temperature,
    /// Precipitation flux.
    Precipitation,
    /// River discharge.
    Streamflow,
    /// Thickness of the snow pack.
    SnowDepth,
    /// Snow water equivalent.
    SnowAmount,
    /// Pure numbers.
    Dimensionless,
}

/// A physical kind of variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhysicalKind {
    /// Daily mean near-surface air temperature (`tas`).
    AirTemperature,
    /// Daily maximum near-surface air temperature (`tasmax`).
    MaxAirTemperature,
    /// Daily minimum near-surface air temperature (`tasmin`).
    MinAirTemperature,
    /// Precipitation flux (`pr`).
    Precipitation,
    /// River discharge (`q`).
    Discharge,
    /// Surface snow thickness (`snd`).
    SnowDepth,
    /// Surface snow amount (`snw`).
    SnowAmount,
    /// Dimensionless variable.
    Dimensionless,
}

impl PhysicalKind {
    /// All kinds, in declaration order.
    pub const ALL: [PhysicalKind; 8] = [
        PhysicalKind::AirTemperature,
        PhysicalKind::MaxAirTemperature,
        PhysicalKind::MinAirTemperature,
        PhysicalKind::Precipitation,
        PhysicalKind::Discharge,
        PhysicalKind::SnowDepth,
        PhysicalKind::SnowAmount,
        PhysicalKind::Dimensionless,
    ];

    /// Conventional short variable name.
    pub fn var_name(&self) -> &'static str {
        match self {
            PhysicalKind::AirTemperature => "tas",
            PhysicalKind::MaxAirTemperature => "tasmax",
            PhysicalKind::MinAirTemperature => "tasmin",
            PhysicalKind::Precipitation => "pr",
            PhysicalKind::Discharge => "q",
            PhysicalKind::SnowDepth => "snd",
            PhysicalKind::SnowAmount => "snw",
            PhysicalKind::Dimensionless => "",
        }
    }

    /// Look a kind up by its conventional variable name.
    pub fn from_var_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.var_name() == name && !name.is_empty())
    }

    /// CF standard name.
    pub fn standard_name(&self) -> &'static str {
        match self {
            PhysicalKind::AirTemperature
            | PhysicalKind::MaxAirTemperature
            | PhysicalKind::MinAirTemperature => "air_temperature",
            PhysicalKind::Precipitation => "precipitation_flux",
            PhysicalKind::Discharge => "water_volume_transport_in_river_channel",
            PhysicalKind::SnowDepth => "surface_snow_thickness",
            PhysicalKind::SnowAmount => "surface_snow_amount",
            PhysicalKind::Dimensionless => "",
        }
    }

    /// Family this kind belongs to.
    pub fn family(&self) -> KindFamily {
        match self {
            PhysicalKind::AirTemperature
            | PhysicalKind::MaxAirTemperature
            | PhysicalKind::MinAirTemperature => KindFamily::Temperature,
            PhysicalKind::Precipitation => KindFamily::Precipitation,
            PhysicalKind::Discharge => KindFamily::Streamflow,
            PhysicalKind::SnowDepth => KindFamily::SnowDepth,
            PhysicalKind::SnowAmount => KindFamily::SnowAmount,
            PhysicalKind::Dimensionless => KindFamily::Dimensionless,
        }
    }

    /// Canonical dimension of the kind.
    pub fn dimension(&self) -> Dimension {
        match self.family() {
            KindFamily::Temperature => Dimension::TEMPERATURE,
            KindFamily::Precipitation => Dimension::PRECIPITATION,
            KindFamily::Streamflow => Dimension::DISCHARGE,
            KindFamily::SnowDepth => Dimension::LENGTH,
            KindFamily::SnowAmount => Dimension::AREAL_MASS,
            KindFamily::Dimensionless => Dimension::NONE,
        }
    }

    /// Conversion context used when bringing values of this kind into
    /// another unit.
    pub fn context(&self) -> Context {
        match self.family() {
            KindFamily::Precipitation | KindFamily::SnowAmount => Context::Hydro,
            _ => Context::None,
        }
    }

    /// Whether values with dimension `dim` can represent this kind.
    pub fn accepts_dimension(&self, dim: Dimension) -> bool {
        let canonical = self.dimension();
        if dim == canonical {
            return true;
        }
        self.context() == Context::Hydro
            && (dim == canonical.mul(Dimension::DENSITY) || canonical == dim.mul(Dimension::DENSITY))
    }
}

impl std::fmt::Display for PhysicalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PhysicalKind::AirTemperature => "daily mean air temperature",
            PhysicalKind::MaxAirTemperature => "daily maximum air temperature",
            PhysicalKind::MinAirTemperature => "daily minimum air temperature",
            PhysicalKind::Precipitation => "precipitation flux",
            PhysicalKind::Discharge => "river discharge",
            PhysicalKind::SnowDepth => "snow depth",
            PhysicalKind::SnowAmount => "snow amount",
            PhysicalKind::Dimensionless => "dimensionless quantity",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::registry;

    #[test]
    fn var_name_lookup() {
        assert_eq!(PhysicalKind::from_var_name("tasmax"), Some(PhysicalKind::MaxAirTemperature));
        assert_eq!(PhysicalKind::from_var_name("pr"), Some(PhysicalKind::Precipitation));
        assert_eq!(PhysicalKind::from_var_name(""), None);
        assert_eq!(PhysicalKind::from_var_name("zzz"), None);
    }

    #[test]
    fn families() {
        assert_eq!(PhysicalKind::AirTemperature.family(), PhysicalKind::MaxAirTemperature.family());
        assert_ne!(PhysicalKind::Precipitation.family(), PhysicalKind::MaxAirTemperature.family());
    }

    #[test]
    fn dimension_acceptance() {
        let reg = registry();
        let pr = PhysicalKind::Precipitation;
        assert!(pr.accepts_dimension(reg.dimension_of("mm/d").unwrap()));
        assert!(pr.accepts_dimension(reg.dimension_of("kg m-2 s-1").unwrap()));
        assert!(!pr.accepts_dimension(reg.dimension_of("K").unwrap()));
        let snw = PhysicalKind::SnowAmount;
        assert!(snw.accepts_dimension(reg.dimension_of("kg m-2").unwrap()));
        assert!(snw.accepts_dimension(reg.dimension_of("mm").unwrap()));
        assert!(!PhysicalKind::SnowDepth.accepts_dimension(reg.dimension_of("kg m-2").unwrap()));
    }
}
