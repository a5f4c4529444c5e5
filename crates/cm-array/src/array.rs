//! `LabeledArray`: values over a time axis and named spatial axes, with
//! units, attributes, a declared physical kind and provenance.
//!
//! Values are held in an `nalgebra::DMatrix` with one row per time step and
//! one column per location (the spatial axes flattened in row-major order).
//! Every transformation returns a new array; inputs are never modified.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use cm_core::errors::{Error, Result};
use cm_core::{ensure, Real};
use cm_time::TimeAxis;
use cm_units::{registry, PhysicalKind};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

/// A named spatial axis.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpatialAxis {
    /// Axis name, e.g. `lat` or `station`.
    pub name: String,
    /// Number of positions along the axis.
    pub size: usize,
}

/// Where a computed array came from. Kept apart from the attribute map so
/// that attributes stay deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    /// Identifier of the indicator that produced the array.
    pub indicator: String,
    /// Wall-clock time of the computation.
    pub computed_at: DateTime<Utc>,
}

/// A labeled array.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledArray {
    name: String,
    time: TimeAxis,
    spatial: Vec<SpatialAxis>,
    values: DMatrix<Real>,
    units: Option<String>,
    attrs: BTreeMap<String, String>,
    kind: Option<PhysicalKind>,
    provenance: Option<Provenance>,
}

impl LabeledArray {
    /// Start building an array named `name` over `time`.
    pub fn builder(name: impl Into<String>, time: TimeAxis) -> LabeledArrayBuilder {
        LabeledArrayBuilder {
            name: name.into(),
            time,
            spatial: Vec::new(),
            values: Vec::new(),
            units: None,
            attrs: BTreeMap::new(),
            kind: None,
        }
    }

    /// A single-location series.
    pub fn series(name: impl Into<String>, time: TimeAxis, values: Vec<Real>, units: &str) -> Result<Self> {
        Self::builder(name, time).values(values).units(units).build()
    }

    /// Build from a prepared matrix (rows = time, columns = locations).
    ///
    /// # Errors
    /// [`Error::ShapeMismatch`] when the matrix does not match the axes.
    pub fn from_matrix(
        name: impl Into<String>,
        time: TimeAxis,
        spatial: Vec<SpatialAxis>,
        values: DMatrix<Real>,
    ) -> Result<Self> {
        let locations: usize = spatial.iter().map(|a| a.size).product();
        if values.nrows() != time.len() || values.ncols() != locations {
            return Err(Error::ShapeMismatch(format!(
                "matrix is {}x{}, axes need {}x{}",
                values.nrows(),
                values.ncols(),
                time.len(),
                locations
            )));
        }
        Ok(Self {
            name: name.into(),
            time,
            spatial,
            values,
            units: None,
            attrs: BTreeMap::new(),
            kind: None,
            provenance: None,
        })
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    /// Variable name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Time axis.
    pub fn time(&self) -> &TimeAxis {
        &self.time
    }

    /// Spatial axes.
    pub fn spatial(&self) -> &[SpatialAxis] {
        &self.spatial
    }

    /// Number of time steps.
    pub fn n_times(&self) -> usize {
        self.values.nrows()
    }

    /// Number of locations.
    pub fn n_locations(&self) -> usize {
        self.values.ncols()
    }

    /// The value matrix.
    pub fn values(&self) -> &DMatrix<Real> {
        &self.values
    }

    /// The time series of one location.
    pub fn column(&self, location: usize) -> &[Real] {
        let n = self.n_times();
        &self.values.as_slice()[location * n..(location + 1) * n]
    }

    /// Value at `(time, location)`.
    pub fn get(&self, time: usize, location: usize) -> Real {
        self.values[(time, location)]
    }

    /// Units, if declared.
    pub fn units(&self) -> Option<&str> {
        self.units.as_deref()
    }

    /// Units, failing when none are declared.
    ///
    /// # Errors
    /// [`Error::MissingUnits`].
    pub fn require_units(&self) -> Result<&str> {
        self.units.as_deref().ok_or_else(|| Error::MissingUnits {
            variable: self.name.clone(),
        })
    }

    /// All attributes.
    pub fn attrs(&self) -> &BTreeMap<String, String> {
        &self.attrs
    }

    /// One attribute.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }

    /// Declared physical kind.
    pub fn kind(&self) -> Option<PhysicalKind> {
        self.kind
    }

    /// Provenance of a computed array.
    pub fn provenance(&self) -> Option<&Provenance> {
        self.provenance.as_ref()
    }

    // ── Derived arrays ───────────────────────────────────────────────────────

    /// Same array under another name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Same array with other units. The values are not converted; use
    /// [`convert_units`][Self::convert_units] for that.
    ///
    /// # Errors
    /// [`Error::UnparseableUnit`] if `units` is not a known unit.
    pub fn with_units(mut self, units: Option<&str>) -> Result<Self> {
        if let Some(u) = units {
            registry().parse(u)?;
        }
        self.units = units.map(str::to_string);
        Ok(self)
    }

    /// Same array with a declared kind.
    pub fn with_kind(mut self, kind: Option<PhysicalKind>) -> Self {
        self.kind = kind;
        self
    }

    /// Same array with one attribute set.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    /// Same array with the attribute map replaced.
    pub fn with_attrs(mut self, attrs: BTreeMap<String, String>) -> Self {
        self.attrs = attrs;
        self
    }

    /// Same array with provenance attached.
    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = Some(provenance);
        self
    }

    /// An array over another time axis with other values, sharing this
    /// array's spatial axes and name. Units, attributes and kind are not
    /// carried over.
    pub fn derive(&self, time: TimeAxis, values: DMatrix<Real>) -> Result<Self> {
        Self::from_matrix(self.name.clone(), time, self.spatial.clone(), values)
    }

    /// Same axes and metadata, new values.
    pub(crate) fn replace_values(&self, values: DMatrix<Real>) -> Self {
        debug_assert_eq!(values.shape(), self.values.shape());
        Self {
            name: self.name.clone(),
            time: self.time.clone(),
            spatial: self.spatial.clone(),
            values,
            units: self.units.clone(),
            attrs: self.attrs.clone(),
            kind: self.kind,
            provenance: self.provenance.clone(),
        }
    }

    /// `true` if both arrays share the same time axis and spatial shape.
    pub fn is_aligned_with(&self, other: &LabeledArray) -> bool {
        self.time == other.time && self.values.shape() == other.values.shape()
    }

    /// Fail unless `other` is aligned with this array.
    pub fn ensure_aligned(&self, other: &LabeledArray) -> Result<()> {
        if self.time != other.time {
            return Err(Error::ShapeMismatch(format!(
                "`{}` and `{}` do not share the same time axis",
                self.name, other.name
            )));
        }
        if self.values.shape() != other.values.shape() {
            return Err(Error::ShapeMismatch(format!(
                "`{}` is {:?} but `{}` is {:?}",
                self.name,
                self.values.shape(),
                other.name,
                other.values.shape()
            )));
        }
        Ok(())
    }
}

/// Builder for [`LabeledArray`].
#[derive(Debug, Clone)]
pub struct LabeledArrayBuilder {
    name: String,
    time: TimeAxis,
    spatial: Vec<SpatialAxis>,
    values: Vec<Real>,
    units: Option<String>,
    attrs: BTreeMap<String, String>,
    kind: Option<PhysicalKind>,
}

impl LabeledArrayBuilder {
    /// Append a spatial axis.
    pub fn spatial(mut self, name: impl Into<String>, size: usize) -> Self {
        self.spatial.push(SpatialAxis {
            name: name.into(),
            size,
        });
        self
    }

    /// Values in time-major order: all locations of the first time step,
    /// then all locations of the second, and so on.
    pub fn values(mut self, values: Vec<Real>) -> Self {
        self.values = values;
        self
    }

    /// Units string.
    pub fn units(mut self, units: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self
    }

    /// Declared physical kind.
    pub fn kind(mut self, kind: PhysicalKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// One attribute.
    pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    /// Validate and build.
    ///
    /// # Errors
    /// [`Error::ShapeMismatch`] when the number of values does not match the
    /// axes, [`Error::UnparseableUnit`] for unknown units.
    pub fn build(self) -> Result<LabeledArray> {
        let locations: usize = self.spatial.iter().map(|a| a.size).product();
        let n_times = self.time.len();
        ensure!(
            self.spatial.iter().all(|a| !a.name.is_empty()),
            "spatial axes of `{}` must be named",
            self.name
        );
        if self.values.len() != n_times * locations {
            return Err(Error::ShapeMismatch(format!(
                "`{}` has {} values for {} time steps x {} locations",
                self.name,
                self.values.len(),
                n_times,
                locations
            )));
        }
        if let Some(u) = &self.units {
            registry().parse(u)?;
        }
        let values = DMatrix::from_row_slice(n_times, locations, &self.values);
        Ok(LabeledArray {
            name: self.name,
            time: self.time,
            spatial: self.spatial,
            values,
            units: self.units,
            attrs: self.attrs,
            kind: self.kind,
            provenance: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cm_time::{CalendarKind, CfDate};

    fn axis(n: usize) -> TimeAxis {
        TimeAxis::daily(CfDate::from_ymd(CalendarKind::Standard, 2001, 1, 1).unwrap(), n)
    }

    #[test]
    fn builder_lays_out_time_major() {
        let arr = LabeledArray::builder("tas", axis(2))
            .spatial("station", 3)
            .values(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0])
            .units("K")
            .kind(PhysicalKind::AirTemperature)
            .build()
            .unwrap();
        assert_eq!(arr.n_times(), 2);
        assert_eq!(arr.n_locations(), 3);
        assert_eq!(arr.get(1, 0), 4.0);
        assert_eq!(arr.column(2), &[3.0, 6.0]);
        assert_eq!(arr.units(), Some("K"));
    }

    #[test]
    fn shape_and_units_are_checked() {
        let err = LabeledArray::builder("tas", axis(2)).values(vec![1.0]).build().unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch(_)));
        let err = LabeledArray::series("tas", axis(1), vec![1.0], "furlong").unwrap_err();
        assert!(err.is_unit_error());
    }

    #[test]
    fn missing_units_are_distinct() {
        let arr = LabeledArray::builder("x", axis(1)).values(vec![1.0]).build().unwrap();
        assert_eq!(arr.units(), None);
        assert!(matches!(arr.require_units(), Err(Error::MissingUnits { .. })));
        let dimensionless = arr.with_units(Some("")).unwrap();
        assert_eq!(dimensionless.require_units().unwrap(), "");
    }

    #[test]
    fn alignment() {
        let a = LabeledArray::series("a", axis(3), vec![1.0; 3], "K").unwrap();
        let b = LabeledArray::series("b", axis(3), vec![2.0; 3], "K").unwrap();
        let c = LabeledArray::series("c", axis(2), vec![2.0; 2], "K").unwrap();
        assert!(a.ensure_aligned(&b).is_ok());
        assert!(a.ensure_aligned(&c).is_err());
    }
}
