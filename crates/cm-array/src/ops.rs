//! Elementwise and along-time operations on [`LabeledArray`].
//!
//! Per-location work runs on the rayon pool, one column per task. The
//! missing sentinel propagates through arithmetic.

use cm_core::errors::Result;
use cm_core::Real;
use cm_units::{registry, Context};
use nalgebra::DMatrix;
use rayon::prelude::*;

use crate::array::LabeledArray;

/// Where a rolling window sits relative to the labeled time step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    /// The window ends at the labeled step.
    Trailing,
    /// The window is centred on the labeled step (for even sizes, the extra
    /// element is taken before it).
    Centered,
}

/// Reduction applied inside a rolling window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollingOp {
    /// Sum of the window.
    Sum,
    /// Mean of the window.
    Mean,
}

/// Build a column-major matrix of `nrows` rows by running `f` on every
/// column of `array` in parallel.
pub(crate) fn map_columns<F>(array: &LabeledArray, nrows: usize, f: F) -> DMatrix<Real>
where
    F: Fn(usize, &[Real]) -> Vec<Real> + Sync + Send,
{
    let columns: Vec<Vec<Real>> = (0..array.n_locations())
        .into_par_iter()
        .map(|c| {
            let out = f(c, array.column(c));
            debug_assert_eq!(out.len(), nrows);
            out
        })
        .collect();
    DMatrix::from_vec(nrows, array.n_locations(), columns.concat())
}

impl LabeledArray {
    /// Apply `f` to every value. Metadata is kept unchanged.
    pub fn map<F>(&self, f: F) -> LabeledArray
    where
        F: Fn(Real) -> Real + Sync + Send,
    {
        let values = map_columns(self, self.n_times(), |_, col| col.iter().map(|&v| f(v)).collect());
        self.replace_values(values)
    }

    /// Combine with an aligned array value by value. Metadata of `self` is
    /// kept.
    ///
    /// # Errors
    /// [`cm_core::Error::ShapeMismatch`] if the arrays are not aligned.
    pub fn zip_with<F>(&self, other: &LabeledArray, f: F) -> Result<LabeledArray>
    where
        F: Fn(Real, Real) -> Real + Sync + Send,
    {
        self.ensure_aligned(other)?;
        let values = map_columns(self, self.n_times(), |c, col| {
            col.iter().zip(other.column(c)).map(|(&a, &b)| f(a, b)).collect()
        });
        Ok(self.replace_values(values))
    }

    /// Convert the values into `to` and relabel the units.
    ///
    /// # Errors
    /// [`cm_core::Error::MissingUnits`] when the array has no units, and the
    /// unit errors of [`cm_units::UnitRegistry::converter_with`].
    pub fn convert_units(&self, to: &str, context: Context) -> Result<LabeledArray> {
        let from = self.require_units()?;
        let converter = registry().converter_with(from, to, context)?;
        let converted = if converter.is_identity() {
            self.clone()
        } else {
            self.map(move |v| converter.apply(v))
        };
        converted.with_units(Some(to))
    }

    /// Replace with the missing sentinel every cell `(time, location)` for
    /// which `masked` returns `true`. Metadata is kept unchanged.
    pub fn mask_where<F>(&self, masked: F) -> LabeledArray
    where
        F: Fn(usize, usize) -> bool + Sync + Send,
    {
        let values = map_columns(self, self.n_times(), |c, col| {
            col.iter()
                .enumerate()
                .map(|(t, &v)| if masked(t, c) { Real::NAN } else { v })
                .collect()
        });
        self.replace_values(values)
    }

    /// Multiply every value by `factor`.
    pub fn scale(&self, factor: Real) -> LabeledArray {
        self.map(move |v| v * factor)
    }

    /// First difference along time. The first step has no predecessor and
    /// holds the missing sentinel, so the axis is unchanged.
    pub fn diff(&self) -> LabeledArray {
        let values = map_columns(self, self.n_times(), |_, col| {
            let mut out = Vec::with_capacity(col.len());
            if !col.is_empty() {
                out.push(Real::NAN);
            }
            out.extend(col.windows(2).map(|w| w[1] - w[0]));
            out
        });
        self.replace_values(values)
    }

    /// Rolling `op` over `size` time steps. Incomplete windows at the edges
    /// and windows holding a missing value yield the missing sentinel.
    pub fn rolling(&self, size: usize, window: Window, op: RollingOp) -> LabeledArray {
        let n = self.n_times();
        let values = map_columns(self, n, |_, col| rolling_column(col, size, window, op));
        self.replace_values(values)
    }
}

fn rolling_column(col: &[Real], size: usize, window: Window, op: RollingOp) -> Vec<Real> {
    let n = col.len();
    let mut out = vec![Real::NAN; n];
    if size == 0 || size > n {
        return out;
    }
    let before = match window {
        Window::Trailing => size - 1,
        Window::Centered => size / 2,
    };
    for (i, slot) in out.iter_mut().enumerate() {
        if i < before || i - before + size > n {
            continue;
        }
        let w = &col[i - before..i - before + size];
        let sum: Real = w.iter().sum();
        *slot = match op {
            RollingOp::Sum => sum,
            RollingOp::Mean => sum / size as Real,
        };
    }
    out
}
