//! # climind
//!
//! Checked climate indicators over labeled, calendar-aware time series.
//!
//! This crate is a **façade** that re-exports all public items from the
//! underlying workspace crates. Application code should depend on this
//! crate rather than the individual `cm-*` crates.
//!
//! ## Quick start
//!
//! ```toml
//! [dependencies]
//! climind = "0.1"
//! ```
//!
//! ```rust
//! use climind::array::LabeledArray;
//! use climind::indicators::catalog;
//! use climind::time::{CalendarKind, CfDate, TimeAxis};
//! use climind::units::PhysicalKind;
//!
//! let axis = TimeAxis::daily(CfDate::from_ymd(CalendarKind::NoLeap, 2001, 1, 1)?, 365);
//! let tasmin = LabeledArray::builder("tasmin", axis)
//!     .values((0..365).map(|d| if d < 40 { -3.0 } else { 8.0 }).collect())
//!     .units("degC")
//!     .kind(PhysicalKind::MinAirTemperature)
//!     .build()?;
//! let frost = catalog()?.get("frost_days")?.call().input("tasmin", &tasmin).compute()?;
//! assert_eq!(frost.get(0, 0), 40.0);
//! assert_eq!(frost.units(), Some("days"));
//! # Ok::<(), climind::core::Error>(())
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Core types, aliases, notices and error definitions.
pub use cm_core as core;

/// Unit parsing, conversion and physical kinds.
pub use cm_units as units;

/// Calendars, dates, time axes and resampling frequencies.
pub use cm_time as time;

/// Labeled arrays and period reductions.
pub use cm_array as array;

/// Raw climate indices.
pub use cm_indices as indices;

/// Checked indicators, options and the catalog.
pub use cm_indicators as indicators;

pub use cm_core::{Error, Real, Result};
pub use cm_indicators::{catalog, MissingPolicy, Options, ScopedOptions, Settings, ValidationMode};
