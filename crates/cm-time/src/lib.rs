//! # cm-time
//!
//! Calendars, calendar-aware dates, resampling frequencies, time axes and
//! the resolution of a time axis into resampling periods.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// `TimeAxis` and sampling-frequency inference.
pub mod axis;

/// Calendar systems.
pub mod calendar;

/// `CfDate` and `CfDatetime`.
pub mod date;

/// Resampling frequencies.
pub mod frequency;

/// `Month`: month of the year.
pub mod month;

/// Period resolution.
pub mod periods;

/// `Weekday`: day of the week.
pub mod weekday;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use axis::{infer_frequency, TimeAxis};
pub use calendar::CalendarKind;
pub use date::{CfDate, CfDatetime, SECONDS_PER_DAY};
pub use frequency::{Frequency, FrequencyBase};
pub use month::Month;
pub use periods::{periods_for, Grouping, Period};
pub use weekday::Weekday;
