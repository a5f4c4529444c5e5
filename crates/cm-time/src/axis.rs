//! `TimeAxis`: the temporal coordinate of a labeled array.

use cm_core::ensure;
use cm_core::errors::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::calendar::CalendarKind;
use crate::date::{CfDate, CfDatetime, SECONDS_PER_DAY};
use crate::frequency::Frequency;
use crate::month::Month;
use crate::weekday::Weekday;

/// A strictly increasing sequence of instants in one calendar.
///
/// Instants are stored as seconds since `1970-01-01T00:00:00` of the
/// calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeAxis {
    calendar: CalendarKind,
    instants: Vec<i64>,
}

impl TimeAxis {
    /// Build an axis from epoch seconds.
    ///
    /// # Errors
    /// [`Error::Precondition`] if the instants are not strictly increasing.
    pub fn new(calendar: CalendarKind, instants: Vec<i64>) -> Result<Self> {
        let unsorted = instants.windows(2).position(|w| w[1] <= w[0]);
        ensure!(
            unsorted.is_none(),
            "time axis must be strictly increasing (at index {})",
            unsorted.map_or(0, |i| i + 1)
        );
        Ok(Self { calendar, instants })
    }

    /// Build an axis from date-times that all share `calendar`.
    pub fn from_datetimes(calendar: CalendarKind, times: &[CfDatetime]) -> Result<Self> {
        if let Some(t) = times.iter().find(|t| t.calendar() != calendar) {
            return Err(Error::Calendar(format!(
                "{t} is in the {} calendar, axis uses {calendar}",
                t.calendar()
            )));
        }
        Self::new(calendar, times.iter().map(CfDatetime::epoch_seconds).collect())
    }

    /// `n` consecutive days starting at `start`, stamped at midnight.
    pub fn daily(start: CfDate, n: usize) -> Self {
        let first = start.day_number();
        Self {
            calendar: start.calendar(),
            instants: (0..n as i64).map(|k| (first + k) * SECONDS_PER_DAY).collect(),
        }
    }

    /// `n` instants starting at `start` and separated by one `step`.
    pub fn regular(start: CfDatetime, step: &Frequency, n: usize) -> Self {
        let calendar = start.calendar();
        let origin = start.epoch_seconds();
        Self {
            calendar,
            instants: (0..n as i64).map(|k| step.advance(calendar, origin, k)).collect(),
        }
    }

    /// The calendar.
    pub fn calendar(&self) -> CalendarKind {
        self.calendar
    }

    /// Number of instants.
    pub fn len(&self) -> usize {
        self.instants.len()
    }

    /// `true` if the axis holds no instants.
    pub fn is_empty(&self) -> bool {
        self.instants.is_empty()
    }

    /// Raw epoch seconds.
    pub fn instants(&self) -> &[i64] {
        &self.instants
    }

    /// The `i`-th instant as a date-time.
    pub fn datetime(&self, i: usize) -> Option<CfDatetime> {
        self.instants
            .get(i)
            .map(|&t| CfDatetime::from_epoch_seconds(self.calendar, t))
    }

    /// Day of year of every instant.
    pub fn days_of_year(&self) -> Vec<u16> {
        self.iter().map(|t| t.date().day_of_year()).collect()
    }

    /// Iterate over the instants as date-times.
    pub fn iter(&self) -> impl Iterator<Item = CfDatetime> + '_ {
        self.instants
            .iter()
            .map(move |&t| CfDatetime::from_epoch_seconds(self.calendar, t))
    }

    /// Sub-axis over `range`.
    pub fn slice(&self, range: std::ops::Range<usize>) -> Result<Self> {
        ensure!(
            range.start <= range.end && range.end <= self.len(),
            "slice {range:?} out of bounds for axis of length {}",
            self.len()
        );
        Ok(Self {
            calendar: self.calendar,
            instants: self.instants[range].to_vec(),
        })
    }

    /// Sampling frequency inferred from the coordinate spacing.
    ///
    /// Recognises fixed steps (seconds to weeks) and regular month, season
    /// or year starts. Returns `None` for fewer than three instants or an
    /// irregular spacing.
    pub fn infer_frequency(&self) -> Option<Frequency> {
        if self.len() < 3 {
            return None;
        }
        self.infer_steps(false)
    }

    /// Sampling frequency of an axis that may have samples missing.
    ///
    /// Same as [`infer_frequency`][Self::infer_frequency] on a regular axis.
    /// Otherwise the smallest spacing is taken as the step, provided every
    /// other spacing is a whole number of steps: a daily axis with a day
    /// dropped is still daily. `None` for fewer than two samples or spacings
    /// with no common step.
    pub fn sampling_frequency(&self) -> Option<Frequency> {
        if self.len() < 2 {
            return None;
        }
        if self.len() >= 3 {
            if let Some(freq) = self.infer_steps(false) {
                return Some(freq);
            }
        }
        self.infer_steps(true)
    }

    fn infer_steps(&self, with_gaps: bool) -> Option<Frequency> {
        // Month starts first: 360-day months would otherwise read as `30D`.
        if let Some(freq) = self.infer_month_based(with_gaps) {
            return Some(freq);
        }
        let steps: Vec<i64> = self.instants.windows(2).map(|w| w[1] - w[0]).collect();
        let step = if with_gaps {
            steps.iter().copied().min()?
        } else {
            steps[0]
        };
        if step > 0 && steps.iter().all(|&s| multiple_of(s, step, with_gaps)) {
            return fixed_step_frequency(step, self.instants[0]);
        }
        None
    }

    fn infer_month_based(&self, with_gaps: bool) -> Option<Frequency> {
        let mut months = Vec::with_capacity(self.len());
        for t in self.iter() {
            if t.seconds_of_day() != 0 || t.date().day() != 1 {
                return None;
            }
            months.push(t.date().year() as i64 * 12 + t.date().month() as i64 - 1);
        }
        let steps: Vec<i64> = months.windows(2).map(|w| w[1] - w[0]).collect();
        let step = if with_gaps {
            steps.iter().copied().min()?
        } else {
            steps[0]
        };
        if step <= 0 || !steps.iter().all(|&s| multiple_of(s, step, with_gaps)) {
            return None;
        }
        let first = Month::from_number(self.datetime(0)?.date().month())?;
        let code = if step % 12 == 0 {
            with_multiple(step / 12, &format!("YS-{}", first.abbrev()))
        } else if step % 3 == 0 {
            with_multiple(step / 3, &format!("QS-{}", first.abbrev()))
        } else {
            with_multiple(step, "MS")
        };
        Frequency::parse(&code).ok()
    }
}

fn multiple_of(spacing: i64, step: i64, with_gaps: bool) -> bool {
    if with_gaps {
        spacing > 0 && spacing % step == 0
    } else {
        spacing == step
    }
}

/// Free-function form of [`TimeAxis::infer_frequency`].
pub fn infer_frequency(axis: &TimeAxis) -> Option<Frequency> {
    axis.infer_frequency()
}

fn fixed_step_frequency(step: i64, first: i64) -> Option<Frequency> {
    if step <= 0 {
        return None;
    }
    let week = 7 * SECONDS_PER_DAY;
    let code = if step % week == 0 {
        let end = Weekday::of_day_number(first.div_euclid(SECONDS_PER_DAY));
        with_multiple(step / week, &format!("W-{}", end.abbrev()))
    } else if step % SECONDS_PER_DAY == 0 {
        with_multiple(step / SECONDS_PER_DAY, "D")
    } else if step % 3_600 == 0 {
        with_multiple(step / 3_600, "h")
    } else if step % 60 == 0 {
        with_multiple(step / 60, "min")
    } else {
        with_multiple(step, "s")
    };
    Frequency::parse(&code).ok()
}

fn with_multiple(n: i64, alias: &str) -> String {
    if n == 1 {
        alias.to_string()
    } else {
        format!("{n}{alias}")
    }
}
