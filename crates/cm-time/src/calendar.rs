//! Calendar systems used by climate model output.
//!
//! Every calendar numbers its days continuously from its own
//! `1970-01-01` (day 0). Day numbers are therefore comparable within a
//! calendar but not across calendars.

use std::str::FromStr;

use cm_core::errors::{Error, Result};
use serde::{Deserialize, Serialize};

/// A calendar system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum CalendarKind {
    /// Gregorian calendar (`standard`, `gregorian`), extended backwards
    /// without the 1582 Julian switch.
    #[default]
    Standard,
    /// Proleptic Gregorian calendar.
    ProlepticGregorian,
    /// 365 days every year (`noleap`, `365_day`).
    NoLeap,
    /// 366 days every year (`all_leap`, `366_day`).
    AllLeap,
    /// Twelve 30-day months (`360_day`).
    Day360,
    /// Julian calendar: leap every fourth year.
    Julian,
}

/// Cumulative day-of-year offset at the start of each month (non-leap).
const MONTH_OFFSET: [u16; 12] = [0, 31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334];

impl CalendarKind {
    /// All calendar kinds.
    pub const ALL: [CalendarKind; 6] = [
        CalendarKind::Standard,
        CalendarKind::ProlepticGregorian,
        CalendarKind::NoLeap,
        CalendarKind::AllLeap,
        CalendarKind::Day360,
        CalendarKind::Julian,
    ];

    /// CF name of the calendar.
    pub fn name(&self) -> &'static str {
        match self {
            CalendarKind::Standard => "standard",
            CalendarKind::ProlepticGregorian => "proleptic_gregorian",
            CalendarKind::NoLeap => "noleap",
            CalendarKind::AllLeap => "all_leap",
            CalendarKind::Day360 => "360_day",
            CalendarKind::Julian => "julian",
        }
    }

    /// Whether `year` has a leap day in this calendar.
    pub fn is_leap_year(&self, year: i32) -> bool {
        match self {
            CalendarKind::Standard | CalendarKind::ProlepticGregorian => {
                (year.rem_euclid(4) == 0 && year.rem_euclid(100) != 0) || year.rem_euclid(400) == 0
            }
            CalendarKind::Julian => year.rem_euclid(4) == 0,
            CalendarKind::AllLeap => true,
            CalendarKind::NoLeap | CalendarKind::Day360 => false,
        }
    }

    /// Number of days in `month` (1–12) of `year`.
    pub fn days_in_month(&self, year: i32, month: u8) -> u8 {
        debug_assert!((1..=12).contains(&month));
        if *self == CalendarKind::Day360 {
            return 30;
        }
        match month {
            1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
            4 | 6 | 9 | 11 => 30,
            _ => {
                if self.is_leap_year(year) {
                    29
                } else {
                    28
                }
            }
        }
    }

    /// Number of days in `year`.
    pub fn days_in_year(&self, year: i32) -> u16 {
        match self {
            CalendarKind::Day360 => 360,
            _ if self.is_leap_year(year) => 366,
            _ => 365,
        }
    }

    /// Days elapsed between `1970-01-01` and January 1st of `year`.
    pub fn days_before_year(&self, year: i32) -> i64 {
        let y = year as i64;
        match self {
            CalendarKind::Standard | CalendarKind::ProlepticGregorian => {
                gregorian_days_from_year_one(y) - gregorian_days_from_year_one(1970)
            }
            CalendarKind::Julian => julian_days_from_year_one(y) - julian_days_from_year_one(1970),
            CalendarKind::NoLeap => 365 * (y - 1970),
            CalendarKind::AllLeap => 366 * (y - 1970),
            CalendarKind::Day360 => 360 * (y - 1970),
        }
    }

    /// Days elapsed between January 1st and the first of `month`.
    pub fn days_before_month(&self, year: i32, month: u8) -> u16 {
        if *self == CalendarKind::Day360 {
            return 30 * (month as u16 - 1);
        }
        let mut days = MONTH_OFFSET[month as usize - 1];
        if month > 2 && self.is_leap_year(year) {
            days += 1;
        }
        days
    }

    /// Validate a `(year, month, day)` triple.
    ///
    /// # Errors
    /// [`Error::Calendar`] when the month or day does not exist.
    pub fn check_ymd(&self, year: i32, month: u8, day: u8) -> Result<()> {
        if !(1..=12).contains(&month) {
            return Err(Error::Calendar(format!("month {month} out of range [1, 12]")));
        }
        let days_in = self.days_in_month(year, month);
        if day == 0 || day > days_in {
            return Err(Error::Calendar(format!(
                "day {day} out of range [1, {days_in}] for {year}-{month:02} in the {} calendar",
                self.name()
            )));
        }
        Ok(())
    }

    /// Day number of a valid `(year, month, day)`.
    pub fn day_number(&self, year: i32, month: u8, day: u8) -> i64 {
        self.days_before_year(year) + self.days_before_month(year, month) as i64 + day as i64 - 1
    }

    /// Decompose a day number into `(year, month, day)`.
    pub fn ymd(&self, day_number: i64) -> (i32, u8, u8) {
        let mean_year = match self {
            CalendarKind::Day360 => 360.0,
            CalendarKind::NoLeap => 365.0,
            CalendarKind::AllLeap => 366.0,
            CalendarKind::Julian => 365.25,
            _ => 365.2425,
        };
        let mut y = 1970 + (day_number as f64 / mean_year).floor() as i32;
        loop {
            if day_number < self.days_before_year(y) {
                y -= 1;
            } else if day_number >= self.days_before_year(y + 1) {
                y += 1;
            } else {
                break;
            }
        }
        let mut remaining = (day_number - self.days_before_year(y)) as i32 + 1;
        let mut m = 1u8;
        loop {
            let days = self.days_in_month(y, m) as i32;
            if remaining <= days || m == 12 {
                break;
            }
            remaining -= days;
            m += 1;
        }
        (y, m, remaining as u8)
    }
}

fn gregorian_days_from_year_one(year: i64) -> i64 {
    let y1 = year - 1;
    365 * y1 + y1.div_euclid(4) - y1.div_euclid(100) + y1.div_euclid(400)
}

fn julian_days_from_year_one(year: i64) -> i64 {
    let y1 = year - 1;
    365 * y1 + y1.div_euclid(4)
}

impl FromStr for CalendarKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" | "gregorian" | "" => Ok(CalendarKind::Standard),
            "proleptic_gregorian" => Ok(CalendarKind::ProlepticGregorian),
            "noleap" | "365_day" => Ok(CalendarKind::NoLeap),
            "all_leap" | "366_day" => Ok(CalendarKind::AllLeap),
            "360_day" => Ok(CalendarKind::Day360),
            "julian" => Ok(CalendarKind::Julian),
            other => Err(Error::Calendar(format!("unknown calendar `{other}`"))),
        }
    }
}

impl std::fmt::Display for CalendarKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
