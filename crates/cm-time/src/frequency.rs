//! `Frequency`: resampling and sampling frequencies parsed from
//! pandas-style codes.
//!
//! | Code | Periods |
//! |------|---------|
//! | `YS`, `AS`, `YS-JAN` | calendar years |
//! | `YS-JUL`, `AS-JUL` | July → June |
//! | `Y`, `A`, `YE`, `A-SEP` | years *ending* in the anchor month (`A-SEP` = October → September) |
//! | `QS-DEC`, `Q-NOV` | DJF, MAM, JJA, SON |
//! | `MS`, `M`, `ME` | months |
//! | `W`, `W-SUN` … `W-SAT` | weeks ending on the anchor day (default Sunday) |
//! | `D`, `h`/`H`, `min`/`T`, `s`/`S` | fixed steps |
//!
//! Any code may carry a leading multiple (`2YS`, `3h`).

use std::str::FromStr;

use cm_core::errors::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::calendar::CalendarKind;
use crate::date::{CfDate, CfDatetime, SECONDS_PER_DAY};
use crate::month::Month;
use crate::weekday::Weekday;

/// Base unit of a frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FrequencyBase {
    /// Seconds.
    Second,
    /// Minutes.
    Minute,
    /// Hours.
    Hour,
    /// Days.
    Day,
    /// Weeks.
    Week,
    /// Months.
    Month,
    /// Quarters (three-month seasons).
    Quarter,
    /// Years.
    Year,
}

impl FrequencyBase {
    /// Length in seconds for fixed-length bases.
    pub fn fixed_seconds(&self) -> Option<i64> {
        match self {
            FrequencyBase::Second => Some(1),
            FrequencyBase::Minute => Some(60),
            FrequencyBase::Hour => Some(3_600),
            FrequencyBase::Day => Some(SECONDS_PER_DAY),
            FrequencyBase::Week => Some(7 * SECONDS_PER_DAY),
            FrequencyBase::Month | FrequencyBase::Quarter | FrequencyBase::Year => None,
        }
    }

    /// Length in months for month-based bases.
    pub fn months(&self) -> Option<i32> {
        match self {
            FrequencyBase::Month => Some(1),
            FrequencyBase::Quarter => Some(3),
            FrequencyBase::Year => Some(12),
            _ => None,
        }
    }
}

/// A resampling or sampling frequency.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Frequency {
    code: String,
    base: FrequencyBase,
    multiple: u32,
    /// First month of the period for `Quarter` and `Year`.
    start_month: Month,
    /// Last day of the week for `Week`.
    week_end: Weekday,
}

impl Frequency {
    /// Parse a frequency code.
    ///
    /// # Errors
    /// [`Error::Frequency`] for unknown bases, bad anchors or a zero
    /// multiple.
    pub fn parse(code: &str) -> Result<Self> {
        let trimmed = code.trim();
        let digits = trimmed.chars().take_while(|c| c.is_ascii_digit()).count();
        let multiple: u32 = if digits == 0 {
            1
        } else {
            trimmed[..digits]
                .parse()
                .map_err(|_| Error::frequency(code, "multiple is not a number"))?
        };
        if multiple == 0 {
            return Err(Error::frequency(code, "multiple must be positive"));
        }
        let rest = &trimmed[digits..];
        let (alias, anchor) = match rest.split_once('-') {
            Some((a, b)) => (a, Some(b)),
            None => (rest, None),
        };

        let month_anchor = |default: Month| -> Result<Month> {
            match anchor {
                None => Ok(default),
                Some(a) => Month::from_abbrev(a)
                    .ok_or_else(|| Error::frequency(code, format!("unknown month anchor `{a}`"))),
            }
        };
        let no_anchor = || -> Result<()> {
            match anchor {
                None => Ok(()),
                Some(a) => Err(Error::frequency(code, format!("`{alias}` takes no anchor, got `{a}`"))),
            }
        };

        let mut week_end = Weekday::Sunday;
        let mut start_month = Month::January;
        let base = match alias {
            "YS" | "AS" => {
                start_month = month_anchor(Month::January)?;
                FrequencyBase::Year
            }
            "Y" | "A" | "YE" => {
                start_month = month_anchor(Month::December)?.offset(1);
                FrequencyBase::Year
            }
            "QS" => {
                start_month = month_anchor(Month::January)?;
                FrequencyBase::Quarter
            }
            "Q" | "QE" => {
                start_month = month_anchor(Month::December)?.offset(1);
                FrequencyBase::Quarter
            }
            "MS" | "M" | "ME" => {
                no_anchor()?;
                FrequencyBase::Month
            }
            "W" => {
                if let Some(a) = anchor {
                    week_end = Weekday::from_abbrev(a)
                        .ok_or_else(|| Error::frequency(code, format!("unknown weekday anchor `{a}`")))?;
                }
                FrequencyBase::Week
            }
            "D" => {
                no_anchor()?;
                FrequencyBase::Day
            }
            "h" | "H" => {
                no_anchor()?;
                FrequencyBase::Hour
            }
            "min" | "T" => {
                no_anchor()?;
                FrequencyBase::Minute
            }
            "s" | "S" => {
                no_anchor()?;
                FrequencyBase::Second
            }
            "" => return Err(Error::frequency(code, "empty frequency code")),
            other => return Err(Error::frequency(code, format!("unsupported frequency `{other}`"))),
        };
        Ok(Self {
            code: trimmed.to_string(),
            base,
            multiple,
            start_month,
            week_end,
        })
    }

    /// Build the frequency of a fixed step of `multiple` × `base`.
    pub fn fixed(base: FrequencyBase, multiple: u32) -> Result<Self> {
        let alias = match base {
            FrequencyBase::Second => "s",
            FrequencyBase::Minute => "min",
            FrequencyBase::Hour => "h",
            FrequencyBase::Day => "D",
            FrequencyBase::Week => "W",
            FrequencyBase::Month => "MS",
            FrequencyBase::Quarter => "QS",
            FrequencyBase::Year => "YS",
        };
        if multiple == 1 {
            Self::parse(alias)
        } else {
            Self::parse(&format!("{multiple}{alias}"))
        }
    }

    /// The code as written.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Base unit.
    pub fn base(&self) -> FrequencyBase {
        self.base
    }

    /// Number of base units per period.
    pub fn multiple(&self) -> u32 {
        self.multiple
    }

    /// First month of each period (meaningful for years and quarters).
    pub fn start_month(&self) -> Month {
        self.start_month
    }

    /// Last weekday of each period (meaningful for weeks).
    pub fn week_end(&self) -> Weekday {
        self.week_end
    }

    /// Approximate period length in seconds, used to order frequencies.
    pub fn nominal_seconds(&self) -> f64 {
        match self.fixed_seconds() {
            Some(s) => s as f64,
            None => {
                let months = self.base.months().unwrap_or(12) as f64 * self.multiple as f64;
                months * 30.436_875 * SECONDS_PER_DAY as f64
            }
        }
    }

    /// Period length in seconds, when it never varies.
    pub fn fixed_seconds(&self) -> Option<i64> {
        self.base.fixed_seconds().map(|s| s * self.multiple as i64)
    }

    /// Adjective used in descriptions: `"annual"`, `"seasonal"`, `"monthly"`,
    /// `"weekly"`, `"daily"`, `"hourly"`...
    pub fn adjective(&self) -> &'static str {
        match self.base {
            FrequencyBase::Year => "annual",
            FrequencyBase::Quarter => "seasonal",
            FrequencyBase::Month => "monthly",
            FrequencyBase::Week => "weekly",
            FrequencyBase::Day => "daily",
            FrequencyBase::Hour => "hourly",
            FrequencyBase::Minute => "minutely",
            FrequencyBase::Second => "secondly",
        }
    }

    /// `true` if both frequencies describe the same sampling, regardless of
    /// spelling (`D` vs `1D`, `YS` vs `AS-JAN`).
    pub fn same_as(&self, other: &Frequency) -> bool {
        self.base == other.base
            && self.multiple == other.multiple
            && match self.base {
                FrequencyBase::Year | FrequencyBase::Quarter => self.start_month == other.start_month,
                FrequencyBase::Week => self.week_end == other.week_end,
                _ => true,
            }
    }

    /// Start of the base period (multiple ignored) containing `instant`,
    /// in seconds since the calendar epoch.
    pub fn floor(&self, calendar: CalendarKind, instant: i64) -> i64 {
        if let Some(step) = self.base.fixed_seconds() {
            if self.base != FrequencyBase::Week {
                return instant - instant.rem_euclid(step);
            }
            let day = instant.div_euclid(SECONDS_PER_DAY);
            let week_start = self.week_end.ordinal() % 7 + 1;
            let today = Weekday::of_day_number(day).ordinal();
            let back = (today as i64 - week_start as i64).rem_euclid(7);
            return (day - back) * SECONDS_PER_DAY;
        }
        let date = CfDatetime::from_epoch_seconds(calendar, instant).date();
        let month = date.month() as i32;
        let back = match self.base {
            FrequencyBase::Month => 0,
            _ => {
                let span = self.base.months().unwrap_or(12);
                (month - self.start_month.number() as i32).rem_euclid(span)
            }
        };
        date.add_months_from_start(-back).at_midnight().epoch_seconds()
    }

    /// The instant `n` periods (multiple included) after `start`.
    pub fn advance(&self, calendar: CalendarKind, start: i64, n: i64) -> i64 {
        if let Some(step) = self.fixed_seconds() {
            return start + n * step;
        }
        let months = self.base.months().unwrap_or(12) * self.multiple as i32 * n as i32;
        let date = CfDatetime::from_epoch_seconds(calendar, start).date();
        date.add_months_from_start(months).at_midnight().epoch_seconds()
    }

    /// Date on which the base period containing `instant` begins.
    pub fn period_start_date(&self, calendar: CalendarKind, instant: i64) -> CfDate {
        CfDatetime::from_epoch_seconds(calendar, self.floor(calendar, instant)).date()
    }
}

impl FromStr for Frequency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Frequency::parse(s)
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.code)
    }
}
