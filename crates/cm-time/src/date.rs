//! Calendar-aware dates and date-times.
//!
//! # Day-number convention
//! * Day 0 is `1970-01-01` in the date's own calendar.
//! * A [`CfDatetime`] is stored as whole seconds since that instant, so
//!   sub-daily axes share the same origin.

use std::str::FromStr;

use cm_core::errors::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::calendar::CalendarKind;
use crate::weekday::Weekday;

/// Seconds in one day.
pub const SECONDS_PER_DAY: i64 = 86_400;

/// A date in a specific calendar.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CfDate {
    year: i32,
    month: u8,
    day: u8,
    calendar: CalendarKind,
}

impl CfDate {
    // ── Constructors ─────────────────────────────────────────────────────────

    /// Create a date, checking that it exists in `calendar`.
    ///
    /// # Errors
    /// [`Error::Calendar`] for days such as `2001-02-29` in `standard` or
    /// `2001-01-31` in `360_day`.
    pub fn from_ymd(calendar: CalendarKind, year: i32, month: u8, day: u8) -> Result<Self> {
        calendar.check_ymd(year, month, day)?;
        Ok(Self {
            year,
            month,
            day,
            calendar,
        })
    }

    /// Create a date from its day number.
    pub fn from_day_number(calendar: CalendarKind, day_number: i64) -> Self {
        let (year, month, day) = calendar.ymd(day_number);
        Self {
            year,
            month,
            day,
            calendar,
        }
    }

    /// Parse `YYYY-MM-DD` in `calendar`.
    pub fn parse(calendar: CalendarKind, text: &str) -> Result<Self> {
        let (year, month, day) = parse_ymd(text)?;
        Self::from_ymd(calendar, year, month, day)
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    /// The year.
    pub fn year(&self) -> i32 {
        self.year
    }

    /// The month (1–12).
    pub fn month(&self) -> u8 {
        self.month
    }

    /// The day of the month.
    pub fn day(&self) -> u8 {
        self.day
    }

    /// The calendar.
    pub fn calendar(&self) -> CalendarKind {
        self.calendar
    }

    /// Days since `1970-01-01` of the same calendar.
    pub fn day_number(&self) -> i64 {
        self.calendar.day_number(self.year, self.month, self.day)
    }

    /// Day of the year (1-based).
    pub fn day_of_year(&self) -> u16 {
        self.calendar.days_before_month(self.year, self.month) + self.day as u16
    }

    /// Day of the week.
    pub fn weekday(&self) -> Weekday {
        Weekday::of_day_number(self.day_number())
    }

    // ── Arithmetic ────────────────────────────────────────────────────────────

    /// The date `n` days later.
    pub fn add_days(&self, n: i64) -> Self {
        Self::from_day_number(self.calendar, self.day_number() + n)
    }

    /// The first of the month `n` months after this date's month.
    pub fn add_months_from_start(&self, n: i32) -> Self {
        let total = self.year * 12 + (self.month as i32 - 1) + n;
        Self {
            year: total.div_euclid(12),
            month: (total.rem_euclid(12) + 1) as u8,
            day: 1,
            calendar: self.calendar,
        }
    }

    /// Midnight at the start of this date.
    pub fn at_midnight(&self) -> CfDatetime {
        CfDatetime {
            date: *self,
            seconds: 0,
        }
    }
}

impl std::fmt::Display for CfDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

impl std::fmt::Debug for CfDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CfDate({self}, {})", self.calendar)
    }
}

/// A date plus a time of day, to the second.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CfDatetime {
    date: CfDate,
    seconds: u32,
}

impl CfDatetime {
    /// Create a date-time.
    ///
    /// # Errors
    /// [`Error::Calendar`] if the date does not exist or the time of day is
    /// out of range.
    pub fn new(calendar: CalendarKind, year: i32, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Result<Self> {
        if hour > 23 || minute > 59 || second > 59 {
            return Err(Error::Calendar(format!(
                "time of day {hour:02}:{minute:02}:{second:02} out of range"
            )));
        }
        Ok(Self {
            date: CfDate::from_ymd(calendar, year, month, day)?,
            seconds: hour as u32 * 3_600 + minute as u32 * 60 + second as u32,
        })
    }

    /// Create from seconds since `1970-01-01T00:00:00` of `calendar`.
    pub fn from_epoch_seconds(calendar: CalendarKind, seconds: i64) -> Self {
        let day = seconds.div_euclid(SECONDS_PER_DAY);
        Self {
            date: CfDate::from_day_number(calendar, day),
            seconds: seconds.rem_euclid(SECONDS_PER_DAY) as u32,
        }
    }

    /// Parse `YYYY-MM-DD` or `YYYY-MM-DDTHH:MM[:SS]` (a space may replace `T`).
    pub fn parse(calendar: CalendarKind, text: &str) -> Result<Self> {
        let text = text.trim();
        let (date_part, time_part) = match text.split_once(['T', ' ']) {
            Some((d, t)) => (d, Some(t)),
            None => (text, None),
        };
        let date = CfDate::parse(calendar, date_part)?;
        let Some(time) = time_part else {
            return Ok(date.at_midnight());
        };
        let fields: Vec<&str> = time.split(':').collect();
        if !(2..=3).contains(&fields.len()) {
            return Err(Error::Calendar(format!("malformed time of day `{time}`")));
        }
        let num = |s: &str| {
            s.parse::<u8>()
                .map_err(|_| Error::Calendar(format!("malformed time of day `{time}`")))
        };
        let second = if fields.len() == 3 { num(fields[2])? } else { 0 };
        Self::new(calendar, date.year, date.month, date.day, num(fields[0])?, num(fields[1])?, second)
    }

    /// The date part.
    pub fn date(&self) -> CfDate {
        self.date
    }

    /// The calendar.
    pub fn calendar(&self) -> CalendarKind {
        self.date.calendar
    }

    /// Seconds since midnight.
    pub fn seconds_of_day(&self) -> u32 {
        self.seconds
    }

    /// Hour of the day.
    pub fn hour(&self) -> u8 {
        (self.seconds / 3_600) as u8
    }

    /// Minute of the hour.
    pub fn minute(&self) -> u8 {
        (self.seconds % 3_600 / 60) as u8
    }

    /// Second of the minute.
    pub fn second(&self) -> u8 {
        (self.seconds % 60) as u8
    }

    /// Seconds since `1970-01-01T00:00:00` of the same calendar.
    pub fn epoch_seconds(&self) -> i64 {
        self.date.day_number() * SECONDS_PER_DAY + self.seconds as i64
    }
}

impl From<CfDate> for CfDatetime {
    fn from(date: CfDate) -> Self {
        date.at_midnight()
    }
}

impl std::fmt::Display for CfDatetime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.seconds == 0 {
            write!(f, "{}", self.date)
        } else {
            write!(
                f,
                "{}T{:02}:{:02}:{:02}",
                self.date,
                self.hour(),
                self.minute(),
                self.second()
            )
        }
    }
}

impl std::fmt::Debug for CfDatetime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CfDatetime({self}, {})", self.date.calendar)
    }
}

impl FromStr for CfDate {
    type Err = Error;

    /// Parses in the standard calendar.
    fn from_str(s: &str) -> Result<Self> {
        CfDate::parse(CalendarKind::Standard, s)
    }
}

fn parse_ymd(text: &str) -> Result<(i32, u8, u8)> {
    let malformed = || Error::Calendar(format!("malformed date `{text}`, expected YYYY-MM-DD"));
    let text = text.trim();
    // Allow a leading sign on the year.
    let (sign, body) = match text.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, text),
    };
    let mut parts = body.splitn(3, '-');
    let year: i32 = parts.next().and_then(|s| s.parse().ok()).ok_or_else(malformed)?;
    let month: u8 = parts.next().and_then(|s| s.parse().ok()).ok_or_else(malformed)?;
    let day: u8 = parts.next().and_then(|s| s.parse().ok()).ok_or_else(malformed)?;
    Ok((sign * year, month, day))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_numbers_round_trip() {
        let d = CfDate::from_ymd(CalendarKind::Standard, 2000, 2, 29).unwrap();
        assert_eq!(CfDate::from_day_number(CalendarKind::Standard, d.day_number()), d);
        assert_eq!(d.day_of_year(), 60);
        assert_eq!(d.add_days(1).to_string(), "2000-03-01");
    }

    #[test]
    fn calendar_specific_days() {
        assert!(CfDate::from_ymd(CalendarKind::NoLeap, 2000, 2, 29).is_err());
        let d = CfDate::from_ymd(CalendarKind::Day360, 2001, 2, 30).unwrap();
        assert_eq!(d.add_days(1).to_string(), "2001-03-01");
        assert_eq!(d.day_of_year(), 60);
    }

    #[test]
    fn month_starts() {
        let d = CfDate::from_ymd(CalendarKind::Standard, 2001, 11, 17).unwrap();
        assert_eq!(d.add_months_from_start(2).to_string(), "2002-01-01");
        assert_eq!(d.add_months_from_start(-11).to_string(), "2000-12-01");
    }

    #[test]
    fn datetime_parsing() {
        let t = CfDatetime::parse(CalendarKind::NoLeap, "2001-03-04T06:30").unwrap();
        assert_eq!(t.hour(), 6);
        assert_eq!(t.minute(), 30);
        assert_eq!(t.to_string(), "2001-03-04T06:30:00");
        let back = CfDatetime::from_epoch_seconds(CalendarKind::NoLeap, t.epoch_seconds());
        assert_eq!(back, t);
        assert!(CfDatetime::parse(CalendarKind::Standard, "2001-03-04T25:00").is_err());
        assert!(CfDatetime::parse(CalendarKind::Standard, "2001/03/04").is_err());
    }

    #[test]
    fn negative_epoch_seconds() {
        let t = CfDatetime::from_epoch_seconds(CalendarKind::Standard, -1);
        assert_eq!(t.to_string(), "1969-12-31T23:59:59");
    }
}
