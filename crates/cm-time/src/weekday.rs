//! `Weekday`: day-of-week enum, used to anchor weekly periods.

use serde::{Deserialize, Serialize};

/// Day of the week, numbered 1–7 (Monday = 1, Sunday = 7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Weekday {
    /// Monday (1).
    Monday = 1,
    /// Tuesday (2).
    Tuesday = 2,
    /// Wednesday (3).
    Wednesday = 3,
    /// Thursday (4).
    Thursday = 4,
    /// Friday (5).
    Friday = 5,
    /// Saturday (6).
    Saturday = 6,
    /// Sunday (7).
    Sunday = 7,
}

const ABBREVIATIONS: [&str; 7] = ["MON", "TUE", "WED", "THU", "FRI", "SAT", "SUN"];

impl Weekday {
    /// Construct from the ordinal (1 = Monday … 7 = Sunday).
    ///
    /// Returns `None` if the value is out of range.
    pub fn from_ordinal(n: u8) -> Option<Self> {
        match n {
            1 => Some(Weekday::Monday),
            2 => Some(Weekday::Tuesday),
            3 => Some(Weekday::Wednesday),
            4 => Some(Weekday::Thursday),
            5 => Some(Weekday::Friday),
            6 => Some(Weekday::Saturday),
            7 => Some(Weekday::Sunday),
            _ => None,
        }
    }

    /// Weekday of a day number. Day 0 (`1970-01-01`) is a Thursday in
    /// every calendar, since day numbers run continuously.
    pub fn of_day_number(day_number: i64) -> Self {
        let ordinal = (day_number + 3).rem_euclid(7) as u8 + 1;
        Weekday::from_ordinal(ordinal).unwrap_or(Weekday::Monday)
    }

    /// Parse a three-letter anchor such as `SUN` (case-insensitive).
    pub fn from_abbrev(text: &str) -> Option<Self> {
        let upper = text.to_ascii_uppercase();
        ABBREVIATIONS
            .iter()
            .position(|a| *a == upper)
            .and_then(|i| Weekday::from_ordinal(i as u8 + 1))
    }

    /// Upper-case three-letter anchor.
    pub fn abbrev(&self) -> &'static str {
        ABBREVIATIONS[self.ordinal() as usize - 1]
    }

    /// Return the ordinal (1 = Monday … 7 = Sunday).
    pub fn ordinal(&self) -> u8 {
        *self as u8
    }
}

impl std::fmt::Display for Weekday {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
            Weekday::Sunday => "Sunday",
        };
        write!(f, "{name}")
    }
}
