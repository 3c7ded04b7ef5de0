// Copyright  (C) 2020, Kisio Digital and/or its affiliates. All rights reserved.
//
// This file is part of Navitia,
// the software to build cool stuff with public transport.
//
// Hope you'll enjoy and contribute to this project,
// powered by Kisio Digital (www.kisio.com).
// Help us simplify mobility and open public transport:
// a non ending quest to the responsive locomotion way of traveling!
//
// This contribution is a part of the research and development work of the
// IVA Project which aims to enhance traveler information and is carried out
// under the leadership of the Technological Research Institute SystemX,
// with the partnership and support of the transport organization authority
// Ile-De-France Mobilités (IDFM), SNCF, and public funds
// under the scope of the French Program "Investissements d’Avenir".
//
// LICENCE: This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <http://www.gnu.org/licenses/>.
//
// Stay tuned using
// twitter @navitia
// channel `#navitia` on riot https://riot.im/app/#/room/#navitia:matrix.org
// https://groups.google.com/d/forum/navitia
// www.navitia.io

pub mod calendar;
pub mod time_periods;
pub mod validity_pattern;

pub use time_periods::{DateIter, TimePeriod, TimePeriodError, TimePeriods};
pub use validity_pattern::{ValidityPattern, ValidityPatternIdx, ValidityPatterns};

use chrono::NaiveDate;
use static_assertions::const_assert;
use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

pub const SECONDS_PER_DAY: u32 = 24 * 60 * 60;

// stop times are given relatively to the midnight of the day the trip starts,
// and may run up to 48h after it
pub const MAX_SECONDS_SINCE_DAY_START: u32 = 2 * SECONDS_PER_DAY;

// number of days a stop time may lie after the day its trip started
pub const MAX_DAYS_AFTER_CIRCULATION_DAY: u16 = (MAX_SECONDS_SINCE_DAY_START / SECONDS_PER_DAY) as u16;

pub const MAX_DAYS_IN_CALENDAR: u16 = 10_000;

// a SecondsSinceDatasetStart must fit in a u32, including the trailing
// days needed by trips that end after midnight on the last day
const_assert!(
    (MAX_DAYS_IN_CALENDAR as u64 + MAX_DAYS_AFTER_CIRCULATION_DAY as u64 + 1)
        * (SECONDS_PER_DAY as u64)
        < u32::MAX as u64
);

/// The production period of the dataset.
/// All days are counted from `first_date`, which is day 0.
#[derive(Debug, Clone)]
pub struct Calendar {
    first_date: NaiveDate, //first date which may be allowed
    last_date: NaiveDate,  //last date (included) which may be allowed
    nb_of_days: u16,       // == (last_date - first_date).num_of_days() + 1
                           // we allow at most MAX_DAYS_IN_CALENDAR days
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DaysSinceDatasetStart {
    pub(crate) days: u16,
}

/// Time of a stop time, relative to the midnight of the day its trip starts.
/// May exceed 24h for trips running past midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SecondsSinceDayStart {
    pub(crate) seconds: u32,
}

/// An instant, counted in seconds since the midnight of the first day
/// of the calendar.
/// `u32::MAX` is reserved for the "not valid" sentinel returned
/// when a search yields nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SecondsSinceDatasetStart {
    pub(crate) seconds: u32,
}

#[derive(Debug, Eq, PartialEq, Clone, Copy, Ord, PartialOrd, Hash)]
pub struct PositiveDuration {
    pub(crate) seconds: u32,
}

impl DaysSinceDatasetStart {
    pub fn new(days: u16) -> Self {
        Self { days }
    }

    pub fn zero() -> Self {
        Self { days: 0 }
    }

    pub fn days(&self) -> u16 {
        self.days
    }

    pub fn checked_sub(&self, nb_of_days: u16) -> Option<Self> {
        self.days.checked_sub(nb_of_days).map(|days| Self { days })
    }

    pub fn saturating_sub(&self, nb_of_days: u16) -> Self {
        Self {
            days: self.days.saturating_sub(nb_of_days),
        }
    }

    pub fn checked_add(&self, nb_of_days: u16) -> Option<Self> {
        self.days.checked_add(nb_of_days).map(|days| Self { days })
    }

    pub fn succ(&self) -> Option<Self> {
        self.checked_add(1)
    }

    pub fn pred(&self) -> Option<Self> {
        self.checked_sub(1)
    }
}

impl SecondsSinceDayStart {
    pub fn zero() -> Self {
        Self { seconds: 0 }
    }

    pub fn from_seconds(seconds: u32) -> Option<Self> {
        if seconds >= MAX_SECONDS_SINCE_DAY_START {
            None
        } else {
            Some(Self { seconds })
        }
    }

    pub const fn from_hms(hours: u32, minutes: u32, seconds: u32) -> Self {
        Self {
            seconds: seconds + 60 * minutes + 60 * 60 * hours,
        }
    }

    pub fn total_seconds(&self) -> u32 {
        self.seconds
    }

    /// Number of days between the day the trip starts and this time.
    pub fn days_after_day_start(&self) -> u16 {
        (self.seconds / SECONDS_PER_DAY) as u16
    }

    pub fn time_of_day(&self) -> u32 {
        self.seconds % SECONDS_PER_DAY
    }
}

impl std::fmt::Display for SecondsSinceDayStart {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.seconds / 60 / 60,
            self.seconds / 60 % 60,
            self.seconds % 60
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeParseError {
    input: String,
}

impl std::error::Error for TimeParseError {}

impl Display for TimeParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Could not parse `{}` as a HH:MM:SS time", self.input)
    }
}

fn parse_hms(s: &str) -> Result<u32, TimeParseError> {
    let err = || TimeParseError {
        input: s.to_string(),
    };
    let mut parts = s.split(':');
    let mut next_number = || -> Result<u32, TimeParseError> {
        parts
            .next()
            .ok_or_else(err)?
            .trim()
            .parse::<u32>()
            .map_err(|_| err())
    };
    let hours = next_number()?;
    let minutes = next_number()?;
    let seconds = next_number()?;
    if parts.next().is_some() || minutes >= 60 || seconds >= 60 {
        return Err(err());
    }
    Ok(seconds + 60 * minutes + 60 * 60 * hours)
}

// accepts hours above 24, as in "25:10:00"
impl FromStr for SecondsSinceDayStart {
    type Err = TimeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let seconds = parse_hms(s)?;
        SecondsSinceDayStart::from_seconds(seconds).ok_or_else(|| TimeParseError {
            input: s.to_string(),
        })
    }
}

impl SecondsSinceDatasetStart {
    pub fn zero() -> Self {
        Self { seconds: 0 }
    }

    pub fn not_valid() -> Self {
        Self { seconds: u32::MAX }
    }

    pub fn is_valid(&self) -> bool {
        self.seconds != u32::MAX
    }

    // saturates to the last valid second instead of wrapping
    pub fn compose(day: &DaysSinceDatasetStart, seconds_in_day: u32) -> Self {
        let seconds =
            u64::from(day.days) * u64::from(SECONDS_PER_DAY) + u64::from(seconds_in_day);
        let last_valid = u64::from(u32::MAX - 1);
        Self {
            seconds: seconds.min(last_valid) as u32,
        }
    }

    pub fn from_i64(seconds: i64) -> Option<Self> {
        if seconds < 0 || seconds >= i64::from(u32::MAX) {
            None
        } else {
            Some(Self {
                seconds: seconds as u32,
            })
        }
    }

    pub fn total_seconds(&self) -> u32 {
        self.seconds
    }

    pub fn day(&self) -> DaysSinceDatasetStart {
        DaysSinceDatasetStart {
            days: (self.seconds / SECONDS_PER_DAY) as u16,
        }
    }

    pub fn time_of_day(&self) -> u32 {
        self.seconds % SECONDS_PER_DAY
    }

    pub fn start_of_day(day: &DaysSinceDatasetStart) -> Self {
        Self::compose(day, 0)
    }

    // last second of `day`
    pub fn end_of_day(day: &DaysSinceDatasetStart) -> Self {
        Self::compose(day, SECONDS_PER_DAY - 1)
    }

    pub fn saturating_sub(&self, duration: &PositiveDuration) -> Self {
        Self {
            seconds: self.seconds.saturating_sub(duration.seconds),
        }
    }

    pub fn duration_since(&self, start: &SecondsSinceDatasetStart) -> Option<PositiveDuration> {
        self.seconds
            .checked_sub(start.seconds)
            .map(|seconds| PositiveDuration { seconds })
    }
}

impl std::ops::Add<PositiveDuration> for SecondsSinceDatasetStart {
    type Output = Self;

    fn add(self, rhs: PositiveDuration) -> Self::Output {
        Self {
            seconds: self.seconds.saturating_add(rhs.seconds),
        }
    }
}

impl PositiveDuration {
    pub fn zero() -> Self {
        Self { seconds: 0 }
    }

    pub const fn from_hms(hours: u32, minutes: u32, seconds: u32) -> PositiveDuration {
        let total_seconds = seconds + 60 * minutes + 60 * 60 * hours;
        PositiveDuration {
            seconds: total_seconds,
        }
    }

    pub const fn from_seconds(seconds: u32) -> PositiveDuration {
        PositiveDuration { seconds }
    }

    pub fn total_seconds(&self) -> u64 {
        self.seconds as u64
    }
}

impl FromStr for PositiveDuration {
    type Err = TimeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_hms(s).map(|seconds| PositiveDuration { seconds })
    }
}

impl Display for PositiveDuration {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let hours = self.seconds / (60 * 60);
        let minutes_in_secs = self.seconds % (60 * 60);
        let minutes = minutes_in_secs / 60;
        let seconds = minutes_in_secs % 60;
        if hours != 0 {
            write!(f, "{}h{:02}m{:02}s", hours, minutes, seconds)
        } else if minutes != 0 {
            write!(f, "{}m{:02}s", minutes, seconds)
        } else {
            write!(f, "{}s", seconds)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_times_past_midnight() {
        let time: SecondsSinceDayStart = "25:10:00".parse().unwrap();
        assert_eq!(time.total_seconds(), 25 * 3600 + 600);
        assert_eq!(time.days_after_day_start(), 1);
        assert_eq!(time.time_of_day(), 3600 + 600);
        assert_eq!(time.to_string(), "25:10:00");

        assert!("48:00:00".parse::<SecondsSinceDayStart>().is_err());
        assert!("10:61:00".parse::<SecondsSinceDayStart>().is_err());
        assert!("10:00".parse::<SecondsSinceDayStart>().is_err());
    }

    #[test]
    fn compose_and_decompose_datetimes() {
        let day = DaysSinceDatasetStart::new(3);
        let datetime = SecondsSinceDatasetStart::compose(&day, 8 * 3600);
        assert_eq!(datetime.day(), day);
        assert_eq!(datetime.time_of_day(), 8 * 3600);
        assert!(datetime.is_valid());
        assert!(!SecondsSinceDatasetStart::not_valid().is_valid());
        assert_eq!(
            SecondsSinceDatasetStart::end_of_day(&day).total_seconds() + 1,
            SecondsSinceDatasetStart::start_of_day(&day.succ().unwrap()).total_seconds()
        );
    }

    #[test]
    fn far_days_saturate() {
        let far = DaysSinceDatasetStart::new(u16::MAX);
        let end = SecondsSinceDatasetStart::end_of_day(&far);
        assert!(end.is_valid());
        assert_eq!(end.total_seconds(), u32::MAX - 1);
        assert_eq!(SecondsSinceDatasetStart::compose(&far, 0), end);
    }
}
