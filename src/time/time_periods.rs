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

use super::MAX_SECONDS_SINCE_DAY_START;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::cmp::{max, min};

/// An half open interval of time.
/// A instant `t` is contained in it
/// if and only if
///  `start <= t < end`
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimePeriod {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum TimePeriodError {
    #[error("Bad TimePeriod, start {0} must be strictly lower than end {1}")]
    StartAfterEnd(NaiveDateTime, NaiveDateTime),
}

impl TimePeriod {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<TimePeriod, TimePeriodError> {
        if start < end {
            Ok(TimePeriod { start, end })
        } else {
            Err(TimePeriodError::StartAfterEnd(start, end))
        }
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    pub fn contains(&self, t: &NaiveDateTime) -> bool {
        self.start <= *t && *t < self.end
    }

    pub fn intersects(&self, other: &Self) -> bool {
        self.contains(&other.start) || other.contains(&self.start)
    }

    // Returns an iterator that contains all dates D such that
    //  a vehicle_journey on D is "concerned" by this time_period,
    //  where "concerned" means that a stop_time of the vehicle_journey
    //   circulating on date D is contained in this time_period
    //
    // Note that the iterator may contains dates for which a vehicle
    // journey is *NOT* concerned. The caller should check by himself.
    pub fn dates_possibly_concerned(&self) -> DateIter {
        // stop_times may run up to 48h after the start of their day
        let offset = Duration::seconds(i64::from(MAX_SECONDS_SINCE_DAY_START));
        let first_date = (self.start - offset).date();
        let last_date = self.end.date();
        DateIter::new(first_date, last_date)
    }
}

pub struct TimePeriods<'a> {
    periods: &'a [TimePeriod],
}

impl<'a> TimePeriods<'a> {
    pub fn new(periods: &'a [TimePeriod]) -> Option<Self> {
        if periods.is_empty() {
            None
        } else {
            Some(Self { periods })
        }
    }

    pub fn contains(&self, t: &NaiveDateTime) -> bool {
        self.periods.iter().any(|period| period.contains(t))
    }

    pub fn intersects(&self, other: &TimePeriod) -> bool {
        self.periods.iter().any(|period| period.intersects(other))
    }

    pub fn iter(&self) -> std::slice::Iter<'a, TimePeriod> {
        self.periods.iter()
    }

    // Same as TimePeriod::dates_possibly_concerned(), for the union of all periods
    pub fn dates_possibly_concerned(&self) -> DateIter {
        // periods is not empty, this is checked in new()
        let earliest_datetime = self.periods.iter().map(|period| period.start).min();
        let latest_datetime = self.periods.iter().map(|period| period.end).max();
        match (earliest_datetime, latest_datetime) {
            (Some(earliest), Some(latest)) => {
                let offset = Duration::seconds(i64::from(MAX_SECONDS_SINCE_DAY_START));
                DateIter::new((earliest - offset).date(), latest.date())
            }
            _ => DateIter::empty(),
        }
    }
}

pub fn intersection(lhs: &TimePeriod, rhs: &TimePeriod) -> Option<TimePeriod> {
    TimePeriod::new(max(lhs.start, rhs.start), min(lhs.end, rhs.end)).ok()
}

// Yields all dates between current_date (included)
// and last_date (also included)
pub struct DateIter {
    has_current_date: Option<NaiveDate>,
    last_date: NaiveDate,
}

impl DateIter {
    pub fn new(first_date: NaiveDate, last_date: NaiveDate) -> Self {
        if first_date <= last_date {
            Self {
                has_current_date: Some(first_date),
                last_date,
            }
        } else {
            Self {
                has_current_date: None,
                last_date,
            }
        }
    }

    fn empty() -> Self {
        Self {
            has_current_date: None,
            last_date: NaiveDate::MIN,
        }
    }
}

impl Iterator for DateIter {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<Self::Item> {
        let current_date = self.has_current_date?;
        if current_date <= self.last_date {
            self.has_current_date = current_date.succ_opt();
            Some(current_date)
        } else {
            self.has_current_date = None;
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn datetime(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2020, 1, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn period_is_half_open() {
        let period = TimePeriod::new(datetime(1, 8), datetime(1, 10)).unwrap();
        assert!(period.contains(&datetime(1, 8)));
        assert!(period.contains(&datetime(1, 9)));
        assert!(!period.contains(&datetime(1, 10)));
        assert!(TimePeriod::new(datetime(1, 10), datetime(1, 10)).is_err());
    }

    #[test]
    fn periods_intersection() {
        let morning = TimePeriod::new(datetime(1, 6), datetime(1, 12)).unwrap();
        let noon = TimePeriod::new(datetime(1, 11), datetime(1, 14)).unwrap();
        let evening = TimePeriod::new(datetime(1, 18), datetime(1, 22)).unwrap();
        assert!(morning.intersects(&noon));
        assert!(!morning.intersects(&evening));
        assert_eq!(
            intersection(&morning, &noon),
            Some(TimePeriod::new(datetime(1, 11), datetime(1, 12)).unwrap())
        );
        assert_eq!(intersection(&morning, &evening), None);
    }

    #[test]
    fn concerned_dates_include_two_previous_days() {
        let period = TimePeriod::new(datetime(5, 8), datetime(6, 8)).unwrap();
        let dates: Vec<NaiveDate> = period.dates_possibly_concerned().collect();
        assert_eq!(dates.first(), Some(&NaiveDate::from_ymd_opt(2020, 1, 3).unwrap()));
        assert_eq!(dates.last(), Some(&NaiveDate::from_ymd_opt(2020, 1, 6).unwrap()));
        assert_eq!(dates.len(), 4);
    }
}
