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

use super::{
    Calendar, DaysSinceDatasetStart, SecondsSinceDatasetStart, MAX_DAYS_AFTER_CIRCULATION_DAY,
    MAX_DAYS_IN_CALENDAR, SECONDS_PER_DAY,
};
use chrono::{NaiveDate, NaiveDateTime};

pub struct DaysIter {
    inner: std::ops::Range<u16>,
}

impl Iterator for DaysIter {
    type Item = DaysSinceDatasetStart;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|days| DaysSinceDatasetStart { days })
    }
}

impl Calendar {
    pub fn new(first_date: NaiveDate, last_date: NaiveDate) -> Self {
        assert!(first_date <= last_date);
        let nb_of_days_i64: i64 = (last_date - first_date).num_days() + 1;
        assert!(
            nb_of_days_i64 < MAX_DAYS_IN_CALENDAR as i64,
            "Trying to construct a calendar with {:#} days \
            which is more than the maximum allowed of {:#} days",
            nb_of_days_i64,
            MAX_DAYS_IN_CALENDAR
        );

        // cast is safe because :
        // - nb_of_days_i64 >=0 since we asserted above that first_date <= last_date
        // - nb_of_days_i64 < MAX_DAYS_IN_CALENDAR < u16::MAX
        let nb_of_days = nb_of_days_i64 as u16;

        Self {
            first_date,
            last_date,
            nb_of_days,
        }
    }

    pub fn nb_of_days(&self) -> u16 {
        self.nb_of_days
    }

    pub fn days(&self) -> DaysIter {
        DaysIter {
            inner: 0..self.nb_of_days,
        }
    }

    pub fn first_date(&self) -> &NaiveDate {
        &self.first_date
    }

    pub fn last_date(&self) -> &NaiveDate {
        &self.last_date
    }

    pub fn contains_date(&self, date: &NaiveDate) -> bool {
        self.first_date <= *date && *date <= self.last_date
    }

    pub fn first_datetime(&self) -> NaiveDateTime {
        self.first_date.and_time(chrono::NaiveTime::MIN)
    }

    /// The last instant at which a trip of the calendar may still run :
    /// a trip starting on the last day may last up to 48h.
    pub fn last_datetime(&self) -> NaiveDateTime {
        self.to_naive_datetime(&self.last_seconds())
    }

    pub fn last_seconds(&self) -> SecondsSinceDatasetStart {
        let last_day = DaysSinceDatasetStart {
            days: self.nb_of_days - 1 + MAX_DAYS_AFTER_CIRCULATION_DAY,
        };
        SecondsSinceDatasetStart::end_of_day(&last_day)
    }

    pub fn contains_datetime(&self, datetime: &NaiveDateTime) -> bool {
        *datetime >= self.first_datetime() && *datetime <= self.last_datetime()
    }

    pub fn to_naive_date(&self, day: &DaysSinceDatasetStart) -> NaiveDate {
        self.first_date + chrono::Duration::days(i64::from(day.days))
    }

    pub fn to_naive_datetime(&self, seconds: &SecondsSinceDatasetStart) -> NaiveDateTime {
        self.first_datetime() + chrono::Duration::seconds(i64::from(seconds.seconds))
    }

    pub fn to_pretty_string(&self, seconds: &SecondsSinceDatasetStart) -> String {
        if !seconds.is_valid() {
            return "not_valid".to_string();
        }
        let datetime = self.to_naive_datetime(seconds);
        datetime.format("%H:%M:%S %d-%b-%y").to_string()
    }

    pub fn from_naive_datetime(&self, datetime: &NaiveDateTime) -> Option<SecondsSinceDatasetStart> {
        if !self.contains_datetime(datetime) {
            return None;
        }
        let seconds_i64 = (*datetime - self.first_datetime()).num_seconds();
        SecondsSinceDatasetStart::from_i64(seconds_i64)
    }

    // like from_naive_datetime() but clamps datetimes outside of the calendar
    // on its bounds
    pub fn clamped_from_naive_datetime(&self, datetime: &NaiveDateTime) -> SecondsSinceDatasetStart {
        if *datetime < self.first_datetime() {
            SecondsSinceDatasetStart::zero()
        } else if *datetime > self.last_datetime() {
            self.from_naive_datetime(&self.last_datetime())
                .unwrap_or_else(SecondsSinceDatasetStart::zero)
        } else {
            self.from_naive_datetime(datetime)
                .unwrap_or_else(SecondsSinceDatasetStart::zero)
        }
    }

    pub fn date_to_days_since_start(&self, date: &NaiveDate) -> Option<DaysSinceDatasetStart> {
        self.date_to_offset(date)
            .map(|offset| DaysSinceDatasetStart { days: offset })
    }

    pub(super) fn date_to_offset(&self, date: &NaiveDate) -> Option<u16> {
        if *date < self.first_date || *date > self.last_date {
            None
        } else {
            let offset_64: i64 = (*date - self.first_date).num_days();
            // should be safe because :
            //  - we check that offset_64 is positive above when testing if date < self.first_date
            //  - we check that offset_64 is smaller than u16::MAX because at construction of Calendars
            //    we ensure that (last_date - first_date).num_days() < u16::MAX
            //    and we check above that date <= self.last_date
            let offset = offset_64 as u16;
            Some(offset)
        }
    }

    // the first instant of the calendar day `day`, seen as a number of seconds
    // since the midnight of the first day, possibly negative
    pub fn day_start_seconds(day: &DaysSinceDatasetStart) -> i64 {
        i64::from(day.days) * i64::from(SECONDS_PER_DAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn naive_datetime_conversions() {
        let first = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let last = NaiveDate::from_ymd_opt(2020, 1, 10).unwrap();
        let calendar = Calendar::new(first, last);
        assert_eq!(calendar.nb_of_days(), 10);

        let datetime = NaiveDate::from_ymd_opt(2020, 1, 3)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap();
        let seconds = calendar.from_naive_datetime(&datetime).unwrap();
        assert_eq!(seconds.day().days(), 2);
        assert_eq!(seconds.time_of_day(), 8 * 3600 + 30 * 60);
        assert_eq!(calendar.to_naive_datetime(&seconds), datetime);

        // trips of the last day may run two more days
        let after_last_day = NaiveDate::from_ymd_opt(2020, 1, 12)
            .unwrap()
            .and_hms_opt(23, 0, 0)
            .unwrap();
        assert!(calendar.from_naive_datetime(&after_last_day).is_some());
        let too_late = NaiveDate::from_ymd_opt(2020, 1, 13)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert!(calendar.from_naive_datetime(&too_late).is_none());

        let too_early = NaiveDate::from_ymd_opt(2019, 12, 31)
            .unwrap()
            .and_hms_opt(23, 0, 0)
            .unwrap();
        assert!(calendar.from_naive_datetime(&too_early).is_none());
        assert_eq!(
            calendar.clamped_from_naive_datetime(&too_early),
            SecondsSinceDatasetStart::zero()
        );
    }
}
