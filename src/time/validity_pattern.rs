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

use std::{collections::HashMap, iter::Enumerate, sync::Arc};

use super::{Calendar, DaysSinceDatasetStart};
use chrono::NaiveDate;

/// The days, counted from `beginning_date`, on which a trip runs.
///
/// `check(day)` is false for every day outside of `[0, nb_of_days)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValidityPattern {
    beginning_date: NaiveDate,
    days: Vec<bool>,
}

impl ValidityPattern {
    pub fn new(beginning_date: NaiveDate, nb_of_days: u16) -> Self {
        Self {
            beginning_date,
            days: vec![false; usize::from(nb_of_days)],
        }
    }

    pub fn for_calendar(calendar: &Calendar) -> Self {
        Self::new(*calendar.first_date(), calendar.nb_of_days())
    }

    pub fn from_dates<'a, Dates>(calendar: &Calendar, dates: Dates) -> Self
    where
        Dates: IntoIterator<Item = &'a NaiveDate>,
    {
        let mut pattern = Self::for_calendar(calendar);
        for date in dates {
            pattern.add_date(date);
        }
        pattern
    }

    pub fn beginning_date(&self) -> &NaiveDate {
        &self.beginning_date
    }

    pub fn nb_of_days(&self) -> usize {
        self.days.len()
    }

    pub fn check(&self, day: &DaysSinceDatasetStart) -> bool {
        self.days
            .get(usize::from(day.days))
            .copied()
            .unwrap_or(false)
    }

    pub fn check_date(&self, date: &NaiveDate) -> bool {
        self.date_to_day(date)
            .map(|day| self.check(&day))
            .unwrap_or(false)
    }

    // days out of the pattern are silently ignored
    pub fn add(&mut self, day: &DaysSinceDatasetStart) {
        if let Some(allowed) = self.days.get_mut(usize::from(day.days)) {
            *allowed = true;
        }
    }

    pub fn add_date(&mut self, date: &NaiveDate) {
        if let Some(day) = self.date_to_day(date) {
            self.add(&day);
        }
    }

    /// Allows every date of `[first_date, last_date]`
    pub fn add_period(&mut self, first_date: &NaiveDate, last_date: &NaiveDate) {
        for date in super::DateIter::new(*first_date, *last_date) {
            self.add_date(&date);
        }
    }

    pub fn remove(&mut self, day: &DaysSinceDatasetStart) {
        if let Some(allowed) = self.days.get_mut(usize::from(day.days)) {
            *allowed = false;
        }
    }

    pub fn remove_date(&mut self, date: &NaiveDate) {
        if let Some(day) = self.date_to_day(date) {
            self.remove(&day);
        }
    }

    /// The pattern of a trip running `nb_of_days` days later.
    /// Days pushed past the end of the pattern are lost.
    pub fn shifted(&self, nb_of_days: u16) -> Self {
        let nb_of_days = usize::from(nb_of_days);
        let mut days = vec![false; self.days.len()];
        for (idx, allowed) in self.days.iter().enumerate() {
            if *allowed {
                if let Some(shifted) = days.get_mut(idx + nb_of_days) {
                    *shifted = true;
                }
            }
        }
        Self {
            beginning_date: self.beginning_date,
            days,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.days.iter().all(|allowed| !allowed)
    }

    pub fn days(&self) -> DaysInPatternIter {
        DaysInPatternIter {
            allowed_dates: self.days.iter().enumerate(),
        }
    }

    fn date_to_day(&self, date: &NaiveDate) -> Option<DaysSinceDatasetStart> {
        if *date < self.beginning_date {
            return None;
        }
        let offset = (*date - self.beginning_date).num_days();
        if offset >= self.days.len() as i64 {
            return None;
        }
        Some(DaysSinceDatasetStart { days: offset as u16 })
    }
}

pub struct DaysInPatternIter<'pattern> {
    allowed_dates: Enumerate<std::slice::Iter<'pattern, bool>>,
}

impl<'pattern> Iterator for DaysInPatternIter<'pattern> {
    type Item = DaysSinceDatasetStart;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.allowed_dates.next() {
                Some((day_idx, is_allowed)) if *is_allowed => {
                    let days: u16 = day_idx as u16;
                    return Some(DaysSinceDatasetStart { days });
                }
                Some(_) => (),
                None => {
                    return None;
                }
            }
        }
    }
}

/// Handle on a pattern stored in `ValidityPatterns`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValidityPatternIdx {
    idx: usize,
}

/// A pool of deduplicated validity patterns.
///
/// A pattern is never modified once inserted : to "modify" the pattern of a trip,
/// build a new `ValidityPattern`, insert it with `get_or_insert()` and repoint
/// the trip to the returned handle.
#[derive(Debug, Clone)]
pub struct ValidityPatterns {
    patterns: Vec<Arc<ValidityPattern>>,
    pattern_to_idx: HashMap<Arc<ValidityPattern>, ValidityPatternIdx>,
    empty: ValidityPatternIdx,
}

impl ValidityPatterns {
    pub fn new(calendar: &Calendar) -> Self {
        let mut result = Self {
            patterns: Vec::new(),
            pattern_to_idx: HashMap::new(),
            empty: ValidityPatternIdx { idx: 0 },
        };
        result.empty = result.get_or_insert(ValidityPattern::for_calendar(calendar));
        result
    }

    pub fn get_or_insert(&mut self, pattern: ValidityPattern) -> ValidityPatternIdx {
        if let Some(idx) = self.pattern_to_idx.get(&pattern) {
            return *idx;
        }
        let idx = ValidityPatternIdx {
            idx: self.patterns.len(),
        };
        let pattern = Arc::new(pattern);
        self.patterns.push(pattern.clone());
        self.pattern_to_idx.insert(pattern, idx);
        idx
    }

    pub fn get(&self, idx: &ValidityPatternIdx) -> &ValidityPattern {
        &self.patterns[idx.idx]
    }

    pub fn shared(&self, idx: &ValidityPatternIdx) -> Arc<ValidityPattern> {
        self.patterns[idx.idx].clone()
    }

    pub fn empty(&self) -> ValidityPatternIdx {
        self.empty
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calendar() -> Calendar {
        Calendar::new(
            NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2020, 1, 10).unwrap(),
        )
    }

    #[test]
    fn add_then_remove_days() {
        let mut pattern = ValidityPattern::for_calendar(&calendar());
        for days in 0..10 {
            let day = DaysSinceDatasetStart::new(days);
            assert!(!pattern.check(&day));
            pattern.add(&day);
            assert!(pattern.check(&day));
            pattern.remove(&day);
            assert!(!pattern.check(&day));
        }
        // out of range days are never allowed, even after an add()
        let out_of_range = DaysSinceDatasetStart::new(10);
        pattern.add(&out_of_range);
        assert!(!pattern.check(&out_of_range));
        assert!(pattern.is_empty());
    }

    #[test]
    fn add_period_and_dates() {
        let mut pattern = ValidityPattern::for_calendar(&calendar());
        pattern.add_period(
            &NaiveDate::from_ymd_opt(2019, 12, 30).unwrap(),
            &NaiveDate::from_ymd_opt(2020, 1, 3).unwrap(),
        );
        let days: Vec<u16> = pattern.days().map(|day| day.days()).collect();
        assert_eq!(days, vec![0, 1, 2]);
        assert!(pattern.check_date(&NaiveDate::from_ymd_opt(2020, 1, 2).unwrap()));
        assert!(!pattern.check_date(&NaiveDate::from_ymd_opt(2019, 12, 31).unwrap()));

        pattern.remove_date(&NaiveDate::from_ymd_opt(2020, 1, 2).unwrap());
        let days: Vec<u16> = pattern.days().map(|day| day.days()).collect();
        assert_eq!(days, vec![0, 2]);
    }

    #[test]
    fn shift_moves_days_later() {
        let mut pattern = ValidityPattern::for_calendar(&calendar());
        pattern.add(&DaysSinceDatasetStart::new(0));
        pattern.add(&DaysSinceDatasetStart::new(9));
        let shifted = pattern.shifted(1);
        let days: Vec<u16> = shifted.days().map(|day| day.days()).collect();
        // day 9 is pushed out of the calendar
        assert_eq!(days, vec![1]);
    }

    #[test]
    fn pool_deduplicates_patterns() {
        let calendar = calendar();
        let mut pool = ValidityPatterns::new(&calendar);
        let mut pattern = ValidityPattern::for_calendar(&calendar);
        assert_eq!(pool.get_or_insert(pattern.clone()), pool.empty());

        pattern.add(&DaysSinceDatasetStart::new(2));
        let first = pool.get_or_insert(pattern.clone());
        let second = pool.get_or_insert(pattern);
        assert_eq!(first, second);
        assert_eq!(pool.len(), 2);
        assert!(pool.get(&first).check(&DaysSinceDatasetStart::new(2)));
    }
}
