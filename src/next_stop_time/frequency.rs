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

//! Headway arithmetic of frequency vehicle journeys.
//!
//! All times here are seconds since the start of the circulation day,
//! i.e. the day on which the service window starts.

use super::{candidate_order, NextStopTime, StopTimeQuery};
use crate::models::{Frequency, Schedule, StopTimeIdx};
use crate::time::{
    Calendar, DaysSinceDatasetStart, SecondsSinceDatasetStart, SecondsSinceDayStart,
    SECONDS_PER_DAY,
};
use std::cmp::Ordering;

impl Frequency {
    pub fn new(
        start_time: SecondsSinceDayStart,
        end_time: SecondsSinceDayStart,
        headway_secs: u32,
    ) -> Self {
        Self {
            start_time,
            end_time,
            headway_secs,
        }
    }

    pub fn start_time(&self) -> SecondsSinceDayStart {
        self.start_time
    }

    pub fn end_time(&self) -> SecondsSinceDayStart {
        self.end_time
    }

    pub fn headway_secs(&self) -> u32 {
        self.headway_secs
    }

    // an end before the start means that the window ends the next day
    fn window_end(&self) -> u32 {
        if self.end_time < self.start_time {
            self.end_time.seconds + SECONDS_PER_DAY
        } else {
            self.end_time.seconds
        }
    }

    /// Offset, from `start_time`, of the last run of the window
    pub fn last_run_offset(&self) -> u32 {
        if self.headway_secs == 0 {
            return 0;
        }
        let span = self.window_end() - self.start_time.seconds;
        span / self.headway_secs * self.headway_secs
    }

    pub fn nb_of_runs(&self) -> u32 {
        if self.headway_secs == 0 {
            1
        } else {
            self.last_run_offset() / self.headway_secs + 1
        }
    }

    /// Number of days between the circulation day and the day
    /// of the last event happening `offset` seconds after the start of a run
    pub fn reach_days(&self, offset: u32) -> u16 {
        let last = self.start_time.seconds + self.last_run_offset() + offset;
        (last / SECONDS_PER_DAY) as u16
    }

    /// The times of the event happening `offset` seconds after the start of each run
    pub fn runs(&self, offset: u32) -> impl Iterator<Item = u32> + '_ {
        let first = self.start_time.seconds + offset;
        (0..self.nb_of_runs()).map(move |run| first + run * self.headway_secs)
    }

    /// The first time, at or after `target`, of the event happening `offset` seconds
    /// after the start of a run.
    /// `None` when `target` is after the last run.
    pub fn next_run_at(&self, offset: u32, target: i64) -> Option<u32> {
        let first = i64::from(self.start_time.seconds + offset);
        if target <= first {
            return Some(first as u32);
        }
        if self.headway_secs == 0 {
            return None;
        }
        let headway = i64::from(self.headway_secs);
        // ceil((target - first) / headway)
        let nb_of_headways = (target - first + headway - 1) / headway;
        let run_offset = nb_of_headways * headway;
        if run_offset > i64::from(self.last_run_offset()) {
            None
        } else {
            Some((first + run_offset) as u32)
        }
    }

    /// The last time, at or before `target`, of the event happening `offset` seconds
    /// after the start of a run.
    /// `None` when `target` is before the first run.
    pub fn previous_run_at(&self, offset: u32, target: i64) -> Option<u32> {
        let first = i64::from(self.start_time.seconds + offset);
        if target < first {
            return None;
        }
        if self.headway_secs == 0 {
            return Some(first as u32);
        }
        let headway = i64::from(self.headway_secs);
        let nb_of_headways = (target - first) / headway;
        let run_offset = std::cmp::min(nb_of_headways * headway, i64::from(self.last_run_offset()));
        Some((first + run_offset) as u32)
    }
}

struct FrequencyCandidate<'a> {
    frequency: &'a Frequency,
    stop_time: StopTimeIdx,
    offset: u32,
}

fn candidates<'a>(
    schedule: &'a Schedule,
    query: &'a StopTimeQuery,
) -> impl Iterator<Item = FrequencyCandidate<'a>> + 'a {
    let jpp = schedule.journey_pattern_point(query.journey_pattern_point);
    let journey_pattern = schedule.journey_pattern(jpp.journey_pattern);
    journey_pattern
        .frequency_vehicle_journeys
        .iter()
        .filter_map(move |vj_idx| {
            let vehicle_journey = schedule.vehicle_journey(*vj_idx)?;
            let frequency = vehicle_journey.frequency()?;
            if !vehicle_journey.accessible(&query.accessibility.vehicle) {
                return None;
            }
            let stop_time = vehicle_journey.stop_time(jpp.order)?;
            if !stop_time.allows(query.stop_event) {
                return None;
            }
            Some(FrequencyCandidate {
                frequency,
                stop_time: StopTimeIdx {
                    vehicle_journey: *vj_idx,
                    order: jpp.order,
                },
                offset: stop_time.time_of(query.stop_event).total_seconds(),
            })
        })
}

fn is_valid_on(
    schedule: &Schedule,
    query: &StopTimeQuery,
    candidate: &FrequencyCandidate,
    day: &DaysSinceDatasetStart,
) -> bool {
    schedule.is_valid_on(
        candidate.stop_time.vehicle_journey,
        query.real_time_level,
        day,
    )
}

pub(crate) fn earliest_frequency(
    schedule: &Schedule,
    query: &StopTimeQuery,
    bound: &SecondsSinceDatasetStart,
) -> NextStopTime {
    let target = i64::from(query.datetime.total_seconds());
    let mut best: Option<(SecondsSinceDatasetStart, StopTimeIdx)> = None;
    for candidate in candidates(schedule, query) {
        let reach_days = candidate.frequency.reach_days(candidate.offset);
        // a window that started a few days ago may still be running
        let mut day = query.datetime.day().saturating_sub(reach_days);
        while day <= bound.day() {
            if is_valid_on(schedule, query, &candidate, &day) {
                let day_start = Calendar::day_start_seconds(&day);
                let datetime = candidate
                    .frequency
                    .next_run_at(candidate.offset, target - day_start)
                    .and_then(|run| SecondsSinceDatasetStart::from_i64(day_start + i64::from(run)))
                    .filter(|datetime| datetime <= bound);
                if let Some(datetime) = datetime {
                    let found = (datetime, candidate.stop_time);
                    let is_better = best
                        .as_ref()
                        .map(|best| candidate_order(schedule, &found, best) == Ordering::Less)
                        .unwrap_or(true);
                    if is_better {
                        best = Some(found);
                    }
                }
            }
            day = match day.succ() {
                Some(day) => day,
                None => break,
            };
        }
    }
    best.map(|(datetime, stop_time)| NextStopTime::found(stop_time, datetime))
        .unwrap_or_else(NextStopTime::not_found)
}

pub(crate) fn tardiest_frequency(
    schedule: &Schedule,
    query: &StopTimeQuery,
    bound: &SecondsSinceDatasetStart,
) -> NextStopTime {
    let target = i64::from(query.datetime.total_seconds());
    let mut best: Option<(SecondsSinceDatasetStart, StopTimeIdx)> = None;
    for candidate in candidates(schedule, query) {
        let reach_days = candidate.frequency.reach_days(candidate.offset);
        let first_day = bound.day().saturating_sub(reach_days);
        let mut day = query.datetime.day();
        while day >= first_day {
            if is_valid_on(schedule, query, &candidate, &day) {
                let day_start = Calendar::day_start_seconds(&day);
                let datetime = candidate
                    .frequency
                    .previous_run_at(candidate.offset, target - day_start)
                    .and_then(|run| SecondsSinceDatasetStart::from_i64(day_start + i64::from(run)))
                    .filter(|datetime| datetime >= bound);
                if let Some(datetime) = datetime {
                    let found = (datetime, candidate.stop_time);
                    let is_better = best
                        .as_ref()
                        .map(|best| candidate_order(schedule, &found, best) == Ordering::Greater)
                        .unwrap_or(true);
                    if is_better {
                        best = Some(found);
                    }
                }
            }
            day = match day.pred() {
                Some(day) => day,
                None => break,
            };
        }
    }
    best.map(|(datetime, stop_time)| NextStopTime::found(stop_time, datetime))
        .unwrap_or_else(NextStopTime::not_found)
}
