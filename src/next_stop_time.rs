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

//! Next (or previous) valid stop time at a journey pattern point.
//!
//! For each journey pattern point, the stop times of the discrete vehicle journeys
//! are sorted by time of day, so that the first stop time after a given instant
//! is found by a binary search on the day of the instant,
//! then by scanning the following days.
//! Frequency vehicle journeys are handled with headway arithmetic.

pub mod cache;
pub mod frequency;

pub use cache::{CacheKey, CachedNextStopTime, CachedNextStopTimeManager};

use crate::config::SearchParams;
use crate::models::{
    AccessibilityParams, JourneyPatternPointIdx, RealTimeLevel, Schedule, StopEvent,
    StopTimeIdx, VehicleJourneyIdx,
};
use crate::time::{DaysSinceDatasetStart, SecondsSinceDatasetStart};
use std::cmp::Ordering;
use tracing::debug;

/// Result of a next stop time search.
/// When nothing is found, `stop_time` is `None` and `datetime` is not valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NextStopTime {
    pub stop_time: Option<StopTimeIdx>,
    pub datetime: SecondsSinceDatasetStart,
}

impl NextStopTime {
    pub fn not_found() -> Self {
        Self {
            stop_time: None,
            datetime: SecondsSinceDatasetStart::not_valid(),
        }
    }

    pub fn is_found(&self) -> bool {
        self.stop_time.is_some()
    }

    fn found(stop_time: StopTimeIdx, datetime: SecondsSinceDatasetStart) -> Self {
        Self {
            stop_time: Some(stop_time),
            datetime,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StopTimeQuery {
    pub stop_event: StopEvent,
    pub journey_pattern_point: JourneyPatternPointIdx,
    pub datetime: SecondsSinceDatasetStart,
    pub real_time_level: RealTimeLevel,
    pub accessibility: AccessibilityParams,
    pub check_frequency: bool,
    /// latest instant accepted by `earliest_stop_time()`,
    /// earliest instant accepted by `tardiest_stop_time()`
    pub bound: Option<SecondsSinceDatasetStart>,
}

impl StopTimeQuery {
    pub fn new(
        stop_event: StopEvent,
        journey_pattern_point: JourneyPatternPointIdx,
        datetime: SecondsSinceDatasetStart,
    ) -> Self {
        Self {
            stop_event,
            journey_pattern_point,
            datetime,
            real_time_level: RealTimeLevel::Base,
            accessibility: AccessibilityParams::none(),
            check_frequency: true,
            bound: None,
        }
    }

    pub fn real_time_level(mut self, real_time_level: RealTimeLevel) -> Self {
        self.real_time_level = real_time_level;
        self
    }

    pub fn accessibility(mut self, accessibility: AccessibilityParams) -> Self {
        self.accessibility = accessibility;
        self
    }

    pub fn check_frequency(mut self, check_frequency: bool) -> Self {
        self.check_frequency = check_frequency;
        self
    }

    pub fn bound(mut self, bound: SecondsSinceDatasetStart) -> Self {
        self.bound = Some(bound);
        self
    }
}

// Sorted stop times of one journey pattern point.
// `times[i]` is the time of day (in [0, 86400)) of `stop_times[i]`.
#[derive(Debug, Clone, Default)]
struct TimesStopTimes {
    times: Vec<u32>,
    stop_times: Vec<StopTimeIdx>,
}

#[derive(Debug, Clone)]
pub struct NextStopTimeData {
    // indexed by JourneyPatternPointIdx
    departures: Vec<TimesStopTimes>,
    arrivals: Vec<TimesStopTimes>,
    search_params: SearchParams,
}

impl NextStopTimeData {
    pub fn new(schedule: &Schedule, search_params: SearchParams) -> Self {
        let nb_of_jpp = schedule.nb_of_journey_pattern_points();
        let mut departures: Vec<Vec<(u32, u32, VehicleJourneyIdx, u16)>> = vec![Vec::new(); nb_of_jpp];
        let mut arrivals: Vec<Vec<(u32, u32, VehicleJourneyIdx, u16)>> = vec![Vec::new(); nb_of_jpp];

        for (vj_idx, vj) in schedule.vehicle_journeys() {
            if vj.is_frequency() {
                continue;
            }
            let earliest_time = vj.earliest_time();
            for (order, stop_time) in vj.stop_times().iter().enumerate() {
                let jpp = stop_time.journey_pattern_point().idx;
                if stop_time.pick_up_allowed() {
                    departures[jpp].push((
                        stop_time.time_of(StopEvent::PickUp).time_of_day(),
                        earliest_time,
                        vj_idx,
                        order as u16,
                    ));
                }
                if stop_time.drop_off_allowed() {
                    arrivals[jpp].push((
                        stop_time.time_of(StopEvent::DropOff).time_of_day(),
                        earliest_time,
                        vj_idx,
                        order as u16,
                    ));
                }
            }
        }

        let sort = |entries: Vec<Vec<(u32, u32, VehicleJourneyIdx, u16)>>| {
            entries
                .into_iter()
                .map(|mut entries| {
                    // vehicles leaving at the same time are ordered
                    // by their start, then by their index
                    entries.sort_unstable();
                    TimesStopTimes {
                        times: entries.iter().map(|entry| entry.0).collect(),
                        stop_times: entries
                            .iter()
                            .map(|entry| StopTimeIdx {
                                vehicle_journey: entry.2,
                                order: entry.3,
                            })
                            .collect(),
                    }
                })
                .collect::<Vec<_>>()
        };

        let result = Self {
            departures: sort(departures),
            arrivals: sort(arrivals),
            search_params,
        };
        debug!(
            "Next stop time data built for {} journey pattern points",
            nb_of_jpp
        );
        result
    }

    pub fn search_params(&self) -> &SearchParams {
        &self.search_params
    }

    fn times_stop_times(
        &self,
        stop_event: StopEvent,
        jpp: JourneyPatternPointIdx,
    ) -> Option<&TimesStopTimes> {
        match stop_event {
            StopEvent::PickUp => self.departures.get(jpp.idx),
            StopEvent::DropOff => self.arrivals.get(jpp.idx),
        }
    }

    /// The default upper bound of a forward search started at `datetime`
    pub fn default_forward_bound(&self, datetime: &SecondsSinceDatasetStart) -> SecondsSinceDatasetStart {
        let day = datetime.day();
        let last_day = day
            .checked_add(self.search_params.forward_horizon_days)
            .unwrap_or(day);
        SecondsSinceDatasetStart::end_of_day(&last_day)
    }

    /// The default lower bound of a backward search started at `datetime`
    pub fn default_backward_bound(
        &self,
        datetime: &SecondsSinceDatasetStart,
    ) -> SecondsSinceDatasetStart {
        let first_day = datetime
            .day()
            .saturating_sub(self.search_params.backward_horizon_days);
        SecondsSinceDatasetStart::start_of_day(&first_day)
    }

    /// The first stop time at the journey pattern point usable at or after `query.datetime`,
    /// and no later than the bound.
    pub fn earliest_stop_time(&self, schedule: &Schedule, query: &StopTimeQuery) -> NextStopTime {
        if !query.datetime.is_valid() || !self.stop_point_accessible(schedule, query) {
            return NextStopTime::not_found();
        }
        let bound = query
            .bound
            .unwrap_or_else(|| self.default_forward_bound(&query.datetime))
            .min(schedule.calendar().last_seconds());
        if bound < query.datetime {
            return NextStopTime::not_found();
        }

        let discrete = self.earliest_discrete(schedule, query, &bound);
        if !query.check_frequency {
            return discrete;
        }
        let frequency = frequency::earliest_frequency(schedule, query, &bound);
        match (discrete.is_found(), frequency.is_found()) {
            (_, false) => discrete,
            (false, true) => frequency,
            // on equal times, discrete vehicle journeys are preferred
            (true, true) if frequency.datetime < discrete.datetime => frequency,
            (true, true) => discrete,
        }
    }

    /// The last stop time at the journey pattern point usable at or before `query.datetime`,
    /// and no earlier than the bound.
    pub fn tardiest_stop_time(&self, schedule: &Schedule, query: &StopTimeQuery) -> NextStopTime {
        if !query.datetime.is_valid() || !self.stop_point_accessible(schedule, query) {
            return NextStopTime::not_found();
        }
        let bound = query
            .bound
            .unwrap_or_else(|| self.default_backward_bound(&query.datetime));
        if bound > query.datetime {
            return NextStopTime::not_found();
        }

        let discrete = self.tardiest_discrete(schedule, query, &bound);
        if !query.check_frequency {
            return discrete;
        }
        let frequency = frequency::tardiest_frequency(schedule, query, &bound);
        match (discrete.is_found(), frequency.is_found()) {
            (_, false) => discrete,
            (false, true) => frequency,
            (true, true) if frequency.datetime > discrete.datetime => frequency,
            (true, true) => discrete,
        }
    }

    fn stop_point_accessible(&self, schedule: &Schedule, query: &StopTimeQuery) -> bool {
        if query.journey_pattern_point.idx >= schedule.nb_of_journey_pattern_points() {
            return false;
        }
        let jpp = schedule.journey_pattern_point(query.journey_pattern_point);
        schedule
            .stop_point(jpp.stop_point)
            .properties
            .contains(&query.accessibility.stop_point)
    }

    fn earliest_discrete(
        &self,
        schedule: &Schedule,
        query: &StopTimeQuery,
        bound: &SecondsSinceDatasetStart,
    ) -> NextStopTime {
        let times_stop_times = match self.times_stop_times(query.stop_event, query.journey_pattern_point) {
            Some(times_stop_times) if !times_stop_times.times.is_empty() => times_stop_times,
            _ => return NextStopTime::not_found(),
        };

        let mut day = query.datetime.day();
        // on the first day, we only look at stop times after the requested time of day
        // i.e. the first idx such that times[idx] >= time_of_day
        let time_of_day = query.datetime.time_of_day();
        let mut first_idx = times_stop_times
            .times
            .partition_point(|time| *time < time_of_day);

        while day <= bound.day() {
            for idx in first_idx..times_stop_times.times.len() {
                let datetime = SecondsSinceDatasetStart::compose(&day, times_stop_times.times[idx]);
                if datetime > *bound {
                    return NextStopTime::not_found();
                }
                let stop_time_idx = times_stop_times.stop_times[idx];
                if self.is_usable(schedule, query, &stop_time_idx, &day) {
                    return NextStopTime::found(stop_time_idx, datetime);
                }
            }
            first_idx = 0;
            day = match day.succ() {
                Some(day) => day,
                None => break,
            };
        }
        NextStopTime::not_found()
    }

    fn tardiest_discrete(
        &self,
        schedule: &Schedule,
        query: &StopTimeQuery,
        bound: &SecondsSinceDatasetStart,
    ) -> NextStopTime {
        let times_stop_times = match self.times_stop_times(query.stop_event, query.journey_pattern_point) {
            Some(times_stop_times) if !times_stop_times.times.is_empty() => times_stop_times,
            _ => return NextStopTime::not_found(),
        };

        let mut day = query.datetime.day();
        // on the first day, we only look at stop times before the requested time of day
        // i.e. the idx such that times[idx] > time_of_day for all idx >= end_idx
        let time_of_day = query.datetime.time_of_day();
        let mut end_idx = times_stop_times
            .times
            .partition_point(|time| *time <= time_of_day);

        while day >= bound.day() {
            for idx in (0..end_idx).rev() {
                let datetime = SecondsSinceDatasetStart::compose(&day, times_stop_times.times[idx]);
                if datetime < *bound {
                    return NextStopTime::not_found();
                }
                let stop_time_idx = times_stop_times.stop_times[idx];
                if self.is_usable(schedule, query, &stop_time_idx, &day) {
                    return NextStopTime::found(stop_time_idx, datetime);
                }
            }
            end_idx = times_stop_times.times.len();
            day = match day.pred() {
                Some(day) => day,
                None => break,
            };
        }
        NextStopTime::not_found()
    }

    // Is the stop time, happening on `day`, usable by the query ?
    // The validity is checked on the day the vehicle journey started.
    fn is_usable(
        &self,
        schedule: &Schedule,
        query: &StopTimeQuery,
        stop_time_idx: &StopTimeIdx,
        day: &DaysSinceDatasetStart,
    ) -> bool {
        let vehicle_journey = match schedule.vehicle_journey(stop_time_idx.vehicle_journey) {
            Some(vehicle_journey) => vehicle_journey,
            None => return false,
        };
        let stop_time = match vehicle_journey.stop_time(stop_time_idx.order) {
            Some(stop_time) => stop_time,
            None => return false,
        };
        let days_after = stop_time.time_of(query.stop_event).days_after_day_start();
        let circulation_day = match day.checked_sub(days_after) {
            Some(circulation_day) => circulation_day,
            None => return false,
        };
        vehicle_journey.accessible(&query.accessibility.vehicle)
            && schedule
                .validity_pattern(vehicle_journey, query.real_time_level)
                .check(&circulation_day)
    }
}

// Order between two candidate stop times found at the same journey pattern point.
// Same order as the one used to sort the stop times of a journey pattern point.
pub(crate) fn candidate_order(
    schedule: &Schedule,
    lhs: &(SecondsSinceDatasetStart, StopTimeIdx),
    rhs: &(SecondsSinceDatasetStart, StopTimeIdx),
) -> Ordering {
    let earliest_time = |stop_time: &StopTimeIdx| {
        schedule
            .vehicle_journey(stop_time.vehicle_journey)
            .map(|vj| vj.earliest_time())
            .unwrap_or(u32::MAX)
    };
    lhs.0
        .cmp(&rhs.0)
        .then_with(|| earliest_time(&lhs.1).cmp(&earliest_time(&rhs.1)))
        .then_with(|| lhs.1.vehicle_journey.cmp(&rhs.1.vehicle_journey))
}
