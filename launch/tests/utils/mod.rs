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

#![allow(dead_code)]
pub mod disruption_builder;

use launch::rt_schedule::chrono::{NaiveDate, NaiveDateTime};
use launch::rt_schedule::config::{CacheParams, SearchParams};
use launch::rt_schedule::modelbuilder::{AsDate, AsDateTime};
use launch::rt_schedule::models::{JourneyPatternPointIdx, Schedule};
use launch::rt_schedule::time::SecondsSinceDatasetStart;
use launch::rt_schedule::{Data, NextStopTime, RealTimeLevel, StopEvent, StopTimeQuery};

pub fn build_data(schedule: Schedule) -> Data {
    Data::new(schedule, SearchParams::default(), &CacheParams::default())
}

pub fn seconds(data: &Data, datetime: impl AsDateTime) -> SecondsSinceDatasetStart {
    data.calendar()
        .from_naive_datetime(&datetime.as_datetime())
        .unwrap()
}

/// The journey pattern point of `vehicle_journey` at `stop_point`
pub fn jpp(data: &Data, vehicle_journey: &str, stop_point: &str) -> JourneyPatternPointIdx {
    let schedule = data.schedule();
    let vj_idx = schedule.vehicle_journey_idx(vehicle_journey).unwrap();
    let stop_point_idx = schedule.stop_point_idx(stop_point).unwrap();
    schedule
        .vehicle_journey(vj_idx)
        .unwrap()
        .stop_times()
        .iter()
        .find(|stop_time| stop_time.stop_point() == stop_point_idx)
        .map(|stop_time| stop_time.journey_pattern_point())
        .unwrap()
}

pub fn query(
    data: &Data,
    stop_event: StopEvent,
    jpp: JourneyPatternPointIdx,
    datetime: impl AsDateTime,
) -> StopTimeQuery {
    StopTimeQuery::new(stop_event, jpp, seconds(data, datetime))
}

/// The vehicle journey and the datetime found, if any
pub fn describe(data: &Data, result: &NextStopTime) -> Option<(String, NaiveDateTime)> {
    let stop_time = result.stop_time?;
    let schedule = data.schedule();
    let vj = schedule.vehicle_journey(stop_time.vehicle_journey)?;
    Some((
        vj.uri().to_string(),
        data.calendar().to_naive_datetime(&result.datetime),
    ))
}

pub fn earliest(data: &Data, query: &StopTimeQuery) -> Option<(String, NaiveDateTime)> {
    describe(data, &data.earliest_stop_time(query))
}

pub fn tardiest(data: &Data, query: &StopTimeQuery) -> Option<(String, NaiveDateTime)> {
    describe(data, &data.tardiest_stop_time(query))
}

pub fn found(vehicle_journey: &str, datetime: &str) -> Option<(String, NaiveDateTime)> {
    Some((vehicle_journey.to_string(), datetime.as_datetime()))
}

/// Does the vehicle journey named `vehicle_journey` run on `date` at `level` ?
pub fn runs(data: &Data, vehicle_journey: &str, level: RealTimeLevel, date: impl AsDate) -> bool {
    let schedule = data.schedule();
    let day = match schedule.calendar().date_to_days_since_start(&date.as_date()) {
        Some(day) => day,
        None => return false,
    };
    schedule
        .vehicle_journey_idx(vehicle_journey)
        .map(|idx| schedule.is_valid_on(idx, level, &day))
        .unwrap_or(false)
}

/// Uris of the vehicle journeys of the meta vehicle journey running on `date` at `level`
pub fn running_vehicle_journeys(
    data: &Data,
    meta_vehicle_journey: &str,
    level: RealTimeLevel,
    date: impl AsDate,
) -> Vec<String> {
    let schedule = data.schedule();
    let date: NaiveDate = date.as_date();
    let day = match schedule.calendar().date_to_days_since_start(&date) {
        Some(day) => day,
        None => return Vec::new(),
    };
    let mvj_idx = match schedule.meta_vehicle_journey_idx(meta_vehicle_journey) {
        Some(idx) => idx,
        None => return Vec::new(),
    };
    let mvj = schedule.meta_vehicle_journey(mvj_idx);
    let mut result: Vec<String> = RealTimeLevel::all()
        .iter()
        .flat_map(|level| mvj.vehicle_journeys(*level).iter().copied())
        .filter(|idx| {
            schedule.vehicle_journey(*idx).map_or(false, |vj| {
                let shifted = day.checked_add(vj.shift());
                shifted.map_or(false, |shifted| schedule.is_valid_on(*idx, level, &shifted))
            })
        })
        .filter_map(|idx| schedule.vehicle_journey(idx).map(|vj| vj.uri().to_string()))
        .collect();
    result.sort();
    result.dedup();
    result
}
