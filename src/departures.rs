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

//! Departure and arrival boards : all the stop times of some stop points
//! within a time window, read from the cached windows.

use crate::data::Data;
use crate::models::{
    AccessibilityParams, RealTimeLevel, StopEvent, StopPointIdx, StopTimeIdx, VehicleJourneyIdx,
};
use crate::next_stop_time::cache::CACHE_WINDOW_DAYS;
use crate::time::{Calendar, SecondsSinceDatasetStart};
use chrono::{NaiveDate, NaiveDateTime};
use tracing::warn;

#[derive(Debug, thiserror::Error)]
pub enum NextStopTimeError {
    #[error("The requested datetime {0} is out of the validity period of the data.")]
    BadDateTime(NaiveDateTime),
    #[error("The stop point {0:?} does not belong to the schedule.")]
    UnknownStopPoint(StopPointIdx),
}

#[derive(Debug, Clone)]
pub struct NextStopTimeRequestInput {
    pub input_stop_points: Vec<StopPointIdx>,
    pub from_datetime: NaiveDateTime,
    pub until_datetime: NaiveDateTime,
    pub max_response: u32,
    pub real_time_level: RealTimeLevel,
    pub accessibility: AccessibilityParams,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextStopTimeResponse {
    pub stop_point: StopPointIdx,
    pub vehicle_journey: VehicleJourneyIdx,
    // boarding time for departures, alighting time for arrivals
    pub datetime: NaiveDateTime,
    // the date on which the vehicle journey started its run
    pub vehicle_date: NaiveDate,
    pub stop_time_idx: StopTimeIdx,
}

fn to_seconds(
    calendar: &Calendar,
    datetime: &NaiveDateTime,
) -> Result<SecondsSinceDatasetStart, NextStopTimeError> {
    calendar.from_naive_datetime(datetime).ok_or_else(|| {
        warn!(
            "The requested datetime {:?} is out of bound of the allowed dates. \
            Allowed dates are between {:?} and {:?}.",
            datetime,
            calendar.first_datetime(),
            calendar.last_datetime(),
        );
        NextStopTimeError::BadDateTime(*datetime)
    })
}

pub fn next_departures(
    request: &NextStopTimeRequestInput,
    data: &Data,
) -> Result<Vec<NextStopTimeResponse>, NextStopTimeError> {
    next_stop_times(StopEvent::PickUp, request, data)
}

pub fn next_arrivals(
    request: &NextStopTimeRequestInput,
    data: &Data,
) -> Result<Vec<NextStopTimeResponse>, NextStopTimeError> {
    next_stop_times(StopEvent::DropOff, request, data)
}

fn next_stop_times(
    stop_event: StopEvent,
    request: &NextStopTimeRequestInput,
    data: &Data,
) -> Result<Vec<NextStopTimeResponse>, NextStopTimeError> {
    let calendar = data.calendar();
    let from_datetime = to_seconds(calendar, &request.from_datetime)?;
    let until_datetime = to_seconds(calendar, &request.until_datetime)?;
    let schedule = data.schedule();
    let stop_points = request
        .input_stop_points
        .iter()
        .map(|idx| {
            let stop_point = schedule.get_stop_point(*idx).ok_or_else(|| {
                warn!("Unknown stop point {:?} requested", idx);
                NextStopTimeError::UnknownStopPoint(*idx)
            })?;
            Ok((*idx, stop_point))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut response = Vec::new();
    let mut day = from_datetime.day();
    while SecondsSinceDatasetStart::start_of_day(&day) < until_datetime {
        let cached = data.cached_next_stop_time(day, request.real_time_level, request.accessibility);
        for (stop_point_idx, stop_point) in &stop_points {
            for jpp in &stop_point.journey_pattern_points {
                let entries =
                    cached.stop_times_between(stop_event, *jpp, &from_datetime, &until_datetime);
                response.extend(entries.iter().map(|entry| NextStopTimeResponse {
                    stop_point: *stop_point_idx,
                    vehicle_journey: entry.stop_time.vehicle_journey,
                    datetime: calendar.to_naive_datetime(&entry.datetime),
                    vehicle_date: calendar.to_naive_date(&entry.circulation_day),
                    stop_time_idx: entry.stop_time,
                }));
            }
        }
        if response.len() >= request.max_response as usize {
            break;
        }
        day = match day.checked_add(CACHE_WINDOW_DAYS) {
            Some(next) if next.days() < calendar.nb_of_days() => next,
            _ => break,
        };
    }

    response.sort_by(|lhs, rhs| {
        lhs.datetime
            .cmp(&rhs.datetime)
            .then_with(|| lhs.vehicle_journey.cmp(&rhs.vehicle_journey))
    });
    Ok(response
        .into_iter()
        .take(request.max_response as usize)
        .collect())
}
