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

mod utils;

use anyhow::Error;
use launch::rt_schedule::chrono::NaiveDateTime;
use launch::rt_schedule::departures::{
    next_arrivals, next_departures, NextStopTimeError, NextStopTimeRequestInput,
    NextStopTimeResponse,
};
use launch::rt_schedule::disruption::Effect;
use launch::rt_schedule::models::AccessibilityParams;
use launch::rt_schedule::modelbuilder::{AsDate, AsDateTime, ScheduleBuilder};
use launch::rt_schedule::{Data, Metrics, RealTimeLevel};
use rstest::{fixture, rstest};
use utils::build_data;
use utils::disruption_builder::DisruptionBuilder;

#[fixture]
fn data() -> Data {
    let schedule = ScheduleBuilder::new("2020-01-01", "2020-01-03")
        .vj("morning", |vj_builder| {
            vj_builder.st("A", "08:00:00").st("B", "08:30:00");
        })
        .vj("noon", |vj_builder| {
            vj_builder
                .route("other_route")
                .st("A", "12:00:00")
                .st("B", "12:30:00");
        })
        .vj("night", |vj_builder| {
            vj_builder.st("A", "23:30:00").st("B", "24:30:00");
        })
        .build();
    build_data(schedule)
}

fn request(data: &Data, stop_point: &str, from: &str, until: &str) -> NextStopTimeRequestInput {
    NextStopTimeRequestInput {
        input_stop_points: vec![data.schedule().stop_point_idx(stop_point).unwrap()],
        from_datetime: from.as_datetime(),
        until_datetime: until.as_datetime(),
        max_response: 10,
        real_time_level: RealTimeLevel::Base,
        accessibility: AccessibilityParams::default(),
    }
}

fn board(data: &Data, responses: &[NextStopTimeResponse]) -> Vec<(String, NaiveDateTime)> {
    let schedule = data.schedule();
    responses
        .iter()
        .map(|response| {
            let vj = schedule.vehicle_journey(response.vehicle_journey).unwrap();
            (vj.uri().to_string(), response.datetime)
        })
        .collect()
}

fn entry(vehicle_journey: &str, datetime: &str) -> (String, NaiveDateTime) {
    (vehicle_journey.to_string(), datetime.as_datetime())
}

#[rstest]
fn departures_of_all_journey_patterns(data: Data) -> Result<(), Error> {
    let _log_guard = launch::logger::init_test_logger();
    let request = request(&data, "A", "2020-01-01T07:00:00", "2020-01-01T13:00:00");
    let responses = next_departures(&request, &data)?;
    assert_eq!(
        board(&data, &responses),
        vec![
            entry("morning", "2020-01-01T08:00:00"),
            entry("noon", "2020-01-01T12:00:00"),
        ]
    );
    Ok(())
}

#[rstest]
fn number_of_responses_is_limited(data: Data) -> Result<(), Error> {
    let _log_guard = launch::logger::init_test_logger();
    let mut request = request(&data, "A", "2020-01-01T07:00:00", "2020-01-03T23:00:00");
    request.max_response = 1;
    let responses = next_departures(&request, &data)?;
    assert_eq!(
        board(&data, &responses),
        vec![entry("morning", "2020-01-01T08:00:00")]
    );
    Ok(())
}

#[rstest]
fn board_spanning_several_days(data: Data) -> Result<(), Error> {
    let _log_guard = launch::logger::init_test_logger();
    let request = request(&data, "A", "2020-01-01T00:00:00", "2020-01-03T23:59:00");
    let responses = next_departures(&request, &data)?;
    assert_eq!(responses.len(), 9);
    assert!(responses
        .windows(2)
        .all(|pair| pair[0].datetime <= pair[1].datetime));
    assert_eq!(
        board(&data, &responses).last(),
        Some(&entry("night", "2020-01-03T23:30:00"))
    );
    Ok(())
}

#[rstest]
fn arrival_after_midnight_keeps_its_vehicle_date(data: Data) -> Result<(), Error> {
    let _log_guard = launch::logger::init_test_logger();
    let request = request(&data, "B", "2020-01-02T00:00:00", "2020-01-02T01:00:00");
    let responses = next_arrivals(&request, &data)?;
    assert_eq!(
        board(&data, &responses),
        vec![entry("night", "2020-01-02T00:30:00")]
    );
    assert_eq!(responses[0].vehicle_date, "2020-01-01".as_date());
    Ok(())
}

#[rstest]
#[case("2019-12-31T08:00:00", "2020-01-01T08:00:00")]
#[case("2020-01-01T08:00:00", "2020-02-01T08:00:00")]
fn datetime_out_of_the_calendar(
    data: Data,
    #[case] from: &str,
    #[case] until: &str,
) -> Result<(), Error> {
    let _log_guard = launch::logger::init_test_logger();
    let request = request(&data, "A", from, until);
    let result = next_departures(&request, &data);
    assert!(matches!(result, Err(NextStopTimeError::BadDateTime(_))));
    Ok(())
}

#[rstest]
fn stop_point_of_another_schedule(data: Data) -> Result<(), Error> {
    let _log_guard = launch::logger::init_test_logger();
    let other = ScheduleBuilder::new("2020-01-01", "2020-01-03")
        .vj("other", |vj_builder| {
            vj_builder
                .st("X", "08:00:00")
                .st("Y", "08:30:00")
                .st("Z", "09:00:00");
        })
        .build();
    let foreign = other.stop_point_idx("Z").unwrap();

    let mut request = request(&data, "A", "2020-01-01T07:00:00", "2020-01-01T13:00:00");
    request.input_stop_points.push(foreign);
    let result = next_departures(&request, &data);
    assert!(matches!(
        result,
        Err(NextStopTimeError::UnknownStopPoint(idx)) if idx == foreign
    ));
    Ok(())
}

#[rstest]
fn real_time_board_follows_disruptions(mut data: Data) -> Result<(), Error> {
    let _log_guard = launch::logger::init_test_logger();
    let metrics = Metrics::new()?;
    let disruption = DisruptionBuilder::new("no_morning")
        .impact("no_morning", |impact| {
            impact
                .effect(Effect::NoService)
                .trip("morning")
                .period("2020-01-01T00:00:00", "2020-01-02T00:00:00");
        })
        .build();
    let mut request = request(&data, "A", "2020-01-01T07:00:00", "2020-01-01T13:00:00");
    // fill the cache before the disruption
    next_departures(&request, &data)?;
    data.apply_disruption(disruption, &metrics)?;

    assert_eq!(
        board(&data, &next_departures(&request, &data)?),
        vec![
            entry("morning", "2020-01-01T08:00:00"),
            entry("noon", "2020-01-01T12:00:00"),
        ]
    );
    request.real_time_level = RealTimeLevel::RealTime;
    assert_eq!(
        board(&data, &next_departures(&request, &data)?),
        vec![entry("noon", "2020-01-01T12:00:00")]
    );
    Ok(())
}
