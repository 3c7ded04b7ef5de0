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
use launch::rt_schedule::config::{CacheParams, SearchParams};
use launch::rt_schedule::modelbuilder::ScheduleBuilder;
use launch::rt_schedule::models::{AccessibilityParams, StopPointProperties, VehicleProperties};
use launch::rt_schedule::time::SecondsSinceDatasetStart;
use launch::rt_schedule::{Data, StopEvent};
use rstest::{fixture, rstest};
use utils::{build_data, earliest, found, jpp, query, seconds, tardiest};

#[fixture]
fn data() -> Data {
    let schedule = ScheduleBuilder::new("2020-01-01", "2020-01-03")
        .vj("morning", |vj_builder| {
            vj_builder.st("A", "08:30:00").st("B", "09:00:00");
        })
        .build();
    build_data(schedule)
}

#[rstest]
#[case("2020-01-01T08:00:00", found("morning", "2020-01-01T08:30:00"))]
#[case("2020-01-01T08:30:00", found("morning", "2020-01-01T08:30:00"))]
#[case("2020-01-01T08:31:00", found("morning", "2020-01-02T08:30:00"))]
#[case("2020-01-03T08:31:00", None)]
fn earliest_pick_up(
    data: Data,
    #[case] datetime: &str,
    #[case] expected: Option<(String, NaiveDateTime)>,
) -> Result<(), Error> {
    let _log_guard = launch::logger::init_test_logger();
    let jpp = jpp(&data, "morning", "A");
    let query = query(&data, StopEvent::PickUp, jpp, datetime);
    assert_eq!(earliest(&data, &query), expected);
    Ok(())
}

#[test]
fn no_further_active_day() -> Result<(), Error> {
    let _log_guard = launch::logger::init_test_logger();
    let schedule = ScheduleBuilder::new("2020-01-01", "2020-01-03")
        .default_calendar(&["2020-01-01"])
        .vj("morning", |vj_builder| {
            vj_builder.st("A", "08:30:00").st("B", "09:00:00");
        })
        .build();
    let data = build_data(schedule);
    let jpp = jpp(&data, "morning", "A");

    let query = query(&data, StopEvent::PickUp, jpp, "2020-01-01T08:31:00");
    assert_eq!(earliest(&data, &query), None);
    Ok(())
}

#[rstest]
#[case("2020-01-02T08:00:00", found("morning", "2020-01-01T08:30:00"))]
#[case("2020-01-02T08:30:00", found("morning", "2020-01-02T08:30:00"))]
#[case("2020-01-01T08:29:59", None)]
fn tardiest_pick_up(
    data: Data,
    #[case] datetime: &str,
    #[case] expected: Option<(String, NaiveDateTime)>,
) -> Result<(), Error> {
    let _log_guard = launch::logger::init_test_logger();
    let jpp = jpp(&data, "morning", "A");
    let query = query(&data, StopEvent::PickUp, jpp, datetime);
    assert_eq!(tardiest(&data, &query), expected);
    Ok(())
}

#[rstest]
fn earliest_then_tardiest_on_a_stop_time(data: Data) -> Result<(), Error> {
    let _log_guard = launch::logger::init_test_logger();
    let jpp = jpp(&data, "morning", "B");
    let start = seconds(&data, "2020-01-02T09:00:00");

    let forward = query(&data, StopEvent::DropOff, jpp, "2020-01-02T09:00:00")
        .bound(seconds(&data, "2020-01-02T10:00:00"));
    let result = data.earliest_stop_time(&forward);
    assert!(result.is_found());

    let mut backward = forward.clone().bound(start);
    backward.datetime = result.datetime;
    let back = data.tardiest_stop_time(&backward);
    assert_eq!(back.datetime, start);
    assert_eq!(back.stop_time, result.stop_time);
    Ok(())
}

#[rstest]
fn bound_limits_the_search(data: Data) -> Result<(), Error> {
    let _log_guard = launch::logger::init_test_logger();
    let jpp = jpp(&data, "morning", "A");

    let bounded = query(&data, StopEvent::PickUp, jpp, "2020-01-01T08:00:00")
        .bound(seconds(&data, "2020-01-01T08:20:00"));
    assert_eq!(earliest(&data, &bounded), None);

    let bounded = query(&data, StopEvent::PickUp, jpp, "2020-01-02T08:00:00")
        .bound(seconds(&data, "2020-01-01T23:00:00"));
    assert_eq!(tardiest(&data, &bounded), None);
    Ok(())
}

#[rstest]
fn far_bound_ends_at_the_calendar(data: Data) -> Result<(), Error> {
    let _log_guard = launch::logger::init_test_logger();
    let jpp = jpp(&data, "morning", "A");

    let far = SecondsSinceDatasetStart::from_i64(i64::from(u32::MAX) - 1).unwrap();
    let forward = query(&data, StopEvent::PickUp, jpp, "2020-01-03T09:00:00").bound(far);
    assert_eq!(earliest(&data, &forward), None);

    let forward = query(&data, StopEvent::PickUp, jpp, "2020-01-02T09:00:00").bound(far);
    assert_eq!(
        earliest(&data, &forward),
        found("morning", "2020-01-03T08:30:00")
    );
    Ok(())
}

#[test]
fn large_horizon_ends_at_the_calendar() -> Result<(), Error> {
    let _log_guard = launch::logger::init_test_logger();
    let schedule = ScheduleBuilder::new("2020-01-01", "2020-01-03")
        .vj("morning", |vj_builder| {
            vj_builder.st("A", "08:30:00").st("B", "09:00:00");
        })
        .build();
    let search_params = SearchParams {
        forward_horizon_days: u16::MAX,
        ..SearchParams::default()
    };
    let data = Data::new(schedule, search_params, &CacheParams::default());
    let jpp = jpp(&data, "morning", "A");

    let forward = query(&data, StopEvent::PickUp, jpp, "2020-01-03T09:00:00");
    assert_eq!(earliest(&data, &forward), None);
    Ok(())
}

#[test]
fn stop_events_use_allowed_stop_times() -> Result<(), Error> {
    let _log_guard = launch::logger::init_test_logger();
    let schedule = ScheduleBuilder::new("2020-01-01", "2020-01-03")
        .vj("drop_off_only", |vj_builder| {
            vj_builder
                .st("A", "08:00:00")
                .st_detailed("B", "08:30:00", "08:32:00", false, true)
                .st("C", "09:00:00");
        })
        .vj("pick_up_only", |vj_builder| {
            vj_builder
                .st("A", "08:10:00")
                .st_detailed("B", "08:40:00", "08:42:00", true, false)
                .st("C", "09:10:00");
        })
        .build();
    let data = build_data(schedule);
    let jpp = jpp(&data, "drop_off_only", "B");

    let pick_up = query(&data, StopEvent::PickUp, jpp, "2020-01-01T08:00:00");
    assert_eq!(
        earliest(&data, &pick_up),
        found("pick_up_only", "2020-01-01T08:42:00")
    );

    let drop_off = query(&data, StopEvent::DropOff, jpp, "2020-01-01T08:00:00");
    assert_eq!(
        earliest(&data, &drop_off),
        found("drop_off_only", "2020-01-01T08:30:00")
    );
    Ok(())
}

#[test]
fn overnight_stop_time_uses_its_circulation_day() -> Result<(), Error> {
    let _log_guard = launch::logger::init_test_logger();
    let schedule = ScheduleBuilder::new("2020-01-01", "2020-01-03")
        .default_calendar(&["2020-01-01"])
        .vj("night", |vj_builder| {
            vj_builder.st("A", "23:50:00").st("B", "25:10:00");
        })
        .build();
    let data = build_data(schedule);
    let jpp = jpp(&data, "night", "B");

    // issued the day before the arrival
    let evening = query(&data, StopEvent::DropOff, jpp, "2020-01-01T20:00:00");
    assert_eq!(earliest(&data, &evening), found("night", "2020-01-02T01:10:00"));

    let morning = query(&data, StopEvent::DropOff, jpp, "2020-01-02T01:00:00");
    assert_eq!(earliest(&data, &morning), found("night", "2020-01-02T01:10:00"));

    let after = query(&data, StopEvent::DropOff, jpp, "2020-01-02T02:00:00");
    assert_eq!(tardiest(&data, &after), found("night", "2020-01-02T01:10:00"));

    // the run of 2020-01-02 does not exist
    let next_night = query(&data, StopEvent::DropOff, jpp, "2020-01-02T02:00:00");
    assert_eq!(earliest(&data, &next_night), None);
    Ok(())
}

#[test]
fn accessibility_filters_vehicles_and_stop_points() -> Result<(), Error> {
    let _log_guard = launch::logger::init_test_logger();
    let schedule = ScheduleBuilder::new("2020-01-01", "2020-01-03")
        .stop_point("A", |stop_point| {
            stop_point.properties = StopPointProperties::WHEELCHAIR_BOARDING;
        })
        .vj("morning", |vj_builder| {
            vj_builder.st("A", "08:30:00").st("B", "09:00:00");
        })
        .vj("accessible", |vj_builder| {
            vj_builder
                .properties(VehicleProperties::WHEELCHAIR_ACCESSIBLE)
                .st("A", "08:40:00")
                .st("B", "09:10:00");
        })
        .build();
    let data = build_data(schedule);

    let jpp_a = jpp(&data, "morning", "A");
    let any = query(&data, StopEvent::PickUp, jpp_a, "2020-01-01T08:00:00");
    assert_eq!(earliest(&data, &any), found("morning", "2020-01-01T08:30:00"));

    let wheelchair = any.clone().accessibility(AccessibilityParams::wheelchair());
    assert_eq!(
        earliest(&data, &wheelchair),
        found("accessible", "2020-01-01T08:40:00")
    );

    // B has no wheelchair boarding
    let jpp_b = jpp(&data, "morning", "B");
    let wheelchair = query(&data, StopEvent::DropOff, jpp_b, "2020-01-01T08:00:00")
        .accessibility(AccessibilityParams::wheelchair());
    assert_eq!(earliest(&data, &wheelchair), None);
    Ok(())
}

#[test]
fn discrete_is_preferred_on_equal_times() -> Result<(), Error> {
    let _log_guard = launch::logger::init_test_logger();
    let schedule = ScheduleBuilder::new("2020-01-01", "2020-01-03")
        .vj("discrete", |vj_builder| {
            vj_builder.st("A", "08:10:00").st("B", "08:20:00");
        })
        .frequency_vj("frequency", "08:00:00", "09:00:00", 600, |vj_builder| {
            vj_builder.st("A", "00:00:00").st("B", "00:10:00");
        })
        .build();
    let data = build_data(schedule);
    let jpp = jpp(&data, "discrete", "A");

    let at_0805 = query(&data, StopEvent::PickUp, jpp, "2020-01-01T08:05:00");
    assert_eq!(earliest(&data, &at_0805), found("discrete", "2020-01-01T08:10:00"));
    let at_0815 = query(&data, StopEvent::PickUp, jpp, "2020-01-01T08:15:00");
    assert_eq!(earliest(&data, &at_0815), found("frequency", "2020-01-01T08:20:00"));
    assert_eq!(tardiest(&data, &at_0815), found("discrete", "2020-01-01T08:10:00"));

    let without_frequency = at_0815.clone().check_frequency(false);
    assert_eq!(
        earliest(&data, &without_frequency),
        found("discrete", "2020-01-02T08:10:00")
    );
    Ok(())
}
