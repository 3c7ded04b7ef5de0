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
use launch::rt_schedule::config::{CacheParams, SearchParams};
use launch::rt_schedule::disruption::Effect;
use launch::rt_schedule::models::{AccessibilityParams, Schedule};
use launch::rt_schedule::modelbuilder::ScheduleBuilder;
use launch::rt_schedule::time::DaysSinceDatasetStart;
use launch::rt_schedule::{Data, Metrics, RealTimeLevel, StopEvent};
use rstest::{fixture, rstest};
use utils::disruption_builder::DisruptionBuilder;
use utils::{build_data, describe, earliest, jpp, query, seconds, tardiest};

fn schedule() -> Schedule {
    ScheduleBuilder::new("2020-01-01", "2020-01-10")
        .vj("morning", |vj_builder| {
            vj_builder.st("A", "08:00:00").st("B", "09:00:00");
        })
        .frequency_vj("shuttle", "10:00:00", "12:00:00", 1800, |vj_builder| {
            vj_builder.st("A", "00:00:00").st("B", "00:10:00");
        })
        .vj("night", |vj_builder| {
            vj_builder.st("A", "23:30:00").st("B", "24:30:00");
        })
        .build()
}

#[fixture]
fn data() -> Data {
    build_data(schedule())
}

fn day(idx: u16) -> DaysSinceDatasetStart {
    DaysSinceDatasetStart::new(idx)
}

#[rstest]
#[case(StopEvent::PickUp, "A", "2020-01-01T07:00:00")]
#[case(StopEvent::PickUp, "A", "2020-01-01T09:00:00")]
#[case(StopEvent::PickUp, "A", "2020-01-01T10:40:00")]
#[case(StopEvent::PickUp, "A", "2020-01-01T12:01:00")]
#[case(StopEvent::PickUp, "A", "2020-01-01T23:31:00")]
#[case(StopEvent::PickUp, "A", "2020-01-02T23:31:00")]
#[case(StopEvent::DropOff, "B", "2020-01-02T00:00:00")]
#[case(StopEvent::DropOff, "B", "2020-01-05T11:05:00")]
fn cached_search_matches_the_index(
    data: Data,
    #[case] stop_event: StopEvent,
    #[case] stop_point: &str,
    #[case] datetime: &str,
) -> Result<(), Error> {
    let _log_guard = launch::logger::init_test_logger();
    let jpp = jpp(&data, "morning", stop_point);
    let query = query(&data, stop_event, jpp, datetime);

    let cached = describe(&data, &data.cached_earliest_stop_time(&query));
    assert_eq!(cached, earliest(&data, &query));
    let cached = describe(&data, &data.cached_tardiest_stop_time(&query));
    assert_eq!(cached, tardiest(&data, &query));
    Ok(())
}

#[rstest]
fn window_lists_every_run_of_the_day(data: Data) -> Result<(), Error> {
    let _log_guard = launch::logger::init_test_logger();
    let jpp = jpp(&data, "morning", "A");
    let cached = data.cached_next_stop_time(day(0), RealTimeLevel::Base, AccessibilityParams::default());
    assert_eq!(cached.window_start(), seconds(&data, "2020-01-01T00:00:00"));
    assert_eq!(cached.window_end(), seconds(&data, "2020-01-02T23:59:59"));

    let first_day = cached.stop_times_between(
        StopEvent::PickUp,
        jpp,
        &seconds(&data, "2020-01-01T00:00:00"),
        &seconds(&data, "2020-01-02T00:00:00"),
    );
    let datetimes: Vec<_> = first_day
        .iter()
        .map(|entry| data.calendar().to_naive_datetime(&entry.datetime).to_string())
        .collect();
    assert_eq!(
        datetimes,
        vec![
            "2020-01-01 08:00:00",
            "2020-01-01 10:00:00",
            "2020-01-01 10:30:00",
            "2020-01-01 11:00:00",
            "2020-01-01 11:30:00",
            "2020-01-01 12:00:00",
            "2020-01-01 23:30:00",
        ]
    );
    assert!(first_day.iter().all(|entry| entry.circulation_day == day(0)));

    // the night vehicle journey of the 1st reaches B on the 2nd
    let jpp_b = utils::jpp(&data, "morning", "B");
    let after_midnight = cached.stop_times_between(
        StopEvent::DropOff,
        jpp_b,
        &seconds(&data, "2020-01-02T00:00:00"),
        &seconds(&data, "2020-01-02T01:00:00"),
    );
    assert_eq!(after_midnight.len(), 1);
    assert_eq!(after_midnight[0].circulation_day, day(0));
    assert_eq!(
        after_midnight[0].datetime,
        seconds(&data, "2020-01-02T00:30:00")
    );
    Ok(())
}

#[rstest]
fn search_stops_at_the_end_of_the_window(data: Data) -> Result<(), Error> {
    let _log_guard = launch::logger::init_test_logger();
    let jpp = jpp(&data, "morning", "A");
    let cached = data.cached_next_stop_time(day(0), RealTimeLevel::Base, AccessibilityParams::default());
    let last_night = seconds(&data, "2020-01-02T23:30:00");

    let result = cached.earliest_stop_time(StopEvent::PickUp, jpp, &last_night, None);
    assert_eq!(result.datetime, last_night);

    let too_late = seconds(&data, "2020-01-02T23:31:00");
    let result = cached.earliest_stop_time(StopEvent::PickUp, jpp, &too_late, Some(cached.window_end()));
    assert!(!result.is_found());
    // the uncached search goes on with the next day
    let query = query(&data, StopEvent::PickUp, jpp, "2020-01-02T23:31:00");
    assert_eq!(
        describe(&data, &data.cached_earliest_stop_time(&query)),
        utils::found("morning", "2020-01-03T08:00:00")
    );
    Ok(())
}

#[rstest]
fn hits_and_misses_are_counted(data: Data) -> Result<(), Error> {
    let _log_guard = launch::logger::init_test_logger();
    let metrics = Metrics::new()?;
    let accessibility = AccessibilityParams::default();

    data.cached_next_stop_time(day(0), RealTimeLevel::Base, accessibility);
    data.cached_next_stop_time(day(0), RealTimeLevel::Base, accessibility);
    data.cached_next_stop_time(day(0), RealTimeLevel::RealTime, accessibility);

    let snapshot = data.metrics_snapshot(&metrics);
    assert_eq!(snapshot.nb_of_cache_misses, 2);
    assert_eq!(snapshot.nb_of_cache_hits, 1);
    assert_eq!(data.cache_manager().entry_count(), 2);
    Ok(())
}

#[test]
fn least_recently_used_entries_are_evicted() -> Result<(), Error> {
    let _log_guard = launch::logger::init_test_logger();
    let data = Data::new(
        schedule(),
        SearchParams::default(),
        &CacheParams { cache_size: 2 },
    );
    let accessibility = AccessibilityParams::default();
    for idx in 0..5 {
        data.cached_next_stop_time(day(idx), RealTimeLevel::Base, accessibility);
    }
    assert!(data.cache_manager().entry_count() <= 2);
    Ok(())
}

#[rstest]
fn disruption_invalidates_the_days_it_changes(mut data: Data) -> Result<(), Error> {
    let _log_guard = launch::logger::init_test_logger();
    let metrics = Metrics::new()?;
    let accessibility = AccessibilityParams::default();
    let jpp = jpp(&data, "morning", "A");

    let before = data.cached_next_stop_time(day(0), RealTimeLevel::RealTime, accessibility);
    data.cached_next_stop_time(day(5), RealTimeLevel::RealTime, accessibility);
    assert_eq!(data.cache_manager().entry_count(), 2);

    let disruption = DisruptionBuilder::new("no_morning")
        .impact("cancel", |impact| {
            impact
                .effect(Effect::NoService)
                .trip("morning")
                .period("2020-01-01T00:00:00", "2020-01-01T23:59:59");
        })
        .build();
    data.apply_disruption(disruption, &metrics)?;

    // only the window of the 1st depends on the canceled day
    assert_eq!(data.cache_manager().entry_count(), 1);
    // a window already handed out keeps its content
    assert_eq!(
        before.stop_times(StopEvent::PickUp, jpp)[0].datetime,
        seconds(&data, "2020-01-01T08:00:00")
    );

    let real_time = query(&data, StopEvent::PickUp, jpp, "2020-01-01T07:00:00")
        .real_time_level(RealTimeLevel::RealTime);
    assert_eq!(
        describe(&data, &data.cached_earliest_stop_time(&real_time)),
        utils::found("shuttle", "2020-01-01T10:00:00")
    );
    let base = query(&data, StopEvent::PickUp, jpp, "2020-01-01T07:00:00");
    assert_eq!(
        describe(&data, &data.cached_earliest_stop_time(&base)),
        utils::found("morning", "2020-01-01T08:00:00")
    );
    Ok(())
}

#[test]
fn overnight_replacement_invalidates_the_next_day() -> Result<(), Error> {
    let _log_guard = launch::logger::init_test_logger();
    let metrics = Metrics::new()?;
    let schedule = ScheduleBuilder::new("2020-01-01", "2020-01-10")
        .vj("morning", |vj_builder| {
            vj_builder.st("A", "08:00:00").st("B", "09:00:00");
        })
        .build();
    let mut data = build_data(schedule);
    let jpp = jpp(&data, "morning", "B");
    data.cached_next_stop_time(day(1), RealTimeLevel::RealTime, AccessibilityParams::default());

    let disruption = DisruptionBuilder::new("late")
        .impact("late", |impact| {
            impact.trip_update("morning", "2020-01-01", |trip_update| {
                trip_update
                    .delayed("A", "2020-01-01T23:30:00")
                    .delayed("B", "2020-01-02T00:30:00");
            });
        })
        .build();
    data.apply_disruption(disruption, &metrics)?;

    let real_time = query(&data, StopEvent::DropOff, jpp, "2020-01-02T00:00:00")
        .real_time_level(RealTimeLevel::RealTime);
    let uncached = earliest(&data, &real_time);
    let cached = describe(&data, &data.cached_earliest_stop_time(&real_time));
    assert_eq!(cached, uncached);
    let (_, datetime) = cached.unwrap();
    assert_eq!(datetime.to_string(), "2020-01-02 00:30:00");
    Ok(())
}
