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
use launch::config::launch_params::{
    LaunchParams, BACKWARD_HORIZON_DAYS_VAR, CACHE_SIZE_VAR, FORWARD_HORIZON_DAYS_VAR,
};
use launch::rt_schedule::config::{CacheParams, SearchParams};
use launch::rt_schedule::disruption::{DisruptionError, Effect};
use launch::rt_schedule::models::Schedule;
use launch::rt_schedule::modelbuilder::ScheduleBuilder;
use launch::rt_schedule::{RealTimeLevel, SharedData, SharedDataError, StopEvent};
use std::thread;
use utils::disruption_builder::DisruptionBuilder;
use utils::{describe, jpp, query};

fn schedule() -> Schedule {
    ScheduleBuilder::new("2020-01-01", "2020-01-03")
        .vj("morning", |vj_builder| {
            vj_builder.st("A", "08:00:00").st("B", "09:00:00");
        })
        .vj("later", |vj_builder| {
            vj_builder.st("A", "10:00:00").st("B", "11:00:00");
        })
        .build()
}

// the first real time departure from A on the 1st
fn first_departure(shared_data: &SharedData) -> Result<Option<String>, SharedDataError> {
    shared_data.with_data(|data| {
        let jpp = jpp(data, "morning", "A");
        let query = query(data, StopEvent::PickUp, jpp, "2020-01-01T07:00:00")
            .real_time_level(RealTimeLevel::RealTime);
        describe(data, &data.cached_earliest_stop_time(&query)).map(|(uri, _)| uri)
    })
}

#[test]
fn readers_see_the_disruptions_of_the_writer() -> Result<(), Error> {
    let _log_guard = launch::logger::init_test_logger();
    let shared_data = launch::build_shared_data(schedule(), &LaunchParams::default())?;

    assert_eq!(first_departure(&shared_data)?, Some("morning".to_string()));

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let shared_data = shared_data.clone();
            thread::spawn(move || -> Result<(), SharedDataError> {
                for _ in 0..50 {
                    // either before or after the cancellation, never in between
                    let uri = first_departure(&shared_data)?;
                    assert!(uri == Some("morning".to_string()) || uri == Some("later".to_string()));
                }
                Ok(())
            })
        })
        .collect();

    let disruption = DisruptionBuilder::new("no_morning")
        .impact("no_morning", |impact| {
            impact
                .effect(Effect::NoService)
                .trip("morning")
                .period("2020-01-01T00:00:00", "2020-01-02T00:00:00");
        })
        .build();
    shared_data.apply_disruption(disruption)?;

    for reader in readers {
        reader.join().expect("reader thread panicked")?;
    }
    assert_eq!(first_departure(&shared_data)?, Some("later".to_string()));

    let snapshot = shared_data.metrics_snapshot()?;
    assert_eq!(snapshot.nb_of_applied_disruptions, 1);
    assert!(snapshot.nb_of_cache_misses >= 1);

    shared_data.delete_disruption("no_morning")?;
    assert_eq!(first_departure(&shared_data)?, Some("morning".to_string()));
    assert_eq!(shared_data.metrics().nb_of_deleted_disruptions(), 1);
    Ok(())
}

#[test]
fn disruption_errors_go_through_the_shared_data() -> Result<(), Error> {
    let _log_guard = launch::logger::init_test_logger();
    let shared_data = launch::build_shared_data(schedule(), &LaunchParams::default())?;
    let result = shared_data.delete_disruption("ghost");
    assert!(matches!(
        result,
        Err(SharedDataError::Disruption(DisruptionError::UnknownDisruption(_)))
    ));
    assert_eq!(shared_data.metrics_snapshot()?.nb_of_rejected_disruptions, 0);
    Ok(())
}

#[test]
fn null_cache_size_is_rejected() -> Result<(), Error> {
    let _log_guard = launch::logger::init_test_logger();
    let params = LaunchParams {
        cache_params: CacheParams { cache_size: 0 },
        search_params: SearchParams::default(),
    };
    assert!(params.validate().is_err());
    assert!(launch::build_shared_data(schedule(), &params).is_err());
    Ok(())
}

#[test]
fn launch_params_from_env_vars() -> Result<(), Error> {
    let _log_guard = launch::logger::init_test_logger();
    // the only test of this binary touching these variables
    std::env::set_var(CACHE_SIZE_VAR, "42");
    std::env::set_var(FORWARD_HORIZON_DAYS_VAR, "3");
    std::env::set_var(BACKWARD_HORIZON_DAYS_VAR, "not_a_number");
    let params = LaunchParams::new_from_env_vars();
    std::env::remove_var(CACHE_SIZE_VAR);
    std::env::remove_var(FORWARD_HORIZON_DAYS_VAR);
    std::env::remove_var(BACKWARD_HORIZON_DAYS_VAR);

    assert_eq!(params.cache_params.cache_size, 42);
    assert_eq!(params.search_params.forward_horizon_days, 3);
    // invalid values fall back on the default
    assert_eq!(
        params.search_params.backward_horizon_days,
        SearchParams::default().backward_horizon_days
    );
    params.validate()?;
    Ok(())
}
