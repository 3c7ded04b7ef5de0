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

use anyhow::Error;
use launch::rt_schedule::models::{Schedule, VehicleJourneyIdx};
use launch::rt_schedule::modelbuilder::ScheduleBuilder;

fn idx(schedule: &Schedule, uri: &str) -> VehicleJourneyIdx {
    schedule.vehicle_journey_idx(uri).unwrap()
}

#[test]
fn vehicle_journeys_of_a_block_are_chained() -> Result<(), Error> {
    let _log_guard = launch::logger::init_test_logger();
    let schedule = ScheduleBuilder::default()
        .vj("second", |vj_builder| {
            vj_builder
                .block_id("block_1")
                .st("B", "09:10:00")
                .st("C", "10:00:00");
        })
        .vj("first", |vj_builder| {
            vj_builder
                .block_id("block_1")
                .st("A", "08:00:00")
                .st("B", "09:00:00");
        })
        .vj("third", |vj_builder| {
            vj_builder
                .block_id("block_1")
                .st("C", "10:05:00")
                .st("D", "11:00:00");
        })
        .vj("alone", |vj_builder| {
            vj_builder.st("A", "09:05:00").st("B", "10:00:00");
        })
        .build();

    let (first, second, third) = (
        idx(&schedule, "first"),
        idx(&schedule, "second"),
        idx(&schedule, "third"),
    );
    assert_eq!(schedule.stay_in_next(first), Some(second));
    assert_eq!(schedule.stay_in_next(second), Some(third));
    assert_eq!(schedule.stay_in_next(third), None);
    assert_eq!(schedule.stay_in_prev(first), None);
    assert_eq!(schedule.stay_in_prev(second), Some(first));
    assert_eq!(schedule.stay_in_prev(third), Some(second));

    let alone = idx(&schedule, "alone");
    assert_eq!(schedule.stay_in_next(alone), None);
    assert_eq!(schedule.stay_in_prev(alone), None);
    Ok(())
}

#[test]
fn overlapping_vehicle_journeys_are_not_chained() -> Result<(), Error> {
    let _log_guard = launch::logger::init_test_logger();
    let schedule = ScheduleBuilder::default()
        .vj("early", |vj_builder| {
            vj_builder
                .block_id("block_2")
                .st("A", "08:00:00")
                .st("B", "09:00:00");
        })
        .vj("overlapping", |vj_builder| {
            vj_builder
                .block_id("block_2")
                .st("B", "08:50:00")
                .st("C", "10:00:00");
        })
        .build();

    assert_eq!(schedule.stay_in_next(idx(&schedule, "early")), None);
    assert_eq!(schedule.stay_in_prev(idx(&schedule, "overlapping")), None);
    Ok(())
}
