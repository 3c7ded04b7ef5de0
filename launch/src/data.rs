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

use crate::config::LaunchParams;
use anyhow::Context;
use rt_schedule::models::Schedule;
use rt_schedule::tracing::info;
use rt_schedule::{Data, SharedData};

/// Index the schedule and wrap it for sharing between threads
pub fn build_shared_data(schedule: Schedule, params: &LaunchParams) -> Result<SharedData, anyhow::Error> {
    params
        .validate()
        .with_context(|| format!("Invalid launch parameters {}", params))?;
    info!(
        "Building data from {} vehicle journeys with parameters {}",
        schedule.nb_of_vehicle_journeys(),
        params
    );
    let data = Data::new(
        schedule,
        params.search_params.clone(),
        &params.cache_params,
    );
    let shared_data = SharedData::new(data)?;
    Ok(shared_data)
}
