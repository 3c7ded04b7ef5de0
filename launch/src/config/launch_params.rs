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

use super::parse_env_var;
use anyhow::bail;
use rt_schedule::config::{
    default_backward_horizon_days, default_cache_size, default_forward_horizon_days,
    CacheParams, SearchParams,
};
use serde::{Deserialize, Serialize};

pub const CACHE_SIZE_VAR: &str = "RT_SCHEDULE_CACHE_SIZE";
pub const FORWARD_HORIZON_DAYS_VAR: &str = "RT_SCHEDULE_FORWARD_HORIZON_DAYS";
pub const BACKWARD_HORIZON_DAYS_VAR: &str = "RT_SCHEDULE_BACKWARD_HORIZON_DAYS";

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LaunchParams {
    #[serde(default)]
    pub cache_params: CacheParams,

    #[serde(default)]
    pub search_params: SearchParams,
}

impl LaunchParams {
    pub fn new_from_env_vars() -> Self {
        let cache_size = parse_env_var(CACHE_SIZE_VAR, default_cache_size(), str::parse::<u64>);
        let forward_horizon_days = parse_env_var(
            FORWARD_HORIZON_DAYS_VAR,
            default_forward_horizon_days(),
            str::parse::<u16>,
        );
        let backward_horizon_days = parse_env_var(
            BACKWARD_HORIZON_DAYS_VAR,
            default_backward_horizon_days(),
            str::parse::<u16>,
        );
        Self {
            cache_params: CacheParams { cache_size },
            search_params: SearchParams {
                forward_horizon_days,
                backward_horizon_days,
            },
        }
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.cache_params.cache_size == 0 {
            bail!("cache_size must be positive");
        }
        Ok(())
    }
}

impl std::fmt::Display for LaunchParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.cache_params, self.search_params)
    }
}
