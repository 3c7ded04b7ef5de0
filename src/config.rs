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

use serde::{Deserialize, Serialize};
use std::fmt::Display;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CacheParams {
    /// maximum number of (day, real time level, accessibility) entries
    /// kept by the next stop time cache
    #[serde(default = "default_cache_size")]
    pub cache_size: u64,
}

pub const DEFAULT_CACHE_SIZE: u64 = 10;

pub fn default_cache_size() -> u64 {
    DEFAULT_CACHE_SIZE
}

impl Default for CacheParams {
    fn default() -> Self {
        Self {
            cache_size: default_cache_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SearchParams {
    /// when no bound is given, a search for the next stop time
    /// stops at the end of the day `forward_horizon_days` after the requested one
    #[serde(default = "default_forward_horizon_days")]
    pub forward_horizon_days: u16,

    /// when no bound is given, a search for the previous stop time
    /// stops at the start of the day `backward_horizon_days` before the requested one
    #[serde(default = "default_backward_horizon_days")]
    pub backward_horizon_days: u16,
}

pub const DEFAULT_FORWARD_HORIZON_DAYS: u16 = 1;
pub const DEFAULT_BACKWARD_HORIZON_DAYS: u16 = 1;

pub fn default_forward_horizon_days() -> u16 {
    DEFAULT_FORWARD_HORIZON_DAYS
}

pub fn default_backward_horizon_days() -> u16 {
    DEFAULT_BACKWARD_HORIZON_DAYS
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            forward_horizon_days: default_forward_horizon_days(),
            backward_horizon_days: default_backward_horizon_days(),
        }
    }
}

impl Display for CacheParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "--cache_size {}", self.cache_size)
    }
}

impl Display for SearchParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "--forward_horizon_days {} --backward_horizon_days {}",
            self.forward_horizon_days, self.backward_horizon_days
        )
    }
}
