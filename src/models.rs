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

pub mod accessibility;
pub mod meta_vehicle_journey;
pub mod modelbuilder;
pub mod schedule;
pub mod stop_time;
pub mod vehicle_journey;

pub use accessibility::{AccessibilityParams, StopPointProperties, VehicleProperties};
pub use meta_vehicle_journey::MetaVehicleJourney;
pub use schedule::{
    Company, Dataset, JourneyPattern, JourneyPatternPoint, Line, Network, PhysicalMode, Route,
    Schedule, StopArea, StopPoint,
};
pub use stop_time::{StopTime, StopTimeFlags};
pub use vehicle_journey::{Frequency, VehicleJourney, VehicleJourneyKind};

use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RealTimeLevel {
    Base,
    Adapted,
    RealTime,
}

pub const NB_OF_REAL_TIME_LEVELS: usize = 3;

impl RealTimeLevel {
    pub fn all() -> [RealTimeLevel; NB_OF_REAL_TIME_LEVELS] {
        [
            RealTimeLevel::Base,
            RealTimeLevel::Adapted,
            RealTimeLevel::RealTime,
        ]
    }

    pub(crate) fn as_index(&self) -> usize {
        match self {
            RealTimeLevel::Base => 0,
            RealTimeLevel::Adapted => 1,
            RealTimeLevel::RealTime => 2,
        }
    }

    /// This level and all the levels above it.
    /// An update applied at `Adapted` must be visible at `RealTime` too.
    pub fn and_above(&self) -> impl Iterator<Item = RealTimeLevel> {
        let level = *self;
        RealTimeLevel::all()
            .into_iter()
            .filter(move |other| *other >= level)
    }
}

impl FromStr for RealTimeLevel {
    type Err = RealTimeLevelConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let level = match s {
            "base" => RealTimeLevel::Base,
            "adapted" => RealTimeLevel::Adapted,
            "real_time" | "realtime" => RealTimeLevel::RealTime,
            _ => {
                return Err(RealTimeLevelConfigError {
                    level_name: s.to_string(),
                })
            }
        };
        Ok(level)
    }
}

impl Display for RealTimeLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RealTimeLevel::Base => write!(f, "base"),
            RealTimeLevel::Adapted => write!(f, "adapted"),
            RealTimeLevel::RealTime => write!(f, "real_time"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Bad real time level given : `{level_name}`")]
pub struct RealTimeLevelConfigError {
    level_name: String,
}

/// Direction of a next stop time search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StopEvent {
    /// we want to board : departures, searched on boarding times
    PickUp,
    /// we want to debark : arrivals, searched on alighting times
    DropOff,
}

macro_rules! typed_idx {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name {
            pub(crate) idx: usize,
        }

        impl $name {
            pub fn idx(&self) -> usize {
                self.idx
            }
        }
    };
}

typed_idx!(NetworkIdx);
typed_idx!(LineIdx);
typed_idx!(RouteIdx);
typed_idx!(JourneyPatternIdx);
typed_idx!(JourneyPatternPointIdx);
typed_idx!(StopAreaIdx);
typed_idx!(StopPointIdx);
typed_idx!(VehicleJourneyIdx);
typed_idx!(MetaVehicleJourneyIdx);
typed_idx!(CompanyIdx);
typed_idx!(PhysicalModeIdx);
typed_idx!(DatasetIdx);

/// A stop time is identified by its vehicle journey
/// and its rank in the stop times of this vehicle journey
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StopTimeIdx {
    pub vehicle_journey: VehicleJourneyIdx,
    pub order: u16,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn real_time_levels_above() {
        let levels: Vec<_> = RealTimeLevel::Adapted.and_above().collect();
        assert_eq!(levels, vec![RealTimeLevel::Adapted, RealTimeLevel::RealTime]);
        assert_eq!(RealTimeLevel::Base.and_above().count(), 3);
    }

    #[test]
    fn parse_real_time_level() {
        assert_eq!("adapted".parse::<RealTimeLevel>().unwrap(), RealTimeLevel::Adapted);
        assert_eq!(
            RealTimeLevel::RealTime.to_string().parse::<RealTimeLevel>().unwrap(),
            RealTimeLevel::RealTime
        );
        assert!("theoric".parse::<RealTimeLevel>().is_err());
    }
}
