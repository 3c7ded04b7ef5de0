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

use super::{
    CompanyIdx, DatasetIdx, JourneyPatternIdx, MetaVehicleJourneyIdx, PhysicalModeIdx,
    RealTimeLevel, RouteIdx, StopTime, VehicleJourneyIdx, VehicleProperties,
    NB_OF_REAL_TIME_LEVELS,
};
use crate::time::{SecondsSinceDayStart, ValidityPatternIdx, SECONDS_PER_DAY};

/// A repeating service window : a run leaves the first stop
/// at `start_time + k * headway_secs` for every `k` such that
/// this time is not after `end_time`.
/// When `end_time < start_time` the window ends the day after it starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frequency {
    pub(crate) start_time: SecondsSinceDayStart,
    pub(crate) end_time: SecondsSinceDayStart,
    pub(crate) headway_secs: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VehicleJourneyKind {
    /// stop times are the actual times of the trip
    Discrete,
    /// stop times are a template, relative to the start of each run
    Frequency(Frequency),
}

#[derive(Debug, Clone)]
pub struct VehicleJourney {
    pub(crate) uri: String,
    pub(crate) headsign: String,
    pub(crate) meta_vehicle_journey: MetaVehicleJourneyIdx,
    pub(crate) route: RouteIdx,
    pub(crate) journey_pattern: JourneyPatternIdx,
    // the level this vehicle journey was created for
    pub(crate) realtime_level: RealTimeLevel,
    // the days this vehicle journey runs when looking at each level
    // indexed by RealTimeLevel::as_index()
    pub(crate) validity_patterns: [ValidityPatternIdx; NB_OF_REAL_TIME_LEVELS],
    pub(crate) stop_times: Vec<StopTime>,
    pub(crate) kind: VehicleJourneyKind,
    // number of days between the days of the theoretical vehicle journey
    // and the days of this one
    pub(crate) shift: u16,
    pub(crate) prev_vj: Option<VehicleJourneyIdx>,
    pub(crate) next_vj: Option<VehicleJourneyIdx>,
    // None for Base vehicle journeys
    pub(crate) theoretical_vehicle_journey: Option<VehicleJourneyIdx>,
    pub(crate) company: CompanyIdx,
    pub(crate) physical_mode: PhysicalModeIdx,
    pub(crate) dataset: DatasetIdx,
    pub(crate) properties: VehicleProperties,
}

impl VehicleJourney {
    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn headsign(&self) -> &str {
        &self.headsign
    }

    pub fn meta_vehicle_journey(&self) -> MetaVehicleJourneyIdx {
        self.meta_vehicle_journey
    }

    pub fn route(&self) -> RouteIdx {
        self.route
    }

    pub fn journey_pattern(&self) -> JourneyPatternIdx {
        self.journey_pattern
    }

    pub fn realtime_level(&self) -> RealTimeLevel {
        self.realtime_level
    }

    pub fn validity_pattern_idx(&self, level: RealTimeLevel) -> ValidityPatternIdx {
        self.validity_patterns[level.as_index()]
    }

    pub fn stop_times(&self) -> &[StopTime] {
        &self.stop_times
    }

    pub fn stop_time(&self, order: u16) -> Option<&StopTime> {
        self.stop_times.get(usize::from(order))
    }

    pub fn kind(&self) -> &VehicleJourneyKind {
        &self.kind
    }

    pub fn frequency(&self) -> Option<&Frequency> {
        match &self.kind {
            VehicleJourneyKind::Frequency(frequency) => Some(frequency),
            VehicleJourneyKind::Discrete => None,
        }
    }

    pub fn is_frequency(&self) -> bool {
        self.frequency().is_some()
    }

    pub fn shift(&self) -> u16 {
        self.shift
    }

    pub fn prev_vj(&self) -> Option<VehicleJourneyIdx> {
        self.prev_vj
    }

    pub fn next_vj(&self) -> Option<VehicleJourneyIdx> {
        self.next_vj
    }

    pub fn theoretical_vehicle_journey(&self) -> Option<VehicleJourneyIdx> {
        self.theoretical_vehicle_journey
    }

    pub fn company(&self) -> CompanyIdx {
        self.company
    }

    pub fn physical_mode(&self) -> PhysicalModeIdx {
        self.physical_mode
    }

    pub fn dataset(&self) -> DatasetIdx {
        self.dataset
    }

    pub fn properties(&self) -> &VehicleProperties {
        &self.properties
    }

    pub fn accessible(&self, required: &VehicleProperties) -> bool {
        self.properties.contains(required)
    }

    /// Earliest time of the vehicle journey, relatively to the start
    /// of its circulation day.
    /// Used to order vehicles departing at the same time from a stop.
    pub fn earliest_time(&self) -> u32 {
        let first_stop_time = self
            .stop_times
            .iter()
            .map(|stop_time| stop_time.earliest_time().seconds)
            .min()
            .unwrap_or(0);
        match &self.kind {
            VehicleJourneyKind::Discrete => first_stop_time,
            VehicleJourneyKind::Frequency(frequency) => {
                frequency.start_time.seconds + first_stop_time
            }
        }
    }

    /// Number of days between the circulation day and the last day
    /// on which one of the stop times happens
    pub fn reach_days(&self) -> u16 {
        let latest_offset = self
            .stop_times
            .iter()
            .map(|stop_time| {
                std::cmp::max(stop_time.alighting_time, stop_time.departure_time).seconds
            })
            .max()
            .unwrap_or(0);
        match &self.kind {
            VehicleJourneyKind::Discrete => (latest_offset / SECONDS_PER_DAY) as u16,
            VehicleJourneyKind::Frequency(frequency) => frequency.reach_days(latest_offset),
        }
    }

    /// Seconds, relatively to the start of a circulation day, between which
    /// this vehicle journey is running on that day
    pub fn execution_bounds(&self) -> (u32, u32) {
        let first = self
            .stop_times
            .first()
            .map(|stop_time| stop_time.earliest_time().seconds)
            .unwrap_or(0);
        let last = self
            .stop_times
            .iter()
            .map(|stop_time| stop_time.latest_time().seconds)
            .max()
            .unwrap_or(first);
        match &self.kind {
            VehicleJourneyKind::Discrete => (first, last),
            VehicleJourneyKind::Frequency(frequency) => (
                frequency.start_time.seconds + first,
                frequency.start_time.seconds + frequency.last_run_offset() + last,
            ),
        }
    }
}
