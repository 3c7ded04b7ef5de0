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

use super::{JourneyPatternPointIdx, StopEvent, StopPointIdx};
use crate::time::SecondsSinceDayStart;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct StopTimeFlags {
    pub pick_up_allowed: bool,
    pub drop_off_allowed: bool,
    pub skipped_stop: bool,
    // times are relative to the start of a frequency run
    pub is_frequency: bool,
    pub date_time_estimated: bool,
}

impl StopTimeFlags {
    pub fn pick_up_and_drop_off() -> Self {
        Self {
            pick_up_allowed: true,
            drop_off_allowed: true,
            ..Default::default()
        }
    }
}

/// A stop time belongs to the vehicle journey that stores it,
/// at the rank where it is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopTime {
    pub(crate) stop_point: StopPointIdx,
    pub(crate) journey_pattern_point: JourneyPatternPointIdx,
    pub(crate) arrival_time: SecondsSinceDayStart,
    pub(crate) departure_time: SecondsSinceDayStart,
    // arrival_time + time needed to get off the vehicle
    pub(crate) alighting_time: SecondsSinceDayStart,
    // departure_time - time needed to get on the vehicle
    pub(crate) boarding_time: SecondsSinceDayStart,
    pub(crate) flags: StopTimeFlags,
}

impl StopTime {
    pub fn stop_point(&self) -> StopPointIdx {
        self.stop_point
    }

    pub fn journey_pattern_point(&self) -> JourneyPatternPointIdx {
        self.journey_pattern_point
    }

    pub fn arrival_time(&self) -> SecondsSinceDayStart {
        self.arrival_time
    }

    pub fn departure_time(&self) -> SecondsSinceDayStart {
        self.departure_time
    }

    pub fn boarding_time(&self) -> SecondsSinceDayStart {
        self.boarding_time
    }

    pub fn alighting_time(&self) -> SecondsSinceDayStart {
        self.alighting_time
    }

    pub fn flags(&self) -> &StopTimeFlags {
        &self.flags
    }

    pub fn pick_up_allowed(&self) -> bool {
        self.flags.pick_up_allowed && !self.flags.skipped_stop
    }

    pub fn drop_off_allowed(&self) -> bool {
        self.flags.drop_off_allowed && !self.flags.skipped_stop
    }

    pub fn allows(&self, stop_event: StopEvent) -> bool {
        match stop_event {
            StopEvent::PickUp => self.pick_up_allowed(),
            StopEvent::DropOff => self.drop_off_allowed(),
        }
    }

    /// The time searched when looking for this stop event
    pub fn time_of(&self, stop_event: StopEvent) -> SecondsSinceDayStart {
        match stop_event {
            StopEvent::PickUp => self.boarding_time,
            StopEvent::DropOff => self.alighting_time,
        }
    }

    pub(crate) fn boarding_duration(&self) -> u32 {
        self.departure_time
            .seconds
            .saturating_sub(self.boarding_time.seconds)
    }

    pub(crate) fn alighting_duration(&self) -> u32 {
        self.alighting_time
            .seconds
            .saturating_sub(self.arrival_time.seconds)
    }

    pub(crate) fn earliest_time(&self) -> SecondsSinceDayStart {
        std::cmp::min(self.arrival_time, self.departure_time)
    }

    pub(crate) fn latest_time(&self) -> SecondsSinceDayStart {
        std::cmp::max(self.arrival_time, self.departure_time)
    }
}
