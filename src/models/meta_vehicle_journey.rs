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

use super::{RealTimeLevel, VehicleJourneyIdx, NB_OF_REAL_TIME_LEVELS};
use crate::disruption::Impact;
use std::sync::{Arc, Weak};

/// All the variants of one theoretical service.
#[derive(Debug, Clone)]
pub struct MetaVehicleJourney {
    pub(crate) uri: String,
    // indexed by RealTimeLevel::as_index()
    pub(crate) vehicle_journeys: [Vec<VehicleJourneyIdx>; NB_OF_REAL_TIME_LEVELS],
    // impacts currently applied to this service
    pub(crate) modified_by: Vec<Weak<Impact>>,
    // impacts that only mention this service
    pub(crate) impacted_by: Vec<Weak<Impact>>,
}

impl MetaVehicleJourney {
    pub(crate) fn new(uri: String) -> Self {
        Self {
            uri,
            vehicle_journeys: Default::default(),
            modified_by: Vec::new(),
            impacted_by: Vec::new(),
        }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn vehicle_journeys(&self, level: RealTimeLevel) -> &[VehicleJourneyIdx] {
        &self.vehicle_journeys[level.as_index()]
    }

    /// The base vehicle journey, if this service exists in the base schedule.
    /// Additional services have none.
    pub fn base_vehicle_journey(&self) -> Option<VehicleJourneyIdx> {
        self.vehicle_journeys[RealTimeLevel::Base.as_index()]
            .first()
            .copied()
    }

    /// Impacts still alive that modify this service
    pub fn modified_by(&self) -> Vec<Arc<Impact>> {
        self.modified_by.iter().filter_map(Weak::upgrade).collect()
    }

    pub fn impacted_by(&self) -> Vec<Arc<Impact>> {
        self.impacted_by.iter().filter_map(Weak::upgrade).collect()
    }

    pub(crate) fn push_vehicle_journey(&mut self, level: RealTimeLevel, vj: VehicleJourneyIdx) {
        self.vehicle_journeys[level.as_index()].push(vj);
    }

    pub(crate) fn remove_vehicle_journey(&mut self, vj: VehicleJourneyIdx) {
        for vjs in self.vehicle_journeys.iter_mut() {
            vjs.retain(|other| *other != vj);
        }
    }

    /// Forget the impacts that have been deleted
    pub(crate) fn clean_weak_impacts(&mut self) {
        self.modified_by.retain(|impact| impact.strong_count() > 0);
        self.impacted_by.retain(|impact| impact.strong_count() > 0);
    }
}
