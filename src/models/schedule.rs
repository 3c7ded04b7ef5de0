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
    CompanyIdx, DatasetIdx, JourneyPatternIdx, JourneyPatternPointIdx, LineIdx,
    MetaVehicleJourney, MetaVehicleJourneyIdx, NetworkIdx, PhysicalModeIdx, RealTimeLevel,
    RouteIdx, StopAreaIdx, StopPointIdx, StopPointProperties, StopTime, StopTimeFlags,
    StopTimeIdx, VehicleJourney, VehicleJourneyIdx, VehicleJourneyKind, VehicleProperties,
    NB_OF_REAL_TIME_LEVELS,
};
use crate::disruption::Impact;
use crate::time::{
    Calendar, DaysSinceDatasetStart, SecondsSinceDayStart, ValidityPattern, ValidityPatternIdx,
    ValidityPatterns,
};
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct Network {
    pub uri: String,
    pub name: String,
    pub lines: Vec<LineIdx>,
    pub(crate) impacts: Vec<Weak<Impact>>,
}

#[derive(Debug, Clone)]
pub struct Line {
    pub uri: String,
    pub name: String,
    pub network: NetworkIdx,
    pub routes: Vec<RouteIdx>,
    pub(crate) impacts: Vec<Weak<Impact>>,
}

#[derive(Debug, Clone)]
pub struct Route {
    pub uri: String,
    pub name: String,
    pub line: LineIdx,
    pub journey_patterns: Vec<JourneyPatternIdx>,
    pub(crate) impacts: Vec<Weak<Impact>>,
}

#[derive(Debug, Clone)]
pub struct StopArea {
    pub uri: String,
    pub name: String,
    pub stop_points: Vec<StopPointIdx>,
    pub(crate) impacts: Vec<Weak<Impact>>,
}

#[derive(Debug, Clone)]
pub struct StopPoint {
    pub uri: String,
    pub name: String,
    pub stop_area: StopAreaIdx,
    pub properties: StopPointProperties,
    pub journey_pattern_points: Vec<JourneyPatternPointIdx>,
    pub(crate) impacts: Vec<Weak<Impact>>,
}

/// All the vehicle journeys of a route that visit the same
/// sequence of stop points.
#[derive(Debug, Clone)]
pub struct JourneyPattern {
    pub uri: String,
    pub route: RouteIdx,
    pub journey_pattern_points: Vec<JourneyPatternPointIdx>,
    pub discrete_vehicle_journeys: Vec<VehicleJourneyIdx>,
    pub frequency_vehicle_journeys: Vec<VehicleJourneyIdx>,
}

#[derive(Debug, Clone)]
pub struct JourneyPatternPoint {
    pub journey_pattern: JourneyPatternIdx,
    pub stop_point: StopPointIdx,
    // rank of the stop point in the journey pattern, which is also the rank
    // of the stop time in each vehicle journey of the pattern
    pub order: u16,
}

#[derive(Debug, Clone)]
pub struct Company {
    pub uri: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct PhysicalMode {
    pub uri: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct Dataset {
    pub uri: String,
}

/// Everything needed to create a vehicle journey in a `Schedule`
#[derive(Debug, Clone)]
pub(crate) struct NewVehicleJourney {
    pub uri: String,
    pub meta_vehicle_journey: MetaVehicleJourneyIdx,
    pub route: RouteIdx,
    pub realtime_level: RealTimeLevel,
    pub validity_patterns: [ValidityPatternIdx; NB_OF_REAL_TIME_LEVELS],
    pub stop_times: Vec<NewStopTime>,
    pub kind: VehicleJourneyKind,
    pub shift: u16,
    pub theoretical_vehicle_journey: Option<VehicleJourneyIdx>,
    pub company: CompanyIdx,
    pub physical_mode: PhysicalModeIdx,
    pub dataset: DatasetIdx,
    pub headsign: String,
    pub properties: VehicleProperties,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct NewStopTime {
    pub stop_point: StopPointIdx,
    pub arrival_time: SecondsSinceDayStart,
    pub departure_time: SecondsSinceDayStart,
    pub boarding_duration: u32,
    pub alighting_duration: u32,
    pub flags: StopTimeFlags,
}

impl From<&StopTime> for NewStopTime {
    fn from(stop_time: &StopTime) -> Self {
        Self {
            stop_point: stop_time.stop_point,
            arrival_time: stop_time.arrival_time,
            departure_time: stop_time.departure_time,
            boarding_duration: stop_time.boarding_duration(),
            alighting_duration: stop_time.alighting_duration(),
            flags: stop_time.flags,
        }
    }
}

/// The whole timetable, stored in arenas indexed by typed indices.
///
/// Vehicle journeys are never moved : a removed vehicle journey leaves
/// an empty slot, so that a `VehicleJourneyIdx` keeps designating
/// the same vehicle journey (or nothing) during the lifetime of the schedule.
#[derive(Debug, Clone)]
pub struct Schedule {
    pub(crate) calendar: Calendar,
    pub(crate) validity_patterns: ValidityPatterns,

    pub(crate) networks: Vec<Network>,
    pub(crate) lines: Vec<Line>,
    pub(crate) routes: Vec<Route>,
    pub(crate) stop_areas: Vec<StopArea>,
    pub(crate) stop_points: Vec<StopPoint>,
    pub(crate) journey_patterns: Vec<JourneyPattern>,
    pub(crate) journey_pattern_points: Vec<JourneyPatternPoint>,
    pub(crate) vehicle_journeys: Vec<Option<VehicleJourney>>,
    // empty slots of `vehicle_journeys`, reused before growing it
    free_vehicle_journey_slots: Vec<VehicleJourneyIdx>,
    nb_of_created_vehicle_journeys: usize,
    pub(crate) meta_vehicle_journeys: Vec<MetaVehicleJourney>,
    pub(crate) companies: Vec<Company>,
    pub(crate) physical_modes: Vec<PhysicalMode>,
    pub(crate) datasets: Vec<Dataset>,

    network_uris: HashMap<String, NetworkIdx>,
    line_uris: HashMap<String, LineIdx>,
    route_uris: HashMap<String, RouteIdx>,
    stop_area_uris: HashMap<String, StopAreaIdx>,
    stop_point_uris: HashMap<String, StopPointIdx>,
    vehicle_journey_uris: HashMap<String, VehicleJourneyIdx>,
    meta_vehicle_journey_uris: HashMap<String, MetaVehicleJourneyIdx>,
    company_uris: HashMap<String, CompanyIdx>,
    physical_mode_uris: HashMap<String, PhysicalModeIdx>,
    dataset_uris: HashMap<String, DatasetIdx>,

    journey_pattern_by_stops: HashMap<(RouteIdx, Vec<StopPointIdx>), JourneyPatternIdx>,
}

impl Schedule {
    pub fn new(calendar: Calendar) -> Self {
        let validity_patterns = ValidityPatterns::new(&calendar);
        Self {
            calendar,
            validity_patterns,
            networks: Vec::new(),
            lines: Vec::new(),
            routes: Vec::new(),
            stop_areas: Vec::new(),
            stop_points: Vec::new(),
            journey_patterns: Vec::new(),
            journey_pattern_points: Vec::new(),
            vehicle_journeys: Vec::new(),
            free_vehicle_journey_slots: Vec::new(),
            nb_of_created_vehicle_journeys: 0,
            meta_vehicle_journeys: Vec::new(),
            companies: Vec::new(),
            physical_modes: Vec::new(),
            datasets: Vec::new(),
            network_uris: HashMap::new(),
            line_uris: HashMap::new(),
            route_uris: HashMap::new(),
            stop_area_uris: HashMap::new(),
            stop_point_uris: HashMap::new(),
            vehicle_journey_uris: HashMap::new(),
            meta_vehicle_journey_uris: HashMap::new(),
            company_uris: HashMap::new(),
            physical_mode_uris: HashMap::new(),
            dataset_uris: HashMap::new(),
            journey_pattern_by_stops: HashMap::new(),
        }
    }

    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    pub fn validity_patterns(&self) -> &ValidityPatterns {
        &self.validity_patterns
    }

    pub fn validity_pattern(
        &self,
        vehicle_journey: &VehicleJourney,
        level: RealTimeLevel,
    ) -> &ValidityPattern {
        self.validity_patterns
            .get(&vehicle_journey.validity_pattern_idx(level))
    }

    /// Does the vehicle journey run on `day` when looking at `level` ?
    /// Always false for a removed vehicle journey.
    pub fn is_valid_on(
        &self,
        vehicle_journey_idx: VehicleJourneyIdx,
        level: RealTimeLevel,
        day: &DaysSinceDatasetStart,
    ) -> bool {
        self.vehicle_journey(vehicle_journey_idx)
            .map(|vj| self.validity_pattern(vj, level).check(day))
            .unwrap_or(false)
    }

    pub fn vehicle_journey(&self, idx: VehicleJourneyIdx) -> Option<&VehicleJourney> {
        self.vehicle_journeys.get(idx.idx).and_then(Option::as_ref)
    }

    pub(crate) fn vehicle_journey_mut(
        &mut self,
        idx: VehicleJourneyIdx,
    ) -> Option<&mut VehicleJourney> {
        self.vehicle_journeys.get_mut(idx.idx).and_then(Option::as_mut)
    }

    /// All vehicle journeys still present
    pub fn vehicle_journeys(&self) -> impl Iterator<Item = (VehicleJourneyIdx, &VehicleJourney)> {
        self.vehicle_journeys
            .iter()
            .enumerate()
            .filter_map(|(idx, vj)| vj.as_ref().map(|vj| (VehicleJourneyIdx { idx }, vj)))
    }

    pub fn nb_of_vehicle_journeys(&self) -> usize {
        self.vehicle_journeys.iter().flatten().count()
    }

    /// Size of the vehicle journey arena, empty slots included
    pub fn nb_of_vehicle_journey_slots(&self) -> usize {
        self.vehicle_journeys.len()
    }

    /// Number of vehicle journeys added since the schedule was created,
    /// removed ones included
    pub fn nb_of_created_vehicle_journeys(&self) -> usize {
        self.nb_of_created_vehicle_journeys
    }

    pub fn stop_time(&self, idx: &StopTimeIdx) -> Option<&StopTime> {
        self.vehicle_journey(idx.vehicle_journey)
            .and_then(|vj| vj.stop_time(idx.order))
    }

    pub fn network(&self, idx: NetworkIdx) -> &Network {
        &self.networks[idx.idx]
    }

    pub fn line(&self, idx: LineIdx) -> &Line {
        &self.lines[idx.idx]
    }

    pub fn route(&self, idx: RouteIdx) -> &Route {
        &self.routes[idx.idx]
    }

    pub fn stop_area(&self, idx: StopAreaIdx) -> &StopArea {
        &self.stop_areas[idx.idx]
    }

    pub fn stop_point(&self, idx: StopPointIdx) -> &StopPoint {
        &self.stop_points[idx.idx]
    }

    pub fn get_stop_point(&self, idx: StopPointIdx) -> Option<&StopPoint> {
        self.stop_points.get(idx.idx)
    }

    pub fn journey_pattern(&self, idx: JourneyPatternIdx) -> &JourneyPattern {
        &self.journey_patterns[idx.idx]
    }

    pub fn journey_pattern_point(&self, idx: JourneyPatternPointIdx) -> &JourneyPatternPoint {
        &self.journey_pattern_points[idx.idx]
    }

    pub fn meta_vehicle_journey(&self, idx: MetaVehicleJourneyIdx) -> &MetaVehicleJourney {
        &self.meta_vehicle_journeys[idx.idx]
    }

    pub fn company(&self, idx: CompanyIdx) -> &Company {
        &self.companies[idx.idx]
    }

    pub fn physical_mode(&self, idx: PhysicalModeIdx) -> &PhysicalMode {
        &self.physical_modes[idx.idx]
    }

    pub fn dataset(&self, idx: DatasetIdx) -> &Dataset {
        &self.datasets[idx.idx]
    }

    pub fn nb_of_journey_pattern_points(&self) -> usize {
        self.journey_pattern_points.len()
    }

    pub fn journey_pattern_points(&self) -> impl Iterator<Item = JourneyPatternPointIdx> {
        (0..self.journey_pattern_points.len()).map(|idx| JourneyPatternPointIdx { idx })
    }

    pub fn meta_vehicle_journeys(
        &self,
    ) -> impl Iterator<Item = (MetaVehicleJourneyIdx, &MetaVehicleJourney)> {
        self.meta_vehicle_journeys
            .iter()
            .enumerate()
            .map(|(idx, mvj)| (MetaVehicleJourneyIdx { idx }, mvj))
    }

    pub fn network_idx(&self, uri: &str) -> Option<NetworkIdx> {
        self.network_uris.get(uri).copied()
    }

    pub fn line_idx(&self, uri: &str) -> Option<LineIdx> {
        self.line_uris.get(uri).copied()
    }

    pub fn route_idx(&self, uri: &str) -> Option<RouteIdx> {
        self.route_uris.get(uri).copied()
    }

    pub fn stop_area_idx(&self, uri: &str) -> Option<StopAreaIdx> {
        self.stop_area_uris.get(uri).copied()
    }

    pub fn stop_point_idx(&self, uri: &str) -> Option<StopPointIdx> {
        self.stop_point_uris.get(uri).copied()
    }

    pub fn vehicle_journey_idx(&self, uri: &str) -> Option<VehicleJourneyIdx> {
        self.vehicle_journey_uris.get(uri).copied()
    }

    pub fn meta_vehicle_journey_idx(&self, uri: &str) -> Option<MetaVehicleJourneyIdx> {
        self.meta_vehicle_journey_uris.get(uri).copied()
    }

    pub fn company_idx(&self, uri: &str) -> Option<CompanyIdx> {
        self.company_uris.get(uri).copied()
    }

    pub fn physical_mode_idx(&self, uri: &str) -> Option<PhysicalModeIdx> {
        self.physical_mode_uris.get(uri).copied()
    }

    pub fn dataset_idx(&self, uri: &str) -> Option<DatasetIdx> {
        self.dataset_uris.get(uri).copied()
    }

    /// The vehicle journey in which a passenger can stay after the end of `vehicle_journey_idx`
    pub fn stay_in_next(&self, vehicle_journey_idx: VehicleJourneyIdx) -> Option<VehicleJourneyIdx> {
        self.vehicle_journey(vehicle_journey_idx)
            .and_then(|vj| vj.next_vj)
    }

    pub fn stay_in_prev(&self, vehicle_journey_idx: VehicleJourneyIdx) -> Option<VehicleJourneyIdx> {
        self.vehicle_journey(vehicle_journey_idx)
            .and_then(|vj| vj.prev_vj)
    }

    pub(crate) fn add_network(&mut self, uri: &str, name: &str) -> NetworkIdx {
        if let Some(idx) = self.network_idx(uri) {
            return idx;
        }
        let idx = NetworkIdx {
            idx: self.networks.len(),
        };
        self.networks.push(Network {
            uri: uri.to_string(),
            name: name.to_string(),
            lines: Vec::new(),
            impacts: Vec::new(),
        });
        self.network_uris.insert(uri.to_string(), idx);
        idx
    }

    pub(crate) fn add_line(&mut self, uri: &str, name: &str, network: NetworkIdx) -> LineIdx {
        if let Some(idx) = self.line_idx(uri) {
            return idx;
        }
        let idx = LineIdx {
            idx: self.lines.len(),
        };
        self.lines.push(Line {
            uri: uri.to_string(),
            name: name.to_string(),
            network,
            routes: Vec::new(),
            impacts: Vec::new(),
        });
        self.networks[network.idx].lines.push(idx);
        self.line_uris.insert(uri.to_string(), idx);
        idx
    }

    pub(crate) fn add_route(&mut self, uri: &str, name: &str, line: LineIdx) -> RouteIdx {
        if let Some(idx) = self.route_idx(uri) {
            return idx;
        }
        let idx = RouteIdx {
            idx: self.routes.len(),
        };
        self.routes.push(Route {
            uri: uri.to_string(),
            name: name.to_string(),
            line,
            journey_patterns: Vec::new(),
            impacts: Vec::new(),
        });
        self.lines[line.idx].routes.push(idx);
        self.route_uris.insert(uri.to_string(), idx);
        idx
    }

    pub(crate) fn add_stop_area(&mut self, uri: &str, name: &str) -> StopAreaIdx {
        if let Some(idx) = self.stop_area_idx(uri) {
            return idx;
        }
        let idx = StopAreaIdx {
            idx: self.stop_areas.len(),
        };
        self.stop_areas.push(StopArea {
            uri: uri.to_string(),
            name: name.to_string(),
            stop_points: Vec::new(),
            impacts: Vec::new(),
        });
        self.stop_area_uris.insert(uri.to_string(), idx);
        idx
    }

    pub(crate) fn add_stop_point(
        &mut self,
        uri: &str,
        name: &str,
        stop_area: StopAreaIdx,
        properties: StopPointProperties,
    ) -> StopPointIdx {
        if let Some(idx) = self.stop_point_idx(uri) {
            return idx;
        }
        let idx = StopPointIdx {
            idx: self.stop_points.len(),
        };
        self.stop_points.push(StopPoint {
            uri: uri.to_string(),
            name: name.to_string(),
            stop_area,
            properties,
            journey_pattern_points: Vec::new(),
            impacts: Vec::new(),
        });
        self.stop_areas[stop_area.idx].stop_points.push(idx);
        self.stop_point_uris.insert(uri.to_string(), idx);
        idx
    }

    pub(crate) fn add_company(&mut self, uri: &str, name: &str) -> CompanyIdx {
        if let Some(idx) = self.company_idx(uri) {
            return idx;
        }
        let idx = CompanyIdx {
            idx: self.companies.len(),
        };
        self.companies.push(Company {
            uri: uri.to_string(),
            name: name.to_string(),
        });
        self.company_uris.insert(uri.to_string(), idx);
        idx
    }

    pub(crate) fn add_physical_mode(&mut self, uri: &str, name: &str) -> PhysicalModeIdx {
        if let Some(idx) = self.physical_mode_idx(uri) {
            return idx;
        }
        let idx = PhysicalModeIdx {
            idx: self.physical_modes.len(),
        };
        self.physical_modes.push(PhysicalMode {
            uri: uri.to_string(),
            name: name.to_string(),
        });
        self.physical_mode_uris.insert(uri.to_string(), idx);
        idx
    }

    pub(crate) fn add_dataset(&mut self, uri: &str) -> DatasetIdx {
        if let Some(idx) = self.dataset_idx(uri) {
            return idx;
        }
        let idx = DatasetIdx {
            idx: self.datasets.len(),
        };
        self.datasets.push(Dataset {
            uri: uri.to_string(),
        });
        self.dataset_uris.insert(uri.to_string(), idx);
        idx
    }

    pub(crate) fn add_meta_vehicle_journey(&mut self, uri: &str) -> MetaVehicleJourneyIdx {
        if let Some(idx) = self.meta_vehicle_journey_idx(uri) {
            return idx;
        }
        let idx = MetaVehicleJourneyIdx {
            idx: self.meta_vehicle_journeys.len(),
        };
        self.meta_vehicle_journeys
            .push(MetaVehicleJourney::new(uri.to_string()));
        self.meta_vehicle_journey_uris.insert(uri.to_string(), idx);
        idx
    }

    pub(crate) fn meta_vehicle_journey_mut(
        &mut self,
        idx: MetaVehicleJourneyIdx,
    ) -> &mut MetaVehicleJourney {
        &mut self.meta_vehicle_journeys[idx.idx]
    }

    pub(crate) fn insert_validity_pattern(&mut self, pattern: ValidityPattern) -> ValidityPatternIdx {
        self.validity_patterns.get_or_insert(pattern)
    }

    /// Repoint the validity pattern of `level` to `pattern`.
    /// The pattern previously used is left untouched, as readers may still hold it.
    pub(crate) fn set_validity_pattern(
        &mut self,
        vehicle_journey_idx: VehicleJourneyIdx,
        level: RealTimeLevel,
        pattern: ValidityPattern,
    ) {
        let pattern_idx = self.validity_patterns.get_or_insert(pattern);
        if let Some(vj) = self.vehicle_journey_mut(vehicle_journey_idx) {
            vj.validity_patterns[level.as_index()] = pattern_idx;
        }
    }

    fn get_or_create_journey_pattern(
        &mut self,
        route: RouteIdx,
        stop_points: Vec<StopPointIdx>,
    ) -> JourneyPatternIdx {
        let key = (route, stop_points);
        if let Some(idx) = self.journey_pattern_by_stops.get(&key) {
            return *idx;
        }
        let (route, stop_points) = key;
        let journey_pattern_idx = JourneyPatternIdx {
            idx: self.journey_patterns.len(),
        };
        let mut journey_pattern_points = Vec::with_capacity(stop_points.len());
        for (order, stop_point) in stop_points.iter().enumerate() {
            let jpp_idx = JourneyPatternPointIdx {
                idx: self.journey_pattern_points.len(),
            };
            self.journey_pattern_points.push(JourneyPatternPoint {
                journey_pattern: journey_pattern_idx,
                stop_point: *stop_point,
                order: order as u16,
            });
            self.stop_points[stop_point.idx]
                .journey_pattern_points
                .push(jpp_idx);
            journey_pattern_points.push(jpp_idx);
        }
        self.journey_patterns.push(JourneyPattern {
            uri: format!(
                "journey_pattern:{}:{}",
                self.routes[route.idx].uri, journey_pattern_idx.idx
            ),
            route,
            journey_pattern_points,
            discrete_vehicle_journeys: Vec::new(),
            frequency_vehicle_journeys: Vec::new(),
        });
        self.routes[route.idx]
            .journey_patterns
            .push(journey_pattern_idx);
        debug!(
            "Created journey pattern {}",
            self.journey_patterns[journey_pattern_idx.idx].uri
        );
        self.journey_pattern_by_stops
            .insert((route, stop_points), journey_pattern_idx);
        journey_pattern_idx
    }

    /// Add a vehicle journey, attaching it to the journey pattern
    /// of its route that visits the same stop points, which is created if needed.
    pub(crate) fn add_vehicle_journey(&mut self, new_vj: NewVehicleJourney) -> VehicleJourneyIdx {
        debug_assert!(!self.vehicle_journey_uris.contains_key(&new_vj.uri));
        let stop_points: Vec<StopPointIdx> = new_vj
            .stop_times
            .iter()
            .map(|stop_time| stop_time.stop_point)
            .collect();
        let journey_pattern_idx = self.get_or_create_journey_pattern(new_vj.route, stop_points);
        let journey_pattern = &self.journey_patterns[journey_pattern_idx.idx];
        let is_frequency = matches!(new_vj.kind, VehicleJourneyKind::Frequency(_));

        let stop_times = new_vj
            .stop_times
            .iter()
            .zip(journey_pattern.journey_pattern_points.iter())
            .map(|(stop_time, jpp_idx)| {
                let arrival = stop_time.arrival_time.seconds;
                let departure = stop_time.departure_time.seconds;
                StopTime {
                    stop_point: stop_time.stop_point,
                    journey_pattern_point: *jpp_idx,
                    arrival_time: stop_time.arrival_time,
                    departure_time: stop_time.departure_time,
                    alighting_time: SecondsSinceDayStart {
                        seconds: arrival + stop_time.alighting_duration,
                    },
                    boarding_time: SecondsSinceDayStart {
                        seconds: departure.saturating_sub(stop_time.boarding_duration),
                    },
                    flags: StopTimeFlags {
                        is_frequency,
                        ..stop_time.flags
                    },
                }
            })
            .collect();

        let vehicle_journey_idx = self
            .free_vehicle_journey_slots
            .pop()
            .unwrap_or(VehicleJourneyIdx {
                idx: self.vehicle_journeys.len(),
            });
        let vehicle_journey = VehicleJourney {
            uri: new_vj.uri,
            headsign: new_vj.headsign,
            meta_vehicle_journey: new_vj.meta_vehicle_journey,
            route: new_vj.route,
            journey_pattern: journey_pattern_idx,
            realtime_level: new_vj.realtime_level,
            validity_patterns: new_vj.validity_patterns,
            stop_times,
            kind: new_vj.kind,
            shift: new_vj.shift,
            prev_vj: None,
            next_vj: None,
            theoretical_vehicle_journey: new_vj.theoretical_vehicle_journey,
            company: new_vj.company,
            physical_mode: new_vj.physical_mode,
            dataset: new_vj.dataset,
            properties: new_vj.properties,
        };

        let journey_pattern = &mut self.journey_patterns[journey_pattern_idx.idx];
        if is_frequency {
            journey_pattern
                .frequency_vehicle_journeys
                .push(vehicle_journey_idx);
        } else {
            journey_pattern
                .discrete_vehicle_journeys
                .push(vehicle_journey_idx);
        }
        self.meta_vehicle_journeys[vehicle_journey.meta_vehicle_journey.idx]
            .push_vehicle_journey(vehicle_journey.realtime_level, vehicle_journey_idx);
        self.vehicle_journey_uris
            .insert(vehicle_journey.uri.clone(), vehicle_journey_idx);
        match self.vehicle_journeys.get_mut(vehicle_journey_idx.idx) {
            Some(slot) => *slot = Some(vehicle_journey),
            None => self.vehicle_journeys.push(Some(vehicle_journey)),
        }
        self.nb_of_created_vehicle_journeys += 1;
        vehicle_journey_idx
    }

    /// Remove a vehicle journey from every structure referencing it.
    /// Its slot stays empty until the next added vehicle journey takes it.
    pub(crate) fn remove_vehicle_journey(
        &mut self,
        vehicle_journey_idx: VehicleJourneyIdx,
    ) -> Option<VehicleJourney> {
        let vehicle_journey = self
            .vehicle_journeys
            .get_mut(vehicle_journey_idx.idx)
            .and_then(Option::take)?;

        let journey_pattern = &mut self.journey_patterns[vehicle_journey.journey_pattern.idx];
        journey_pattern
            .discrete_vehicle_journeys
            .retain(|idx| *idx != vehicle_journey_idx);
        journey_pattern
            .frequency_vehicle_journeys
            .retain(|idx| *idx != vehicle_journey_idx);
        self.meta_vehicle_journeys[vehicle_journey.meta_vehicle_journey.idx]
            .remove_vehicle_journey(vehicle_journey_idx);
        self.vehicle_journey_uris.remove(&vehicle_journey.uri);

        if let Some(prev) = vehicle_journey.prev_vj.and_then(|idx| self.vehicle_journey_mut(idx)) {
            prev.next_vj = None;
        }
        if let Some(next) = vehicle_journey.next_vj.and_then(|idx| self.vehicle_journey_mut(idx)) {
            next.prev_vj = None;
        }
        self.free_vehicle_journey_slots.push(vehicle_journey_idx);
        debug!("Removed vehicle journey {}", vehicle_journey.uri);
        Some(vehicle_journey)
    }

    pub(crate) fn link_stay_in(&mut self, prev: VehicleJourneyIdx, next: VehicleJourneyIdx) {
        if let Some(vj) = self.vehicle_journey_mut(prev) {
            vj.next_vj = Some(next);
        }
        if let Some(vj) = self.vehicle_journey_mut(next) {
            vj.prev_vj = Some(prev);
        }
    }

    pub(crate) fn network_mut(&mut self, idx: NetworkIdx) -> &mut Network {
        &mut self.networks[idx.idx]
    }

    pub(crate) fn line_mut(&mut self, idx: LineIdx) -> &mut Line {
        &mut self.lines[idx.idx]
    }

    pub(crate) fn route_mut(&mut self, idx: RouteIdx) -> &mut Route {
        &mut self.routes[idx.idx]
    }

    pub(crate) fn stop_area_mut(&mut self, idx: StopAreaIdx) -> &mut StopArea {
        &mut self.stop_areas[idx.idx]
    }

    pub(crate) fn stop_point_mut(&mut self, idx: StopPointIdx) -> &mut StopPoint {
        &mut self.stop_points[idx.idx]
    }

    /// Forget, on every object, the impacts that have been deleted
    pub(crate) fn clean_weak_impacts(&mut self) {
        fn clean(impacts: &mut Vec<Weak<Impact>>) {
            impacts.retain(|impact| impact.strong_count() > 0);
        }
        self.networks.iter_mut().for_each(|n| clean(&mut n.impacts));
        self.lines.iter_mut().for_each(|l| clean(&mut l.impacts));
        self.routes.iter_mut().for_each(|r| clean(&mut r.impacts));
        self.stop_areas.iter_mut().for_each(|sa| clean(&mut sa.impacts));
        self.stop_points.iter_mut().for_each(|sp| clean(&mut sp.impacts));
        self.meta_vehicle_journeys
            .iter_mut()
            .for_each(MetaVehicleJourney::clean_weak_impacts);
    }
}

macro_rules! live_impacts {
    ($name:ident) => {
        impl $name {
            /// Impacts still alive that inform about this object
            pub fn impacts(&self) -> Vec<Arc<Impact>> {
                self.impacts.iter().filter_map(Weak::upgrade).collect()
            }
        }
    };
}

live_impacts!(Network);
live_impacts!(Line);
live_impacts!(Route);
live_impacts!(StopArea);
live_impacts!(StopPoint);
