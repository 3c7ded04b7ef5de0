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

//! Closure based construction of a `Schedule`, used in place of
//! the import pipeline by tests and small tools.

use super::{
    schedule::{NewStopTime, NewVehicleJourney},
    Frequency, RealTimeLevel, Schedule, StopPointProperties, StopTimeFlags, VehicleJourneyIdx,
    VehicleJourneyKind, VehicleProperties,
};
use crate::time::{Calendar, DateIter, SecondsSinceDayStart, ValidityPattern};
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::{BTreeMap, HashMap};

const DEFAULT_CALENDAR_ID: &str = "default_service";
const DEFAULT_ROUTE_ID: &str = "default_route";
const DEFAULT_LINE_ID: &str = "default_line";
const DEFAULT_NETWORK_ID: &str = "default_network";
pub const DEFAULT_COMPANY_ID: &str = "default_company";
pub const DEFAULT_PHYSICAL_MODE_ID: &str = "default_physical_mode";
pub const DEFAULT_DATASET_ID: &str = "default_dataset";

/// Builder used to easily create a `Schedule`
/// Note: if not explicitly set all the vehicle journeys
/// run on every day of the production period
pub struct ScheduleBuilder {
    calendar: Calendar,
    calendars: HashMap<String, Vec<NaiveDate>>,
    lines: BTreeMap<String, LineInfo>,
    routes: BTreeMap<String, RouteInfo>,
    stop_points: BTreeMap<String, StopPointInfo>,
    vehicle_journeys: Vec<VehicleJourneyInfo>,
}

#[derive(Debug, Clone)]
pub struct LineInfo {
    pub name: String,
    pub network: String,
}

#[derive(Debug, Clone)]
pub struct RouteInfo {
    pub name: String,
    pub line: String,
}

#[derive(Debug, Clone)]
pub struct StopPointInfo {
    pub name: String,
    pub stop_area: String,
    pub properties: StopPointProperties,
}

#[derive(Debug, Clone)]
pub struct StopTimeInfo {
    pub stop_point: String,
    pub arrival_time: SecondsSinceDayStart,
    pub departure_time: SecondsSinceDayStart,
    pub boarding_duration: u32,
    pub alighting_duration: u32,
    pub pick_up_allowed: bool,
    pub drop_off_allowed: bool,
    pub date_time_estimated: bool,
}

struct VehicleJourneyInfo {
    uri: String,
    calendar: String,
    route: String,
    stop_times: Vec<StopTimeInfo>,
    frequency: Option<Frequency>,
    block_id: Option<String>,
    company: String,
    physical_mode: String,
    dataset: String,
    headsign: String,
    properties: VehicleProperties,
}

/// Builder used to create and modify a new VehicleJourney
pub struct VehicleJourneyBuilder<'a> {
    model: &'a mut ScheduleBuilder,
    vj_idx: usize,
}

impl Default for ScheduleBuilder {
    fn default() -> Self {
        let date = "2020-01-01";
        Self::new(date, date)
    }
}

impl ScheduleBuilder {
    pub fn new(start_validity_period: impl AsDate, end_validity_period: impl AsDate) -> Self {
        let start_date = start_validity_period.as_date();
        let end_date = end_validity_period.as_date();
        assert!(start_date <= end_date);
        let dates: Vec<_> = DateIter::new(start_date, end_date).collect();
        let mut calendars = HashMap::new();
        calendars.insert(DEFAULT_CALENDAR_ID.to_string(), dates);
        Self {
            calendar: Calendar::new(start_date, end_date),
            calendars,
            lines: BTreeMap::new(),
            routes: BTreeMap::new(),
            stop_points: BTreeMap::new(),
            vehicle_journeys: Vec::new(),
        }
    }

    /// Add a new vehicle journey to the schedule
    ///
    /// ```
    /// # use rt_schedule::modelbuilder::ScheduleBuilder;
    ///
    /// # fn main() {
    /// let schedule = ScheduleBuilder::default()
    ///        .vj("toto", |vj_builder| {
    ///            vj_builder
    ///                .st("A", "10:00:00")
    ///                .st("B", "11:00:00");
    ///        })
    ///        .vj("tata", |vj_builder| {
    ///            vj_builder
    ///                .st("C", "08:00:00")
    ///                .st("B", "09:00:00");
    ///        })
    ///        .build();
    /// # }
    /// ```
    pub fn vj<F>(mut self, name: &str, mut vj_initer: F) -> Self
    where
        F: FnMut(VehicleJourneyBuilder),
    {
        assert!(
            self.vehicle_journeys.iter().all(|vj| vj.uri != name),
            "vj {} already exists",
            name
        );
        self.vehicle_journeys.push(VehicleJourneyInfo {
            uri: name.to_string(),
            calendar: DEFAULT_CALENDAR_ID.to_string(),
            route: DEFAULT_ROUTE_ID.to_string(),
            stop_times: Vec::new(),
            frequency: None,
            block_id: None,
            company: DEFAULT_COMPANY_ID.to_string(),
            physical_mode: DEFAULT_PHYSICAL_MODE_ID.to_string(),
            dataset: DEFAULT_DATASET_ID.to_string(),
            headsign: name.to_string(),
            properties: VehicleProperties::none(),
        });
        let vj_idx = self.vehicle_journeys.len() - 1;
        let vj_builder = VehicleJourneyBuilder {
            model: &mut self,
            vj_idx,
        };
        vj_initer(vj_builder);
        self
    }

    /// Add a vehicle journey running every `headway_secs` seconds
    /// between `start_time` and `end_time`.
    /// Its stop times are relative to the start of each run.
    ///
    /// ```
    /// # use rt_schedule::modelbuilder::ScheduleBuilder;
    ///
    /// # fn main() {
    /// let schedule = ScheduleBuilder::default()
    ///        .frequency_vj("bus", "08:00:00", "09:00:00", 600, |vj_builder| {
    ///            vj_builder
    ///                .st("A", "00:00:00")
    ///                .st("B", "00:05:00");
    ///        })
    ///        .build();
    /// # }
    /// ```
    pub fn frequency_vj<F>(
        self,
        name: &str,
        start_time: impl IntoTime,
        end_time: impl IntoTime,
        headway_secs: u32,
        vj_initer: F,
    ) -> Self
    where
        F: FnMut(VehicleJourneyBuilder),
    {
        assert!(headway_secs > 0, "headway of {} must be positive", name);
        let mut builder = self.vj(name, vj_initer);
        if let Some(vj) = builder.vehicle_journeys.last_mut() {
            vj.frequency = Some(Frequency {
                start_time: start_time.into_time(),
                end_time: end_time.into_time(),
                headway_secs,
            });
        }
        builder
    }

    pub fn route<F>(mut self, id: &str, mut route_initer: F) -> Self
    where
        F: FnMut(&mut RouteInfo),
    {
        let route = self.routes.entry(id.to_string()).or_insert_with(|| RouteInfo {
            name: id.to_string(),
            line: DEFAULT_LINE_ID.to_string(),
        });
        route_initer(route);
        self
    }

    pub fn line<F>(mut self, id: &str, mut line_initer: F) -> Self
    where
        F: FnMut(&mut LineInfo),
    {
        let line = self.lines.entry(id.to_string()).or_insert_with(|| LineInfo {
            name: id.to_string(),
            network: DEFAULT_NETWORK_ID.to_string(),
        });
        line_initer(line);
        self
    }

    pub fn stop_point<F>(mut self, id: &str, mut stop_point_initer: F) -> Self
    where
        F: FnMut(&mut StopPointInfo),
    {
        let stop_point = self
            .stop_points
            .entry(id.to_string())
            .or_insert_with(|| default_stop_point(id));
        stop_point_initer(stop_point);
        self
    }

    /// Add a new Calendar or add dates to an existing one
    ///
    /// Note: if the dates are strings not in the right format, this conversion will fail
    pub fn calendar(mut self, id: &str, dates: &[impl AsDate]) -> Self {
        let calendar = self.calendars.entry(id.to_string()).or_default();
        calendar.extend(dates.iter().map(AsDate::as_date));
        self
    }

    /// Replace the dates of the default Calendar
    /// If not explicitly set, all vehicle journeys will be linked
    /// to this calendar
    pub fn default_calendar(mut self, dates: &[impl AsDate]) -> Self {
        self.calendars.remove(DEFAULT_CALENDAR_ID);
        self.calendar(DEFAULT_CALENDAR_ID, dates)
    }

    /// Consume the builder to create a schedule
    pub fn build(self) -> Schedule {
        let mut schedule = Schedule::new(self.calendar.clone());

        for (id, stop_point) in &self.stop_points {
            add_stop_point(&mut schedule, id, stop_point);
        }
        for id in self.routes.keys() {
            self.add_route(&mut schedule, id);
        }

        let mut blocks: BTreeMap<&str, Vec<VehicleJourneyIdx>> = BTreeMap::new();
        for vj_info in &self.vehicle_journeys {
            let route = self.add_route(&mut schedule, &vj_info.route);
            let stop_times = vj_info
                .stop_times
                .iter()
                .map(|stop_time| {
                    let stop_point = self
                        .stop_points
                        .get(&stop_time.stop_point)
                        .cloned()
                        .unwrap_or_else(|| default_stop_point(&stop_time.stop_point));
                    NewStopTime {
                        stop_point: add_stop_point(&mut schedule, &stop_time.stop_point, &stop_point),
                        arrival_time: stop_time.arrival_time,
                        departure_time: stop_time.departure_time,
                        boarding_duration: stop_time.boarding_duration,
                        alighting_duration: stop_time.alighting_duration,
                        flags: StopTimeFlags {
                            pick_up_allowed: stop_time.pick_up_allowed,
                            drop_off_allowed: stop_time.drop_off_allowed,
                            date_time_estimated: stop_time.date_time_estimated,
                            ..Default::default()
                        },
                    }
                })
                .collect();

            let dates = self
                .calendars
                .get(&vj_info.calendar)
                .unwrap_or_else(|| panic!("calendar {} does not exist", vj_info.calendar));
            let pattern = ValidityPattern::from_dates(&self.calendar, dates.iter());
            let pattern_idx = schedule.insert_validity_pattern(pattern);

            let new_vj = NewVehicleJourney {
                uri: vj_info.uri.clone(),
                meta_vehicle_journey: schedule.add_meta_vehicle_journey(&vj_info.uri),
                route,
                realtime_level: RealTimeLevel::Base,
                validity_patterns: [pattern_idx; 3],
                stop_times,
                kind: match vj_info.frequency {
                    Some(frequency) => VehicleJourneyKind::Frequency(frequency),
                    None => VehicleJourneyKind::Discrete,
                },
                shift: 0,
                theoretical_vehicle_journey: None,
                company: schedule.add_company(&vj_info.company, &vj_info.company),
                physical_mode: schedule
                    .add_physical_mode(&vj_info.physical_mode, &vj_info.physical_mode),
                dataset: schedule.add_dataset(&vj_info.dataset),
                headsign: vj_info.headsign.clone(),
                properties: vj_info.properties,
            };
            let vj_idx = schedule.add_vehicle_journey(new_vj);
            if let Some(block_id) = &vj_info.block_id {
                blocks.entry(block_id.as_str()).or_default().push(vj_idx);
            }
        }

        for vehicle_journeys in blocks.values_mut() {
            link_block(&mut schedule, vehicle_journeys);
        }
        schedule
    }

    fn add_route(&self, schedule: &mut Schedule, id: &str) -> super::RouteIdx {
        let route = self.routes.get(id).cloned().unwrap_or_else(|| RouteInfo {
            name: id.to_string(),
            line: DEFAULT_LINE_ID.to_string(),
        });
        let line = self.lines.get(&route.line).cloned().unwrap_or_else(|| LineInfo {
            name: route.line.clone(),
            network: DEFAULT_NETWORK_ID.to_string(),
        });
        let network = schedule.add_network(&line.network, &line.network);
        let line = schedule.add_line(&route.line, &line.name, network);
        schedule.add_route(id, &route.name, line)
    }
}

fn default_stop_point(id: &str) -> StopPointInfo {
    StopPointInfo {
        name: id.to_string(),
        stop_area: format!("sa:{}", id),
        properties: StopPointProperties::none(),
    }
}

fn add_stop_point(schedule: &mut Schedule, id: &str, info: &StopPointInfo) -> super::StopPointIdx {
    let stop_area = schedule.add_stop_area(&info.stop_area, &info.stop_area);
    schedule.add_stop_point(id, &info.name, stop_area, info.properties)
}

// vehicle journeys of the same block are chained when one ends
// before the next one starts
fn link_block(schedule: &mut Schedule, vehicle_journeys: &mut [VehicleJourneyIdx]) {
    let times = |schedule: &Schedule, idx: VehicleJourneyIdx| {
        schedule
            .vehicle_journey(idx)
            .and_then(|vj| Some((vj.stop_times.first()?, vj.stop_times.last()?)))
            .map(|(first, last)| (first.departure_time, last.arrival_time))
    };
    vehicle_journeys.sort_by_key(|idx| times(schedule, *idx));
    for pair in vehicle_journeys.windows(2) {
        let (prev, next) = (pair[0], pair[1]);
        if let (Some((_, prev_end)), Some((next_start, _))) =
            (times(schedule, prev), times(schedule, next))
        {
            if prev_end <= next_start {
                schedule.link_stay_in(prev, next);
            }
        }
    }
}

pub trait IntoTime {
    fn into_time(&self) -> SecondsSinceDayStart;
}

impl IntoTime for SecondsSinceDayStart {
    fn into_time(&self) -> SecondsSinceDayStart {
        *self
    }
}

impl IntoTime for &str {
    // Note: if the string is not in the right format, this conversion will fail
    fn into_time(&self) -> SecondsSinceDayStart {
        self.parse().expect("invalid time format")
    }
}

pub trait AsDate {
    fn as_date(&self) -> NaiveDate;
}

impl AsDate for NaiveDate {
    fn as_date(&self) -> NaiveDate {
        *self
    }
}

impl AsDate for &str {
    // Note: if the string is not in the right format, this conversion will fail
    fn as_date(&self) -> NaiveDate {
        self.parse().expect("invalid date format")
    }
}

pub trait AsDateTime {
    fn as_datetime(&self) -> NaiveDateTime;
}

impl AsDateTime for &str {
    fn as_datetime(&self) -> NaiveDateTime {
        self.parse().expect("invalid datetime format")
    }
}

impl AsDateTime for NaiveDateTime {
    fn as_datetime(&self) -> NaiveDateTime {
        *self
    }
}

impl<'a> VehicleJourneyBuilder<'a> {
    fn info(&mut self) -> &mut VehicleJourneyInfo {
        &mut self.model.vehicle_journeys[self.vj_idx]
    }

    /// add a StopTime to the vehicle journey
    ///
    /// Note: if the arrival/departure are given in string
    /// not in the right format, this conversion will fail
    pub fn st(self, name: &str, arrival: impl IntoTime) -> Self {
        self.st_mut(name, arrival.into_time(), arrival.into_time(), |_st| {})
    }

    pub fn st_detailed(
        self,
        name: &str,
        arrival: impl IntoTime,
        departure: impl IntoTime,
        pick_up_allowed: bool,
        drop_off_allowed: bool,
    ) -> Self {
        self.st_mut(name, arrival, departure, |st| {
            st.pick_up_allowed = pick_up_allowed;
            st.drop_off_allowed = drop_off_allowed;
        })
    }

    pub fn st_mut<F>(
        mut self,
        name: &str,
        arrival: impl IntoTime,
        departure: impl IntoTime,
        st_muter: F,
    ) -> Self
    where
        F: FnOnce(&mut StopTimeInfo),
    {
        let mut stop_time = StopTimeInfo {
            stop_point: name.to_string(),
            arrival_time: arrival.into_time(),
            departure_time: departure.into_time(),
            boarding_duration: 0,
            alighting_duration: 0,
            pick_up_allowed: true,
            drop_off_allowed: true,
            date_time_estimated: false,
        };
        st_muter(&mut stop_time);
        self.info().stop_times.push(stop_time);
        self
    }

    /// Set the route of the vj
    pub fn route(mut self, id: &str) -> Self {
        self.info().route = id.to_string();
        self
    }

    /// Set the calendar (service_id) of the vj
    pub fn calendar(mut self, id: &str) -> Self {
        self.info().calendar = id.to_string();
        self
    }

    pub fn block_id(mut self, block_id: &str) -> Self {
        self.info().block_id = Some(block_id.to_string());
        self
    }

    pub fn company(mut self, id: &str) -> Self {
        self.info().company = id.to_string();
        self
    }

    pub fn physical_mode(mut self, id: &str) -> Self {
        self.info().physical_mode = id.to_string();
        self
    }

    pub fn dataset(mut self, id: &str) -> Self {
        self.info().dataset = id.to_string();
        self
    }

    pub fn headsign(mut self, headsign: &str) -> Self {
        self.info().headsign = headsign.to_string();
        self
    }

    pub fn properties(mut self, properties: VehicleProperties) -> Self {
        self.info().properties = properties;
        self
    }
}
