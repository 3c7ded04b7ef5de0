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

use launch::rt_schedule::chrono::NaiveDateTime;
use launch::rt_schedule::disruption::{
    Disruption, Effect, Impact, LineSection, PtObject, RailSection, Severity, StopTimeStatus,
    StopTimeUpdate, TripUpdate,
};
use launch::rt_schedule::modelbuilder::{AsDate, AsDateTime};
use launch::rt_schedule::time::TimePeriod;

const DEFAULT_UPDATED_AT: &str = "2020-01-01T00:00:00";

/// Builder used to easily create a `Disruption`
pub struct DisruptionBuilder {
    disruption: Disruption,
}

pub struct ImpactBuilder<'a> {
    impact: &'a mut Impact,
}

pub struct TripUpdateBuilder<'a> {
    trip_update: &'a mut TripUpdate,
}

impl DisruptionBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            disruption: Disruption {
                id: id.to_string(),
                ..Default::default()
            },
        }
    }

    pub fn impact<F>(mut self, id: &str, impact_initer: F) -> Self
    where
        F: FnOnce(ImpactBuilder),
    {
        self.disruption.impacts.push(Impact {
            uri: id.to_string(),
            disruption_uri: self.disruption.id.clone(),
            created_at: None,
            updated_at: DEFAULT_UPDATED_AT.as_datetime(),
            application_periods: Vec::new(),
            severity: Severity::default(),
            messages: Vec::new(),
            informed_entities: Vec::new(),
            trip_update: None,
        });
        let impact = self
            .disruption
            .impacts
            .last_mut()
            .expect("an impact was just pushed");
        impact_initer(ImpactBuilder { impact });
        self
    }

    pub fn build(self) -> Disruption {
        self.disruption
    }
}

impl<'a> ImpactBuilder<'a> {
    pub fn effect(self, effect: Effect) -> Self {
        self.impact.severity.effect = effect;
        self
    }

    pub fn updated_at(self, datetime: impl AsDateTime) -> Self {
        self.impact.updated_at = datetime.as_datetime();
        self
    }

    pub fn period(self, start: impl AsDateTime, end: impl AsDateTime) -> Self {
        let period = TimePeriod::new(start.as_datetime(), end.as_datetime()).unwrap();
        self.impact.application_periods.push(period);
        self
    }

    fn informs(self, pt_object: PtObject) -> Self {
        self.impact.informed_entities.push(pt_object);
        self
    }

    pub fn network(self, uri: &str) -> Self {
        self.informs(PtObject::Network(uri.to_string()))
    }

    pub fn line(self, uri: &str) -> Self {
        self.informs(PtObject::Line(uri.to_string()))
    }

    pub fn route(self, uri: &str) -> Self {
        self.informs(PtObject::Route(uri.to_string()))
    }

    pub fn stop_area(self, uri: &str) -> Self {
        self.informs(PtObject::StopArea(uri.to_string()))
    }

    pub fn stop_point(self, uri: &str) -> Self {
        self.informs(PtObject::StopPoint(uri.to_string()))
    }

    pub fn trip(self, uri: &str) -> Self {
        self.informs(PtObject::MetaVehicleJourney(uri.to_string()))
    }

    pub fn line_section(self, line: &str, start: &str, end: &str) -> Self {
        self.informs(PtObject::LineSection(LineSection {
            line: line.to_string(),
            start_stop_area: start.to_string(),
            end_stop_area: end.to_string(),
            routes: Vec::new(),
        }))
    }

    pub fn rail_section(self, line: &str, start: &str, end: &str, blocked: &[&str]) -> Self {
        self.informs(PtObject::RailSection(RailSection {
            line: line.to_string(),
            start_stop_area: start.to_string(),
            end_stop_area: end.to_string(),
            blocked_stop_areas: blocked.iter().map(|uri| uri.to_string()).collect(),
            routes: Vec::new(),
        }))
    }

    /// New stop times of `trip` for its run starting on `circulation_date`
    pub fn trip_update<F>(self, trip: &str, circulation_date: impl AsDate, trip_update_initer: F) -> Self
    where
        F: FnOnce(TripUpdateBuilder),
    {
        let builder = self.trip(trip);
        let trip_update = builder.impact.trip_update.insert(TripUpdate {
            circulation_date: circulation_date.as_date(),
            stop_time_updates: Vec::new(),
            company: None,
            physical_mode: None,
            dataset: None,
            headsign: None,
            route: None,
        });
        trip_update_initer(TripUpdateBuilder { trip_update });
        builder
    }
}

impl<'a> TripUpdateBuilder<'a> {
    fn push(
        self,
        stop_point: &str,
        arrival_time: NaiveDateTime,
        departure_time: NaiveDateTime,
        status: StopTimeStatus,
    ) -> Self {
        self.trip_update.stop_time_updates.push(StopTimeUpdate {
            stop_point: stop_point.to_string(),
            arrival_time,
            departure_time,
            arrival_status: status,
            departure_status: status,
        });
        self
    }

    pub fn st(self, stop_point: &str, datetime: impl AsDateTime) -> Self {
        let datetime = datetime.as_datetime();
        self.push(stop_point, datetime, datetime, StopTimeStatus::Unchanged)
    }

    pub fn delayed(self, stop_point: &str, datetime: impl AsDateTime) -> Self {
        let datetime = datetime.as_datetime();
        self.push(stop_point, datetime, datetime, StopTimeStatus::Delayed)
    }

    pub fn added(self, stop_point: &str, datetime: impl AsDateTime) -> Self {
        let datetime = datetime.as_datetime();
        self.push(stop_point, datetime, datetime, StopTimeStatus::Added)
    }

    pub fn deleted(self, stop_point: &str, datetime: impl AsDateTime) -> Self {
        let datetime = datetime.as_datetime();
        self.push(stop_point, datetime, datetime, StopTimeStatus::Deleted)
    }

    pub fn st_times(
        self,
        stop_point: &str,
        arrival: impl AsDateTime,
        departure: impl AsDateTime,
    ) -> Self {
        self.push(
            stop_point,
            arrival.as_datetime(),
            departure.as_datetime(),
            StopTimeStatus::Unchanged,
        )
    }

    pub fn route(self, uri: &str) -> Self {
        self.trip_update.route = Some(uri.to_string());
        self
    }

    pub fn company(self, uri: &str) -> Self {
        self.trip_update.company = Some(uri.to_string());
        self
    }

    pub fn headsign(self, headsign: &str) -> Self {
        self.trip_update.headsign = Some(headsign.to_string());
        self
    }
}
