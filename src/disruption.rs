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

//! Disruptions coming from the real time feeds, and their application
//! on the schedule.
//!
//! A `Disruption` holds `Impact`s. Each impact targets some objects of the
//! schedule (networks, lines, stop points, trips...). Applying an impact
//! removes days from validity patterns and creates derived vehicle journeys.
//!
//! Impacts are owned by the `DisruptionHolder`. Every object of the schedule
//! only keeps a `Weak` reference to the impacts that concern it, so that
//! deleting a disruption is enough to make all these references dangle.

mod apply;
mod cancel;
pub mod effect;
mod impacted;

pub(crate) use apply::{apply_impact, Changes};
pub(crate) use cancel::reset_and_reapply;
pub use effect::{infer_effect, resolve_effect, StopTimeStatus};
pub(crate) use impacted::{plan_impact, MetaVehicleJourneyTarget};

use crate::time::TimePeriod;
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct Disruption {
    pub id: String,
    pub reference: Option<String>,
    pub contributor: Option<String>,
    pub publication_period: Option<TimePeriod>,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
    pub cause: Cause,
    pub tags: Vec<Tag>,
    pub impacts: Vec<Impact>,
}

#[derive(Default, Debug, Clone)]
pub struct Cause {
    pub id: String,
    pub wording: String,
    pub category: String,
}

#[derive(Default, Debug, Clone)]
pub struct Tag {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct Impact {
    pub uri: String,
    // set when the disruption is stored
    pub disruption_uri: String,
    pub created_at: Option<NaiveDateTime>,
    // impacts of a trip are applied in the order of their update
    pub updated_at: NaiveDateTime,
    pub application_periods: Vec<TimePeriod>,
    pub severity: Severity,
    pub messages: Vec<Message>,
    pub informed_entities: Vec<PtObject>,
    // only for impacts coming from a live feed
    pub trip_update: Option<TripUpdate>,
}

#[derive(Debug, Clone)]
pub struct Severity {
    pub uri: String,
    pub wording: Option<String>,
    pub color: Option<String>,
    pub priority: Option<i32>,
    pub effect: Effect,
}

impl Default for Severity {
    fn default() -> Self {
        Self {
            uri: String::new(),
            wording: None,
            color: None,
            priority: None,
            effect: Effect::UnknownEffect,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Message {
    pub text: String,
    pub channel_id: String,
    pub channel_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Effect {
    NoService,
    ReducedService,
    SignificantDelays,
    Detour,
    AdditionalService,
    ModifiedService,
    OtherEffect,
    UnknownEffect,
    StopMoved,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PtObject {
    Network(String),
    Line(String),
    Route(String),
    StopArea(String),
    StopPoint(String),
    LineSection(LineSection),
    RailSection(RailSection),
    MetaVehicleJourney(String),
}

/// The part of a line between two stop areas
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineSection {
    pub line: String,
    pub start_stop_area: String,
    pub end_stop_area: String,
    // when empty, every route of the line is concerned
    pub routes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RailSection {
    pub line: String,
    pub start_stop_area: String,
    pub end_stop_area: String,
    // when empty, every stop area strictly inside the section is blocked
    pub blocked_stop_areas: Vec<String>,
    pub routes: Vec<String>,
}

/// New stop times of a trip, for one circulation date
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripUpdate {
    // the date on which the theoretical trip starts
    pub circulation_date: NaiveDate,
    pub stop_time_updates: Vec<StopTimeUpdate>,
    pub company: Option<String>,
    pub physical_mode: Option<String>,
    pub dataset: Option<String>,
    pub headsign: Option<String>,
    pub route: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopTimeUpdate {
    pub stop_point: String,
    pub arrival_time: NaiveDateTime,
    pub departure_time: NaiveDateTime,
    pub arrival_status: StopTimeStatus,
    pub departure_status: StopTimeStatus,
}

impl StopTimeUpdate {
    pub fn is_deleted(&self) -> bool {
        self.arrival_status.is_deleted() && self.departure_status.is_deleted()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DisruptionError {
    #[error("network {0} does not exist in the schedule")]
    UnknownNetwork(String),
    #[error("line {0} does not exist in the schedule")]
    UnknownLine(String),
    #[error("route {0} does not exist in the schedule")]
    UnknownRoute(String),
    #[error("stop area {0} does not exist in the schedule")]
    UnknownStopArea(String),
    #[error("stop point {0} does not exist in the schedule")]
    UnknownStopPoint(String),
    #[error("meta vehicle journey {0} does not exist in the schedule")]
    UnknownMetaVehicleJourney(String),
    #[error("the trip update of impact {0} does not designate a trip")]
    TripUpdateWithoutTrip(String),
    #[error("circulation date {date} of {trip} is outside of the production period")]
    CirculationDateOutOfCalendar { trip: String, date: NaiveDate },
    #[error("base vehicle journey {trip} does not run on {date}")]
    TripNotRunning { trip: String, date: NaiveDate },
    #[error("stop time updates of {trip} are not ordered in time at stop point {stop_point}")]
    NonMonotonicStopTimes { trip: String, stop_point: String },
    #[error("stop time of {trip} at {stop_point} is before its circulation date")]
    StopTimeBeforeCirculationDate { trip: String, stop_point: String },
    #[error("stop time of {trip} at {stop_point} is more than 48h after the start of its circulation day")]
    StopTimeBeyondHorizon { trip: String, stop_point: String },
    #[error("trip update of {0} has no stop time")]
    EmptyTripUpdate(String),
    #[error("trip update on frequency vehicle journey {0}")]
    TripUpdateOnFrequency(String),
    #[error("additional service {trip} exists in the base schedule on {date}")]
    AdditionalServiceInBase { trip: String, date: NaiveDate },
    #[error("disruption {0} is unknown")]
    UnknownDisruption(String),
}

/// A stored disruption. Its impacts are shared with nobody else :
/// the schedule only holds weak references to them.
#[derive(Debug)]
pub struct HeldDisruption {
    pub disruption: Disruption,
    pub impacts: Vec<Arc<Impact>>,
}

#[derive(Debug, Default)]
pub struct DisruptionHolder {
    disruptions: BTreeMap<String, HeldDisruption>,
}

impl DisruptionHolder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.disruptions.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&HeldDisruption> {
        self.disruptions.get(id)
    }

    pub fn len(&self) -> usize {
        self.disruptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.disruptions.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.disruptions.keys().map(String::as_str)
    }

    /// Store the disruption and return its shared impacts
    pub(crate) fn insert(&mut self, mut disruption: Disruption) -> Vec<Arc<Impact>> {
        let impacts: Vec<Arc<Impact>> = std::mem::take(&mut disruption.impacts)
            .into_iter()
            .map(|mut impact| {
                impact.disruption_uri = disruption.id.clone();
                Arc::new(impact)
            })
            .collect();
        let held = HeldDisruption {
            disruption,
            impacts: impacts.clone(),
        };
        self.disruptions.insert(held.disruption.id.clone(), held);
        impacts
    }

    pub(crate) fn remove(&mut self, id: &str) -> Option<HeldDisruption> {
        self.disruptions.remove(id)
    }
}
