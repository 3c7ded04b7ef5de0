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

//! What an impact does to the schedule.
//!
//! Planning an impact only reads the schedule : it resolves every object
//! the impact refers to, checks the consistency of the trip update, and
//! produces the list of actions to perform on each meta vehicle journey.
//! Any inconsistency is reported before the schedule is modified.

use super::{
    resolve_effect, DisruptionError, Effect, Impact, LineSection, PtObject, RailSection,
    TripUpdate,
};
use crate::models::schedule::NewStopTime;
use crate::models::{
    JourneyPatternIdx, LineIdx, MetaVehicleJourneyIdx, NetworkIdx, RealTimeLevel, RouteIdx,
    Schedule, StopAreaIdx, StopPointIdx, StopTimeFlags,
};
use crate::time::{DaysSinceDatasetStart, SecondsSinceDayStart, TimePeriod};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) enum MetaVehicleJourneyTarget {
    Existing(MetaVehicleJourneyIdx),
    // an additional service not yet known by the schedule
    New(String),
}

#[derive(Debug, Clone)]
pub(crate) enum Action {
    /// remove the days on which the trip runs during one of the periods
    Cancel { periods: Vec<TimePeriod> },
    /// stop serving the stop points during the periods
    SkipStops {
        stop_points: BTreeSet<StopPointIdx>,
        periods: Vec<TimePeriod>,
    },
    /// the trip does not run on this circulation day
    CancelDate { circulation_day: DaysSinceDatasetStart },
    /// the trip of this circulation day runs with new stop times
    Replace(ReplaceTrip),
}

#[derive(Debug, Clone)]
pub(crate) struct ReplaceTrip {
    pub circulation_day: DaysSinceDatasetStart,
    // number of days between the circulation day and the day
    // the new stop times are relative to
    pub shift: u16,
    pub stop_times: Vec<NewStopTime>,
    pub company: Option<String>,
    pub physical_mode: Option<String>,
    pub dataset: Option<String>,
    pub headsign: Option<String>,
    pub route: Option<RouteIdx>,
}

#[derive(Debug, Clone)]
pub(crate) struct Target {
    pub meta_vehicle_journey: MetaVehicleJourneyTarget,
    pub level: RealTimeLevel,
    pub action: Action,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Informed {
    Network(NetworkIdx),
    Line(LineIdx),
    Route(RouteIdx),
    StopArea(StopAreaIdx),
    StopPoint(StopPointIdx),
    MetaVehicleJourney(MetaVehicleJourneyIdx),
}

#[derive(Debug, Clone, Default)]
pub(crate) struct ImpactPlan {
    pub targets: Vec<Target>,
    pub informed: Vec<Informed>,
}

impl ImpactPlan {
    /// Only the actions on `meta_vehicle_journey`
    pub fn restricted_to(self, meta_vehicle_journey: MetaVehicleJourneyIdx) -> Self {
        let target = MetaVehicleJourneyTarget::Existing(meta_vehicle_journey);
        Self {
            targets: self
                .targets
                .into_iter()
                .filter(|other| other.meta_vehicle_journey == target)
                .collect(),
            informed: Vec::new(),
        }
    }
}

// effects that make a stop point unusable
fn skips_stops(effect: Effect) -> bool {
    matches!(
        effect,
        Effect::NoService | Effect::ReducedService | Effect::Detour
    )
}

pub(crate) fn plan_impact(schedule: &Schedule, impact: &Impact) -> Result<ImpactPlan, DisruptionError> {
    let effect = resolve_effect(impact);
    let mut plan = ImpactPlan::default();

    if let Some(trip_update) = &impact.trip_update {
        plan_trip_update(schedule, impact, trip_update, effect, &mut plan)?;
    }

    for pt_object in &impact.informed_entities {
        match pt_object {
            PtObject::Network(uri) => {
                let idx = schedule
                    .network_idx(uri)
                    .ok_or_else(|| DisruptionError::UnknownNetwork(uri.clone()))?;
                plan.informed.push(Informed::Network(idx));
                if effect == Effect::NoService {
                    let routes = schedule
                        .network(idx)
                        .lines
                        .iter()
                        .flat_map(|line| schedule.line(*line).routes.iter().copied());
                    cancel_routes(schedule, routes, impact, &mut plan);
                }
            }
            PtObject::Line(uri) => {
                let idx = schedule
                    .line_idx(uri)
                    .ok_or_else(|| DisruptionError::UnknownLine(uri.clone()))?;
                plan.informed.push(Informed::Line(idx));
                if effect == Effect::NoService {
                    let routes = schedule.line(idx).routes.iter().copied();
                    cancel_routes(schedule, routes, impact, &mut plan);
                }
            }
            PtObject::Route(uri) => {
                let idx = schedule
                    .route_idx(uri)
                    .ok_or_else(|| DisruptionError::UnknownRoute(uri.clone()))?;
                plan.informed.push(Informed::Route(idx));
                if effect == Effect::NoService {
                    cancel_routes(schedule, std::iter::once(idx), impact, &mut plan);
                }
            }
            PtObject::StopArea(uri) => {
                let idx = schedule
                    .stop_area_idx(uri)
                    .ok_or_else(|| DisruptionError::UnknownStopArea(uri.clone()))?;
                plan.informed.push(Informed::StopArea(idx));
                if skips_stops(effect) {
                    let stop_points = schedule.stop_area(idx).stop_points.iter().copied().collect();
                    skip_stop_points(schedule, stop_points, impact, &mut plan);
                }
            }
            PtObject::StopPoint(uri) => {
                let idx = schedule
                    .stop_point_idx(uri)
                    .ok_or_else(|| DisruptionError::UnknownStopPoint(uri.clone()))?;
                plan.informed.push(Informed::StopPoint(idx));
                if skips_stops(effect) {
                    skip_stop_points(schedule, BTreeSet::from([idx]), impact, &mut plan);
                }
            }
            PtObject::LineSection(section) => {
                plan_line_section(schedule, section, impact, effect, &mut plan)?;
            }
            PtObject::RailSection(section) => {
                plan_rail_section(schedule, section, impact, effect, &mut plan)?;
            }
            PtObject::MetaVehicleJourney(uri) => {
                // already handled with the trip update
                if impact.trip_update.is_some() {
                    continue;
                }
                let idx = schedule
                    .meta_vehicle_journey_idx(uri)
                    .ok_or_else(|| DisruptionError::UnknownMetaVehicleJourney(uri.clone()))?;
                plan.informed.push(Informed::MetaVehicleJourney(idx));
                if effect == Effect::NoService {
                    plan.targets.push(Target {
                        meta_vehicle_journey: MetaVehicleJourneyTarget::Existing(idx),
                        level: RealTimeLevel::Adapted,
                        action: Action::Cancel {
                            periods: impact.application_periods.clone(),
                        },
                    });
                }
            }
        }
    }
    Ok(plan)
}

fn journey_pattern_meta_vehicle_journeys(
    schedule: &Schedule,
    journey_pattern: JourneyPatternIdx,
) -> impl Iterator<Item = MetaVehicleJourneyIdx> + '_ {
    let journey_pattern = schedule.journey_pattern(journey_pattern);
    journey_pattern
        .discrete_vehicle_journeys
        .iter()
        .chain(journey_pattern.frequency_vehicle_journeys.iter())
        .filter_map(move |vj_idx| schedule.vehicle_journey(*vj_idx))
        .map(|vj| vj.meta_vehicle_journey())
}

fn cancel_routes(
    schedule: &Schedule,
    routes: impl Iterator<Item = RouteIdx>,
    impact: &Impact,
    plan: &mut ImpactPlan,
) {
    let meta_vehicle_journeys: BTreeSet<MetaVehicleJourneyIdx> = routes
        .flat_map(|route| schedule.route(route).journey_patterns.iter().copied())
        .flat_map(|journey_pattern| journey_pattern_meta_vehicle_journeys(schedule, journey_pattern))
        .collect();
    for idx in meta_vehicle_journeys {
        plan.targets.push(Target {
            meta_vehicle_journey: MetaVehicleJourneyTarget::Existing(idx),
            level: RealTimeLevel::Adapted,
            action: Action::Cancel {
                periods: impact.application_periods.clone(),
            },
        });
    }
}

fn skip_stop_points(
    schedule: &Schedule,
    stop_points: BTreeSet<StopPointIdx>,
    impact: &Impact,
    plan: &mut ImpactPlan,
) {
    let meta_vehicle_journeys: BTreeSet<MetaVehicleJourneyIdx> = stop_points
        .iter()
        .flat_map(|stop_point| schedule.stop_point(*stop_point).journey_pattern_points.iter())
        .map(|jpp| schedule.journey_pattern_point(*jpp).journey_pattern)
        .flat_map(|journey_pattern| journey_pattern_meta_vehicle_journeys(schedule, journey_pattern))
        .collect();
    for idx in meta_vehicle_journeys {
        plan.targets.push(Target {
            meta_vehicle_journey: MetaVehicleJourneyTarget::Existing(idx),
            level: RealTimeLevel::Adapted,
            action: Action::SkipStops {
                stop_points: stop_points.clone(),
                periods: impact.application_periods.clone(),
            },
        });
    }
}

fn section_routes(
    schedule: &Schedule,
    line: LineIdx,
    routes: &[String],
) -> Result<Vec<RouteIdx>, DisruptionError> {
    if routes.is_empty() {
        return Ok(schedule.line(line).routes.clone());
    }
    routes
        .iter()
        .map(|uri| {
            schedule
                .route_idx(uri)
                .ok_or_else(|| DisruptionError::UnknownRoute(uri.clone()))
        })
        .collect()
}

fn resolve_stop_area(schedule: &Schedule, uri: &str) -> Result<StopAreaIdx, DisruptionError> {
    schedule
        .stop_area_idx(uri)
        .ok_or_else(|| DisruptionError::UnknownStopArea(uri.to_string()))
}

// For each journey pattern of the routes that goes from `start` to `end`,
// `select` receives the stop points of the journey pattern and the bounds of
// the section, and returns the stop points to skip.
fn skip_in_sections<F>(
    schedule: &Schedule,
    routes: &[RouteIdx],
    start: StopAreaIdx,
    end: StopAreaIdx,
    impact: &Impact,
    plan: &mut ImpactPlan,
    select: F,
) where
    F: Fn(&[StopPointIdx], usize, usize) -> Vec<StopPointIdx>,
{
    let mut to_skip: BTreeMap<MetaVehicleJourneyIdx, BTreeSet<StopPointIdx>> = BTreeMap::new();
    for route in routes {
        for journey_pattern in &schedule.route(*route).journey_patterns {
            let stop_points: Vec<StopPointIdx> = schedule
                .journey_pattern(*journey_pattern)
                .journey_pattern_points
                .iter()
                .map(|jpp| schedule.journey_pattern_point(*jpp).stop_point)
                .collect();
            let stop_area = |stop_point: &StopPointIdx| schedule.stop_point(*stop_point).stop_area;
            let section_start = match stop_points.iter().position(|sp| stop_area(sp) == start) {
                Some(position) => position,
                None => continue,
            };
            let section_end = match stop_points[section_start..]
                .iter()
                .position(|sp| stop_area(sp) == end)
            {
                Some(position) => section_start + position,
                None => continue,
            };
            let skipped = select(&stop_points, section_start, section_end);
            if skipped.is_empty() {
                continue;
            }
            for meta_vehicle_journey in journey_pattern_meta_vehicle_journeys(schedule, *journey_pattern) {
                to_skip
                    .entry(meta_vehicle_journey)
                    .or_default()
                    .extend(skipped.iter().copied());
            }
        }
    }
    for (idx, stop_points) in to_skip {
        plan.targets.push(Target {
            meta_vehicle_journey: MetaVehicleJourneyTarget::Existing(idx),
            level: RealTimeLevel::Adapted,
            action: Action::SkipStops {
                stop_points,
                periods: impact.application_periods.clone(),
            },
        });
    }
}

fn plan_line_section(
    schedule: &Schedule,
    section: &LineSection,
    impact: &Impact,
    effect: Effect,
    plan: &mut ImpactPlan,
) -> Result<(), DisruptionError> {
    let line = schedule
        .line_idx(&section.line)
        .ok_or_else(|| DisruptionError::UnknownLine(section.line.clone()))?;
    let start = resolve_stop_area(schedule, &section.start_stop_area)?;
    let end = resolve_stop_area(schedule, &section.end_stop_area)?;
    let routes = section_routes(schedule, line, &section.routes)?;
    plan.informed.push(Informed::Line(line));
    if skips_stops(effect) {
        skip_in_sections(schedule, &routes, start, end, impact, plan, |stop_points, first, last| {
            stop_points[first..=last].to_vec()
        });
    }
    Ok(())
}

fn plan_rail_section(
    schedule: &Schedule,
    section: &RailSection,
    impact: &Impact,
    effect: Effect,
    plan: &mut ImpactPlan,
) -> Result<(), DisruptionError> {
    let line = schedule
        .line_idx(&section.line)
        .ok_or_else(|| DisruptionError::UnknownLine(section.line.clone()))?;
    let start = resolve_stop_area(schedule, &section.start_stop_area)?;
    let end = resolve_stop_area(schedule, &section.end_stop_area)?;
    let blocked: BTreeSet<StopAreaIdx> = section
        .blocked_stop_areas
        .iter()
        .map(|uri| resolve_stop_area(schedule, uri))
        .collect::<Result<_, _>>()?;
    let routes = section_routes(schedule, line, &section.routes)?;
    plan.informed.push(Informed::Line(line));
    if skips_stops(effect) {
        skip_in_sections(schedule, &routes, start, end, impact, plan, |stop_points, first, last| {
            if blocked.is_empty() {
                stop_points
                    .get(first + 1..last)
                    .map(<[StopPointIdx]>::to_vec)
                    .unwrap_or_default()
            } else {
                stop_points[first..=last]
                    .iter()
                    .filter(|sp| blocked.contains(&schedule.stop_point(**sp).stop_area))
                    .copied()
                    .collect()
            }
        });
    }
    Ok(())
}

fn plan_trip_update(
    schedule: &Schedule,
    impact: &Impact,
    trip_update: &TripUpdate,
    effect: Effect,
    plan: &mut ImpactPlan,
) -> Result<(), DisruptionError> {
    let uri = impact
        .informed_entities
        .iter()
        .find_map(|pt_object| match pt_object {
            PtObject::MetaVehicleJourney(uri) => Some(uri),
            _ => None,
        })
        .ok_or_else(|| DisruptionError::TripUpdateWithoutTrip(impact.uri.clone()))?;

    let date = trip_update.circulation_date;
    let circulation_day = schedule
        .calendar()
        .date_to_days_since_start(&date)
        .ok_or_else(|| DisruptionError::CirculationDateOutOfCalendar {
            trip: uri.clone(),
            date,
        })?;

    let meta_vehicle_journey = schedule.meta_vehicle_journey_idx(uri);
    let base_vehicle_journey = meta_vehicle_journey
        .and_then(|idx| schedule.meta_vehicle_journey(idx).base_vehicle_journey());
    if let Some(base) = base_vehicle_journey.and_then(|idx| schedule.vehicle_journey(idx)) {
        if base.is_frequency() {
            return Err(DisruptionError::TripUpdateOnFrequency(uri.clone()));
        }
    }
    let base_runs = base_vehicle_journey
        .map(|idx| schedule.is_valid_on(idx, RealTimeLevel::Base, &circulation_day));

    let target = match (effect, meta_vehicle_journey) {
        (Effect::AdditionalService, _) if base_runs == Some(true) => {
            return Err(DisruptionError::AdditionalServiceInBase {
                trip: uri.clone(),
                date,
            });
        }
        (Effect::AdditionalService, None) => MetaVehicleJourneyTarget::New(uri.clone()),
        (_, None) => return Err(DisruptionError::UnknownMetaVehicleJourney(uri.clone())),
        (Effect::AdditionalService, Some(idx)) => MetaVehicleJourneyTarget::Existing(idx),
        (_, Some(_)) if base_runs == Some(false) => {
            return Err(DisruptionError::TripNotRunning {
                trip: uri.clone(),
                date,
            });
        }
        (_, Some(idx)) => MetaVehicleJourneyTarget::Existing(idx),
    };
    if let MetaVehicleJourneyTarget::Existing(idx) = target {
        plan.informed.push(Informed::MetaVehicleJourney(idx));
    }

    let action = if effect == Effect::NoService {
        Action::CancelDate { circulation_day }
    } else {
        Action::Replace(plan_replace(schedule, uri, trip_update, circulation_day)?)
    };
    plan.targets.push(Target {
        meta_vehicle_journey: target,
        level: RealTimeLevel::RealTime,
        action,
    });
    Ok(())
}

fn plan_replace(
    schedule: &Schedule,
    trip: &str,
    trip_update: &TripUpdate,
    circulation_day: DaysSinceDatasetStart,
) -> Result<ReplaceTrip, DisruptionError> {
    let calendar = schedule.calendar();
    // every stop point must exist, even the deleted ones
    let stop_points = trip_update
        .stop_time_updates
        .iter()
        .map(|update| {
            schedule
                .stop_point_idx(&update.stop_point)
                .ok_or_else(|| DisruptionError::UnknownStopPoint(update.stop_point.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let kept: Vec<_> = trip_update
        .stop_time_updates
        .iter()
        .zip(stop_points)
        .filter(|(update, _)| !update.is_deleted())
        .collect();
    let first = match kept.first() {
        Some((first, _)) => first,
        None => return Err(DisruptionError::EmptyTripUpdate(trip.to_string())),
    };

    let mut previous_departure = None;
    for (update, _) in &kept {
        let ordered = update.arrival_time <= update.departure_time
            && previous_departure
                .map(|previous| previous <= update.arrival_time)
                .unwrap_or(true);
        if !ordered {
            return Err(DisruptionError::NonMonotonicStopTimes {
                trip: trip.to_string(),
                stop_point: update.stop_point.clone(),
            });
        }
        previous_departure = Some(update.departure_time);
    }

    // a delayed trip may start on a later day than its circulation date :
    // its stop times are then given relatively to that day
    let shift = (first.arrival_time.date() - trip_update.circulation_date).num_days();
    if shift < 0 {
        return Err(DisruptionError::StopTimeBeforeCirculationDate {
            trip: trip.to_string(),
            stop_point: first.stop_point.clone(),
        });
    }
    let shifted_date = first.arrival_time.date();
    let shift = match u16::try_from(shift) {
        Ok(shift) if calendar.contains_date(&shifted_date) => shift,
        _ => {
            return Err(DisruptionError::CirculationDateOutOfCalendar {
                trip: trip.to_string(),
                date: shifted_date,
            })
        }
    };
    let day_start = shifted_date.and_time(chrono::NaiveTime::MIN);

    let to_seconds = |datetime: chrono::NaiveDateTime, stop_point: &str| {
        u32::try_from((datetime - day_start).num_seconds())
            .ok()
            .and_then(SecondsSinceDayStart::from_seconds)
            .ok_or_else(|| DisruptionError::StopTimeBeyondHorizon {
                trip: trip.to_string(),
                stop_point: stop_point.to_string(),
            })
    };

    let stop_times = kept
        .iter()
        .map(|(update, stop_point)| {
            Ok(NewStopTime {
                stop_point: *stop_point,
                arrival_time: to_seconds(update.arrival_time, &update.stop_point)?,
                departure_time: to_seconds(update.departure_time, &update.stop_point)?,
                boarding_duration: 0,
                alighting_duration: 0,
                flags: StopTimeFlags {
                    pick_up_allowed: !update.departure_status.is_deleted(),
                    drop_off_allowed: !update.arrival_status.is_deleted(),
                    ..Default::default()
                },
            })
        })
        .collect::<Result<Vec<_>, DisruptionError>>()?;

    let route = trip_update
        .route
        .as_ref()
        .map(|uri| {
            schedule
                .route_idx(uri)
                .ok_or_else(|| DisruptionError::UnknownRoute(uri.clone()))
        })
        .transpose()?;

    Ok(ReplaceTrip {
        circulation_day,
        shift,
        stop_times,
        company: trip_update.company.clone(),
        physical_mode: trip_update.physical_mode.clone(),
        dataset: trip_update.dataset.clone(),
        headsign: trip_update.headsign.clone(),
        route,
    })
}
