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

use super::impacted::{Action, ImpactPlan, Informed, ReplaceTrip};
use super::{Impact, MetaVehicleJourneyTarget};
use crate::models::modelbuilder::{
    DEFAULT_COMPANY_ID, DEFAULT_DATASET_ID, DEFAULT_PHYSICAL_MODE_ID,
};
use crate::models::schedule::{NewStopTime, NewVehicleJourney};
use crate::models::{
    CompanyIdx, DatasetIdx, MetaVehicleJourneyIdx, PhysicalModeIdx, RealTimeLevel, RouteIdx,
    Schedule, StopPointIdx, StopTime, VehicleJourney, VehicleJourneyIdx, VehicleJourneyKind,
    VehicleProperties, NB_OF_REAL_TIME_LEVELS,
};
use crate::time::{
    Calendar, DaysSinceDatasetStart, TimePeriod, TimePeriods, ValidityPattern, ValidityPatternIdx,
};
use std::collections::BTreeSet;
use std::sync::{Arc, Weak};
use tracing::{debug, warn};

const ADDITIONAL_SERVICE_NETWORK_ID: &str = "network:additional_service";
const ADDITIONAL_SERVICE_LINE_ID: &str = "line:additional_service";
const ADDITIONAL_SERVICE_ROUTE_ID: &str = "route:additional_service";

/// What the application of impacts changed in the schedule
#[derive(Debug, Default)]
pub(crate) struct Changes {
    // days of validity patterns that were modified
    pub days: BTreeSet<DaysSinceDatasetStart>,
    // some vehicle journeys were created or removed
    pub trip_set_changed: bool,
    pub meta_vehicle_journeys: BTreeSet<MetaVehicleJourneyIdx>,
    pub nb_of_informed_objects: usize,
}

impl Changes {
    pub fn is_empty(&self) -> bool {
        self.days.is_empty() && !self.trip_set_changed
    }

    // a created or removed vehicle journey changes every day its stop times reach,
    // starting from each of its circulation days
    pub fn add_reached_days(
        &mut self,
        vehicle_journey: &VehicleJourney,
        circulation_days: impl IntoIterator<Item = DaysSinceDatasetStart>,
    ) {
        let reach_days = vehicle_journey.reach_days();
        for day in circulation_days {
            self.days
                .extend((0..=reach_days).filter_map(|offset| day.checked_add(offset)));
        }
    }
}

fn register(impacts: &mut Vec<Weak<Impact>>, impact: &Weak<Impact>) {
    if !impacts.iter().any(|other| other.ptr_eq(impact)) {
        impacts.push(impact.clone());
    }
}

pub(crate) fn apply_impact(
    schedule: &mut Schedule,
    impact: &Arc<Impact>,
    plan: ImpactPlan,
    changes: &mut Changes,
) {
    let weak = Arc::downgrade(impact);

    for informed in &plan.informed {
        match *informed {
            Informed::Network(idx) => register(&mut schedule.network_mut(idx).impacts, &weak),
            Informed::Line(idx) => register(&mut schedule.line_mut(idx).impacts, &weak),
            Informed::Route(idx) => register(&mut schedule.route_mut(idx).impacts, &weak),
            Informed::StopArea(idx) => register(&mut schedule.stop_area_mut(idx).impacts, &weak),
            Informed::StopPoint(idx) => register(&mut schedule.stop_point_mut(idx).impacts, &weak),
            Informed::MetaVehicleJourney(idx) => register(
                &mut schedule.meta_vehicle_journey_mut(idx).impacted_by,
                &weak,
            ),
        }
    }
    changes.nb_of_informed_objects += plan.informed.len();

    let mut modified = BTreeSet::new();
    for target in plan.targets {
        let meta_vehicle_journey = match target.meta_vehicle_journey {
            MetaVehicleJourneyTarget::Existing(idx) => idx,
            MetaVehicleJourneyTarget::New(uri) => {
                let idx = schedule.add_meta_vehicle_journey(&uri);
                register(&mut schedule.meta_vehicle_journey_mut(idx).impacted_by, &weak);
                changes.nb_of_informed_objects += 1;
                idx
            }
        };
        register(
            &mut schedule.meta_vehicle_journey_mut(meta_vehicle_journey).modified_by,
            &weak,
        );
        modified.insert(meta_vehicle_journey);

        match target.action {
            Action::Cancel { periods } => {
                cancel_periods(schedule, meta_vehicle_journey, target.level, &periods, changes)
            }
            Action::SkipStops {
                stop_points,
                periods,
            } => skip_stops(
                schedule,
                meta_vehicle_journey,
                target.level,
                &stop_points,
                &periods,
                impact,
                changes,
            ),
            Action::CancelDate { circulation_day } => cancel_date(
                schedule,
                meta_vehicle_journey,
                target.level,
                circulation_day,
                changes,
            ),
            Action::Replace(trip) => {
                cancel_date(
                    schedule,
                    meta_vehicle_journey,
                    target.level,
                    trip.circulation_day,
                    changes,
                );
                replace(schedule, meta_vehicle_journey, impact, trip, changes);
            }
        }
    }

    for meta_vehicle_journey in modified {
        remove_unused_vehicle_journeys(schedule, meta_vehicle_journey, changes);
        changes.meta_vehicle_journeys.insert(meta_vehicle_journey);
    }
}

/// Every vehicle journey of the meta vehicle journey, whatever its level
pub(crate) fn all_vehicle_journeys(
    schedule: &Schedule,
    meta_vehicle_journey: MetaVehicleJourneyIdx,
) -> Vec<VehicleJourneyIdx> {
    let meta_vehicle_journey = schedule.meta_vehicle_journey(meta_vehicle_journey);
    RealTimeLevel::all()
        .iter()
        .flat_map(|level| meta_vehicle_journey.vehicle_journeys(*level).iter().copied())
        .collect()
}

fn remove_days(
    schedule: &mut Schedule,
    vehicle_journey: VehicleJourneyIdx,
    level: RealTimeLevel,
    days: &[DaysSinceDatasetStart],
    changes: &mut Changes,
) {
    let mut pattern = match schedule.vehicle_journey(vehicle_journey) {
        Some(vj) => schedule.validity_pattern(vj, level).clone(),
        None => return,
    };
    let mut modified = false;
    for day in days {
        if pattern.check(day) {
            pattern.remove(day);
            changes.days.insert(*day);
            modified = true;
        }
    }
    if modified {
        schedule.set_validity_pattern(vehicle_journey, level, pattern);
    }
}

// the datetimes, on `day`, between the first and the last second of the interval
fn period_on_day(
    calendar: &Calendar,
    day: &DaysSinceDatasetStart,
    (first, last): (u32, u32),
) -> Option<TimePeriod> {
    let day_start = calendar.to_naive_date(day).and_time(chrono::NaiveTime::MIN);
    let start = day_start + chrono::Duration::seconds(i64::from(first));
    let end = day_start + chrono::Duration::seconds(i64::from(last) + 1);
    TimePeriod::new(start, end).ok()
}

fn days_intersecting(
    schedule: &Schedule,
    vj: &VehicleJourney,
    level: RealTimeLevel,
    periods: &TimePeriods,
    interval: (u32, u32),
) -> Vec<DaysSinceDatasetStart> {
    let calendar = schedule.calendar();
    schedule
        .validity_pattern(vj, level)
        .days()
        .filter(|day| {
            period_on_day(calendar, day, interval)
                .map(|period| periods.intersects(&period))
                .unwrap_or(false)
        })
        .collect()
}

fn cancel_periods(
    schedule: &mut Schedule,
    meta_vehicle_journey: MetaVehicleJourneyIdx,
    level: RealTimeLevel,
    periods: &[TimePeriod],
    changes: &mut Changes,
) {
    let periods = match TimePeriods::new(periods) {
        Some(periods) => periods,
        None => return,
    };
    for vj_idx in all_vehicle_journeys(schedule, meta_vehicle_journey) {
        for level in level.and_above() {
            let days = match schedule.vehicle_journey(vj_idx) {
                Some(vj) => days_intersecting(schedule, vj, level, &periods, vj.execution_bounds()),
                None => continue,
            };
            remove_days(schedule, vj_idx, level, &days, changes);
        }
    }
}

fn cancel_date(
    schedule: &mut Schedule,
    meta_vehicle_journey: MetaVehicleJourneyIdx,
    level: RealTimeLevel,
    circulation_day: DaysSinceDatasetStart,
    changes: &mut Changes,
) {
    for vj_idx in all_vehicle_journeys(schedule, meta_vehicle_journey) {
        let day = match schedule
            .vehicle_journey(vj_idx)
            .and_then(|vj| circulation_day.checked_add(vj.shift()))
        {
            Some(day) => day,
            None => continue,
        };
        for level in level.and_above() {
            remove_days(schedule, vj_idx, level, &[day], changes);
        }
    }
}

// seconds since the start of the circulation day during which the vehicle
// may be at this stop
fn stop_time_interval(vj: &VehicleJourney, stop_time: &StopTime) -> (u32, u32) {
    let first = stop_time.earliest_time().seconds;
    let last = stop_time.latest_time().seconds;
    match vj.kind() {
        VehicleJourneyKind::Discrete => (first, last),
        VehicleJourneyKind::Frequency(frequency) => {
            let start = frequency.start_time().total_seconds();
            (start + first, start + frequency.last_run_offset() + last)
        }
    }
}

fn skip_stops(
    schedule: &mut Schedule,
    meta_vehicle_journey: MetaVehicleJourneyIdx,
    level: RealTimeLevel,
    stop_points: &BTreeSet<StopPointIdx>,
    periods: &[TimePeriod],
    impact: &Impact,
    changes: &mut Changes,
) {
    let periods = match TimePeriods::new(periods) {
        Some(periods) => periods,
        None => return,
    };
    for vj_idx in all_vehicle_journeys(schedule, meta_vehicle_journey) {
        let vj = match schedule.vehicle_journey(vj_idx) {
            Some(vj) => vj,
            None => continue,
        };
        let skipped: Vec<&StopTime> = vj
            .stop_times()
            .iter()
            .filter(|stop_time| stop_points.contains(&stop_time.stop_point()))
            .collect();
        if skipped.is_empty() {
            continue;
        }

        // for each level, the days on which one of the skipped stops is served
        // during the application periods
        let mut concerned: [Vec<DaysSinceDatasetStart>; NB_OF_REAL_TIME_LEVELS] = Default::default();
        for level in level.and_above() {
            let mut days: BTreeSet<DaysSinceDatasetStart> = BTreeSet::new();
            for stop_time in &skipped {
                let interval = stop_time_interval(vj, stop_time);
                days.extend(days_intersecting(schedule, vj, level, &periods, interval));
            }
            concerned[level.as_index()] = days.into_iter().collect();
        }
        if concerned.iter().all(Vec::is_empty) {
            continue;
        }

        let remaining: Vec<NewStopTime> = vj
            .stop_times()
            .iter()
            .filter(|stop_time| !stop_points.contains(&stop_time.stop_point()))
            .map(NewStopTime::from)
            .collect();
        let derived = if remaining.is_empty() {
            None
        } else {
            let empty = schedule.validity_patterns().empty();
            let patterns: Vec<ValidityPattern> = concerned
                .iter()
                .map(|days| {
                    let mut pattern = ValidityPattern::for_calendar(schedule.calendar());
                    days.iter().for_each(|day| pattern.add(day));
                    pattern
                })
                .collect();
            let theoretical = match vj.realtime_level() {
                RealTimeLevel::Base => Some(vj_idx),
                _ => vj.theoretical_vehicle_journey(),
            };
            Some((
                NewVehicleJourney {
                    uri: derived_uri(schedule, meta_vehicle_journey, level, impact),
                    meta_vehicle_journey,
                    route: vj.route(),
                    realtime_level: level,
                    validity_patterns: [empty; NB_OF_REAL_TIME_LEVELS],
                    stop_times: remaining,
                    kind: vj.kind().clone(),
                    shift: vj.shift(),
                    theoretical_vehicle_journey: theoretical,
                    company: vj.company(),
                    physical_mode: vj.physical_mode(),
                    dataset: vj.dataset(),
                    headsign: vj.headsign().to_string(),
                    properties: *vj.properties(),
                },
                patterns,
            ))
        };

        for level in level.and_above() {
            remove_days(schedule, vj_idx, level, &concerned[level.as_index()], changes);
        }
        if let Some((new_vj, patterns)) = derived {
            let mut validity_patterns = new_vj.validity_patterns;
            for (slot, pattern) in validity_patterns.iter_mut().zip(patterns) {
                if !pattern.is_empty() {
                    *slot = schedule.insert_validity_pattern(pattern);
                }
            }
            let uri = new_vj.uri.clone();
            let derived_idx = schedule.add_vehicle_journey(NewVehicleJourney {
                validity_patterns,
                ..new_vj
            });
            if let Some(derived_vj) = schedule.vehicle_journey(derived_idx) {
                let days = concerned.iter().flatten().copied();
                changes.add_reached_days(derived_vj, days);
            }
            changes.trip_set_changed = true;
            debug!("Created vehicle journey {} skipping {} stops", uri, stop_points.len());
        }
    }
}

fn derived_uri(
    schedule: &Schedule,
    meta_vehicle_journey: MetaVehicleJourneyIdx,
    level: RealTimeLevel,
    impact: &Impact,
) -> String {
    format!(
        "{}:{}:{}:{}",
        schedule.meta_vehicle_journey(meta_vehicle_journey).uri(),
        level,
        schedule.nb_of_created_vehicle_journeys(),
        impact.uri
    )
}

// the object named in the trip update if it exists,
// then the one of the base vehicle journey, then any one
fn explicit_or_fallback<Idx: Copy>(
    kind: &str,
    explicit: Option<&str>,
    lookup: impl Fn(&str) -> Option<Idx>,
    base: Option<Idx>,
    any: Option<Idx>,
) -> Option<Idx> {
    if let Some(uri) = explicit {
        match lookup(uri) {
            Some(idx) => return Some(idx),
            None => warn!("Unknown {} {} in trip update, using a fallback", kind, uri),
        }
    }
    base.or(any)
}

fn additional_service_route(schedule: &mut Schedule) -> RouteIdx {
    warn!(
        "No route given for an additional service, using {}",
        ADDITIONAL_SERVICE_ROUTE_ID
    );
    let network = schedule.add_network(ADDITIONAL_SERVICE_NETWORK_ID, ADDITIONAL_SERVICE_NETWORK_ID);
    let line = schedule.add_line(ADDITIONAL_SERVICE_LINE_ID, ADDITIONAL_SERVICE_LINE_ID, network);
    schedule.add_route(ADDITIONAL_SERVICE_ROUTE_ID, ADDITIONAL_SERVICE_ROUTE_ID, line)
}

fn replace(
    schedule: &mut Schedule,
    meta_vehicle_journey: MetaVehicleJourneyIdx,
    impact: &Impact,
    trip: ReplaceTrip,
    changes: &mut Changes,
) {
    let day = match trip.circulation_day.checked_add(trip.shift) {
        Some(day) if day.days() < schedule.calendar().nb_of_days() => day,
        _ => {
            warn!(
                "Trip update of {} by impact {} is outside of the production period",
                schedule.meta_vehicle_journey(meta_vehicle_journey).uri(),
                impact.uri
            );
            return;
        }
    };

    let base_idx = schedule
        .meta_vehicle_journey(meta_vehicle_journey)
        .base_vehicle_journey();
    let base = base_idx.and_then(|idx| schedule.vehicle_journey(idx));

    let route: Option<RouteIdx> = trip.route.or_else(|| base.map(VehicleJourney::route));
    let company: Option<CompanyIdx> = explicit_or_fallback(
        "company",
        trip.company.as_deref(),
        |uri| schedule.company_idx(uri),
        base.map(VehicleJourney::company),
        (!schedule.companies.is_empty()).then(|| CompanyIdx { idx: 0 }),
    );
    let physical_mode: Option<PhysicalModeIdx> = explicit_or_fallback(
        "physical mode",
        trip.physical_mode.as_deref(),
        |uri| schedule.physical_mode_idx(uri),
        base.map(VehicleJourney::physical_mode),
        (!schedule.physical_modes.is_empty()).then(|| PhysicalModeIdx { idx: 0 }),
    );
    let dataset: Option<DatasetIdx> = explicit_or_fallback(
        "dataset",
        trip.dataset.as_deref(),
        |uri| schedule.dataset_idx(uri),
        base.map(VehicleJourney::dataset),
        (!schedule.datasets.is_empty()).then(|| DatasetIdx { idx: 0 }),
    );
    let headsign = trip
        .headsign
        .or_else(|| base.map(|vj| vj.headsign().to_string()))
        .unwrap_or_else(|| {
            schedule
                .meta_vehicle_journey(meta_vehicle_journey)
                .uri()
                .to_string()
        });
    let properties = base
        .map(|vj| *vj.properties())
        .unwrap_or_else(VehicleProperties::none);

    let route = route.unwrap_or_else(|| additional_service_route(schedule));
    let company = company.unwrap_or_else(|| {
        warn!("No company available, creating {}", DEFAULT_COMPANY_ID);
        schedule.add_company(DEFAULT_COMPANY_ID, DEFAULT_COMPANY_ID)
    });
    let physical_mode = physical_mode.unwrap_or_else(|| {
        warn!("No physical mode available, creating {}", DEFAULT_PHYSICAL_MODE_ID);
        schedule.add_physical_mode(DEFAULT_PHYSICAL_MODE_ID, DEFAULT_PHYSICAL_MODE_ID)
    });
    let dataset = dataset.unwrap_or_else(|| {
        warn!("No dataset available, creating {}", DEFAULT_DATASET_ID);
        schedule.add_dataset(DEFAULT_DATASET_ID)
    });

    let mut pattern = ValidityPattern::for_calendar(schedule.calendar());
    pattern.add(&day);
    let empty: ValidityPatternIdx = schedule.validity_patterns().empty();
    let pattern = schedule.insert_validity_pattern(pattern);
    let mut validity_patterns = [empty; NB_OF_REAL_TIME_LEVELS];
    validity_patterns[RealTimeLevel::RealTime.as_index()] = pattern;

    let uri = derived_uri(schedule, meta_vehicle_journey, RealTimeLevel::RealTime, impact);
    let vj_idx = schedule.add_vehicle_journey(NewVehicleJourney {
        uri: uri.clone(),
        meta_vehicle_journey,
        route,
        realtime_level: RealTimeLevel::RealTime,
        validity_patterns,
        stop_times: trip.stop_times,
        kind: VehicleJourneyKind::Discrete,
        shift: trip.shift,
        theoretical_vehicle_journey: base_idx,
        company,
        physical_mode,
        dataset,
        headsign,
        properties,
    });
    if let Some(vj) = schedule.vehicle_journey(vj_idx) {
        changes.add_reached_days(vj, [day]);
    }
    changes.trip_set_changed = true;
    debug!("Created real time vehicle journey {}", uri);
}

/// Vehicle journeys created by impacts that no longer run on any day
fn remove_unused_vehicle_journeys(
    schedule: &mut Schedule,
    meta_vehicle_journey: MetaVehicleJourneyIdx,
    changes: &mut Changes,
) {
    let empty = schedule.validity_patterns().empty();
    let unused: Vec<VehicleJourneyIdx> = all_vehicle_journeys(schedule, meta_vehicle_journey)
        .into_iter()
        .filter(|idx| {
            schedule
                .vehicle_journey(*idx)
                .map(|vj| {
                    vj.realtime_level() != RealTimeLevel::Base
                        && RealTimeLevel::all()
                            .iter()
                            .all(|level| vj.validity_pattern_idx(*level) == empty)
                })
                .unwrap_or(false)
        })
        .collect();
    for idx in unused {
        schedule.remove_vehicle_journey(idx);
        changes.trip_set_changed = true;
    }
}
