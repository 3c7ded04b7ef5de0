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

//! Rebuilding a meta vehicle journey after one of its impacts is removed.
//!
//! Impacts on a trip are not commutative (a trip update replaces the
//! stop times, a later cancellation removes them). So instead of undoing an
//! impact, the trip is reset to its base schedule and the remaining impacts
//! are applied again, ordered by their update time.

use super::apply::all_vehicle_journeys;
use super::{apply_impact, plan_impact, Changes, Impact};
use crate::models::{MetaVehicleJourneyIdx, RealTimeLevel, Schedule};
use std::sync::Arc;
use tracing::{debug, warn};

pub(crate) fn reset_and_reapply(
    schedule: &mut Schedule,
    meta_vehicle_journeys: impl IntoIterator<Item = MetaVehicleJourneyIdx>,
    changes: &mut Changes,
) {
    for meta_vehicle_journey in meta_vehicle_journeys {
        reset(schedule, meta_vehicle_journey, changes);

        let mvj = schedule.meta_vehicle_journey_mut(meta_vehicle_journey);
        let mut impacts: Vec<Arc<Impact>> = mvj.modified_by();
        // registered again when applied
        mvj.modified_by.clear();
        impacts.sort_by(|lhs, rhs| {
            lhs.updated_at
                .cmp(&rhs.updated_at)
                .then_with(|| lhs.uri.cmp(&rhs.uri))
        });
        debug!(
            "Applying again {} impacts on {}",
            impacts.len(),
            schedule.meta_vehicle_journey(meta_vehicle_journey).uri()
        );

        for impact in impacts {
            match plan_impact(schedule, &impact) {
                Ok(plan) => apply_impact(
                    schedule,
                    &impact,
                    plan.restricted_to(meta_vehicle_journey),
                    changes,
                ),
                Err(err) => warn!(
                    "Impact {} can no longer be applied on {} : {}",
                    impact.uri,
                    schedule.meta_vehicle_journey(meta_vehicle_journey).uri(),
                    err
                ),
            }
        }
        changes.meta_vehicle_journeys.insert(meta_vehicle_journey);
    }
}

// Back to the base schedule : vehicle journeys created by impacts are removed,
// and the base vehicle journey runs on its base days at every level.
fn reset(
    schedule: &mut Schedule,
    meta_vehicle_journey: MetaVehicleJourneyIdx,
    changes: &mut Changes,
) {
    for vj_idx in all_vehicle_journeys(schedule, meta_vehicle_journey) {
        let vj = match schedule.vehicle_journey(vj_idx) {
            Some(vj) => vj,
            None => continue,
        };
        if vj.realtime_level() != RealTimeLevel::Base {
            for level in RealTimeLevel::all() {
                changes.add_reached_days(vj, schedule.validity_pattern(vj, level).days());
            }
            schedule.remove_vehicle_journey(vj_idx);
            changes.trip_set_changed = true;
            continue;
        }

        let base_idx = vj.validity_pattern_idx(RealTimeLevel::Base);
        let base = schedule.validity_patterns().get(&base_idx);
        let mut reset_levels = Vec::new();
        for level in [RealTimeLevel::Adapted, RealTimeLevel::RealTime] {
            let current_idx = vj.validity_pattern_idx(level);
            if current_idx == base_idx {
                continue;
            }
            let current = schedule.validity_patterns().get(&current_idx);
            changes.days.extend(
                base.days()
                    .chain(current.days())
                    .filter(|day| base.check(day) != current.check(day)),
            );
            reset_levels.push(level);
        }
        if let Some(vj) = schedule.vehicle_journey_mut(vj_idx) {
            for level in reset_levels {
                vj.validity_patterns[level.as_index()] = base_idx;
            }
        }
    }
}
