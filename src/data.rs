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

//! Everything needed to answer a query : the schedule, its index,
//! the cache of dense windows and the disruptions applied to the schedule.

use crate::config::{CacheParams, SearchParams};
use crate::disruption::{
    apply_impact, plan_impact, reset_and_reapply, Changes, Disruption, DisruptionError,
    DisruptionHolder, Impact,
};
use crate::metrics::{Metrics, MetricsSnapshot};
use crate::models::{
    LineIdx, MetaVehicleJourneyIdx, NetworkIdx, RealTimeLevel, RouteIdx, Schedule, StopAreaIdx,
    StopPointIdx,
};
use crate::models::AccessibilityParams;
use crate::next_stop_time::{
    CacheKey, CachedNextStopTime, CachedNextStopTimeManager, NextStopTime, NextStopTimeData,
    StopTimeQuery,
};
use crate::time::{Calendar, DaysSinceDatasetStart};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

#[derive(Debug)]
pub struct Data {
    schedule: Schedule,
    next_stop_time_data: NextStopTimeData,
    cache_manager: CachedNextStopTimeManager,
    disruption_holder: DisruptionHolder,
}

impl Data {
    pub fn new(schedule: Schedule, search_params: SearchParams, cache_params: &CacheParams) -> Self {
        let start = Instant::now();
        let next_stop_time_data = NextStopTimeData::new(&schedule, search_params);
        info!(
            "Next stop time index of {} vehicle journeys built in {} ms",
            schedule.nb_of_vehicle_journeys(),
            start.elapsed().as_millis()
        );
        Self {
            schedule,
            next_stop_time_data,
            cache_manager: CachedNextStopTimeManager::new(cache_params),
            disruption_holder: DisruptionHolder::new(),
        }
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn calendar(&self) -> &Calendar {
        self.schedule.calendar()
    }

    pub fn next_stop_time_data(&self) -> &NextStopTimeData {
        &self.next_stop_time_data
    }

    pub fn cache_manager(&self) -> &CachedNextStopTimeManager {
        &self.cache_manager
    }

    pub fn disruption_holder(&self) -> &DisruptionHolder {
        &self.disruption_holder
    }

    pub fn metrics_snapshot(&self, metrics: &Metrics) -> MetricsSnapshot {
        MetricsSnapshot {
            nb_of_applied_disruptions: metrics.nb_of_applied_disruptions(),
            nb_of_rejected_disruptions: metrics.nb_of_rejected_disruptions(),
            nb_of_deleted_disruptions: metrics.nb_of_deleted_disruptions(),
            nb_of_index_rebuilds: metrics.nb_of_index_rebuilds(),
            nb_of_cache_hits: self.cache_manager.nb_of_hits(),
            nb_of_cache_misses: self.cache_manager.nb_of_misses(),
        }
    }

    pub fn earliest_stop_time(&self, query: &StopTimeQuery) -> NextStopTime {
        self.next_stop_time_data
            .earliest_stop_time(&self.schedule, query)
    }

    pub fn tardiest_stop_time(&self, query: &StopTimeQuery) -> NextStopTime {
        self.next_stop_time_data
            .tardiest_stop_time(&self.schedule, query)
    }

    pub fn cached_next_stop_time(
        &self,
        day: DaysSinceDatasetStart,
        real_time_level: RealTimeLevel,
        accessibility: AccessibilityParams,
    ) -> Arc<CachedNextStopTime> {
        let key = CacheKey {
            day,
            real_time_level,
            accessibility,
        };
        self.cache_manager.load(&self.schedule, &key)
    }

    /// Same result as `earliest_stop_time()`, answered from the cached window
    /// of the requested day when the search does not go beyond it.
    pub fn cached_earliest_stop_time(&self, query: &StopTimeQuery) -> NextStopTime {
        if !query.check_frequency {
            return self.earliest_stop_time(query);
        }
        let cached = self.cached_next_stop_time(
            query.datetime.day(),
            query.real_time_level,
            query.accessibility,
        );
        let bound = query
            .bound
            .unwrap_or_else(|| self.next_stop_time_data.default_forward_bound(&query.datetime));
        let result = cached.earliest_stop_time(
            query.stop_event,
            query.journey_pattern_point,
            &query.datetime,
            Some(bound),
        );
        if result.is_found() || bound <= cached.window_end() {
            result
        } else {
            self.earliest_stop_time(query)
        }
    }

    /// Same result as `tardiest_stop_time()`, answered from the cached window
    /// that ends with the requested day when the search does not go beyond it.
    pub fn cached_tardiest_stop_time(&self, query: &StopTimeQuery) -> NextStopTime {
        if !query.check_frequency {
            return self.tardiest_stop_time(query);
        }
        let cached = self.cached_next_stop_time(
            query.datetime.day().saturating_sub(1),
            query.real_time_level,
            query.accessibility,
        );
        let bound = query
            .bound
            .unwrap_or_else(|| self.next_stop_time_data.default_backward_bound(&query.datetime));
        let result = cached.tardiest_stop_time(
            query.stop_event,
            query.journey_pattern_point,
            &query.datetime,
            Some(bound),
        );
        if result.is_found() || bound >= cached.window_start() {
            result
        } else {
            self.tardiest_stop_time(query)
        }
    }

    /// Apply all the impacts of the disruption, or none of them.
    ///
    /// A disruption with the id of an already applied one replaces it.
    pub fn apply_disruption(
        &mut self,
        disruption: Disruption,
        metrics: &Metrics,
    ) -> Result<(), DisruptionError> {
        let plans = disruption
            .impacts
            .iter()
            .map(|impact| plan_impact(&self.schedule, impact))
            .collect::<Result<Vec<_>, _>>();
        let plans = match plans {
            Ok(plans) => plans,
            Err(err) => {
                warn!(disruption = %disruption.id, error = %err, "Disruption rejected");
                metrics.record_rejected_disruption();
                return Err(err);
            }
        };

        let id = disruption.id.clone();
        let mut changes = Changes::default();
        if self.disruption_holder.contains(&id) {
            debug!("Disruption {} is already applied, replacing it", id);
            self.remove_disruption(&id, &mut changes)?;
        }

        let impacts = self.disruption_holder.insert(disruption);
        for (impact, plan) in impacts.iter().zip(plans) {
            apply_impact(&mut self.schedule, impact, plan, &mut changes);
        }
        // impacts on a trip have to be applied in the order of their update
        let shared: Vec<MetaVehicleJourneyIdx> = changes
            .meta_vehicle_journeys
            .iter()
            .filter(|idx| self.schedule.meta_vehicle_journey(**idx).modified_by().len() > 1)
            .copied()
            .collect();
        reset_and_reapply(&mut self.schedule, shared, &mut changes);

        self.publish(&changes, metrics);
        info!(
            disruption = %id,
            nb_of_entities = changes.meta_vehicle_journeys.len() + changes.nb_of_informed_objects,
            "Disruption applied"
        );
        metrics.record_applied_disruption();
        Ok(())
    }

    pub fn delete_disruption(&mut self, id: &str, metrics: &Metrics) -> Result<(), DisruptionError> {
        let mut changes = Changes::default();
        if let Err(err) = self.remove_disruption(id, &mut changes) {
            warn!(disruption = %id, error = %err, "Cannot delete disruption");
            return Err(err);
        }
        self.publish(&changes, metrics);
        info!(
            disruption = %id,
            nb_of_entities = changes.meta_vehicle_journeys.len(),
            "Disruption deleted"
        );
        metrics.record_deleted_disruption();
        Ok(())
    }

    fn remove_disruption(&mut self, id: &str, changes: &mut Changes) -> Result<(), DisruptionError> {
        let held = self
            .disruption_holder
            .remove(id)
            .ok_or_else(|| DisruptionError::UnknownDisruption(id.to_string()))?;
        let affected: Vec<MetaVehicleJourneyIdx> = self
            .schedule
            .meta_vehicle_journeys()
            .filter(|(_, mvj)| {
                mvj.modified_by.iter().any(|weak| {
                    held.impacts
                        .iter()
                        .any(|impact| std::ptr::eq(weak.as_ptr(), Arc::as_ptr(impact)))
                })
            })
            .map(|(idx, _)| idx)
            .collect();
        drop(held);
        self.schedule.clean_weak_impacts();
        reset_and_reapply(&mut self.schedule, affected, changes);
        Ok(())
    }

    // make the changes visible to the queries
    fn publish(&mut self, changes: &Changes, metrics: &Metrics) {
        if changes.trip_set_changed {
            let start = Instant::now();
            let search_params = self.next_stop_time_data.search_params().clone();
            self.next_stop_time_data = NextStopTimeData::new(&self.schedule, search_params);
            debug!(
                "Next stop time index rebuilt in {} ms",
                start.elapsed().as_millis()
            );
            metrics.record_index_rebuild();
        }
        if !changes.is_empty() {
            self.cache_manager
                .invalidate_days(changes.days.iter().copied());
        }
    }

    pub fn impacts_of_network(&self, idx: NetworkIdx) -> Vec<Arc<Impact>> {
        self.schedule.network(idx).impacts()
    }

    pub fn impacts_of_line(&self, idx: LineIdx) -> Vec<Arc<Impact>> {
        self.schedule.line(idx).impacts()
    }

    pub fn impacts_of_route(&self, idx: RouteIdx) -> Vec<Arc<Impact>> {
        self.schedule.route(idx).impacts()
    }

    pub fn impacts_of_stop_area(&self, idx: StopAreaIdx) -> Vec<Arc<Impact>> {
        self.schedule.stop_area(idx).impacts()
    }

    pub fn impacts_of_stop_point(&self, idx: StopPointIdx) -> Vec<Arc<Impact>> {
        self.schedule.stop_point(idx).impacts()
    }

    /// Impacts that modify the trip or only inform about it
    pub fn impacts_of_meta_vehicle_journey(&self, idx: MetaVehicleJourneyIdx) -> Vec<Arc<Impact>> {
        let mvj = self.schedule.meta_vehicle_journey(idx);
        let mut impacts = mvj.modified_by();
        for impact in mvj.impacted_by() {
            if !impacts.iter().any(|other| Arc::ptr_eq(other, &impact)) {
                impacts.push(impact);
            }
        }
        impacts
    }

    pub fn clean_weak_impacts(&mut self) {
        self.schedule.clean_weak_impacts();
    }
}
