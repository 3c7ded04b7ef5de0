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

//! Counters about the life of the data.
//!
//! A `Metrics` owns its own prometheus registry and is given to every entry
//! point that updates something worth counting, so that several `Data` can
//! be observed independently. The surrounding service decides how to expose
//! `Metrics::registry()`.

use prometheus::{IntCounter, Registry};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    applied_disruptions: IntCounter,
    rejected_disruptions: IntCounter,
    deleted_disruptions: IntCounter,
    index_rebuilds: IntCounter,
}

/// Values of the counters at some instant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub nb_of_applied_disruptions: u64,
    pub nb_of_rejected_disruptions: u64,
    pub nb_of_deleted_disruptions: u64,
    pub nb_of_index_rebuilds: u64,
    pub nb_of_cache_hits: u64,
    pub nb_of_cache_misses: u64,
}

fn create_counter(
    registry: &Registry,
    name: &str,
    help: &str,
) -> Result<IntCounter, prometheus::Error> {
    let counter = IntCounter::new(name, help)?;
    registry.register(Box::new(counter.clone()))?;
    Ok(counter)
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("rt_schedule".to_string()), None)?;
        let applied_disruptions = create_counter(
            &registry,
            "applied_disruptions",
            "Number of disruptions applied on the schedule",
        )?;
        let rejected_disruptions = create_counter(
            &registry,
            "rejected_disruptions",
            "Number of disruptions rejected because of an inconsistent impact",
        )?;
        let deleted_disruptions = create_counter(
            &registry,
            "deleted_disruptions",
            "Number of disruptions deleted from the schedule",
        )?;
        let index_rebuilds = create_counter(
            &registry,
            "index_rebuilds",
            "Number of rebuilds of the next stop time index",
        )?;
        Ok(Self {
            registry,
            applied_disruptions,
            rejected_disruptions,
            deleted_disruptions,
            index_rebuilds,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub(crate) fn record_applied_disruption(&self) {
        self.applied_disruptions.inc();
    }

    pub(crate) fn record_rejected_disruption(&self) {
        self.rejected_disruptions.inc();
    }

    pub(crate) fn record_deleted_disruption(&self) {
        self.deleted_disruptions.inc();
    }

    pub(crate) fn record_index_rebuild(&self) {
        self.index_rebuilds.inc();
    }

    pub fn nb_of_applied_disruptions(&self) -> u64 {
        self.applied_disruptions.get()
    }

    pub fn nb_of_rejected_disruptions(&self) -> u64 {
        self.rejected_disruptions.get()
    }

    pub fn nb_of_deleted_disruptions(&self) -> u64 {
        self.deleted_disruptions.get()
    }

    pub fn nb_of_index_rebuilds(&self) -> u64 {
        self.index_rebuilds.get()
    }
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics")
            .field("applied_disruptions", &self.nb_of_applied_disruptions())
            .field("rejected_disruptions", &self.nb_of_rejected_disruptions())
            .field("deleted_disruptions", &self.nb_of_deleted_disruptions())
            .field("index_rebuilds", &self.nb_of_index_rebuilds())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_are_gathered_by_the_registry() {
        let metrics = Metrics::new().unwrap();
        metrics.record_applied_disruption();
        metrics.record_applied_disruption();
        metrics.record_index_rebuild();
        assert_eq!(metrics.nb_of_applied_disruptions(), 2);
        assert_eq!(metrics.nb_of_deleted_disruptions(), 0);

        let families = metrics.registry().gather();
        let applied = families
            .iter()
            .find(|family| family.get_name() == "rt_schedule_applied_disruptions")
            .unwrap();
        assert_eq!(applied.get_metric()[0].get_counter().get_value(), 2.0);
    }
}
