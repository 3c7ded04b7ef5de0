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

//! A `Data` shared between one writer and many readers.
//!
//! Readers hold the read lock for the duration of a query, so a query always
//! sees a consistent schedule. The writer takes the write lock to apply or
//! delete a disruption : the index and the cache are brought up to date
//! before the lock is released.

use crate::data::Data;
use crate::disruption::{Disruption, DisruptionError};
use crate::metrics::{Metrics, MetricsSnapshot};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, thiserror::Error)]
pub enum SharedDataError {
    #[error("data lock is poisoned")]
    PoisonedLock,
    #[error(transparent)]
    Disruption(#[from] DisruptionError),
    #[error("cannot create the metrics")]
    Metrics(#[from] prometheus::Error),
}

#[derive(Debug, Clone)]
pub struct SharedData {
    data: Arc<RwLock<Data>>,
    metrics: Arc<Metrics>,
}

impl SharedData {
    pub fn new(data: Data) -> Result<Self, SharedDataError> {
        Ok(Self {
            data: Arc::new(RwLock::new(data)),
            metrics: Arc::new(Metrics::new()?),
        })
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn read(&self) -> Result<RwLockReadGuard<'_, Data>, SharedDataError> {
        self.data.read().map_err(|_| SharedDataError::PoisonedLock)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Data>, SharedDataError> {
        self.data.write().map_err(|_| SharedDataError::PoisonedLock)
    }

    /// Run `query` on the current data
    pub fn with_data<T, F>(&self, query: F) -> Result<T, SharedDataError>
    where
        F: FnOnce(&Data) -> T,
    {
        let data = self.read()?;
        Ok(query(&data))
    }

    pub fn apply_disruption(&self, disruption: Disruption) -> Result<(), SharedDataError> {
        let mut data = self.write()?;
        data.apply_disruption(disruption, &self.metrics)?;
        Ok(())
    }

    pub fn delete_disruption(&self, id: &str) -> Result<(), SharedDataError> {
        let mut data = self.write()?;
        data.delete_disruption(id, &self.metrics)?;
        Ok(())
    }

    pub fn metrics_snapshot(&self) -> Result<MetricsSnapshot, SharedDataError> {
        let data = self.read()?;
        Ok(data.metrics_snapshot(&self.metrics))
    }
}
