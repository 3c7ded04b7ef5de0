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

//! Materialized stop times of a two days window.
//!
//! A `CachedNextStopTime` holds, for each journey pattern point, every stop time
//! happening in `[day, day + 2)` that is usable with a given real time level and
//! accessibility, sorted by datetime. Frequency vehicle journeys are expanded
//! into one entry per run.
//! Entries are built on demand and kept in a least recently used cache.

use super::NextStopTime;
use crate::config::CacheParams;
use crate::models::{
    AccessibilityParams, JourneyPatternPointIdx, RealTimeLevel, Schedule, StopEvent,
    StopTimeIdx, VehicleJourneyKind,
};
use crate::time::{
    DaysSinceDatasetStart, SecondsSinceDatasetStart, SECONDS_PER_DAY,
};
use moka::policy::EvictionPolicy;
use moka::sync::Cache;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

pub const CACHE_WINDOW_DAYS: u16 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub day: DaysSinceDatasetStart,
    pub real_time_level: RealTimeLevel,
    pub accessibility: AccessibilityParams,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachedStopTime {
    pub datetime: SecondsSinceDatasetStart,
    pub stop_time: StopTimeIdx,
    pub is_frequency: bool,
    // the day the vehicle journey started its run
    pub circulation_day: DaysSinceDatasetStart,
    // earliest time of the vehicle journey, used to order simultaneous stop times
    earliest_time: u32,
}

#[derive(Debug)]
pub struct CachedNextStopTime {
    key: CacheKey,
    // first circulation day whose vehicle journeys were looked at
    first_circulation_day: DaysSinceDatasetStart,
    window_start: SecondsSinceDatasetStart,
    // last second of the window
    window_end: SecondsSinceDatasetStart,
    // indexed by JourneyPatternPointIdx
    departures: Vec<Vec<CachedStopTime>>,
    arrivals: Vec<Vec<CachedStopTime>>,
}

impl CachedNextStopTime {
    pub fn new(schedule: &Schedule, key: &CacheKey) -> Self {
        let nb_of_jpp = schedule.nb_of_journey_pattern_points();
        let mut departures = vec![Vec::new(); nb_of_jpp];
        let mut arrivals = vec![Vec::new(); nb_of_jpp];

        let window_start = SecondsSinceDatasetStart::start_of_day(&key.day);
        let last_day = key
            .day
            .checked_add(CACHE_WINDOW_DAYS - 1)
            .unwrap_or(key.day);
        let window_end = SecondsSinceDatasetStart::end_of_day(&last_day);
        let mut first_circulation_day = key.day;

        for (vj_idx, vj) in schedule.vehicle_journeys() {
            if !vj.accessible(&key.accessibility.vehicle) {
                continue;
            }
            let pattern = schedule.validity_pattern(vj, key.real_time_level);
            let earliest_time = vj.earliest_time();
            let reach_days = vj.reach_days();
            let mut circulation_day = key.day.saturating_sub(reach_days);
            first_circulation_day = std::cmp::min(first_circulation_day, circulation_day);

            while circulation_day <= last_day {
                if pattern.check(&circulation_day) {
                    let day_start = u64::from(circulation_day.days()) * u64::from(SECONDS_PER_DAY);
                    for (order, stop_time) in vj.stop_times().iter().enumerate() {
                        let stop_point = schedule.stop_point(stop_time.stop_point());
                        if !stop_point.properties.contains(&key.accessibility.stop_point) {
                            continue;
                        }
                        let jpp = stop_time.journey_pattern_point().idx;
                        let stop_time_idx = StopTimeIdx {
                            vehicle_journey: vj_idx,
                            order: order as u16,
                        };
                        for (stop_event, entries) in [
                            (StopEvent::PickUp, &mut departures[jpp]),
                            (StopEvent::DropOff, &mut arrivals[jpp]),
                        ] {
                            if !stop_time.allows(stop_event) {
                                continue;
                            }
                            let offset = stop_time.time_of(stop_event).total_seconds();
                            let times: Vec<u32> = match vj.kind() {
                                VehicleJourneyKind::Discrete => vec![offset],
                                VehicleJourneyKind::Frequency(frequency) => frequency.runs(offset).collect(),
                            };
                            for time in times {
                                let seconds = day_start + u64::from(time);
                                let datetime = match SecondsSinceDatasetStart::from_i64(seconds as i64) {
                                    Some(datetime) => datetime,
                                    None => continue,
                                };
                                if window_start <= datetime && datetime <= window_end {
                                    entries.push(CachedStopTime {
                                        datetime,
                                        stop_time: stop_time_idx,
                                        is_frequency: vj.is_frequency(),
                                        circulation_day,
                                        earliest_time,
                                    });
                                }
                            }
                        }
                    }
                }
                circulation_day = match circulation_day.succ() {
                    Some(day) => day,
                    None => break,
                };
            }
        }

        let sort = |entries: &mut Vec<CachedStopTime>| {
            entries.sort_unstable_by_key(|entry| {
                (
                    entry.datetime,
                    entry.is_frequency,
                    entry.earliest_time,
                    entry.stop_time.vehicle_journey,
                )
            })
        };
        departures.iter_mut().for_each(sort);
        arrivals.iter_mut().for_each(sort);

        Self {
            key: *key,
            first_circulation_day,
            window_start,
            window_end,
            departures,
            arrivals,
        }
    }

    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    pub fn window_start(&self) -> SecondsSinceDatasetStart {
        self.window_start
    }

    pub fn window_end(&self) -> SecondsSinceDatasetStart {
        self.window_end
    }

    pub fn contains(&self, datetime: &SecondsSinceDatasetStart) -> bool {
        self.window_start <= *datetime && *datetime <= self.window_end
    }

    /// Does a change of the vehicle journeys running on `circulation_day`
    /// modify this entry ?
    pub fn depends_on(&self, circulation_day: &DaysSinceDatasetStart) -> bool {
        let last_day = self
            .key
            .day
            .checked_add(CACHE_WINDOW_DAYS - 1)
            .unwrap_or(self.key.day);
        self.first_circulation_day <= *circulation_day && *circulation_day <= last_day
    }

    /// Stop times of the window at the journey pattern point, sorted by datetime
    pub fn stop_times(&self, stop_event: StopEvent, jpp: JourneyPatternPointIdx) -> &[CachedStopTime] {
        let entries = match stop_event {
            StopEvent::PickUp => self.departures.get(jpp.idx),
            StopEvent::DropOff => self.arrivals.get(jpp.idx),
        };
        entries.map(Vec::as_slice).unwrap_or(&[])
    }

    /// Stop times happening in `[from, until)`
    pub fn stop_times_between(
        &self,
        stop_event: StopEvent,
        jpp: JourneyPatternPointIdx,
        from: &SecondsSinceDatasetStart,
        until: &SecondsSinceDatasetStart,
    ) -> &[CachedStopTime] {
        let entries = self.stop_times(stop_event, jpp);
        let begin = entries.partition_point(|entry| entry.datetime < *from);
        let end = entries.partition_point(|entry| entry.datetime < *until);
        if begin >= end {
            &[]
        } else {
            &entries[begin..end]
        }
    }

    /// Same as `NextStopTimeData::earliest_stop_time()`, restricted to the window
    pub fn earliest_stop_time(
        &self,
        stop_event: StopEvent,
        jpp: JourneyPatternPointIdx,
        datetime: &SecondsSinceDatasetStart,
        bound: Option<SecondsSinceDatasetStart>,
    ) -> NextStopTime {
        let bound = bound
            .map(|bound| std::cmp::min(bound, self.window_end))
            .unwrap_or(self.window_end);
        let entries = self.stop_times(stop_event, jpp);
        let idx = entries.partition_point(|entry| entry.datetime < *datetime);
        match entries.get(idx) {
            Some(entry) if entry.datetime <= bound => {
                NextStopTime::found(entry.stop_time, entry.datetime)
            }
            _ => NextStopTime::not_found(),
        }
    }

    /// Same as `NextStopTimeData::tardiest_stop_time()`, restricted to the window
    pub fn tardiest_stop_time(
        &self,
        stop_event: StopEvent,
        jpp: JourneyPatternPointIdx,
        datetime: &SecondsSinceDatasetStart,
        bound: Option<SecondsSinceDatasetStart>,
    ) -> NextStopTime {
        let bound = bound
            .map(|bound| std::cmp::max(bound, self.window_start))
            .unwrap_or(self.window_start);
        let entries = self.stop_times(stop_event, jpp);
        let end = entries.partition_point(|entry| entry.datetime <= *datetime);
        let last = match end.checked_sub(1).and_then(|idx| entries.get(idx)) {
            Some(last) if last.datetime >= bound => last,
            _ => return NextStopTime::not_found(),
        };
        // among simultaneous stop times, discrete ones are preferred
        let begin = entries.partition_point(|entry| entry.datetime < last.datetime);
        let chosen = entries[begin..end]
            .iter()
            .rev()
            .find(|entry| !entry.is_frequency)
            .unwrap_or(last);
        NextStopTime::found(chosen.stop_time, chosen.datetime)
    }
}

/// Least recently used cache of `CachedNextStopTime`
pub struct CachedNextStopTimeManager {
    cache: Cache<CacheKey, Arc<CachedNextStopTime>>,
    nb_of_hits: AtomicU64,
    nb_of_misses: AtomicU64,
}

impl CachedNextStopTimeManager {
    pub fn new(params: &CacheParams) -> Self {
        let cache = Cache::builder()
            .max_capacity(params.cache_size)
            .eviction_policy(EvictionPolicy::lru())
            .build();
        Self {
            cache,
            nb_of_hits: AtomicU64::new(0),
            nb_of_misses: AtomicU64::new(0),
        }
    }

    /// The entry of `key`, built from `schedule` if not cached
    pub fn load(&self, schedule: &Schedule, key: &CacheKey) -> Arc<CachedNextStopTime> {
        let entry = self
            .cache
            .entry(*key)
            .or_insert_with(|| Arc::new(CachedNextStopTime::new(schedule, key)));
        if entry.is_fresh() {
            self.nb_of_misses.fetch_add(1, Ordering::Relaxed);
            trace!("Next stop time cache miss for day {}", key.day.days());
        } else {
            self.nb_of_hits.fetch_add(1, Ordering::Relaxed);
        }
        entry.into_value()
    }

    pub fn nb_of_hits(&self) -> u64 {
        self.nb_of_hits.load(Ordering::Relaxed)
    }

    pub fn nb_of_misses(&self) -> u64 {
        self.nb_of_misses.load(Ordering::Relaxed)
    }

    pub fn entry_count(&self) -> u64 {
        self.cache.run_pending_tasks();
        self.cache.entry_count()
    }

    /// Drop every entry whose content depends on one of the circulation days
    pub fn invalidate_days<Days>(&self, circulation_days: Days)
    where
        Days: IntoIterator<Item = DaysSinceDatasetStart>,
    {
        let circulation_days: BTreeSet<DaysSinceDatasetStart> = circulation_days.into_iter().collect();
        if circulation_days.is_empty() {
            return;
        }
        let to_invalidate: Vec<CacheKey> = self
            .cache
            .iter()
            .filter(|(_, entry)| {
                circulation_days
                    .iter()
                    .any(|day| entry.depends_on(day))
            })
            .map(|(key, _)| *key)
            .collect();
        for key in &to_invalidate {
            self.cache.invalidate(key);
        }
        debug!(
            "Invalidated {} next stop time cache entries",
            to_invalidate.len()
        );
    }

    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }
}

impl std::fmt::Debug for CachedNextStopTimeManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedNextStopTimeManager")
            .field("nb_of_hits", &self.nb_of_hits())
            .field("nb_of_misses", &self.nb_of_misses())
            .finish()
    }
}
