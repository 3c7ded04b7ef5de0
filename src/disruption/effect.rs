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

//! Effect of an impact carrying a trip update.
//!
//! Feeds may give an explicit effect, or leave it unknown and only give
//! a status for each stop time. When the explicit effect is known, it is used.
//! Otherwise the effect is inferred from the most important stop time status.

use super::{Effect, Impact, TripUpdate};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StopTimeStatus {
    #[default]
    Unchanged,
    Delayed,
    Added,
    Deleted,
    AddedForDetour,
    DeletedForDetour,
}

impl StopTimeStatus {
    pub fn is_deleted(&self) -> bool {
        matches!(
            self,
            StopTimeStatus::Deleted | StopTimeStatus::DeletedForDetour
        )
    }

    fn importance(&self) -> u8 {
        use StopTimeStatus::*;
        match self {
            Unchanged => 0,
            Delayed => 1,
            Added => 2,
            Deleted => 3,
            AddedForDetour | DeletedForDetour => 4,
        }
    }
}

/// The effect implied by the stop time statuses of a trip update
pub fn infer_effect(trip_update: &TripUpdate) -> Effect {
    if trip_update.stop_time_updates.is_empty()
        || trip_update
            .stop_time_updates
            .iter()
            .all(|update| update.is_deleted())
    {
        return Effect::NoService;
    }
    let most_important = trip_update
        .stop_time_updates
        .iter()
        .flat_map(|update| [update.arrival_status, update.departure_status])
        .max_by_key(StopTimeStatus::importance)
        .unwrap_or_default();
    use StopTimeStatus::*;
    match most_important {
        Unchanged | Delayed => Effect::SignificantDelays,
        Added => Effect::ModifiedService,
        Deleted => Effect::ReducedService,
        AddedForDetour | DeletedForDetour => Effect::Detour,
    }
}

/// The effect used to apply the impact
pub fn resolve_effect(impact: &Impact) -> Effect {
    let explicit = impact.severity.effect;
    let trip_update = match &impact.trip_update {
        Some(trip_update) => trip_update,
        None => return explicit,
    };
    let inferred = infer_effect(trip_update);
    if explicit == Effect::UnknownEffect {
        return inferred;
    }
    let compatible = explicit == inferred
        || matches!(
            (explicit, inferred),
            (Effect::AdditionalService, _) | (Effect::OtherEffect, _) | (Effect::StopMoved, _)
        );
    if !compatible {
        warn!(
            "Impact {} : effect {:?} given by the feed differs from effect {:?} implied by its stop times. Using {:?}.",
            impact.uri, explicit, inferred, explicit
        );
    }
    explicit
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disruption::StopTimeUpdate;
    use chrono::NaiveDate;

    fn update(arrival_status: StopTimeStatus, departure_status: StopTimeStatus) -> StopTimeUpdate {
        let datetime = NaiveDate::from_ymd_opt(2020, 1, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        StopTimeUpdate {
            stop_point: "A".to_string(),
            arrival_time: datetime,
            departure_time: datetime,
            arrival_status,
            departure_status,
        }
    }

    fn trip_update(updates: Vec<StopTimeUpdate>) -> TripUpdate {
        TripUpdate {
            circulation_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            stop_time_updates: updates,
            company: None,
            physical_mode: None,
            dataset: None,
            headsign: None,
            route: None,
        }
    }

    #[test]
    fn most_important_status_gives_the_effect() {
        use StopTimeStatus::*;
        let delayed = trip_update(vec![update(Unchanged, Delayed), update(Delayed, Unchanged)]);
        assert_eq!(infer_effect(&delayed), Effect::SignificantDelays);

        let reduced = trip_update(vec![update(Delayed, Delayed), update(Deleted, Deleted)]);
        assert_eq!(infer_effect(&reduced), Effect::ReducedService);

        let detour = trip_update(vec![update(Added, Added), update(DeletedForDetour, Unchanged)]);
        assert_eq!(infer_effect(&detour), Effect::Detour);

        let added = trip_update(vec![update(Unchanged, Unchanged), update(Added, Added)]);
        assert_eq!(infer_effect(&added), Effect::ModifiedService);
    }

    #[test]
    fn all_stops_deleted_means_no_service() {
        use StopTimeStatus::*;
        let deleted = trip_update(vec![update(Deleted, Deleted), update(DeletedForDetour, Deleted)]);
        assert_eq!(infer_effect(&deleted), Effect::NoService);
        assert_eq!(infer_effect(&trip_update(vec![])), Effect::NoService);
    }
}
