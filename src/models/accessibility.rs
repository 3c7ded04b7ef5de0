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

//! Accessibility properties of vehicles and stop points.
//!
//! A request asks for a set of properties, and an entity satisfies it
//! when it has at least all of them.

macro_rules! properties {
    ($name:ident { $($flag:ident = $bit:expr),* $(,)? }) => {
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
        pub struct $name {
            bits: u8,
        }

        impl $name {
            $(pub const $flag: $name = $name { bits: 1 << $bit };)*

            pub fn none() -> Self {
                Self { bits: 0 }
            }

            pub fn with(self, other: Self) -> Self {
                Self {
                    bits: self.bits | other.bits,
                }
            }

            /// true if `self` has all the properties of `required`
            pub fn contains(&self, required: &Self) -> bool {
                self.bits & required.bits == required.bits
            }
        }
    };
}

properties!(VehicleProperties {
    WHEELCHAIR_ACCESSIBLE = 0,
    BIKE_ACCEPTED = 1,
    AIR_CONDITIONED = 2,
    VISUAL_ANNOUNCEMENT = 3,
    AUDIBLE_ANNOUNCEMENT = 4,
    APPROPRIATE_ESCORT = 5,
    APPROPRIATE_SIGNAGE = 6,
    SCHOOL_VEHICLE = 7,
});

properties!(StopPointProperties {
    WHEELCHAIR_BOARDING = 0,
    SHELTERED = 1,
    ELEVATOR = 2,
    ESCALATOR = 3,
    BIKE_ACCEPTED = 4,
    BIKE_DEPOT = 5,
    VISUAL_ANNOUNCEMENT = 6,
    AUDIBLE_ANNOUNCEMENT = 7,
});

/// What a traveler requires from the stop points and vehicles used
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct AccessibilityParams {
    pub stop_point: StopPointProperties,
    pub vehicle: VehicleProperties,
}

impl AccessibilityParams {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn wheelchair() -> Self {
        Self {
            stop_point: StopPointProperties::WHEELCHAIR_BOARDING,
            vehicle: VehicleProperties::WHEELCHAIR_ACCESSIBLE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_properties_must_all_be_present() {
        let vehicle = VehicleProperties::WHEELCHAIR_ACCESSIBLE.with(VehicleProperties::BIKE_ACCEPTED);
        assert!(vehicle.contains(&VehicleProperties::none()));
        assert!(vehicle.contains(&VehicleProperties::BIKE_ACCEPTED));
        assert!(!vehicle.contains(
            &VehicleProperties::BIKE_ACCEPTED.with(VehicleProperties::AIR_CONDITIONED)
        ));
        assert!(!VehicleProperties::none().contains(&VehicleProperties::WHEELCHAIR_ACCESSIBLE));
    }
}
