use serde::{Deserialize, Serialize};
use strum_macros::Display;
use utoipa::ToSchema;

pub const MPH_PER_MPS: f64 = 2.23694;
pub const KMH_PER_MPS: f64 = 3.6;
pub const MILES_PER_METER: f64 = 0.000621371;
pub const KILOMETERS_PER_METER: f64 = 0.001;

/// Display unit selected by the user. All stored values stay in meters and
/// meters per second; this only matters at the presentation boundary.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    ToSchema,
    clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum UnitSystem {
    #[default]
    Imperial,
    Metric,
}

impl UnitSystem {
    fn speed_factor(self) -> f64 {
        match self {
            UnitSystem::Imperial => MPH_PER_MPS,
            UnitSystem::Metric => KMH_PER_MPS,
        }
    }

    fn distance_factor(self) -> f64 {
        match self {
            UnitSystem::Imperial => MILES_PER_METER,
            UnitSystem::Metric => KILOMETERS_PER_METER,
        }
    }

    pub fn speed_label(self) -> &'static str {
        match self {
            UnitSystem::Imperial => "mph",
            UnitSystem::Metric => "km/h",
        }
    }

    pub fn distance_label(self) -> &'static str {
        match self {
            UnitSystem::Imperial => "mi",
            UnitSystem::Metric => "km",
        }
    }

    pub fn to_display_speed(self, mps: f64) -> f64 {
        mps * self.speed_factor()
    }

    pub fn to_canonical_speed(self, value: f64) -> f64 {
        value / self.speed_factor()
    }

    pub fn to_display_distance(self, meters: f64) -> f64 {
        meters * self.distance_factor()
    }

    pub fn to_canonical_distance(self, value: f64) -> f64 {
        value / self.distance_factor()
    }
}
