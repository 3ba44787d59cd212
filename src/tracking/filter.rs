use thiserror::Error;

use super::types::PositionSample;

pub const DEFAULT_NOISE_THRESHOLD_MPS: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("coordinates out of range")]
    InvalidCoordinates,
    #[error("reported speed is not finite")]
    NonFiniteSpeed,
}

/// Turns a raw fix into a canonical, non-negative speed. Readings under the
/// noise threshold are clamped to zero so a parked receiver reads 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleFilter {
    noise_threshold_mps: f64,
}

impl Default for SampleFilter {
    fn default() -> Self {
        Self::new(DEFAULT_NOISE_THRESHOLD_MPS)
    }
}

impl SampleFilter {
    pub fn new(noise_threshold_mps: f64) -> Self {
        Self {
            noise_threshold_mps: noise_threshold_mps.max(0.0),
        }
    }

    pub fn noise_threshold_mps(&self) -> f64 {
        self.noise_threshold_mps
    }

    pub fn filter(&self, sample: &PositionSample) -> Result<f64, Rejection> {
        if !valid_latitude(sample.latitude) || !valid_longitude(sample.longitude) {
            return Err(Rejection::InvalidCoordinates);
        }

        let speed = sample.speed_mps.unwrap_or(0.0);
        if !speed.is_finite() {
            return Err(Rejection::NonFiniteSpeed);
        }

        if speed < self.noise_threshold_mps {
            Ok(0.0)
        } else {
            Ok(speed)
        }
    }
}

fn valid_latitude(lat: f64) -> bool {
    lat.is_finite() && (-90.0..=90.0).contains(&lat)
}

fn valid_longitude(lon: f64) -> bool {
    lon.is_finite() && (-180.0..=180.0).contains(&lon)
}
