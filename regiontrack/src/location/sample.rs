//! Location sample types.
//!
//! - [`RawFix`] - an already decoded fix as delivered by a source, any field may be missing
//! - [`LocationSample`] - a validated fix
//! - [`LocationReading`] - what the feed reports: a sample or "no data yet"

use std::time::Instant;

use super::error::LocationError;

/// A decoded but unvalidated positioning fix.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RawFix {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Ground speed in km/h.
    pub speed: Option<f64>,
}

impl RawFix {
    /// A fix with every field populated.
    pub fn new(latitude: f64, longitude: f64, speed: f64) -> Self {
        Self {
            latitude: Some(latitude),
            longitude: Some(longitude),
            speed: Some(speed),
        }
    }

    /// Whether latitude, longitude and speed are all present.
    pub fn is_complete(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some() && self.speed.is_some()
    }
}

/// A validated location fix.
///
/// Latitude and longitude are finite and in range, speed is finite and
/// non-negative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationSample {
    /// Latitude in degrees (-90 to 90).
    pub latitude: f64,
    /// Longitude in degrees (-180 to 180).
    pub longitude: f64,
    /// Ground speed in km/h.
    pub speed: f64,
    /// When the fix was accepted.
    pub timestamp: Instant,
}

impl LocationSample {
    /// Validate a raw fix, stamping it with `timestamp`.
    pub fn from_fix(fix: RawFix, timestamp: Instant) -> Result<Self, LocationError> {
        let latitude = fix.latitude.ok_or(LocationError::Incomplete("latitude"))?;
        let longitude = fix.longitude.ok_or(LocationError::Incomplete("longitude"))?;
        let speed = fix.speed.ok_or(LocationError::Incomplete("speed"))?;

        for (field, value) in [
            ("latitude", latitude),
            ("longitude", longitude),
            ("speed", speed),
        ] {
            if !value.is_finite() {
                return Err(LocationError::NonFinite { field, value });
            }
        }

        if !(-90.0..=90.0).contains(&latitude) {
            return Err(LocationError::OutOfRange {
                field: "latitude",
                value: latitude,
            });
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(LocationError::OutOfRange {
                field: "longitude",
                value: longitude,
            });
        }
        if speed < 0.0 {
            return Err(LocationError::NegativeSpeed(speed));
        }

        Ok(Self {
            latitude,
            longitude,
            speed,
            timestamp,
        })
    }
}

/// Result of reading the feed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LocationReading {
    /// The most recent valid sample.
    Sample(LocationSample),
    /// No valid sample has been ingested yet.
    NoDataYet,
}

impl LocationReading {
    pub fn sample(self) -> Option<LocationSample> {
        match self {
            LocationReading::Sample(sample) => Some(sample),
            LocationReading::NoDataYet => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_fix_is_valid() {
        let now = Instant::now();
        let sample = LocationSample::from_fix(RawFix::new(44.98, 8.56, 32.5), now).unwrap();
        assert_eq!(sample.latitude, 44.98);
        assert_eq!(sample.longitude, 8.56);
        assert_eq!(sample.speed, 32.5);
        assert_eq!(sample.timestamp, now);
    }

    #[test]
    fn test_missing_fields_rejected() {
        let now = Instant::now();
        let fix = RawFix {
            latitude: Some(44.98),
            longitude: Some(8.56),
            speed: None,
        };
        assert!(matches!(
            LocationSample::from_fix(fix, now),
            Err(LocationError::Incomplete("speed"))
        ));
        assert!(matches!(
            LocationSample::from_fix(RawFix::default(), now),
            Err(LocationError::Incomplete("latitude"))
        ));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let now = Instant::now();
        assert!(matches!(
            LocationSample::from_fix(RawFix::new(f64::NAN, 8.0, 0.0), now),
            Err(LocationError::NonFinite { field: "latitude", .. })
        ));
        assert!(matches!(
            LocationSample::from_fix(RawFix::new(95.0, 8.0, 0.0), now),
            Err(LocationError::OutOfRange { field: "latitude", .. })
        ));
        assert!(matches!(
            LocationSample::from_fix(RawFix::new(45.0, -181.0, 0.0), now),
            Err(LocationError::OutOfRange { field: "longitude", .. })
        ));
        assert!(matches!(
            LocationSample::from_fix(RawFix::new(45.0, 8.0, -1.0), now),
            Err(LocationError::NegativeSpeed(_))
        ));
    }

    #[test]
    fn test_zero_speed_is_valid() {
        assert!(LocationSample::from_fix(RawFix::new(0.0, 0.0, 0.0), Instant::now()).is_ok());
    }
}
