// Geofence validation
//
// Decides whether a reported customer location is close enough to the
// restaurant to place an order. Purely computational: no side effects, no
// locking, callable from any thread.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::GeofenceConfig;

/// Mean Earth radius in meters, as used by the haversine formula
const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Error type for geofence checks
///
/// Malformed input is distinct from "too far": callers should prompt the
/// client to re-acquire its location instead of showing a rejection.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GeoError {
    #[error("Invalid coordinates: latitude must be in [-90, 90], longitude in [-180, 180]")]
    InvalidCoordinates,
}

/// A (latitude, longitude) pair in degrees
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Outcome of a geofence check
#[derive(Debug, Clone, Copy, Serialize)]
pub struct GeofenceDecision {
    pub eligible: bool,
    pub distance_meters: u64,
}

/// Geofence validator for the configured restaurant location
#[derive(Debug, Clone)]
pub struct GeoValidator {
    restaurant: Coordinates,
    radius_meters: u32,
}

impl GeoValidator {
    pub fn new(config: &GeofenceConfig) -> Self {
        Self {
            restaurant: Coordinates::new(config.restaurant_lat, config.restaurant_lon),
            radius_meters: config.radius_meters,
        }
    }

    /// Check a reported location against the restaurant's geofence
    ///
    /// Returns the great-circle distance rounded to the nearest meter and
    /// whether it falls within the configured radius. Fails with
    /// `InvalidCoordinates` when either coordinate pair is out of range.
    pub fn validate(&self, customer: Coordinates) -> Result<GeofenceDecision, GeoError> {
        let distance_meters = distance_meters(customer, self.restaurant)?;
        Ok(GeofenceDecision {
            eligible: distance_meters <= u64::from(self.radius_meters),
            distance_meters,
        })
    }
}

/// Great-circle distance between two points, rounded to the nearest meter
///
/// Haversine formula over a spherical Earth of radius 6,371,000 m.
pub fn distance_meters(a: Coordinates, b: Coordinates) -> Result<u64, GeoError> {
    if !a.is_valid() || !b.is_valid() {
        return Err(GeoError::InvalidCoordinates);
    }

    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();
    let delta_lat = (b.latitude - a.latitude).to_radians();
    let delta_lon = (b.longitude - a.longitude).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat_a.cos() * lat_b.cos() * (delta_lon / 2.0).sin().powi(2);
    // Clamp for near-antipodal pairs where rounding pushes h past 1
    let central_angle = 2.0 * h.sqrt().min(1.0).asin();

    Ok((EARTH_RADIUS_METERS * central_angle).round() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator(radius_meters: u32) -> GeoValidator {
        GeoValidator::new(&GeofenceConfig {
            restaurant_lat: 48.8584,
            restaurant_lon: 2.2945,
            radius_meters,
        })
    }

    #[test]
    fn test_same_point_is_eligible_at_zero_distance() {
        let decision = validator(100)
            .validate(Coordinates::new(48.8584, 2.2945))
            .unwrap();
        assert!(decision.eligible);
        assert_eq!(decision.distance_meters, 0);
    }

    #[test]
    fn test_far_point_is_rejected_with_distance() {
        // Notre-Dame is roughly 4 km from the Eiffel Tower
        let decision = validator(100)
            .validate(Coordinates::new(48.8530, 2.3499))
            .unwrap();
        assert!(!decision.eligible);
        assert!(decision.distance_meters > 3_000);
        assert!(decision.distance_meters < 6_000);
    }

    #[test]
    fn test_boundary_is_inclusive() {
        // A point ~111 m north (0.001 degrees of latitude)
        let near = Coordinates::new(48.8594, 2.2945);
        let distance = distance_meters(near, Coordinates::new(48.8584, 2.2945)).unwrap();

        let decision = validator(distance as u32).validate(near).unwrap();
        assert!(decision.eligible);

        let decision = validator(distance as u32 - 1).validate(near).unwrap();
        assert!(!decision.eligible);
    }

    #[test]
    fn test_latitude_out_of_range_is_invalid() {
        let result = validator(100).validate(Coordinates::new(90.5, 0.0));
        assert_eq!(result.unwrap_err(), GeoError::InvalidCoordinates);
    }

    #[test]
    fn test_longitude_out_of_range_is_invalid() {
        let result = validator(100).validate(Coordinates::new(0.0, -180.1));
        assert_eq!(result.unwrap_err(), GeoError::InvalidCoordinates);
    }

    #[test]
    fn test_non_finite_coordinates_are_invalid() {
        let result = validator(100).validate(Coordinates::new(f64::NAN, 2.2945));
        assert_eq!(result.unwrap_err(), GeoError::InvalidCoordinates);

        let result = validator(100).validate(Coordinates::new(48.8584, f64::INFINITY));
        assert_eq!(result.unwrap_err(), GeoError::InvalidCoordinates);
    }

    #[test]
    fn test_known_distance_paris_to_london() {
        // Paris to London is roughly 344 km great-circle
        let paris = Coordinates::new(48.8566, 2.3522);
        let london = Coordinates::new(51.5074, -0.1278);
        let distance = distance_meters(paris, london).unwrap();
        assert!(distance > 330_000 && distance < 350_000, "got {}", distance);
    }
}
