//! Coordinate module
//!
//! Geographic coordinates and the fixed target location the compass points to.

mod types;

pub use types::{CoordError, GeoCoordinate, MAX_LAT, MAX_LON, MIN_LAT, MIN_LON};

/// Location of the Kaaba in Mecca, the fixed target of every bearing.
pub const KAABA: GeoCoordinate = GeoCoordinate::new_unchecked(21.4225, 39.8262);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_coordinate() {
        let coord = GeoCoordinate::new(40.7128, -74.0060).unwrap();
        assert_eq!(coord.latitude, 40.7128);
        assert_eq!(coord.longitude, -74.0060);
    }

    #[test]
    fn test_bounds_are_inclusive() {
        assert!(GeoCoordinate::new(90.0, 180.0).is_ok());
        assert!(GeoCoordinate::new(-90.0, -180.0).is_ok());
    }

    #[test]
    fn test_invalid_latitude() {
        let result = GeoCoordinate::new(90.5, 0.0);
        assert!(matches!(result, Err(CoordError::InvalidLatitude(_))));
    }

    #[test]
    fn test_invalid_longitude() {
        let result = GeoCoordinate::new(0.0, -181.0);
        assert!(matches!(result, Err(CoordError::InvalidLongitude(_))));
    }

    #[test]
    fn test_nan_is_rejected() {
        assert!(GeoCoordinate::new(f64::NAN, 0.0).is_err());
        assert!(GeoCoordinate::new(0.0, f64::NAN).is_err());
    }

    #[test]
    fn test_unchecked_allows_out_of_range() {
        let coord = GeoCoordinate::new_unchecked(200.0, -500.0);
        assert_eq!(coord.latitude, 200.0);
        assert_eq!(coord.longitude, -500.0);
    }

    #[test]
    fn test_display_hemispheres() {
        assert_eq!(format!("{}", KAABA), "21.4225°N, 39.8262°E");

        let new_york = GeoCoordinate::new(40.7128, -74.0060).unwrap();
        assert_eq!(format!("{}", new_york), "40.7128°N, 74.0060°W");

        let sydney = GeoCoordinate::new(-33.8688, 151.2093).unwrap();
        assert_eq!(format!("{}", sydney), "33.8688°S, 151.2093°E");
    }

    #[test]
    fn test_radians() {
        let coord = GeoCoordinate::new_unchecked(180.0, 90.0);
        assert!((coord.latitude_rad() - std::f64::consts::PI).abs() < 1e-12);
        assert!((coord.longitude_rad() - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn test_coord_error_display() {
        let err = CoordError::InvalidLatitude(91.0);
        assert!(err.to_string().contains("91"));
        assert!(err.to_string().contains("latitude"));
    }
}
