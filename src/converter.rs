//! Ellipsoidal to orthometric height conversion.
//!
//! Orthometric height is the ellipsoidal height minus the geoid height. The
//! result is then expressed in the selected unit; in US survey feet the
//! horizontal and vertical accuracies are rescaled by the same factor.

use crate::models::{ConversionResult, Record, Unit};

/// Height above the geoid, in meters
pub fn orthometric_height(ellipsoidal_height: f64, geoid_height: f64) -> f64 {
    ellipsoidal_height - geoid_height
}

/// Orthometric height expressed in `unit`
pub fn convert(ellipsoidal_height: f64, geoid_height: f64, unit: Unit) -> f64 {
    unit.convert_meters(orthometric_height(ellipsoidal_height, geoid_height))
}

/// Converted values for one record
///
/// Accuracies are rescaled only when feet are selected. A blank or
/// non-numeric accuracy is left as it was.
pub fn convert_record(record: &Record, geoid_height: f64, unit: Unit) -> ConversionResult {
    let rescale = |accuracy: Option<f64>| match unit {
        Unit::Meters => None,
        Unit::UsFeet => accuracy.map(|meters| unit.convert_meters(meters)),
    };
    ConversionResult {
        orthometric_height: convert(record.altitude(), geoid_height, unit),
        accuracy_horizontal: rescale(record.accuracy_horizontal()),
        accuracy_vertical: rescale(record.accuracy_vertical()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::FEET_PER_METER;

    fn record(
        altitude: f64,
        accuracy_horizontal: Option<f64>,
        accuracy_vertical: Option<f64>,
    ) -> Record {
        Record {
            image_name: "IMG_0001.JPG".to_string(),
            latitude: 40.0,
            longitude: -75.0,
            altitude,
            accuracy_horizontal,
            accuracy_vertical,
            cells: Vec::new(),
        }
    }

    #[test]
    fn test_meters_scenario() {
        assert_eq!(convert(100.0, -33.5, Unit::Meters), 133.5);
    }

    #[test]
    fn test_feet_scenario() {
        let feet = convert(100.0, -33.5, Unit::UsFeet);
        assert!((feet - 437.992_126_65).abs() < 1e-6);
        assert_eq!(feet, 133.5 * FEET_PER_METER);
    }

    #[test]
    fn test_meters_leave_accuracies_unchanged() {
        let result = convert_record(&record(100.0, Some(0.05), Some(0.12)), -33.5, Unit::Meters);
        assert_eq!(result.orthometric_height, 133.5);
        assert_eq!(result.accuracy_horizontal, None);
        assert_eq!(result.accuracy_vertical, None);
    }

    #[test]
    fn test_feet_rescale_accuracies() {
        let result = convert_record(&record(100.0, Some(0.05), Some(0.12)), -33.5, Unit::UsFeet);
        let horizontal = result.accuracy_horizontal.unwrap();
        assert_eq!(horizontal, 0.05 * FEET_PER_METER);
        assert!((horizontal - 0.164_041_995).abs() < 1e-9);
        assert_eq!(result.accuracy_vertical, Some(0.12 * FEET_PER_METER));
    }

    #[test]
    fn test_feet_skip_undefined_accuracies() {
        let result = convert_record(&record(100.0, None, Some(0.12)), -33.5, Unit::UsFeet);
        assert_eq!(result.orthometric_height, 133.5 * FEET_PER_METER);
        assert_eq!(result.accuracy_horizontal, None);
        assert_eq!(result.accuracy_vertical, Some(0.12 * FEET_PER_METER));
    }

    #[test]
    fn test_unit_scaling_is_a_post_multiply() {
        for (ellipsoidal, geoid) in [(100.0, -33.5), (-12.25, 28.75), (0.0, 0.0), (2500.0, -10.0)] {
            let delta = orthometric_height(ellipsoidal, geoid);
            assert_eq!(convert(ellipsoidal, geoid, Unit::Meters), delta);
            assert_eq!(convert(ellipsoidal, geoid, Unit::UsFeet), delta * FEET_PER_METER);
        }
    }
}
