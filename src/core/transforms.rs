//! Rounding of raw measurements into grouping keys.
//!
//! Every call site that derives a grouping key goes through this module so
//! that group membership is decided by one rule: round half away from zero
//! (`f64::round`), applied to the binary value. For Δp the value is scaled
//! by 10 first, so 32.5 → 33 and 7.25 → 7.3. A decimal that has no exact
//! binary form (8.05 is stored slightly below 8.05) rounds according to the
//! stored value.

use std::fmt;

use super::loaders::MeasurementRecord;

/// Number of Δp rounding steps per MPa (one decimal place).
pub const DELTAP_STEPS_PER_UNIT: f64 = 10.0;

/// Round a displacement to the nearest whole cc/rev.
#[inline]
pub fn round_displacement(displacement: f64) -> i64 {
    displacement.round() as i64
}

/// Round a pressure difference to the nearest 0.1 MPa.
#[inline]
pub fn round_deltap(deltap: f64) -> f64 {
    DeltapTenths::from_deltap(deltap).value()
}

/// A Δp rounded to one decimal, stored as a whole number of tenths.
///
/// Keeping the rounded pressure as an integer makes it usable as an
/// ordered map key without comparing floats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeltapTenths(pub i64);

impl DeltapTenths {
    /// Round a raw Δp into tenths.
    #[inline]
    pub fn from_deltap(deltap: f64) -> Self {
        Self((deltap * DELTAP_STEPS_PER_UNIT).round() as i64)
    }

    /// The rounded Δp in MPa.
    #[inline]
    pub fn value(self) -> f64 {
        self.0 as f64 / DELTAP_STEPS_PER_UNIT
    }
}

impl fmt::Display for DeltapTenths {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.value())
    }
}

/// Rounded grouping keys of one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RoundedKeys {
    pub displacement: i64,
    pub deltap: DeltapTenths,
}

/// Derive the rounded keys of a record. The record itself is untouched.
pub fn normalize(record: &MeasurementRecord) -> RoundedKeys {
    RoundedKeys {
        displacement: round_displacement(record.displacement),
        deltap: DeltapTenths::from_deltap(record.deltap),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(displacement: f64, deltap: f64) -> MeasurementRecord {
        MeasurementRecord {
            speed: 1000.0,
            displacement,
            deltap,
            etat: 90.0,
            etav: 95.0,
            etam: 94.0,
        }
    }

    #[test]
    fn test_round_displacement_boundaries() {
        assert_eq!(round_displacement(32.4), 32);
        assert_eq!(round_displacement(32.6), 33);
        assert_eq!(round_displacement(32.5), 33);
        assert_eq!(round_displacement(33.5), 34);
        assert_eq!(round_displacement(-32.5), -33);
        assert_eq!(round_displacement(0.49), 0);
    }

    #[test]
    fn test_round_deltap_to_tenths() {
        assert_eq!(round_deltap(7.96), 8.0);
        assert_eq!(round_deltap(8.04), 8.0);
        assert_eq!(round_deltap(7.25), 7.3);
        assert_eq!(round_deltap(31.94), 31.9);
        assert_eq!(DeltapTenths::from_deltap(11.16).0, 112);
    }

    #[test]
    fn test_rounding_is_idempotent() {
        let mut value = -40.0;
        while value < 40.0 {
            let once = round_deltap(value);
            assert_eq!(round_deltap(once), once, "Δp {}", value);

            let disp = round_displacement(value);
            assert_eq!(round_displacement(disp as f64), disp, "displacement {}", value);

            value += 0.013;
        }
    }

    #[test]
    fn test_deltap_tenths_display_and_order() {
        let low = DeltapTenths::from_deltap(7.96);
        let high = DeltapTenths::from_deltap(8.46);
        assert_eq!(low.to_string(), "8.0");
        assert_eq!(high.to_string(), "8.5");
        assert!(low < high);
    }

    #[test]
    fn test_normalize_keeps_raw_values() {
        let rec = record(32.6, 8.04);
        let keys = normalize(&rec);
        assert_eq!(keys.displacement, 33);
        assert_eq!(keys.deltap, DeltapTenths(80));
        assert_eq!(rec.displacement, 32.6);
        assert_eq!(rec.deltap, 8.04);
    }
}
