//! Unit conversion and fill-value handling shared by the source adapters.

use ndarray::Array2;

/// Fill value used by the ice-motion product for missing vectors.
pub const MOTION_SENTINEL: f64 = -9999.0;

/// cm/s to km/day.
pub const CM_PER_S_TO_KM_PER_DAY: f64 = 86_400.0 / 100_000.0;

/// Divisor applied to ice and wind velocities before training.
pub const VELOCITY_SCALE: f64 = 50.0;

/// Lower bound of the 2 m temperature normalisation range (K).
pub const T2M_MIN: f64 = 240.0;
/// Upper bound of the 2 m temperature normalisation range (K).
pub const T2M_MAX: f64 = 320.0;

/// Swath concentration is reported in percent.
pub const SWATH_PERCENT_MAX: f64 = 100.0;
/// Daily analysis concentration is reported as a fraction.
pub const DAILY_FRACTION_MAX: f64 = 1.0;

/// Replace the motion sentinel with NaN.
pub fn replace_sentinel(field: &mut Array2<f64>) {
    field.mapv_inplace(|v| if v == MOTION_SENTINEL { f64::NAN } else { v });
}

/// Replace NaN (undefined) cells with 0.
pub fn fill_invalid(field: &mut Array2<f64>) {
    field.mapv_inplace(|v| if v.is_nan() { 0.0 } else { v });
}

/// Convert raw motion (cm/s, sentinel for missing) to km/day with missing
/// cells set to 0.
pub fn motion_to_km_per_day(mut field: Array2<f64>) -> Array2<f64> {
    replace_sentinel(&mut field);
    field.mapv_inplace(|v| v * CM_PER_S_TO_KM_PER_DAY);
    fill_invalid(&mut field);
    field
}

/// Zero every concentration outside `(0, upper]`. NaN is left for the
/// resampler to propagate.
pub fn clamp_concentration(field: &mut Array2<f64>, upper: f64) {
    field.mapv_inplace(|v| if v <= 0.0 || v > upper { 0.0 } else { v });
}

/// Scale a velocity field (km/day or m/s) into the training range.
pub fn normalize_velocity(field: &Array2<f64>) -> Array2<f64> {
    field.mapv(|v| v / VELOCITY_SCALE)
}

/// Map 2 m temperature (K) so that 240 K → 0 and 320 K → 1.
pub fn normalize_temperature(field: &Array2<f64>) -> Array2<f64> {
    field.mapv(|t| (t - T2M_MIN) / (T2M_MAX - T2M_MIN))
}
