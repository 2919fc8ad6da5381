//! Derived time series over a contact's raw per-frame data.
//!
//! Every function is pure: input is the slice of bounds-sized pressure
//! matrices owned by a contact, output is one value per frame offset.
//! In-range degenerate inputs (zero-force frames, empty slices) produce
//! defined values, never errors.

use crate::types::PressureFrame;

/// Sum of all samples per frame.
pub fn force_over_time(data: &[PressureFrame]) -> Vec<f64> {
    data.iter().map(|frame| frame.sum()).collect()
}

/// Count of nonzero samples per frame.
pub fn pixel_count_over_time(data: &[PressureFrame]) -> Vec<usize> {
    data.iter()
        .map(|frame| frame.iter().filter(|v| **v != 0.0).count())
        .collect()
}

/// Contact surface per frame: nonzero cell count × cell area.
pub fn surface_over_time(data: &[PressureFrame], sensor_surface: f64) -> Vec<f64> {
    pixel_count_over_time(data)
        .into_iter()
        .map(|count| count as f64 * sensor_surface)
        .collect()
}

/// Mean pressure per frame: force / surface. Frames with zero surface
/// yield 0 — the uniform sentinel policy, never a division error.
pub fn pressure_over_time(data: &[PressureFrame], sensor_surface: f64) -> Vec<f64> {
    let force = force_over_time(data);
    let surface = surface_over_time(data, sensor_surface);
    force
        .into_iter()
        .zip(surface)
        .map(|(f, s)| if s > 0.0 { f / s } else { 0.0 })
        .collect()
}

/// Center of pressure per frame: the pressure-weighted centroid, computed
/// independently per axis. Returns (cop_x, cop_y) where x runs along
/// columns and y along rows. Frames with zero total pressure are skipped
/// and leave both coordinates at 0.
pub fn center_of_pressure(data: &[PressureFrame]) -> (Vec<f64>, Vec<f64>) {
    let mut cop_x = vec![0.0; data.len()];
    let mut cop_y = vec![0.0; data.len()];

    for (t, frame) in data.iter().enumerate() {
        let total = frame.sum();
        if total <= 0.0 {
            continue;
        }
        let mut weighted_col = 0.0;
        let mut weighted_row = 0.0;
        for row in 0..frame.nrows() {
            for col in 0..frame.ncols() {
                let value = frame[(row, col)];
                weighted_col += col as f64 * value;
                weighted_row += row as f64 * value;
            }
        }
        cop_x[t] = weighted_col / total;
        cop_y[t] = weighted_row / total;
    }

    (cop_x, cop_y)
}

/// Resample a series onto `length` evenly spaced points by linear
/// interpolation over the index domain `[0, len - 1]`. Sample positions
/// are clamped to the domain, so boundary values are repeated rather than
/// extrapolated. Normalizes contacts of different durations onto one
/// comparison timeline.
pub fn interpolate_time_series(series: &[f64], length: usize) -> Vec<f64> {
    if series.is_empty() || length == 0 {
        return Vec::new();
    }
    let last = (series.len() - 1) as f64;

    (0..length)
        .map(|i| {
            let t = if length == 1 {
                0.0
            } else {
                (i as f64 * last / (length - 1) as f64).clamp(0.0, last)
            };
            let lo = t.floor() as usize;
            let hi = (lo + 1).min(series.len() - 1);
            let frac = t - lo as f64;
            series[lo] + (series[hi] - series[lo]) * frac
        })
        .collect()
}

/// Largest per-frame force over the whole contact; 0 for empty data.
pub fn peak_force(data: &[PressureFrame]) -> f64 {
    force_over_time(data).into_iter().fold(0.0, f64::max)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::DMatrix;

    fn data() -> Vec<PressureFrame> {
        vec![
            DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.0, 3.0]),
            DMatrix::from_row_slice(2, 2, &[0.0, 0.0, 0.0, 0.0]),
            DMatrix::from_row_slice(2, 2, &[2.0, 2.0, 2.0, 2.0]),
        ]
    }

    #[test]
    fn force_sums_each_frame() {
        assert_eq!(force_over_time(&data()), vec![4.0, 0.0, 8.0]);
    }

    #[test]
    fn pixel_count_ignores_zero_cells() {
        assert_eq!(pixel_count_over_time(&data()), vec![2, 0, 4]);
    }

    #[test]
    fn surface_scales_pixel_count() {
        let surface = surface_over_time(&data(), 0.5);
        assert_eq!(surface, vec![1.0, 0.0, 2.0]);
    }

    #[test]
    fn pressure_guards_zero_surface() {
        let pressure = pressure_over_time(&data(), 0.5);
        assert!((pressure[0] - 4.0).abs() < 1e-12);
        assert_eq!(pressure[1], 0.0, "Zero-surface frame yields the sentinel");
        assert!((pressure[2] - 4.0).abs() < 1e-12);
    }

    #[test]
    fn cop_skips_empty_frames() {
        let (cop_x, cop_y) = center_of_pressure(&data());
        // Frame 0: weight 1 at (0,0) and 3 at (1,1).
        assert!((cop_x[0] - 0.75).abs() < 1e-12);
        assert!((cop_y[0] - 0.75).abs() < 1e-12);
        // Frame 1 is empty: coordinates stay at zero.
        assert_eq!((cop_x[1], cop_y[1]), (0.0, 0.0));
        // Frame 2 is uniform: centroid at the middle.
        assert!((cop_x[2] - 0.5).abs() < 1e-12);
        assert!((cop_y[2] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn interpolation_is_idempotent_at_native_length() {
        let series = vec![0.0, 2.0, 1.0, 5.0, 4.0];
        assert_eq!(interpolate_time_series(&series, series.len()), series);
    }

    #[test]
    fn interpolation_upsamples_linearly() {
        let series = vec![0.0, 2.0];
        let out = interpolate_time_series(&series, 5);
        let expected = [0.0, 0.5, 1.0, 1.5, 2.0];
        assert_eq!(out.len(), expected.len());
        for (o, e) in out.iter().zip(expected) {
            assert!((o - e).abs() < 1e-12, "Expected {e}, got {o}");
        }
    }

    #[test]
    fn interpolation_handles_degenerate_lengths() {
        assert!(interpolate_time_series(&[], 10).is_empty());
        assert!(interpolate_time_series(&[1.0, 2.0], 0).is_empty());
        assert_eq!(interpolate_time_series(&[3.0], 4), vec![3.0; 4]);
        assert_eq!(interpolate_time_series(&[1.0, 9.0], 1), vec![1.0]);
    }

    #[test]
    fn peak_force_is_max_frame_sum() {
        assert_eq!(peak_force(&data()), 8.0);
        assert_eq!(peak_force(&[]), 0.0);
    }
}
