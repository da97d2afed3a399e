//! Test data generators for synthetic velocity cubes.
//!
//! These generators create predictable, verifiable test data patterns
//! that can be used across the test suite.

/// Creates an evenly spaced coordinate axis.
///
/// # Example
///
/// ```
/// use test_utils::regular_axis;
///
/// let x = regular_axis(-100_000.0, 120.0, 3);
/// assert_eq!(x, vec![-100_000.0, -99_880.0, -99_760.0]);
/// ```
pub fn regular_axis(start: f64, step: f64, len: usize) -> Vec<f64> {
    (0..len).map(|i| start + step * i as f64).collect()
}

/// Creates a cube with predictable values.
///
/// Each cell value is calculated as: `t * 10000 + row * 100 + col`
///
/// This makes it easy to verify which cell a nearest-neighbour lookup
/// selected. Values are in `[mid_date, y, x]` (C) order.
///
/// # Example
///
/// ```
/// use test_utils::create_test_cube;
///
/// let cube = create_test_cube(2, 3, 4);
/// assert_eq!(cube.len(), 24);
/// assert_eq!(cube[1], 1.0);      // t=0, row=0, col=1
/// assert_eq!(cube[4], 100.0);    // t=0, row=1, col=0
/// assert_eq!(cube[12], 10000.0); // t=1, row=0, col=0
/// ```
pub fn create_test_cube(times: usize, rows: usize, cols: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(times * rows * cols);
    for t in 0..times {
        for row in 0..rows {
            for col in 0..cols {
                data.push((t * 10000 + row * 100 + col) as f32);
            }
        }
    }
    data
}

/// Creates a cube of constant value.
pub fn create_constant_cube(times: usize, rows: usize, cols: usize, value: f32) -> Vec<f32> {
    vec![value; times * rows * cols]
}

/// Creates a velocity-like cube (m/yr) with NaN gaps at the given time steps.
///
/// Speeds grow with the time index and towards the last column, loosely
/// mimicking a glacier accelerating towards its terminus.
pub fn create_velocity_cube_with_gaps(
    times: usize,
    rows: usize,
    cols: usize,
    gap_times: &[usize],
) -> Vec<f32> {
    let mut data = Vec::with_capacity(times * rows * cols);
    for t in 0..times {
        for _row in 0..rows {
            for col in 0..cols {
                if gap_times.contains(&t) {
                    data.push(f32::NAN);
                } else {
                    let speed = 500.0 + 10.0 * t as f32 + 50.0 * col as f32 / cols.max(1) as f32;
                    data.push(speed);
                }
            }
        }
    }
    data
}

/// Day offsets for a time axis, spaced `step_days` apart.
pub fn mid_date_offsets(start_days: f64, step_days: f64, len: usize) -> Vec<f64> {
    regular_axis(start_days, step_days, len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regular_axis_descending() {
        let y = regular_axis(-1_600_000.0, -120.0, 4);
        assert_eq!(y.len(), 4);
        assert_eq!(y[3], -1_600_360.0);
    }

    #[test]
    fn test_create_test_cube_pattern() {
        let cube = create_test_cube(3, 4, 5);
        let (rows, cols) = (4, 5);
        for t in 0..3 {
            for row in 0..rows {
                for col in 0..cols {
                    let idx = t * rows * cols + row * cols + col;
                    assert_eq!(cube[idx], (t * 10000 + row * 100 + col) as f32);
                }
            }
        }
    }

    #[test]
    fn test_constant_cube() {
        let cube = create_constant_cube(2, 2, 2, 7.5);
        assert!(cube.iter().all(|&v| v == 7.5));
    }

    #[test]
    fn test_velocity_cube_gaps() {
        let cube = create_velocity_cube_with_gaps(3, 2, 2, &[1]);
        assert!(cube[..4].iter().all(|v| v.is_finite()));
        assert!(cube[4..8].iter().all(|v| v.is_nan()));
        assert!(cube[8..].iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_mid_date_offsets() {
        assert_eq!(mid_date_offsets(8000.0, 12.0, 3), vec![8000.0, 8012.0, 8024.0]);
    }
}
