//! Evenly spaced parameter grids.
//!
//! The observations carry no explicit curve parameter, so each point is paired
//! with a synthetic `t` drawn from an evenly spaced grid over a fixed range.

use crate::error::AppError;

/// Generate `n` evenly spaced points between `start` and `end` (inclusive).
///
/// - `n = 0` yields an empty grid
/// - `n = 1` yields `[start]`
/// - otherwise the first and last entries are exactly `start` and `end`
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n as f64 - 1.0);
            let mut out: Vec<f64> = (0..n).map(|i| start + step * i as f64).collect();
            // Pin the endpoint so accumulated rounding never leaks into the range.
            out[n - 1] = end;
            out
        }
    }
}

/// Validate a grid range supplied from configuration.
pub fn validate_range(start: f64, end: f64) -> Result<(), AppError> {
    if !(start.is_finite() && end.is_finite() && end > start) {
        return Err(AppError::input(format!(
            "Invalid grid range: start={start}, end={end} (must be finite and end>start)."
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_point_grid_is_start() {
        assert_eq!(linspace(6.0, 60.0, 1), vec![6.0]);
    }

    #[test]
    fn two_point_grid_is_endpoints() {
        assert_eq!(linspace(6.0, 60.0, 2), vec![6.0, 60.0]);
    }

    #[test]
    fn empty_grid() {
        assert!(linspace(6.0, 60.0, 0).is_empty());
    }

    #[test]
    fn grid_is_evenly_spaced_with_exact_endpoints() {
        let g = linspace(6.0, 60.0, 1500);
        assert_eq!(g.len(), 1500);
        assert_eq!(g[0], 6.0);
        assert_eq!(g[g.len() - 1], 60.0);
        let step = 54.0 / 1499.0;
        for w in g.windows(2) {
            assert!((w[1] - w[0] - step).abs() < 1e-9);
        }
    }

    #[test]
    fn ten_point_grid_matches_sample_positions() {
        let g = linspace(6.0, 60.0, 10);
        assert!((g[1] - 12.0).abs() < 1e-12);
        assert!((g[5] - 36.0).abs() < 1e-12);
    }

    #[test]
    fn rejects_inverted_range() {
        assert!(validate_range(60.0, 6.0).is_err());
        assert!(validate_range(6.0, f64::NAN).is_err());
        assert!(validate_range(6.0, 60.0).is_ok());
    }
}
