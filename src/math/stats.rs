//! Small summary statistics used by the optimizer and reports.

/// Arithmetic mean. Returns `NaN` for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (divides by `n`).
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mu = mean(values);
    let var = values.iter().map(|v| (v - mu) * (v - mu)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

/// Median of the finite values. Returns `None` if none are finite.
pub fn median(values: &[f64]) -> Option<f64> {
    let mut finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return None;
    }
    finite.sort_by(f64::total_cmp);
    let mid = finite.len() / 2;
    if finite.len() % 2 == 0 {
        Some(0.5 * (finite[mid - 1] + finite[mid]))
    } else {
        Some(finite[mid])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn std_dev_of_constant_is_zero() {
        assert_eq!(std_dev(&[2.5; 8]), 0.0);
    }

    #[test]
    fn std_dev_matches_population_formula() {
        // mean 5, squared deviations 9+1+1+9 = 20, /4 = 5
        let s = std_dev(&[2.0, 4.0, 6.0, 8.0]);
        assert!((s - 5.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn median_skips_non_finite() {
        assert_eq!(median(&[3.0, f64::INFINITY, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(median(&[f64::NAN]), None);
    }
}
