//! Least-squares line fits and Pearson correlation.
//!
//! The unemployment comparison fits `y = a + b·x` per market. The design matrix
//! is tiny (n × 2), so we solve it with nalgebra's SVD, which handles the
//! tall-matrix case and reports near-singular systems instead of panicking.

use nalgebra::{DMatrix, DVector};

/// Fitted line `y = intercept + slope * x`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineFit {
    pub intercept: f64,
    pub slope: f64,
}

/// Fit a least-squares line through `(x, y)` pairs.
///
/// Returns `None` with fewer than two points, mismatched lengths, or a
/// degenerate `x` (all values equal).
pub fn fit_line(x: &[f64], y: &[f64]) -> Option<LineFit> {
    let n = x.len();
    if n < 2 || y.len() != n {
        return None;
    }

    let design = DMatrix::from_fn(n, 2, |row, col| if col == 0 { 1.0 } else { x[row] });
    let target = DVector::from_column_slice(y);

    let svd = design.svd(true, true);
    // Reject systems where the x column is (numerically) constant.
    if svd.singular_values.min() <= 1e-12 * svd.singular_values.max() {
        return None;
    }
    let beta = svd.solve(&target, 1e-12).ok()?;
    if !beta.iter().all(|v| v.is_finite()) {
        return None;
    }

    Some(LineFit {
        intercept: beta[0],
        slope: beta[1],
    })
}

/// Sample Pearson correlation; `NaN` when undefined (n < 2 or zero variance).
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len();
    if n < 2 || y.len() != n {
        return f64::NAN;
    }

    let mean_x = x.iter().sum::<f64>() / n as f64;
    let mean_y = y.iter().sum::<f64>() / n as f64;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (xi, yi) in x.iter().zip(y) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    if sxx == 0.0 || syy == 0.0 {
        return f64::NAN;
    }
    sxy / (sxx.sqrt() * syy.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_line_recovers_exact_line() {
        // y = 2 + 3x
        let fit = fit_line(&[0.0, 1.0, 2.0], &[2.0, 5.0, 8.0]).unwrap();
        assert!((fit.intercept - 2.0).abs() < 1e-10);
        assert!((fit.slope - 3.0).abs() < 1e-10);
    }

    #[test]
    fn fit_line_rejects_constant_x() {
        assert!(fit_line(&[1.0, 1.0, 1.0], &[2.0, 3.0, 4.0]).is_none());
        assert!(fit_line(&[1.0], &[2.0]).is_none());
    }

    #[test]
    fn pearson_signs_and_degenerate_cases() {
        assert!((pearson(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]) - 1.0).abs() < 1e-12);
        assert!((pearson(&[1.0, 2.0, 3.0], &[0.9, 0.7, 0.5]) + 1.0).abs() < 1e-12);
        assert!(pearson(&[1.0, 2.0, 3.0], &[0.5, 0.5, 0.5]).is_nan());
        assert!(pearson(&[1.0], &[0.5]).is_nan());
    }
}
