//! Linear least-squares fits over a window of samples.
//!
//! Curves fit trend lines when extrapolating or regressing, and truncated
//! Fourier series with a known period for harmonic extensions. Both are
//! linear in their coefficients and are solved through an SVD of the
//! design matrix.

use curve_core::errors::{Error, Result};
use curve_core::Real;
use nalgebra::{DMatrix, DVector};
use std::f64::consts::PI;

/// Coefficients of a least-squares fit `y ≈ Σⱼ βⱼ·φⱼ(x)`.
#[derive(Debug, Clone)]
pub struct LinearLeastSquaresRegression {
    coefficients: Vec<Real>,
    residual_norm: Real,
}

impl LinearLeastSquaresRegression {
    /// Fit `y` against the basis functions `φⱼ` evaluated at `x`.
    ///
    /// # Errors
    /// [`Error::InvalidConfiguration`] when `x` and `y` differ in length or
    /// there are fewer observations than basis functions.
    pub fn new<F>(x: &[Real], y: &[Real], basis: &[F]) -> Result<Self>
    where
        F: Fn(Real) -> Real,
    {
        curve_core::ensure_config!(
            x.len() == y.len(),
            "{} abscissae for {} observations",
            x.len(),
            y.len()
        );
        let a = DMatrix::from_fn(x.len(), basis.len(), |i, j| basis[j](x[i]));
        Self::from_design_matrix(a, y)
    }

    /// Fit `y` against the columns of the design matrix `a`.
    ///
    /// Singular values below `max(n, m)·ε·σ_max` are dropped, so collinear
    /// columns yield the minimum-norm solution instead of an error.
    ///
    /// # Errors
    /// A row count different from `y.len()`, fewer rows than columns, or a
    /// failed decomposition.
    pub fn from_design_matrix(a: DMatrix<Real>, y: &[Real]) -> Result<Self> {
        let (n, m) = a.shape();
        curve_core::ensure_config!(
            y.len() == n,
            "design matrix has {n} rows for {} observations",
            y.len()
        );
        curve_core::ensure_config!(
            n >= m,
            "{m} basis functions need at least {m} observations, got {n}"
        );
        let y = DVector::from_column_slice(y);
        let svd = a.clone().svd(true, true);
        let sigma_max = svd.singular_values.max();
        let eps = n.max(m) as Real * Real::EPSILON * sigma_max;
        let beta = svd
            .solve(&y, eps)
            .map_err(|e| Error::Runtime(format!("least-squares solve failed: {e}")))?;
        let residual_norm = (&y - &a * &beta).norm();
        Ok(Self {
            coefficients: beta.iter().copied().collect(),
            residual_norm,
        })
    }

    /// Fitted coefficients, one per basis function.
    pub fn coefficients(&self) -> &[Real] {
        &self.coefficients
    }

    /// Euclidean norm of `y − A·β`.
    pub fn residual_norm(&self) -> Real {
        self.residual_norm
    }
}

// ── Fits used by curves ───────────────────────────────────────────────────────

/// Least-squares line `y = intercept + slope·x`.
///
/// Returns `(intercept, slope)`.
///
/// # Errors
/// Fewer than two distinct abscissae.
pub fn fit_line(x: &[Real], y: &[Real]) -> Result<(Real, Real)> {
    let distinct = x.windows(2).any(|w| w[0] != w[1]);
    curve_core::ensure_config!(
        x.len() >= 2 && distinct,
        "a line fit needs two distinct abscissae, got {}",
        x.len()
    );
    let basis: [fn(Real) -> Real; 2] = [|_| 1.0, |x| x];
    let reg = LinearLeastSquaresRegression::new(x, y, &basis)?;
    Ok((reg.coefficients[0], reg.coefficients[1]))
}

/// A truncated Fourier series with a fixed period.
///
/// `y = c₀ + Σₖ aₖ·sin(2πk·x/P) + bₖ·cos(2πk·x/P)` for `k = 1..=harmonics`.
#[derive(Debug, Clone, PartialEq)]
pub struct HarmonicSeries {
    /// The period `P`.
    pub period: Real,
    /// `[c₀, a₁, b₁, a₂, b₂, …]`
    pub coefficients: Vec<Real>,
}

impl HarmonicSeries {
    /// Evaluate the series at `x`.
    pub fn value(&self, x: Real) -> Real {
        let Some((&c0, rest)) = self.coefficients.split_first() else {
            return 0.0;
        };
        let w = 2.0 * PI * x / self.period;
        rest.chunks(2)
            .enumerate()
            .fold(c0, |acc, (k, pair)| {
                let angle = (k + 1) as Real * w;
                let b = pair.get(1).copied().unwrap_or(0.0);
                acc + pair[0] * angle.sin() + b * angle.cos()
            })
    }

    /// Number of harmonics in the series.
    pub fn harmonics(&self) -> usize {
        self.coefficients.len().saturating_sub(1) / 2
    }
}

/// Fit a [`HarmonicSeries`] with `harmonics` terms and a known period.
///
/// # Errors
/// Non-positive period, zero harmonics, or fewer than `2·harmonics + 1`
/// observations.
pub fn fit_harmonics(
    x: &[Real],
    y: &[Real],
    period: Real,
    harmonics: usize,
) -> Result<HarmonicSeries> {
    curve_core::ensure_config!(
        period > 0.0 && period.is_finite(),
        "harmonic period must be positive, got {period}"
    );
    curve_core::ensure_config!(harmonics > 0, "at least one harmonic is required");
    let m = 2 * harmonics + 1;
    curve_core::ensure_config!(
        x.len() >= m,
        "{harmonics} harmonics need at least {m} observations, got {}",
        x.len()
    );
    let a = DMatrix::from_fn(x.len(), m, |i, j| {
        if j == 0 {
            return 1.0;
        }
        let k = ((j + 1) / 2) as Real;
        let angle = 2.0 * PI * k * x[i] / period;
        if j % 2 == 1 {
            angle.sin()
        } else {
            angle.cos()
        }
    });
    let reg = LinearLeastSquaresRegression::from_design_matrix(a, y)?;
    Ok(HarmonicSeries {
        period,
        coefficients: reg.coefficients,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn exact_line() {
        let x: Vec<Real> = (0..20).map(Real::from).collect();
        let y: Vec<Real> = x.iter().map(|&xi| 2.0 + 3.0 * xi).collect();
        let basis: Vec<Box<dyn Fn(Real) -> Real>> = vec![Box::new(|_| 1.0), Box::new(|x| x)];
        let reg = LinearLeastSquaresRegression::new(&x, &y, &basis).unwrap();
        assert_abs_diff_eq!(reg.coefficients()[0], 2.0, epsilon = 1e-10);
        assert_abs_diff_eq!(reg.coefficients()[1], 3.0, epsilon = 1e-10);
        assert_abs_diff_eq!(reg.residual_norm(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn noisy_line() {
        let noise = [0.01, -0.02, 0.015, -0.005, 0.03, -0.01, 0.02, -0.03, 0.005, 0.01];
        let x: Vec<Real> = (0..100).map(|i| Real::from(i) * 0.1).collect();
        let y: Vec<Real> = x
            .iter()
            .zip(noise.iter().cycle())
            .map(|(&xi, e)| 1.0 + 2.0 * xi + e)
            .collect();
        let (intercept, slope) = fit_line(&x, &y).unwrap();
        assert_abs_diff_eq!(intercept, 1.0, epsilon = 0.1);
        assert_abs_diff_eq!(slope, 2.0, epsilon = 0.01);
    }

    #[test]
    fn too_few_observations() {
        assert!(fit_line(&[1.0], &[2.0]).is_err());
        assert!(fit_line(&[1.0, 1.0], &[2.0, 3.0]).is_err());
        assert!(fit_harmonics(&[0.0, 1.0], &[0.0, 1.0], 4.0, 1).is_err());
        let a = DMatrix::from_row_slice(1, 2, &[1.0, 1.0]);
        assert!(LinearLeastSquaresRegression::from_design_matrix(a, &[1.0]).is_err());
    }

    #[test]
    fn collinear_columns() {
        // Both columns are the same: minimum-norm split of the slope.
        let a = DMatrix::from_row_slice(3, 2, &[1.0, 1.0, 2.0, 2.0, 3.0, 3.0]);
        let reg = LinearLeastSquaresRegression::from_design_matrix(a, &[2.0, 4.0, 6.0]).unwrap();
        assert_abs_diff_eq!(reg.coefficients()[0], 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(reg.coefficients()[1], 1.0, epsilon = 1e-9);
    }

    #[test]
    fn recovers_sine() {
        let period = 10.0;
        let x: Vec<Real> = (0..40).map(|i| Real::from(i) * 0.5).collect();
        let y: Vec<Real> = x
            .iter()
            .map(|&x| 1.0 + 2.0 * (2.0 * PI * x / period).sin())
            .collect();
        let series = fit_harmonics(&x, &y, period, 1).unwrap();
        assert_eq!(series.harmonics(), 1);
        assert_abs_diff_eq!(series.coefficients[0], 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(series.coefficients[1], 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(series.coefficients[2], 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(series.value(22.5), 1.0 + 2.0 * (4.5 * PI).sin(), epsilon = 1e-9);
    }
}
