//! Monotone bisection root finder.
//!
//! Shared by the power devig (solving for the exponent) and the flex
//! parlay breakeven (solving for the per-leg probability). The residual
//! may be increasing or decreasing; only a sign change across the
//! bracket is required.

/// Search parameters for [`bisect`].
#[derive(Debug, Clone, Copy)]
pub struct Bisection {
    pub lo: f64,
    pub hi: f64,
    /// Converged once `|f(x)| <= tolerance`.
    pub tolerance: f64,
    pub max_iterations: u32,
}

/// Why a bisection search gave up.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RootError {
    /// `f(lo)` and `f(hi)` share a sign, so no root is bracketed.
    #[error("no root bracketed in [{lo}, {hi}] (f(lo) = {f_lo:.3e}, f(hi) = {f_hi:.3e})")]
    NotBracketed { lo: f64, hi: f64, f_lo: f64, f_hi: f64 },

    /// The iteration cap was hit before the residual fell within tolerance.
    #[error("gave up after {iterations} iterations (x = {best}, residual = {residual:.3e})")]
    MaxIterations { iterations: u32, best: f64, residual: f64 },
}

/// Find `x` in `[lo, hi]` with `|f(x)| <= tolerance`.
pub fn bisect<F>(f: F, params: Bisection) -> Result<f64, RootError>
where
    F: Fn(f64) -> f64,
{
    let Bisection { mut lo, mut hi, tolerance, max_iterations } = params;

    let mut f_lo = f(lo);
    let f_hi = f(hi);

    if f_lo.abs() <= tolerance {
        return Ok(lo);
    }
    if f_hi.abs() <= tolerance {
        return Ok(hi);
    }
    if f_lo.is_nan() || f_hi.is_nan() || f_lo.signum() == f_hi.signum() {
        return Err(RootError::NotBracketed { lo, hi, f_lo, f_hi });
    }

    let mut best = lo;
    let mut residual = f_lo;

    for _ in 0..max_iterations {
        let mid = (lo + hi) / 2.0;
        let f_mid = f(mid);
        best = mid;
        residual = f_mid;

        if f_mid.abs() <= tolerance {
            return Ok(mid);
        }

        if f_mid.signum() == f_lo.signum() {
            lo = mid;
            f_lo = f_mid;
        } else {
            hi = mid;
        }
    }

    Err(RootError::MaxIterations {
        iterations: max_iterations,
        best,
        residual,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
