//! Bounded root-finding used by the proactive maker's equilibrium search.

use crate::errors::NumericError;

/// Iteration bound shared by every solver; exhaustion is a typed failure,
/// never a spin.
pub const MAX_ITERATIONS: usize = 128;

/// Newton iteration with a halving fallback: whenever the update lands where
/// the objective or its derivative is non-finite, the step retreats halfway
/// toward the previous iterate.
pub fn newton<F, D>(f: F, df: D, x0: f64, precision: f64) -> Result<f64, NumericError>
where
    F: Fn(f64) -> f64,
    D: Fn(f64) -> f64,
{
    let mut x = x0;
    let mut next = step(&f, &df, x)?;

    let mut iterations = 0;
    while (next - x).abs() > precision {
        x = next;
        next = step(&f, &df, x)?;

        iterations += 1;
        if iterations >= MAX_ITERATIONS {
            return Err(NumericError::IterationLimit {
                limit: MAX_ITERATIONS,
                residual: (next - x).abs(),
            });
        }
    }
    Ok(next)
}

fn step<F, D>(f: &F, df: &D, x: f64) -> Result<f64, NumericError>
where
    F: Fn(f64) -> f64,
    D: Fn(f64) -> f64,
{
    let mut new_x = x - f(x) / df(x);
    for _ in 0..MAX_ITERATIONS {
        if !new_x.is_finite() {
            return Err(NumericError::NonFinite("newton update"));
        }
        if f(new_x).is_finite() && df(new_x).is_finite() {
            return Ok(new_x);
        }
        new_x = (x + new_x) / 2.0;
    }
    Err(NumericError::NonFinite("newton halving fallback"))
}

/// Bisection for a decreasing function `g` on `[lo, hi]`: returns `x` with
/// `g(x) ≈ y`, stopping once either the residual or the bracket is inside
/// `precision`.
pub fn bisect<G>(g: G, lo: f64, hi: f64, y: f64, precision: f64) -> Result<f64, NumericError>
where
    G: Fn(f64) -> f64,
{
    let mut lo = lo;
    let mut hi = hi;
    let mut mid = (lo + hi) / 2.0;
    let mut y_mid = g(mid);

    let mut iterations = 0;
    while (y - y_mid).abs() > precision && hi - lo > precision {
        if !y_mid.is_finite() {
            return Err(NumericError::NonFinite("bisection probe"));
        }
        if y_mid > y {
            lo = mid;
        } else {
            hi = mid;
        }
        mid = (lo + hi) / 2.0;
        y_mid = g(mid);

        iterations += 1;
        if iterations >= MAX_ITERATIONS {
            return Err(NumericError::IterationLimit {
                limit: MAX_ITERATIONS,
                residual: (y - y_mid).abs(),
            });
        }
    }
    Ok(mid)
}
