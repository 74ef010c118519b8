use crate::Numerics::nelder_mead::NelderMead;
use crate::errors::ConvergenceError;

/// the classical second-order assumption the search starts from
pub const CLASSICAL_ORDER: f64 = 2.0;

/// Sign of the error ratio e32/e21: +1 monotonic, -1 oscillatory, 0 when e32 vanishes.
pub fn error_sign(ratio: f64) -> f64 {
    if ratio > 0.0 {
        1.0
    } else if ratio < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Right-hand side of the apparent order relation evaluated at the trial order `p`:
/// |ln|e32/e21| + q(p)| / ln(r21), q(p) = ln((r21^p - s)/(r32^p - s)).
/// Only |p| is used so the trial order stays physically positive.
pub fn apparent_order(p: f64, r21: f64, r32: f64, error_ratio: f64, sign: f64) -> f64 {
    let p = p.abs();
    let q = ((r21.powf(p) - sign) / (r32.powf(p) - sign)).ln();
    (error_ratio.abs().ln() + q).abs() / r21.ln()
}

/// Apparent order of one coordinate row.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderEstimate {
    pub e21: f64,
    pub e32: f64,
    pub sign: f64,
    /// p_apparent(p_optimized)
    pub apparent_order: f64,
    /// minimizer of |p - p_apparent(p)|
    pub optimized_order: f64,
    /// optimized - apparent
    pub order_error: f64,
    pub iterations: usize,
}

/// Solves the implicit apparent order relation for one refinement triplet.
#[derive(Debug, Clone)]
pub struct OrderEstimator {
    pub r21: f64,
    pub r32: f64,
    pub initial_order: f64,
    pub minimizer: NelderMead,
}

impl OrderEstimator {
    /// Fails with `DegenerateRefinement` if a ratio is not greater than 1.
    pub fn new(r21: f64, r32: f64) -> Result<Self, ConvergenceError> {
        for (i, ratio) in [r21, r32].into_iter().enumerate() {
            if !(ratio.is_finite() && ratio > 1.0) {
                return Err(ConvergenceError::DegenerateRefinement {
                    finer: i,
                    coarser: i + 1,
                    ratio,
                });
            }
        }
        Ok(Self {
            r21,
            r32,
            initial_order: CLASSICAL_ORDER,
            minimizer: NelderMead::default(),
        })
    }

    pub fn with_solver(mut self, tolerance: f64, max_iterations: usize, initial_order: f64) -> Self {
        self.minimizer = NelderMead::new(tolerance, max_iterations);
        self.initial_order = initial_order;
        self
    }

    /// Apparent order at one row; `finer`, `medium`, `coarser` are the values of the
    /// variable on the three meshes at `coordinate`.
    pub fn estimate_row(
        &self,
        coordinate: f64,
        finer: f64,
        medium: f64,
        coarser: f64,
    ) -> Result<OrderEstimate, ConvergenceError> {
        let e21 = medium - finer;
        let e32 = coarser - medium;
        if e21 == 0.0 {
            return Err(ConvergenceError::DivisionByZero { coordinate });
        }
        let error_ratio = e32 / e21;
        if !error_ratio.is_finite() {
            return Err(ConvergenceError::DivisionByZero { coordinate });
        }
        let sign = error_sign(error_ratio);
        let (r21, r32) = (self.r21, self.r32);

        let residual = |x: &[f64]| {
            let p = x[0].abs();
            (p - apparent_order(p, r21, r32, error_ratio, sign)).abs()
        };
        let report = self.minimizer.minimize(residual, &[self.initial_order]);
        if !report.converged {
            return Err(ConvergenceError::OrderEstimationDidNotConverge {
                coordinate,
                iterations: report.iterations,
            });
        }
        let optimized_order = report.x[0].abs();
        let apparent = apparent_order(optimized_order, r21, r32, error_ratio, sign);
        if !apparent.is_finite() {
            return Err(ConvergenceError::OrderEstimationDidNotConverge {
                coordinate,
                iterations: report.iterations,
            });
        }
        Ok(OrderEstimate {
            e21,
            e32,
            sign,
            apparent_order: apparent,
            optimized_order,
            order_error: optimized_order - apparent,
            iterations: report.iterations,
        })
    }
}
