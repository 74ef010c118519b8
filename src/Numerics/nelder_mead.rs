use log::debug;

/// Result of a minimization, converged or not.
#[derive(Debug, Clone, PartialEq)]
pub struct MinimizationReport {
    pub x: Vec<f64>,
    pub fun: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// Nelder-Mead simplex minimizer with the standard coefficients
/// (reflection 1, expansion 2, contraction 1/2, shrink 1/2).
///
/// Converges when both the spread of the function values over the simplex and the
/// largest distance of a vertex to the best one are below `tolerance`.
#[derive(Debug, Clone)]
pub struct NelderMead {
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl Default for NelderMead {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            max_iterations: 1000,
        }
    }
}

const REFLECTION: f64 = 1.0;
const EXPANSION: f64 = 2.0;
const CONTRACTION: f64 = 0.5;
const SHRINK: f64 = 0.5;
/// relative size of the initial simplex edges
const INITIAL_STEP: f64 = 0.05;
/// edge used for a zero starting coordinate
const ZERO_STEP: f64 = 0.00025;

impl NelderMead {
    pub fn new(tolerance: f64, max_iterations: usize) -> Self {
        Self {
            tolerance,
            max_iterations,
        }
    }

    /// Minimizes `f` starting from `x0`. Non-finite function values are treated as +inf,
    /// so the simplex is pushed back into the region where `f` is defined.
    pub fn minimize<F>(&self, f: F, x0: &[f64]) -> MinimizationReport
    where
        F: Fn(&[f64]) -> f64,
    {
        let eval = |x: &[f64]| {
            let v = f(x);
            if v.is_finite() { v } else { f64::INFINITY }
        };
        let n = x0.len();
        let f0 = eval(x0);
        if n == 0 || !f0.is_finite() {
            return MinimizationReport {
                x: x0.to_vec(),
                fun: f0,
                iterations: 0,
                converged: false,
            };
        }

        let mut simplex: Vec<(Vec<f64>, f64)> = Vec::with_capacity(n + 1);
        simplex.push((x0.to_vec(), f0));
        for i in 0..n {
            let mut vertex = x0.to_vec();
            vertex[i] = if vertex[i] != 0.0 {
                vertex[i] * (1.0 + INITIAL_STEP)
            } else {
                ZERO_STEP
            };
            let fv = eval(&vertex);
            simplex.push((vertex, fv));
        }

        let mut iterations = 0;
        while iterations < self.max_iterations {
            simplex.sort_by(|a, b| a.1.total_cmp(&b.1));
            if self.has_converged(&simplex) {
                let (x, fun) = simplex.swap_remove(0);
                debug!("Nelder-Mead converged in {} iterations", iterations);
                return MinimizationReport {
                    x,
                    fun,
                    iterations,
                    converged: true,
                };
            }
            iterations += 1;

            // centroid of every vertex except the worst
            let mut centroid = vec![0.0; n];
            for (vertex, _) in &simplex[..n] {
                for (c, v) in centroid.iter_mut().zip(vertex) {
                    *c += v / n as f64;
                }
            }
            let worst = simplex[n].clone();
            let along = |coefficient: f64| -> Vec<f64> {
                centroid
                    .iter()
                    .zip(&worst.0)
                    .map(|(c, w)| c + coefficient * (c - w))
                    .collect()
            };

            let reflected = along(REFLECTION);
            let f_reflected = eval(&reflected);
            if f_reflected < simplex[0].1 {
                let expanded = along(EXPANSION);
                let f_expanded = eval(&expanded);
                simplex[n] = if f_expanded < f_reflected {
                    (expanded, f_expanded)
                } else {
                    (reflected, f_reflected)
                };
                continue;
            }
            if f_reflected < simplex[n - 1].1 {
                simplex[n] = (reflected, f_reflected);
                continue;
            }
            // contraction, outside when the reflected point improves on the worst one
            let (contracted, f_contracted) = if f_reflected < worst.1 {
                let x = along(CONTRACTION * REFLECTION);
                let fx = eval(&x);
                (x, fx)
            } else {
                let x = along(-CONTRACTION);
                let fx = eval(&x);
                (x, fx)
            };
            if f_contracted < worst.1.min(f_reflected) {
                simplex[n] = (contracted, f_contracted);
                continue;
            }
            // shrink toward the best vertex
            let best = simplex[0].0.clone();
            for vertex in simplex.iter_mut().skip(1) {
                let shrunk: Vec<f64> = best
                    .iter()
                    .zip(&vertex.0)
                    .map(|(b, v)| b + SHRINK * (v - b))
                    .collect();
                let fv = eval(&shrunk);
                *vertex = (shrunk, fv);
            }
        }

        simplex.sort_by(|a, b| a.1.total_cmp(&b.1));
        let converged = self.has_converged(&simplex);
        let (x, fun) = simplex.swap_remove(0);
        MinimizationReport {
            x,
            fun,
            iterations,
            converged,
        }
    }

    /// expects the simplex sorted by function value
    fn has_converged(&self, simplex: &[(Vec<f64>, f64)]) -> bool {
        let (best, f_best) = (&simplex[0].0, simplex[0].1);
        if !f_best.is_finite() {
            return false;
        }
        let f_spread = simplex
            .iter()
            .map(|(_, fv)| (fv - f_best).abs())
            .fold(0.0, f64::max);
        let x_spread = simplex
            .iter()
            .flat_map(|(v, _)| v.iter().zip(best).map(|(a, b)| (a - b).abs()))
            .fold(0.0, f64::max);
        f_spread <= self.tolerance && x_spread <= self.tolerance
    }
}
