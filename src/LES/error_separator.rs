use crate::Mesh::spacing_model::LesScales;
use crate::Numerics::nelder_mead::NelderMead;
use crate::errors::ConvergenceError;
use RustedSciThe::numerical::NR::NR;
use RustedSciThe::symbolic::symbolic_engine::Expr;
use log::debug;
use nalgebra::{DMatrix, DVector};

/// numerical error order assumed by the three-level method
pub const ASSUMED_NUMERICAL_ORDER: f64 = 1.7;
/// modelling error order assumed by the three-level method
pub const ASSUMED_MODELING_ORDER: f64 = 1.5;
/// (Sc, cn, cm, pn, pm) the five-level iteration starts from
pub const DEFAULT_INITIAL_GUESS: [f64; 5] = [0.007, 1.0, 1.0, 1.7, 1.5];
/// |denominator| of the closed-form solution below which separation is undefined
pub const SEPARATION_TOLERANCE: f64 = 1e-12;

/// Error model of one sample row, shared by all mesh levels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LesErrorModel {
    /// zero-spacing value
    pub sc: f64,
    pub numerical_constant: f64,
    pub modeling_constant: f64,
    pub numerical_order: f64,
    pub modeling_order: f64,
}

impl LesErrorModel {
    /// cn (r^i h*)^pn
    pub fn numerical_error(&self, level: usize, scales: &LesScales) -> f64 {
        let length = scales.mean_ratio.powi(level as i32) * scales.hstar;
        self.numerical_constant * length.powf(self.numerical_order)
    }

    /// cm (r^i delta)^pm
    pub fn modeling_error(&self, level: usize, scales: &LesScales) -> f64 {
        let length = scales.mean_ratio.powi(level as i32) * scales.delta;
        self.modeling_constant * length.powf(self.modeling_order)
    }

    pub fn total_error(&self, level: usize, scales: &LesScales) -> f64 {
        self.numerical_error(level, scales) + self.modeling_error(level, scales)
    }

    /// value the model predicts on mesh `level`
    pub fn predicted(&self, level: usize, scales: &LesScales) -> f64 {
        self.sc + self.total_error(level, scales)
    }
}

/// Closed-form separation from the three finest levels with fixed orders `pn`, `pm`.
/// `samples` are ordered finest to coarsest.
pub fn three_level_separation(
    samples: [f64; 3],
    scales: &LesScales,
    numerical_order: f64,
    modeling_order: f64,
) -> Result<LesErrorModel, ConvergenceError> {
    let [s1, s2, s3] = samples;
    let r = scales.mean_ratio;
    let a = r.powf(numerical_order);
    let b = r.powf(modeling_order);
    let ab = r.powf(numerical_order + modeling_order);
    let bb = r.powf(2.0 * modeling_order);

    let denominator = (a - 1.0) * ((ab - bb) - (a - b));
    if !denominator.is_finite() || denominator.abs() < SEPARATION_TOLERANCE {
        return Err(ConvergenceError::SeparationUndefined { denominator });
    }
    let modeling_denominator = (a - b - ab + bb) * scales.delta.powf(modeling_order);
    if !modeling_denominator.is_finite() || modeling_denominator.abs() < SEPARATION_TOLERANCE {
        return Err(ConvergenceError::SeparationUndefined {
            denominator: modeling_denominator,
        });
    }

    let cm = (a * (s1 - s2) - (s2 - s3)) / modeling_denominator;
    let sc = ((a * s1 - s2) * (ab - bb) - (a * s2 - s3) * (a - b)) / denominator;
    let cn = (s1 - sc - cm * scales.delta.powf(modeling_order))
        / scales.hstar.powf(numerical_order);
    Ok(LesErrorModel {
        sc,
        numerical_constant: cn,
        modeling_constant: cm,
        numerical_order,
        modeling_order,
    })
}

/// lowest order of the starting-point scan; the scan steps by the same amount
const ORDER_SCAN_STEP: f64 = 0.1;
const ORDER_SCAN_POINTS: usize = 40;
/// simplex settings for polishing the scanned orders
const ORDER_POLISH: NelderMead = NelderMead {
    tolerance: 1e-12,
    max_iterations: 2000,
};

/// F_i(Sc, cn, cm, pn, pm) = cn (r^i h*)^pn + cm (r^i delta)^pm - (s_i - Sc), i = 0..4,
/// divided by max(1, max |s_i|) so the tolerance is relative for large values.
///
/// For fixed orders the system is linear in (Sc, cn, cm); the starting point of the
/// Newton iteration comes from least squares on that linear part over a scan of
/// orders, polished by a simplex search on the orders only.
pub struct FiveLevelSystem<'a> {
    samples: [f64; 5],
    scales: &'a LesScales,
    scale: f64,
}

impl<'a> FiveLevelSystem<'a> {
    pub fn new(samples: [f64; 5], scales: &'a LesScales) -> Self {
        let scale = samples.iter().fold(1.0f64, |acc, s| acc.max(s.abs()));
        Self {
            samples,
            scales,
            scale,
        }
    }

    fn lengths(&self, level: usize) -> (f64, f64) {
        let ri = self.scales.mean_ratio.powi(level as i32);
        (ri * self.scales.hstar, ri * self.scales.delta)
    }

    /// scaled residuals at x = (Sc, cn, cm, pn, pm)
    pub fn residual(&self, x: &[f64; 5]) -> [f64; 5] {
        let [sc, cn, cm, pn, pm] = *x;
        let mut f = [0.0; 5];
        for (i, (fi, &s)) in f.iter_mut().zip(&self.samples).enumerate() {
            let (a, b) = self.lengths(i);
            *fi = (cn * a.powf(pn) + cm * b.powf(pm) - (s - sc)) / self.scale;
        }
        f
    }

    /// max |F_i|, +inf when any residual is not finite
    pub fn residual_norm(&self, x: &[f64; 5]) -> f64 {
        self.residual(x).iter().fold(0.0f64, |acc, f| {
            if f.is_finite() { acc.max(f.abs()) } else { f64::INFINITY }
        })
    }

    /// Least-squares (Sc, cn, cm) for fixed orders, with the 2-norm of the scaled residual.
    fn linear_fit(&self, pn: f64, pm: f64) -> Option<([f64; 5], f64)> {
        let mut design = DMatrix::from_fn(5, 3, |i, j| {
            let (a, b) = self.lengths(i);
            match j {
                0 => 1.0,
                1 => a.powf(pn),
                _ => b.powf(pm),
            }
        });
        if design.iter().any(|v| !v.is_finite()) {
            return None;
        }
        // columns differ by orders of magnitude, solve with unit columns
        let norms: Vec<f64> = design.column_iter().map(|c| c.norm()).collect();
        if norms.iter().any(|&n| n == 0.0) {
            return None;
        }
        for (j, &n) in norms.iter().enumerate() {
            design.column_mut(j).unscale_mut(n);
        }
        let rhs = DVector::from_row_slice(&self.samples) / self.scale;
        let c = design.svd(true, true).solve(&rhs, 1e-12).ok()?;
        let x = [
            c[0] / norms[0] * self.scale,
            c[1] / norms[1] * self.scale,
            c[2] / norms[2] * self.scale,
            pn,
            pm,
        ];
        let r = self.residual(&x);
        let norm = r.iter().map(|v| v * v).sum::<f64>().sqrt();
        norm.is_finite().then_some((x, norm))
    }

    /// Starting point for the Newton iteration: the best of `guess` and the scanned
    /// orders, then the orders polished with the linear part eliminated.
    pub fn starting_point(&self, guess: [f64; 5]) -> [f64; 5] {
        let guess_norm = self
            .residual(&guess)
            .iter()
            .map(|v| v * v)
            .sum::<f64>()
            .sqrt();
        let mut best = (guess, if guess_norm.is_finite() { guess_norm } else { f64::INFINITY });
        for i in 1..=ORDER_SCAN_POINTS {
            for j in 1..=ORDER_SCAN_POINTS {
                let pn = i as f64 * ORDER_SCAN_STEP;
                let pm = j as f64 * ORDER_SCAN_STEP;
                if let Some((x, norm)) = self.linear_fit(pn, pm) {
                    if norm < best.1 {
                        best = (x, norm);
                    }
                }
            }
        }
        let polished = ORDER_POLISH.minimize(
            |p| self.linear_fit(p[0], p[1]).map_or(f64::INFINITY, |(_, n)| n),
            &[best.0[3], best.0[4]],
        );
        match self.linear_fit(polished.x[0], polished.x[1]) {
            Some((x, norm)) if norm <= best.1 => x,
            _ => best.0,
        }
    }

    /// symbolic scaled residuals and the names of the unknowns, in (Sc, cn, cm, pn, pm) order
    fn equations(&self) -> (Vec<Expr>, Vec<String>) {
        let unknowns = Expr::Symbols("sc, cn, cm, pn, pm");
        let (sc, cn, cm, pn, pm) = (
            unknowns[0].clone(),
            unknowns[1].clone(),
            unknowns[2].clone(),
            unknowns[3].clone(),
            unknowns[4].clone(),
        );
        let eqs = self
            .samples
            .iter()
            .enumerate()
            .map(|(i, &s)| {
                let (a, b) = self.lengths(i);
                // a^p written as exp(p ln a) so the order is differentiable
                let numerical = cn.clone() * Expr::exp(pn.clone() * Expr::Const(a.ln()));
                let modeling = cm.clone() * Expr::exp(pm.clone() * Expr::Const(b.ln()));
                (numerical + modeling + sc.clone() - Expr::Const(s)) / Expr::Const(self.scale)
            })
            .collect();
        let names = unknowns.iter().map(|x| x.to_string()).collect();
        (eqs, names)
    }

    /// Newton-Raphson from `start`; None when the solver produced no result.
    fn newton(&self, start: [f64; 5], tolerance: f64, max_iterations: usize) -> Option<[f64; 5]> {
        let (eqs, unknowns) = self.equations();
        let mut solver = NR::new();
        solver.set_equation_system(eqs, Some(unknowns), start.to_vec(), tolerance, max_iterations);
        solver.set_solver_params(Some("info".to_string()), None, None, None, None, None);
        solver.eq_generate();
        solver.solve();
        let solution = solver.get_result()?;
        if solution.len() != 5 {
            return None;
        }
        Some([solution[0], solution[1], solution[2], solution[3], solution[4]])
    }
}

impl LesErrorModel {
    /// The other root of the five-level system: with hstar and delta refined by the same
    /// ratio, the numerical and modelling terms can trade places.
    pub fn swapped(&self, scales: &LesScales) -> LesErrorModel {
        LesErrorModel {
            sc: self.sc,
            numerical_constant: self.modeling_constant
                * (scales.delta / scales.hstar).powf(self.modeling_order),
            modeling_constant: self.numerical_constant
                * (scales.hstar / scales.delta).powf(self.numerical_order),
            numerical_order: self.modeling_order,
            modeling_order: self.numerical_order,
        }
    }

    fn order_distance(&self, pn: f64, pm: f64) -> f64 {
        (self.numerical_order - pn).abs() + (self.modeling_order - pm).abs()
    }
}

/// Solves the five-level system for (Sc, cn, cm, pn, pm). Non-convergence is fatal.
///
/// `tolerance` bounds the largest scaled residual. Of the two equivalent roots the one
/// with orders closest to those of `initial_guess` is returned.
pub fn five_level_separation(
    samples: [f64; 5],
    scales: &LesScales,
    tolerance: f64,
    max_iterations: usize,
    initial_guess: [f64; 5],
) -> Result<LesErrorModel, ConvergenceError> {
    let system = FiveLevelSystem::new(samples, scales);
    let start = system.starting_point(initial_guess);
    debug!("five-level LES system starts from {:?}", start);
    let start_residual = system.residual_norm(&start);
    let x = match system.newton(start, tolerance, max_iterations) {
        Some(x) if system.residual_norm(&x) <= start_residual => x,
        _ => start,
    };
    let residual = system.residual_norm(&x);
    if !(residual <= tolerance) || !x.iter().all(|v| v.is_finite()) {
        return Err(ConvergenceError::LesSystemUnsolved {
            iterations: max_iterations,
            residual,
        });
    }
    debug!("five-level LES system solved, residual {:.3e}: {:?}", residual, x);
    let model = LesErrorModel {
        sc: x[0],
        numerical_constant: x[1],
        modeling_constant: x[2],
        numerical_order: x[3],
        modeling_order: x[4],
    };
    let swapped = model.swapped(scales);
    let (pn, pm) = (initial_guess[3], initial_guess[4]);
    if swapped.order_distance(pn, pm) < model.order_distance(pn, pm) {
        Ok(swapped)
    } else {
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn scales() -> LesScales {
        LesScales {
            delta: 0.1,
            hstar: 0.05,
            mean_ratio: 2.0,
            hstar_per_mesh: vec![],
        }
    }

    fn synthetic(model: &LesErrorModel, scales: &LesScales, levels: usize) -> Vec<f64> {
        (0..levels).map(|i| model.predicted(i, scales)).collect()
    }

    #[test]
    fn test_three_level_recovers_generating_model() {
        let scales = scales();
        let truth = LesErrorModel {
            sc: 1.2,
            numerical_constant: 0.8,
            modeling_constant: -0.4,
            numerical_order: ASSUMED_NUMERICAL_ORDER,
            modeling_order: ASSUMED_MODELING_ORDER,
        };
        let s = synthetic(&truth, &scales, 3);
        let model = three_level_separation(
            [s[0], s[1], s[2]],
            &scales,
            ASSUMED_NUMERICAL_ORDER,
            ASSUMED_MODELING_ORDER,
        )
        .unwrap();
        assert_relative_eq!(model.sc, truth.sc, epsilon = 1e-9);
        assert_relative_eq!(model.numerical_constant, truth.numerical_constant, epsilon = 1e-7);
        assert_relative_eq!(model.modeling_constant, truth.modeling_constant, epsilon = 1e-7);
        for level in 0..3 {
            assert_relative_eq!(model.predicted(level, &scales), s[level], epsilon = 1e-10);
        }
    }

    #[test]
    fn test_three_level_unit_ratio_is_undefined() {
        let mut scales = scales();
        scales.mean_ratio = 1.0;
        assert!(matches!(
            three_level_separation([1.0, 1.1, 1.2], &scales, 1.7, 1.5),
            Err(ConvergenceError::SeparationUndefined { .. })
        ));
    }

    #[test]
    fn test_three_level_equal_orders_are_undefined() {
        assert!(matches!(
            three_level_separation([1.0, 1.1, 1.2], &scales(), 1.5, 1.5),
            Err(ConvergenceError::SeparationUndefined { .. })
        ));
    }

    #[test]
    fn test_five_level_residual_vanishes_at_generating_model() {
        let scales = scales();
        let truth = LesErrorModel {
            sc: 0.2,
            numerical_constant: 1.1,
            modeling_constant: 0.6,
            numerical_order: 1.8,
            modeling_order: 1.2,
        };
        let s = synthetic(&truth, &scales, 5);
        let system = FiveLevelSystem::new([s[0], s[1], s[2], s[3], s[4]], &scales);
        assert!(system.residual_norm(&[0.2, 1.1, 0.6, 1.8, 1.2]) < 1e-14);
        assert!(system.residual_norm(&[0.2, 1.1, 0.6, 1.8, 1.3]) > 1e-3);
    }

    fn assert_recovers(truth: &LesErrorModel, scales: &LesScales, sc_eps: f64, eps: f64) {
        let s = synthetic(truth, scales, 5);
        let model = five_level_separation(
            [s[0], s[1], s[2], s[3], s[4]],
            scales,
            1e-10,
            200,
            DEFAULT_INITIAL_GUESS,
        )
        .unwrap();
        assert_relative_eq!(model.sc, truth.sc, epsilon = sc_eps);
        assert_relative_eq!(model.numerical_order, truth.numerical_order, epsilon = eps);
        assert_relative_eq!(model.modeling_order, truth.modeling_order, epsilon = eps);
        assert_relative_eq!(
            model.numerical_constant,
            truth.numerical_constant,
            max_relative = eps
        );
        assert_relative_eq!(
            model.modeling_constant,
            truth.modeling_constant,
            max_relative = eps
        );
    }

    #[test]
    fn test_five_level_recovers_generating_model() {
        let truth = LesErrorModel {
            sc: 0.01,
            numerical_constant: 1.3,
            modeling_constant: 0.8,
            numerical_order: 1.9,
            modeling_order: 1.3,
        };
        assert_recovers(&truth, &scales(), 1e-8, 1e-5);
    }

    #[test]
    fn test_five_level_orders_between_scan_points() {
        let truth = LesErrorModel {
            sc: 0.3,
            numerical_constant: 1.3,
            modeling_constant: 0.8,
            numerical_order: 1.83,
            modeling_order: 1.27,
        };
        assert_recovers(&truth, &scales(), 1e-8, 1e-5);
    }

    /// fine LES: h* two orders of magnitude below the filter width
    fn fine_scales() -> LesScales {
        LesScales {
            delta: 0.08,
            hstar: 0.002,
            mean_ratio: 2.0,
            hstar_per_mesh: vec![],
        }
    }

    #[test]
    fn test_five_level_recovers_realistic_magnitudes() {
        let truth = LesErrorModel {
            sc: 10.0,
            numerical_constant: 50.0,
            modeling_constant: 2.0,
            numerical_order: 1.9,
            modeling_order: 1.3,
        };
        assert_recovers(&truth, &fine_scales(), 1e-7, 1e-4);
        let truth = LesErrorModel {
            numerical_order: 1.87,
            modeling_order: 1.34,
            ..truth
        };
        assert_recovers(&truth, &fine_scales(), 1e-7, 1e-4);
    }

    #[test]
    fn test_five_level_recovers_large_zero_spacing_value() {
        // pressure in Pa: the mesh dependent part is a small fraction of the samples
        let truth = LesErrorModel {
            sc: 101325.0,
            numerical_constant: 5e4,
            modeling_constant: 2e3,
            numerical_order: 1.87,
            modeling_order: 1.34,
        };
        assert_recovers(&truth, &fine_scales(), 1e-3, 1e-3);
    }

    #[test]
    fn test_swapped_model_predicts_the_same_samples() {
        let scales = fine_scales();
        let model = LesErrorModel {
            sc: 1.0,
            numerical_constant: 50.0,
            modeling_constant: 2.0,
            numerical_order: 1.9,
            modeling_order: 1.3,
        };
        let swapped = model.swapped(&scales);
        assert_eq!(swapped.numerical_order, 1.3);
        assert_eq!(swapped.modeling_order, 1.9);
        for level in 0..5 {
            assert_relative_eq!(
                swapped.predicted(level, &scales),
                model.predicted(level, &scales),
                max_relative = 1e-12
            );
        }
        // the root with orders nearest the guess is reported
        let s = synthetic(&model, &scales, 5);
        let flipped = five_level_separation(
            [s[0], s[1], s[2], s[3], s[4]],
            &scales,
            1e-10,
            200,
            [0.0, 1.0, 1.0, 1.2, 2.0],
        )
        .unwrap();
        assert_relative_eq!(flipped.numerical_order, 1.3, epsilon = 1e-4);
        assert_relative_eq!(flipped.modeling_order, 1.9, epsilon = 1e-4);
    }

    #[test]
    fn test_five_level_without_root_is_fatal() {
        // alternating samples: a sum of two powers changes monotonicity at most once
        let scales = scales();
        for max_iterations in [1, 200] {
            let res = five_level_separation(
                [1.0, 2.0, 1.0, 2.0, 1.0],
                &scales,
                1e-10,
                max_iterations,
                DEFAULT_INITIAL_GUESS,
            );
            match res {
                Err(ConvergenceError::LesSystemUnsolved {
                    iterations,
                    residual,
                }) => {
                    assert_eq!(iterations, max_iterations);
                    assert!(residual > 1e-10);
                }
                other => panic!("expected LesSystemUnsolved, got {:?}", other),
            }
        }
    }
}
