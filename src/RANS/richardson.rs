use crate::errors::ConvergenceError;

/// Safety factor of the three-mesh GCI. Fixed, not a user setting.
pub const GCI_SAFETY_FACTOR: f64 = 1.25;
/// |r^p - 1| below this value makes the extrapolation undefined
pub const RATIO_POWER_TOLERANCE: f64 = 1e-10;

/// Richardson extrapolation and error bands of one coordinate row.
#[derive(Debug, Clone, PartialEq)]
pub struct Extrapolation {
    /// zero-spacing value from the finer/medium pair
    pub fine_medium: f64,
    /// zero-spacing value from the medium/coarser pair
    pub medium_coarse: f64,
    /// |(f1 - f2) / f1|
    pub approx_relative_error: f64,
    /// |(f_ext21 - f1) / f_ext21|
    pub extrapolated_relative_error: f64,
    pub gci: f64,
}

/// (r^p f_fine - f_coarse) / (r^p - 1), `None` when r^p is too close to 1
pub fn richardson_value(ratio: f64, order: f64, fine: f64, coarse: f64) -> Option<f64> {
    let rp = ratio.powf(order);
    if !rp.is_finite() || (rp - 1.0).abs() < RATIO_POWER_TOLERANCE {
        return None;
    }
    Some((rp * fine - coarse) / (rp - 1.0))
}

/// Extrapolated values, relative errors and GCI of one row.
/// `values` are ordered finer, medium, coarser.
pub fn extrapolate_row(
    coordinate: f64,
    values: [f64; 3],
    r21: f64,
    r32: f64,
    order: f64,
) -> Result<Extrapolation, ConvergenceError> {
    let [finer, medium, coarser] = values;
    let undefined = |ratio: f64| ConvergenceError::ExtrapolationUndefined {
        coordinate,
        ratio_power: ratio.powf(order),
    };
    let fine_medium = richardson_value(r21, order, finer, medium).ok_or_else(|| undefined(r21))?;
    let medium_coarse =
        richardson_value(r32, order, medium, coarser).ok_or_else(|| undefined(r32))?;

    let approx_relative_error = ((finer - medium) / finer).abs();
    let extrapolated_relative_error = ((fine_medium - finer) / fine_medium).abs();
    let gci = GCI_SAFETY_FACTOR * approx_relative_error / (r21.powf(order) - 1.0);
    if !(approx_relative_error.is_finite()
        && extrapolated_relative_error.is_finite()
        && gci.is_finite())
    {
        // a zero finer value or a zero extrapolated value leaves the relative errors undefined
        return Err(undefined(r21));
    }
    Ok(Extrapolation {
        fine_medium,
        medium_coarse,
        approx_relative_error,
        extrapolated_relative_error,
        gci,
    })
}
