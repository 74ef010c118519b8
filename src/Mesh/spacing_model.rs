use crate::errors::ConvergenceError;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;

/// maximal number of refinement levels any method accepts
pub const MAX_REFINEMENT_LEVELS: usize = 5;

/// Spatial dimensionality of the analysis: 2D uses the domain area, 3D the domain volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum Dimensionality {
    Two,
    Three,
}

impl Dimensionality {
    /// exponent applied to the mean element measure: 1/2 in 2D, 1/3 in 3D
    pub fn exponent(&self) -> f64 {
        match self {
            Dimensionality::Two => 1.0 / 2.0,
            Dimensionality::Three => 1.0 / 3.0,
        }
    }
}

impl TryFrom<u32> for Dimensionality {
    type Error = ConvergenceError;
    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            2 => Ok(Dimensionality::Two),
            3 => Ok(Dimensionality::Three),
            other => Err(ConvergenceError::InvalidDimension(other)),
        }
    }
}

impl From<Dimensionality> for u32 {
    fn from(dim: Dimensionality) -> u32 {
        match dim {
            Dimensionality::Two => 2,
            Dimensionality::Three => 3,
        }
    }
}

/// Metadata of one mesh level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshDescriptor {
    /// number of elements (cells)
    pub elements: u64,
    /// total volume [m3] or area [m2] of the domain
    pub measure: f64,
    /// time-step size, required by the LES methods only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_step: Option<f64>,
}

impl MeshDescriptor {
    pub fn new(elements: u64, measure: f64) -> Self {
        Self {
            elements,
            measure,
            time_step: None,
        }
    }

    pub fn with_time_step(elements: u64, measure: f64, time_step: f64) -> Self {
        Self {
            elements,
            measure,
            time_step: Some(time_step),
        }
    }
}

/// h = (measure / elements)^(1/d)
pub fn characteristic_length(elements: u64, measure: f64, dim: Dimensionality) -> f64 {
    (measure / elements as f64).powf(dim.exponent())
}

/// Same as [`characteristic_length`] but takes the raw dimensionality, as typed by a user.
pub fn characteristic_length_checked(
    elements: u64,
    measure: f64,
    dimensionality: u32,
) -> Result<f64, ConvergenceError> {
    let dim = Dimensionality::try_from(dimensionality)?;
    Ok(characteristic_length(elements, measure, dim))
}

/// Length and time scales shared by the LES error models.
#[derive(Debug, Clone, PartialEq)]
pub struct LesScales {
    /// largest characteristic length of the study
    pub delta: f64,
    /// mean of the per-mesh sqrt(h_i * dt_i)
    pub hstar: f64,
    /// mean of the adjacent refinement ratios
    pub mean_ratio: f64,
    pub hstar_per_mesh: Vec<f64>,
}

/// Validated, ordered set of meshes (finest first) with their spacings and refinement ratios.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshHierarchy {
    meshes: Vec<MeshDescriptor>,
    dimensionality: Dimensionality,
    spacings: Vec<f64>,
    ratios: Vec<f64>,
}

impl MeshHierarchy {
    /// Builds the hierarchy and rejects every ordering that is not strictly finer -> coarser.
    pub fn new(
        meshes: Vec<MeshDescriptor>,
        dimensionality: Dimensionality,
    ) -> Result<Self, ConvergenceError> {
        if meshes.len() < 2 {
            return Err(ConvergenceError::InvalidInput(format!(
                "at least 2 meshes are needed for a refinement study, got {}",
                meshes.len()
            )));
        }
        if meshes.len() > MAX_REFINEMENT_LEVELS {
            return Err(ConvergenceError::InvalidInput(format!(
                "at most {} refinement levels are supported, got {}",
                MAX_REFINEMENT_LEVELS,
                meshes.len()
            )));
        }
        for (i, mesh) in meshes.iter().enumerate() {
            if mesh.elements == 0 {
                return Err(ConvergenceError::InvalidInput(format!(
                    "mesh {} has no elements",
                    i
                )));
            }
            if !(mesh.measure.is_finite() && mesh.measure > 0.0) {
                return Err(ConvergenceError::InvalidInput(format!(
                    "mesh {} has a non-positive domain measure {}",
                    i, mesh.measure
                )));
            }
        }

        let spacings: Vec<f64> = meshes
            .iter()
            .map(|m| characteristic_length(m.elements, m.measure, dimensionality))
            .collect();
        let mut ratios = Vec::with_capacity(meshes.len() - 1);
        for i in 0..meshes.len() - 1 {
            let ratio = spacings[i + 1] / spacings[i];
            if meshes[i + 1].elements >= meshes[i].elements || !(ratio > 1.0) {
                return Err(ConvergenceError::DegenerateRefinement {
                    finer: i,
                    coarser: i + 1,
                    ratio,
                });
            }
            ratios.push(ratio);
        }
        debug!("mesh spacings {:?}, refinement ratios {:?}", spacings, ratios);
        info!(
            "{} meshes accepted, refinement ratios: {:?}",
            meshes.len(),
            ratios
        );
        Ok(Self {
            meshes,
            dimensionality,
            spacings,
            ratios,
        })
    }

    pub fn levels(&self) -> usize {
        self.meshes.len()
    }

    pub fn meshes(&self) -> &[MeshDescriptor] {
        &self.meshes
    }

    pub fn dimensionality(&self) -> Dimensionality {
        self.dimensionality
    }

    pub fn spacings(&self) -> &[f64] {
        &self.spacings
    }

    /// r_i = h_{i+1} / h_i for every adjacent pair
    pub fn refinement_ratios(&self) -> &[f64] {
        &self.ratios
    }

    pub fn mean_refinement_ratio(&self) -> f64 {
        self.ratios.iter().sum::<f64>() / self.ratios.len() as f64
    }

    /// delta, hstar and the mean refinement ratio used by the LES error separation.
    /// Every mesh must carry a positive time step.
    pub fn les_scales(&self) -> Result<LesScales, ConvergenceError> {
        let mut hstar_per_mesh = Vec::with_capacity(self.meshes.len());
        for (i, (mesh, h)) in self.meshes.iter().zip(&self.spacings).enumerate() {
            let dt = match mesh.time_step {
                Some(dt) if dt.is_finite() && dt > 0.0 => dt,
                Some(dt) => {
                    return Err(ConvergenceError::InvalidInput(format!(
                        "mesh {} has a non-positive time step {}",
                        i, dt
                    )));
                }
                None => {
                    return Err(ConvergenceError::InvalidInput(format!(
                        "mesh {} has no time step, LES analysis needs one per mesh",
                        i
                    )));
                }
            };
            hstar_per_mesh.push((h * dt).sqrt());
        }
        let delta = self.spacings.iter().cloned().fold(f64::MIN, f64::max);
        let hstar = hstar_per_mesh.iter().sum::<f64>() / hstar_per_mesh.len() as f64;
        Ok(LesScales {
            delta,
            hstar,
            mean_ratio: self.mean_refinement_ratio(),
            hstar_per_mesh,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn three_meshes() -> Vec<MeshDescriptor> {
        vec![
            MeshDescriptor::new(8000, 1.0),
            MeshDescriptor::new(1000, 1.0),
            MeshDescriptor::new(125, 1.0),
        ]
    }

    #[test]
    fn test_characteristic_length_3d() {
        let h = characteristic_length(1000, 1.0, Dimensionality::Three);
        assert_relative_eq!(h, 0.1, epsilon = 1e-12);
        assert_relative_eq!(
            h,
            1.0f64.powf(1.0 / 3.0) / 1000f64.powf(1.0 / 3.0),
            epsilon = 1e-14
        );
    }

    #[test]
    fn test_characteristic_length_2d() {
        let h = characteristic_length_checked(400, 4.0, 2).unwrap();
        assert_relative_eq!(h, 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_invalid_dimension() {
        for dim in [0u32, 1, 4, 7] {
            let res = characteristic_length_checked(1000, 1.0, dim);
            assert_eq!(res, Err(ConvergenceError::InvalidDimension(dim)));
        }
        assert_eq!(Dimensionality::try_from(2), Ok(Dimensionality::Two));
        assert_eq!(Dimensionality::try_from(3), Ok(Dimensionality::Three));
    }

    #[test]
    fn test_refinement_ratios() {
        let hierarchy = MeshHierarchy::new(three_meshes(), Dimensionality::Three).unwrap();
        assert_eq!(hierarchy.levels(), 3);
        let r = hierarchy.refinement_ratios();
        assert_relative_eq!(r[0], 2.0, epsilon = 1e-12);
        assert_relative_eq!(r[1], 2.0, epsilon = 1e-12);
        assert_relative_eq!(hierarchy.mean_refinement_ratio(), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_equal_meshes_are_degenerate() {
        let meshes = vec![
            MeshDescriptor::new(1000, 1.0),
            MeshDescriptor::new(1000, 1.0),
            MeshDescriptor::new(125, 1.0),
        ];
        match MeshHierarchy::new(meshes, Dimensionality::Three) {
            Err(ConvergenceError::DegenerateRefinement {
                finer,
                coarser,
                ratio,
            }) => {
                assert_eq!((finer, coarser), (0, 1));
                assert_relative_eq!(ratio, 1.0, epsilon = 1e-12);
            }
            other => panic!("expected DegenerateRefinement, got {:?}", other),
        }
    }

    #[test]
    fn test_reversed_order_is_degenerate() {
        let mut meshes = three_meshes();
        meshes.reverse();
        assert!(matches!(
            MeshHierarchy::new(meshes, Dimensionality::Three),
            Err(ConvergenceError::DegenerateRefinement { .. })
        ));
    }

    #[test]
    fn test_too_many_levels() {
        let meshes: Vec<MeshDescriptor> = (0..6)
            .map(|i| MeshDescriptor::new(100_000 / 2u64.pow(i), 1.0))
            .collect();
        assert!(matches!(
            MeshHierarchy::new(meshes, Dimensionality::Three),
            Err(ConvergenceError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_les_scales() {
        let meshes = vec![
            MeshDescriptor::with_time_step(8000, 1.0, 0.01),
            MeshDescriptor::with_time_step(1000, 1.0, 0.02),
            MeshDescriptor::with_time_step(125, 1.0, 0.04),
        ];
        let hierarchy = MeshHierarchy::new(meshes, Dimensionality::Three).unwrap();
        let scales = hierarchy.les_scales().unwrap();
        assert_relative_eq!(scales.delta, 0.2, epsilon = 1e-12);
        assert_relative_eq!(scales.hstar_per_mesh[0], (0.05f64 * 0.01).sqrt(), epsilon = 1e-12);
        let expected = ((0.05f64 * 0.01).sqrt() + (0.1f64 * 0.02).sqrt() + (0.2f64 * 0.04).sqrt())
            / 3.0;
        assert_relative_eq!(scales.hstar, expected, epsilon = 1e-12);
        assert_relative_eq!(scales.mean_ratio, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_les_scales_need_time_steps() {
        let hierarchy = MeshHierarchy::new(three_meshes(), Dimensionality::Three).unwrap();
        assert!(matches!(
            hierarchy.les_scales(),
            Err(ConvergenceError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_dimensionality_serde() {
        let dim: Dimensionality = serde_json::from_str("3").unwrap();
        assert_eq!(dim, Dimensionality::Three);
        assert_eq!(serde_json::to_string(&Dimensionality::Two).unwrap(), "2");
        assert!(serde_json::from_str::<Dimensionality>("5").is_err());
    }
}
