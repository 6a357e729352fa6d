//! Tagged results of the smoothing pipelines.
//!
//! Collaborator failures never abort a run. Instead the pipelines fall back
//! to a coarser result and say so here, so callers can tell a smoothed mesh
//! from one that was handed back untouched.

use thiserror::Error;

use crate::mesh::SurfaceMesh;

/// Why a pipeline took a fallback.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Degradation {
    /// No vessel endpoints are shared.
    #[error("no junctions detected")]
    NoJunctions,

    /// Junction detection rejected the vessel data.
    #[error("junction detection failed: {0}")]
    DetectionFailed(String),

    /// The face classifier failed.
    #[error("face classification failed: {0}")]
    ClassificationFailed(String),

    /// The classifier found no wall patch.
    #[error("no wall faces found")]
    NoWalls,

    /// A junction neighborhood could not be smoothed.
    #[error("smoothing of junction {junction} skipped: {reason}")]
    RegionSmoothingFailed {
        /// Junction id.
        junction: usize,
        /// Kernel error message.
        reason: String,
    },

    /// A wall patch could not be smoothed.
    #[error("wall patch {wall} left unsmoothed: {reason}")]
    WallSmoothingFailed {
        /// Wall patch index.
        wall: usize,
        /// Kernel error message.
        reason: String,
    },

    /// A boundary loop was kept as a polyline instead of a cap.
    #[error("boundary {boundary} kept without a cap: {reason}")]
    CapFallback {
        /// Boundary loop index.
        boundary: usize,
        /// Remesher error message.
        reason: String,
    },

    /// The smoothed patches could not be merged.
    #[error("merging smoothed patches failed: {0}")]
    MergeFailed(String),

    /// The repair pass failed.
    #[error("repair failed, result left unrepaired: {0}")]
    RepairFailed(String),
}

/// Result of a smoothing run.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Smoothing applied without fallbacks.
    Smoothed(SurfaceMesh),

    /// Smoothing applied, with local fallbacks.
    Degraded {
        /// The smoothed mesh.
        mesh: SurfaceMesh,
        /// Fallbacks taken, in order.
        reasons: Vec<Degradation>,
    },

    /// The input mesh, returned as is.
    Unchanged {
        /// A copy of the input mesh.
        mesh: SurfaceMesh,
        /// Why nothing was smoothed.
        reason: Degradation,
    },
}

impl Outcome {
    /// `Smoothed` when `reasons` is empty, `Degraded` otherwise.
    pub(crate) fn from_reasons(mesh: SurfaceMesh, reasons: Vec<Degradation>) -> Self {
        if reasons.is_empty() {
            Outcome::Smoothed(mesh)
        } else {
            Outcome::Degraded { mesh, reasons }
        }
    }

    /// The resulting mesh.
    pub fn mesh(&self) -> &SurfaceMesh {
        match self {
            Outcome::Smoothed(mesh)
            | Outcome::Degraded { mesh, .. }
            | Outcome::Unchanged { mesh, .. } => mesh,
        }
    }

    /// Take the resulting mesh.
    pub fn into_mesh(self) -> SurfaceMesh {
        match self {
            Outcome::Smoothed(mesh)
            | Outcome::Degraded { mesh, .. }
            | Outcome::Unchanged { mesh, .. } => mesh,
        }
    }

    /// Whether smoothing was applied without any fallback.
    pub fn is_smoothed(&self) -> bool {
        matches!(self, Outcome::Smoothed(_))
    }

    /// Whether the input mesh was returned untouched.
    pub fn is_unchanged(&self) -> bool {
        matches!(self, Outcome::Unchanged { .. })
    }

    /// Every fallback taken, in order.
    pub fn reasons(&self) -> &[Degradation] {
        match self {
            Outcome::Smoothed(_) => &[],
            Outcome::Degraded { reasons, .. } => reasons,
            Outcome::Unchanged { reason, .. } => std::slice::from_ref(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_reasons() {
        assert!(Outcome::from_reasons(SurfaceMesh::new(), Vec::new()).is_smoothed());

        let outcome = Outcome::from_reasons(SurfaceMesh::new(), vec![Degradation::NoWalls]);
        assert!(!outcome.is_smoothed());
        assert!(!outcome.is_unchanged());
        assert_eq!(outcome.reasons(), &[Degradation::NoWalls]);
    }

    #[test]
    fn test_unchanged_reason() {
        let outcome = Outcome::Unchanged {
            mesh: SurfaceMesh::new(),
            reason: Degradation::NoJunctions,
        };
        assert!(outcome.is_unchanged());
        assert_eq!(outcome.reasons().len(), 1);
        assert_eq!(outcome.reasons()[0].to_string(), "no junctions detected");
    }

    #[test]
    fn test_messages() {
        let reason = Degradation::CapFallback {
            boundary: 2,
            reason: "boundary loop with 3 points is degenerate".into(),
        };
        assert_eq!(
            reason.to_string(),
            "boundary 2 kept without a cap: boundary loop with 3 points is degenerate"
        );
    }
}
