//! Geometry primitives the junction pipelines call into.
//!
//! Each primitive sits behind a trait so a caller can swap in its own
//! smoothing kernel, classifier, remesher or repair pass. The built-in
//! implementations wrap the algorithms in [`crate::algo`].
//!
//! ```
//! use vascular_junctions::collaborators::{Collaborators, TaubinKernel};
//!
//! let collaborators = Collaborators::default().with_kernel(TaubinKernel);
//! # let _ = collaborators;
//! ```

use crate::algo::cap::{generate_cap, CapOptions};
use crate::algo::classify::{classify_faces, ClassifyOptions, FaceClassification};
use crate::algo::repair::{repair_mesh, RepairParams};
use crate::algo::smooth::{taubin_smooth, SmoothOptions};
use crate::error::{JunctionError, Result};
use crate::mesh::{BoundaryLoop, SurfaceMesh};

/// Smooths a mesh, returning one with the same number of points.
pub trait SmoothingKernel: Send + Sync {
    /// Return a smoothed copy of `mesh`.
    fn smooth(&self, mesh: &SurfaceMesh, options: &SmoothOptions) -> Result<SurfaceMesh>;
}

/// Splits a mesh into wall patches, cap patches and the edges between them.
///
/// `feature_angle` is an optional hint in degrees.
pub trait FaceClassifier: Send + Sync {
    /// Classify every face of `mesh`.
    fn extract_faces(
        &self,
        mesh: &SurfaceMesh,
        feature_angle: Option<f64>,
    ) -> Result<FaceClassification>;
}

/// Builds a surface patch closing a boundary loop.
pub trait CapRemesher: Send + Sync {
    /// With `surface_constraint` the loop's points and edges must appear
    /// unchanged on the boundary of the returned patch.
    fn remesh_surface(
        &self,
        boundary: &BoundaryLoop,
        surface_constraint: bool,
        target_element_size: f64,
    ) -> Result<SurfaceMesh>;
}

/// Restores a usable surface after smoothing and merging.
pub trait MeshRepairer: Send + Sync {
    /// Return a repaired copy of `mesh`.
    fn repair(&self, mesh: &SurfaceMesh) -> Result<SurfaceMesh>;
}

/// Taubin λ|μ smoothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaubinKernel;

impl SmoothingKernel for TaubinKernel {
    fn smooth(&self, mesh: &SurfaceMesh, options: &SmoothOptions) -> Result<SurfaceMesh> {
        mesh.validate()?;
        if !(options.pass_band > 0.0 && options.pass_band < 1.0) {
            return Err(JunctionError::invalid_param(
                "pass_band",
                options.pass_band,
                "must be in (0, 1)",
            ));
        }
        let mut smoothed = mesh.clone();
        taubin_smooth(&mut smoothed, options);
        Ok(smoothed)
    }
}

/// Feature-angle flood fill with a planarity test for caps.
#[derive(Debug, Clone, Default)]
pub struct FeatureAngleClassifier {
    /// Angles used when no hint is passed.
    pub options: ClassifyOptions,
}

impl FaceClassifier for FeatureAngleClassifier {
    fn extract_faces(
        &self,
        mesh: &SurfaceMesh,
        feature_angle: Option<f64>,
    ) -> Result<FaceClassification> {
        match feature_angle {
            Some(angle) => classify_faces(mesh, &self.options.clone().with_feature_angle(angle)),
            None => classify_faces(mesh, &self.options),
        }
    }
}

/// Ear clipping followed by interior refinement and relaxation.
#[derive(Debug, Clone, Copy)]
pub struct LoopCapRemesher {
    /// Laplacian iterations on interior cap points.
    pub relaxation_iterations: usize,
}

impl Default for LoopCapRemesher {
    fn default() -> Self {
        Self {
            relaxation_iterations: 3,
        }
    }
}

impl CapRemesher for LoopCapRemesher {
    fn remesh_surface(
        &self,
        boundary: &BoundaryLoop,
        surface_constraint: bool,
        target_element_size: f64,
    ) -> Result<SurfaceMesh> {
        let options = CapOptions::with_target_length(target_element_size)
            .with_surface_constraint(surface_constraint)
            .with_relaxation_iterations(self.relaxation_iterations);
        let mut cap = generate_cap(boundary, &options)?;
        cap.element_size = Some(target_element_size);
        Ok(cap)
    }
}

/// Degenerate removal, welding and hole filling.
#[derive(Debug, Clone, Default)]
pub struct BasicRepairer {
    /// Repair thresholds.
    pub params: RepairParams,
}

impl MeshRepairer for BasicRepairer {
    fn repair(&self, mesh: &SurfaceMesh) -> Result<SurfaceMesh> {
        let mut repaired = mesh.clone();
        repair_mesh(&mut repaired, &self.params)?;
        Ok(repaired)
    }
}

/// The set of primitives a pipeline run uses.
pub struct Collaborators {
    /// Smooths junction regions and wall patches.
    pub kernel: Box<dyn SmoothingKernel>,
    /// Splits the mesh into walls and caps.
    pub classifier: Box<dyn FaceClassifier>,
    /// Builds caps for boundary loops.
    pub remesher: Box<dyn CapRemesher>,
    /// Final cleanup pass.
    pub repairer: Box<dyn MeshRepairer>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            kernel: Box::new(TaubinKernel),
            classifier: Box::new(FeatureAngleClassifier::default()),
            remesher: Box::new(LoopCapRemesher::default()),
            repairer: Box::new(BasicRepairer::default()),
        }
    }
}

impl Collaborators {
    /// Replace the smoothing kernel.
    pub fn with_kernel(mut self, kernel: impl SmoothingKernel + 'static) -> Self {
        self.kernel = Box::new(kernel);
        self
    }

    /// Replace the face classifier.
    pub fn with_classifier(mut self, classifier: impl FaceClassifier + 'static) -> Self {
        self.classifier = Box::new(classifier);
        self
    }

    /// Replace the cap remesher.
    pub fn with_remesher(mut self, remesher: impl CapRemesher + 'static) -> Self {
        self.remesher = Box::new(remesher);
        self
    }

    /// Replace the repair pass.
    pub fn with_repairer(mut self, repairer: impl MeshRepairer + 'static) -> Self {
        self.repairer = Box::new(repairer);
        self
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}
