//! Wall/cap junction smoothing.
//!
//! Rather than patching points back into the input, this path smooths whole
//! wall patches and rebuilds the end caps from the smoothed wall boundary:
//!
//! 1. Detect junctions; none means nothing to do
//! 2. Classify faces into wall and cap patches
//! 3. Smooth every wall patch with its boundary held fixed
//! 4. One wall: trace its boundary loops, build a cap per loop, merge.
//!    Several walls: merge the walls as they are
//! 5. Repair the merged surface
//!
//! Every collaborator failure falls back to a coarser result and is recorded
//! in the returned [`Outcome`].

use tracing::{debug, info, warn};

use super::detect::{detect_junctions_with, DetectOptions, PointMatching};
use super::outcome::{Degradation, Outcome};
use super::vessel::VesselTree;
use crate::algo::smooth::SmoothOptions;
use crate::collaborators::Collaborators;
use crate::error::{JunctionError, Result};
use crate::mesh::{boundary_loops, merge_meshes, SurfaceMesh};
use crate::scalar::Scalar;

/// Element size used when neither the options nor the mesh carry one.
pub const DEFAULT_ELEMENT_SIZE: f64 = 0.1;

/// Options for [`smooth_junctions_advanced`].
#[derive(Debug, Clone)]
pub struct AdvancedOptions {
    /// Endpoint matching tolerance (grid matching only).
    pub tolerance: f64,

    /// Endpoint matching mode.
    pub matching: PointMatching,

    /// Cap element size. Falls back to the mesh's element size, then 0.1.
    pub target_element_size: Option<f64>,

    /// Requested cap resolution. Accepted for compatibility; cap density is
    /// governed by the element size.
    pub cap_resolution: usize,

    /// Taubin iterations per wall patch.
    pub wall_iterations: usize,

    /// Taubin pass band for wall patches.
    pub wall_pass_band: f64,

    /// Feature angle hint for the face classifier, in degrees.
    pub feature_angle: Option<f64>,

    /// Whether to run the repair pass on the merged surface.
    pub repair: bool,

    /// Whether the wall kernel may use parallel execution.
    pub parallel: bool,
}

impl Default for AdvancedOptions {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            matching: PointMatching::Exact,
            target_element_size: None,
            cap_resolution: 40,
            wall_iterations: 10,
            wall_pass_band: 0.1,
            feature_angle: None,
            repair: true,
            parallel: true,
        }
    }
}

impl AdvancedOptions {
    /// Set the cap element size.
    pub fn with_target_element_size(mut self, size: f64) -> Self {
        self.target_element_size = Some(size);
        self
    }

    /// Set the cap resolution.
    pub fn with_cap_resolution(mut self, resolution: usize) -> Self {
        self.cap_resolution = resolution;
        self
    }

    /// Set the number of wall smoothing iterations.
    pub fn with_wall_iterations(mut self, iterations: usize) -> Self {
        self.wall_iterations = iterations;
        self
    }

    /// Set the feature angle hint in degrees.
    pub fn with_feature_angle(mut self, degrees: f64) -> Self {
        self.feature_angle = Some(degrees);
        self
    }

    /// Set whether to repair the merged surface.
    pub fn with_repair(mut self, repair: bool) -> Self {
        self.repair = repair;
        self
    }

    /// Set whether to use parallel execution.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Cap element size for `mesh`: option, then mesh, then 0.1.
    pub fn resolve_element_size(&self, mesh: &SurfaceMesh) -> f64 {
        self.target_element_size
            .or(mesh.element_size)
            .unwrap_or(DEFAULT_ELEMENT_SIZE)
    }
}

/// Wall/cap smoothing with the built-in collaborators.
///
/// See [`smooth_junctions_advanced_with`].
pub fn smooth_junctions_advanced<T: Scalar>(
    mesh: &SurfaceMesh,
    vessels: &VesselTree<T>,
    options: &AdvancedOptions,
) -> Result<Outcome> {
    smooth_junctions_advanced_with(mesh, vessels, options, &Collaborators::default())
}

/// Wall/cap smoothing with custom collaborators.
///
/// Detection failures, classification failures (including patches with
/// dangling point indices), a classification without walls and merge
/// failures return the input as [`Outcome::Unchanged`]. A
/// failed wall smoothing keeps that wall as is; a loop with fewer than three
/// points or a failed cap keeps the loop as a polyline. Those fallbacks
/// give [`Outcome::Degraded`].
///
/// # Errors
///
/// Only invalid options are errors: a target element size that is not
/// positive and finite.
pub fn smooth_junctions_advanced_with<T: Scalar>(
    mesh: &SurfaceMesh,
    vessels: &VesselTree<T>,
    options: &AdvancedOptions,
    collaborators: &Collaborators,
) -> Result<Outcome> {
    if let Some(size) = options.target_element_size {
        if !(size.is_finite() && size > 0.0) {
            return Err(JunctionError::invalid_param(
                "target_element_size",
                size,
                "must be positive and finite",
            ));
        }
    }

    let unchanged = |reason: Degradation| -> Result<Outcome> {
        warn!("{}. Returning original mesh without smoothing.", reason);
        Ok(Outcome::Unchanged {
            mesh: mesh.clone(),
            reason,
        })
    };

    let detect = DetectOptions::default()
        .with_tolerance(options.tolerance)
        .with_matching(options.matching);
    let junctions = match detect_junctions_with(vessels, &detect) {
        Ok(junctions) => junctions,
        Err(e) => return unchanged(Degradation::DetectionFailed(e.to_string())),
    };
    if junctions.is_empty() {
        info!("No junctions detected for smoothing.");
        return Ok(Outcome::Unchanged {
            mesh: mesh.clone(),
            reason: Degradation::NoJunctions,
        });
    }
    info!("Detected {} junctions for smoothing.", junctions.len());

    let classification = match collaborators
        .classifier
        .extract_faces(mesh, options.feature_angle)
    {
        Ok(classification) => classification,
        Err(e) => return unchanged(Degradation::ClassificationFailed(e.to_string())),
    };
    if classification.walls.is_empty() {
        return unchanged(Degradation::NoWalls);
    }
    for (kind, patches) in [("wall", &classification.walls), ("cap", &classification.caps)] {
        for (i, patch) in patches.iter().enumerate() {
            if let Err(e) = patch.validate() {
                return unchanged(Degradation::ClassificationFailed(format!(
                    "{kind} patch {i} is malformed: {e}"
                )));
            }
        }
    }

    let mut reasons = Vec::new();
    let wall_options = SmoothOptions::default()
        .with_iterations(options.wall_iterations)
        .with_pass_band(options.wall_pass_band)
        .with_normalize_coordinates(true)
        .with_parallel(options.parallel);

    let walls: Vec<SurfaceMesh> = classification
        .walls
        .iter()
        .enumerate()
        .map(|(i, wall)| match collaborators.kernel.smooth(wall, &wall_options) {
            Ok(smoothed) => smoothed,
            Err(e) => {
                warn!("Smoothing wall patch {} failed: {}", i, e);
                reasons.push(Degradation::WallSmoothingFailed {
                    wall: i,
                    reason: e.to_string(),
                });
                wall.clone()
            }
        })
        .collect();

    let (parts, element_size) = if walls.len() == 1 {
        let element_size = options.resolve_element_size(mesh);
        let mut parts = walls;
        let caps = rebuild_caps(&parts[0], element_size, collaborators, &mut reasons);
        parts.extend(caps);
        (parts, Some(element_size))
    } else {
        debug!("Merging {} wall patches without rebuilding caps", walls.len());
        (walls, options.target_element_size.or(mesh.element_size))
    };

    let mut merged = match merge_meshes(&parts) {
        Ok(merged) => merged,
        Err(e) => return unchanged(Degradation::MergeFailed(e.to_string())),
    };

    if options.repair {
        match collaborators.repairer.repair(&merged) {
            Ok(repaired) => merged = repaired,
            Err(e) => {
                warn!("Mesh repair failed, keeping unrepaired mesh: {}", e);
                reasons.push(Degradation::RepairFailed(e.to_string()));
            }
        }
    }
    merged.element_size = element_size;

    Ok(Outcome::from_reasons(merged, reasons))
}

/// Build one cap per boundary loop of `wall`.
///
/// Loops that cannot be capped are returned as polylines.
fn rebuild_caps(
    wall: &SurfaceMesh,
    element_size: f64,
    collaborators: &Collaborators,
    reasons: &mut Vec<Degradation>,
) -> Vec<SurfaceMesh> {
    let loops = boundary_loops(wall);
    debug!("Rebuilding {} caps at element size {}", loops.len(), element_size);

    loops
        .iter()
        .enumerate()
        .map(|(i, boundary)| {
            if boundary.len() < 3 {
                warn!(
                    "Boundary {} has too few points ({}), keeping it without a cap",
                    i,
                    boundary.len()
                );
                return boundary.to_polyline();
            }
            match collaborators
                .remesher
                .remesh_surface(boundary, true, element_size)
            {
                Ok(cap) => cap,
                Err(e) => {
                    warn!("Failed to remesh boundary {}, using it without a cap: {}", i, e);
                    reasons.push(Degradation::CapFallback {
                        boundary: i,
                        reason: e.to_string(),
                    });
                    boundary.to_polyline()
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::CapRemesher;
    use crate::mesh::BoundaryLoop;
    use nalgebra::Point3;

    /// Closes each loop with one triangle over its first three points.
    struct TriangleRemesher;

    impl CapRemesher for TriangleRemesher {
        fn remesh_surface(&self, boundary: &BoundaryLoop, _: bool, _: f64) -> Result<SurfaceMesh> {
            SurfaceMesh::from_triangles(boundary.points[..3].to_vec(), vec![[0, 1, 2]])
        }
    }

    #[test]
    fn test_element_size_resolution() {
        let mut mesh = SurfaceMesh::new();
        let options = AdvancedOptions::default();
        assert_eq!(options.resolve_element_size(&mesh), DEFAULT_ELEMENT_SIZE);

        mesh.element_size = Some(0.3);
        assert_eq!(options.resolve_element_size(&mesh), 0.3);

        let options = options.with_target_element_size(0.05);
        assert_eq!(options.resolve_element_size(&mesh), 0.05);
    }

    #[test]
    fn test_rejects_bad_element_size() {
        let tree = VesselTree::new(vec![crate::junction::Vessel::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
        )]);
        let options = AdvancedOptions::default().with_target_element_size(-1.0);
        assert!(smooth_junctions_advanced(&SurfaceMesh::new(), &tree, &options).is_err());
    }

    #[test]
    fn test_detection_failure_is_unchanged() {
        let tree = VesselTree::new(vec![crate::junction::Vessel::new(
            Point3::new(f64::NAN, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
        )]);
        let mesh = SurfaceMesh::new();
        let outcome = smooth_junctions_advanced(&mesh, &tree, &AdvancedOptions::default()).unwrap();
        assert!(outcome.is_unchanged());
        assert!(matches!(outcome.reasons()[0], Degradation::DetectionFailed(_)));
    }

    #[test]
    fn test_short_boundary_kept_as_polyline() {
        // The shared edge 1-2 runs the same way in both faces, which breaks
        // the traced boundary into chains [0, 1], [2, 0] and [2, 3, 1].
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
        ];
        let wall = SurfaceMesh::from_triangles(points.clone(), vec![[0, 1, 2], [1, 2, 3]]).unwrap();
        let collaborators = Collaborators::default().with_remesher(TriangleRemesher);
        let mut reasons = Vec::new();

        let parts = rebuild_caps(&wall, 0.1, &collaborators, &mut reasons);

        assert!(reasons.is_empty(), "{reasons:?}");
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].points, vec![points[0], points[1]]);
        assert_eq!(parts[0].lines, vec![[0, 1]]);
        assert!(parts[0].faces.is_empty());
        assert_eq!(parts[1].points, vec![points[2], points[0]]);
        assert_eq!(parts[1].lines, vec![[0, 1]]);
        // Only the three-point chain reaches the remesher.
        assert_eq!(parts[2].num_faces(), 1);
    }
}
