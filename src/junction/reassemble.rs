//! Basic junction smoothing: smooth each neighborhood and write it back.

use nalgebra::Point3;
use rayon::prelude::*;
use tracing::{info, warn};

use super::detect::{detect_junctions_with, DetectOptions, PointMatching};
use super::outcome::{Degradation, Outcome};
use super::region::{isolate_regions, smooth_region, RegionOptions, RegionSmoothOptions};
use super::vessel::VesselTree;
use crate::algo::Progress;
use crate::collaborators::Collaborators;
use crate::error::Result;
use crate::mesh::{compute_normals, SurfaceMesh};
use crate::scalar::Scalar;

/// Options for [`apply_junction_smoothing`].
#[derive(Debug, Clone)]
pub struct JunctionSmoothOptions {
    /// Endpoint matching tolerance (grid matching only).
    pub tolerance: f64,

    /// Endpoint matching mode.
    pub matching: PointMatching,

    /// Neighborhood radius as a multiple of the closest point distance.
    pub radius_factor: f64,

    /// Smoothing iterations per neighborhood.
    pub iterations: usize,

    /// Pass-band frequency for the smoothing kernel.
    pub relaxation_factor: f64,

    /// Whether to process neighborhoods in parallel (default: true).
    pub parallel: bool,
}

impl Default for JunctionSmoothOptions {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            matching: PointMatching::Exact,
            radius_factor: 2.0,
            iterations: 5,
            relaxation_factor: 0.1,
            parallel: true,
        }
    }
}

impl JunctionSmoothOptions {
    /// Set the neighborhood radius factor.
    pub fn with_radius_factor(mut self, radius_factor: f64) -> Self {
        self.radius_factor = radius_factor;
        self
    }

    /// Set the number of smoothing iterations.
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Set the smoothing pass band.
    pub fn with_relaxation_factor(mut self, relaxation_factor: f64) -> Self {
        self.relaxation_factor = relaxation_factor;
        self
    }

    /// Use grid matching with the given tolerance.
    pub fn with_grid_matching(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self.matching = PointMatching::Grid;
        self
    }

    /// Set whether to use parallel execution.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    fn detect_options(&self) -> DetectOptions {
        DetectOptions::default()
            .with_tolerance(self.tolerance)
            .with_matching(self.matching)
    }
}

/// Smooth the neighborhood of every junction with the built-in collaborators.
///
/// See [`apply_junction_smoothing_with_progress`].
pub fn apply_junction_smoothing<T: Scalar>(
    mesh: &SurfaceMesh,
    vessels: &VesselTree<T>,
    options: &JunctionSmoothOptions,
) -> Result<Outcome> {
    apply_junction_smoothing_with_progress(
        mesh,
        vessels,
        options,
        &Collaborators::default(),
        &Progress::none(),
    )
}

/// Smooth the neighborhood of every junction with custom collaborators.
///
/// See [`apply_junction_smoothing_with_progress`].
pub fn apply_junction_smoothing_with<T: Scalar>(
    mesh: &SurfaceMesh,
    vessels: &VesselTree<T>,
    options: &JunctionSmoothOptions,
    collaborators: &Collaborators,
) -> Result<Outcome> {
    apply_junction_smoothing_with_progress(mesh, vessels, options, collaborators, &Progress::none())
}

/// Smooth the neighborhood of every junction, reporting per-junction progress.
///
/// The input mesh is copied, never modified. Each neighborhood is smoothed
/// on its own and its points are written back over the first
/// `min(selected, smoothed)` selected points, in order, so later junctions
/// overwrite shared points of earlier ones. The write-back relies on the
/// kernel keeping point order; the built-in kernel does. Normals are then
/// recomputed with outward orientation and the repair pass runs.
///
/// Only point coordinates change before the repair pass. With no junctions
/// the input comes back as [`Outcome::Unchanged`].
///
/// # Errors
///
/// Fails on malformed vessels, an invalid mesh or invalid options. Kernel
/// and repair failures are reported in the [`Outcome`] instead.
pub fn apply_junction_smoothing_with_progress<T: Scalar>(
    mesh: &SurfaceMesh,
    vessels: &VesselTree<T>,
    options: &JunctionSmoothOptions,
    collaborators: &Collaborators,
    progress: &Progress,
) -> Result<Outcome> {
    mesh.validate()?;
    let junctions = detect_junctions_with(vessels, &options.detect_options())?;

    if junctions.is_empty() {
        info!("No junctions detected for smoothing.");
        return Ok(Outcome::Unchanged {
            mesh: mesh.clone(),
            reason: Degradation::NoJunctions,
        });
    }
    info!("Detected {} junctions for smoothing.", junctions.len());

    let region_options = RegionOptions::default()
        .with_radius_factor(options.radius_factor)
        .with_parallel(options.parallel);
    let regions = isolate_regions(mesh, &junctions.coordinates(), &region_options)?;

    let smooth_options = RegionSmoothOptions {
        iterations: options.iterations,
        relaxation_factor: options.relaxation_factor,
        parallel: options.parallel,
    };
    let kernel = collaborators.kernel.as_ref();
    let smoothed_regions: Vec<_> = if options.parallel {
        regions
            .par_iter()
            .map(|region| smooth_region(region, &smooth_options, kernel))
            .collect()
    } else {
        regions
            .iter()
            .map(|region| smooth_region(region, &smooth_options, kernel))
            .collect()
    };

    let mut smoothed = mesh.clone();
    let mut reasons = Vec::new();
    let total = regions.len();

    for (done, (region, result)) in regions.iter().zip(smoothed_regions).enumerate() {
        progress.report(done, total, "Smoothing junction regions");
        match result {
            Ok(smoothed_region) => {
                write_back_positions(
                    &mut smoothed.points,
                    &region.point_ids,
                    &smoothed_region.mesh.points,
                );
            }
            Err(e) => {
                warn!("Smoothing junction {} failed: {}", region.junction, e);
                reasons.push(Degradation::RegionSmoothingFailed {
                    junction: region.junction,
                    reason: e.to_string(),
                });
            }
        }
    }
    progress.finish(total, "Smoothing junction regions");

    compute_normals(&mut smoothed, true);

    let result = match collaborators.repairer.repair(&smoothed) {
        Ok(mut repaired) => {
            if repaired.normals.is_none() {
                compute_normals(&mut repaired, true);
            }
            repaired
        }
        Err(e) => {
            warn!("Mesh repair failed, keeping unrepaired mesh: {}", e);
            reasons.push(Degradation::RepairFailed(e.to_string()));
            smoothed
        }
    };

    Ok(Outcome::from_reasons(result, reasons))
}

/// Overwrite `points[ids[i]]` with `smoothed[i]` for the common prefix.
///
/// Returns the number of points written.
pub(crate) fn write_back_positions(
    points: &mut [Point3<f64>],
    ids: &[usize],
    smoothed: &[Point3<f64>],
) -> usize {
    let count = ids.len().min(smoothed.len());
    for (&id, p) in ids.iter().zip(smoothed).take(count) {
        points[id] = *p;
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_back_truncates_to_shorter() {
        let mut points = vec![Point3::origin(); 5];
        let written = write_back_positions(
            &mut points,
            &[1, 3, 4],
            &[Point3::new(1.0, 1.0, 1.0), Point3::new(2.0, 2.0, 2.0)],
        );
        assert_eq!(written, 2);
        assert_eq!(points[1], Point3::new(1.0, 1.0, 1.0));
        assert_eq!(points[3], Point3::new(2.0, 2.0, 2.0));
        assert_eq!(points[4], Point3::origin());
    }

    #[test]
    fn test_options_builders() {
        let options = JunctionSmoothOptions::default()
            .with_radius_factor(3.0)
            .with_iterations(7)
            .with_grid_matching(0.5);
        assert_eq!(options.radius_factor, 3.0);
        assert_eq!(options.iterations, 7);
        assert_eq!(options.detect_options().matching, PointMatching::Grid);
        assert_eq!(options.detect_options().tolerance, 0.5);
    }
}
