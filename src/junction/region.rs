//! Junction neighborhoods and their smoothing.
//!
//! A neighborhood is every mesh point within `radius_factor` times the
//! distance from the junction to its closest non-coincident mesh point.
//! Points sitting exactly on the junction are excluded from that minimum so
//! the radius never collapses to zero.

use nalgebra::Point3;
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::algo::smooth::SmoothOptions;
use crate::collaborators::SmoothingKernel;
use crate::error::{JunctionError, Result};
use crate::mesh::SurfaceMesh;
use crate::scalar::Scalar;

/// Options for [`isolate_regions`].
#[derive(Debug, Clone)]
pub struct RegionOptions {
    /// Multiplier applied to the closest non-zero point distance.
    pub radius_factor: f64,

    /// Whether to isolate junctions in parallel (default: true).
    pub parallel: bool,
}

impl Default for RegionOptions {
    fn default() -> Self {
        Self {
            radius_factor: 2.0,
            parallel: true,
        }
    }
}

impl RegionOptions {
    /// Set the radius factor.
    pub fn with_radius_factor(mut self, radius_factor: f64) -> Self {
        self.radius_factor = radius_factor;
        self
    }

    /// Set whether to use parallel execution.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// Options for [`smooth_region`].
#[derive(Debug, Clone)]
pub struct RegionSmoothOptions {
    /// Number of Taubin iterations.
    pub iterations: usize,

    /// Pass-band frequency handed to the kernel.
    pub relaxation_factor: f64,

    /// Whether the kernel may use parallel execution.
    pub parallel: bool,
}

impl Default for RegionSmoothOptions {
    fn default() -> Self {
        Self {
            iterations: 5,
            relaxation_factor: 0.1,
            parallel: true,
        }
    }
}

impl RegionSmoothOptions {
    /// Kernel options: boundary held fixed, normalized coordinates.
    pub fn smooth_options(&self) -> SmoothOptions {
        SmoothOptions::default()
            .with_iterations(self.iterations)
            .with_pass_band(self.relaxation_factor)
            .with_normalize_coordinates(true)
            .with_parallel(self.parallel)
    }
}

/// The part of a mesh around one junction.
#[derive(Debug, Clone, PartialEq)]
pub struct JunctionRegion {
    /// Index of the junction in the coordinate list it was isolated from.
    pub junction: usize,

    /// Junction coordinate.
    pub center: Point3<f64>,

    /// Selection radius.
    pub radius: f64,

    /// Source mesh index of every region point, ascending.
    pub point_ids: Vec<usize>,

    /// Selected points with the faces induced on them.
    ///
    /// `mesh.points[i]` is source point `point_ids[i]`.
    pub mesh: SurfaceMesh,
}

impl JunctionRegion {
    /// Number of points in the region.
    #[inline]
    pub fn num_points(&self) -> usize {
        self.mesh.num_points()
    }
}

/// Select the mesh points around `center`.
///
/// Returns the selection radius and the ascending point indices, or `None`
/// when every point coincides with `center` or nothing is selected.
///
/// # Example
///
/// ```
/// use vascular_junctions::junction::region_point_ids;
/// use vascular_junctions::mesh::SurfaceMesh;
/// use nalgebra::Point3;
///
/// let points = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(3.0, 0.0, 0.0),
/// ];
/// let mesh = SurfaceMesh::from_triangles(points, vec![[0, 1, 2]]).unwrap();
///
/// let (radius, ids) = region_point_ids(&mesh, &Point3::origin(), 2.0).unwrap();
/// assert_eq!(radius, 2.0);
/// assert_eq!(ids, vec![0, 1]);
/// ```
pub fn region_point_ids(
    mesh: &SurfaceMesh,
    center: &Point3<f64>,
    radius_factor: f64,
) -> Option<(f64, Vec<usize>)> {
    let distances: Vec<f64> = mesh.points.iter().map(|p| (p - center).norm()).collect();

    let min_distance = distances
        .iter()
        .copied()
        .filter(|&d| d > 0.0)
        .min_by(f64::total_cmp)?;
    let radius = min_distance * radius_factor;

    let ids: Vec<usize> = distances
        .iter()
        .enumerate()
        .filter(|&(_, &d)| d <= radius)
        .map(|(i, _)| i)
        .collect();

    if ids.is_empty() {
        None
    } else {
        Some((radius, ids))
    }
}

/// Isolate one region per junction coordinate.
///
/// Junctions without a usable neighborhood are skipped, so the result can be
/// shorter than `centers`; each region records the junction it belongs to.
///
/// # Errors
///
/// Fails on a non-positive or non-finite radius factor and on a mesh with
/// out-of-range face indices.
pub fn isolate_regions<T: Scalar>(
    mesh: &SurfaceMesh,
    centers: &[Point3<T>],
    options: &RegionOptions,
) -> Result<Vec<JunctionRegion>> {
    if !(options.radius_factor.is_finite() && options.radius_factor > 0.0) {
        return Err(JunctionError::invalid_param(
            "radius_factor",
            options.radius_factor,
            "must be positive and finite",
        ));
    }
    mesh.validate()?;

    let isolate = |(junction, center): (usize, &Point3<T>)| {
        let center = center.map(|c| c.to_f64());
        match region_point_ids(mesh, &center, options.radius_factor) {
            Some((radius, point_ids)) => Some(JunctionRegion {
                junction,
                center,
                radius,
                mesh: mesh.extract_points(&point_ids),
                point_ids,
            }),
            None => {
                warn!("Junction {} has no mesh points around it, skipping", junction);
                None
            }
        }
    };

    let regions: Vec<JunctionRegion> = if options.parallel {
        centers.par_iter().enumerate().filter_map(isolate).collect()
    } else {
        centers.iter().enumerate().filter_map(isolate).collect()
    };

    debug!(
        "Isolated {} regions for {} junctions",
        regions.len(),
        centers.len()
    );

    Ok(regions)
}

/// Smooth a region with the given kernel.
///
/// Regions with fewer than four points or without faces come back as they
/// are. The input region is never modified.
///
/// # Errors
///
/// Propagates kernel failures.
pub fn smooth_region(
    region: &JunctionRegion,
    options: &RegionSmoothOptions,
    kernel: &dyn SmoothingKernel,
) -> Result<JunctionRegion> {
    if region.num_points() < 4 || region.mesh.num_faces() == 0 {
        return Ok(region.clone());
    }

    let smoothed = kernel.smooth(&region.mesh, &options.smooth_options())?;
    if smoothed.num_points() != region.num_points() {
        debug!(
            "Kernel returned {} points for junction {} region of {}",
            smoothed.num_points(),
            region.junction,
            region.num_points()
        );
    }

    Ok(JunctionRegion {
        mesh: smoothed,
        ..region.clone()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::TaubinKernel;

    /// Flat 5x5 grid in the xy-plane with unit spacing.
    fn grid() -> SurfaceMesh {
        let mut points = Vec::new();
        for j in 0..5 {
            for i in 0..5 {
                points.push(Point3::new(i as f64, j as f64, 0.0));
            }
        }
        let mut faces = Vec::new();
        for j in 0..4 {
            for i in 0..4 {
                let v = j * 5 + i;
                faces.push([v, v + 1, v + 6]);
                faces.push([v, v + 6, v + 5]);
            }
        }
        SurfaceMesh::from_triangles(points, faces).unwrap()
    }

    #[test]
    fn test_coincident_point_excluded_from_radius() {
        let mesh = grid();
        // Center sits on point 12; its nearest other points are 1.0 away.
        let (radius, ids) = region_point_ids(&mesh, &Point3::new(2.0, 2.0, 0.0), 1.5).unwrap();
        assert_eq!(radius, 1.5);
        assert_eq!(ids, vec![6, 7, 8, 11, 12, 13, 16, 17, 18]);
    }

    #[test]
    fn test_all_points_coincident() {
        let points = vec![Point3::new(1.0, 1.0, 1.0); 3];
        let mesh = SurfaceMesh::from_triangles(points, vec![[0, 1, 2]]).unwrap();
        assert!(region_point_ids(&mesh, &Point3::new(1.0, 1.0, 1.0), 2.0).is_none());
    }

    #[test]
    fn test_isolate_keeps_junction_index() {
        let mesh = grid();
        let centers = vec![Point3::new(0.0f32, 0.0, 0.0), Point3::new(4.0f32, 4.0, 0.0)];
        let regions = isolate_regions(&mesh, &centers, &RegionOptions::default()).unwrap();
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[1].junction, 1);
        assert!(regions[1].point_ids.contains(&24));
        for region in &regions {
            for (local, &id) in region.point_ids.iter().enumerate() {
                assert_eq!(region.mesh.points[local], mesh.points[id]);
            }
        }
    }

    #[test]
    fn test_isolate_parallel_matches_sequential() {
        let mesh = grid();
        let centers: Vec<Point3<f64>> = (0..5).map(|i| Point3::new(i as f64, 2.5, 0.0)).collect();
        let parallel = isolate_regions(&mesh, &centers, &RegionOptions::default()).unwrap();
        let sequential =
            isolate_regions(&mesh, &centers, &RegionOptions::default().with_parallel(false))
                .unwrap();
        assert_eq!(parallel, sequential);
    }

    #[test]
    fn test_isolate_rejects_bad_radius_factor() {
        let mesh = grid();
        let centers = vec![Point3::new(0.0, 0.0, 0.0)];
        let options = RegionOptions::default().with_radius_factor(-1.0);
        assert!(isolate_regions(&mesh, &centers, &options).is_err());
    }

    #[test]
    fn test_small_region_is_identity() {
        let mesh = grid();
        let region = JunctionRegion {
            junction: 0,
            center: Point3::origin(),
            radius: 1.0,
            point_ids: vec![0, 1, 5],
            mesh: mesh.extract_points(&[0, 1, 5]),
        };
        let smoothed =
            smooth_region(&region, &RegionSmoothOptions::default(), &TaubinKernel).unwrap();
        assert_eq!(smoothed, region);
    }

    #[test]
    fn test_smoothing_keeps_region_boundary() {
        let mut mesh = grid();
        mesh.points[12].z = 1.0;
        let centers = vec![Point3::new(2.0, 2.0, 0.0)];
        let regions = isolate_regions(&mesh, &centers, &RegionOptions::default()).unwrap();
        let region = &regions[0];

        let smoothed =
            smooth_region(region, &RegionSmoothOptions::default(), &TaubinKernel).unwrap();
        assert_eq!(smoothed.point_ids, region.point_ids);
        assert_eq!(smoothed.num_points(), region.num_points());

        let topology = crate::mesh::MeshTopology::from_mesh(&region.mesh);
        let peak = region.point_ids.iter().position(|&id| id == 12).unwrap();
        for i in 0..region.num_points() {
            if topology.is_boundary_vertex(i) {
                assert_eq!(smoothed.mesh.points[i], region.mesh.points[i]);
            }
        }
        assert!(smoothed.mesh.points[peak].z < 1.0);
    }
}
