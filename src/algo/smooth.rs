//! Umbrella-operator smoothing for junction regions and wall patches.
//!
//! Two kernels share one relaxation pass:
//!
//! - [`laplacian_smooth`] pulls every free point toward the mean of its
//!   neighbors. Used to relax the interior of freshly built caps.
//! - [`taubin_smooth`] follows each pull with a push of factor μ, so low
//!   frequencies below the pass band survive and tubes keep their radius.
//!
//! Points keep their index, so a smoothed region still lines up with the
//! point ids it was cut from. Boundary points can be held fixed, which is how
//! a smoothed region meets the untouched surface around it without a seam.
//!
//! # Example
//!
//! ```
//! use vascular_junctions::algo::smooth::{taubin_smooth, SmoothOptions};
//! use vascular_junctions::mesh::SurfaceMesh;
//! use nalgebra::Point3;
//!
//! // A fan around a raised center point.
//! let points = vec![
//!     Point3::new(0.0, 0.0, 0.5),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//!     Point3::new(-1.0, 0.0, 0.0),
//!     Point3::new(0.0, -1.0, 0.0),
//! ];
//! let faces = vec![[0, 1, 2], [0, 2, 3], [0, 3, 4], [0, 4, 1]];
//! let mut mesh = SurfaceMesh::from_triangles(points, faces).unwrap();
//!
//! taubin_smooth(&mut mesh, &SmoothOptions::default().with_iterations(10));
//! assert!(mesh.points[0].z < 0.5);
//! assert_eq!(mesh.points[1], Point3::new(1.0, 0.0, 0.0));
//! ```

use nalgebra::{Point3, Vector3};
use rayon::prelude::*;

use crate::mesh::{MeshTopology, SurfaceMesh};

/// Smoothing parameters.
#[derive(Debug, Clone)]
pub struct SmoothOptions {
    /// Number of passes (Taubin: λ/μ pairs).
    pub iterations: usize,

    /// Pull factor λ in `[0, 1]`.
    pub lambda: f64,

    /// Pass-band frequency `k_pb` in `(0, 1)`. Smaller values keep less
    /// surface detail.
    pub pass_band: f64,

    /// Keep points on open boundaries where they are.
    pub preserve_boundary: bool,

    /// Smooth in a frame centered on the bounding box and scaled to unit
    /// extent, so the result does not depend on the mesh's units.
    pub normalize_coordinates: bool,

    /// Compute each pass on rayon.
    pub parallel: bool,
}

impl Default for SmoothOptions {
    fn default() -> Self {
        Self {
            iterations: 1,
            lambda: 0.5,
            pass_band: 0.1,
            preserve_boundary: true,
            normalize_coordinates: true,
            parallel: true,
        }
    }
}

impl SmoothOptions {
    /// Set the number of passes.
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Set λ, clamped to `[0, 1]`.
    pub fn with_lambda(mut self, lambda: f64) -> Self {
        self.lambda = lambda.clamp(0.0, 1.0);
        self
    }

    /// Set the pass-band frequency.
    pub fn with_pass_band(mut self, pass_band: f64) -> Self {
        self.pass_band = pass_band;
        self
    }

    /// Let boundary points move too.
    pub fn allow_boundary_movement(mut self) -> Self {
        self.preserve_boundary = false;
        self
    }

    /// Set whether to smooth in normalized coordinates.
    pub fn with_normalize_coordinates(mut self, normalize: bool) -> Self {
        self.normalize_coordinates = normalize;
        self
    }

    /// Set whether passes run on rayon.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Run every pass on the calling thread.
    pub fn sequential(self) -> Self {
        self.with_parallel(false)
    }

    /// The push factor μ paired with λ: `μ = λ / (k_pb·λ − 1)`.
    ///
    /// Negative, and larger in magnitude than λ, whenever `0 < k_pb·λ < 1`.
    pub fn taubin_mu(&self) -> f64 {
        self.lambda / (self.pass_band * self.lambda - 1.0)
    }
}

/// Pull every free point toward its neighbors' mean, `iterations` times.
///
/// Shrinks closed surfaces a little each pass; prefer [`taubin_smooth`]
/// when the volume matters.
///
/// # Panics
///
/// Panics if a face indexes past the point list; see
/// [`SurfaceMesh::validate`].
pub fn laplacian_smooth(mesh: &mut SurfaceMesh, options: &SmoothOptions) {
    if options.iterations == 0 || options.lambda == 0.0 {
        return;
    }
    let stencil = Stencil::new(mesh, options.preserve_boundary);
    let factors = vec![options.lambda; options.iterations];
    stencil.run(mesh, &factors, options);
}

/// Taubin λ|μ smoothing.
///
/// Each iteration is a pull of λ followed by a push of
/// [`μ`](SmoothOptions::taubin_mu), which damps frequencies above the pass
/// band and leaves the ones below it almost untouched.
///
/// Taubin, G. (1995). "A signal processing approach to fair surface design."
/// SIGGRAPH '95.
///
/// # Panics
///
/// Panics if a face indexes past the point list.
pub fn taubin_smooth(mesh: &mut SurfaceMesh, options: &SmoothOptions) {
    if options.iterations == 0 || options.lambda == 0.0 {
        return;
    }
    let stencil = Stencil::new(mesh, options.preserve_boundary);
    let mu = options.taubin_mu();
    let factors: Vec<f64> = (0..options.iterations)
        .flat_map(|_| [options.lambda, mu])
        .collect();
    stencil.run(mesh, &factors, options);
}

/// Neighbor lists and pinned points of a mesh.
struct Stencil {
    neighbors: Vec<Vec<usize>>,
    pinned: Vec<bool>,
}

impl Stencil {
    /// Points without neighbors are always pinned.
    fn new(mesh: &SurfaceMesh, preserve_boundary: bool) -> Self {
        let topology = MeshTopology::from_mesh(mesh);
        let pinned = (0..topology.num_vertices)
            .map(|v| {
                topology.neighbors(v).is_empty()
                    || (preserve_boundary && topology.is_boundary_vertex(v))
            })
            .collect();
        Self {
            neighbors: topology.vertex_neighbors,
            pinned,
        }
    }

    /// One relaxation pass per factor, then copy the free points back.
    ///
    /// Pinned points are never written, so they keep their exact input
    /// coordinates even when the frame transform would round them.
    fn run(&self, mesh: &mut SurfaceMesh, factors: &[f64], options: &SmoothOptions) {
        let frame = Frame::new(mesh, options.normalize_coordinates);
        let mut positions: Vec<Point3<f64>> = mesh.points.iter().map(|p| frame.to_local(p)).collect();

        for &factor in factors {
            positions = self.relax(&positions, factor, options.parallel);
        }

        for (i, p) in positions.iter().enumerate() {
            if !self.pinned[i] {
                mesh.points[i] = frame.to_world(p);
            }
        }
    }

    fn relax(&self, current: &[Point3<f64>], factor: f64, parallel: bool) -> Vec<Point3<f64>> {
        let step = |i: usize| {
            let ring = &self.neighbors[i];
            if self.pinned[i] || ring.is_empty() {
                return current[i];
            }
            let mean = ring
                .iter()
                .fold(Vector3::zeros(), |acc, &n| acc + current[n].coords)
                / ring.len() as f64;
            current[i] + (mean - current[i].coords) * factor
        };

        if parallel {
            (0..current.len()).into_par_iter().map(step).collect()
        } else {
            (0..current.len()).map(step).collect()
        }
    }
}

/// Affine map between world coordinates and the smoothing frame.
struct Frame {
    center: Vector3<f64>,
    scale: f64,
}

impl Frame {
    fn new(mesh: &SurfaceMesh, normalize: bool) -> Self {
        let identity = Self {
            center: Vector3::zeros(),
            scale: 1.0,
        };
        if !normalize {
            return identity;
        }
        match mesh.bounding_box() {
            Some((min, max)) if (max - min).amax() > 0.0 => Self {
                center: (min.coords + max.coords) * 0.5,
                scale: (max - min).amax(),
            },
            _ => identity,
        }
    }

    #[inline]
    fn to_local(&self, p: &Point3<f64>) -> Point3<f64> {
        Point3::from((p.coords - self.center) / self.scale)
    }

    #[inline]
    fn to_world(&self, p: &Point3<f64>) -> Point3<f64> {
        Point3::from(p.coords * self.scale + self.center)
    }
}
