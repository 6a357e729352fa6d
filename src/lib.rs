//! # vascular-junctions
//!
//! Junction detection and junction smoothing for vascular tree surface
//! meshes.
//!
//! A surface generated from a branching tube network is rough wherever three
//! or more tubes meet. This crate finds those junctions from the vessel
//! endpoints alone, smooths the surface around them while keeping the rest
//! of the mesh in place, and reports junction statistics.
//!
//! ## Features
//!
//! - **Junction detection**: exact or grid-based endpoint matching, ids in
//!   first-seen order
//! - **Basic path**: adaptive-radius neighborhoods, boundary-preserving
//!   Taubin smoothing, write-back into a copy of the mesh
//! - **Advanced path**: wall/cap classification, whole-wall smoothing and
//!   cap regeneration
//! - **Pluggable primitives**: smoothing, classification, cap remeshing and
//!   repair sit behind traits with built-in implementations
//! - **Tagged outcomes**: every fallback is reported instead of hidden
//!
//! ## Quick Start
//!
//! ```
//! use vascular_junctions::prelude::*;
//! use nalgebra::Point3;
//!
//! let fork = Point3::new(1.0, 0.0, 0.0);
//! let tree = VesselTree::new(vec![
//!     Vessel::new(Point3::origin(), fork),
//!     Vessel::new(fork, Point3::new(2.0, 1.0, 0.0)),
//!     Vessel::new(fork, Point3::new(2.0, -1.0, 0.0)),
//! ]);
//!
//! let junctions = detect_junctions(&tree, 1e-6).unwrap();
//! assert_eq!(junctions.len(), 1);
//! assert_eq!(junctions.junctions()[0].degree(), 3);
//! ```
//!
//! ## Smoothing a Mesh
//!
//! ```
//! use vascular_junctions::prelude::*;
//! use nalgebra::Point3;
//!
//! let points = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//!     Point3::new(0.0, 0.0, 1.0),
//! ];
//! let faces = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];
//! let mesh = SurfaceMesh::from_triangles(points, faces).unwrap();
//!
//! // No shared endpoints, so nothing to smooth.
//! let tree = VesselTree::new(vec![Vessel::new(
//!     Point3::new(5.0, 5.0, 5.0),
//!     Point3::new(6.0, 5.0, 5.0),
//! )]);
//!
//! let outcome =
//!     apply_junction_smoothing(&mesh, &tree, &JunctionSmoothOptions::default()).unwrap();
//! assert!(outcome.is_unchanged());
//! assert_eq!(outcome.mesh(), &mesh);
//! ```
//!
//! ## Logging
//!
//! Diagnostics go through [`tracing`]; the library installs no subscriber.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod collaborators;
pub mod error;
pub mod junction;
pub mod mesh;
pub mod scalar;

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and functions:
///
/// ```
/// use vascular_junctions::prelude::*;
/// ```
pub mod prelude {
    pub use crate::collaborators::{
        CapRemesher, Collaborators, FaceClassifier, MeshRepairer, SmoothingKernel,
    };
    pub use crate::error::{JunctionError, Result};
    pub use crate::junction::{
        apply_junction_smoothing, detect_junctions, junction_statistics,
        smooth_junctions_advanced, AdvancedOptions, Degradation, Junction,
        JunctionSmoothOptions, JunctionStatistics, Outcome, Vessel, VesselTree,
    };
    pub use crate::mesh::{BoundaryLoop, SurfaceMesh};
}

// Re-export nalgebra types for convenience
pub use nalgebra;

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use nalgebra::Point3;

    #[test]
    fn test_y_tree() {
        let fork = Point3::new(0.0, 0.0, 1.0);
        let tree = VesselTree::new(vec![
            Vessel::new(Point3::origin(), fork),
            Vessel::new(fork, Point3::new(1.0, 0.0, 2.0)),
            Vessel::new(fork, Point3::new(-1.0, 0.0, 2.0)),
        ]);

        let junctions = detect_junctions(&tree, 1e-6).unwrap();
        assert_eq!(junctions.len(), 1);

        let junction = &junctions.junctions()[0];
        assert_eq!(junction.id, 0);
        assert_eq!(junction.position, fork);
        assert_eq!(junction.vessels, vec![0, 1, 2]);

        // Repeated calls give the same ids.
        assert_eq!(detect_junctions(&tree, 1e-6).unwrap(), junctions);
    }
}
