//! Core mesh data structures.
//!
//! This module provides the indexed surface mesh the junction pipelines
//! operate on, together with derived adjacency, boundary tracing, merging and
//! normal computation.
//!
//! # Overview
//!
//! The primary type is [`SurfaceMesh`]: a list of points, a list of
//! triangles, optional polyline segments, optional point normals and an
//! optional target element size. Adjacency is derived on demand with
//! [`MeshTopology`], which tolerates the non-manifold patches that appear
//! when a neighborhood is cut out of a larger surface.
//!
//! ```
//! use vascular_junctions::mesh::{boundary_loops, SurfaceMesh};
//! use nalgebra::Point3;
//!
//! let points = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//! ];
//! let mesh = SurfaceMesh::from_triangles(points, vec![[0, 1, 2]]).unwrap();
//! assert_eq!(boundary_loops(&mesh).len(), 1);
//! ```

mod merge;
mod normals;
mod surface;
mod topology;

pub use merge::merge_meshes;
pub use normals::compute_normals;
pub use surface::SurfaceMesh;
pub use topology::{boundary_loops, face_components, BoundaryLoop, MeshTopology};

pub(crate) use topology::edge_key;
