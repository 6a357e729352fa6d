//! End-cap generation for open tube boundaries.
//!
//! A cap is built in three steps:
//!
//! 1. **Triangulate** the boundary polygon by ear clipping
//! 2. **Refine** by splitting edges longer than 4/3 × target_length, or than
//!    the longest boundary edge when the boundary is constrained
//! 3. **Relax** interior vertices with a few Laplacian steps
//!
//! The polygon is triangulated in the reverse of the loop's traversal order.
//! Loops from [`boundary_loops`](crate::mesh::boundary_loops) follow the
//! winding of the surface they bound, so the reversed cap shares each
//! boundary edge in the opposite direction and the merged surface stays
//! consistently oriented.

use std::collections::{HashMap, HashSet};

use nalgebra::{Point3, Vector3};
use tracing::{debug, warn};

use super::smooth::{laplacian_smooth, SmoothOptions};
use crate::error::{JunctionError, Result};
use crate::mesh::{edge_key, BoundaryLoop, SurfaceMesh};

/// Options for cap generation.
#[derive(Debug, Clone)]
pub struct CapOptions {
    /// Target edge length inside the cap.
    pub target_length: f64,

    /// Keep the boundary polygon untouched (no boundary edge splits).
    pub surface_constraint: bool,

    /// Maximum number of batch split passes.
    pub max_refinement_passes: usize,

    /// Laplacian relaxation iterations on interior vertices.
    pub relaxation_iterations: usize,
}

impl CapOptions {
    /// Create options with the specified target edge length.
    pub fn with_target_length(target_length: f64) -> Self {
        Self {
            target_length,
            surface_constraint: true,
            max_refinement_passes: 20,
            relaxation_iterations: 3,
        }
    }

    /// Set whether the boundary polygon must be kept as is.
    pub fn with_surface_constraint(mut self, constrained: bool) -> Self {
        self.surface_constraint = constrained;
        self
    }

    /// Set the number of relaxation iterations.
    pub fn with_relaxation_iterations(mut self, iterations: usize) -> Self {
        self.relaxation_iterations = iterations;
        self
    }
}

/// Generate a triangulated cap closing a boundary loop.
///
/// # Errors
///
/// Fails for a non-positive or non-finite target length, for loops with fewer
/// than three points and for loops that enclose no area.
pub fn generate_cap(boundary: &BoundaryLoop, options: &CapOptions) -> Result<SurfaceMesh> {
    if !(options.target_length.is_finite() && options.target_length > 0.0) {
        return Err(JunctionError::invalid_param(
            "target_length",
            options.target_length,
            "must be positive and finite",
        ));
    }

    let polygon: Vec<Point3<f64>> = boundary.points.iter().rev().copied().collect();
    let faces = triangulate_polygon(&polygon)?;

    let mut high = options.target_length * 4.0 / 3.0;
    if options.surface_constraint {
        // A triangle on a fixed boundary edge always keeps a side about as
        // long as that edge.
        let longest = longest_loop_edge(&polygon);
        if longest > high {
            debug!(
                "Cap refinement limited to {:.4} by the boundary (target {:.4})",
                longest, options.target_length
            );
            high = longest;
        }
    }

    let mut points = polygon;
    let mut faces = faces;
    split_long_edges(
        &mut points,
        &mut faces,
        high,
        options.surface_constraint,
        options.max_refinement_passes,
    );

    let mut cap = SurfaceMesh {
        points,
        faces,
        ..SurfaceMesh::default()
    };

    if options.relaxation_iterations > 0 {
        let relax = SmoothOptions::default()
            .with_iterations(options.relaxation_iterations)
            .with_lambda(0.5)
            .with_normalize_coordinates(false)
            .sequential();
        laplacian_smooth(&mut cap, &relax);
    }

    debug!(
        "Generated cap: {} boundary points, {} points, {} faces",
        boundary.len(),
        cap.num_points(),
        cap.num_faces()
    );

    Ok(cap)
}

/// Triangulate a simple polygon by ear clipping.
///
/// Triangles wind in the polygon's order. Returns indices into `polygon`.
pub fn triangulate_polygon(polygon: &[Point3<f64>]) -> Result<Vec<[usize; 3]>> {
    let n = polygon.len();
    if n < 3 {
        return Err(JunctionError::DegenerateLoop { points: n });
    }

    let normal = polygon_normal(polygon).ok_or(JunctionError::DegenerateLoop { points: n })?;

    let mut remaining: Vec<usize> = (0..n).collect();
    let mut triangles = Vec::with_capacity(n - 2);

    while remaining.len() > 3 {
        let m = remaining.len();
        let ear = (0..m).find(|&i| {
            let prev = remaining[(i + m - 1) % m];
            let next = remaining[(i + 1) % m];
            is_ear(polygon, &remaining, prev, remaining[i], next, &normal)
        });

        match ear {
            Some(i) => {
                let prev = remaining[(i + m - 1) % m];
                let next = remaining[(i + 1) % m];
                triangles.push([prev, remaining[i], next]);
                remaining.remove(i);
            }
            None => {
                warn!(
                    "Ear clipping stuck with {} vertices remaining, using fan triangulation",
                    remaining.len()
                );
                break;
            }
        }
    }

    if remaining.len() >= 3 {
        let center = remaining[0];
        for pair in remaining[1..].windows(2) {
            triangles.push([center, pair[0], pair[1]]);
        }
    }

    Ok(triangles)
}

fn longest_loop_edge(polygon: &[Point3<f64>]) -> f64 {
    let n = polygon.len();
    (0..n)
        .map(|i| (polygon[(i + 1) % n] - polygon[i]).norm())
        .fold(0.0, f64::max)
}

/// Unit normal of a polygon, summed around its centroid.
fn polygon_normal(polygon: &[Point3<f64>]) -> Option<Vector3<f64>> {
    let n = polygon.len();
    let centroid = polygon
        .iter()
        .fold(Vector3::zeros(), |acc, p| acc + p.coords)
        / n as f64;

    let normal = (0..n).fold(Vector3::zeros(), |acc, i| {
        let v0 = polygon[i].coords - centroid;
        let v1 = polygon[(i + 1) % n].coords - centroid;
        acc + v0.cross(&v1)
    });

    let len = normal.norm();
    if len > f64::EPSILON {
        Some(normal / len)
    } else {
        None
    }
}

/// Check if the vertex `curr` forms a convex ear with no other vertex inside.
fn is_ear(
    polygon: &[Point3<f64>],
    remaining: &[usize],
    prev: usize,
    curr: usize,
    next: usize,
    normal: &Vector3<f64>,
) -> bool {
    let (a, b, c) = (polygon[prev], polygon[curr], polygon[next]);
    let cross = (b - a).cross(&(c - a));
    if cross.norm() <= f64::EPSILON || cross.dot(normal) < 0.0 {
        return false;
    }

    remaining
        .iter()
        .filter(|&&idx| idx != prev && idx != curr && idx != next)
        .all(|&idx| !point_in_triangle(&polygon[idx], &a, &b, &c, normal))
}

/// Check if a point lies inside a triangle, projected along `normal`.
fn point_in_triangle(
    p: &Point3<f64>,
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
    normal: &Vector3<f64>,
) -> bool {
    // Drop the axis most aligned with the normal.
    let abs = normal.abs();
    let project = |q: &Point3<f64>| -> (f64, f64) {
        if abs.z >= abs.x && abs.z >= abs.y {
            (q.x, q.y)
        } else if abs.y >= abs.x {
            (q.x, q.z)
        } else {
            (q.y, q.z)
        }
    };
    let (p, a, b, c) = (project(p), project(a), project(b), project(c));

    let sign = |p1: (f64, f64), p2: (f64, f64), p3: (f64, f64)| -> f64 {
        (p1.0 - p3.0) * (p2.1 - p3.1) - (p2.0 - p3.0) * (p1.1 - p3.1)
    };
    let d1 = sign(p, a, b);
    let d2 = sign(p, b, c);
    let d3 = sign(p, c, a);

    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_neg && has_pos)
}

/// Split all edges longer than the threshold.
///
/// Uses batch processing: collect all long edges, split them simultaneously,
/// repeat until no edge is too long or `max_passes` is reached. Boundary
/// edges of the input are skipped when `preserve_boundary` is set.
fn split_long_edges(
    vertices: &mut Vec<Point3<f64>>,
    faces: &mut Vec<[usize; 3]>,
    threshold: f64,
    preserve_boundary: bool,
    max_passes: usize,
) {
    let threshold_sq = threshold * threshold;

    let mut boundary_edges: HashSet<(usize, usize)> = HashSet::new();
    if preserve_boundary {
        let mut edge_count: HashMap<(usize, usize), usize> = HashMap::new();
        for face in faces.iter() {
            for i in 0..3 {
                *edge_count.entry(edge_key(face[i], face[(i + 1) % 3])).or_insert(0) += 1;
            }
        }
        boundary_edges = edge_count
            .into_iter()
            .filter(|&(_, count)| count == 1)
            .map(|(edge, _)| edge)
            .collect();
    }

    for _ in 0..max_passes {
        // Sorted so midpoint numbering is deterministic.
        let mut long_edges: Vec<(usize, usize)> = faces
            .iter()
            .flat_map(|f| (0..3).map(move |i| edge_key(f[i], f[(i + 1) % 3])))
            .collect::<HashSet<_>>()
            .into_iter()
            .filter(|&(v0, v1)| {
                (vertices[v1] - vertices[v0]).norm_squared() > threshold_sq
                    && !(preserve_boundary && boundary_edges.contains(&(v0, v1)))
            })
            .collect();

        if long_edges.is_empty() {
            break;
        }
        long_edges.sort_unstable();

        let mut midpoints: HashMap<(usize, usize), usize> = HashMap::new();
        for &(v0, v1) in &long_edges {
            vertices.push(Point3::from((vertices[v0].coords + vertices[v1].coords) * 0.5));
            midpoints.insert((v0, v1), vertices.len() - 1);
        }

        let mut new_faces = Vec::with_capacity(faces.len() * 2);
        for &[v0, v1, v2] in faces.iter() {
            let m01 = midpoints.get(&edge_key(v0, v1)).copied();
            let m12 = midpoints.get(&edge_key(v1, v2)).copied();
            let m20 = midpoints.get(&edge_key(v2, v0)).copied();

            match (m01, m12, m20) {
                (None, None, None) => new_faces.push([v0, v1, v2]),
                (Some(m), None, None) => {
                    new_faces.push([v0, m, v2]);
                    new_faces.push([m, v1, v2]);
                }
                (None, Some(m), None) => {
                    new_faces.push([v0, v1, m]);
                    new_faces.push([v0, m, v2]);
                }
                (None, None, Some(m)) => {
                    new_faces.push([v0, v1, m]);
                    new_faces.push([m, v1, v2]);
                }
                (Some(m01), Some(m12), None) => {
                    new_faces.push([v0, m01, v2]);
                    new_faces.push([m01, v1, m12]);
                    new_faces.push([m01, m12, v2]);
                }
                (None, Some(m12), Some(m20)) => {
                    new_faces.push([v0, v1, m12]);
                    new_faces.push([v0, m12, m20]);
                    new_faces.push([m12, v2, m20]);
                }
                (Some(m01), None, Some(m20)) => {
                    new_faces.push([v0, m01, m20]);
                    new_faces.push([m01, v1, v2]);
                    new_faces.push([m01, v2, m20]);
                }
                (Some(m01), Some(m12), Some(m20)) => {
                    new_faces.push([v0, m01, m20]);
                    new_faces.push([m01, v1, m12]);
                    new_faces.push([m20, m12, v2]);
                    new_faces.push([m01, m12, m20]);
                }
            }
        }

        *faces = new_faces;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::MeshTopology;

    fn ring(n: usize, radius: f64) -> BoundaryLoop {
        let points: Vec<Point3<f64>> = (0..n)
            .map(|i| {
                let t = std::f64::consts::TAU * i as f64 / n as f64;
                Point3::new(radius * t.cos(), radius * t.sin(), 0.0)
            })
            .collect();
        BoundaryLoop {
            point_ids: (0..n).collect(),
            points,
            closed: true,
        }
    }

    #[test]
    fn test_triangulate_square() {
        let square = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let triangles = triangulate_polygon(&square).unwrap();
        assert_eq!(triangles.len(), 2);
    }

    #[test]
    fn test_triangulate_collinear_fails() {
        let line = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ];
        assert!(matches!(
            triangulate_polygon(&line),
            Err(JunctionError::DegenerateLoop { points: 3 })
        ));
    }

    #[test]
    fn test_cap_winds_against_loop() {
        // Counter-clockwise loop seen from +z; the cap must face -z.
        let boundary = ring(12, 1.0);
        let options = CapOptions::with_target_length(0.3).with_relaxation_iterations(0);
        let cap = generate_cap(&boundary, &options).unwrap();
        for f in 0..cap.num_faces() {
            let n = cap.face_normal(f).unwrap();
            assert!(n.z < -0.99, "face {f} normal {n:?}");
        }
    }

    #[test]
    fn test_cap_keeps_boundary_with_surface_constraint() {
        let boundary = ring(12, 1.0);
        let cap = generate_cap(&boundary, &CapOptions::with_target_length(0.2)).unwrap();

        let topology = MeshTopology::from_mesh(&cap);
        assert_eq!(topology.boundary_edges.len(), 12);
        for p in &boundary.points {
            assert!(cap.points.contains(p), "boundary point {p:?} missing");
        }
        assert!(cap.num_faces() > 10, "cap was not refined");
    }

    #[test]
    fn test_fine_target_stops_at_boundary_edge_length() {
        let boundary = ring(8, 1.0);
        let longest = longest_loop_edge(&boundary.points);
        let options = CapOptions::with_target_length(0.01).with_relaxation_iterations(0);
        let cap = generate_cap(&boundary, &options).unwrap();

        assert!(cap.num_faces() > 6);
        for face in &cap.faces {
            for i in 0..3 {
                let edge = cap.points[face[(i + 1) % 3]] - cap.points[face[i]];
                assert!(edge.norm() <= longest + 1e-12);
            }
        }
    }

    #[test]
    fn test_cap_refines_boundary_without_constraint() {
        let boundary = ring(6, 1.0);
        let options = CapOptions::with_target_length(0.2).with_surface_constraint(false);
        let cap = generate_cap(&boundary, &options).unwrap();
        let topology = MeshTopology::from_mesh(&cap);
        assert!(topology.boundary_edges.len() > 6);
    }

    #[test]
    fn test_cap_rejects_bad_target_length() {
        let boundary = ring(6, 1.0);
        assert!(generate_cap(&boundary, &CapOptions::with_target_length(0.0)).is_err());
        assert!(generate_cap(&boundary, &CapOptions::with_target_length(f64::NAN)).is_err());
    }

    #[test]
    fn test_cap_area_matches_polygon() {
        let boundary = ring(32, 1.0);
        let cap = generate_cap(&boundary, &CapOptions::with_target_length(0.25)).unwrap();
        // Signed projected area depends only on the fixed boundary.
        let expected = 0.5 * 32.0 * (std::f64::consts::TAU / 32.0).sin();
        let signed: f64 = (0..cap.num_faces()).map(|f| 0.5 * cap.face_cross(f).z).sum();
        assert!((signed + expected).abs() < 1e-9);
        assert!(cap.points.iter().all(|p| p.z.abs() < 1e-12));
    }
}
