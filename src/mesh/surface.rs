//! Indexed triangle surface mesh.
//!
//! Junction neighborhoods cut out of a vascular surface are rarely clean
//! manifolds (bow-tie vertices, dangling fans), so the pipeline works on a
//! plain face-vertex representation and derives adjacency on demand with
//! [`MeshTopology`](super::MeshTopology).

use std::collections::HashMap;

use nalgebra::{Point3, Vector3};

use crate::error::{JunctionError, Result};

/// A triangle surface mesh with optional polyline cells and per-point normals.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SurfaceMesh {
    /// Point coordinates.
    pub points: Vec<Point3<f64>>,

    /// Triangles as point index triples.
    pub faces: Vec<[usize; 3]>,

    /// Polyline segments as point index pairs.
    ///
    /// Used for boundary loops that are carried through a merge without
    /// being triangulated.
    pub lines: Vec<[usize; 2]>,

    /// Per-point normals, when computed.
    pub normals: Option<Vec<Vector3<f64>>>,

    /// Target element size associated with this mesh.
    pub element_size: Option<f64>,
}

impl SurfaceMesh {
    /// Create an empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a mesh from points and triangles, validating face indices.
    ///
    /// # Example
    /// ```
    /// use vascular_junctions::mesh::SurfaceMesh;
    /// use nalgebra::Point3;
    ///
    /// let points = vec![
    ///     Point3::new(0.0, 0.0, 0.0),
    ///     Point3::new(1.0, 0.0, 0.0),
    ///     Point3::new(0.5, 1.0, 0.0),
    /// ];
    /// let mesh = SurfaceMesh::from_triangles(points, vec![[0, 1, 2]]).unwrap();
    /// assert_eq!(mesh.num_faces(), 1);
    /// ```
    pub fn from_triangles(points: Vec<Point3<f64>>, faces: Vec<[usize; 3]>) -> Result<Self> {
        if points.is_empty() || faces.is_empty() {
            return Err(JunctionError::EmptyMesh);
        }
        let mesh = Self {
            points,
            faces,
            ..Self::default()
        };
        mesh.validate()?;
        Ok(mesh)
    }

    /// Build a polyline-only mesh (no triangles).
    pub fn from_polyline(points: Vec<Point3<f64>>, lines: Vec<[usize; 2]>) -> Self {
        Self {
            points,
            lines,
            ..Self::default()
        }
    }

    /// Check that every face and line references an existing point.
    pub fn validate(&self) -> Result<()> {
        let n = self.points.len();
        for (fi, face) in self.faces.iter().enumerate() {
            if let Some(&vertex) = face.iter().find(|&&v| v >= n) {
                return Err(JunctionError::InvalidVertexIndex { face: fi, vertex });
            }
        }
        for (li, line) in self.lines.iter().enumerate() {
            if let Some(&vertex) = line.iter().find(|&&v| v >= n) {
                return Err(JunctionError::InvalidVertexIndex { face: li, vertex });
            }
        }
        Ok(())
    }

    // ==================== Accessors ====================

    /// Get the number of points.
    #[inline]
    pub fn num_points(&self) -> usize {
        self.points.len()
    }

    /// Get the number of triangles.
    #[inline]
    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    /// Whether the mesh has no points.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Get the positions of the three corners of a face.
    #[inline]
    pub fn face_positions(&self, f: usize) -> [Point3<f64>; 3] {
        let [a, b, c] = self.faces[f];
        [self.points[a], self.points[b], self.points[c]]
    }

    // ==================== Geometry ====================

    /// Area-weighted (unnormalized) normal of a face.
    pub fn face_cross(&self, f: usize) -> Vector3<f64> {
        let [p0, p1, p2] = self.face_positions(f);
        (p1 - p0).cross(&(p2 - p0))
    }

    /// Unit normal of a face, or `None` for a zero-area face.
    pub fn face_normal(&self, f: usize) -> Option<Vector3<f64>> {
        let n = self.face_cross(f);
        let len = n.norm();
        if len > 1e-300 {
            Some(n / len)
        } else {
            None
        }
    }

    /// Area of a face.
    pub fn face_area(&self, f: usize) -> f64 {
        0.5 * self.face_cross(f).norm()
    }

    /// Total surface area.
    pub fn surface_area(&self) -> f64 {
        (0..self.faces.len()).map(|f| self.face_area(f)).sum()
    }

    /// Signed enclosed volume (positive for outward-oriented closed surfaces).
    pub fn signed_volume(&self) -> f64 {
        self.faces
            .iter()
            .map(|&[a, b, c]| {
                let (p0, p1, p2) = (self.points[a], self.points[b], self.points[c]);
                p0.coords.dot(&p1.coords.cross(&p2.coords)) / 6.0
            })
            .sum()
    }

    /// Axis-aligned bounding box.
    pub fn bounding_box(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let first = *self.points.first()?;
        let mut min = first;
        let mut max = first;
        for p in &self.points {
            for i in 0..3 {
                min[i] = min[i].min(p[i]);
                max[i] = max[i].max(p[i]);
            }
        }
        Some((min, max))
    }

    // ==================== Extraction ====================

    /// Extract the given points and the triangles induced on them.
    ///
    /// A triangle is kept only when all three corners are selected. Points
    /// keep the order of `point_ids`, so local index `i` in the result is
    /// `point_ids[i]` in `self`.
    pub fn extract_points(&self, point_ids: &[usize]) -> SurfaceMesh {
        let local: HashMap<usize, usize> = point_ids
            .iter()
            .enumerate()
            .map(|(i, &id)| (id, i))
            .collect();

        let faces = self
            .faces
            .iter()
            .filter_map(|face| {
                Some([
                    *local.get(&face[0])?,
                    *local.get(&face[1])?,
                    *local.get(&face[2])?,
                ])
            })
            .collect();

        SurfaceMesh {
            points: point_ids.iter().map(|&id| self.points[id]).collect(),
            faces,
            lines: Vec::new(),
            normals: self
                .normals
                .as_ref()
                .map(|n| point_ids.iter().map(|&id| n[id]).collect()),
            element_size: self.element_size,
        }
    }

    /// Extract the given faces as a compact mesh.
    ///
    /// Returns the sub-mesh and, for each of its points, the index of the
    /// source point in `self`.
    pub fn extract_faces(&self, face_ids: &[usize]) -> (SurfaceMesh, Vec<usize>) {
        let mut remap: HashMap<usize, usize> = HashMap::new();
        let mut source = Vec::new();
        let mut faces = Vec::with_capacity(face_ids.len());

        for &fi in face_ids {
            let mut tri = [0usize; 3];
            for (k, &v) in self.faces[fi].iter().enumerate() {
                tri[k] = *remap.entry(v).or_insert_with(|| {
                    source.push(v);
                    source.len() - 1
                });
            }
            faces.push(tri);
        }

        let mesh = SurfaceMesh {
            points: source.iter().map(|&v| self.points[v]).collect(),
            faces,
            lines: Vec::new(),
            normals: None,
            element_size: self.element_size,
        };
        (mesh, source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_tetrahedron() -> SurfaceMesh {
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ];
        let faces = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];
        SurfaceMesh::from_triangles(points, faces).unwrap()
    }

    #[test]
    fn test_invalid_vertex_index() {
        let points = vec![Point3::new(0.0, 0.0, 0.0)];
        let result = SurfaceMesh::from_triangles(points, vec![[0, 1, 2]]);
        assert!(matches!(
            result,
            Err(JunctionError::InvalidVertexIndex { face: 0, vertex: 1 })
        ));
    }

    #[test]
    fn test_empty_mesh_rejected() {
        assert!(matches!(
            SurfaceMesh::from_triangles(Vec::new(), Vec::new()),
            Err(JunctionError::EmptyMesh)
        ));
    }

    #[test]
    fn test_signed_volume_outward() {
        let mesh = unit_tetrahedron();
        assert_relative_eq!(mesh.signed_volume(), 1.0 / 6.0, epsilon = 1e-12);
    }

    #[test]
    fn test_extract_points_induced_faces() {
        let mesh = unit_tetrahedron();
        let region = mesh.extract_points(&[1, 2, 3]);
        assert_eq!(region.num_points(), 3);
        // Only face [1, 2, 3] lies entirely inside the selection.
        assert_eq!(region.faces, vec![[0, 1, 2]]);
        assert_eq!(region.points[0], mesh.points[1]);
    }

    #[test]
    fn test_extract_faces_compacts_points() {
        let mesh = unit_tetrahedron();
        let (sub, source) = mesh.extract_faces(&[2]);
        assert_eq!(sub.num_points(), 3);
        assert_eq!(source, vec![1, 2, 3]);
        assert_eq!(sub.faces, vec![[0, 1, 2]]);
    }
}
