//! Wall/cap face classification.
//!
//! Faces are grown into patches across edges whose dihedral angle stays
//! below a feature angle. A patch whose face normals all agree with its mean
//! normal is a flat end cap; every other patch is tube wall.

use std::collections::{BTreeSet, VecDeque};

use nalgebra::Vector3;
use tracing::debug;

use crate::error::{JunctionError, Result};
use crate::mesh::{MeshTopology, SurfaceMesh};

/// Whether a face belongs to the tube wall or to an end cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceKind {
    /// Curved tube surface.
    Wall,
    /// Flat end cap.
    Cap,
}

/// Options for [`classify_faces`].
#[derive(Debug, Clone)]
pub struct ClassifyOptions {
    /// Patches never grow across edges sharper than this, in degrees.
    pub feature_angle: f64,

    /// Maximum deviation from the mean normal for a cap patch, in degrees.
    pub planarity_tolerance: f64,
}

impl Default for ClassifyOptions {
    fn default() -> Self {
        Self {
            feature_angle: 50.0,
            planarity_tolerance: 5.0,
        }
    }
}

impl ClassifyOptions {
    /// Set the feature angle in degrees.
    pub fn with_feature_angle(mut self, degrees: f64) -> Self {
        self.feature_angle = degrees;
        self
    }

    /// Set the planarity tolerance in degrees.
    pub fn with_planarity_tolerance(mut self, degrees: f64) -> Self {
        self.planarity_tolerance = degrees;
        self
    }
}

/// Faces of a mesh split into wall and cap patches.
#[derive(Debug, Clone, Default)]
pub struct FaceClassification {
    /// Kind of every face of the classified mesh.
    pub faces: Vec<FaceKind>,

    /// Wall patches as compact meshes.
    pub walls: Vec<SurfaceMesh>,

    /// Cap patches as compact meshes.
    pub caps: Vec<SurfaceMesh>,

    /// Edges between a wall face and a cap face, as sorted point index pairs
    /// into the classified mesh.
    pub shared_boundaries: Vec<(usize, usize)>,
}

/// Split the faces of a mesh into wall and cap patches.
///
/// # Errors
///
/// Fails on an empty mesh and for angles outside `(0, 180]` degrees.
pub fn classify_faces(mesh: &SurfaceMesh, options: &ClassifyOptions) -> Result<FaceClassification> {
    if mesh.num_faces() == 0 {
        return Err(JunctionError::EmptyMesh);
    }
    mesh.validate()?;
    for (name, value) in [
        ("feature_angle", options.feature_angle),
        ("planarity_tolerance", options.planarity_tolerance),
    ] {
        if !(value > 0.0 && value <= 180.0) {
            return Err(JunctionError::invalid_param(name, value, "must be in (0, 180] degrees"));
        }
    }

    let topology = MeshTopology::from_mesh(mesh);
    let normals: Vec<Option<Vector3<f64>>> =
        (0..mesh.num_faces()).map(|f| mesh.face_normal(f)).collect();
    let patches = grow_patches(mesh, &topology, &normals, options.feature_angle.to_radians().cos());

    let planar_cos = options.planarity_tolerance.to_radians().cos();
    let mut faces = vec![FaceKind::Wall; mesh.num_faces()];
    let mut walls = Vec::new();
    let mut caps = Vec::new();

    for patch in &patches {
        let kind = if is_planar(patch, &normals, planar_cos) {
            FaceKind::Cap
        } else {
            FaceKind::Wall
        };
        for &f in patch {
            faces[f] = kind;
        }
        let (sub, _) = mesh.extract_faces(patch);
        match kind {
            FaceKind::Wall => walls.push(sub),
            FaceKind::Cap => caps.push(sub),
        }
    }

    let shared_boundaries: Vec<(usize, usize)> = topology
        .edge_faces
        .iter()
        .filter(|(_, adjacent)| {
            adjacent.iter().any(|&f| faces[f] == FaceKind::Wall)
                && adjacent.iter().any(|&f| faces[f] == FaceKind::Cap)
        })
        .map(|(&edge, _)| edge)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    debug!(
        "Classified {} faces: {} wall patches, {} cap patches, {} shared edges",
        mesh.num_faces(),
        walls.len(),
        caps.len(),
        shared_boundaries.len()
    );

    Ok(FaceClassification {
        faces,
        walls,
        caps,
        shared_boundaries,
    })
}

/// Flood-fill faces into patches, crossing only smooth edges.
///
/// Degenerate faces have no normal and join whichever patch reaches them.
fn grow_patches(
    mesh: &SurfaceMesh,
    topology: &MeshTopology,
    normals: &[Option<Vector3<f64>>],
    min_cos: f64,
) -> Vec<Vec<usize>> {
    let mut patch_of = vec![usize::MAX; mesh.num_faces()];
    let mut patches = Vec::new();

    for seed in 0..mesh.num_faces() {
        if patch_of[seed] != usize::MAX {
            continue;
        }
        let id = patches.len();
        patch_of[seed] = id;
        let mut members = vec![seed];
        let mut queue = VecDeque::from([seed]);

        while let Some(f) = queue.pop_front() {
            let face = mesh.faces[f];
            for i in 0..3 {
                let Some(adjacent) = topology.get_edge_faces(face[i], face[(i + 1) % 3]) else {
                    continue;
                };
                for &g in adjacent {
                    if patch_of[g] != usize::MAX {
                        continue;
                    }
                    let smooth = match (normals[f], normals[g]) {
                        (Some(a), Some(b)) => a.dot(&b) >= min_cos,
                        _ => true,
                    };
                    if smooth {
                        patch_of[g] = id;
                        members.push(g);
                        queue.push_back(g);
                    }
                }
            }
        }
        patches.push(members);
    }

    patches
}

fn is_planar(patch: &[usize], normals: &[Option<Vector3<f64>>], min_cos: f64) -> bool {
    let valid: Vec<Vector3<f64>> = patch.iter().filter_map(|&f| normals[f]).collect();
    let sum: Vector3<f64> = valid.iter().sum();
    let len = sum.norm();
    if valid.is_empty() || len < 1e-12 {
        return false;
    }
    let mean = sum / len;
    valid.iter().all(|n| n.dot(&mean) >= min_cos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    /// Open-ended square tube with flat caps on both ends.
    fn capped_box() -> SurfaceMesh {
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(0.0, 1.0, 1.0),
        ];
        let faces = vec![
            [0, 2, 1],
            [0, 3, 2],
            [4, 5, 6],
            [4, 6, 7],
            [0, 1, 5],
            [0, 5, 4],
            [1, 2, 6],
            [1, 6, 5],
            [2, 3, 7],
            [2, 7, 6],
            [3, 0, 4],
            [3, 4, 7],
        ];
        SurfaceMesh::from_triangles(points, faces).unwrap()
    }

    #[test]
    fn test_box_with_sharp_walls_is_all_caps() {
        // Every box side is flat and meets its neighbors at 90 degrees.
        let mesh = capped_box();
        let result = classify_faces(&mesh, &ClassifyOptions::default()).unwrap();
        assert_eq!(result.caps.len(), 6);
        assert!(result.walls.is_empty());
        assert!(result.shared_boundaries.is_empty());
    }

    #[test]
    fn test_wide_feature_angle_merges_sides_into_wall() {
        // 100 degrees joins the four sides (and the lids) into one patch.
        let mesh = capped_box();
        let options = ClassifyOptions::default().with_feature_angle(100.0);
        let result = classify_faces(&mesh, &options).unwrap();
        assert_eq!(result.walls.len(), 1);
        assert!(result.caps.is_empty());
        assert!(result.faces.iter().all(|&k| k == FaceKind::Wall));
    }

    #[test]
    fn test_invalid_angle_rejected() {
        let mesh = capped_box();
        let options = ClassifyOptions::default().with_feature_angle(0.0);
        assert!(matches!(
            classify_faces(&mesh, &options),
            Err(JunctionError::InvalidParameter { name: "feature_angle", .. })
        ));
    }

    #[test]
    fn test_empty_mesh_rejected() {
        assert!(classify_faces(&SurfaceMesh::new(), &ClassifyOptions::default()).is_err());
    }
}
