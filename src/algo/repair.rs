//! Cleanup of merged surfaces.
//!
//! Runs after walls and caps have been stitched together:
//!
//! 1. Remove degenerate triangles
//! 2. Weld nearby points
//! 3. Remove duplicate faces
//! 4. Remove unreferenced points
//! 5. Fill remaining small holes
//!
//! A clean closed surface passes through unchanged.

use std::collections::{HashMap, HashSet};

use nalgebra::Point3;
use tracing::{debug, warn};

use super::cap::triangulate_polygon;
use crate::error::{JunctionError, Result};
use crate::mesh::{boundary_loops, SurfaceMesh};

/// Thresholds for mesh repair, in mesh units.
#[derive(Debug, Clone)]
pub struct RepairParams {
    /// Points closer than this are merged. Zero disables welding.
    pub weld_epsilon: f64,

    /// Triangles with area below this are removed.
    pub degenerate_area_threshold: f64,

    /// Holes with more edges than this are left open. Zero disables filling.
    pub max_hole_edges: usize,
}

impl Default for RepairParams {
    fn default() -> Self {
        Self {
            weld_epsilon: 1e-9,
            degenerate_area_threshold: 1e-14,
            max_hole_edges: 100,
        }
    }
}

impl RepairParams {
    /// Set the point welding distance.
    #[must_use]
    pub fn with_weld_epsilon(mut self, epsilon: f64) -> Self {
        self.weld_epsilon = epsilon;
        self
    }

    /// Set the largest hole that will be filled.
    #[must_use]
    pub fn with_max_hole_edges(mut self, edges: usize) -> Self {
        self.max_hole_edges = edges;
        self
    }
}

/// Counts of what a repair pass changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepairSummary {
    /// Number of points before repair.
    pub initial_points: usize,
    /// Number of faces before repair.
    pub initial_faces: usize,
    /// Number of points after repair.
    pub final_points: usize,
    /// Number of faces after repair.
    pub final_faces: usize,
    /// Number of points merged by welding.
    pub points_welded: usize,
    /// Number of degenerate triangles removed.
    pub degenerates_removed: usize,
    /// Number of duplicate faces removed.
    pub duplicates_removed: usize,
    /// Number of unreferenced points removed.
    pub unreferenced_removed: usize,
    /// Number of holes closed.
    pub holes_filled: usize,
}

impl RepairSummary {
    /// Check if any repairs were performed.
    #[must_use]
    pub fn had_changes(&self) -> bool {
        self.points_welded > 0
            || self.degenerates_removed > 0
            || self.duplicates_removed > 0
            || self.unreferenced_removed > 0
            || self.holes_filled > 0
    }
}

impl std::fmt::Display for RepairSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Repair: {} points ({} welded, {} unreferenced), {} faces ({} degenerate, {} duplicate, {} holes filled)",
            self.final_points,
            self.points_welded,
            self.unreferenced_removed,
            self.final_faces,
            self.degenerates_removed,
            self.duplicates_removed,
            self.holes_filled
        )
    }
}

/// Run the full repair pipeline in place.
///
/// # Errors
///
/// Fails on an empty mesh and when nothing survives the cleanup.
pub fn repair_mesh(mesh: &mut SurfaceMesh, params: &RepairParams) -> Result<RepairSummary> {
    if mesh.num_faces() == 0 {
        return Err(JunctionError::EmptyMesh);
    }
    mesh.validate()?;

    let initial_points = mesh.num_points();
    let initial_faces = mesh.num_faces();

    let degenerates_removed = remove_degenerate_faces(mesh, params.degenerate_area_threshold);
    let points_welded = weld_points(mesh, params.weld_epsilon);
    let duplicates_removed = remove_duplicate_faces(mesh);
    let unreferenced_removed = remove_unreferenced_points(mesh);
    let holes_filled = fill_holes(mesh, params.max_hole_edges);

    if mesh.num_faces() == 0 {
        return Err(JunctionError::collaborator(
            "repair",
            "no faces left after removing degenerate triangles",
        ));
    }

    let summary = RepairSummary {
        initial_points,
        initial_faces,
        final_points: mesh.num_points(),
        final_faces: mesh.num_faces(),
        points_welded,
        degenerates_removed,
        duplicates_removed,
        unreferenced_removed,
        holes_filled,
    };
    if summary.had_changes() {
        // Per-point data no longer lines up.
        mesh.normals = None;
    }
    debug!("{}", summary);

    Ok(summary)
}

/// Remove triangles with area below threshold or repeated corners.
///
/// Returns the number of triangles removed.
pub fn remove_degenerate_faces(mesh: &mut SurfaceMesh, area_threshold: f64) -> usize {
    let original_count = mesh.faces.len();
    let points = &mesh.points;

    mesh.faces.retain(|&[a, b, c]| {
        if a == b || b == c || c == a {
            return false;
        }
        let area = (points[b] - points[a]).cross(&(points[c] - points[a])).norm() * 0.5;
        area >= area_threshold
    });

    original_count - mesh.faces.len()
}

/// Weld points that are within epsilon distance of each other.
///
/// Uses spatial hashing. Returns the number of points merged; merged points
/// stay in the point list until [`remove_unreferenced_points`] runs.
pub fn weld_points(mesh: &mut SurfaceMesh, epsilon: f64) -> usize {
    if mesh.points.is_empty() || epsilon <= 0.0 {
        return 0;
    }

    let cell_size = epsilon * 2.0;
    let mut spatial_hash: HashMap<(i64, i64, i64), Vec<usize>> = HashMap::new();
    for (idx, p) in mesh.points.iter().enumerate() {
        spatial_hash.entry(pos_to_cell(p, cell_size)).or_default().push(idx);
    }

    let mut remap: Vec<usize> = (0..mesh.points.len()).collect();
    let mut merged_count = 0;

    for (idx, p) in mesh.points.iter().enumerate() {
        if remap[idx] != idx {
            continue;
        }
        let cell = pos_to_cell(p, cell_size);

        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let Some(candidates) = spatial_hash.get(&(cell.0 + dx, cell.1 + dy, cell.2 + dz))
                    else {
                        continue;
                    };
                    for &other in candidates {
                        if other <= idx || remap[other] != other {
                            continue;
                        }
                        if (p - mesh.points[other]).norm() < epsilon {
                            remap[other] = idx;
                            merged_count += 1;
                        }
                    }
                }
            }
        }
    }

    if merged_count == 0 {
        return 0;
    }

    for face in &mut mesh.faces {
        for v in face.iter_mut() {
            *v = remap[*v];
        }
    }
    for line in &mut mesh.lines {
        for v in line.iter_mut() {
            *v = remap[*v];
        }
    }

    // Collapsed by welding.
    mesh.faces.retain(|&[a, b, c]| a != b && b != c && a != c);
    mesh.lines.retain(|&[a, b]| a != b);

    merged_count
}

fn pos_to_cell(pos: &Point3<f64>, cell_size: f64) -> (i64, i64, i64) {
    (
        (pos.x / cell_size).floor() as i64,
        (pos.y / cell_size).floor() as i64,
        (pos.z / cell_size).floor() as i64,
    )
}

/// Remove faces that repeat the corners of an earlier face.
///
/// Faces with the same corners in either winding count as duplicates.
/// Returns the number of faces removed.
pub fn remove_duplicate_faces(mesh: &mut SurfaceMesh) -> usize {
    let original_count = mesh.faces.len();
    let mut seen: HashSet<[usize; 3]> = HashSet::new();

    mesh.faces.retain(|face| {
        let mut key = *face;
        key.sort_unstable();
        seen.insert(key)
    });

    original_count - mesh.faces.len()
}

/// Remove points no face or line references and compact the point list.
///
/// Returns the number of points removed.
pub fn remove_unreferenced_points(mesh: &mut SurfaceMesh) -> usize {
    let mut referenced = vec![false; mesh.points.len()];
    for &v in mesh.faces.iter().flatten().chain(mesh.lines.iter().flatten()) {
        referenced[v] = true;
    }

    let original_count = mesh.points.len();
    if referenced.iter().all(|&r| r) {
        return 0;
    }

    let mut remap = vec![usize::MAX; original_count];
    let mut new_points = Vec::with_capacity(original_count);
    for (old, p) in mesh.points.iter().enumerate() {
        if referenced[old] {
            remap[old] = new_points.len();
            new_points.push(*p);
        }
    }

    for face in &mut mesh.faces {
        for v in face.iter_mut() {
            *v = remap[*v];
        }
    }
    for line in &mut mesh.lines {
        for v in line.iter_mut() {
            *v = remap[*v];
        }
    }
    if let Some(normals) = mesh.normals.take() {
        mesh.normals = Some(
            normals
                .into_iter()
                .enumerate()
                .filter(|&(i, _)| referenced[i])
                .map(|(_, n)| n)
                .collect(),
        );
    }

    let removed = original_count - new_points.len();
    mesh.points = new_points;
    removed
}

/// Close boundary loops with at most `max_edges` edges by ear clipping.
///
/// New faces wind against the loop so they agree with the surrounding
/// surface. Returns the number of holes filled.
pub fn fill_holes(mesh: &mut SurfaceMesh, max_edges: usize) -> usize {
    let mut filled = 0;

    for boundary in boundary_loops(mesh) {
        if !boundary.closed || boundary.len() > max_edges {
            continue;
        }

        let reversed: Vec<Point3<f64>> = boundary.points.iter().rev().copied().collect();
        let ids: Vec<usize> = boundary.point_ids.iter().rev().copied().collect();
        match triangulate_polygon(&reversed) {
            Ok(triangles) => {
                mesh.faces
                    .extend(triangles.iter().map(|t| [ids[t[0]], ids[t[1]], ids[t[2]]]));
                filled += 1;
            }
            Err(e) => warn!("Leaving hole with {} edges open: {}", boundary.len(), e),
        }
    }

    filled
}
