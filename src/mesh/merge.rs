//! Mesh concatenation with exact point welding.

use std::collections::HashMap;

use tracing::debug;

use super::SurfaceMesh;
use crate::error::{JunctionError, Result};
use crate::scalar::exact_point_key;

/// Merge several meshes into one.
///
/// Points that coincide exactly are welded into a single point, which is
/// what stitches regenerated caps onto the wall they were traced from.
/// Faces and polylines are carried over with remapped indices. Normals and
/// the element size are not carried; the caller decides what the merged
/// mesh inherits.
///
/// # Errors
///
/// Fails when `parts` is empty or when any part references a point it does
/// not have.
pub fn merge_meshes(parts: &[SurfaceMesh]) -> Result<SurfaceMesh> {
    if parts.is_empty() {
        return Err(JunctionError::collaborator("merge", "no meshes to merge"));
    }

    let mut merged = SurfaceMesh::new();
    let mut index: HashMap<[u64; 3], usize> = HashMap::new();

    for part in parts {
        part.validate()?;

        let remap: Vec<usize> = part
            .points
            .iter()
            .map(|p| {
                *index.entry(exact_point_key(p)).or_insert_with(|| {
                    merged.points.push(*p);
                    merged.points.len() - 1
                })
            })
            .collect();

        merged
            .faces
            .extend(part.faces.iter().map(|f| [remap[f[0]], remap[f[1]], remap[f[2]]]));
        merged
            .lines
            .extend(part.lines.iter().map(|l| [remap[l[0]], remap[l[1]]]));
    }

    let total: usize = parts.iter().map(SurfaceMesh::num_points).sum();
    let welded = total - merged.points.len();
    debug!(
        "Merged {} meshes: {} points ({} welded), {} faces",
        parts.len(),
        merged.points.len(),
        welded,
        merged.faces.len()
    );

    Ok(merged)
}
