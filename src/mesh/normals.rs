//! Point normals with automatic outward orientation.

use std::collections::VecDeque;

use nalgebra::Vector3;
use tracing::debug;

use super::topology::{face_components, MeshTopology};
use super::SurfaceMesh;

/// Compute area-weighted point normals.
///
/// With `auto_orient`, face winding is first made consistent within every
/// connected component and each component is then flipped if it encloses a
/// negative volume, so normals point outward for closed surfaces. Only the
/// order of corners inside a face can change; the set of faces and their
/// connectivity are preserved.
pub fn compute_normals(mesh: &mut SurfaceMesh, auto_orient: bool) {
    if auto_orient {
        let flipped = orient_outward(mesh);
        if flipped > 0 {
            debug!("Auto-orientation flipped {} faces", flipped);
        }
    }

    let mut normals = vec![Vector3::zeros(); mesh.num_points()];
    for f in 0..mesh.num_faces() {
        let cross = mesh.face_cross(f);
        for &v in &mesh.faces[f] {
            normals[v] += cross;
        }
    }
    for n in &mut normals {
        let len = n.norm();
        if len > 1e-10 {
            *n /= len;
        }
    }

    mesh.normals = Some(normals);
}

/// Make winding consistent and outward. Returns the number of flipped faces.
fn orient_outward(mesh: &mut SurfaceMesh) -> usize {
    let topology = MeshTopology::from_mesh(mesh);
    let mut flipped = 0;
    // Components are disjoint, so one mask serves every breadth-first pass.
    let mut visited = vec![false; mesh.num_faces()];

    for component in face_components(mesh, &topology) {
        let seed = component[0];
        visited[seed] = true;
        let mut queue = VecDeque::from([seed]);

        while let Some(f) = queue.pop_front() {
            let face = mesh.faces[f];
            for i in 0..3 {
                let (a, b) = (face[i], face[(i + 1) % 3]);
                let Some(adjacent) = topology.get_edge_faces(a, b) else {
                    continue;
                };
                // Non-manifold edges give no usable orientation constraint.
                if adjacent.len() != 2 {
                    continue;
                }
                for &g in adjacent {
                    if visited[g] {
                        continue;
                    }
                    visited[g] = true;
                    if has_directed_edge(&mesh.faces[g], a, b) {
                        mesh.faces[g].swap(1, 2);
                        flipped += 1;
                    }
                    queue.push_back(g);
                }
            }
        }

        let volume: f64 = component
            .iter()
            .map(|&f| {
                let [p0, p1, p2] = mesh.face_positions(f);
                p0.coords.dot(&p1.coords.cross(&p2.coords))
            })
            .sum();
        if volume < 0.0 {
            for &f in &component {
                mesh.faces[f].swap(1, 2);
            }
            flipped += component.len();
        }
    }

    flipped
}

fn has_directed_edge(face: &[usize; 3], a: usize, b: usize) -> bool {
    (0..3).any(|k| face[k] == a && face[(k + 1) % 3] == b)
}
