//! Pre-computed adjacency for face-vertex meshes.

use std::collections::{HashMap, HashSet, VecDeque};

use nalgebra::Point3;
use tracing::{debug, warn};

use super::SurfaceMesh;

/// Pre-computed mesh topology for O(1) adjacency lookups.
///
/// This structure caches edge and vertex relationships so smoothing and
/// classification do not rescan the face list for every query.
#[derive(Debug, Clone)]
pub struct MeshTopology {
    /// Map from edge (v0, v1) where v0 < v1 to the faces containing it
    pub edge_faces: HashMap<(usize, usize), Vec<usize>>,
    /// Set of boundary edges (edges with only one adjacent face)
    pub boundary_edges: HashSet<(usize, usize)>,
    /// Boundary flag per vertex
    pub boundary_vertices: Vec<bool>,
    /// Sorted neighbors of each vertex
    pub vertex_neighbors: Vec<Vec<usize>>,
    /// Number of vertices
    pub num_vertices: usize,
}

impl MeshTopology {
    /// Build topology from a face list.
    pub fn from_faces(faces: &[[usize; 3]], num_vertices: usize) -> Self {
        let mut edge_faces: HashMap<(usize, usize), Vec<usize>> = HashMap::new();
        for (face_idx, face) in faces.iter().enumerate() {
            for i in 0..3 {
                edge_faces
                    .entry(edge_key(face[i], face[(i + 1) % 3]))
                    .or_default()
                    .push(face_idx);
            }
        }

        let boundary_edges: HashSet<(usize, usize)> = edge_faces
            .iter()
            .filter(|(_, faces)| faces.len() == 1)
            .map(|(&edge, _)| edge)
            .collect();

        // Neighbor lists are sorted so accumulation order never depends on
        // hash iteration order.
        let mut vertex_neighbors: Vec<Vec<usize>> = vec![Vec::new(); num_vertices];
        for &(v0, v1) in edge_faces.keys() {
            vertex_neighbors[v0].push(v1);
            vertex_neighbors[v1].push(v0);
        }
        for neighbors in &mut vertex_neighbors {
            neighbors.sort_unstable();
        }

        let mut boundary_vertices = vec![false; num_vertices];
        for &(v0, v1) in &boundary_edges {
            boundary_vertices[v0] = true;
            boundary_vertices[v1] = true;
        }

        Self {
            edge_faces,
            boundary_edges,
            boundary_vertices,
            vertex_neighbors,
            num_vertices,
        }
    }

    /// Build topology for a mesh.
    pub fn from_mesh(mesh: &SurfaceMesh) -> Self {
        Self::from_faces(&mesh.faces, mesh.num_points())
    }

    /// Check if an edge is on the boundary.
    #[inline]
    pub fn is_boundary_edge(&self, v0: usize, v1: usize) -> bool {
        self.boundary_edges.contains(&edge_key(v0, v1))
    }

    /// Check if a vertex is on the boundary.
    #[inline]
    pub fn is_boundary_vertex(&self, v: usize) -> bool {
        self.boundary_vertices[v]
    }

    /// Get the neighbors of a vertex.
    #[inline]
    pub fn neighbors(&self, v: usize) -> &[usize] {
        &self.vertex_neighbors[v]
    }

    /// Get the faces adjacent to an edge.
    pub fn get_edge_faces(&self, v0: usize, v1: usize) -> Option<&Vec<usize>> {
        self.edge_faces.get(&edge_key(v0, v1))
    }

    /// Whether the mesh has no boundary edges.
    pub fn is_watertight(&self) -> bool {
        self.boundary_edges.is_empty()
    }

    /// Whether every edge has at most two adjacent faces.
    pub fn is_manifold(&self) -> bool {
        self.edge_faces.values().all(|faces| faces.len() <= 2)
    }
}

/// Canonical (sorted) key for an undirected edge.
#[inline]
pub(crate) fn edge_key(v0: usize, v1: usize) -> (usize, usize) {
    if v0 < v1 {
        (v0, v1)
    } else {
        (v1, v0)
    }
}

/// An ordered chain of boundary points.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryLoop {
    /// Source point index of every loop point.
    pub point_ids: Vec<usize>,
    /// Loop point coordinates, in traversal order.
    pub points: Vec<Point3<f64>>,
    /// Whether the chain returns to its first point.
    pub closed: bool,
}

impl BoundaryLoop {
    /// Number of points in the loop.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the loop has no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The loop as a polyline-only mesh.
    pub fn to_polyline(&self) -> SurfaceMesh {
        let n = self.points.len();
        let segments = if self.closed { n } else { n.saturating_sub(1) };
        let lines = (0..segments).map(|i| [i, (i + 1) % n]).collect();
        SurfaceMesh::from_polyline(self.points.clone(), lines)
    }
}

/// Trace the boundary of a mesh into loops.
///
/// Loops follow the direction of the boundary edges as they appear in the
/// faces, so each loop winds the same way as the surface it bounds. Every
/// connected boundary chain becomes its own loop.
pub fn boundary_loops(mesh: &SurfaceMesh) -> Vec<BoundaryLoop> {
    let topology = MeshTopology::from_mesh(mesh);
    if topology.boundary_edges.is_empty() {
        return Vec::new();
    }

    // Directed boundary edges, in face order for deterministic traversal.
    let mut outgoing: HashMap<usize, VecDeque<usize>> = HashMap::new();
    let mut starts: Vec<usize> = Vec::new();
    for face in &mesh.faces {
        for i in 0..3 {
            let (a, b) = (face[i], face[(i + 1) % 3]);
            if topology.is_boundary_edge(a, b) {
                outgoing.entry(a).or_default().push_back(b);
                starts.push(a);
            }
        }
    }

    debug!("Tracing {} boundary edges", topology.boundary_edges.len());

    let mut loops = Vec::new();
    for start in starts {
        let Some(first) = outgoing.get_mut(&start).and_then(VecDeque::pop_front) else {
            continue;
        };

        let mut point_ids = vec![start];
        let mut current = first;
        let mut closed = false;
        loop {
            if current == start {
                closed = true;
                break;
            }
            point_ids.push(current);
            match outgoing.get_mut(&current).and_then(VecDeque::pop_front) {
                Some(next) => current = next,
                None => break,
            }
        }

        if !closed {
            warn!("Boundary chain starting at point {} is not closed", start);
        }

        loops.push(BoundaryLoop {
            points: point_ids.iter().map(|&v| mesh.points[v]).collect(),
            point_ids,
            closed,
        });
    }

    loops
}

/// Group faces into edge-connected components.
pub fn face_components(mesh: &SurfaceMesh, topology: &MeshTopology) -> Vec<Vec<usize>> {
    let mut component = vec![usize::MAX; mesh.num_faces()];
    let mut components = Vec::new();

    for seed in 0..mesh.num_faces() {
        if component[seed] != usize::MAX {
            continue;
        }
        let id = components.len();
        let mut members = vec![seed];
        let mut queue = VecDeque::from([seed]);
        component[seed] = id;

        while let Some(f) = queue.pop_front() {
            let face = mesh.faces[f];
            for i in 0..3 {
                let Some(adjacent) = topology.get_edge_faces(face[i], face[(i + 1) % 3]) else {
                    continue;
                };
                for &g in adjacent {
                    if component[g] == usize::MAX {
                        component[g] = id;
                        members.push(g);
                        queue.push_back(g);
                    }
                }
            }
        }
        components.push(members);
    }

    components
}
