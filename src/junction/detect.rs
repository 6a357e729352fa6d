//! Junction detection from vessel endpoints.
//!
//! Every vessel contributes its proximal point and then its distal point to
//! a coordinate table kept in first-seen order. Each coordinate shared by at
//! least two entries becomes a junction, numbered in table order.

use std::collections::{BTreeMap, HashMap};

use nalgebra::Point3;
use tracing::debug;

use super::vessel::VesselTree;
use crate::error::{JunctionError, Result};
use crate::scalar::{distance, exact_point_key, grid_point_key, Scalar};

/// How endpoint coordinates are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointMatching {
    /// Bitwise-equal coordinates (with `-0.0 == 0.0`). Tolerance is unused.
    #[default]
    Exact,
    /// Endpoints within `tolerance` of an earlier endpoint, looked up through
    /// a grid of cell edge `tolerance`. Neighbouring cells are searched, so
    /// a pair straddling a cell edge still matches.
    Grid,
}

/// Options for [`detect_junctions_with`].
#[derive(Debug, Clone)]
pub struct DetectOptions {
    /// Matching tolerance. Only [`PointMatching::Grid`] reads it.
    pub tolerance: f64,

    /// Endpoint comparison mode.
    pub matching: PointMatching,
}

impl Default for DetectOptions {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            matching: PointMatching::Exact,
        }
    }
}

impl DetectOptions {
    /// Set the matching tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set the matching mode.
    pub fn with_matching(mut self, matching: PointMatching) -> Self {
        self.matching = matching;
        self
    }

    /// Grid matching with the given cell size.
    pub fn grid(tolerance: f64) -> Self {
        Self {
            tolerance,
            matching: PointMatching::Grid,
        }
    }
}

/// A point where two or more vessel endpoints meet.
#[derive(Debug, Clone, PartialEq)]
pub struct Junction<T: Scalar> {
    /// Sequential id in first-seen order.
    pub id: usize,

    /// Junction coordinate, in the precision of the input.
    pub position: Point3<T>,

    /// Indices of the vessels with an endpoint here, one entry per endpoint.
    pub vessels: Vec<usize>,
}

impl<T: Scalar> Junction<T> {
    /// Number of vessel endpoints meeting here.
    #[inline]
    pub fn degree(&self) -> usize {
        self.vessels.len()
    }
}

/// Junctions of a tree, ordered by id.
#[derive(Debug, Clone, PartialEq)]
pub struct JunctionSet<T: Scalar> {
    junctions: Vec<Junction<T>>,
}

impl<T: Scalar> JunctionSet<T> {
    /// Number of junctions.
    #[inline]
    pub fn len(&self) -> usize {
        self.junctions.len()
    }

    /// Whether no junction was found.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.junctions.is_empty()
    }

    /// The junction with the given id.
    pub fn get(&self, id: usize) -> Option<&Junction<T>> {
        self.junctions.get(id)
    }

    /// All junctions, ordered by id.
    pub fn junctions(&self) -> &[Junction<T>] {
        &self.junctions
    }

    /// Iterate over junctions in id order.
    pub fn iter(&self) -> std::slice::Iter<'_, Junction<T>> {
        self.junctions.iter()
    }

    /// Junction id → vessel indices.
    pub fn map(&self) -> BTreeMap<usize, Vec<usize>> {
        self.junctions
            .iter()
            .map(|j| (j.id, j.vessels.clone()))
            .collect()
    }

    /// Junction coordinates in id order.
    pub fn coordinates(&self) -> Vec<Point3<T>> {
        self.junctions.iter().map(|j| j.position).collect()
    }

    /// Split into the id → vessels map and the coordinate list.
    pub fn into_parts(self) -> (BTreeMap<usize, Vec<usize>>, Vec<Point3<T>>) {
        self.junctions
            .into_iter()
            .map(|j| ((j.id, j.vessels), j.position))
            .unzip()
    }
}

impl<'a, T: Scalar> IntoIterator for &'a JunctionSet<T> {
    type Item = &'a Junction<T>;
    type IntoIter = std::slice::Iter<'a, Junction<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.junctions.iter()
    }
}

/// Find junctions by exact endpoint equality.
///
/// `tolerance` is accepted for interface compatibility and has no effect;
/// use [`detect_junctions_with`] and [`PointMatching::Grid`] for
/// tolerance-based matching.
///
/// # Errors
///
/// Returns [`JunctionError::NonFiniteCoordinate`] if any endpoint is NaN or
/// infinite.
///
/// # Example
///
/// ```
/// use vascular_junctions::junction::{detect_junctions, Vessel, VesselTree};
/// use nalgebra::Point3;
///
/// let fork = Point3::new(1.0, 0.0, 0.0);
/// let tree = VesselTree::new(vec![
///     Vessel::new(Point3::origin(), fork),
///     Vessel::new(fork, Point3::new(2.0, 1.0, 0.0)),
///     Vessel::new(fork, Point3::new(2.0, -1.0, 0.0)),
/// ]);
///
/// let junctions = detect_junctions(&tree, 1e-6).unwrap();
/// assert_eq!(junctions.len(), 1);
/// assert_eq!(junctions.junctions()[0].vessels, vec![0, 1, 2]);
/// ```
pub fn detect_junctions<T: Scalar>(vessels: &VesselTree<T>, tolerance: f64) -> Result<JunctionSet<T>> {
    detect_junctions_with(vessels, &DetectOptions::default().with_tolerance(tolerance))
}

/// Find junctions with explicit matching options.
///
/// # Errors
///
/// Fails on non-finite endpoints, and in grid mode on a tolerance that is
/// not positive and finite.
pub fn detect_junctions_with<T: Scalar>(
    vessels: &VesselTree<T>,
    options: &DetectOptions,
) -> Result<JunctionSet<T>> {
    if options.matching == PointMatching::Grid
        && !(options.tolerance.is_finite() && options.tolerance > 0.0)
    {
        return Err(JunctionError::invalid_param(
            "tolerance",
            options.tolerance,
            "grid matching needs a positive finite cell size",
        ));
    }

    // Insertion-ordered coordinate table: (first position, vessel indices).
    let mut table: Vec<(Point3<T>, Vec<usize>)> = Vec::new();
    let mut slots = SlotIndex::new(options);

    for (index, vessel) in vessels.iter().enumerate() {
        if !vessel.is_finite() {
            return Err(JunctionError::NonFiniteCoordinate { vessel: index });
        }
        for point in vessel.endpoints() {
            let slot = match slots.find(point, &table) {
                Some(slot) => slot,
                None => {
                    table.push((*point, Vec::new()));
                    slots.insert(point, table.len() - 1);
                    table.len() - 1
                }
            };
            table[slot].1.push(index);
        }
    }

    let junctions: Vec<Junction<T>> = table
        .into_iter()
        .filter(|(_, members)| members.len() > 1)
        .enumerate()
        .map(|(id, (position, vessels))| Junction {
            id,
            position,
            vessels,
        })
        .collect();

    debug!(
        "Detected {} junctions among {} vessels",
        junctions.len(),
        vessels.len()
    );

    Ok(JunctionSet { junctions })
}

/// Lookup from an endpoint to its slot in the coordinate table.
enum SlotIndex {
    Exact(HashMap<[u64; 3], usize>),
    Grid {
        cell: f64,
        cells: HashMap<[i64; 3], Vec<usize>>,
    },
}

impl SlotIndex {
    fn new(options: &DetectOptions) -> Self {
        match options.matching {
            PointMatching::Exact => Self::Exact(HashMap::new()),
            PointMatching::Grid => Self::Grid {
                cell: options.tolerance,
                cells: HashMap::new(),
            },
        }
    }

    /// The earliest slot matching `point`, if any.
    fn find<T: Scalar>(&self, point: &Point3<T>, table: &[(Point3<T>, Vec<usize>)]) -> Option<usize> {
        match self {
            Self::Exact(slots) => slots.get(&exact_point_key(point)).copied(),
            Self::Grid { cell, cells } => {
                let [x, y, z] = grid_point_key(point, *cell);
                let mut best: Option<usize> = None;
                for dx in -1..=1 {
                    for dy in -1..=1 {
                        for dz in -1..=1 {
                            let Some(candidates) = cells.get(&[x + dx, y + dy, z + dz]) else {
                                continue;
                            };
                            for &slot in candidates {
                                if best.is_some_and(|b| b <= slot) {
                                    continue;
                                }
                                if distance(point, &table[slot].0) <= *cell {
                                    best = Some(slot);
                                }
                            }
                        }
                    }
                }
                best
            }
        }
    }

    fn insert<T: Scalar>(&mut self, point: &Point3<T>, slot: usize) {
        match self {
            Self::Exact(slots) => {
                slots.insert(exact_point_key(point), slot);
            }
            Self::Grid { cell, cells } => {
                cells.entry(grid_point_key(point, *cell)).or_default().push(slot);
            }
        }
    }
}
