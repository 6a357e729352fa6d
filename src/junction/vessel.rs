//! Vessel segments of a vascular tree.

use nalgebra::Point3;

use crate::error::{JunctionError, Result};
use crate::scalar::Scalar;

/// A single tube segment with a proximal (start) and distal (end) point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vessel<T: Scalar> {
    /// Start point.
    pub proximal: Point3<T>,
    /// End point.
    pub distal: Point3<T>,
}

impl<T: Scalar> Vessel<T> {
    /// Create a vessel from its endpoints.
    pub fn new(proximal: Point3<T>, distal: Point3<T>) -> Self {
        Self { proximal, distal }
    }

    /// Both endpoints, proximal first.
    #[inline]
    pub fn endpoints(&self) -> [&Point3<T>; 2] {
        [&self.proximal, &self.distal]
    }

    /// Whether every endpoint coordinate is finite.
    pub fn is_finite(&self) -> bool {
        self.endpoints()
            .iter()
            .all(|p| p.iter().all(|&c| c.is_finite()))
    }
}

/// Ordered vessel records of a tree; a vessel's index is its position.
#[derive(Debug, Clone, PartialEq)]
pub struct VesselTree<T: Scalar> {
    vessels: Vec<Vessel<T>>,
}

impl<T: Scalar> Default for VesselTree<T> {
    fn default() -> Self {
        Self {
            vessels: Vec::new(),
        }
    }
}

impl<T: Scalar> VesselTree<T> {
    /// Create a tree from vessel records.
    pub fn new(vessels: Vec<Vessel<T>>) -> Self {
        Self { vessels }
    }

    /// Pair up proximal and distal point lists.
    ///
    /// # Errors
    ///
    /// Returns [`JunctionError::EndpointCountMismatch`] when the lists differ
    /// in length.
    pub fn from_endpoints(proximal: Vec<Point3<T>>, distal: Vec<Point3<T>>) -> Result<Self> {
        if proximal.len() != distal.len() {
            return Err(JunctionError::EndpointCountMismatch {
                proximal: proximal.len(),
                distal: distal.len(),
            });
        }
        let vessels = proximal
            .into_iter()
            .zip(distal)
            .map(|(p, d)| Vessel::new(p, d))
            .collect();
        Ok(Self { vessels })
    }

    /// Build a tree from table rows laid out as `[px, py, pz, dx, dy, dz, ...]`.
    ///
    /// Columns past the sixth (radii, flow data and the like) are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`JunctionError::MissingField`] for the first row with fewer
    /// than six columns.
    ///
    /// # Example
    ///
    /// ```
    /// use vascular_junctions::junction::VesselTree;
    ///
    /// let rows = vec![
    ///     vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.25],
    ///     vec![1.0, 0.0, 0.0, 2.0, 1.0, 0.0, 0.18],
    /// ];
    /// let tree = VesselTree::from_rows(&rows).unwrap();
    /// assert_eq!(tree.len(), 2);
    /// ```
    pub fn from_rows<R: AsRef<[T]>>(rows: &[R]) -> Result<Self> {
        const COLUMNS: usize = 6;

        let vessels = rows
            .iter()
            .enumerate()
            .map(|(row, values)| {
                let v = values.as_ref();
                if v.len() < COLUMNS {
                    return Err(JunctionError::MissingField {
                        row,
                        expected: COLUMNS,
                        found: v.len(),
                    });
                }
                Ok(Vessel::new(
                    Point3::new(v[0], v[1], v[2]),
                    Point3::new(v[3], v[4], v[5]),
                ))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { vessels })
    }

    /// Append a vessel and return its index.
    pub fn push(&mut self, vessel: Vessel<T>) -> usize {
        self.vessels.push(vessel);
        self.vessels.len() - 1
    }

    /// Number of vessels.
    #[inline]
    pub fn len(&self) -> usize {
        self.vessels.len()
    }

    /// Whether the tree has no vessels.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vessels.is_empty()
    }

    /// The vessel records in index order.
    #[inline]
    pub fn vessels(&self) -> &[Vessel<T>] {
        &self.vessels
    }

    /// Iterate over vessels in index order.
    pub fn iter(&self) -> std::slice::Iter<'_, Vessel<T>> {
        self.vessels.iter()
    }
}

impl<T: Scalar> From<Vec<Vessel<T>>> for VesselTree<T> {
    fn from(vessels: Vec<Vessel<T>>) -> Self {
        Self::new(vessels)
    }
}

impl<T: Scalar> FromIterator<Vessel<T>> for VesselTree<T> {
    fn from_iter<I: IntoIterator<Item = Vessel<T>>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
