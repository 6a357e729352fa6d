//! Junction statistics for diagnostics.

use std::collections::BTreeMap;

use nalgebra::Point3;

use super::detect::{detect_junctions, JunctionSet};
use super::vessel::VesselTree;
use crate::error::Result;
use crate::scalar::Scalar;

/// Summary of the junctions in a tree.
#[derive(Debug, Clone, PartialEq)]
pub struct JunctionStatistics<T: Scalar> {
    /// Number of junctions.
    pub total_junctions: usize,

    /// Junction degree → number of junctions with that degree.
    pub junction_types: BTreeMap<usize, usize>,

    /// Mean degree, or 0 when there are no junctions.
    pub average_vessels_per_junction: f64,

    /// Junction coordinates in id order.
    pub junction_coordinates: Vec<Point3<T>>,
}

impl<T: Scalar> JunctionStatistics<T> {
    /// Summarize an already detected junction set.
    pub fn from_junctions(junctions: &JunctionSet<T>) -> Self {
        let mut junction_types = BTreeMap::new();
        for junction in junctions {
            *junction_types.entry(junction.degree()).or_insert(0) += 1;
        }

        let average_vessels_per_junction = if junctions.is_empty() {
            0.0
        } else {
            let total: usize = junctions.iter().map(|j| j.degree()).sum();
            total as f64 / junctions.len() as f64
        };

        Self {
            total_junctions: junctions.len(),
            junction_types,
            average_vessels_per_junction,
            junction_coordinates: junctions.coordinates(),
        }
    }
}

impl<T: Scalar> std::fmt::Display for JunctionStatistics<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} junctions (types {:?}), {:.2} vessels per junction",
            self.total_junctions, self.junction_types, self.average_vessels_per_junction
        )
    }
}

/// Detect the junctions of a tree and summarize them.
///
/// # Errors
///
/// Propagates detection errors for malformed vessel input.
pub fn junction_statistics<T: Scalar>(vessels: &VesselTree<T>) -> Result<JunctionStatistics<T>> {
    let junctions = detect_junctions(vessels, 1e-6)?;
    Ok(JunctionStatistics::from_junctions(&junctions))
}
