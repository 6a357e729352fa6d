//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::f64::consts::PI;

use nalgebra::Point3;
use vascular_junctions::prelude::*;

pub const SEGMENTS: usize = 16;
pub const RINGS: usize = 9;
pub const RING_SPACING: f64 = 0.5;

/// Closed, outward-facing cylinder of radius 1 along +z from z=0 to z=4.
///
/// Rings of `SEGMENTS` points every 0.5, flat fan caps around a center
/// point at each end. Point `ring * SEGMENTS + j` sits at angle `2πj/SEGMENTS`.
pub fn capped_cylinder() -> SurfaceMesh {
    let mut points = Vec::with_capacity(RINGS * SEGMENTS + 2);
    for ring in 0..RINGS {
        let z = ring as f64 * RING_SPACING;
        for j in 0..SEGMENTS {
            let theta = 2.0 * PI * j as f64 / SEGMENTS as f64;
            points.push(Point3::new(theta.cos(), theta.sin(), z));
        }
    }
    let bottom = points.len();
    points.push(Point3::new(0.0, 0.0, 0.0));
    let top = points.len();
    points.push(Point3::new(0.0, 0.0, (RINGS - 1) as f64 * RING_SPACING));

    let mut faces = Vec::new();
    for ring in 0..RINGS - 1 {
        for j in 0..SEGMENTS {
            let next = (j + 1) % SEGMENTS;
            let a = ring * SEGMENTS + j;
            let b = ring * SEGMENTS + next;
            let c = (ring + 1) * SEGMENTS + next;
            let d = (ring + 1) * SEGMENTS + j;
            faces.push([a, b, c]);
            faces.push([a, c, d]);
        }
    }
    let last = (RINGS - 1) * SEGMENTS;
    for j in 0..SEGMENTS {
        let next = (j + 1) % SEGMENTS;
        faces.push([bottom, next, j]);
        faces.push([top, last + j, last + next]);
    }

    SurfaceMesh::from_triangles(points, faces).unwrap()
}

/// Two vessels meeting halfway up the cylinder axis.
pub fn axis_tree() -> VesselTree<f64> {
    let mid = Point3::new(0.0, 0.0, 2.0);
    VesselTree::new(vec![
        Vessel::new(Point3::new(0.0, 0.0, 0.0), mid),
        Vessel::new(mid, Point3::new(0.0, 0.0, 4.0)),
    ])
}

/// A single vessel far away from the cylinder.
pub fn lone_vessel() -> VesselTree<f64> {
    VesselTree::new(vec![Vessel::new(
        Point3::new(10.0, 0.0, 0.0),
        Point3::new(11.0, 0.0, 0.0),
    )])
}

/// Parent splitting into two children at (1, 0, 0).
pub fn y_tree() -> VesselTree<f64> {
    let fork = Point3::new(1.0, 0.0, 0.0);
    VesselTree::new(vec![
        Vessel::new(Point3::origin(), fork),
        Vessel::new(fork, Point3::new(2.0, 1.0, 0.0)),
        Vessel::new(fork, Point3::new(2.0, -1.0, 0.0)),
    ])
}

/// A Y tree whose upper child splits again at (2, 1, 0).
pub fn five_vessel_tree() -> VesselTree<f64> {
    let rows = [
        [0.0, 0.0, 0.0, 1.0, 0.0, 0.0],
        [1.0, 0.0, 0.0, 2.0, 1.0, 0.0],
        [1.0, 0.0, 0.0, 2.0, -1.0, 0.0],
        [2.0, 1.0, 0.0, 3.0, 2.0, 0.0],
        [2.0, 1.0, 0.0, 3.0, 1.0, 0.0],
    ];
    VesselTree::from_rows(&rows).unwrap()
}
