//! Neighborhood smoothing and write-back on a capped cylinder.

mod common;

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use nalgebra::Point3;
use vascular_junctions::algo::smooth::SmoothOptions;
use vascular_junctions::algo::Progress;
use vascular_junctions::junction::{
    apply_junction_smoothing_with, apply_junction_smoothing_with_progress, region_point_ids,
};
use vascular_junctions::prelude::*;

fn options() -> JunctionSmoothOptions {
    JunctionSmoothOptions::default().with_radius_factor(1.5)
}

fn region_ids(mesh: &SurfaceMesh) -> Vec<usize> {
    let (_, ids) = region_point_ids(mesh, &Point3::new(0.0, 0.0, 2.0), 1.5).unwrap();
    ids
}

/// Returns the region points in reverse order.
struct ReversingKernel;

impl SmoothingKernel for ReversingKernel {
    fn smooth(&self, mesh: &SurfaceMesh, _options: &SmoothOptions) -> Result<SurfaceMesh> {
        let mut reversed = mesh.clone();
        reversed.points.reverse();
        Ok(reversed)
    }
}

struct FailingKernel;

impl SmoothingKernel for FailingKernel {
    fn smooth(&self, _mesh: &SurfaceMesh, _options: &SmoothOptions) -> Result<SurfaceMesh> {
        Err(JunctionError::collaborator("smoothing", "kernel unavailable"))
    }
}

struct FailingRepairer;

impl MeshRepairer for FailingRepairer {
    fn repair(&self, _mesh: &SurfaceMesh) -> Result<SurfaceMesh> {
        Err(JunctionError::collaborator("repair", "repair unavailable"))
    }
}

#[test]
fn region_spans_five_rings() {
    let mesh = common::capped_cylinder();
    let ids = region_ids(&mesh);
    // Rings at z = 1.0 ..= 3.0; the cap centers are 2.0 away.
    assert_eq!(ids.len(), 5 * common::SEGMENTS);
    assert_eq!(ids[0], 2 * common::SEGMENTS);
    assert_eq!(*ids.last().unwrap(), 7 * common::SEGMENTS - 1);
}

#[test]
fn smoothing_moves_only_the_junction_neighborhood() {
    let mesh = common::capped_cylinder();
    let outcome = apply_junction_smoothing(&mesh, &common::axis_tree(), &options()).unwrap();

    assert!(outcome.is_smoothed(), "reasons: {:?}", outcome.reasons());
    let smoothed = outcome.mesh();
    assert_eq!(smoothed.faces, mesh.faces);
    assert_eq!(smoothed.num_points(), mesh.num_points());

    let region: HashSet<usize> = region_ids(&mesh).into_iter().collect();
    for (i, (before, after)) in mesh.points.iter().zip(&smoothed.points).enumerate() {
        if !region.contains(&i) {
            assert_eq!(before, after, "point {i} outside the region moved");
        }
    }

    let moved = mesh
        .points
        .iter()
        .zip(&smoothed.points)
        .filter(|(before, after)| (*before - *after).norm() > 1e-6)
        .count();
    assert!(moved > 0);

    // The region's own boundary rings stay put.
    for i in (2 * common::SEGMENTS..3 * common::SEGMENTS).chain(6 * common::SEGMENTS..7 * common::SEGMENTS) {
        assert_eq!(mesh.points[i], smoothed.points[i]);
    }

    let normals = smoothed.normals.as_ref().unwrap();
    assert_eq!(normals.len(), smoothed.num_points());
}

#[test]
fn input_mesh_is_not_modified() {
    let mesh = common::capped_cylinder();
    let copy = mesh.clone();
    let _ = apply_junction_smoothing(&mesh, &common::axis_tree(), &options()).unwrap();
    assert_eq!(mesh, copy);
}

#[test]
fn no_junctions_returns_input() {
    let mesh = common::capped_cylinder();
    let outcome = apply_junction_smoothing(&mesh, &common::lone_vessel(), &options()).unwrap();

    assert!(outcome.is_unchanged());
    assert_eq!(outcome.reasons(), &[Degradation::NoJunctions]);
    assert_eq!(outcome.into_mesh(), mesh);
}

#[test]
fn distant_junction_selects_the_whole_mesh() {
    // The closest point is 96 away, so a factor of 2 reaches every point.
    let mesh = common::capped_cylinder();
    let joint = Point3::new(0.0, 0.0, 100.0);
    let tree = VesselTree::new(vec![
        Vessel::new(Point3::new(0.0, 0.0, 99.0), joint),
        Vessel::new(joint, Point3::new(0.0, 0.0, 101.0)),
    ]);

    let outcome = apply_junction_smoothing(&mesh, &tree, &JunctionSmoothOptions::default()).unwrap();
    assert!(!outcome.is_unchanged());
    assert_eq!(outcome.mesh().faces, mesh.faces);
}

#[test]
fn write_back_is_positional() {
    let mesh = common::capped_cylinder();
    let ids = region_ids(&mesh);
    let collaborators = Collaborators::default().with_kernel(ReversingKernel);

    let outcome =
        apply_junction_smoothing_with(&mesh, &common::axis_tree(), &options(), &collaborators)
            .unwrap();
    let result = outcome.mesh();

    // The i-th selected point receives the i-th returned point, whatever
    // order the kernel produced them in.
    for (i, &id) in ids.iter().enumerate() {
        assert_eq!(result.points[id], mesh.points[ids[ids.len() - 1 - i]]);
    }
}

#[test]
fn kernel_failure_is_reported() {
    let mesh = common::capped_cylinder();
    let collaborators = Collaborators::default().with_kernel(FailingKernel);

    let outcome =
        apply_junction_smoothing_with(&mesh, &common::axis_tree(), &options(), &collaborators)
            .unwrap();

    match &outcome {
        Outcome::Degraded { mesh: result, reasons } => {
            assert_eq!(result.points, mesh.points);
            assert!(matches!(
                reasons.as_slice(),
                [Degradation::RegionSmoothingFailed { junction: 0, .. }]
            ));
        }
        other => panic!("expected a degraded outcome, got {other:?}"),
    }
}

#[test]
fn repair_failure_keeps_smoothed_mesh() {
    let mesh = common::capped_cylinder();
    let repaired = apply_junction_smoothing(&mesh, &common::axis_tree(), &options()).unwrap();

    let collaborators = Collaborators::default().with_repairer(FailingRepairer);
    let outcome =
        apply_junction_smoothing_with(&mesh, &common::axis_tree(), &options(), &collaborators)
            .unwrap();

    assert!(matches!(outcome.reasons(), [Degradation::RepairFailed(_)]));
    // Repair is a no-op on this surface, so both runs agree.
    assert_eq!(outcome.mesh().points, repaired.mesh().points);
}

#[test]
fn parallel_matches_sequential() {
    let mesh = common::capped_cylinder();
    let tree = common::axis_tree();

    let parallel = apply_junction_smoothing(&mesh, &tree, &options()).unwrap();
    let sequential =
        apply_junction_smoothing(&mesh, &tree, &options().with_parallel(false)).unwrap();

    assert_eq!(parallel, sequential);
}

#[test]
fn progress_reports_every_junction() {
    let mesh = common::capped_cylinder();
    let updates = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&updates);
    let progress = Progress::new(move |current, total, _| {
        sink.lock().unwrap().push((current, total));
    });

    apply_junction_smoothing_with_progress(
        &mesh,
        &common::axis_tree(),
        &options(),
        &Collaborators::default(),
        &progress,
    )
    .unwrap();

    assert_eq!(*updates.lock().unwrap(), vec![(0, 1), (1, 1)]);
}

#[test]
fn invalid_input_is_an_error() {
    let mesh = common::capped_cylinder();

    let result = apply_junction_smoothing(
        &mesh,
        &common::axis_tree(),
        &options().with_radius_factor(0.0),
    );
    assert!(matches!(result, Err(JunctionError::InvalidParameter { name: "radius_factor", .. })));

    let mut broken = mesh.clone();
    broken.faces.push([0, 1, 10_000]);
    assert!(matches!(
        apply_junction_smoothing(&broken, &common::axis_tree(), &options()),
        Err(JunctionError::InvalidVertexIndex { .. })
    ));
}
