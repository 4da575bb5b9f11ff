//! Mesh classification lookups through a running session.

mod common;

use std::time::Duration;

use approx::assert_relative_eq;
use crossbeam_channel::bounded;
use common::{lookup, mesh_anchor, mesh_grid, start};
use sthana::core::{AnchorId, ScreenPoint, Vec3};
use sthana::mesh::{FaceMatch, MeshClassification};
use sthana::mock::AttachBehavior;

// ============================================================================
// Point lookups
// ============================================================================

#[test]
fn test_lookup_hits_face() {
    let t = start(AttachBehavior::Immediate);
    t.tracking.set_mesh_anchors(vec![mesh_anchor(
        7,
        Vec3::new(0.0, 0.0, -1.0),
        &[
            (Vec3::new(0.5, 0.0, 0.0), MeshClassification::Wall),
            (Vec3::new(0.0, 0.2, 0.0), MeshClassification::Table),
        ],
    )]);

    let found = lookup(&t.session, Vec3::new(0.01, 0.2, -1.0));

    assert!(found.is_found());
    assert_eq!(found.classification, MeshClassification::Table);
    assert_eq!(found.anchor, Some(AnchorId(7)));
    assert_eq!(found.face, Some(1));
    let centroid = found.centroid.unwrap();
    assert_relative_eq!(centroid.x, 0.0, epsilon = 1e-5);
    assert_relative_eq!(centroid.y, 0.2, epsilon = 1e-5);
    assert_relative_eq!(centroid.z, -1.0, epsilon = 1e-5);
}

#[test]
fn test_lookup_empty_mesh() {
    let t = start(AttachBehavior::Immediate);
    assert_eq!(lookup(&t.session, Vec3::ZERO), FaceMatch::NOT_FOUND);
}

#[test]
fn test_lookup_nothing_close_enough() {
    let t = start(AttachBehavior::Immediate);
    t.tracking.set_mesh_anchors(mesh_grid(4, 8));

    let found = lookup(&t.session, Vec3::new(-3.0, -1.0, -3.0));

    assert!(!found.is_found());
    assert_eq!(found.classification, MeshClassification::None);
}

#[test]
fn test_lookup_beyond_cutoff_skipped() {
    let t = start(AttachBehavior::Immediate);
    // Anchor origin 5m away, face offset back onto the target
    t.tracking.set_mesh_anchors(vec![mesh_anchor(
        1,
        Vec3::new(5.0, 0.0, 0.0),
        &[(Vec3::new(-5.0, 0.0, 0.0), MeshClassification::Floor)],
    )]);

    assert!(!lookup(&t.session, Vec3::ZERO).is_found());
}

#[test]
fn test_lookup_sees_latest_snapshot() {
    let t = start(AttachBehavior::Immediate);
    let target = Vec3::new(1.0, 0.0, 1.0);
    assert!(!lookup(&t.session, target).is_found());

    t.tracking.set_mesh_anchors(vec![mesh_anchor(
        3,
        target,
        &[(Vec3::ZERO, MeshClassification::Seat)],
    )]);
    assert_eq!(
        lookup(&t.session, target).classification,
        MeshClassification::Seat
    );
}

#[test]
fn test_many_lookups_all_answered() {
    let t = start(AttachBehavior::Immediate);
    t.tracking.set_mesh_anchors(mesh_grid(6, 16));

    // More requests than the worker queue holds; overflow runs inline
    let (tx, rx) = bounded(64);
    for i in 0..64 {
        let tx = tx.clone();
        t.session
            .nearest_classified_face(Vec3::new(i as f32 * 0.01, 0.0, 0.0), move |found| {
                tx.send((i, found)).ok();
            })
            .unwrap();
    }

    let mut seen = vec![false; 64];
    for _ in 0..64 {
        let (i, _) = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        seen[i] = true;
    }
    assert!(seen.iter().all(|s| *s));
}

// ============================================================================
// Screen taps
// ============================================================================

#[test]
fn test_classify_screen_point_hit() {
    let t = start(AttachBehavior::Immediate);
    let hit = Vec3::new(0.0, -1.0, -2.0);
    t.tracking.set_mesh_anchors(vec![mesh_anchor(
        1,
        hit,
        &[(Vec3::ZERO, MeshClassification::Floor)],
    )]);
    t.tracking.set_raycast_hit(Some(hit));

    let (tx, rx) = bounded(1);
    t.session
        .classify_screen_point(ScreenPoint::new(200.0, 400.0), move |found| {
            tx.send(found).ok();
        })
        .unwrap();

    let found = rx.recv_timeout(Duration::from_secs(2)).unwrap();
    assert_eq!(found.classification, MeshClassification::Floor);
}

#[test]
fn test_classify_screen_point_miss() {
    let t = start(AttachBehavior::Immediate);
    t.tracking.set_mesh_anchors(mesh_grid(2, 4));
    t.tracking.set_raycast_hit(None);

    let (tx, rx) = bounded(1);
    t.session
        .classify_screen_point(ScreenPoint::new(10.0, 10.0), move |found| {
            tx.send(found).ok();
        })
        .unwrap();

    assert_eq!(
        rx.recv_timeout(Duration::from_secs(2)).unwrap(),
        FaceMatch::NOT_FOUND
    );
}

#[test]
fn test_session_usable_after_lookup() {
    let t = start(AttachBehavior::Immediate);
    t.tracking.set_mesh_anchors(mesh_grid(3, 4));
    lookup(&t.session, Vec3::ZERO);

    // The delivery thread keeps serving commands while the worker runs
    t.session.add_named_anchor("cup", common::at(0.0, 0.0, 0.0)).unwrap();
    assert_eq!(t.session.named_anchors().unwrap(), vec!["cup"]);
}
