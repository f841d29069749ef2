// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Rooms captured in their own frames, stitched back together by door labels

use approx::assert_relative_eq;
use roomscan_alignment::{AlignmentState, Error, MultiRoomAligner, WallSide};
use roomscan_core::{
    AlignmentConfig, AmbiguousLabelPolicy, CapturedScan, DetectedOpening, MeshFragment,
    OpeningKind, ScanStatistics,
};
use roomscan_geometry::{
    invert_rigid, rigid_from_yaw_translation, transform_normal, Matrix4, Point3, Vector3,
};
use uuid::Uuid;

const WALL: f64 = 0.15;

fn opening(center: Point3<f64>, normal: Vector3<f64>) -> DetectedOpening {
    DetectedOpening {
        kind: OpeningKind::Door,
        center,
        normal,
        width: 0.9,
        height: 2.0,
        sill_height: 0.0,
        wall_fragment: None,
    }
}

/// Door face at a world position, expressed in a room's capture frame
fn seen_from(frame: &Matrix4<f64>, center: Point3<f64>, normal: Vector3<f64>) -> DetectedOpening {
    let inverse = invert_rigid(frame).unwrap();
    opening(inverse.transform_point(&center), transform_normal(&inverse, &normal))
}

fn floor(id: u128, size: f64) -> CapturedScan {
    let positions = [[0.0, 0.0, 0.0], [0.0, 0.0, size], [size, 0.0, size], [size, 0.0, 0.0]]
        .iter()
        .flatten()
        .map(|&c: &f64| c as f32)
        .collect();
    let fragment = MeshFragment::from_geometry(
        Uuid::from_u128(id),
        positions,
        vec![0, 1, 2, 0, 2, 3],
        Matrix4::identity(),
    )
    .unwrap();
    CapturedScan::with_fragments(vec![fragment])
}

fn statistics(floor_area: f64, doors: Vec<DetectedOpening>) -> ScanStatistics {
    ScanStatistics {
        floor_area,
        doors,
        ..Default::default()
    }
}

fn frame_b() -> Matrix4<f64> {
    rigid_from_yaw_translation(40f64.to_radians(), &Vector3::new(5.0, 0.1, 1.0))
}

fn frame_c() -> Matrix4<f64> {
    rigid_from_yaw_translation(-70f64.to_radians(), &Vector3::new(1.0, -0.05, -4.0))
}

/// Hall (anchor, world frame), kitchen and study. Door faces:
/// hall/kitchen at x = 4, hall/study at z = 0, kitchen/study at z = -0.5.
fn three_rooms(config: AlignmentConfig) -> (MultiRoomAligner, [Uuid; 3]) {
    let (b, c) = (frame_b(), frame_c());
    let east = Vector3::x();
    let south = -Vector3::z();

    let hall = statistics(
        16.0,
        vec![
            opening(Point3::new(4.0, 1.0, 2.0), -east),
            opening(Point3::new(2.0, 1.0, 0.0), -south),
        ],
    );
    let kitchen = statistics(
        9.0,
        vec![
            seen_from(&b, Point3::new(4.0 + WALL, 1.0, 2.0), east),
            seen_from(&b, Point3::new(6.0, 1.0, -0.5), -south),
        ],
    );
    let study = statistics(
        12.0,
        vec![
            seen_from(&c, Point3::new(2.0, 1.0, -WALL), south),
            seen_from(&c, Point3::new(6.0, 1.0, -0.5 - WALL), south),
        ],
    );

    let mut aligner = MultiRoomAligner::new(config);
    let ids = [
        aligner.add_room("Hall", floor(1, 4.0), hall),
        aligner.add_room("Kitchen", floor(2, 3.0), kitchen),
        aligner.add_room("Study", floor(3, 3.5), study),
    ];
    (aligner, ids)
}

#[test]
fn two_rooms_meet_at_their_door() {
    let (mut aligner, [hall, kitchen, study]) = three_rooms(AlignmentConfig::default());
    aligner.label_door(hall, 0, "hall-kitchen", WallSide::Front).unwrap();
    aligner.label_door(kitchen, 0, "hall-kitchen", WallSide::Front).unwrap();
    assert_eq!(aligner.state(), AlignmentState::DoorsLabeled);

    let report = aligner.align_rooms().unwrap();
    assert!(!report.is_aligned);
    assert_eq!(report.anchor, Some(hall));
    assert_eq!(report.resolved_rooms, vec![hall, kitchen]);
    assert_eq!(report.unresolved_rooms, vec![study]);
    assert_eq!(report.pairs.len(), 1);
    assert_relative_eq!(report.transforms[&hall], Matrix4::identity());
    assert_relative_eq!(report.transforms[&kitchen], frame_b(), epsilon = 1e-9);
    assert_eq!(aligner.state(), AlignmentState::PartiallyAligned);

    let combined = aligner.create_combined_scan().unwrap();
    assert_eq!(combined.fragment_count(), 2);
    assert_relative_eq!(combined.statistics.floor_area, 25.0);
    assert_eq!(aligner.total_floor_area(), Some(25.0));

    // Hall doors come first, then the kitchen's
    let hall_door = &combined.statistics.doors[0];
    let kitchen_door = &combined.statistics.doors[2];
    assert_relative_eq!((kitchen_door.center - hall_door.center).norm(), WALL, epsilon = 1e-9);
    assert_relative_eq!(kitchen_door.normal, -hall_door.normal, epsilon = 1e-9);
}

#[test]
fn three_rooms_close_a_loop() {
    let (mut aligner, [hall, kitchen, study]) = three_rooms(AlignmentConfig::default());
    aligner.label_door(hall, 0, "hall-kitchen", WallSide::Front).unwrap();
    aligner.label_door(kitchen, 0, "hall-kitchen", WallSide::Front).unwrap();
    aligner.label_door(hall, 1, "hall-study", WallSide::Front).unwrap();
    aligner.label_door(study, 0, "hall-study", WallSide::Front).unwrap();
    aligner.label_door(kitchen, 1, "kitchen-study", WallSide::Front).unwrap();
    aligner.label_door(study, 1, "kitchen-study", WallSide::Front).unwrap();

    let report = aligner.align_rooms().unwrap().clone();
    assert!(report.is_aligned);
    assert_eq!(aligner.state(), AlignmentState::Aligned);
    assert_relative_eq!(report.transforms[&kitchen], frame_b(), epsilon = 1e-9);
    assert_relative_eq!(report.transforms[&study], frame_c(), epsilon = 1e-9);

    assert_eq!(report.loop_residuals.len(), 1);
    assert_eq!(report.loop_residuals[0].label, "kitchen-study");
    assert_relative_eq!(report.loop_residuals[0].distance, 0.0, epsilon = 1e-9);
    assert_relative_eq!(report.loop_residuals[0].angle, 0.0, epsilon = 1e-6);

    assert!(aligner.rooms().iter().all(|r| r.is_aligned));
    let combined = aligner.create_combined_scan().unwrap();
    assert_eq!(combined.fragment_count(), 3);
    assert_relative_eq!(combined.statistics.floor_area, 37.0);

    let bounds = aligner.combined_bounds().unwrap();
    let hall_bounds = aligner.rooms()[0].scan.world_bounds();
    assert!(bounds.min.x <= hall_bounds.min.x && bounds.max.z >= hall_bounds.max.z);
    assert!(bounds.min.z < 0.0);
}

#[test]
fn back_side_capture_flips_the_door() {
    let (mut aligner, [hall, kitchen, _]) = three_rooms(AlignmentConfig::default());
    // Re-capture the kitchen door from the hall side of the wall
    let mut room = aligner.room(kitchen).unwrap().clone();
    room.doors[0].opening.normal = -room.doors[0].opening.normal;
    aligner.add_room_scan(room);

    aligner.label_door(hall, 0, "hall-kitchen", WallSide::Front).unwrap();
    aligner.label_door(kitchen, 0, "hall-kitchen", WallSide::Back).unwrap();
    let report = aligner.align_rooms().unwrap();
    assert_relative_eq!(report.transforms[&kitchen], frame_b(), epsilon = 1e-9);
}

#[test]
fn label_in_three_rooms_is_rejected() {
    let (mut aligner, [hall, kitchen, study]) = three_rooms(AlignmentConfig::default());
    aligner.label_door(hall, 0, "X", WallSide::Front).unwrap();
    aligner.label_door(kitchen, 0, "X", WallSide::Front).unwrap();
    aligner.label_door(study, 0, "X", WallSide::Front).unwrap();

    match aligner.align_rooms() {
        Err(Error::AmbiguousDoorLabel { label, rooms }) => {
            assert_eq!(label, "X");
            assert_eq!(rooms, vec![hall, kitchen, study]);
        }
        other => panic!("expected an ambiguous label error, got {other:?}"),
    }
    assert!(aligner.report().is_none());
    assert!(matches!(aligner.create_combined_scan(), Err(Error::NotAligned)));
}

#[test]
fn ambiguous_label_can_be_skipped() {
    let config = AlignmentConfig {
        ambiguous_label_policy: AmbiguousLabelPolicy::Skip,
        ..Default::default()
    };
    let (mut aligner, [hall, kitchen, study]) = three_rooms(config);
    aligner.label_door(hall, 0, "X", WallSide::Front).unwrap();
    aligner.label_door(kitchen, 0, "X", WallSide::Front).unwrap();
    aligner.label_door(study, 0, "X", WallSide::Front).unwrap();
    aligner.label_door(hall, 1, "hall-study", WallSide::Front).unwrap();
    aligner.label_door(study, 1, "hall-study", WallSide::Front).unwrap();
    aligner.label_door(kitchen, 1, "unpaired", WallSide::Front).unwrap();

    let report = aligner.align_rooms().unwrap();
    assert_eq!(report.ambiguous_labels.len(), 1);
    assert_eq!(report.ambiguous_labels[0].label, "X");
    assert_eq!(report.unmatched_labels, vec!["unpaired".to_string()]);
    assert_eq!(report.unresolved_rooms, vec![kitchen]);
    assert_eq!(aligner.state(), AlignmentState::PartiallyAligned);
    assert_eq!(aligner.create_combined_scan().unwrap().fragment_count(), 2);
}
