// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Multi-room alignment through labeled door pairs

use crate::door_pairs::{match_door_pairs, AmbiguousLabel, DoorPair, DoorPairing, DoorRef};
use crate::error::{Error, Result};
use crate::pose::{pose_residual, relative_transform, DoorPose};
use crate::room::{LabeledDoor, RoomScan, WallSide};
use nalgebra::Matrix4;
use roomscan_core::{AlignmentConfig, AmbiguousLabelPolicy, CapturedScan, ScanStatistics};
use roomscan_geometry::Aabb;
use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};
use uuid::Uuid;

/// Where the aligner is in its workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignmentState {
    /// No door pair connects any two rooms yet
    Unaligned,
    /// At least one label pairs two rooms
    DoorsLabeled,
    /// Every room has a transform
    Aligned,
    /// Some rooms could not be reached from the anchor
    PartiallyAligned,
}

/// Disagreement on a door pair that closes a cycle of rooms
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoopResidual {
    pub label: String,
    /// World distance between the two door poses, meters
    pub distance: f64,
    /// Angle between one normal and the reverse of the other, radians
    pub angle: f64,
}

/// Result of one alignment pass
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AlignmentReport {
    /// Room placed at the origin (the first one added)
    pub anchor: Option<Uuid>,
    /// Room-to-world transform per resolved room
    pub transforms: BTreeMap<Uuid, Matrix4<f64>>,
    /// In the order rooms were added
    pub resolved_rooms: Vec<Uuid>,
    pub unresolved_rooms: Vec<Uuid>,
    pub pairs: Vec<DoorPair>,
    /// Labels left out under [`AmbiguousLabelPolicy::Skip`]
    pub ambiguous_labels: Vec<AmbiguousLabel>,
    pub unmatched_labels: Vec<String>,
    pub loop_residuals: Vec<LoopResidual>,
    /// Whether every added room resolved
    pub is_aligned: bool,
}

/// Places independently captured rooms in one world frame.
///
/// The first room added is the anchor and keeps the identity transform.
/// Every other room is reached by walking door pairs outwards from it.
/// Adding a room or changing a label drops the previous alignment.
pub struct MultiRoomAligner {
    config: AlignmentConfig,
    rooms: Vec<RoomScan>,
    state: AlignmentState,
    report: Option<AlignmentReport>,
}

impl MultiRoomAligner {
    pub fn new(config: AlignmentConfig) -> Self {
        Self {
            config,
            rooms: Vec::new(),
            state: AlignmentState::Unaligned,
            report: None,
        }
    }

    pub fn config(&self) -> &AlignmentConfig {
        &self.config
    }

    /// Add a completed capture; its doors start unlabeled
    pub fn add_room(
        &mut self,
        name: impl Into<String>,
        scan: CapturedScan,
        statistics: ScanStatistics,
    ) -> Uuid {
        self.add_room_scan(RoomScan::new(name, scan, statistics))
    }

    /// Add a prepared room, replacing any room with the same id
    pub fn add_room_scan(&mut self, room: RoomScan) -> Uuid {
        let id = room.id;
        tracing::info!(room = %id, name = %room.name, doors = room.doors.len(), "Adding room");
        match self.rooms.iter_mut().find(|r| r.id == id) {
            Some(existing) => *existing = room,
            None => self.rooms.push(room),
        }
        self.invalidate();
        id
    }

    pub fn remove_room(&mut self, id: Uuid) -> Result<RoomScan> {
        let index = self.room_index(id)?;
        let room = self.rooms.remove(index);
        self.invalidate();
        Ok(room)
    }

    /// Rooms in the order they were added
    pub fn rooms(&self) -> &[RoomScan] {
        &self.rooms
    }

    pub fn room(&self, id: Uuid) -> Option<&RoomScan> {
        self.rooms.iter().find(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    pub fn state(&self) -> AlignmentState {
        self.state
    }

    /// Assign a label to a door. Labels are matched by exact equality.
    pub fn label_door(
        &mut self,
        room: Uuid,
        door: usize,
        label: impl Into<String>,
        side: WallSide,
    ) -> Result<()> {
        let target = self.door_mut(room, door)?;
        target.label = Some(label.into());
        target.wall_side = side;
        self.invalidate();
        Ok(())
    }

    pub fn clear_door_label(&mut self, room: Uuid, door: usize) -> Result<()> {
        self.door_mut(room, door)?.label = None;
        self.invalidate();
        Ok(())
    }

    /// Current label matching
    pub fn door_pairs(&self) -> DoorPairing {
        match_door_pairs(&self.rooms)
    }

    /// Solve a transform for every room reachable from the anchor.
    ///
    /// Ambiguous labels fail the pass under [`AmbiguousLabelPolicy::Reject`]
    /// and leave the aligner untouched. Unreachable rooms are not an
    /// error; they are listed in the report and the state becomes
    /// [`AlignmentState::PartiallyAligned`].
    pub fn align_rooms(&mut self) -> Result<&AlignmentReport> {
        let pairing = self.door_pairs();
        if let Some(ambiguous) = pairing.ambiguous.first() {
            match self.config.ambiguous_label_policy {
                AmbiguousLabelPolicy::Reject => {
                    return Err(Error::AmbiguousDoorLabel {
                        label: ambiguous.label.clone(),
                        rooms: ambiguous.rooms(),
                    });
                }
                AmbiguousLabelPolicy::Skip => {
                    for skipped in &pairing.ambiguous {
                        tracing::warn!(label = %skipped.label, doors = skipped.doors.len(), "Skipping ambiguous door label");
                    }
                }
            }
        }

        tracing::info!(rooms = self.rooms.len(), pairs = pairing.pairs.len(), "Aligning rooms");

        let anchor = self.rooms.first().map(|r| r.id);
        let mut transforms = BTreeMap::new();
        let mut loop_residuals = Vec::new();
        if let Some(anchor) = anchor {
            transforms.insert(anchor, Matrix4::identity());
            self.propagate(anchor, &pairing.pairs, &mut transforms, &mut loop_residuals);
        }

        let mut resolved_rooms = Vec::new();
        let mut unresolved_rooms = Vec::new();
        for room in &mut self.rooms {
            room.transform = transforms.get(&room.id).copied();
            room.is_aligned = room.transform.is_some();
            if room.is_aligned {
                resolved_rooms.push(room.id);
            } else {
                unresolved_rooms.push(room.id);
            }
        }

        let is_aligned = anchor.is_some() && unresolved_rooms.is_empty();
        self.state = if is_aligned {
            AlignmentState::Aligned
        } else if resolved_rooms.is_empty() {
            AlignmentState::Unaligned
        } else {
            tracing::warn!(
                resolved = resolved_rooms.len(),
                unresolved = unresolved_rooms.len(),
                "Some rooms have no door path to the anchor"
            );
            AlignmentState::PartiallyAligned
        };

        tracing::info!(
            resolved = resolved_rooms.len(),
            loops = loop_residuals.len(),
            state = ?self.state,
            "Alignment complete"
        );

        Ok(&*self.report.insert(AlignmentReport {
            anchor,
            transforms,
            resolved_rooms,
            unresolved_rooms,
            pairs: pairing.pairs,
            ambiguous_labels: pairing.ambiguous,
            unmatched_labels: pairing.unmatched,
            loop_residuals,
            is_aligned,
        }))
    }

    /// Breadth-first walk over door pairs. The first pair to reach a room
    /// fixes its transform; later pairs into it only report a residual.
    fn propagate(
        &self,
        anchor: Uuid,
        pairs: &[DoorPair],
        transforms: &mut BTreeMap<Uuid, Matrix4<f64>>,
        residuals: &mut Vec<LoopResidual>,
    ) {
        let mut handled = vec![false; pairs.len()];
        let mut queue = VecDeque::from([anchor]);

        while let Some(room) = queue.pop_front() {
            let room_transform = transforms[&room];
            for (i, pair) in pairs.iter().enumerate() {
                if handled[i] {
                    continue;
                }
                let Some((near, far)) = pair.sides_from(room) else {
                    continue;
                };
                handled[i] = true;

                let (Some(near_pose), Some(far_pose)) = (self.door_pose(near), self.door_pose(far))
                else {
                    tracing::warn!(label = %pair.label, "Door has no horizontal normal, pair ignored");
                    continue;
                };

                match transforms.get(&far.room) {
                    None => {
                        let placed = room_transform * relative_transform(&near_pose, &far_pose);
                        tracing::debug!(room = %far.room, label = %pair.label, "Room resolved");
                        transforms.insert(far.room, placed);
                        queue.push_back(far.room);
                    }
                    Some(existing) => {
                        let (distance, angle) = pose_residual(
                            &near_pose.transformed(&room_transform),
                            &far_pose.transformed(existing),
                        );
                        tracing::debug!(label = %pair.label, distance, angle, "Door pair closes a loop");
                        residuals.push(LoopResidual {
                            label: pair.label.clone(),
                            distance,
                            angle,
                        });
                    }
                }
            }
        }
    }

    pub fn report(&self) -> Option<&AlignmentReport> {
        self.report.as_ref()
    }

    /// Whether the last alignment resolved every room
    pub fn is_aligned(&self) -> bool {
        self.report.as_ref().is_some_and(|r| r.is_aligned)
    }

    /// World bounds of all resolved rooms
    pub fn combined_bounds(&self) -> Option<Aabb> {
        self.report.as_ref()?;
        let mut bounds = Aabb::empty();
        for (room, transform) in self.placed_rooms() {
            for fragment in &room.scan.fragments {
                let m = transform * fragment.transform;
                for i in 0..fragment.vertex_count() {
                    bounds.expand(&m.transform_point(&fragment.mesh.position(i)));
                }
            }
        }
        (!bounds.is_empty()).then_some(bounds)
    }

    /// Floor area summed over resolved rooms
    pub fn total_floor_area(&self) -> Option<f64> {
        self.report.as_ref()?;
        Some(self.placed_rooms().map(|(room, _)| room.floor_area()).sum())
    }

    /// Merge every resolved room into one scan in the world frame.
    ///
    /// Unresolved rooms are left out. Fails only when no alignment is
    /// current.
    pub fn create_combined_scan(&self) -> Result<CapturedScan> {
        if self.report.is_none() {
            return Err(Error::NotAligned);
        }

        let mut combined = CapturedScan::new();
        let mut start_time = None;
        let mut end_time = None;
        let mut rooms = 0;
        for (room, transform) in self.placed_rooms() {
            let placed = room.scan.transformed(&transform);
            start_time = Some(start_time.map_or(placed.start_time, |s| placed.start_time.min(s)));
            end_time = end_time.max(placed.end_time);
            combined.statistics.absorb(&placed.statistics);
            combined.fragments.extend(placed.fragments);
            combined.classified_objects.extend(placed.classified_objects);
            combined.window_planes.extend(placed.window_planes);
            rooms += 1;
        }
        if let Some(start) = start_time {
            combined.start_time = start;
        }
        combined.end_time = end_time;

        tracing::info!(
            rooms,
            fragments = combined.fragment_count(),
            floor_area = combined.statistics.floor_area,
            "Combined scan created"
        );
        Ok(combined)
    }

    fn placed_rooms(&self) -> impl Iterator<Item = (&RoomScan, Matrix4<f64>)> {
        self.rooms
            .iter()
            .filter_map(|room| room.transform.map(|t| (room, t)))
    }

    fn door_pose(&self, door: DoorRef) -> Option<DoorPose> {
        let room = self.room(door.room)?;
        DoorPose::from_door(room.doors.get(door.door)?, self.config.wall_thickness)
    }

    fn room_index(&self, id: Uuid) -> Result<usize> {
        self.rooms
            .iter()
            .position(|r| r.id == id)
            .ok_or(Error::UnknownRoom(id))
    }

    fn door_mut(&mut self, room: Uuid, door: usize) -> Result<&mut LabeledDoor> {
        let index = self.room_index(room)?;
        self.rooms[index]
            .doors
            .get_mut(door)
            .ok_or(Error::UnknownDoor { room, index: door })
    }

    fn invalidate(&mut self) {
        self.report = None;
        for room in &mut self.rooms {
            room.clear_alignment();
        }
        self.state = if self.door_pairs().pairs.is_empty() {
            AlignmentState::Unaligned
        } else {
            AlignmentState::DoorsLabeled
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Point3, Vector3};
    use roomscan_core::{DetectedOpening, OpeningKind};

    fn statistics_with_door(center: Point3<f64>, normal: Vector3<f64>) -> ScanStatistics {
        ScanStatistics {
            floor_area: 10.0,
            doors: vec![DetectedOpening {
                kind: OpeningKind::Door,
                center,
                normal,
                width: 0.9,
                height: 2.0,
                sill_height: 0.0,
                wall_fragment: None,
            }],
            ..Default::default()
        }
    }

    fn two_rooms() -> (MultiRoomAligner, Uuid, Uuid) {
        let mut aligner = MultiRoomAligner::new(AlignmentConfig::default());
        let a = aligner.add_room(
            "Hall",
            CapturedScan::new(),
            statistics_with_door(Point3::new(2.0, 1.0, 0.0), Vector3::z()),
        );
        let b = aligner.add_room(
            "Kitchen",
            CapturedScan::new(),
            statistics_with_door(Point3::new(0.0, 1.0, 1.0), Vector3::x()),
        );
        (aligner, a, b)
    }

    #[test]
    fn test_state_follows_labels() {
        let (mut aligner, a, b) = two_rooms();
        assert_eq!(aligner.state(), AlignmentState::Unaligned);
        aligner.label_door(a, 0, "A-B", WallSide::Front).unwrap();
        assert_eq!(aligner.state(), AlignmentState::Unaligned);
        aligner.label_door(b, 0, "A-B", WallSide::Front).unwrap();
        assert_eq!(aligner.state(), AlignmentState::DoorsLabeled);

        aligner.align_rooms().unwrap();
        assert_eq!(aligner.state(), AlignmentState::Aligned);
        assert!(aligner.is_aligned());
        assert_eq!(aligner.total_floor_area(), Some(20.0));

        aligner.clear_door_label(b, 0).unwrap();
        assert_eq!(aligner.state(), AlignmentState::Unaligned);
        assert!(aligner.report().is_none());
        assert!(aligner.rooms().iter().all(|r| !r.is_aligned));
    }

    #[test]
    fn test_unknown_room_and_door() {
        let (mut aligner, a, _) = two_rooms();
        let missing = Uuid::from_u128(42);
        assert!(matches!(
            aligner.label_door(missing, 0, "A", WallSide::Front),
            Err(Error::UnknownRoom(id)) if id == missing
        ));
        assert!(matches!(
            aligner.label_door(a, 3, "A", WallSide::Front),
            Err(Error::UnknownDoor { index: 3, .. })
        ));
        assert!(matches!(aligner.remove_room(missing), Err(Error::UnknownRoom(_))));
    }

    #[test]
    fn test_combined_scan_requires_alignment() {
        let (mut aligner, a, b) = two_rooms();
        assert!(matches!(aligner.create_combined_scan(), Err(Error::NotAligned)));
        assert!(aligner.combined_bounds().is_none());

        aligner.label_door(a, 0, "A-B", WallSide::Front).unwrap();
        aligner.label_door(b, 0, "A-B", WallSide::Front).unwrap();
        aligner.align_rooms().unwrap();
        assert!(aligner.create_combined_scan().is_ok());

        aligner.add_room("Attic", CapturedScan::new(), ScanStatistics::default());
        assert!(matches!(aligner.create_combined_scan(), Err(Error::NotAligned)));
    }

    #[test]
    fn test_empty_aligner() {
        let mut aligner = MultiRoomAligner::new(AlignmentConfig::default());
        let report = aligner.align_rooms().unwrap();
        assert!(!report.is_aligned);
        assert!(report.anchor.is_none());
        assert_eq!(aligner.state(), AlignmentState::Unaligned);
        assert_eq!(aligner.create_combined_scan().unwrap().fragment_count(), 0);
    }
}
