// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Named room captures and their labeled doors

use nalgebra::{Matrix4, Vector3};
use roomscan_core::{CapturedScan, DetectedOpening, ScanStatistics};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which face of the wall a door was captured from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WallSide {
    /// Captured from inside the room; the opening normal points into it
    #[default]
    Front,
    /// Captured from the far face; the opening normal points away from it
    Back,
}

/// Door opening with a user-assigned label.
///
/// Two rooms connect when a door in each carries the same label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledDoor {
    pub opening: DetectedOpening,
    pub label: Option<String>,
    pub wall_side: WallSide,
}

impl LabeledDoor {
    pub fn new(opening: DetectedOpening) -> Self {
        Self {
            opening,
            label: None,
            wall_side: WallSide::Front,
        }
    }

    pub fn is_labeled(&self) -> bool {
        self.label.is_some()
    }

    /// Horizontal unit normal pointing into the owning room, `None` when the
    /// opening normal is vertical
    pub fn inward_normal(&self) -> Option<Vector3<f64>> {
        let n = self.opening.normal;
        let horizontal = Vector3::new(n.x, 0.0, n.z).try_normalize(1e-6)?;
        Some(match self.wall_side {
            WallSide::Front => horizontal,
            WallSide::Back => -horizontal,
        })
    }
}

/// One completed room capture in a multi-room session
#[derive(Debug, Clone)]
pub struct RoomScan {
    pub id: Uuid,
    pub name: String,
    /// Capture in the room's own frame
    pub scan: CapturedScan,
    pub doors: Vec<LabeledDoor>,
    pub windows: Vec<DetectedOpening>,
    /// Room-to-world transform, set once aligned
    pub transform: Option<Matrix4<f64>>,
    pub is_aligned: bool,
}

impl RoomScan {
    /// Room with a fresh id; doors and windows are seeded from `statistics`,
    /// which also replaces the scan's own statistics
    pub fn new(name: impl Into<String>, scan: CapturedScan, statistics: ScanStatistics) -> Self {
        Self::with_id(Uuid::new_v4(), name, scan, statistics)
    }

    pub fn with_id(
        id: Uuid,
        name: impl Into<String>,
        mut scan: CapturedScan,
        statistics: ScanStatistics,
    ) -> Self {
        let doors = statistics.doors.iter().cloned().map(LabeledDoor::new).collect();
        let windows = statistics.windows.clone();
        scan.statistics = statistics;
        Self {
            id,
            name: name.into(),
            scan,
            doors,
            windows,
            transform: None,
            is_aligned: false,
        }
    }

    pub fn floor_area(&self) -> f64 {
        self.scan.statistics.floor_area
    }

    pub(crate) fn clear_alignment(&mut self) {
        self.transform = None;
        self.is_aligned = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Point3;
    use roomscan_core::OpeningKind;

    fn door(normal: Vector3<f64>) -> DetectedOpening {
        DetectedOpening {
            kind: OpeningKind::Door,
            center: Point3::new(1.0, 1.0, 0.0),
            normal,
            width: 0.9,
            height: 2.0,
            sill_height: 0.0,
            wall_fragment: None,
        }
    }

    #[test]
    fn test_back_side_flips_normal() {
        let mut labeled = LabeledDoor::new(door(Vector3::new(0.0, 0.1, 1.0)));
        let front = labeled.inward_normal().unwrap();
        assert_relative_eq!(front, Vector3::z(), epsilon = 1e-12);
        labeled.wall_side = WallSide::Back;
        assert_relative_eq!(labeled.inward_normal().unwrap(), -Vector3::z(), epsilon = 1e-12);

        assert!(LabeledDoor::new(door(Vector3::y())).inward_normal().is_none());
    }

    #[test]
    fn test_room_seeds_doors_from_statistics() {
        let statistics = ScanStatistics {
            floor_area: 12.0,
            doors: vec![door(Vector3::z()), door(Vector3::x())],
            ..Default::default()
        };
        let room = RoomScan::new("Kitchen", CapturedScan::new(), statistics);
        assert_eq!(room.doors.len(), 2);
        assert!(room.doors.iter().all(|d| !d.is_labeled()));
        assert_eq!(room.floor_area(), 12.0);
    }
}
