// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Door poses and the rigid transform joining two of them

use crate::room::LabeledDoor;
use nalgebra::{Matrix4, Point3, Vector3};
use roomscan_geometry::{heading, transform_normal, yaw_rotation};
use serde::Serialize;

/// Door opening located on the mid-plane of its wall
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DoorPose {
    pub center: Point3<f64>,
    /// Horizontal unit normal pointing into the owning room
    pub normal: Vector3<f64>,
}

impl DoorPose {
    /// Pose of a labeled door, pushed half a wall thickness back from the
    /// captured face. `None` when the opening has no horizontal normal.
    pub fn from_door(door: &LabeledDoor, wall_thickness: f64) -> Option<Self> {
        let normal = door.inward_normal()?;
        Some(Self {
            center: door.opening.center - normal * (wall_thickness * 0.5),
            normal,
        })
    }

    pub fn transformed(&self, m: &Matrix4<f64>) -> Self {
        Self {
            center: m.transform_point(&self.center),
            normal: transform_normal(m, &self.normal),
        }
    }
}

/// Transform from room B's frame into room A's frame that puts B's door on
/// A's door, facing the other way.
///
/// Rooms are gravity-aligned, so the rotation is a yaw about Y.
pub fn relative_transform(a: &DoorPose, b: &DoorPose) -> Matrix4<f64> {
    let yaw = heading(&-a.normal) - heading(&b.normal);
    Matrix4::new_translation(&a.center.coords)
        * yaw_rotation(yaw)
        * Matrix4::new_translation(&-b.center.coords)
}

/// How far apart two world door poses are: centre distance and the angle
/// between one normal and the reverse of the other
pub fn pose_residual(a: &DoorPose, b: &DoorPose) -> (f64, f64) {
    let distance = (a.center - b.center).norm();
    let angle = a.normal.dot(&-b.normal).clamp(-1.0, 1.0).acos();
    (distance, angle)
}
