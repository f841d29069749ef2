// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Detected architectural features (doors, windows, protrusions, edges)

use nalgebra::{Matrix4, Point3, Vector3};
use roomscan_geometry::{transform_normal, Aabb};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opening type classification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OpeningKind {
    Door,
    Window,
}

/// Detected opening (door/window) in a wall
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetectedOpening {
    pub kind: OpeningKind,
    /// Center of the opening rectangle, world space
    pub center: Point3<f64>,
    /// Horizontal unit normal of the opening plane, pointing into the room
    pub normal: Vector3<f64>,
    /// Horizontal size in meters
    pub width: f64,
    /// Vertical size in meters
    pub height: f64,
    /// Height of the bottom edge above the floor
    pub sill_height: f64,
    /// Wall fragment the opening was found in
    pub wall_fragment: Option<Uuid>,
}

impl DetectedOpening {
    pub fn transformed(&self, m: &Matrix4<f64>) -> Self {
        Self {
            center: m.transform_point(&self.center),
            normal: transform_normal(m, &self.normal),
            ..self.clone()
        }
    }
}

/// Ceiling-adjacent structure (beam, duct)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetectedProtrusion {
    pub fragment: Uuid,
    pub bounds: Aabb,
    /// Distance from the ceiling plane down to the protrusion's underside
    pub depth_below_ceiling: f64,
    pub area: f64,
}

impl DetectedProtrusion {
    pub fn transformed(&self, m: &Matrix4<f64>) -> Self {
        Self {
            bounds: self.bounds.transformed(m),
            ..self.clone()
        }
    }
}

/// Chain of connected sharp mesh edges (corners, frames, trims)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetectedEdge {
    pub bounds: Aabb,
    /// Sum of the edge lengths in the chain
    pub length: f64,
    pub edge_count: usize,
}

impl DetectedEdge {
    pub fn transformed(&self, m: &Matrix4<f64>) -> Self {
        Self {
            bounds: self.bounds.transformed(m),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use roomscan_geometry::rigid_from_yaw_translation;
    use std::f64::consts::PI;

    #[test]
    fn test_opening_transform_turns_normal() {
        let door = DetectedOpening {
            kind: OpeningKind::Door,
            center: Point3::new(1.0, 1.0, 0.0),
            normal: Vector3::new(0.0, 0.0, 1.0),
            width: 0.9,
            height: 2.0,
            sill_height: 0.0,
            wall_fragment: None,
        };
        let m = rigid_from_yaw_translation(PI, &Vector3::new(0.0, 0.0, 5.0));
        let moved = door.transformed(&m);
        assert_relative_eq!(moved.normal.z, -1.0, epsilon = 1e-12);
        assert_relative_eq!(moved.center.x, -1.0, epsilon = 1e-12);
        assert_relative_eq!(moved.center.z, 5.0, epsilon = 1e-12);
        assert_eq!(moved.width, 0.9);
    }
}
