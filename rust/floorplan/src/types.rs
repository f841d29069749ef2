// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Core types for simplified rooms
//!
//! Plan coordinates are world `(x, z)`: `Point2::new(p.x, p.z)`.

use crate::error::{Error, Result};
use nalgebra::{Point2, Point3, Vector2, Vector3};
use roomscan_geometry::{triangulate_polygon, Mesh, UP};
use serde::{Deserialize, Serialize};

/// Plan position of a world point
#[inline]
pub fn to_plan(p: &Point3<f64>) -> Point2<f64> {
    Point2::new(p.x, p.z)
}

/// World point at height `y` above a plan position
#[inline]
pub fn from_plan(p: &Point2<f64>, y: f64) -> Point3<f64> {
    Point3::new(p.x, y, p.y)
}

/// Straight wall run on the plan.
///
/// `start -> end` keeps the room interior on the left, so walls listed in
/// traversal order form a counter-clockwise outline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WallSegment {
    pub start: Point2<f64>,
    pub end: Point2<f64>,
    /// Unit plan normal pointing into the room
    pub normal: Vector2<f64>,
    /// Captured surface area backing this wall, used as merge weight
    pub support: f64,
}

impl WallSegment {
    /// Segment along the line `normal · p = offset`, spanning `t0..t1` on
    /// the interior-left direction
    pub fn from_offset(normal: Vector2<f64>, offset: f64, t0: f64, t1: f64, support: f64) -> Self {
        let direction = Vector2::new(normal.y, -normal.x);
        let base = Point2::from(normal * offset);
        Self {
            start: base + direction * t0,
            end: base + direction * t1,
            normal,
            support,
        }
    }

    pub fn length(&self) -> f64 {
        (self.end - self.start).norm()
    }

    /// Unit direction, interior on the left
    pub fn direction(&self) -> Vector2<f64> {
        Vector2::new(self.normal.y, -self.normal.x)
    }

    /// Plan angle of the direction in radians
    pub fn angle(&self) -> f64 {
        let d = self.direction();
        d.y.atan2(d.x)
    }

    pub fn midpoint(&self) -> Point2<f64> {
        Point2::from((self.start.coords + self.end.coords) * 0.5)
    }

    /// Signed distance of the wall line from the plan origin along the normal
    pub fn offset(&self) -> f64 {
        self.normal.dot(&self.midpoint().coords)
    }
}

/// Minimal polygonal room: wall runs plus floor and ceiling outlines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimplifiedRoom {
    pub walls: Vec<WallSegment>,
    /// Counter-clockwise plan outline at floor height
    pub floor: Vec<Point3<f64>>,
    /// Same outline at ceiling height
    pub ceiling: Vec<Point3<f64>>,
    pub floor_height: f64,
    pub ceiling_height: f64,
    pub floor_area: f64,
    pub perimeter: f64,
    /// Vertices in the fragments this room was built from
    pub source_vertex_count: usize,
}

impl SimplifiedRoom {
    pub fn has_outline(&self) -> bool {
        self.floor.len() >= 3
    }

    pub fn height(&self) -> f64 {
        self.ceiling_height - self.floor_height
    }

    /// Vertices in the simplified outline
    pub fn vertex_count(&self) -> usize {
        self.floor.len() + self.ceiling.len()
    }

    /// Plan outline
    pub fn outline(&self) -> Vec<Point2<f64>> {
        self.floor.iter().map(to_plan).collect()
    }

    /// Closed mesh of the room: triangulated floor and ceiling plus one quad
    /// per outline edge, all facing into the room
    pub fn to_mesh(&self) -> Result<Mesh> {
        if !self.has_outline() {
            return Err(Error::NoOutline {
                walls: self.walls.len(),
            });
        }

        let outline = self.outline();
        let triangles = triangulate_polygon(&outline)?;
        let n = outline.len();
        let mut mesh = Mesh::with_capacity(2 * n + 4 * n, 2 * triangles.len() + 6 * n);

        // A counter-clockwise plan polygon faces -Y, so floor triangles are
        // flipped to face up
        for p in &self.floor {
            mesh.add_vertex(*p, UP);
        }
        for t in triangles.chunks_exact(3) {
            mesh.add_triangle(t[0] as u32, t[2] as u32, t[1] as u32);
        }

        let base = n as u32;
        for p in &self.ceiling {
            mesh.add_vertex(*p, -UP);
        }
        for t in triangles.chunks_exact(3) {
            mesh.add_triangle(base + t[0] as u32, base + t[1] as u32, base + t[2] as u32);
        }

        for i in 0..n {
            let j = (i + 1) % n;
            let edge = outline[j] - outline[i];
            let Some(inward) = Vector2::new(-edge.y, edge.x).try_normalize(1e-12) else {
                continue;
            };
            let normal = Vector3::new(inward.x, 0.0, inward.y);
            let first = mesh.vertex_count() as u32;
            mesh.add_vertex(self.floor[i], normal);
            mesh.add_vertex(self.floor[j], normal);
            mesh.add_vertex(self.ceiling[j], normal);
            mesh.add_vertex(self.ceiling[i], normal);
            mesh.add_triangle(first, first + 1, first + 2);
            mesh.add_triangle(first, first + 2, first + 3);
        }

        Ok(mesh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_wall_direction_keeps_interior_left() {
        // Wall on z = 0 facing +Z: walking +X keeps the room on the left
        let wall = WallSegment::from_offset(Vector2::new(0.0, 1.0), 0.0, -2.0, 2.0, 1.0);
        assert_relative_eq!(wall.direction().x, 1.0);
        assert_relative_eq!(wall.start.x, -2.0);
        assert_relative_eq!(wall.end.x, 2.0);
        assert_relative_eq!(wall.length(), 4.0);
        assert_relative_eq!(wall.offset(), 0.0);
    }

    #[test]
    fn test_to_mesh_faces_inward() {
        let outline = [
            Point2::new(0.0, 0.0),
            Point2::new(4.0, 0.0),
            Point2::new(4.0, 3.0),
            Point2::new(0.0, 3.0),
        ];
        let room = SimplifiedRoom {
            walls: Vec::new(),
            floor: outline.iter().map(|p| from_plan(p, 0.0)).collect(),
            ceiling: outline.iter().map(|p| from_plan(p, 2.5)).collect(),
            floor_height: 0.0,
            ceiling_height: 2.5,
            floor_area: 12.0,
            perimeter: 14.0,
            source_vertex_count: 0,
        };
        let mesh = room.to_mesh().unwrap();
        assert_eq!(mesh.triangle_count(), 2 + 2 + 8);
        assert_relative_eq!(mesh.face_normal(0).unwrap().y, 1.0, epsilon = 1e-9);
        assert_relative_eq!(mesh.face_normal(2).unwrap().y, -1.0, epsilon = 1e-9);
        // First wall runs along z = 0 and must face +Z
        assert_relative_eq!(mesh.face_normal(4).unwrap().z, 1.0, epsilon = 1e-9);
        assert_relative_eq!(mesh.total_area(), 2.0 * 12.0 + 14.0 * 2.5, epsilon = 1e-4);
    }

    #[test]
    fn test_to_mesh_without_outline_fails() {
        let room = SimplifiedRoom {
            walls: Vec::new(),
            floor: Vec::new(),
            ceiling: Vec::new(),
            floor_height: 0.0,
            ceiling_height: 0.0,
            floor_area: 0.0,
            perimeter: 0.0,
            source_vertex_count: 0,
        };
        assert!(matches!(room.to_mesh(), Err(Error::NoOutline { walls: 0 })));
    }
}
