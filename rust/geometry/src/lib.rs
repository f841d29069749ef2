// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! RoomScan Geometry
//!
//! Geometry primitives shared by the room-capture pipeline: flat mesh
//! buffers, axis-aligned bounds, least-squares planes, rigid transforms,
//! a spatial hash for tolerance queries, and 2D polygon helpers with
//! earcutr triangulation. All math is done with nalgebra in `f64`; mesh
//! buffers keep capture precision (`f32`).

pub mod bounds;
pub mod error;
pub mod mesh;
pub mod plane;
pub mod polygon;
pub mod spatial;
pub mod transform;
pub mod triangulation;

// Re-export nalgebra types for convenience
pub use nalgebra::{Matrix3, Matrix4, Point2, Point3, Vector2, Vector3};

pub use bounds::Aabb;
pub use error::{Error, Result};
pub use mesh::Mesh;
pub use plane::{fit_plane, Plane, PlaneFit};
pub use polygon::{ensure_ccw, polygon_area, polygon_perimeter, signed_area};
pub use spatial::SpatialHash;
pub use transform::{
    from_column_major, heading, invert_rigid, is_rigid, rigid_from_yaw_translation,
    to_column_major, transform_normal, translation, yaw_rotation,
};
pub use triangulation::{plane_basis, triangulate_polygon};

/// World up axis of the capture frame (gravity-aligned, Y up)
pub const UP: Vector3<f64> = Vector3::new(0.0, 1.0, 0.0);
