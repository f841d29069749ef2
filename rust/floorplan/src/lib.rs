// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # RoomScan Floor Plan
//!
//! Reduces a dense, classified room capture to a handful of wall runs and a
//! floor/ceiling outline.
//!
//! ## Pipeline
//!
//! 1. **Extract**: each wall fragment becomes one plan segment
//! 2. **Merge**: collinear segments facing the same way are joined
//! 3. **Snap**: near-right angles are squared to the dominant orientation,
//!    endpoints snapped to a grid in that frame
//! 4. **Prune**: walls below the minimum length are dropped
//! 5. **Outline**: neighbouring walls are intersected into a
//!    counter-clockwise polygon
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use roomscan_floorplan::simplify_scan;
//!
//! let room = simplify_scan(&scan, &config.simplify);
//! println!("{} walls, {:.1} m²", room.walls.len(), room.floor_area);
//! let mesh = room.to_mesh()?;
//! ```

pub mod error;
pub mod outline;
pub mod simplify;
pub mod types;
pub mod wall_segments;

pub use error::{Error, Result};
pub use outline::{build_outline, line_intersection, order_walls};
pub use simplify::{simplify_room, simplify_scan, simplify_walls, snap_right_angles, snap_to_grid};
pub use types::{from_plan, to_plan, SimplifiedRoom, WallSegment};
pub use wall_segments::{
    dominant_orientation, extract_wall_segments, filter_short_walls, merge_collinear_walls,
    right_angle_deviation,
};
