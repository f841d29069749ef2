// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # RoomScan Alignment
//!
//! Places rooms captured in separate sessions into one shared frame.
//!
//! Each room keeps its own gravity-aligned frame. The user labels doors;
//! a label found on one door in each of two rooms joins them. The door
//! is treated as a single opening seen from both sides, so the two door
//! poses must coincide with opposite normals. The transform solving that
//! is a yaw plus a translation.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use roomscan_alignment::{MultiRoomAligner, WallSide};
//!
//! let mut aligner = MultiRoomAligner::new(config.alignment);
//! let hall = aligner.add_room("Hall", hall_scan, hall_stats);
//! let kitchen = aligner.add_room("Kitchen", kitchen_scan, kitchen_stats);
//! aligner.label_door(hall, 0, "hall-kitchen", WallSide::Front)?;
//! aligner.label_door(kitchen, 1, "hall-kitchen", WallSide::Front)?;
//!
//! let report = aligner.align_rooms()?;
//! let combined = aligner.create_combined_scan()?;
//! ```

pub mod aligner;
pub mod door_pairs;
pub mod error;
pub mod pose;
pub mod room;

pub use aligner::{AlignmentReport, AlignmentState, LoopResidual, MultiRoomAligner};
pub use door_pairs::{match_door_pairs, AmbiguousLabel, DoorPair, DoorPairing, DoorRef};
pub use error::{Error, Result};
pub use pose::{pose_residual, relative_transform, DoorPose};
pub use room::{LabeledDoor, RoomScan, WallSide};
