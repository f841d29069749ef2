// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for multi-room alignment.

use thiserror::Error;
use uuid::Uuid;

/// Result type for alignment operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the aligner.
///
/// Rooms that cannot be reached from the anchor are not an error; they
/// are reported in the alignment report.
#[derive(Debug, Error)]
pub enum Error {
    /// A label is not on exactly one door in each of exactly two rooms.
    #[error("door label {label:?} is ambiguous: used {} times across rooms {rooms:?}", .rooms.len())]
    AmbiguousDoorLabel {
        label: String,
        /// Room of every door carrying the label, in room order
        rooms: Vec<Uuid>,
    },

    /// No alignment has been computed since the rooms last changed.
    #[error("rooms are not aligned; run align_rooms first")]
    NotAligned,

    #[error("unknown room {0}")]
    UnknownRoom(Uuid),

    #[error("room {room} has no door {index}")]
    UnknownDoor { room: Uuid, index: usize },
}
