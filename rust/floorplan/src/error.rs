// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for floor plan operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while meshing a simplified room
#[derive(Error, Debug)]
pub enum Error {
    #[error("Room has no closed outline ({walls} walls survived simplification)")]
    NoOutline { walls: usize },

    #[error(transparent)]
    Geometry(#[from] roomscan_geometry::Error),
}
