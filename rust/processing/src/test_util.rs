// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fragment builders shared by the unit tests

use nalgebra::Matrix4;
use roomscan_core::MeshFragment;
use uuid::Uuid;

/// Two-triangle quad; the normal follows the corner winding
pub fn quad(id: u128, corners: [[f64; 3]; 4]) -> MeshFragment {
    let positions = corners.iter().flatten().map(|&c| c as f32).collect();
    let indices = vec![0, 1, 2, 0, 2, 3];
    MeshFragment::from_geometry(Uuid::from_u128(id), positions, indices, Matrix4::identity())
        .unwrap()
}

/// Up-facing square of side `size` at height `y`
pub fn floor_quad(id: u128, y: f64, size: f64) -> MeshFragment {
    quad(id, [[0.0, y, 0.0], [0.0, y, size], [size, y, size], [size, y, 0.0]])
}

/// Down-facing square of side `size` at height `y`
pub fn ceiling_quad(id: u128, y: f64, size: f64) -> MeshFragment {
    quad(id, [[0.0, y, 0.0], [size, y, 0.0], [size, y, size], [0.0, y, size]])
}

/// Wall in the plane `z = z`, facing +Z, spanning `x0..x1` and `0..height`
pub fn wall_quad(id: u128, x0: f64, x1: f64, z: f64, height: f64) -> MeshFragment {
    quad(id, [[x0, 0.0, z], [x1, 0.0, z], [x1, height, z], [x0, height, z]])
}
