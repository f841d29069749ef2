// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Removal of geometry captured through window glass

use nalgebra::{Point3, Vector3};
use rayon::prelude::*;
use roomscan_core::{MeshFragment, WindowPlane};
use roomscan_geometry::{plane_basis, UP};

/// Window rectangle with an in-plane frame
struct WindowFrame<'a> {
    plane: &'a WindowPlane,
    normal: Vector3<f64>,
    across: Vector3<f64>,
    up: Vector3<f64>,
}

impl<'a> WindowFrame<'a> {
    fn new(plane: &'a WindowPlane) -> Option<Self> {
        let normal = plane.normal.try_normalize(1e-9)?;
        // Width runs horizontally unless the glass itself is horizontal
        let (across, up) = match UP.cross(&normal).try_normalize(1e-9) {
            Some(across) => (across, normal.cross(&across)),
            None => plane_basis(&normal),
        };
        Some(Self {
            plane,
            normal,
            across,
            up,
        })
    }

    /// Behind the glass by more than `tolerance` and inside its outline
    fn hides(&self, point: &Point3<f64>, tolerance: f64) -> bool {
        let offset = point - self.plane.center;
        if offset.dot(&self.normal) >= -tolerance {
            return false;
        }
        offset.dot(&self.across).abs() <= self.plane.width * 0.5
            && offset.dot(&self.up).abs() <= self.plane.height * 0.5
    }
}

/// Drop faces seen through a window.
///
/// A face goes when its world centroid lies behind a window plane and
/// projects inside the window rectangle. Vertices are kept so indices stay
/// valid. Returns the number of faces removed.
pub fn filter_through_windows(
    fragments: &mut [MeshFragment],
    window_planes: &[WindowPlane],
    tolerance: f64,
) -> usize {
    let frames: Vec<WindowFrame> = window_planes.iter().filter_map(WindowFrame::new).collect();
    if frames.is_empty() {
        return 0;
    }

    let removed: usize = fragments
        .par_iter_mut()
        .map(|fragment| {
            let mut kept = Vec::with_capacity(fragment.mesh.indices.len());
            let mut dropped = 0;
            for face in 0..fragment.face_count() {
                let [i0, i1, i2] = fragment.mesh.triangle(face);
                let centroid = Point3::from(
                    (fragment.world_vertex(i0 as usize).coords
                        + fragment.world_vertex(i1 as usize).coords
                        + fragment.world_vertex(i2 as usize).coords)
                        / 3.0,
                );
                if frames.iter().any(|frame| frame.hides(&centroid, tolerance)) {
                    dropped += 1;
                } else {
                    kept.extend_from_slice(&[i0, i1, i2]);
                }
            }
            if dropped > 0 {
                fragment.mesh.indices = kept;
            }
            dropped
        })
        .sum();

    if removed > 0 {
        tracing::info!(removed_faces = removed, windows = frames.len(), "Filtered geometry behind windows");
    }
    removed
}
