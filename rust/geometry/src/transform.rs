// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Rigid transform utilities
//!
//! Capture frames are gravity aligned (Y up), so the transforms that relate
//! independently captured rooms are a yaw about Y plus a translation. All
//! matrices are `Matrix4<f64>` and are persisted column-major.

use crate::error::{Error, Result};
use nalgebra::{Matrix3, Matrix4, Rotation3, Vector3};

/// Build a matrix from 16 column-major values
pub fn from_column_major(values: &[f64; 16]) -> Matrix4<f64> {
    Matrix4::from_column_slice(values)
}

/// Flatten a matrix into 16 column-major values
pub fn to_column_major(matrix: &Matrix4<f64>) -> [f64; 16] {
    let mut out = [0.0; 16];
    out.copy_from_slice(matrix.as_slice());
    out
}

/// Rotation about the world Y axis by `angle` radians.
///
/// Rotating by `a` adds `a` to the [`heading`] of a horizontal vector.
pub fn yaw_rotation(angle: f64) -> Matrix4<f64> {
    Rotation3::from_axis_angle(&Vector3::y_axis(), angle).to_homogeneous()
}

/// Rigid transform: yaw about Y followed by a translation
pub fn rigid_from_yaw_translation(yaw: f64, translation: &Vector3<f64>) -> Matrix4<f64> {
    let mut m = yaw_rotation(yaw);
    m[(0, 3)] = translation.x;
    m[(1, 3)] = translation.y;
    m[(2, 3)] = translation.z;
    m
}

/// Heading of a vector on the horizontal plane, measured from +Z towards +X
#[inline]
pub fn heading(v: &Vector3<f64>) -> f64 {
    v.x.atan2(v.z)
}

/// Map a direction through a transform and renormalize.
///
/// Uses the inverse-transpose of the linear part so non-rigid inputs still
/// keep normals perpendicular to their surfaces.
pub fn transform_normal(matrix: &Matrix4<f64>, normal: &Vector3<f64>) -> Vector3<f64> {
    let linear: Matrix3<f64> = matrix.fixed_view::<3, 3>(0, 0).into_owned();
    let mapped = match linear.try_inverse() {
        Some(inv) => inv.transpose() * normal,
        None => linear * normal,
    };
    mapped.try_normalize(1e-12).unwrap_or_else(Vector3::zeros)
}

/// Translation part of a transform
#[inline]
pub fn translation(matrix: &Matrix4<f64>) -> Vector3<f64> {
    Vector3::new(matrix[(0, 3)], matrix[(1, 3)], matrix[(2, 3)])
}

/// Check that a matrix is a proper rigid transform within `epsilon`
pub fn is_rigid(matrix: &Matrix4<f64>, epsilon: f64) -> bool {
    let r: Matrix3<f64> = matrix.fixed_view::<3, 3>(0, 0).into_owned();
    let orthonormal = (r.transpose() * r - Matrix3::identity()).abs().max() <= epsilon;
    let proper = (r.determinant() - 1.0).abs() <= epsilon;
    let affine_row = matrix[(3, 0)].abs() <= epsilon
        && matrix[(3, 1)].abs() <= epsilon
        && matrix[(3, 2)].abs() <= epsilon
        && (matrix[(3, 3)] - 1.0).abs() <= epsilon;
    orthonormal && proper && affine_row
}

/// Invert a rigid transform without a general matrix inverse
pub fn invert_rigid(matrix: &Matrix4<f64>) -> Result<Matrix4<f64>> {
    if !is_rigid(matrix, 1e-6) {
        return Err(Error::InvalidTransform("matrix is not rigid".to_string()));
    }
    let r_t: Matrix3<f64> = matrix.fixed_view::<3, 3>(0, 0).transpose();
    let t = -(r_t * translation(matrix));
    let mut out = Matrix4::identity();
    out.fixed_view_mut::<3, 3>(0, 0).copy_from(&r_t);
    out[(0, 3)] = t.x;
    out[(1, 3)] = t.y;
    out[(2, 3)] = t.z;
    Ok(out)
}
