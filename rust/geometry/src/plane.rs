// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Planes and least-squares plane fitting

use nalgebra::{Matrix3, Point3, Vector3};

/// Infinite plane through `point` with unit `normal`
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Plane {
    /// Point on the plane
    pub point: Point3<f64>,
    /// Normal vector (normalized)
    pub normal: Vector3<f64>,
}

impl Plane {
    /// Create a new plane, normalizing the normal
    pub fn new(point: Point3<f64>, normal: Vector3<f64>) -> Self {
        Self {
            point,
            normal: normal.normalize(),
        }
    }

    /// Signed distance from point to plane
    /// Positive = in front, Negative = behind
    #[inline]
    pub fn signed_distance(&self, point: &Point3<f64>) -> f64 {
        (point - self.point).dot(&self.normal)
    }

    /// Orthogonal projection of a point onto the plane
    #[inline]
    pub fn project(&self, point: &Point3<f64>) -> Point3<f64> {
        point - self.normal * self.signed_distance(point)
    }
}

/// Result of a least-squares plane fit
#[derive(Debug, Clone, Copy)]
pub struct PlaneFit {
    pub plane: Plane,
    /// Root-mean-square point-to-plane distance
    pub rms_residual: f64,
}

/// Fit a plane to a point set.
///
/// The normal is the eigenvector of the smallest eigenvalue of the
/// covariance matrix. Returns `None` for fewer than 3 points or a set with
/// no spread (all points coincident).
pub fn fit_plane(points: &[Point3<f64>]) -> Option<PlaneFit> {
    if points.len() < 3 {
        return None;
    }

    let n = points.len() as f64;
    let centroid = Point3::from(points.iter().map(|p| p.coords).sum::<Vector3<f64>>() / n);

    let mut covariance = Matrix3::zeros();
    for p in points {
        let d = p - centroid;
        covariance += d * d.transpose();
    }
    covariance /= n;

    if covariance.abs().max() < 1e-18 {
        return None;
    }

    let eigen = covariance.symmetric_eigen();
    let (min_idx, _) = eigen
        .eigenvalues
        .iter()
        .enumerate()
        .fold((0, f64::INFINITY), |acc, (i, &v)| if v < acc.1 { (i, v) } else { acc });
    let normal = eigen.eigenvectors.column(min_idx).into_owned().try_normalize(1e-12)?;

    let plane = Plane::new(centroid, normal);
    let sum_sq: f64 = points.iter().map(|p| plane.signed_distance(p).powi(2)).sum();

    Some(PlaneFit {
        plane,
        rms_residual: (sum_sq / n).sqrt(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_signed_distance() {
        let plane = Plane::new(Point3::new(0.0, 1.0, 0.0), Vector3::new(0.0, 2.0, 0.0));
        assert_relative_eq!(plane.signed_distance(&Point3::new(5.0, 3.0, 1.0)), 2.0);
        assert_relative_eq!(plane.project(&Point3::new(5.0, 3.0, 1.0)).y, 1.0);
    }

    #[test]
    fn test_fit_horizontal_plane() {
        let points = vec![
            Point3::new(0.0, 2.5, 0.0),
            Point3::new(1.0, 2.5, 0.0),
            Point3::new(0.0, 2.5, 1.0),
            Point3::new(1.0, 2.5, 1.0),
        ];
        let fit = fit_plane(&points).unwrap();
        assert_relative_eq!(fit.plane.normal.y.abs(), 1.0, epsilon = 1e-9);
        assert_relative_eq!(fit.plane.point.y, 2.5, epsilon = 1e-9);
        assert!(fit.rms_residual < 1e-9);
    }

    #[test]
    fn test_fit_rejects_degenerate() {
        assert!(fit_plane(&[Point3::origin(), Point3::origin()]).is_none());
        let same = vec![Point3::new(1.0, 1.0, 1.0); 5];
        assert!(fit_plane(&same).is_none());
    }
}
