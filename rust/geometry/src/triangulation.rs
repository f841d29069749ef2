// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Polygon triangulation (earcut) and in-plane bases

use crate::{Error, Point2, Result, Vector3};

/// Whether every non-collinear turn of the ring has the same orientation
fn is_convex(points: &[Point2<f64>]) -> bool {
    let n = points.len();
    let mut orientation = 0.0;
    for i in 0..n {
        let (a, b, c) = (points[i], points[(i + 1) % n], points[(i + 2) % n]);
        let turn = (b - a).perp(&(c - b));
        if turn.abs() <= 1e-10 {
            continue;
        }
        if orientation == 0.0 {
            orientation = turn.signum();
        } else if turn.signum() != orientation {
            return false;
        }
    }
    n >= 3
}

/// Triangulate a simple polygon (no holes)
/// Returns triangle indices into the input points
pub fn triangulate_polygon(points: &[Point2<f64>]) -> Result<Vec<usize>> {
    let n = points.len();

    if n < 3 {
        return Err(Error::TriangulationError(
            "Need at least 3 points to triangulate".to_string(),
        ));
    }

    if n == 3 {
        return Ok(vec![0, 1, 2]);
    }

    // Room outlines are mostly rectangles
    if is_convex(points) {
        return Ok((1..n - 1).flat_map(|i| [0, i, i + 1]).collect());
    }

    let vertices: Vec<f64> = points.iter().flat_map(|p| [p.x, p.y]).collect();

    let indices = earcutr::earcut(&vertices, &[], 2)
        .map_err(|e| Error::TriangulationError(format!("{:?}", e)))?;

    if indices.is_empty() {
        return Err(Error::TriangulationError(
            "earcut produced no triangles".to_string(),
        ));
    }

    Ok(indices)
}

/// Orthonormal in-plane basis `(u, v)` for a plane normal
#[inline]
pub fn plane_basis(normal: &Vector3<f64>) -> (Vector3<f64>, Vector3<f64>) {
    // Axis least parallel to the normal
    let a = normal.abs();
    let reference = if a.x <= a.y && a.x <= a.z {
        Vector3::x()
    } else if a.y <= a.z {
        Vector3::y()
    } else {
        Vector3::z()
    };

    let u = normal.cross(&reference).normalize();
    (u, normal.cross(&u).normalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polygon::polygon_area;

    #[test]
    fn test_triangulate_square() {
        let points = vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ];
        let indices = triangulate_polygon(&points).unwrap();
        assert_eq!(indices.len(), 6);
    }

    #[test]
    fn test_triangulate_l_shape_covers_area() {
        let points = vec![
            Point2::new(0.0, 0.0),
            Point2::new(4.0, 0.0),
            Point2::new(4.0, 2.0),
            Point2::new(2.0, 2.0),
            Point2::new(2.0, 4.0),
            Point2::new(0.0, 4.0),
        ];
        let indices = triangulate_polygon(&points).unwrap();
        assert_eq!(indices.len(), 12);

        let covered: f64 = indices
            .chunks_exact(3)
            .map(|t| polygon_area(&[points[t[0]], points[t[1]], points[t[2]]]))
            .sum();
        assert!((covered - 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_triangulate_too_few_points() {
        assert!(triangulate_polygon(&[Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)]).is_err());
    }

    #[test]
    fn test_plane_basis_is_orthonormal() {
        let n = Vector3::new(0.0, 0.0, 1.0);
        let (u, v) = plane_basis(&n);
        assert!(u.dot(&v).abs() < 1e-12);
        assert!(u.dot(&n).abs() < 1e-12);
        assert!((u.norm() - 1.0).abs() < 1e-12);
        assert!(v.dot(&n).abs() < 1e-12);
    }
}
