// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! 2D polygon helpers for floor outlines

use nalgebra::Point2;

/// Compute the signed area of a 2D contour
/// Positive = counter-clockwise, Negative = clockwise
pub fn signed_area(contour: &[Point2<f64>]) -> f64 {
    if contour.len() < 3 {
        return 0.0;
    }

    let mut area = 0.0;
    let n = contour.len();
    for i in 0..n {
        let j = (i + 1) % n;
        area += contour[i].x * contour[j].y;
        area -= contour[j].x * contour[i].y;
    }
    area / 2.0
}

/// Unsigned polygon area (shoelace formula)
#[inline]
pub fn polygon_area(contour: &[Point2<f64>]) -> f64 {
    signed_area(contour).abs()
}

/// Ensure contour has counter-clockwise winding
pub fn ensure_ccw(contour: &[Point2<f64>]) -> Vec<Point2<f64>> {
    if signed_area(contour) < 0.0 {
        contour.iter().rev().cloned().collect()
    } else {
        contour.to_vec()
    }
}

/// Closed perimeter length
pub fn polygon_perimeter(contour: &[Point2<f64>]) -> f64 {
    if contour.len() < 2 {
        return 0.0;
    }
    let n = contour.len();
    (0..n)
        .map(|i| (contour[(i + 1) % n] - contour[i]).norm())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square_cw() -> Vec<Point2<f64>> {
        vec![
            Point2::new(0.0, 0.0),
            Point2::new(0.0, 4.0),
            Point2::new(4.0, 4.0),
            Point2::new(4.0, 0.0),
        ]
    }

    #[test]
    fn test_area_and_winding() {
        let sq = square_cw();
        assert_relative_eq!(signed_area(&sq), -16.0);
        assert_relative_eq!(polygon_area(&sq), 16.0);
        let ccw = ensure_ccw(&sq);
        assert!(signed_area(&ccw) > 0.0);
    }

    #[test]
    fn test_perimeter() {
        assert_relative_eq!(polygon_perimeter(&square_cw()), 16.0);
    }

    #[test]
    fn test_degenerate_inputs() {
        assert_eq!(signed_area(&[]), 0.0);
        assert_eq!(polygon_perimeter(&[Point2::new(1.0, 1.0)]), 0.0);
    }
}
