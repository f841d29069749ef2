// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Spatial hash for tolerance-based point lookup.
//!
//! Uses a uniform grid for O(1) average-case "is there a point near here"
//! queries, which is all the symmetry tests need (existence, not
//! correspondence).

use nalgebra::Point3;
use rustc_hash::FxHashMap;

/// A spatial hash grid over a fixed point set.
///
/// Lookups check the 27 neighboring cells (3x3x3 neighborhood), so the
/// query tolerance must not exceed `cell_size`.
#[derive(Debug)]
pub struct SpatialHash {
    cell_size: f64,
    points: Vec<Point3<f64>>,
    grid: FxHashMap<(i64, i64, i64), Vec<usize>>,
}

impl SpatialHash {
    /// Creates an empty hash with the given cell size
    pub fn new(cell_size: f64) -> Self {
        Self {
            cell_size: cell_size.max(1e-9),
            points: Vec::new(),
            grid: FxHashMap::default(),
        }
    }

    /// Builds a hash over a point set
    pub fn from_points(points: &[Point3<f64>], cell_size: f64) -> Self {
        let mut hash = Self::new(cell_size);
        hash.points.reserve(points.len());
        for p in points {
            hash.insert(*p);
        }
        hash
    }

    /// Inserts a point and returns its index
    pub fn insert(&mut self, p: Point3<f64>) -> usize {
        let index = self.points.len();
        let cell = self.cell_coords(&p);
        self.points.push(p);
        self.grid.entry(cell).or_default().push(index);
        index
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Finds any stored point within `tolerance` of `p`
    pub fn find_near(&self, p: &Point3<f64>, tolerance: f64) -> Option<usize> {
        let (cx, cy, cz) = self.cell_coords(p);
        let tol_sq = tolerance * tolerance;

        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    if let Some(indices) = self.grid.get(&(cx + dx, cy + dy, cz + dz)) {
                        for &i in indices {
                            if (self.points[i] - p).norm_squared() <= tol_sq {
                                return Some(i);
                            }
                        }
                    }
                }
            }
        }

        None
    }

    /// True when some stored point lies within `tolerance` of `p`
    #[inline]
    pub fn has_point_within(&self, p: &Point3<f64>, tolerance: f64) -> bool {
        self.find_near(p, tolerance).is_some()
    }

    #[inline]
    fn cell_coords(&self, p: &Point3<f64>) -> (i64, i64, i64) {
        (
            (p.x / self.cell_size).floor() as i64,
            (p.y / self.cell_size).floor() as i64,
            (p.z / self.cell_size).floor() as i64,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_near_across_cell_boundary() {
        let hash = SpatialHash::from_points(&[Point3::new(0.0099, 0.0, 0.0)], 0.01);
        assert!(hash.has_point_within(&Point3::new(0.0101, 0.0, 0.0), 0.001));
        assert!(!hash.has_point_within(&Point3::new(0.02, 0.0, 0.0), 0.001));
    }

    #[test]
    fn test_negative_coordinates() {
        let hash = SpatialHash::from_points(&[Point3::new(-1.0, -2.0, -3.0)], 0.05);
        assert_eq!(hash.find_near(&Point3::new(-1.01, -2.0, -3.0), 0.02), Some(0));
        assert_eq!(hash.len(), 1);
    }

    #[test]
    fn test_empty_hash() {
        let hash = SpatialHash::new(0.1);
        assert!(hash.is_empty());
        assert!(!hash.has_point_within(&Point3::origin(), 0.1));
    }
}
