// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Room outline from ordered wall segments

use crate::types::WallSegment;
use nalgebra::{Point2, Vector2};
use roomscan_geometry::{ensure_ccw, signed_area};

/// Lines closer to parallel than this (sine of the angle) do not intersect
const PARALLEL_SINE: f64 = 0.087; // ~5°

const DUPLICATE_EPSILON: f64 = 1e-6;

/// Order walls into a closed chain.
///
/// Starts at the wall with the lowest start point and repeatedly follows
/// the unused wall whose start is nearest the current end. A link longer
/// than both walls it joins means the chain is broken; the walls are then
/// ordered by the polar angle of their midpoints around the mean midpoint,
/// which is only reliable for star-shaped rooms.
pub fn order_walls(walls: &[WallSegment]) -> Vec<WallSegment> {
    chain_walls(walls).unwrap_or_else(|| polar_order(walls))
}

fn chain_walls(walls: &[WallSegment]) -> Option<Vec<WallSegment>> {
    let first = walls
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            a.start
                .y
                .total_cmp(&b.start.y)
                .then(a.start.x.total_cmp(&b.start.x))
        })
        .map(|(i, _)| i)?;

    let mut used = vec![false; walls.len()];
    used[first] = true;
    let mut chain = vec![walls[first].clone()];

    while chain.len() < walls.len() {
        let current = chain.last()?;
        let (next, gap) = walls
            .iter()
            .enumerate()
            .filter(|(i, _)| !used[*i])
            .map(|(i, w)| (i, (w.start - current.end).norm()))
            .min_by(|a, b| a.1.total_cmp(&b.1))?;
        if gap > current.length().max(walls[next].length()) {
            tracing::debug!(gap, "Wall chain broken, ordering by angle");
            return None;
        }
        used[next] = true;
        chain.push(walls[next].clone());
    }
    Some(chain)
}

/// Counter-clockwise order of wall midpoints around their mean; ties keep
/// input order
fn polar_order(walls: &[WallSegment]) -> Vec<WallSegment> {
    if walls.is_empty() {
        return Vec::new();
    }
    let center = walls
        .iter()
        .fold(Vector2::zeros(), |acc, w| acc + w.midpoint().coords)
        / walls.len() as f64;

    let mut keyed: Vec<(f64, &WallSegment)> = walls
        .iter()
        .map(|w| {
            let d = w.midpoint().coords - center;
            (d.y.atan2(d.x), w)
        })
        .collect();
    keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
    keyed.into_iter().map(|(_, w)| w.clone()).collect()
}

/// Intersection of the infinite lines through two walls
pub fn line_intersection(a: &WallSegment, b: &WallSegment) -> Option<Point2<f64>> {
    let da = a.end - a.start;
    let db = b.end - b.start;
    let (la, lb) = (da.norm(), db.norm());
    if la < 1e-12 || lb < 1e-12 {
        return None;
    }
    let cross = da.x * db.y - da.y * db.x;
    if (cross / (la * lb)).abs() < PARALLEL_SINE {
        return None;
    }
    let w = b.start - a.start;
    let s = (w.x * db.y - w.y * db.x) / cross;
    Some(a.start + da * s)
}

/// Closed counter-clockwise outline implied by a set of walls.
///
/// Neighbouring walls meet at the intersection of their lines. Parallel
/// neighbours, or ones whose intersection lands implausibly far away, are
/// joined by a short connector instead. Returns an empty outline when
/// fewer than three corners remain.
pub fn build_outline(walls: &[WallSegment]) -> Vec<Point2<f64>> {
    let ordered = order_walls(walls);
    let n = ordered.len();
    if n < 3 {
        return Vec::new();
    }

    let mut corners: Vec<Point2<f64>> = Vec::with_capacity(n + 2);
    for i in 0..n {
        let a = &ordered[i];
        let b = &ordered[(i + 1) % n];
        match line_intersection(a, b) {
            Some(p) if (p - a.end).norm() <= a.length() + b.length() => corners.push(p),
            _ => {
                corners.push(a.end);
                corners.push(b.start);
            }
        }
    }

    corners.dedup_by(|p, q| (*p - *q).norm() < DUPLICATE_EPSILON);
    while corners.len() > 1
        && corners
            .first()
            .zip(corners.last())
            .is_some_and(|(first, last)| (first - last).norm() < DUPLICATE_EPSILON)
    {
        corners.pop();
    }

    if corners.len() < 3 || signed_area(&corners).abs() < 1e-9 {
        return Vec::new();
    }
    ensure_ccw(&corners)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use roomscan_geometry::polygon_area;

    /// Wall from `a` to `b` with the interior on the left
    fn wall(a: (f64, f64), b: (f64, f64)) -> WallSegment {
        let start = Point2::new(a.0, a.1);
        let end = Point2::new(b.0, b.1);
        let d = (end - start).normalize();
        WallSegment {
            start,
            end,
            normal: Vector2::new(-d.y, d.x),
            support: 1.0,
        }
    }

    #[test]
    fn test_rectangle_from_shortened_walls() {
        // Walls stop short of the corners, as captured walls usually do
        let walls = vec![
            wall((0.0, 3.0), (0.0, 0.5)),
            wall((0.2, 0.0), (3.8, 0.0)),
            wall((4.0, 0.3), (4.0, 2.7)),
            wall((3.5, 3.0), (0.4, 3.0)),
        ];
        let outline = build_outline(&walls);
        assert_eq!(outline.len(), 4);
        assert_relative_eq!(polygon_area(&outline), 12.0, epsilon = 1e-9);
        assert!(signed_area(&outline) > 0.0);
        assert!(outline
            .iter()
            .any(|p| (p - Point2::new(4.0, 3.0)).norm() < 1e-9));
    }

    #[test]
    fn test_l_shaped_room() {
        let walls = vec![
            wall((0.0, 0.0), (4.0, 0.0)),
            wall((4.0, 0.0), (4.0, 2.0)),
            wall((4.0, 2.0), (2.0, 2.0)),
            wall((2.0, 2.0), (2.0, 4.0)),
            wall((2.0, 4.0), (0.0, 4.0)),
            wall((0.0, 4.0), (0.0, 0.0)),
        ];
        let outline = build_outline(&walls);
        assert_eq!(outline.len(), 6);
        assert_relative_eq!(polygon_area(&outline), 12.0, epsilon = 1e-9);
    }

    fn u_room() -> Vec<WallSegment> {
        // 6 x 4 m with a 2 x 2 m notch cut into the north side
        vec![
            wall((0.0, 0.0), (6.0, 0.0)),
            wall((6.0, 0.0), (6.0, 4.0)),
            wall((6.0, 4.0), (4.0, 4.0)),
            wall((4.0, 4.0), (4.0, 2.0)),
            wall((4.0, 2.0), (2.0, 2.0)),
            wall((2.0, 2.0), (2.0, 4.0)),
            wall((2.0, 4.0), (0.0, 4.0)),
            wall((0.0, 4.0), (0.0, 0.0)),
        ]
    }

    #[test]
    fn test_u_shaped_room() {
        let outline = build_outline(&u_room());
        assert_eq!(outline.len(), 8);
        assert_relative_eq!(polygon_area(&outline), 20.0, epsilon = 1e-9);
        assert_relative_eq!(signed_area(&outline), 20.0, epsilon = 1e-9);
        assert!(outline
            .iter()
            .any(|p| (p - Point2::new(4.0, 2.0)).norm() < 1e-9));
    }

    #[test]
    fn test_u_shaped_room_in_any_input_order() {
        let mut walls = u_room();
        walls.reverse();
        walls.swap(1, 5);
        let ordered = order_walls(&walls);
        assert_eq!(ordered[0].start, Point2::new(0.0, 0.0));
        for pair in ordered.windows(2) {
            assert!((pair[1].start - pair[0].end).norm() < 1e-9);
        }
        assert_relative_eq!(polygon_area(&build_outline(&walls)), 20.0, epsilon = 1e-9);
    }

    #[test]
    fn test_broken_chain_falls_back_to_angle_order() {
        // Opposite walls only: no wall starts near another's end
        let walls = vec![
            wall((0.0, 0.0), (1.0, 0.0)),
            wall((1.0, 5.0), (0.0, 5.0)),
            wall((5.0, 1.0), (5.0, 2.0)),
        ];
        let ordered = order_walls(&walls);
        assert_eq!(ordered.len(), 3);
        assert_eq!(ordered[0].start, Point2::new(0.0, 0.0));
        assert_eq!(ordered[1].start, Point2::new(5.0, 1.0));
    }

    #[test]
    fn test_parallel_neighbours_get_connector() {
        // A step in the south wall: two parallel runs at different offsets
        let walls = vec![
            wall((0.0, 0.0), (2.0, 0.0)),
            wall((2.0, 0.3), (4.0, 0.3)),
            wall((4.0, 0.3), (4.0, 3.0)),
            wall((4.0, 3.0), (0.0, 3.0)),
            wall((0.0, 3.0), (0.0, 0.0)),
        ];
        let outline = build_outline(&walls);
        assert_eq!(outline.len(), 6);
        assert_relative_eq!(polygon_area(&outline), 12.0 - 2.0 * 0.3, epsilon = 1e-9);
    }

    #[test]
    fn test_too_few_walls() {
        assert!(build_outline(&[]).is_empty());
        assert!(build_outline(&[wall((0.0, 0.0), (1.0, 0.0)), wall((1.0, 0.0), (1.0, 1.0))]).is_empty());
    }
}
