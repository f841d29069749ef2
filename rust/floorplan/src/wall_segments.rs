// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wall segment extraction and merging

use crate::types::{to_plan, WallSegment};
use nalgebra::Vector2;
use roomscan_core::{MeshFragment, SurfaceType};
use roomscan_geometry::{fit_plane, Point3};
use std::f64::consts::PI;

/// Fitted planes whose normal strays further than this (cosine) from the
/// average face normal are ignored
const FIT_AGREEMENT_COS: f64 = 0.9;

/// Project each wall-classified fragment onto the plan as one segment.
///
/// The segment lies on the fragment's mean offset along its horizontal
/// normal and spans the extent of its vertices. Fragments are visited in
/// identifier order; ones without a usable horizontal normal are skipped.
pub fn extract_wall_segments(fragments: &[MeshFragment]) -> Vec<WallSegment> {
    let mut walls: Vec<&MeshFragment> = fragments
        .iter()
        .filter(|f| f.surface_type == Some(SurfaceType::Wall))
        .collect();
    walls.sort_by_key(|f| f.identifier);

    walls
        .into_iter()
        .filter_map(|fragment| {
            let points = fragment.world_vertices();
            if points.is_empty() {
                return None;
            }
            let Some(normal) = wall_normal(fragment, &points) else {
                tracing::debug!(fragment = %fragment.identifier, "Wall fragment has no horizontal normal");
                return None;
            };
            let direction = Vector2::new(normal.y, -normal.x);

            let mut offset = 0.0;
            let mut t_min = f64::MAX;
            let mut t_max = f64::MIN;
            for p in &points {
                let q = to_plan(p).coords;
                offset += normal.dot(&q);
                let t = direction.dot(&q);
                t_min = t_min.min(t);
                t_max = t_max.max(t);
            }
            offset /= points.len() as f64;

            Some(WallSegment::from_offset(normal, offset, t_min, t_max, fragment.area()))
        })
        .collect()
}

/// Horizontal plan normal of a wall fragment.
///
/// A least-squares plane through the vertices refines the average face
/// normal, which tilts on unevenly tessellated captures. The fit is flipped
/// to face the same way and used only when it agrees with the average.
fn wall_normal(fragment: &MeshFragment, points: &[Point3<f64>]) -> Option<Vector2<f64>> {
    let average = fragment.average_world_normal()?;
    let normal = match fit_plane(points) {
        Some(fit) => {
            let n = fit.plane.normal;
            let n = if n.dot(&average) < 0.0 { -n } else { n };
            if n.dot(&average) >= FIT_AGREEMENT_COS * average.norm() {
                n
            } else {
                average
            }
        }
        None => average,
    };
    Vector2::new(normal.x, normal.z).try_normalize(1e-6)
}

/// Merge collinear wall segments.
///
/// Two segments merge when their normals differ by at most
/// `angle_tolerance` radians, the midpoint of one lies within
/// `distance_tolerance` of the other's line, and the gap between them
/// along that line is at most `max_gap`. A piece may bridge to the group
/// through pieces already merged into it. Walls facing opposite ways never
/// merge. The result keeps the first segment's order of appearance.
pub fn merge_collinear_walls(
    walls: &[WallSegment],
    angle_tolerance: f64,
    distance_tolerance: f64,
    max_gap: f64,
) -> Vec<WallSegment> {
    let mut merged = Vec::new();
    let mut used = vec![false; walls.len()];

    for (i, wall) in walls.iter().enumerate() {
        if used[i] {
            continue;
        }
        used[i] = true;

        let direction = wall.direction();
        let (mut lo, mut hi) = extent_along(wall, &direction);
        let mut group = vec![wall];
        loop {
            let mut grew = false;
            for (j, other) in walls.iter().enumerate().skip(i + 1) {
                if used[j] || !are_collinear(wall, other, angle_tolerance, distance_tolerance) {
                    continue;
                }
                let (t0, t1) = extent_along(other, &direction);
                if t0 - hi > max_gap || lo - t1 > max_gap {
                    continue;
                }
                lo = lo.min(t0);
                hi = hi.max(t1);
                group.push(other);
                used[j] = true;
                grew = true;
            }
            if !grew {
                break;
            }
        }

        merged.push(merge_wall_group(&group));
    }

    merged
}

fn are_collinear(a: &WallSegment, b: &WallSegment, angle_tolerance: f64, distance_tolerance: f64) -> bool {
    let angle = a.normal.dot(&b.normal).clamp(-1.0, 1.0).acos();
    if angle > angle_tolerance {
        return false;
    }
    (a.normal.dot(&b.midpoint().coords) - a.offset()).abs() <= distance_tolerance
}

fn extent_along(wall: &WallSegment, direction: &Vector2<f64>) -> (f64, f64) {
    let a = direction.dot(&wall.start.coords);
    let b = direction.dot(&wall.end.coords);
    (a.min(b), a.max(b))
}

/// Support-weighted normal and offset; union of the extents
fn merge_wall_group(group: &[&WallSegment]) -> WallSegment {
    if let [single] = group {
        return (*single).clone();
    }

    let total_support: f64 = group.iter().map(|w| w.support).sum();
    let weight = |w: &WallSegment| {
        if total_support > 0.0 {
            w.support / total_support
        } else {
            1.0 / group.len() as f64
        }
    };

    let summed: Vector2<f64> = group.iter().map(|w| w.normal * weight(*w)).sum();
    let normal = summed.try_normalize(1e-9).unwrap_or(group[0].normal);
    let direction = Vector2::new(normal.y, -normal.x);

    let mut offset = 0.0;
    let mut t_min = f64::MAX;
    let mut t_max = f64::MIN;
    for w in group {
        offset += weight(*w) * normal.dot(&w.midpoint().coords);
        for p in [w.start, w.end] {
            let t = direction.dot(&p.coords);
            t_min = t_min.min(t);
            t_max = t_max.max(t);
        }
    }

    WallSegment::from_offset(normal, offset, t_min, t_max, total_support)
}

/// Dominant wall orientation in `(-π/4, π/4]`.
///
/// Directions are averaged modulo 90° (angles are multiplied by four), so
/// perpendicular walls reinforce each other. Longer walls weigh more.
pub fn dominant_orientation(walls: &[WallSegment]) -> f64 {
    let (mut c, mut s) = (0.0, 0.0);
    for wall in walls {
        let weight = wall.length();
        let a = 4.0 * wall.angle();
        c += weight * a.cos();
        s += weight * a.sin();
    }
    if c.abs() < 1e-12 && s.abs() < 1e-12 {
        return 0.0;
    }
    s.atan2(c) / 4.0
}

/// Signed deviation of `angle` from the nearest multiple of 90° relative to
/// `reference`, in `[-π/4, π/4]`
pub fn right_angle_deviation(angle: f64, reference: f64) -> f64 {
    let quarter = PI / 2.0;
    let relative = angle - reference;
    relative - (relative / quarter).round() * quarter
}

/// Drop walls shorter than `min_length`
pub fn filter_short_walls(walls: &[WallSegment], min_length: f64) -> Vec<WallSegment> {
    walls
        .iter()
        .filter(|w| w.length() >= min_length)
        .cloned()
        .collect()
}
