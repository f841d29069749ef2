// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Dense classified mesh to simplified room

use crate::outline::build_outline;
use crate::types::{from_plan, SimplifiedRoom, WallSegment};
use crate::wall_segments::{
    dominant_orientation, extract_wall_segments, filter_short_walls, merge_collinear_walls,
    right_angle_deviation,
};
use nalgebra::{Point2, Rotation2, Vector2};
use roomscan_core::{CapturedScan, MeshFragment, ScanStatistics, SimplifyConfig, SurfaceType};
use roomscan_geometry::{polygon_area, polygon_perimeter, Aabb};

/// Rotate walls within `tolerance` of a right angle to the dominant frame.
///
/// Each snapped wall turns about its midpoint and keeps its length.
pub fn snap_right_angles(walls: &[WallSegment], dominant: f64, tolerance: f64) -> Vec<WallSegment> {
    walls
        .iter()
        .map(|wall| {
            let deviation = right_angle_deviation(wall.angle(), dominant);
            if deviation == 0.0 || deviation.abs() > tolerance {
                return wall.clone();
            }
            let rotation = Rotation2::new(-deviation);
            let normal = rotation * wall.normal;
            let half = Vector2::new(normal.y, -normal.x) * (wall.length() * 0.5);
            let mid = wall.midpoint();
            WallSegment {
                start: mid - half,
                end: mid + half,
                normal,
                support: wall.support,
            }
        })
        .collect()
}

/// Snap wall endpoints to a grid aligned with the dominant orientation.
///
/// Normals are recomputed from the snapped endpoints; collapsed walls keep
/// their normal and are left for length pruning.
pub fn snap_to_grid(walls: &[WallSegment], dominant: f64, resolution: f64) -> Vec<WallSegment> {
    if resolution <= 0.0 {
        return walls.to_vec();
    }
    let to_grid = Rotation2::new(-dominant);
    let from_grid = Rotation2::new(dominant);
    let snap = |p: &Point2<f64>| {
        let q = to_grid * *p;
        from_grid
            * Point2::new(
                (q.x / resolution).round() * resolution,
                (q.y / resolution).round() * resolution,
            )
    };

    walls
        .iter()
        .map(|wall| {
            let start = snap(&wall.start);
            let end = snap(&wall.end);
            let normal = (end - start)
                .try_normalize(1e-12)
                .map(|d| Vector2::new(-d.y, d.x))
                .unwrap_or(wall.normal);
            WallSegment {
                start,
                end,
                normal,
                support: wall.support,
            }
        })
        .collect()
}

/// Simplified wall set for classified fragments
pub fn simplify_walls(fragments: &[MeshFragment], config: &SimplifyConfig) -> Vec<WallSegment> {
    let merge = |walls: &[WallSegment]| {
        merge_collinear_walls(
            walls,
            config.merge_angle_deg.to_radians(),
            config.merge_distance,
            config.max_merge_gap,
        )
    };

    let raw = extract_wall_segments(fragments);
    let mut walls = merge(&raw);
    let dominant = dominant_orientation(&walls);

    if config.snap_right_angles {
        walls = snap_right_angles(&walls, dominant, config.right_angle_tolerance_deg.to_radians());
        walls = merge(&walls);
    }
    walls = snap_to_grid(&walls, dominant, config.grid_resolution);
    let kept = filter_short_walls(&walls, config.min_wall_length);

    tracing::debug!(
        raw = raw.len(),
        merged = walls.len(),
        kept = kept.len(),
        dominant_deg = dominant.to_degrees(),
        "Wall segments simplified"
    );
    kept
}

/// Convert classified fragments into a minimal polygonal room.
///
/// Floor and ceiling heights come from `statistics` when known, otherwise
/// from the vertical extent of the wall fragments. The result depends only
/// on fragment contents and identifiers, never on input order.
pub fn simplify_room(
    fragments: &[MeshFragment],
    statistics: &ScanStatistics,
    config: &SimplifyConfig,
) -> SimplifiedRoom {
    let walls = simplify_walls(fragments, config);
    let outline = build_outline(&walls);

    let wall_bounds = fragments
        .iter()
        .filter(|f| f.surface_type == Some(SurfaceType::Wall))
        .fold(Aabb::empty(), |acc, f| acc.union(&f.world_bounds()));
    let (fallback_floor, fallback_ceiling) = if wall_bounds.is_empty() {
        (0.0, 0.0)
    } else {
        (wall_bounds.min.y, wall_bounds.max.y)
    };
    let floor_height = statistics.floor_height.unwrap_or(fallback_floor);
    let ceiling_height = statistics.ceiling_height.unwrap_or(fallback_ceiling);

    let source_vertex_count = fragments.iter().map(|f| f.vertex_count()).sum();
    let (floor_area, perimeter) = if outline.is_empty() {
        (0.0, 0.0)
    } else {
        (polygon_area(&outline), polygon_perimeter(&outline))
    };

    if outline.is_empty() {
        tracing::warn!(walls = walls.len(), "Walls do not enclose a room outline");
    }

    let room = SimplifiedRoom {
        floor: outline.iter().map(|p| from_plan(p, floor_height)).collect(),
        ceiling: outline.iter().map(|p| from_plan(p, ceiling_height)).collect(),
        walls,
        floor_height,
        ceiling_height,
        floor_area,
        perimeter,
        source_vertex_count,
    };

    tracing::info!(
        walls = room.walls.len(),
        outline_vertices = room.floor.len(),
        source_vertices = source_vertex_count,
        floor_area = room.floor_area,
        "Room simplified"
    );
    room
}

/// [`simplify_room`] over a captured scan
pub fn simplify_scan(scan: &CapturedScan, config: &SimplifyConfig) -> SimplifiedRoom {
    simplify_room(&scan.fragments, &scan.statistics, config)
}
