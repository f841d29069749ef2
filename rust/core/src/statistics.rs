// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Aggregate statistics over a capture session

use crate::detection::{DetectedEdge, DetectedOpening, DetectedProtrusion};
use crate::fragment::SurfaceType;
use nalgebra::Matrix4;
use roomscan_geometry::translation;
use serde::{Deserialize, Serialize};

/// Area totals, plane heights and detected features for one capture.
///
/// Areas are only ever built up from a full fragment set: each
/// classification pass starts from fresh statistics and adds every
/// fragment, so repeated passes never double-count.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ScanStatistics {
    pub floor_area: f64,
    pub ceiling_area: f64,
    pub wall_area: f64,
    pub object_area: f64,
    pub protrusion_area: f64,
    /// World-Y of the floor plane once observed
    pub floor_height: Option<f64>,
    /// World-Y of the ceiling plane once observed
    pub ceiling_height: Option<f64>,
    pub protrusions: Vec<DetectedProtrusion>,
    pub edges: Vec<DetectedEdge>,
    pub doors: Vec<DetectedOpening>,
    pub windows: Vec<DetectedOpening>,
}

impl ScanStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add area to the bucket of a surface type.
    ///
    /// `Edge` has no bucket: edge fragments are accounted per face by
    /// their underlying face types.
    pub fn add_area(&mut self, surface_type: SurfaceType, area: f64) {
        let area = area.max(0.0);
        match surface_type {
            SurfaceType::Floor => self.floor_area += area,
            SurfaceType::Ceiling => self.ceiling_area += area,
            SurfaceType::Wall => self.wall_area += area,
            SurfaceType::Object => self.object_area += area,
            SurfaceType::Protrusion => self.protrusion_area += area,
            SurfaceType::Edge => {}
        }
    }

    pub fn total_area(&self) -> f64 {
        self.floor_area + self.ceiling_area + self.wall_area + self.object_area + self.protrusion_area
    }

    /// Floor-to-ceiling distance when both planes are known
    pub fn room_height(&self) -> Option<f64> {
        match (self.floor_height, self.ceiling_height) {
            (Some(f), Some(c)) if c > f => Some(c - f),
            _ => None,
        }
    }

    /// Fold another room's statistics into this one (areas add, heights
    /// take the outermost planes, detections concatenate)
    pub fn absorb(&mut self, other: &ScanStatistics) {
        self.floor_area += other.floor_area;
        self.ceiling_area += other.ceiling_area;
        self.wall_area += other.wall_area;
        self.object_area += other.object_area;
        self.protrusion_area += other.protrusion_area;
        self.floor_height = min_option(self.floor_height, other.floor_height);
        self.ceiling_height = max_option(self.ceiling_height, other.ceiling_height);
        self.protrusions.extend(other.protrusions.iter().cloned());
        self.edges.extend(other.edges.iter().cloned());
        self.doors.extend(other.doors.iter().cloned());
        self.windows.extend(other.windows.iter().cloned());
    }

    /// Statistics expressed in another frame; only the vertical offset of a
    /// gravity-aligned transform moves the plane heights
    pub fn transformed(&self, m: &Matrix4<f64>) -> Self {
        let dy = translation(m).y;
        Self {
            floor_height: self.floor_height.map(|h| h + dy),
            ceiling_height: self.ceiling_height.map(|h| h + dy),
            protrusions: self.protrusions.iter().map(|p| p.transformed(m)).collect(),
            edges: self.edges.iter().map(|e| e.transformed(m)).collect(),
            doors: self.doors.iter().map(|d| d.transformed(m)).collect(),
            windows: self.windows.iter().map(|w| w.transformed(m)).collect(),
            ..self.clone()
        }
    }

    /// Reduced record kept in persisted sessions
    pub fn summary(&self) -> StatisticsSummary {
        StatisticsSummary {
            floor_area: self.floor_area,
            ceiling_area: self.ceiling_area,
            wall_area: self.wall_area,
            object_area: self.object_area,
            protrusion_area: self.protrusion_area,
            floor_height: self.floor_height,
            ceiling_height: self.ceiling_height,
            protrusion_count: self.protrusions.len(),
            edge_count: self.edges.len(),
            door_count: self.doors.len(),
            window_count: self.windows.len(),
        }
    }
}

/// Persisted statistics: totals and counts only.
///
/// Detection geometry is not kept; re-run detection after reload when
/// precise boundaries are needed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StatisticsSummary {
    pub floor_area: f64,
    pub ceiling_area: f64,
    pub wall_area: f64,
    pub object_area: f64,
    pub protrusion_area: f64,
    pub floor_height: Option<f64>,
    pub ceiling_height: Option<f64>,
    pub protrusion_count: usize,
    pub edge_count: usize,
    pub door_count: usize,
    pub window_count: usize,
}

impl StatisticsSummary {
    /// Statistics with the persisted totals and empty detection lists
    pub fn to_statistics(&self) -> ScanStatistics {
        ScanStatistics {
            floor_area: self.floor_area,
            ceiling_area: self.ceiling_area,
            wall_area: self.wall_area,
            object_area: self.object_area,
            protrusion_area: self.protrusion_area,
            floor_height: self.floor_height,
            ceiling_height: self.ceiling_height,
            ..ScanStatistics::default()
        }
    }
}

fn min_option(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.min(y)),
        (x, None) => x,
        (None, y) => y,
    }
}

fn max_option(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.max(y)),
        (x, None) => x,
        (None, y) => y,
    }
}
