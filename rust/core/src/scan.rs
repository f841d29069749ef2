// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Top-level capture container

use crate::fragment::{merge_fragments, MeshFragment, SurfaceType};
use crate::statistics::ScanStatistics;
use chrono::{DateTime, Duration, Utc};
use nalgebra::{Matrix4, Point3, Vector3};
use roomscan_geometry::{transform_normal, Aabb, Mesh};
use serde::{Deserialize, Serialize};

/// Glass plane reported by the capture collaborator.
///
/// Geometry seen through the glass (outside the room) is filtered against
/// these before classification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WindowPlane {
    pub center: Point3<f64>,
    /// Unit normal pointing into the room
    pub normal: Vector3<f64>,
    pub width: f64,
    pub height: f64,
}

impl WindowPlane {
    pub fn transformed(&self, m: &Matrix4<f64>) -> Self {
        Self {
            center: m.transform_point(&self.center),
            normal: transform_normal(m, &self.normal),
            ..self.clone()
        }
    }
}

/// Object label supplied by an external recognizer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassifiedObject {
    pub label: String,
    pub bounds: Aabb,
    pub confidence: f32,
}

/// All fragments of one capture plus derived data.
///
/// Fragments are owned exclusively; statistics and object lists can be
/// recomputed from them.
#[derive(Debug, Clone)]
pub struct CapturedScan {
    pub fragments: Vec<MeshFragment>,
    pub classified_objects: Vec<ClassifiedObject>,
    pub window_planes: Vec<WindowPlane>,
    pub statistics: ScanStatistics,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
}

impl CapturedScan {
    /// Empty scan starting now
    pub fn new() -> Self {
        Self::with_fragments(Vec::new())
    }

    pub fn with_fragments(fragments: Vec<MeshFragment>) -> Self {
        Self {
            fragments,
            classified_objects: Vec::new(),
            window_planes: Vec::new(),
            statistics: ScanStatistics::default(),
            start_time: Utc::now(),
            end_time: None,
        }
    }

    pub fn finish(&mut self) {
        self.end_time = Some(Utc::now());
    }

    /// Capture length, `None` while still capturing
    pub fn duration(&self) -> Option<Duration> {
        self.end_time.map(|end| end - self.start_time)
    }

    pub fn fragment_count(&self) -> usize {
        self.fragments.len()
    }

    pub fn vertex_count(&self) -> usize {
        self.fragments.iter().map(|f| f.vertex_count()).sum()
    }

    pub fn face_count(&self) -> usize {
        self.fragments.iter().map(|f| f.face_count()).sum()
    }

    /// Fragments carrying the given classification
    pub fn fragments_of_type(
        &self,
        surface_type: SurfaceType,
    ) -> impl Iterator<Item = &MeshFragment> {
        self.fragments
            .iter()
            .filter(move |f| f.surface_type == Some(surface_type))
    }

    /// All fragments merged into one world-space index space, in
    /// identifier order
    pub fn merged_mesh(&self) -> Mesh {
        merge_fragments(&self.fragments)
    }

    pub fn world_bounds(&self) -> Aabb {
        self.fragments
            .iter()
            .fold(Aabb::empty(), |acc, f| acc.union(&f.world_bounds()))
    }

    /// Copy of the scan placed by a rigid transform: fragment transforms are
    /// pre-multiplied, derived data is moved along.
    pub fn transformed(&self, m: &Matrix4<f64>) -> Self {
        let fragments = self
            .fragments
            .iter()
            .map(|f| MeshFragment {
                transform: m * f.transform,
                ..f.clone()
            })
            .collect();
        Self {
            fragments,
            classified_objects: self
                .classified_objects
                .iter()
                .map(|o| ClassifiedObject {
                    bounds: o.bounds.transformed(m),
                    ..o.clone()
                })
                .collect(),
            window_planes: self.window_planes.iter().map(|w| w.transformed(m)).collect(),
            statistics: self.statistics.transformed(m),
            start_time: self.start_time,
            end_time: self.end_time,
        }
    }
}

impl Default for CapturedScan {
    fn default() -> Self {
        Self::new()
    }
}
