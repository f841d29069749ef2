// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Persisted session format
//!
//! Flat per-fragment buffers, a column-major transform and a reduced
//! statistics record. Detection geometry is not persisted.

use crate::error::{Error, Result};
use crate::fragment::{MeshFragment, SurfaceType};
use crate::scan::{CapturedScan, ClassifiedObject, WindowPlane};
use crate::statistics::StatisticsSummary;
use chrono::{DateTime, Utc};
use roomscan_geometry::{from_column_major, to_column_major, Mesh};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use uuid::Uuid;

/// Current on-disk format version
pub const FORMAT_VERSION: u32 = 1;

/// One fragment as stored on disk
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FragmentRecord {
    pub id: Uuid,
    /// Flattened xyz triples
    pub vertices: Vec<f32>,
    pub normals: Vec<f32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub colors: Vec<f32>,
    /// Flattened triangle index triples
    pub indices: Vec<u32>,
    /// Local-to-world transform, column-major
    pub transform: [f64; 16],
    #[serde(default)]
    pub surface_type: Option<SurfaceType>,
}

impl FragmentRecord {
    pub fn from_fragment(fragment: &MeshFragment) -> Self {
        Self {
            id: fragment.identifier,
            vertices: fragment.mesh.positions.clone(),
            normals: fragment.mesh.normals.clone(),
            colors: fragment.colors.clone(),
            indices: fragment.mesh.indices.clone(),
            transform: to_column_major(&fragment.transform),
            surface_type: fragment.surface_type,
        }
    }

    /// Rebuild the fragment, validating its buffers
    pub fn into_fragment(self) -> Result<MeshFragment> {
        let mesh = Mesh {
            positions: self.vertices,
            normals: self.normals,
            indices: self.indices,
        };
        let mut fragment =
            MeshFragment::new(self.id, mesh, self.colors, from_column_major(&self.transform))?;
        fragment.surface_type = self.surface_type;
        Ok(fragment)
    }
}

/// A capture session as stored on disk
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionSnapshot {
    pub format_version: u32,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    pub fragments: Vec<FragmentRecord>,
    #[serde(default)]
    pub window_planes: Vec<WindowPlane>,
    #[serde(default)]
    pub classified_objects: Vec<ClassifiedObject>,
    pub statistics: StatisticsSummary,
}

impl SessionSnapshot {
    pub fn from_scan(scan: &CapturedScan) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            start_time: scan.start_time,
            end_time: scan.end_time,
            fragments: scan.fragments.iter().map(FragmentRecord::from_fragment).collect(),
            window_planes: scan.window_planes.clone(),
            classified_objects: scan.classified_objects.clone(),
            statistics: scan.statistics.summary(),
        }
    }

    /// Rebuild the scan. Detection lists come back empty; counts survive
    /// only in the summary.
    pub fn into_scan(self) -> Result<CapturedScan> {
        if self.format_version > FORMAT_VERSION {
            return Err(Error::InvalidSession(format!(
                "format version {} is newer than supported version {}",
                self.format_version, FORMAT_VERSION
            )));
        }

        let mut seen = BTreeSet::new();
        for record in &self.fragments {
            if !seen.insert(record.id) {
                return Err(Error::InvalidSession(format!(
                    "duplicate fragment id {}",
                    record.id
                )));
            }
        }

        let fragments = self
            .fragments
            .into_iter()
            .map(FragmentRecord::into_fragment)
            .collect::<Result<Vec<_>>>()?;

        Ok(CapturedScan {
            fragments,
            classified_objects: self.classified_objects,
            window_planes: self.window_planes,
            statistics: self.statistics.to_statistics(),
            start_time: self.start_time,
            end_time: self.end_time,
        })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_json_pretty()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::{DetectedOpening, OpeningKind};
    use nalgebra::{Point3, Vector3};
    use roomscan_geometry::rigid_from_yaw_translation;

    fn sample_scan() -> CapturedScan {
        let positions = vec![0.0, 0.0, 0.0, 3.0, 0.0, 0.0, 3.0, 0.0, 4.0, 0.0, 0.0, 4.0];
        let indices = vec![0, 2, 1, 0, 3, 2];
        let t = rigid_from_yaw_translation(0.3, &Vector3::new(1.25, -1.4, 0.5));
        let mut fragment =
            MeshFragment::from_geometry(Uuid::from_u128(7), positions, indices, t).unwrap();
        fragment.surface_type = Some(SurfaceType::Floor);

        let mut scan = CapturedScan::with_fragments(vec![fragment]);
        scan.statistics.floor_area = 12.0;
        scan.statistics.floor_height = Some(-1.4);
        scan.statistics.doors.push(DetectedOpening {
            kind: OpeningKind::Door,
            center: Point3::new(0.0, 1.0, 0.0),
            normal: Vector3::z(),
            width: 0.9,
            height: 2.0,
            sill_height: 0.0,
            wall_fragment: None,
        });
        scan
    }

    #[test]
    fn test_json_round_trip_is_exact() {
        let scan = sample_scan();
        let snapshot = SessionSnapshot::from_scan(&scan);
        let json = snapshot.to_json().unwrap();
        let restored = SessionSnapshot::from_json(&json).unwrap().into_scan().unwrap();

        assert_eq!(restored.fragments, scan.fragments);
        assert_eq!(restored.statistics.floor_height, Some(-1.4));
        assert_eq!(restored.statistics.floor_area, 12.0);
        assert!(restored.statistics.doors.is_empty());
        assert_eq!(snapshot.statistics.door_count, 1);
    }

    #[test]
    fn test_colors_omitted_when_absent() {
        let json = SessionSnapshot::from_scan(&sample_scan()).to_json().unwrap();
        assert!(!json.contains("\"colors\""));
        assert!(json.contains("\"surface_type\":\"floor\""));
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let mut snapshot = SessionSnapshot::from_scan(&sample_scan());
        snapshot.fragments.push(snapshot.fragments[0].clone());
        assert!(matches!(snapshot.into_scan(), Err(Error::InvalidSession(_))));
    }

    #[test]
    fn test_rejects_bad_indices() {
        let mut snapshot = SessionSnapshot::from_scan(&sample_scan());
        snapshot.fragments[0].indices.push(99);
        snapshot.fragments[0].indices.extend([0, 1]);
        assert!(matches!(snapshot.into_scan(), Err(Error::InvalidFragment { .. })));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(SessionSnapshot::from_json("{\"fragments\":"), Err(Error::Json(_))));
    }
}
