// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Scan modes and their static profile table

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What the user is capturing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanMode {
    #[default]
    Room,
    Furniture,
    Detailed,
}

/// Requested mesh density from the capture collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeshDetail {
    Low,
    Medium,
    High,
}

/// Per-mode settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScanModeProfile {
    pub mode: ScanMode,
    pub display_name: &'static str,
    pub description: &'static str,
    /// Classify each face instead of each fragment
    pub per_face_classification: bool,
    /// Smallest feature worth reporting, meters
    pub min_feature_size: f64,
    pub mesh_detail: MeshDetail,
}

/// Profiles indexed in `ScanMode` declaration order
pub const SCAN_MODE_PROFILES: [ScanModeProfile; 3] = [
    ScanModeProfile {
        mode: ScanMode::Room,
        display_name: "Room",
        description: "Walls, floor and ceiling of a whole room",
        per_face_classification: false,
        min_feature_size: 0.3,
        mesh_detail: MeshDetail::Medium,
    },
    ScanModeProfile {
        mode: ScanMode::Furniture,
        display_name: "Furniture",
        description: "Single objects at close range",
        per_face_classification: false,
        min_feature_size: 0.05,
        mesh_detail: MeshDetail::High,
    },
    ScanModeProfile {
        mode: ScanMode::Detailed,
        display_name: "Detailed",
        description: "Room capture with per-face classification",
        per_face_classification: true,
        min_feature_size: 0.1,
        mesh_detail: MeshDetail::High,
    },
];

impl ScanMode {
    pub const ALL: [ScanMode; 3] = [ScanMode::Room, ScanMode::Furniture, ScanMode::Detailed];

    #[inline]
    pub fn profile(self) -> &'static ScanModeProfile {
        &SCAN_MODE_PROFILES[self as usize]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ScanMode::Room => "room",
            ScanMode::Furniture => "furniture",
            ScanMode::Detailed => "detailed",
        }
    }
}

impl fmt::Display for ScanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.profile().display_name)
    }
}

impl FromStr for ScanMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ScanMode::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown scan mode '{}'", s))
    }
}
