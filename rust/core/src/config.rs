// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Configuration records passed explicitly into each processing stage.
//!
//! Every record deserializes from partial JSON; missing fields take their
//! defaults.

use crate::mode::ScanMode;
use serde::{Deserialize, Serialize};

/// Surface classifier thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Max angle between a normal and vertical for floor/ceiling
    pub floor_ceiling_angle_deg: f64,
    /// Min angle between a normal and vertical for walls
    pub wall_angle_deg: f64,
    /// Protrusion band below the ceiling, meters
    pub protrusion_min_depth: f64,
    pub protrusion_max_depth: f64,
    /// How far from the floor/ceiling estimate a horizontal surface may sit
    pub height_tolerance: f64,
    /// Classify faces individually
    pub per_face: bool,
    /// Dominant face share below which a mixed fragment becomes an edge
    pub edge_dominance_ratio: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            floor_ceiling_angle_deg: 20.0,
            wall_angle_deg: 72.0,
            protrusion_min_depth: 0.05,
            protrusion_max_depth: 0.6,
            height_tolerance: 0.15,
            per_face: false,
            edge_dominance_ratio: 0.6,
        }
    }
}

impl ClassifierConfig {
    /// Defaults adjusted to a scan mode
    pub fn for_mode(mode: ScanMode) -> Self {
        Self {
            per_face: mode.profile().per_face_classification,
            ..Self::default()
        }
    }

    /// `|cos|` at or above which a normal counts as vertical
    #[inline]
    pub fn horizontal_cos(&self) -> f64 {
        self.floor_ceiling_angle_deg.to_radians().cos()
    }

    /// `|cos|` at or below which a normal counts as horizontal
    #[inline]
    pub fn wall_cos(&self) -> f64 {
        self.wall_angle_deg.to_radians().cos()
    }
}

/// Door/window/edge detection thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Max gap between an opening's bottom and the floor for a door
    pub opening_floor_tolerance: f64,
    pub door_min_height: f64,
    pub door_min_width: f64,
    pub door_max_width: f64,
    pub window_min_sill: f64,
    /// Min width and height of a window
    pub window_min_size: f64,
    /// Sharp edges a chain needs to be reported
    pub min_edge_chain: usize,
    /// Distance behind a window plane before geometry is dropped
    pub window_filter_tolerance: f64,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            opening_floor_tolerance: 0.1,
            door_min_height: 1.8,
            door_min_width: 0.6,
            door_max_width: 1.6,
            window_min_sill: 0.3,
            window_min_size: 0.3,
            min_edge_chain: 2,
            window_filter_tolerance: 0.05,
        }
    }
}

impl FeatureConfig {
    /// Defaults with the mode's smallest reportable feature as the minimum
    /// window size
    pub fn for_mode(mode: ScanMode) -> Self {
        Self {
            window_min_size: mode.profile().min_feature_size,
            ..Self::default()
        }
    }
}

/// Room outline simplification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimplifyConfig {
    /// Grid cell for endpoint snapping, meters; 0 disables
    pub grid_resolution: f64,
    pub snap_right_angles: bool,
    /// Max deviation from a multiple of 90 degrees that gets snapped
    pub right_angle_tolerance_deg: f64,
    pub min_wall_length: f64,
    /// Max perpendicular distance between collinear pieces of one wall
    pub merge_distance: f64,
    pub merge_angle_deg: f64,
    /// Max gap along the line between collinear pieces of one wall, meters.
    /// About a doorway; wider gaps are separate walls.
    pub max_merge_gap: f64,
}

impl Default for SimplifyConfig {
    fn default() -> Self {
        Self {
            grid_resolution: 0.05,
            snap_right_angles: true,
            right_angle_tolerance_deg: 10.0,
            min_wall_length: 0.3,
            merge_distance: 0.15,
            merge_angle_deg: 10.0,
            max_merge_gap: 1.2,
        }
    }
}

/// What the aligner does with a label that does not name exactly one door
/// in each of exactly two rooms
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AmbiguousLabelPolicy {
    /// Fail the alignment
    #[default]
    Reject,
    /// Ignore the label and report it
    Skip,
}

/// Multi-room alignment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignmentConfig {
    /// Wall thickness assumed at every door, meters
    pub wall_thickness: f64,
    pub ambiguous_label_policy: AmbiguousLabelPolicy,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            wall_thickness: 0.15,
            ambiguous_label_policy: AmbiguousLabelPolicy::Reject,
        }
    }
}

/// Everything a full pipeline run needs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub mode: ScanMode,
    pub classifier: ClassifierConfig,
    pub features: FeatureConfig,
    pub simplify: SimplifyConfig,
    pub alignment: AlignmentConfig,
}

impl ScanConfig {
    pub fn for_mode(mode: ScanMode) -> Self {
        Self {
            mode,
            classifier: ClassifierConfig::for_mode(mode),
            features: FeatureConfig::for_mode(mode),
            ..Self::default()
        }
    }

    /// Classifier settings with the mode's per-face flag applied
    pub fn effective_classifier(&self) -> ClassifierConfig {
        ClassifierConfig {
            per_face: self.classifier.per_face || self.mode.profile().per_face_classification,
            ..self.classifier.clone()
        }
    }
}
