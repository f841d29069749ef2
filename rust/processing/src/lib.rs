// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # RoomScan Processing
//!
//! Turns raw capture fragments into a classified room: surface
//! classification by normal and height, shape analysis of the merged mesh,
//! and detection of doors, windows, protrusions and edge runs.
//!
//! ## Pipeline
//!
//! 1. [`filter_through_windows`] drops geometry seen through glass
//! 2. [`classify`] labels each fragment and accumulates [`ScanStatistics`]
//!    areas
//! 3. [`analyze_shape`] measures curvature, symmetry and edge topology
//! 4. [`detect_features`] fills the detection lists
//!
//! [`ProcessingSession`] runs these steps over a live, mutable fragment set;
//! [`SessionProcessor`] drives one from a tokio task.
//!
//! [`ScanStatistics`]: roomscan_core::ScanStatistics

pub mod classifier;
pub mod error;
pub mod features;
pub mod session;
pub mod shape;
pub mod window_filter;

#[cfg(test)]
mod test_util;

pub use classifier::{
    classify, classify_scan, classify_surface, classify_with_heights, ClassificationReport,
    HeightEstimate,
};
pub use error::{Error, Result};
pub use features::{
    analyze_scan, boundary_loops, detect_edges, detect_features, detect_features_with,
    detect_openings, detect_protrusions, DetectedFeatures,
};
pub use session::{FragmentEvent, ProcessingReport, ProcessingSession, SessionProcessor};
pub use shape::{analyze_shape, ShapeAnalysis};
pub use window_filter::filter_through_windows;
