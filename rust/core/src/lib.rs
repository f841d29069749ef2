// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # RoomScan Core
//!
//! Data model for room captures: mesh fragments reported by depth-sensing
//! hardware, their surface classification, aggregate statistics and
//! detected features, plus the configuration records and persisted session
//! format shared by every processing stage.
//!
//! ## Overview
//!
//! - **Fragments**: [`MeshFragment`] owns local geometry and a rigid
//!   local-to-world transform
//! - **Scans**: [`CapturedScan`] holds a session's fragments, window planes
//!   and [`ScanStatistics`]
//! - **Configuration**: [`ScanConfig`] is passed explicitly into each stage;
//!   there is no global settings object
//! - **Persistence**: [`SessionSnapshot`] stores flattened buffers and a
//!   reduced statistics record
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use roomscan_core::{CapturedScan, SessionSnapshot};
//!
//! let snapshot = SessionSnapshot::load("kitchen.json")?;
//! let scan: CapturedScan = snapshot.into_scan()?;
//! println!("{} fragments, {} faces", scan.fragment_count(), scan.face_count());
//! ```

pub mod config;
pub mod detection;
pub mod error;
pub mod fragment;
pub mod mode;
pub mod scan;
pub mod serialization;
pub mod statistics;

pub use config::{
    AlignmentConfig, AmbiguousLabelPolicy, ClassifierConfig, FeatureConfig, ScanConfig,
    SimplifyConfig,
};
pub use detection::{DetectedEdge, DetectedOpening, DetectedProtrusion, OpeningKind};
pub use error::{Error, Result};
pub use fragment::{merge_fragments, MeshFragment, SurfaceType};
pub use mode::{MeshDetail, ScanMode, ScanModeProfile, SCAN_MODE_PROFILES};
pub use scan::{CapturedScan, ClassifiedObject, WindowPlane};
pub use serialization::{FragmentRecord, SessionSnapshot, FORMAT_VERSION};
pub use statistics::{ScanStatistics, StatisticsSummary};
