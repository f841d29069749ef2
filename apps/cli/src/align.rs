// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `roomscan align`: process several sessions and stitch them by door labels

use crate::pipeline::{load_scan, process_scan, ProcessedScan};
use anyhow::{bail, Context};
use rayon::prelude::*;
use roomscan_alignment::{AlignmentReport, MultiRoomAligner, WallSide};
use roomscan_core::{CapturedScan, ScanConfig};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// One entry of the labels file.
///
/// `room` is the session file stem, `door` the index into that room's
/// detected doors.
#[derive(Debug, Clone, Deserialize)]
pub struct DoorLabel {
    pub room: String,
    pub door: usize,
    pub label: String,
    #[serde(default)]
    pub side: WallSide,
}

pub fn load_labels(path: &Path) -> anyhow::Result<Vec<DoorLabel>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading labels {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("parsing labels {}", path.display()))
}

/// Room name used in label files
pub fn room_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Process every session in parallel, then align them in argument order.
/// The first session is the anchor.
pub fn run_align(
    sessions: &[PathBuf],
    labels: &[DoorLabel],
    config: &ScanConfig,
) -> anyhow::Result<(AlignmentReport, CapturedScan)> {
    let processed = sessions
        .par_iter()
        .map(|path| -> anyhow::Result<(String, ProcessedScan)> {
            let scan = load_scan(path)?;
            Ok((room_name(path), process_scan(scan, config)?))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let mut aligner = MultiRoomAligner::new(config.alignment.clone());
    let mut ids = BTreeMap::new();
    for (name, ProcessedScan { scan, .. }) in processed {
        let statistics = scan.statistics.clone();
        tracing::info!(room = %name, doors = statistics.doors.len(), "Room processed");
        let id = aligner.add_room(name.clone(), scan, statistics);
        if ids.insert(name.clone(), id).is_some() {
            bail!("two sessions share the room name {name:?}");
        }
    }

    for entry in labels {
        let room = *ids
            .get(&entry.room)
            .with_context(|| format!("label {:?} names unknown room {:?}", entry.label, entry.room))?;
        aligner
            .label_door(room, entry.door, entry.label.clone(), entry.side)
            .with_context(|| format!("applying label {:?} to room {:?}", entry.label, entry.room))?;
    }

    let report = aligner.align_rooms()?.clone();
    let combined = aligner.create_combined_scan()?;
    Ok((report, combined))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::tests::box_room;
    use roomscan_core::SessionSnapshot;
    use uuid::Uuid;

    #[test]
    fn test_labels_file_format() {
        let labels: Vec<DoorLabel> = serde_json::from_str(
            r#"[
                {"room": "hall", "door": 0, "label": "A"},
                {"room": "kitchen", "door": 1, "label": "A", "side": "back"}
            ]"#,
        )
        .unwrap();
        assert_eq!(labels[0].side, WallSide::Front);
        assert_eq!(labels[1].side, WallSide::Back);
        assert_eq!(labels[1].door, 1);
    }

    #[test]
    fn test_room_name_is_file_stem() {
        assert_eq!(room_name(Path::new("/scans/kitchen.json")), "kitchen");
    }

    #[test]
    fn test_unlabeled_rooms_leave_anchor_only() {
        let dir = std::env::temp_dir().join(format!("roomscan-align-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let paths: Vec<PathBuf> = ["hall", "kitchen"]
            .iter()
            .map(|name| {
                let path = dir.join(format!("{name}.json"));
                SessionSnapshot::from_scan(&box_room()).save(&path).unwrap();
                path
            })
            .collect();

        let (report, combined) = run_align(&paths, &[], &ScanConfig::default()).unwrap();
        let unknown = run_align(
            &paths,
            &[DoorLabel {
                room: "garage".into(),
                door: 0,
                label: "A".into(),
                side: WallSide::Front,
            }],
            &ScanConfig::default(),
        );
        std::fs::remove_dir_all(&dir).ok();

        assert!(!report.is_aligned);
        assert_eq!(report.resolved_rooms.len(), 1);
        assert_eq!(report.unresolved_rooms.len(), 1);
        assert_eq!(combined.fragment_count(), 6);
        assert!(unknown.unwrap_err().to_string().contains("garage"));
    }
}
