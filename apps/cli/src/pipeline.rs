// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Single-session pipeline: classify, analyze, detect, simplify

use anyhow::Context;
use roomscan_core::{
    CapturedScan, MeshDetail, ScanConfig, ScanMode, SessionSnapshot, StatisticsSummary,
};
use roomscan_floorplan::{simplify_scan, SimplifiedRoom};
use roomscan_processing::{FragmentEvent, ProcessingReport, ProcessingSession};
use serde::Serialize;
use std::path::Path;

/// A scan after one full processing pass
pub struct ProcessedScan {
    pub scan: CapturedScan,
    pub report: ProcessingReport,
}

/// JSON report printed for one session
#[derive(Debug, Serialize)]
pub struct SessionReport {
    pub source: String,
    pub mode: ScanMode,
    /// Mesh density the mode asks of the capture device
    pub mesh_detail: MeshDetail,
    pub fragments: usize,
    pub vertices: usize,
    pub faces: usize,
    pub statistics: StatisticsSummary,
    pub processing: ProcessingReport,
    pub room: SimplifiedRoom,
}

pub fn load_scan(path: &Path) -> anyhow::Result<CapturedScan> {
    let snapshot = SessionSnapshot::load(path)
        .with_context(|| format!("loading session {}", path.display()))?;
    snapshot
        .into_scan()
        .with_context(|| format!("rebuilding session {}", path.display()))
}

/// Replay a captured scan through a processing session.
///
/// Capture times and classified objects carry over from the input.
pub fn process_scan(scan: CapturedScan, config: &ScanConfig) -> anyhow::Result<ProcessedScan> {
    let CapturedScan {
        fragments,
        classified_objects,
        window_planes,
        start_time,
        end_time,
        ..
    } = scan;

    let mut session = ProcessingSession::new(config.clone());
    for plane in window_planes {
        session.add_window_plane(plane);
    }
    for fragment in fragments {
        let id = fragment.identifier;
        session
            .apply(FragmentEvent::Added(fragment))
            .with_context(|| format!("adding fragment {id}"))?;
    }

    let report = session.process();
    let mut scan = session.into_scan();
    scan.classified_objects = classified_objects;
    scan.start_time = start_time;
    scan.end_time = end_time.or(scan.end_time);
    Ok(ProcessedScan { scan, report })
}

pub fn run_report(path: &Path, config: &ScanConfig) -> anyhow::Result<(SessionReport, CapturedScan)> {
    let scan = load_scan(path)?;
    tracing::info!(source = %path.display(), fragments = scan.fragment_count(), "Processing session");

    let ProcessedScan { scan, report } = process_scan(scan, config)?;
    let room = simplify_scan(&scan, &config.simplify);

    let session_report = SessionReport {
        source: path.display().to_string(),
        mode: config.mode,
        mesh_detail: config.mode.profile().mesh_detail,
        fragments: scan.fragment_count(),
        vertices: scan.vertex_count(),
        faces: scan.face_count(),
        statistics: scan.statistics.summary(),
        processing: report,
        room,
    };
    Ok((session_report, scan))
}
