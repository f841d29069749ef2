// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Capture session processing
//!
//! [`ProcessingSession`] owns a session's fragments and statistics and is
//! the only writer to them. [`SessionProcessor`] runs one session on a
//! tokio task: fragment events queue on a channel behind any in-flight
//! processing pass, and passes run on the blocking pool.

use crate::classifier::{classify_with_heights, ClassificationReport, HeightEstimate};
use crate::error::{Error, Result};
use crate::features::detect_features;
use crate::shape::ShapeAnalysis;
use crate::window_filter::filter_through_windows;
use chrono::{DateTime, Utc};
use roomscan_core::{CapturedScan, MeshFragment, ScanConfig, ScanStatistics, WindowPlane};
use serde::Serialize;
use std::collections::BTreeMap;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

/// Fragment change reported by the capture hardware
#[derive(Debug, Clone)]
pub enum FragmentEvent {
    /// New fragment; an existing identifier is replaced wholesale
    Added(MeshFragment),
    /// Revised geometry for an existing fragment
    Updated(MeshFragment),
    Removed(Uuid),
}

impl FragmentEvent {
    pub fn identifier(&self) -> Uuid {
        match self {
            FragmentEvent::Added(f) | FragmentEvent::Updated(f) => f.identifier,
            FragmentEvent::Removed(id) => *id,
        }
    }
}

/// Result of one processing pass
#[derive(Debug, Clone, Serialize)]
pub struct ProcessingReport {
    pub classification: ClassificationReport,
    /// Faces dropped as seen through window glass
    pub filtered_faces: usize,
    pub shape: ShapeAnalysis,
}

/// Single-writer owner of a capture session's state
pub struct ProcessingSession {
    config: ScanConfig,
    fragments: BTreeMap<Uuid, MeshFragment>,
    window_planes: Vec<WindowPlane>,
    heights: HeightEstimate,
    /// A fragment that may have set the extrema was replaced or removed
    heights_stale: bool,
    statistics: ScanStatistics,
    start_time: DateTime<Utc>,
}

impl ProcessingSession {
    pub fn new(config: ScanConfig) -> Self {
        Self {
            config,
            fragments: BTreeMap::new(),
            window_planes: Vec::new(),
            heights: HeightEstimate::default(),
            heights_stale: false,
            statistics: ScanStatistics::default(),
            start_time: Utc::now(),
        }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Apply a fragment event. Fragments are validated before they are
    /// stored; removing an unknown id is a no-op.
    pub fn apply(&mut self, event: FragmentEvent) -> Result<()> {
        match event {
            FragmentEvent::Added(fragment) | FragmentEvent::Updated(fragment) => {
                fragment.validate()?;
                tracing::debug!(fragment = %fragment.identifier, faces = fragment.face_count(), "Fragment stored");
                if self.fragments.insert(fragment.identifier, fragment).is_some() {
                    self.heights_stale = true;
                }
            }
            FragmentEvent::Removed(id) => {
                if self.fragments.remove(&id).is_some() {
                    self.heights_stale = true;
                } else {
                    tracing::debug!(fragment = %id, "Removal of unknown fragment ignored");
                }
            }
        }
        Ok(())
    }

    pub fn add_window_plane(&mut self, plane: WindowPlane) {
        self.window_planes.push(plane);
    }

    pub fn fragment(&self, id: &Uuid) -> Option<&MeshFragment> {
        self.fragments.get(id)
    }

    /// Fragments in identifier order
    pub fn fragments(&self) -> impl Iterator<Item = &MeshFragment> {
        self.fragments.values()
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Running floor/ceiling extrema
    pub fn heights(&self) -> &HeightEstimate {
        &self.heights
    }

    pub fn statistics(&self) -> &ScanStatistics {
        &self.statistics
    }

    /// Filter, reclassify every fragment and recompute statistics and
    /// detections.
    ///
    /// Height extrema widen across passes while fragments are only added.
    /// Once a fragment is replaced or removed they are rebuilt from the
    /// fragments still held, so an outlier stops steering classification.
    /// Statistics are rebuilt from scratch each time.
    pub fn process(&mut self) -> ProcessingReport {
        let classifier = self.config.effective_classifier();
        let mut fragments: Vec<MeshFragment> =
            std::mem::take(&mut self.fragments).into_values().collect();

        let filtered_faces = filter_through_windows(
            &mut fragments,
            &self.window_planes,
            self.config.features.window_filter_tolerance,
        );

        let observed = HeightEstimate::from_fragments(&fragments, &classifier);
        self.heights = if std::mem::take(&mut self.heights_stale) {
            tracing::debug!(?observed, "Height extrema rebuilt");
            observed
        } else {
            self.heights.merge(&observed)
        };

        let classification = classify_with_heights(&mut fragments, &self.heights, &classifier);
        let (features, shape) = detect_features(&fragments, &self.heights, &self.config.features);

        let mut statistics = classification.statistics.clone();
        features.apply_to(&mut statistics);
        self.statistics = statistics;

        self.fragments = fragments.into_iter().map(|f| (f.identifier, f)).collect();

        ProcessingReport {
            classification,
            filtered_faces,
            shape,
        }
    }

    /// Drop all fragments, planes, heights and statistics
    pub fn reset(&mut self) {
        tracing::info!(fragments = self.fragments.len(), "Resetting capture session");
        self.fragments.clear();
        self.window_planes.clear();
        self.heights = HeightEstimate::default();
        self.heights_stale = false;
        self.statistics = ScanStatistics::default();
        self.start_time = Utc::now();
    }

    /// Finish the capture
    pub fn into_scan(self) -> CapturedScan {
        CapturedScan {
            fragments: self.fragments.into_values().collect(),
            classified_objects: Vec::new(),
            window_planes: self.window_planes,
            statistics: self.statistics,
            start_time: self.start_time,
            end_time: Some(Utc::now()),
        }
    }
}

enum Command {
    Event(FragmentEvent),
    WindowPlane(WindowPlane),
    Process(oneshot::Sender<Result<ProcessingReport>>),
    Statistics(oneshot::Sender<ScanStatistics>),
    Reset,
    Finish(oneshot::Sender<CapturedScan>),
}

/// Handle to a session running on its own task.
///
/// Must be created inside a tokio runtime.
#[derive(Clone)]
pub struct SessionProcessor {
    commands: mpsc::UnboundedSender<Command>,
}

impl SessionProcessor {
    pub fn spawn(config: ScanConfig) -> Self {
        let (commands, receiver) = mpsc::unbounded_channel();
        tokio::spawn(run_session(ProcessingSession::new(config), receiver));
        Self { commands }
    }

    /// Queue a fragment event; fragment buffers are validated up front
    pub fn submit(&self, event: FragmentEvent) -> Result<()> {
        if let FragmentEvent::Added(f) | FragmentEvent::Updated(f) = &event {
            f.validate()?;
        }
        self.send(Command::Event(event))
    }

    pub fn add_window_plane(&self, plane: WindowPlane) -> Result<()> {
        self.send(Command::WindowPlane(plane))
    }

    /// Run a processing pass after all previously submitted events
    pub async fn process(&self) -> Result<ProcessingReport> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Process(reply))?;
        response.await.map_err(|_| Error::ProcessorClosed)?
    }

    pub async fn statistics(&self) -> Result<ScanStatistics> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Statistics(reply))?;
        response.await.map_err(|_| Error::ProcessorClosed)
    }

    pub fn reset(&self) -> Result<()> {
        self.send(Command::Reset)
    }

    /// Stop the session and take its scan
    pub async fn finish(self) -> Result<CapturedScan> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Finish(reply))?;
        response.await.map_err(|_| Error::ProcessorClosed)
    }

    fn send(&self, command: Command) -> Result<()> {
        self.commands.send(command).map_err(|_| Error::ProcessorClosed)
    }
}

async fn run_session(mut session: ProcessingSession, mut commands: mpsc::UnboundedReceiver<Command>) {
    while let Some(command) = commands.recv().await {
        match command {
            Command::Event(event) => {
                let id = event.identifier();
                if let Err(e) = session.apply(event) {
                    tracing::warn!(fragment = %id, error = %e, "Rejected fragment event");
                }
            }
            Command::WindowPlane(plane) => session.add_window_plane(plane),
            Command::Process(reply) => {
                let pass = tokio::task::spawn_blocking(move || {
                    let report = session.process();
                    (session, report)
                })
                .await;
                match pass {
                    Ok((returned, report)) => {
                        session = returned;
                        let _ = reply.send(Ok(report));
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Processing pass failed, closing session");
                        let _ = reply.send(Err(Error::TaskFailed(e.to_string())));
                        return;
                    }
                }
            }
            Command::Statistics(reply) => {
                let _ = reply.send(session.statistics().clone());
            }
            Command::Reset => session.reset(),
            Command::Finish(reply) => {
                let _ = reply.send(session.into_scan());
                return;
            }
        }
    }
}
