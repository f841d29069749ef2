// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Surface classification
//!
//! Assigns each fragment (or each face, in per-face mode) a surface type
//! from its normal orientation and height relative to the floor/ceiling
//! estimates, and recomputes the per-type area statistics.
//!
//! Every pass recomputes statistics from the full fragment set, so
//! classifying an unchanged set twice yields identical statistics.

use nalgebra::Vector3;
use rayon::prelude::*;
use roomscan_core::{CapturedScan, ClassifierConfig, MeshFragment, ScanStatistics, SurfaceType};
use roomscan_geometry::UP;
use serde::Serialize;
use smallvec::{smallvec, SmallVec};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Faces with less area than this are degenerate
const AREA_EPSILON: f64 = 1e-12;

/// Floor and ceiling plane estimates (world Y)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct HeightEstimate {
    pub floor: Option<f64>,
    pub ceiling: Option<f64>,
}

impl HeightEstimate {
    /// Lowest up-facing and highest down-facing horizontal surface
    pub fn from_fragments(fragments: &[MeshFragment], config: &ClassifierConfig) -> Self {
        fragments
            .par_iter()
            .map(|fragment| {
                let mut estimate = HeightEstimate::default();
                if config.per_face {
                    for sample in face_samples(fragment).into_iter().flatten() {
                        estimate.observe(&sample, config);
                    }
                } else if let Some(sample) = fragment_sample(fragment) {
                    estimate.observe(&sample, config);
                }
                estimate
            })
            .reduce(HeightEstimate::default, |a, b| a.merge(&b))
    }

    /// Widest extrema of both estimates
    pub fn merge(&self, other: &HeightEstimate) -> HeightEstimate {
        HeightEstimate {
            floor: match (self.floor, other.floor) {
                (Some(a), Some(b)) => Some(a.min(b)),
                (a, b) => a.or(b),
            },
            ceiling: match (self.ceiling, other.ceiling) {
                (Some(a), Some(b)) => Some(a.max(b)),
                (a, b) => a.or(b),
            },
        }
    }

    pub fn room_height(&self) -> Option<f64> {
        match (self.floor, self.ceiling) {
            (Some(f), Some(c)) if c > f => Some(c - f),
            _ => None,
        }
    }

    fn observe(&mut self, sample: &SurfaceSample, config: &ClassifierConfig) {
        let cos = sample.normal.dot(&UP);
        if cos.abs() < config.horizontal_cos() {
            return;
        }
        if cos > 0.0 {
            self.floor = Some(self.floor.map_or(sample.y, |f| f.min(sample.y)));
        } else {
            self.ceiling = Some(self.ceiling.map_or(sample.y, |c| c.max(sample.y)));
        }
    }
}

/// Outcome of one classification pass
#[derive(Debug, Clone, Default, Serialize)]
pub struct ClassificationReport {
    /// Areas and heights; detection lists are left empty
    pub statistics: ScanStatistics,
    pub heights: HeightEstimate,
    pub classified_fragments: usize,
    /// Degenerate fragments left unclassified, in identifier order
    pub skipped_fragments: Vec<Uuid>,
    pub type_counts: BTreeMap<SurfaceType, usize>,
}

/// Classify a single surface sample.
///
/// Checks run in priority order with inclusive thresholds: floor/ceiling,
/// then wall, then protrusion, then object.
pub fn classify_surface(
    normal: &Vector3<f64>,
    y: f64,
    heights: &HeightEstimate,
    config: &ClassifierConfig,
) -> SurfaceType {
    let cos = normal.dot(&UP);
    let abs_cos = cos.abs();

    if abs_cos >= config.horizontal_cos() {
        let near = |plane: Option<f64>| plane.is_some_and(|h| (y - h).abs() <= config.height_tolerance);
        if cos > 0.0 && near(heights.floor) {
            return SurfaceType::Floor;
        }
        if cos < 0.0 && near(heights.ceiling) {
            return SurfaceType::Ceiling;
        }
    }

    if abs_cos <= config.wall_cos() {
        return SurfaceType::Wall;
    }

    if let Some(ceiling) = heights.ceiling {
        let depth = ceiling - y;
        if depth >= config.protrusion_min_depth && depth <= config.protrusion_max_depth {
            return SurfaceType::Protrusion;
        }
    }

    SurfaceType::Object
}

/// Classify fragments in place using heights estimated from the same set
pub fn classify(fragments: &mut [MeshFragment], config: &ClassifierConfig) -> ClassificationReport {
    let heights = HeightEstimate::from_fragments(fragments, config);
    classify_with_heights(fragments, &heights, config)
}

/// Classify fragments in place against externally maintained heights
pub fn classify_with_heights(
    fragments: &mut [MeshFragment],
    heights: &HeightEstimate,
    config: &ClassifierConfig,
) -> ClassificationReport {
    tracing::info!(
        fragments = fragments.len(),
        per_face = config.per_face,
        floor = ?heights.floor,
        ceiling = ?heights.ceiling,
        "Classifying surfaces"
    );

    let outcomes: Vec<Outcome> = fragments
        .par_iter()
        .map(|fragment| classify_fragment(fragment, heights, config))
        .collect();

    // Accumulate in identifier order so the sums do not depend on input order
    let mut order: Vec<usize> = (0..fragments.len()).collect();
    order.sort_by_key(|&i| fragments[i].identifier);

    let mut report = ClassificationReport {
        heights: *heights,
        ..Default::default()
    };

    for i in order {
        let outcome = &outcomes[i];
        let fragment = &mut fragments[i];
        fragment.surface_type = outcome.surface_type;

        match outcome.surface_type {
            Some(surface_type) => {
                report.classified_fragments += 1;
                *report.type_counts.entry(surface_type).or_default() += 1;
                for &(bucket, area) in &outcome.areas {
                    report.statistics.add_area(bucket, area);
                }
            }
            None => {
                tracing::warn!(fragment = %fragment.identifier, "Skipping degenerate fragment");
                report.skipped_fragments.push(fragment.identifier);
            }
        }
    }

    report.statistics.floor_height = heights.floor;
    report.statistics.ceiling_height = heights.ceiling;

    tracing::info!(
        classified = report.classified_fragments,
        skipped = report.skipped_fragments.len(),
        floor_area = report.statistics.floor_area,
        wall_area = report.statistics.wall_area,
        "Classification complete"
    );

    report
}

/// Classify a scan's fragments and replace its areas and heights.
/// Detection lists already on the scan are kept.
pub fn classify_scan(scan: &mut CapturedScan, config: &ClassifierConfig) -> ClassificationReport {
    let report = classify(&mut scan.fragments, config);
    let previous = std::mem::take(&mut scan.statistics);
    scan.statistics = ScanStatistics {
        protrusions: previous.protrusions,
        edges: previous.edges,
        doors: previous.doors,
        windows: previous.windows,
        ..report.statistics.clone()
    };
    report
}

struct SurfaceSample {
    normal: Vector3<f64>,
    y: f64,
    area: f64,
}

struct Outcome {
    surface_type: Option<SurfaceType>,
    areas: SmallVec<[(SurfaceType, f64); 4]>,
}

impl Outcome {
    fn skipped() -> Self {
        Self {
            surface_type: None,
            areas: SmallVec::new(),
        }
    }
}

/// Averaged normal, mean height and total area; `None` when degenerate
fn fragment_sample(fragment: &MeshFragment) -> Option<SurfaceSample> {
    let normal = fragment.average_world_normal()?;
    let area = fragment.area();
    if area.is_nan() || area <= AREA_EPSILON {
        return None;
    }
    Some(SurfaceSample {
        normal,
        y: fragment.mean_world_y()?,
        area,
    })
}

/// One sample per face; `None` entries are zero-area faces
fn face_samples(fragment: &MeshFragment) -> Vec<Option<SurfaceSample>> {
    (0..fragment.face_count())
        .map(|face| {
            let [i0, i1, i2] = fragment.mesh.triangle(face);
            let v0 = fragment.world_vertex(i0 as usize);
            let v1 = fragment.world_vertex(i1 as usize);
            let v2 = fragment.world_vertex(i2 as usize);
            let cross = (v1 - v0).cross(&(v2 - v0));
            let area = cross.norm() * 0.5;
            if area.is_nan() || area <= AREA_EPSILON {
                return None;
            }
            Some(SurfaceSample {
                normal: cross / (area * 2.0),
                y: (v0.y + v1.y + v2.y) / 3.0,
                area,
            })
        })
        .collect()
}

fn classify_fragment(
    fragment: &MeshFragment,
    heights: &HeightEstimate,
    config: &ClassifierConfig,
) -> Outcome {
    if config.per_face {
        return classify_faces(fragment, heights, config);
    }
    match fragment_sample(fragment) {
        Some(sample) => {
            let surface_type = classify_surface(&sample.normal, sample.y, heights, config);
            Outcome {
                surface_type: Some(surface_type),
                areas: smallvec![(surface_type, sample.area)],
            }
        }
        None => Outcome::skipped(),
    }
}

fn classify_faces(
    fragment: &MeshFragment,
    heights: &HeightEstimate,
    config: &ClassifierConfig,
) -> Outcome {
    let mut areas: SmallVec<[(SurfaceType, f64); 4]> = SmallVec::new();
    for sample in face_samples(fragment).into_iter().flatten() {
        let surface_type = classify_surface(&sample.normal, sample.y, heights, config);
        match areas.iter_mut().find(|(t, _)| *t == surface_type) {
            Some(bucket) => bucket.1 += sample.area,
            None => areas.push((surface_type, sample.area)),
        }
    }
    if areas.is_empty() {
        return Outcome::skipped();
    }
    areas.sort_by_key(|&(t, _)| t);

    let total: f64 = areas.iter().map(|&(_, a)| a).sum();
    let (dominant, dominant_area) = areas
        .iter()
        .copied()
        .fold((areas[0].0, f64::NEG_INFINITY), |best, (t, a)| {
            if a > best.1 {
                (t, a)
            } else {
                best
            }
        });

    let mixed = areas.iter().any(|(t, _)| t.is_horizontal())
        && areas.iter().any(|(t, _)| *t == SurfaceType::Wall);
    let surface_type = if mixed && dominant_area / total < config.edge_dominance_ratio {
        SurfaceType::Edge
    } else {
        dominant
    };

    Outcome {
        surface_type: Some(surface_type),
        areas,
    }
}
