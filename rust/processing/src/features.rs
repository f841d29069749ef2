// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Door, window, protrusion and edge detection
//!
//! Openings are interior boundary loops (holes) in wall fragments, or gaps
//! in the floor-level edge of a wall's outer boundary, sized in the wall
//! plane. Edges are connected chains of sharp mesh edges from the
//! shape analysis.

use crate::classifier::HeightEstimate;
use crate::shape::{analyze_shape, edge_face_counts, ShapeAnalysis};
use nalgebra::{Point3, Vector3};
use rayon::prelude::*;
use roomscan_core::{
    merge_fragments, CapturedScan, DetectedEdge, DetectedOpening, DetectedProtrusion,
    FeatureConfig, MeshFragment, OpeningKind, ScanStatistics, SurfaceType,
};
use roomscan_geometry::{Aabb, Mesh, UP};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;
use smallvec::SmallVec;

/// Everything detected in one pass
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DetectedFeatures {
    pub doors: Vec<DetectedOpening>,
    pub windows: Vec<DetectedOpening>,
    pub protrusions: Vec<DetectedProtrusion>,
    pub edges: Vec<DetectedEdge>,
}

impl DetectedFeatures {
    /// Replace the detection lists of `statistics`
    pub fn apply_to(self, statistics: &mut ScanStatistics) {
        statistics.doors = self.doors;
        statistics.windows = self.windows;
        statistics.protrusions = self.protrusions;
        statistics.edges = self.edges;
    }
}

/// Run shape analysis on the merged mesh and detect all features
pub fn detect_features(
    fragments: &[MeshFragment],
    heights: &HeightEstimate,
    config: &FeatureConfig,
) -> (DetectedFeatures, ShapeAnalysis) {
    let merged = merge_fragments(fragments);
    let analysis = analyze_shape(&merged);
    let features = detect_features_with(fragments, &merged, &analysis, heights, config);
    (features, analysis)
}

/// Detect features reusing an existing merged mesh and its analysis
pub fn detect_features_with(
    fragments: &[MeshFragment],
    merged: &Mesh,
    analysis: &ShapeAnalysis,
    heights: &HeightEstimate,
    config: &FeatureConfig,
) -> DetectedFeatures {
    let (doors, windows) = detect_openings(fragments, heights, config);
    let features = DetectedFeatures {
        doors,
        windows,
        protrusions: detect_protrusions(fragments, heights),
        edges: detect_edges(merged, &analysis.edges.sharp_edges, config.min_edge_chain),
    };
    tracing::info!(
        doors = features.doors.len(),
        windows = features.windows.len(),
        protrusions = features.protrusions.len(),
        edges = features.edges.len(),
        "Feature detection complete"
    );
    features
}

/// Analyze a classified scan and store its detections in the statistics.
///
/// Heights come from the scan's statistics.
pub fn analyze_scan(scan: &mut CapturedScan, config: &FeatureConfig) -> ShapeAnalysis {
    let heights = HeightEstimate {
        floor: scan.statistics.floor_height,
        ceiling: scan.statistics.ceiling_height,
    };
    let (features, analysis) = detect_features(&scan.fragments, &heights, config);
    features.apply_to(&mut scan.statistics);
    analysis
}

/// Doors and windows cut into wall fragments.
///
/// Needs a floor height; without one nothing is reported.
pub fn detect_openings(
    fragments: &[MeshFragment],
    heights: &HeightEstimate,
    config: &FeatureConfig,
) -> (Vec<DetectedOpening>, Vec<DetectedOpening>) {
    let Some(floor) = heights.floor else {
        return (Vec::new(), Vec::new());
    };

    let mut walls: Vec<&MeshFragment> = fragments
        .iter()
        .filter(|f| f.surface_type == Some(SurfaceType::Wall))
        .collect();
    walls.sort_by_key(|f| f.identifier);

    let openings: Vec<DetectedOpening> = walls
        .par_iter()
        .flat_map_iter(|wall| wall_openings(wall, floor, config))
        .collect();

    openings
        .into_iter()
        .partition(|o| o.kind == OpeningKind::Door)
}

/// Hole rectangle in wall-plane coordinates
struct WallRect {
    u_min: f64,
    u_max: f64,
    y_min: f64,
    y_max: f64,
    depth: f64,
}

impl WallRect {
    fn width(&self) -> f64 {
        self.u_max - self.u_min
    }

    fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    fn area(&self) -> f64 {
        self.width() * self.height()
    }
}

fn wall_openings(wall: &MeshFragment, floor: f64, config: &FeatureConfig) -> Vec<DetectedOpening> {
    let Some(normal) = wall
        .average_world_normal()
        .and_then(|n| Vector3::new(n.x, 0.0, n.z).try_normalize(1e-9))
    else {
        return Vec::new();
    };
    let along = UP.cross(&normal);

    let loops = boundary_loops(&wall.mesh);
    if loops.is_empty() {
        return Vec::new();
    }

    let project = |v: u32| {
        let p = wall.world_vertex(v as usize).coords;
        (p.dot(&along), p.y, p.dot(&normal))
    };

    let rects: Vec<WallRect> = loops
        .iter()
        .map(|ring| {
            let mut rect = WallRect {
                u_min: f64::INFINITY,
                u_max: f64::NEG_INFINITY,
                y_min: f64::INFINITY,
                y_max: f64::NEG_INFINITY,
                depth: 0.0,
            };
            for &v in ring {
                let (u, y, depth) = project(v);
                rect.u_min = rect.u_min.min(u);
                rect.u_max = rect.u_max.max(u);
                rect.y_min = rect.y_min.min(y);
                rect.y_max = rect.y_max.max(y);
                rect.depth += depth;
            }
            rect.depth /= ring.len() as f64;
            rect
        })
        .collect();

    // The outer boundary spans the largest rectangle; the rest are holes
    let outer = rects
        .iter()
        .enumerate()
        .fold(0, |best, (i, r)| if r.area() > rects[best].area() { i } else { best });

    let outline: Vec<(f64, f64)> = loops[outer]
        .iter()
        .map(|&v| {
            let (u, y, _) = project(v);
            (u, y)
        })
        .collect();
    let notches = floor_notches(
        &outline,
        floor,
        config.opening_floor_tolerance,
        rects[outer].depth,
    );

    rects
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != outer)
        .map(|(_, rect)| rect)
        .chain(notches.iter())
        .filter_map(|rect| {
            let sill = rect.y_min - floor;
            let (width, height) = (rect.width(), rect.height());
            let kind = if sill.abs() <= config.opening_floor_tolerance
                && height >= config.door_min_height
                && width >= config.door_min_width
                && width <= config.door_max_width
            {
                OpeningKind::Door
            } else if sill >= config.window_min_sill
                && width >= config.window_min_size
                && height >= config.window_min_size
            {
                OpeningKind::Window
            } else {
                return None;
            };

            let u_mid = (rect.u_min + rect.u_max) * 0.5;
            let y_mid = (rect.y_min + rect.y_max) * 0.5;
            let center = Point3::from(along * u_mid + normal * rect.depth + UP * y_mid);
            tracing::debug!(?kind, width, height, sill, wall = %wall.identifier, "Detected opening");

            Some(DetectedOpening {
                kind,
                center,
                normal,
                width,
                height,
                sill_height: sill.max(0.0),
                wall_fragment: Some(wall.identifier),
            })
        })
        .collect()
}

/// Openings that reach the floor, as gaps in the outer boundary.
///
/// `outline` is the outer loop in wall-plane `(u, y)` coordinates. Edges
/// with both ends within `tolerance` of the floor cover the bottom of the
/// wall; each gap between covered runs is an opening closed above by the
/// lowest boundary vertex over it.
fn floor_notches(outline: &[(f64, f64)], floor: f64, tolerance: f64, depth: f64) -> Vec<WallRect> {
    let at_floor = |y: f64| (y - floor).abs() <= tolerance;
    let n = outline.len();

    let mut runs: Vec<(f64, f64)> = (0..n)
        .filter_map(|i| {
            let (a, b) = (outline[i], outline[(i + 1) % n]);
            (at_floor(a.1) && at_floor(b.1)).then(|| (a.0.min(b.0), a.0.max(b.0)))
        })
        .collect();
    runs.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut covered: Vec<(f64, f64)> = Vec::new();
    for (lo, hi) in runs {
        match covered.last_mut() {
            Some(last) if lo <= last.1 + 1e-6 => last.1 = last.1.max(hi),
            _ => covered.push((lo, hi)),
        }
    }

    covered
        .windows(2)
        .filter_map(|pair| {
            let (u_min, u_max) = (pair[0].1, pair[1].0);
            let top = outline
                .iter()
                .filter(|&&(u, y)| {
                    y - floor > tolerance && u >= u_min - tolerance && u <= u_max + tolerance
                })
                .map(|&(_, y)| y)
                .min_by(|a, b| a.total_cmp(b))?;
            Some(WallRect {
                u_min,
                u_max,
                y_min: floor,
                y_max: top,
                depth,
            })
        })
        .collect()
}

/// Closed loops of boundary edges, as local vertex indices.
///
/// Open chains (non-manifold or pinched boundaries) are dropped.
pub fn boundary_loops(mesh: &Mesh) -> Vec<Vec<u32>> {
    let mut edges: Vec<(u32, u32)> = edge_face_counts(mesh.triangles())
        .into_iter()
        .filter(|&(_, count)| count == 1)
        .map(|(edge, _)| edge)
        .collect();
    edges.sort_unstable();

    let mut neighbors: FxHashMap<u32, SmallVec<[u32; 2]>> = FxHashMap::default();
    for &(a, b) in &edges {
        neighbors.entry(a).or_default().push(b);
        neighbors.entry(b).or_default().push(a);
    }

    let mut visited: FxHashSet<u32> = FxHashSet::default();
    let mut loops = Vec::new();

    for &(start, _) in &edges {
        if visited.contains(&start) {
            continue;
        }

        let mut ring = Vec::new();
        let mut current = start;
        let mut prev: Option<u32> = None;
        loop {
            visited.insert(current);
            ring.push(current);

            let candidates = neighbors.get(&current).map(|n| n.as_slice()).unwrap_or(&[]);
            match candidates
                .iter()
                .copied()
                .find(|&n| Some(n) != prev && !visited.contains(&n))
            {
                Some(next) => {
                    prev = Some(current);
                    current = next;
                }
                None => {
                    if ring.len() < 3 || !candidates.contains(&start) {
                        tracing::debug!(start, "Boundary chain is not closed");
                        ring.clear();
                    }
                    break;
                }
            }
        }

        if !ring.is_empty() {
            loops.push(ring);
        }
    }

    loops
}

/// One protrusion per protrusion-classified fragment, in identifier order
pub fn detect_protrusions(
    fragments: &[MeshFragment],
    heights: &HeightEstimate,
) -> Vec<DetectedProtrusion> {
    let mut protrusions: Vec<DetectedProtrusion> = fragments
        .iter()
        .filter(|f| f.surface_type == Some(SurfaceType::Protrusion))
        .map(|f| {
            let bounds = f.world_bounds();
            DetectedProtrusion {
                fragment: f.identifier,
                depth_below_ceiling: heights.ceiling.map_or(0.0, |c| (c - bounds.min.y).max(0.0)),
                bounds,
                area: f.area(),
            }
        })
        .collect();
    protrusions.sort_by_key(|p| p.fragment);
    protrusions
}

/// Connected chains of sharp edges with at least `min_chain` edges.
///
/// `sharp_edges` index into `mesh`; chains are ordered by their lowest edge.
pub fn detect_edges(mesh: &Mesh, sharp_edges: &[(u32, u32)], min_chain: usize) -> Vec<DetectedEdge> {
    let mut parent: FxHashMap<u32, u32> = FxHashMap::default();
    for &(a, b) in sharp_edges {
        let ra = find_root(&mut parent, a);
        let rb = find_root(&mut parent, b);
        if ra != rb {
            parent.insert(ra.max(rb), ra.min(rb));
        }
    }

    let mut chains: FxHashMap<u32, Vec<(u32, u32)>> = FxHashMap::default();
    for &(a, b) in sharp_edges {
        let root = find_root(&mut parent, a);
        chains.entry(root).or_default().push((a, b));
    }

    let mut chains: Vec<Vec<(u32, u32)>> = chains
        .into_values()
        .filter(|edges| edges.len() >= min_chain.max(1))
        .collect();
    for chain in &mut chains {
        chain.sort_unstable();
    }
    chains.sort_unstable_by_key(|chain| chain[0]);

    chains
        .into_iter()
        .map(|chain| {
            let mut bounds = Aabb::empty();
            let mut length = 0.0;
            for &(a, b) in &chain {
                let pa = mesh.position(a as usize);
                let pb = mesh.position(b as usize);
                bounds.expand(&pa);
                bounds.expand(&pb);
                length += (pb - pa).norm();
            }
            DetectedEdge {
                bounds,
                length,
                edge_count: chain.len(),
            }
        })
        .collect()
}

fn find_root(parent: &mut FxHashMap<u32, u32>, v: u32) -> u32 {
    let mut root = v;
    while let Some(&p) = parent.get(&root) {
        if p == root {
            break;
        }
        root = p;
    }
    // Path compression
    let mut current = v;
    while current != root {
        let next = parent.get(&current).copied().unwrap_or(root);
        parent.insert(current, root);
        current = next;
    }
    root
}
