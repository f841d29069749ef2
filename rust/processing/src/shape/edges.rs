// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Edge topology: boundary, manifold and non-manifold edges, sharp creases

use nalgebra::Vector3;
use rustc_hash::FxHashMap;
use serde::Serialize;

/// Vertex normals meeting with a dot product below this form a sharp edge
pub const SHARP_DOT_THRESHOLD: f64 = 0.7;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeAnalysis {
    pub total_edges: usize,
    /// Edges with one incident face
    pub boundary_edges: usize,
    /// Edges with two incident faces
    pub manifold_edges: usize,
    /// Edges with more than two incident faces
    pub non_manifold_edges: usize,
    pub sharp_edge_count: usize,
    pub sharp_edge_ratio: f64,
    /// No boundary edges (vacuously true for an empty mesh)
    pub is_watertight: bool,
    /// Sharp manifold edges as sorted `(low, high)` vertex pairs
    #[serde(skip)]
    pub sharp_edges: Vec<(u32, u32)>,
}

impl Default for EdgeAnalysis {
    fn default() -> Self {
        Self {
            total_edges: 0,
            boundary_edges: 0,
            manifold_edges: 0,
            non_manifold_edges: 0,
            sharp_edge_count: 0,
            sharp_edge_ratio: 0.0,
            is_watertight: true,
            sharp_edges: Vec::new(),
        }
    }
}

/// Incident-face count per undirected edge
pub fn edge_face_counts<I>(triangles: I) -> FxHashMap<(u32, u32), u32>
where
    I: IntoIterator<Item = [u32; 3]>,
{
    let mut counts: FxHashMap<(u32, u32), u32> = FxHashMap::default();
    for [v0, v1, v2] in triangles {
        for (a, b) in [(v0, v1), (v1, v2), (v2, v0)] {
            if a == b {
                continue;
            }
            let key = if a < b { (a, b) } else { (b, a) };
            *counts.entry(key).or_insert(0) += 1;
        }
    }
    counts
}

/// Classify edges of the given triangles; `vertex_normals[v]` feeds the
/// sharpness test
pub(crate) fn analyze_edges(
    triangles: &[[u32; 3]],
    vertex_normals: &[Vector3<f64>],
) -> EdgeAnalysis {
    let counts = edge_face_counts(triangles.iter().copied());
    if counts.is_empty() {
        return EdgeAnalysis::default();
    }

    let mut analysis = EdgeAnalysis {
        total_edges: counts.len(),
        ..EdgeAnalysis::default()
    };

    for (&(a, b), &count) in &counts {
        match count {
            1 => analysis.boundary_edges += 1,
            2 => {
                analysis.manifold_edges += 1;
                let na = vertex_normals[a as usize];
                let nb = vertex_normals[b as usize];
                if na.dot(&nb) < SHARP_DOT_THRESHOLD {
                    analysis.sharp_edges.push((a, b));
                }
            }
            _ => analysis.non_manifold_edges += 1,
        }
    }

    analysis.sharp_edges.sort_unstable();
    analysis.sharp_edge_count = analysis.sharp_edges.len();
    analysis.sharp_edge_ratio = analysis.sharp_edge_count as f64 / analysis.total_edges as f64;
    analysis.is_watertight = analysis.boundary_edges == 0;
    analysis
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_normals(n: usize) -> Vec<Vector3<f64>> {
        vec![Vector3::y(); n]
    }

    #[test]
    fn test_single_triangle_is_open() {
        let e = analyze_edges(&[[0, 1, 2]], &flat_normals(3));
        assert_eq!(e.total_edges, 3);
        assert_eq!(e.boundary_edges, 3);
        assert!(!e.is_watertight);
        assert_eq!(e.sharp_edge_count, 0);
    }

    #[test]
    fn test_shared_edge_is_manifold() {
        let e = analyze_edges(&[[0, 1, 2], [1, 0, 3]], &flat_normals(4));
        assert_eq!(e.total_edges, 5);
        assert_eq!(e.manifold_edges, 1);
        assert_eq!(e.boundary_edges, 4);
    }

    #[test]
    fn test_fin_is_non_manifold() {
        let e = analyze_edges(&[[0, 1, 2], [1, 0, 3], [0, 1, 4]], &flat_normals(5));
        assert_eq!(e.non_manifold_edges, 1);
        assert_eq!(e.manifold_edges, 0);
    }

    #[test]
    fn test_sharp_edge_detected() {
        let normals = vec![Vector3::y(), Vector3::x(), Vector3::y(), Vector3::y()];
        let e = analyze_edges(&[[0, 1, 2], [1, 0, 3]], &normals);
        assert_eq!(e.sharp_edges, vec![(0, 1)]);
        assert!((e.sharp_edge_ratio - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_index_pairs_ignored() {
        let counts = edge_face_counts([[0, 0, 1]]);
        assert_eq!(counts.len(), 1);
        assert_eq!(counts[&(0, 1)], 2);
    }
}
