// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shape analysis of a merged capture mesh
//!
//! Curvature, symmetry and edge topology descriptors. An empty mesh is a
//! valid degenerate shape and yields zero-valued results.

mod curvature;
mod edges;
mod symmetry;

pub use curvature::{CurvatureStats, FLAT_THRESHOLD};
pub use edges::{edge_face_counts, EdgeAnalysis, SHARP_DOT_THRESHOLD};
pub use symmetry::{Axis, SymmetryAnalysis};

use nalgebra::{Point3, Vector3};
use roomscan_geometry::Mesh;
use serde::Serialize;
use smallvec::SmallVec;

/// Geometric descriptors of one mesh
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ShapeAnalysis {
    pub curvature: CurvatureStats,
    pub symmetry: SymmetryAnalysis,
    pub edges: EdgeAnalysis,
    pub vertex_count: usize,
    pub face_count: usize,
    /// Faces with zero area or out-of-range indices
    pub degenerate_faces: usize,
}

/// Analyze a mesh in a single index space.
///
/// Faces with out-of-range indices are counted as degenerate and ignored.
/// Vertex normals are derived from the faces when the mesh has none.
pub fn analyze_shape(mesh: &Mesh) -> ShapeAnalysis {
    let vertex_count = mesh.vertex_count();
    let face_count = mesh.triangle_count();

    let triangles: Vec<[u32; 3]> = mesh
        .triangles()
        .filter(|t| t.iter().all(|&i| (i as usize) < vertex_count))
        .collect();

    let mut face_normals: Vec<Option<Vector3<f64>>> = Vec::with_capacity(triangles.len());
    let mut incident: Vec<SmallVec<[u32; 8]>> = vec![SmallVec::new(); vertex_count];
    let mut summed_normals = vec![Vector3::<f64>::zeros(); vertex_count];

    for (f, &triangle) in triangles.iter().enumerate() {
        let [p0, p1, p2] = triangle.map(|i| mesh.position(i as usize));
        let cross = (p1 - p0).cross(&(p2 - p0));
        face_normals.push(cross.try_normalize(1e-12));
        for &i in &triangle {
            incident[i as usize].push(f as u32);
            summed_normals[i as usize] += cross;
        }
    }

    let degenerate_faces =
        (face_count - triangles.len()) + face_normals.iter().filter(|n| n.is_none()).count();
    if degenerate_faces > 0 {
        tracing::warn!(degenerate_faces, "Ignoring degenerate faces in shape analysis");
    }

    let vertex_normals: Vec<Vector3<f64>> = if mesh.has_normals() {
        (0..vertex_count)
            .map(|i| mesh.normal(i).unwrap_or_else(Vector3::zeros))
            .collect()
    } else {
        summed_normals
            .iter()
            .map(|n| n.try_normalize(1e-12).unwrap_or_else(Vector3::zeros))
            .collect()
    };

    let points: Vec<Point3<f64>> = (0..vertex_count).map(|i| mesh.position(i)).collect();

    let (curvature, (symmetry, edges)) = rayon::join(
        || curvature::analyze_curvature(&face_normals, &incident),
        || {
            rayon::join(
                || symmetry::analyze_symmetry(&points),
                || edges::analyze_edges(&triangles, &vertex_normals),
            )
        },
    );

    tracing::debug!(
        vertices = vertex_count,
        faces = face_count,
        boundary_edges = edges.boundary_edges,
        sharp_edges = edges.sharp_edge_count,
        symmetry = symmetry.score,
        "Shape analysis complete"
    );

    ShapeAnalysis {
        curvature,
        symmetry,
        edges,
        vertex_count,
        face_count,
        degenerate_faces,
    }
}
