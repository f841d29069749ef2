// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-vertex curvature from incident face normals

use nalgebra::Vector3;
use serde::Serialize;
use smallvec::SmallVec;

/// Vertices below this curvature (radians) count as flat
pub const FLAT_THRESHOLD: f64 = 0.1;

/// Curvature statistics over vertices with at least two valid incident faces
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurvatureStats {
    pub mean: f64,
    pub max: f64,
    pub min: f64,
    pub variance: f64,
    pub flat_region_ratio: f64,
    /// Vertices that contributed
    pub sampled_vertices: usize,
}

impl Default for CurvatureStats {
    fn default() -> Self {
        Self {
            mean: 0.0,
            max: 0.0,
            min: 0.0,
            variance: 0.0,
            flat_region_ratio: 1.0,
            sampled_vertices: 0,
        }
    }
}

/// Curvature statistics.
///
/// `face_normals[f]` is `None` for faces to ignore; `incident[v]` lists the
/// faces touching vertex `v`. Curvature at a vertex is the largest angle
/// between any two of its incident face normals.
pub(crate) fn analyze_curvature(
    face_normals: &[Option<Vector3<f64>>],
    incident: &[SmallVec<[u32; 8]>],
) -> CurvatureStats {
    let curvatures: Vec<f64> = incident
        .iter()
        .filter_map(|faces| {
            let normals: SmallVec<[Vector3<f64>; 8]> = faces
                .iter()
                .filter_map(|&f| face_normals[f as usize])
                .collect();
            vertex_curvature(&normals)
        })
        .collect();

    if curvatures.is_empty() {
        return CurvatureStats::default();
    }

    let n = curvatures.len() as f64;
    let mean = curvatures.iter().sum::<f64>() / n;
    let variance = curvatures.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / n;
    let flat = curvatures.iter().filter(|&&c| c < FLAT_THRESHOLD).count();

    CurvatureStats {
        mean,
        max: curvatures.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        min: curvatures.iter().copied().fold(f64::INFINITY, f64::min),
        variance,
        flat_region_ratio: flat as f64 / n,
        sampled_vertices: curvatures.len(),
    }
}

/// Max pairwise angle; `None` with fewer than two normals
fn vertex_curvature(normals: &[Vector3<f64>]) -> Option<f64> {
    if normals.len() < 2 {
        return None;
    }
    let mut max_angle: f64 = 0.0;
    for (i, a) in normals.iter().enumerate() {
        for b in &normals[i + 1..] {
            max_angle = max_angle.max(a.dot(b).clamp(-1.0, 1.0).acos());
        }
    }
    Some(max_angle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use smallvec::smallvec;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_flat_vertex() {
        let normals = vec![Some(Vector3::y()), Some(Vector3::y())];
        let incident = vec![smallvec![0, 1]];
        let stats = analyze_curvature(&normals, &incident);
        assert_eq!(stats.sampled_vertices, 1);
        assert_relative_eq!(stats.max, 0.0);
        assert_relative_eq!(stats.flat_region_ratio, 1.0);
    }

    #[test]
    fn test_right_angle_corner() {
        let normals = vec![Some(Vector3::y()), Some(Vector3::x()), Some(Vector3::y())];
        let incident = vec![smallvec![0, 1], smallvec![0, 2], smallvec![1]];
        let stats = analyze_curvature(&normals, &incident);
        assert_eq!(stats.sampled_vertices, 2);
        assert_relative_eq!(stats.max, FRAC_PI_2, epsilon = 1e-12);
        assert_relative_eq!(stats.min, 0.0);
        assert_relative_eq!(stats.mean, FRAC_PI_2 / 2.0, epsilon = 1e-12);
        assert_relative_eq!(stats.variance, (FRAC_PI_2 / 2.0).powi(2), epsilon = 1e-12);
        assert_relative_eq!(stats.flat_region_ratio, 0.5);
    }

    #[test]
    fn test_ignored_faces_do_not_count() {
        let normals = vec![Some(Vector3::y()), None];
        let incident = vec![smallvec![0, 1]];
        let stats = analyze_curvature(&normals, &incident);
        assert_eq!(stats, CurvatureStats::default());
    }
}
