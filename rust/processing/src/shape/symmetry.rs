// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Reflection and rotational symmetry around the vertex centroid

use nalgebra::{Point3, Rotation3, Vector3};
use rayon::prelude::*;
use roomscan_geometry::SpatialHash;
use serde::Serialize;
use std::f64::consts::TAU;

const REFLECTION_TOLERANCE: f64 = 0.01;
const REFLECTION_MATCH_RATIO: f64 = 0.8;
const ROTATION_TOLERANCE: f64 = 0.02;
const ROTATION_MATCH_RATIO: f64 = 0.7;
/// Rotation orders tried about the vertical axis, highest first
const ROTATION_ORDERS: [u32; 4] = [6, 4, 3, 2];

/// Cardinal axis a reflection plane is perpendicular to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    fn reflect(self, p: &Point3<f64>) -> Point3<f64> {
        match self {
            Axis::X => Point3::new(-p.x, p.y, p.z),
            Axis::Y => Point3::new(p.x, -p.y, p.z),
            Axis::Z => Point3::new(p.x, p.y, -p.z),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymmetryAnalysis {
    /// Axes whose perpendicular plane through the centroid is a mirror
    pub reflection_axes: Vec<Axis>,
    /// Highest passing rotation order about Y, 1 when none passes
    pub rotational_order: u32,
    /// Combined score in `[0, 1]`
    pub score: f64,
}

impl Default for SymmetryAnalysis {
    fn default() -> Self {
        Self {
            reflection_axes: Vec::new(),
            rotational_order: 1,
            score: 0.0,
        }
    }
}

pub(crate) fn analyze_symmetry(points: &[Point3<f64>]) -> SymmetryAnalysis {
    if points.is_empty() {
        return SymmetryAnalysis::default();
    }

    let centroid = points.iter().fold(Vector3::zeros(), |acc, p| acc + p.coords) / points.len() as f64;
    let centered: Vec<Point3<f64>> = points.iter().map(|p| p - centroid).collect();
    // Cell size covers the larger tolerance so a 27-cell lookup is exhaustive
    let hash = SpatialHash::from_points(&centered, ROTATION_TOLERANCE);

    let reflection_axes: Vec<Axis> = Axis::ALL
        .into_iter()
        .filter(|axis| {
            match_ratio(&centered, &hash, REFLECTION_TOLERANCE, |p| axis.reflect(p))
                >= REFLECTION_MATCH_RATIO
        })
        .collect();

    let rotational_order = ROTATION_ORDERS
        .into_iter()
        .find(|&order| {
            let rotation = Rotation3::from_axis_angle(&Vector3::y_axis(), TAU / order as f64);
            match_ratio(&centered, &hash, ROTATION_TOLERANCE, |p| rotation.transform_point(p))
                >= ROTATION_MATCH_RATIO
        })
        .unwrap_or(1);

    let score = ((reflection_axes.len() as f64 + 0.5 * (rotational_order - 1) as f64) / 4.5)
        .clamp(0.0, 1.0);

    SymmetryAnalysis {
        reflection_axes,
        rotational_order,
        score,
    }
}

/// Fraction of mapped points that land near some original point
fn match_ratio<F>(points: &[Point3<f64>], hash: &SpatialHash, tolerance: f64, map: F) -> f64
where
    F: Fn(&Point3<f64>) -> Point3<f64> + Sync,
{
    let matched = points
        .par_iter()
        .filter(|p| hash.has_point_within(&map(p), tolerance))
        .count();
    matched as f64 / points.len() as f64
}
