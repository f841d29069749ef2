// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Captured mesh fragments and their surface classification tag

use crate::error::{Error, Result};
use nalgebra::{Matrix4, Point3, Vector3};
use roomscan_geometry::{transform_normal, Aabb, Mesh};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Surface classification tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurfaceType {
    Floor,
    Ceiling,
    Wall,
    Protrusion,
    Object,
    Edge,
}

impl SurfaceType {
    pub const ALL: [SurfaceType; 6] = [
        SurfaceType::Floor,
        SurfaceType::Ceiling,
        SurfaceType::Wall,
        SurfaceType::Protrusion,
        SurfaceType::Object,
        SurfaceType::Edge,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SurfaceType::Floor => "floor",
            SurfaceType::Ceiling => "ceiling",
            SurfaceType::Wall => "wall",
            SurfaceType::Protrusion => "protrusion",
            SurfaceType::Object => "object",
            SurfaceType::Edge => "edge",
        }
    }

    /// Floor and ceiling surfaces (normal close to vertical)
    #[inline]
    pub fn is_horizontal(&self) -> bool {
        matches!(self, SurfaceType::Floor | SurfaceType::Ceiling)
    }
}

impl fmt::Display for SurfaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One contiguous piece of captured surface.
///
/// Geometry is stored in fragment-local coordinates; `transform` maps it
/// into the session's world frame. The fragment owns its buffers.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshFragment {
    /// Stable id, reused when the hardware re-reports the same anchor
    pub identifier: Uuid,
    /// Local positions, normals and triangle indices
    pub mesh: Mesh,
    /// Per-vertex RGB (empty unless texture capture ran)
    pub colors: Vec<f32>,
    /// Local-to-world rigid transform
    pub transform: Matrix4<f64>,
    /// Classification, assigned after capture and revised as heights tighten
    pub surface_type: Option<SurfaceType>,
}

impl MeshFragment {
    /// Create a fragment, validating buffer invariants
    pub fn new(
        identifier: Uuid,
        mesh: Mesh,
        colors: Vec<f32>,
        transform: Matrix4<f64>,
    ) -> Result<Self> {
        let fragment = Self {
            identifier,
            mesh,
            colors,
            transform,
            surface_type: None,
        };
        fragment.validate()?;
        Ok(fragment)
    }

    /// Create a fragment from positions and indices only; normals are
    /// derived from the faces.
    pub fn from_geometry(
        identifier: Uuid,
        positions: Vec<f32>,
        indices: Vec<u32>,
        transform: Matrix4<f64>,
    ) -> Result<Self> {
        let mut mesh = Mesh {
            positions,
            normals: Vec::new(),
            indices,
        };
        if mesh.positions.len() % 3 != 0 {
            return Err(invalid(identifier, "position buffer is not a multiple of 3"));
        }
        check_indices(identifier, &mesh)?;
        mesh.compute_vertex_normals();
        Self::new(identifier, mesh, Vec::new(), transform)
    }

    /// Check buffer lengths and index bounds
    pub fn validate(&self) -> Result<()> {
        let id = self.identifier;
        if self.mesh.positions.len() % 3 != 0 {
            return Err(invalid(id, "position buffer is not a multiple of 3"));
        }
        if self.mesh.normals.len() != self.mesh.positions.len() {
            return Err(invalid(
                id,
                &format!(
                    "normal count {} does not match vertex count {}",
                    self.mesh.normals.len() / 3,
                    self.vertex_count()
                ),
            ));
        }
        if !self.colors.is_empty() && self.colors.len() != self.mesh.positions.len() {
            return Err(invalid(
                id,
                &format!(
                    "color count {} must be 0 or {}",
                    self.colors.len() / 3,
                    self.vertex_count()
                ),
            ));
        }
        check_indices(id, &self.mesh)
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.mesh.vertex_count()
    }

    #[inline]
    pub fn face_count(&self) -> usize {
        self.mesh.triangle_count()
    }

    #[inline]
    pub fn has_colors(&self) -> bool {
        !self.colors.is_empty()
    }

    /// Vertex position in world space
    #[inline]
    pub fn world_vertex(&self, index: usize) -> Point3<f64> {
        self.transform.transform_point(&self.mesh.position(index))
    }

    /// All vertex positions in world space
    pub fn world_vertices(&self) -> Vec<Point3<f64>> {
        (0..self.vertex_count()).map(|i| self.world_vertex(i)).collect()
    }

    /// Vertex normal in world space
    #[inline]
    pub fn world_normal(&self, index: usize) -> Option<Vector3<f64>> {
        self.mesh
            .normal(index)
            .map(|n| transform_normal(&self.transform, &n))
    }

    /// World-space unit normal of a face, `None` for zero-area faces
    pub fn world_face_normal(&self, face: usize) -> Option<Vector3<f64>> {
        let [i0, i1, i2] = self.mesh.triangle(face);
        let v0 = self.world_vertex(i0 as usize);
        let v1 = self.world_vertex(i1 as usize);
        let v2 = self.world_vertex(i2 as usize);
        (v1 - v0).cross(&(v2 - v0)).try_normalize(1e-12)
    }

    /// Average of the vertex normals in world space.
    ///
    /// `None` when normals cancel out or are all zero.
    pub fn average_world_normal(&self) -> Option<Vector3<f64>> {
        if self.vertex_count() == 0 {
            return None;
        }
        let sum = (0..self.vertex_count())
            .filter_map(|i| self.mesh.normal(i))
            .fold(Vector3::zeros(), |acc, n| acc + n);
        let local = sum.try_normalize(1e-9)?;
        Some(transform_normal(&self.transform, &local))
    }

    /// Copy of the geometry in world space
    pub fn world_mesh(&self) -> Mesh {
        self.mesh.transformed(&self.transform)
    }

    /// Total triangle area (rigid transforms preserve area)
    pub fn area(&self) -> f64 {
        self.world_mesh().total_area()
    }

    pub fn world_bounds(&self) -> Aabb {
        Aabb::from_points(self.world_vertices().iter())
    }

    /// Mean world-space height of the vertices
    pub fn mean_world_y(&self) -> Option<f64> {
        let n = self.vertex_count();
        if n == 0 {
            return None;
        }
        Some((0..n).map(|i| self.world_vertex(i).y).sum::<f64>() / n as f64)
    }
}

/// Merge fragments into one world-space index space.
///
/// Fragments are visited in identifier order so the vertex numbering does
/// not depend on capture order.
pub fn merge_fragments<'a, I>(fragments: I) -> Mesh
where
    I: IntoIterator<Item = &'a MeshFragment>,
{
    let mut ordered: Vec<&MeshFragment> = fragments.into_iter().collect();
    ordered.sort_by_key(|f| f.identifier);

    let vertices: usize = ordered.iter().map(|f| f.vertex_count()).sum();
    let faces: usize = ordered.iter().map(|f| f.face_count()).sum();
    let mut merged = Mesh::with_capacity(vertices, faces * 3);
    for fragment in ordered {
        merged.merge(&fragment.world_mesh());
    }
    merged
}

fn invalid(id: Uuid, reason: &str) -> Error {
    Error::InvalidFragment {
        id,
        reason: reason.to_string(),
    }
}

fn check_indices(id: Uuid, mesh: &Mesh) -> Result<()> {
    if mesh.indices.len() % 3 != 0 {
        return Err(invalid(id, "index buffer is not a multiple of 3"));
    }
    let vertex_count = mesh.vertex_count() as u32;
    if let Some(bad) = mesh.indices.iter().find(|&&i| i >= vertex_count) {
        return Err(invalid(
            id,
            &format!("face index {} out of range for {} vertices", bad, vertex_count),
        ));
    }
    Ok(())
}
