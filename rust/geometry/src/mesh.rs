// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mesh data structures

use crate::bounds::Aabb;
use crate::transform::transform_normal;
use nalgebra::{Matrix4, Point3, Vector3};

/// Triangle mesh
///
/// Flat buffers in the layout capture hardware hands over. Normals are
/// either empty or parallel to positions.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    /// Vertex positions (x, y, z)
    pub positions: Vec<f32>,
    /// Vertex normals (nx, ny, nz)
    pub normals: Vec<f32>,
    /// Triangle indices (i0, i1, i2)
    pub indices: Vec<u32>,
}

impl Mesh {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self {
            positions: Vec::new(),
            normals: Vec::new(),
            indices: Vec::new(),
        }
    }

    /// Create a mesh with capacity
    pub fn with_capacity(vertex_count: usize, index_count: usize) -> Self {
        Self {
            positions: Vec::with_capacity(vertex_count * 3),
            normals: Vec::with_capacity(vertex_count * 3),
            indices: Vec::with_capacity(index_count),
        }
    }

    /// Add a vertex with normal
    #[inline]
    pub fn add_vertex(&mut self, position: Point3<f64>, normal: Vector3<f64>) {
        self.positions.push(position.x as f32);
        self.positions.push(position.y as f32);
        self.positions.push(position.z as f32);

        self.normals.push(normal.x as f32);
        self.normals.push(normal.y as f32);
        self.normals.push(normal.z as f32);
    }

    /// Add a triangle
    #[inline]
    pub fn add_triangle(&mut self, i0: u32, i1: u32, i2: u32) {
        self.indices.push(i0);
        self.indices.push(i1);
        self.indices.push(i2);
    }

    /// Merge another mesh into this one
    #[inline]
    pub fn merge(&mut self, other: &Mesh) {
        if other.is_empty() {
            return;
        }

        let vertex_offset = (self.positions.len() / 3) as u32;

        // Normals stay parallel only if both sides carry them
        let keep_normals = (self.is_empty() || self.has_normals()) && other.has_normals();
        if !keep_normals {
            self.normals.clear();
        }

        self.positions.reserve(other.positions.len());
        self.indices.reserve(other.indices.len());

        self.positions.extend_from_slice(&other.positions);
        if keep_normals {
            self.normals.extend_from_slice(&other.normals);
        }

        self.indices
            .extend(other.indices.iter().map(|&i| i + vertex_offset));
    }

    /// Get vertex count
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Get triangle count
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Check if mesh is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// True when every vertex has a normal
    #[inline]
    pub fn has_normals(&self) -> bool {
        !self.normals.is_empty() && self.normals.len() == self.positions.len()
    }

    /// Vertex position in f64
    #[inline]
    pub fn position(&self, index: usize) -> Point3<f64> {
        let i = index * 3;
        Point3::new(
            self.positions[i] as f64,
            self.positions[i + 1] as f64,
            self.positions[i + 2] as f64,
        )
    }

    /// Vertex normal in f64, if normals are present
    #[inline]
    pub fn normal(&self, index: usize) -> Option<Vector3<f64>> {
        if !self.has_normals() {
            return None;
        }
        let i = index * 3;
        Some(Vector3::new(
            self.normals[i] as f64,
            self.normals[i + 1] as f64,
            self.normals[i + 2] as f64,
        ))
    }

    /// Vertex indices of a triangle
    #[inline]
    pub fn triangle(&self, face: usize) -> [u32; 3] {
        let i = face * 3;
        [self.indices[i], self.indices[i + 1], self.indices[i + 2]]
    }

    /// Iterate over all triangles
    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices.chunks_exact(3).map(|c| [c[0], c[1], c[2]])
    }

    /// Unnormalized face normal (cross product, length = 2 x area)
    #[inline]
    pub fn face_cross(&self, face: usize) -> Vector3<f64> {
        let [i0, i1, i2] = self.triangle(face);
        let v0 = self.position(i0 as usize);
        let v1 = self.position(i1 as usize);
        let v2 = self.position(i2 as usize);
        (v1 - v0).cross(&(v2 - v0))
    }

    /// Unit face normal, `None` for zero-area triangles
    #[inline]
    pub fn face_normal(&self, face: usize) -> Option<Vector3<f64>> {
        self.face_cross(face).try_normalize(1e-12)
    }

    /// Area of a triangle
    #[inline]
    pub fn triangle_area(&self, face: usize) -> f64 {
        self.face_cross(face).norm() * 0.5
    }

    /// Total surface area
    pub fn total_area(&self) -> f64 {
        (0..self.triangle_count()).map(|f| self.triangle_area(f)).sum()
    }

    /// Calculate bounds
    #[inline]
    pub fn bounds(&self) -> Aabb {
        let mut aabb = Aabb::empty();
        for chunk in self.positions.chunks_exact(3) {
            aabb.expand(&Point3::new(chunk[0] as f64, chunk[1] as f64, chunk[2] as f64));
        }
        aabb
    }

    /// Calculate centroid in f64 precision
    /// Returns the average of all vertex positions
    #[inline]
    pub fn centroid_f64(&self) -> Point3<f64> {
        if self.is_empty() {
            return Point3::origin();
        }

        let mut sum = Vector3::zeros();
        let count = self.positions.len() / 3;

        self.positions.chunks_exact(3).for_each(|chunk| {
            sum.x += chunk[0] as f64;
            sum.y += chunk[1] as f64;
            sum.z += chunk[2] as f64;
        });

        Point3::from(sum / count as f64)
    }

    /// Recompute smooth vertex normals from area-weighted face normals
    pub fn compute_vertex_normals(&mut self) {
        let vertex_count = self.vertex_count();
        let mut normals = vec![Vector3::<f64>::zeros(); vertex_count];

        for face in 0..self.triangle_count() {
            let cross = self.face_cross(face);
            for i in self.triangle(face) {
                normals[i as usize] += cross;
            }
        }

        self.normals.clear();
        self.normals.reserve(vertex_count * 3);
        for normal in normals {
            let n = normal.try_normalize(1e-12).unwrap_or_else(Vector3::zeros);
            self.normals.push(n.x as f32);
            self.normals.push(n.y as f32);
            self.normals.push(n.z as f32);
        }
    }

    /// Copy of this mesh with positions and normals mapped through `matrix`
    pub fn transformed(&self, matrix: &Matrix4<f64>) -> Mesh {
        let mut out = Mesh::with_capacity(self.vertex_count(), self.indices.len());
        let has_normals = self.has_normals();
        for i in 0..self.vertex_count() {
            let p = matrix.transform_point(&self.position(i));
            out.positions.extend_from_slice(&[p.x as f32, p.y as f32, p.z as f32]);
            if has_normals {
                let n = self
                    .normal(i)
                    .map(|n| transform_normal(matrix, &n))
                    .unwrap_or_else(Vector3::zeros);
                out.normals.extend_from_slice(&[n.x as f32, n.y as f32, n.z as f32]);
            }
        }
        out.indices.extend_from_slice(&self.indices);
        out
    }

    /// Clear the mesh
    #[inline]
    pub fn clear(&mut self) {
        self.positions.clear();
        self.normals.clear();
        self.indices.clear();
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_square() -> Mesh {
        let mut mesh = Mesh::new();
        mesh.add_vertex(Point3::new(0.0, 0.0, 0.0), Vector3::y());
        mesh.add_vertex(Point3::new(1.0, 0.0, 0.0), Vector3::y());
        mesh.add_vertex(Point3::new(1.0, 0.0, 1.0), Vector3::y());
        mesh.add_vertex(Point3::new(0.0, 0.0, 1.0), Vector3::y());
        mesh.add_triangle(0, 2, 1);
        mesh.add_triangle(0, 3, 2);
        mesh
    }

    #[test]
    fn test_mesh_creation() {
        let mesh = Mesh::new();
        assert!(mesh.is_empty());
        assert_eq!(mesh.vertex_count(), 0);
        assert_eq!(mesh.triangle_count(), 0);
        assert!(mesh.bounds().is_empty());
    }

    #[test]
    fn test_add_vertex() {
        let mut mesh = Mesh::new();
        mesh.add_vertex(Point3::new(1.0, 2.0, 3.0), Vector3::new(0.0, 0.0, 1.0));
        assert_eq!(mesh.vertex_count(), 1);
        assert_eq!(mesh.positions, vec![1.0, 2.0, 3.0]);
        assert_eq!(mesh.normals, vec![0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_merge_offsets_indices() {
        let mut a = unit_square();
        let b = unit_square();
        a.merge(&b);
        assert_eq!(a.vertex_count(), 8);
        assert_eq!(a.triangle_count(), 4);
        assert_eq!(a.triangle(2), [4, 6, 5]);
        assert!(a.has_normals());
    }

    #[test]
    fn test_merge_drops_partial_normals() {
        let mut a = unit_square();
        let mut b = unit_square();
        b.normals.clear();
        a.merge(&b);
        assert!(!a.has_normals());
        assert!(a.normals.is_empty());
    }

    #[test]
    fn test_area_and_normal() {
        let mesh = unit_square();
        assert_relative_eq!(mesh.total_area(), 1.0, epsilon = 1e-9);
        let n = mesh.face_normal(0).unwrap();
        assert_relative_eq!(n.y, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_degenerate_face_has_no_normal() {
        let mut mesh = Mesh::new();
        for _ in 0..3 {
            mesh.add_vertex(Point3::new(1.0, 1.0, 1.0), Vector3::y());
        }
        mesh.add_triangle(0, 1, 2);
        assert!(mesh.face_normal(0).is_none());
        assert_eq!(mesh.triangle_area(0), 0.0);
    }

    #[test]
    fn test_compute_vertex_normals() {
        let mut mesh = unit_square();
        mesh.normals.clear();
        mesh.compute_vertex_normals();
        assert!(mesh.has_normals());
        assert_relative_eq!(mesh.normal(2).unwrap().y, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_centroid_f64() {
        let mut mesh = Mesh::new();
        mesh.positions = vec![0.0, 0.0, 0.0, 10.0, 10.0, 10.0, 20.0, 20.0, 20.0];

        let centroid = mesh.centroid_f64();
        assert!((centroid.x - 10.0).abs() < 0.001);
        assert!((centroid.y - 10.0).abs() < 0.001);
        assert!((centroid.z - 10.0).abs() < 0.001);
    }

    #[test]
    fn test_transformed_rotates_normals() {
        let mesh = unit_square();
        // Quarter turn about X maps +Y to +Z
        let m = nalgebra::Rotation3::from_axis_angle(&Vector3::x_axis(), std::f64::consts::FRAC_PI_2)
            .to_homogeneous();
        let t = mesh.transformed(&m);
        let n = t.normal(0).unwrap();
        assert_relative_eq!(n.z, 1.0, epsilon = 1e-6);
        assert_eq!(t.indices, mesh.indices);
    }
}
