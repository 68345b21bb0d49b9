//! Procedural UV sphere.
//!
//! Rows run from the north pole (`v = 0`) to the south pole (`v = 1`), columns
//! wrap once around the Y axis with the seam column duplicated so the texture
//! does not smear across it. Pole rows are degenerate and emit one triangle per
//! quad instead of two.

use std::f32::consts::{PI, TAU};

use crate::buffer::VertexPositionNormalUv;

/// CPU-side sphere geometry.
#[derive(Clone, Debug, Default)]
pub struct SphereMesh {
    pub vertices: Vec<VertexPositionNormalUv>,
    pub indices: Vec<u32>,
}

impl SphereMesh {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Build a sphere of `radius` with the given tessellation.
///
/// Segment counts below 3 (width) and 2 (height) are raised to those minimums.
pub fn generate_uv_sphere(radius: f32, width_segments: u32, height_segments: u32) -> SphereMesh {
    let width_segments = width_segments.max(3);
    let height_segments = height_segments.max(2);

    let columns = (width_segments + 1) as usize;
    let rows = (height_segments + 1) as usize;
    let mut vertices = Vec::with_capacity(columns * rows);

    for iy in 0..=height_segments {
        let v = iy as f32 / height_segments as f32;
        let theta = v * PI;

        // Centre the pole texel under the fan it belongs to.
        let u_offset = if iy == 0 {
            0.5 / width_segments as f32
        } else if iy == height_segments {
            -0.5 / width_segments as f32
        } else {
            0.0
        };

        for ix in 0..=width_segments {
            let u = ix as f32 / width_segments as f32;
            let phi = u * TAU;

            let normal = [
                -phi.cos() * theta.sin(),
                theta.cos(),
                phi.sin() * theta.sin(),
            ];
            vertices.push(VertexPositionNormalUv {
                position: normal.map(|c| c * radius),
                normal,
                uv: [u + u_offset, v],
            });
        }
    }

    let index = |ix: u32, iy: u32| iy * (width_segments + 1) + ix;
    let mut indices = Vec::with_capacity((width_segments * (height_segments - 1) * 6) as usize);

    for iy in 0..height_segments {
        for ix in 0..width_segments {
            let a = index(ix + 1, iy);
            let b = index(ix, iy);
            let c = index(ix, iy + 1);
            let d = index(ix + 1, iy + 1);

            if iy != 0 {
                indices.extend_from_slice(&[a, b, d]);
            }
            if iy != height_segments - 1 {
                indices.extend_from_slice(&[b, c, d]);
            }
        }
    }

    SphereMesh { vertices, indices }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_vertex_and_index_counts_for_body_tessellation() {
        let mesh = generate_uv_sphere(1.5, 30, 32);
        assert_eq!(mesh.vertices.len(), 31 * 33);
        // Two pole rows of single triangles, the rest full quads.
        assert_eq!(mesh.indices.len(), 30 * 30 * 6 + 2 * 30 * 3);
        assert_eq!(mesh.triangle_count(), 1860);
    }

    #[test]
    fn test_all_vertices_lie_on_sphere() {
        let mesh = generate_uv_sphere(1.5, 16, 12);
        for vertex in &mesh.vertices {
            let len = Vec3::from(vertex.position).length();
            assert!((len - 1.5).abs() < 1e-5, "vertex at distance {len}");
            let n = Vec3::from(vertex.normal).length();
            assert!((n - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_poles_and_uv_orientation() {
        let mesh = generate_uv_sphere(2.0, 8, 4);
        let north = mesh.vertices[0];
        let south = mesh.vertices[mesh.vertices.len() - 1];
        assert!((north.position[1] - 2.0).abs() < 1e-5);
        assert!((south.position[1] + 2.0).abs() < 1e-5);
        assert_eq!(north.uv[1], 0.0);
        assert_eq!(south.uv[1], 1.0);
        assert!((north.uv[0] - 0.5 / 8.0).abs() < 1e-6);
    }

    #[test]
    fn test_seam_column_is_duplicated() {
        let mesh = generate_uv_sphere(1.0, 8, 4);
        // Middle row: first and last column share a position but not a u.
        let row = 2 * 9;
        let first = mesh.vertices[row];
        let last = mesh.vertices[row + 8];
        assert!((Vec3::from(first.position) - Vec3::from(last.position)).length() < 1e-5);
        assert_eq!(first.uv[0], 0.0);
        assert_eq!(last.uv[0], 1.0);
    }

    #[test]
    fn test_triangles_face_outward() {
        let mesh = generate_uv_sphere(1.0, 12, 8);
        for tri in mesh.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| Vec3::from(mesh.vertices[i as usize].position));
            let face_normal = (b - a).cross(c - a);
            let centroid = (a + b + c) / 3.0;
            assert!(face_normal.dot(centroid) > 0.0, "inward-facing triangle {tri:?}");
        }
    }

    #[test]
    fn test_indices_in_range() {
        let mesh = generate_uv_sphere(1.0, 3, 2);
        let max = mesh.vertices.len() as u32;
        assert!(mesh.indices.iter().all(|&i| i < max));
    }

    #[test]
    fn test_degenerate_segments_are_clamped() {
        let mesh = generate_uv_sphere(1.0, 0, 0);
        assert_eq!(mesh.vertices.len(), 4 * 3);
        assert!(!mesh.indices.is_empty());
    }
}
