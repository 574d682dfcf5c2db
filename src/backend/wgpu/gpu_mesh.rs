//! Scene primitives uploaded to GPU buffers.

use std::collections::HashSet;

use wgpu::util::DeviceExt;

use super::vertex::Vertex;
use crate::core::scene::{MaterialId, Primitive};

/// Vertex, triangle index and edge index buffers for one primitive.
pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
    pub edge_buffer: wgpu::Buffer,
    pub edge_count: u32,
    pub material: MaterialId,
}

impl GpuMesh {
    /// Upload a primitive. Returns `None` for primitives with nothing to draw.
    pub fn upload(device: &wgpu::Device, primitive: &Primitive, label: &str) -> Option<Self> {
        if primitive.positions.is_empty() || primitive.indices.len() < 3 {
            return None;
        }

        let vertices: Vec<Vertex> = primitive
            .positions
            .iter()
            .zip(primitive.normals.iter())
            .map(|(p, n)| Vertex {
                position: p.to_array(),
                normal: n.to_array(),
            })
            .collect();
        let edges = wireframe_indices(&primitive.indices);

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(format!("{} vertices", label).as_str()),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(format!("{} indices", label).as_str()),
            contents: bytemuck::cast_slice(&primitive.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let edge_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(format!("{} edges", label).as_str()),
            contents: bytemuck::cast_slice(&edges),
            usage: wgpu::BufferUsages::INDEX,
        });

        Some(Self {
            vertex_buffer,
            index_buffer,
            index_count: primitive.indices.len() as u32,
            edge_buffer,
            edge_count: edges.len() as u32,
            material: primitive.material,
        })
    }
}

/// Line list indices covering every unique triangle edge once.
pub fn wireframe_indices(indices: &[u32]) -> Vec<u32> {
    let mut seen = HashSet::new();
    let mut edges = Vec::with_capacity(indices.len() * 2);
    for tri in indices.chunks_exact(3) {
        for (a, b) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
            if seen.insert((a.min(b), a.max(b))) {
                edges.push(a);
                edges.push(b);
            }
        }
    }
    edges
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_triangle_edges() {
        assert_eq!(wireframe_indices(&[0, 1, 2]), vec![0, 1, 1, 2, 2, 0]);
    }

    #[test]
    fn test_shared_edge_emitted_once() {
        // Quad from two triangles sharing 0-2.
        let edges = wireframe_indices(&[0, 1, 2, 0, 2, 3]);
        assert_eq!(edges.len(), 10);
        assert_eq!(edges, vec![0, 1, 1, 2, 2, 0, 2, 3, 3, 0]);
    }

    #[test]
    fn test_trailing_indices_ignored() {
        assert_eq!(wireframe_indices(&[0, 1, 2, 3]).len(), 6);
        assert!(wireframe_indices(&[]).is_empty());
    }
}
