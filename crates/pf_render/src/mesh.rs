//! CPU-side triangle meshes.
//!
//! Positions and normals are kept as separate `Vec3` arrays so the bubble
//! deformation can snapshot and rewrite positions without touching the rest
//! of the vertex data. `vertices()` interleaves everything for upload.

use glam::{Vec2, Vec3};
use std::f32::consts::{PI, TAU};

use crate::vertex::MeshVertex;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Latitude/longitude sphere centred on the origin. `segments` is the
    /// ring count; the sphere gets twice as many longitude slices.
    pub fn uv_sphere(radius: f32, segments: u32) -> Self {
        let rings = segments.max(2);
        let slices = rings * 2;
        let mut mesh = Self::default();

        for ring in 0..=rings {
            let v = ring as f32 / rings as f32;
            let theta = v * PI;
            for slice in 0..=slices {
                let u = slice as f32 / slices as f32;
                let phi = u * TAU;
                let normal = Vec3::new(
                    theta.sin() * phi.cos(),
                    theta.cos(),
                    theta.sin() * phi.sin(),
                );
                mesh.positions.push(normal * radius);
                mesh.normals.push(normal);
                mesh.uvs.push(Vec2::new(u, v));
            }
        }

        let stride = slices + 1;
        for ring in 0..rings {
            for slice in 0..slices {
                let a = ring * stride + slice;
                let b = a + stride;
                mesh.indices.extend_from_slice(&[a, a + 1, b, a + 1, b + 1, b]);
            }
        }
        mesh
    }

    /// Sphere meant to be seen from inside: normals point inwards and the
    /// longitude is mirrored so an equirectangular image reads correctly.
    pub fn sky_sphere(radius: f32, segments: u32) -> Self {
        let mut mesh = Self::uv_sphere(radius, segments);
        for n in &mut mesh.normals {
            *n = -*n;
        }
        for uv in &mut mesh.uvs {
            uv.x = 1.0 - uv.x;
        }
        mesh
    }

    /// Flat rectangle in the XY plane whose front face is local -Z.
    ///
    /// The image is mapped so it reads left-to-right for a viewer standing
    /// on the -Z side.
    pub fn panel(width: f32, height: f32) -> Self {
        let (hw, hh) = (width * 0.5, height * 0.5);
        Self {
            positions: vec![
                Vec3::new(-hw, hh, 0.0),
                Vec3::new(hw, hh, 0.0),
                Vec3::new(hw, -hh, 0.0),
                Vec3::new(-hw, -hh, 0.0),
            ],
            normals: vec![Vec3::NEG_Z; 4],
            uvs: vec![
                Vec2::new(1.0, 0.0),
                Vec2::new(0.0, 0.0),
                Vec2::new(0.0, 1.0),
                Vec2::new(1.0, 1.0),
            ],
            indices: vec![0, 1, 2, 0, 2, 3],
        }
    }

    /// Horizontal rectangle at y=0 facing +Y.
    pub fn ground(width: f32, depth: f32) -> Self {
        let (hw, hd) = (width * 0.5, depth * 0.5);
        Self {
            positions: vec![
                Vec3::new(-hw, 0.0, -hd),
                Vec3::new(hw, 0.0, -hd),
                Vec3::new(hw, 0.0, hd),
                Vec3::new(-hw, 0.0, hd),
            ],
            normals: vec![Vec3::Y; 4],
            uvs: vec![
                Vec2::new(0.0, 0.0),
                Vec2::new(1.0, 0.0),
                Vec2::new(1.0, 1.0),
                Vec2::new(0.0, 1.0),
            ],
            indices: vec![0, 2, 1, 0, 3, 2],
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// True when every position has a normal, i.e. the mesh can be deformed.
    pub fn has_complete_normals(&self) -> bool {
        !self.positions.is_empty() && self.normals.len() >= self.positions.len()
    }

    /// Interleave into upload-ready vertices. Missing normals/uvs become zero.
    pub fn vertices(&self) -> Vec<MeshVertex> {
        self.positions
            .iter()
            .enumerate()
            .map(|(i, p)| MeshVertex {
                position: p.to_array(),
                normal: self.normals.get(i).copied().unwrap_or(Vec3::ZERO).to_array(),
                uv: self.uvs.get(i).copied().unwrap_or(Vec2::ZERO).to_array(),
            })
            .collect()
    }
}
