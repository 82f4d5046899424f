use std::future::Future;

use anyhow::bail;
use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};
use itertools::izip;

use crate::asset_pipeline::mesh_assembler::MeshDescriptor;
use crate::math::bounds::AABB;

/// Builds renderable mesh resources out of assembled descriptors.
///
/// The descriptors are moved into the call; implementations may hand them to
/// another thread or an upload queue without aliasing the caller's data.
pub trait MeshResourceFactory {
    type Mesh;

    fn create_mesh(
        &self,
        descriptors: Vec<MeshDescriptor>,
    ) -> impl Future<Output = anyhow::Result<Self::Mesh>> + Send;
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub tex_coords: Vec2,
}

#[derive(Debug)]
pub struct ModelPrimitive {
    pub index: usize,
    pub name: String,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub has_normals: bool,
    pub has_tex_coords: bool,
}

impl ModelPrimitive {
    fn from_descriptor(index: usize, descriptor: MeshDescriptor) -> Self {
        let vertex_count = descriptor.vertex_count();
        let normals = descriptor
            .normals
            .as_deref()
            .map_or_else(|| vec![Vec3::ZERO; vertex_count], <[Vec3]>::to_vec);
        let tex_coords = descriptor
            .texture_coordinates
            .as_deref()
            .map_or_else(|| vec![Vec2::ZERO; vertex_count], <[Vec2]>::to_vec);

        let vertices = izip!(descriptor.positions.iter(), normals, tex_coords)
            .map(|(position, normal, tex_coords)| Vertex {
                position: *position,
                normal,
                tex_coords,
            })
            .collect();

        let indices = match descriptor.triangle_indices() {
            Some(indices) => indices.to_vec(),
            None => Vec::new(),
        };

        ModelPrimitive {
            index,
            has_normals: descriptor.normals.is_some(),
            has_tex_coords: descriptor.texture_coordinates.is_some(),
            name: descriptor.name,
            vertices,
            indices,
        }
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    pub fn num_triangles(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Interleaved, upload-ready mesh made of one primitive per descriptor.
#[derive(Debug)]
pub struct Model {
    pub name: String,
    pub primitives: Vec<ModelPrimitive>,
    pub bounds: AABB,
}

impl Model {
    pub fn from_descriptors(descriptors: Vec<MeshDescriptor>) -> anyhow::Result<Model> {
        let Some(first) = descriptors.first() else {
            bail!("Mesh without descriptors");
        };
        let name = first.name.clone();

        let Some(bounds) = AABB::from_points(
            descriptors
                .iter()
                .flat_map(|descriptor| descriptor.positions.iter()),
        ) else {
            bail!("Mesh without vertices: {}", name);
        };

        let primitives = descriptors
            .into_iter()
            .enumerate()
            .map(|(index, descriptor)| ModelPrimitive::from_descriptor(index, descriptor))
            .collect();

        Ok(Model {
            name,
            primitives,
            bounds,
        })
    }
}

/// Keeps meshes in memory as [`Model`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct CpuMeshFactory;

impl MeshResourceFactory for CpuMeshFactory {
    type Mesh = Model;

    fn create_mesh(
        &self,
        descriptors: Vec<MeshDescriptor>,
    ) -> impl Future<Output = anyhow::Result<Model>> + Send {
        std::future::ready(Model::from_descriptors(descriptors))
    }
}
