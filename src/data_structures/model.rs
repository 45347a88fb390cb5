//! Mesh data for the toon pipeline.
//!
//! [`Primitive`] is the CPU side of one glTF primitive as the loader produced
//! it; [`Mesh`] is its GPU upload. [`DrawToon`] records a draw into a render
//! pass.

use std::ops::Range;

use wgpu::util::DeviceExt;

use crate::render::Draw;

pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

/// A skinned vertex. Unskinned geometry uses joint 0 with full weight.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
    pub normal: [f32; 3],
    pub joints: [u32; 4],
    pub weights: [f32; 4],
}

impl ModelVertex {
    pub const RIGID_JOINTS: [u32; 4] = [0; 4];
    pub const RIGID_WEIGHTS: [f32; 4] = [1.0, 0.0, 0.0, 0.0];

    /// A vertex bound rigidly to the first palette entry.
    pub fn rigid(position: [f32; 3], tex_coords: [f32; 2], normal: [f32; 3]) -> Self {
        Self {
            position,
            tex_coords,
            normal,
            joints: Self::RIGID_JOINTS,
            weights: Self::RIGID_WEIGHTS,
        }
    }
}

impl Vertex for ModelVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 5]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 8]>() as wgpu::BufferAddress,
                    shader_location: 3,
                    format: wgpu::VertexFormat::Uint32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 12]>() as wgpu::BufferAddress,
                    shader_location: 4,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// One named primitive of a loaded model.
#[derive(Clone, Debug, PartialEq)]
pub struct Primitive {
    pub name: String,
    /// Node the primitive hangs off.
    pub node: usize,
    /// Skin of that node, if any.
    pub skin: Option<usize>,
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
}

#[derive(Debug)]
pub struct Mesh {
    pub name: String,
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_elements: u32,
}

impl Mesh {
    pub fn new(
        device: &wgpu::Device,
        name: &str,
        vertices: &[ModelVertex],
        indices: &[u32],
    ) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Vertex Buffer", name)),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Index Buffer", name)),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            name: name.to_string(),
            vertex_buffer,
            index_buffer,
            num_elements: indices.len() as u32,
        }
    }

    pub fn from_primitive(device: &wgpu::Device, primitive: &Primitive) -> Self {
        Self::new(device, &primitive.name, &primitive.vertices, &primitive.indices)
    }

    /// An upright `width` x `height` quad in the XY plane facing +Z.
    pub fn quad(device: &wgpu::Device, name: &str, width: f32, height: f32) -> Self {
        let (x, y) = (width / 2.0, height / 2.0);
        let normal = [0.0, 0.0, 1.0];
        let vertices = [
            ModelVertex::rigid([-x, -y, 0.0], [0.0, 1.0], normal),
            ModelVertex::rigid([x, -y, 0.0], [1.0, 1.0], normal),
            ModelVertex::rigid([x, y, 0.0], [1.0, 0.0], normal),
            ModelVertex::rigid([-x, y, 0.0], [0.0, 0.0], normal),
        ];
        Self::new(device, name, &vertices, &[0, 1, 2, 0, 2, 3])
    }
}

pub trait DrawToon {
    fn draw_toon(&mut self, draw: &Draw<'_>);
    fn draw_mesh_instanced(&mut self, mesh: &Mesh, instances: Range<u32>);
}

/// Expects the toon pipeline with camera (group 1) and light (group 2) bound.
impl DrawToon for wgpu::RenderPass<'_> {
    fn draw_toon(&mut self, draw: &Draw<'_>) {
        self.set_bind_group(0, draw.material.bind_group(), &[]);
        self.set_bind_group(3, draw.skin, &[]);
        self.set_vertex_buffer(1, draw.instance.slice(..));
        self.draw_mesh_instanced(draw.mesh, 0..draw.amount);
    }

    fn draw_mesh_instanced(&mut self, mesh: &Mesh, instances: Range<u32>) {
        self.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        self.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.draw_indexed(0..mesh.num_elements, 0, instances);
    }
}
