use wgpu::util::DeviceExt;

use crate::{
    context::Layouts,
    data_structures::{
        instance::InstanceRaw,
        model::{self, Vertex},
        skeleton::MAX_JOINTS,
        texture::Texture,
    },
};

/// Bind groups: 0 material, 1 camera, 2 light, 3 joint palette.
pub fn mk_toon_pipeline(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    layouts: &Layouts,
) -> wgpu::RenderPipeline {
    let render_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Toon Pipeline Layout"),
        bind_group_layouts: &[
            &layouts.material,
            &layouts.camera,
            &layouts.light,
            &layouts.skin,
        ],
        immediate_size: 0,
    });

    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Toon Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("toon.wgsl").into()),
    };

    super::mk_render_pipeline(
        device,
        &render_pipeline_layout,
        config.format,
        Some(wgpu::BlendState {
            alpha: wgpu::BlendComponent::REPLACE,
            color: wgpu::BlendComponent::REPLACE,
        }),
        Some(Texture::DEPTH_FORMAT),
        &[model::ModelVertex::desc(), InstanceRaw::desc()],
        shader,
    )
}

pub fn mk_skin_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some("skin_bind_group_layout"),
    })
}

/// A joint palette uniform with room for [`MAX_JOINTS`] matrices.
#[derive(Debug)]
pub struct JointPalette {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl JointPalette {
    /// A palette holding identity matrices.
    pub fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, label: &str) -> Self {
        let identity: [[f32; 4]; 4] = cgmath::Matrix4::from_scale(1.0).into();
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&[identity; MAX_JOINTS]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some(label),
        });
        Self { buffer, bind_group }
    }

    /// Upload `joints`, truncated to [`MAX_JOINTS`].
    pub fn write(&self, queue: &wgpu::Queue, joints: &[cgmath::Matrix4<f32>]) {
        let raw: Vec<[[f32; 4]; 4]> = joints
            .iter()
            .take(MAX_JOINTS)
            .map(|m| (*m).into())
            .collect();
        if !raw.is_empty() {
            queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&raw));
        }
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}
