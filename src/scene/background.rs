//! The flat backdrop standing behind the character.

use wgpu::util::DeviceExt;

use crate::{
    config::{BackgroundConfig, default_ramp},
    context::InitContext,
    data_structures::{instance::Instance, model::Mesh},
    error::ViewerError,
    materials::{MaterialVariant, ToonMaterial},
    pipelines::toon::JointPalette,
    render::{Draw, Render},
};

/// An unlit, untextured quad.
#[derive(Debug)]
pub struct Background {
    mesh: Mesh,
    material: ToonMaterial,
    palette: JointPalette,
    instance_buffer: wgpu::Buffer,
}

impl Background {
    pub fn new(ctx: &InitContext, config: &BackgroundConfig) -> Result<Self, ViewerError> {
        let mesh = Mesh::quad(&ctx.device, "background", config.width, config.height);
        // Unlit materials never sample their ramp
        let material = ToonMaterial::new(
            ctx,
            MaterialVariant::Basic,
            &default_ramp(),
            None,
            config.color,
            false,
        )?;
        let palette = JointPalette::new(&ctx.device, &ctx.layouts.skin, "background palette");
        let instance = Instance::from_euler_xyz(config.position, config.rotation, 1.0);
        let instance_buffer = ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Background Instance Buffer"),
                contents: bytemuck::cast_slice(&[instance.to_raw()]),
                usage: wgpu::BufferUsages::VERTEX,
            });
        Ok(Self {
            mesh,
            material,
            palette,
            instance_buffer,
        })
    }

    pub fn render(&self) -> Render<'_> {
        Render::Toon(Draw {
            mesh: &self.mesh,
            material: &self.material,
            skin: self.palette.bind_group(),
            instance: &self.instance_buffer,
            amount: 1,
        })
    }
}
