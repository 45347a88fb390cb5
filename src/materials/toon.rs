//! The material every toon draw binds at group 0.
//!
//! A material owns its colour map, its baked ramp and a small uniform with the
//! base colour, variant and tone mapping flag. Ramps are per material, so two
//! parts can be banded differently.

use wgpu::util::DeviceExt;

use crate::{
    context::InitContext,
    data_structures::texture::Texture,
    error::ViewerError,
    materials::{
        MaterialVariant,
        color::Color,
        ramp::{Ramp, RampStop, RampTexels},
    },
};

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    base_color: [f32; 4],
    variant: u32,
    tone_mapped: u32,
    // Uniforms are laid out in 16 byte blocks
    _padding: [u32; 2],
}

impl MaterialUniform {
    pub fn new(variant: MaterialVariant, base_color: Color, tone_mapped: bool) -> Self {
        Self {
            base_color: base_color.to_rgba(),
            variant: variant as u32,
            tone_mapped: tone_mapped as u32,
            _padding: [0; 2],
        }
    }
}

/// A baked ramp together with its GPU upload.
#[derive(Debug)]
pub struct RampTexture {
    ramp: Ramp,
    texels: RampTexels,
    texture: Texture,
}

impl RampTexture {
    pub fn new(ctx: &InitContext, stops: &[RampStop]) -> Result<Self, ViewerError> {
        let ramp = Ramp::new(stops)?;
        let texels = ramp.texels();
        let texture = Texture::from_ramp(&ctx.device, &ctx.queue, &texels, "ramp texture");
        Ok(Self {
            ramp,
            texels,
            texture,
        })
    }

    pub fn ramp(&self) -> &Ramp {
        &self.ramp
    }

    pub fn texels(&self) -> &RampTexels {
        &self.texels
    }

    pub fn texture(&self) -> &Texture {
        &self.texture
    }

    /// Destroy the GPU texture. Bind groups still referencing it become invalid.
    pub fn release(self) {
        self.texture.destroy();
    }
}

#[derive(Debug)]
pub struct ToonMaterial {
    variant: MaterialVariant,
    base_color: Color,
    tone_mapped: bool,
    map: Option<Texture>,
    ramp: RampTexture,
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl ToonMaterial {
    pub fn new(
        ctx: &InitContext,
        variant: MaterialVariant,
        stops: &[RampStop],
        map: Option<Texture>,
        base_color: Color,
        tone_mapped: bool,
    ) -> Result<Self, ViewerError> {
        let ramp = RampTexture::new(ctx, stops)?;
        let uniform = MaterialUniform::new(variant, base_color, tone_mapped);
        let buffer = ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Material Buffer"),
                contents: bytemuck::cast_slice(&[uniform]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
        let bind_group = mk_bind_group(ctx, map.as_ref(), &ramp, &buffer);
        Ok(Self {
            variant,
            base_color,
            tone_mapped,
            map,
            ramp,
            buffer,
            bind_group,
        })
    }

    /// White, untextured and tone mapped ramp material.
    pub fn ramp(ctx: &InitContext, stops: &[RampStop]) -> Result<Self, ViewerError> {
        Self::new(ctx, MaterialVariant::Ramp, stops, None, Color::WHITE, true)
    }

    /// Rebake the ramp and drop the previous texture.
    pub fn set_ramp_stops(
        &mut self,
        ctx: &InitContext,
        stops: &[RampStop],
    ) -> Result<(), ViewerError> {
        let ramp = RampTexture::new(ctx, stops)?;
        self.bind_group = mk_bind_group(ctx, self.map.as_ref(), &ramp, &self.buffer);
        std::mem::replace(&mut self.ramp, ramp).release();
        Ok(())
    }

    pub fn set_map(&mut self, ctx: &InitContext, map: Option<Texture>) {
        self.map = map;
        self.bind_group = mk_bind_group(ctx, self.map.as_ref(), &self.ramp, &self.buffer);
    }

    pub fn set_base_color(&mut self, queue: &wgpu::Queue, base_color: Color) {
        self.base_color = base_color;
        self.write_uniform(queue);
    }

    pub fn set_tone_mapped(&mut self, queue: &wgpu::Queue, tone_mapped: bool) {
        self.tone_mapped = tone_mapped;
        self.write_uniform(queue);
    }

    pub fn variant(&self) -> MaterialVariant {
        self.variant
    }

    pub fn base_color(&self) -> Color {
        self.base_color
    }

    pub fn tone_mapped(&self) -> bool {
        self.tone_mapped
    }

    pub fn has_map(&self) -> bool {
        self.map.is_some()
    }

    pub fn ramp_texels(&self) -> &RampTexels {
        self.ramp.texels()
    }

    pub fn ramp_stops(&self) -> &[RampStop] {
        self.ramp.ramp().stops()
    }

    pub fn ramp_texture(&self) -> &RampTexture {
        &self.ramp
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    pub fn uniform(&self) -> MaterialUniform {
        MaterialUniform::new(self.variant, self.base_color, self.tone_mapped)
    }

    fn write_uniform(&self, queue: &wgpu::Queue) {
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform()]));
    }
}

fn mk_bind_group(
    ctx: &InitContext,
    map: Option<&Texture>,
    ramp: &RampTexture,
    buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    // Unmapped materials sample a white texel
    let map = map.unwrap_or(&ctx.white);
    ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout: &ctx.layouts.material,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&map.view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(&map.sampler),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::TextureView(&ramp.texture.view),
            },
            wgpu::BindGroupEntry {
                binding: 3,
                resource: wgpu::BindingResource::Sampler(&ramp.texture.sampler),
            },
            wgpu::BindGroupEntry {
                binding: 4,
                resource: buffer.as_entire_binding(),
            },
        ],
        label: Some("material_bind_group"),
    })
}

/// Layout of [`ToonMaterial`]'s bind group.
pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 3,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 4,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
        ],
        label: Some("material_bind_group_layout"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_is_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<MaterialUniform>() % 16, 0);
    }

    #[test]
    fn uniform_carries_linear_colour_and_flags() {
        let uniform = MaterialUniform::new(MaterialVariant::Ramp, Color::from_hex(0x808080), false);
        assert_eq!(uniform.variant, 2);
        assert_eq!(uniform.tone_mapped, 0);
        assert!((uniform.base_color[0] - 0.2158605).abs() < 1e-4);
        assert_eq!(uniform.base_color[3], 1.0);
    }
}
