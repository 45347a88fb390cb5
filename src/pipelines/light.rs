use cgmath::InnerSpace;
use wgpu::util::DeviceExt;

use crate::materials::color::Color;

/// A directional light shining from `position` towards the origin.
#[derive(Debug)]
pub struct LightResources {
    pub position: [f32; 3],
    pub uniform: LightUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    /// Unit vector pointing at the light.
    pub direction: [f32; 3],
    pub intensity: f32,
    pub color: [f32; 3],
    // Due to uniforms requiring 16 byte (4 float) spacing, we need to use a padding field here
    _padding: u32,
}

impl LightUniform {
    pub fn new(position: [f32; 3], color: Color, intensity: f32) -> Self {
        Self {
            direction: direction_from(position),
            intensity,
            color: [color.r, color.g, color.b],
            _padding: 0,
        }
    }
}

/// Direction from the origin to `position`. A light at the origin points down +Z.
pub fn direction_from(position: [f32; 3]) -> [f32; 3] {
    let v = cgmath::Vector3::from(position);
    if v.magnitude2() <= f32::EPSILON {
        return [0.0, 0.0, 1.0];
    }
    v.normalize().into()
}

impl LightResources {
    pub fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        position: [f32; 3],
        color: Color,
        intensity: f32,
    ) -> Self {
        let uniform = LightUniform::new(position, color, intensity);
        let buffer = mk_buffer(device, uniform);
        let bind_group = mk_bind_group(device, layout, &buffer);
        Self {
            position,
            uniform,
            buffer,
            bind_group,
        }
    }

    pub fn set_position(&mut self, position: [f32; 3]) {
        self.position = position;
        self.uniform.direction = direction_from(position);
    }

    pub fn set_intensity(&mut self, intensity: f32) {
        self.uniform.intensity = intensity;
    }

    pub fn update(&self, queue: &wgpu::Queue) {
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}

pub fn mk_buffer(device: &wgpu::Device, light_uniform: LightUniform) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Light Buffer"),
        contents: bytemuck::cast_slice(&[light_uniform]),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}

pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some("light_bind_group_layout"),
    })
}

pub fn mk_bind_group(
    device: &wgpu::Device,
    bind_group_layout: &wgpu::BindGroupLayout,
    light_buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout: bind_group_layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: light_buffer.as_entire_binding(),
        }],
        label: Some("light_bind_group"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_matches_the_shader_layout() {
        assert_eq!(std::mem::size_of::<LightUniform>(), 32);
    }

    #[test]
    fn direction_points_at_the_light() {
        let [x, y, z] = direction_from([0.0, 0.0, 2.0]);
        assert_eq!((x, y, z), (0.0, 0.0, 1.0));
        let d = direction_from([-0.16, -0.05, 1.44]);
        let len = (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt();
        assert!((len - 1.0).abs() < 1e-6);
        assert!(d[0] < 0.0 && d[2] > 0.9);
    }

    #[test]
    fn light_at_origin_still_has_a_direction() {
        assert_eq!(direction_from([0.0; 3]), [0.0, 0.0, 1.0]);
    }
}
