//! Orbit camera.
//!
//! The camera looks at a target point and orbits it on a sphere. Input is
//! accumulated by [`OrbitController`] and eased in every frame with a damping
//! factor, so drags keep gliding for a moment after the mouse stops.

use std::f32::consts::PI;

use cgmath::{EuclideanSpace, InnerSpace, Matrix4, Point3, Rad, Vector2, Vector3};
use wgpu::util::DeviceExt;
use winit::{
    dpi::PhysicalPosition,
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Keeps the camera off the poles, where the orbit would flip.
const POLE_EPSILON: f32 = 1e-4;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
}

impl Camera {
    pub fn new<P: Into<Point3<f32>>>(position: P, target: P) -> Self {
        Self {
            position: position.into(),
            target: target.into(),
        }
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position, self.target, Vector3::unit_y())
    }

    pub fn distance(&self) -> f32 {
        (self.position - self.target).magnitude()
    }
}

/// Polar coordinates of a camera offset: `theta` around +Y starting at +Z,
/// `phi` down from +Y.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Spherical {
    pub radius: f32,
    pub theta: f32,
    pub phi: f32,
}

impl Spherical {
    pub fn from_offset(offset: Vector3<f32>) -> Self {
        let radius = offset.magnitude();
        if radius <= f32::EPSILON {
            return Self {
                radius: 0.0,
                theta: 0.0,
                phi: 0.0,
            };
        }
        Self {
            radius,
            theta: offset.x.atan2(offset.z),
            phi: (offset.y / radius).clamp(-1.0, 1.0).acos(),
        }
    }

    pub fn to_offset(self) -> Vector3<f32> {
        let sin_phi = self.phi.sin();
        Vector3::new(
            self.radius * sin_phi * self.theta.sin(),
            self.radius * self.phi.cos(),
            self.radius * sin_phi * self.theta.cos(),
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    aspect: f32,
    height: f32,
    fovy: Rad<f32>,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width.max(1) as f32 / height.max(1) as f32,
            height: height.max(1) as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width.max(1) as f32 / height.max(1) as f32;
        self.height = height.max(1) as f32;
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * cgmath::perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }

    /// World units per screen pixel at `distance` from the camera.
    pub fn world_per_pixel(&self, distance: f32) -> f32 {
        2.0 * distance * (self.fovy.0 / 2.0).tan() / self.height
    }

    pub fn height(&self) -> f32 {
        self.height
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Drag {
    Rotate,
    Pan,
}

/// Mouse driven orbit controls: left-drag rotates, right-drag pans, the wheel
/// zooms.
#[derive(Clone, Debug)]
pub struct OrbitController {
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    /// Share of the pending motion applied per frame. Zero disables easing.
    pub damping: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Pending rotation and pan in pixels, +x right and +y down. Both are
    /// converted with the projection's viewport height in `update`.
    rotation: Vector2<f32>,
    pan: Vector2<f32>,
    scale: f32,
    drag: Option<Drag>,
    cursor: Option<PhysicalPosition<f64>>,
}

impl OrbitController {
    pub fn new(damping: f32) -> Self {
        Self {
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            damping,
            min_distance: 0.5,
            max_distance: 500.0,
            rotation: Vector2::new(0.0, 0.0),
            pan: Vector2::new(0.0, 0.0),
            scale: 1.0,
            drag: None,
            cursor: None,
        }
    }

    /// Returns whether the event moved the camera.
    pub fn handle_window_events(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::MouseInput { state, button, .. } => {
                self.drag = match (state, button) {
                    (ElementState::Pressed, MouseButton::Left) => Some(Drag::Rotate),
                    (ElementState::Pressed, MouseButton::Right) => Some(Drag::Pan),
                    (ElementState::Released, _) => None,
                    _ => self.drag,
                };
                false
            }
            WindowEvent::CursorMoved { position, .. } => {
                let previous = self.cursor.replace(*position);
                match (self.drag, previous) {
                    (Some(drag), Some(previous)) => {
                        let dx = (position.x - previous.x) as f32;
                        let dy = (position.y - previous.y) as f32;
                        match drag {
                            Drag::Rotate => self.rotate(dx, dy),
                            Drag::Pan => self.pan(dx, dy),
                        }
                        true
                    }
                    _ => false,
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let steps = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(p) => (p.y / 50.0) as f32,
                };
                self.zoom(steps);
                steps != 0.0
            }
            _ => false,
        }
    }

    /// Queue a rotation for a drag of `dx`, `dy` pixels. A drag across the full
    /// viewport height turns the camera once around.
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.rotation += Vector2::new(dx, dy) * self.rotate_speed;
    }

    pub fn pan(&mut self, dx: f32, dy: f32) {
        self.pan += Vector2::new(dx, dy) * self.pan_speed;
    }

    /// Positive steps move closer.
    pub fn zoom(&mut self, steps: f32) {
        self.scale *= 0.95f32.powf(self.zoom_speed * steps);
    }

    pub fn update(&mut self, camera: &mut Camera, projection: &Projection) {
        let ease = if self.damping > 0.0 { self.damping } else { 1.0 };
        let offset = camera.position - camera.target;
        let mut spherical = Spherical::from_offset(offset);

        let per_pixel = 2.0 * PI / projection.height();
        spherical.theta -= self.rotation.x * per_pixel * ease;
        spherical.phi = (spherical.phi - self.rotation.y * per_pixel * ease)
            .clamp(POLE_EPSILON, PI - POLE_EPSILON);
        spherical.radius = (spherical.radius * self.scale).clamp(self.min_distance, self.max_distance);

        if self.pan != Vector2::new(0.0, 0.0) {
            let forward = (-offset).normalize();
            let right = forward.cross(Vector3::unit_y()).normalize();
            let up = right.cross(forward);
            let world = projection.world_per_pixel(offset.magnitude()) * ease;
            camera.target += (up * self.pan.y - right * self.pan.x) * world;
        }
        camera.position = camera.target + spherical.to_offset();

        let keep = 1.0 - ease;
        self.rotation *= keep;
        self.pan *= keep;
        self.scale = 1.0;
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        use cgmath::SquareMatrix;
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera, projection: &Projection) {
        self.view_position = camera.position.to_homogeneous().into();
        self.view_proj = (projection.calc_matrix() * camera.calc_matrix()).into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct CameraResources {
    pub camera: Camera,
    pub controller: OrbitController,
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

impl CameraResources {
    pub fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        camera: Camera,
        controller: OrbitController,
        projection: &Projection,
    ) -> Self {
        let mut uniform = CameraUniform::new();
        uniform.update_view_proj(&camera, projection);

        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });
        Self {
            camera,
            controller,
            uniform,
            buffer,
            bind_group,
        }
    }

    /// Apply pending input and upload the new view.
    pub fn update(&mut self, queue: &wgpu::Queue, projection: &Projection) {
        self.controller.update(&mut self.camera, projection);
        self.uniform.update_view_proj(&self.camera, projection);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
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
        label: Some("camera_bind_group_layout"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Camera, Projection) {
        (
            Camera::new([0.0, 0.0, 12.0], [0.0, 0.0, 0.0]),
            Projection::new(800, 600, cgmath::Deg(50.0), 0.1, 1000.0),
        )
    }

    fn close(a: Point3<f32>, b: Point3<f32>) -> bool {
        (a - b).magnitude() < 1e-4
    }

    #[test]
    fn spherical_round_trips() {
        let offset = Vector3::new(1.0, 2.0, 3.0);
        let back = Spherical::from_offset(offset).to_offset();
        assert!((back - offset).magnitude() < 1e-5);
    }

    #[test]
    fn idle_controller_keeps_the_camera() {
        let (mut camera, projection) = setup();
        let mut controller = OrbitController::new(0.05);
        controller.update(&mut camera, &projection);
        assert!(close(camera.position, Point3::new(0.0, 0.0, 12.0)));
    }

    #[test]
    fn rotation_keeps_the_distance_and_eases_in() {
        let (mut camera, projection) = setup();
        let mut controller = OrbitController::new(0.05);
        controller.rotate(-100.0, 0.0);
        controller.update(&mut camera, &projection);
        assert!((camera.distance() - 12.0).abs() < 1e-4);
        let first = camera.position.x;
        assert!(first > 0.0);
        controller.update(&mut camera, &projection);
        // the second frame applies what is left of the drag
        assert!(camera.position.x > first);
        assert!(camera.position.x - first < first);
    }

    #[test]
    fn without_damping_input_applies_at_once() {
        let (mut camera, projection) = setup();
        let mut controller = OrbitController::new(0.0);
        // a full viewport height of horizontal drag is one turn
        controller.rotate(projection.height() / 4.0, 0.0);
        controller.update(&mut camera, &projection);
        assert!(close(camera.position, Point3::new(-12.0, 0.0, 0.0)));
    }

    #[test]
    fn rotation_scales_with_the_projection_not_window_events() {
        let (mut camera, projection) = setup();
        let mut controller = OrbitController::new(0.0);
        // no Resized event reached the controller
        controller.rotate(0.1, 0.0);
        controller.update(&mut camera, &projection);
        let theta = Spherical::from_offset(camera.position - camera.target).theta;
        let expected = -2.0 * PI * 0.1 / 600.0;
        assert!((theta - expected).abs() < 1e-5, "theta {theta}");
    }

    #[test]
    fn zoom_moves_closer_within_bounds() {
        let (mut camera, projection) = setup();
        let mut controller = OrbitController::new(0.05);
        controller.zoom(1.0);
        controller.update(&mut camera, &projection);
        assert!((camera.distance() - 11.4).abs() < 1e-4);

        controller.zoom(1000.0);
        controller.update(&mut camera, &projection);
        assert_eq!(camera.distance(), controller.min_distance);
    }

    #[test]
    fn pitch_stops_at_the_pole() {
        let (mut camera, projection) = setup();
        let mut controller = OrbitController::new(0.0);
        controller.rotate(0.0, 1e6);
        controller.update(&mut camera, &projection);
        assert!(camera.position.y > 11.99);
        assert!(camera.position.y.is_finite());
    }

    #[test]
    fn pan_moves_target_and_camera_together() {
        let (mut camera, projection) = setup();
        let mut controller = OrbitController::new(0.0);
        controller.pan(10.0, 0.0);
        controller.update(&mut camera, &projection);
        assert!(camera.target.x < 0.0);
        assert!((camera.position.x - camera.target.x).abs() < 1e-4);
        assert!((camera.distance() - 12.0).abs() < 1e-3);
    }

    #[test]
    fn uniform_carries_the_eye_position() {
        let (camera, projection) = setup();
        let mut uniform = CameraUniform::new();
        uniform.update_view_proj(&camera, &projection);
        assert_eq!(uniform.view_position, [0.0, 0.0, 12.0, 1.0]);
    }
}
