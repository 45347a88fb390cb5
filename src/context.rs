use std::sync::Arc;

use anyhow::Context as _;
use winit::window::Window;

use crate::{
    camera::{self, CameraResources, OrbitController, Projection},
    config::ViewerConfig,
    data_structures::texture,
    materials,
    pipelines::{self, light::LightResources},
};

/// Bind group layouts of the toon pipeline, in group order.
#[derive(Clone, Debug)]
pub struct Layouts {
    pub material: wgpu::BindGroupLayout,
    pub camera: wgpu::BindGroupLayout,
    pub light: wgpu::BindGroupLayout,
    pub skin: wgpu::BindGroupLayout,
}

impl Layouts {
    pub fn new(device: &wgpu::Device) -> Self {
        Self {
            material: materials::toon::mk_bind_group_layout(device),
            camera: camera::mk_bind_group_layout(device),
            light: pipelines::light::mk_bind_group_layout(device),
            skin: pipelines::toon::mk_skin_bind_group_layout(device),
        }
    }
}

#[derive(Debug)]
pub struct Context {
    pub(crate) window: Arc<Window>,
    pub(crate) depth_texture: texture::Texture,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub camera: CameraResources,
    pub projection: Projection,
    pub light: LightResources,
    pub layouts: Layouts,
    /// 1x1 white texture bound in place of a missing colour map.
    pub white: texture::Texture,
    pub toon_pipeline: wgpu::RenderPipeline,
    pub clear_colour: wgpu::Color,
    pub settings: ViewerConfig,
}

impl Context {
    pub async fn new(window: Arc<Window>, settings: ViewerConfig) -> anyhow::Result<Self> {
        let size = window.inner_size();

        log::info!("WGPU setup");
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            #[cfg(not(target_arch = "wasm32"))]
            backends: wgpu::Backends::PRIMARY,
            #[cfg(target_arch = "wasm32")]
            backends: wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("create surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no suitable graphics adapter")?;
        log::info!("Adapter: {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                // WebGL doesn't support all of wgpu's features, so if
                // we're building for the web we'll have to disable some.
                required_limits: if cfg!(target_arch = "wasm32") {
                    wgpu::Limits::downlevel_webgl2_defaults()
                } else {
                    wgpu::Limits::default()
                },
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .context("request device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        // Colours are linear throughout, the sRGB surface encodes on write.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .context("surface reports no formats")?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        let layouts = Layouts::new(&device);

        let projection = Projection::new(
            config.width,
            config.height,
            cgmath::Deg(settings.camera.fov),
            settings.camera.near,
            settings.camera.far,
        );
        let camera = CameraResources::new(
            &device,
            &layouts.camera,
            camera::Camera::new(settings.camera.position, settings.camera.target),
            OrbitController::new(settings.camera.damping),
            &projection,
        );

        let light = LightResources::new(
            &device,
            &layouts.light,
            settings.light.position,
            settings.light.color,
            settings.light.intensity,
        );

        let depth_texture = texture::Texture::create_depth_texture(
            &device,
            [config.width, config.height],
            "depth_texture",
        );
        let white = texture::Texture::create_white(&device, &queue);
        let toon_pipeline = pipelines::toon::mk_toon_pipeline(&device, &config, &layouts);
        let clear_colour = settings.wgpu_clear_colour();

        Ok(Self {
            window,
            depth_texture,
            surface,
            device,
            queue,
            config,
            camera,
            projection,
            light,
            layouts,
            white,
            toon_pipeline,
            clear_colour,
            settings,
        })
    }

    pub fn set_title(&self, title: &str) {
        self.window.set_title(title);
    }
}

/// What a flow gets to build its GPU resources with. Device, queue and layouts
/// are reference counted, so this is cheap to clone.
#[derive(Clone, Debug)]
pub struct InitContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub layouts: Layouts,
    pub white: texture::Texture,
    pub settings: ViewerConfig,
}

impl From<&Context> for InitContext {
    fn from(ctx: &Context) -> Self {
        Self {
            device: ctx.device.clone(),
            queue: ctx.queue.clone(),
            layouts: ctx.layouts.clone(),
            white: ctx.white.clone(),
            settings: ctx.settings.clone(),
        }
    }
}
