#![cfg(feature = "integration-tests")]

use toon_viewer::{
    Color, RampStop, ToonMaterial,
    config::ViewerConfig,
    context::{InitContext, Layouts},
    data_structures::texture::Texture,
};

fn headless() -> Option<InitContext> {
    futures::executor::block_on(async {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok()?;
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor::default())
            .await
            .ok()?;
        let layouts = Layouts::new(&device);
        let white = Texture::create_white(&device, &queue);
        Some(InitContext {
            device,
            queue,
            layouts,
            white,
            settings: ViewerConfig::default(),
        })
    })
}

#[test]
fn replacing_the_ramp_releases_the_previous_texture() {
    let Some(ctx) = headless() else {
        eprintln!("no adapter, skipping");
        return;
    };
    let split = [
        RampStop::new(0.0, Color::BLACK),
        RampStop::new(0.5, Color::WHITE),
    ];
    let mut material = ToonMaterial::ramp(&ctx, &split).unwrap();
    assert_eq!(material.ramp_texels().texel(127), [0, 0, 0, 255]);
    assert_eq!(material.ramp_texels().texel(128), [255, 255, 255, 255]);
    let first = material.ramp_texture().texture().clone();
    assert!(!first.is_destroyed());

    let red = [RampStop::new(0.0, Color::from_hex(0xa82e2e))];
    material.set_ramp_stops(&ctx, &red).unwrap();
    assert!(first.is_destroyed());
    assert!(!material.ramp_texture().texture().is_destroyed());
    assert_eq!(material.ramp_stops(), &red);
    let packed = Color::from_hex(0xa82e2e).to_rgba8();
    assert!((0..256).all(|i| material.ramp_texels().texel(i) == packed));

    let second = material.ramp_texture().texture().clone();
    material.set_ramp_stops(&ctx, &split).unwrap();
    assert!(second.is_destroyed());
    assert_eq!(material.ramp_texels().texel(128), [255, 255, 255, 255]);
}

#[test]
fn invalid_stops_keep_the_current_ramp() {
    let Some(ctx) = headless() else {
        eprintln!("no adapter, skipping");
        return;
    };
    let mut material = ToonMaterial::ramp(&ctx, &[RampStop::new(0.0, Color::WHITE)]).unwrap();
    let current = material.ramp_texture().texture().clone();
    assert!(material.set_ramp_stops(&ctx, &[]).is_err());
    assert!(!current.is_destroyed());
    assert_eq!(material.ramp_texels().texel(0), [255, 255, 255, 255]);
}
