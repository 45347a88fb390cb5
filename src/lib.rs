//! toon-viewer
//!
//! An interactive viewer for a skinned glTF character drawn with a toon
//! material: lighting is quantized into bands through a colour ramp generated
//! from a handful of stops, and the ramp, light and character transform can be
//! tuned while the scene runs. Runs natively and on the web.
//!
//! High-level modules
//! - `materials`: colour ramp generator, CPU shading reference and the GPU toon material
//! - `character`: typed part lookup, the appearance table and the animated character
//! - `animation`: keyframe tracks, clip sampling and the mixer
//! - `resources`: asset IO and glTF parsing
//! - `camera`: orbit camera, controller and uniforms for view/projection
//! - `context`: central GPU and window context that owns device/queue/pipeline
//! - `flow`: flow control and the winit event loop
//! - `controls`: keyboard parameter panel
//! - `scene`: the viewer flow wiring it all together
//!

pub mod animation;
pub mod camera;
pub mod character;
pub mod config;
pub mod context;
pub mod controls;
pub mod data_structures;
pub mod error;
pub mod flow;
pub mod materials;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod scene;

pub use error::ViewerError;
pub use materials::{Color, Ramp, RampStop, RampTexels, ToonMaterial};

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn run_web() -> Result<(), wasm_bindgen::JsValue> {
    flow::run(vec![scene::ViewerFlow::constructor()])
        .map_err(|e| wasm_bindgen::JsValue::from_str(&format!("{e:#}")))
}
