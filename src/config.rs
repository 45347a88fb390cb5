//! Viewer settings.
//!
//! Every field has a default matching the stock scene. A `viewer.json` in the
//! asset root may override any subset of them:
//!
//! ```json
//! { "light": { "intensity": 1.5 }, "ramp": [{ "pos": 0.0, "color": "#202040" }] }
//! ```

use anyhow::Context;
use serde::Deserialize;

use crate::materials::{Color, RampStop};

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: [f32; 3],
    pub target: [f32; 3],
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub damping: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 12.0],
            target: [0.0, 0.0, 0.0],
            fov: 50.0,
            near: 0.1,
            far: 1000.0,
            damping: 0.05,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct LightConfig {
    pub position: [f32; 3],
    pub intensity: f32,
    pub color: Color,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            position: [-0.16, -0.05, 1.44],
            intensity: 1.0,
            color: Color::WHITE,
        }
    }
}

/// Root transform of the character.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct CharacterConfig {
    pub scale: f32,
    /// Euler angles in radians, applied X then Y then Z.
    pub rotation: [f32; 3],
    pub position: [f32; 3],
}

impl Default for CharacterConfig {
    fn default() -> Self {
        Self {
            scale: 11.2,
            rotation: [-0.04, 0.32, -0.06],
            position: [0.2, -4.5, 0.0],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct BackgroundConfig {
    pub enabled: bool,
    pub width: f32,
    pub height: f32,
    pub position: [f32; 3],
    pub rotation: [f32; 3],
    pub color: Color,
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            width: 7.0,
            height: 15.0,
            position: [-8.0, 0.0, 0.0],
            rotation: [0.0, 0.0, -0.08],
            color: Color::BLACK,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub title: String,
    pub character_model: String,
    pub animations: String,
    pub idle_clip: String,
    pub clear_colour: Color,
    pub camera: CameraConfig,
    pub light: LightConfig,
    pub character: CharacterConfig,
    pub ramp: Vec<RampStop>,
    pub background: BackgroundConfig,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            title: "Toon Viewer".to_string(),
            character_model: "models/character.glb".to_string(),
            animations: "models/animations.glb".to_string(),
            idle_clip: "idle".to_string(),
            clear_colour: Color::WHITE,
            camera: CameraConfig::default(),
            light: LightConfig::default(),
            character: CharacterConfig::default(),
            ramp: default_ramp(),
            background: BackgroundConfig::default(),
        }
    }
}

/// Three bands: shadow, mid tone, highlight.
pub fn default_ramp() -> Vec<RampStop> {
    vec![
        RampStop::new(0.0, Color::from_hex(0x3a3a5a)),
        RampStop::new(0.45, Color::from_hex(0x9090b8)),
        RampStop::new(0.75, Color::from_hex(0xffffff)),
    ]
}

impl ViewerConfig {
    pub const FILE_NAME: &'static str = "viewer.json";

    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        serde_json::from_str(text).context("parse viewer config json")
    }

    /// Read `viewer.json` from the asset root, falling back to the defaults
    /// when there is none. A file that exists but does not parse is an error.
    pub async fn load() -> anyhow::Result<Self> {
        match crate::resources::load_string(Self::FILE_NAME).await {
            Ok(text) => {
                let config = Self::from_json(&text)?;
                log::info!("Loaded {}", Self::FILE_NAME);
                Ok(config)
            }
            Err(e) => {
                log::info!("No {} ({e}), using defaults", Self::FILE_NAME);
                Ok(Self::default())
            }
        }
    }

    pub fn wgpu_clear_colour(&self) -> wgpu::Color {
        wgpu::Color {
            r: self.clear_colour.r as f64,
            g: self.clear_colour.g as f64,
            b: self.clear_colour.b as f64,
            a: 1.0,
        }
    }
}
