//! Toon materials.
//!
//! - `color`: sRGB hex parsing and linear conversion
//! - `ramp`: stop lists baked into 256-texel step gradients
//! - `shading`: CPU reference of the fragment stage
//! - `toon`: the GPU material bound by the toon pipeline

use serde::Deserialize;

pub mod color;
pub mod ramp;
pub mod shading;
pub mod toon;

pub use color::Color;
pub use ramp::{Ramp, RampStop, RampTexels};
pub use toon::ToonMaterial;

/// Which lighting path the fragment shader takes.
///
/// The discriminant is written to the material uniform as-is.
#[repr(u32)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterialVariant {
    /// Unlit, outputs the diffuse colour.
    Basic = 0,
    /// Two-tone lit diffuse.
    #[default]
    Toon = 1,
    /// Lit diffuse remapped through the colour ramp.
    Ramp = 2,
}
