//! CPU mirror of the fragment math in `toon.wgsl`.
//!
//! The renderer never calls into this module per pixel; it exists so the
//! banding rules can be pinned down in tests and reused by tools that want to
//! preview a ramp without a GPU.

use cgmath::{ElementWise, InnerSpace, Vector3};

use crate::materials::{MaterialVariant, ramp::RampTexels};

pub const LUMA_WEIGHTS: [f32; 3] = [0.299, 0.587, 0.114];

/// Upper bound of the ramp lookup coordinate. Sampling at exactly 1.0 would
/// land on the texture edge.
pub const MAX_RAMP_COORD: f32 = 0.99;

/// `N.L` remap used by the two-tone toon gradient.
const TOON_THRESHOLD: f32 = 0.7;

pub fn luma(color: Vector3<f32>) -> f32 {
    color.dot(LUMA_WEIGHTS.into())
}

/// Where on the ramp a fragment with the given outgoing light samples.
pub fn ramp_coord(outgoing_light: Vector3<f32>) -> f32 {
    luma(outgoing_light).clamp(0.0, MAX_RAMP_COORD)
}

/// Ramp colour for `outgoing_light`, in linear space.
pub fn toon_color(outgoing_light: Vector3<f32>, ramp: &RampTexels) -> Vector3<f32> {
    let [r, g, b, _] = ramp.sample(ramp_coord(outgoing_light));
    Vector3::new(r as f32, g as f32, b as f32) / 255.0
}

/// Two-tone irradiance factor for a surface facing the light at `n_dot_l`.
pub fn toon_gradient(n_dot_l: f32) -> f32 {
    if n_dot_l * 0.5 + 0.5 < TOON_THRESHOLD {
        TOON_THRESHOLD
    } else {
        1.0
    }
}

/// Inputs of one shaded fragment.
#[derive(Clone, Copy, Debug)]
pub struct Fragment {
    pub diffuse: Vector3<f32>,
    pub alpha: f32,
    pub normal: Vector3<f32>,
    /// Direction towards the light.
    pub light_dir: Vector3<f32>,
    /// Light colour scaled by intensity.
    pub radiance: Vector3<f32>,
}

impl Fragment {
    pub fn outgoing_light(&self) -> Vector3<f32> {
        let n_dot_l = self.normal.normalize().dot(self.light_dir.normalize());
        self.diffuse
            .mul_element_wise(self.radiance * toon_gradient(n_dot_l))
    }
}

/// Shade a fragment the way the toon pipeline does, before tone mapping.
pub fn shade(variant: MaterialVariant, fragment: &Fragment, ramp: &RampTexels) -> [f32; 4] {
    let color = match variant {
        MaterialVariant::Basic => fragment.diffuse,
        MaterialVariant::Toon => fragment.outgoing_light(),
        MaterialVariant::Ramp => {
            toon_color(fragment.outgoing_light(), ramp).mul_element_wise(fragment.diffuse)
        }
    };
    [color.x, color.y, color.z, fragment.alpha]
}

/// Fitted ACES filmic curve at exposure 1.0.
pub fn aces_filmic(color: Vector3<f32>) -> Vector3<f32> {
    let input = cgmath::Matrix3::new(
        0.59719, 0.07600, 0.02840, //
        0.35458, 0.90834, 0.13383, //
        0.04823, 0.01566, 0.83777,
    );
    let output = cgmath::Matrix3::new(
        1.60475, -0.10208, -0.00327, //
        -0.53108, 1.10813, -0.07276, //
        -0.07367, -0.00605, 1.07602,
    );
    let rrt_odt_fit = |v: f32| {
        let a = v * (v + 0.0245786) - 0.000090537;
        let b = v * (0.983729 * v + 0.4329510) + 0.238081;
        a / b
    };
    let c = input * (color / 0.6);
    let c = Vector3::new(rrt_odt_fit(c.x), rrt_odt_fit(c.y), rrt_odt_fit(c.z));
    let c = output * c;
    Vector3::new(
        c.x.clamp(0.0, 1.0),
        c.y.clamp(0.0, 1.0),
        c.z.clamp(0.0, 1.0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::materials::ramp::{RampStop, generate_ramp_texels, texel_index, RAMP_WIDTH};

    fn black_white() -> RampTexels {
        generate_ramp_texels(&[
            RampStop::hex(0.0, "#000000").unwrap(),
            RampStop::hex(0.5, "#ffffff").unwrap(),
        ])
        .unwrap()
    }

    fn lit(diffuse: Vector3<f32>, n_dot_l_facing: bool) -> Fragment {
        Fragment {
            diffuse,
            alpha: 1.0,
            normal: Vector3::unit_z(),
            light_dir: if n_dot_l_facing {
                Vector3::unit_z()
            } else {
                -Vector3::unit_z()
            },
            radiance: Vector3::new(1.0, 1.0, 1.0),
        }
    }

    #[test]
    fn luma_uses_perceptual_weights() {
        assert!((luma(Vector3::new(1.0, 1.0, 1.0)) - 1.0).abs() < 1e-6);
        assert!((luma(Vector3::new(1.0, 0.0, 0.0)) - 0.299).abs() < 1e-6);
        assert!((luma(Vector3::new(0.0, 1.0, 0.0)) - 0.587).abs() < 1e-6);
    }

    #[test]
    fn full_brightness_samples_at_0_99() {
        let coord = ramp_coord(Vector3::new(1.0, 1.0, 1.0));
        assert_eq!(coord, MAX_RAMP_COORD);
        assert_eq!(texel_index(coord, RAMP_WIDTH), 253);
        assert_eq!(ramp_coord(Vector3::new(4.0, 4.0, 4.0)), MAX_RAMP_COORD);
        assert_eq!(ramp_coord(Vector3::new(-1.0, 0.0, 0.0)), 0.0);
    }

    #[test]
    fn gradient_has_two_tones() {
        assert_eq!(toon_gradient(1.0), 1.0);
        assert_eq!(toon_gradient(0.5), 1.0);
        assert_eq!(toon_gradient(0.39), 0.7);
        assert_eq!(toon_gradient(-1.0), 0.7);
    }

    #[test]
    fn ramp_variant_multiplies_band_by_diffuse() {
        let ramp = black_white();
        let bright = shade(MaterialVariant::Ramp, &lit(Vector3::new(1.0, 0.5, 0.25), true), &ramp);
        // luma of (1, .5, .25) is ~0.62 -> white band, then times diffuse
        assert_eq!(bright, [1.0, 0.5, 0.25, 1.0]);

        let dark = shade(MaterialVariant::Ramp, &lit(Vector3::new(0.2, 0.2, 0.2), false), &ramp);
        assert_eq!(dark, [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn basic_variant_ignores_light() {
        let ramp = black_white();
        let frag = lit(Vector3::new(0.3, 0.3, 0.3), false);
        assert_eq!(shade(MaterialVariant::Basic, &frag, &ramp), [0.3, 0.3, 0.3, 1.0]);
    }

    #[test]
    fn toon_variant_darkens_the_far_side() {
        let ramp = black_white();
        let far = shade(MaterialVariant::Toon, &lit(Vector3::new(1.0, 1.0, 1.0), false), &ramp);
        assert!((far[0] - 0.7).abs() < 1e-6);
    }

    #[test]
    fn aces_maps_black_to_black_and_saturates() {
        let black = aces_filmic(Vector3::new(0.0, 0.0, 0.0));
        assert!(black.x.abs() < 1e-3);
        let hot = aces_filmic(Vector3::new(100.0, 100.0, 100.0));
        assert!(hot.x > 0.99 && hot.x <= 1.0);
    }
}
