use cgmath::Vector3;
use toon_viewer::{
    RampStop, ViewerError,
    materials::{
        MaterialVariant,
        ramp::{RAMP_WIDTH, generate_ramp_texels},
        shading::{Fragment, ramp_coord, shade, toon_color},
    },
};

fn stops(raw: &[(f32, &str)]) -> Vec<RampStop> {
    raw.iter()
        .map(|(pos, hex)| RampStop::hex(*pos, hex).unwrap())
        .collect()
}

#[test]
fn black_to_white_splits_at_the_middle() {
    let texels = generate_ramp_texels(&stops(&[(0.0, "#000000"), (0.5, "#ffffff")])).unwrap();
    assert_eq!(texels.len(), RAMP_WIDTH);
    assert!((0..128).all(|i| texels.texel(i) == [0, 0, 0, 255]));
    assert!((128..256).all(|i| texels.texel(i) == [255, 255, 255, 255]));
}

#[test]
fn unsorted_stops_give_the_same_table() {
    let sorted = generate_ramp_texels(&stops(&[
        (0.0, "#3a3a5a"),
        (0.45, "#9090b8"),
        (0.75, "#ffffff"),
    ]))
    .unwrap();
    let shuffled = generate_ramp_texels(&stops(&[
        (0.75, "#ffffff"),
        (0.0, "#3a3a5a"),
        (0.45, "#9090b8"),
    ]))
    .unwrap();
    assert_eq!(sorted, shuffled);
}

#[test]
fn bad_input_fails_with_typed_errors() {
    assert_eq!(generate_ramp_texels(&[]), Err(ViewerError::EmptyRamp));
    assert!(matches!(
        RampStop::hex(0.0, "#12345"),
        Err(ViewerError::InvalidColor(_))
    ));
    let nan = vec![RampStop::new(f32::NAN, toon_viewer::Color::WHITE)];
    assert!(matches!(
        generate_ramp_texels(&nan),
        Err(ViewerError::InvalidStopPosition(_))
    ));
}

#[test]
fn full_light_samples_just_below_the_edge() {
    let white = Vector3::new(1.0, 1.0, 1.0);
    assert_eq!(ramp_coord(white), 0.99);

    // only the last texel reaches the top stop
    let texels = generate_ramp_texels(&stops(&[(0.0, "#000000"), (0.995, "#ffffff")])).unwrap();
    assert_eq!(toon_color(white, &texels), Vector3::new(0.0, 0.0, 0.0));
}

#[test]
fn ramp_variant_bands_lit_and_shadowed_sides() {
    let texels = generate_ramp_texels(&stops(&[(0.0, "#000000"), (0.5, "#ffffff")])).unwrap();
    let lit = Fragment {
        diffuse: Vector3::new(1.0, 1.0, 1.0),
        alpha: 1.0,
        normal: Vector3::new(0.0, 0.0, 1.0),
        light_dir: Vector3::new(0.0, 0.0, 1.0),
        radiance: Vector3::new(1.0, 1.0, 1.0),
    };
    let dim = Fragment {
        radiance: Vector3::new(0.3, 0.3, 0.3),
        ..lit
    };
    assert_eq!(shade(MaterialVariant::Ramp, &lit, &texels), [1.0, 1.0, 1.0, 1.0]);
    assert_eq!(shade(MaterialVariant::Ramp, &dim, &texels), [0.0, 0.0, 0.0, 1.0]);
    assert_eq!(shade(MaterialVariant::Basic, &dim, &texels), [1.0, 1.0, 1.0, 1.0]);
}
