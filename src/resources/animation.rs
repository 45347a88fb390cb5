//! Animation channels of a glTF document turned into [`AnimationClip`]s.

use crate::animation::{AnimationClip, Interpolation, Keyframes, Track};

/// Name used for a node without one, so tracks can still target it.
pub fn node_name(node: &gltf::Node) -> String {
    node.name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("node_{}", node.index()))
}

pub fn read_clips(document: &gltf::Document, buffers: &[Vec<u8>]) -> Vec<AnimationClip> {
    document
        .animations()
        .map(|animation| {
            let name = animation
                .name()
                .map(str::to_string)
                .unwrap_or_else(|| format!("animation_{}", animation.index()));
            let tracks = animation
                .channels()
                .filter_map(|channel| read_track(&channel, buffers, &name))
                .collect();
            AnimationClip::new(name, tracks)
        })
        .collect()
}

fn read_track(
    channel: &gltf::animation::Channel,
    buffers: &[Vec<u8>],
    clip: &str,
) -> Option<Track> {
    let reader = channel.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));
    let times: Vec<f32> = match reader.read_inputs() {
        Some(times) => times.collect(),
        None => {
            log::warn!("No key times found in channel {} of {}", channel.index(), clip);
            return None;
        }
    };
    let keyframes = match reader.read_outputs()? {
        gltf::animation::util::ReadOutputs::Translations(translations) => {
            Keyframes::Translation(translations.map(Into::into).collect())
        }
        gltf::animation::util::ReadOutputs::Rotations(rotations) => Keyframes::Rotation(
            rotations
                .into_f32()
                // glTF stores [x, y, z, w], cgmath takes w first
                .map(|[x, y, z, w]| cgmath::Quaternion::new(w, x, y, z))
                .collect(),
        ),
        gltf::animation::util::ReadOutputs::Scales(scales) => {
            Keyframes::Scale(scales.map(Into::into).collect())
        }
        gltf::animation::util::ReadOutputs::MorphTargetWeights(_) => {
            log::warn!("Skipping morph target channel in {}", clip);
            return None;
        }
    };
    let interpolation = match channel.sampler().interpolation() {
        gltf::animation::Interpolation::Step => Interpolation::Step,
        gltf::animation::Interpolation::Linear => Interpolation::Linear,
        gltf::animation::Interpolation::CubicSpline => Interpolation::CubicSpline,
    };
    Some(Track {
        target: node_name(&channel.target().node()),
        interpolation,
        times,
        keyframes,
    })
}
