//! Skeletal animation: keyframe tracks, clips and a single-clip mixer.

pub mod clip;
pub mod mixer;

pub use clip::{AnimationClip, Interpolation, Keyframes, Track};
pub use mixer::AnimationMixer;
