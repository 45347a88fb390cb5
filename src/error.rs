//! Domain errors.
//!
//! IO and GPU setup failures travel as `anyhow::Error`. Everything the viewer
//! validates itself (ramps, part names, clips, skins) fails with a
//! [`ViewerError`] so callers can match on the cause.

use thiserror::Error;

use crate::character::parts::Part;

#[derive(Debug, Error, PartialEq)]
pub enum ViewerError {
    #[error("a colour ramp needs at least one stop")]
    EmptyRamp,

    #[error("ramp stop position {0} is not a finite number")]
    InvalidStopPosition(f32),

    #[error("`{0}` is not a #rrggbb colour")]
    InvalidColor(String),

    #[error("character part {part:?} expects a mesh named `{mesh}` but the model has none")]
    MissingPart { part: Part, mesh: &'static str },

    #[error("no animation clip named `{0}`")]
    MissingClip(String),

    #[error("skin `{name}` uses {joints} joints, at most {max} are supported")]
    TooManyJoints {
        name: String,
        joints: usize,
        max: usize,
    },

    #[error("invalid asset `{file}`: {reason}")]
    InvalidAsset { file: String, reason: String },
}
