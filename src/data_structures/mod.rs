//! Engine data structures: meshes, textures, skeletons, and instances.
//!
//! - `model` contains the vertex layout, loaded primitives and GPU meshes
//! - `texture` contains GPU texture wrapper and creation utilities
//! - `instance` holds per-instance transformation data
//! - `skeleton` holds the node hierarchy, skins and joint palettes

pub mod instance;
pub mod model;
pub mod skeleton;
pub mod texture;
