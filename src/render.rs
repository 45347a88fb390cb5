//! Render composition.
//!
//! Flows describe what they want drawn each frame with a [`Render`]. The frame
//! loop flattens every flow's render into a list of [`Draw`]s, in the order the
//! flows returned them, and records them with the toon pipeline.

use crate::{data_structures::model::Mesh, materials::ToonMaterial};

/// One mesh drawn with one material and one joint palette.
pub struct Draw<'a> {
    pub mesh: &'a Mesh,
    pub material: &'a ToonMaterial,
    /// Joint palette bind group (group 3).
    pub skin: &'a wgpu::BindGroup,
    pub instance: &'a wgpu::Buffer,
    pub amount: u32,
}

/// Specifies how a scene object should be rendered.
///
/// - `None` renders nothing
/// - `Toon(Draw)` renders a single draw
/// - `Toons(Vec<Draw>)` renders a batch of draws in order
/// - `Composed(Vec<Render>)` recursively renders a composition of renders
pub enum Render<'a> {
    None,
    Toon(Draw<'a>),
    Toons(Vec<Draw<'a>>),
    Composed(Vec<Render<'a>>),
}

impl<'a> Render<'a> {
    /// Flatten into `draws`, skipping draws without instances.
    pub(crate) fn collect(self, draws: &mut Vec<Draw<'a>>) {
        match self {
            Render::None => (),
            Render::Toon(draw) => push(draws, draw),
            Render::Toons(vec) => vec.into_iter().for_each(|draw| push(draws, draw)),
            Render::Composed(renders) => renders.into_iter().for_each(|render| render.collect(draws)),
        }
    }
}

fn push<'a>(draws: &mut Vec<Draw<'a>>, draw: Draw<'a>) {
    if draw.amount == 0 || draw.instance.size() == 0 {
        log::warn!("Skipping {:?}: it has zero instances", draw.mesh.name);
        return;
    }
    draws.push(draw);
}
