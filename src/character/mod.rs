//! The animated, toon shaded character.
//!
//! [`Character`] owns everything needed to draw the loaded model: one mesh and
//! one material per primitive, the joint palettes those primitives are skinned
//! with, the animation mixer and the root transform set from the control panel.

pub mod appearance;
pub mod parts;

use anyhow::Context as _;
use cgmath::Matrix4;
use instant::Duration;
use wgpu::util::DeviceExt;

use crate::{
    animation::{AnimationClip, AnimationMixer},
    context::InitContext,
    data_structures::{instance::Instance, model::Mesh, skeleton::Skeleton},
    error::ViewerError,
    materials::{MaterialVariant, RampStop, ToonMaterial},
    pipelines::toon::JointPalette,
    render::{Draw, Render},
    resources::CharacterAsset,
};
use appearance::{TextureSet, apply_appearance};
use parts::{Part, PartMap};

/// Where the matrices of a joint palette come from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PaletteSource {
    /// Every joint of a skin.
    Skin(usize),
    /// The global transform of a single unskinned node.
    Node(usize),
}

/// Matrices to upload for `source` given the node globals of the current pose.
pub fn palette_matrices(
    source: PaletteSource,
    skeleton: &Skeleton,
    globals: &[Matrix4<f32>],
) -> Vec<Matrix4<f32>> {
    match source {
        PaletteSource::Skin(skin) => skeleton.skin_palette(skin, globals),
        PaletteSource::Node(node) => globals.get(node).copied().into_iter().collect(),
    }
}

#[derive(Debug)]
struct Palette {
    source: PaletteSource,
    joints: JointPalette,
}

#[derive(Debug)]
pub struct Character {
    skeleton: Skeleton,
    meshes: Vec<Mesh>,
    /// Palette index of each primitive.
    palette_of: Vec<usize>,
    palettes: Vec<Palette>,
    materials: Vec<ToonMaterial>,
    parts: PartMap,
    mixer: AnimationMixer,
    root: Instance,
    instance_buffer: wgpu::Buffer,
}

impl Character {
    pub fn new(
        ctx: &InitContext,
        asset: CharacterAsset,
        clips: Vec<AnimationClip>,
        textures: &TextureSet,
        stops: &[RampStop],
    ) -> anyhow::Result<Self> {
        let parts = PartMap::resolve(asset.primitive_names()).context("resolve character parts")?;
        let materials = apply_appearance(ctx, asset.primitives.len(), &parts, textures, stops)?;

        let mut palettes: Vec<Palette> = Vec::new();
        let mut palette_of = Vec::with_capacity(asset.primitives.len());
        for primitive in &asset.primitives {
            let source = primitive
                .skin
                .map_or(PaletteSource::Node(primitive.node), PaletteSource::Skin);
            let idx = match palettes.iter().position(|p| p.source == source) {
                Some(idx) => idx,
                None => {
                    let label = format!("{:?} palette", source);
                    palettes.push(Palette {
                        source,
                        joints: JointPalette::new(&ctx.device, &ctx.layouts.skin, &label),
                    });
                    palettes.len() - 1
                }
            };
            palette_of.push(idx);
        }

        let meshes = asset
            .primitives
            .iter()
            .map(|primitive| Mesh::from_primitive(&ctx.device, primitive))
            .collect();

        let character = &ctx.settings.character;
        let root = Instance::from_euler_xyz(character.position, character.rotation, character.scale);
        let instance_buffer = ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Character Instance Buffer"),
                contents: bytemuck::cast_slice(&[root.to_raw()]),
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            });

        let mixer = AnimationMixer::new(&asset.skeleton, clips);
        log::info!(
            "Character ready: {} primitives, {} palettes, clips {:?}",
            asset.primitives.len(),
            palettes.len(),
            mixer.clip_names().collect::<Vec<_>>()
        );

        let character = Self {
            skeleton: asset.skeleton,
            meshes,
            palette_of,
            palettes,
            materials,
            parts,
            mixer,
            root,
            instance_buffer,
        };
        character.upload_palettes(&ctx.queue);
        Ok(character)
    }

    pub fn play(&mut self, clip: &str) -> Result<(), ViewerError> {
        self.mixer.play(clip)
    }

    pub fn mixer(&self) -> &AnimationMixer {
        &self.mixer
    }

    pub fn root(&self) -> Instance {
        self.root
    }

    pub fn set_root(&mut self, queue: &wgpu::Queue, root: Instance) {
        self.root = root;
        queue.write_buffer(
            &self.instance_buffer,
            0,
            bytemuck::cast_slice(&[self.root.to_raw()]),
        );
    }

    /// Rebake the ramp of every ramp shaded part.
    pub fn set_ramp_stops(&mut self, ctx: &InitContext, stops: &[RampStop]) -> Result<(), ViewerError> {
        self.materials
            .iter_mut()
            .filter(|material| material.variant() == MaterialVariant::Ramp)
            .try_for_each(|material| material.set_ramp_stops(ctx, stops))
    }

    pub fn material(&self, part: Part) -> &ToonMaterial {
        &self.materials[self.parts.index(part)]
    }

    pub fn material_mut(&mut self, part: Part) -> &mut ToonMaterial {
        &mut self.materials[self.parts.index(part)]
    }

    /// Advance the animation and upload the resulting palettes.
    pub fn update(&mut self, queue: &wgpu::Queue, dt: Duration) {
        self.mixer.update(dt);
        self.upload_palettes(queue);
    }

    fn upload_palettes(&self, queue: &wgpu::Queue) {
        let globals = self.skeleton.global_transforms(self.mixer.pose());
        for palette in &self.palettes {
            let matrices = palette_matrices(palette.source, &self.skeleton, &globals);
            palette.joints.write(queue, &matrices);
        }
    }

    pub fn render(&self) -> Render<'_> {
        Render::Toons(
            self.meshes
                .iter()
                .zip(&self.materials)
                .zip(&self.palette_of)
                .map(|((mesh, material), &palette)| Draw {
                    mesh,
                    material,
                    skin: self.palettes[palette].joints.bind_group(),
                    instance: &self.instance_buffer,
                    amount: 1,
                })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use cgmath::{SquareMatrix, Vector3};

    use super::*;
    use crate::data_structures::skeleton::{Node, Skin};

    fn skeleton() -> Skeleton {
        let nodes = vec![
            Node {
                name: "root".into(),
                parent: None,
                rest: Instance::from(Vector3::new(1.0, 0.0, 0.0)),
            },
            Node {
                name: "hand".into(),
                parent: Some(0),
                rest: Instance::from(Vector3::new(0.0, 2.0, 0.0)),
            },
        ];
        let skins = vec![Skin {
            name: "armature".into(),
            joints: vec![0, 1],
            inverse_bind: vec![
                Matrix4::from_translation(Vector3::new(-1.0, 0.0, 0.0)),
                Matrix4::from_translation(Vector3::new(-1.0, -2.0, 0.0)),
            ],
        }];
        Skeleton::new(nodes, skins).unwrap()
    }

    #[test]
    fn skin_palette_is_identity_in_rest_pose() {
        let skeleton = skeleton();
        let globals = skeleton.global_transforms(&skeleton.rest_pose());
        let palette = palette_matrices(PaletteSource::Skin(0), &skeleton, &globals);
        assert_eq!(palette.len(), 2);
        for m in palette {
            assert_eq!(m, Matrix4::identity());
        }
    }

    #[test]
    fn node_palette_is_the_node_global() {
        let skeleton = skeleton();
        let globals = skeleton.global_transforms(&skeleton.rest_pose());
        let palette = palette_matrices(PaletteSource::Node(1), &skeleton, &globals);
        assert_eq!(palette, vec![Matrix4::from_translation(Vector3::new(1.0, 2.0, 0.0))]);
    }

    #[test]
    fn unknown_sources_give_empty_palettes() {
        let skeleton = skeleton();
        let globals = skeleton.global_transforms(&skeleton.rest_pose());
        assert!(palette_matrices(PaletteSource::Node(9), &skeleton, &globals).is_empty());
        assert!(palette_matrices(PaletteSource::Skin(3), &skeleton, &globals).is_empty());
    }
}
