//! How each part of the character is shaded.
//!
//! A single table lists the look of every configured part; [`apply_appearance`]
//! turns it into one material per primitive. Primitives that are not in the
//! table get a plain white toon material.

use std::collections::HashMap;

use crate::{
    character::parts::{Part, PartMap},
    context::InitContext,
    data_structures::texture::Texture,
    error::ViewerError,
    materials::{MaterialVariant, ToonMaterial, color::Color, ramp::RampStop},
    resources::load_texture,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureSlot {
    Body,
    Boots,
    Coat,
    Skin,
    Misc,
    Weapons,
}

impl TextureSlot {
    pub const ALL: [TextureSlot; 6] = [
        TextureSlot::Body,
        TextureSlot::Boots,
        TextureSlot::Coat,
        TextureSlot::Skin,
        TextureSlot::Misc,
        TextureSlot::Weapons,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            TextureSlot::Body => "textures/body-base.png",
            TextureSlot::Boots => "textures/boots-base.png",
            TextureSlot::Coat => "textures/coat-base.png",
            TextureSlot::Skin => "textures/skin-base.png",
            TextureSlot::Misc => "textures/misc-base.png",
            TextureSlot::Weapons => "textures/weapons-base.png",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PartAppearance {
    pub material: MaterialVariant,
    pub texture: Option<TextureSlot>,
    /// Packed `0xRRGGBB` sRGB base colour. White when absent.
    pub color: Option<u32>,
    pub tone_mapped: bool,
}

impl PartAppearance {
    const fn ramp(texture: Option<TextureSlot>, color: Option<u32>) -> Self {
        Self {
            material: MaterialVariant::Ramp,
            texture,
            color,
            tone_mapped: true,
        }
    }

    const fn toon(color: u32) -> Self {
        Self {
            material: MaterialVariant::Toon,
            texture: None,
            color: Some(color),
            tone_mapped: true,
        }
    }

    pub fn base_color(&self) -> Color {
        self.color.map_or(Color::WHITE, Color::from_hex)
    }
}

/// Look of parts not listed in [`APPEARANCE`] and of unnamed primitives.
pub const DEFAULT_APPEARANCE: PartAppearance = PartAppearance {
    material: MaterialVariant::Toon,
    texture: None,
    color: None,
    tone_mapped: true,
};

const LAVENDER: u32 = 0x9998c8;
const TIE_RED: u32 = 0xa82e2e;
const BLACK: u32 = 0x000000;
const FACE: u32 = 0xd1d1eb;

pub static APPEARANCE: [(Part, PartAppearance); 27] = {
    use TextureSlot::*;
    [
        (Part::Face, PartAppearance::ramp(Some(Skin), Some(FACE))),
        (Part::FaceSecondary, PartAppearance::ramp(Some(Skin), Some(FACE))),
        (Part::Sclera, PartAppearance::ramp(None, None)),
        (Part::Eyes, PartAppearance::ramp(Some(Skin), None)),
        (Part::EyeDetails, PartAppearance::toon(BLACK)),
        (Part::Body, PartAppearance::ramp(Some(Body), None)),
        (Part::Fingers, PartAppearance::ramp(Some(Skin), None)),
        (Part::Boots, PartAppearance::ramp(Some(Boots), None)),
        (Part::Jacket, PartAppearance::ramp(Some(Coat), None)),
        (Part::Spine, PartAppearance::ramp(Some(Weapons), None)),
        (Part::HairOuter, PartAppearance::ramp(None, None)),
        (Part::HairInner, PartAppearance::ramp(None, Some(LAVENDER))),
        (Part::GunBody, PartAppearance::ramp(Some(Weapons), None)),
        (Part::GunDetail, PartAppearance::ramp(Some(Weapons), None)),
        (Part::KnifeBlade, PartAppearance::ramp(Some(Weapons), None)),
        (Part::KnifeHandle, PartAppearance::ramp(Some(Weapons), None)),
        (Part::ShirtCollar, PartAppearance::ramp(None, Some(LAVENDER))),
        (Part::ShirtCollarInner, PartAppearance::ramp(None, Some(LAVENDER))),
        (Part::Shirt, PartAppearance::ramp(None, Some(TIE_RED))),
        (Part::Tie, PartAppearance::ramp(None, Some(TIE_RED))),
        (Part::TieClips, PartAppearance::toon(BLACK)),
        (Part::Earrings, PartAppearance::toon(BLACK)),
        (Part::Belt, PartAppearance::ramp(Some(Misc), None)),
        (Part::BeltBottom, PartAppearance::ramp(Some(Misc), None)),
        (Part::BeltTop, PartAppearance::ramp(Some(Misc), None)),
        (Part::Ammo, PartAppearance::ramp(Some(Misc), None)),
        (Part::BackAmmo, PartAppearance::ramp(Some(Misc), None)),
    ]
};

pub fn appearance_of(part: Part) -> Option<&'static PartAppearance> {
    APPEARANCE
        .iter()
        .find(|(p, _)| *p == part)
        .map(|(_, appearance)| appearance)
}

/// The six colour maps, keyed by slot.
#[derive(Clone, Debug, Default)]
pub struct TextureSet {
    textures: HashMap<TextureSlot, Texture>,
}

impl TextureSet {
    /// Load every slot concurrently. Maps use the glTF UV convention, so no flip.
    pub async fn load(ctx: &InitContext) -> anyhow::Result<Self> {
        let loads = TextureSlot::ALL.map(|slot| async move {
            let texture = load_texture(slot.file_name(), false, &ctx.device, &ctx.queue).await?;
            anyhow::Ok((slot, texture))
        });
        let textures = futures::future::try_join_all(loads).await?;
        Ok(Self {
            textures: textures.into_iter().collect(),
        })
    }

    pub fn get(&self, slot: TextureSlot) -> Option<&Texture> {
        self.textures.get(&slot)
    }

    pub fn insert(&mut self, slot: TextureSlot, texture: Texture) {
        self.textures.insert(slot, texture);
    }
}

/// One material per primitive, in primitive order.
pub fn apply_appearance(
    ctx: &InitContext,
    primitive_count: usize,
    parts: &PartMap,
    textures: &TextureSet,
    stops: &[RampStop],
) -> Result<Vec<ToonMaterial>, ViewerError> {
    (0..primitive_count)
        .map(|idx| {
            let appearance = parts
                .part_of(idx)
                .and_then(appearance_of)
                .unwrap_or(&DEFAULT_APPEARANCE);
            let map = appearance.texture.and_then(|slot| {
                let texture = textures.get(slot).cloned();
                if texture.is_none() {
                    log::warn!("Texture slot {:?} is not loaded", slot);
                }
                texture
            });
            ToonMaterial::new(
                ctx,
                appearance.material,
                stops,
                map,
                appearance.base_color(),
                appearance.tone_mapped,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_part_has_exactly_one_entry() {
        for part in Part::ALL {
            let count = APPEARANCE.iter().filter(|(p, _)| *p == part).count();
            assert_eq!(count, 1, "{part:?}");
        }
    }

    #[test]
    fn colours_match_the_scene() {
        let color = |part| appearance_of(part).unwrap().color;
        assert_eq!(color(Part::HairInner), Some(0x9998c8));
        assert_eq!(color(Part::ShirtCollar), Some(0x9998c8));
        assert_eq!(color(Part::Tie), Some(0xa82e2e));
        assert_eq!(color(Part::Shirt), Some(0xa82e2e));
        assert_eq!(color(Part::TieClips), Some(0x000000));
        assert_eq!(color(Part::Earrings), Some(0x000000));
        assert_eq!(color(Part::EyeDetails), Some(0x000000));
        assert_eq!(color(Part::Face), Some(0xd1d1eb));
    }

    #[test]
    fn face_and_eyes_use_the_skin_map() {
        assert_eq!(appearance_of(Part::Face).unwrap().texture, Some(TextureSlot::Skin));
        assert_eq!(appearance_of(Part::Eyes).unwrap().texture, Some(TextureSlot::Skin));
        assert_eq!(appearance_of(Part::Body).unwrap().texture, Some(TextureSlot::Body));
        assert_eq!(appearance_of(Part::Jacket).unwrap().texture, Some(TextureSlot::Coat));
    }

    #[test]
    fn uncoloured_parts_are_white() {
        assert_eq!(appearance_of(Part::Body).unwrap().base_color(), Color::WHITE);
        assert_eq!(DEFAULT_APPEARANCE.material, MaterialVariant::Toon);
        assert_eq!(DEFAULT_APPEARANCE.base_color(), Color::WHITE);
    }

    #[test]
    fn texture_files_live_under_textures() {
        for slot in TextureSlot::ALL {
            assert!(slot.file_name().starts_with("textures/"));
            assert!(slot.file_name().ends_with("-base.png"));
        }
    }
}
