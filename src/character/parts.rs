//! Named parts of the character model.
//!
//! Every part is one glTF primitive. Names follow the loader convention, so a
//! second primitive of node `Plane017` is `Plane017_1`.

use crate::error::ViewerError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Part {
    Face,
    Sclera,
    FaceSecondary,
    Body,
    Fingers,
    Eyes,
    Boots,
    Jacket,
    EyeDetails,
    Spine,
    HairOuter,
    HairInner,
    GunBody,
    GunDetail,
    KnifeBlade,
    KnifeHandle,
    ShirtCollar,
    ShirtCollarInner,
    Shirt,
    Tie,
    TieClips,
    Earrings,
    Belt,
    BeltBottom,
    BeltTop,
    Ammo,
    BackAmmo,
}

impl Part {
    pub const ALL: [Part; 27] = [
        Part::Face,
        Part::Sclera,
        Part::FaceSecondary,
        Part::Body,
        Part::Fingers,
        Part::Eyes,
        Part::Boots,
        Part::Jacket,
        Part::EyeDetails,
        Part::Spine,
        Part::HairOuter,
        Part::HairInner,
        Part::GunBody,
        Part::GunDetail,
        Part::KnifeBlade,
        Part::KnifeHandle,
        Part::ShirtCollar,
        Part::ShirtCollarInner,
        Part::Shirt,
        Part::Tie,
        Part::TieClips,
        Part::Earrings,
        Part::Belt,
        Part::BeltBottom,
        Part::BeltTop,
        Part::Ammo,
        Part::BackAmmo,
    ];

    pub fn mesh_name(self) -> &'static str {
        match self {
            Part::Face => "Plane017",
            Part::Sclera => "Plane017_1",
            Part::FaceSecondary => "Plane017_2",
            Part::Body => "body",
            Part::Fingers => "Plane011",
            Part::Eyes => "yeux",
            Part::Boots => "bottes",
            Part::Jacket => "veste",
            Part::EyeDetails => "eye_details",
            Part::Spine => "spine",
            Part::HairOuter => "NurbsPath008",
            Part::HairInner => "NurbsPath008_1",
            Part::GunBody => "Cube008",
            Part::GunDetail => "Cube008_1",
            Part::KnifeBlade => "Cylinder002",
            Part::KnifeHandle => "Cylinder002_1",
            Part::ShirtCollar => "Plane016",
            Part::ShirtCollarInner => "Plane016_1",
            Part::Shirt => "chemise001",
            Part::Tie => "cravate",
            Part::TieClips => "cravate_clips",
            Part::Earrings => "earings",
            Part::Belt => "belt",
            Part::BeltBottom => "belt001",
            Part::BeltTop => "Cylinder004",
            Part::Ammo => "Cylinder004_1",
            Part::BackAmmo => "ammo_2",
        }
    }

    pub fn from_mesh_name(name: &str) -> Option<Part> {
        Part::ALL.into_iter().find(|part| part.mesh_name() == name)
    }
}

/// Primitive index of every part, validated once after loading.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartMap {
    indices: [usize; Part::ALL.len()],
}

impl PartMap {
    /// Look up every part in `names` (primitive names in load order).
    pub fn resolve<'a>(names: impl IntoIterator<Item = &'a str>) -> Result<Self, ViewerError> {
        let names: Vec<&str> = names.into_iter().collect();
        let mut indices = [0; Part::ALL.len()];
        for part in Part::ALL {
            indices[part as usize] = names
                .iter()
                .position(|name| *name == part.mesh_name())
                .ok_or(ViewerError::MissingPart {
                    part,
                    mesh: part.mesh_name(),
                })?;
        }
        Ok(Self { indices })
    }

    pub fn index(&self, part: Part) -> usize {
        self.indices[part as usize]
    }

    /// The part drawn by primitive `primitive`, if any.
    pub fn part_of(&self, primitive: usize) -> Option<Part> {
        Part::ALL
            .into_iter()
            .find(|part| self.indices[*part as usize] == primitive)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Part, usize)> + '_ {
        Part::ALL.into_iter().map(|part| (part, self.index(part)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_names() -> Vec<&'static str> {
        Part::ALL.iter().map(|part| part.mesh_name()).collect()
    }

    #[test]
    fn discriminants_follow_all() {
        for (idx, part) in Part::ALL.into_iter().enumerate() {
            assert_eq!(part as usize, idx);
        }
    }

    #[test]
    fn mesh_names_are_unique() {
        let mut names = all_names();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), Part::ALL.len());
    }

    #[test]
    fn resolves_parts_among_other_primitives() {
        let mut names = vec!["Sphere", "Plane017_3"];
        names.extend(all_names().into_iter().rev());
        let map = PartMap::resolve(names.iter().copied()).unwrap();
        assert_eq!(names[map.index(Part::Face)], "Plane017");
        assert_eq!(names[map.index(Part::BackAmmo)], "ammo_2");
        assert_eq!(map.part_of(0), None);
        assert_eq!(map.part_of(map.index(Part::Tie)), Some(Part::Tie));
        assert_eq!(map.iter().count(), 27);
    }

    #[test]
    fn missing_part_is_named() {
        let names: Vec<&str> = all_names()
            .into_iter()
            .filter(|name| *name != "cravate")
            .collect();
        assert_eq!(
            PartMap::resolve(names),
            Err(ViewerError::MissingPart {
                part: Part::Tie,
                mesh: "cravate",
            })
        );
    }

    #[test]
    fn round_trips_mesh_names() {
        for part in Part::ALL {
            assert_eq!(Part::from_mesh_name(part.mesh_name()), Some(part));
        }
        assert_eq!(Part::from_mesh_name("veste_1"), None);
    }
}
