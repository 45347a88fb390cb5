use std::collections::HashSet;

use anyhow::Context as _;

use crate::{
    animation::AnimationClip,
    data_structures::{
        instance::Instance,
        model::Primitive,
        skeleton::{Node, Skeleton, Skin},
    },
    error::ViewerError,
};

/**
 * This module contains all logic for loading models, clips and textures from external files.
 */
pub mod animation;
pub mod mesh;
pub mod texture;

pub use texture::{load_binary, load_string, load_texture};

/// A parsed glTF document with its buffers resolved.
#[derive(Debug)]
pub struct GltfData {
    pub document: gltf::Document,
    pub buffers: Vec<Vec<u8>>,
}

/// Everything the viewer needs from a character file.
#[derive(Clone, Debug)]
pub struct CharacterAsset {
    pub skeleton: Skeleton,
    pub primitives: Vec<Primitive>,
}

impl CharacterAsset {
    pub fn primitive_names(&self) -> impl Iterator<Item = &str> {
        self.primitives.iter().map(|p| p.name.as_str())
    }
}

/// A glTF buffer: the embedded binary chunk, or a URI still to be fetched.
enum BufferSource<'a> {
    Embedded(Vec<u8>),
    External(&'a str),
}

fn buffer_sources<'a>(
    gltf: &'a gltf::Gltf,
    file_name: &str,
) -> Result<Vec<BufferSource<'a>>, ViewerError> {
    gltf.buffers()
        .map(|buffer| match buffer.source() {
            gltf::buffer::Source::Bin => gltf
                .blob
                .clone()
                .map(BufferSource::Embedded)
                .ok_or_else(|| ViewerError::InvalidAsset {
                    file: file_name.to_string(),
                    reason: "binary chunk is missing".to_string(),
                }),
            gltf::buffer::Source::Uri(uri) => Ok(BufferSource::External(uri)),
        })
        .collect()
}

/// Parse a `.glb` whose buffers are all embedded.
pub fn parse_glb(bytes: &[u8], file_name: &str) -> anyhow::Result<GltfData> {
    let gltf = gltf::Gltf::from_slice(bytes).with_context(|| format!("parsing {}", file_name))?;
    let buffers = buffer_sources(&gltf, file_name)?
        .into_iter()
        .map(|source| match source {
            BufferSource::Embedded(bin) => Ok(bin),
            BufferSource::External(uri) => Err(ViewerError::InvalidAsset {
                file: file_name.to_string(),
                reason: format!("external buffer {} is not embedded", uri),
            }),
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(GltfData {
        document: gltf.document,
        buffers,
    })
}

/// Load a `.glb` or `.gltf`, fetching external buffers relative to the asset root.
pub async fn load_gltf(file_name: &str) -> anyhow::Result<GltfData> {
    let bytes = load_binary(file_name)
        .await
        .with_context(|| format!("reading {}", file_name))?;
    let gltf = gltf::Gltf::from_slice(&bytes).with_context(|| format!("parsing {}", file_name))?;

    let mut buffers = Vec::new();
    for source in buffer_sources(&gltf, file_name)? {
        let bin = match source {
            BufferSource::Embedded(bin) => bin,
            BufferSource::External(uri) => load_binary(uri)
                .await
                .with_context(|| format!("reading buffer {} of {}", uri, file_name))?,
        };
        buffers.push(bin);
    }
    Ok(GltfData {
        document: gltf.document,
        buffers,
    })
}

pub fn parse_character(bytes: &[u8]) -> anyhow::Result<CharacterAsset> {
    let data = parse_glb(bytes, "character")?;
    Ok(read_character(&data, "character")?)
}

pub fn parse_clips(bytes: &[u8]) -> anyhow::Result<Vec<AnimationClip>> {
    let data = parse_glb(bytes, "animations")?;
    Ok(animation::read_clips(&data.document, &data.buffers))
}

pub async fn load_character(file_name: &str) -> anyhow::Result<CharacterAsset> {
    let data = load_gltf(file_name).await?;
    Ok(read_character(&data, file_name)?)
}

pub async fn load_clips(file_name: &str) -> anyhow::Result<Vec<AnimationClip>> {
    let data = load_gltf(file_name).await?;
    Ok(animation::read_clips(&data.document, &data.buffers))
}

/// Build the skeleton and the named primitives of a character.
///
/// Materials in the file are ignored; the viewer assigns its own.
pub fn read_character(data: &GltfData, file_name: &str) -> Result<CharacterAsset, ViewerError> {
    let document = &data.document;
    let skeleton = read_skeleton(data)?;

    let mut names = HashSet::new();
    let mut primitives = Vec::new();
    for node in mesh_nodes(document) {
        let Some(mesh) = node.mesh() else { continue };
        let base = node
            .name()
            .or(mesh.name())
            .map(str::to_string)
            .unwrap_or_else(|| format!("mesh_{}", mesh.index()));
        let skin = node.skin().map(|skin| skin.index());

        for (k, primitive) in mesh.primitives().enumerate() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                log::warn!(
                    "Skipping primitive {} of {} in {}: only triangles are supported",
                    k,
                    base,
                    file_name
                );
                continue;
            }
            let name = if k == 0 {
                base.clone()
            } else {
                format!("{}_{}", base, k)
            };
            let name = unique_name(&mut names, name);
            let Some((vertices, indices)) = mesh::read_vertices(&primitive, &data.buffers, skin.is_some())
            else {
                log::warn!("Primitive {} in {} has no positions", name, file_name);
                continue;
            };
            primitives.push(Primitive {
                name,
                node: node.index(),
                skin,
                vertices,
                indices,
            });
        }
    }
    log::info!(
        "Loaded {} with {} nodes, {} skins and {} primitives",
        file_name,
        skeleton.nodes().len(),
        skeleton.skins().len(),
        primitives.len()
    );
    Ok(CharacterAsset {
        skeleton,
        primitives,
    })
}

fn read_skeleton(data: &GltfData) -> Result<Skeleton, ViewerError> {
    let document = &data.document;
    let mut parents = vec![None; document.nodes().len()];
    for node in document.nodes() {
        for child in node.children() {
            parents[child.index()] = Some(node.index());
        }
    }
    let nodes = document
        .nodes()
        .map(|node| {
            let (translation, [x, y, z, w], scale) = node.transform().decomposed();
            Node {
                name: animation::node_name(&node),
                parent: parents[node.index()],
                rest: Instance {
                    position: translation.into(),
                    rotation: cgmath::Quaternion::new(w, x, y, z),
                    scale: scale.into(),
                },
            }
        })
        .collect();
    let skins = document
        .skins()
        .map(|skin| {
            let reader = skin.reader(|buffer| data.buffers.get(buffer.index()).map(Vec::as_slice));
            let inverse_bind = reader
                .read_inverse_bind_matrices()
                .map(|matrices| matrices.map(cgmath::Matrix4::from).collect())
                .unwrap_or_default();
            Skin {
                name: skin
                    .name()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("skin_{}", skin.index())),
                joints: skin.joints().map(|joint| joint.index()).collect(),
                inverse_bind,
            }
        })
        .collect();
    Skeleton::new(nodes, skins)
}

/// Nodes carrying a mesh, depth first from the scene roots.
fn mesh_nodes(document: &gltf::Document) -> Vec<gltf::Node<'_>> {
    let roots: Vec<gltf::Node> = match document.default_scene().or_else(|| document.scenes().next()) {
        Some(scene) => scene.nodes().collect(),
        None => document.nodes().collect(),
    };
    let mut out = Vec::new();
    let mut stack: Vec<gltf::Node> = roots.into_iter().rev().collect();
    while let Some(node) = stack.pop() {
        stack.extend(node.children().collect::<Vec<_>>().into_iter().rev());
        if node.mesh().is_some() {
            out.push(node);
        }
    }
    out
}

fn unique_name(taken: &mut HashSet<String>, name: String) -> String {
    let mut candidate = name.clone();
    let mut n = 1;
    while taken.contains(&candidate) {
        candidate = format!("{}_{}", name, n);
        n += 1;
    }
    taken.insert(candidate.clone());
    candidate
}
