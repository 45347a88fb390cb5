//! Vertex extraction from glTF primitives.

use crate::data_structures::model::ModelVertex;

/// Read positions, uv0, normals and skin attributes of `primitive`.
///
/// Returns `None` for primitives without positions. Missing normals default to
/// +Y, missing uvs to zero. Without `skinned`, or without joint attributes,
/// every vertex binds rigidly to palette entry 0.
pub fn read_vertices(
    primitive: &gltf::Primitive,
    buffers: &[Vec<u8>],
    skinned: bool,
) -> Option<(Vec<ModelVertex>, Vec<u32>)> {
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));

    let positions: Vec<[f32; 3]> = reader.read_positions()?.collect();
    let count = positions.len();

    let normals: Vec<[f32; 3]> = match reader.read_normals() {
        Some(normals) => normals.collect(),
        None => vec![[0.0, 1.0, 0.0]; count],
    };
    let tex_coords: Vec<[f32; 2]> = match reader.read_tex_coords(0) {
        Some(uvs) => uvs.into_f32().collect(),
        None => vec![[0.0, 0.0]; count],
    };
    let skin = if skinned {
        reader
            .read_joints(0)
            .zip(reader.read_weights(0))
            .map(|(joints, weights)| {
                let joints: Vec<[u32; 4]> = joints
                    .into_u16()
                    .map(|j| j.map(u32::from))
                    .collect();
                let weights: Vec<[f32; 4]> = weights.into_f32().map(normalize_weights).collect();
                (joints, weights)
            })
    } else {
        None
    };

    let vertices = (0..count)
        .map(|i| {
            let mut vertex = ModelVertex::rigid(
                positions[i],
                tex_coords.get(i).copied().unwrap_or_default(),
                normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]),
            );
            if let Some((joints, weights)) = &skin {
                if let (Some(j), Some(w)) = (joints.get(i), weights.get(i)) {
                    vertex.joints = *j;
                    vertex.weights = *w;
                }
            }
            vertex
        })
        .collect();

    let indices = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..count as u32).collect(),
    };
    Some((vertices, indices))
}

/// Scale weights to sum to one. All-zero weights bind to the first joint.
pub fn normalize_weights(weights: [f32; 4]) -> [f32; 4] {
    let sum: f32 = weights.iter().sum();
    if sum <= f32::EPSILON {
        return ModelVertex::RIGID_WEIGHTS;
    }
    weights.map(|w| w / sum)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_are_normalized() {
        assert_eq!(normalize_weights([2.0, 2.0, 0.0, 0.0]), [0.5, 0.5, 0.0, 0.0]);
        assert_eq!(normalize_weights([0.0; 4]), [1.0, 0.0, 0.0, 0.0]);
    }
}
