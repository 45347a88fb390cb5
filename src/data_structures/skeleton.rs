//! Node hierarchy and skins of a loaded model.
//!
//! Nodes keep their rest transform; animation produces a pose (one local
//! [`Instance`] per node) and the skeleton turns poses into global matrices and
//! joint palettes for the vertex shader.

use std::collections::HashMap;

use cgmath::{Matrix4, SquareMatrix};

use crate::{data_structures::instance::Instance, error::ViewerError};

/// Size of the joint palette uniform.
pub const MAX_JOINTS: usize = 128;

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub name: String,
    pub parent: Option<usize>,
    pub rest: Instance,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Skin {
    pub name: String,
    /// Node index of each joint, in palette order.
    pub joints: Vec<usize>,
    pub inverse_bind: Vec<Matrix4<f32>>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Skeleton {
    nodes: Vec<Node>,
    skins: Vec<Skin>,
    /// Parents always come before their children.
    order: Vec<usize>,
    by_name: HashMap<String, usize>,
}

impl Skeleton {
    pub fn new(nodes: Vec<Node>, skins: Vec<Skin>) -> Result<Self, ViewerError> {
        for skin in &skins {
            if skin.joints.len() > MAX_JOINTS {
                return Err(ViewerError::TooManyJoints {
                    name: skin.name.clone(),
                    joints: skin.joints.len(),
                    max: MAX_JOINTS,
                });
            }
            if let Some(joint) = skin.joints.iter().find(|joint| **joint >= nodes.len()) {
                return Err(ViewerError::InvalidAsset {
                    file: skin.name.clone(),
                    reason: format!("joint node {joint} does not exist"),
                });
            }
        }

        let mut children: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
        let mut roots = Vec::new();
        for (idx, node) in nodes.iter().enumerate() {
            match node.parent {
                Some(parent) if parent < nodes.len() => children[parent].push(idx),
                _ => roots.push(idx),
            }
        }
        let mut order = Vec::with_capacity(nodes.len());
        let mut stack: Vec<usize> = roots.into_iter().rev().collect();
        while let Some(idx) = stack.pop() {
            order.push(idx);
            stack.extend(children[idx].iter().rev());
        }
        if order.len() != nodes.len() {
            return Err(ViewerError::InvalidAsset {
                file: "skeleton".to_string(),
                reason: "node hierarchy contains a cycle".to_string(),
            });
        }

        let mut by_name = HashMap::new();
        for (idx, node) in nodes.iter().enumerate() {
            // first node wins a name clash
            by_name.entry(node.name.clone()).or_insert(idx);
        }

        Ok(Self {
            nodes,
            skins,
            order,
            by_name,
        })
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn skins(&self) -> &[Skin] {
        &self.skins
    }

    pub fn find(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    pub fn rest_pose(&self) -> Vec<Instance> {
        self.nodes.iter().map(|node| node.rest).collect()
    }

    /// World matrices of every node for `pose`.
    pub fn global_transforms(&self, pose: &[Instance]) -> Vec<Matrix4<f32>> {
        let mut globals = vec![Matrix4::identity(); self.nodes.len()];
        for &idx in &self.order {
            let local = pose
                .get(idx)
                .unwrap_or(&self.nodes[idx].rest)
                .to_matrix();
            globals[idx] = match self.nodes[idx].parent {
                Some(parent) => globals[parent] * local,
                None => local,
            };
        }
        globals
    }

    /// `global(joint) * inverse_bind(joint)` for every joint of `skin`.
    pub fn skin_palette(&self, skin: usize, globals: &[Matrix4<f32>]) -> Vec<Matrix4<f32>> {
        let Some(skin) = self.skins.get(skin) else {
            return Vec::new();
        };
        skin.joints
            .iter()
            .enumerate()
            .map(|(i, &joint)| {
                let inverse_bind = skin
                    .inverse_bind
                    .get(i)
                    .copied()
                    .unwrap_or(Matrix4::identity());
                globals[joint] * inverse_bind
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Vector3, Vector4};

    fn node(name: &str, parent: Option<usize>, offset: [f32; 3]) -> Node {
        Node {
            name: name.to_string(),
            parent,
            rest: Instance::from(Vector3::from(offset)),
        }
    }

    fn chain() -> Skeleton {
        // children listed before their parent on purpose
        Skeleton::new(
            vec![
                node("hand", Some(1), [0.0, 1.0, 0.0]),
                node("arm", Some(2), [0.0, 2.0, 0.0]),
                node("root", None, [1.0, 0.0, 0.0]),
            ],
            vec![Skin {
                name: "rig".to_string(),
                joints: vec![2, 1, 0],
                inverse_bind: vec![
                    Matrix4::from_translation(Vector3::new(-1.0, 0.0, 0.0)),
                    Matrix4::from_translation(Vector3::new(-1.0, -2.0, 0.0)),
                    Matrix4::from_translation(Vector3::new(-1.0, -3.0, 0.0)),
                ],
            }],
        )
        .unwrap()
    }

    #[test]
    fn globals_accumulate_down_the_hierarchy() {
        let skeleton = chain();
        let globals = skeleton.global_transforms(&skeleton.rest_pose());
        let hand = globals[0] * Vector4::new(0.0, 0.0, 0.0, 1.0);
        assert_eq!(hand, Vector4::new(1.0, 3.0, 0.0, 1.0));
    }

    #[test]
    fn rest_pose_palette_is_identity() {
        let skeleton = chain();
        let globals = skeleton.global_transforms(&skeleton.rest_pose());
        for joint in skeleton.skin_palette(0, &globals) {
            assert_eq!(joint, Matrix4::identity());
        }
    }

    #[test]
    fn posed_parent_moves_children() {
        let skeleton = chain();
        let mut pose = skeleton.rest_pose();
        pose[2].position = Vector3::new(5.0, 0.0, 0.0);
        let globals = skeleton.global_transforms(&pose);
        let palette = skeleton.skin_palette(0, &globals);
        let moved = palette[2] * Vector4::new(1.0, 3.0, 0.0, 1.0);
        assert_eq!(moved, Vector4::new(5.0, 3.0, 0.0, 1.0));
    }

    #[test]
    fn looks_up_nodes_by_name() {
        let skeleton = chain();
        assert_eq!(skeleton.find("arm"), Some(1));
        assert_eq!(skeleton.find("leg"), None);
    }

    #[test]
    fn rejects_oversized_skins() {
        let nodes = (0..MAX_JOINTS + 1)
            .map(|i| node(&format!("j{i}"), None, [0.0; 3]))
            .collect();
        let skin = Skin {
            name: "big".to_string(),
            joints: (0..MAX_JOINTS + 1).collect(),
            inverse_bind: Vec::new(),
        };
        assert_eq!(
            Skeleton::new(nodes, vec![skin]),
            Err(ViewerError::TooManyJoints {
                name: "big".to_string(),
                joints: MAX_JOINTS + 1,
                max: MAX_JOINTS,
            })
        );
    }

    #[test]
    fn rejects_cycles() {
        let nodes = vec![node("a", Some(1), [0.0; 3]), node("b", Some(0), [0.0; 3])];
        assert!(matches!(
            Skeleton::new(nodes, Vec::new()),
            Err(ViewerError::InvalidAsset { .. })
        ));
    }
}
