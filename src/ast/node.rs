// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Node tree definitions

use super::cache_key::CacheKey;
use crate::geometry::{CsgOp, Mesh, Primitive};
use nalgebra::{Matrix4, Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Display modifiers attached to a node
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeFlags {
    /// Shown highlighted in previews; does not change geometry
    #[serde(default)]
    pub highlight: bool,
    /// Excluded from the geometry and shown as a ghost in previews
    #[serde(default)]
    pub background: bool,
}

/// Lazily computed per-node values
#[derive(Debug, Clone, Default)]
pub(crate) struct NodeMemo {
    pub(crate) dump: OnceLock<String>,
    pub(crate) key: OnceLock<CacheKey>,
}

/// Immutable tree node
///
/// Fields are read through accessors so memoized dumps and cache keys stay
/// in sync with the content; edits go through [`Node::replace`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Stable index used in dumps and diagnostics
    pub(crate) idx: usize,
    #[serde(default)]
    pub(crate) flags: NodeFlags,
    pub(crate) kind: NodeKind,
    #[serde(skip)]
    pub(crate) memo: NodeMemo,
}

impl Node {
    pub fn new(idx: usize, kind: NodeKind) -> Self {
        Self {
            idx,
            flags: NodeFlags::default(),
            kind,
            memo: NodeMemo::default(),
        }
    }

    pub fn highlighted(mut self) -> Self {
        self.flags.highlight = true;
        self.invalidate_memo();
        self
    }

    pub fn background(mut self) -> Self {
        self.flags.background = true;
        self.invalidate_memo();
        self
    }

    pub fn idx(&self) -> usize {
        self.idx
    }

    pub fn flags(&self) -> NodeFlags {
        self.flags
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn children(&self) -> &[Node] {
        self.kind.children()
    }

    /// Forget memoized dump text and cache key of this node
    fn invalidate_memo(&mut self) {
        self.memo = NodeMemo::default();
    }

    /// Find a node by index anywhere in this subtree
    pub fn find(&self, idx: usize) -> Option<&Node> {
        if self.idx == idx {
            return Some(self);
        }
        self.children().iter().find_map(|child| child.find(idx))
    }

    /// Replace the node with index `idx` by `replacement`.
    ///
    /// Memos of every ancestor on the way down are invalidated. Returns
    /// false when no node carries that index.
    pub fn replace(&mut self, idx: usize, replacement: Node) -> bool {
        let mut slot = Some(replacement);
        self.replace_inner(idx, &mut slot)
    }

    fn replace_inner(&mut self, idx: usize, slot: &mut Option<Node>) -> bool {
        if self.idx == idx {
            if let Some(node) = slot.take() {
                *self = node;
                return true;
            }
            return false;
        }
        let Some(children) = self.kind.children_mut() else {
            return false;
        };
        let replaced = children.iter_mut().any(|child| child.replace_inner(idx, slot));
        if replaced {
            self.invalidate_memo();
        }
        replaced
    }

    /// Number of nodes in this subtree
    pub fn count(&self) -> usize {
        1 + self.children().iter().map(Node::count).sum::<usize>()
    }
}

/// Types of tree nodes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Primitive(Primitive),

    Csg {
        op: CsgOp,
        #[serde(default)]
        children: Vec<Node>,
    },

    Advanced {
        op: AdvancedOp,
        #[serde(default = "default_convexity")]
        convexity: u32,
        #[serde(default)]
        children: Vec<Node>,
    },

    /// Affine transform; children are combined by union
    Transform {
        matrix: Matrix4<f64>,
        #[serde(default)]
        children: Vec<Node>,
    },

    Import(ImportedMesh),
}

fn default_convexity() -> u32 {
    1
}

impl NodeKind {
    pub fn children(&self) -> &[Node] {
        match self {
            NodeKind::Csg { children, .. }
            | NodeKind::Advanced { children, .. }
            | NodeKind::Transform { children, .. } => children,
            NodeKind::Primitive(_) | NodeKind::Import(_) => &[],
        }
    }

    fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            NodeKind::Csg { children, .. }
            | NodeKind::Advanced { children, .. }
            | NodeKind::Transform { children, .. } => Some(children),
            NodeKind::Primitive(_) | NodeKind::Import(_) => None,
        }
    }

    /// True for nodes whose exact result is stored in the geometry cache
    pub fn is_operator(&self) -> bool {
        !matches!(self, NodeKind::Primitive(_) | NodeKind::Import(_))
    }
}

/// Advanced (exact-geometry only) operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvancedOp {
    Minkowski,
    Glide {
        #[serde(default)]
        path: Option<Vec<Point3<f64>>>,
    },
    Subdiv {
        #[serde(default)]
        level: u32,
    },
    Hull,
}

impl AdvancedOp {
    pub fn name(&self) -> &'static str {
        match self {
            AdvancedOp::Minkowski => "minkowski",
            AdvancedOp::Glide { .. } => "glide",
            AdvancedOp::Subdiv { .. } => "subdiv",
            AdvancedOp::Hull => "hull",
        }
    }
}

/// Mesh handed over by an external importer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportedMesh {
    pub source: String,
    #[serde(default = "default_convexity")]
    pub convexity: u32,
    pub mesh: Mesh,
}

/// Transformation operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TransformOp {
    Translate(Vector3<f64>),
    /// Euler angles in degrees, applied x then y then z
    Rotate(Vector3<f64>),
    Scale(Vector3<f64>),
    /// Reflect across the plane through the origin with this normal
    Mirror(Vector3<f64>),
    Multmatrix(Matrix4<f64>),
}

impl TransformOp {
    /// Convert transformation to a 4x4 matrix
    pub fn to_matrix(&self) -> Matrix4<f64> {
        use nalgebra::UnitQuaternion;

        match self {
            TransformOp::Translate(v) => Matrix4::new_translation(v),
            TransformOp::Rotate(angles) => {
                let rx = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), angles.x.to_radians());
                let ry = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), angles.y.to_radians());
                let rz = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), angles.z.to_radians());
                (rz * ry * rx).to_homogeneous()
            }
            TransformOp::Scale(s) => Matrix4::new_nonuniform_scaling(s),
            TransformOp::Mirror(normal) => {
                let length = normal.norm();
                if length == 0.0 {
                    return Matrix4::identity();
                }
                let n = normal / length;
                let mut m = Matrix4::identity();
                m.fixed_view_mut::<3, 3>(0, 0)
                    .copy_from(&(nalgebra::Matrix3::identity() - 2.0 * n * n.transpose()));
                m
            }
            TransformOp::Multmatrix(m) => *m,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube(idx: usize) -> Node {
        Node::new(
            idx,
            NodeKind::Primitive(Primitive::cube(Vector3::new(1.0, 1.0, 1.0), false)),
        )
    }

    #[test]
    fn test_replace_by_index() {
        let mut root = Node::new(
            0,
            NodeKind::Csg {
                op: CsgOp::Union,
                children: vec![cube(1), cube(2)],
            },
        );
        root.memo.dump.set("stale".to_string()).unwrap();

        assert!(root.replace(2, cube(7)));
        assert!(root.memo.dump.get().is_none());
        assert!(root.find(7).is_some());
        assert!(root.find(2).is_none());
        assert!(!root.replace(42, cube(8)));
    }

    #[test]
    fn test_edited_clone_recomputes_memos() {
        use crate::ast::{cache_key, dump};

        let original = Node::new(
            0,
            NodeKind::Csg {
                op: CsgOp::Union,
                children: vec![cube(1), cube(2)],
            },
        );
        let key = cache_key(&original);
        let text = dump(&original).to_string();

        let mut edited = original.clone();
        let bigger = Node::new(
            2,
            NodeKind::Primitive(Primitive::cube(Vector3::new(3.0, 3.0, 3.0), false)),
        );
        assert!(edited.replace(2, bigger));

        assert_ne!(cache_key(&edited), key);
        assert_ne!(dump(&edited), text);
        assert_eq!(cache_key(&original), key);
        assert_eq!(dump(&original), text);
    }

    #[test]
    fn test_flag_builders_drop_memos() {
        let node = cube(1);
        node.memo.dump.set("stale".to_string()).unwrap();
        let node = node.background();
        assert!(node.memo.dump.get().is_none());
        assert!(node.flags().background);
    }

    #[test]
    fn test_mirror_matrix() {
        let m = TransformOp::Mirror(Vector3::new(1.0, 0.0, 0.0)).to_matrix();
        let p = m.transform_point(&Point3::new(2.0, 3.0, 4.0));
        assert_eq!(p, Point3::new(-2.0, 3.0, 4.0));
    }

    #[test]
    fn test_json_tree() {
        let json = r#"{
            "idx": 0,
            "kind": { "csg": { "op": "difference", "children": [
                { "idx": 1, "kind": { "primitive": { "type": "cube", "size": [2, 2, 2] } } },
                { "idx": 2, "flags": { "background": true },
                  "kind": { "primitive": { "type": "sphere", "r": 1.0 } } }
            ] } }
        }"#;
        let node: Node = serde_json::from_str(json).unwrap();
        assert_eq!(node.count(), 3);
        assert!(node.children()[1].flags.background);
    }
}
