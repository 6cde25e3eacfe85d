// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Convenience constructors that hand out sequential node indices

use super::node::{AdvancedOp, ImportedMesh, Node, NodeKind, TransformOp};
use crate::geometry::{CsgOp, Mesh, Primitive, Resolution};
use nalgebra::{Matrix4, Point2, Point3, Vector2, Vector3};
use std::cell::Cell;

/// Builds nodes with increasing `idx` values.
///
/// Methods take `&self` so calls can nest:
/// `f.union(vec![f.cube(..), f.sphere(..)])`.
#[derive(Debug, Default)]
pub struct NodeFactory {
    next: Cell<usize>,
}

impl NodeFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the index counter without creating nodes
    pub fn skip(&self, count: usize) {
        self.next.set(self.next.get() + count);
    }

    pub fn node(&self, kind: NodeKind) -> Node {
        let idx = self.next.get();
        self.next.set(idx + 1);
        Node::new(idx, kind)
    }

    pub fn primitive(&self, primitive: Primitive) -> Node {
        self.node(NodeKind::Primitive(primitive))
    }

    pub fn cube(&self, size: Vector3<f64>, center: bool) -> Node {
        self.primitive(Primitive::cube(size, center))
    }

    pub fn sphere(&self, r: f64, res: Resolution) -> Node {
        self.primitive(Primitive::sphere(r, res))
    }

    pub fn cylinder(&self, h: f64, r1: f64, r2: f64, center: bool, res: Resolution) -> Node {
        self.primitive(Primitive::cylinder(h, r1, r2, center, res))
    }

    pub fn polyhedron(&self, points: Vec<Point3<f64>>, triangles: Vec<Vec<usize>>, convexity: u32) -> Node {
        self.primitive(Primitive::polyhedron(points, triangles, convexity.max(1)))
    }

    pub fn square(&self, size: Vector2<f64>, center: bool) -> Node {
        self.primitive(Primitive::square(size, center))
    }

    pub fn circle(&self, r: f64, res: Resolution) -> Node {
        self.primitive(Primitive::circle(r, res))
    }

    pub fn polygon(&self, points: Vec<Point2<f64>>, paths: Vec<Vec<usize>>, convexity: u32) -> Node {
        self.primitive(Primitive::polygon(points, paths, convexity.max(1)))
    }

    pub fn csg(&self, op: CsgOp, children: Vec<Node>) -> Node {
        self.node(NodeKind::Csg { op, children })
    }

    pub fn union(&self, children: Vec<Node>) -> Node {
        self.csg(CsgOp::Union, children)
    }

    pub fn difference(&self, children: Vec<Node>) -> Node {
        self.csg(CsgOp::Difference, children)
    }

    pub fn intersection(&self, children: Vec<Node>) -> Node {
        self.csg(CsgOp::Intersection, children)
    }

    pub fn advanced(&self, op: AdvancedOp, convexity: u32, children: Vec<Node>) -> Node {
        self.node(NodeKind::Advanced {
            op,
            convexity: convexity.max(1),
            children,
        })
    }

    pub fn minkowski(&self, children: Vec<Node>) -> Node {
        self.advanced(AdvancedOp::Minkowski, 1, children)
    }

    pub fn hull(&self, children: Vec<Node>) -> Node {
        self.advanced(AdvancedOp::Hull, 1, children)
    }

    pub fn glide(&self, path: Option<Vec<Point3<f64>>>, children: Vec<Node>) -> Node {
        self.advanced(AdvancedOp::Glide { path }, 1, children)
    }

    pub fn subdiv(&self, level: u32, children: Vec<Node>) -> Node {
        self.advanced(AdvancedOp::Subdiv { level }, 1, children)
    }

    pub fn multmatrix(&self, matrix: Matrix4<f64>, children: Vec<Node>) -> Node {
        self.node(NodeKind::Transform { matrix, children })
    }

    pub fn transform(&self, op: TransformOp, children: Vec<Node>) -> Node {
        self.multmatrix(op.to_matrix(), children)
    }

    pub fn translate(&self, offset: Vector3<f64>, children: Vec<Node>) -> Node {
        self.transform(TransformOp::Translate(offset), children)
    }

    pub fn import(&self, source: impl Into<String>, mesh: Mesh) -> Node {
        let convexity = mesh.convexity.max(1);
        self.node(NodeKind::Import(ImportedMesh {
            source: source.into(),
            convexity,
            mesh,
        }))
    }
}
