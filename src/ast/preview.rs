// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Preview term builder
//!
//! Produces a binary tree of approximate boolean terms over leaf meshes,
//! plus the highlighted and background subtrees collected on the side.
//! Terms are shared through `Arc`, so a highlighted subtree appears in both
//! the main tree and the highlight list.

use super::cache::GeometryCache;
use super::evaluator::{failure_message, Evaluator, NO_EXACT_WARNING};
use super::node::{Node, NodeKind};
use crate::diagnostics::Diagnostics;
use crate::geometry::{CsgOp, Mesh};
use nalgebra::Matrix4;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub enum CsgTerm {
    Leaf {
        label: String,
        mesh: Arc<Mesh>,
        /// Accumulated transform from the root
        transform: Matrix4<f64>,
    },
    Op {
        kind: CsgOp,
        left: Arc<CsgTerm>,
        right: Arc<CsgTerm>,
    },
}

impl CsgTerm {
    pub fn leaf_count(&self) -> usize {
        match self {
            CsgTerm::Leaf { .. } => 1,
            CsgTerm::Op { left, right, .. } => left.leaf_count() + right.leaf_count(),
        }
    }

    /// Infix rendering, e.g. `((n0 + n1) - n2)`
    pub fn describe(&self) -> String {
        match self {
            CsgTerm::Leaf { label, .. } => label.clone(),
            CsgTerm::Op { kind, left, right } => {
                let symbol = match kind {
                    CsgOp::Union => '+',
                    CsgOp::Difference => '-',
                    CsgOp::Intersection => '*',
                };
                format!("({} {} {})", left.describe(), symbol, right.describe())
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PreviewResult {
    pub root: Option<Arc<CsgTerm>>,
    pub highlights: Vec<Arc<CsgTerm>>,
    pub background: Vec<Arc<CsgTerm>>,
    pub diagnostics: Vec<String>,
}

pub(crate) fn build(evaluator: &Evaluator, root: &Node, cache: &GeometryCache) -> PreviewResult {
    let mut builder = PreviewBuilder {
        evaluator,
        cache,
        diagnostics: Diagnostics::new(),
        highlights: Vec::new(),
        background: Vec::new(),
    };
    let term = builder.term(root, &Matrix4::identity());

    PreviewResult {
        root: term,
        highlights: builder.highlights,
        background: builder.background,
        diagnostics: builder.diagnostics.into_messages(),
    }
}

struct PreviewBuilder<'a> {
    evaluator: &'a Evaluator,
    cache: &'a GeometryCache,
    diagnostics: Diagnostics,
    highlights: Vec<Arc<CsgTerm>>,
    background: Vec<Arc<CsgTerm>>,
}

impl PreviewBuilder<'_> {
    fn term(&mut self, node: &Node, transform: &Matrix4<f64>) -> Option<Arc<CsgTerm>> {
        let config = self.evaluator.config();
        let (red_zone, growth) = (config.stack_red_zone, config.stack_growth);
        let term = stacker::maybe_grow(red_zone, growth, || self.build(node, transform))?;

        if node.flags.highlight {
            self.highlights.push(Arc::clone(&term));
        }
        if node.flags.background {
            self.background.push(term);
            return None;
        }
        Some(term)
    }

    fn build(&mut self, node: &Node, transform: &Matrix4<f64>) -> Option<Arc<CsgTerm>> {
        match &node.kind {
            NodeKind::Primitive(primitive) => {
                let mesh = primitive.to_mesh_with(self.evaluator.tessellator());
                Some(leaf(node, mesh, transform))
            }
            NodeKind::Import(imported) => Some(leaf(node, imported.mesh.clone(), transform)),
            NodeKind::Csg { op, children } => self.fold(*op, children, transform),
            NodeKind::Transform { matrix, children } => {
                self.fold(CsgOp::Union, children, &(transform * matrix))
            }
            NodeKind::Advanced { .. } => self.advanced(node, transform),
        }
    }

    fn fold(&mut self, op: CsgOp, children: &[Node], transform: &Matrix4<f64>) -> Option<Arc<CsgTerm>> {
        let mut result: Option<Arc<CsgTerm>> = None;
        for child in children {
            let Some(term) = self.term(child, transform) else {
                continue;
            };
            result = Some(match result {
                None => term,
                Some(left) => Arc::new(CsgTerm::Op {
                    kind: op,
                    left,
                    right: term,
                }),
            });
        }
        result
    }

    /// Advanced operations have no approximate form; their exact result
    /// becomes a single leaf.
    fn advanced(&mut self, node: &Node, transform: &Matrix4<f64>) -> Option<Arc<CsgTerm>> {
        if !cfg!(feature = "exact") {
            self.diagnostics.warn(NO_EXACT_WARNING);
            return None;
        }
        match self.evaluator.evaluate_node(node, self.cache, &mut self.diagnostics) {
            Ok(solid) => Some(leaf(node, solid.to_mesh(), transform)),
            Err(err) => {
                self.diagnostics.warn(failure_message(None, node.idx, &err));
                None
            }
        }
    }
}

fn leaf(node: &Node, mesh: Mesh, transform: &Matrix4<f64>) -> Arc<CsgTerm> {
    Arc::new(CsgTerm::Leaf {
        label: format!("n{}", node.idx),
        mesh: Arc::new(mesh),
        transform: *transform,
    })
}
