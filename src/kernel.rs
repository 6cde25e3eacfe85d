// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Kernel API for repeated rendering of an editable tree

use crate::ast::{dump, CacheStats, Evaluation, Evaluator, GeometryCache, Node, PreviewResult};
use crate::config::EvalConfig;
use crate::geometry::ExactSolid;
use std::sync::Arc;
use tracing::debug;

/// Owns a tree, its evaluator and the geometry cache shared across renders
pub struct Kernel {
    evaluator: Evaluator,
    cache: GeometryCache,
    root: Option<Node>,
}

impl Kernel {
    pub fn new(config: EvalConfig) -> Self {
        Self {
            cache: GeometryCache::new(config.cache_capacity),
            evaluator: Evaluator::new(config),
            root: None,
        }
    }

    /// Initialize kernel with a tree
    pub fn with_tree(tree: Node) -> Self {
        let mut kernel = Self::default();
        kernel.root = Some(tree);
        kernel
    }

    /// Replace the evaluator, e.g. to plug in another tessellator
    pub fn with_evaluator(mut self, evaluator: Evaluator) -> Self {
        self.evaluator = evaluator;
        self
    }

    /// Exact render of the current tree
    pub fn render(&self) -> Evaluation {
        match &self.root {
            Some(root) => self.evaluator.evaluate(root, &self.cache),
            None => Evaluation {
                solid: Arc::new(ExactSolid::Empty),
                diagnostics: Vec::new(),
            },
        }
    }

    /// Preview terms of the current tree
    pub fn preview(&self) -> PreviewResult {
        match &self.root {
            Some(root) => self.evaluator.preview(root, &self.cache),
            None => PreviewResult::default(),
        }
    }

    /// Textual dump of the current tree
    pub fn dump(&self) -> String {
        self.root.as_ref().map(|root| dump(root).to_string()).unwrap_or_default()
    }

    /// Replace the node with index `idx`.
    ///
    /// Unchanged subtrees keep their content keys, so the next render only
    /// recomputes operators on the path to the replaced node.
    pub fn update_subtree(&mut self, idx: usize, node: Node) -> bool {
        let Some(root) = &mut self.root else {
            return false;
        };
        let replaced = root.replace(idx, node);
        debug!(node = idx, replaced, "Updated subtree");
        replaced
    }

    /// Set the root tree
    pub fn set_tree(&mut self, tree: Node) {
        self.root = Some(tree);
    }

    pub fn tree(&self) -> Option<&Node> {
        self.root.as_ref()
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    pub fn reset_cache(&self) {
        self.cache.clear();
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

impl Default for Kernel {
    fn default() -> Self {
        Self::new(EvalConfig::default())
    }
}

#[cfg(all(test, feature = "exact"))]
mod tests {
    use super::*;
    use crate::ast::NodeFactory;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    #[test]
    fn test_kernel_basic_render() {
        let f = NodeFactory::new();
        let kernel = Kernel::with_tree(f.union(vec![f.cube(Vector3::new(10.0, 10.0, 10.0), false)]));
        let result = kernel.render();
        assert_relative_eq!(result.solid.volume(), 1000.0, epsilon = 1e-6);
        assert_eq!(kernel.cache_stats().entries, 1);
    }

    #[test]
    fn test_kernel_update_subtree() {
        let f = NodeFactory::new();
        let kernel_tree = f.union(vec![
            f.cube(Vector3::new(1.0, 1.0, 1.0), false),
            f.translate(
                Vector3::new(5.0, 0.0, 0.0),
                vec![f.cube(Vector3::new(1.0, 1.0, 1.0), false)],
            ),
        ]);
        let mut kernel = Kernel::with_tree(kernel_tree);
        assert_relative_eq!(kernel.render().solid.volume(), 2.0, epsilon = 1e-6);

        let replacement = f.cube(Vector3::new(2.0, 2.0, 2.0), false);
        assert!(kernel.update_subtree(0, replacement));
        assert_relative_eq!(kernel.render().solid.volume(), 9.0, epsilon = 1e-6);

        let counters = kernel.evaluator().counters();
        // the translated cube is served from the cache on the second render
        assert_eq!(counters.cache_hits, 1);
        assert!(!kernel.update_subtree(99, f.cube(Vector3::new(1.0, 1.0, 1.0), false)));
    }

    #[test]
    fn test_reset_cache_and_dump() {
        let f = NodeFactory::new();
        let kernel = Kernel::with_tree(f.union(vec![f.square(nalgebra::Vector2::new(1.0, 1.0), true)]));
        kernel.render();
        assert_eq!(kernel.cache_stats().entries, 1);
        kernel.reset_cache();
        assert_eq!(kernel.cache_stats().entries, 0);
        assert!(kernel.dump().starts_with("n1: union() {\n"));
    }
}
