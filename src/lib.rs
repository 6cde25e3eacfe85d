// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Polyframe CSG core
//!
//! Evaluates an immutable tree of solid-modeling nodes: primitives are
//! tessellated into meshes, subtrees are combined with dimension-aware
//! boolean algebra into exact solids (cached by subtree content), and a
//! separate pass builds approximate preview terms.

pub mod ast;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod geometry;
pub mod kernel;
pub mod utils;

pub use ast::{
    dump, CsgTerm, Evaluation, Evaluator, GeometryCache, Node, NodeFactory, NodeKind,
    PreviewResult,
};
pub use config::EvalConfig;
pub use error::{GeometryError, GeometryResult};
pub use geometry::{CsgOp, ExactSolid, Mesh, Primitive};
pub use kernel::Kernel;

use anyhow::{Context, Result};
use std::path::Path;

/// Read a JSON node tree
pub fn load_tree(path: impl AsRef<Path>) -> Result<Node> {
    let content = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("Failed to read tree file: {:?}", path.as_ref()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse tree file: {:?}", path.as_ref()))
}

/// Evaluate a tree once with default settings and a fresh cache
pub fn render(root: &Node) -> Evaluation {
    Evaluator::default().evaluate(root, &GeometryCache::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    #[test]
    fn test_basic_cube() {
        let f = NodeFactory::new();
        let result = render(&f.cube(Vector3::new(10.0, 10.0, 10.0), false));
        assert!(result.diagnostics.is_empty());
        assert_eq!(result.mesh().polygon_count(), 6);
    }

    #[test]
    fn test_load_tree() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tree.json");
        std::fs::write(
            &path,
            r#"{ "idx": 0, "kind": { "primitive": { "type": "circle", "r": 2.0 } } }"#,
        )
        .unwrap();
        assert_eq!(load_tree(&path).unwrap().count(), 1);
        assert!(load_tree(dir.path().join("missing.json")).is_err());
    }
}
