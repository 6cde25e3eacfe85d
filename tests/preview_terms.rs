// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Preview term builder tests

use nalgebra::{Vector2, Vector3};
use polyframe_csg::geometry::Resolution;
use polyframe_csg::{CsgTerm, Evaluator, GeometryCache, Kernel, NodeFactory};
use std::sync::Arc;

#[test]
fn test_mixed_operations_fold_in_order() {
    let f = NodeFactory::new();
    let tree = f.difference(vec![
        f.union(vec![
            f.cube(Vector3::new(2.0, 2.0, 2.0), false),
            f.sphere(1.0, Resolution::fixed(8)),
        ]),
        f.intersection(vec![
            f.cylinder(3.0, 1.0, 1.0, false, Resolution::fixed(8)),
            f.cube(Vector3::new(1.0, 1.0, 1.0), true),
        ]),
    ]);
    let result = Evaluator::default().preview(&tree, &GeometryCache::default());

    let root = result.root.expect("preview term");
    assert_eq!(root.describe(), "((n0 + n1) - (n3 * n4))");
    assert_eq!(root.leaf_count(), 4);
    assert!(result.highlights.is_empty());
    assert!(result.background.is_empty());
}

#[test]
fn test_preview_does_not_touch_cache_for_plain_booleans() {
    let f = NodeFactory::new();
    let tree = f.union(vec![
        f.cube(Vector3::new(1.0, 1.0, 1.0), false),
        f.cube(Vector3::new(1.0, 1.0, 1.0), true),
    ]);
    let cache = GeometryCache::default();
    Evaluator::default().preview(&tree, &cache);
    assert!(cache.is_empty());
}

#[test]
fn test_nested_highlight_keeps_transform() {
    let f = NodeFactory::new();
    let tree = f.union(vec![
        f.cube(Vector3::new(1.0, 1.0, 1.0), false),
        f.translate(
            Vector3::new(0.0, 0.0, 5.0),
            vec![f.cube(Vector3::new(1.0, 1.0, 1.0), false).highlighted()],
        ),
    ]);
    let result = Evaluator::default().preview(&tree, &GeometryCache::default());

    assert_eq!(result.highlights.len(), 1);
    match result.highlights[0].as_ref() {
        CsgTerm::Leaf { label, transform, .. } => {
            assert_eq!(label, "n1");
            assert_eq!(transform[(2, 3)], 5.0);
        }
        CsgTerm::Op { .. } => panic!("expected a leaf"),
    }
}

#[test]
fn test_background_subtree_is_collected_whole() {
    let f = NodeFactory::new();
    let ghost = f
        .difference(vec![
            f.square(Vector2::new(2.0, 2.0), false),
            f.circle(0.5, Resolution::fixed(6)),
        ])
        .background();
    let tree = f.union(vec![ghost, f.square(Vector2::new(1.0, 1.0), false)]);
    let result = Evaluator::default().preview(&tree, &GeometryCache::default());

    assert_eq!(result.root.expect("preview term").describe(), "n3");
    assert_eq!(result.background.len(), 1);
    assert_eq!(result.background[0].describe(), "(n0 - n1)");
}

#[test]
fn test_highlighted_background_goes_to_both_lists() {
    let f = NodeFactory::new();
    let tree = f.union(vec![f.cube(Vector3::new(1.0, 1.0, 1.0), false).highlighted().background()]);
    let result = Evaluator::default().preview(&tree, &GeometryCache::default());

    assert!(result.root.is_none());
    assert!(Arc::ptr_eq(&result.highlights[0], &result.background[0]));
}

#[cfg(feature = "exact")]
#[test]
fn test_advanced_node_becomes_exact_leaf() {
    let f = NodeFactory::new();
    let tree = f.difference(vec![
        f.hull(vec![
            f.circle(1.0, Resolution::fixed(8)),
            f.translate(Vector3::new(4.0, 0.0, 0.0), vec![f.circle(1.0, Resolution::fixed(8))]),
        ]),
        f.square(Vector2::new(1.0, 1.0), true),
    ]);

    let kernel = Kernel::with_tree(tree);
    let result = kernel.preview();

    assert_eq!(result.root.expect("preview term").describe(), "(n3 - n4)");
    assert!(result.diagnostics.is_empty());
    // the hull was evaluated exactly, through the cache
    assert_eq!(kernel.cache_stats().entries, 2);
}

#[cfg(feature = "exact")]
#[test]
fn test_advanced_warnings_reach_preview() {
    let f = NodeFactory::new();
    let tree = f.union(vec![f.subdiv(2, vec![f.cube(Vector3::new(1.0, 1.0, 1.0), false)])]);
    let result = Evaluator::default().preview(&tree, &GeometryCache::default());
    assert_eq!(result.diagnostics, vec![polyframe_csg::ast::SUBDIV_WARNING.to_string()]);
}
