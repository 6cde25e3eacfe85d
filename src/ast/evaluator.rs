// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Evaluator - folds a node tree into an exact solid
//!
//! Children are combined in tree order. The first child with a non-empty
//! dimension sets the running result; later children of another dimension
//! are skipped without a diagnostic. Operator results are cached by subtree
//! content together with the diagnostics they produced.

use super::cache::GeometryCache;
use super::node::{Node, NodeKind};
use super::preview::{self, PreviewResult};
use crate::config::EvalConfig;
use crate::diagnostics::Diagnostics;
use crate::error::{GeometryError, GeometryResult};
use crate::geometry::{EarcutTessellator, ExactSolid, Mesh, Tessellator};
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

pub const HULL_3D_WARNING: &str = "WARNING: hull() is not implemented yet for 3D objects!";
pub const GLIDE_WARNING: &str = "WARNING: glide() is not implemented yet!";
pub const SUBDIV_WARNING: &str = "WARNING: subdiv() is not implemented yet!";
pub const NO_EXACT_WARNING: &str =
    "WARNING: found an advanced/boolean statement but built without exact-geometry support";

/// Result of an exact evaluation
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub solid: Arc<ExactSolid>,
    pub diagnostics: Vec<String>,
}

impl Evaluation {
    pub fn mesh(&self) -> Mesh {
        self.solid.to_mesh()
    }
}

/// Snapshot of evaluator activity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EvaluatorCounters {
    /// Leaf meshes converted to exact solids
    pub leaf_evaluations: usize,
    pub cache_hits: usize,
    pub cache_misses: usize,
}

#[derive(Debug, Default)]
struct Counters {
    leaf_evaluations: AtomicUsize,
    cache_hits: AtomicUsize,
    cache_misses: AtomicUsize,
}

/// Tree evaluator with a pluggable 2D tessellator
pub struct Evaluator {
    config: EvalConfig,
    tessellator: Arc<dyn Tessellator>,
    counters: Counters,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new(EvalConfig::default())
    }
}

impl Evaluator {
    pub fn new(config: EvalConfig) -> Self {
        Self {
            config,
            tessellator: Arc::new(EarcutTessellator),
            counters: Counters::default(),
        }
    }

    /// Use an external tessellator for polygon primitives
    pub fn with_tessellator(mut self, tessellator: Arc<dyn Tessellator>) -> Self {
        self.tessellator = tessellator;
        self
    }

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    pub fn tessellator(&self) -> &dyn Tessellator {
        self.tessellator.as_ref()
    }

    pub fn counters(&self) -> EvaluatorCounters {
        EvaluatorCounters {
            leaf_evaluations: self.counters.leaf_evaluations.load(Ordering::Relaxed),
            cache_hits: self.counters.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.counters.cache_misses.load(Ordering::Relaxed),
        }
    }

    pub fn reset_counters(&self) {
        self.counters.leaf_evaluations.store(0, Ordering::Relaxed);
        self.counters.cache_hits.store(0, Ordering::Relaxed);
        self.counters.cache_misses.store(0, Ordering::Relaxed);
    }

    /// Evaluate a tree into an exact solid
    pub fn evaluate(&self, root: &Node, cache: &GeometryCache) -> Evaluation {
        let start = Instant::now();
        let before = self.counters();
        let mut diagnostics = Diagnostics::new();

        let solid = match self.evaluate_node(root, cache, &mut diagnostics) {
            Ok(solid) => solid,
            Err(err) => {
                diagnostics.warn(failure_message(None, root.idx, &err));
                Arc::new(ExactSolid::Empty)
            }
        };

        let after = self.counters();
        info!(
            node = root.idx,
            dimension = solid.dimension().as_u8(),
            vertices = solid.weight(),
            cache_hits = after.cache_hits - before.cache_hits,
            cache_misses = after.cache_misses - before.cache_misses,
            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Evaluation complete"
        );

        Evaluation {
            solid,
            diagnostics: diagnostics.into_messages(),
        }
    }

    /// Build preview terms for a tree
    pub fn preview(&self, root: &Node, cache: &GeometryCache) -> PreviewResult {
        preview::build(self, root, cache)
    }

    pub(crate) fn evaluate_node(
        &self,
        node: &Node,
        cache: &GeometryCache,
        diag: &mut Diagnostics,
    ) -> GeometryResult<Arc<ExactSolid>> {
        stacker::maybe_grow(self.config.stack_red_zone, self.config.stack_growth, || {
            match &node.kind {
                NodeKind::Primitive(primitive) => {
                    self.leaf(&primitive.to_mesh_with(self.tessellator.as_ref()))
                }
                NodeKind::Import(imported) => self.leaf(&imported.mesh),
                _ => Ok(self.evaluate_operator(node, cache, diag)),
            }
        })
    }

    fn leaf(&self, mesh: &Mesh) -> GeometryResult<Arc<ExactSolid>> {
        self.counters.leaf_evaluations.fetch_add(1, Ordering::Relaxed);
        ExactSolid::from_mesh(mesh).map(Arc::new)
    }

    #[cfg(not(feature = "exact"))]
    fn evaluate_operator(
        &self,
        _node: &Node,
        _cache: &GeometryCache,
        diag: &mut Diagnostics,
    ) -> Arc<ExactSolid> {
        diag.warn(NO_EXACT_WARNING);
        Arc::new(ExactSolid::Empty)
    }

    #[cfg(feature = "exact")]
    fn evaluate_operator(
        &self,
        node: &Node,
        cache: &GeometryCache,
        diag: &mut Diagnostics,
    ) -> Arc<ExactSolid> {
        use super::cache_key::cache_key;
        use tracing::debug;

        let key = cache_key(node);
        if let Some(entry) = cache.get(&key) {
            self.counters.cache_hits.fetch_add(1, Ordering::Relaxed);
            debug!(node = node.idx, ?key, "Cache hit");
            diag.replay(&entry.messages, self.config.replay_warnings);
            return Arc::clone(&entry.solid);
        }

        self.counters.cache_misses.fetch_add(1, Ordering::Relaxed);
        debug!(node = node.idx, ?key, "Cache miss");

        diag.push_frame();
        let solid = self.compute_operator(&node.kind, cache, diag);
        let messages = diag.pop_frame();
        cache.insert(key, Arc::clone(&solid), messages);
        solid
    }

    #[cfg(feature = "exact")]
    fn compute_operator(
        &self,
        kind: &NodeKind,
        cache: &GeometryCache,
        diag: &mut Diagnostics,
    ) -> Arc<ExactSolid> {
        use super::node::AdvancedOp;
        use crate::geometry::{boolean, minkowski, CsgOp};

        match kind {
            NodeKind::Csg { op, children } => {
                self.fold(op.name(), children, cache, diag, |a, b| boolean::apply(*op, a, b))
            }
            NodeKind::Transform { matrix, children } => {
                let combined = self.fold("multmatrix", children, cache, diag, |a, b| {
                    boolean::apply(CsgOp::Union, a, b)
                });
                Arc::new(combined.transform(matrix))
            }
            NodeKind::Advanced { op, children, .. } => match op {
                AdvancedOp::Minkowski => {
                    self.fold("minkowski", children, cache, diag, minkowski::minkowski)
                }
                AdvancedOp::Hull => self.hull(children, cache, diag),
                AdvancedOp::Glide { .. } => {
                    diag.warn(GLIDE_WARNING);
                    Arc::new(ExactSolid::Empty)
                }
                AdvancedOp::Subdiv { .. } => {
                    diag.warn(SUBDIV_WARNING);
                    Arc::new(ExactSolid::Empty)
                }
            },
            // leaves are converted in evaluate_node
            NodeKind::Primitive(_) | NodeKind::Import(_) => Arc::new(ExactSolid::Empty),
        }
    }

    #[cfg(feature = "exact")]
    fn fold<F>(
        &self,
        name: &str,
        children: &[Node],
        cache: &GeometryCache,
        diag: &mut Diagnostics,
        combine: F,
    ) -> Arc<ExactSolid>
    where
        F: Fn(&ExactSolid, &ExactSolid) -> GeometryResult<ExactSolid>,
    {
        use crate::geometry::Dimension;
        use tracing::debug;

        let mut result: Option<Arc<ExactSolid>> = None;
        for child in children.iter().filter(|child| !child.flags.background) {
            let solid = match self.evaluate_node(child, cache, diag) {
                Ok(solid) => solid,
                Err(err) => {
                    diag.warn(failure_message(Some(name), child.idx, &err));
                    continue;
                }
            };

            match result.as_ref() {
                None => {
                    if solid.dimension() != Dimension::Empty {
                        result = Some(solid);
                    }
                }
                Some(current) => {
                    if current.dimension() != solid.dimension() {
                        debug!(node = child.idx, op = name, "Skipping child of another dimension");
                        continue;
                    }
                    match combine(current, &solid) {
                        Ok(combined) => result = Some(Arc::new(combined)),
                        Err(err) => diag.warn(failure_message(Some(name), child.idx, &err)),
                    }
                }
            }
        }
        result.unwrap_or_else(|| Arc::new(ExactSolid::Empty))
    }

    #[cfg(feature = "exact")]
    fn hull(&self, children: &[Node], cache: &GeometryCache, diag: &mut Diagnostics) -> Arc<ExactSolid> {
        use crate::geometry::hull::hull_2d;
        use geo::CoordsIter;
        use nalgebra::Point2;

        let mut points = Vec::new();
        let mut planar = false;
        for child in children.iter().filter(|child| !child.flags.background) {
            let solid = match self.evaluate_node(child, cache, diag) {
                Ok(solid) => solid,
                Err(err) => {
                    diag.warn(failure_message(Some("hull"), child.idx, &err));
                    continue;
                }
            };
            match solid.as_ref() {
                ExactSolid::Planar(region) => {
                    planar = true;
                    points.extend(region.exterior_coords_iter().map(|c| Point2::new(c.x, c.y)));
                }
                ExactSolid::Solid(_) => diag.warn(HULL_3D_WARNING),
                ExactSolid::Empty => {}
            }
        }

        if !planar {
            return Arc::new(ExactSolid::Empty);
        }
        Arc::new(ExactSolid::Planar(hull_2d(&points)))
    }
}

/// Diagnostic for a child that could not be used
pub(crate) fn failure_message(op: Option<&str>, idx: usize, err: &GeometryError) -> String {
    let target = match op {
        Some(op) => format!("n{} in {}()", idx, op),
        None => format!("n{}", idx),
    };
    match err {
        GeometryError::InconsistentWinding => format!(
            "ERROR: Illegal polygonal object - make sure all polygons are defined with the same winding order. Skipping affected object {}.",
            target
        ),
        other => format!("WARNING: skipping {}: {}", target, other),
    }
}

#[cfg(all(test, feature = "exact"))]
mod tests {
    use super::*;
    use crate::ast::NodeFactory;
    use crate::geometry::Dimension;
    use approx::assert_relative_eq;
    use nalgebra::{Point3, Vector2, Vector3};

    fn bad_winding(f: &NodeFactory) -> Node {
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ];
        f.polyhedron(points, vec![vec![0, 1, 2], vec![0, 1, 3]], 1)
    }

    #[test]
    fn test_first_non_empty_child_sets_dimension() {
        let f = NodeFactory::new();
        let tree = f.difference(vec![
            f.sphere(0.0, Default::default()),
            f.square(Vector2::new(2.0, 2.0), false),
            f.cube(Vector3::new(1.0, 1.0, 1.0), false),
        ]);
        let result = Evaluator::default().evaluate(&tree, &GeometryCache::default());
        assert_eq!(result.solid.dimension(), Dimension::Planar);
        assert_relative_eq!(result.solid.area(), 4.0, epsilon = 1e-9);
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn test_winding_error_is_reported_and_skipped() {
        let f = NodeFactory::new();
        let bad = bad_winding(&f);
        let tree = f.union(vec![bad, f.cube(Vector3::new(1.0, 1.0, 1.0), false)]);
        let result = Evaluator::default().evaluate(&tree, &GeometryCache::default());

        assert_relative_eq!(result.solid.volume(), 1.0, epsilon = 1e-9);
        assert_eq!(result.diagnostics.len(), 1);
        assert!(result.diagnostics[0].starts_with("ERROR: Illegal polygonal object"));
        assert!(result.diagnostics[0].contains("n0 in union()"));
    }

    #[test]
    fn test_background_children_ignored() {
        let f = NodeFactory::new();
        let tree = f.union(vec![
            f.cube(Vector3::new(1.0, 1.0, 1.0), false),
            f.translate(
                Vector3::new(5.0, 0.0, 0.0),
                vec![f.cube(Vector3::new(1.0, 1.0, 1.0), false)],
            )
            .background(),
        ]);
        let result = Evaluator::default().evaluate(&tree, &GeometryCache::default());
        assert_relative_eq!(result.solid.volume(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_transform_moves_union() {
        let f = NodeFactory::new();
        let tree = f.translate(
            Vector3::new(10.0, 0.0, 0.0),
            vec![f.cube(Vector3::new(1.0, 1.0, 1.0), false)],
        );
        let result = Evaluator::default().evaluate(&tree, &GeometryCache::default());
        let bbox = result.solid.bounding_box();
        assert_relative_eq!(bbox.min.x, 10.0, epsilon = 1e-12);
        assert_relative_eq!(bbox.max.x, 11.0, epsilon = 1e-12);
    }

    #[test]
    fn test_root_leaf_failure() {
        let f = NodeFactory::new();
        let result = Evaluator::default().evaluate(&bad_winding(&f), &GeometryCache::default());
        assert!(result.solid.is_empty());
        assert!(result.diagnostics[0].ends_with("Skipping affected object n0."));
    }
}
