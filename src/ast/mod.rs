// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Node tree module
//!
//! Defines the immutable node tree and everything evaluated from it: the
//! textual dump, content keys, the geometry cache, exact evaluation and
//! preview terms.

mod builder;
mod cache;
mod cache_key;
mod dump;
mod evaluator;
mod node;
mod preview;

pub use builder::NodeFactory;
pub use cache::{CacheEntry, CacheStats, GeometryCache, DEFAULT_CAPACITY};
pub use cache_key::{cache_key, CacheKey};
pub use dump::dump;
pub use evaluator::{
    Evaluation, Evaluator, EvaluatorCounters, GLIDE_WARNING, HULL_3D_WARNING, NO_EXACT_WARNING,
    SUBDIV_WARNING,
};
pub use node::{AdvancedOp, ImportedMesh, Node, NodeFlags, NodeKind, TransformOp};
pub use preview::{CsgTerm, PreviewResult};
