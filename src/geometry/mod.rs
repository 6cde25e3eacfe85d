// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry module - meshes, primitives and exact solid algebra

pub mod analytics;
mod bbox;
pub mod boolean;
mod mesh;
pub mod primitives;
pub mod solid;
pub mod tessellator;

#[cfg(feature = "exact")]
pub mod csg;
#[cfg(feature = "exact")]
pub mod hull;
#[cfg(feature = "exact")]
pub mod minkowski;
#[cfg(feature = "exact")]
pub mod planar;

pub use analytics::{analyze_mesh, analyze_solid, GeometryStats};
pub use bbox::BoundingBox;
pub use boolean::CsgOp;
pub use mesh::{Border, Mesh, Polygon};
pub use primitives::{fragments_from_r, stitch_rings, Primitive, Resolution};
pub use solid::{Dimension, ExactSolid, Facet, Plane, Polyhedron};
pub use tessellator::{EarcutTessellator, Tessellator};
