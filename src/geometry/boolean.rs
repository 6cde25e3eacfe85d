// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Dimension-aware boolean operations on exact solids

use super::solid::ExactSolid;
use crate::error::{GeometryError, GeometryResult};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CsgOp {
    Union,
    Difference,
    Intersection,
}

impl CsgOp {
    pub fn name(self) -> &'static str {
        match self {
            Self::Union => "union",
            Self::Difference => "difference",
            Self::Intersection => "intersection",
        }
    }
}

impl fmt::Display for CsgOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Perform a boolean operation between two solids of the same dimension
#[cfg(feature = "exact")]
pub fn apply(op: CsgOp, a: &ExactSolid, b: &ExactSolid) -> GeometryResult<ExactSolid> {
    use super::{csg, planar};

    match (a, b) {
        (ExactSolid::Planar(pa), ExactSolid::Planar(pb)) => Ok(ExactSolid::Planar(match op {
            CsgOp::Union => planar::union(pa, pb),
            CsgOp::Difference => planar::difference(pa, pb),
            CsgOp::Intersection => planar::intersection(pa, pb),
        })),
        (ExactSolid::Solid(pa), ExactSolid::Solid(pb)) => Ok(ExactSolid::Solid(match op {
            CsgOp::Union => csg::union(pa, pb),
            CsgOp::Difference => csg::difference(pa, pb),
            CsgOp::Intersection => csg::intersection(pa, pb),
        })),
        _ => Err(mismatch(a, b)),
    }
}

#[cfg(feature = "exact")]
pub(crate) fn mismatch(a: &ExactSolid, b: &ExactSolid) -> GeometryError {
    GeometryError::DimensionMismatch {
        left: a.dimension().as_u8(),
        right: b.dimension().as_u8(),
    }
}
