// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Error types for exact geometry construction and algebra

use thiserror::Error;

/// Result alias for fallible geometry steps
pub type GeometryResult<T> = Result<T, GeometryError>;

/// Recoverable failures raised while building or combining exact solids.
///
/// None of these abort an evaluation: the evaluator turns them into a
/// diagnostic and drops the offending operand.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum GeometryError {
    /// A directed edge is used by more than one facet, so the facets
    /// disagree about which side is outside.
    #[error("illegal polygonal object - make sure all polygons are defined with the same winding order")]
    InconsistentWinding,

    #[error("polygon contains a non-finite coordinate")]
    NonFiniteCoordinate,

    #[error("convex hull of {points} points is degenerate")]
    DegenerateHull { points: usize },

    #[error("cannot combine a {left}D object with a {right}D object")]
    DimensionMismatch { left: u8, right: u8 },
}
