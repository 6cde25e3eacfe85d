// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! 2D region algebra on top of `geo`'s boolean ops

use geo::orient::Direction;
use geo::{BooleanOps, MultiPolygon, Orient};

pub fn union(a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> MultiPolygon<f64> {
    if a.0.is_empty() {
        return b.clone();
    }
    if b.0.is_empty() {
        return a.clone();
    }
    a.union(b).orient(Direction::Default)
}

pub fn difference(a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> MultiPolygon<f64> {
    if a.0.is_empty() || b.0.is_empty() {
        return a.clone();
    }
    a.difference(b).orient(Direction::Default)
}

pub fn intersection(a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> MultiPolygon<f64> {
    if a.0.is_empty() || b.0.is_empty() {
        return MultiPolygon::new(vec![]);
    }
    a.intersection(b).orient(Direction::Default)
}

/// Union a list of regions pairwise, keeping the combination order fixed
pub fn union_all(mut regions: Vec<MultiPolygon<f64>>) -> MultiPolygon<f64> {
    while regions.len() > 1 {
        let mut next = Vec::with_capacity(regions.len().div_ceil(2));
        let mut iter = regions.into_iter();
        while let Some(a) = iter.next() {
            match iter.next() {
                Some(b) => next.push(union(&a, &b)),
                None => next.push(a),
            }
        }
        regions = next;
    }
    regions.pop().unwrap_or_else(|| MultiPolygon::new(vec![]))
}
