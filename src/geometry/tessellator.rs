// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! 2D polygon tessellation

use geo::{BooleanOps, Coord, LineString, MultiPolygon, Polygon as GeoPolygon, TriangulateEarcut};
use nalgebra::Point2;

/// Turns closed 2D outlines into triangles covering their even-odd region.
///
/// Every ring passed in is closed (its last point repeats the first).
pub trait Tessellator: Send + Sync {
    fn tessellate(&self, rings: &[Vec<Point2<f64>>]) -> Vec<[Point2<f64>; 3]>;
}

/// Default tessellator: folds the rings into an even-odd region with
/// `geo`'s boolean ops, then ear-clips every resulting polygon.
#[derive(Debug, Clone, Copy, Default)]
pub struct EarcutTessellator;

impl Tessellator for EarcutTessellator {
    fn tessellate(&self, rings: &[Vec<Point2<f64>>]) -> Vec<[Point2<f64>; 3]> {
        let region = even_odd_region(rings);
        triangulate(&region)
    }
}

/// Convert a closed ring to a single-ring polygon
pub fn ring_to_polygon(ring: &[Point2<f64>]) -> GeoPolygon<f64> {
    let coords: Vec<Coord<f64>> = ring.iter().map(|p| Coord { x: p.x, y: p.y }).collect();
    GeoPolygon::new(LineString::new(coords), vec![])
}

/// Symmetric-difference fold of all rings
pub fn even_odd_region(rings: &[Vec<Point2<f64>>]) -> MultiPolygon<f64> {
    rings
        .iter()
        .filter(|ring| ring.len() >= 3)
        .map(|ring| MultiPolygon::new(vec![ring_to_polygon(ring)]))
        .fold(MultiPolygon::new(vec![]), |acc, next| acc.xor(&next))
}

/// Ear-clip every polygon of a region, holes included
pub fn triangulate(region: &MultiPolygon<f64>) -> Vec<[Point2<f64>; 3]> {
    let mut triangles = Vec::new();
    for polygon in region {
        for tri in polygon.earcut_triangles() {
            triangles.push([
                Point2::new(tri.0.x, tri.0.y),
                Point2::new(tri.1.x, tri.1.y),
                Point2::new(tri.2.x, tri.2.y),
            ]);
        }
    }
    triangles
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Area;

    fn square(x0: f64, y0: f64, size: f64) -> Vec<Point2<f64>> {
        vec![
            Point2::new(x0, y0),
            Point2::new(x0 + size, y0),
            Point2::new(x0 + size, y0 + size),
            Point2::new(x0, y0 + size),
            Point2::new(x0, y0),
        ]
    }

    fn triangle_area(tri: &[Point2<f64>; 3]) -> f64 {
        ((tri[1] - tri[0]).perp(&(tri[2] - tri[0])) / 2.0).abs()
    }

    #[test]
    fn test_nested_ring_becomes_hole() {
        let rings = vec![square(0.0, 0.0, 10.0), square(2.0, 2.0, 2.0)];
        let region = even_odd_region(&rings);
        assert!((region.unsigned_area() - 96.0).abs() < 1e-9);

        let triangles = EarcutTessellator.tessellate(&rings);
        let total: f64 = triangles.iter().map(triangle_area).sum();
        assert!((total - 96.0).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_rings_ignored() {
        let rings = vec![vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)]];
        assert!(EarcutTessellator.tessellate(&rings).is_empty());
    }
}
