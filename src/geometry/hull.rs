// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Convex hulls of point sets

use super::solid::{Facet, Polyhedron};
use crate::error::{GeometryError, GeometryResult};
use ahash::AHashMap;
use geo::{Area, ConvexHull, Coord, MultiPoint, MultiPolygon, Point};
use nalgebra::{Point2, Point3, Vector3};

/// Convex hull of 2D points; empty when the points span no area
pub fn hull_2d(points: &[Point2<f64>]) -> MultiPolygon<f64> {
    let multi: MultiPoint<f64> = points
        .iter()
        .map(|p| Point::from(Coord { x: p.x, y: p.y }))
        .collect();
    let hull = multi.convex_hull();
    if hull.unsigned_area() > 0.0 {
        MultiPolygon::new(vec![hull])
    } else {
        MultiPolygon::new(vec![])
    }
}

/// Convex hull of 3D points as an outward-wound polyhedron.
///
/// The hull is found in single precision; every hull vertex is mapped
/// back to the input point it came from so coordinates stay exact.
pub fn hull_3d(points: &[Point3<f64>]) -> GeometryResult<Polyhedron> {
    let mut originals: AHashMap<[u32; 3], Point3<f64>> = AHashMap::with_capacity(points.len());
    let mut reduced = Vec::with_capacity(points.len());
    for p in points {
        let q = parry3d::math::Point::new(p.x as f32, p.y as f32, p.z as f32);
        let key = [q.x.to_bits(), q.y.to_bits(), q.z.to_bits()];
        if originals.insert(key, *p).is_none() {
            reduced.push(q);
        }
    }
    if reduced.len() < 4 {
        return Err(GeometryError::DegenerateHull {
            points: reduced.len(),
        });
    }

    let (vertices, triangles) = parry3d::transformation::try_convex_hull(&reduced)
        .map_err(|_| GeometryError::DegenerateHull {
            points: reduced.len(),
        })?;

    let exact: Vec<Point3<f64>> = vertices
        .iter()
        .map(|q| {
            originals
                .get(&[q.x.to_bits(), q.y.to_bits(), q.z.to_bits()])
                .copied()
                .unwrap_or_else(|| Point3::new(q.x as f64, q.y as f64, q.z as f64))
        })
        .collect();

    let centroid = exact.iter().fold(Vector3::zeros(), |acc, p| acc + p.coords) / exact.len() as f64;
    let facets: Vec<Facet> = triangles
        .iter()
        .filter_map(|tri| {
            let mut corners: Vec<Point3<f64>> = tri.iter().map(|&i| exact[i as usize]).collect();
            let facet = Facet::new(corners.clone())?;
            if facet.plane.signed_distance(&Point3::from(centroid)) > 0.0 {
                corners.reverse();
                return Facet::new(corners);
            }
            Some(facet)
        })
        .collect();

    if facets.len() < 4 {
        return Err(GeometryError::DegenerateHull {
            points: reduced.len(),
        });
    }
    Ok(Polyhedron::new(facets))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_hull_2d_ignores_interior_points() {
        let points = vec![
            Point2::new(0.0, 0.0),
            Point2::new(4.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(4.0, 4.0),
            Point2::new(0.0, 4.0),
        ];
        assert_relative_eq!(hull_2d(&points).unsigned_area(), 16.0, epsilon = 1e-9);
    }

    #[test]
    fn test_hull_2d_collinear_is_empty() {
        let points = vec![Point2::new(0.0, 0.0), Point2::new(1.0, 1.0), Point2::new(2.0, 2.0)];
        assert!(hull_2d(&points).0.is_empty());
    }

    #[test]
    fn test_hull_3d_of_cube_corners() {
        let mut points = Vec::new();
        for x in [0.0, 2.0] {
            for y in [0.0, 2.0] {
                for z in [0.0, 2.0] {
                    points.push(Point3::new(x, y, z));
                }
            }
        }
        points.push(Point3::new(1.0, 1.0, 1.0));
        let hull = hull_3d(&points).unwrap();
        assert_relative_eq!(hull.volume(), 8.0, epsilon = 1e-9);
        assert!(hull.is_convex());
    }

    #[test]
    fn test_hull_3d_flat_input_fails() {
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        assert!(matches!(hull_3d(&points), Err(GeometryError::DegenerateHull { .. })));
    }
}
