// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Minkowski sums
//!
//! Convex operands are summed as the hull of pairwise vertex sums. Anything
//! else is decomposed into convex pieces whose pairwise hulls are unioned:
//! for a connected convex `B`, `A + B = (A + b0) ∪ (∂A + B)`.

use super::csg::{self, convex_pieces};
use super::hull::{hull_2d, hull_3d};
use super::planar;
use super::solid::{ExactSolid, Facet, Polyhedron};
use super::tessellator::triangulate;
use crate::error::{GeometryError, GeometryResult};
use geo::{CoordsIter, MultiPolygon};
use nalgebra::{Point2, Point3, Vector3};
use rayon::prelude::*;
use tracing::debug;

/// Minkowski sum of two solids of the same dimension
pub fn minkowski(a: &ExactSolid, b: &ExactSolid) -> GeometryResult<ExactSolid> {
    match (a, b) {
        (ExactSolid::Planar(pa), ExactSolid::Planar(pb)) => Ok(ExactSolid::Planar(minkowski_2d(pa, pb))),
        (ExactSolid::Solid(pa), ExactSolid::Solid(pb)) => Ok(ExactSolid::Solid(minkowski_3d(pa, pb)?)),
        _ => Err(GeometryError::DimensionMismatch {
            left: a.dimension().as_u8(),
            right: b.dimension().as_u8(),
        }),
    }
}

fn region_points(region: &MultiPolygon<f64>) -> Vec<Point2<f64>> {
    region.exterior_coords_iter().map(|c| Point2::new(c.x, c.y)).collect()
}

fn pairwise_sums_2d(a: &[Point2<f64>], b: &[Point2<f64>]) -> Vec<Point2<f64>> {
    a.iter()
        .flat_map(|pa| b.iter().map(move |pb| pa + pb.coords))
        .collect()
}

fn convex_parts_2d(region: &MultiPolygon<f64>, convex: bool) -> Vec<Vec<Point2<f64>>> {
    if convex {
        return vec![region_points(region)];
    }
    triangulate(region).into_iter().map(|tri| tri.to_vec()).collect()
}

pub fn minkowski_2d(a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> MultiPolygon<f64> {
    if a.0.is_empty() || b.0.is_empty() {
        return MultiPolygon::new(vec![]);
    }

    let a_convex = ExactSolid::Planar(a.clone()).is_convex();
    let b_convex = ExactSolid::Planar(b.clone()).is_convex();
    let parts_a = convex_parts_2d(a, a_convex);
    let parts_b = convex_parts_2d(b, b_convex);
    debug!(parts_a = parts_a.len(), parts_b = parts_b.len(), "2D minkowski decomposition");

    let pieces: Vec<MultiPolygon<f64>> = parts_a
        .par_iter()
        .flat_map_iter(|pa| parts_b.iter().map(move |pb| hull_2d(&pairwise_sums_2d(pa, pb))))
        .collect();
    planar::union_all(pieces)
}

fn pairwise_sums_3d(a: &[Point3<f64>], b: &[Point3<f64>]) -> Vec<Point3<f64>> {
    a.iter()
        .flat_map(|pa| b.iter().map(move |pb| pa + pb.coords))
        .collect()
}

fn unique_points(poly: &Polyhedron) -> Vec<Point3<f64>> {
    let mut points: Vec<Point3<f64>> = poly.points().copied().collect();
    points.sort_by(|p, q| {
        p.coords
            .iter()
            .zip(q.coords.iter())
            .map(|(x, y)| x.total_cmp(y))
            .find(|o| o.is_ne())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    points.dedup();
    points
}

fn translate(poly: &Polyhedron, offset: Vector3<f64>) -> Polyhedron {
    Polyhedron::new(
        poly.facets
            .iter()
            .map(|facet| {
                let mut moved = facet.clone();
                for v in &mut moved.vertices {
                    *v += offset;
                }
                moved.plane.w += moved.plane.normal.dot(&offset);
                moved
            })
            .collect(),
    )
}

fn boundary_pieces(poly: &Polyhedron) -> Vec<Vec<Point3<f64>>> {
    poly.facets
        .iter()
        .cloned()
        .flat_map(convex_pieces)
        .map(|facet: Facet| facet.vertices)
        .collect()
}

/// Hull every (piece, piece) pair in parallel; degenerate pairs are dropped
fn hull_pairs(left: &[Vec<Point3<f64>>], right: &[Vec<Point3<f64>>]) -> Vec<Polyhedron> {
    left.par_iter()
        .flat_map_iter(|l| right.iter().filter_map(move |r| hull_3d(&pairwise_sums_3d(l, r)).ok()))
        .collect()
}

pub fn minkowski_3d(a: &Polyhedron, b: &Polyhedron) -> GeometryResult<Polyhedron> {
    if a.is_empty() || b.is_empty() {
        return Ok(Polyhedron::default());
    }

    let points_a = unique_points(a);
    let points_b = unique_points(b);
    let a_convex = a.is_convex();
    let b_convex = b.is_convex();
    debug!(
        vertices_a = points_a.len(),
        vertices_b = points_b.len(),
        a_convex,
        b_convex,
        "3D minkowski"
    );

    if a_convex && b_convex {
        return hull_3d(&pairwise_sums_3d(&points_a, &points_b));
    }

    // Keep the convex operand (if any) on the right
    let (a, b, points_b) = if a_convex { (b, a, points_a) } else { (a, b, points_b) };
    let b_convex = a_convex || b_convex;

    let mut pieces = vec![translate(a, points_b[0].coords)];
    let faces_a = boundary_pieces(a);
    if b_convex {
        pieces.extend(hull_pairs(&faces_a, &[points_b]));
    } else {
        let faces_b = boundary_pieces(b);
        for face in &faces_a {
            pieces.push(translate(b, face[0].coords));
            pieces.extend(hull_pairs(std::slice::from_ref(face), &faces_b));
        }
    }
    Ok(csg::union_all(pieces))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Primitive;
    use approx::assert_relative_eq;
    use geo::Area;
    use nalgebra::{Vector2, Vector3};

    fn solid(primitive: Primitive) -> ExactSolid {
        ExactSolid::from_mesh(&primitive.to_mesh()).unwrap()
    }

    #[test]
    fn test_convex_cubes() {
        let a = solid(Primitive::cube(Vector3::new(10.0, 10.0, 10.0), false));
        let b = solid(Primitive::cube(Vector3::new(2.0, 2.0, 2.0), true));
        let sum = minkowski(&a, &b).unwrap();
        let bbox = sum.bounding_box();
        assert_relative_eq!(bbox.size().x, 12.0, epsilon = 1e-9);
        assert_relative_eq!(bbox.min.z, -1.0, epsilon = 1e-9);
        assert_relative_eq!(sum.volume(), 1728.0, epsilon = 1e-6);
    }

    #[test]
    fn test_squares_2d() {
        let a = solid(Primitive::square(Vector2::new(4.0, 4.0), false));
        let b = solid(Primitive::square(Vector2::new(2.0, 2.0), true));
        let ExactSolid::Planar(region) = minkowski(&a, &b).unwrap() else {
            panic!("expected planar result");
        };
        assert_relative_eq!(region.unsigned_area(), 36.0, epsilon = 1e-9);
    }

    #[test]
    fn test_non_convex_2d_keeps_notch() {
        // L-shape: its convex hull would be the full 2x2 square
        let l_shape = solid(Primitive::polygon(
            vec![
                Point2::new(0.0, 0.0),
                Point2::new(2.0, 0.0),
                Point2::new(2.0, 1.0),
                Point2::new(1.0, 1.0),
                Point2::new(1.0, 2.0),
                Point2::new(0.0, 2.0),
            ],
            vec![],
            1,
        ));
        let dot = solid(Primitive::square(Vector2::new(0.2, 0.2), true));
        let ExactSolid::Planar(region) = minkowski(&l_shape, &dot).unwrap() else {
            panic!("expected planar result");
        };
        // 2.2 x 2.2 bounds minus the 1 x 1 notch moved out to (2.1, 2.1)
        assert_relative_eq!(region.unsigned_area(), 4.84 - 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_mixed_dimensions_rejected() {
        let a = solid(Primitive::square(Vector2::new(1.0, 1.0), false));
        let b = solid(Primitive::cube(Vector3::new(1.0, 1.0, 1.0), false));
        assert_eq!(
            minkowski(&a, &b),
            Err(GeometryError::DimensionMismatch { left: 2, right: 3 })
        );
    }
}
