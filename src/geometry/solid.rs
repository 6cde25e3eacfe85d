// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Exact solids: the dimension-tagged value produced by boolean evaluation

use super::tessellator::{even_odd_region, ring_to_polygon, triangulate};
use super::{BoundingBox, Mesh};
use crate::error::{GeometryError, GeometryResult};
use crate::utils::math::newell_normal;
use ahash::AHashSet;
use geo::orient::Direction;
use geo::{AffineOps, AffineTransform, Area, BooleanOps, CoordsIter, IsConvex, MultiPolygon, Orient};
use nalgebra::{Matrix4, Point2, Point3, Vector3};

/// Distance under which a point is considered to lie on a plane
pub const EPSILON: f64 = 1e-7;

/// Dimension of an exact solid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    Empty = 0,
    Planar = 2,
    Solid = 3,
}

impl Dimension {
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Oriented plane `normal . p = w`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: Vector3<f64>,
    pub w: f64,
}

impl Plane {
    /// Plane through a polygon, or `None` when the polygon has no area
    pub fn from_polygon(points: &[Point3<f64>]) -> Option<Self> {
        let normal = newell_normal(points);
        let length = normal.norm();
        if !(length > EPSILON * EPSILON) {
            return None;
        }
        let normal = normal / length;
        Some(Self {
            normal,
            w: normal.dot(&points[0].coords),
        })
    }

    pub fn signed_distance(&self, point: &Point3<f64>) -> f64 {
        self.normal.dot(&point.coords) - self.w
    }

    pub fn flip(&mut self) {
        self.normal = -self.normal;
        self.w = -self.w;
    }
}

/// Planar convex-or-not facet of a polyhedron, counter-clockwise seen
/// from outside
#[derive(Debug, Clone, PartialEq)]
pub struct Facet {
    pub vertices: Vec<Point3<f64>>,
    pub plane: Plane,
}

impl Facet {
    pub fn new(vertices: Vec<Point3<f64>>) -> Option<Self> {
        let plane = Plane::from_polygon(&vertices)?;
        Some(Self { vertices, plane })
    }

    pub fn flip(&mut self) {
        self.vertices.reverse();
        self.plane.flip();
    }
}

/// Closed 3D point set bounded by facets
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Polyhedron {
    pub facets: Vec<Facet>,
}

impl Polyhedron {
    pub fn new(facets: Vec<Facet>) -> Self {
        Self { facets }
    }

    pub fn is_empty(&self) -> bool {
        self.facets.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = &Point3<f64>> {
        self.facets.iter().flat_map(|f| f.vertices.iter())
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(self.points())
    }

    /// Enclosed volume (divergence theorem over fan triangles)
    pub fn volume(&self) -> f64 {
        let mut volume = 0.0;
        for facet in &self.facets {
            let v = &facet.vertices;
            for i in 1..v.len().saturating_sub(1) {
                volume += v[0].coords.dot(&v[i].coords.cross(&v[i + 1].coords));
            }
        }
        volume / 6.0
    }

    pub fn surface_area(&self) -> f64 {
        self.facets
            .iter()
            .map(|f| newell_normal(&f.vertices).norm() / 2.0)
            .sum()
    }

    /// True when no vertex lies in front of any facet plane
    pub fn is_convex(&self) -> bool {
        let tolerance = EPSILON * self.bounding_box().size().amax().max(1.0);
        self.facets
            .iter()
            .all(|f| self.points().all(|p| f.plane.signed_distance(p) <= tolerance))
    }
}

/// Exact solid value. A computed result keeps its dimension even when it
/// encloses nothing.
#[derive(Debug, Clone, PartialEq)]
pub enum ExactSolid {
    Empty,
    Planar(MultiPolygon<f64>),
    Solid(Polyhedron),
}

impl Default for ExactSolid {
    fn default() -> Self {
        Self::Empty
    }
}

impl ExactSolid {
    pub fn dimension(&self) -> Dimension {
        match self {
            Self::Empty => Dimension::Empty,
            Self::Planar(_) => Dimension::Planar,
            Self::Solid(_) => Dimension::Solid,
        }
    }

    /// True when the solid encloses nothing, whatever its dimension
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Planar(region) => region.0.is_empty(),
            Self::Solid(poly) => poly.is_empty(),
        }
    }

    /// Cache weight: number of vertices
    pub fn weight(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Planar(region) => region.coords_count(),
            Self::Solid(poly) => poly.facets.iter().map(|f| f.vertices.len()).sum(),
        }
    }

    /// Build an exact solid from a mesh.
    ///
    /// 3D meshes must be consistently wound: a directed edge shared by two
    /// polygons means their orientations disagree. 2D meshes use their
    /// borders as an even-odd region when present, otherwise the union of
    /// their polygons.
    pub fn from_mesh(mesh: &Mesh) -> GeometryResult<Self> {
        if mesh.is_empty() {
            return Ok(Self::Empty);
        }
        if mesh.polygons.iter().flatten().any(|p| !p.coords.iter().all(|c| c.is_finite())) {
            return Err(GeometryError::NonFiniteCoordinate);
        }
        if mesh.is_2d {
            Ok(Self::Planar(planar_region(mesh)))
        } else {
            Ok(Self::Solid(polyhedron_from_polygons(&mesh.polygons)?))
        }
    }

    /// Convert back to a mesh for display or export
    pub fn to_mesh(&self) -> Mesh {
        match self {
            Self::Empty => Mesh::new(),
            Self::Planar(region) => {
                let mut mesh = Mesh::new_2d();
                for tri in triangulate(region) {
                    mesh.append_poly();
                    for p in tri {
                        mesh.append_vertex_2d(p.x, p.y);
                    }
                }
                for polygon in region {
                    for ring in std::iter::once(polygon.exterior()).chain(polygon.interiors()) {
                        mesh.borders
                            .push(ring.coords().map(|c| Point2::new(c.x, c.y)).collect());
                    }
                }
                mesh
            }
            Self::Solid(poly) => {
                let mut mesh = Mesh::new();
                for facet in &poly.facets {
                    mesh.push_polygon(facet.vertices.clone());
                }
                mesh
            }
        }
    }

    /// Apply an affine transform; mirrored transforms keep facets outward
    pub fn transform(&self, matrix: &Matrix4<f64>) -> Self {
        match self {
            Self::Empty => Self::Empty,
            Self::Planar(region) => {
                let affine = AffineTransform::new(
                    matrix[(0, 0)],
                    matrix[(0, 1)],
                    matrix[(0, 3)],
                    matrix[(1, 0)],
                    matrix[(1, 1)],
                    matrix[(1, 3)],
                );
                Self::Planar(region.affine_transform(&affine).orient(Direction::Default))
            }
            Self::Solid(poly) => {
                let mirrored = matrix.fixed_view::<3, 3>(0, 0).clone_owned().determinant() < 0.0;
                let facets = poly
                    .facets
                    .iter()
                    .filter_map(|facet| {
                        let mut vertices: Vec<Point3<f64>> =
                            facet.vertices.iter().map(|p| matrix.transform_point(p)).collect();
                        if mirrored {
                            vertices.reverse();
                        }
                        Facet::new(vertices)
                    })
                    .collect();
                Self::Solid(Polyhedron::new(facets))
            }
        }
    }

    pub fn bounding_box(&self) -> BoundingBox {
        match self {
            Self::Empty => BoundingBox::empty(),
            Self::Planar(region) => {
                let mut bbox = BoundingBox::empty();
                for c in region.coords_iter() {
                    bbox.expand_to_include(&Point3::new(c.x, c.y, 0.0));
                }
                bbox
            }
            Self::Solid(poly) => poly.bounding_box(),
        }
    }

    /// Volume for solids, zero otherwise
    pub fn volume(&self) -> f64 {
        match self {
            Self::Solid(poly) => poly.volume(),
            _ => 0.0,
        }
    }

    /// Enclosed area for planar regions, surface area for solids
    pub fn area(&self) -> f64 {
        match self {
            Self::Empty => 0.0,
            Self::Planar(region) => region.unsigned_area(),
            Self::Solid(poly) => poly.surface_area(),
        }
    }

    pub fn is_convex(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Planar(region) => {
                region.0.len() == 1
                    && region.0[0].interiors().is_empty()
                    && region.0[0].exterior().is_convex()
            }
            Self::Solid(poly) => poly.is_convex(),
        }
    }
}

fn planar_region(mesh: &Mesh) -> MultiPolygon<f64> {
    if !mesh.borders.is_empty() {
        return even_odd_region(&mesh.borders).orient(Direction::Default);
    }
    mesh.polygons
        .iter()
        .filter(|poly| poly.len() >= 3)
        .map(|poly| {
            let mut ring: Vec<Point2<f64>> = poly.iter().map(|p| Point2::new(p.x, p.y)).collect();
            ring.push(ring[0]);
            MultiPolygon::new(vec![ring_to_polygon(&ring)])
        })
        .fold(MultiPolygon::new(vec![]), |acc, next| acc.union(&next))
        .orient(Direction::Default)
}

fn point_key(p: &Point3<f64>) -> [u64; 3] {
    // normalize -0.0 so coincident points hash equal
    [
        (p.x + 0.0).to_bits(),
        (p.y + 0.0).to_bits(),
        (p.z + 0.0).to_bits(),
    ]
}

/// Validate orientation and build facets from raw polygons
pub fn polyhedron_from_polygons(polygons: &[Vec<Point3<f64>>]) -> GeometryResult<Polyhedron> {
    let mut directed_edges = AHashSet::new();
    let mut facets = Vec::with_capacity(polygons.len());

    for poly in polygons {
        let mut vertices: Vec<Point3<f64>> = Vec::with_capacity(poly.len());
        for p in poly {
            if vertices.last() != Some(p) {
                vertices.push(*p);
            }
        }
        while vertices.len() > 1 && vertices.first() == vertices.last() {
            vertices.pop();
        }
        if vertices.len() < 3 {
            continue;
        }

        for (i, a) in vertices.iter().enumerate() {
            let b = &vertices[(i + 1) % vertices.len()];
            if !directed_edges.insert((point_key(a), point_key(b))) {
                return Err(GeometryError::InconsistentWinding);
            }
        }

        if let Some(facet) = Facet::new(vertices) {
            facets.push(facet);
        }
    }

    Ok(Polyhedron::new(facets))
}
