// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! CSG (Constructive Solid Geometry) operations using BSP trees
//!
//! Polyhedra are combined by clipping their facet sets against each other's
//! BSP trees. Facets are split into convex pieces first; results may contain
//! more (smaller) facets than the inputs.

use super::solid::{Facet, Plane, Polyhedron, EPSILON};
use geo::{Coord, LineString, Polygon as GeoPolygon, TriangulateEarcut};
use nalgebra::{Point3, Vector3};

const RED_ZONE: usize = 64 * 1024;
const STACK_GROWTH: usize = 1024 * 1024;

const COPLANAR: u8 = 0;
const FRONT: u8 = 1;
const BACK: u8 = 2;
const SPANNING: u8 = 3;

/// BSP tree node for CSG operations
#[derive(Debug, Clone, Default)]
struct BspNode {
    plane: Option<Plane>,
    front: Option<Box<BspNode>>,
    back: Option<Box<BspNode>>,
    facets: Vec<Facet>,
}

/// Sort a facet into the four output lists, splitting it when it spans
fn split_facet(
    plane: &Plane,
    facet: Facet,
    coplanar_front: &mut Vec<Facet>,
    coplanar_back: &mut Vec<Facet>,
    front: &mut Vec<Facet>,
    back: &mut Vec<Facet>,
) {
    let mut facet_type = COPLANAR;
    let types: Vec<u8> = facet
        .vertices
        .iter()
        .map(|v| {
            let t = plane.signed_distance(v);
            let kind = if t < -EPSILON {
                BACK
            } else if t > EPSILON {
                FRONT
            } else {
                COPLANAR
            };
            facet_type |= kind;
            kind
        })
        .collect();

    match facet_type {
        COPLANAR => {
            if plane.normal.dot(&facet.plane.normal) > 0.0 {
                coplanar_front.push(facet);
            } else {
                coplanar_back.push(facet);
            }
        }
        FRONT => front.push(facet),
        BACK => back.push(facet),
        _ => {
            let n = facet.vertices.len();
            let mut f = Vec::with_capacity(n + 1);
            let mut b = Vec::with_capacity(n + 1);
            for i in 0..n {
                let j = (i + 1) % n;
                let (ti, tj) = (types[i], types[j]);
                let (vi, vj) = (facet.vertices[i], facet.vertices[j]);
                if ti != BACK {
                    f.push(vi);
                }
                if ti != FRONT {
                    b.push(vi);
                }
                if ti | tj == SPANNING {
                    let t = (plane.w - plane.normal.dot(&vi.coords)) / plane.normal.dot(&(vj - vi));
                    let v = vi + (vj - vi) * t;
                    f.push(v);
                    b.push(v);
                }
            }
            if f.len() >= 3 {
                front.push(Facet {
                    vertices: f,
                    plane: facet.plane,
                });
            }
            if b.len() >= 3 {
                back.push(Facet {
                    vertices: b,
                    plane: facet.plane,
                });
            }
        }
    }
}

impl BspNode {
    fn new(facets: Vec<Facet>) -> Self {
        let mut node = Self::default();
        if !facets.is_empty() {
            node.build(facets);
        }
        node
    }

    fn build(&mut self, facets: Vec<Facet>) {
        stacker::maybe_grow(RED_ZONE, STACK_GROWTH, || self.build_inner(facets))
    }

    fn build_inner(&mut self, facets: Vec<Facet>) {
        let Some(first) = facets.first() else {
            return;
        };
        let plane = *self.plane.get_or_insert(first.plane);

        let mut front = Vec::new();
        let mut back = Vec::new();
        let mut coplanar = Vec::new();
        for facet in facets {
            let mut coplanar_back = Vec::new();
            split_facet(&plane, facet, &mut coplanar, &mut coplanar_back, &mut front, &mut back);
            coplanar.append(&mut coplanar_back);
        }
        self.facets.append(&mut coplanar);

        if !front.is_empty() {
            self.front.get_or_insert_with(Box::default).build(front);
        }
        if !back.is_empty() {
            self.back.get_or_insert_with(Box::default).build(back);
        }
    }

    fn invert(&mut self) {
        stacker::maybe_grow(RED_ZONE, STACK_GROWTH, || {
            for facet in &mut self.facets {
                facet.flip();
            }
            if let Some(plane) = self.plane.as_mut() {
                plane.flip();
            }
            if let Some(front) = self.front.as_mut() {
                front.invert();
            }
            if let Some(back) = self.back.as_mut() {
                back.invert();
            }
            std::mem::swap(&mut self.front, &mut self.back);
        })
    }

    /// Remove the parts of `facets` that lie inside this tree
    fn clip_facets(&self, facets: Vec<Facet>) -> Vec<Facet> {
        let Some(plane) = self.plane else {
            return facets;
        };
        stacker::maybe_grow(RED_ZONE, STACK_GROWTH, || {
            let mut front = Vec::new();
            let mut back = Vec::new();
            for facet in facets {
                let (mut cf, mut cb) = (Vec::new(), Vec::new());
                split_facet(&plane, facet, &mut cf, &mut cb, &mut front, &mut back);
                front.append(&mut cf);
                back.append(&mut cb);
            }

            let mut front = match &self.front {
                Some(node) => node.clip_facets(front),
                None => front,
            };
            if let Some(node) = &self.back {
                front.extend(node.clip_facets(back));
            }
            front
        })
    }

    /// Remove all facets of this tree that lie inside `other`
    fn clip_to(&mut self, other: &BspNode) {
        stacker::maybe_grow(RED_ZONE, STACK_GROWTH, || {
            self.facets = other.clip_facets(std::mem::take(&mut self.facets));
            if let Some(front) = self.front.as_mut() {
                front.clip_to(other);
            }
            if let Some(back) = self.back.as_mut() {
                back.clip_to(other);
            }
        })
    }

    fn all_facets(&self) -> Vec<Facet> {
        let mut result = Vec::new();
        self.collect_facets(&mut result);
        result
    }

    fn collect_facets(&self, out: &mut Vec<Facet>) {
        stacker::maybe_grow(RED_ZONE, STACK_GROWTH, || {
            out.extend(self.facets.iter().cloned());
            if let Some(front) = &self.front {
                front.collect_facets(out);
            }
            if let Some(back) = &self.back {
                back.collect_facets(out);
            }
        })
    }
}

fn is_convex_facet(facet: &Facet) -> bool {
    let v = &facet.vertices;
    let n = v.len();
    n == 3
        || (0..n).all(|i| {
            let (a, b, c) = (v[i], v[(i + 1) % n], v[(i + 2) % n]);
            (b - a).cross(&(c - b)).dot(&facet.plane.normal) >= -EPSILON
        })
}

/// Split a non-convex facet into triangles by ear clipping its projection
pub(crate) fn convex_pieces(facet: Facet) -> Vec<Facet> {
    if is_convex_facet(&facet) {
        return vec![facet];
    }

    let normal = facet.plane.normal;
    let axis = normal.iamax();
    let (u, v) = ((axis + 1) % 3, (axis + 2) % 3);
    let ring: Vec<Coord<f64>> = facet
        .vertices
        .iter()
        .map(|p| Coord { x: p[u], y: p[v] })
        .collect();

    let lift = |c: Coord<f64>| {
        let mut p = Point3::origin();
        p[u] = c.x;
        p[v] = c.y;
        p[axis] = (facet.plane.w - normal[u] * c.x - normal[v] * c.y) / normal[axis];
        p
    };

    GeoPolygon::new(LineString::new(ring), vec![])
        .earcut_triangles()
        .into_iter()
        .filter_map(|tri| {
            let mut vertices = vec![lift(tri.0), lift(tri.1), lift(tri.2)];
            let winding: Vector3<f64> = (vertices[1] - vertices[0]).cross(&(vertices[2] - vertices[0]));
            if winding.dot(&normal) < 0.0 {
                vertices.reverse();
            }
            Facet::new(vertices)
        })
        .collect()
}

fn to_bsp_facets(poly: &Polyhedron) -> Vec<Facet> {
    poly.facets.iter().cloned().flat_map(convex_pieces).collect()
}

fn disjoint(a: &Polyhedron, b: &Polyhedron) -> bool {
    !a.bounding_box().intersects(&b.bounding_box(), EPSILON)
}

/// Perform CSG union using BSP trees
pub fn union(a: &Polyhedron, b: &Polyhedron) -> Polyhedron {
    if a.is_empty() {
        return b.clone();
    }
    if b.is_empty() {
        return a.clone();
    }
    if disjoint(a, b) {
        let mut facets = a.facets.clone();
        facets.extend(b.facets.iter().cloned());
        return Polyhedron::new(facets);
    }

    let mut tree_a = BspNode::new(to_bsp_facets(a));
    let mut tree_b = BspNode::new(to_bsp_facets(b));
    tree_a.clip_to(&tree_b);
    tree_b.clip_to(&tree_a);
    tree_b.invert();
    tree_b.clip_to(&tree_a);
    tree_b.invert();
    tree_a.build(tree_b.all_facets());
    Polyhedron::new(tree_a.all_facets())
}

/// Perform CSG difference using BSP trees
pub fn difference(a: &Polyhedron, b: &Polyhedron) -> Polyhedron {
    if a.is_empty() {
        return Polyhedron::default();
    }
    if b.is_empty() || disjoint(a, b) {
        return a.clone();
    }

    let mut tree_a = BspNode::new(to_bsp_facets(a));
    let mut tree_b = BspNode::new(to_bsp_facets(b));
    tree_a.invert();
    tree_a.clip_to(&tree_b);
    tree_b.clip_to(&tree_a);
    tree_b.invert();
    tree_b.clip_to(&tree_a);
    tree_b.invert();
    tree_a.build(tree_b.all_facets());
    tree_a.invert();
    Polyhedron::new(tree_a.all_facets())
}

/// Perform CSG intersection using BSP trees
pub fn intersection(a: &Polyhedron, b: &Polyhedron) -> Polyhedron {
    if a.is_empty() || b.is_empty() || disjoint(a, b) {
        return Polyhedron::default();
    }

    let mut tree_a = BspNode::new(to_bsp_facets(a));
    let mut tree_b = BspNode::new(to_bsp_facets(b));
    tree_a.invert();
    tree_b.clip_to(&tree_a);
    tree_b.invert();
    tree_a.clip_to(&tree_b);
    tree_b.clip_to(&tree_a);
    tree_a.build(tree_b.all_facets());
    tree_a.invert();
    Polyhedron::new(tree_a.all_facets())
}

/// Union a list of polyhedra pairwise, keeping the combination order fixed
pub fn union_all(mut solids: Vec<Polyhedron>) -> Polyhedron {
    while solids.len() > 1 {
        let mut next = Vec::with_capacity(solids.len().div_ceil(2));
        let mut iter = solids.into_iter();
        while let Some(a) = iter.next() {
            match iter.next() {
                Some(b) => next.push(union(&a, &b)),
                None => next.push(a),
            }
        }
        solids = next;
    }
    solids.pop().unwrap_or_default()
}
