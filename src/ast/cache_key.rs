// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Content-addressed subtree keys
//!
//! A key is the SHA-256 digest of a canonical encoding of a subtree: node
//! kinds, child order, the exact bit patterns of every parameter and the
//! background flag of every child. Node indices and highlight flags do not
//! change geometry and are left out.

use super::node::{AdvancedOp, ImportedMesh, Node, NodeKind};
use crate::geometry::{Mesh, Primitive, Resolution};
use sha2::{Digest, Sha256};
use std::fmt;

const RED_ZONE: usize = 64 * 1024;
const STACK_GROWTH: usize = 1024 * 1024;

/// SHA-256 digest identifying a subtree's geometry
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(pub [u8; 32]);

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl fmt::Debug for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CacheKey({})", &self.to_string()[..16])
    }
}

/// Memoized content key of a subtree
pub fn cache_key(node: &Node) -> CacheKey {
    *node.memo.key.get_or_init(|| {
        stacker::maybe_grow(RED_ZONE, STACK_GROWTH, || {
            let mut writer = KeyWriter::default();
            writer.node(node);
            writer.finish()
        })
    })
}

#[derive(Default)]
struct KeyWriter {
    hasher: Sha256,
}

impl KeyWriter {
    fn finish(self) -> CacheKey {
        CacheKey(self.hasher.finalize().into())
    }

    fn tag(&mut self, tag: &str) {
        self.usize(tag.len());
        self.hasher.update(tag.as_bytes());
    }

    fn f64(&mut self, value: f64) {
        self.hasher.update(value.to_bits().to_le_bytes());
    }

    fn usize(&mut self, value: usize) {
        self.hasher.update((value as u64).to_le_bytes());
    }

    fn u32(&mut self, value: u32) {
        self.hasher.update(value.to_le_bytes());
    }

    fn bool(&mut self, value: bool) {
        self.hasher.update([value as u8]);
    }

    fn resolution(&mut self, res: &Resolution) {
        self.f64(res.fn_);
        self.f64(res.fs);
        self.f64(res.fa);
    }

    fn node(&mut self, node: &Node) {
        match &node.kind {
            NodeKind::Primitive(primitive) => self.primitive(primitive),
            NodeKind::Csg { op, children } => {
                self.tag(op.name());
                self.children(children);
            }
            NodeKind::Advanced {
                op,
                convexity,
                children,
            } => {
                self.tag(op.name());
                match op {
                    AdvancedOp::Glide { path } => {
                        self.bool(path.is_some());
                        if let Some(path) = path {
                            self.usize(path.len());
                            for p in path {
                                p.coords.iter().for_each(|c| self.f64(*c));
                            }
                        }
                    }
                    AdvancedOp::Subdiv { level } => self.u32(*level),
                    AdvancedOp::Minkowski | AdvancedOp::Hull => {}
                }
                self.u32(*convexity);
                self.children(children);
            }
            NodeKind::Transform { matrix, children } => {
                self.tag("multmatrix");
                matrix.iter().for_each(|c| self.f64(*c));
                self.children(children);
            }
            NodeKind::Import(imported) => self.import(imported),
        }
    }

    fn children(&mut self, children: &[Node]) {
        self.usize(children.len());
        for child in children {
            self.bool(child.flags.background);
            self.hasher.update(cache_key(child).0);
        }
    }

    fn primitive(&mut self, primitive: &Primitive) {
        match primitive {
            Primitive::Cube { size, center } => {
                self.tag("cube");
                size.iter().for_each(|c| self.f64(*c));
                self.bool(*center);
            }
            Primitive::Sphere { r, res } => {
                self.tag("sphere");
                self.f64(*r);
                self.resolution(res);
            }
            Primitive::Cylinder {
                h,
                r1,
                r2,
                center,
                res,
            } => {
                self.tag("cylinder");
                for v in [h, r1, r2] {
                    self.f64(*v);
                }
                self.bool(*center);
                self.resolution(res);
            }
            Primitive::Polyhedron {
                points,
                triangles,
                convexity,
            } => {
                self.tag("polyhedron");
                self.usize(points.len());
                for p in points {
                    p.coords.iter().for_each(|c| self.f64(*c));
                }
                self.usize(triangles.len());
                for face in triangles {
                    self.usize(face.len());
                    face.iter().for_each(|i| self.usize(*i));
                }
                self.u32(*convexity);
            }
            Primitive::Square { size, center } => {
                self.tag("square");
                size.iter().for_each(|c| self.f64(*c));
                self.bool(*center);
            }
            Primitive::Circle { r, res } => {
                self.tag("circle");
                self.f64(*r);
                self.resolution(res);
            }
            Primitive::Polygon {
                points,
                paths,
                convexity,
            } => {
                self.tag("polygon");
                self.usize(points.len());
                for p in points {
                    p.coords.iter().for_each(|c| self.f64(*c));
                }
                self.usize(paths.len());
                for path in paths {
                    self.usize(path.len());
                    path.iter().for_each(|i| self.usize(*i));
                }
                self.u32(*convexity);
            }
        }
    }

    fn import(&mut self, imported: &ImportedMesh) {
        self.tag("import");
        self.tag(&imported.source);
        self.u32(imported.convexity);
        self.mesh(&imported.mesh);
    }

    fn mesh(&mut self, mesh: &Mesh) {
        self.bool(mesh.is_2d);
        self.usize(mesh.polygons.len());
        for poly in &mesh.polygons {
            self.usize(poly.len());
            for p in poly {
                p.coords.iter().for_each(|c| self.f64(*c));
            }
        }
        self.usize(mesh.borders.len());
        for border in &mesh.borders {
            self.usize(border.len());
            for p in border {
                p.coords.iter().for_each(|c| self.f64(*c));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::NodeFactory;
    use nalgebra::{Point3, Vector3};

    #[test]
    fn test_key_ignores_index_and_highlight() {
        let a = NodeFactory::new();
        let b = NodeFactory::new();
        b.skip(10);

        let left = a.union(vec![a.cube(Vector3::new(1.0, 2.0, 3.0), false)]);
        let right = b.union(vec![b.cube(Vector3::new(1.0, 2.0, 3.0), false).highlighted()]);
        assert_ne!(left.idx, right.idx);
        assert_eq!(cache_key(&left), cache_key(&right));
    }

    #[test]
    fn test_key_sees_background_and_order() {
        let f = NodeFactory::new();
        let plain = f.difference(vec![
            f.cube(Vector3::new(2.0, 2.0, 2.0), false),
            f.cube(Vector3::new(1.0, 1.0, 1.0), false),
        ]);
        let swapped = f.difference(vec![
            f.cube(Vector3::new(1.0, 1.0, 1.0), false),
            f.cube(Vector3::new(2.0, 2.0, 2.0), false),
        ]);
        let ghosted = f.difference(vec![
            f.cube(Vector3::new(2.0, 2.0, 2.0), false),
            f.cube(Vector3::new(1.0, 1.0, 1.0), false).background(),
        ]);
        assert_ne!(cache_key(&plain), cache_key(&swapped));
        assert_ne!(cache_key(&plain), cache_key(&ghosted));
    }

    #[test]
    fn test_key_distinguishes_negative_zero() {
        let f = NodeFactory::new();
        let a = f.cube(Vector3::new(1.0, 1.0, 0.0), false);
        let b = f.cube(Vector3::new(1.0, 1.0, -0.0), false);
        assert_ne!(cache_key(&a), cache_key(&b));
    }

    #[test]
    fn test_glide_path_length_is_encoded() {
        let f = NodeFactory::new();
        let p = Point3::new(1.0, 2.0, 3.0);
        let none = f.glide(None, vec![]);
        let empty = f.glide(Some(vec![]), vec![]);
        let one = f.glide(Some(vec![p]), vec![]);
        let two = f.glide(Some(vec![p, p]), vec![]);

        let keys = [cache_key(&none), cache_key(&empty), cache_key(&one), cache_key(&two)];
        for (i, a) in keys.iter().enumerate() {
            for b in &keys[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
