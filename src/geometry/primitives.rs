// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometric primitives generator
//!
//! Every primitive tessellates to a [`Mesh`]. Degenerate parameters produce an
//! empty mesh rather than an error.

use super::tessellator::{EarcutTessellator, Tessellator};
use super::Mesh;
use nalgebra::{Point2, Point3, Vector2, Vector3};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Radii below this are treated as zero
pub const GRID_FINE: f64 = 1e-6;

/// Lower bound applied to `$fs` and `$fa`
pub const F_MINIMUM: f64 = 0.01;

/// Largest fixed fragment count that is tessellated
pub const MAX_FRAGMENTS: usize = 100_000;

/// Circle resolution controls (`$fn`, `$fs`, `$fa`)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    #[serde(default, rename = "fn")]
    pub fn_: f64,
    #[serde(default = "default_fs")]
    pub fs: f64,
    #[serde(default = "default_fa")]
    pub fa: f64,
}

fn default_fs() -> f64 {
    2.0
}

fn default_fa() -> f64 {
    12.0
}

impl Default for Resolution {
    fn default() -> Self {
        Self {
            fn_: 0.0,
            fs: default_fs(),
            fa: default_fa(),
        }
    }
}

impl Resolution {
    /// Fixed number of fragments
    pub fn fixed(fn_: u32) -> Self {
        Self {
            fn_: fn_ as f64,
            ..Self::default()
        }
    }

    pub fn fragments(&self, r: f64) -> usize {
        fragments_from_r(r, self.fn_, self.fs, self.fa)
    }
}

/// Number of segments for a full circle of radius `r`
///
/// Non-finite radii and fixed counts above [`MAX_FRAGMENTS`] yield 0, which
/// makes every round primitive empty.
pub fn fragments_from_r(r: f64, fn_: f64, fs: f64, fa: f64) -> usize {
    if !r.is_finite() || r < GRID_FINE {
        return 0;
    }
    if fn_ > 0.0 {
        return if fn_ <= MAX_FRAGMENTS as f64 { fn_ as usize } else { 0 };
    }
    let fs = fs.max(F_MINIMUM);
    let fa = fa.max(F_MINIMUM);
    (360.0 / fa).min(r * PI / fs).max(5.0).ceil() as usize
}

/// Geometric primitives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Primitive {
    Cube {
        size: Vector3<f64>,
        #[serde(default)]
        center: bool,
    },
    Sphere {
        r: f64,
        #[serde(default)]
        res: Resolution,
    },
    Cylinder {
        h: f64,
        r1: f64,
        r2: f64,
        #[serde(default)]
        center: bool,
        #[serde(default)]
        res: Resolution,
    },
    Polyhedron {
        points: Vec<Point3<f64>>,
        triangles: Vec<Vec<usize>>,
        #[serde(default = "one")]
        convexity: u32,
    },
    Square {
        size: Vector2<f64>,
        #[serde(default)]
        center: bool,
    },
    Circle {
        r: f64,
        #[serde(default)]
        res: Resolution,
    },
    Polygon {
        points: Vec<Point2<f64>>,
        #[serde(default)]
        paths: Vec<Vec<usize>>,
        #[serde(default = "one")]
        convexity: u32,
    },
}

fn one() -> u32 {
    1
}

impl Primitive {
    pub fn cube(size: Vector3<f64>, center: bool) -> Self {
        Self::Cube { size, center }
    }

    pub fn sphere(r: f64, res: Resolution) -> Self {
        Self::Sphere { r, res }
    }

    pub fn cylinder(h: f64, r1: f64, r2: f64, center: bool, res: Resolution) -> Self {
        Self::Cylinder {
            h,
            r1,
            r2,
            center,
            res,
        }
    }

    pub fn polyhedron(points: Vec<Point3<f64>>, triangles: Vec<Vec<usize>>, convexity: u32) -> Self {
        Self::Polyhedron {
            points,
            triangles,
            convexity,
        }
    }

    pub fn square(size: Vector2<f64>, center: bool) -> Self {
        Self::Square { size, center }
    }

    pub fn circle(r: f64, res: Resolution) -> Self {
        Self::Circle { r, res }
    }

    pub fn polygon(points: Vec<Point2<f64>>, paths: Vec<Vec<usize>>, convexity: u32) -> Self {
        Self::Polygon {
            points,
            paths,
            convexity,
        }
    }

    pub fn is_2d(&self) -> bool {
        matches!(self, Self::Square { .. } | Self::Circle { .. } | Self::Polygon { .. })
    }

    /// Tessellate with the default ear-clipping tessellator
    pub fn to_mesh(&self) -> Mesh {
        self.to_mesh_with(&EarcutTessellator)
    }

    pub fn to_mesh_with(&self, tessellator: &dyn Tessellator) -> Mesh {
        match self {
            Self::Cube { size, center } => generate_cube_mesh(*size, *center),
            Self::Sphere { r, res } => generate_sphere_mesh(*r, res.fragments(*r)),
            Self::Cylinder {
                h,
                r1,
                r2,
                center,
                res,
            } => generate_cylinder_mesh(*h, *r1, *r2, *center, res.fragments(r1.max(*r2))),
            Self::Polyhedron {
                points,
                triangles,
                convexity,
            } => generate_polyhedron_mesh(points, triangles, *convexity),
            Self::Square { size, center } => generate_square_mesh(*size, *center),
            Self::Circle { r, res } => generate_circle_mesh(*r, res.fragments(*r)),
            Self::Polygon {
                points,
                paths,
                convexity,
            } => generate_polygon_mesh(points, paths, *convexity, tessellator),
        }
    }
}

/// Points of a circle with half-step angular offset, as used by sphere rings
/// and cylinder rims
fn offset_circle(r: f64, fragments: usize, z: f64) -> Vec<Point3<f64>> {
    (0..fragments)
        .map(|i| {
            let phi = 2.0 * PI * (i as f64 + 0.5) / fragments as f64;
            Point3::new(r * phi.cos(), r * phi.sin(), z)
        })
        .collect()
}

fn generate_cube_mesh(size: Vector3<f64>, center: bool) -> Mesh {
    let mut mesh = Mesh::new();
    if !(size.x > 0.0 && size.y > 0.0 && size.z > 0.0) {
        return mesh;
    }

    let (x1, y1, z1) = if center {
        (-size.x / 2.0, -size.y / 2.0, -size.z / 2.0)
    } else {
        (0.0, 0.0, 0.0)
    };
    let (x2, y2, z2) = (x1 + size.x, y1 + size.y, z1 + size.z);

    let faces = [
        // top
        [(x1, y1, z2), (x2, y1, z2), (x2, y2, z2), (x1, y2, z2)],
        // bottom
        [(x1, y2, z1), (x2, y2, z1), (x2, y1, z1), (x1, y1, z1)],
        // y-
        [(x1, y1, z1), (x2, y1, z1), (x2, y1, z2), (x1, y1, z2)],
        // x+
        [(x2, y1, z1), (x2, y2, z1), (x2, y2, z2), (x2, y1, z2)],
        // y+
        [(x2, y2, z1), (x1, y2, z1), (x1, y2, z2), (x2, y2, z2)],
        // x-
        [(x1, y2, z1), (x1, y1, z1), (x1, y1, z2), (x1, y2, z2)],
    ];

    for face in faces {
        mesh.append_poly();
        for (x, y, z) in face {
            mesh.append_vertex(x, y, z);
        }
    }
    mesh
}

/// Stitch two parallel rings into a band of triangles.
///
/// `upper` and `lower` are counter-clockwise seen from above and may hold
/// different numbers of points. Both cursors advance by the fraction of
/// their ring they have covered, so the band stays balanced.
pub fn stitch_rings(mesh: &mut Mesh, upper: &[Point3<f64>], lower: &[Point3<f64>]) {
    let (n1, n2) = (upper.len(), lower.len());
    if n1 == 0 || n2 == 0 {
        return;
    }

    let (mut i1, mut i2) = (0usize, 0usize);
    while i1 < n1 || i2 < n2 {
        let advance_upper = if i1 >= n1 {
            false
        } else if i2 >= n2 {
            true
        } else {
            (i1 as f64 / n1 as f64) < (i2 as f64 / n2 as f64)
        };

        mesh.append_poly();
        if advance_upper {
            let j1 = (i1 + 1) % n1;
            for p in [upper[i1], upper[j1], lower[i2 % n2]] {
                mesh.insert_vertex(p.x, p.y, p.z);
            }
            i1 += 1;
        } else {
            let j2 = (i2 + 1) % n2;
            for p in [lower[i2], lower[j2], upper[i1 % n1]] {
                mesh.append_vertex(p.x, p.y, p.z);
            }
            i2 += 1;
        }
    }
}

fn generate_sphere_mesh(r: f64, fragments: usize) -> Mesh {
    let mut mesh = Mesh::new();
    let rings = fragments / 2;
    if r <= 0.0 || fragments < 3 || rings == 0 {
        return mesh;
    }

    let ring_points: Vec<Vec<Point3<f64>>> = (0..rings)
        .map(|i| {
            let phi = PI * (i as f64 + 0.5) / rings as f64;
            offset_circle(r * phi.sin(), fragments, r * phi.cos())
        })
        .collect();

    mesh.append_poly();
    for p in &ring_points[0] {
        mesh.append_vertex(p.x, p.y, p.z);
    }

    for pair in ring_points.windows(2) {
        stitch_rings(&mut mesh, &pair[0], &pair[1]);
    }

    mesh.append_poly();
    for p in &ring_points[rings - 1] {
        mesh.insert_vertex(p.x, p.y, p.z);
    }
    mesh
}

fn generate_cylinder_mesh(h: f64, r1: f64, r2: f64, center: bool, fragments: usize) -> Mesh {
    let mut mesh = Mesh::new();
    if !(h > 0.0 && r1 >= 0.0 && r2 >= 0.0 && (r1 > 0.0 || r2 > 0.0)) || fragments < 3 {
        return mesh;
    }

    let (z1, z2) = if center { (-h / 2.0, h / 2.0) } else { (0.0, h) };
    let bottom = offset_circle(r1, fragments, z1);
    let top = offset_circle(r2, fragments, z2);

    for i in 0..fragments {
        let j = (i + 1) % fragments;
        if r1 == r2 {
            mesh.append_poly();
            for p in [bottom[i], top[i], top[j], bottom[j]] {
                mesh.insert_vertex(p.x, p.y, p.z);
            }
        } else {
            if r1 > 0.0 {
                mesh.append_poly();
                for p in [bottom[i], top[i], bottom[j]] {
                    mesh.insert_vertex(p.x, p.y, p.z);
                }
            }
            if r2 > 0.0 {
                mesh.append_poly();
                for p in [top[i], top[j], bottom[j]] {
                    mesh.insert_vertex(p.x, p.y, p.z);
                }
            }
        }
    }

    if r1 > 0.0 {
        mesh.append_poly();
        for p in &bottom {
            mesh.insert_vertex(p.x, p.y, p.z);
        }
    }
    if r2 > 0.0 {
        mesh.append_poly();
        for p in &top {
            mesh.append_vertex(p.x, p.y, p.z);
        }
    }
    mesh
}

fn generate_polyhedron_mesh(points: &[Point3<f64>], triangles: &[Vec<usize>], convexity: u32) -> Mesh {
    let mut mesh = Mesh::new().with_convexity(convexity);
    for face in triangles {
        if face.len() < 3 || face.iter().any(|&idx| idx >= points.len()) {
            continue;
        }
        // Input faces are clockwise seen from outside
        mesh.push_polygon(face.iter().rev().map(|&idx| points[idx]).collect());
    }
    mesh
}

fn generate_square_mesh(size: Vector2<f64>, center: bool) -> Mesh {
    let mut mesh = Mesh::new_2d();
    if !(size.x > 0.0 && size.y > 0.0) {
        return mesh;
    }

    let (x1, y1) = if center {
        (-size.x / 2.0, -size.y / 2.0)
    } else {
        (0.0, 0.0)
    };
    let (x2, y2) = (x1 + size.x, y1 + size.y);

    mesh.append_poly();
    mesh.append_vertex_2d(x1, y1);
    mesh.append_vertex_2d(x2, y1);
    mesh.append_vertex_2d(x2, y2);
    mesh.append_vertex_2d(x1, y2);
    mesh
}

fn generate_circle_mesh(r: f64, fragments: usize) -> Mesh {
    let mut mesh = Mesh::new_2d();
    if fragments < 3 {
        return mesh;
    }

    mesh.append_poly();
    for i in 0..fragments {
        let phi = 2.0 * PI * i as f64 / fragments as f64;
        mesh.append_vertex_2d(r * phi.cos(), r * phi.sin());
    }
    mesh
}

/// Resolve polygon paths into closed point rings.
///
/// No paths means one path over all points. Out-of-range indices are
/// dropped, paths left empty are dropped, and every ring is closed by
/// repeating its first point.
pub fn normalize_paths(points: &[Point2<f64>], paths: &[Vec<usize>]) -> Vec<Vec<Point2<f64>>> {
    let close = |mut ring: Vec<Point2<f64>>| {
        if let Some(first) = ring.first().copied() {
            ring.push(first);
        }
        ring
    };

    if paths.is_empty() {
        if points.is_empty() {
            return Vec::new();
        }
        return vec![close(points.to_vec())];
    }

    paths
        .iter()
        .map(|path| {
            path.iter()
                .filter_map(|&idx| points.get(idx).copied())
                .collect::<Vec<_>>()
        })
        .filter(|ring| !ring.is_empty())
        .map(close)
        .collect()
}

fn generate_polygon_mesh(
    points: &[Point2<f64>],
    paths: &[Vec<usize>],
    convexity: u32,
    tessellator: &dyn Tessellator,
) -> Mesh {
    let mut mesh = Mesh::new_2d().with_convexity(convexity);
    let rings = normalize_paths(points, paths);
    if rings.is_empty() {
        return mesh;
    }

    for tri in tessellator.tessellate(&rings) {
        mesh.append_poly();
        for p in tri {
            mesh.append_vertex_2d(p.x, p.y);
        }
    }
    mesh.borders = rings;
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::math::newell_normal;

    fn outward(mesh: &Mesh) -> bool {
        let centroid = {
            let pts: Vec<_> = mesh.polygons.iter().flatten().collect();
            let sum = pts.iter().fold(Vector3::zeros(), |acc, p| acc + p.coords);
            Point3::from(sum / pts.len() as f64)
        };
        mesh.polygons.iter().all(|poly| {
            let n = newell_normal(poly);
            let c = poly.iter().fold(Vector3::zeros(), |acc, p| acc + p.coords) / poly.len() as f64;
            n.dot(&(c - centroid.coords)) > 0.0
        })
    }

    #[test]
    fn test_fragments_from_r() {
        assert_eq!(fragments_from_r(1e-7, 10.0, 2.0, 12.0), 0);
        assert_eq!(fragments_from_r(5.0, 17.0, 2.0, 12.0), 17);
        // r*pi/fs = 7.85 -> 8
        assert_eq!(fragments_from_r(5.0, 0.0, 2.0, 12.0), 8);
        // capped by 360/fa
        assert_eq!(fragments_from_r(1000.0, 0.0, 2.0, 12.0), 30);
        // at least five
        assert_eq!(fragments_from_r(0.1, 0.0, 2.0, 12.0), 5);
        // fs clamps to F_MINIMUM
        assert_eq!(fragments_from_r(1.0, 0.0, 0.0, 0.0), 315);
    }

    #[test]
    fn test_fragments_out_of_range() {
        assert_eq!(fragments_from_r(1.0, MAX_FRAGMENTS as f64, 2.0, 12.0), MAX_FRAGMENTS);
        assert_eq!(fragments_from_r(1.0, MAX_FRAGMENTS as f64 + 1.0, 2.0, 12.0), 0);
        assert_eq!(fragments_from_r(1.0, 1e19, 2.0, 12.0), 0);
        assert_eq!(fragments_from_r(1.0, f64::INFINITY, 2.0, 12.0), 0);
        assert_eq!(fragments_from_r(f64::INFINITY, 0.0, 2.0, 12.0), 0);
        assert_eq!(fragments_from_r(f64::NAN, 0.0, 2.0, 12.0), 0);
        // NaN $fn falls back to $fs/$fa
        assert_eq!(fragments_from_r(5.0, f64::NAN, 2.0, 12.0), 8);
    }

    #[test]
    fn test_cube_faces_point_outward() {
        let mesh = generate_cube_mesh(Vector3::new(2.0, 2.0, 2.0), true);
        assert_eq!(mesh.polygon_count(), 6);
        assert!(outward(&mesh));
    }

    #[test]
    fn test_sphere_faces_point_outward() {
        let mesh = generate_sphere_mesh(3.0, 12);
        assert!(outward(&mesh));
        // top + bottom + 2 * fragments per band
        assert_eq!(mesh.polygon_count(), 2 + 5 * 24);
    }

    #[test]
    fn test_cylinder_and_cone_faces_point_outward() {
        assert!(outward(&generate_cylinder_mesh(4.0, 1.0, 1.0, true, 10)));
        assert!(outward(&generate_cylinder_mesh(4.0, 2.0, 1.0, true, 10)));
        assert!(outward(&generate_cylinder_mesh(4.0, 0.0, 1.0, true, 10)));
    }

    #[test]
    fn test_stitch_rings_with_differing_counts() {
        let upper = offset_circle(1.0, 4, 1.0);
        let lower = offset_circle(1.0, 7, 0.0);
        let mut mesh = Mesh::new();
        stitch_rings(&mut mesh, &upper, &lower);
        assert_eq!(mesh.polygon_count(), 11);
        assert!(mesh.polygons.iter().all(|p| p.len() == 3));
    }

    #[test]
    fn test_polyhedron_skips_out_of_range_face() {
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let mesh = generate_polyhedron_mesh(&points, &[vec![0, 1, 2], vec![0, 1, 9]], 2);
        assert_eq!(mesh.polygon_count(), 1);
        assert_eq!(mesh.polygons[0][0], points[2]);
        assert_eq!(mesh.convexity, 2);
    }

    #[test]
    fn test_normalize_paths() {
        let points = vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), Point2::new(0.0, 1.0)];
        let rings = normalize_paths(&points, &[]);
        assert_eq!(rings.len(), 1);
        assert_eq!(rings[0].len(), 4);
        assert_eq!(rings[0][3], rings[0][0]);

        let rings = normalize_paths(&points, &[vec![0, 5, 1, 2], vec![7, 8]]);
        assert_eq!(rings.len(), 1);
        assert_eq!(rings[0].len(), 4);
    }

    #[test]
    fn test_polygon_keeps_borders() {
        let points = vec![
            Point2::new(0.0, 0.0),
            Point2::new(4.0, 0.0),
            Point2::new(4.0, 4.0),
            Point2::new(0.0, 4.0),
        ];
        let mesh = Primitive::polygon(points, vec![], 1).to_mesh();
        assert!(mesh.is_2d);
        assert_eq!(mesh.polygon_count(), 2);
        assert_eq!(mesh.borders.len(), 1);
    }
}
