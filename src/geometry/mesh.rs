// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Polygon-set mesh representation and utilities

use super::BoundingBox;
use nalgebra::{Matrix4, Point2, Point3};
use serde::{Deserialize, Serialize};

/// A single polygon: an ordered, implicitly closed point loop
pub type Polygon = Vec<Point3<f64>>;

/// A closed 2D outline
pub type Border = Vec<Point2<f64>>;

/// Ordered sequence of polygons.
///
/// A mesh is either 2D (every point has z = 0) or 3D, never both. 2D meshes
/// may additionally carry the outlines they were tessellated from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub polygons: Vec<Polygon>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub borders: Vec<Border>,
    #[serde(default)]
    pub is_2d: bool,
    #[serde(default = "default_convexity")]
    pub convexity: u32,
}

fn default_convexity() -> u32 {
    1
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}

impl Mesh {
    pub fn new() -> Self {
        Self {
            polygons: Vec::new(),
            borders: Vec::new(),
            is_2d: false,
            convexity: 1,
        }
    }

    pub fn new_2d() -> Self {
        Self {
            is_2d: true,
            ..Self::new()
        }
    }

    pub fn with_convexity(mut self, convexity: u32) -> Self {
        self.convexity = convexity.max(1);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    /// Start a new, empty polygon at the end of the mesh
    pub fn append_poly(&mut self) {
        self.polygons.push(Vec::new());
    }

    /// Append a point to the last polygon
    pub fn append_vertex(&mut self, x: f64, y: f64, z: f64) {
        if let Some(poly) = self.polygons.last_mut() {
            poly.push(Point3::new(x, y, z));
        }
    }

    pub fn append_vertex_2d(&mut self, x: f64, y: f64) {
        self.append_vertex(x, y, 0.0);
    }

    /// Prepend a point to the last polygon, reversing the order of
    /// a run of insertions
    pub fn insert_vertex(&mut self, x: f64, y: f64, z: f64) {
        if let Some(poly) = self.polygons.last_mut() {
            poly.insert(0, Point3::new(x, y, z));
        }
    }

    /// Add a complete polygon
    pub fn push_polygon(&mut self, polygon: Polygon) {
        self.polygons.push(polygon);
    }

    /// Transform all vertices (and borders, for 2D meshes) by a matrix
    pub fn transform(&mut self, matrix: &Matrix4<f64>) {
        for point in self.polygons.iter_mut().flatten() {
            *point = matrix.transform_point(point);
        }
        for point in self.borders.iter_mut().flatten() {
            let moved = matrix.transform_point(&Point3::new(point.x, point.y, 0.0));
            *point = Point2::new(moved.x, moved.y);
        }
    }

    /// Compute bounding box
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(self.polygons.iter().flatten())
    }

    pub fn polygon_count(&self) -> usize {
        self.polygons.len()
    }

    /// Total number of polygon corners (shared corners counted per polygon)
    pub fn vertex_count(&self) -> usize {
        self.polygons.iter().map(Vec::len).sum()
    }

    /// Fan-triangulate every polygon
    pub fn triangles(&self) -> Vec<[Point3<f64>; 3]> {
        let mut triangles = Vec::new();
        for poly in &self.polygons {
            for i in 1..poly.len().saturating_sub(1) {
                triangles.push([poly[0], poly[i], poly[i + 1]]);
            }
        }
        triangles
    }
}
