// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry analytics and statistics

use super::{ExactSolid, Mesh};
use ahash::AHashMap;
use geo::{Area, BooleanOps, MultiPolygon};
use serde::{Deserialize, Serialize};

/// Geometry statistics and analytics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeometryStats {
    /// 0 (nothing), 2 or 3
    pub dimension: u8,
    /// Enclosed volume in cubic units (3D only)
    pub volume: f64,
    /// Surface area (3D) or enclosed area (2D) in square units
    pub area: f64,
    /// Bounding box [min_x, min_y, min_z, max_x, max_y, max_z]
    pub bbox: [f64; 6],
    /// Average of all polygon corners [x, y, z]
    pub centroid: [f64; 3],
    /// Number of polygon corners
    pub vertex_count: usize,
    pub polygon_count: usize,
    /// Is every edge shared by exactly two polygons?
    pub is_watertight: bool,
}

impl GeometryStats {
    /// Create empty stats
    pub fn empty() -> Self {
        Self {
            dimension: 0,
            volume: 0.0,
            area: 0.0,
            bbox: [0.0; 6],
            centroid: [0.0; 3],
            vertex_count: 0,
            polygon_count: 0,
            is_watertight: false,
        }
    }

    /// Pretty print statistics
    pub fn print(&self) {
        println!("╔══════════════════════════════════════════════════════════╗");
        println!("║              GEOMETRY ANALYTICS                          ║");
        println!("╠══════════════════════════════════════════════════════════╣");
        println!("║ Dimension:       {:>10}                              ║", self.dimension);
        println!("║ Volume:          {:>10.4}                              ║", self.volume);
        println!("║ Area:            {:>10.4}                              ║", self.area);
        println!(
            "║ Centroid:        ({:>7.2}, {:>7.2}, {:>7.2})            ║",
            self.centroid[0], self.centroid[1], self.centroid[2]
        );
        println!("║                                                          ║");
        println!("║ Bounding Box:                                            ║");
        println!(
            "║   Min: ({:>7.2}, {:>7.2}, {:>7.2})                      ║",
            self.bbox[0], self.bbox[1], self.bbox[2]
        );
        println!(
            "║   Max: ({:>7.2}, {:>7.2}, {:>7.2})                      ║",
            self.bbox[3], self.bbox[4], self.bbox[5]
        );
        println!("║                                                          ║");
        println!("║ Vertices:        {:>10}                              ║", self.vertex_count);
        println!("║ Polygons:        {:>10}                              ║", self.polygon_count);
        println!(
            "║ Watertight:      {:>10}                              ║",
            if self.is_watertight { "Yes" } else { "No" }
        );
        println!("╚══════════════════════════════════════════════════════════╝");
    }
}

/// Analyze mesh geometry and compute statistics
pub fn analyze_mesh(mesh: &Mesh) -> GeometryStats {
    if mesh.is_empty() {
        return GeometryStats::empty();
    }

    let (dimension, volume, area, is_watertight) = if mesh.is_2d {
        (2, 0.0, planar_area(mesh), false)
    } else {
        (3, signed_volume(mesh).abs(), surface_area(mesh), check_watertight(mesh))
    };

    GeometryStats {
        dimension,
        volume,
        area,
        bbox: bbox_array(mesh),
        centroid: calculate_centroid(mesh),
        vertex_count: mesh.vertex_count(),
        polygon_count: mesh.polygon_count(),
        is_watertight,
    }
}

/// Analyze an exact solid; volume and area come from the exact representation
pub fn analyze_solid(solid: &ExactSolid) -> GeometryStats {
    let mut stats = analyze_mesh(&solid.to_mesh());
    stats.dimension = solid.dimension().as_u8();
    stats.volume = solid.volume();
    stats.area = solid.area();
    stats
}

fn bbox_array(mesh: &Mesh) -> [f64; 6] {
    let bbox = mesh.bounding_box();
    [bbox.min.x, bbox.min.y, bbox.min.z, bbox.max.x, bbox.max.y, bbox.max.z]
}

/// Mesh volume using signed volume of fan triangles
fn signed_volume(mesh: &Mesh) -> f64 {
    mesh.triangles()
        .iter()
        .map(|[v0, v1, v2]| v0.coords.dot(&v1.coords.cross(&v2.coords)) / 6.0)
        .sum()
}

fn surface_area(mesh: &Mesh) -> f64 {
    mesh.triangles()
        .iter()
        .map(|[v0, v1, v2]| (v1 - v0).cross(&(v2 - v0)).norm() / 2.0)
        .sum()
}

/// Area covered by the polygons of a 2D mesh (overlaps counted once)
fn planar_area(mesh: &Mesh) -> f64 {
    mesh.polygons
        .iter()
        .filter(|poly| poly.len() >= 3)
        .map(|poly| {
            let mut coords: Vec<(f64, f64)> = poly.iter().map(|p| (p.x, p.y)).collect();
            coords.push(coords[0]);
            MultiPolygon::new(vec![geo::Polygon::new(coords.into(), vec![])])
        })
        .fold(MultiPolygon::new(vec![]), |acc: MultiPolygon<f64>, next| acc.union(&next))
        .unsigned_area()
}

fn calculate_centroid(mesh: &Mesh) -> [f64; 3] {
    let count = mesh.vertex_count() as f64;
    let sum = mesh
        .polygons
        .iter()
        .flatten()
        .fold([0.0; 3], |acc, p| [acc[0] + p.x, acc[1] + p.y, acc[2] + p.z]);
    [sum[0] / count, sum[1] / count, sum[2] / count]
}

/// A mesh is watertight if every edge is shared by exactly 2 polygons
fn check_watertight(mesh: &Mesh) -> bool {
    let mut edge_count: AHashMap<([u64; 3], [u64; 3]), usize> = AHashMap::new();
    let key = |p: &nalgebra::Point3<f64>| [p.x.to_bits(), p.y.to_bits(), p.z.to_bits()];

    for poly in &mesh.polygons {
        for i in 0..poly.len() {
            let a = key(&poly[i]);
            let b = key(&poly[(i + 1) % poly.len()]);
            let edge = if a < b { (a, b) } else { (b, a) };
            *edge_count.entry(edge).or_insert(0) += 1;
        }
    }

    edge_count.values().all(|&count| count == 2)
}
