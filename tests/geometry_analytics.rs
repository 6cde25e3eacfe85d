// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry analytics verification tests

use anyhow::Result;
use nalgebra::{Vector2, Vector3};
use polyframe_csg::geometry::{analyze_mesh, analyze_solid, GeometryStats, Primitive, Resolution};
use polyframe_csg::ExactSolid;

#[test]
fn test_cylinder_volume_and_surface_area() -> Result<()> {
    let (r, h, n) = (5.0, 10.0, 64);
    let mesh = Primitive::cylinder(h, r, r, false, Resolution::fixed(n)).to_mesh();
    let stats = analyze_mesh(&mesh);

    let expected_volume = std::f64::consts::PI * r * r * h;
    println!("Cylinder r={} h={}:", r, h);
    println!("  Volume: {:.2} (expected: {:.2})", stats.volume, expected_volume);
    println!("  Polygons: {}", stats.polygon_count);

    assert!(
        (stats.volume - expected_volume).abs() / expected_volume < 0.01,
        "Volume {} not close to {}",
        stats.volume,
        expected_volume
    );
    assert_eq!(stats.polygon_count, n as usize + 2);
    assert!(stats.is_watertight);

    Ok(())
}

#[test]
fn test_bounding_box_accuracy() -> Result<()> {
    let size = Vector3::new(10.0, 20.0, 30.0);
    let mesh = Primitive::cube(size, true).to_mesh();
    let stats = analyze_mesh(&mesh);

    println!(
        "  BBox min: ({:.2}, {:.2}, {:.2})",
        stats.bbox[0], stats.bbox[1], stats.bbox[2]
    );
    println!(
        "  BBox max: ({:.2}, {:.2}, {:.2})",
        stats.bbox[3], stats.bbox[4], stats.bbox[5]
    );

    // For centered cube, bbox should be ±size/2
    let expected_min = [-5.0, -10.0, -15.0];
    let expected_max = [5.0, 10.0, 15.0];

    for i in 0..3 {
        assert!(
            (stats.bbox[i] - expected_min[i]).abs() < 1e-9,
            "BBox min[{}] = {} not close to {}",
            i,
            stats.bbox[i],
            expected_min[i]
        );
        assert!(
            (stats.bbox[i + 3] - expected_max[i]).abs() < 1e-9,
            "BBox max[{}] = {} not close to {}",
            i,
            stats.bbox[i + 3],
            expected_max[i]
        );
    }

    Ok(())
}

#[test]
fn test_centroid_calculation() -> Result<()> {
    let mesh = Primitive::cube(Vector3::new(10.0, 10.0, 10.0), true).to_mesh();
    let stats = analyze_mesh(&mesh);

    for i in 0..3 {
        assert!(
            stats.centroid[i].abs() < 1e-9,
            "Centroid[{}] = {} not near zero",
            i,
            stats.centroid[i]
        );
    }

    Ok(())
}

#[test]
fn test_planar_solid_stats() -> Result<()> {
    let mesh = Primitive::square(Vector2::new(3.0, 2.0), false).to_mesh();
    let stats = analyze_solid(&ExactSolid::from_mesh(&mesh)?);

    assert_eq!(stats.dimension, 2);
    assert_eq!(stats.volume, 0.0);
    assert!((stats.area - 6.0).abs() < 1e-9, "Area {} not 6", stats.area);
    assert_eq!(&stats.bbox[..2], &[0.0, 0.0]);
    assert_eq!(&stats.bbox[3..5], &[3.0, 2.0]);

    Ok(())
}

#[test]
fn test_stats_json_serialization() -> Result<()> {
    let mesh = Primitive::sphere(10.0, Resolution::fixed(32)).to_mesh();
    let stats = analyze_mesh(&mesh);

    let json = serde_json::to_string_pretty(&stats)?;
    let deserialized: GeometryStats = serde_json::from_str(&json)?;

    assert_eq!(deserialized.vertex_count, stats.vertex_count);
    assert_eq!(deserialized.polygon_count, stats.polygon_count);
    assert!((deserialized.volume - stats.volume).abs() < 0.01);

    Ok(())
}
