// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Textual tree dump
//!
//! One line per node prefixed with `nIDX: `, numbers printed like C's `%g`,
//! children indented by one tab. Each node memoizes its own text.

use super::node::{AdvancedOp, Node, NodeKind};
use crate::geometry::{Primitive, Resolution};
use crate::utils::math::format_g;
use nalgebra::Matrix4;

const RED_ZONE: usize = 64 * 1024;
const STACK_GROWTH: usize = 1024 * 1024;

/// Memoized dump of a subtree
pub fn dump(node: &Node) -> &str {
    node.memo
        .dump
        .get_or_init(|| stacker::maybe_grow(RED_ZONE, STACK_GROWTH, || render(node)))
}

fn render(node: &Node) -> String {
    let header = match &node.kind {
        NodeKind::Primitive(primitive) => {
            return format!("n{}: {}\n", node.idx, primitive_text(primitive));
        }
        NodeKind::Import(imported) => {
            return format!(
                "n{}: import(file = \"{}\", convexity = {});\n",
                node.idx, imported.source, imported.convexity
            );
        }
        NodeKind::Csg { op, .. } => format!("{}()", op.name()),
        NodeKind::Advanced { op, convexity, .. } => match op {
            AdvancedOp::Minkowski => format!("minkowski(convexity = {})", convexity),
            AdvancedOp::Glide { path } => format!(
                "glide(path = {}, convexity = {})",
                path.as_deref().map(points_text).unwrap_or_else(|| "undef".to_string()),
                convexity
            ),
            AdvancedOp::Subdiv { level } => {
                format!("subdiv(level = {}, convexity = {})", level, convexity)
            }
            AdvancedOp::Hull => "hull()".to_string(),
        },
        NodeKind::Transform { matrix, .. } => format!("multmatrix({})", matrix_text(matrix)),
    };

    let mut text = format!("n{}: {} {{\n", node.idx, header);
    for child in node.children() {
        for line in dump(child).lines() {
            text.push('\t');
            text.push_str(line);
            text.push('\n');
        }
    }
    text.push_str("}\n");
    text
}

fn bool_text(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

fn res_text(res: &Resolution) -> String {
    format!(
        "$fn = {}, $fa = {}, $fs = {}",
        format_g(res.fn_),
        format_g(res.fa),
        format_g(res.fs)
    )
}

fn primitive_text(primitive: &Primitive) -> String {
    match primitive {
        Primitive::Cube { size, center } => format!(
            "cube(size = [{}, {}, {}], center = {});",
            format_g(size.x),
            format_g(size.y),
            format_g(size.z),
            bool_text(*center)
        ),
        Primitive::Sphere { r, res } => format!("sphere({}, r = {});", res_text(res), format_g(*r)),
        Primitive::Cylinder {
            h,
            r1,
            r2,
            center,
            res,
        } => format!(
            "cylinder({}, h = {}, r1 = {}, r2 = {}, center = {});",
            res_text(res),
            format_g(*h),
            format_g(*r1),
            format_g(*r2),
            bool_text(*center)
        ),
        Primitive::Polyhedron {
            points,
            triangles,
            convexity,
        } => format!(
            "polyhedron({} points, {} triangles, convexity = {});",
            points.len(),
            triangles.len(),
            convexity
        ),
        Primitive::Square { size, center } => format!(
            "square(size = [{}, {}], center = {});",
            format_g(size.x),
            format_g(size.y),
            bool_text(*center)
        ),
        Primitive::Circle { r, res } => format!("circle({}, r = {});", res_text(res), format_g(*r)),
        Primitive::Polygon {
            points,
            paths,
            convexity,
        } => format!(
            "polygon({} points, {} paths, convexity = {});",
            points.len(),
            paths.len(),
            convexity
        ),
    }
}

fn matrix_text(matrix: &Matrix4<f64>) -> String {
    let rows: Vec<String> = (0..4)
        .map(|r| {
            let cells: Vec<String> = (0..4).map(|c| format_g(matrix[(r, c)])).collect();
            format!("[{}]", cells.join(", "))
        })
        .collect();
    format!("[{}]", rows.join(", "))
}

fn points_text(points: &[nalgebra::Point3<f64>]) -> String {
    let cells: Vec<String> = points
        .iter()
        .map(|p| format!("[{}, {}, {}]", format_g(p.x), format_g(p.y), format_g(p.z)))
        .collect();
    format!("[{}]", cells.join(", "))
}
