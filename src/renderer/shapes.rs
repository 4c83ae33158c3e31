//! Shape generation for 2D primitives
//!
//! Everything is emitted as a flat triangle list in world coordinates.

use glam::Vec2;
use std::f32::consts::TAU;

use super::vertex::Vertex;

#[inline]
fn push_tri(out: &mut Vec<Vertex>, a: Vec2, b: Vec2, c: Vec2, color: [f32; 4]) {
    out.push(Vertex::new(a.x, a.y, color));
    out.push(Vertex::new(b.x, b.y, color));
    out.push(Vertex::new(c.x, c.y, color));
}

#[inline]
fn push_quad(out: &mut Vec<Vertex>, corners: [Vec2; 4], color: [f32; 4]) {
    let [a, b, c, d] = corners;
    push_tri(out, a, b, c, color);
    push_tri(out, c, b, d, color);
}

#[inline]
fn on_circle(center: Vec2, radius: f32, i: u32, segments: u32) -> Vec2 {
    let theta = i as f32 / segments as f32 * TAU;
    center + Vec2::new(theta.cos(), theta.sin()) * radius
}

/// Filled circle as a triangle fan
pub fn circle(out: &mut Vec<Vertex>, center: Vec2, radius: f32, color: [f32; 4], segments: u32) {
    for i in 0..segments {
        let a = on_circle(center, radius, i, segments);
        let b = on_circle(center, radius, i + 1, segments);
        push_tri(out, center, a, b, color);
    }
}

/// Hollow circle between two radii
pub fn ring(
    out: &mut Vec<Vertex>,
    center: Vec2,
    inner_radius: f32,
    outer_radius: f32,
    color: [f32; 4],
    segments: u32,
) {
    for i in 0..segments {
        push_quad(
            out,
            [
                on_circle(center, inner_radius, i, segments),
                on_circle(center, outer_radius, i, segments),
                on_circle(center, inner_radius, i + 1, segments),
                on_circle(center, outer_radius, i + 1, segments),
            ],
            color,
        );
    }
}

/// Filled circle with an outline drawn inside its edge
pub fn outlined_circle(
    out: &mut Vec<Vertex>,
    center: Vec2,
    radius: f32,
    fill: [f32; 4],
    outline: [f32; 4],
    outline_width: f32,
    segments: u32,
) {
    circle(out, center, radius, fill, segments);
    ring(out, center, (radius - outline_width).max(0.0), radius, outline, segments);
}

/// Axis-aligned rectangle from its min and max corners
pub fn rect(out: &mut Vec<Vertex>, min: Vec2, max: Vec2, color: [f32; 4]) {
    push_quad(
        out,
        [min, Vec2::new(max.x, min.y), Vec2::new(min.x, max.y), max],
        color,
    );
}

/// Rectangle centered on `center`, long axis along `angle`
pub fn rotated_rect(
    out: &mut Vec<Vertex>,
    center: Vec2,
    length: f32,
    thickness: f32,
    angle: f32,
    color: [f32; 4],
) {
    let along = Vec2::new(angle.cos(), angle.sin()) * (length / 2.0);
    let across = along.perp().normalize_or_zero() * (thickness / 2.0);
    push_quad(
        out,
        [
            center - along - across,
            center + along - across,
            center - along + across,
            center + along + across,
        ],
        color,
    );
}

/// Convex polygon as a fan from its first vertex
pub fn convex_polygon(out: &mut Vec<Vertex>, vertices: &[Vec2], color: [f32; 4]) {
    let Some((&first, rest)) = vertices.split_first() else {
        return;
    };
    for pair in rest.windows(2) {
        push_tri(out, first, pair[0], pair[1], color);
    }
}

/// Open polyline of constant width
pub fn polyline(out: &mut Vec<Vertex>, points: &[Vec2], width: f32, color: [f32; 4]) {
    let half = width / 2.0;
    for pair in points.windows(2) {
        let (p1, p2) = (pair[0], pair[1]);
        let dir = (p2 - p1).normalize_or_zero();
        if dir == Vec2::ZERO {
            continue;
        }
        // Perpendicular for width
        let perp = dir.perp() * half;
        push_quad(out, [p1 + perp, p1 - perp, p2 + perp, p2 - perp], color);
    }
}
