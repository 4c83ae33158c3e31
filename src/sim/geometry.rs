//! Static body shapes for pegs, walls and the bucket
//!
//! World coordinates are screen pixels with y growing downward.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub center: Vec2,
    pub half_extents: Vec2,
}

impl Rect {
    pub fn new(center: Vec2, width: f32, height: f32) -> Self {
        Self {
            center,
            half_extents: Vec2::new(width / 2.0, height / 2.0),
        }
    }

    #[inline]
    pub fn min(&self) -> Vec2 {
        self.center - self.half_extents
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        self.center + self.half_extents
    }

    /// Closest point on or inside the rectangle
    pub fn closest_point(&self, point: Vec2) -> Vec2 {
        point.clamp(self.min(), self.max())
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.center += delta;
    }
}

/// A convex polygon with vertices in world space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvexPolygon {
    pub vertices: Vec<Vec2>,
}

impl ConvexPolygon {
    pub fn new(vertices: Vec<Vec2>) -> Self {
        Self { vertices }
    }

    /// Place a polygon given in local coordinates so that its local origin
    /// lands on `anchor`
    pub fn from_local(local: &[Vec2], anchor: Vec2) -> Self {
        Self::new(local.iter().map(|v| *v + anchor).collect())
    }

    /// Signed area (positive when vertices wind clockwise on screen)
    pub fn signed_area(&self) -> f32 {
        let n = self.vertices.len();
        let mut area = 0.0;
        for i in 0..n {
            let a = self.vertices[i];
            let b = self.vertices[(i + 1) % n];
            area += a.perp_dot(b);
        }
        area / 2.0
    }

    pub fn translate(&mut self, delta: Vec2) {
        for v in &mut self.vertices {
            *v += delta;
        }
    }

    /// Outward unit normal of the edge from vertex `i` to `i + 1`
    pub fn edge_normal(&self, i: usize) -> Vec2 {
        let a = self.vertices[i];
        let b = self.vertices[(i + 1) % self.vertices.len()];
        let edge = b - a;
        // Outward for positive winding; flip for the other
        let n = Vec2::new(edge.y, -edge.x).normalize_or_zero();
        if self.signed_area() < 0.0 { -n } else { n }
    }

    pub fn contains_point(&self, point: Vec2) -> bool {
        (0..self.vertices.len()).all(|i| self.edge_normal(i).dot(point - self.vertices[i]) <= 0.0)
    }
}

/// Closest point to `p` on the segment `a`-`b`
pub fn closest_point_on_segment(p: Vec2, a: Vec2, b: Vec2) -> Vec2 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq < 0.0001 {
        return a; // Degenerate segment
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    a + ab * t
}

#[cfg(test)]
mod tests {
    use super::*;

    fn left_ramp() -> ConvexPolygon {
        ConvexPolygon::new(vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(-60.0, 40.0),
            Vec2::new(0.0, 40.0),
        ])
    }

    #[test]
    fn test_edge_normals_point_outward() {
        for poly in [left_ramp(), {
            let mut p = left_ramp();
            p.vertices.reverse();
            p
        }] {
            let c = poly.vertices.iter().copied().sum::<Vec2>() / 3.0;
            for i in 0..poly.vertices.len() {
                let mid = (poly.vertices[i] + poly.vertices[(i + 1) % 3]) / 2.0;
                assert!(poly.edge_normal(i).dot(mid - c) > 0.0);
            }
        }
    }

    #[test]
    fn test_polygon_contains_point() {
        let poly = left_ramp();
        assert!(poly.contains_point(Vec2::new(-10.0, 30.0)));
        assert!(!poly.contains_point(Vec2::new(-50.0, 5.0)));
        assert!(!poly.contains_point(Vec2::new(10.0, 30.0)));
    }

    #[test]
    fn test_from_local_and_translate() {
        let mut poly = ConvexPolygon::from_local(&left_ramp().vertices, Vec2::new(415.0, 760.0));
        assert_eq!(poly.vertices[1], Vec2::new(355.0, 800.0));
        poly.translate(Vec2::new(5.0, 0.0));
        assert_eq!(poly.vertices[0], Vec2::new(420.0, 760.0));
    }

    #[test]
    fn test_rect_closest_point() {
        let rect = Rect::new(Vec2::new(500.0, 800.0), 170.0, 5.0);
        assert_eq!(rect.closest_point(Vec2::new(420.0, 801.0)), Vec2::new(420.0, 801.0));
        assert_eq!(
            rect.closest_point(Vec2::new(500.0, 700.0)),
            Vec2::new(500.0, 797.5)
        );
    }
}
