//! Collision detection and response for the ball
//!
//! Every obstacle in the field is static (or kinematic, like the bucket), so
//! only the ball ever receives a response.

use glam::Vec2;

use super::geometry::{ConvexPolygon, Rect, closest_point_on_segment};

/// Result of a collision check
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether a collision occurred
    pub hit: bool,
    /// Surface normal at contact, pointing from the obstacle toward the ball
    pub normal: Vec2,
    /// Penetration depth (for position correction)
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            normal: Vec2::ZERO,
            penetration: 0.0,
        }
    }

    fn contact(normal: Vec2, penetration: f32) -> Self {
        Self {
            hit: true,
            normal,
            penetration,
        }
    }
}

/// Check collision between the ball and a circular peg
pub fn ball_circle_collision(
    ball_pos: Vec2,
    ball_radius: f32,
    center: Vec2,
    radius: f32,
) -> CollisionResult {
    let offset = ball_pos - center;
    let dist = offset.length();
    let reach = ball_radius + radius;

    if dist >= reach {
        return CollisionResult::miss();
    }

    // Concentric: push straight up
    let normal = if dist > 1e-4 { offset / dist } else { Vec2::NEG_Y };
    CollisionResult::contact(normal, reach - dist)
}

/// Check collision between the ball and an axis-aligned rectangle
pub fn ball_rect_collision(ball_pos: Vec2, ball_radius: f32, rect: &Rect) -> CollisionResult {
    let closest = rect.closest_point(ball_pos);
    let offset = ball_pos - closest;
    let dist_sq = offset.length_squared();

    if dist_sq > 1e-8 {
        if dist_sq >= ball_radius * ball_radius {
            return CollisionResult::miss();
        }
        let dist = dist_sq.sqrt();
        return CollisionResult::contact(offset / dist, ball_radius - dist);
    }

    // Center inside the rect (tunneling case): exit through the nearest face
    let local = ball_pos - rect.center;
    let depth = rect.half_extents - local.abs();
    if depth.x < depth.y {
        CollisionResult::contact(Vec2::new(local.x.signum(), 0.0), depth.x + ball_radius)
    } else {
        CollisionResult::contact(Vec2::new(0.0, local.y.signum()), depth.y + ball_radius)
    }
}

/// Check collision between the ball and a convex polygon
pub fn ball_polygon_collision(
    ball_pos: Vec2,
    ball_radius: f32,
    poly: &ConvexPolygon,
) -> CollisionResult {
    let n = poly.vertices.len();
    if n < 3 {
        return CollisionResult::miss();
    }

    if poly.contains_point(ball_pos) {
        // Least-penetration face
        let (edge, separation) = (0..n)
            .map(|i| (i, poly.edge_normal(i).dot(ball_pos - poly.vertices[i])))
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .unwrap_or((0, 0.0));
        return CollisionResult::contact(poly.edge_normal(edge), ball_radius - separation);
    }

    let mut best: Option<(Vec2, f32)> = None;
    for i in 0..n {
        let closest = closest_point_on_segment(ball_pos, poly.vertices[i], poly.vertices[(i + 1) % n]);
        let dist_sq = (ball_pos - closest).length_squared();
        if best.is_none_or(|(_, d)| dist_sq < d) {
            best = Some((closest, dist_sq));
        }
    }

    match best {
        Some((closest, dist_sq)) if dist_sq < ball_radius * ball_radius => {
            let dist = dist_sq.sqrt();
            let normal = (ball_pos - closest).normalize_or_zero();
            CollisionResult::contact(normal, ball_radius - dist)
        }
        _ => CollisionResult::miss(),
    }
}

/// Velocity after contact with a surface
///
/// Only the normal component changes. Slow approaches (below `resting_speed`)
/// lose it entirely so a ball can come to rest against pegs.
pub fn resolve_contact(velocity: Vec2, normal: Vec2, restitution: f32, resting_speed: f32) -> Vec2 {
    let vn = velocity.dot(normal);
    if vn >= 0.0 {
        return velocity; // Already separating
    }
    let tangential = velocity - vn * normal;
    if -vn < resting_speed {
        tangential
    } else {
        tangential - restitution * vn * normal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ball_circle_collision_overlap() {
        let result = ball_circle_collision(Vec2::new(0.0, -20.0), 11.7, Vec2::ZERO, 11.8);
        assert!(result.hit);
        assert!((result.normal - Vec2::NEG_Y).length() < 1e-5);
        assert!((result.penetration - 3.5).abs() < 1e-4);
    }

    #[test]
    fn test_ball_circle_collision_miss() {
        let result = ball_circle_collision(Vec2::new(30.0, 0.0), 11.7, Vec2::ZERO, 11.8);
        assert!(!result.hit);
    }

    #[test]
    fn test_ball_rect_collision_side() {
        // Right face of the left wall at x = 50
        let wall = Rect::new(Vec2::new(25.0, 0.0), 50.0, 1800.0);
        let result = ball_rect_collision(Vec2::new(55.0, 100.0), 11.7, &wall);
        assert!(result.hit);
        assert!((result.normal - Vec2::X).length() < 1e-5);
        assert!((result.penetration - 6.7).abs() < 1e-4);

        let result = ball_rect_collision(Vec2::new(70.0, 100.0), 11.7, &wall);
        assert!(!result.hit);
    }

    #[test]
    fn test_ball_rect_collision_center_inside() {
        let wall = Rect::new(Vec2::new(25.0, 0.0), 50.0, 1800.0);
        let result = ball_rect_collision(Vec2::new(45.0, 0.0), 10.0, &wall);
        assert!(result.hit);
        assert_eq!(result.normal, Vec2::X);
        assert!((result.penetration - 15.0).abs() < 1e-4);
    }

    #[test]
    fn test_ball_polygon_collision_slope() {
        // Left bucket ramp: slope faces up-left
        let ramp = ConvexPolygon::new(vec![
            Vec2::new(415.0, 760.0),
            Vec2::new(355.0, 800.0),
            Vec2::new(415.0, 800.0),
        ]);
        let result = ball_polygon_collision(Vec2::new(385.0, 772.0), 11.7, &ramp);
        assert!(result.hit);
        assert!(result.normal.x < 0.0 && result.normal.y < 0.0);

        // Vertical inner face at x = 415 faces right
        let result = ball_polygon_collision(Vec2::new(425.0, 790.0), 11.7, &ramp);
        assert!(result.hit);
        assert!((result.normal - Vec2::X).length() < 1e-4);

        let result = ball_polygon_collision(Vec2::new(450.0, 700.0), 11.7, &ramp);
        assert!(!result.hit);
    }

    #[test]
    fn test_ball_polygon_collision_center_inside() {
        let ramp = ConvexPolygon::new(vec![
            Vec2::new(415.0, 760.0),
            Vec2::new(355.0, 800.0),
            Vec2::new(415.0, 800.0),
        ]);
        let result = ball_polygon_collision(Vec2::new(412.0, 795.0), 11.7, &ramp);
        assert!(result.hit);
        assert!(result.penetration > 11.7);
    }

    #[test]
    fn test_resolve_contact_bounce() {
        let v = resolve_contact(Vec2::new(50.0, 400.0), Vec2::NEG_Y, 0.95, 40.0);
        assert!((v.x - 50.0).abs() < 1e-4);
        assert!((v.y - (-380.0)).abs() < 1e-3);
    }

    #[test]
    fn test_resolve_contact_resting() {
        let v = resolve_contact(Vec2::new(10.0, 5.0), Vec2::NEG_Y, 0.95, 40.0);
        assert_eq!(v, Vec2::new(10.0, 0.0));
    }

    #[test]
    fn test_resolve_contact_separating() {
        let v = Vec2::new(0.0, -100.0);
        assert_eq!(resolve_contact(v, Vec2::NEG_Y, 0.95, 40.0), v);
    }
}
