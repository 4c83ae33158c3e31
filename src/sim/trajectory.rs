//! Ballistic aim preview
//!
//! Uses the same integrator as the live ball, minus collisions.

use glam::Vec2;

use crate::direction;
use crate::tuning::Tuning;

/// Upper bound on preview steps per frame
const MAX_PREVIEW_STEPS: usize = 1024;

/// Apply gravity and air friction for one physics step
#[inline]
pub fn integrate_velocity(vel: Vec2, tuning: &Tuning, dt: f32) -> Vec2 {
    let vel = vel + Vec2::new(0.0, tuning.gravity() * dt);
    vel * (1.0 - tuning.air_friction * dt).max(0.0)
}

/// Path a shot would follow from `muzzle` along `angle`
///
/// `dt` is the physics step in sim seconds. The first point is the muzzle.
/// The preview is cut short after `MAX_PREVIEW_STEPS` steps.
pub fn predict_trajectory(muzzle: Vec2, angle: f32, tuning: &Tuning, dt: f32) -> Vec<Vec2> {
    let steps = ((tuning.trajectory_secs / dt).round().max(1.0) as usize).min(MAX_PREVIEW_STEPS);
    let mut points = Vec::with_capacity(steps + 1);

    let mut pos = muzzle;
    let mut vel = direction(angle) * tuning.launch_speed;
    points.push(pos);
    for _ in 0..steps {
        vel = integrate_velocity(vel, tuning, dt);
        pos += vel * dt;
        points.push(pos);
    }
    points
}
