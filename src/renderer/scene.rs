//! Scene assembly: game state to world-space triangles
//!
//! Pure and GPU-free so it can be tested natively. Later shapes draw on top.

use glam::Vec2;

use super::shapes;
use super::vertex::{Vertex, colors};
use crate::consts::SIM_DT;
use crate::settings::Settings;
use crate::sim::{GameState, Peg, PegKind, predict_trajectory};

const CIRCLE_SEGMENTS: u32 = 24;
const PEG_OUTLINE_WIDTH: f32 = 2.0;
const BALL_OUTLINE_WIDTH: f32 = 1.0;
const TRAJECTORY_WIDTH: f32 = 2.0;

/// Fill and outline for a peg in its current state
pub fn peg_colors(peg: &Peg) -> ([f32; 4], [f32; 4]) {
    match (peg.kind, peg.hit) {
        (PegKind::Special, false) => (colors::PEG_SPECIAL, colors::PEG_SPECIAL_OUTLINE),
        (PegKind::Special, true) => (colors::PEG_SPECIAL_HIT, colors::PEG_SPECIAL_OUTLINE),
        (PegKind::Normal, false) => (colors::PEG_NORMAL, colors::PEG_NORMAL_OUTLINE),
        (PegKind::Normal, true) => (colors::PEG_NORMAL_HIT, colors::PEG_NORMAL_OUTLINE),
    }
}

fn ball(out: &mut Vec<Vertex>, center: Vec2, radius: f32) {
    shapes::outlined_circle(
        out,
        center,
        radius,
        colors::BALL,
        colors::BALL_OUTLINE,
        BALL_OUTLINE_WIDTH,
        CIRCLE_SEGMENTS,
    );
}

/// Build every triangle for one frame
pub fn build_scene(state: &GameState, settings: &Settings) -> Vec<Vertex> {
    let tuning = &state.tuning;
    let mut out = Vec::with_capacity(8192);

    // Walls
    for wall in &state.walls {
        shapes::rect(&mut out, wall.min(), wall.max(), colors::WALL);
    }

    // Pegs
    for peg in &state.pegs {
        let (fill, outline) = peg_colors(peg);
        shapes::outlined_circle(
            &mut out,
            peg.pos,
            peg.radius,
            fill,
            outline,
            PEG_OUTLINE_WIDTH,
            CIRCLE_SEGMENTS,
        );
    }

    // Bucket ramps
    for side in [&state.bucket.left, &state.bucket.right] {
        shapes::convex_polygon(&mut out, &side.vertices, colors::BUCKET);
    }

    // Stock column
    for pos in state.ball_column_positions() {
        ball(&mut out, pos, tuning.ball_radius);
    }
    if settings.animate_falling_balls() {
        for falling in &state.falling {
            ball(&mut out, falling.pos, tuning.ball_radius);
        }
    }

    if let Some(live) = &state.ball {
        ball(&mut out, live.pos, live.radius);
    }

    // Aiming aids
    if state.shows_trajectory() && settings.trajectory_preview {
        let points = predict_trajectory(
            state.ready_ball_pos(),
            state.launcher.angle,
            tuning,
            SIM_DT * tuning.sim_speed,
        );
        shapes::polyline(&mut out, &points, TRAJECTORY_WIDTH, colors::TRAJECTORY);
    }
    if state.shows_ready_ball() && state.ball_stock > 0 {
        ball(&mut out, state.ready_ball_pos(), tuning.ball_radius);
    }

    shapes::rotated_rect(
        &mut out,
        state.launcher.origin,
        tuning.launcher_length,
        tuning.launcher_thickness(),
        state.launcher.angle,
        colors::LAUNCHER,
    );

    out
}
