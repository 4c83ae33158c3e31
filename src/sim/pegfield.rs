//! Peg field generation
//!
//! Pegs are scattered by rejection sampling: each candidate is redrawn until
//! it keeps the minimum spacing to every peg already placed. The first pegs
//! placed become the special (red) pegs that must all be hit to win.

use glam::Vec2;
use rand::Rng;

use super::state::{Peg, PegKind};
use crate::tuning::Tuning;

/// Candidate draws allowed per peg before the field is declared full
pub const MAX_PLACEMENT_ATTEMPTS: u32 = 2_000;

/// Lattice offsets; one is picked per field
const PATTERN_OFFSETS: [Vec2; 4] = [
    Vec2::new(0.0, 0.0),
    Vec2::new(25.0, 25.0),
    Vec2::new(0.0, 25.0),
    Vec2::new(25.0, 0.0),
];

/// Lowest and highest allowed peg centers for a given offset
fn spawn_bounds(tuning: &Tuning, offset: Vec2) -> (Vec2, Vec2) {
    let r = tuning.peg_radius;
    let min = Vec2::new(tuning.side_no_spawn + r, tuning.top_no_spawn + r);
    let max = Vec2::new(
        tuning.width - tuning.side_no_spawn - r,
        tuning.height - tuning.bottom_no_spawn - r,
    );
    // Shift the floor, never the ceiling, so pegs stay clear of the walls
    ((min + offset).min(max), max)
}

/// Generate a fresh peg field; ids count up from `first_id`
pub fn generate_peg_field<R: Rng + ?Sized>(rng: &mut R, tuning: &Tuning, first_id: u32) -> Vec<Peg> {
    let offset = PATTERN_OFFSETS[rng.random_range(0..PATTERN_OFFSETS.len())];
    let (lo, hi) = spawn_bounds(tuning, offset);
    let span = hi - lo;
    let min_dist_sq = tuning.min_peg_distance().powi(2);

    let target = tuning.peg_count as usize;
    let mut pegs: Vec<Peg> = Vec::with_capacity(target);

    'placing: for _ in 0..target {
        for _ in 0..MAX_PLACEMENT_ATTEMPTS {
            let pos = lo + Vec2::new(rng.random::<f32>() * span.x, rng.random::<f32>() * span.y);
            if pegs.iter().all(|p| p.pos.distance_squared(pos) >= min_dist_sq) {
                let kind = if pegs.len() < tuning.special_peg_count as usize {
                    PegKind::Special
                } else {
                    PegKind::Normal
                };
                pegs.push(Peg::new(first_id + pegs.len() as u32, pos, tuning.peg_radius, kind));
                continue 'placing;
            }
        }

        log::warn!(
            "Peg field saturated: placed {} of {} pegs",
            pegs.len(),
            target
        );
        break;
    }

    log::info!(
        "Peg field: {} pegs, offset ({}, {})",
        pegs.len(),
        offset.x,
        offset.y
    );
    pegs
}
