//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod collision;
pub mod geometry;
pub mod pegfield;
pub mod schedule;
pub mod state;
pub mod tick;
pub mod trajectory;

pub use collision::{CollisionResult, ball_circle_collision, ball_polygon_collision, ball_rect_collision};
pub use geometry::{ConvexPolygon, Rect};
pub use pegfield::generate_peg_field;
pub use schedule::{Action, Schedule};
pub use state::{
    Ball, Bucket, FallingBall, GameEvent, GamePhase, GameState, Launcher, Peg, PegKind,
};
pub use tick::{TickInput, tick};
pub use trajectory::predict_trajectory;
