//! Game state and core simulation types

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::geometry::{ConvexPolygon, Rect};
use super::pegfield::generate_peg_field;
use super::schedule::{Action, Schedule};
use crate::consts::WALL_OVERHANG;
use crate::direction;
use crate::tuning::Tuning;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Cannon follows the cursor; trajectory and ready ball are shown
    Aiming,
    /// A shot is bouncing through the field
    InFlight,
    /// Shot is over, hit pegs are being cleared
    Settling,
    /// Every special peg was hit
    Won,
    /// Out of balls with special pegs left
    GameOver,
    /// Waiting to refill the stock after Try Again
    Restarting,
}

/// Peg variants (exactly one per peg)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PegKind {
    Normal,
    /// Must be hit to win
    Special,
}

/// A static circular obstacle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Peg {
    pub id: u32,
    pub pos: Vec2,
    pub radius: f32,
    pub kind: PegKind,
    /// Lit by a ball during the current field
    pub hit: bool,
    /// Queued for removal; contacts no longer count as new hits
    #[serde(default)]
    pub removing: bool,
}

impl Peg {
    pub fn new(id: u32, pos: Vec2, radius: f32, kind: PegKind) -> Self {
        Self {
            id,
            pos,
            radius,
            kind,
            hit: false,
            removing: false,
        }
    }

    #[inline]
    pub fn is_special(&self) -> bool {
        self.kind == PegKind::Special
    }
}

/// The ball in play
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ball {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    /// Time spent (nearly) motionless, ms
    pub stationary_ms: f32,
    /// Time spent below the bottom edge, ms
    pub offscreen_ms: f32,
    /// Currently overlapping the bucket sensor
    pub in_bucket: bool,
}

impl Ball {
    pub fn new(pos: Vec2, vel: Vec2, radius: f32) -> Self {
        Self {
            pos,
            vel,
            radius,
            stationary_ms: 0.0,
            offscreen_ms: 0.0,
            in_bucket: false,
        }
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.vel.length()
    }
}

/// A ball dropping into the stock column (no collisions)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FallingBall {
    pub pos: Vec2,
    /// Awarded by the bucket; firing waits for these to land
    pub from_bucket: bool,
}

/// The moving catcher at the bottom of the screen
///
/// Two triangular ramps with a sensor strip between them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bucket {
    pub center_x: f32,
    /// +1 moving right, -1 moving left
    pub direction: f32,
    pub left: ConvexPolygon,
    pub right: ConvexPolygon,
    pub sensor: Rect,
}

impl Bucket {
    pub fn new(tuning: &Tuning) -> Self {
        let half = tuning.bucket_width / 2.0;
        let (sw, bh) = (tuning.bucket_side_width, tuning.bucket_height);
        let mid = tuning.width / 2.0;
        let top = tuning.height - bh;

        let left = ConvexPolygon::from_local(
            &[Vec2::ZERO, Vec2::new(-sw, bh), Vec2::new(0.0, bh)],
            Vec2::new(mid - half, top),
        );
        let right = ConvexPolygon::from_local(
            &[Vec2::ZERO, Vec2::new(sw, bh), Vec2::new(0.0, bh)],
            Vec2::new(mid + half, top),
        );
        let sensor = Rect::new(
            Vec2::new(mid, tuning.height),
            tuning.bucket_width,
            tuning.bucket_sensor_height,
        );

        Self {
            center_x: mid,
            direction: 1.0,
            left,
            right,
            sensor,
        }
    }

    /// Range the bucket center travels between
    pub fn travel_bounds(tuning: &Tuning) -> (f32, f32) {
        let margin = tuning.side_no_spawn + tuning.bucket_width / 2.0 + tuning.bucket_side_width;
        (margin, tuning.width - margin)
    }

    /// Shift every part of the bucket horizontally
    pub fn shift(&mut self, dx: f32) {
        let delta = Vec2::new(dx, 0.0);
        self.center_x += dx;
        self.left.translate(delta);
        self.right.translate(delta);
        self.sensor.translate(delta);
    }
}

/// The cannon at the top of the screen
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Launcher {
    pub origin: Vec2,
    /// Aim angle, radians from +x toward +y (down)
    pub angle: f32,
}

impl Launcher {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            origin: Vec2::new(tuning.width / 2.0, 0.0),
            angle: std::f32::consts::FRAC_PI_2,
        }
    }

    /// Point the barrel at `target`, clamped to the allowed arc
    pub fn aim_at(&mut self, target: Vec2, min_angle: f32, max_angle: f32) {
        let to = target - self.origin;
        // Targets above the muzzle give negative angles and land on the right limit
        self.angle = to.y.atan2(to.x).clamp(min_angle, max_angle);
    }

    /// Where the ready ball sits (and where shots spawn)
    pub fn muzzle(&self, offset: f32) -> Vec2 {
        self.origin + direction(self.angle) * offset
    }
}

/// Things that happened during a tick (drained by the front end)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// First contact with a peg this shot
    PegHit {
        peg_id: u32,
        special: bool,
        /// Playback rate for the hit cue
        pitch: f32,
        /// Fast enough for the loud cue
        hard: bool,
    },
    BallLaunched,
    /// Ball passed through the bucket; an extra ball is on its way
    BucketCatch,
    /// A falling ball joined the stock
    BallStocked { stock: u32 },
    /// Hit pegs queued for removal
    PegsCleared { count: usize },
    /// Ball left the bottom of the screen
    BallLost,
    /// Ball stalled; its hit pegs were cleared to free it
    StuckCleared,
    Won,
    GameOver,
}

/// Complete game state
#[derive(Debug, Clone)]
pub struct GameState {
    pub seed: u64,
    pub rng: Pcg32,
    pub tuning: Tuning,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Wall-clock milliseconds elapsed while unpaused
    pub clock_ms: f64,
    pub phase: GamePhase,
    pub paused: bool,

    pub walls: [Rect; 2],
    pub bucket: Bucket,
    pub launcher: Launcher,
    /// Pegs on the field (sorted by id)
    pub pegs: Vec<Peg>,
    pub ball: Option<Ball>,
    pub falling: Vec<FallingBall>,

    /// Balls available to fire
    pub ball_stock: u32,
    pub shots_fired: u32,
    /// Pegs hit this shot, in first-hit order
    pub hit_order: Vec<u32>,
    /// Rises with every new peg hit in a shot
    pub peg_hit_pitch: f32,

    pub schedule: Schedule,
    pub events: Vec<GameEvent>,
    next_id: u32,
}

impl GameState {
    /// Create a new game with the given seed and a validated tuning table
    pub fn new(seed: u64, tuning: Tuning) -> Self {
        let side = tuning.side_no_spawn;
        let wall_height = tuning.height + WALL_OVERHANG;
        let wall_y = tuning.height / 2.0 - WALL_OVERHANG / 2.0;
        let walls = [
            Rect::new(Vec2::new(side / 2.0, wall_y), side, wall_height),
            Rect::new(Vec2::new(tuning.width - side / 2.0, wall_y), side, wall_height),
        ];

        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            bucket: Bucket::new(&tuning),
            launcher: Launcher::new(&tuning),
            walls,
            tuning,
            time_ticks: 0,
            clock_ms: 0.0,
            phase: GamePhase::Aiming,
            paused: false,
            pegs: Vec::new(),
            ball: None,
            falling: Vec::new(),
            ball_stock: 0,
            shots_fired: 0,
            hit_order: Vec::new(),
            peg_hit_pitch: 1.0,
            schedule: Schedule::new(),
            events: Vec::new(),
            next_id: 1,
        };

        state.regenerate_pegs();
        state.start_initial_drops();
        state
    }

    /// Replace the field with a freshly generated one
    pub fn regenerate_pegs(&mut self) {
        let first_id = self.next_id;
        self.pegs = generate_peg_field(&mut self.rng, &self.tuning, first_id);
        self.next_id = first_id + self.pegs.len() as u32;
    }

    /// Queue the staggered drops that fill the stock at game start
    pub fn start_initial_drops(&mut self) {
        for i in 0..self.tuning.starting_balls {
            self.schedule.after(
                self.clock_ms,
                i as f32 * self.tuning.drop_stagger_ms,
                Action::DropBall { from_bucket: false },
            );
        }
    }

    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Take all events emitted since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    #[inline]
    pub fn shows_trajectory(&self) -> bool {
        self.phase == GamePhase::Aiming
    }

    #[inline]
    pub fn shows_ready_ball(&self) -> bool {
        self.phase == GamePhase::Aiming
    }

    pub fn ready_ball_pos(&self) -> Vec2 {
        self.launcher.muzzle(self.tuning.ready_ball_offset)
    }

    /// Special pegs not yet hit
    pub fn special_pegs_remaining(&self) -> usize {
        self.pegs.iter().filter(|p| p.is_special() && !p.hit).count()
    }

    /// A bucket-awarded ball is still on its way to the stock
    pub fn bucket_ball_falling(&self) -> bool {
        self.falling.iter().any(|b| b.from_bucket)
    }

    /// Height at which the next falling ball joins the column
    pub fn column_top(&self) -> f32 {
        self.tuning.height
            - self.tuning.column_base_offset
            - self.ball_stock as f32 * self.tuning.column_spacing
    }

    /// Centers of the stacked stock balls, bottom first
    pub fn ball_column_positions(&self) -> Vec<Vec2> {
        let x = self.tuning.side_no_spawn / 2.0;
        let base = self.tuning.height - self.tuning.column_base_offset;
        (0..self.ball_stock)
            .map(|i| Vec2::new(x, base - i as f32 * self.tuning.column_spacing))
            .collect()
    }

    /// Point the cannon toward a world position
    pub fn aim_at(&mut self, target: Vec2) {
        if self.paused {
            return;
        }
        let (min, max) = (self.tuning.min_angle(), self.tuning.max_angle());
        self.launcher.aim_at(target, min, max);
    }

    pub fn can_fire(&self) -> bool {
        !self.paused
            && self.phase == GamePhase::Aiming
            && self.ball.is_none()
            && self.ball_stock > 0
            && !self.bucket_ball_falling()
    }

    /// Launch a ball along the current aim; returns false when not allowed
    pub fn fire(&mut self) -> bool {
        if !self.can_fire() {
            return false;
        }

        self.ball_stock -= 1;
        self.shots_fired += 1;
        let vel = direction(self.launcher.angle) * self.tuning.launch_speed;
        self.ball = Some(Ball::new(self.ready_ball_pos(), vel, self.tuning.ball_radius));
        self.hit_order.clear();
        self.phase = GamePhase::InFlight;
        self.emit(GameEvent::BallLaunched);
        log::debug!(
            "Shot {} fired at {:.1}°, {} left",
            self.shots_fired,
            self.launcher.angle.to_degrees(),
            self.ball_stock
        );
        true
    }

    /// Start over with a new field after a win or loss
    pub fn try_again(&mut self) -> bool {
        if !matches!(self.phase, GamePhase::Won | GamePhase::GameOver) {
            return false;
        }

        self.schedule.clear();
        self.ball = None;
        self.falling.clear();
        self.hit_order.clear();
        self.peg_hit_pitch = 1.0;
        self.ball_stock = 0;
        self.shots_fired = 0;
        self.regenerate_pegs();
        self.phase = GamePhase::Restarting;
        self.schedule
            .after(self.clock_ms, self.tuning.try_again_delay_ms, Action::RestockAndAim);
        log::info!("Restarting with a new peg field");
        true
    }

    /// Ensure pegs are sorted by ID for deterministic iteration
    pub fn normalize_order(&mut self) {
        self.pegs.sort_by_key(|p| p.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_new_game() {
        let state = GameState::new(1, Tuning::default());
        assert_eq!(state.phase, GamePhase::Aiming);
        assert_eq!(state.pegs.len(), 30);
        assert_eq!(state.special_pegs_remaining(), 10);
        assert_eq!(state.ball_stock, 0);
        // Ten staggered drops queued
        assert_eq!(state.schedule.len(), 10);
        assert!(!state.can_fire());
    }

    #[test]
    fn test_walls_line_the_sides() {
        let state = GameState::new(1, Tuning::default());
        assert_eq!(state.walls[0].max().x, 50.0);
        assert_eq!(state.walls[1].min().x, 950.0);
        // From well above the screen down to the bottom edge
        assert_eq!(state.walls[0].max().y, 800.0);
        assert_eq!(state.walls[0].min().y, -1000.0);
    }

    #[test]
    fn test_bucket_layout() {
        let bucket = Bucket::new(&Tuning::default());
        assert_eq!(bucket.left.vertices[0], Vec2::new(415.0, 760.0));
        assert_eq!(bucket.left.vertices[1], Vec2::new(355.0, 800.0));
        assert_eq!(bucket.right.vertices[1], Vec2::new(645.0, 800.0));
        assert_eq!(bucket.sensor.center, Vec2::new(500.0, 800.0));
        assert_eq!(Bucket::travel_bounds(&Tuning::default()), (195.0, 805.0));
    }

    #[test]
    fn test_aim_clamps() {
        let mut state = GameState::new(1, Tuning::default());
        let min = state.tuning.min_angle();
        let max = state.tuning.max_angle();

        state.aim_at(Vec2::new(500.0, 400.0));
        assert!((state.launcher.angle - FRAC_PI_2).abs() < 1e-5);

        // Nearly horizontal to the right clamps to 10°
        state.aim_at(Vec2::new(1000.0, 1.0));
        assert!((state.launcher.angle - min).abs() < 1e-5);

        state.aim_at(Vec2::new(0.0, 1.0));
        assert!((state.launcher.angle - max).abs() < 1e-5);

        // Anywhere above the muzzle clamps to the right limit
        state.aim_at(Vec2::new(0.0, -100.0));
        assert!((state.launcher.angle - min).abs() < 1e-5);
        state.aim_at(Vec2::new(900.0, -100.0));
        assert!((state.launcher.angle - min).abs() < 1e-5);
    }

    #[test]
    fn test_ready_ball_follows_aim() {
        let state = GameState::new(1, Tuning::default());
        let pos = state.ready_ball_pos();
        assert!((pos - Vec2::new(500.0, 50.0)).length() < 1e-4);
    }

    #[test]
    fn test_fire_consumes_stock() {
        let mut state = GameState::new(1, Tuning::default());
        state.ball_stock = 2;
        assert!(state.fire());
        assert_eq!(state.ball_stock, 1);
        assert_eq!(state.phase, GamePhase::InFlight);
        assert_eq!(state.drain_events(), vec![GameEvent::BallLaunched]);

        let ball = state.ball.as_ref().expect("ball in play");
        assert!((ball.vel.y - state.tuning.launch_speed).abs() < 1e-2);
        assert!(!state.shows_trajectory());

        // No second ball while one is live
        assert!(!state.fire());
        assert_eq!(state.ball_stock, 1);
    }

    #[test]
    fn test_fire_blocked_by_bucket_ball() {
        let mut state = GameState::new(1, Tuning::default());
        state.ball_stock = 3;
        state.falling.push(FallingBall {
            pos: Vec2::new(25.0, 0.0),
            from_bucket: true,
        });
        assert!(!state.can_fire());

        state.falling[0].from_bucket = false;
        assert!(state.can_fire());
    }

    #[test]
    fn test_try_again_only_after_end() {
        let mut state = GameState::new(1, Tuning::default());
        assert!(!state.try_again());

        let old_ids: Vec<u32> = state.pegs.iter().map(|p| p.id).collect();
        state.phase = GamePhase::GameOver;
        state.ball_stock = 4;
        assert!(state.try_again());
        assert_eq!(state.phase, GamePhase::Restarting);
        assert_eq!(state.ball_stock, 0);
        assert_eq!(state.pegs.len(), 30);
        assert!(state.pegs.iter().all(|p| !old_ids.contains(&p.id)));
        assert!(state.schedule.contains(Action::RestockAndAim));
        assert_eq!(state.schedule.len(), 1);
    }

    #[test]
    fn test_ball_column_positions() {
        let mut state = GameState::new(1, Tuning::default());
        state.ball_stock = 3;
        assert_eq!(
            state.ball_column_positions(),
            vec![
                Vec2::new(25.0, 700.0),
                Vec2::new(25.0, 675.0),
                Vec2::new(25.0, 650.0)
            ]
        );
        assert_eq!(state.column_top(), 625.0);
    }

    proptest! {
        #[test]
        fn prop_aim_stays_in_arc(x in -2000f32..3000.0, y in -2000f32..3000.0) {
            let tuning = Tuning::default();
            let mut launcher = Launcher::new(&tuning);
            launcher.aim_at(Vec2::new(x, y), tuning.min_angle(), tuning.max_angle());
            prop_assert!(launcher.angle >= tuning.min_angle() - 1e-6);
            prop_assert!(launcher.angle <= tuning.max_angle() + 1e-6);
            // The ready ball never sits above the muzzle
            prop_assert!(launcher.muzzle(tuning.ready_ball_offset).y > launcher.origin.y);
        }
    }
}
