//! Data-driven game balance
//!
//! Every gameplay constant lives in [`Tuning`]. Defaults reproduce the classic
//! table; a JSON override can replace any subset of fields.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{WORLD_HEIGHT, WORLD_WIDTH};

/// Slowest physics time multiplier accepted
pub const MIN_SIM_SPEED: f32 = 0.1;

/// Reasons a tuning table is rejected
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("invalid tuning JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("`{field}` must be positive (got {value})")]
    NotPositive { field: &'static str, value: f32 },

    #[error("special_peg_count ({special}) exceeds peg_count ({total})")]
    TooManySpecialPegs { special: u32, total: u32 },

    #[error("sim_speed must be at least {MIN_SIM_SPEED} (got {0})")]
    SimSpeedTooLow(f32),

    #[error("angle_limit_deg must be in [0, 90) (got {0})")]
    AngleLimit(f32),

    #[error("no-spawn zones leave no room for pegs")]
    NoSpawnArea,

    #[error("{count} pegs at spacing {spacing} cannot fit in the spawn area")]
    FieldTooDense { count: u32, spacing: f32 },
}

/// Gameplay constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === World ===
    pub width: f32,
    pub height: f32,
    /// Gravity is `1000 * gravity_scale` px/s² in sim time
    pub gravity_scale: f32,
    /// Physics time multiplier applied to wall-clock dt
    pub sim_speed: f32,

    // === Ball ===
    pub starting_balls: u32,
    pub ball_radius: f32,
    pub ball_restitution: f32,
    pub launch_speed: f32,
    /// Linear drag (fraction of velocity lost per sim second)
    pub air_friction: f32,
    /// Approach speeds below this stick instead of bouncing
    pub resting_speed: f32,

    // === Pegs ===
    pub peg_count: u32,
    pub special_peg_count: u32,
    pub peg_radius: f32,
    /// Extra gap between peg edges
    pub peg_gap: f32,
    pub top_no_spawn: f32,
    pub bottom_no_spawn: f32,
    /// Also the wall thickness
    pub side_no_spawn: f32,

    // === Launcher ===
    pub angle_limit_deg: f32,
    pub launcher_length: f32,
    pub ready_ball_offset: f32,

    // === Bucket ===
    pub bucket_width: f32,
    pub bucket_height: f32,
    pub bucket_side_width: f32,
    pub bucket_sensor_height: f32,
    /// px/s, wall-clock
    pub bucket_speed: f32,

    // === Stock column ===
    pub extra_ball_speed: f32,
    pub column_base_offset: f32,
    pub column_spacing: f32,

    // === Timers (ms, wall-clock) ===
    pub drop_stagger_ms: f32,
    pub stationary_ms: f32,
    pub stationary_speed: f32,
    pub offscreen_ms: f32,
    pub settle_delay_ms: f32,
    pub peg_removal_fast_ms: f32,
    pub peg_removal_fast_count: usize,
    pub peg_removal_ms: f32,
    pub try_again_delay_ms: f32,

    // === Sound cues ===
    pub pitch_step: f32,
    pub hard_hit_speed: f32,

    // === Preview ===
    pub trajectory_secs: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            width: WORLD_WIDTH,
            height: WORLD_HEIGHT,
            gravity_scale: 0.9,
            sim_speed: 0.8,

            starting_balls: 10,
            ball_radius: 11.7,
            ball_restitution: 0.95,
            launch_speed: 1080.0,
            air_friction: 0.6,
            resting_speed: 40.0,

            peg_count: 30,
            special_peg_count: 10,
            peg_radius: 11.8,
            peg_gap: 5.0,
            top_no_spawn: 125.0,
            bottom_no_spawn: 90.0,
            side_no_spawn: 50.0,

            angle_limit_deg: 10.0,
            launcher_length: 100.0,
            ready_ball_offset: 50.0,

            bucket_width: 170.0,
            bucket_height: 40.0,
            bucket_side_width: 60.0,
            bucket_sensor_height: 5.0,
            bucket_speed: 300.0,

            extra_ball_speed: 960.0,
            column_base_offset: 100.0,
            column_spacing: 25.0,

            drop_stagger_ms: 200.0,
            stationary_ms: 200.0,
            stationary_speed: 3.0,
            offscreen_ms: 200.0,
            settle_delay_ms: 500.0,
            peg_removal_fast_ms: 120.0,
            peg_removal_fast_count: 5,
            peg_removal_ms: 80.0,
            try_again_delay_ms: 500.0,

            pitch_step: 0.1,
            hard_hit_speed: 600.0,

            trajectory_secs: 0.25,
        }
    }
}

impl Tuning {
    /// Parse and validate a JSON tuning table (missing fields use defaults)
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn validate(&self) -> Result<(), TuningError> {
        let positive = [
            ("width", self.width),
            ("height", self.height),
            ("gravity_scale", self.gravity_scale),
            ("sim_speed", self.sim_speed),
            ("ball_radius", self.ball_radius),
            ("launch_speed", self.launch_speed),
            ("peg_radius", self.peg_radius),
            ("launcher_length", self.launcher_length),
            ("ready_ball_offset", self.ready_ball_offset),
            ("bucket_width", self.bucket_width),
            ("bucket_height", self.bucket_height),
            ("bucket_side_width", self.bucket_side_width),
            ("bucket_sensor_height", self.bucket_sensor_height),
            ("bucket_speed", self.bucket_speed),
            ("extra_ball_speed", self.extra_ball_speed),
            ("column_spacing", self.column_spacing),
            ("stationary_speed", self.stationary_speed),
            ("hard_hit_speed", self.hard_hit_speed),
            ("trajectory_secs", self.trajectory_secs),
        ];
        for (field, value) in positive {
            if value.is_nan() || value <= 0.0 {
                return Err(TuningError::NotPositive { field, value });
            }
        }

        if self.sim_speed < MIN_SIM_SPEED {
            return Err(TuningError::SimSpeedTooLow(self.sim_speed));
        }

        if self.special_peg_count > self.peg_count {
            return Err(TuningError::TooManySpecialPegs {
                special: self.special_peg_count,
                total: self.peg_count,
            });
        }

        if !(0.0..90.0).contains(&self.angle_limit_deg) {
            return Err(TuningError::AngleLimit(self.angle_limit_deg));
        }

        let (spawn_w, spawn_h) = self.spawn_extent();
        if spawn_w <= 0.0 || spawn_h <= 0.0 {
            return Err(TuningError::NoSpawnArea);
        }

        // Rejection sampling stalls well before the packing limit
        let spacing = self.min_peg_distance();
        let disk_area = std::f32::consts::PI * (spacing / 2.0).powi(2);
        if self.peg_count as f32 * disk_area > 0.5 * spawn_w * spawn_h {
            return Err(TuningError::FieldTooDense {
                count: self.peg_count,
                spacing,
            });
        }

        Ok(())
    }

    /// Gravity acceleration in px/s² (sim time)
    #[inline]
    pub fn gravity(&self) -> f32 {
        1000.0 * self.gravity_scale
    }

    #[inline]
    pub fn min_peg_distance(&self) -> f32 {
        self.peg_radius * 2.0 + self.peg_gap
    }

    #[inline]
    pub fn min_angle(&self) -> f32 {
        self.angle_limit_deg.to_radians()
    }

    #[inline]
    pub fn max_angle(&self) -> f32 {
        (180.0 - self.angle_limit_deg).to_radians()
    }

    /// Width and height of the region peg centers may occupy
    pub fn spawn_extent(&self) -> (f32, f32) {
        (
            self.width - self.side_no_spawn * 2.0 - self.peg_radius * 2.0,
            self.height - self.top_no_spawn - self.bottom_no_spawn - self.peg_radius * 2.0,
        )
    }

    /// Thickness of the launcher barrel
    #[inline]
    pub fn launcher_thickness(&self) -> f32 {
        self.ball_radius * 2.0 + 7.0
    }

    /// Delay before the n-th (0-based) hit peg is removed, relative to the first
    pub fn removal_step_ms(&self, index: usize) -> f32 {
        if index < self.peg_removal_fast_count {
            self.peg_removal_fast_ms
        } else {
            self.peg_removal_ms
        }
    }
}
