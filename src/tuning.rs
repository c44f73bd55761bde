//! Data-driven game balance
//!
//! Defaults reproduce the shipped game. A JSON file can override any
//! subset of fields.

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{Error, Result};
use crate::settings::{read_json, write_json};
use crate::sim::pickup::PickupResolution;
use crate::sim::scatter::{OverlapResolution, ScatterParams};
use crate::sim::stalker::PursuitStep;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Placement ===
    pub item_count: usize,
    pub obstacle_count: usize,
    pub region_half_width: i32,
    pub item_height: f32,
    pub obstacle_height: f32,
    pub antagonist_height: f32,
    pub nudge_offset: f32,
    /// Model bounds are scaled by this to get world bounds
    pub bounds_scale: f32,
    pub overlap: OverlapResolution,

    // === Pickup ===
    pub pickup_ray_radius: f32,
    pub pickup_resolution: PickupResolution,
    pub win_threshold: u32,

    // === Stalker ===
    pub pursuit: PursuitStep,
    pub jitter: f32,
    pub wrap_bound: f32,
    pub loss_distance: f32,

    // === Player ===
    /// Walking speed in units per second
    pub base_speed: f32,
    pub run_multiplier: f32,
    pub player_start: Vec3,
    pub player_heading: Vec3,

    // === Ambience ===
    /// Chance per second that the wolves howl during gameplay
    pub wolf_howl_chance_per_sec: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            item_count: PAGE_COUNT,
            obstacle_count: TREE_COUNT,
            region_half_width: REGION_HALF_WIDTH,
            item_height: 1.0,
            obstacle_height: 0.0,
            antagonist_height: 0.0,
            nudge_offset: 2.0,
            bounds_scale: 6.0,
            overlap: OverlapResolution::IndexAligned,

            pickup_ray_radius: PICKUP_RAY_RADIUS,
            pickup_resolution: PickupResolution::FirstMatch,
            win_threshold: WIN_THRESHOLD,

            pursuit: PursuitStep::FixedPerFrame { step: 0.1 },
            jitter: PURSUIT_JITTER,
            wrap_bound: WRAP_BOUND,
            loss_distance: LOSS_DISTANCE,

            base_speed: 10.0,
            run_multiplier: RUN_MULTIPLIER,
            player_start: Vec3::new(0.0, CHARACTER_HEIGHT, -100.0),
            player_heading: Vec3::Z,

            wolf_howl_chance_per_sec: 0.11,
        }
    }
}

impl Tuning {
    /// Load and validate a tuning file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let tuning: Self = read_json(path.as_ref())?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load a tuning file, falling back to defaults on any error
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(tuning) => {
                log::info!("Loaded tuning from {}", path.display());
                tuning
            }
            Err(e) => {
                log::warn!("Using default tuning ({e})");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        write_json(path.as_ref(), self)
    }

    /// Reject values the session cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.win_threshold == 0 {
            return Err(Error::InvalidTuning("win_threshold must be at least 1".into()));
        }
        if self.item_count < self.win_threshold as usize {
            return Err(Error::InvalidTuning(format!(
                "item_count {} is below win_threshold {}",
                self.item_count, self.win_threshold
            )));
        }
        if self.region_half_width <= 0 {
            return Err(Error::InvalidTuning("region_half_width must be positive".into()));
        }
        if self.bounds_scale <= 0.0 || self.pickup_ray_radius < 0.0 {
            return Err(Error::InvalidTuning(
                "bounds_scale must be positive and pickup_ray_radius non-negative".into(),
            ));
        }
        let step_ok = match self.pursuit {
            PursuitStep::FixedPerFrame { step } => step > 0.0,
            PursuitStep::TimeScaled { units_per_second } => units_per_second > 0.0,
        };
        if !step_ok {
            return Err(Error::InvalidTuning("pursuit speed must be positive".into()));
        }
        if self.wrap_bound <= 0.0 || self.loss_distance < 0.0 || self.jitter < 0.0 {
            return Err(Error::InvalidTuning(
                "wrap_bound must be positive, loss_distance and jitter non-negative".into(),
            ));
        }
        if let OverlapResolution::RejectAll { max_attempts: 0, .. } = self.overlap {
            return Err(Error::InvalidTuning("max_attempts must be at least 1".into()));
        }
        if self.player_heading.length_squared() == 0.0 {
            return Err(Error::InvalidTuning("player_heading must be non-zero".into()));
        }
        Ok(())
    }

    /// Placement inputs
    pub fn scatter_params(&self) -> ScatterParams {
        ScatterParams {
            item_count: self.item_count,
            obstacle_count: self.obstacle_count,
            half_width: self.region_half_width,
            item_height: self.item_height,
            obstacle_height: self.obstacle_height,
            antagonist_height: self.antagonist_height,
            nudge: self.nudge_offset,
            resolution: self.overlap,
        }
    }
}
