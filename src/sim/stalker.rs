//! The stalker: pursuit with jitter and the catch check
//!
//! No pathfinding and no obstacle avoidance. Every gameplay frame the
//! stalker steps straight at the player on the ground plane, slightly off
//! course, and the session ends if it gets close enough.

use glam::{Vec2, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{ground, lift};

/// How far the stalker moves per gameplay frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum PursuitStep {
    /// Fixed distance per frame regardless of elapsed time.
    /// Speed is coupled to frame rate: faster machines get a faster stalker.
    FixedPerFrame { step: f32 },
    /// Distance scaled by elapsed time, frame-rate independent
    TimeScaled { units_per_second: f32 },
}

impl PursuitStep {
    /// Distance to advance this frame
    pub fn distance(&self, elapsed_ms: u32) -> f32 {
        match *self {
            PursuitStep::FixedPerFrame { step } => step,
            PursuitStep::TimeScaled { units_per_second } => {
                units_per_second * elapsed_ms as f32 / 1000.0
            }
        }
    }
}

/// Result of one pursuit step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PursuitOutcome {
    /// Distance to the player after moving
    pub distance: f32,
    /// At or inside the catch distance
    pub caught: bool,
}

/// The single pursuing entity
#[derive(Debug, Clone, PartialEq)]
pub struct Antagonist {
    pub position: Vec3,
    pub pursuit: PursuitStep,
    /// Per-axis random offset added to the chase direction
    pub jitter: f32,
    /// Horizontal coordinates are kept within ±wrap_bound
    pub wrap_bound: f32,
    /// Catch distance
    pub loss_distance: f32,
}

impl Antagonist {
    /// Step toward `player` and check for a catch
    pub fn advance<R: Rng>(&mut self, player: Vec3, elapsed_ms: u32, rng: &mut R) -> PursuitOutcome {
        let jitter = Vec2::new(self.jitter_sample(rng), self.jitter_sample(rng));
        let dir = (ground(player) - ground(self.position) + jitter).normalize_or_zero();
        let next = ground(self.position) + dir * self.pursuit.distance(elapsed_ms);

        self.position = lift(
            Vec2::new(reflect(next.x, self.wrap_bound), reflect(next.y, self.wrap_bound)),
            self.position.y,
        );

        let distance = self.position.distance(player);
        log::trace!(
            "Stalker at ({:.2}, {:.2}), {:.2} from player",
            self.position.x,
            self.position.z,
            distance
        );
        PursuitOutcome {
            distance,
            caught: distance <= self.loss_distance,
        }
    }

    fn jitter_sample<R: Rng>(&self, rng: &mut R) -> f32 {
        if self.jitter > 0.0 {
            rng.random_range(-self.jitter..=self.jitter)
        } else {
            0.0
        }
    }
}

/// Reflect a coordinate that left ±bound to the opposite side.
/// The mirrored value is clamped so it never exceeds the bound.
fn reflect(value: f32, bound: f32) -> f32 {
    if value > bound || value < -bound {
        (-value).clamp(-bound, bound)
    } else {
        value
    }
}
