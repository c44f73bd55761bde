//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Seeded RNG only
//! - Stable iteration order (by placement index)
//! - Engines reached only through the traits in `crate::engine`

pub mod input;
pub mod pickup;
pub mod progress;
pub mod scatter;
pub mod stalker;
pub mod state;
pub mod tick;

pub use input::{Command, CommandAggregator, MoveMask};
pub use pickup::{Collectible, PickupResolution, try_pickup, update_visibility};
pub use progress::{Milestone, Progress};
pub use scatter::{OverlapResolution, Placement, ScatterParams, bounding_sphere, scatter};
pub use stalker::{Antagonist, PursuitOutcome, PursuitStep};
pub use state::{
    GameEvent, Lights, ModelBounds, Obstacle, Player, ScreenMode, Session, Transition, Trigger,
};
pub use tick::{FrameInput, tick};
