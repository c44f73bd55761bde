//! Night Pages - session logic for a first-person page hunt in a night forest
//!
//! Core modules:
//! - `sim`: Per-frame session logic (screens, input, placement, pickup, pursuit)
//! - `engine`: Traits for the external renderer/audio/input/locomotion engines
//! - `audio`: Decides which clips play for the current screen
//! - `present`: Issues draw calls for overlays and the forest scene
//! - `app`: Frame loop wiring the above together
//! - `tuning`: Data-driven game balance
//! - `settings`: Player preferences

pub mod app;
pub mod audio;
pub mod engine;
pub mod error;
pub mod present;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use app::App;
pub use error::{Error, Result};
pub use settings::Settings;
pub use tuning::Tuning;

use glam::{Vec2, Vec3};

/// Game configuration constants
pub mod consts {
    /// Pages a player has to collect to escape
    pub const WIN_THRESHOLD: u32 = 5;
    /// Pages scattered through the forest
    pub const PAGE_COUNT: usize = 8;
    /// Trees scattered through the forest
    pub const TREE_COUNT: usize = 100;
    /// Half-width of the square placement region
    pub const REGION_HALF_WIDTH: i32 = 75;

    /// Antagonist catches the player at or below this distance
    pub const LOSS_DISTANCE: f32 = 10.0;
    /// Antagonist coordinates beyond this are reflected back
    pub const WRAP_BOUND: f32 = 150.0;
    /// Per-axis pursuit jitter (uniform in ±JITTER)
    pub const PURSUIT_JITTER: f32 = 0.05;

    /// Speed multiplier while the run modifier is held
    pub const RUN_MULTIPLIER: f32 = 2.5;
    /// Radius of the pickup ray
    pub const PICKUP_RAY_RADIUS: f32 = 2.5;

    /// Eye height of the player above the ground
    pub const CHARACTER_HEIGHT: f32 = 5.0;
    /// Lantern sits slightly below eye level (held at the chest)
    pub const LANTERN_DROP: f32 = 1.5;
}

/// Project a 3D point onto the ground plane (x, z)
#[inline]
pub fn ground(v: Vec3) -> Vec2 {
    Vec2::new(v.x, v.z)
}

/// Lift a ground-plane point back to 3D at the given height
#[inline]
pub fn lift(p: Vec2, y: f32) -> Vec3 {
    Vec3::new(p.x, y, p.y)
}

/// Yaw (radians about +Y) of a heading vector, 0 facing +Z
#[inline]
pub fn heading_yaw(heading: Vec3) -> f32 {
    heading.x.atan2(heading.z)
}
