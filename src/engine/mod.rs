//! External engine interfaces
//!
//! The session never rasterises, mixes audio or reads devices itself. It
//! talks to those engines through the traits here and only ever receives
//! booleans, positions and events back.

pub mod headless;

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::settings::Settings;
use crate::sim::input::MoveMask;

/// Keys the session reacts to. Anything else arrives as `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    W,
    A,
    S,
    D,
    /// Run modifier
    Shift,
    /// Wireframe (held)
    F,
    Enter,
    Esc,
    /// Screenshot
    F1,
    /// Lantern toggle
    F3,
    /// Moonlight toggle
    F4,
    Other(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
}

/// A discrete input event. At most one is delivered per frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    KeyPress(Key),
    KeyRelease(Key),
    MousePress(MouseButton),
    MouseRelease(MouseButton),
}

/// Bounding sphere used for culling and hit tests
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
}

impl Sphere {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }
}

/// A ray from the player's eye along the view heading
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit direction
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    /// Distance along the ray to the point closest to `p` (may be negative)
    pub fn project(&self, p: Vec3) -> f32 {
        (p - self.origin).dot(self.direction)
    }
}

/// Meshes the session asks the renderer to draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Model {
    Ground,
    SkyDome,
    Tree,
    Page,
    Stalker,
    /// Full-screen quad for overlay screens
    Screen,
}

/// Full-screen images for the non-gameplay screens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Overlay {
    Title,
    Story,
    Help,
    FirstPage,
    Ending,
    Survived,
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Texture {
    Ground,
    Night,
    Tree,
    Page,
    Stalker,
    Overlay(Overlay),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Light {
    /// Directional light from above
    Moon,
    /// Point light carried by the player
    Lantern,
    /// Point light at the campfire
    Campfire,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillMode {
    Shaded,
    Wireframe,
}

/// Named sound clips
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Clip {
    Title,
    Story,
    Forest,
    Fire,
    Footsteps,
    Running,
    Wolves,
    Paper,
    GameOver,
    Survived,
}

/// Culling and hit-test queries answered by the rendering engine
pub trait Spatial {
    /// Point the view camera from `eye` along `heading`
    fn set_camera(&mut self, eye: Vec3, heading: Vec3);
    /// True unless the sphere lies completely outside the view frustum
    fn sphere_in_frustum(&self, sphere: &Sphere) -> bool;
    /// True if a ray thickened to `ray_radius` touches the sphere
    fn ray_sphere_intersect(&self, ray: &Ray, ray_radius: f32, sphere: &Sphere) -> bool;
}

/// Scene-graph style rendering engine
pub trait Renderer: Spatial {
    /// Start the display. `false` means the game cannot run.
    fn start(&mut self, settings: &Settings) -> bool;
    /// Intrinsic bounds of a loaded model
    fn model_bounds(&self, model: Model) -> Sphere;

    /// Clear and begin a frame. `false` skips drawing for this frame.
    fn begin_frame(&mut self) -> bool;
    /// Finish the frame and flip pages
    fn end_frame(&mut self);

    /// Switch to the fixed screen-space camera (no depth test)
    fn begin_screen_space(&mut self);
    /// Restore the world camera and depth test
    fn end_screen_space(&mut self);

    fn draw_entity(&mut self, model: Model, transform: Mat4, texture: Texture);
    /// Ambient light as a grey level in 0..=1
    fn set_ambient_light(&mut self, level: f32);
    fn enable_fog(&mut self, start: f32, end: f32);
    fn disable_fog(&mut self);
    fn enable_alpha_blending(&mut self);
    fn disable_alpha_blending(&mut self);
    fn set_fill_mode(&mut self, mode: FillMode);
    /// Enable or disable a light, optionally moving it
    fn set_light(&mut self, light: Light, enabled: bool, position: Option<Vec3>);

    fn update_particles(&mut self, elapsed_ms: u32);
    fn draw_particles(&mut self, transform: Mat4, facing: Vec3, wireframe: bool);

    /// Write the current frame to disk. `false` if the write failed.
    fn save_screenshot(&mut self, path: &str) -> bool;
}

/// Clip playback engine
pub trait Audio {
    /// Start the audio device. `false` means the game cannot run.
    fn start(&mut self) -> bool;
    fn play(&mut self, clip: Clip, looping: bool);
    fn stop(&mut self, clip: Clip);
    fn is_playing(&self, clip: Clip) -> bool;
    /// Volume in 0..=100
    fn set_volume(&mut self, clip: Clip, volume: u8);
    /// Place a 3D clip in the world
    fn set_clip_position(&mut self, clip: Clip, position: Vec3);
    fn set_listener(&mut self, position: Vec3, heading: Vec3);
}

/// Non-blocking input polling
pub trait EventSource {
    /// Next discrete event, or `None` if nothing is waiting
    fn poll_event(&mut self) -> Option<InputEvent>;
    /// Mouse movement accumulated since the previous call
    fn mouse_delta(&mut self) -> (i32, i32);
}

/// Monotonic millisecond clock
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Wall clock backed by `std::time::Instant`
#[derive(Debug, Clone)]
pub struct SystemClock {
    start: std::time::Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self {
            start: std::time::Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

/// Result of one locomotion step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocomotionUpdate {
    pub position: Vec3,
    pub heading: Vec3,
    pub position_changed: bool,
    pub camera_changed: bool,
    pub collided: bool,
}

/// Player movement and collision against the world
pub trait Locomotion {
    /// Base movement speed in units per second
    fn set_speed(&mut self, speed: f32);
    fn update(
        &mut self,
        elapsed_ms: u32,
        moves: MoveMask,
        mouse_dx: i32,
        mouse_dy: i32,
        force_update: bool,
    ) -> LocomotionUpdate;
}

/// All engines the frame loop drives
pub struct Engines<R, A, E, L, C> {
    pub renderer: R,
    pub audio: A,
    pub events: E,
    pub locomotion: L,
    pub clock: C,
}
