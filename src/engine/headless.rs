//! Headless engines
//!
//! Stand-ins for the real renderer, audio device, input and locomotion.
//! They answer spatial queries with real geometry and record everything
//! else, so the whole session can run without a window.

use std::cell::Cell;
use std::collections::{HashMap, HashSet, VecDeque};

use glam::{Mat4, Vec3, Vec4};

use super::{
    Audio, Clip, Clock, EventSource, FillMode, InputEvent, Key, Light, Locomotion,
    LocomotionUpdate, Model, Ray, Renderer, Spatial, Sphere, Texture,
};
use crate::settings::Settings;
use crate::sim::input::MoveMask;
use crate::sim::state::ModelBounds;

// ============================================================================
// Renderer
// ============================================================================

/// One recorded draw call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCall {
    pub model: Model,
    pub transform: Mat4,
    pub texture: Texture,
    /// Issued between begin/end_screen_space
    pub screen_space: bool,
}

/// Renderer that keeps a real view frustum but draws nothing
#[derive(Debug, Clone)]
pub struct HeadlessRenderer {
    /// Make `start` report failure
    pub fail_start: bool,
    pub started: bool,
    fov_y: f32,
    aspect: f32,
    near: f32,
    far: f32,
    eye: Vec3,
    heading: Vec3,
    /// Frustum planes as (normal, distance), normals pointing inward
    planes: [Vec4; 6],

    pub frames: u64,
    /// Draw calls of the current (or last finished) frame
    pub draws: Vec<DrawCall>,
    pub ambient: f32,
    pub fog: Option<(f32, f32)>,
    pub alpha_blending: bool,
    pub fill_mode: FillMode,
    pub lights: HashMap<Light, (bool, Option<Vec3>)>,
    pub particle_ms: u64,
    pub particle_draws: u64,
    pub screenshots: Vec<String>,
    screen_space: bool,
}

impl Default for HeadlessRenderer {
    fn default() -> Self {
        let mut renderer = Self {
            fail_start: false,
            started: false,
            fov_y: 60f32.to_radians(),
            aspect: 640.0 / 480.0,
            near: 0.1,
            far: 1000.0,
            eye: Vec3::ZERO,
            heading: Vec3::Z,
            planes: [Vec4::ZERO; 6],
            frames: 0,
            draws: Vec::new(),
            ambient: 0.0,
            fog: None,
            alpha_blending: false,
            fill_mode: FillMode::Shaded,
            lights: HashMap::new(),
            particle_ms: 0,
            particle_draws: 0,
            screenshots: Vec::new(),
            screen_space: false,
        };
        renderer.rebuild_frustum();
        renderer
    }
}

impl HeadlessRenderer {
    /// Renderer whose `start` fails
    pub fn failing() -> Self {
        Self {
            fail_start: true,
            ..Default::default()
        }
    }

    /// Draw calls for one model in the current frame
    pub fn draws_of(&self, model: Model) -> impl Iterator<Item = &DrawCall> + '_ {
        self.draws.iter().filter(move |d| d.model == model)
    }

    pub fn light(&self, light: Light) -> bool {
        self.lights.get(&light).is_some_and(|(on, _)| *on)
    }

    fn rebuild_frustum(&mut self) {
        let up = if self.heading.cross(Vec3::Y).length_squared() < 1e-6 {
            Vec3::Z
        } else {
            Vec3::Y
        };
        let view = Mat4::look_to_rh(self.eye, self.heading, up);
        let proj = Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far);
        let m = proj * view;
        let (r0, r1, r2, r3) = (m.row(0), m.row(1), m.row(2), m.row(3));

        // Depth range is 0..1, so the near plane is row 2 alone
        let raw = [r3 + r0, r3 - r0, r3 + r1, r3 - r1, r2, r3 - r2];
        for (plane, p) in self.planes.iter_mut().zip(raw) {
            let len = p.truncate().length();
            *plane = if len > 0.0 { p / len } else { p };
        }
    }
}

impl Spatial for HeadlessRenderer {
    fn set_camera(&mut self, eye: Vec3, heading: Vec3) {
        self.eye = eye;
        self.heading = heading.normalize_or(Vec3::Z);
        self.rebuild_frustum();
    }

    fn sphere_in_frustum(&self, sphere: &Sphere) -> bool {
        self.planes
            .iter()
            .all(|p| p.truncate().dot(sphere.center) + p.w >= -sphere.radius)
    }

    fn ray_sphere_intersect(&self, ray: &Ray, ray_radius: f32, sphere: &Sphere) -> bool {
        let t = ray.project(sphere.center).max(0.0);
        let closest = ray.origin + ray.direction * t;
        closest.distance(sphere.center) <= sphere.radius + ray_radius
    }
}

impl Renderer for HeadlessRenderer {
    fn start(&mut self, settings: &Settings) -> bool {
        if self.fail_start {
            log::error!("Headless renderer refused to start");
            return false;
        }
        self.fov_y = settings.fov_degrees.to_radians();
        self.aspect = settings.resolution.aspect();
        self.near = settings.near_plane;
        self.far = settings.far_plane;
        self.rebuild_frustum();
        self.started = true;
        log::debug!(
            "Headless renderer started at {}x{}",
            settings.resolution.width,
            settings.resolution.height
        );
        true
    }

    fn model_bounds(&self, model: Model) -> Sphere {
        let bounds = ModelBounds::default();
        match model {
            Model::Page => bounds.page,
            Model::Tree => bounds.tree,
            Model::Stalker => Sphere::new(Vec3::new(0.0, 0.5, 0.0), 0.5),
            Model::Ground | Model::SkyDome | Model::Screen => Sphere::new(Vec3::ZERO, 1.0),
        }
    }

    fn begin_frame(&mut self) -> bool {
        self.draws.clear();
        self.frames += 1;
        true
    }

    fn end_frame(&mut self) {}

    fn begin_screen_space(&mut self) {
        self.screen_space = true;
    }

    fn end_screen_space(&mut self) {
        self.screen_space = false;
    }

    fn draw_entity(&mut self, model: Model, transform: Mat4, texture: Texture) {
        self.draws.push(DrawCall {
            model,
            transform,
            texture,
            screen_space: self.screen_space,
        });
    }

    fn set_ambient_light(&mut self, level: f32) {
        self.ambient = level;
    }

    fn enable_fog(&mut self, start: f32, end: f32) {
        self.fog = Some((start, end));
    }

    fn disable_fog(&mut self) {
        self.fog = None;
    }

    fn enable_alpha_blending(&mut self) {
        self.alpha_blending = true;
    }

    fn disable_alpha_blending(&mut self) {
        self.alpha_blending = false;
    }

    fn set_fill_mode(&mut self, mode: FillMode) {
        self.fill_mode = mode;
    }

    fn set_light(&mut self, light: Light, enabled: bool, position: Option<Vec3>) {
        let entry = self.lights.entry(light).or_insert((enabled, position));
        entry.0 = enabled;
        if position.is_some() {
            entry.1 = position;
        }
    }

    fn update_particles(&mut self, elapsed_ms: u32) {
        self.particle_ms += elapsed_ms as u64;
    }

    fn draw_particles(&mut self, _transform: Mat4, _facing: Vec3, _wireframe: bool) {
        self.particle_draws += 1;
    }

    fn save_screenshot(&mut self, path: &str) -> bool {
        self.screenshots.push(path.to_string());
        true
    }
}

// ============================================================================
// Audio
// ============================================================================

/// Audio device that tracks what would be playing
#[derive(Debug, Clone, Default)]
pub struct SilentAudio {
    pub fail_start: bool,
    pub started: bool,
    pub playing: HashSet<Clip>,
    /// Every `play` call in order
    pub played: Vec<Clip>,
    pub volumes: HashMap<Clip, u8>,
    pub positions: HashMap<Clip, Vec3>,
    pub listener: Option<(Vec3, Vec3)>,
}

impl SilentAudio {
    /// A one-shot clip ran to its end
    pub fn finish(&mut self, clip: Clip) {
        self.playing.remove(&clip);
    }

    pub fn play_count(&self, clip: Clip) -> usize {
        self.played.iter().filter(|c| **c == clip).count()
    }
}

impl Audio for SilentAudio {
    fn start(&mut self) -> bool {
        self.started = !self.fail_start;
        self.started
    }

    fn play(&mut self, clip: Clip, _looping: bool) {
        self.playing.insert(clip);
        self.played.push(clip);
    }

    fn stop(&mut self, clip: Clip) {
        self.playing.remove(&clip);
    }

    fn is_playing(&self, clip: Clip) -> bool {
        self.playing.contains(&clip)
    }

    fn set_volume(&mut self, clip: Clip, volume: u8) {
        self.volumes.insert(clip, volume);
    }

    fn set_clip_position(&mut self, clip: Clip, position: Vec3) {
        self.positions.insert(clip, position);
    }

    fn set_listener(&mut self, position: Vec3, heading: Vec3) {
        self.listener = Some((position, heading));
    }
}

// ============================================================================
// Input
// ============================================================================

/// One frame's worth of scripted input
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct ScriptedFrame {
    event: Option<InputEvent>,
    mouse: (i32, i32),
}

/// Replays a fixed script, one entry per frame
#[derive(Debug, Clone, Default)]
pub struct ScriptedEvents {
    frames: VecDeque<ScriptedFrame>,
    pending_mouse: (i32, i32),
}

impl ScriptedEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_event(&mut self, event: InputEvent) -> &mut Self {
        self.frames.push_back(ScriptedFrame {
            event: Some(event),
            mouse: (0, 0),
        });
        self
    }

    /// Press then release on the next frame
    pub fn push_tap(&mut self, key: Key) -> &mut Self {
        self.push_event(InputEvent::KeyPress(key))
            .push_event(InputEvent::KeyRelease(key))
    }

    /// Frames with no input at all
    pub fn push_idle(&mut self, frames: usize) -> &mut Self {
        for _ in 0..frames {
            self.frames.push_back(ScriptedFrame::default());
        }
        self
    }

    /// A frame with mouse movement only
    pub fn push_mouse(&mut self, dx: i32, dy: i32) -> &mut Self {
        self.frames.push_back(ScriptedFrame {
            event: None,
            mouse: (dx, dy),
        });
        self
    }

    /// Deliver an event on the very next frame, ahead of the script
    pub fn inject(&mut self, event: InputEvent) -> &mut Self {
        self.frames.push_front(ScriptedFrame {
            event: Some(event),
            mouse: (0, 0),
        });
        self
    }

    pub fn is_exhausted(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl EventSource for ScriptedEvents {
    fn poll_event(&mut self) -> Option<InputEvent> {
        let frame = self.frames.pop_front()?;
        self.pending_mouse = frame.mouse;
        frame.event
    }

    fn mouse_delta(&mut self) -> (i32, i32) {
        std::mem::take(&mut self.pending_mouse)
    }
}

// ============================================================================
// Locomotion
// ============================================================================

/// Radians of turn per pixel of mouse movement
const MOUSE_SENSITIVITY: f32 = 0.003;
/// Pitch never quite reaches straight up or down
const PITCH_LIMIT: f32 = 1.4;

/// Walks on a flat plane at a fixed eye height, blocked at the world edge
#[derive(Debug, Clone)]
pub struct FlatLocomotion {
    pub position: Vec3,
    yaw: f32,
    pitch: f32,
    speed: f32,
    /// Player x/z are clamped to ±edge
    pub edge: f32,
}

impl FlatLocomotion {
    pub fn new(position: Vec3, heading: Vec3) -> Self {
        let mut locomotion = Self {
            position,
            yaw: 0.0,
            pitch: 0.0,
            speed: 10.0,
            edge: crate::consts::WRAP_BOUND,
        };
        locomotion.look(heading);
        locomotion
    }

    /// Jump straight to a position and view direction
    pub fn teleport(&mut self, position: Vec3, heading: Vec3) {
        self.position = position;
        self.look(heading);
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn heading(&self) -> Vec3 {
        let (sy, cy) = self.yaw.sin_cos();
        let (sp, cp) = self.pitch.sin_cos();
        Vec3::new(sy * cp, sp, cy * cp)
    }

    fn look(&mut self, heading: Vec3) {
        let h = heading.normalize_or(Vec3::Z);
        self.yaw = crate::heading_yaw(h);
        self.pitch = h.y.clamp(-1.0, 1.0).asin().clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }
}

impl Locomotion for FlatLocomotion {
    fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    fn update(
        &mut self,
        elapsed_ms: u32,
        moves: MoveMask,
        mouse_dx: i32,
        mouse_dy: i32,
        force_update: bool,
    ) -> LocomotionUpdate {
        let turned = mouse_dx != 0 || mouse_dy != 0;
        self.yaw -= mouse_dx as f32 * MOUSE_SENSITIVITY;
        self.pitch = (self.pitch - mouse_dy as f32 * MOUSE_SENSITIVITY)
            .clamp(-PITCH_LIMIT, PITCH_LIMIT);

        let (sy, cy) = self.yaw.sin_cos();
        let forward = Vec3::new(sy, 0.0, cy);
        let right = forward.cross(Vec3::Y);
        let mut dir = Vec3::ZERO;
        if moves.forward() {
            dir += forward;
        }
        if moves.back() {
            dir -= forward;
        }
        if moves.right() {
            dir += right;
        }
        if moves.left() {
            dir -= right;
        }

        let before = self.position;
        let step = dir.normalize_or_zero() * self.speed * elapsed_ms as f32 / 1000.0;
        let wanted = self.position + step;
        let clamped = Vec3::new(
            wanted.x.clamp(-self.edge, self.edge),
            wanted.y,
            wanted.z.clamp(-self.edge, self.edge),
        );
        self.position = clamped;

        let position_changed = self.position != before;
        LocomotionUpdate {
            position: self.position,
            heading: self.heading(),
            position_changed,
            camera_changed: force_update || turned || position_changed,
            collided: clamped != wanted,
        }
    }
}

// ============================================================================
// Clock
// ============================================================================

/// Clock that advances a fixed amount on every read
#[derive(Debug, Clone)]
pub struct StepClock {
    now: Cell<u64>,
    step_ms: u64,
}

impl StepClock {
    pub fn new(start_ms: u64, step_ms: u64) -> Self {
        Self {
            now: Cell::new(start_ms),
            step_ms,
        }
    }
}

impl Default for StepClock {
    /// Roughly 60 frames per second
    fn default() -> Self {
        Self::new(0, 16)
    }
}

impl Clock for StepClock {
    fn now_ms(&self) -> u64 {
        let now = self.now.get();
        self.now.set(now + self.step_ms);
        now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frustum_culls_behind_and_outside() {
        let mut r = HeadlessRenderer::default();
        r.set_camera(Vec3::new(0.0, 5.0, 0.0), Vec3::Z);
        assert!(r.sphere_in_frustum(&Sphere::new(Vec3::new(0.0, 1.0, 20.0), 3.0)));
        assert!(!r.sphere_in_frustum(&Sphere::new(Vec3::new(0.0, 1.0, -20.0), 3.0)));
        assert!(!r.sphere_in_frustum(&Sphere::new(Vec3::new(60.0, 1.0, 20.0), 3.0)));
        assert!(!r.sphere_in_frustum(&Sphere::new(Vec3::new(0.0, 1.0, 1200.0), 3.0)));
        // Partially inside still counts
        assert!(r.sphere_in_frustum(&Sphere::new(Vec3::new(0.0, 5.0, -2.0), 3.0)));
    }

    #[test]
    fn test_thick_ray() {
        let r = HeadlessRenderer::default();
        let ray = Ray::new(Vec3::ZERO, Vec3::Z);
        let sphere = Sphere::new(Vec3::new(4.0, 0.0, 30.0), 1.0);
        assert!(!r.ray_sphere_intersect(&ray, 2.5, &sphere));
        assert!(r.ray_sphere_intersect(&ray, 3.0, &sphere));
        // Behind the origin is out of reach
        let behind = Sphere::new(Vec3::new(0.0, 0.0, -30.0), 1.0);
        assert!(!r.ray_sphere_intersect(&ray, 2.5, &behind));
    }

    #[test]
    fn test_scripted_events() {
        let mut events = ScriptedEvents::new();
        events.push_mouse(5, -2).push_tap(Key::Enter).push_idle(1);
        assert_eq!(events.remaining(), 4);
        assert_eq!(events.poll_event(), None);
        assert_eq!(events.mouse_delta(), (5, -2));
        assert_eq!(events.mouse_delta(), (0, 0));
        assert_eq!(events.poll_event(), Some(InputEvent::KeyPress(Key::Enter)));
        assert_eq!(events.poll_event(), Some(InputEvent::KeyRelease(Key::Enter)));
        assert_eq!(events.poll_event(), None);
        assert!(events.is_exhausted());

        events.push_idle(1).inject(InputEvent::KeyPress(Key::Esc));
        assert_eq!(events.poll_event(), Some(InputEvent::KeyPress(Key::Esc)));
        assert_eq!(events.poll_event(), None);
    }

    #[test]
    fn test_locomotion_walks_and_hits_edge() {
        let mut loco = FlatLocomotion::new(Vec3::new(0.0, 5.0, 145.0), Vec3::Z);
        let mut moves = MoveMask::empty();
        moves.set(MoveMask::FORWARD);
        let update = loco.update(1000, moves, 0, 0, false);
        assert!(update.collided);
        assert_eq!(update.position.z, 150.0);
        assert_eq!(update.position.y, 5.0);

        let update = loco.update(100, MoveMask::empty(), 0, 0, true);
        assert!(!update.position_changed);
        assert!(update.camera_changed);
    }

    #[test]
    fn test_locomotion_turns() {
        let mut loco = FlatLocomotion::new(Vec3::ZERO, Vec3::Z);
        let update = loco.update(16, MoveMask::empty(), 100, 0, false);
        assert!(update.camera_changed);
        assert!((update.heading.length() - 1.0).abs() < 1e-5);
        assert!(update.heading.x.abs() > 0.1);
    }

    #[test]
    fn test_step_clock() {
        let clock = StepClock::new(100, 16);
        assert_eq!(clock.now_ms(), 100);
        assert_eq!(clock.now_ms(), 116);
    }
}
