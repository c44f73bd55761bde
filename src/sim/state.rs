//! Session state and screen modes
//!
//! Everything the game mutates lives in [`Session`]. Components borrow
//! pieces of it for the duration of one frame and never keep them.

use glam::Vec3;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::input::CommandAggregator;
use super::pickup::Collectible;
use super::progress::Progress;
use super::scatter::{bounding_sphere, scatter};
use super::stalker::Antagonist;
use crate::engine::{Overlay, Sphere};
use crate::tuning::Tuning;

/// Which screen is active. Exactly one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScreenMode {
    Title,
    StoryIntro,
    Gameplay,
    /// Shown after the first page
    PickupInterstitial,
    /// Shown after the last page needed to escape
    StoryOutro,
    Survived,
    GameOver,
    /// Help/instructions, also the pause screen
    Pause,
}

/// What can move the session between screens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Trigger {
    /// Enter
    Confirm,
    /// Esc
    Quit,
    FirstPickup,
    WinReached,
    Caught,
}

/// Outcome of a trigger in a given screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Stay,
    To(ScreenMode),
    Quit,
}

impl ScreenMode {
    pub const ALL: [ScreenMode; 8] = [
        ScreenMode::Title,
        ScreenMode::StoryIntro,
        ScreenMode::Gameplay,
        ScreenMode::PickupInterstitial,
        ScreenMode::StoryOutro,
        ScreenMode::Survived,
        ScreenMode::GameOver,
        ScreenMode::Pause,
    ];

    /// The full transition table
    pub fn on(self, trigger: Trigger) -> Transition {
        use ScreenMode::*;
        match (self, trigger) {
            (_, Trigger::Quit) => Transition::Quit,

            (Title, Trigger::Confirm) => Transition::To(StoryIntro),
            (StoryIntro, Trigger::Confirm) => Transition::To(Pause),
            (Pause, Trigger::Confirm) => Transition::To(Gameplay),
            (Gameplay, Trigger::Confirm) => Transition::To(Pause),
            (PickupInterstitial, Trigger::Confirm) => Transition::To(Gameplay),
            (StoryOutro, Trigger::Confirm) => Transition::To(Survived),

            (Gameplay, Trigger::WinReached) => Transition::To(StoryOutro),
            (Gameplay, Trigger::Caught) => Transition::To(GameOver),
            (Gameplay, Trigger::FirstPickup) => Transition::To(PickupInterstitial),

            _ => Transition::Stay,
        }
    }

    /// Only gameplay runs movement, pursuit and pickup
    pub fn is_gameplay(self) -> bool {
        self == ScreenMode::Gameplay
    }

    /// No outgoing transitions other than quit
    pub fn is_terminal(self) -> bool {
        matches!(self, ScreenMode::Survived | ScreenMode::GameOver)
    }

    /// Full-screen image for a non-gameplay screen
    pub fn overlay(self) -> Option<Overlay> {
        match self {
            ScreenMode::Title => Some(Overlay::Title),
            ScreenMode::StoryIntro => Some(Overlay::Story),
            ScreenMode::Gameplay => None,
            ScreenMode::PickupInterstitial => Some(Overlay::FirstPage),
            ScreenMode::StoryOutro => Some(Overlay::Ending),
            ScreenMode::Survived => Some(Overlay::Survived),
            ScreenMode::GameOver => Some(Overlay::GameOver),
            ScreenMode::Pause => Some(Overlay::Help),
        }
    }
}

/// Things that happened during a tick, for audio, logging and callers
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameEvent {
    ScreenChanged { from: ScreenMode, to: ScreenMode },
    PageCollected { index: usize, count: u32 },
    Caught { distance: f32 },
    Won,
    Collided,
    LanternToggled(bool),
    MoonlightToggled(bool),
    ScreenshotRequested,
    Quit,
}

/// The player's eye and view direction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Player {
    pub position: Vec3,
    pub heading: Vec3,
}

/// Light switches owned by the session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Lights {
    pub lantern: bool,
    pub moon: bool,
}

/// A decorative tree
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obstacle {
    pub position: Vec3,
    pub bounds: Sphere,
}

/// Intrinsic bounds of the page and tree models
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelBounds {
    pub page: Sphere,
    pub tree: Sphere,
}

impl Default for ModelBounds {
    fn default() -> Self {
        Self {
            page: Sphere::new(Vec3::new(0.0, 0.5, 0.0), 0.5),
            tree: Sphere::new(Vec3::new(0.0, 4.0, 0.0), 1.0),
        }
    }
}

/// Complete session state
#[derive(Debug, Clone)]
pub struct Session {
    /// Seed used for placement and pursuit jitter
    pub seed: u64,
    pub tuning: Tuning,
    pub mode: ScreenMode,
    /// Timestamp of the previous frame (None before the first)
    pub last_frame_ms: Option<u64>,
    /// Time since the previous frame
    pub elapsed_ms: u32,
    /// Frames ticked so far
    pub frame: u64,
    pub controls: CommandAggregator,
    pub progress: Progress,
    pub player: Player,
    pub items: Vec<Collectible>,
    pub obstacles: Vec<Obstacle>,
    pub antagonist: Antagonist,
    pub lights: Lights,
    /// Ask locomotion for a full refresh on the next gameplay frame
    pub force_update: bool,
    screenshot_pending: bool,
    screenshot_count: u32,
    pub quit: bool,
    pub(crate) rng: Pcg32,
}

impl Session {
    /// Create a session and scatter the world
    pub fn new(seed: u64, tuning: Tuning, bounds: ModelBounds) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let placement = scatter(&tuning.scatter_params(), &mut rng);

        let items = placement
            .items
            .iter()
            .map(|&p| Collectible::new(p, bounding_sphere(&bounds.page, tuning.bounds_scale, p)))
            .collect();
        let obstacles = placement
            .obstacles
            .iter()
            .map(|&p| Obstacle {
                position: p,
                bounds: bounding_sphere(&bounds.tree, tuning.bounds_scale, p),
            })
            .collect();
        let antagonist = Antagonist {
            position: placement.antagonist,
            pursuit: tuning.pursuit,
            jitter: tuning.jitter,
            wrap_bound: tuning.wrap_bound,
            loss_distance: tuning.loss_distance,
        };

        log::info!(
            "Session {} started: {} pages, {} trees, stalker at ({}, {})",
            seed,
            tuning.item_count,
            tuning.obstacle_count,
            placement.antagonist.x,
            placement.antagonist.z
        );

        Self {
            seed,
            mode: ScreenMode::Title,
            last_frame_ms: None,
            elapsed_ms: 0,
            frame: 0,
            controls: CommandAggregator::new(),
            progress: Progress::new(tuning.win_threshold),
            player: Player {
                position: tuning.player_start,
                heading: tuning.player_heading.normalize_or_zero(),
            },
            items,
            obstacles,
            antagonist,
            lights: Lights::default(),
            force_update: true,
            screenshot_pending: false,
            screenshot_count: 0,
            quit: false,
            rng,
            tuning,
        }
    }

    /// Pages collected so far
    pub fn collected(&self) -> u32 {
        self.progress.collected()
    }

    /// Record the frame timestamp and compute elapsed time (0 on the first frame)
    pub fn advance_clock(&mut self, now_ms: u64) -> u32 {
        self.elapsed_ms = match self.last_frame_ms {
            Some(last) => now_ms.saturating_sub(last).min(u32::MAX as u64) as u32,
            None => 0,
        };
        self.last_frame_ms = Some(now_ms);
        self.frame += 1;
        self.elapsed_ms
    }

    /// Apply a screen transition, returning the event if the screen changed
    pub fn apply(&mut self, transition: Transition) -> Option<GameEvent> {
        match transition {
            Transition::Stay => None,
            Transition::Quit => {
                log::info!("Quit from {:?}", self.mode);
                self.quit = true;
                Some(GameEvent::Quit)
            }
            Transition::To(to) if to == self.mode => None,
            Transition::To(to) => {
                let from = self.mode;
                log::info!("Screen {:?} -> {:?}", from, to);
                self.mode = to;
                if !from.is_gameplay() && to.is_gameplay() {
                    self.force_update = true;
                }
                Some(GameEvent::ScreenChanged { from, to })
            }
        }
    }

    pub(crate) fn request_screenshot(&mut self) {
        self.screenshot_pending = true;
    }

    /// Take a pending screenshot request, returning its sequence number
    pub fn take_screenshot(&mut self) -> Option<u32> {
        if !self.screenshot_pending {
            return None;
        }
        self.screenshot_pending = false;
        let index = self.screenshot_count;
        self.screenshot_count += 1;
        Some(index)
    }
}
