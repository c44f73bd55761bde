//! Per-frame session update
//!
//! One call per rendered frame. Overlay screens only look at Enter/Esc.
//! Gameplay runs, in order: input, locomotion, visibility, pickup,
//! pursuit, then resolves the signals into at most one screen change.

use crate::engine::{InputEvent, Locomotion, Ray, Spatial};

use super::input::Command;
use super::pickup::{try_pickup, update_visibility};
use super::progress::Milestone;
use super::state::{GameEvent, Player, Session, Trigger};

/// Everything polled from the outside world for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameInput {
    /// At most one discrete event per frame
    pub event: Option<InputEvent>,
    /// Mouse movement since the previous frame
    pub mouse_delta: (i32, i32),
    /// Monotonic timestamp
    pub now_ms: u64,
}

/// Advance the session by one frame
pub fn tick<L, S>(
    session: &mut Session,
    input: &FrameInput,
    locomotion: &mut L,
    spatial: &mut S,
) -> Vec<GameEvent>
where
    L: Locomotion + ?Sized,
    S: Spatial + ?Sized,
{
    let mut events = Vec::new();
    if session.quit {
        return events;
    }

    session.advance_clock(input.now_ms);

    if session.mode.is_gameplay() {
        tick_gameplay(session, input, locomotion, spatial, &mut events);
    } else {
        tick_overlay(session, input, &mut events);
    }

    events
}

/// Non-gameplay screens: stale movement is dropped, only Enter/Esc count
fn tick_overlay(session: &mut Session, input: &FrameInput, events: &mut Vec<GameEvent>) {
    session.controls.clear_moves();

    let Some(event) = input.event else { return };
    let trigger = match event {
        InputEvent::KeyPress(_) => match session.controls.apply(&event) {
            Some(Command::Confirm) => Some(Trigger::Confirm),
            Some(Command::Quit) => Some(Trigger::Quit),
            _ => None,
        },
        // Releases still reach the aggregator so modifiers are not stuck
        InputEvent::KeyRelease(_) => {
            session.controls.apply(&event);
            None
        }
        InputEvent::MousePress(_) | InputEvent::MouseRelease(_) => None,
    };
    // Movement presses on an overlay must not leak into gameplay
    session.controls.clear_moves();

    if let Some(trigger) = trigger {
        let transition = session.mode.on(trigger);
        events.extend(session.apply(transition));
    }
}

fn tick_gameplay<L, S>(
    session: &mut Session,
    input: &FrameInput,
    locomotion: &mut L,
    spatial: &mut S,
    events: &mut Vec<GameEvent>,
) where
    L: Locomotion + ?Sized,
    S: Spatial + ?Sized,
{
    // --- Input ---
    let mut wants_pickup = false;
    if let Some(event) = input.event {
        match session.controls.apply(&event) {
            Some(Command::Quit) => {
                events.extend(session.apply(session.mode.on(Trigger::Quit)));
                return;
            }
            Some(Command::Confirm) => {
                events.extend(session.apply(session.mode.on(Trigger::Confirm)));
                return;
            }
            Some(Command::Pickup) => wants_pickup = true,
            Some(Command::Screenshot) => {
                log::debug!("Screenshot requested");
                session.request_screenshot();
                events.push(GameEvent::ScreenshotRequested);
            }
            Some(Command::ToggleLantern) => {
                session.lights.lantern = !session.lights.lantern;
                log::debug!("Lantern {}", on_off(session.lights.lantern));
                events.push(GameEvent::LanternToggled(session.lights.lantern));
            }
            Some(Command::ToggleMoonlight) => {
                session.lights.moon = !session.lights.moon;
                log::debug!("Moonlight {}", on_off(session.lights.moon));
                events.push(GameEvent::MoonlightToggled(session.lights.moon));
            }
            Some(Command::RunChanged(running)) => {
                let speed = session
                    .controls
                    .speed(session.tuning.base_speed, session.tuning.run_multiplier);
                log::debug!("Running {}, speed {}", on_off(running), speed);
                locomotion.set_speed(speed);
            }
            None => {}
        }
    }

    // --- Locomotion ---
    if session.force_update {
        // Shift may have changed while an overlay was up
        locomotion.set_speed(
            session
                .controls
                .speed(session.tuning.base_speed, session.tuning.run_multiplier),
        );
    }
    let (dx, dy) = input.mouse_delta;
    let update = locomotion.update(
        session.elapsed_ms,
        session.controls.moves(),
        dx,
        dy,
        session.force_update,
    );
    session.force_update = false;
    session.player = Player {
        position: update.position,
        heading: update.heading,
    };
    if update.collided {
        events.push(GameEvent::Collided);
    }

    // --- Visibility ---
    spatial.set_camera(session.player.position, session.player.heading);
    update_visibility(&mut session.items, &*spatial);

    // --- Pickup ---
    let mut milestone = None;
    if wants_pickup {
        let ray = Ray::new(session.player.position, session.player.heading);
        match try_pickup(
            &mut session.items,
            &ray,
            session.tuning.pickup_ray_radius,
            &*spatial,
            session.tuning.pickup_resolution,
        ) {
            Some(index) => {
                milestone = session.progress.record_pickup();
                let count = session.collected();
                log::info!("Page {} collected ({} total)", index, count);
                events.push(GameEvent::PageCollected { index, count });
            }
            None => log::debug!("Pickup ray hit nothing"),
        }
    }

    // --- Pursuit ---
    let outcome = session.antagonist.advance(
        session.player.position,
        session.elapsed_ms,
        &mut session.rng,
    );

    // --- Resolve: win beats loss beats the first-page interstitial ---
    let trigger = if milestone == Some(Milestone::WinThreshold) {
        log::info!("Escaped with {} pages", session.collected());
        events.push(GameEvent::Won);
        Some(Trigger::WinReached)
    } else if outcome.caught {
        log::info!("Caught at distance {:.2}", outcome.distance);
        events.push(GameEvent::Caught {
            distance: outcome.distance,
        });
        Some(Trigger::Caught)
    } else if milestone == Some(Milestone::FirstPickup) {
        Some(Trigger::FirstPickup)
    } else {
        None
    };

    if let Some(trigger) = trigger {
        events.extend(session.apply(session.mode.on(trigger)));
    }
}

fn on_off(on: bool) -> &'static str {
    if on { "on" } else { "off" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::headless::{FlatLocomotion, HeadlessRenderer};
    use crate::engine::{Key, MouseButton, Sphere};
    use crate::sim::pickup::Collectible;
    use crate::sim::state::{ModelBounds, ScreenMode};
    use crate::sim::stalker::PursuitStep;
    use crate::tuning::Tuning;
    use glam::Vec3;

    struct Rig {
        session: Session,
        locomotion: FlatLocomotion,
        renderer: HeadlessRenderer,
        now: u64,
    }

    impl Rig {
        fn new() -> Self {
            let tuning = Tuning::default();
            let locomotion = FlatLocomotion::new(tuning.player_start, tuning.player_heading);
            let mut session = Session::new(12345, tuning, ModelBounds::default());
            // Park the stalker far away so it never interferes
            session.antagonist.position = Vec3::new(140.0, 0.0, 140.0);
            Self {
                session,
                locomotion,
                renderer: HeadlessRenderer::default(),
                now: 1000,
            }
        }

        fn step(&mut self, event: Option<InputEvent>) -> Vec<GameEvent> {
            self.now += 16;
            let input = FrameInput {
                event,
                mouse_delta: (0, 0),
                now_ms: self.now,
            };
            tick(&mut self.session, &input, &mut self.locomotion, &mut self.renderer)
        }

        fn press(&mut self, key: Key) -> Vec<GameEvent> {
            self.step(Some(InputEvent::KeyPress(key)))
        }

        fn click(&mut self) -> Vec<GameEvent> {
            self.step(Some(InputEvent::MousePress(MouseButton::Left)))
        }

        fn to_gameplay(&mut self) {
            self.press(Key::Enter);
            self.press(Key::Enter);
            self.press(Key::Enter);
            assert_eq!(self.session.mode, ScreenMode::Gameplay);
        }

        /// Lay out pages in a row straight ahead of the start position
        fn pages_ahead(&mut self, n: usize) {
            let start = self.session.tuning.player_start;
            self.session.items = (0..n)
                .map(|i| {
                    let p = Vec3::new(start.x, 1.0, start.z + 20.0 + 10.0 * i as f32);
                    Collectible::new(p, Sphere::new(p, 3.0))
                })
                .collect();
        }
    }

    #[test]
    fn test_enter_enter_enter() {
        let mut rig = Rig::new();
        rig.press(Key::Enter);
        assert_eq!(rig.session.mode, ScreenMode::StoryIntro);
        rig.press(Key::Enter);
        assert_eq!(rig.session.mode, ScreenMode::Pause);
        rig.press(Key::Enter);
        assert_eq!(rig.session.mode, ScreenMode::Gameplay);
    }

    #[test]
    fn test_esc_quits_everywhere() {
        for mode in ScreenMode::ALL {
            let mut rig = Rig::new();
            rig.session.mode = mode;
            let events = rig.press(Key::Esc);
            assert!(rig.session.quit, "{mode:?} did not quit");
            assert!(events.contains(&GameEvent::Quit));
        }
    }

    #[test]
    fn test_quit_stops_ticking() {
        let mut rig = Rig::new();
        rig.press(Key::Esc);
        let frame = rig.session.frame;
        assert!(rig.press(Key::Enter).is_empty());
        assert_eq!(rig.session.frame, frame);
        assert_eq!(rig.session.mode, ScreenMode::Title);
    }

    #[test]
    fn test_pause_toggle() {
        let mut rig = Rig::new();
        rig.to_gameplay();
        rig.press(Key::Enter);
        assert_eq!(rig.session.mode, ScreenMode::Pause);
        rig.press(Key::Enter);
        assert_eq!(rig.session.mode, ScreenMode::Gameplay);
    }

    #[test]
    fn test_overlay_clears_movement() {
        let mut rig = Rig::new();
        rig.to_gameplay();
        rig.press(Key::W);
        assert!(rig.session.controls.moves().forward());
        rig.press(Key::Enter);
        rig.step(None);
        assert!(rig.session.controls.moves().is_empty());

        // A movement press on the pause screen does not stick either
        rig.press(Key::D);
        assert!(rig.session.controls.moves().is_empty());
    }

    #[test]
    fn test_overlay_is_inert() {
        let mut rig = Rig::new();
        let stalker = rig.session.antagonist.position;
        for _ in 0..10 {
            rig.step(None);
        }
        rig.click();
        assert_eq!(rig.session.antagonist.position, stalker);
        assert_eq!(rig.session.collected(), 0);
        assert_eq!(rig.session.mode, ScreenMode::Title);
    }

    #[test]
    fn test_first_page_interstitial() {
        let mut rig = Rig::new();
        rig.pages_ahead(5);
        rig.to_gameplay();
        let events = rig.click();
        assert_eq!(rig.session.collected(), 1);
        assert!(events.contains(&GameEvent::PageCollected { index: 0, count: 1 }));
        assert_eq!(rig.session.mode, ScreenMode::PickupInterstitial);
        rig.press(Key::Enter);
        assert_eq!(rig.session.mode, ScreenMode::Gameplay);
    }

    #[test]
    fn test_five_pages_win() {
        let mut rig = Rig::new();
        rig.pages_ahead(5);
        rig.to_gameplay();

        let mut screens = Vec::new();
        for _ in 0..5 {
            for event in rig.click() {
                if let GameEvent::ScreenChanged { from, to } = event {
                    screens.push((from, to));
                }
            }
            if rig.session.mode == ScreenMode::PickupInterstitial {
                rig.press(Key::Enter);
            }
        }

        assert_eq!(rig.session.collected(), 5);
        assert_eq!(rig.session.mode, ScreenMode::StoryOutro);
        assert_eq!(
            screens.first(),
            Some(&(ScreenMode::Gameplay, ScreenMode::PickupInterstitial))
        );
        assert_eq!(
            screens.last(),
            Some(&(ScreenMode::Gameplay, ScreenMode::StoryOutro))
        );

        rig.press(Key::Enter);
        assert_eq!(rig.session.mode, ScreenMode::Survived);
        // Terminal: only Esc leaves
        rig.press(Key::Enter);
        assert_eq!(rig.session.mode, ScreenMode::Survived);
        rig.click();
        assert_eq!(rig.session.collected(), 5);
    }

    #[test]
    fn test_page_behind_camera_not_collected() {
        let mut rig = Rig::new();
        let start = rig.session.tuning.player_start;
        let p = Vec3::new(start.x, 1.0, start.z - 20.0);
        rig.session.items = vec![Collectible::new(p, Sphere::new(p, 3.0))];
        rig.to_gameplay();
        rig.click();
        assert_eq!(rig.session.collected(), 0);
        assert!(!rig.session.items[0].visible);
        assert_eq!(rig.session.mode, ScreenMode::Gameplay);
    }

    #[test]
    fn test_caught_game_over() {
        let mut rig = Rig::new();
        rig.to_gameplay();
        rig.locomotion.teleport(Vec3::new(20.0, 0.0, 25.0), Vec3::Z);
        rig.session.antagonist.position = Vec3::new(20.0, 0.0, 20.0);
        let events = rig.step(None);
        assert!(events.iter().any(|e| matches!(e, GameEvent::Caught { .. })));
        assert_eq!(rig.session.mode, ScreenMode::GameOver);
        rig.press(Key::Enter);
        assert_eq!(rig.session.mode, ScreenMode::GameOver);
    }

    #[test]
    fn test_win_beats_catch_same_frame() {
        let mut rig = Rig::new();
        rig.pages_ahead(5);
        rig.to_gameplay();
        rig.session.progress = crate::sim::progress::Progress::new(1);
        let start = rig.session.tuning.player_start;
        rig.session.antagonist.position = Vec3::new(start.x + 2.0, 0.0, start.z);
        rig.click();
        assert_eq!(rig.session.mode, ScreenMode::StoryOutro);
    }

    #[test]
    fn test_catch_beats_first_page_same_frame() {
        let mut rig = Rig::new();
        rig.pages_ahead(5);
        rig.to_gameplay();
        let start = rig.session.tuning.player_start;
        rig.session.antagonist.position = Vec3::new(start.x + 2.0, 0.0, start.z);
        rig.click();
        assert_eq!(rig.session.collected(), 1);
        assert_eq!(rig.session.mode, ScreenMode::GameOver);
    }

    #[test]
    fn test_movement_and_run() {
        let mut rig = Rig::new();
        rig.to_gameplay();
        let start = rig.session.player.position;
        rig.press(Key::W);
        for _ in 0..10 {
            rig.step(None);
        }
        let walked = rig.session.player.position.z - start.z;
        assert!(walked > 0.0);

        rig.press(Key::Shift);
        let before = rig.session.player.position.z;
        for _ in 0..10 {
            rig.step(None);
        }
        let ran = rig.session.player.position.z - before;
        assert!(ran > walked * 2.0);
    }

    #[test]
    fn test_light_toggles_and_screenshot() {
        let mut rig = Rig::new();
        rig.to_gameplay();
        assert!(rig.press(Key::F3).contains(&GameEvent::LanternToggled(true)));
        assert!(rig.press(Key::F4).contains(&GameEvent::MoonlightToggled(true)));
        assert!(rig.press(Key::F3).contains(&GameEvent::LanternToggled(false)));
        rig.press(Key::F1);
        assert_eq!(rig.session.take_screenshot(), Some(0));
    }

    #[test]
    fn test_time_scaled_pursuit_waits_for_elapsed_time() {
        let mut rig = Rig::new();
        rig.session.antagonist.pursuit = PursuitStep::TimeScaled {
            units_per_second: 6.0,
        };
        rig.to_gameplay();
        let before = rig.session.antagonist.position;
        rig.step(None);
        let moved = before.distance(rig.session.antagonist.position);
        // 16 ms at 6 units/s
        assert!((moved - 0.096).abs() < 1e-3);
    }
}
