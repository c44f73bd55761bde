//! Frame loop
//!
//! Each frame: poll input, tick the session, cue audio, draw. The engines
//! are started once up front; if any refuses, no frame ever runs.

use crate::audio::AudioDirector;
use crate::engine::{Audio, Clock, Engines, EventSource, Locomotion, Model, Renderer};
use crate::error::{Error, Result};
use crate::present::present;
use crate::settings::Settings;
use crate::sim::{FrameInput, GameEvent, Lights, ModelBounds, Session, tick};
use crate::tuning::Tuning;

/// A running game wired to its engines
pub struct App<R, A, E, L, C> {
    session: Session,
    settings: Settings,
    engines: Engines<R, A, E, L, C>,
    director: AudioDirector,
    frames: u64,
    /// Events from the most recent frame
    last_events: Vec<GameEvent>,
}

impl<R, A, E, L, C> App<R, A, E, L, C>
where
    R: Renderer,
    A: Audio,
    E: EventSource,
    L: Locomotion,
    C: Clock,
{
    /// Start the engines and scatter a new world
    pub fn new(
        seed: u64,
        tuning: Tuning,
        settings: Settings,
        mut engines: Engines<R, A, E, L, C>,
    ) -> Result<Self> {
        tuning.validate()?;

        if !engines.renderer.start(&settings) {
            return Err(Error::EngineInit("renderer failed to start".into()));
        }
        if !engines.audio.start() {
            return Err(Error::EngineInit("audio failed to start".into()));
        }

        let bounds = ModelBounds {
            page: engines.renderer.model_bounds(Model::Page),
            tree: engines.renderer.model_bounds(Model::Tree),
        };
        let mut session = Session::new(seed, tuning, bounds);
        session.lights = Lights {
            lantern: settings.lantern_on,
            moon: settings.moonlight_on,
        };
        engines.locomotion.set_speed(session.tuning.base_speed);

        let mut director = AudioDirector::new(seed, session.tuning.wolf_howl_chance_per_sec);
        director.start(&mut engines.audio, &settings.volumes);

        Ok(Self {
            session,
            settings,
            engines,
            director,
            frames: 0,
            last_events: Vec::new(),
        })
    }

    /// Run one frame. Returns false once the session has quit.
    pub fn frame(&mut self) -> bool {
        if self.session.quit {
            return false;
        }

        let event = self.engines.events.poll_event();
        // Sampled every frame so deltas never pile up behind an overlay
        let mouse_delta = self.engines.events.mouse_delta();
        let input = FrameInput {
            event,
            mouse_delta,
            now_ms: self.engines.clock.now_ms(),
        };

        let events = tick(
            &mut self.session,
            &input,
            &mut self.engines.locomotion,
            &mut self.engines.renderer,
        );
        self.director
            .update(&mut self.engines.audio, &self.session, &events);
        self.last_events = events;
        self.frames += 1;

        if self.session.quit {
            return false;
        }

        let screenshot = self
            .session
            .take_screenshot()
            .map(|n| self.settings.screenshot_path(n));
        present(
            &mut self.engines.renderer,
            &self.session,
            &self.settings,
            screenshot.as_deref(),
        );
        true
    }

    /// Run until quit or until `max_frames` frames have run. Returns frames run.
    pub fn run(&mut self, max_frames: u64) -> u64 {
        let start = self.frames;
        while self.frames - start < max_frames && self.frame() {}
        let ran = self.frames - start;
        log::info!(
            "Stopped after {} frames on {:?} with {} pages",
            ran,
            self.session.mode,
            self.session.collected()
        );
        ran
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn engines(&self) -> &Engines<R, A, E, L, C> {
        &self.engines
    }

    pub fn engines_mut(&mut self) -> &mut Engines<R, A, E, L, C> {
        &mut self.engines
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn last_events(&self) -> &[GameEvent] {
        &self.last_events
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn is_running(&self) -> bool {
        !self.session.quit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::headless::{
        FlatLocomotion, HeadlessRenderer, ScriptedEvents, SilentAudio, StepClock,
    };
    use crate::engine::{Clip, InputEvent, Key, MouseButton, Sphere};
    use crate::sim::{Collectible, ScreenMode};
    use glam::Vec3;

    type HeadlessApp = App<HeadlessRenderer, SilentAudio, ScriptedEvents, FlatLocomotion, StepClock>;

    fn engines(renderer: HeadlessRenderer, events: ScriptedEvents) -> Engines<HeadlessRenderer, SilentAudio, ScriptedEvents, FlatLocomotion, StepClock> {
        let tuning = Tuning::default();
        Engines {
            renderer,
            audio: SilentAudio::default(),
            events,
            locomotion: FlatLocomotion::new(tuning.player_start, tuning.player_heading),
            clock: StepClock::default(),
        }
    }

    fn app(events: ScriptedEvents) -> HeadlessApp {
        let mut app = App::new(
            77,
            Tuning::default(),
            Settings::default(),
            engines(HeadlessRenderer::default(), events),
        )
        .unwrap();
        app.session_mut().antagonist.position = Vec3::new(140.0, 0.0, 140.0);
        app
    }

    #[test]
    fn test_renderer_failure_is_fatal() {
        let result = App::new(
            1,
            Tuning::default(),
            Settings::default(),
            engines(HeadlessRenderer::failing(), ScriptedEvents::new()),
        );
        assert!(matches!(result, Err(Error::EngineInit(_))));
    }

    #[test]
    fn test_audio_failure_is_fatal() {
        let mut e = engines(HeadlessRenderer::default(), ScriptedEvents::new());
        e.audio.fail_start = true;
        let result = App::new(1, Tuning::default(), Settings::default(), e);
        assert!(matches!(result, Err(Error::EngineInit(_))));
    }

    #[test]
    fn test_invalid_tuning_rejected_before_engines_start() {
        let tuning = Tuning {
            win_threshold: 0,
            ..Default::default()
        };
        let result = App::new(
            1,
            tuning,
            Settings::default(),
            engines(HeadlessRenderer::default(), ScriptedEvents::new()),
        );
        assert!(matches!(result, Err(Error::InvalidTuning(_))));
    }

    #[test]
    fn test_settings_lights_carry_into_session() {
        let settings = Settings {
            lantern_on: true,
            ..Default::default()
        };
        let app = App::new(
            1,
            Tuning::default(),
            settings,
            engines(HeadlessRenderer::default(), ScriptedEvents::new()),
        )
        .unwrap();
        assert!(app.session().lights.lantern);
        assert!(!app.session().lights.moon);
        assert!(app.engines().audio.is_playing(Clip::Title));
    }

    #[test]
    fn test_scripted_walk_then_quit() {
        let mut script = ScriptedEvents::new();
        script
            .push_tap(Key::Enter)
            .push_tap(Key::Enter)
            .push_tap(Key::Enter)
            .push_event(InputEvent::KeyPress(Key::W))
            .push_idle(30)
            .push_event(InputEvent::KeyRelease(Key::W))
            .push_mouse(40, 0)
            .push_tap(Key::Esc);
        let mut app = app(script);

        let ran = app.run(1000);
        assert!(!app.is_running());
        assert_eq!(ran, 40);
        assert!(app.last_events().contains(&GameEvent::Quit));
        assert_eq!(app.session().mode, ScreenMode::Gameplay);
        assert!(app.session().player.position.z > -100.0);

        let audio = &app.engines().audio;
        assert_eq!(audio.play_count(Clip::Story), 1);
        assert_eq!(audio.play_count(Clip::Footsteps), 1);
        assert!(audio.is_playing(Clip::Forest));
        assert!(!audio.is_playing(Clip::Footsteps));
        // Quit frame is not drawn
        assert_eq!(app.engines().renderer.frames, 39);
    }

    #[test]
    fn test_run_respects_frame_limit() {
        let mut script = ScriptedEvents::new();
        script.push_idle(50);
        let mut app = app(script);
        assert_eq!(app.run(10), 10);
        assert!(app.is_running());
        assert_eq!(app.session().mode, ScreenMode::Title);
    }

    #[test]
    fn test_full_escape() {
        let mut script = ScriptedEvents::new();
        script.push_tap(Key::Enter).push_tap(Key::Enter).push_tap(Key::Enter);
        let mut app = app(script);
        app.run(6);
        assert_eq!(app.session().mode, ScreenMode::Gameplay);

        // Line the pages up straight ahead
        let start = app.session().player.position;
        app.session_mut().items = (0..5)
            .map(|i| {
                let p = Vec3::new(start.x, 1.0, start.z + 20.0 + 10.0 * i as f32);
                Collectible::new(p, Sphere::new(p, 3.0))
            })
            .collect();

        let click = InputEvent::MousePress(MouseButton::Left);
        let events = &mut app.engines_mut().events;
        events.push_event(click).push_tap(Key::Enter);
        for _ in 0..4 {
            events.push_event(click).push_idle(1);
        }
        events.push_event(InputEvent::KeyPress(Key::F1));
        events.push_tap(Key::Enter).push_idle(2).push_tap(Key::Esc);
        app.run(100);

        assert_eq!(app.session().collected(), 5);
        assert_eq!(app.session().mode, ScreenMode::Survived);
        let audio = &app.engines().audio;
        assert!(audio.play_count(Clip::Paper) >= 1);
        assert_eq!(audio.play_count(Clip::Survived), 1);
        assert!(!audio.is_playing(Clip::Forest));
        // F1 arrived on the outro screen, so nothing was written
        assert!(app.engines().renderer.screenshots.is_empty());
    }

    #[test]
    fn test_screenshot_during_gameplay() {
        let mut script = ScriptedEvents::new();
        script
            .push_tap(Key::Enter)
            .push_tap(Key::Enter)
            .push_tap(Key::Enter)
            .push_tap(Key::F1)
            .push_tap(Key::F1);
        let mut app = app(script);
        app.run(10);
        assert_eq!(
            app.engines().renderer.screenshots,
            vec![
                "screenshots/screen0.bmp".to_string(),
                "screenshots/screen1.bmp".to_string()
            ]
        );
    }
}
