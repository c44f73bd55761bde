//! Night Pages entry point
//!
//! The real renderer, audio and input engines are supplied by the host.
//! Run standalone, the binary plays a scripted walk through the forest on
//! the headless engines and logs what happens.

#[cfg(not(target_arch = "wasm32"))]
use std::process::ExitCode;

#[cfg(not(target_arch = "wasm32"))]
use nightpages::engine::headless::{
    FlatLocomotion, HeadlessRenderer, ScriptedEvents, SilentAudio, StepClock,
};
#[cfg(not(target_arch = "wasm32"))]
use nightpages::engine::{Engines, InputEvent, Key, MouseButton};
#[cfg(not(target_arch = "wasm32"))]
use nightpages::sim::ScreenMode;
#[cfg(not(target_arch = "wasm32"))]
use nightpages::{App, Settings, Tuning};

#[cfg(not(target_arch = "wasm32"))]
const TUNING_FILE: &str = "nightpages.tuning.json";
#[cfg(not(target_arch = "wasm32"))]
const SETTINGS_FILE: &str = "nightpages.settings.json";
#[cfg(not(target_arch = "wasm32"))]
const DEMO_FRAME_LIMIT: u64 = 10_000;

#[cfg(not(target_arch = "wasm32"))]
fn main() -> ExitCode {
    env_logger::init();
    log::info!("Night Pages (headless demo) starting...");

    match run_demo() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // No standalone entry point on wasm; the host drives `App`
}

#[cfg(not(target_arch = "wasm32"))]
fn run_demo() -> nightpages::Result<()> {
    let tuning = Tuning::load_or_default(TUNING_FILE);
    let settings = Settings::load_or_default(SETTINGS_FILE);
    let seed = seed();
    log::info!("Seed {seed} (set NIGHTPAGES_SEED to replay)");

    let engines = Engines {
        renderer: HeadlessRenderer::default(),
        audio: SilentAudio::default(),
        events: demo_script(),
        locomotion: FlatLocomotion::new(tuning.player_start, tuning.player_heading),
        clock: StepClock::default(),
    };
    let mut app = App::new(seed, tuning, settings, engines)?;

    // Autopilot: acknowledge story screens as soon as they appear
    let mut frames = 0;
    while frames < DEMO_FRAME_LIMIT && app.frame() {
        frames += 1;
        let mode = app.session().mode;
        let events = &mut app.engines_mut().events;
        match mode {
            ScreenMode::PickupInterstitial => {
                // Overlays drop held keys, so start walking again afterwards
                events
                    .inject(InputEvent::KeyPress(Key::W))
                    .inject(InputEvent::KeyPress(Key::Enter));
            }
            ScreenMode::StoryOutro => {
                events.inject(InputEvent::KeyPress(Key::Enter));
            }
            _ => {}
        }
    }

    let session = app.session();
    log::info!(
        "Demo finished: {} frames, screen {:?}, {} of {} pages, stalker {:.1} away",
        frames,
        session.mode,
        session.collected(),
        session.progress.threshold(),
        session.antagonist.position.distance(session.player.position)
    );
    Ok(())
}

/// Seed from NIGHTPAGES_SEED, else from the wall clock
#[cfg(not(target_arch = "wasm32"))]
fn seed() -> u64 {
    if let Ok(value) = std::env::var("NIGHTPAGES_SEED") {
        match value.trim().parse() {
            Ok(seed) => return seed,
            Err(_) => log::warn!("Ignoring NIGHTPAGES_SEED={value:?}, not a number"),
        }
    }
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Click through the intro, wander with the lantern on, grab at pages, leave.
/// Story screens reached mid-walk are acknowledged by the loop in `run_demo`.
#[cfg(not(target_arch = "wasm32"))]
fn demo_script() -> ScriptedEvents {
    let click = InputEvent::MousePress(MouseButton::Left);
    let mut script = ScriptedEvents::new();
    script
        .push_idle(10)
        .push_tap(Key::Enter)
        .push_tap(Key::Enter)
        .push_tap(Key::Enter)
        .push_tap(Key::F3)
        .push_event(InputEvent::KeyPress(Key::W));

    for leg in 0..12 {
        script.push_idle(40);
        if leg % 3 == 2 {
            script.push_event(InputEvent::KeyPress(Key::Shift));
        }
        script.push_mouse(if leg % 2 == 0 { 60 } else { -45 }, 0);
        script.push_event(click).push_idle(1);
        if leg % 3 == 2 {
            script.push_event(InputEvent::KeyRelease(Key::Shift));
        }
    }

    script
        .push_event(InputEvent::KeyRelease(Key::W))
        .push_idle(30)
        .push_tap(Key::Esc);
    script
}
