//! Audio cue director
//!
//! Decides which clips play for the current screen and what happened this
//! frame. Mixing and playback belong to the audio engine; this only issues
//! play/stop calls through the [`Audio`] trait.

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::engine::{Audio, Clip};
use crate::settings::Volumes;
use crate::sim::{GameEvent, ScreenMode, Session};

/// Every clip the game knows about
pub const ALL_CLIPS: [Clip; 10] = [
    Clip::Title,
    Clip::Story,
    Clip::Forest,
    Clip::Fire,
    Clip::Footsteps,
    Clip::Running,
    Clip::Wolves,
    Clip::Paper,
    Clip::GameOver,
    Clip::Survived,
];

/// Clips that only belong to gameplay
const AMBIENT_CLIPS: [Clip; 5] = [
    Clip::Forest,
    Clip::Fire,
    Clip::Footsteps,
    Clip::Running,
    Clip::Wolves,
];

/// Where the campfire crackles
pub const CAMPFIRE_POSITION: Vec3 = Vec3::ZERO;

/// Drives the audio engine from session state
#[derive(Debug, Clone)]
pub struct AudioDirector {
    /// Screen whose entry cues already played
    last_mode: Option<ScreenMode>,
    /// Kept apart from the session RNG so audio never shifts gameplay
    rng: Pcg32,
    howl_chance_per_sec: f32,
}

impl AudioDirector {
    pub fn new(seed: u64, howl_chance_per_sec: f32) -> Self {
        Self {
            last_mode: None,
            rng: Pcg32::seed_from_u64(seed ^ 0x5eed_a0d1),
            howl_chance_per_sec,
        }
    }

    /// Apply volumes, place the campfire and start the title music
    pub fn start<A: Audio + ?Sized>(&mut self, audio: &mut A, volumes: &Volumes) {
        for clip in ALL_CLIPS {
            if let Some(volume) = volumes.for_clip(clip) {
                audio.set_volume(clip, volume);
            }
        }
        audio.set_clip_position(Clip::Fire, CAMPFIRE_POSITION);
        self.enter(audio, ScreenMode::Title);
        self.last_mode = Some(ScreenMode::Title);
    }

    /// Issue cues for one frame, after the session has ticked
    pub fn update<A: Audio + ?Sized>(&mut self, audio: &mut A, session: &Session, events: &[GameEvent]) {
        for event in events {
            if let GameEvent::PageCollected { .. } = event {
                if !audio.is_playing(Clip::Paper) {
                    play(audio, Clip::Paper, false);
                }
            }
        }

        if self.last_mode != Some(session.mode) {
            self.enter(audio, session.mode);
            self.last_mode = Some(session.mode);
        }

        if session.mode.is_gameplay() && !session.quit {
            self.gameplay(audio, session);
        }
    }

    /// Cues for entering a screen
    fn enter<A: Audio + ?Sized>(&mut self, audio: &mut A, mode: ScreenMode) {
        match mode {
            ScreenMode::Title => play(audio, Clip::Title, true),
            ScreenMode::StoryIntro => {
                stop(audio, Clip::Title);
                play(audio, Clip::Story, true);
            }
            ScreenMode::Pause => {
                stop(audio, Clip::Story);
                stop_ambient(audio);
            }
            ScreenMode::Gameplay => {}
            ScreenMode::PickupInterstitial | ScreenMode::Survived => stop_ambient(audio),
            ScreenMode::StoryOutro => {
                stop_ambient(audio);
                play(audio, Clip::Survived, false);
            }
            ScreenMode::GameOver => {
                stop_ambient(audio);
                play(audio, Clip::GameOver, false);
            }
        }
    }

    fn gameplay<A: Audio + ?Sized>(&mut self, audio: &mut A, session: &Session) {
        audio.set_listener(session.player.position, session.player.heading);

        for clip in [Clip::Forest, Clip::Fire] {
            if !audio.is_playing(clip) {
                play(audio, clip, true);
            }
        }

        let (wanted, other) = if session.controls.running() {
            (Clip::Running, Clip::Footsteps)
        } else {
            (Clip::Footsteps, Clip::Running)
        };
        if session.controls.moves().is_empty() {
            stop(audio, Clip::Footsteps);
            stop(audio, Clip::Running);
        } else {
            stop(audio, other);
            if !audio.is_playing(wanted) {
                play(audio, wanted, true);
            }
        }

        let chance = (self.howl_chance_per_sec * session.elapsed_ms as f32 / 1000.0).clamp(0.0, 1.0);
        if chance > 0.0 && self.rng.random::<f32>() < chance && !audio.is_playing(Clip::Wolves) {
            play(audio, Clip::Wolves, false);
        }
    }
}

fn play<A: Audio + ?Sized>(audio: &mut A, clip: Clip, looping: bool) {
    log::debug!("Play {:?}{}", clip, if looping { " (loop)" } else { "" });
    audio.play(clip, looping);
}

fn stop<A: Audio + ?Sized>(audio: &mut A, clip: Clip) {
    if audio.is_playing(clip) {
        log::debug!("Stop {:?}", clip);
        audio.stop(clip);
    }
}

fn stop_ambient<A: Audio + ?Sized>(audio: &mut A) {
    for clip in AMBIENT_CLIPS {
        stop(audio, clip);
    }
}
