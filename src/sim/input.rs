//! Movement command aggregation
//!
//! Key events arrive one at a time and at whatever rate the event engine
//! delivers them. Movement is level-triggered: a press sets a bit and the
//! matching release clears it, so a held key keeps the player moving every
//! frame in between. Everything else is edge-triggered and comes back as a
//! one-shot [`Command`].

use serde::{Deserialize, Serialize};

use crate::engine::{InputEvent, Key, MouseButton};

/// Bitmask of held movement directions.
/// Opposite directions may be held together; locomotion resolves them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MoveMask {
    /// Raw bitfield of held directions
    pub bits: u8,
}

impl MoveMask {
    pub const FORWARD: u8 = 1 << 0;
    pub const BACK: u8 = 1 << 1;
    pub const LEFT: u8 = 1 << 2;
    pub const RIGHT: u8 = 1 << 3;

    pub const fn empty() -> Self {
        Self { bits: 0 }
    }

    pub const fn from_bits(bits: u8) -> Self {
        Self { bits }
    }

    #[inline]
    pub const fn contains(&self, flag: u8) -> bool {
        self.bits & flag != 0
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.bits == 0
    }

    #[inline]
    pub fn set(&mut self, flag: u8) {
        self.bits |= flag;
    }

    #[inline]
    pub fn clear(&mut self, flag: u8) {
        self.bits &= !flag;
    }

    pub fn forward(&self) -> bool {
        self.contains(Self::FORWARD)
    }

    pub fn back(&self) -> bool {
        self.contains(Self::BACK)
    }

    pub fn left(&self) -> bool {
        self.contains(Self::LEFT)
    }

    pub fn right(&self) -> bool {
        self.contains(Self::RIGHT)
    }
}

/// Movement bit for a key, if it is a movement key
fn move_flag(key: Key) -> Option<u8> {
    match key {
        Key::W => Some(MoveMask::FORWARD),
        Key::S => Some(MoveMask::BACK),
        Key::A => Some(MoveMask::LEFT),
        Key::D => Some(MoveMask::RIGHT),
        _ => None,
    }
}

/// One-shot commands produced by a single event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Enter: advance the current screen / toggle pause
    Confirm,
    /// Esc: leave the game
    Quit,
    /// Left mouse press: try to pick up a page
    Pickup,
    Screenshot,
    ToggleLantern,
    ToggleMoonlight,
    /// Run modifier pressed (true) or released (false)
    RunChanged(bool),
}

/// Persistent input state built up from discrete events
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandAggregator {
    moves: MoveMask,
    running: bool,
    wireframe: bool,
}

impl CommandAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one event into the held state. Returns the one-shot command it
    /// carries, if any. Unmapped keys are ignored.
    pub fn apply(&mut self, event: &InputEvent) -> Option<Command> {
        match *event {
            InputEvent::KeyPress(key) => {
                if let Some(flag) = move_flag(key) {
                    self.moves.set(flag);
                    return None;
                }
                match key {
                    Key::Esc => Some(Command::Quit),
                    Key::Enter => Some(Command::Confirm),
                    Key::F1 => Some(Command::Screenshot),
                    Key::F3 => Some(Command::ToggleLantern),
                    Key::F4 => Some(Command::ToggleMoonlight),
                    Key::F => {
                        self.wireframe = true;
                        None
                    }
                    Key::Shift => self.set_running(true),
                    _ => None,
                }
            }
            InputEvent::KeyRelease(key) => {
                if let Some(flag) = move_flag(key) {
                    self.moves.clear(flag);
                    return None;
                }
                match key {
                    Key::F => {
                        self.wireframe = false;
                        None
                    }
                    Key::Shift => self.set_running(false),
                    _ => None,
                }
            }
            InputEvent::MousePress(MouseButton::Left) => Some(Command::Pickup),
            InputEvent::MousePress(_) | InputEvent::MouseRelease(_) => None,
        }
    }

    fn set_running(&mut self, running: bool) -> Option<Command> {
        if self.running == running {
            return None;
        }
        self.running = running;
        Some(Command::RunChanged(running))
    }

    /// Drop all held directions (overlay screens do this every frame)
    pub fn clear_moves(&mut self) {
        self.moves = MoveMask::empty();
    }

    pub fn moves(&self) -> MoveMask {
        self.moves
    }

    pub fn running(&self) -> bool {
        self.running
    }

    pub fn wireframe(&self) -> bool {
        self.wireframe
    }

    /// Movement speed for the current run state
    pub fn speed(&self, base_speed: f32, run_multiplier: f32) -> f32 {
        if self.running {
            base_speed * run_multiplier
        } else {
            base_speed
        }
    }
}
