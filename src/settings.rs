//! Player settings and preferences
//!
//! Stored as a JSON file next to the game. Missing fields fall back to
//! their defaults, so older files keep loading.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::engine::Clip;
use crate::error::{Error, Result};

/// Output resolution requested from the rendering engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}

/// Per-clip volumes (0-100, matching the audio engine's scale)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Volumes {
    pub forest: u8,
    pub footsteps: u8,
    pub running: u8,
    pub paper: u8,
    pub game_over: u8,
    pub wolves: u8,
    pub survived: u8,
    pub fire: u8,
}

impl Default for Volumes {
    fn default() -> Self {
        Self {
            forest: 90,
            footsteps: 90,
            running: 90,
            paper: 75,
            game_over: 75,
            wolves: 75,
            survived: 90,
            fire: 100,
        }
    }
}

impl Volumes {
    /// Volume for a clip, `None` leaves the engine default
    pub fn for_clip(&self, clip: Clip) -> Option<u8> {
        match clip {
            Clip::Forest => Some(self.forest),
            Clip::Footsteps => Some(self.footsteps),
            Clip::Running => Some(self.running),
            Clip::Paper => Some(self.paper),
            Clip::GameOver => Some(self.game_over),
            Clip::Wolves => Some(self.wolves),
            Clip::Survived => Some(self.survived),
            Clip::Fire => Some(self.fire),
            Clip::Title | Clip::Story => None,
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Display ===
    pub resolution: Resolution,
    /// Colour depth in bits per pixel
    pub bit_depth: u32,
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    pub near_plane: f32,
    pub far_plane: f32,
    /// Linear fog start/end distances
    pub fog_start: f32,
    pub fog_end: f32,

    // === Lights ===
    /// Lantern lit when gameplay starts
    pub lantern_on: bool,
    /// Directional moonlight on when gameplay starts
    pub moonlight_on: bool,

    // === Audio ===
    pub volumes: Volumes,

    // === Screenshots ===
    /// Path prefix, the counter and `.bmp` are appended
    pub screenshot_prefix: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            resolution: Resolution {
                width: 640,
                height: 480,
            },
            bit_depth: 32,
            fov_degrees: 60.0,
            near_plane: 0.1,
            far_plane: 1000.0,
            fog_start: 15.0,
            fog_end: 150.0,

            lantern_on: false,
            moonlight_on: false,

            volumes: Volumes::default(),

            screenshot_prefix: "screenshots/screen".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        read_json(path.as_ref())
    }

    /// Load settings, falling back to defaults if the file is missing or bad
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                log::warn!("Using default settings ({e})");
                Self::default()
            }
        }
    }

    /// Save settings as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        write_json(path.as_ref(), self)?;
        log::info!("Settings saved");
        Ok(())
    }

    /// Screenshot file name for the given counter
    pub fn screenshot_path(&self, index: u32) -> String {
        format!("{}{}.bmp", self.screenshot_prefix, index)
    }
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| Error::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(|source| Error::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, json).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })
}
