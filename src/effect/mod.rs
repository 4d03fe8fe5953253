//! Effect library: frame generators for light sequences.
//!
//! An effect maps (sequence, config, elapsed time) to one [`Frame`] of
//! per-light updates. Generators are synchronous and never touch the
//! network; they only read palette and sequence data already in memory.
//!
//! | kind         | behaviour                                           |
//! |--------------|-----------------------------------------------------|
//! | `rainbow`    | palette scrolls along the sequence                  |
//! | `color_wipe` | lights fill one by one, then the sequence clears    |
//! | `twinkle`    | random lights ignite and fade (stochastic)          |

pub mod color_wipe;
pub mod preview;
pub mod rainbow;
pub mod twinkle;

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use lightfx_controller::{LightUpdate, Rgb};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{FxError, Result};
use crate::palette::PaletteStore;
use crate::registry::LightSequence;

pub use color_wipe::ColorWipe;
pub use rainbow::Rainbow;
pub use twinkle::Twinkle;

pub const SPEED_MIN: i32 = 1;
pub const SPEED_MAX: i32 = 100;
pub const INTENSITY_MIN: i32 = 1;
pub const INTENSITY_MAX: i32 = 100;

// ── Config ───────────────────────────────────────────────────────────

/// Per-invocation effect settings.
///
/// Out-of-range `speed` / `intensity` are accepted and clamped to 1-100
/// when used. Either may be given as any JSON/TOML number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectConfig {
    #[serde(deserialize_with = "deserialize_level")]
    pub speed: i32,
    #[serde(deserialize_with = "deserialize_level")]
    pub intensity: i32,
    pub palette_name: String,
    pub reverse: bool,
    pub mirror: bool,
}

impl Default for EffectConfig {
    fn default() -> Self {
        Self {
            speed: 50,
            intensity: 100,
            palette_name: "rainbow".to_string(),
            reverse: false,
            mirror: false,
        }
    }
}

impl EffectConfig {
    /// Copy with speed and intensity clamped into range
    pub fn clamped(&self) -> Self {
        Self {
            speed: self.speed.clamp(SPEED_MIN, SPEED_MAX),
            intensity: self.intensity.clamp(INTENSITY_MIN, INTENSITY_MAX),
            ..self.clone()
        }
    }

    /// Speed normalized so that 50 -> 1.0
    pub fn speed_factor(&self) -> f64 {
        f64::from(self.speed.clamp(SPEED_MIN, SPEED_MAX)) / 50.0
    }

    /// Intensity clamped to 1-100, as a percentage
    pub fn intensity_percent(&self) -> f64 {
        f64::from(self.intensity.clamp(INTENSITY_MIN, INTENSITY_MAX))
    }

    /// Intensity as a brightness multiplier in (0, 1]
    pub fn intensity_scale(&self) -> f64 {
        f64::from(self.intensity.clamp(INTENSITY_MIN, INTENSITY_MAX)) / 100.0
    }
}

/// Accept integer or float levels, saturating into `i32` (NaN becomes 0).
pub(crate) fn deserialize_level<'de, D>(d: D) -> std::result::Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(d)?;
    Ok(value as i32)
}

// ── Effect kinds ─────────────────────────────────────────────────────

/// Registered effect identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectKind {
    Rainbow,
    ColorWipe,
    Twinkle,
}

impl EffectKind {
    /// All registered effects
    pub const ALL: &'static [EffectKind] =
        &[EffectKind::Rainbow, EffectKind::ColorWipe, EffectKind::Twinkle];

    pub fn name(&self) -> &'static str {
        match self {
            EffectKind::Rainbow => "rainbow",
            EffectKind::ColorWipe => "color_wipe",
            EffectKind::Twinkle => "twinkle",
        }
    }

    /// Fresh effect instance with its own internal state
    pub fn create(self) -> Box<dyn Effect> {
        match self {
            EffectKind::Rainbow => Box::new(Rainbow),
            EffectKind::ColorWipe => Box::new(ColorWipe),
            EffectKind::Twinkle => Box::new(Twinkle::new()),
        }
    }
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EffectKind {
    type Err = FxError;

    fn from_str(s: &str) -> Result<Self> {
        EffectKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| FxError::EffectNotFound(s.to_string()))
    }
}

// ── Frames ───────────────────────────────────────────────────────────

/// One set of per-light updates, in sequence order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    updates: Vec<(String, LightUpdate)>,
}

impl Frame {
    /// Pair positional updates with the sequence's light ids.
    ///
    /// With `mirror`, light `N-1-i` receives light `i`'s update for every
    /// `i >= N/2`.
    pub fn from_positions(
        sequence: &LightSequence,
        mut updates: Vec<LightUpdate>,
        mirror: bool,
    ) -> Self {
        let n = updates.len();
        if mirror {
            for i in n / 2..n {
                updates[n - 1 - i] = updates[i];
            }
        }
        Self {
            updates: sequence
                .light_ids()
                .iter()
                .cloned()
                .zip(updates)
                .collect(),
        }
    }

    pub fn get(&self, light: &str) -> Option<&LightUpdate> {
        self.updates
            .iter()
            .find(|(id, _)| id == light)
            .map(|(_, update)| update)
    }

    /// RGB of the light at `position` in sequence order
    pub fn rgb_at(&self, position: usize) -> Option<Rgb> {
        self.updates.get(position).and_then(|(_, u)| u.rgb)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &LightUpdate)> {
        self.updates.iter().map(|(id, u)| (id.as_str(), u))
    }

    pub fn len(&self) -> usize {
        self.updates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }
}

impl IntoIterator for Frame {
    type Item = (String, LightUpdate);
    type IntoIter = std::vec::IntoIter<(String, LightUpdate)>;

    fn into_iter(self) -> Self::IntoIter {
        self.updates.into_iter()
    }
}

/// Everything a generator may read while rendering one frame
pub struct FrameContext<'a> {
    pub sequence: &'a LightSequence,
    pub config: &'a EffectConfig,
    pub palettes: &'a PaletteStore,
    /// Time since this effect instance started
    pub elapsed: Duration,
}

/// A frame generator
pub trait Effect: Send {
    fn kind(&self) -> EffectKind;

    /// Compute the next frame
    fn render(&mut self, ctx: &FrameContext<'_>) -> Result<Frame>;
}

/// Update that drives a light dark (all channels zero)
pub(crate) fn off_update() -> LightUpdate {
    LightUpdate::rgb(Rgb::BLACK)
}
