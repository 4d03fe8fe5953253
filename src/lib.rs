//! Palette-driven lighting effects for groups of addressable lights.
//!
//! ```text
//! EffectEngine tick ──► Effect::render (reads PaletteStore)
//!                   ──► Frame ──► LightRegistry (write gate) ──► Controller
//! ```
//!
//! The controller client lives in the `lightfx-controller` crate; this crate
//! holds the palette math, the registry, the effects and the scheduler.

pub mod color;
pub mod config;
pub mod dispatch;
pub mod effect;
pub mod engine;
pub mod error;
pub mod palette;
pub mod registry;

pub use dispatch::{Dispatcher, EffectRequest};
pub use effect::{Effect, EffectConfig, EffectKind, Frame};
pub use engine::{EffectEngine, RunningInfo};
pub use error::{ErrorKind, FxError, Result};
pub use palette::{Palette, PaletteKind, PaletteStore};
pub use registry::{LightRegistry, LightSequence};
