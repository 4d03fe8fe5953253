//! Random lights ignite at full brightness and fade out.
//!
//! Fade levels persist across frames for the lifetime of one instance; a
//! restarted effect begins dark again.

use std::collections::HashMap;

use lightfx_controller::LightUpdate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{off_update, Effect, EffectKind, Frame, FrameContext};
use crate::error::Result;
use crate::palette::{Palette, PaletteKind};

/// Ignition probability and per-tick decay at speed 50
const BASE_RATE: f64 = 0.1;

#[derive(Debug, Clone, Copy, Default)]
struct Spark {
    /// 0 = dark, 1 = just ignited
    level: f64,
    /// Palette position chosen at ignition
    anchor: f64,
}

pub struct Twinkle {
    rng: StdRng,
    sparks: HashMap<String, Spark>,
}

impl Twinkle {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    /// Deterministic instance for tests and previews
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            rng,
            sparks: HashMap::new(),
        }
    }

    /// Current fade level of a light (0 if never ignited)
    pub fn level(&self, light: &str) -> f64 {
        self.sparks.get(light).map_or(0.0, |s| s.level)
    }

    fn resample(&mut self, palette: &Palette, anchor: f64) -> f64 {
        match (palette.kind(), palette.variation()) {
            (PaletteKind::Dynamic, Some(v)) if v > 0.0 && v.is_finite() => {
                (anchor + self.rng.random_range(-v..=v)).clamp(0.0, 100.0)
            }
            _ => self.rng.random_range(0.0..=100.0),
        }
    }
}

impl Default for Twinkle {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for Twinkle {
    fn kind(&self) -> EffectKind {
        EffectKind::Twinkle
    }

    fn render(&mut self, ctx: &FrameContext<'_>) -> Result<Frame> {
        let palette = ctx.palettes.get(&ctx.config.palette_name)?;
        let rate = BASE_RATE * ctx.config.speed_factor();
        let scale = ctx.config.intensity_scale();

        let mut updates = Vec::with_capacity(ctx.sequence.len());
        for light in ctx.sequence.light_ids() {
            let mut spark = self.sparks.get(light).copied().unwrap_or_default();

            let position = if spark.level <= 0.0 {
                if self.rng.random::<f64>() < rate {
                    spark.level = 1.0;
                    spark.anchor = self.rng.random_range(0.0..=100.0);
                    Some(spark.anchor)
                } else {
                    None
                }
            } else {
                spark.level = (spark.level - rate).max(0.0);
                if spark.level > 0.0 {
                    Some(self.resample(palette, spark.anchor))
                } else {
                    None
                }
            };

            let update = match position {
                Some(position) => {
                    let color = palette.color_at(position)?;
                    LightUpdate::rgb(color.to_rgb8(spark.level * scale))
                }
                None => off_update(),
            };
            self.sparks.insert(light.clone(), spark);
            updates.push(update);
        }

        Ok(Frame::from_positions(ctx.sequence, updates, false))
    }
}
