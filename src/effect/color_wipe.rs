//! Lights fill in one at a time, then the whole sequence clears

use super::{off_update, Effect, EffectKind, Frame, FrameContext};
use crate::error::Result;
use lightfx_controller::LightUpdate;

#[derive(Debug, Clone, Copy, Default)]
pub struct ColorWipe;

impl ColorWipe {
    /// Number of lit lights after `elapsed_secs`; cycles through 0..=count.
    /// Two lights per second at speed 50.
    pub fn active_count(count: usize, elapsed_secs: f64, speed_factor: f64) -> usize {
        let steps = (elapsed_secs * speed_factor * 2.0).floor() as u64;
        (steps % (count as u64 + 1)) as usize
    }
}

impl Effect for ColorWipe {
    fn kind(&self) -> EffectKind {
        EffectKind::ColorWipe
    }

    fn render(&mut self, ctx: &FrameContext<'_>) -> Result<Frame> {
        let palette = ctx.palettes.get(&ctx.config.palette_name)?;
        let n = ctx.sequence.len();
        let active = Self::active_count(n, ctx.elapsed.as_secs_f64(), ctx.config.speed_factor());
        let intensity = ctx.config.intensity_percent();

        let updates = (0..n)
            .map(|slot| {
                let i = if ctx.config.reverse { n - 1 - slot } else { slot };
                if i < active {
                    let color = palette.color_at(i as f64 / n as f64 * 100.0)?;
                    Ok(LightUpdate::rgb(color.to_rgb8_percent(intensity)))
                } else {
                    Ok(off_update())
                }
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Frame::from_positions(ctx.sequence, updates, false))
    }
}
