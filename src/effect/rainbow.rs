//! Palette scrolling along the sequence

use lightfx_controller::LightUpdate;

use super::{Effect, EffectKind, Frame, FrameContext};
use crate::error::Result;

/// Positions advance 20 palette units per second at speed 50
const SCROLL_RATE: f64 = 20.0;

/// Each light samples the palette at its share of the strip, offset by time.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rainbow;

impl Rainbow {
    /// Palette position of light `index` of `count` after `elapsed_secs`
    pub fn position(index: usize, count: usize, elapsed_secs: f64, speed_factor: f64) -> f64 {
        let base = index as f64 / count as f64 * 100.0;
        (base + elapsed_secs * speed_factor * SCROLL_RATE).rem_euclid(100.0)
    }
}

impl Effect for Rainbow {
    fn kind(&self) -> EffectKind {
        EffectKind::Rainbow
    }

    fn render(&mut self, ctx: &FrameContext<'_>) -> Result<Frame> {
        let palette = ctx.palettes.get(&ctx.config.palette_name)?;
        let n = ctx.sequence.len();
        let elapsed = ctx.elapsed.as_secs_f64();
        let speed = ctx.config.speed_factor();
        let intensity = ctx.config.intensity_percent();

        let updates = (0..n)
            .map(|i| {
                let mut position = Self::position(i, n, elapsed, speed);
                if ctx.config.reverse {
                    position = 100.0 - position;
                }
                let color = palette.color_at(position)?;
                Ok(LightUpdate::rgb(color.to_rgb8_percent(intensity)))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Frame::from_positions(ctx.sequence, updates, ctx.config.mirror))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::test_util::{render, sequence};
    use crate::effect::EffectConfig;
    use crate::error::FxError;
    use crate::palette::PaletteStore;
    use lightfx_controller::Rgb;

    fn expected(position: f64, intensity: f64) -> Rgb {
        PaletteStore::with_builtins()
            .color_at("rainbow", position)
            .unwrap()
            .to_rgb8_percent(intensity)
    }

    #[test]
    fn test_four_lights_at_start() {
        let seq = sequence(4);
        let frame = render(&mut Rainbow, &seq, &EffectConfig::default(), 0.0);

        assert_eq!(frame.rgb_at(0), Some(Rgb::new(255, 0, 0)));
        assert_eq!(frame.rgb_at(1), Some(expected(25.0, 100.0)));
        assert_eq!(frame.rgb_at(2), Some(Rgb::new(0, 128, 0)));
        assert_eq!(frame.rgb_at(3), Some(expected(75.0, 100.0)));
    }

    #[test]
    fn test_scrolls_with_time_and_speed() {
        assert_eq!(Rainbow::position(0, 4, 1.0, 1.0), 20.0);
        assert_eq!(Rainbow::position(3, 4, 1.0, 1.0), 95.0);
        // wraps past 100
        assert!((Rainbow::position(3, 4, 1.0, 2.0) - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_reverse_flips_position() {
        let seq = sequence(4);
        let config = EffectConfig {
            reverse: true,
            ..Default::default()
        };
        let frame = render(&mut Rainbow, &seq, &config, 0.0);
        // 100 - 0 -> violet end stop
        assert_eq!(frame.rgb_at(0), Some(Rgb::new(0xEE, 0x82, 0xEE)));
        assert_eq!(frame.rgb_at(1), Some(expected(75.0, 100.0)));
    }

    #[test]
    fn test_intensity_truncates() {
        let seq = sequence(4);
        let config = EffectConfig {
            intensity: 50,
            ..Default::default()
        };
        let frame = render(&mut Rainbow, &seq, &config, 0.0);
        // 255 * 0.5 = 127.5, 128 * 0.5 = 64
        assert_eq!(frame.rgb_at(0), Some(Rgb::new(127, 0, 0)));
        assert_eq!(frame.rgb_at(2), Some(Rgb::new(0, 64, 0)));
    }

    #[test]
    fn test_intensity_applies_before_truncation() {
        let seq = sequence(4);
        let config = EffectConfig {
            intensity: 29,
            ..Default::default()
        };
        let frame = render(&mut Rainbow, &seq, &config, 0.0);
        // 255 * 29 / 100 = 73.95, 128 * 29 / 100 = 37.12
        assert_eq!(frame.rgb_at(0), Some(Rgb::new(73, 0, 0)));
        assert_eq!(frame.rgb_at(2), Some(Rgb::new(0, 37, 0)));
    }

    #[test]
    fn test_mirror_is_symmetric() {
        let seq = sequence(6);
        let config = EffectConfig {
            mirror: true,
            ..Default::default()
        };
        let frame = render(&mut Rainbow, &seq, &config, 0.3);
        for i in 0..3 {
            assert_eq!(frame.rgb_at(i), frame.rgb_at(5 - i));
        }
    }

    #[test]
    fn test_unknown_palette() {
        let seq = sequence(2);
        let config = EffectConfig {
            palette_name: "nope".into(),
            ..Default::default()
        };
        let palettes = PaletteStore::with_builtins();
        let ctx = FrameContext {
            sequence: &seq,
            config: &config,
            palettes: &palettes,
            elapsed: std::time::Duration::ZERO,
        };
        assert!(matches!(
            Rainbow.render(&ctx),
            Err(FxError::PaletteNotFound(_))
        ));
    }
}
