//! Color math: unit-float RGB, HSV conversion, white-channel extraction

use lightfx_controller::{Rgb, Rgbw, Rgbww};

/// Color temperature at or above which all white goes to the cold channel
pub const COLD_WHITE_KELVIN: u32 = 6500;
/// Color temperature at or below which all white goes to the warm channel
pub const WARM_WHITE_KELVIN: u32 = 2700;

/// RGB color with channels in [0, 1]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

/// HSV triple; hue is measured in turns, so all components lie in [0, 1]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Hsv {
    pub h: f64,
    pub s: f64,
    pub v: f64,
}

impl Color {
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::new(
            f64::from(r) / 255.0,
            f64::from(g) / 255.0,
            f64::from(b) / 255.0,
        )
    }

    /// Parse a color string: "#RRGGBB", "red", "indigo", etc.
    pub fn parse(s: &str) -> Option<Self> {
        if let Some(hex) = s.strip_prefix('#') {
            if hex.len() == 6 && hex.is_ascii() {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                return Some(Self::from_rgb8(r, g, b));
            }
            return None;
        }
        let (r, g, b) = match s.to_ascii_lowercase().as_str() {
            "black" => (0x00, 0x00, 0x00),
            "white" => (0xFF, 0xFF, 0xFF),
            "red" => (0xFF, 0x00, 0x00),
            "orange" => (0xFF, 0xA5, 0x00),
            "yellow" => (0xFF, 0xFF, 0x00),
            "lime" => (0x00, 0xFF, 0x00),
            "green" => (0x00, 0x80, 0x00),
            "cyan" | "aqua" => (0x00, 0xFF, 0xFF),
            "blue" => (0x00, 0x00, 0xFF),
            "indigo" => (0x4B, 0x00, 0x82),
            "violet" => (0xEE, 0x82, 0xEE),
            "magenta" | "fuchsia" => (0xFF, 0x00, 0xFF),
            "purple" => (0x80, 0x00, 0x80),
            "pink" => (0xFF, 0xC0, 0xCB),
            _ => return None,
        };
        Some(Self::from_rgb8(r, g, b))
    }

    pub fn to_hsv(self) -> Hsv {
        let max = self.r.max(self.g).max(self.b);
        let min = self.r.min(self.g).min(self.b);
        let v = max;
        if max == min {
            return Hsv { h: 0.0, s: 0.0, v };
        }
        let delta = max - min;
        let s = delta / max;
        let rc = (max - self.r) / delta;
        let gc = (max - self.g) / delta;
        let bc = (max - self.b) / delta;
        let h = if self.r == max {
            bc - gc
        } else if self.g == max {
            2.0 + rc - bc
        } else {
            4.0 + gc - rc
        };
        Hsv {
            h: (h / 6.0).rem_euclid(1.0),
            s,
            v,
        }
    }

    pub fn from_hsv(hsv: Hsv) -> Self {
        let Hsv { h, s, v } = hsv;
        if s == 0.0 {
            return Self::new(v, v, v);
        }
        let sector = (h * 6.0).floor();
        let f = h * 6.0 - sector;
        let p = v * (1.0 - s);
        let q = v * (1.0 - s * f);
        let t = v * (1.0 - s * (1.0 - f));
        match (sector as i64).rem_euclid(6) {
            0 => Self::new(v, t, p),
            1 => Self::new(q, v, p),
            2 => Self::new(p, v, t),
            3 => Self::new(p, q, v),
            4 => Self::new(t, p, v),
            _ => Self::new(v, p, q),
        }
    }

    /// Convert to 8-bit channels scaled by `factor`, truncating toward zero.
    pub fn to_rgb8(self, factor: f64) -> Rgb {
        let channel = |c: f64| (c * 255.0 * factor).clamp(0.0, 255.0) as u8;
        Rgb::new(channel(self.r), channel(self.g), channel(self.b))
    }

    /// Convert to 8-bit channels at `percent` brightness (0-100), computed
    /// as `c * 255 * percent / 100` and truncated.
    pub fn to_rgb8_percent(self, percent: f64) -> Rgb {
        let channel = |c: f64| (c * 255.0 * percent / 100.0).clamp(0.0, 255.0) as u8;
        Rgb::new(channel(self.r), channel(self.g), channel(self.b))
    }
}

/// Split an RGB color into RGB + white, using the common minimum as white.
pub fn rgb_to_rgbw(rgb: Rgb) -> Rgbw {
    let w = rgb.r.min(rgb.g).min(rgb.b);
    Rgbw {
        r: rgb.r - w,
        g: rgb.g - w,
        b: rgb.b - w,
        w,
    }
}

/// Split an RGB color into RGB + cold white + warm white.
///
/// The white component is distributed by color temperature: all cold at or
/// above 6500K, all warm at or below 2700K, linear in between.
pub fn rgb_to_rgbww(rgb: Rgb, kelvin: u32) -> Rgbww {
    let w = rgb.r.min(rgb.g).min(rgb.b);
    let (cold_white, warm_white) = if kelvin >= COLD_WHITE_KELVIN {
        (w, 0)
    } else if kelvin <= WARM_WHITE_KELVIN {
        (0, w)
    } else {
        let ratio = f64::from(kelvin - WARM_WHITE_KELVIN)
            / f64::from(COLD_WHITE_KELVIN - WARM_WHITE_KELVIN);
        let cold = (f64::from(w) * ratio) as u8;
        (cold, w - cold)
    };
    Rgbww {
        r: rgb.r - w,
        g: rgb.g - w,
        b: rgb.b - w,
        cold_white,
        warm_white,
    }
}

/// Convert mireds to kelvin
pub fn mireds_to_kelvin(mireds: u16) -> u32 {
    if mireds == 0 {
        return COLD_WHITE_KELVIN;
    }
    1_000_000 / u32::from(mireds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(Color::parse("#FF0000"), Some(Color::new(1.0, 0.0, 0.0)));
        assert_eq!(Color::parse("Red"), Some(Color::new(1.0, 0.0, 0.0)));
        assert_eq!(Color::parse("green").unwrap().to_rgb8(1.0), Rgb::new(0, 128, 0));
        assert_eq!(Color::parse("#12345"), None);
        assert_eq!(Color::parse("unknown"), None);
        // six bytes, but not six hex digits
        assert_eq!(Color::parse("#aébcd"), None);
        assert_eq!(Color::parse("#ééé"), None);
    }

    #[test]
    fn test_hsv_primaries() {
        let red = Color::new(1.0, 0.0, 0.0).to_hsv();
        assert_eq!(red, Hsv { h: 0.0, s: 1.0, v: 1.0 });

        let blue = Color::new(0.0, 0.0, 1.0).to_hsv();
        assert!((blue.h - 2.0 / 3.0).abs() < 1e-12);

        let gray = Color::new(0.5, 0.5, 0.5).to_hsv();
        assert_eq!(gray, Hsv { h: 0.0, s: 0.0, v: 0.5 });
    }

    #[test]
    fn test_hsv_roundtrip_is_close() {
        for c in [
            Color::from_rgb8(255, 165, 0),
            Color::from_rgb8(75, 0, 130),
            Color::from_rgb8(238, 130, 238),
        ] {
            let back = Color::from_hsv(c.to_hsv());
            assert!((back.r - c.r).abs() < 1e-9);
            assert!((back.g - c.g).abs() < 1e-9);
            assert!((back.b - c.b).abs() < 1e-9);
        }
    }

    #[test]
    fn test_to_rgb8_truncates() {
        let c = Color::from_rgb8(255, 128, 1);
        assert_eq!(c.to_rgb8(1.0), Rgb::new(255, 128, 1));
        // 128 * 0.5 = 64, 1 * 0.5 = 0.5 -> 0
        assert_eq!(c.to_rgb8(0.5), Rgb::new(127, 64, 0));
    }

    #[test]
    fn test_to_rgb8_percent_scales_before_dividing() {
        let c = Color::from_rgb8(100, 255, 0);
        assert_eq!(c.to_rgb8_percent(29.0), Rgb::new(29, 73, 0));
        assert_eq!(c.to_rgb8_percent(100.0), Rgb::new(100, 255, 0));
        assert_eq!(Color::from_rgb8(255, 0, 0).to_rgb8_percent(50.0).r, 127);
    }

    #[test]
    fn test_rgb_to_rgbw() {
        let rgbw = rgb_to_rgbw(Rgb::new(200, 150, 50));
        assert_eq!(rgbw, Rgbw { r: 150, g: 100, b: 0, w: 50 });
        assert_eq!(rgb_to_rgbw(Rgb::new(255, 0, 10)).w, 0);
    }

    #[test]
    fn test_rgb_to_rgbww_split() {
        let rgb = Rgb::new(200, 150, 100);
        let cold = rgb_to_rgbww(rgb, 6500);
        assert_eq!((cold.cold_white, cold.warm_white), (100, 0));
        let warm = rgb_to_rgbww(rgb, 2000);
        assert_eq!((warm.cold_white, warm.warm_white), (0, 100));
        // halfway: 4600K -> ratio 0.5
        let mid = rgb_to_rgbww(rgb, 4600);
        assert_eq!((mid.cold_white, mid.warm_white), (50, 50));
        assert_eq!((mid.r, mid.g, mid.b), (100, 50, 0));
    }

    #[test]
    fn test_mireds_to_kelvin() {
        assert_eq!(mireds_to_kelvin(153), 6535);
        assert_eq!(mireds_to_kelvin(500), 2000);
    }
}
