//! Light data types shared between the controller client and the effect engine

use serde::{Deserialize, Serialize};

/// 8-bit RGB color, serialized as `[r, g, b]`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[u8; 3]", into = "[u8; 3]")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const BLACK: Self = Self::new(0, 0, 0);
    pub const WHITE: Self = Self::new(255, 255, 255);

    /// Whether every channel is zero
    pub fn is_black(&self) -> bool {
        *self == Self::BLACK
    }
}

impl From<[u8; 3]> for Rgb {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self { r, g, b }
    }
}

impl From<Rgb> for [u8; 3] {
    fn from(c: Rgb) -> Self {
        [c.r, c.g, c.b]
    }
}

/// RGB plus a single white channel, serialized as `[r, g, b, w]`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[u8; 4]", into = "[u8; 4]")]
pub struct Rgbw {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub w: u8,
}

impl From<[u8; 4]> for Rgbw {
    fn from([r, g, b, w]: [u8; 4]) -> Self {
        Self { r, g, b, w }
    }
}

impl From<Rgbw> for [u8; 4] {
    fn from(c: Rgbw) -> Self {
        [c.r, c.g, c.b, c.w]
    }
}

/// RGB plus cold and warm white channels, serialized as `[r, g, b, cw, ww]`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[u8; 5]", into = "[u8; 5]")]
pub struct Rgbww {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub cold_white: u8,
    pub warm_white: u8,
}

impl From<[u8; 5]> for Rgbww {
    fn from([r, g, b, cold_white, warm_white]: [u8; 5]) -> Self {
        Self {
            r,
            g,
            b,
            cold_white,
            warm_white,
        }
    }
}

impl From<Rgbww> for [u8; 5] {
    fn from(c: Rgbww) -> Self {
        [c.r, c.g, c.b, c.cold_white, c.warm_white]
    }
}

/// What a light can do, fetched once when it joins a sequence
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LightCapabilities {
    pub supports_rgb: bool,
    pub supports_rgbw: bool,
    pub supports_rgbww: bool,
    pub supports_color_temp: bool,
    /// Supported color temperature range in mireds (min, max)
    pub mireds: Option<(u16, u16)>,
    pub supports_transition: bool,
    pub supports_brightness: bool,
}

/// Last observed color representation of a light
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightColor {
    Rgb(Rgb),
    Rgbw(Rgbw),
    Rgbww(Rgbww),
    /// Color temperature in mireds
    ColorTemp(u16),
}

/// Last observed state of a light
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LightState {
    pub on: bool,
    pub color: Option<LightColor>,
    pub brightness: Option<u8>,
}

/// Closed set of fields a `turn_on` command may carry.
///
/// Absent fields are left untouched by the controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LightUpdate {
    #[serde(rename = "rgb_color", skip_serializing_if = "Option::is_none")]
    pub rgb: Option<Rgb>,
    #[serde(rename = "rgbw_color", skip_serializing_if = "Option::is_none")]
    pub rgbw: Option<Rgbw>,
    #[serde(rename = "rgbww_color", skip_serializing_if = "Option::is_none")]
    pub rgbww: Option<Rgbww>,
    /// Color temperature in mireds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_temp: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brightness: Option<u8>,
    /// Transition time in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transition: Option<f32>,
}

impl LightUpdate {
    /// Update carrying only an RGB color
    pub fn rgb(color: Rgb) -> Self {
        Self {
            rgb: Some(color),
            ..Default::default()
        }
    }
}

/// Command issued to a single light
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightCommand {
    TurnOn(LightUpdate),
    TurnOff,
}

impl LightCommand {
    /// Service name within the `light` domain
    pub fn action(&self) -> &'static str {
        match self {
            LightCommand::TurnOn(_) => "turn_on",
            LightCommand::TurnOff => "turn_off",
        }
    }
}
