//! Palette store: named color palettes sampled by position (0-100).
//!
//! Three palette kinds:
//!
//! - `static`   - nearest stop wins, no blending
//! - `gradient` - HSV interpolation between neighbouring stops
//! - `dynamic`  - gradient lookup plus a `variation` parameter that effects
//!   apply to the *query position* (palette data is never perturbed)

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::color::{Color, Hsv};
use crate::error::{FxError, Result};

/// How a palette turns a position into a color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaletteKind {
    Static,
    Gradient,
    Dynamic,
}

impl PaletteKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaletteKind::Static => "static",
            PaletteKind::Gradient => "gradient",
            PaletteKind::Dynamic => "dynamic",
        }
    }
}

/// A color pinned at a position in [0, 100]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStop {
    pub color: Color,
    pub position: f64,
}

impl ColorStop {
    pub fn new(color: Color, position: f64) -> Self {
        Self {
            color,
            position: position.clamp(0.0, 100.0),
        }
    }
}

/// A named, immutable set of color stops
#[derive(Debug, Clone)]
pub struct Palette {
    name: String,
    kind: PaletteKind,
    /// Insertion order (static lookup tie-breaks on this)
    stops: Vec<ColorStop>,
    /// Stable-sorted by position
    sorted: Vec<ColorStop>,
    variation: Option<f64>,
}

impl Palette {
    pub fn new(name: impl Into<String>, kind: PaletteKind, stops: Vec<ColorStop>) -> Self {
        let mut sorted = stops.clone();
        sorted.sort_by(|a, b| a.position.total_cmp(&b.position));
        Self {
            name: name.into(),
            kind,
            stops,
            sorted,
            variation: None,
        }
    }

    /// Attach a position variation amount (dynamic palettes).
    ///
    /// Non-finite amounts are ignored.
    pub fn with_variation(mut self, variation: f64) -> Self {
        self.variation = variation.is_finite().then(|| variation.abs());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> PaletteKind {
        self.kind
    }

    /// Stops in insertion order
    pub fn stops(&self) -> &[ColorStop] {
        &self.stops
    }

    pub fn variation(&self) -> Option<f64> {
        self.variation
    }

    /// Color at `position` (0-100).
    pub fn color_at(&self, position: f64) -> Result<Color> {
        match self.kind {
            PaletteKind::Static => self.nearest(position),
            PaletteKind::Gradient | PaletteKind::Dynamic => self.blend(position),
        }
    }

    fn nearest(&self, position: f64) -> Result<Color> {
        // min_by keeps the first of equally-near stops
        self.stops
            .iter()
            .min_by(|a, b| {
                (a.position - position)
                    .abs()
                    .total_cmp(&(b.position - position).abs())
            })
            .map(|stop| stop.color)
            .ok_or_else(|| FxError::InvalidPalette(self.name.clone()))
    }

    fn blend(&self, position: f64) -> Result<Color> {
        let (first, last) = match (self.sorted.first(), self.sorted.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(FxError::InvalidPalette(self.name.clone())),
        };

        for pair in self.sorted.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            if a.position <= position && position <= b.position {
                let range = b.position - a.position;
                if range == 0.0 {
                    return Ok(a.color);
                }
                let ratio = (position - a.position) / range;
                return Ok(interpolate(a.color, b.color, ratio));
            }
        }

        // Outside the stop range (or a single stop): clamp to the boundary
        if position > last.position {
            Ok(last.color)
        } else {
            Ok(first.color)
        }
    }
}

/// Interpolate between two colors in HSV space.
///
/// Ratio 0 and 1 return the endpoints unchanged.
pub fn interpolate(c1: Color, c2: Color, ratio: f64) -> Color {
    if ratio <= 0.0 {
        return c1;
    }
    if ratio >= 1.0 {
        return c2;
    }
    let a = c1.to_hsv();
    let b = c2.to_hsv();
    Color::from_hsv(Hsv {
        h: interpolate_hue(a.h, b.h, ratio),
        s: a.s + (b.s - a.s) * ratio,
        v: a.v + (b.v - a.v) * ratio,
    })
}

/// Interpolate hue (in turns) along the shorter arc; result in [0, 1).
pub fn interpolate_hue(h1: f64, h2: f64, ratio: f64) -> f64 {
    let diff = h2 - h1;
    let h2 = if diff > 0.5 {
        h2 - 1.0
    } else if diff < -0.5 {
        h2 + 1.0
    } else {
        h2
    };
    let h = (h1 + (h2 - h1) * ratio).rem_euclid(1.0);
    // rem_euclid can round up to exactly 1.0 for tiny negative inputs
    if h >= 1.0 {
        0.0
    } else {
        h
    }
}

/// Process-wide palette registry, built once at startup and then shared
/// read-only.
#[derive(Debug, Clone, Default)]
pub struct PaletteStore {
    palettes: BTreeMap<String, Arc<Palette>>,
}

impl PaletteStore {
    /// Empty store without builtins
    pub fn new() -> Self {
        Self::default()
    }

    /// Store holding the builtin `rainbow` and `fire` palettes
    pub fn with_builtins() -> Self {
        let mut store = Self::new();
        for palette in builtin_palettes() {
            store
                .palettes
                .insert(palette.name().to_string(), Arc::new(palette));
        }
        store
    }

    /// Register an additional palette. Names are unique.
    pub fn register(&mut self, palette: Palette) -> Result<()> {
        if self.palettes.contains_key(palette.name()) {
            return Err(FxError::PaletteExists(palette.name().to_string()));
        }
        self.palettes
            .insert(palette.name().to_string(), Arc::new(palette));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<&Palette> {
        self.palettes
            .get(name)
            .map(Arc::as_ref)
            .ok_or_else(|| FxError::PaletteNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.palettes.contains_key(name)
    }

    /// List all palette names
    pub fn names(&self) -> Vec<&str> {
        self.palettes.keys().map(|s| s.as_str()).collect()
    }

    /// Color at `position` (0-100) in the named palette
    pub fn color_at(&self, name: &str, position: f64) -> Result<Color> {
        self.get(name)?.color_at(position)
    }
}

fn builtin_palettes() -> Vec<Palette> {
    let stop = |hex: &str, position: f64| {
        ColorStop::new(Color::parse(hex).unwrap_or(Color::BLACK), position)
    };

    let rainbow = Palette::new(
        "rainbow",
        PaletteKind::Gradient,
        vec![
            stop("#FF0000", 0.0),
            stop("#FFA500", 16.6),
            stop("#FFFF00", 33.3),
            stop("#008000", 50.0),
            stop("#0000FF", 66.6),
            stop("#4B0082", 83.3),
            stop("#EE82EE", 100.0),
        ],
    );

    let fire = Palette::new(
        "fire",
        PaletteKind::Dynamic,
        vec![
            stop("#FF0000", 0.0),
            stop("#FF8800", 50.0),
            stop("#FFFF00", 100.0),
        ],
    )
    .with_variation(20.0);

    vec![rainbow, fire]
}
