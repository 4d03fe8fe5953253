//! Application configuration
//!
//! Loaded from TOML (`~/.config/light-fx/config.toml`), or from JSON when the
//! path ends in `.json` so an add-on `options.json` can be used directly.
//! Palette colors accept `#RRGGBB` or CSS names.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use lightfx_controller::HomeAssistantConfig;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::color::Color;
use crate::dispatch::EffectRequest;
use crate::effect::EffectConfig;
use crate::palette::{ColorStop, Palette, PaletteKind, PaletteStore};

// ---------------------------------------------------------------------------
// Custom serde for Color: "#RRGGBB" or a CSS name
// ---------------------------------------------------------------------------

fn serialize_color<S: Serializer>(color: &Color, s: S) -> Result<S::Ok, S::Error> {
    let rgb = color.to_rgb8(1.0);
    s.serialize_str(&format!("#{:02X}{:02X}{:02X}", rgb.r, rgb.g, rgb.b))
}

fn deserialize_color<'de, D: Deserializer<'de>>(d: D) -> Result<Color, D::Error> {
    let name = String::deserialize(d)?;
    Color::parse(&name)
        .ok_or_else(|| serde::de::Error::custom(format!("unknown color: \"{name}\"")))
}

/// Lighting controller connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerSection {
    /// Falls back to `$SUPERVISOR_HOST`, then `supervisor`
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Falls back to `$SUPERVISOR_TOKEN`
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_port() -> u16 {
    8123
}
fn default_timeout_ms() -> u64 {
    10_000
}

impl Default for ControllerSection {
    fn default() -> Self {
        Self {
            host: None,
            port: default_port(),
            token: None,
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl ControllerSection {
    /// Resolve against the process environment
    pub fn resolve(&self) -> anyhow::Result<HomeAssistantConfig> {
        self.resolve_with(|key| std::env::var(key).ok())
    }

    /// Resolve with an explicit environment lookup
    pub fn resolve_with(
        &self,
        env: impl Fn(&str) -> Option<String>,
    ) -> anyhow::Result<HomeAssistantConfig> {
        let host = self
            .host
            .clone()
            .or_else(|| env("SUPERVISOR_HOST"))
            .unwrap_or_else(|| "supervisor".to_string());
        let token = self
            .token
            .clone()
            .or_else(|| env("SUPERVISOR_TOKEN"))
            .context("no controller token: set controller.token or SUPERVISOR_TOKEN")?;
        Ok(HomeAssistantConfig {
            host,
            port: self.port,
            token,
            timeout: Duration::from_millis(self.timeout_ms),
        })
    }
}

/// Scheduler timing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSection {
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,
    /// Settle time between a light command and the state re-fetch
    #[serde(default)]
    pub refresh_delay_ms: u64,
}

fn default_frame_interval_ms() -> u64 {
    50
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            frame_interval_ms: default_frame_interval_ms(),
            refresh_delay_ms: 0,
        }
    }
}

impl EngineSection {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms.max(1))
    }

    pub fn refresh_delay(&self) -> Duration {
        Duration::from_millis(self.refresh_delay_ms)
    }
}

/// A sequence created at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceConfig {
    pub name: String,
    pub lights: Vec<String>,
    /// Effect started right after the sequence is created
    #[serde(default)]
    pub default_effect: Option<String>,
    #[serde(
        default = "default_speed",
        deserialize_with = "crate::effect::deserialize_level"
    )]
    pub default_speed: i32,
    #[serde(default = "default_palette")]
    pub default_palette: String,
}

fn default_speed() -> i32 {
    50
}
fn default_palette() -> String {
    "rainbow".to_string()
}

impl SequenceConfig {
    /// Start request for the configured default effect, if any
    pub fn default_request(&self) -> Option<EffectRequest> {
        self.default_effect
            .as_ref()
            .map(|effect| EffectRequest::StartEffect {
                sequence: self.name.clone(),
                effect: effect.clone(),
                config: EffectConfig {
                    speed: self.default_speed,
                    palette_name: self.default_palette.clone(),
                    ..Default::default()
                },
            })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopConfig {
    #[serde(
        serialize_with = "serialize_color",
        deserialize_with = "deserialize_color"
    )]
    pub color: Color,
    pub position: f64,
}

/// A user palette registered after the builtins
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaletteConfig {
    pub name: String,
    #[serde(default = "default_kind")]
    pub kind: PaletteKind,
    #[serde(default)]
    pub stops: Vec<StopConfig>,
    #[serde(default)]
    pub variation: Option<f64>,
}

fn default_kind() -> PaletteKind {
    PaletteKind::Gradient
}

impl PaletteConfig {
    pub fn to_palette(&self) -> anyhow::Result<Palette> {
        if let Some(stop) = self.stops.iter().find(|s| !s.position.is_finite()) {
            anyhow::bail!("stop position must be finite, got {}", stop.position);
        }
        let stops = self
            .stops
            .iter()
            .map(|s| ColorStop::new(s.color, s.position))
            .collect();
        let palette = Palette::new(self.name.clone(), self.kind, stops);
        match self.variation {
            Some(v) if !v.is_finite() => anyhow::bail!("variation must be finite, got {v}"),
            Some(v) => Ok(palette.with_variation(v)),
            None => Ok(palette),
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub controller: ControllerSection,
    #[serde(default)]
    pub engine: EngineSection,
    /// Event type carrying start/stop requests
    #[serde(default = "default_event_type")]
    pub event_type: String,
    #[serde(default)]
    pub sequences: Vec<SequenceConfig>,
    #[serde(default)]
    pub palettes: Vec<PaletteConfig>,
}

fn default_event_type() -> String {
    "light_fx_service_call".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            controller: ControllerSection::default(),
            engine: EngineSection::default(),
            event_type: default_event_type(),
            sequences: Vec::new(),
            palettes: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Get the default config file path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("light-fx")
            .join("config.toml")
    }

    /// Load config from a file, or return default if not found
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("read {}", path.display()))?;
        let is_json = path.extension().is_some_and(|ext| ext == "json");
        let config = if is_json {
            serde_json::from_str(&content).with_context(|| format!("parse {}", path.display()))?
        } else {
            toml::from_str(&content).with_context(|| format!("parse {}", path.display()))?
        };
        Ok(config)
    }

    /// Builtin palettes plus the configured ones
    pub fn build_palettes(&self) -> anyhow::Result<PaletteStore> {
        let mut store = PaletteStore::with_builtins();
        for palette in &self.palettes {
            let built = palette
                .to_palette()
                .with_context(|| format!("palette {}", palette.name))?;
            store
                .register(built)
                .with_context(|| format!("palette {}", palette.name))?;
        }
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r##"
event_type = "custom_fx"

[controller]
host = "ha.local"
token = "abc"

[engine]
frame_interval_ms = 40

[[sequences]]
name = "porch"
lights = ["light.a", "light.b"]
default_effect = "rainbow"
default_speed = 70

[[sequences]]
name = "hall"
lights = ["light.c"]

[[palettes]]
name = "ocean"
kind = "gradient"
stops = [
    { color = "#0000FF", position = 0 },
    { color = "cyan", position = 100 },
]
"##;

    #[test]
    fn test_parse_toml() {
        let config: AppConfig = toml::from_str(SAMPLE).unwrap();
        assert_eq!(config.event_type, "custom_fx");
        assert_eq!(config.controller.port, 8123);
        assert_eq!(config.engine.frame_interval(), Duration::from_millis(40));
        assert_eq!(config.engine.refresh_delay(), Duration::ZERO);
        assert_eq!(config.sequences.len(), 2);
        assert_eq!(config.sequences[1].default_palette, "rainbow");
        assert_eq!(config.palettes[0].stops[1].color, Color::new(0.0, 1.0, 1.0));
    }

    #[test]
    fn test_defaults_when_empty() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.event_type, "light_fx_service_call");
        assert_eq!(config.engine.frame_interval_ms, 50);
        assert_eq!(config.controller.timeout_ms, 10_000);
        assert!(config.sequences.is_empty());
    }

    #[test]
    fn test_parse_options_json() {
        let json = r#"{
            "sequences": [
                { "name": "tree", "lights": ["light.x"], "default_effect": "twinkle",
                  "default_palette": "fire" }
            ]
        }"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        let Some(EffectRequest::StartEffect { effect, config, .. }) =
            config.sequences[0].default_request()
        else {
            panic!("expected a default start request");
        };
        assert_eq!(effect, "twinkle");
        assert_eq!(config.palette_name, "fire");
        assert_eq!(config.speed, 50);
    }

    #[test]
    fn test_default_request() {
        let config: AppConfig = toml::from_str(SAMPLE).unwrap();
        let request = config.sequences[0].default_request().unwrap();
        assert!(matches!(
            request,
            EffectRequest::StartEffect { ref config, .. } if config.speed == 70
        ));
        assert!(config.sequences[1].default_request().is_none());
    }

    #[test]
    fn test_bad_color_rejected() {
        let bad = r#"
[[palettes]]
name = "x"
stops = [{ color = "blurple", position = 0 }]
"#;
        let err = toml::from_str::<AppConfig>(bad).unwrap_err();
        assert!(err.to_string().contains("blurple"));
    }

    #[test]
    fn test_build_palettes_rejects_duplicate() {
        let config: AppConfig = toml::from_str(SAMPLE).unwrap();
        let store = config.build_palettes().unwrap();
        assert!(store.contains("ocean") && store.contains("rainbow"));

        let dup: AppConfig = toml::from_str(
            r##"
[[palettes]]
name = "fire"
stops = [{ color = "#FF0000", position = 0 }]
"##,
        )
        .unwrap();
        assert!(dup.build_palettes().is_err());
    }

    #[test]
    fn test_non_finite_variation_rejected() {
        let config: AppConfig = toml::from_str(
            r##"
[[palettes]]
name = "embers"
kind = "dynamic"
variation = inf
stops = [{ color = "#FF0000", position = 0 }]
"##,
        )
        .unwrap();
        let err = config.build_palettes().unwrap_err();
        assert!(format!("{err:#}").contains("variation must be finite"), "{err:#}");

        let config: AppConfig = toml::from_str(
            r##"
[[palettes]]
name = "embers"
kind = "dynamic"
variation = 15.0
stops = [{ color = "#FF0000", position = nan }]
"##,
        )
        .unwrap();
        assert!(config.build_palettes().is_err());
    }

    #[test]
    fn test_non_ascii_hex_color_rejected() {
        let bad = r##"
[[palettes]]
name = "x"
stops = [{ color = "#aébcd", position = 0 }]
"##;
        let err = toml::from_str::<AppConfig>(bad).unwrap_err();
        assert!(err.to_string().contains("unknown color"), "{err}");
    }

    #[test]
    fn test_resolve_env_fallbacks() {
        let section = ControllerSection::default();
        let env = |key: &str| match key {
            "SUPERVISOR_TOKEN" => Some("from-env".to_string()),
            _ => None,
        };
        let resolved = section.resolve_with(env).unwrap();
        assert_eq!(resolved.host, "supervisor");
        assert_eq!(resolved.token, "from-env");
        assert_eq!(resolved.timeout, Duration::from_secs(10));

        assert!(section.resolve_with(|_| None).is_err());

        let config: AppConfig = toml::from_str(SAMPLE).unwrap();
        let resolved = config.controller.resolve_with(|_| None).unwrap();
        assert_eq!((resolved.host.as_str(), resolved.token.as_str()), ("ha.local", "abc"));
    }

    #[test]
    fn test_load_missing_file_is_default() {
        let config = AppConfig::load(Path::new("/nonexistent/light-fx.toml")).unwrap();
        assert!(config.palettes.is_empty());
    }
}
