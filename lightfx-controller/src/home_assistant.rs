//! Home Assistant REST client
//!
//! Reads entity state from `GET /api/states/<entity_id>` and issues
//! `POST /api/services/light/<action>` calls.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::ControllerError;
use crate::types::{LightCapabilities, LightColor, LightCommand, LightState, Rgb, Rgbw, Rgbww};
use crate::Controller;

/// `LightEntityFeature.TRANSITION` bit in `supported_features`
const FEATURE_TRANSITION: u64 = 32;

/// Connection settings for a Home Assistant instance
#[derive(Debug, Clone)]
pub struct HomeAssistantConfig {
    pub host: String,
    pub port: u16,
    pub token: String,
    pub timeout: Duration,
}

impl HomeAssistantConfig {
    /// REST API base, e.g. `http://supervisor:8123/api`
    pub fn api_url(&self) -> String {
        format!("http://{}:{}/api", self.host, self.port)
    }

    /// Websocket endpoint, e.g. `ws://supervisor:8123/api/websocket`
    pub fn websocket_url(&self) -> String {
        format!("ws://{}:{}/api/websocket", self.host, self.port)
    }
}

/// Raw entity state as returned by the REST API
#[derive(Debug, Deserialize)]
struct EntityState {
    state: String,
    #[serde(default)]
    attributes: Map<String, Value>,
}

/// REST implementation of [`Controller`]
pub struct HomeAssistantClient {
    http: reqwest::Client,
    api_url: String,
    token: String,
}

impl HomeAssistantClient {
    pub fn new(config: &HomeAssistantConfig) -> Result<Self, ControllerError> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            api_url: config.api_url(),
            token: config.token.clone(),
        })
    }

    async fn get_entity(&self, entity_id: &str) -> Result<EntityState, ControllerError> {
        let url = format!("{}/states/{entity_id}", self.api_url);
        let response = self.http.get(&url).bearer_auth(&self.token).send().await?;

        if !response.status().is_success() {
            let code = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ControllerError::Status { code, body });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl Controller for HomeAssistantClient {
    async fn fetch_state(&self, light_id: &str) -> Result<LightState, ControllerError> {
        let entity = self.get_entity(light_id).await?;
        Ok(parse_state(&entity.state, &entity.attributes))
    }

    async fn fetch_capabilities(
        &self,
        light_id: &str,
    ) -> Result<LightCapabilities, ControllerError> {
        let entity = self.get_entity(light_id).await?;
        Ok(parse_capabilities(&entity.attributes))
    }

    async fn send_command(
        &self,
        light_id: &str,
        command: &LightCommand,
    ) -> Result<(), ControllerError> {
        let url = format!("{}/services/light/{}", self.api_url, command.action());

        let mut body = match command {
            LightCommand::TurnOn(update) => match serde_json::to_value(update)? {
                Value::Object(map) => map,
                _ => Map::new(),
            },
            LightCommand::TurnOff => Map::new(),
        };
        body.insert("entity_id".to_string(), Value::from(light_id));

        debug!(light = light_id, action = command.action(), "service call");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let code = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ControllerError::Status { code, body });
        }
        Ok(())
    }
}

/// Decode on/off, color and brightness from an entity's attributes.
///
/// `color_mode` selects the representation when present; otherwise the
/// richest color attribute present wins.
fn parse_state(state: &str, attributes: &Map<String, Value>) -> LightState {
    let rgb = channels::<3>(attributes.get("rgb_color")).map(Rgb::from);
    let rgbw = channels::<4>(attributes.get("rgbw_color")).map(Rgbw::from);
    let rgbww = channels::<5>(attributes.get("rgbww_color")).map(Rgbww::from);
    let color_temp = attributes
        .get("color_temp")
        .and_then(Value::as_u64)
        .and_then(|v| u16::try_from(v).ok());

    let color = match attributes.get("color_mode").and_then(Value::as_str) {
        Some("rgb") => rgb.map(LightColor::Rgb),
        Some("rgbw") => rgbw.map(LightColor::Rgbw),
        Some("rgbww") => rgbww.map(LightColor::Rgbww),
        Some("color_temp") => color_temp.map(LightColor::ColorTemp),
        _ => None,
    }
    .or_else(|| rgbww.map(LightColor::Rgbww))
    .or_else(|| rgbw.map(LightColor::Rgbw))
    .or_else(|| rgb.map(LightColor::Rgb))
    .or_else(|| color_temp.map(LightColor::ColorTemp));

    LightState {
        on: state == "on",
        color,
        brightness: attributes
            .get("brightness")
            .and_then(Value::as_u64)
            .map(|b| b.min(255) as u8),
    }
}

/// Decode supported color modes and features from an entity's attributes.
fn parse_capabilities(attributes: &Map<String, Value>) -> LightCapabilities {
    let modes: Vec<&str> = attributes
        .get("supported_color_modes")
        .and_then(Value::as_array)
        .map(|modes| modes.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    let has = |mode: &str| modes.iter().any(|m| *m == mode);

    let mireds = |key: &str| {
        attributes
            .get(key)
            .and_then(Value::as_u64)
            .and_then(|v| u16::try_from(v).ok())
    };
    let supports_color_temp = has("color_temp");
    let mireds = match (mireds("min_mireds"), mireds("max_mireds")) {
        (Some(min), Some(max)) if supports_color_temp => Some((min, max)),
        _ => None,
    };

    let features = attributes
        .get("supported_features")
        .and_then(Value::as_u64)
        .unwrap_or(0);

    LightCapabilities {
        supports_rgb: has("rgb") || has("hs") || has("xy"),
        supports_rgbw: has("rgbw"),
        supports_rgbww: has("rgbww"),
        supports_color_temp,
        mireds,
        supports_transition: features & FEATURE_TRANSITION != 0
            || attributes.contains_key("transition"),
        supports_brightness: attributes.contains_key("brightness")
            || modes.iter().any(|m| *m != "onoff"),
    }
}

/// Read a fixed-size array of 8-bit channels from a JSON array
fn channels<const N: usize>(value: Option<&Value>) -> Option<[u8; N]> {
    let values = value?.as_array()?;
    if values.len() != N {
        return None;
    }
    let mut out = [0u8; N];
    for (slot, v) in out.iter_mut().zip(values) {
        // Some integrations report floats
        let n = v.as_u64().or_else(|| v.as_f64().map(|f| f as u64))?;
        *slot = n.min(255) as u8;
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn attrs(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_parse_rgb_state() {
        let a = attrs(json!({
            "color_mode": "rgb",
            "rgb_color": [255, 128, 0],
            "brightness": 200,
        }));
        let state = parse_state("on", &a);
        assert!(state.on);
        assert_eq!(state.color, Some(LightColor::Rgb(Rgb::new(255, 128, 0))));
        assert_eq!(state.brightness, Some(200));
    }

    #[test]
    fn test_parse_off_state_without_color() {
        let state = parse_state("off", &Map::new());
        assert!(!state.on);
        assert_eq!(state.color, None);
        assert_eq!(state.brightness, None);
    }

    #[test]
    fn test_color_mode_picks_representation() {
        let a = attrs(json!({
            "color_mode": "color_temp",
            "rgb_color": [255, 200, 150],
            "color_temp": 370,
        }));
        assert_eq!(parse_state("on", &a).color, Some(LightColor::ColorTemp(370)));
    }

    #[test]
    fn test_parse_capabilities() {
        let a = attrs(json!({
            "supported_color_modes": ["color_temp", "rgbww"],
            "min_mireds": 153,
            "max_mireds": 500,
            "supported_features": 44,
        }));
        let caps = parse_capabilities(&a);
        assert!(!caps.supports_rgb);
        assert!(caps.supports_rgbww);
        assert!(caps.supports_color_temp);
        assert_eq!(caps.mireds, Some((153, 500)));
        assert!(caps.supports_transition);
        assert!(caps.supports_brightness);
    }

    #[test]
    fn test_onoff_only_light() {
        let a = attrs(json!({ "supported_color_modes": ["onoff"] }));
        let caps = parse_capabilities(&a);
        assert!(!caps.supports_brightness);
        assert!(!caps.supports_transition);
        assert_eq!(caps.mireds, None);
    }

    #[test]
    fn test_channels_rejects_wrong_length() {
        assert_eq!(channels::<3>(Some(&json!([1, 2]))), None);
        assert_eq!(channels::<3>(Some(&json!([1.0, 2.5, 300]))), Some([1, 2, 255]));
    }
}
