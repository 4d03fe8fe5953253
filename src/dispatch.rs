//! Inbound start/stop requests from the controller event stream

use std::sync::Arc;

use lightfx_controller::{ControllerError, EventStream};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::effect::{EffectConfig, EffectKind};
use crate::engine::EffectEngine;
use crate::error::Result;

/// A service call, as carried in the event's `data` field:
///
/// ```json
/// { "service": "start_effect",
///   "data": { "sequence": "porch", "effect": "rainbow", "config": { "speed": 70 } } }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "service", content = "data", rename_all = "snake_case")]
pub enum EffectRequest {
    StartEffect {
        sequence: String,
        effect: String,
        #[serde(default)]
        config: EffectConfig,
    },
    StopEffect {
        sequence: String,
    },
}

impl EffectRequest {
    pub fn sequence(&self) -> &str {
        match self {
            EffectRequest::StartEffect { sequence, .. } | EffectRequest::StopEffect { sequence } => {
                sequence
            }
        }
    }
}

/// Routes requests to the engine
pub struct Dispatcher {
    engine: Arc<EffectEngine>,
}

impl Dispatcher {
    pub fn new(engine: Arc<EffectEngine>) -> Self {
        Self { engine }
    }

    pub async fn handle(&self, request: EffectRequest) -> Result<()> {
        match request {
            EffectRequest::StartEffect {
                sequence,
                effect,
                config,
            } => {
                let kind: EffectKind = effect.parse()?;
                self.engine.start(&sequence, kind, config).await
            }
            EffectRequest::StopEffect { sequence } => self.engine.stop(&sequence).await,
        }
    }

    /// Decode and handle one event payload. Failures are logged, not returned.
    pub async fn handle_event(&self, data: Value) {
        let request: EffectRequest = match serde_json::from_value(data) {
            Ok(request) => request,
            Err(e) => {
                warn!("Ignoring undecodable request: {}", e);
                return;
            }
        };

        let sequence = request.sequence().to_string();
        if let Err(e) = self.handle(request).await {
            warn!("Request for sequence {} failed [{}]: {}", sequence, e.kind(), e);
        }
    }

    /// Consume events until the stream closes
    pub async fn run(&self, events: &mut EventStream) -> std::result::Result<(), ControllerError> {
        while let Some(data) = events.next_event().await? {
            self.handle_event(data).await;
        }
        info!("Event stream closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_start_with_partial_config() {
        let request: EffectRequest = serde_json::from_value(json!({
            "service": "start_effect",
            "data": {
                "sequence": "porch",
                "effect": "twinkle",
                "config": { "speed": 80, "mirror": true }
            }
        }))
        .unwrap();

        let EffectRequest::StartEffect {
            sequence,
            effect,
            config,
        } = request
        else {
            panic!("expected start_effect");
        };
        assert_eq!(sequence, "porch");
        assert_eq!(effect, "twinkle");
        assert_eq!(config.speed, 80);
        assert!(config.mirror);
        assert_eq!(config.intensity, 100);
        assert_eq!(config.palette_name, "rainbow");
    }

    #[test]
    fn test_decode_start_without_config() {
        let request: EffectRequest = serde_json::from_value(json!({
            "service": "start_effect",
            "data": { "sequence": "porch", "effect": "rainbow" }
        }))
        .unwrap();
        assert!(matches!(
            request,
            EffectRequest::StartEffect { config, .. } if config == EffectConfig::default()
        ));
    }

    #[test]
    fn test_decode_stop() {
        let request: EffectRequest = serde_json::from_value(json!({
            "service": "stop_effect",
            "data": { "sequence": "porch" }
        }))
        .unwrap();
        assert_eq!(
            request,
            EffectRequest::StopEffect {
                sequence: "porch".into()
            }
        );
        assert_eq!(request.sequence(), "porch");
    }

    #[test]
    fn test_decode_rejects_unknown_service() {
        let result = serde_json::from_value::<EffectRequest>(json!({
            "service": "reboot",
            "data": {}
        }));
        assert!(result.is_err());
    }
}
