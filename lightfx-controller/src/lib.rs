//! Lighting controller client for light-fx
//!
//! The effect engine never talks HTTP directly. It sees lights through the
//! [`Controller`] trait:
//!
//! - [`HomeAssistantClient`] - REST calls against a Home Assistant instance
//! - [`EventStream`] - websocket subscription delivering service-call events
//!
//! Tests substitute an in-memory implementation.

pub mod error;
pub mod events;
pub mod home_assistant;
pub mod types;

pub use error::ControllerError;
pub use events::EventStream;
pub use home_assistant::{HomeAssistantClient, HomeAssistantConfig};
pub use types::{
    LightCapabilities, LightColor, LightCommand, LightState, LightUpdate, Rgb, Rgbw, Rgbww,
};

use async_trait::async_trait;
use std::sync::Arc;

/// The controller trait - every backend implements this
#[async_trait]
pub trait Controller: Send + Sync {
    /// Fetch a light's current on/off state, color and brightness
    async fn fetch_state(&self, light_id: &str) -> Result<LightState, ControllerError>;

    /// Fetch a light's supported color modes and features
    async fn fetch_capabilities(&self, light_id: &str)
        -> Result<LightCapabilities, ControllerError>;

    /// Issue a `light.turn_on` / `light.turn_off` command and wait for the ack
    async fn send_command(
        &self,
        light_id: &str,
        command: &LightCommand,
    ) -> Result<(), ControllerError>;
}

/// Type alias for a shared controller
pub type SharedController = Arc<dyn Controller>;
