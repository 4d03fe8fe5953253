//! In-memory controller for integration tests

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use lightfx_controller::{
    Controller, ControllerError, LightCapabilities, LightColor, LightCommand, LightState,
    SharedController,
};
use parking_lot::Mutex;

pub const RGB_LIGHT: LightCapabilities = LightCapabilities {
    supports_rgb: true,
    supports_rgbw: false,
    supports_rgbww: false,
    supports_color_temp: false,
    mireds: None,
    supports_transition: true,
    supports_brightness: true,
};

/// Records every command; lights marked failing reject all calls.
///
/// `send_command` and `fetch_state` yield once mid-call and track how many
/// of them overlap.
#[derive(Default)]
pub struct MockController {
    lights: Mutex<HashMap<String, (LightCapabilities, LightState)>>,
    failing: Mutex<HashSet<String>>,
    commands: Mutex<Vec<(String, LightCommand)>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

/// Decrements the in-flight count on drop
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MockController {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Mock with RGB lights `light.0` .. `light.{n-1}`
    pub fn with_lights(n: usize) -> Arc<Self> {
        let mock = Self::new();
        for i in 0..n {
            mock.add_light(&format!("light.{i}"), RGB_LIGHT);
        }
        mock
    }

    pub fn add_light(&self, id: &str, caps: LightCapabilities) {
        self.lights
            .lock()
            .insert(id.to_string(), (caps, LightState::default()));
    }

    pub fn fail_light(&self, id: &str) {
        self.failing.lock().insert(id.to_string());
    }

    pub fn shared(self: &Arc<Self>) -> SharedController {
        Arc::clone(self) as SharedController
    }

    pub fn commands(&self) -> Vec<(String, LightCommand)> {
        self.commands.lock().clone()
    }

    pub fn clear_commands(&self) {
        self.commands.lock().clear();
    }

    pub fn off_count(&self, id: &str) -> usize {
        self.commands
            .lock()
            .iter()
            .filter(|(light, cmd)| light == id && *cmd == LightCommand::TurnOff)
            .count()
    }

    pub fn on_count(&self) -> usize {
        self.commands
            .lock()
            .iter()
            .filter(|(_, cmd)| matches!(cmd, LightCommand::TurnOn(_)))
            .count()
    }

    /// Highest number of overlapping state/command calls seen
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn reset_max_in_flight(&self) {
        self.max_in_flight.store(0, Ordering::SeqCst);
    }

    fn enter(&self) -> InFlight<'_> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        InFlight(&self.in_flight)
    }

    fn check(&self, id: &str) -> Result<(), ControllerError> {
        if self.failing.lock().contains(id) {
            return Err(ControllerError::Request(format!("{id} unreachable")));
        }
        if !self.lights.lock().contains_key(id) {
            return Err(ControllerError::Status {
                code: 404,
                body: format!("Entity not found: {id}"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Controller for MockController {
    async fn fetch_state(&self, light_id: &str) -> Result<LightState, ControllerError> {
        let _call = self.enter();
        tokio::task::yield_now().await;
        self.check(light_id)?;
        Ok(self.lights.lock()[light_id].1)
    }

    async fn fetch_capabilities(
        &self,
        light_id: &str,
    ) -> Result<LightCapabilities, ControllerError> {
        self.check(light_id)?;
        Ok(self.lights.lock()[light_id].0)
    }

    async fn send_command(
        &self,
        light_id: &str,
        command: &LightCommand,
    ) -> Result<(), ControllerError> {
        let _call = self.enter();
        tokio::task::yield_now().await;
        self.check(light_id)?;
        self.commands
            .lock()
            .push((light_id.to_string(), *command));

        let mut lights = self.lights.lock();
        if let Some((_, state)) = lights.get_mut(light_id) {
            match command {
                LightCommand::TurnOn(update) => {
                    state.on = true;
                    if let Some(rgb) = update.rgb {
                        state.color = Some(LightColor::Rgb(rgb));
                    } else if let Some(rgbw) = update.rgbw {
                        state.color = Some(LightColor::Rgbw(rgbw));
                    }
                }
                LightCommand::TurnOff => state.on = false,
            }
        }
        Ok(())
    }
}
