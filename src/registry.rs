//! Light registry: cached capabilities and state per light, grouped into
//! named sequences.
//!
//! All reads and writes of light state go through one async mutex (the
//! write gate). A write is "send command, then re-fetch state" and holds the
//! gate for the whole round trip, so concurrent effect tasks serialize here
//! even when they target different lights.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::Duration;

use futures::future::try_join_all;
use lightfx_controller::{
    ControllerError, LightCapabilities, LightCommand, LightState, LightUpdate, SharedController,
};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::color::{mireds_to_kelvin, rgb_to_rgbw, rgb_to_rgbww, COLD_WHITE_KELVIN};
use crate::error::{FxError, Result};

/// A named, ordered group of lights. Order is significant: effects index
/// lights positionally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LightSequence {
    name: String,
    light_ids: Vec<String>,
}

impl LightSequence {
    pub fn new(name: impl Into<String>, light_ids: Vec<String>) -> Self {
        Self {
            name: name.into(),
            light_ids,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn light_ids(&self) -> &[String] {
        &self.light_ids
    }

    pub fn len(&self) -> usize {
        self.light_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.light_ids.is_empty()
    }
}

#[derive(Debug, Clone)]
struct LightEntry {
    capabilities: LightCapabilities,
    state: LightState,
}

#[derive(Default)]
struct RegistryState {
    lights: HashMap<String, LightEntry>,
    sequences: BTreeMap<String, LightSequence>,
    /// light id -> owning sequence name
    owners: HashMap<String, String>,
}

impl RegistryState {
    /// Check that `name` is free and no light is claimed or listed twice.
    fn check_claim(&self, name: &str, light_ids: &[String]) -> Result<()> {
        if self.sequences.contains_key(name) {
            return Err(FxError::SequenceExists(name.to_string()));
        }
        let mut seen = HashSet::new();
        for light in light_ids {
            if let Some(owner) = self.owners.get(light) {
                return Err(FxError::LightClaimed {
                    light: light.clone(),
                    sequence: owner.clone(),
                });
            }
            if !seen.insert(light.as_str()) {
                return Err(FxError::LightClaimed {
                    light: light.clone(),
                    sequence: name.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Shared light state, mediated by a single write gate
pub struct LightRegistry {
    controller: SharedController,
    /// Settle time between a command and the state re-fetch
    refresh_delay: Duration,
    state: Mutex<RegistryState>,
}

impl LightRegistry {
    pub fn new(controller: SharedController) -> Self {
        Self::with_refresh_delay(controller, Duration::ZERO)
    }

    pub fn with_refresh_delay(controller: SharedController, refresh_delay: Duration) -> Self {
        Self {
            controller,
            refresh_delay,
            state: Mutex::new(RegistryState::default()),
        }
    }

    /// Register a sequence, fetching capabilities and state for every light.
    ///
    /// All-or-nothing: if any fetch fails nothing is registered.
    pub async fn create_sequence(
        &self,
        name: &str,
        light_ids: Vec<String>,
    ) -> Result<LightSequence> {
        self.state.lock().await.check_claim(name, &light_ids)?;

        let fetched = try_join_all(light_ids.iter().map(|light| self.fetch_entry(light)))
            .await
            .inspect_err(|e| error!("Sequence {}: light fetch failed: {}", name, e))?;

        let mut state = self.state.lock().await;
        // Another caller may have claimed the name or lights while we fetched
        state.check_claim(name, &light_ids)?;

        for (light, entry) in light_ids.iter().zip(fetched) {
            state.owners.insert(light.clone(), name.to_string());
            state.lights.insert(light.clone(), entry);
        }
        let sequence = LightSequence::new(name, light_ids);
        state
            .sequences
            .insert(name.to_string(), sequence.clone());

        info!("Created sequence {} ({} lights)", name, sequence.len());
        Ok(sequence)
    }

    async fn fetch_entry(&self, light: &str) -> std::result::Result<LightEntry, ControllerError> {
        let (capabilities, state) = tokio::try_join!(
            self.controller.fetch_capabilities(light),
            self.controller.fetch_state(light),
        )?;
        debug!(light, ?capabilities, "fetched light");
        Ok(LightEntry {
            capabilities,
            state,
        })
    }

    /// Snapshot of a sequence
    pub async fn get_sequence(&self, name: &str) -> Result<LightSequence> {
        self.state
            .lock()
            .await
            .sequences
            .get(name)
            .cloned()
            .ok_or_else(|| FxError::SequenceNotFound(name.to_string()))
    }

    pub async fn sequence_names(&self) -> Vec<String> {
        self.state.lock().await.sequences.keys().cloned().collect()
    }

    pub async fn capabilities(&self, light: &str) -> Option<LightCapabilities> {
        self.state
            .lock()
            .await
            .lights
            .get(light)
            .map(|entry| entry.capabilities)
    }

    pub async fn state(&self, light: &str) -> Option<LightState> {
        self.state
            .lock()
            .await
            .lights
            .get(light)
            .map(|entry| entry.state)
    }

    /// Turn a light on with `update`, then refresh its cached state.
    ///
    /// The update is adapted to the light's color modes first.
    pub async fn update_light(&self, light: &str, update: LightUpdate) -> Result<()> {
        let mut state = self.state.lock().await;
        let entry = state
            .lights
            .get_mut(light)
            .ok_or_else(|| FxError::LightNotFound(light.to_string()))?;

        let command = LightCommand::TurnOn(adapt_update(update, &entry.capabilities));
        self.controller.send_command(light, &command).await?;

        if !self.refresh_delay.is_zero() {
            tokio::time::sleep(self.refresh_delay).await;
        }
        entry.state = self.controller.fetch_state(light).await?;
        Ok(())
    }

    /// Turn every light in a sequence off, best-effort.
    ///
    /// Per-light failures are logged and returned; the remaining lights are
    /// still commanded.
    pub async fn turn_off_sequence(&self, name: &str) -> Result<Vec<(String, ControllerError)>> {
        let sequence = self.get_sequence(name).await?;
        let mut failures = Vec::new();

        for light in sequence.light_ids() {
            let mut state = self.state.lock().await;
            match self
                .controller
                .send_command(light, &LightCommand::TurnOff)
                .await
            {
                Ok(()) => {
                    if let Some(entry) = state.lights.get_mut(light) {
                        entry.state.on = false;
                    }
                }
                Err(e) => {
                    warn!("Failed to turn off {}: {}", light, e);
                    failures.push((light.clone(), e));
                }
            }
        }

        Ok(failures)
    }
}

/// Fit an update to what the light supports.
///
/// RGB is re-expressed as RGBWW (at the coldest supported white) or RGBW for
/// lights without an RGB mode; transitions are dropped for lights that can't
/// do them.
pub fn adapt_update(mut update: LightUpdate, caps: &LightCapabilities) -> LightUpdate {
    if let Some(rgb) = update.rgb {
        if !caps.supports_rgb && caps.supports_rgbww {
            let kelvin = caps
                .mireds
                .map(|(min, _)| mireds_to_kelvin(min))
                .unwrap_or(COLD_WHITE_KELVIN);
            update.rgb = None;
            update.rgbww = Some(rgb_to_rgbww(rgb, kelvin));
        } else if !caps.supports_rgb && caps.supports_rgbw {
            update.rgb = None;
            update.rgbw = Some(rgb_to_rgbw(rgb));
        }
    }
    if !caps.supports_transition {
        update.transition = None;
    }
    update
}
