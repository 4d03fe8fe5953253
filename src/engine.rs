//! Effect scheduler: one periodic render task per active sequence.
//!
//! Each sequence has a slot guarded by its own async mutex. `start` and
//! `stop` hold the slot for the whole teardown/spawn, so a replacement is
//! atomic for callers and two effects never run on one sequence at once.
//!
//! ```text
//!   Idle --start--> Running --stop--> Idle
//!                    |   ^
//!                    +---+ start (stop old, then spawn new)
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use parking_lot::Mutex;
use tokio::sync::{oneshot, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::effect::{Effect, EffectConfig, EffectKind, FrameContext};
use crate::error::Result;
use crate::palette::PaletteStore;
use crate::registry::{LightRegistry, LightSequence};

/// Default tick period (20 Hz)
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(50);

/// Live binding of a sequence to an effect task
struct RunningEffect {
    kind: EffectKind,
    config: EffectConfig,
    cancel: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

/// Snapshot of one running effect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunningInfo {
    pub sequence: String,
    pub kind: EffectKind,
    pub config: EffectConfig,
}

type Slot = Arc<AsyncMutex<Option<RunningEffect>>>;

pub struct EffectEngine {
    registry: Arc<LightRegistry>,
    palettes: Arc<PaletteStore>,
    frame_interval: Duration,
    slots: Mutex<HashMap<String, Slot>>,
}

impl EffectEngine {
    pub fn new(
        registry: Arc<LightRegistry>,
        palettes: Arc<PaletteStore>,
        frame_interval: Duration,
    ) -> Self {
        Self {
            registry,
            palettes,
            frame_interval,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> &Arc<LightRegistry> {
        &self.registry
    }

    pub fn palettes(&self) -> &Arc<PaletteStore> {
        &self.palettes
    }

    fn slot(&self, sequence: &str) -> Slot {
        self.slots
            .lock()
            .entry(sequence.to_string())
            .or_default()
            .clone()
    }

    /// Start `kind` on a sequence, replacing whatever runs there.
    ///
    /// The previous effect is fully stopped (task joined, lights off) before
    /// the new task is spawned.
    pub async fn start(
        &self,
        sequence: &str,
        kind: EffectKind,
        config: EffectConfig,
    ) -> Result<()> {
        let sequence = self.registry.get_sequence(sequence).await?;
        self.palettes.get(&config.palette_name)?;
        let config = config.clamped();

        let slot = self.slot(sequence.name());
        let mut running = slot.lock().await;
        if let Some(previous) = running.take() {
            debug!("Replacing {} on sequence {}", previous.kind, sequence.name());
            self.teardown(sequence.name(), previous).await;
        }

        let (cancel, cancelled) = oneshot::channel();
        let task = tokio::spawn(tick_loop(
            Arc::clone(&self.registry),
            Arc::clone(&self.palettes),
            sequence.clone(),
            kind.create(),
            config.clone(),
            self.frame_interval,
            cancelled,
        ));

        info!(
            "Started {} on sequence {} (speed {}, intensity {}, palette {})",
            kind,
            sequence.name(),
            config.speed,
            config.intensity,
            config.palette_name
        );
        *running = Some(RunningEffect {
            kind,
            config,
            cancel,
            task,
        });
        Ok(())
    }

    /// Stop the effect on a sequence and turn its lights off.
    ///
    /// A sequence with nothing running is left untouched.
    pub async fn stop(&self, sequence: &str) -> Result<()> {
        let sequence = self.registry.get_sequence(sequence).await?;
        let slot = self.slot(sequence.name());
        let mut running = slot.lock().await;
        match running.take() {
            Some(effect) => {
                self.teardown(sequence.name(), effect).await;
                info!("Stopped effect on sequence {}", sequence.name());
            }
            None => debug!("Sequence {} is idle, nothing to stop", sequence.name()),
        }
        Ok(())
    }

    /// Cancel and join the task, then turn the sequence off.
    async fn teardown(&self, sequence: &str, effect: RunningEffect) {
        // Err only if the task already exited
        let _ = effect.cancel.send(());
        match effect.task.await {
            Ok(()) => {}
            Err(e) if e.is_panic() => {
                error!("{} task for sequence {} panicked", effect.kind, sequence)
            }
            Err(e) => warn!("{} task for sequence {} failed: {}", effect.kind, sequence, e),
        }

        match self.registry.turn_off_sequence(sequence).await {
            Ok(failures) if !failures.is_empty() => warn!(
                "Sequence {}: {} light(s) failed to turn off",
                sequence,
                failures.len()
            ),
            Ok(_) => {}
            Err(e) => warn!("Sequence {}: turn off failed: {}", sequence, e),
        }
    }

    pub async fn is_running(&self, sequence: &str) -> bool {
        let slot = self.slots.lock().get(sequence).cloned();
        match slot {
            Some(slot) => slot.lock().await.is_some(),
            None => false,
        }
    }

    /// Currently running effects, ordered by sequence name
    pub async fn running_effects(&self) -> Vec<RunningInfo> {
        let slots: Vec<(String, Slot)> = self
            .slots
            .lock()
            .iter()
            .map(|(name, slot)| (name.clone(), Arc::clone(slot)))
            .collect();

        let mut out = Vec::new();
        for (sequence, slot) in slots {
            if let Some(effect) = slot.lock().await.as_ref() {
                out.push(RunningInfo {
                    sequence,
                    kind: effect.kind,
                    config: effect.config.clone(),
                });
            }
        }
        out.sort_by(|a, b| a.sequence.cmp(&b.sequence));
        out
    }

    /// Stop every running effect
    pub async fn shutdown(&self) {
        let names: Vec<String> = self.slots.lock().keys().cloned().collect();
        let results = join_all(names.iter().map(|name| self.stop(name))).await;
        for (name, result) in names.iter().zip(results) {
            if let Err(e) = result {
                warn!("Shutdown of sequence {} failed: {}", name, e);
            }
        }
        info!("All effects stopped");
    }
}

/// Per-sequence render loop; exits when `cancelled` fires or its sender is
/// dropped.
async fn tick_loop(
    registry: Arc<LightRegistry>,
    palettes: Arc<PaletteStore>,
    sequence: LightSequence,
    mut effect: Box<dyn Effect>,
    config: EffectConfig,
    frame_interval: Duration,
    mut cancelled: oneshot::Receiver<()>,
) {
    let started = Instant::now();
    let mut interval = tokio::time::interval(frame_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = &mut cancelled => break,
            _ = interval.tick() => {}
        }

        let frame = match effect.render(&FrameContext {
            sequence: &sequence,
            config: &config,
            palettes: &palettes,
            elapsed: started.elapsed(),
        }) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Sequence {}: frame skipped: {}", sequence.name(), e);
                continue;
            }
        };

        for (light, update) in frame {
            if let Err(e) = registry.update_light(&light, update).await {
                warn!("Sequence {}: update of {} failed: {}", sequence.name(), light, e);
            }
        }
    }

    debug!("{} loop for sequence {} exited", effect.kind(), sequence.name());
}

