//! light-fx: effect daemon and terminal preview

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use light_fx::config::AppConfig;
use light_fx::dispatch::Dispatcher;
use light_fx::effect::{self, EffectConfig};
use light_fx::engine::EffectEngine;
use light_fx::palette::PaletteStore;
use light_fx::registry::LightRegistry;
use lightfx_controller::{EventStream, HomeAssistantClient, SharedController};

mod cli;
use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config_path = cli.config.unwrap_or_else(AppConfig::default_path);
    info!("Loading config from {:?}", config_path);
    let config = AppConfig::load(&config_path)?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run(config).await,
        Commands::Palettes => {
            print_palettes(&config.build_palettes()?);
            Ok(())
        }
        Commands::Preview {
            effect: kind,
            lights,
            palette,
            speed,
            intensity,
            reverse,
            mirror,
            fps,
        } => {
            let palettes = config.build_palettes()?;
            let effect_config = EffectConfig {
                speed,
                intensity,
                palette_name: palette,
                reverse,
                mirror,
            };
            effect::preview::run(kind, &effect_config, &palettes, lights, fps)
        }
    }
}

/// Daemon mode: runs until Ctrl-C or the event stream closes
async fn run(config: AppConfig) -> Result<()> {
    let palettes = Arc::new(config.build_palettes()?);
    info!("Palettes: {}", palettes.names().join(", "));

    let ha = config.controller.resolve()?;
    let controller: SharedController = Arc::new(HomeAssistantClient::new(&ha)?);
    let registry = Arc::new(LightRegistry::with_refresh_delay(
        controller,
        config.engine.refresh_delay(),
    ));
    let engine = Arc::new(EffectEngine::new(
        Arc::clone(&registry),
        palettes,
        config.engine.frame_interval(),
    ));
    let dispatcher = Dispatcher::new(Arc::clone(&engine));

    // Best-effort per sequence: one bad sequence doesn't block the rest
    for seq in &config.sequences {
        if let Err(e) = registry.create_sequence(&seq.name, seq.lights.clone()).await {
            error!("Error setting up sequence {}: {}", seq.name, e);
            continue;
        }
        if let Some(request) = seq.default_request() {
            if let Err(e) = dispatcher.handle(request).await {
                error!("Default effect for sequence {} failed: {}", seq.name, e);
            }
        }
    }

    let outcome = match EventStream::subscribe(&ha.websocket_url(), &ha.token, &config.event_type)
        .await
    {
        Ok(mut events) => {
            info!("Ready. Ctrl+C to stop.");
            let outcome = tokio::select! {
                result = dispatcher.run(&mut events) => result.map_err(anyhow::Error::from),
                _ = tokio::signal::ctrl_c() => {
                    info!("Interrupted");
                    Ok(())
                }
            };
            events.close().await.ok();
            outcome
        }
        Err(e) => Err(anyhow::Error::from(e).context("event subscription failed")),
    };

    engine.shutdown().await;
    outcome
}

fn print_palettes(palettes: &PaletteStore) {
    for name in palettes.names() {
        let Ok(palette) = palettes.get(name) else {
            continue;
        };
        let variation = palette
            .variation()
            .map(|v| format!(", variation {v}"))
            .unwrap_or_default();
        println!("{} ({}{})", name, palette.kind().as_str(), variation);
        for stop in palette.stops() {
            let rgb = stop.color.to_rgb8(1.0);
            println!(
                "  {:5.1}  #{:02X}{:02X}{:02X}",
                stop.position, rgb.r, rgb.g, rgb.b
            );
        }
    }
}
