// CLI definitions using clap

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use light_fx::effect::EffectKind;

#[derive(Parser)]
#[command(name = "light-fx")]
#[command(author, version, about = "Palette-driven lighting effects for Home Assistant lights")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file path (default: ~/.config/light-fx/config.toml; *.json is read as JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create sequences, start default effects and serve start/stop requests (default)
    Run,

    /// List available palettes
    #[command(visible_alias = "ls")]
    Palettes,

    /// Preview an effect in the terminal on a virtual light strip
    Preview {
        /// Effect (rainbow, color_wipe, twinkle)
        #[arg(short, long, default_value = "rainbow")]
        effect: EffectKind,
        /// Number of virtual lights
        #[arg(short = 'n', long, default_value = "16")]
        lights: usize,
        /// Palette name
        #[arg(short, long, default_value = "rainbow")]
        palette: String,
        /// Speed (1-100)
        #[arg(long, default_value = "50", allow_negative_numbers = true)]
        speed: i32,
        /// Intensity (1-100)
        #[arg(long, default_value = "100", allow_negative_numbers = true)]
        intensity: i32,
        /// Run the effect in the opposite direction
        #[arg(long)]
        reverse: bool,
        /// Mirror the back half onto the front half
        #[arg(long)]
        mirror: bool,
        /// Preview FPS (1-60)
        #[arg(long, default_value = "20")]
        fps: u32,
    },
}
