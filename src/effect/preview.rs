//! Terminal preview for light effects using crossterm.
//!
//! Renders a virtual strip of N lights in an alternate screen with
//! true-color, wrapping onto several rows when the strip is wide. No
//! controller is involved; frames come straight from the effect.

use std::io::{self, Write};
use std::time::{Duration, Instant};

use crossterm::{
    cursor, event,
    style::{self, Color, Stylize},
    terminal, ExecutableCommand, QueueableCommand,
};
use lightfx_controller::Rgb;

use super::{EffectConfig, EffectKind, Frame, FrameContext};
use crate::palette::PaletteStore;
use crate::registry::LightSequence;

/// Width of each cell in characters.
const CELL_W: usize = 5;
/// Cells per row before wrapping.
const ROW_CELLS: usize = 16;
/// Background color.
const BG: Color = Color::Rgb {
    r: 20,
    g: 20,
    b: 20,
};

/// Run the terminal preview. Blocks until q/Esc is pressed.
pub fn run(
    kind: EffectKind,
    config: &EffectConfig,
    palettes: &PaletteStore,
    lights: usize,
    fps: u32,
) -> anyhow::Result<()> {
    // Fail before touching the terminal
    palettes.get(&config.palette_name)?;

    let fps = fps.clamp(1, 60);
    let frame_dur = Duration::from_secs_f64(1.0 / fps as f64);
    let sequence = LightSequence::new(
        "preview",
        (0..lights).map(|i| format!("light.preview_{i}")).collect(),
    );

    let mut stdout = io::stdout();
    terminal::enable_raw_mode()?;
    stdout
        .execute(terminal::EnterAlternateScreen)?
        .execute(cursor::Hide)?;

    let result = run_loop(&mut stdout, kind, config, palettes, &sequence, frame_dur);

    stdout
        .execute(cursor::Show)?
        .execute(terminal::LeaveAlternateScreen)?;
    terminal::disable_raw_mode()?;

    result
}

fn run_loop(
    stdout: &mut io::Stdout,
    kind: EffectKind,
    config: &EffectConfig,
    palettes: &PaletteStore,
    sequence: &LightSequence,
    frame_dur: Duration,
) -> anyhow::Result<()> {
    let mut effect = kind.create();
    let start = Instant::now();

    loop {
        if event::poll(Duration::ZERO)? {
            if let event::Event::Key(key) = event::read()? {
                match key.code {
                    event::KeyCode::Char('q') | event::KeyCode::Esc => break,
                    event::KeyCode::Char('c')
                        if key.modifiers.contains(event::KeyModifiers::CONTROL) =>
                    {
                        break
                    }
                    _ => {}
                }
            }
        }

        let elapsed = start.elapsed();
        let frame = effect.render(&FrameContext {
            sequence,
            config,
            palettes,
            elapsed,
        })?;
        let colors = strip_colors(&frame);

        stdout.queue(cursor::MoveTo(0, 0))?;
        stdout.queue(style::PrintStyledContent(
            format!(
                " {} / {}  |  {:6.2}s  |  q/Esc to quit ",
                kind,
                config.palette_name,
                elapsed.as_secs_f64()
            )
            .with(Color::White)
            .on(Color::DarkGrey),
        ))?;

        for (row, chunk) in colors.chunks(ROW_CELLS).enumerate() {
            stdout.queue(cursor::MoveTo(0, (row + 2) as u16))?;
            for (col, rgb) in chunk.iter().enumerate() {
                let label = (row * ROW_CELLS + col).to_string();
                stdout.queue(style::PrintStyledContent(
                    format!("{:^width$}", label, width = CELL_W)
                        .with(label_color(*rgb))
                        .on(cell_color(*rgb)),
                ))?;
            }
        }

        stdout.flush()?;
        std::thread::sleep(frame_dur);
    }

    Ok(())
}

/// One color per light in sequence order; lights without an RGB update show
/// as off.
pub fn strip_colors(frame: &Frame) -> Vec<Rgb> {
    (0..frame.len())
        .map(|i| frame.rgb_at(i).unwrap_or(Rgb::BLACK))
        .collect()
}

fn cell_color(rgb: Rgb) -> Color {
    if rgb.is_black() {
        BG
    } else {
        Color::Rgb {
            r: rgb.r,
            g: rgb.g,
            b: rgb.b,
        }
    }
}

/// Black text on bright cells, white on dark ones
fn label_color(rgb: Rgb) -> Color {
    let lum = (rgb.r as u16 + rgb.g as u16 + rgb.b as u16) / 3;
    if lum > 128 {
        Color::Black
    } else {
        Color::White
    }
}
