//! # LED Ring Clock Application Entry Point
//!
//! This binary wires configuration, the display backend and the clock driver
//! together. It supports production mode (Sense HAT, or the terminal emulator
//! when no HAT is present) and a development mode that renders one frame to
//! the terminal and exits.

// Test modules
#[cfg(test)]
mod tests;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use led_clock_lib::{
    clock::{ClockDriver, SystemTimeSource, TickOutcome},
    config::{Config, DEFAULT_CONFIG_PATH},
    display::{open_display, DisplayBackend, TerminalSink},
    renderer::ClockFace,
};
use log::info;

/// Show the time on an 8x8 LED matrix.
#[derive(Parser, Debug)]
#[command(name = "led-ring-clock", version, about)]
struct Arguments {
    /// Configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Clock style: 0 dot, 1 arc, 2 twelve-hour arcs, 3 twenty-four-hour arcs
    #[arg(long)]
    style: Option<u8>,

    /// Seconds to run, 0 for forever
    #[arg(long)]
    duration: Option<u64>,

    /// Seconds between display updates
    #[arg(long)]
    heartbeat: Option<u64>,

    /// Hours subtracted from system time
    #[arg(long, allow_negative_numbers = true)]
    delta_hours: Option<i64>,

    /// Minutes subtracted from system time
    #[arg(long, allow_negative_numbers = true)]
    delta_minutes: Option<i64>,

    /// Display backend
    #[arg(long, value_enum)]
    backend: Option<DisplayBackend>,

    /// Dim the Sense HAT
    #[arg(long)]
    low_light: bool,

    /// Development mode: render one frame to the terminal and exit
    #[arg(long)]
    stdout: bool,

    /// Save the effective configuration back to the config file
    #[arg(long)]
    write_config: bool,
}

impl Arguments {
    /// Command-line values win over the config file.
    fn apply(&self, config: &mut Config) {
        let clock = &mut config.clock;
        if let Some(style) = self.style {
            clock.style = style;
        }
        if let Some(duration) = self.duration {
            clock.duration = duration;
        }
        if let Some(heartbeat) = self.heartbeat {
            clock.heartbeat = heartbeat;
        }
        if let Some(delta_hours) = self.delta_hours {
            clock.delta_hours = delta_hours;
        }
        if let Some(delta_minutes) = self.delta_minutes {
            clock.delta_minutes = delta_minutes;
        }
        if let Some(backend) = self.backend {
            config.display.backend = backend;
        }
        if self.low_light {
            config.display.low_light = true;
        }
    }
}

/// Main application entry point.
fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Arguments::parse();
    let mut config = Config::load_from_path(&args.config);
    args.apply(&mut config);

    if args.write_config {
        config
            .save_to_path(&args.config)
            .with_context(|| format!("writing {}", args.config.display()))?;
    }

    let face = ClockFace::builtin(config.colors);

    // Development mode: one frame to the terminal for testing without hardware
    if args.stdout {
        let mut driver = ClockDriver::new(
            face,
            TerminalSink::stdout(),
            SystemTimeSource,
            &config.clock,
        );
        return match driver.tick() {
            TickOutcome::Displayed(reading) => {
                info!("Rendered {}", reading);
                Ok(())
            }
            TickOutcome::RenderFailed(e) => Err(e).context("rendering clock face"),
            TickOutcome::SinkFailed(e) => Err(e).context("writing to terminal"),
        };
    }

    // Production mode: a missing display is fatal before the loop starts
    let sink = open_display(config.display.backend, config.display.low_light)
        .context("no display to show the clock on")?;

    info!("===========================");
    info!("= using: {:^16} =", sink.name());
    info!("===========================");

    let mut driver = ClockDriver::new(face, sink, SystemTimeSource, &config.clock);
    let summary = driver.run();
    info!(
        "Clock stopped after {} ticks: {} frames shown, {} render failures, {} display failures",
        summary.ticks, summary.frames_written, summary.render_failures, summary.sink_failures
    );

    Ok(())
}
