//! # Clock Driver
//!
//! The only stateful, time-aware part of the clock. Each tick samples the
//! time source, applies the configured offset, renders the reading and hands
//! the frame to the pixel sink. Then it sleeps for one heartbeat.
//!
//! ## Lifecycle
//!
//! `Idle → Running → Stopped`. A run ends when the configured duration has
//! passed or when a [`StopHandle`] is triggered. The stop flag is checked
//! once per tick boundary, never mid-render, so shutdown takes at most one
//! heartbeat plus one sink write.
//!
//! ## Failure policy
//!
//! Render errors come from static configuration. The tick is logged and
//! skipped (no sink write) and the loop carries on. Sink errors are logged
//! the same way; retrying is the sink's own business.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use log::{debug, error, info, warn};

use crate::config::ClockConfig;
use crate::display::{DisplayError, PixelSink};
use crate::renderer::{ClockFace, RenderError};
use crate::ClockReading;

const SECONDS_PER_HOUR: i64 = 3_600;
const SECONDS_PER_MINUTE: i64 = 60;

/// Wall clock and sleep, injectable so the loop can be driven in tests.
pub trait TimeSource {
    /// Seconds since the Unix epoch
    fn now(&self) -> i64;

    /// Block for `duration`
    fn sleep(&self, duration: Duration);
}

/// The real system clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> i64 {
        Utc::now().timestamp()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Cloneable handle that asks a running driver to stop.
#[derive(Debug, Default, Clone)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a stop at the next tick boundary.
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Where the driver is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverPhase {
    Idle,
    Running,
    Stopped,
}

/// What happened on one tick.
#[derive(Debug)]
pub enum TickOutcome {
    /// Frame rendered and written
    Displayed(ClockReading),
    /// Nothing was written
    RenderFailed(RenderError),
    /// Frame rendered but the sink refused it
    SinkFailed(DisplayError),
}

/// Counters for a finished run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: u64,
    pub frames_written: u64,
    pub render_failures: u64,
    pub sink_failures: u64,
}

/// Runs the clock loop against one sink.
pub struct ClockDriver<S: PixelSink, T: TimeSource> {
    face: ClockFace,
    sink: S,
    time: T,
    style: u8,
    delta_hours: i64,
    delta_minutes: i64,
    heartbeat: Duration,
    duration: u64,
    stop: StopHandle,
    phase: DriverPhase,
    last_reading: Option<ClockReading>,
    summary: RunSummary,
}

impl<S: PixelSink, T: TimeSource> ClockDriver<S, T> {
    pub fn new(face: ClockFace, sink: S, time: T, settings: &ClockConfig) -> Self {
        Self {
            face,
            sink,
            time,
            style: settings.style,
            delta_hours: settings.delta_hours,
            delta_minutes: settings.delta_minutes,
            heartbeat: Duration::from_secs(settings.heartbeat),
            duration: settings.duration,
            stop: StopHandle::new(),
            phase: DriverPhase::Idle,
            last_reading: None,
            summary: RunSummary::default(),
        }
    }

    /// Share an existing stop flag instead of the driver's own.
    pub fn with_stop_handle(mut self, stop: StopHandle) -> Self {
        self.stop = stop;
        self
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn phase(&self) -> DriverPhase {
        self.phase
    }

    /// Reading shown by the most recent tick, if any
    pub fn last_reading(&self) -> Option<ClockReading> {
        self.last_reading
    }

    /// `HH:MM` of the most recent tick, empty before the first one
    pub fn current_time_string(&self) -> String {
        self.last_reading
            .map(|reading| reading.to_string())
            .unwrap_or_default()
    }

    /// Change the style code used from the next tick on.
    pub fn set_style(&mut self, style: u8) {
        self.style = style;
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Apply the configured offset to a raw timestamp.
    ///
    /// Saturates instead of wrapping for offsets too large to represent.
    pub fn corrected_timestamp(&self, now: i64) -> i64 {
        now.saturating_sub(SECONDS_PER_HOUR.saturating_mul(self.delta_hours))
            .saturating_sub(SECONDS_PER_MINUTE.saturating_mul(self.delta_minutes))
    }

    /// Last timestamp of a bounded run started at `start`, or `None` when the
    /// run is unbounded or its end lies beyond the representable range.
    fn end_time(&self, start: i64) -> Option<i64> {
        match self.duration {
            0 => None,
            seconds => i64::try_from(seconds)
                .ok()
                .and_then(|seconds| start.checked_add(seconds)),
        }
    }

    /// Render and display the current time once.
    pub fn tick(&mut self) -> TickOutcome {
        let now = self.time.now();
        self.tick_at(now)
    }

    fn tick_at(&mut self, now: i64) -> TickOutcome {
        self.summary.ticks += 1;
        let reading = ClockReading::from_timestamp(self.corrected_timestamp(now));
        if self.last_reading != Some(reading) {
            debug!("Clock reads {}", reading);
            self.last_reading = Some(reading);
        }

        let image = match self.face.render_code(reading, self.style) {
            Ok(image) => image,
            Err(e) => {
                error!("No image rendered for {}: {}", reading, e);
                self.summary.render_failures += 1;
                return TickOutcome::RenderFailed(e);
            }
        };

        match self.sink.set_pixels(&image) {
            Ok(()) => {
                self.summary.frames_written += 1;
                TickOutcome::Displayed(reading)
            }
            Err(e) => {
                warn!("{} display rejected frame for {}: {}", self.sink.name(), reading, e);
                self.summary.sink_failures += 1;
                TickOutcome::SinkFailed(e)
            }
        }
    }

    /// Run until the duration elapses or a stop is requested.
    ///
    /// A duration of 0 runs until stopped.
    pub fn run(&mut self) -> RunSummary {
        self.phase = DriverPhase::Running;
        self.summary = RunSummary::default();

        let end = self.end_time(self.time.now());
        info!(
            "Clock running on {} every {}s ({})",
            self.sink.name(),
            self.heartbeat.as_secs(),
            match end {
                Some(_) => format!("for {}s", self.duration),
                None if self.duration > 0 => format!("for {}s, effectively forever", self.duration),
                None => "until stopped".to_string(),
            }
        );

        loop {
            if self.stop.is_stopped() {
                info!("Stop requested, leaving clock loop");
                break;
            }
            let now = self.time.now();
            if matches!(end, Some(end) if now > end) {
                break;
            }
            self.tick_at(now);
            self.time.sleep(self.heartbeat);
        }

        self.phase = DriverPhase::Stopped;
        self.summary
    }
}
