//! Countdown timer
//!
//! `Idle -> Running -> Idle`. While running, a repeating one-second tick
//! source delivers tick generations to the owner, which feeds them back
//! through [`Timer::tick`]. Every start or stop bumps the generation, so a
//! tick already in flight from a cancelled source is ignored and no two
//! countdowns can ever decrement the same timer.

use crate::error::ValidationError;
use ambimix_common::time::split_minutes;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Tick period of a running countdown
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Longest countdown accepted, one week
pub const MAX_MINUTES: i64 = 24 * 60 * 7;

/// Source of repeating ticks
pub trait TickSource: Send {
    /// Arm a repeating tick tagged with `generation`, cancelling any
    /// previously armed source first
    fn arm(&mut self, generation: u64);

    /// Cancel the armed source, if any
    fn cancel(&mut self);
}

/// Minutes/seconds pair shown on the timer display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Countdown {
    pub minutes: u32,
    pub seconds: u32,
}

impl Countdown {
    pub const CLEAR: Countdown = Countdown {
        minutes: 0,
        seconds: 0,
    };

    fn from_seconds(total: u32) -> Self {
        let (minutes, seconds) = split_minutes(total);
        Self { minutes, seconds }
    }
}

/// Result of feeding one tick to the timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Stale generation or timer idle
    Ignored,
    /// Countdown advanced, display the new value
    Running(Countdown),
    /// Countdown reached zero; the timer is idle again
    Completed,
}

/// Externally visible timer state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimerState {
    pub remaining_seconds: u32,
    pub running: bool,
}

pub struct Timer {
    remaining: u32,
    running: bool,
    generation: u64,
    ticks: Box<dyn TickSource>,
}

impl Timer {
    pub fn new(ticks: Box<dyn TickSource>) -> Self {
        Self {
            remaining: 0,
            running: false,
            generation: 0,
            ticks,
        }
    }

    /// Start a countdown of `minutes`, replacing any running one
    ///
    /// Zero or negative minutes behave exactly like [`Timer::stop`]. More
    /// than [`MAX_MINUTES`] is rejected and leaves the timer untouched.
    /// Returns the value to display immediately.
    pub fn start(&mut self, minutes: i64) -> Result<Countdown, ValidationError> {
        if minutes <= 0 {
            return Ok(self.stop());
        }
        if minutes > MAX_MINUTES {
            return Err(ValidationError::TimerTooLong {
                minutes,
                max: MAX_MINUTES,
            });
        }

        self.ticks.cancel();
        self.generation += 1;
        self.remaining = minutes as u32 * 60;
        self.running = true;
        self.ticks.arm(self.generation);

        info!("Timer started for {} minutes", minutes);
        Ok(Countdown::from_seconds(self.remaining))
    }

    /// Cancel the countdown and reset to zero
    pub fn stop(&mut self) -> Countdown {
        self.ticks.cancel();
        self.generation += 1;
        if self.running {
            info!("Timer stopped with {}s remaining", self.remaining);
        }
        self.remaining = 0;
        self.running = false;
        Countdown::CLEAR
    }

    /// Advance the countdown by one second
    pub fn tick(&mut self, generation: u64) -> TickOutcome {
        if !self.running || generation != self.generation {
            debug!(
                "Ignoring tick for generation {} (current {}, running {})",
                generation, self.generation, self.running
            );
            return TickOutcome::Ignored;
        }

        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.ticks.cancel();
            self.generation += 1;
            self.running = false;
            info!("Timer completed");
            return TickOutcome::Completed;
        }

        TickOutcome::Running(Countdown::from_seconds(self.remaining))
    }

    pub fn state(&self) -> TimerState {
        TimerState {
            remaining_seconds: self.remaining,
            running: self.running,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining
    }

    /// Generation the armed tick source is tagged with
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Tick source driven by a tokio interval task
///
/// Each armed source sends its generation into `tx` once per period.
pub struct TokioTicker {
    tx: mpsc::UnboundedSender<u64>,
    period: Duration,
    task: Option<JoinHandle<()>>,
}

impl TokioTicker {
    pub fn new(tx: mpsc::UnboundedSender<u64>) -> Self {
        Self::with_period(tx, TICK_PERIOD)
    }

    pub fn with_period(tx: mpsc::UnboundedSender<u64>, period: Duration) -> Self {
        Self {
            tx,
            period,
            task: None,
        }
    }
}

impl TickSource for TokioTicker {
    fn arm(&mut self, generation: u64) {
        self.cancel();

        let tx = self.tx.clone();
        let period = self.period;
        self.task = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            loop {
                interval.tick().await;
                if tx.send(generation).is_err() {
                    break;
                }
            }
        }));
    }

    fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for TokioTicker {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[derive(Debug, Default)]
struct ManualTickerState {
    armed: Option<u64>,
    arm_count: usize,
}

/// Tick source that never fires on its own
///
/// Clones share state, so a test can keep one clone and inspect what the
/// timer armed while the timer owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualTicker {
    state: Arc<Mutex<ManualTickerState>>,
}

impl ManualTicker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generation of the currently armed source
    pub fn armed(&self) -> Option<u64> {
        self.lock().armed
    }

    /// Number of times a source was armed
    pub fn arm_count(&self) -> usize {
        self.lock().arm_count
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ManualTickerState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl TickSource for ManualTicker {
    fn arm(&mut self, generation: u64) {
        let mut state = self.lock();
        state.armed = Some(generation);
        state.arm_count += 1;
    }

    fn cancel(&mut self) {
        self.lock().armed = None;
    }
}
