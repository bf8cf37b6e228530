//! Spawn-rate state machine.
//!
//! Pure timing logic: `advance` takes the current clock and answers "how many
//! entities to release now". The world-facing side lives in `systems`.
//!
//! ```text
//!            start (now < deadline)            deadline reached
//!   Idle ───────────────────────────► Waiting ─────────────────► Running ◄──┐
//!    ▲  start (now >= deadline)                                   │   │      │
//!    ├────────────────────────────────────────────────────────────┘   │      │
//!    │                                         spawning disabled      ▼      │
//!    └──────── stop / rate = 0 (from any phase) ◄──────────────── Polling ───┘
//!                                                               (1 s re-check)
//! ```
//!
//! Stopping replaces the phase, so a pending deadline is discarded on the spot.

use std::time::Duration;

use bevy::prelude::*;

use crate::common::settings::clamp_rate;

/// Rate cap for evaluations per second.
pub const MAX_TICKS_PER_SECOND: u32 = 60;

/// Re-check interval while spawning is disabled by configuration.
pub const DISABLED_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Batches released in one frame when the frame spans several tick intervals.
/// Anything beyond is dropped and the next tick is re-anchored to `now`.
pub const MAX_CATCH_UP_TICKS: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerPhase {
    Idle,
    /// Initial delay.
    Waiting { until: Duration },
    Running { next_tick: Duration },
    /// Spawning disabled; re-check at `until`.
    Polling { until: Duration },
}

#[derive(Resource, Debug, Clone)]
pub struct SpawnScheduler {
    rate: u32,
    phase: SchedulerPhase,
    start_deadline: Duration,
}

impl SpawnScheduler {
    pub fn new(rate: u32, start_deadline: Duration) -> Self {
        Self {
            rate,
            phase: SchedulerPhase::Idle,
            start_deadline,
        }
    }

    #[inline]
    pub fn rate(&self) -> u32 {
        self.rate
    }

    #[inline]
    pub fn phase(&self) -> SchedulerPhase {
        self.phase
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.phase != SchedulerPhase::Idle
    }

    #[inline]
    pub fn start_deadline(&self) -> Duration {
        self.start_deadline
    }

    /// `1 / min(rate, 60)` seconds. `None` while paused.
    pub fn tick_interval(rate: u32) -> Option<Duration> {
        let evaluations = rate.min(MAX_TICKS_PER_SECOND);
        (evaluations > 0).then(|| Duration::from_secs_f64(1.0 / f64::from(evaluations)))
    }

    /// Entities released per tick: `rate * interval`, rounded.
    pub fn per_tick(rate: u32) -> u32 {
        Self::tick_interval(rate)
            .map(|interval| (f64::from(rate) * interval.as_secs_f64()).round() as u32)
            .unwrap_or(0)
    }

    /// Leave `Idle`. Honors the start deadline once; later starts run at once
    /// because the deadline is already behind the clock. No-op at rate 0.
    pub fn start(&mut self, now: Duration) {
        if self.is_running() {
            return;
        }
        if self.rate == 0 {
            debug!("spawn scheduler not started: rate is 0");
            return;
        }

        self.phase = if now < self.start_deadline {
            SchedulerPhase::Waiting {
                until: self.start_deadline,
            }
        } else {
            SchedulerPhase::Running { next_tick: now }
        };
        info!("spawn scheduler started at {} /s", self.rate);
    }

    /// Back to `Idle`, discarding whatever wait was pending.
    pub fn stop(&mut self) {
        if self.is_running() {
            info!("spawn scheduler stopped");
        }
        self.phase = SchedulerPhase::Idle;
    }

    /// Apply a rate change from the control surface. Returns the accepted rate.
    pub fn set_rate(&mut self, rate: i32, now: Duration) -> u32 {
        let rate = clamp_rate(rate) as u32;
        self.rate = rate;

        match (rate, self.phase) {
            (0, _) => self.stop(),
            (_, SchedulerPhase::Idle) => self.start(now),
            (_, SchedulerPhase::Running { next_tick }) => {
                // A faster rate must not wait out the old, longer interval.
                if let Some(interval) = Self::tick_interval(rate) {
                    self.phase = SchedulerPhase::Running {
                        next_tick: next_tick.min(now + interval),
                    };
                }
            }
            _ => {}
        }
        rate
    }

    /// Advance to `now` and return the number of entities to release.
    pub fn advance(&mut self, now: Duration, spawning_enabled: bool) -> u32 {
        loop {
            match self.phase {
                SchedulerPhase::Idle => return 0,
                SchedulerPhase::Waiting { until } | SchedulerPhase::Polling { until } => {
                    if now < until {
                        return 0;
                    }
                    self.phase = SchedulerPhase::Running { next_tick: now };
                }
                SchedulerPhase::Running { next_tick } => {
                    if !spawning_enabled {
                        self.phase = SchedulerPhase::Polling {
                            until: now + DISABLED_POLL_INTERVAL,
                        };
                        return 0;
                    }
                    let Some(interval) = Self::tick_interval(self.rate) else {
                        self.stop();
                        return 0;
                    };
                    if now < next_tick {
                        return 0;
                    }

                    let per_tick = Self::per_tick(self.rate);
                    let mut due = next_tick;
                    let mut batches = 0;
                    while due <= now && batches < MAX_CATCH_UP_TICKS {
                        due += interval;
                        batches += 1;
                    }
                    if due <= now {
                        due = now + interval;
                    }

                    self.phase = SchedulerPhase::Running { next_tick: due };
                    return per_tick * batches;
                }
            }
        }
    }
}
