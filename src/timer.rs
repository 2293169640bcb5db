//! Cancellable waits.
//!
//! Every delayed continuation in this crate (hide countdowns, help step cooldowns,
//! success transitions, idle hints) is a [`CancellableDelay`] that is ticked by a system.
//! Once stopped a delay can never report completion, so no stale continuation runs.

use std::time::Duration;

use bevy_time::{Timer, TimerMode};

/// A one shot wait that can be restarted or cancelled at any point before it fires.
#[derive(Debug, Default, Clone)]
pub struct CancellableDelay {
    timer: Option<Timer>,
}

impl CancellableDelay {
    /// Start waiting for `duration`, cancelling any wait already in flight.
    pub fn start(&mut self, duration: Duration) {
        self.timer = Some(Timer::new(duration, TimerMode::Once));
    }

    /// Cancel the wait, its continuation will not fire.
    pub fn stop(&mut self) {
        self.timer = None;
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_some()
    }

    /// Advance the wait, returns `true` exactly once, on the tick it elapses.
    pub fn tick(&mut self, delta: Duration) -> bool {
        let Some(timer) = self.timer.as_mut() else {
            return false;
        };
        timer.tick(delta);
        if timer.is_finished() {
            self.timer = None;
            return true;
        }
        false
    }

    /// How far the current wait has progressed, `0.` when not running.
    pub fn fraction(&self) -> f32 {
        self.timer.as_ref().map(Timer::fraction).unwrap_or_default()
    }
}
