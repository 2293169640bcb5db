//! Remembers whether a punctual tooltip was on screen when the overlay covered the tooltips,
//! so it can come back once the overlay goes away.

use bevy_ecs::{component::Component, resource::Resource};

/// Whether the overlay currently allows tooltips to show.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum OverlayPhase {
    /// Tooltips may show
    #[default]
    Active,
    /// An overlay is covering tooltips, everything is force hidden
    Suspended,
}

impl OverlayPhase {
    pub fn from_visibility(tooltips_visible: bool) -> Self {
        if tooltips_visible {
            OverlayPhase::Active
        } else {
            OverlayPhase::Suspended
        }
    }
}

/// The two interruption flags always move together, so they are stored as one state.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum InterruptionState {
    #[default]
    Clear,
    /// The overlay appeared while the tooltip was displayed
    InterruptedWhileShowing,
}

/// Interruption bookkeeping for punctual tooltips.
/// Permanent tooltips do not carry this, they are re-derived from the world each tick.
#[derive(Debug, Component, Default, Clone, Copy)]
pub struct InterruptionTracker {
    state: InterruptionState,
}

impl InterruptionTracker {
    pub fn state(&self) -> InterruptionState {
        self.state
    }

    pub fn was_interrupted_by_overlay(&self) -> bool {
        self.state == InterruptionState::InterruptedWhileShowing
    }

    pub fn was_showing_before_overlay(&self) -> bool {
        self.state == InterruptionState::InterruptedWhileShowing
    }

    /// Called every tick while suspended.
    /// Only the first suspended tick with the tooltip displayed marks the interruption.
    pub fn on_suspended(&mut self, displayed: bool) {
        if self.state == InterruptionState::Clear && displayed {
            self.state = InterruptionState::InterruptedWhileShowing;
        }
    }

    /// Called when tooltips are allowed again, resumes silently.
    /// Returns `true` if an interruption was pending.
    pub fn on_active(&mut self) -> bool {
        let was_interrupted = self.state == InterruptionState::InterruptedWhileShowing;
        self.clear();
        was_interrupted
    }

    /// An interrupted tooltip whose trigger condition still holds.
    pub fn has_incomplete_tooltip(&self, conditions: ResumeConditions) -> bool {
        self.state == InterruptionState::InterruptedWhileShowing && conditions.all_hold()
    }

    /// Clears the interruption if the tooltip is still eligible.
    /// Returns `true` when the tooltip should show again.
    pub fn resume_after_interruption(&mut self, conditions: ResumeConditions) -> bool {
        if !self.has_incomplete_tooltip(conditions) {
            return false;
        }
        self.clear();
        true
    }

    pub fn clear(&mut self) {
        self.state = InterruptionState::Clear;
    }
}

/// World state that must still hold for an interrupted tooltip to come back.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResumeConditions {
    pub player_near: bool,
    pub player_in_zone: bool,
    pub looking: bool,
    pub completed: bool,
}

impl ResumeConditions {
    fn all_hold(&self) -> bool {
        self.player_near && self.player_in_zone && self.looking && !self.completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ELIGIBLE: ResumeConditions = ResumeConditions {
        player_near: true,
        player_in_zone: true,
        looking: true,
        completed: false,
    };

    #[test]
    fn hidden_tooltip_is_not_marked() {
        let mut tracker = InterruptionTracker::default();
        tracker.on_suspended(false);

        assert_eq!(tracker.state(), InterruptionState::Clear);
        assert!(!tracker.has_incomplete_tooltip(ELIGIBLE));
    }

    #[test]
    fn displayed_tooltip_is_marked_once() {
        let mut tracker = InterruptionTracker::default();
        tracker.on_suspended(true);
        // following suspended ticks see it force hidden
        tracker.on_suspended(false);

        assert!(tracker.was_interrupted_by_overlay());
        assert!(tracker.was_showing_before_overlay());
        assert!(tracker.has_incomplete_tooltip(ELIGIBLE));
    }

    #[test]
    fn resume_needs_every_condition() {
        let mut tracker = InterruptionTracker::default();
        tracker.on_suspended(true);

        let left_zone = ResumeConditions {
            player_in_zone: false,
            ..ELIGIBLE
        };
        assert!(!tracker.resume_after_interruption(left_zone));
        assert!(tracker.was_interrupted_by_overlay());

        let completed = ResumeConditions {
            completed: true,
            ..ELIGIBLE
        };
        assert!(!tracker.resume_after_interruption(completed));

        assert!(tracker.resume_after_interruption(ELIGIBLE));
        assert_eq!(tracker.state(), InterruptionState::Clear);
    }

    #[test]
    fn becoming_active_clears_both_flags() {
        let mut tracker = InterruptionTracker::default();
        tracker.on_suspended(true);

        assert!(tracker.on_active());
        assert!(!tracker.was_interrupted_by_overlay());
        assert!(!tracker.was_showing_before_overlay());
        assert!(!tracker.on_active());
    }
}
