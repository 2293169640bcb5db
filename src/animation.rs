//! Scalar show/hide transitions.
//!
//! The crate never touches rendering, it only moves a value that the user applies to the
//! tooltip, as a scale for [`AnimationKind::Pop`] or an alpha for [`AnimationKind::Fade`].

use std::time::Duration;

use bevy_ecs::{
    component::Component,
    system::{Query, Res},
};
use bevy_math::curve::{Curve, EaseFunction, EasingCurve};
use bevy_time::{Time, Timer, TimerMode};

/// Fade in takes this much longer than fade out
const FADE_IN_STRETCH: f32 = 1.75;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum AnimationKind {
    /// Scale from `hidden_scale` up to `1.`
    #[default]
    Pop,
    /// Alpha from `0.` to `1.`
    Fade,
}

#[derive(Debug, Clone)]
pub struct AnimationSettings {
    pub kind: AnimationKind,
    pub duration: Duration,
    /// Scale of a hidden tooltip when popping
    pub hidden_scale: f32,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self {
            kind: AnimationKind::Pop,
            duration: Duration::from_secs_f32(0.075),
            hidden_scale: 0.5,
        }
    }
}

#[derive(Debug, Clone)]
struct ScalarTween {
    from: f32,
    to: f32,
    ease: EaseFunction,
    timer: Timer,
}

impl ScalarTween {
    fn new(from: f32, to: f32, duration: Duration, ease: EaseFunction) -> Self {
        Self {
            from,
            to,
            ease,
            timer: Timer::new(duration, TimerMode::Once),
        }
    }

    fn sample(&self) -> f32 {
        if self.timer.duration().is_zero() {
            return self.to;
        }
        EasingCurve::new(self.from, self.to, self.ease).sample_clamped(self.timer.fraction())
    }
}

/// The animated value of a tooltip, read it every frame to scale or fade the tooltip.
#[derive(Debug, Component, Clone)]
pub struct TooltipAnimation {
    settings: AnimationSettings,
    value: f32,
    tween: Option<ScalarTween>,
}

impl Default for TooltipAnimation {
    fn default() -> Self {
        Self::new(AnimationSettings::default())
    }
}

impl TooltipAnimation {
    pub fn new(settings: AnimationSettings) -> Self {
        let mut animation = Self {
            settings,
            value: 0.,
            tween: None,
        };
        animation.value = animation.hidden_value();
        animation
    }

    pub fn kind(&self) -> AnimationKind {
        self.settings.kind
    }

    /// Current scale or alpha depending on [`AnimationKind`]
    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn is_animating(&self) -> bool {
        self.tween.is_some()
    }

    /// Fully hidden and not moving, the user can stop drawing the tooltip
    pub fn is_at_rest_hidden(&self) -> bool {
        self.tween.is_none() && self.value == self.hidden_value()
    }

    pub(crate) fn show(&mut self) {
        match self.settings.kind {
            AnimationKind::Pop => {
                self.transition_to(1., self.settings.duration, EaseFunction::SineInOut)
            }
            AnimationKind::Fade => self.transition_to(
                1.,
                self.settings.duration.mul_f32(FADE_IN_STRETCH),
                EaseFunction::Linear,
            ),
        }
    }

    pub(crate) fn hide(&mut self) {
        let hidden = self.hidden_value();
        let ease = match self.settings.kind {
            AnimationKind::Pop => EaseFunction::SineInOut,
            AnimationKind::Fade => EaseFunction::Linear,
        };
        self.transition_to(hidden, self.settings.duration, ease);
    }

    /// Cancel any transition and jump to hidden
    pub(crate) fn snap_hidden(&mut self) {
        self.tween = None;
        self.value = self.hidden_value();
    }

    /// Advance the transition, returns `true` on the tick it finishes
    pub(crate) fn tick(&mut self, delta: Duration) -> bool {
        let Some(tween) = self.tween.as_mut() else {
            return false;
        };
        tween.timer.tick(delta);
        self.value = tween.sample();
        if tween.timer.is_finished() {
            self.tween = None;
            return true;
        }
        false
    }

    fn transition_to(&mut self, target: f32, duration: Duration, ease: EaseFunction) {
        if self.value == target && self.tween.is_none() {
            return;
        }
        if let Some(tween) = &self.tween
            && tween.to == target
        {
            return;
        }
        self.tween = Some(ScalarTween::new(self.value, target, duration, ease));
    }

    fn hidden_value(&self) -> f32 {
        match self.settings.kind {
            AnimationKind::Pop => self.settings.hidden_scale,
            AnimationKind::Fade => 0.,
        }
    }
}

pub(crate) fn animate_tooltips(mut animation_query: Query<&mut TooltipAnimation>, time: Res<Time>) {
    for mut animation in &mut animation_query {
        if animation.is_animating() {
            animation.tick(time.delta());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fade() -> TooltipAnimation {
        TooltipAnimation::new(AnimationSettings {
            kind: AnimationKind::Fade,
            duration: Duration::from_millis(100),
            hidden_scale: 0.5,
        })
    }

    #[test]
    fn pop_starts_at_hidden_scale() {
        let animation = TooltipAnimation::default();

        assert_eq!(animation.value(), 0.5);
        assert!(animation.is_at_rest_hidden());
    }

    #[test]
    fn fade_in_is_slower_than_fade_out() {
        let mut animation = fade();
        animation.show();
        assert!(!animation.tick(Duration::from_millis(100)));
        assert!(animation.value() < 1.);
        assert!(animation.tick(Duration::from_millis(75)));
        assert_eq!(animation.value(), 1.);

        animation.hide();
        assert!(animation.tick(Duration::from_millis(100)));
        assert_eq!(animation.value(), 0.);
    }

    #[test]
    fn showing_twice_keeps_running_transition() {
        let mut animation = TooltipAnimation::default();
        animation.show();
        animation.tick(Duration::from_millis(50));
        let halfway = animation.value();
        animation.show();
        animation.tick(Duration::ZERO);

        assert_eq!(animation.value(), halfway);
    }

    #[test]
    fn snap_cancels_transition() {
        let mut animation = TooltipAnimation::default();
        animation.show();
        animation.tick(Duration::from_millis(10));
        animation.snap_hidden();

        assert!(!animation.is_animating());
        assert!(!animation.tick(Duration::from_secs(1)));
        assert_eq!(animation.value(), 0.5);
    }

    #[test]
    fn hiding_an_already_hidden_tooltip_does_not_animate() {
        let mut animation = TooltipAnimation::default();
        animation.hide();

        assert!(!animation.is_animating());
    }
}
