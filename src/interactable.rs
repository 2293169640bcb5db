//! Interactable tooltips, shown next to an object when the player is near, in the
//! right zone and looking at it.
//!
//! Each frame a tooltip is first evaluated (see [`crate::detection`]), then asks the
//! [`TooltipArbiter`] for permission, then its [`TooltipDisplay`] and [`TooltipAnimation`] change.

use std::fmt;

use bevy_derive::{Deref, DerefMut};
use bevy_ecs::{
    change_detection::DetectChangesMut,
    component::Component,
    entity::Entity,
    message::MessageReader,
    observer::On,
    query::{Added, Has, QueryData, Without},
    system::{Commands, Query, Res, ResMut},
};
use bevy_log::{debug, warn};
use bevy_time::Time;
use tiny_bail::prelude::*;

use crate::{
    TooltipConfiguration, TooltipDisabled,
    animation::TooltipAnimation,
    arbitration::TooltipArbiter,
    control_scheme::TooltipInputBinding,
    detection::TooltipPresence,
    events::{
        OverlayVisibilityChanged, StopAllTooltips, TooltipActionPerformed, TooltipCompleted,
        TooltipHidden, TooltipResumed, TooltipShown,
    },
    interruption::{InterruptionTracker, OverlayPhase, ResumeConditions},
    timer::CancellableDelay,
};

/// Place this on an object the player can interact with.
/// Also needs a [`TooltipInputBinding`] and a `GlobalTransform`.
#[derive(Debug, Component, Clone)]
#[require(TooltipPresence, TooltipDisplay, TooltipAnimation, HideCountdown)]
pub struct InteractableTooltip {
    permanent: bool,
    bypass_arbitration: bool,
    field_of_view_threshold: Option<f32>,
    zone: Option<String>,
    look_target: Option<Entity>,
}

impl InteractableTooltip {
    /// Reappears whenever the player is near, in zone and looking
    pub fn permanent() -> Self {
        Self {
            permanent: true,
            ..Self::punctual()
        }
    }

    /// Shows until [`TooltipActionPerformed`] is triggered on it, then never again
    pub fn punctual() -> Self {
        Self {
            permanent: false,
            bypass_arbitration: false,
            field_of_view_threshold: None,
            zone: None,
            look_target: None,
        }
    }

    /// Only eligible while the player is in this zone
    pub fn with_zone(mut self, zone: impl ToString) -> Self {
        self.zone = Some(zone.to_string());
        self
    }

    /// `1.` the player must look exactly at the object, `0.` anything in front will do.
    /// Falls back on [`TooltipConfiguration::field_of_view_threshold`]
    pub fn with_field_of_view_threshold(mut self, threshold: f32) -> Self {
        self.field_of_view_threshold = Some(threshold);
        self
    }

    /// Entity the player has to look at, the tooltip itself by default
    pub fn with_look_target(mut self, target: Entity) -> Self {
        self.look_target = Some(target);
        self
    }

    /// Always allowed to show, for debugging a single tooltip
    pub fn bypassing_arbitration(mut self) -> Self {
        self.bypass_arbitration = true;
        self
    }

    pub fn is_permanent(&self) -> bool {
        self.permanent
    }

    pub fn zone(&self) -> Option<&str> {
        self.zone.as_deref()
    }

    pub fn field_of_view_threshold(&self) -> Option<f32> {
        self.field_of_view_threshold
    }

    pub fn look_target(&self) -> Option<Entity> {
        self.look_target
    }

    fn validate(&self, has_binding: bool) -> Result<(), TooltipConfigError> {
        if let Some(threshold) = self.field_of_view_threshold
            && !(0. ..=1.).contains(&threshold)
        {
            return Err(TooltipConfigError::FieldOfView(threshold));
        }
        if !has_binding {
            return Err(TooltipConfigError::MissingBinding);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum TooltipConfigError {
    FieldOfView(f32),
    MissingBinding,
}

impl fmt::Display for TooltipConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TooltipConfigError::FieldOfView(threshold) => {
                write!(f, "field of view threshold {threshold} is outside 0..=1")
            }
            TooltipConfigError::MissingBinding => write!(f, "no TooltipInputBinding"),
        }
    }
}

/// What the user should draw for this tooltip
#[derive(Debug, Component, Default, Clone, Copy, PartialEq, Eq)]
pub enum TooltipDisplay {
    #[default]
    Hidden,
    /// The small indicator visible from afar
    Distant,
    /// The full tooltip with its binding
    Shown,
}

/// Started when the tooltip loses its permission or the player looks away,
/// hides the tooltip unless cancelled in time
#[derive(Debug, Component, Default, Deref, DerefMut)]
pub struct HideCountdown(CancellableDelay);

/// Marker for punctual tooltips whose action has been performed
#[derive(Debug, Component)]
pub struct TooltipDone;

#[derive(QueryData)]
#[query_data(mutable)]
pub(crate) struct TooltipTickQuery {
    entity: Entity,
    tooltip: &'static InteractableTooltip,
    presence: &'static TooltipPresence,
    display: &'static mut TooltipDisplay,
    animation: &'static mut TooltipAnimation,
    countdown: &'static mut HideCountdown,
    tracker: Option<&'static mut InterruptionTracker>,
    done: Has<TooltipDone>,
}

/// Display changes of a single tooltip during a tick.
/// Only transitions trigger events, repeating a hide or show is free.
struct TooltipTick<'a, 'w, 's> {
    entity: Entity,
    display: TooltipDisplay,
    animation: &'a mut TooltipAnimation,
    overlay: OverlayPhase,
    done: bool,
    commands: &'a mut Commands<'w, 's>,
}

impl TooltipTick<'_, '_, '_> {
    fn show(&mut self) {
        if self.display == TooltipDisplay::Shown {
            return;
        }
        self.display = TooltipDisplay::Shown;
        self.animation.show();
        self.commands.trigger(TooltipShown {
            entity: self.entity,
        });
    }

    fn hide(&mut self) {
        let resting = if self.overlay == OverlayPhase::Active && !self.done {
            TooltipDisplay::Distant
        } else {
            TooltipDisplay::Hidden
        };
        if self.display == TooltipDisplay::Shown {
            self.animation.hide();
            self.commands.trigger(TooltipHidden {
                entity: self.entity,
                animated: true,
            });
        }
        self.display = resting;
    }

    /// Snap hidden, used when the player could not see the animation anyway
    fn hide_without_animation(&mut self) {
        if self.display == TooltipDisplay::Hidden && self.animation.is_at_rest_hidden() {
            return;
        }
        let was_shown = self.display == TooltipDisplay::Shown;
        self.display = TooltipDisplay::Hidden;
        self.animation.snap_hidden();
        if was_shown {
            self.commands.trigger(TooltipHidden {
                entity: self.entity,
                animated: false,
            });
        }
    }

    /// Releases the ticket even when not shown, an overlay hide keeps it
    fn notify_and_hide(&mut self, arbiter: Option<&mut TooltipArbiter>) {
        if let Some(arbiter) = arbiter {
            arbiter.notify_hide(self.entity);
        }
        self.hide();
    }
}

/// Fail closed: no arbiter means no permission
fn request_permission(
    entity: Entity,
    presence: &TooltipPresence,
    tooltip: &InteractableTooltip,
    arbiter: Option<&mut TooltipArbiter>,
) -> bool {
    if tooltip.bypass_arbitration {
        return true;
    }
    arbiter.is_some_and(|arbiter| arbiter.request_show(presence.view_alignment, entity))
}

fn update_visibility(
    tick: &mut TooltipTick,
    tooltip: &InteractableTooltip,
    presence: &TooltipPresence,
    countdown: &mut HideCountdown,
    arbiter: Option<&mut TooltipArbiter>,
    configuration: &TooltipConfiguration,
) {
    if presence.looking && request_permission(tick.entity, presence, tooltip, arbiter) {
        tick.show();
        countdown.stop();
    } else if !countdown.is_running() {
        countdown.start(configuration.validation_time);
    }
}

fn tick_permanent(
    tick: &mut TooltipTick,
    tooltip: &InteractableTooltip,
    presence: &TooltipPresence,
    countdown: &mut HideCountdown,
    mut arbiter: Option<&mut TooltipArbiter>,
    configuration: &TooltipConfiguration,
) {
    if tick.overlay == OverlayPhase::Suspended {
        tick.hide_without_animation();
        return;
    }
    if !presence.player_in_zone {
        if let Some(arbiter) = arbiter.as_deref_mut() {
            arbiter.notify_hide(tick.entity);
        }
        tick.hide_without_animation();
        return;
    }
    if !presence.player_near {
        tick.notify_and_hide(arbiter);
        return;
    }
    update_visibility(tick, tooltip, presence, countdown, arbiter, configuration);
}

fn tick_punctual(
    tick: &mut TooltipTick,
    tooltip: &InteractableTooltip,
    presence: &TooltipPresence,
    tracker: &mut InterruptionTracker,
    countdown: &mut HideCountdown,
    mut arbiter: Option<&mut TooltipArbiter>,
    configuration: &TooltipConfiguration,
) {
    if tick.overlay == OverlayPhase::Suspended {
        tracker.on_suspended(tick.display == TooltipDisplay::Shown);
        tick.hide_without_animation();
        return;
    }

    if tracker.was_interrupted_by_overlay() {
        let conditions = ResumeConditions {
            player_near: presence.player_near,
            player_in_zone: presence.player_in_zone,
            looking: presence.looking,
            completed: tick.done,
        };
        if tracker.resume_after_interruption(conditions) {
            debug!("Resuming {} after the overlay", tick.entity);
            tick.commands.trigger(TooltipResumed {
                entity: tick.entity,
            });
        } else {
            debug!("{} no longer eligible after the overlay", tick.entity);
            tracker.on_active();
        }
    }

    if tick.done {
        countdown.stop();
        tick.notify_and_hide(arbiter);
        return;
    }
    if !presence.player_in_zone {
        if let Some(arbiter) = arbiter.as_deref_mut() {
            arbiter.notify_hide(tick.entity);
        }
        tick.hide_without_animation();
        return;
    }
    if !presence.player_near {
        tick.notify_and_hide(arbiter);
        return;
    }
    update_visibility(tick, tooltip, presence, countdown, arbiter, configuration);
}

/// Evaluate, arbitrate then render every enabled interactable tooltip
pub(crate) fn display_interactable_tooltips(
    mut tooltips_query: Query<TooltipTickQuery, Without<TooltipDisabled>>,
    mut arbiter: Option<ResMut<TooltipArbiter>>,
    overlay: Res<OverlayPhase>,
    configuration: Res<TooltipConfiguration>,
    time: Res<Time>,
    mut commands: Commands,
) {
    for mut tooltip_item in &mut tooltips_query {
        let entity = tooltip_item.entity;
        let tooltip = tooltip_item.tooltip;
        let presence = *tooltip_item.presence;
        let mut tick = TooltipTick {
            entity,
            display: *tooltip_item.display,
            animation: &mut tooltip_item.animation,
            overlay: *overlay,
            done: tooltip_item.done,
            commands: &mut commands,
        };

        if tooltip_item.countdown.tick(time.delta()) {
            tick.notify_and_hide(arbiter.as_deref_mut());
        }

        if tooltip.permanent {
            tick_permanent(
                &mut tick,
                tooltip,
                &presence,
                &mut tooltip_item.countdown,
                arbiter.as_deref_mut(),
                &configuration,
            );
        } else {
            let tracker = c!(tooltip_item.tracker.as_deref_mut());
            tick_punctual(
                &mut tick,
                tooltip,
                &presence,
                tracker,
                &mut tooltip_item.countdown,
                arbiter.as_deref_mut(),
                &configuration,
            );
        }

        let display = tick.display;
        tooltip_item.display.set_if_neq(display);
    }
}

pub(crate) fn receive_overlay_visibility(
    mut overlay_messages: MessageReader<OverlayVisibilityChanged>,
    mut overlay: ResMut<OverlayPhase>,
    mut tooltips_query: Query<(&InteractableTooltip, &mut HideCountdown)>,
) {
    for OverlayVisibilityChanged(tooltips_visible) in overlay_messages.read() {
        let phase = OverlayPhase::from_visibility(*tooltips_visible);
        if !overlay.set_if_neq(phase) {
            continue;
        }
        debug!("Overlay phase is now {phase:?}");
        if phase == OverlayPhase::Active {
            for (tooltip, mut countdown) in &mut tooltips_query {
                if tooltip.permanent {
                    notify_overlay_hidden(&mut countdown);
                }
            }
        }
    }
}

/// Permanent tooltips keep no memory of the overlay, they simply re-evaluate
/// from the world on their next tick.
fn notify_overlay_hidden(countdown: &mut HideCountdown) {
    countdown.stop();
}

/// Disables every interactable tooltip, remove [`TooltipDisabled`] to bring one back
pub(crate) fn receive_stop_all(
    mut stop_messages: MessageReader<StopAllTooltips>,
    mut tooltips_query: Query<TooltipTickQuery, Without<TooltipDisabled>>,
    mut arbiter: Option<ResMut<TooltipArbiter>>,
    overlay: Res<OverlayPhase>,
    mut commands: Commands,
) {
    if stop_messages.read().count() == 0 {
        return;
    }
    for mut tooltip_item in &mut tooltips_query {
        let entity = tooltip_item.entity;
        tooltip_item.countdown.stop();
        if let Some(mut tracker) = tooltip_item.tracker {
            tracker.clear();
        }
        if let Some(arbiter) = arbiter.as_deref_mut() {
            arbiter.notify_hide(entity);
        }
        let mut tick = TooltipTick {
            entity,
            display: *tooltip_item.display,
            animation: &mut tooltip_item.animation,
            overlay: *overlay,
            done: tooltip_item.done,
            commands: &mut commands,
        };
        tick.hide_without_animation();
        let display = tick.display;
        tooltip_item.display.set_if_neq(display);
        c!(commands.get_entity(entity)).insert(TooltipDisabled);
    }
    debug!("Stopped all interactable tooltips");
}

/// Misconfigured tooltips disable themselves instead of breaking the scene
pub(crate) fn validate_new_tooltips(
    mut new_tooltips_query: Query<
        (
            Entity,
            &InteractableTooltip,
            Has<TooltipInputBinding>,
            &mut TooltipAnimation,
        ),
        Added<InteractableTooltip>,
    >,
    configuration: Res<TooltipConfiguration>,
    mut commands: Commands,
) {
    for (entity, tooltip, has_binding, mut animation) in &mut new_tooltips_query {
        if let Err(problem) = tooltip.validate(has_binding) {
            warn!("Disabling tooltip {entity}: {problem}");
            c!(commands.get_entity(entity)).insert(TooltipDisabled);
            continue;
        }
        if animation.is_at_rest_hidden() {
            *animation = TooltipAnimation::new(configuration.animation.clone());
        }
    }
}

/// Punctual tooltips are done once the player performs their action
pub(crate) fn complete_on_action(
    action: On<TooltipActionPerformed>,
    tooltip_query: Query<(&InteractableTooltip, Has<TooltipDone>)>,
    mut commands: Commands,
) {
    let (tooltip, done) = r!(tooltip_query.get(action.entity));
    if tooltip.permanent || done {
        return;
    }
    r!(commands.get_entity(action.entity)).insert(TooltipDone);
    commands.trigger(TooltipCompleted {
        entity: action.entity,
    });
}
