use std::time::Duration;

use bevy_app::{Plugin, Update};
use bevy_ecs::{
    component::Component,
    lifecycle::HookContext,
    resource::Resource,
    schedule::{IntoScheduleConfigs, SystemSet},
    world::World,
};
use tiny_bail::prelude::*;

use crate::{
    animation::{AnimationSettings, animate_tooltips},
    arbitration::TooltipArbiter,
    control_scheme::{
        ActiveControlScheme, HelpIconMap, InputIconMap, receive_control_scheme,
        refresh_tooltip_icons,
    },
    detection::{
        CurrentZone, detect_proximity_by_distance, proximity_entered, proximity_exited,
        receive_zone, update_view_alignment, update_zone_presence,
    },
    events::{
        ActionPerformed, ControlSchemeChanged, HeadsetStateChanged, OverlayVisibilityChanged,
        ShowHelp, StopAllTooltips, ZoneChanged,
    },
    hint::HintPlugin,
    interactable::{
        InteractableTooltip, complete_on_action, display_interactable_tooltips,
        receive_overlay_visibility, receive_stop_all, validate_new_tooltips,
    },
    interruption::{InterruptionTracker, OverlayPhase},
    navigation::{NavigationTrail, set_trail_destination, update_navigation_trails},
    sequence::{receive_help_requests, tick_help_sequencers},
};

pub mod animation;
pub mod arbitration;
pub mod control_scheme;
pub mod detection;
pub mod events;
pub mod hint;
pub mod interactable;
pub mod interruption;
pub mod navigation;
pub mod sequence;
pub mod timer;

pub struct WorldTooltipPlugin;

impl Plugin for WorldTooltipPlugin {
    fn build(&self, app: &mut bevy_app::App) {
        app.add_plugins(HintPlugin)
            .add_message::<ControlSchemeChanged>()
            .add_message::<HeadsetStateChanged>()
            .add_message::<OverlayVisibilityChanged>()
            .add_message::<ZoneChanged>()
            .add_message::<StopAllTooltips>()
            .add_message::<ShowHelp>()
            .add_message::<ActionPerformed>()
            .init_resource::<TooltipConfiguration>()
            .init_resource::<TooltipArbiter>()
            .init_resource::<ActiveControlScheme>()
            .init_resource::<InputIconMap>()
            .init_resource::<HelpIconMap>()
            .init_resource::<CurrentZone>()
            .init_resource::<OverlayPhase>()
            .configure_sets(
                Update,
                (
                    TooltipSystems::Receive,
                    TooltipSystems::Evaluate,
                    TooltipSystems::Display,
                    TooltipSystems::Animate,
                )
                    .chain(),
            )
            .add_systems(
                Update,
                (
                    receive_control_scheme,
                    receive_zone,
                    receive_overlay_visibility,
                    validate_new_tooltips,
                    receive_stop_all,
                    receive_help_requests,
                )
                    .chain()
                    .in_set(TooltipSystems::Receive),
            )
            .add_systems(
                Update,
                (
                    detect_proximity_by_distance,
                    update_zone_presence,
                    update_view_alignment,
                    refresh_tooltip_icons,
                )
                    .chain()
                    .in_set(TooltipSystems::Evaluate),
            )
            .add_systems(
                Update,
                (
                    display_interactable_tooltips,
                    tick_help_sequencers,
                    update_navigation_trails,
                )
                    .in_set(TooltipSystems::Display),
            )
            .add_systems(Update, animate_tooltips.in_set(TooltipSystems::Animate));

        setup_component_hooks(app.world_mut());
    }
}

/// Order of the tooltip systems inside `Update`.
/// Presence is evaluated before any tooltip asks for permission, which happens before animations
/// start.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum TooltipSystems {
    /// Broadcast messages are applied
    Receive,
    /// Proximity, zone and look checks
    Evaluate,
    /// Arbitration and display changes
    Display,
    Animate,
}

/// Resource that configures the behaviour of tooltips
#[derive(Resource, Debug, Clone)]
pub struct TooltipConfiguration {
    /// How long a tooltip stays up after losing its permission or the player's look
    pub validation_time: Duration,

    /// Used by tooltips without their own threshold.
    /// `1.` the player must look exactly at the object, `0.` anything in front will do
    pub field_of_view_threshold: f32,

    /// Applied to every interactable tooltip when it is spawned
    pub animation: AnimationSettings,
}

impl Default for TooltipConfiguration {
    fn default() -> Self {
        Self {
            validation_time: Duration::from_secs_f64(0.75),
            field_of_view_threshold: 0.8,
            animation: AnimationSettings::default(),
        }
    }
}

/// Marker for tooltips that are ignored by every system.
/// Added to misconfigured tooltips and by [`StopAllTooltips`], remove it to bring the tooltip back.
#[derive(Debug, Component)]
pub struct TooltipDisabled;

/// Setup hooks so that interactions will work.
/// Observers die with the entity, removing the component alone leaves them in place.
fn setup_component_hooks(world: &mut World) {
    world
        .register_component_hooks::<InteractableTooltip>()
        .on_add(|mut world, HookContext { entity, .. }| {
            let permanent = r!(world.get::<InteractableTooltip>(entity)).is_permanent();
            let mut commands = world.commands();
            let mut tooltip_commands = r!(commands.get_entity(entity));
            tooltip_commands
                .observe(proximity_entered)
                .observe(proximity_exited)
                .observe(complete_on_action);
            if !permanent {
                tooltip_commands.insert(InterruptionTracker::default());
            }
        })
        .on_remove(|mut world, HookContext { entity, .. }| {
            if let Some(mut arbiter) = world.get_resource_mut::<TooltipArbiter>() {
                arbiter.notify_hide(entity);
            }
        });

    world
        .register_component_hooks::<NavigationTrail>()
        .on_add(|mut world, HookContext { entity, .. }| {
            r!(world.commands().get_entity(entity)).observe(set_trail_destination);
        });
}
