//! Broadcast channels consumed by the tooltips and the events users can react to.
//!
//! Messages are how the rest of the game talks to the tooltips, one message type per broadcast.
//! Entity events are triggered on tooltip entities so users can observe them to style or animate.

use bevy_ecs::{component::Component, entity::Entity, event::EntityEvent, message::Message};
use bevy_math::{Vec2, Vec3};

use crate::{
    control_scheme::ControlScheme,
    sequence::{HelpStepKind, SkipReason},
};

/// The input device in use changed
#[derive(Message, Debug, Clone, Copy)]
pub struct ControlSchemeChanged(pub ControlScheme);

/// A headset was put on (`true`) or taken off (`false`)
#[derive(Message, Debug, Clone, Copy)]
pub struct HeadsetStateChanged(pub bool);

/// `false` when an overlay covers the tooltips, `true` when tooltips may show again
#[derive(Message, Debug, Clone, Copy)]
pub struct OverlayVisibilityChanged(pub bool);

/// The zone the player is now in
#[derive(Message, Debug, Clone)]
pub struct ZoneChanged(pub String);

/// Cancel everything in flight and hide every tooltip
#[derive(Message, Debug, Clone, Copy)]
pub struct StopAllTooltips;

/// Start the onboarding help tooltips
#[derive(Message, Debug, Clone, Copy)]
pub enum ShowHelp {
    /// Only the step of this kind
    Single(HelpStepKind),
    /// Every configured step in order
    All,
}

/// An input action was performed this frame, the string is the action name
#[derive(Message, Debug, Clone)]
pub struct ActionPerformed(pub String);

/// Trigger on a tooltip when the player enters its proximity trigger
#[derive(Debug, EntityEvent)]
pub struct ProximityEntered {
    pub entity: Entity,
}

/// Trigger on a tooltip when the player leaves its proximity trigger
#[derive(Debug, EntityEvent)]
pub struct ProximityExited {
    pub entity: Entity,
}

/// Trigger on a punctual tooltip when the player performed what it asked for.
/// The tooltip will not show again.
#[derive(Debug, EntityEvent)]
pub struct TooltipActionPerformed {
    pub entity: Entity,
}

#[derive(Debug, EntityEvent)]
pub struct TooltipShown {
    pub entity: Entity,
}

#[derive(Debug, EntityEvent)]
pub struct TooltipHidden {
    pub entity: Entity,
    /// `false` when the tooltip was snapped hidden, for example under an overlay
    pub animated: bool,
}

/// An interrupted punctual tooltip is allowed back after the overlay went away
#[derive(Debug, EntityEvent)]
pub struct TooltipResumed {
    pub entity: Entity,
}

#[derive(Debug, EntityEvent)]
pub struct TooltipCompleted {
    pub entity: Entity,
}

#[derive(Debug, EntityEvent)]
pub struct HelpStepStarted {
    pub entity: Entity,
    pub kind: HelpStepKind,
}

#[derive(Debug, EntityEvent)]
pub struct HelpStepCompleted {
    pub entity: Entity,
    pub kind: HelpStepKind,
}

/// The step was passed over without completion
#[derive(Debug, EntityEvent)]
pub struct HelpStepSkipped {
    pub entity: Entity,
    pub kind: HelpStepKind,
    pub reason: SkipReason,
}

#[derive(Debug, EntityEvent)]
pub struct HelpSequenceFinished {
    pub entity: Entity,
}

/// Trigger on a [`crate::navigation::NavigationTrail`] to guide the player somewhere
#[derive(Debug, EntityEvent)]
pub struct NavigationDestinationSet {
    pub entity: Entity,
    pub destination: Vec3,
}

#[derive(Debug, EntityEvent)]
pub struct NavigationArrived {
    pub entity: Entity,
}

/// Waypoints changed, `map_path` is the remaining trail projected on the map (0..1 on both axis)
#[derive(Debug, EntityEvent)]
pub struct NavigationTrailChanged {
    pub entity: Entity,
    pub map_path: Vec<Vec2>,
}

/// Marker to indicate this interactable has been ignored for a while.
/// When this component is added user should apply styling so it draws the player's attention.
/// See the hint module for details
#[derive(Debug, Component)]
pub struct TooltipHinting;
