//! Works out whether the player is near, in the right zone and looking at each tooltip.
//!
//! Proximity normally comes from the game's trigger colliders raising [`ProximityEntered`] and
//! [`ProximityExited`] on the tooltip. [`ProximityRadius`] is a distance based stand-in for games
//! without trigger colliders.

use bevy_ecs::{
    component::Component,
    entity::Entity,
    message::MessageReader,
    observer::On,
    query::{With, Without},
    resource::Resource,
    system::{Commands, Query, Res, ResMut},
};
use bevy_log::debug;
use bevy_math::Vec3;
use bevy_transform::components::GlobalTransform;
use tiny_bail::prelude::*;

use crate::{
    TooltipConfiguration, TooltipDisabled,
    events::{ProximityEntered, ProximityExited, ZoneChanged},
    interactable::InteractableTooltip,
};

/// Marker for the camera whose view decides what the player is looking at
#[derive(Debug, Component)]
pub struct TooltipCamera;

/// Marker for the player, used by [`ProximityRadius`] and navigation trails
#[derive(Debug, Component)]
pub struct TooltipPlayer;

/// Player is near when closer than this to the tooltip
#[derive(Debug, Component, Clone, Copy)]
pub struct ProximityRadius(pub f32);

/// Zone last published, so tooltips spawned later know where the player is
#[derive(Resource, Debug, Default)]
pub struct CurrentZone(pub Option<String>);

/// What the tooltip knows about the player this frame
#[derive(Debug, Component, Default, Clone, Copy)]
pub struct TooltipPresence {
    pub player_near: bool,
    pub player_in_zone: bool,
    /// Dot product of the camera forward and the direction to the look target
    pub view_alignment: f32,
    pub looking: bool,
}

/// Dot product of the camera forward with the normalized direction from the camera to `target`.
/// `1.` when looking straight at it, `-1.` when facing away.
pub fn view_alignment(camera: &GlobalTransform, target: Vec3) -> f32 {
    let direction = (target - camera.translation()).normalize_or_zero();
    camera.forward().as_vec3().dot(direction)
}

/// `threshold` of `1.` requires looking exactly at the target, `0.` accepts anything in front.
pub fn is_looking(view_alignment: f32, threshold: f32) -> bool {
    view_alignment > threshold
}

pub(crate) fn proximity_entered(
    enter: On<ProximityEntered>,
    mut presence_query: Query<&mut TooltipPresence>,
) {
    r!(presence_query.get_mut(enter.entity)).player_near = true;
}

pub(crate) fn proximity_exited(
    exit: On<ProximityExited>,
    mut presence_query: Query<&mut TooltipPresence>,
) {
    r!(presence_query.get_mut(exit.entity)).player_near = false;
}

/// Raise proximity events from distance for tooltips with a [`ProximityRadius`]
pub(crate) fn detect_proximity_by_distance(
    player_query: Query<&GlobalTransform, With<TooltipPlayer>>,
    radius_query: Query<(Entity, &GlobalTransform, &ProximityRadius, &TooltipPresence)>,
    mut commands: Commands,
) {
    let player = rq!(player_query.single()).translation();
    for (entity, transform, radius, presence) in radius_query {
        let near = transform.translation().distance(player) <= radius.0;
        if near == presence.player_near {
            continue;
        }
        if near {
            commands.trigger(ProximityEntered { entity });
        } else {
            commands.trigger(ProximityExited { entity });
        }
    }
}

pub(crate) fn receive_zone(
    mut zone_messages: MessageReader<ZoneChanged>,
    mut current_zone: ResMut<CurrentZone>,
) {
    for ZoneChanged(zone) in zone_messages.read() {
        debug!("Player entered zone {zone}");
        current_zone.0 = Some(zone.clone());
    }
}

/// Tooltips without a zone are eligible everywhere
pub(crate) fn update_zone_presence(
    current_zone: Res<CurrentZone>,
    mut tooltips_query: Query<
        (&InteractableTooltip, &mut TooltipPresence),
        Without<TooltipDisabled>,
    >,
) {
    for (tooltip, mut presence) in &mut tooltips_query {
        presence.player_in_zone = match tooltip.zone() {
            None => true,
            Some(zone) => current_zone.0.as_deref() == Some(zone),
        };
    }
}

pub(crate) fn update_view_alignment(
    camera_query: Query<&GlobalTransform, With<TooltipCamera>>,
    target_query: Query<&GlobalTransform>,
    mut tooltips_query: Query<
        (Entity, &InteractableTooltip, &mut TooltipPresence),
        Without<TooltipDisabled>,
    >,
    configuration: Res<TooltipConfiguration>,
) {
    let camera = camera_query.single().ok();
    for (entity, tooltip, mut presence) in &mut tooltips_query {
        let Some(camera) = camera else {
            presence.looking = false;
            continue;
        };
        let target = tooltip.look_target().unwrap_or(entity);
        let Ok(target_transform) = target_query.get(target) else {
            presence.looking = false;
            continue;
        };
        presence.view_alignment = view_alignment(camera, target_transform.translation());
        let threshold = tooltip
            .field_of_view_threshold()
            .unwrap_or(configuration.field_of_view_threshold);
        presence.looking = is_looking(presence.view_alignment, threshold);
    }
}

#[cfg(test)]
mod tests {
    use bevy_app::{App, Update};
    use bevy_transform::components::Transform;

    use super::*;

    fn camera_looking_at(target: Vec3) -> GlobalTransform {
        GlobalTransform::from(Transform::from_xyz(0., 1., 0.).looking_at(target, Vec3::Y))
    }

    #[test]
    fn straight_ahead_is_fully_aligned() {
        let target = Vec3::new(0., 1., -5.);
        let camera = camera_looking_at(target);

        assert!((view_alignment(&camera, target) - 1.).abs() < 1e-5);
    }

    #[test]
    fn behind_the_camera_is_negative() {
        let camera = camera_looking_at(Vec3::new(0., 1., -5.));

        assert!(view_alignment(&camera, Vec3::new(0., 1., 5.)) < -0.99);
    }

    #[test]
    fn threshold_is_exclusive() {
        assert!(is_looking(0.81, 0.8));
        assert!(!is_looking(0.8, 0.8));
        assert!(is_looking(0.1, 0.));
    }

    #[test]
    fn despawned_look_target_stops_looking() {
        let mut app = App::new();
        app.init_resource::<TooltipConfiguration>()
            .add_systems(Update, update_view_alignment);
        app.world_mut().spawn((
            TooltipCamera,
            camera_looking_at(Vec3::new(0., 1., -5.)),
        ));
        let target = app
            .world_mut()
            .spawn(GlobalTransform::from_translation(Vec3::new(0., 1., -5.)))
            .id();
        let tooltip = app
            .world_mut()
            .spawn((
                InteractableTooltip::permanent().with_look_target(target),
                GlobalTransform::from_translation(Vec3::new(0., 1., 5.)),
            ))
            .id();

        app.update();
        assert!(app.world().get::<TooltipPresence>(tooltip).unwrap().looking);

        app.world_mut().despawn(target);
        app.update();
        assert!(!app.world().get::<TooltipPresence>(tooltip).unwrap().looking);
    }

    #[test]
    fn side_target_fails_narrow_field_of_view() {
        let camera = camera_looking_at(Vec3::new(0., 1., -5.));
        let alignment = view_alignment(&camera, Vec3::new(5., 1., -5.));

        // 45 degrees off
        assert!((alignment - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-4);
        assert!(!is_looking(alignment, 0.8));
        assert!(is_looking(alignment, 0.5));
    }
}
