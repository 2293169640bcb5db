//! Waypoint trails leading the player to a destination.
//!
//! Path finding belongs to the game: it listens to [`NavigationDestinationSet`] (or reads
//! [`NavigationTrail::destination`]) and hands the path corners back with
//! [`NavigationTrail::set_path`]. The trail lays waypoints along the corners, drops them as the
//! player walks by and lays them again when the player wanders off.

use std::collections::VecDeque;

use bevy_ecs::{
    component::Component,
    entity::Entity,
    message::MessageReader,
    observer::On,
    query::With,
    system::{Commands, Query, Res},
};
use bevy_log::{debug, warn};
use bevy_math::{Vec2, Vec3};
use bevy_transform::components::GlobalTransform;
use tiny_bail::prelude::*;

use crate::{
    detection::TooltipPlayer,
    events::{NavigationArrived, NavigationDestinationSet, NavigationTrailChanged, StopAllTooltips},
    interruption::OverlayPhase,
};

/// Below this the player is standing still
const MOVEMENT_THRESHOLD: f32 = 0.005;
/// Smallest step that counts as heading somewhere
const HEADING_MIN_STEP: f32 = 0.01;
/// Dot product between movement and the direction to the next waypoint
const HEADING_SIMILARITY: f32 = 0.5;

/// Three corners of the map in world space, used to place the trail on a minimap
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapBounds {
    pub top_left: Vec3,
    pub top_right: Vec3,
    pub bottom_left: Vec3,
}

impl MapBounds {
    /// `(0, 0)` at the top left corner, `(1, 1)` at the bottom right one.
    /// `None` if the bounds are flat.
    pub fn project(&self, point: Vec3) -> Option<Vec2> {
        let width = self.top_left.x - self.top_right.x;
        let height = self.top_left.z - self.bottom_left.z;
        if width == 0. || height == 0. {
            return None;
        }
        Some(Vec2::new(
            (self.top_left.x - point.x) / width,
            (self.top_left.z - point.z) / height,
        ))
    }
}

/// Points every `spacing` along the corners, the distance left over at a corner carries on to
/// the next segment.
pub fn lay_waypoints(corners: &[Vec3], spacing: f32) -> Vec<Vec3> {
    let mut waypoints = Vec::new();
    if spacing <= 0. {
        warn!("Waypoint spacing must be positive, got {spacing}");
        return waypoints;
    }
    let mut covered = 0.;
    for segment in corners.windows(2) {
        let (start, end) = (segment[0], segment[1]);
        let length = start.distance(end);
        while covered + spacing <= length {
            covered += spacing;
            waypoints.push(start.lerp(end, covered / length));
        }
        covered -= length;
    }
    waypoints
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrailUpdate {
    Unchanged,
    /// Waypoints were dropped or laid again
    Changed,
    /// The player reached the destination, the trail is now empty
    Arrived,
}

/// Put this on the entity that draws the trail, one sprite per waypoint
#[derive(Debug, Component, Clone)]
pub struct NavigationTrail {
    pub spacing: f32,
    /// Arrived when this close to the destination
    pub destination_threshold: f32,
    /// Further than this from the next waypoint the trail is laid again
    pub first_waypoint_threshold: f32,
    /// Further than this from every waypoint the player is off the path
    pub path_threshold: f32,
    pub map_bounds: Option<MapBounds>,
    destination: Option<Vec3>,
    corners: Vec<Vec3>,
    waypoints: VecDeque<Vec3>,
    last_player_position: Option<Vec3>,
    visible: bool,
}

impl Default for NavigationTrail {
    fn default() -> Self {
        Self {
            spacing: 1.,
            destination_threshold: 1.,
            first_waypoint_threshold: 3.,
            path_threshold: 1.5,
            map_bounds: None,
            destination: None,
            corners: Vec::new(),
            waypoints: VecDeque::new(),
            last_player_position: None,
            visible: false,
        }
    }
}

impl NavigationTrail {
    pub fn with_map_bounds(mut self, map_bounds: MapBounds) -> Self {
        self.map_bounds = Some(map_bounds);
        self
    }

    pub fn destination(&self) -> Option<Vec3> {
        self.destination
    }

    pub fn waypoints(&self) -> impl Iterator<Item = &Vec3> {
        self.waypoints.iter()
    }

    /// Draw the trail only when this is `true`
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Forget the previous path, waypoints come once [`NavigationTrail::set_path`] is called
    pub fn set_destination(&mut self, destination: Vec3) {
        self.destination = Some(destination);
        self.corners.clear();
        self.waypoints.clear();
    }

    /// Latest path corners from the player to the destination.
    /// Waypoints are only laid again when the player strays, see [`NavigationTrail::advance`].
    pub fn set_path(&mut self, corners: Vec<Vec3>) {
        self.corners = corners;
    }

    pub fn clear(&mut self) {
        self.destination = None;
        self.corners.clear();
        self.waypoints.clear();
        self.visible = false;
    }

    /// Remaining waypoints placed on the map
    pub fn map_path(&self) -> Vec<Vec2> {
        let Some(bounds) = self.map_bounds else {
            return Vec::new();
        };
        self.waypoints
            .iter()
            .filter_map(|waypoint| bounds.project(*waypoint))
            .collect()
    }

    pub fn advance(&mut self, player: Vec3) -> TrailUpdate {
        let Some(destination) = self.destination else {
            return TrailUpdate::Unchanged;
        };
        if player.distance(destination) <= self.destination_threshold {
            self.clear();
            return TrailUpdate::Arrived;
        }
        let last = self.last_player_position.replace(player).unwrap_or(player);
        if self.corners.is_empty() {
            return TrailUpdate::Unchanged;
        }
        if self.waypoints.is_empty() {
            return self.relay();
        }

        if self.is_heading_to_next(player, last) {
            return self.drop_reached(player);
        }
        if !self.is_near_next(player) {
            return self.relay();
        }
        if !self.is_on_path(player) && player.distance(last) <= MOVEMENT_THRESHOLD {
            return self.relay();
        }
        TrailUpdate::Unchanged
    }

    fn relay(&mut self) -> TrailUpdate {
        let laid = lay_waypoints(&self.corners, self.spacing);
        if self.waypoints.iter().eq(laid.iter()) {
            return TrailUpdate::Unchanged;
        }
        self.waypoints = laid.into();
        TrailUpdate::Changed
    }

    fn drop_reached(&mut self, player: Vec3) -> TrailUpdate {
        match self.waypoints.front() {
            Some(next) if player.distance(*next) < self.spacing * 0.5 => {
                self.waypoints.pop_front();
                TrailUpdate::Changed
            }
            _ => TrailUpdate::Unchanged,
        }
    }

    fn is_heading_to_next(&self, player: Vec3, last: Vec3) -> bool {
        let Some(next) = self.waypoints.front() else {
            return false;
        };
        let heading = (player - last).normalize_or_zero();
        let to_next = (*next - player).normalize_or_zero();
        player.distance(last) > HEADING_MIN_STEP && heading.dot(to_next) > HEADING_SIMILARITY
    }

    fn is_near_next(&self, player: Vec3) -> bool {
        self.waypoints
            .front()
            .is_some_and(|next| player.distance(*next) < self.first_waypoint_threshold)
    }

    fn is_on_path(&self, player: Vec3) -> bool {
        self.waypoints
            .iter()
            .any(|waypoint| player.distance(*waypoint) < self.path_threshold)
    }
}

pub(crate) fn set_trail_destination(
    destination: On<NavigationDestinationSet>,
    mut trail_query: Query<&mut NavigationTrail>,
) {
    let mut trail = r!(trail_query.get_mut(destination.entity));
    debug!(
        "{} navigating to {}",
        destination.entity, destination.destination
    );
    trail.set_destination(destination.destination);
}

/// Hidden while the overlay covers tooltips
pub(crate) fn update_navigation_trails(
    mut stop_messages: MessageReader<StopAllTooltips>,
    mut trail_query: Query<(Entity, &mut NavigationTrail)>,
    player_query: Query<&GlobalTransform, With<TooltipPlayer>>,
    overlay: Res<OverlayPhase>,
    mut commands: Commands,
) {
    if stop_messages.read().count() > 0 {
        for (_, mut trail) in &mut trail_query {
            trail.clear();
        }
    }
    let player = rq!(player_query.single()).translation();

    for (entity, mut trail) in &mut trail_query {
        if *overlay == OverlayPhase::Suspended {
            trail.visible = false;
            continue;
        }
        trail.visible = trail.destination.is_some();

        match trail.advance(player) {
            TrailUpdate::Unchanged => {}
            TrailUpdate::Changed => {
                commands.trigger(NavigationTrailChanged {
                    entity,
                    map_path: trail.map_path(),
                });
            }
            TrailUpdate::Arrived => {
                debug!("{entity} arrived at destination");
                commands.trigger(NavigationTrailChanged {
                    entity,
                    map_path: Vec::new(),
                });
                commands.trigger(NavigationArrived { entity });
            }
        }
    }
}
