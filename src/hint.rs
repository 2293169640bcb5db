//! Idle hints, for interactables the player keeps walking past.
//! What hinting actually does is up to the user.

use std::time::Duration;

use bevy_app::{Plugin, Update};
use bevy_ecs::{
    component::Component,
    entity::Entity,
    query::{Has, QueryData, Without},
    schedule::IntoScheduleConfigs,
    system::{Commands, Query, Res},
};
use bevy_time::Time;
use tiny_bail::prelude::*;

use crate::{
    TooltipDisabled, TooltipSystems,
    events::TooltipHinting,
    interactable::{TooltipDisplay, display_interactable_tooltips},
    timer::CancellableDelay,
};

pub(crate) struct HintPlugin;

impl Plugin for HintPlugin {
    fn build(&self, app: &mut bevy_app::App) {
        app.add_systems(
            Update,
            tick_idle_hints
                .in_set(TooltipSystems::Display)
                .after(display_interactable_tooltips),
        );
    }
}

/// Inserts [`TooltipHinting`] when the tooltip has not been displayed for the delay.
/// Once the tooltip shows, the marker is removed and the hint never comes back.
#[derive(Debug, Component)]
#[require(TooltipDisplay)]
pub struct IdleHint {
    delay: CancellableDelay,
    done: bool,
}

impl IdleHint {
    pub fn new(delay: Duration) -> Self {
        let mut hint = Self {
            delay: CancellableDelay::default(),
            done: false,
        };
        hint.delay.start(delay);
        hint
    }

    pub fn is_done(&self) -> bool {
        self.done
    }
}

#[derive(QueryData)]
#[query_data(mutable)]
struct IdleHintQuery {
    entity: Entity,
    hint: &'static mut IdleHint,
    display: &'static TooltipDisplay,
    hinting: Has<TooltipHinting>,
}

fn tick_idle_hints(
    mut hint_query: Query<IdleHintQuery, Without<TooltipDisabled>>,
    time: Res<Time>,
    mut commands: Commands,
) {
    for mut hint_item in &mut hint_query {
        if hint_item.hint.done {
            continue;
        }
        if *hint_item.display == TooltipDisplay::Shown {
            hint_item.hint.done = true;
            hint_item.hint.delay.stop();
            if hint_item.hinting {
                c!(commands.get_entity(hint_item.entity)).remove::<TooltipHinting>();
            }
            continue;
        }
        if hint_item.hinting {
            continue;
        }
        if hint_item.hint.delay.tick(time.delta()) {
            c!(commands.get_entity(hint_item.entity)).insert(TooltipHinting);
        }
    }
}
