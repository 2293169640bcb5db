//! Decides which single punctual tooltip may display when several want to at once.
//!
//! The candidate the player faces most directly wins. An incumbent keeps its ticket on ties
//! so two tooltips with the same alignment do not flicker between each other.

use bevy_ecs::{entity::Entity, resource::Resource};
use bevy_log::debug;

/// Holds the single arbitration ticket.
#[derive(Resource, Debug, Default)]
pub struct TooltipArbiter {
    holder: Option<Entity>,
    view_alignment: f32,
}

impl TooltipArbiter {
    /// Ask for permission to display `tooltip` with the given view alignment.
    ///
    /// Granted when nobody holds the ticket, when `tooltip` already holds it,
    /// or when `view_alignment` is strictly greater than the holder's.
    pub fn request_show(&mut self, view_alignment: f32, tooltip: Entity) -> bool {
        match self.holder {
            Some(holder) if holder == tooltip => true,
            Some(holder) => {
                if view_alignment > self.view_alignment {
                    debug!(
                        "{tooltip} preempts {holder} ({view_alignment} > {})",
                        self.view_alignment
                    );
                    self.replace(view_alignment, tooltip);
                    true
                } else {
                    false
                }
            }
            None => {
                self.replace(view_alignment, tooltip);
                true
            }
        }
    }

    /// The tooltip is hiding, release the ticket if it holds it.
    pub fn notify_hide(&mut self, tooltip: Entity) {
        if self.holder == Some(tooltip) {
            self.holder = None;
            self.view_alignment = 0.;
        }
    }

    /// Current holder of the ticket
    pub fn holder(&self) -> Option<Entity> {
        self.holder
    }

    /// View alignment recorded for the holder, `0.` when there is none.
    pub fn current_alignment(&self) -> f32 {
        self.view_alignment
    }

    fn replace(&mut self, view_alignment: f32, tooltip: Entity) {
        self.holder = Some(tooltip);
        self.view_alignment = view_alignment;
    }
}
