//! Resolves what a tooltip shows for the input device currently in use.

use bevy_derive::Deref;
use bevy_ecs::{
    change_detection::{DetectChanges, DetectChangesMut, Ref},
    component::Component,
    entity::Entity,
    message::MessageReader,
    resource::Resource,
    system::{Query, Res, ResMut},
};
use bevy_log::{debug, warn};
use bevy_platform::collections::HashMap;

use crate::{
    events::{ControlSchemeChanged, HeadsetStateChanged},
    sequence::HelpStepKind,
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlScheme {
    #[default]
    KeyboardMouse,
    Gamepad,
    Xr,
    Freecam,
}

/// The control scheme every tooltip resolves against
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq, Eq, Deref)]
pub struct ActiveControlScheme(pub ControlScheme);

/// Display names of the binding the player has to press, per control scheme.
/// Usually filled from the input library's binding display strings.
#[derive(Debug, Component, Default, Clone)]
#[require(TooltipIcon)]
pub struct TooltipInputBinding {
    bindings: HashMap<ControlScheme, String>,
}

impl TooltipInputBinding {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, scheme: ControlScheme, binding_name: impl ToString) -> Self {
        self.bindings.insert(scheme, binding_name.to_string());
        self
    }

    /// Empty when nothing is bound for this scheme
    pub fn binding_name(&self, scheme: ControlScheme) -> &str {
        self.bindings.get(&scheme).map(String::as_str).unwrap_or("")
    }
}

/// Maps binding names to icons.
/// A binding uses the icon of the first key it contains, so `"Press E"` matches `"E"`.
#[derive(Resource, Debug, Default, Clone)]
pub struct InputIconMap {
    icons: Vec<(String, String)>,
}

impl InputIconMap {
    pub fn with(mut self, binding_key: impl ToString, icon: impl ToString) -> Self {
        self.icons.push((binding_key.to_string(), icon.to_string()));
        self
    }

    pub fn icon_for(&self, binding_name: &str) -> Option<&str> {
        if binding_name.is_empty() {
            return None;
        }
        self.icons
            .iter()
            .find(|(key, _)| binding_name.contains(key.as_str()))
            .map(|(_, icon)| icon.as_str())
    }
}

/// Icons of the help steps per control scheme
#[derive(Resource, Debug, Default, Clone)]
pub struct HelpIconMap {
    icons: HashMap<(HelpStepKind, ControlScheme), String>,
}

impl HelpIconMap {
    pub fn with(mut self, kind: HelpStepKind, scheme: ControlScheme, icon: impl ToString) -> Self {
        self.icons.insert((kind, scheme), icon.to_string());
        self
    }

    pub fn icon(&self, kind: HelpStepKind, scheme: ControlScheme) -> Option<&str> {
        self.icons.get(&(kind, scheme)).map(String::as_str)
    }
}

/// What the tooltip should currently display for its binding.
/// Kept up to date whenever the control scheme or the icon map changes.
#[derive(Debug, Component, Default, Clone, PartialEq)]
pub struct TooltipIcon {
    /// Binding text, for tooltips that show text rather than an icon
    pub binding: String,
    pub icon: Option<String>,
}

impl TooltipIcon {
    pub fn resolve(
        binding: &TooltipInputBinding,
        scheme: ControlScheme,
        icon_map: &InputIconMap,
    ) -> Self {
        let binding = binding.binding_name(scheme).to_string();
        let icon = icon_map.icon_for(&binding).map(str::to_string);
        Self { binding, icon }
    }
}

/// Headset on means XR, off goes back to keyboard and mouse
pub fn scheme_for_headset(headset_on: bool) -> ControlScheme {
    if headset_on {
        ControlScheme::Xr
    } else {
        ControlScheme::KeyboardMouse
    }
}

pub(crate) fn receive_control_scheme(
    mut scheme_messages: MessageReader<ControlSchemeChanged>,
    mut headset_messages: MessageReader<HeadsetStateChanged>,
    mut active: ResMut<ActiveControlScheme>,
) {
    for ControlSchemeChanged(scheme) in scheme_messages.read() {
        if active.set_if_neq(ActiveControlScheme(*scheme)) {
            debug!("Control scheme is now {scheme:?}");
        }
    }
    for HeadsetStateChanged(headset_on) in headset_messages.read() {
        let scheme = scheme_for_headset(*headset_on);
        if active.set_if_neq(ActiveControlScheme(scheme)) {
            debug!("Headset {headset_on}, control scheme is now {scheme:?}");
        }
    }
}

pub(crate) fn refresh_tooltip_icons(
    active: Res<ActiveControlScheme>,
    icon_map: Res<InputIconMap>,
    mut tooltips_query: Query<(Entity, Ref<TooltipInputBinding>, &mut TooltipIcon)>,
) {
    let refresh_all = active.is_changed() || icon_map.is_changed();
    for (entity, binding, mut icon) in &mut tooltips_query {
        if !refresh_all && !binding.is_changed() {
            continue;
        }
        let resolved = TooltipIcon::resolve(&binding, active.0, &icon_map);
        if resolved.icon.is_none() {
            warn!(
                "No icon for binding {:?} of {entity} with {:?}",
                resolved.binding, active.0
            );
        }
        icon.set_if_neq(resolved);
    }
}

#[cfg(test)]
mod tests {
    use bevy_app::{App, Update};
    use bevy_ecs::schedule::IntoScheduleConfigs;

    use super::*;

    fn icon_map() -> InputIconMap {
        InputIconMap::default()
            .with("gripPressed", "icons/xr_grip.png")
            .with("RT", "icons/gamepad_rt.png")
            .with("LMB", "icons/mouse_left.png")
            .with("E", "icons/key_e.png")
    }

    fn binding() -> TooltipInputBinding {
        TooltipInputBinding::new()
            .with(ControlScheme::KeyboardMouse, "Press E")
            .with(ControlScheme::Gamepad, "RT")
            .with(ControlScheme::Xr, "gripPressed")
    }

    #[test]
    fn icon_matches_first_contained_key() {
        let map = icon_map();

        assert_eq!(map.icon_for("Press E"), Some("icons/key_e.png"));
        assert_eq!(map.icon_for("LMB"), Some("icons/mouse_left.png"));
        assert_eq!(map.icon_for(""), None);
        assert_eq!(map.icon_for("Space"), None);
    }

    #[test]
    fn unbound_scheme_resolves_to_nothing() {
        let icon = TooltipIcon::resolve(&binding(), ControlScheme::Freecam, &icon_map());

        assert_eq!(icon.binding, "");
        assert_eq!(icon.icon, None);
    }

    #[test]
    fn headset_maps_to_scheme() {
        assert_eq!(scheme_for_headset(true), ControlScheme::Xr);
        assert_eq!(scheme_for_headset(false), ControlScheme::KeyboardMouse);
    }

    #[test]
    fn tooltips_follow_control_scheme_messages() {
        let mut app = App::new();
        app.add_message::<ControlSchemeChanged>()
            .add_message::<HeadsetStateChanged>()
            .init_resource::<ActiveControlScheme>()
            .insert_resource(icon_map())
            .add_systems(
                Update,
                (receive_control_scheme, refresh_tooltip_icons).chain(),
            );
        let tooltip = app.world_mut().spawn(binding()).id();

        app.update();
        assert_eq!(
            app.world().get::<TooltipIcon>(tooltip).unwrap().icon.as_deref(),
            Some("icons/key_e.png")
        );

        app.world_mut()
            .write_message(ControlSchemeChanged(ControlScheme::Gamepad));
        app.update();
        assert_eq!(
            app.world().get::<TooltipIcon>(tooltip).unwrap().icon.as_deref(),
            Some("icons/gamepad_rt.png")
        );

        app.world_mut().write_message(HeadsetStateChanged(true));
        app.update();
        assert_eq!(
            *app.world().resource::<ActiveControlScheme>(),
            ActiveControlScheme(ControlScheme::Xr)
        );
        assert_eq!(
            app.world().get::<TooltipIcon>(tooltip).unwrap().icon.as_deref(),
            Some("icons/xr_grip.png")
        );
    }
}
