use bevy::prelude::*;
use bevy_world_tooltips::{
    WorldTooltipPlugin,
    animation::TooltipAnimation,
    control_scheme::{ControlScheme, InputIconMap, TooltipIcon, TooltipInputBinding},
    detection::{ProximityRadius, TooltipCamera, TooltipPlayer},
    events::{
        ControlSchemeChanged, OverlayVisibilityChanged, TooltipActionPerformed, TooltipHinting,
        TooltipShown,
    },
    hint::IdleHint,
    interactable::{InteractableTooltip, TooltipDisplay},
};
use std::time::Duration;

fn main() -> AppExit {
    App::new()
        .add_plugins((DefaultPlugins, WorldTooltipPlugin))
        .insert_resource(
            InputIconMap::default()
                .with("E", "key_e")
                .with("RT", "gamepad_rt"),
        )
        .add_systems(Startup, spawn_scene)
        .add_systems(
            Update,
            (move_camera, send_messages, perform_action, draw_tooltips, show_binding),
        )
        .add_observer(log_shown)
        .run()
}

#[derive(Component)]
struct BindingText;

fn spawn_scene(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(0., 1.6, 6.).looking_at(Vec3::new(0., 1., 0.), Vec3::Y),
        TooltipCamera,
        TooltipPlayer,
    ));
    commands.spawn((
        PointLight {
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(4., 8., 4.),
    ));
    commands.spawn((
        Mesh3d(meshes.add(Plane3d::default().mesh().size(30., 30.))),
        MeshMaterial3d(materials.add(Color::srgb(0.3, 0.5, 0.3))),
    ));

    let crate_mesh = meshes.add(Cuboid::new(1., 1., 1.));
    let tooltip_mesh = meshes.add(Cuboid::new(0.6, 0.3, 0.05));
    let tooltip_material = materials.add(Color::WHITE);
    let binding = TooltipInputBinding::new()
        .with(ControlScheme::KeyboardMouse, "Press E")
        .with(ControlScheme::Gamepad, "RT");

    for (x, tooltip) in [
        (-2., InteractableTooltip::permanent()),
        (2., InteractableTooltip::punctual()),
    ] {
        commands.spawn((
            Mesh3d(crate_mesh.clone()),
            MeshMaterial3d(materials.add(Color::srgb(0.6, 0.4, 0.2))),
            Transform::from_xyz(x, 0.5, 0.),
        ));
        commands.spawn((
            Mesh3d(tooltip_mesh.clone()),
            MeshMaterial3d(tooltip_material.clone()),
            Transform::from_xyz(x, 1.4, 0.),
            tooltip,
            binding.clone(),
            ProximityRadius(4.),
            IdleHint::new(Duration::from_secs(5)),
        ));
    }

    commands.spawn((
        BindingText,
        Text::new(""),
        Node {
            position_type: PositionType::Absolute,
            bottom: Val::Px(12.),
            left: Val::Px(12.),
            ..default()
        },
    ));
}

fn move_camera(
    keys: Res<ButtonInput<KeyCode>>,
    time: Res<Time>,
    mut camera: Single<&mut Transform, With<TooltipCamera>>,
) {
    let mut yaw = 0.;
    if keys.pressed(KeyCode::ArrowLeft) {
        yaw += 1.;
    }
    if keys.pressed(KeyCode::ArrowRight) {
        yaw -= 1.;
    }
    camera.rotate_y(yaw * time.delta_secs());

    let forward = camera.forward().with_y(0.).normalize_or_zero();
    let right = camera.right().with_y(0.).normalize_or_zero();
    let mut direction = Vec3::ZERO;
    if keys.pressed(KeyCode::KeyW) {
        direction += forward;
    }
    if keys.pressed(KeyCode::KeyS) {
        direction -= forward;
    }
    if keys.pressed(KeyCode::KeyD) {
        direction += right;
    }
    if keys.pressed(KeyCode::KeyA) {
        direction -= right;
    }
    camera.translation += direction * 3. * time.delta_secs();
}

// Tab opens a pretend menu over the tooltips, G and K switch control schemes
fn send_messages(
    keys: Res<ButtonInput<KeyCode>>,
    mut overlay_open: Local<bool>,
    mut overlay: MessageWriter<OverlayVisibilityChanged>,
    mut scheme: MessageWriter<ControlSchemeChanged>,
) {
    if keys.just_pressed(KeyCode::Tab) {
        *overlay_open = !*overlay_open;
        overlay.write(OverlayVisibilityChanged(!*overlay_open));
    }
    if keys.just_pressed(KeyCode::KeyG) {
        scheme.write(ControlSchemeChanged(ControlScheme::Gamepad));
    }
    if keys.just_pressed(KeyCode::KeyK) {
        scheme.write(ControlSchemeChanged(ControlScheme::KeyboardMouse));
    }
}

fn perform_action(
    keys: Res<ButtonInput<KeyCode>>,
    tooltips: Query<(Entity, &TooltipDisplay)>,
    mut commands: Commands,
) {
    if !keys.just_pressed(KeyCode::KeyE) {
        return;
    }
    for (entity, display) in &tooltips {
        if *display == TooltipDisplay::Shown {
            commands.trigger(TooltipActionPerformed { entity });
        }
    }
}

// The crate only animates a value, apply it however suits your tooltips
fn draw_tooltips(
    mut tooltips: Query<(
        &TooltipAnimation,
        &TooltipDisplay,
        Has<TooltipHinting>,
        &mut Transform,
        &mut Visibility,
    )>,
    time: Res<Time>,
) {
    for (animation, display, hinting, mut transform, mut visibility) in &mut tooltips {
        *visibility = if *display == TooltipDisplay::Hidden && animation.is_at_rest_hidden() {
            Visibility::Hidden
        } else {
            Visibility::Visible
        };
        let wobble = if hinting {
            1. + 0.1 * (time.elapsed_secs() * 6.).sin()
        } else {
            1.
        };
        transform.scale = Vec3::splat(animation.value() * wobble);
    }
}

fn show_binding(
    tooltips: Query<(&TooltipDisplay, &TooltipIcon)>,
    mut text: Single<&mut Text, With<BindingText>>,
) {
    let shown = tooltips
        .iter()
        .find(|(display, _)| **display == TooltipDisplay::Shown);
    text.0 = match shown {
        Some((_, icon)) => format!(
            "{} ({})",
            icon.binding,
            icon.icon.as_deref().unwrap_or("no icon")
        ),
        None => String::new(),
    };
}

fn log_shown(shown: On<TooltipShown>) {
    info!("Tooltip {} shown", shown.entity);
}
