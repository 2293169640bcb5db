use bevy::prelude::*;
use bevy_world_tooltips::{
    WorldTooltipPlugin,
    control_scheme::{ControlScheme, HelpIconMap},
    detection::{TooltipCamera, TooltipPlayer},
    events::{
        ActionPerformed, HeadsetStateChanged, HelpSequenceFinished, NavigationArrived,
        NavigationDestinationSet, ShowHelp, StopAllTooltips,
    },
    navigation::{MapBounds, NavigationTrail},
    sequence::{
        HelpDisplay, HelpPhase, HelpSequencer, HelpStep, HelpStepKind, InputPressedProgress,
    },
};

fn main() -> AppExit {
    App::new()
        .add_plugins((DefaultPlugins, WorldTooltipPlugin))
        .insert_resource(
            HelpIconMap::default()
                .with(HelpStepKind::Look, ControlScheme::KeyboardMouse, "arrows")
                .with(HelpStepKind::Move, ControlScheme::KeyboardMouse, "wasd")
                .with(HelpStepKind::InputPressed, ControlScheme::KeyboardMouse, "space"),
        )
        .add_systems(Startup, spawn_scene)
        .add_systems(
            Update,
            (
                (move_camera, follow_camera).chain(),
                send_messages,
                supply_path,
                draw_trail,
                show_help,
            ),
        )
        .add_observer(|_: On<HelpSequenceFinished>| info!("Onboarding finished"))
        .add_observer(|_: On<NavigationArrived>| info!("Arrived"))
        .run()
}

#[derive(Component)]
struct HelpText;

const BEACON: Vec3 = Vec3::new(8., 0., -8.);

fn spawn_scene(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(0., 1.6, 0.),
        TooltipCamera,
    ));
    // Feet of the player, trails are laid on the ground
    commands.spawn((TooltipPlayer, Transform::default()));
    commands.spawn((
        DirectionalLight::default(),
        Transform::from_xyz(1., 4., 2.).looking_at(Vec3::ZERO, Vec3::Y),
    ));
    commands.spawn((
        Mesh3d(meshes.add(Plane3d::default().mesh().size(30., 30.))),
        MeshMaterial3d(materials.add(Color::srgb(0.3, 0.3, 0.5))),
    ));
    commands.spawn((
        Mesh3d(meshes.add(Cylinder::new(0.3, 3.))),
        MeshMaterial3d(materials.add(Color::srgb(1., 0.8, 0.2))),
        Transform::from_translation(BEACON + Vec3::Y * 1.5),
    ));

    commands.spawn(
        HelpSequencer::new(vec![
            HelpStep::new(HelpStepKind::Look, "Look around with the arrow keys"),
            HelpStep::new(HelpStepKind::Move, "Walk with WASD").not_allowed_in_vr(),
            HelpStep::new(HelpStepKind::InputPressed, "Press space to jump")
                .with_progress_per_tick(0.34),
        ])
        .with_service(
            HelpStepKind::InputPressed,
            InputPressedProgress::new()
                .with(ControlScheme::KeyboardMouse, "jump")
                .with(ControlScheme::Xr, "jump"),
        ),
    );

    commands.spawn(NavigationTrail::default().with_map_bounds(MapBounds {
        top_left: Vec3::new(-15., 0., 15.),
        top_right: Vec3::new(15., 0., 15.),
        bottom_left: Vec3::new(-15., 0., -15.),
    }));

    commands.spawn((
        HelpText,
        Text::new("Enter: start onboarding, N: guide to the beacon, Escape: stop everything"),
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(12.),
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

fn follow_camera(
    camera: Single<&Transform, With<TooltipCamera>>,
    mut player: Single<&mut Transform, (With<TooltipPlayer>, Without<TooltipCamera>)>,
) {
    player.translation = camera.translation.with_y(0.);
}

fn send_messages(
    keys: Res<ButtonInput<KeyCode>>,
    mut headset_on: Local<bool>,
    trail: Single<Entity, With<NavigationTrail>>,
    mut help: MessageWriter<ShowHelp>,
    mut stop: MessageWriter<StopAllTooltips>,
    mut actions: MessageWriter<ActionPerformed>,
    mut headset: MessageWriter<HeadsetStateChanged>,
    mut commands: Commands,
) {
    if keys.just_pressed(KeyCode::Enter) {
        help.write(ShowHelp::All);
    }
    if keys.just_pressed(KeyCode::Escape) {
        stop.write(StopAllTooltips);
    }
    if keys.just_pressed(KeyCode::Space) {
        actions.write(ActionPerformed("jump".into()));
    }
    // Pretend a headset was put on, the walking step is skipped in VR
    if keys.just_pressed(KeyCode::KeyV) {
        *headset_on = !*headset_on;
        headset.write(HeadsetStateChanged(*headset_on));
    }
    if keys.just_pressed(KeyCode::KeyN) {
        commands.trigger(NavigationDestinationSet {
            entity: *trail,
            destination: BEACON,
        });
    }
}

// A real game would ask its navigation mesh, the demo walks an L shaped path
fn supply_path(
    player: Single<&Transform, With<TooltipPlayer>>,
    mut trail: Single<&mut NavigationTrail>,
) {
    let Some(destination) = trail.destination() else {
        return;
    };
    let start = player.translation;
    trail.set_path(vec![start, Vec3::new(start.x, 0., destination.z), destination]);
}

fn draw_trail(trail: Single<&NavigationTrail>, mut gizmos: Gizmos) {
    if !trail.is_visible() {
        return;
    }
    for waypoint in trail.waypoints() {
        gizmos.sphere(
            Isometry3d::from_translation(*waypoint + Vec3::Y * 0.1),
            0.1,
            Color::WHITE,
        );
    }
}

fn show_help(help: Single<Ref<HelpDisplay>>, mut text: Single<&mut Text, With<HelpText>>) {
    if !help.is_changed() {
        return;
    }
    text.0 = match help.phase {
        HelpPhase::Hidden => String::new(),
        HelpPhase::Prompt => format!(
            "{} [{}] {:.0}%",
            help.message,
            help.icon.as_deref().unwrap_or("?"),
            help.progress * 100.
        ),
        HelpPhase::Success => "Well done!".to_string(),
    };
}
