//! Onboarding help tooltips.
//!
//! A [`Sequencer`] walks through [`HelpStep`]s, each one waiting for the player to look around,
//! move or press something. What counts as progress is decided by a [`ProgressService`] per
//! [`HelpStepKind`]. After a step completes the success message shows for the success cooldown
//! before the next step starts.
//!
//! The [`HelpSequencer`] component drives a sequencer from the ECS and mirrors what to draw in
//! [`HelpDisplay`].

use std::{collections::VecDeque, fmt, time::Duration};

use bevy_ecs::{
    change_detection::{DetectChanges, DetectChangesMut},
    component::Component,
    entity::Entity,
    message::MessageReader,
    query::With,
    system::{Commands, Query, Res},
};
use bevy_log::{debug, warn};
use bevy_math::{Quat, Vec3};
use bevy_platform::collections::HashMap;
use bevy_time::Time;
use bevy_transform::components::{GlobalTransform, Transform};

use crate::{
    control_scheme::{ActiveControlScheme, ControlScheme, HelpIconMap},
    detection::TooltipCamera,
    events::{
        ActionPerformed, HelpSequenceFinished, HelpStepCompleted, HelpStepSkipped, HelpStepStarted,
        ShowHelp, StopAllTooltips,
    },
    interruption::OverlayPhase,
    timer::CancellableDelay,
};

/// Progress at which a step is complete
pub const COMPLETION_THRESHOLD: f32 = 1.;

pub const DEFAULT_SUCCESS_COOLDOWN: Duration = Duration::from_millis(1500);

const COMPLETION_TOLERANCE: f32 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HelpStepKind {
    Look,
    Move,
    InputPressed,
}

#[derive(Debug, Clone)]
pub struct HelpStep {
    pub message: String,
    pub kind: HelpStepKind,
    /// Added to the progress every time the service sees the player do it
    pub progress_per_tick: f32,
    /// Time between two progress samples, zero samples every tick
    pub cooldown: Duration,
    pub allowed_in_vr: bool,
}

impl HelpStep {
    pub fn new(kind: HelpStepKind, message: impl ToString) -> Self {
        Self {
            message: message.to_string(),
            kind,
            progress_per_tick: 0.1,
            cooldown: Duration::from_millis(100),
            allowed_in_vr: true,
        }
    }

    pub fn with_progress_per_tick(mut self, progress_per_tick: f32) -> Self {
        self.progress_per_tick = progress_per_tick;
        self
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Skipped while the player wears a headset
    pub fn not_allowed_in_vr(mut self) -> Self {
        self.allowed_in_vr = false;
        self
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SequenceMode {
    /// One step then stop
    #[default]
    Single,
    /// Every configured step in declaration order
    Sequential,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SequenceState {
    Idle,
    Active { kind: HelpStepKind, progress: f32 },
    /// Showing the success message of `completed`
    Transitioning { completed: HelpStepKind },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NotAllowedInVr,
    NoProgressService,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SequenceEvent {
    Started(HelpStepKind),
    Progressed(HelpStepKind, f32),
    Completed(HelpStepKind),
    Skipped(HelpStepKind, SkipReason),
    Finished,
}

/// What a progress service can see of the world on a sample
#[derive(Debug, Clone, Copy, Default)]
pub struct ProgressInput {
    /// `None` when there is no [`TooltipCamera`]
    pub camera: Option<Transform>,
    pub scheme: ControlScheme,
}

/// Measures one kind of player action
pub trait ProgressService: Send + Sync {
    /// A step of this kind starts, forget what happened before
    fn begin(&mut self, input: &ProgressInput);

    /// Progress to add for this sample
    fn sample(&mut self, step: &HelpStep, input: &ProgressInput) -> f32;

    /// An input action was performed since the last sample
    fn record_action(&mut self, _action: &str) {}

    fn set_control_scheme(&mut self, _scheme: ControlScheme) {}
}

/// Progresses while the camera rotates
#[derive(Debug, Default)]
pub struct LookProgress {
    previous: Option<Quat>,
}

impl ProgressService for LookProgress {
    fn begin(&mut self, input: &ProgressInput) {
        self.previous = input.camera.map(|camera| camera.rotation);
    }

    fn sample(&mut self, step: &HelpStep, input: &ProgressInput) -> f32 {
        let current = input.camera.map(|camera| camera.rotation);
        let rotated = match (self.previous, current) {
            (Some(previous), Some(current)) => !previous.abs_diff_eq(current, 1e-5),
            _ => false,
        };
        self.previous = current;
        if rotated { step.progress_per_tick } else { 0. }
    }
}

/// Progresses while the camera moves
#[derive(Debug, Default)]
pub struct MoveProgress {
    previous: Option<Vec3>,
}

impl ProgressService for MoveProgress {
    fn begin(&mut self, input: &ProgressInput) {
        self.previous = input.camera.map(|camera| camera.translation);
    }

    fn sample(&mut self, step: &HelpStep, input: &ProgressInput) -> f32 {
        let current = input.camera.map(|camera| camera.translation);
        let moved = match (self.previous, current) {
            (Some(previous), Some(current)) => !previous.abs_diff_eq(current, 1e-4),
            _ => false,
        };
        self.previous = current;
        if moved { step.progress_per_tick } else { 0. }
    }
}

/// Progresses when the action bound for the active control scheme is performed
#[derive(Debug, Default)]
pub struct InputPressedProgress {
    actions: HashMap<ControlScheme, String>,
    scheme: ControlScheme,
    pressed: bool,
}

impl InputPressedProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, scheme: ControlScheme, action: impl ToString) -> Self {
        self.actions.insert(scheme, action.to_string());
        self
    }
}

impl ProgressService for InputPressedProgress {
    fn begin(&mut self, input: &ProgressInput) {
        self.scheme = input.scheme;
        self.pressed = false;
    }

    fn sample(&mut self, step: &HelpStep, _input: &ProgressInput) -> f32 {
        if std::mem::take(&mut self.pressed) {
            step.progress_per_tick
        } else {
            0.
        }
    }

    fn record_action(&mut self, action: &str) {
        if self.actions.get(&self.scheme).map(String::as_str) == Some(action) {
            self.pressed = true;
        }
    }

    fn set_control_scheme(&mut self, scheme: ControlScheme) {
        self.scheme = scheme;
        self.pressed = false;
    }
}

/// One progress service per step kind
#[derive(Default)]
pub struct ProgressServices {
    services: HashMap<HelpStepKind, Box<dyn ProgressService>>,
}

impl fmt::Debug for ProgressServices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.services.keys()).finish()
    }
}

impl ProgressServices {
    /// Look and move are measured from the camera, input presses need action names so they are
    /// added with [`ProgressServices::with`]
    pub fn camera_only() -> Self {
        Self::default()
            .with(HelpStepKind::Look, LookProgress::default())
            .with(HelpStepKind::Move, MoveProgress::default())
    }

    pub fn with(mut self, kind: HelpStepKind, service: impl ProgressService + 'static) -> Self {
        self.services.insert(kind, Box::new(service));
        self
    }

    pub fn get_mut(&mut self, kind: HelpStepKind) -> Option<&mut (dyn ProgressService + 'static)> {
        self.services.get_mut(&kind).map(|service| service.as_mut())
    }

    pub fn record_action(&mut self, action: &str) {
        for service in self.services.values_mut() {
            service.record_action(action);
        }
    }

    pub fn set_control_scheme(&mut self, scheme: ControlScheme) {
        for service in self.services.values_mut() {
            service.set_control_scheme(scheme);
        }
    }
}

#[derive(Debug)]
struct ActiveStep {
    step: HelpStep,
    progress: f32,
    sample_delay: CancellableDelay,
}

/// Queue of help steps, advanced by [`Sequencer::tick`]
#[derive(Debug)]
pub struct Sequencer {
    steps: Vec<HelpStep>,
    queue: VecDeque<HelpStep>,
    mode: SequenceMode,
    running: bool,
    active: Option<ActiveStep>,
    completed: Option<HelpStepKind>,
    transition: CancellableDelay,
    success_cooldown: Duration,
}

impl Sequencer {
    pub fn new(steps: Vec<HelpStep>) -> Self {
        Self {
            steps,
            queue: VecDeque::new(),
            mode: SequenceMode::Single,
            running: false,
            active: None,
            completed: None,
            transition: CancellableDelay::default(),
            success_cooldown: DEFAULT_SUCCESS_COOLDOWN,
        }
    }

    pub fn with_success_cooldown(mut self, success_cooldown: Duration) -> Self {
        self.success_cooldown = success_cooldown;
        self
    }

    pub fn mode(&self) -> SequenceMode {
        self.mode
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn active_step(&self) -> Option<&HelpStep> {
        self.active.as_ref().map(|active| &active.step)
    }

    pub fn state(&self) -> SequenceState {
        if let Some(active) = &self.active {
            return SequenceState::Active {
                kind: active.step.kind,
                progress: active.progress,
            };
        }
        match self.completed {
            Some(completed) if self.transition.is_running() => {
                SequenceState::Transitioning { completed }
            }
            _ => SequenceState::Idle,
        }
    }

    /// Cancels the current run and shows the step of this kind only.
    /// Returns `false` when no step of this kind is configured.
    pub fn show_single(&mut self, kind: HelpStepKind) -> bool {
        self.stop();
        let Some(step) = self.steps.iter().find(|step| step.kind == kind) else {
            warn!("No help step of kind {kind:?} configured");
            return false;
        };
        self.queue.push_back(step.clone());
        self.mode = SequenceMode::Single;
        self.running = true;
        true
    }

    /// Cancels the current run and queues every configured step
    pub fn show_all_sequentially(&mut self) {
        self.stop();
        self.queue.extend(self.steps.iter().cloned());
        self.mode = SequenceMode::Sequential;
        self.running = !self.queue.is_empty();
    }

    /// Cancels the step in flight and any pending transition
    pub fn stop(&mut self) {
        self.queue.clear();
        self.active = None;
        self.completed = None;
        self.transition.stop();
        self.running = false;
    }

    /// Advance the run by one frame
    pub fn tick(
        &mut self,
        delta: Duration,
        services: &mut ProgressServices,
        input: &ProgressInput,
    ) -> Vec<SequenceEvent> {
        let mut events = Vec::new();
        if !self.running {
            return events;
        }
        if self.transition.is_running() && !self.transition.tick(delta) {
            return events;
        }
        if self.active.is_none() {
            self.activate_next(services, input, &mut events);
            return events;
        }
        self.progress_active(delta, services, input, &mut events);
        events
    }

    fn progress_active(
        &mut self,
        delta: Duration,
        services: &mut ProgressServices,
        input: &ProgressInput,
        events: &mut Vec<SequenceEvent>,
    ) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        let kind = active.step.kind;

        if input.scheme == ControlScheme::Xr && !active.step.allowed_in_vr {
            self.active = None;
            events.push(SequenceEvent::Skipped(kind, SkipReason::NotAllowedInVr));
            self.activate_next(services, input, events);
            return;
        }

        let due = if active.step.cooldown.is_zero() {
            true
        } else if active.sample_delay.tick(delta) {
            active.sample_delay.start(active.step.cooldown);
            true
        } else {
            false
        };
        if !due {
            return;
        }

        let Some(service) = services.get_mut(kind) else {
            warn!("No progress service for help step {kind:?}, skipping it");
            self.active = None;
            events.push(SequenceEvent::Skipped(kind, SkipReason::NoProgressService));
            self.activate_next(services, input, events);
            return;
        };
        let increment = service.sample(&active.step, input);
        if increment <= 0. {
            return;
        }
        active.progress = (active.progress + increment).min(COMPLETION_THRESHOLD);
        events.push(SequenceEvent::Progressed(kind, active.progress));

        if is_complete(active.progress) {
            self.active = None;
            self.completed = Some(kind);
            self.transition.start(self.success_cooldown);
            events.push(SequenceEvent::Completed(kind));
        }
    }

    /// Dequeue until a step can start, or finish the run
    fn activate_next(
        &mut self,
        services: &mut ProgressServices,
        input: &ProgressInput,
        events: &mut Vec<SequenceEvent>,
    ) {
        self.completed = None;
        while let Some(step) = self.queue.pop_front() {
            if input.scheme == ControlScheme::Xr && !step.allowed_in_vr {
                events.push(SequenceEvent::Skipped(step.kind, SkipReason::NotAllowedInVr));
                continue;
            }
            let Some(service) = services.get_mut(step.kind) else {
                warn!(
                    "No progress service for help step {:?}, skipping it",
                    step.kind
                );
                events.push(SequenceEvent::Skipped(step.kind, SkipReason::NoProgressService));
                continue;
            };
            service.begin(input);
            let mut sample_delay = CancellableDelay::default();
            if !step.cooldown.is_zero() {
                sample_delay.start(step.cooldown);
            }
            events.push(SequenceEvent::Started(step.kind));
            self.active = Some(ActiveStep {
                step,
                progress: 0.,
                sample_delay,
            });
            return;
        }
        self.running = false;
        events.push(SequenceEvent::Finished);
    }
}

fn is_complete(progress: f32) -> bool {
    progress >= COMPLETION_THRESHOLD - COMPLETION_TOLERANCE
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum HelpPhase {
    #[default]
    Hidden,
    /// Asking the player to do something
    Prompt,
    /// The step was just completed
    Success,
}

/// What to draw for a [`HelpSequencer`]
#[derive(Debug, Component, Default, Clone, PartialEq)]
pub struct HelpDisplay {
    pub phase: HelpPhase,
    pub message: String,
    pub icon: Option<String>,
    /// 0..=1, for a progress bar
    pub progress: f32,
}

/// Drives a [`Sequencer`] from [`ShowHelp`] messages
#[derive(Component)]
#[require(HelpDisplay)]
pub struct HelpSequencer {
    sequencer: Sequencer,
    services: ProgressServices,
}

impl HelpSequencer {
    pub fn new(steps: Vec<HelpStep>) -> Self {
        Self {
            sequencer: Sequencer::new(steps),
            services: ProgressServices::camera_only(),
        }
    }

    pub fn with_service(mut self, kind: HelpStepKind, service: impl ProgressService + 'static) -> Self {
        self.services = self.services.with(kind, service);
        self
    }

    pub fn with_success_cooldown(mut self, success_cooldown: Duration) -> Self {
        self.sequencer = self.sequencer.with_success_cooldown(success_cooldown);
        self
    }

    pub fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }
}

pub(crate) fn receive_help_requests(
    mut show_messages: MessageReader<ShowHelp>,
    mut stop_messages: MessageReader<StopAllTooltips>,
    mut action_messages: MessageReader<ActionPerformed>,
    mut sequencer_query: Query<&mut HelpSequencer>,
) {
    let stop = stop_messages.read().count() > 0;
    let requests: Vec<ShowHelp> = show_messages.read().copied().collect();
    let actions: Vec<&ActionPerformed> = action_messages.read().collect();

    for mut help in &mut sequencer_query {
        for ActionPerformed(action) in &actions {
            help.services.record_action(action);
        }
        if stop {
            help.sequencer.stop();
        }
        for request in &requests {
            match request {
                ShowHelp::Single(kind) => {
                    help.sequencer.show_single(*kind);
                }
                ShowHelp::All => help.sequencer.show_all_sequentially(),
            }
        }
    }
}

/// Paused while the overlay covers tooltips.
/// Headset and scheme changes made under the overlay, such as the VR skip, apply on the first
/// tick after it closes.
pub(crate) fn tick_help_sequencers(
    mut sequencer_query: Query<(Entity, &mut HelpSequencer, &mut HelpDisplay)>,
    camera_query: Query<&GlobalTransform, With<TooltipCamera>>,
    active_scheme: Res<ActiveControlScheme>,
    help_icons: Res<HelpIconMap>,
    overlay: Res<OverlayPhase>,
    time: Res<Time>,
    mut commands: Commands,
) {
    let input = ProgressInput {
        camera: camera_query
            .single()
            .ok()
            .map(GlobalTransform::compute_transform),
        scheme: active_scheme.0,
    };

    for (entity, mut help, mut display) in &mut sequencer_query {
        let help = &mut *help;
        if active_scheme.is_changed() {
            help.services.set_control_scheme(active_scheme.0);
        }
        if *overlay == OverlayPhase::Suspended {
            if display.phase != HelpPhase::Hidden {
                display.phase = HelpPhase::Hidden;
            }
            continue;
        }

        for event in help
            .sequencer
            .tick(time.delta(), &mut help.services, &input)
        {
            match event {
                SequenceEvent::Started(kind) => {
                    debug!("{entity} help step {kind:?} started");
                    commands.trigger(HelpStepStarted { entity, kind });
                }
                SequenceEvent::Progressed(..) => {}
                SequenceEvent::Completed(kind) => {
                    debug!("{entity} help step {kind:?} completed");
                    commands.trigger(HelpStepCompleted { entity, kind });
                }
                SequenceEvent::Skipped(kind, reason) => {
                    debug!("{entity} help step {kind:?} skipped: {reason:?}");
                    commands.trigger(HelpStepSkipped {
                        entity,
                        kind,
                        reason,
                    });
                }
                SequenceEvent::Finished => {
                    debug!("{entity} help sequence finished");
                    commands.trigger(HelpSequenceFinished { entity });
                }
            }
        }

        let mut next = display.clone();
        match help.sequencer.state() {
            SequenceState::Idle => next.phase = HelpPhase::Hidden,
            SequenceState::Active { kind, progress } => {
                next.phase = HelpPhase::Prompt;
                next.progress = progress;
                if let Some(step) = help.sequencer.active_step() {
                    next.message.clone_from(&step.message);
                }
                next.icon = help_icons.icon(kind, active_scheme.0).map(str::to_string);
            }
            SequenceState::Transitioning { .. } => {
                next.phase = HelpPhase::Success;
                next.progress = COMPLETION_THRESHOLD;
            }
        }
        display.set_if_neq(next);
    }
}

#[cfg(test)]
mod tests {
    use bevy_app::App;
    use bevy_ecs::{observer::On, resource::Resource, system::ResMut};

    use super::*;
    use crate::{WorldTooltipPlugin, events::OverlayVisibilityChanged};

    /// Reports the same increment on every sample
    struct Steady(f32);

    impl ProgressService for Steady {
        fn begin(&mut self, _input: &ProgressInput) {}

        fn sample(&mut self, _step: &HelpStep, _input: &ProgressInput) -> f32 {
            self.0
        }
    }

    fn every_tick(kind: HelpStepKind) -> HelpStep {
        HelpStep::new(kind, format!("{kind:?}"))
            .with_cooldown(Duration::ZERO)
            .with_progress_per_tick(0.5)
    }

    fn steady_services() -> ProgressServices {
        ProgressServices::default()
            .with(HelpStepKind::Look, Steady(0.5))
            .with(HelpStepKind::Move, Steady(0.5))
            .with(HelpStepKind::InputPressed, Steady(0.5))
    }

    const FRAME: Duration = Duration::from_millis(16);

    fn keyboard() -> ProgressInput {
        ProgressInput::default()
    }

    fn headset() -> ProgressInput {
        ProgressInput {
            scheme: ControlScheme::Xr,
            ..keyboard()
        }
    }

    #[test]
    fn steps_run_in_declaration_order() {
        let mut services = steady_services();
        let mut sequencer = Sequencer::new(vec![
            every_tick(HelpStepKind::Look),
            every_tick(HelpStepKind::Move),
        ]);
        sequencer.show_all_sequentially();

        assert_eq!(
            sequencer.tick(FRAME, &mut services, &keyboard()),
            vec![SequenceEvent::Started(HelpStepKind::Look)]
        );
        sequencer.tick(FRAME, &mut services, &keyboard());
        assert_eq!(
            sequencer.tick(FRAME, &mut services, &keyboard()),
            vec![
                SequenceEvent::Progressed(HelpStepKind::Look, 1.),
                SequenceEvent::Completed(HelpStepKind::Look)
            ]
        );
        assert_eq!(
            sequencer.state(),
            SequenceState::Transitioning {
                completed: HelpStepKind::Look
            }
        );

        assert!(
            sequencer
                .tick(Duration::from_secs(1), &mut services, &keyboard())
                .is_empty()
        );
        assert_eq!(
            sequencer.tick(Duration::from_millis(600), &mut services, &keyboard()),
            vec![SequenceEvent::Started(HelpStepKind::Move)]
        );

        sequencer.tick(FRAME, &mut services, &keyboard());
        sequencer.tick(FRAME, &mut services, &keyboard());
        assert_eq!(
            sequencer.tick(DEFAULT_SUCCESS_COOLDOWN, &mut services, &keyboard()),
            vec![SequenceEvent::Finished]
        );
        assert_eq!(sequencer.state(), SequenceState::Idle);
        assert!(!sequencer.is_running());
    }

    #[test]
    fn completion_fires_once_per_step() {
        let mut services = ProgressServices::default().with(HelpStepKind::Look, Steady(0.1));
        let mut sequencer = Sequencer::new(vec![every_tick(HelpStepKind::Look)]);
        sequencer.show_single(HelpStepKind::Look);

        let mut completions = 0;
        for _ in 0..40 {
            completions += sequencer
                .tick(FRAME, &mut services, &keyboard())
                .iter()
                .filter(|event| matches!(event, SequenceEvent::Completed(_)))
                .count();
        }

        assert_eq!(completions, 1);
    }

    #[test]
    fn progress_is_sampled_every_cooldown() {
        let mut services = steady_services();
        let mut sequencer = Sequencer::new(vec![
            HelpStep::new(HelpStepKind::Move, "Walk around")
                .with_cooldown(Duration::from_millis(100)),
        ]);
        sequencer.show_single(HelpStepKind::Move);
        sequencer.tick(FRAME, &mut services, &keyboard());

        assert!(
            sequencer
                .tick(Duration::from_millis(50), &mut services, &keyboard())
                .is_empty()
        );
        assert_eq!(
            sequencer.tick(Duration::from_millis(50), &mut services, &keyboard()),
            vec![SequenceEvent::Progressed(HelpStepKind::Move, 0.5)]
        );
    }

    #[test]
    fn headset_skips_step_within_the_same_tick() {
        let mut services = steady_services();
        let mut sequencer = Sequencer::new(vec![
            every_tick(HelpStepKind::Move).not_allowed_in_vr(),
            every_tick(HelpStepKind::Look),
        ]);
        sequencer.show_all_sequentially();
        sequencer.tick(FRAME, &mut services, &keyboard());

        assert_eq!(
            sequencer.tick(FRAME, &mut services, &headset()),
            vec![
                SequenceEvent::Skipped(HelpStepKind::Move, SkipReason::NotAllowedInVr),
                SequenceEvent::Started(HelpStepKind::Look)
            ]
        );
    }

    #[test]
    fn headset_terminates_single_step() {
        let mut services = steady_services();
        let mut sequencer =
            Sequencer::new(vec![every_tick(HelpStepKind::Move).not_allowed_in_vr()]);
        sequencer.show_single(HelpStepKind::Move);

        assert_eq!(
            sequencer.tick(FRAME, &mut services, &headset()),
            vec![
                SequenceEvent::Skipped(HelpStepKind::Move, SkipReason::NotAllowedInVr),
                SequenceEvent::Finished
            ]
        );
        assert_eq!(sequencer.state(), SequenceState::Idle);
    }

    #[test]
    fn missing_service_skips_to_next_step() {
        let mut services = ProgressServices::default().with(HelpStepKind::Look, Steady(0.5));
        let mut sequencer = Sequencer::new(vec![
            every_tick(HelpStepKind::InputPressed),
            every_tick(HelpStepKind::Look),
        ]);
        sequencer.show_all_sequentially();

        assert_eq!(
            sequencer.tick(FRAME, &mut services, &keyboard()),
            vec![
                SequenceEvent::Skipped(HelpStepKind::InputPressed, SkipReason::NoProgressService),
                SequenceEvent::Started(HelpStepKind::Look)
            ]
        );
    }

    #[test]
    fn stop_cancels_pending_transition() {
        let mut services = steady_services();
        let mut sequencer = Sequencer::new(vec![
            every_tick(HelpStepKind::Look),
            every_tick(HelpStepKind::Move),
        ]);
        sequencer.show_all_sequentially();
        for _ in 0..3 {
            sequencer.tick(FRAME, &mut services, &keyboard());
        }
        assert!(matches!(
            sequencer.state(),
            SequenceState::Transitioning { .. }
        ));

        sequencer.stop();

        assert!(
            sequencer
                .tick(Duration::from_secs(5), &mut services, &keyboard())
                .is_empty()
        );
        assert_eq!(sequencer.state(), SequenceState::Idle);
    }

    #[test]
    fn show_single_replaces_running_sequence() {
        let mut services = steady_services();
        let mut sequencer = Sequencer::new(vec![
            every_tick(HelpStepKind::Look),
            every_tick(HelpStepKind::Move),
        ]);
        sequencer.show_all_sequentially();
        sequencer.tick(FRAME, &mut services, &keyboard());

        assert!(sequencer.show_single(HelpStepKind::Move));
        assert_eq!(sequencer.mode(), SequenceMode::Single);
        assert_eq!(
            sequencer.tick(FRAME, &mut services, &keyboard()),
            vec![SequenceEvent::Started(HelpStepKind::Move)]
        );
        assert!(!sequencer.show_single(HelpStepKind::InputPressed));
        assert!(!sequencer.is_running());
    }

    #[test]
    fn look_progress_needs_camera_rotation() {
        let step = HelpStep::new(HelpStepKind::Look, "Look around");
        let still = ProgressInput {
            camera: Some(Transform::IDENTITY),
            ..keyboard()
        };
        let turned = ProgressInput {
            camera: Some(Transform::from_rotation(Quat::from_rotation_y(0.3))),
            ..keyboard()
        };
        let mut look = LookProgress::default();
        look.begin(&still);

        assert_eq!(look.sample(&step, &still), 0.);
        assert_eq!(look.sample(&step, &turned), 0.1);
        assert_eq!(look.sample(&step, &turned), 0.);
    }

    #[test]
    fn input_progress_follows_control_scheme() {
        let step = HelpStep::new(HelpStepKind::InputPressed, "Grab it");
        let mut pressed = InputPressedProgress::new()
            .with(ControlScheme::KeyboardMouse, "interact")
            .with(ControlScheme::Xr, "grip");
        pressed.begin(&keyboard());

        pressed.record_action("grip");
        assert_eq!(pressed.sample(&step, &keyboard()), 0.);
        pressed.record_action("interact");
        assert_eq!(pressed.sample(&step, &keyboard()), 0.1);
        assert_eq!(pressed.sample(&step, &keyboard()), 0.);

        pressed.set_control_scheme(ControlScheme::Xr);
        pressed.record_action("grip");
        assert_eq!(pressed.sample(&step, &headset()), 0.1);
    }

    #[derive(Resource, Default)]
    struct Finished(usize);

    #[test]
    fn help_display_follows_sequencer() {
        let mut app = App::new();
        app.add_plugins(WorldTooltipPlugin)
            .init_resource::<Time>()
            .init_resource::<Finished>()
            .add_observer(|_: On<HelpSequenceFinished>, mut finished: ResMut<Finished>| {
                finished.0 += 1;
            });
        let help = app
            .world_mut()
            .spawn(
                HelpSequencer::new(vec![
                    HelpStep::new(HelpStepKind::InputPressed, "Press interact")
                        .with_cooldown(Duration::ZERO)
                        .with_progress_per_tick(1.),
                ])
                .with_service(
                    HelpStepKind::InputPressed,
                    InputPressedProgress::new().with(ControlScheme::KeyboardMouse, "interact"),
                )
                .with_success_cooldown(Duration::from_millis(100)),
            )
            .id();

        app.world_mut().write_message(ShowHelp::All);
        app.update();
        let display = app.world().get::<HelpDisplay>(help).unwrap();
        assert_eq!(display.phase, HelpPhase::Prompt);
        assert_eq!(display.message, "Press interact");

        app.world_mut().write_message(OverlayVisibilityChanged(false));
        app.world_mut()
            .write_message(ActionPerformed("interact".into()));
        app.update();
        assert_eq!(
            app.world().get::<HelpDisplay>(help).unwrap().phase,
            HelpPhase::Hidden
        );

        app.world_mut().write_message(OverlayVisibilityChanged(true));
        app.update();
        assert_eq!(
            app.world().get::<HelpDisplay>(help).unwrap().phase,
            HelpPhase::Success
        );

        app.world_mut()
            .resource_mut::<Time>()
            .advance_by(Duration::from_millis(150));
        app.update();
        assert_eq!(
            app.world().get::<HelpDisplay>(help).unwrap().phase,
            HelpPhase::Hidden
        );
        assert_eq!(app.world().resource::<Finished>().0, 1);
    }
}
