// SPDX-License-Identifier: MIT

//! The feature-scheduling driver (§4.4): one background task per project
//! that walks `Selecting -> Dispatching -> AwaitingAgent -> Verifying? ->
//! Updating -> Selecting` until its feature queue is empty, and idles
//! between sweeps waiting for new work or an operator command.

use crate::dispatch::compose_prompt;
use crate::error::SchedulerError;
use crate::options::SchedulerOptions;
use crate::retry::{self, RetryInput};
use crate::selection::select_next;
use crate::state_machine::{SchedulerState, SchedulerStatus};
use crate::verification::VerificationHook;
use foreman_agent::{AgentAdapter, AgentSession, StartOptions};
use foreman_core::{AgentRole, Clock, EventKind, Feature, FeatureId, FeatureState, ProjectSlug, RunOutcome};
use foreman_eventbus::EventBus;
use foreman_storage::Store;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Operator verbs accepted by the driver task, mirroring §4.4's non-blocking
/// idempotent control surface.
#[derive(Debug, Clone)]
enum Command {
    Pause,
    Resume,
    Stop,
    RestartFeature(FeatureId),
    SkipFeature(FeatureId),
}

enum WaitOutcome {
    Resume,
    Stop,
}

/// Handle to a running scheduler task for one project. Cheap to clone; every
/// clone controls the same background driver.
#[derive(Clone)]
pub struct FeatureScheduler {
    slug: ProjectSlug,
    status: Arc<Mutex<SchedulerStatus>>,
    commands: mpsc::Sender<Command>,
}

impl FeatureScheduler {
    /// Spawn the driver task and return a handle to it. The task starts
    /// `idle` and does nothing until [`FeatureScheduler::start`] is called.
    pub fn spawn<A, C, V>(
        slug: ProjectSlug,
        store: Arc<Store<C>>,
        bus: Arc<EventBus<C>>,
        agents: Arc<AgentSession<A, C>>,
        verifier: Arc<V>,
        retry_cap: u32,
        options: SchedulerOptions,
    ) -> Self
    where
        A: AgentAdapter + 'static,
        C: Clock + 'static,
        V: VerificationHook + 'static,
    {
        let (commands, rx) = mpsc::channel(32);
        let status = Arc::new(Mutex::new(SchedulerStatus { state: SchedulerState::Idle, current_feature: None }));
        let handle = Self { slug: slug.clone(), status: status.clone(), commands };
        tokio::spawn(drive(slug, store, bus, agents, verifier, retry_cap, options, status, rx));
        handle
    }

    pub fn status(&self) -> SchedulerStatus {
        self.status.lock().clone()
    }

    async fn send(&self, command: Command) -> Result<(), SchedulerError> {
        self.commands.send(command).await.map_err(|_| SchedulerError::ChannelClosed(self.slug.clone()))
    }

    /// Begin the selection loop. Idempotent: a second `start` on an already
    /// running scheduler is a no-op.
    pub async fn start(&self) -> Result<(), SchedulerError> {
        self.send(Command::Resume).await
    }

    pub async fn pause(&self) -> Result<(), SchedulerError> {
        self.send(Command::Pause).await
    }

    pub async fn resume(&self) -> Result<(), SchedulerError> {
        self.send(Command::Resume).await
    }

    pub async fn stop(&self) -> Result<(), SchedulerError> {
        self.send(Command::Stop).await
    }

    pub async fn restart_feature(&self, feature_id: FeatureId) -> Result<(), SchedulerError> {
        self.send(Command::RestartFeature(feature_id)).await
    }

    pub async fn skip_feature(&self, feature_id: FeatureId) -> Result<(), SchedulerError> {
        self.send(Command::SkipFeature(feature_id)).await
    }
}

fn set_state<C: Clock>(status: &Mutex<SchedulerStatus>, bus: &EventBus<C>, slug: &ProjectSlug, to: SchedulerState) {
    let from = {
        let mut guard = status.lock();
        let from = guard.state;
        guard.state = to;
        from
    };
    if from != to {
        let _ = bus.publish(slug, EventKind::SchedulerStateChanged { from: from.to_string(), to: to.to_string() });
    }
}

fn set_current_feature(status: &Mutex<SchedulerStatus>, feature_id: Option<FeatureId>) {
    status.lock().current_feature = feature_id;
}

async fn wait_for_resume_or_stop(commands: &mut mpsc::Receiver<Command>) -> WaitOutcome {
    loop {
        match commands.recv().await {
            Some(Command::Resume) => return WaitOutcome::Resume,
            Some(Command::Stop) | None => return WaitOutcome::Stop,
            Some(_) => continue,
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn drive<A, C, V>(
    slug: ProjectSlug,
    store: Arc<Store<C>>,
    bus: Arc<EventBus<C>>,
    agents: Arc<AgentSession<A, C>>,
    verifier: Arc<V>,
    retry_cap: u32,
    options: SchedulerOptions,
    status: Arc<Mutex<SchedulerStatus>>,
    mut commands: mpsc::Receiver<Command>,
) where
    A: AgentAdapter,
    C: Clock,
    V: VerificationHook,
{
    // The driver is spawned paused; wait for the first `start`/`resume`
    // before entering the selection loop.
    match wait_for_resume_or_stop(&mut commands).await {
        WaitOutcome::Resume => {}
        WaitOutcome::Stop => {
            set_state(&status, &bus, &slug, SchedulerState::Stopped);
            return;
        }
    }

    'outer: loop {
        while let Ok(cmd) = commands.try_recv() {
            match cmd {
                Command::Stop => {
                    set_state(&status, &bus, &slug, SchedulerState::Stopped);
                    break 'outer;
                }
                Command::Pause => {
                    set_state(&status, &bus, &slug, SchedulerState::Paused);
                    match wait_for_resume_or_stop(&mut commands).await {
                        WaitOutcome::Resume => continue 'outer,
                        WaitOutcome::Stop => {
                            set_state(&status, &bus, &slug, SchedulerState::Stopped);
                            break 'outer;
                        }
                    }
                }
                Command::RestartFeature(id) => {
                    let _ = bus.transition_feature(&slug, id, FeatureState::Pending, false);
                }
                Command::SkipFeature(id) => {
                    let _ = bus.transition_feature(&slug, id, FeatureState::Done, true);
                }
                Command::Resume => {}
            }
        }

        set_state(&status, &bus, &slug, SchedulerState::Selecting);
        let groups = match store.list_features(&slug, None) {
            Ok(groups) => groups,
            Err(err) => {
                tracing::error!(%slug, %err, "scheduler failed to list features");
                set_state(&status, &bus, &slug, SchedulerState::Error);
                break 'outer;
            }
        };

        let Some(feature) = select_next(&groups.pending, retry_cap).cloned() else {
            set_state(&status, &bus, &slug, SchedulerState::Idle);
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs(options.heartbeat_s.max(1))) => continue 'outer,
                cmd = commands.recv() => match cmd {
                    Some(Command::Stop) | None => {
                        set_state(&status, &bus, &slug, SchedulerState::Stopped);
                        break 'outer;
                    }
                    Some(Command::Pause) => {
                        set_state(&status, &bus, &slug, SchedulerState::Paused);
                        match wait_for_resume_or_stop(&mut commands).await {
                            WaitOutcome::Resume => continue 'outer,
                            WaitOutcome::Stop => {
                                set_state(&status, &bus, &slug, SchedulerState::Stopped);
                                break 'outer;
                            }
                        }
                    }
                    Some(_) => continue 'outer,
                },
            }
        };

        if run_feature(&slug, &store, &bus, &agents, &verifier, retry_cap, &options, &status, &mut commands, feature)
            .await
            .should_halt()
        {
            break 'outer;
        }
    }
}

enum StepOutcome {
    Continue,
    Halt,
}

impl StepOutcome {
    fn should_halt(&self) -> bool {
        matches!(self, StepOutcome::Halt)
    }
}

/// Dispatch, await, (maybe) verify, and update one feature. Returns whether
/// the driver loop should keep going.
#[allow(clippy::too_many_arguments)]
async fn run_feature<A, C, V>(
    slug: &ProjectSlug,
    store: &Store<C>,
    bus: &EventBus<C>,
    agents: &AgentSession<A, C>,
    verifier: &V,
    retry_cap: u32,
    options: &SchedulerOptions,
    status: &Mutex<SchedulerStatus>,
    commands: &mut mpsc::Receiver<Command>,
    feature: Feature,
) -> StepOutcome
where
    A: AgentAdapter,
    C: Clock,
    V: VerificationHook,
{
    set_current_feature(status, Some(feature.id));
    set_state(status, bus, slug, SchedulerState::Dispatching);

    let project = match store.get_project(slug) {
        Ok(project) => project,
        Err(err) => {
            tracing::error!(%slug, %err, "scheduler failed to load project");
            set_state(status, bus, slug, SchedulerState::Error);
            return StepOutcome::Halt;
        }
    };

    if let Err(err) = bus.transition_feature(slug, feature.id, FeatureState::InProgress, feature.passes) {
        tracing::warn!(%slug, feature_id = %feature.id, %err, "could not mark feature in progress, retrying next sweep");
        set_current_feature(status, None);
        return StepOutcome::Continue;
    }

    let recently_done = store.list_features(slug, None).map(|g| g.done).unwrap_or_default();
    let prompt = compose_prompt(&project.app_spec, &feature, &recently_done, options.recent_summary_budget);

    let model = options.model_per_role.get(&AgentRole::Coding).cloned();
    let start_options = StartOptions { model, extra_args: Vec::new() };
    let session_id = match agents.start(slug, AgentRole::Coding, prompt, project.workspace_path.clone(), start_options).await {
        Ok(id) => id,
        Err(err) => {
            tracing::error!(%slug, feature_id = %feature.id, %err, "failed to start agent session");
            set_state(status, bus, slug, SchedulerState::Error);
            return StepOutcome::Halt;
        }
    };

    let run = match bus.begin_run(slug, feature.id, Some(session_id)) {
        Ok(run) => run,
        Err(err) => {
            tracing::error!(%slug, feature_id = %feature.id, %err, "failed to record run start");
            set_state(status, bus, slug, SchedulerState::Error);
            return StepOutcome::Halt;
        }
    };

    set_state(status, bus, slug, SchedulerState::AwaitingAgent);

    let join_fut = agents.join(session_id);
    tokio::pin!(join_fut);
    let mut resume_caused_cancel = false;
    let mut forced_skip = false;
    let mut stop_requested = false;
    let (outcome, exit_code) = loop {
        tokio::select! {
            res = &mut join_fut => {
                break match res {
                    Ok(result) => result,
                    Err(err) => {
                        tracing::error!(%slug, feature_id = %feature.id, %err, "agent session lost");
                        (RunOutcome::Error, None)
                    }
                };
            }
            cmd = commands.recv() => {
                match cmd {
                    Some(Command::Stop) => {
                        stop_requested = true;
                        let _ = agents.cancel(session_id);
                    }
                    Some(Command::Pause) => {
                        let _ = agents.cancel(session_id);
                    }
                    Some(Command::RestartFeature(id)) if id == feature.id => {
                        resume_caused_cancel = true;
                        let _ = agents.cancel(session_id);
                    }
                    Some(Command::SkipFeature(id)) if id == feature.id => {
                        forced_skip = true;
                        let _ = agents.cancel(session_id);
                    }
                    Some(_) | None => {}
                }
            }
        }
    };

    let _ = bus.finish_run(slug, run.id, outcome, exit_code);

    if forced_skip {
        set_state(status, bus, slug, SchedulerState::Updating);
        let _ = bus.transition_feature_with_retry(slug, feature.id, FeatureState::Done, true, Some(false), Some(feature.retry_count));
        set_current_feature(status, None);
        return StepOutcome::Continue;
    }

    let verification = if matches!(outcome, RunOutcome::Success) {
        set_state(status, bus, slug, SchedulerState::Verifying);
        Some(verifier.verify(&project.workspace_path, &feature).await)
    } else {
        None
    };

    set_state(status, bus, slug, SchedulerState::Updating);
    let decision = retry::decide(RetryInput {
        outcome,
        verification,
        prior_passes: feature.passes,
        prior_retry_count: feature.retry_count,
        yolo: options.yolo,
        retry_cap,
        resume_caused_cancel,
    });

    if let Err(err) = bus.transition_feature_with_retry(
        slug,
        feature.id,
        decision.target_state,
        decision.passes,
        Some(decision.needs_review),
        Some(decision.retry_count),
    ) {
        tracing::error!(%slug, feature_id = %feature.id, %err, "failed to persist update decision");
        set_state(status, bus, slug, SchedulerState::Error);
        set_current_feature(status, None);
        return StepOutcome::Halt;
    }

    set_current_feature(status, None);

    if decision.scheduler_errors {
        set_state(status, bus, slug, SchedulerState::Error);
        return StepOutcome::Halt;
    }

    if !decision.continue_scheduling {
        if stop_requested {
            set_state(status, bus, slug, SchedulerState::Stopped);
            return StepOutcome::Halt;
        }
        set_state(status, bus, slug, SchedulerState::Paused);
        return match wait_for_resume_or_stop(commands).await {
            WaitOutcome::Resume => StepOutcome::Continue,
            WaitOutcome::Stop => {
                set_state(status, bus, slug, SchedulerState::Stopped);
                StepOutcome::Halt
            }
        };
    }

    StepOutcome::Continue
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
