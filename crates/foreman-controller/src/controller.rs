// SPDX-License-Identifier: MIT

//! The single entry point for all external verbs on a project (§4.6).

use crate::error::ControllerError;
use crate::registry::{begin_session, ProjectEntry, Registry};
use foreman_agent::{AgentAdapter, AgentSession, OutputStream, StartOptions, StreamItem};
use foreman_core::{
    AgentRole, Clock, ComponentDescriptor, ComponentReferenceSession, Config, EventKind, FeatureId, Project,
    ProjectSlug, ProjectState, ReferenceSessionId, RunOutcome, SourceSpec, SpecMethod, SpecUpdateAnalysis,
    SpecUpdateAnalysisId,
};
use foreman_eventbus::EventBus;
use foreman_scheduler::{FeatureScheduler, SchedulerOptions, VerificationHook};
use foreman_specpipeline::CandidateMapping;
use foreman_storage::{NewFeature, SpecUpdateApply, Store, StoreError};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;

/// Owns the Store, EventBus, and AgentSession supervisor shared by every
/// registered project, plus the per-project scheduler/registry state (§4.6,
/// §9 "thread these as injected dependencies to ProjectController").
pub struct ProjectController<A: AgentAdapter, C: Clock, V: VerificationHook> {
    pub(crate) store: Arc<Store<C>>,
    pub(crate) bus: Arc<EventBus<C>>,
    agents: Arc<AgentSession<A, C>>,
    verifier: Arc<V>,
    clock: C,
    config: Config,
    pub(crate) registry: Registry<A, C, V>,
}

#[derive(Debug, Deserialize)]
struct RawComponentDescriptor {
    name: String,
    path: PathBuf,
    #[serde(default)]
    metadata: serde_json::Value,
}

impl<A, C, V> ProjectController<A, C, V>
where
    A: AgentAdapter + 'static,
    C: Clock + 'static,
    V: VerificationHook + 'static,
{
    pub fn new(store: Arc<Store<C>>, bus: Arc<EventBus<C>>, agents: Arc<AgentSession<A, C>>, verifier: Arc<V>, clock: C, config: Config) -> Self {
        Self { store, bus, agents, verifier, clock, config, registry: Registry::new() }
    }

    fn entry(&self, slug: &ProjectSlug) -> Result<Arc<ProjectEntry<A, C, V>>, ControllerError> {
        self.registry.get(slug)
    }

    /// Apply a project-state transition best-effort: an operator-driven
    /// pause/resume racing a concurrent transition (e.g. the scheduler just
    /// finished the last feature) is not itself an error.
    fn try_transition_project(&self, slug: &ProjectSlug, target: ProjectState) -> Result<(), ControllerError> {
        match self.bus.update_project_state(slug, target) {
            Ok(_) => Ok(()),
            Err(foreman_eventbus::EventBusError::Store(StoreError::InvalidProjectTransition(..))) => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// Register a new project and spawn its scheduler, paused (§4.4 "the
    /// task starts idle"). A lifecycle watcher observes `scheduler_state_changed`
    /// events to retire the project to `complete`/`error` (§4.6, §9 "no
    /// back-pointers" — the watcher reacts to events rather than the
    /// scheduler calling back into the project record directly).
    pub fn register(&self, slug: ProjectSlug, workspace_path: PathBuf, spec_method: SpecMethod) -> Result<Project, ControllerError> {
        let project = self.store.create_project(slug, workspace_path, spec_method)?;
        self.attach(project)
    }

    /// Spawn a project's scheduler and lifecycle watcher and register it in
    /// the in-process [`Registry`], for a [`Project`] already durable in the
    /// Store (freshly created, or rediscovered at startup — see
    /// [`crate::lifecycle`]).
    pub(crate) fn attach(&self, project: Project) -> Result<Project, ControllerError> {
        let scheduler = FeatureScheduler::spawn(
            project.slug.clone(),
            self.store.clone(),
            self.bus.clone(),
            self.agents.clone(),
            self.verifier.clone(),
            self.config.retry_cap,
            SchedulerOptions::default(),
        );
        let entry = ProjectEntry::new(project.workspace_path.clone(), scheduler);
        self.registry.insert(project.slug.clone(), entry)?;
        spawn_lifecycle_watcher(project.slug.clone(), self.store.clone(), self.bus.clone());
        Ok(project)
    }

    /// Register a project over an already-existing codebase, in place of
    /// SpecPipeline-driven generation (§4.6 `import_existing`, paired with
    /// `start_reference_session` / `generate_features_from_references`).
    pub fn import_existing(&self, slug: ProjectSlug, workspace_path: PathBuf) -> Result<Project, ControllerError> {
        self.register(slug, workspace_path, SpecMethod::Manual)
    }

    pub fn set_spec_inputs(&self, slug: &ProjectSlug, input_text: impl Into<String>) -> Result<(), ControllerError> {
        let entry = self.entry(slug)?;
        *entry.pending_spec_input.lock() = Some(input_text.into());
        Ok(())
    }

    /// Run initial generation over the document staged by `set_spec_inputs`,
    /// persist the resulting app-spec and pending features in one Store
    /// transaction, and mark the project `spec_ready` (§4.5 "Initial
    /// generation").
    pub async fn generate_features(
        &self,
        slug: &ProjectSlug,
        feature_count_target: Option<(usize, usize)>,
    ) -> Result<usize, ControllerError> {
        let entry = self.entry(slug)?;
        let input_text =
            entry.pending_spec_input.lock().take().ok_or_else(|| ControllerError::SpecInputsNotSet(slug.clone()))?;

        let guard = begin_session(&entry, slug, AgentRole::SpecAnalysis)?;
        let candidates = foreman_specpipeline::generate_initial_spec(
            &self.agents,
            slug,
            &entry.workspace_path,
            &input_text,
            self.config.dedup_similarity_threshold,
            feature_count_target,
        )
        .await?;
        drop(guard);

        let feature_count = candidates.len();
        let creates = candidates
            .into_iter()
            .map(|c| NewFeature {
                category: c.category,
                name: c.name,
                description: c.description,
                steps: c.steps,
                source_spec: Some(c.source_spec),
            })
            .collect();

        self.bus.apply_spec_update(
            slug,
            SpecUpdateApply {
                // Initial generation isn't itself driven by an analyze/apply
                // round trip, so it always gets a fresh id: idempotence here
                // is already enforced by `pending_spec_input` being taken
                // above, which makes a second call fail before reaching this
                // point rather than needing to recognize a repeat analysis.
                analysis_id: SpecUpdateAnalysisId::new(),
                app_spec: input_text.trim().to_string(),
                summary: "initial feature generation".to_string(),
                creates,
                updates: Vec::new(),
            },
        )?;
        self.bus.publish(slug, EventKind::SpecGenerated { feature_count })?;
        self.try_transition_project(slug, ProjectState::SpecReady)?;
        Ok(feature_count)
    }

    /// Start the scheduler (§4.6 "rejected unless the project is spec_ready
    /// with ≥1 pending feature").
    pub async fn start_build(&self, slug: &ProjectSlug) -> Result<(), ControllerError> {
        let entry = self.entry(slug)?;
        let project = self.store.get_project(slug)?;
        if project.state != ProjectState::SpecReady {
            return Err(ControllerError::NotReadyToBuild(slug.clone()));
        }
        let pending = self.store.list_features(slug, None)?.pending;
        if pending.is_empty() {
            return Err(ControllerError::NotReadyToBuild(slug.clone()));
        }

        self.bus.update_project_state(slug, ProjectState::Building)?;
        entry.scheduler.start().await?;
        Ok(())
    }

    pub async fn pause(&self, slug: &ProjectSlug) -> Result<(), ControllerError> {
        let entry = self.entry(slug)?;
        entry.scheduler.pause().await?;
        self.try_transition_project(slug, ProjectState::Paused)
    }

    pub async fn resume(&self, slug: &ProjectSlug) -> Result<(), ControllerError> {
        let entry = self.entry(slug)?;
        self.try_transition_project(slug, ProjectState::Building)?;
        entry.scheduler.resume().await?;
        Ok(())
    }

    pub async fn stop(&self, slug: &ProjectSlug) -> Result<(), ControllerError> {
        let entry = self.entry(slug)?;
        entry.scheduler.stop().await?;
        Ok(())
    }

    pub async fn restart_feature(&self, slug: &ProjectSlug, feature_id: FeatureId) -> Result<(), ControllerError> {
        let entry = self.entry(slug)?;
        entry.scheduler.restart_feature(feature_id).await?;
        Ok(())
    }

    /// Run one `analysis` session over the project workspace and persist the
    /// discovered components (§4.6 `start_reference_session`).
    pub async fn start_reference_session(&self, slug: &ProjectSlug, prompt: impl Into<String>) -> Result<ComponentReferenceSession, ControllerError> {
        let entry = self.entry(slug)?;
        let guard = begin_session(&entry, slug, AgentRole::Analysis)?;

        let session_id =
            self.agents.start(slug, AgentRole::Analysis, prompt.into(), entry.workspace_path.clone(), StartOptions::default()).await?;
        let stdout = self.drain_stdout(session_id).await?;
        drop(guard);

        let raw: Vec<RawComponentDescriptor> =
            serde_json::from_str(stdout.trim()).map_err(|err| ControllerError::MalformedReferenceOutput(err.to_string()))?;
        let components =
            raw.into_iter().map(|r| ComponentDescriptor { name: r.name, path: r.path, metadata: r.metadata }).collect::<Vec<_>>();

        let mut session = ComponentReferenceSession::new(ReferenceSessionId::new(), slug.clone(), self.clock.epoch_ms());
        session.components = components;
        self.store.save_reference_session(slug, session.clone())?;
        self.bus.publish(
            slug,
            EventKind::ReferenceAdded { reference_session_id: session.id, component_count: session.components.len() },
        )?;
        Ok(session)
    }

    /// Turn a previously scanned reference session's components into pending
    /// features (§4.6 `generate_features_from_references`).
    pub fn generate_features_from_references(
        &self,
        slug: &ProjectSlug,
        reference_session_id: &ReferenceSessionId,
    ) -> Result<usize, ControllerError> {
        self.entry(slug)?;
        let session = self.store.get_reference_session(reference_session_id)?;

        let mut feature_count = 0;
        for component in &session.components {
            self.bus.create_feature(
                slug,
                NewFeature {
                    category: "imported".to_string(),
                    name: component.name.clone(),
                    description: format!("Imported from {}", component.path.display()),
                    steps: Vec::new(),
                    source_spec: Some(SourceSpec::Reference),
                },
            )?;
            feature_count += 1;
        }

        self.bus.publish(slug, EventKind::SpecGenerated { feature_count })?;
        self.try_transition_project(slug, ProjectState::SpecReady)?;
        Ok(feature_count)
    }

    /// Run a `redesign` session to completion without parsing its output
    /// (§4.3 "rewrite the UI" — unlike `spec_analysis`, this role has no
    /// structured response contract).
    pub async fn start_redesign(&self, slug: &ProjectSlug, prompt: impl Into<String>) -> Result<RunOutcome, ControllerError> {
        let entry = self.entry(slug)?;
        let guard = begin_session(&entry, slug, AgentRole::Redesign)?;

        let session_id =
            self.agents.start(slug, AgentRole::Redesign, prompt.into(), entry.workspace_path.clone(), StartOptions::default()).await?;
        let (outcome, _exit_code) = self.agents.join(session_id).await?;
        drop(guard);
        Ok(outcome)
    }

    /// Run the "Analyze" half of spec update (§4.5, §4.6 `analyze_spec_update`).
    pub async fn analyze_spec_update(&self, slug: &ProjectSlug, input_text: &str) -> Result<SpecUpdateAnalysis, ControllerError> {
        let entry = self.entry(slug)?;
        let guard = begin_session(&entry, slug, AgentRole::SpecAnalysis)?;

        let project = self.store.get_project(slug)?;
        let groups = self.store.list_features(slug, None)?;
        let existing: Vec<_> = groups.pending.into_iter().chain(groups.in_progress).chain(groups.done).collect();

        let analysis = foreman_specpipeline::analyze(
            &self.agents,
            &self.store,
            slug,
            &project.workspace_path,
            &existing,
            input_text,
            self.clock.epoch_ms(),
            self.config.dedup_similarity_threshold,
            foreman_specpipeline::DEFAULT_MATCH_TOP_K,
        )
        .await?;
        drop(guard);
        Ok(analysis)
    }

    /// Apply a previously persisted analysis (§4.5 "Apply", §4.6 "rejected
    /// while the scheduler is dispatching/awaiting_agent/verifying").
    pub fn apply_spec_update(
        &self,
        slug: &ProjectSlug,
        analysis_id: SpecUpdateAnalysisId,
        mapping: &[CandidateMapping],
    ) -> Result<(), ControllerError> {
        let entry = self.entry(slug)?;
        let status = entry.scheduler.status();
        if status.state.is_in_flight() {
            return Err(ControllerError::UpdateWhileInFlight(slug.clone(), status.state));
        }
        foreman_specpipeline::apply(&self.store, &self.bus, analysis_id, mapping)?;
        Ok(())
    }

    /// Every project slug the Store currently knows about, registered or not
    /// (§4.6 "list_features" sibling read — the CLI's `project list`).
    pub fn list_projects(&self) -> Result<Vec<ProjectSlug>, ControllerError> {
        Ok(self.store.discover_existing_projects()?)
    }

    pub fn get_project(&self, slug: &ProjectSlug) -> Result<Project, ControllerError> {
        Ok(self.store.get_project(slug)?)
    }

    pub fn list_features(
        &self,
        slug: &ProjectSlug,
        filter: Option<&foreman_storage::FeatureFilter>,
    ) -> Result<foreman_storage::FeatureGroups, ControllerError> {
        Ok(self.store.list_features(slug, filter)?)
    }

    pub fn status(&self, slug: &ProjectSlug) -> Result<foreman_scheduler::SchedulerStatus, ControllerError> {
        Ok(self.entry(slug)?.scheduler.status())
    }

    pub async fn skip_feature(&self, slug: &ProjectSlug, feature_id: FeatureId) -> Result<(), ControllerError> {
        let entry = self.entry(slug)?;
        entry.scheduler.skip_feature(feature_id).await?;
        Ok(())
    }

    async fn drain_stdout(&self, session_id: foreman_core::SessionId) -> Result<String, ControllerError> {
        let mut stream = self.agents.stream(session_id)?;
        let mut stdout = String::new();
        let mut outcome = RunOutcome::Error;
        while let Some(item) = stream.recv().await {
            match item {
                StreamItem::Line { stream: OutputStream::Stdout, line, .. } => {
                    stdout.push_str(&line);
                    stdout.push('\n');
                }
                StreamItem::Line { stream: OutputStream::Stderr, .. } => {}
                StreamItem::Terminated { outcome: terminal, .. } => outcome = terminal,
            }
        }
        if !matches!(outcome, RunOutcome::Success) {
            return Err(ControllerError::MalformedReferenceOutput("reference session did not complete successfully".to_string()));
        }
        Ok(stdout)
    }
}

fn spawn_lifecycle_watcher<C: Clock + 'static>(slug: ProjectSlug, store: Arc<Store<C>>, bus: Arc<EventBus<C>>) {
    tokio::spawn(async move {
        let Ok((_handle, mut rx)) = bus.subscribe(&slug, None) else { return };
        while let Some(event) = rx.recv().await {
            let EventKind::SchedulerStateChanged { to, .. } = &event.kind else { continue };
            match to.as_str() {
                "idle" => {
                    let Ok(groups) = store.list_features(&slug, None) else { continue };
                    if groups.pending.is_empty() && groups.in_progress.is_empty() {
                        let _ = store.update_project_state(&slug, ProjectState::Complete);
                    }
                }
                "error" => {
                    let _ = store.update_project_state(&slug, ProjectState::Error);
                }
                _ => {}
            }
        }
    });
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;
