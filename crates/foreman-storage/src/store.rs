// SPDX-License-Identifier: MIT

//! The typed Store API (§4.1): one `Wal` + `MaterializedState` per project,
//! each guarded by its own lock so unrelated projects never contend.

use crate::checkpoint::Checkpointer;
use crate::error::StoreError;
use crate::state::MaterializedState;
use crate::wal::Wal;
use foreman_core::{
    ChangeType, ComponentReferenceSession, Config, Event, EventKind, Feature, FeatureId, FeatureState,
    Project, ProjectState, ProjectSlug, ReferenceSessionId, Run, RunId, RunOutcome, SourceSpec,
    SpecUpdateAnalysis, SpecUpdateAnalysisId,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

/// Optional filters for [`Store::list_features`].
#[derive(Debug, Clone, Default)]
pub struct FeatureFilter {
    pub category: Option<String>,
    pub needs_review: Option<bool>,
}

impl FeatureFilter {
    fn matches(&self, feature: &Feature) -> bool {
        if let Some(category) = &self.category {
            if &feature.category != category {
                return false;
            }
        }
        if let Some(needs_review) = self.needs_review {
            if feature.needs_review != needs_review {
                return false;
            }
        }
        true
    }
}

/// Features grouped by lifecycle state, each preserving id order (§3).
#[derive(Debug, Clone, Default)]
pub struct FeatureGroups {
    pub pending: Vec<Feature>,
    pub in_progress: Vec<Feature>,
    pub done: Vec<Feature>,
}

/// Fields accepted when creating a feature (§4.5: generation, manual entry,
/// reference import, and spec-update merge all funnel through here).
#[derive(Debug, Clone)]
pub struct NewFeature {
    pub category: String,
    pub name: String,
    pub description: String,
    pub steps: Vec<String>,
    pub source_spec: Option<SourceSpec>,
}

/// One existing feature's content rewrite within a [`SpecUpdateApply`]
/// (§4.5 "Apply", `update` action).
#[derive(Debug, Clone)]
pub struct FeatureContentUpdate {
    pub feature_id: FeatureId,
    pub category: String,
    pub name: String,
    pub description: String,
    pub steps: Vec<String>,
    pub change_type: ChangeType,
}

/// The operator-approved mapping for one [`Store::apply_spec_update`] call
/// (§4.5 "Apply"): a new app-spec text, features to create, and features to
/// rewrite in place. `skip` actions simply have no corresponding entry here.
///
/// `analysis_id` identifies the [`foreman_core::SpecUpdateAnalysis`] this
/// mapping was approved against; `apply_spec_update` is idempotent on it
/// (§8 property 7), so retrying the same apply never double-creates
/// features.
#[derive(Debug, Clone)]
pub struct SpecUpdateApply {
    pub analysis_id: SpecUpdateAnalysisId,
    pub app_spec: String,
    pub summary: String,
    pub creates: Vec<NewFeature>,
    pub updates: Vec<FeatureContentUpdate>,
}

struct ProjectStore {
    wal: Wal,
    state: MaterializedState,
    checkpointer: Checkpointer,
}

/// Per-project WAL + materialized state, indexed by slug and lazily opened
/// on first touch (§4.1 "Recovery").
pub struct Store<C: foreman_core::Clock> {
    projects_root: PathBuf,
    event_retention_per_project: usize,
    clock: C,
    projects: Mutex<HashMap<ProjectSlug, Arc<Mutex<ProjectStore>>>>,
    // RunId and SpecUpdateAnalysisId are globally unique but Store shards
    // state per project, so operations keyed only by these ids need a way
    // back to the owning project's lock.
    run_index: Mutex<HashMap<RunId, ProjectSlug>>,
    spec_analysis_index: Mutex<HashMap<SpecUpdateAnalysisId, ProjectSlug>>,
    reference_index: Mutex<HashMap<ReferenceSessionId, ProjectSlug>>,
}

impl<C: foreman_core::Clock> Store<C> {
    pub fn new(config: &Config, clock: C) -> Self {
        Self {
            projects_root: config.projects_root.clone(),
            event_retention_per_project: config.event_retention_per_project,
            clock,
            projects: Mutex::new(HashMap::new()),
            run_index: Mutex::new(HashMap::new()),
            spec_analysis_index: Mutex::new(HashMap::new()),
            reference_index: Mutex::new(HashMap::new()),
        }
    }

    /// Project slugs with an on-disk directory under `projects_root`,
    /// discovered without opening them (for startup reconciliation).
    pub fn discover_existing_projects(&self) -> Result<Vec<ProjectSlug>, StoreError> {
        if !self.projects_root.exists() {
            return Ok(Vec::new());
        }
        let mut slugs = Vec::new();
        for entry in fs::read_dir(&self.projects_root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if let Ok(slug) = ProjectSlug::parse(name) {
                    slugs.push(slug);
                }
            }
        }
        Ok(slugs)
    }

    fn get_or_open_project(&self, slug: &ProjectSlug) -> Result<Arc<Mutex<ProjectStore>>, StoreError> {
        {
            let projects = self.projects.lock();
            if let Some(p) = projects.get(slug) {
                return Ok(p.clone());
            }
        }

        let dir = self.projects_root.join(slug.as_str());
        fs::create_dir_all(&dir)?;
        let wal_path = dir.join("store.wal");
        let snapshot_path = dir.join("snapshot.zst");
        let checkpointer = Checkpointer::new(snapshot_path);

        let (mut state, processed_seq) = match checkpointer.load()? {
            Some(snapshot) => (snapshot.state, snapshot.seq),
            None => (MaterializedState::new(self.event_retention_per_project), 0),
        };
        let mut wal = Wal::open(&wal_path, processed_seq)?;
        while let Some(entry) = wal.next_unprocessed()? {
            state.apply_event(&entry.event);
            wal.mark_processed(entry.seq);
        }

        let project_store = Arc::new(Mutex::new(ProjectStore { wal, state, checkpointer }));
        self.reindex(&project_store.lock(), slug);

        let mut projects = self.projects.lock();
        let entry = projects.entry(slug.clone()).or_insert(project_store);
        Ok(entry.clone())
    }

    fn reindex(&self, project_store: &ProjectStore, slug: &ProjectSlug) {
        let mut run_index = self.run_index.lock();
        for run_id in project_store.state.runs.keys() {
            run_index.insert(*run_id, slug.clone());
        }
        let mut spec_analysis_index = self.spec_analysis_index.lock();
        for id in project_store.state.spec_analyses.keys() {
            spec_analysis_index.insert(*id, slug.clone());
        }
        let mut reference_index = self.reference_index.lock();
        for id in project_store.state.reference_sessions.keys() {
            reference_index.insert(*id, slug.clone());
        }
    }

    /// Append `kind` to `slug`'s WAL, fold it into the project's materialized
    /// state, and flush before returning. Every Store operation that mutates
    /// state goes through this so a success always means durably committed.
    fn append_event_locked(&self, project_store: &mut ProjectStore, slug: &ProjectSlug, kind: EventKind) -> Result<Event, StoreError> {
        let timestamp = self.clock.now_utc();
        let draft = Event::new(slug.clone(), 0, kind, timestamp);
        let seq = project_store.wal.append(&draft)?;
        project_store.wal.flush()?;
        let stamped = Event { seq, ..draft };
        project_store.state.apply_event(&stamped);
        Ok(stamped)
    }

    pub fn create_project(
        &self,
        slug: ProjectSlug,
        workspace_path: PathBuf,
        spec_method: foreman_core::SpecMethod,
    ) -> Result<Project, StoreError> {
        let project_store = self.get_or_open_project(&slug)?;
        let mut guard = project_store.lock();
        if guard.state.project.is_some() {
            return Err(StoreError::ProjectAlreadyExists(slug));
        }

        let project = Project::new(slug.clone(), workspace_path, spec_method, self.clock.epoch_ms());
        guard.state.project = Some(project.clone());
        // Creation isn't itself a lifecycle transition, so there's no natural
        // event to carry it. Snapshot immediately instead, so the project's
        // existence survives a restart even with an empty WAL.
        guard.checkpointer.checkpoint(&mut guard.wal, &guard.state, self.clock.now_utc())?;
        Ok(project)
    }

    pub fn get_project(&self, slug: &ProjectSlug) -> Result<Project, StoreError> {
        let project_store = self.get_or_open_project(slug)?;
        let guard = project_store.lock();
        guard.state.project.clone().ok_or_else(|| StoreError::ProjectNotFound(slug.clone()))
    }

    pub fn update_project_state(&self, slug: &ProjectSlug, target: ProjectState) -> Result<Project, StoreError> {
        let project_store = self.get_or_open_project(slug)?;
        let mut guard = project_store.lock();
        let current = guard.state.project.clone().ok_or_else(|| StoreError::ProjectNotFound(slug.clone()))?;

        if !current.state.can_transition_to(target) {
            return Err(StoreError::InvalidProjectTransition(slug.clone(), current.state.to_string(), target.to_string()));
        }
        if current.state != target {
            self.append_event_locked(&mut guard, slug, EventKind::ProjectStateChanged { from: current.state, to: target })?;
        }
        #[allow(clippy::expect_used)]
        let project = guard.state.project.clone().expect("project set above");
        Ok(project)
    }

    pub fn list_features(&self, slug: &ProjectSlug, filter: Option<&FeatureFilter>) -> Result<FeatureGroups, StoreError> {
        let project_store = self.get_or_open_project(slug)?;
        let guard = project_store.lock();
        if guard.state.project.is_none() {
            return Err(StoreError::ProjectNotFound(slug.clone()));
        }

        let mut groups = FeatureGroups::default();
        // `features` is a BTreeMap<FeatureId, _>, so this iterates in id order.
        for feature in guard.state.features.values() {
            if let Some(filter) = filter {
                if !filter.matches(feature) {
                    continue;
                }
            }
            match feature.state {
                FeatureState::Pending => groups.pending.push(feature.clone()),
                FeatureState::InProgress => groups.in_progress.push(feature.clone()),
                FeatureState::Done => groups.done.push(feature.clone()),
            }
        }
        Ok(groups)
    }

    pub fn create_feature(&self, slug: &ProjectSlug, new_feature: NewFeature) -> Result<Feature, StoreError> {
        let project_store = self.get_or_open_project(slug)?;
        let mut guard = project_store.lock();
        if guard.state.project.is_none() {
            return Err(StoreError::ProjectNotFound(slug.clone()));
        }
        if guard.state.features.values().any(|f| f.name == new_feature.name) {
            return Err(StoreError::DuplicateFeatureName(new_feature.name, slug.clone()));
        }

        let id = guard.state.allocate_feature_id();
        let mut feature = Feature::new(id, new_feature.category, new_feature.name);
        feature.description = new_feature.description;
        feature.steps = new_feature.steps;
        feature.source_spec = new_feature.source_spec;

        self.append_event_locked(&mut guard, slug, EventKind::FeatureCreated { feature: feature.clone() })?;
        Ok(feature)
    }

    pub fn transition_feature(
        &self,
        slug: &ProjectSlug,
        feature_id: FeatureId,
        target: FeatureState,
        passes: bool,
    ) -> Result<Feature, StoreError> {
        self.transition_feature_with_retry(slug, feature_id, target, passes, None, None)
    }

    /// Same as [`Store::transition_feature`] but also folds in a retry
    /// decision's `needs_review`/`retry_count` (§4.4 "Update rules"). Either
    /// field left `None` leaves the feature's current value untouched.
    pub fn transition_feature_with_retry(
        &self,
        slug: &ProjectSlug,
        feature_id: FeatureId,
        target: FeatureState,
        passes: bool,
        needs_review: Option<bool>,
        retry_count: Option<u32>,
    ) -> Result<Feature, StoreError> {
        let project_store = self.get_or_open_project(slug)?;
        let mut guard = project_store.lock();
        let current = guard
            .state
            .get_feature(&feature_id)
            .cloned()
            .ok_or_else(|| StoreError::FeatureNotFound(feature_id, slug.clone()))?;

        if !current.state.can_transition_to(target) {
            return Err(StoreError::InvalidFeatureTransition(feature_id, current.state.to_string(), target.to_string()));
        }
        if target == FeatureState::InProgress && current.state != FeatureState::InProgress {
            if let Some(other) = guard.state.features.values().find(|f| f.state == FeatureState::InProgress && f.id != feature_id) {
                return Err(StoreError::Concurrency(
                    slug.clone(),
                    format!("feature {other} is already in progress", other = other.id),
                ));
            }
        }

        let needs_review = needs_review.unwrap_or(current.needs_review);
        let retry_count = retry_count.unwrap_or(current.retry_count);
        if current.state != target || current.passes != passes || current.needs_review != needs_review || current.retry_count != retry_count {
            self.append_event_locked(
                &mut guard,
                slug,
                EventKind::FeatureTransitioned {
                    feature_id,
                    from: current.state,
                    to: target,
                    passes,
                    needs_review,
                    retry_count,
                    category: current.category.clone(),
                    name: current.name.clone(),
                    description: current.description.clone(),
                    steps: current.steps.clone(),
                },
            )?;
        }
        #[allow(clippy::expect_used)]
        let feature = guard.state.get_feature(&feature_id).cloned().expect("feature present above");
        Ok(feature)
    }

    /// Apply a spec update's accepted mapping atomically (§4.5 "Apply"): the
    /// project's app-spec is replaced, `create` actions append new pending
    /// features, `update` actions rewrite an existing feature's content (and
    /// reopen it if the change is `logic` and it was `done`), and `skip`
    /// actions are no-ops. One lock acquisition for the whole call, so no
    /// other Store operation on this project can interleave.
    pub fn apply_spec_update(&self, slug: &ProjectSlug, apply: SpecUpdateApply) -> Result<(), StoreError> {
        let project_store = self.get_or_open_project(slug)?;
        let mut guard = project_store.lock();
        if guard.state.project.is_none() {
            return Err(StoreError::ProjectNotFound(slug.clone()));
        }
        if guard.state.applied_spec_updates.contains(&apply.analysis_id) {
            // Already folded into this project's features; a retried apply
            // of the same analysis is a no-op rather than a second create.
            return Ok(());
        }

        for create in apply.creates {
            let id = guard.state.allocate_feature_id();
            let mut feature = Feature::new(id, create.category, create.name);
            feature.description = create.description;
            feature.steps = create.steps;
            feature.source_spec = Some(SourceSpec::SpecUpdate);
            self.append_event_locked(&mut guard, slug, EventKind::FeatureCreated { feature })?;
        }

        for update in apply.updates {
            let current = guard
                .state
                .get_feature(&update.feature_id)
                .cloned()
                .ok_or_else(|| StoreError::FeatureNotFound(update.feature_id, slug.clone()))?;

            let (target, passes, needs_review, retry_count) =
                if update.change_type == ChangeType::Logic && current.state == FeatureState::Done {
                    (FeatureState::Pending, false, true, 0)
                } else {
                    (current.state, current.passes, current.needs_review, current.retry_count)
                };

            let unchanged = current.state == target
                && current.passes == passes
                && current.needs_review == needs_review
                && current.retry_count == retry_count
                && current.category == update.category
                && current.name == update.name
                && current.description == update.description
                && current.steps == update.steps;
            if unchanged {
                continue;
            }

            self.append_event_locked(
                &mut guard,
                slug,
                EventKind::FeatureTransitioned {
                    feature_id: update.feature_id,
                    from: current.state,
                    to: target,
                    passes,
                    needs_review,
                    retry_count,
                    category: update.category,
                    name: update.name,
                    description: update.description,
                    steps: update.steps,
                },
            )?;
        }

        self.append_event_locked(
            &mut guard,
            slug,
            EventKind::SpecUpdated { summary: apply.summary, app_spec: apply.app_spec, analysis_id: apply.analysis_id },
        )?;
        Ok(())
    }

    pub fn begin_run(
        &self,
        slug: &ProjectSlug,
        feature_id: FeatureId,
        session_id: Option<foreman_core::SessionId>,
    ) -> Result<Run, StoreError> {
        let project_store = self.get_or_open_project(slug)?;
        let mut guard = project_store.lock();
        if !guard.state.features.contains_key(&feature_id) {
            return Err(StoreError::FeatureNotFound(feature_id, slug.clone()));
        }

        let run_id = RunId::new();
        // One append-only output file per run, under the project's workspace
        // (§6 "one file per run, append-only, capped at a configurable size
        // with rotation" — rotation itself lives with the agent adapter that
        // writes the file, not Store).
        let output_path = self.projects_root.join(slug.as_str()).join("runs").join(format!("{run_id}.out"));
        let mut run = Run::start(run_id, feature_id, self.clock.epoch_ms(), output_path);
        run.session_id = session_id;

        self.append_event_locked(&mut guard, slug, EventKind::RunStarted { run: run.clone() })?;
        self.run_index.lock().insert(run.id, slug.clone());
        Ok(run)
    }

    pub fn finish_run(&self, run_id: RunId, outcome: RunOutcome, exit_code: Option<i32>) -> Result<Run, StoreError> {
        let slug = self.run_index.lock().get(&run_id).cloned().ok_or(StoreError::RunNotFound(run_id))?;
        let project_store = self.get_or_open_project(&slug)?;
        let mut guard = project_store.lock();
        let run = guard.state.get_run(&run_id).cloned().ok_or(StoreError::RunNotFound(run_id))?;
        if run.is_finished() {
            return Err(StoreError::RunAlreadyFinished(run_id));
        }

        self.append_event_locked(
            &mut guard,
            &slug,
            EventKind::RunFinished { run_id, feature_id: run.feature_id, outcome, exit_code },
        )?;
        #[allow(clippy::expect_used)]
        let finished_run = guard.state.get_run(&run_id).cloned().expect("run present above");
        Ok(finished_run)
    }

    /// Append a notification-only event (agent lines/heartbeats, spec
    /// summaries, scheduler state, errors) that carries no entity Store
    /// owns through a dedicated typed operation.
    pub fn append_event(&self, slug: &ProjectSlug, kind: EventKind) -> Result<Event, StoreError> {
        let project_store = self.get_or_open_project(slug)?;
        let mut guard = project_store.lock();
        if guard.state.project.is_none() {
            return Err(StoreError::ProjectNotFound(slug.clone()));
        }
        self.append_event_locked(&mut guard, slug, kind)
    }

    /// Events with `seq > from_seq` for `slug`, oldest first, bounded by the
    /// project's retained ring buffer (§4.2 "EventBus replay").
    pub fn replay_events(&self, slug: &ProjectSlug, from_seq: u64) -> Result<Vec<Event>, StoreError> {
        let project_store = self.get_or_open_project(slug)?;
        let guard = project_store.lock();
        Ok(guard.state.events.after(from_seq))
    }

    /// The highest `seq` persisted for `slug` so far, for callers that need
    /// to fan out only what a direct Store call just appended (see
    /// [`foreman_eventbus::EventBus`]'s wrapper methods).
    pub fn latest_seq(&self, slug: &ProjectSlug) -> Result<u64, StoreError> {
        let project_store = self.get_or_open_project(slug)?;
        let guard = project_store.lock();
        Ok(guard.state.events.latest_seq())
    }

    pub fn checkpoint(&self, slug: &ProjectSlug) -> Result<(), StoreError> {
        let project_store = self.get_or_open_project(slug)?;
        let mut guard = project_store.lock();
        let now = self.clock.now_utc();
        guard.checkpointer.checkpoint(&mut guard.wal, &guard.state, now)?;
        Ok(())
    }

    pub fn save_spec_analysis(&self, slug: &ProjectSlug, analysis: SpecUpdateAnalysis) -> Result<(), StoreError> {
        let project_store = self.get_or_open_project(slug)?;
        let mut guard = project_store.lock();
        let id = analysis.id;
        guard.state.save_spec_analysis(analysis);
        self.spec_analysis_index.lock().insert(id, slug.clone());
        Ok(())
    }

    pub fn load_spec_analysis(&self, id: &SpecUpdateAnalysisId) -> Result<SpecUpdateAnalysis, StoreError> {
        let slug = self.spec_analysis_index.lock().get(id).cloned().ok_or(StoreError::SpecAnalysisNotFound(*id))?;
        let project_store = self.get_or_open_project(&slug)?;
        let guard = project_store.lock();
        guard.state.load_spec_analysis(id).cloned().ok_or(StoreError::SpecAnalysisNotFound(*id))
    }

    /// Drop analyses older than `ttl_s` seconds, scoped to one project.
    pub fn expire_spec_analyses(&self, slug: &ProjectSlug, ttl_s: u64) -> Result<usize, StoreError> {
        let project_store = self.get_or_open_project(slug)?;
        let mut guard = project_store.lock();
        let created_before_ms = self.clock.epoch_ms().saturating_sub(ttl_s * 1000);
        let dropped = guard.state.expire_spec_analyses(created_before_ms);
        let mut index = self.spec_analysis_index.lock();
        index.retain(|id, owner| owner != slug || guard.state.load_spec_analysis(id).is_some());
        Ok(dropped)
    }

    pub fn save_reference_session(&self, slug: &ProjectSlug, session: ComponentReferenceSession) -> Result<(), StoreError> {
        let project_store = self.get_or_open_project(slug)?;
        let mut guard = project_store.lock();
        let id = session.id;
        guard.state.save_reference_session(session);
        self.reference_index.lock().insert(id, slug.clone());
        Ok(())
    }

    pub fn get_reference_session(&self, id: &ReferenceSessionId) -> Result<ComponentReferenceSession, StoreError> {
        let slug = self.reference_index.lock().get(id).cloned().ok_or(StoreError::ReferenceSessionNotFound(*id))?;
        let project_store = self.get_or_open_project(&slug)?;
        let guard = project_store.lock();
        guard.state.get_reference_session(id).cloned().ok_or(StoreError::ReferenceSessionNotFound(*id))
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
