// SPDX-License-Identifier: MIT

//! Project-scoped fan-out of events to live subscribers (§4.2).

use crate::error::EventBusError;
use foreman_core::{Event, EventKind, Feature, FeatureId, FeatureState, ProjectSlug, ProjectState, Run, RunId, RunOutcome, SessionId};
use foreman_storage::{NewFeature, SpecUpdateApply, Store};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

const DEFAULT_SUBSCRIBER_BUFFER: usize = 256;

/// Identifies one live subscription, for [`EventBus::unsubscribe`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionHandle {
    project: ProjectSlug,
    id: u64,
}

struct Subscriber {
    id: u64,
    sender: mpsc::Sender<Event>,
    last_delivered_seq: u64,
}

/// Fan-out layer over [`Store`]: `publish` persists through the store then
/// delivers to every live subscriber for that project, in sequence order;
/// `subscribe` replays the backlog from the store before handing off to live
/// delivery, with no gap or duplicate (§4.2).
pub struct EventBus<C: foreman_core::Clock> {
    store: Arc<Store<C>>,
    subscribers: Mutex<HashMap<ProjectSlug, Vec<Subscriber>>>,
    next_subscriber_id: AtomicU64,
    buffer_size: usize,
}

impl<C: foreman_core::Clock> EventBus<C> {
    pub fn new(store: Arc<Store<C>>) -> Self {
        Self::with_buffer_size(store, DEFAULT_SUBSCRIBER_BUFFER)
    }

    pub fn with_buffer_size(store: Arc<Store<C>>, buffer_size: usize) -> Self {
        Self { store, subscribers: Mutex::new(HashMap::new()), next_subscriber_id: AtomicU64::new(1), buffer_size }
    }

    /// Durably persist `kind` through the store, then deliver it to every
    /// live subscriber of `project`. Held under the subscriber-table lock so
    /// a concurrent `subscribe` can never observe a gap or a duplicate.
    pub fn publish(&self, project: &ProjectSlug, kind: EventKind) -> Result<Event, EventBusError> {
        let mut subscribers = self.subscribers.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let event = self.store.append_event(project, kind)?;
        if let Some(subs) = subscribers.get_mut(project) {
            subs.retain_mut(|sub| Self::deliver(sub, &event));
        }
        Ok(event)
    }

    /// Run a Store operation that appends exactly zero or one events and
    /// fan those out to live subscribers the same way `publish` does. Every
    /// Store call that mutates state outside of `publish` itself (the
    /// typed `transition_feature`/`begin_run`/... operations) must go
    /// through this, or live subscribers miss it even though it's
    /// faithfully durable and replayable by a fresh `subscribe` (§5
    /// "Replay/live gaplessness").
    fn with_fanout<T>(&self, project: &ProjectSlug, op: impl FnOnce() -> Result<T, foreman_storage::StoreError>) -> Result<T, EventBusError> {
        let mut subscribers = self.subscribers.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let before = self.store.latest_seq(project)?;
        let result = op()?;
        let fresh = self.store.replay_events(project, before)?;
        if let Some(subs) = subscribers.get_mut(project) {
            for event in &fresh {
                subs.retain_mut(|sub| Self::deliver(sub, event));
            }
        }
        Ok(result)
    }

    /// Wraps [`Store::create_feature`] with live fan-out of the resulting
    /// `feature_created` event.
    pub fn create_feature(&self, project: &ProjectSlug, new_feature: NewFeature) -> Result<Feature, EventBusError> {
        self.with_fanout(project, || self.store.create_feature(project, new_feature))
    }

    /// Wraps [`Store::update_project_state`] with live fan-out of the
    /// resulting `project_state_changed` event.
    pub fn update_project_state(&self, project: &ProjectSlug, target: ProjectState) -> Result<foreman_core::Project, EventBusError> {
        self.with_fanout(project, || self.store.update_project_state(project, target))
    }

    /// Wraps [`Store::transition_feature`] with live fan-out of the
    /// resulting `feature_transitioned` event.
    pub fn transition_feature(&self, project: &ProjectSlug, feature_id: FeatureId, target: FeatureState, passes: bool) -> Result<Feature, EventBusError> {
        self.with_fanout(project, || self.store.transition_feature(project, feature_id, target, passes))
    }

    /// Wraps [`Store::transition_feature_with_retry`] with live fan-out of
    /// the resulting `feature_transitioned` event.
    #[allow(clippy::too_many_arguments)]
    pub fn transition_feature_with_retry(
        &self,
        project: &ProjectSlug,
        feature_id: FeatureId,
        target: FeatureState,
        passes: bool,
        needs_review: Option<bool>,
        retry_count: Option<u32>,
    ) -> Result<Feature, EventBusError> {
        self.with_fanout(project, || {
            self.store.transition_feature_with_retry(project, feature_id, target, passes, needs_review, retry_count)
        })
    }

    /// Wraps [`Store::begin_run`] with live fan-out of the resulting
    /// `run_started` event.
    pub fn begin_run(&self, project: &ProjectSlug, feature_id: FeatureId, session_id: Option<SessionId>) -> Result<Run, EventBusError> {
        self.with_fanout(project, || self.store.begin_run(project, feature_id, session_id))
    }

    /// Wraps [`Store::finish_run`] with live fan-out of the resulting
    /// `run_finished` event.
    pub fn finish_run(&self, project: &ProjectSlug, run_id: RunId, outcome: RunOutcome, exit_code: Option<i32>) -> Result<Run, EventBusError> {
        self.with_fanout(project, || self.store.finish_run(run_id, outcome, exit_code))
    }

    /// Wraps [`Store::apply_spec_update`] with live fan-out of every event
    /// the apply appends (feature creates/rewrites, then the `spec_updated`
    /// summary).
    pub fn apply_spec_update(&self, project: &ProjectSlug, apply: SpecUpdateApply) -> Result<(), EventBusError> {
        self.with_fanout(project, || self.store.apply_spec_update(project, apply))
    }

    /// Try to deliver `event` to `sub`. Returns `false` (drop the
    /// subscriber) when its buffer is full: it is marked lagged and gets a
    /// terminal `lagged` event in the one slot reserved for it, instead of
    /// `event` itself.
    fn deliver(sub: &mut Subscriber, event: &Event) -> bool {
        // The channel is sized `buffer_size + 1`; once only the reserved
        // slot is left, treat the subscriber as lagged rather than race a
        // `try_send` that may or may not still fit `event`.
        if sub.sender.capacity() <= 1 {
            let lagged = Event::new(event.project.clone(), event.seq, EventKind::Lagged { last_delivered_seq: sub.last_delivered_seq }, event.timestamp);
            let _ = sub.sender.try_send(lagged);
            return false;
        }
        match sub.sender.try_send(event.clone()) {
            Ok(()) => {
                sub.last_delivered_seq = event.seq;
                true
            }
            Err(_) => false, // receiver dropped
        }
    }

    /// Subscribe to `project`'s events. If `since_seq` is given, the
    /// returned receiver's first messages are the backlog from the store
    /// (§4.1 ring buffer), followed by live events with no gap.
    pub fn subscribe(&self, project: &ProjectSlug, since_seq: Option<u64>) -> Result<(SubscriptionHandle, mpsc::Receiver<Event>), EventBusError> {
        let mut subscribers = self.subscribers.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let backlog = self.store.replay_events(project, since_seq.unwrap_or(0))?;

        // One slot beyond `buffer_size` is reserved for a terminal `lagged`
        // event, so marking a subscriber lagged never races a full channel.
        let (tx, rx) = mpsc::channel(self.buffer_size + 1);
        let mut last_delivered_seq = since_seq.unwrap_or(0);
        for event in backlog {
            // The backlog came from the same retention-bounded ring the live
            // fan-out reads from, so it fits a fresh channel of this size
            // under normal operation; if it doesn't, the subscriber starts
            // already-lagged rather than block the publisher holding this lock.
            if tx.try_send(event.clone()).is_err() {
                break;
            }
            last_delivered_seq = event.seq;
        }

        let id = self.next_subscriber_id.fetch_add(1, Ordering::Relaxed);
        subscribers.entry(project.clone()).or_default().push(Subscriber { id, sender: tx, last_delivered_seq });
        Ok((SubscriptionHandle { project: project.clone(), id }, rx))
    }

    pub fn unsubscribe(&self, handle: SubscriptionHandle) {
        let mut subscribers = self.subscribers.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(subs) = subscribers.get_mut(&handle.project) {
            subs.retain(|sub| sub.id != handle.id);
        }
    }

    /// Number of live subscribers for `project`, for tests and diagnostics.
    pub fn subscriber_count(&self, project: &ProjectSlug) -> usize {
        let subscribers = self.subscribers.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        subscribers.get(project).map_or(0, Vec::len)
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
