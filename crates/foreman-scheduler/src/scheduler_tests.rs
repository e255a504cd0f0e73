// SPDX-License-Identifier: MIT

use super::*;
use foreman_agent::fake::{FakeAgentAdapter, ScriptedRun};
use foreman_core::{AgentBinaryConfig, AgentRole, Config, FakeClock, ProjectSlug, SourceSpec, SpecMethod};
use foreman_storage::NewFeature;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

fn config(dir: &std::path::Path) -> Config {
    let mut config = Config::new(dir.join("foreman.db"), dir.join("projects"));
    config.agent_binaries.insert(
        AgentRole::Coding,
        AgentBinaryConfig { binary: "fake-agent".into(), args_template: Vec::new(), env_template: HashMap::new() },
    );
    config
}

async fn poll_until<F: Fn() -> bool>(condition: F) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("condition never became true");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn one_pending_feature_runs_to_done() {
    let dir = tempdir().unwrap();
    let config = config(dir.path());
    let clock = FakeClock::new();
    let store = Arc::new(Store::new(&config, clock.clone()));
    let bus = Arc::new(EventBus::new(store.clone()));

    let adapter = FakeAgentAdapter::new();
    adapter.push_script(ScriptedRun::success(["implemented it"]));
    let agents = Arc::new(AgentSession::new(adapter, clock.clone(), config.clone()));
    let verifier = Arc::new(crate::FakeVerificationHook::always_pass());

    let slug = ProjectSlug::test("demo");
    store.create_project(slug.clone(), dir.path().join("ws"), SpecMethod::Manual).unwrap();
    store
        .create_feature(
            &slug,
            NewFeature { category: "core".into(), name: "f1".into(), description: "do it".into(), steps: vec![], source_spec: Some(SourceSpec::Manual) },
        )
        .unwrap();

    let options = SchedulerOptions { heartbeat_s: 1, ..Default::default() };
    let scheduler = FeatureScheduler::spawn(slug.clone(), store.clone(), bus, agents, verifier, config.retry_cap, options);
    scheduler.start().await.unwrap();

    poll_until(|| store.list_features(&slug, None).unwrap().done.len() == 1).await;

    let done = store.list_features(&slug, None).unwrap().done.into_iter().next().unwrap();
    assert_eq!(done.name, "f1");
    assert!(done.passes);

    scheduler.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn repeated_failures_flag_needs_review_without_halting_the_scheduler() {
    let dir = tempdir().unwrap();
    let config = config(dir.path());
    let clock = FakeClock::new();
    let store = Arc::new(Store::new(&config, clock.clone()));
    let bus = Arc::new(EventBus::new(store.clone()));

    let adapter = FakeAgentAdapter::new();
    let retry_cap = 3;
    for _ in 0..retry_cap {
        adapter.push_script(ScriptedRun::failure(["nope"], 1));
    }
    let agents = Arc::new(AgentSession::new(adapter, clock.clone(), config.clone()));
    let verifier = Arc::new(crate::FakeVerificationHook::always_pass());

    let slug = ProjectSlug::test("flaky");
    store.create_project(slug.clone(), dir.path().join("ws"), SpecMethod::Manual).unwrap();
    store
        .create_feature(
            &slug,
            NewFeature { category: "core".into(), name: "flaky".into(), description: "do it".into(), steps: vec![], source_spec: Some(SourceSpec::Manual) },
        )
        .unwrap();

    let options = SchedulerOptions { heartbeat_s: 1, ..Default::default() };
    let scheduler = FeatureScheduler::spawn(slug.clone(), store.clone(), bus, agents, verifier, retry_cap, options);
    scheduler.start().await.unwrap();

    poll_until(|| {
        store
            .list_features(&slug, None)
            .unwrap()
            .pending
            .iter()
            .any(|f| f.needs_review && f.retry_count >= retry_cap)
    })
    .await;

    // Retry-cap-exhausted feature must not be reselected: the scheduler goes
    // idle rather than dispatching it again (no scripted run is left queued
    // for a 4th attempt, so a further dispatch would error the adapter).
    poll_until(|| scheduler.status().state == SchedulerState::Idle).await;

    let status = scheduler.status();
    assert_eq!(status.state, SchedulerState::Idle);

    scheduler.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn pause_cancels_the_in_flight_session_and_resume_restarts_it() {
    let dir = tempdir().unwrap();
    let config = config(dir.path());
    let clock = FakeClock::new();
    let store = Arc::new(Store::new(&config, clock.clone()));
    let bus = Arc::new(EventBus::new(store.clone()));

    let adapter = FakeAgentAdapter::new();
    adapter.push_script(ScriptedRun::hanging());
    adapter.push_script(ScriptedRun::success(["implemented it on retry"]));
    let agents = Arc::new(AgentSession::new(adapter, clock.clone(), config.clone()));
    let verifier = Arc::new(crate::FakeVerificationHook::always_pass());

    let slug = ProjectSlug::test("pausable");
    store.create_project(slug.clone(), dir.path().join("ws"), SpecMethod::Manual).unwrap();
    store
        .create_feature(
            &slug,
            NewFeature { category: "core".into(), name: "slow".into(), description: "do it".into(), steps: vec![], source_spec: Some(SourceSpec::Manual) },
        )
        .unwrap();

    let options = SchedulerOptions { heartbeat_s: 1, ..Default::default() };
    let scheduler = FeatureScheduler::spawn(slug.clone(), store.clone(), bus, agents, verifier, config.retry_cap, options);
    scheduler.start().await.unwrap();

    poll_until(|| scheduler.status().state == SchedulerState::AwaitingAgent).await;
    scheduler.pause().await.unwrap();
    poll_until(|| scheduler.status().state == SchedulerState::Paused).await;

    let pending = store.list_features(&slug, None).unwrap().pending;
    assert_eq!(pending.len(), 1);
    assert!(!pending[0].passes);

    scheduler.resume().await.unwrap();
    poll_until(|| store.list_features(&slug, None).unwrap().done.len() == 1).await;

    let done = store.list_features(&slug, None).unwrap().done.into_iter().next().unwrap();
    assert!(done.passes);

    scheduler.stop().await.unwrap();
}
