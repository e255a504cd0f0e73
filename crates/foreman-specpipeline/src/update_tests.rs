// SPDX-License-Identifier: MIT

use super::*;
use foreman_agent::fake::{FakeAgentAdapter, ScriptedRun};
use foreman_core::{AgentBinaryConfig, AgentRole, Config, FakeClock, FeatureState, SpecMethod};
use std::collections::HashMap;

fn config(dir: &std::path::Path) -> Config {
    let mut config = Config::new(dir.join("foreman.db"), dir.join("projects"));
    config.agent_binaries.insert(
        AgentRole::SpecAnalysis,
        AgentBinaryConfig { binary: "fake-agent".into(), args_template: Vec::new(), env_template: HashMap::new() },
    );
    config
}

fn agents(config: &Config, clock: FakeClock, script: ScriptedRun) -> AgentSession<FakeAgentAdapter, FakeClock> {
    let adapter = FakeAgentAdapter::new();
    adapter.push_script(script);
    AgentSession::new(adapter, clock, config.clone())
}

#[tokio::test]
async fn generate_initial_spec_dedupes_and_fits() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path());
    let clock = FakeClock::new();
    let json = r#"[{"category":"core","name":"Add button","description":"d","steps":["s1"]}]"#;
    let agents = agents(&config, clock, ScriptedRun::success([json]));

    let candidates = generate_initial_spec(
        &agents,
        &ProjectSlug::test("demo"),
        dir.path(),
        "# Auth\nUsers log in.\n",
        0.85,
        None,
    )
    .await
    .unwrap();

    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].name, "Add button");
}

#[tokio::test]
async fn generate_initial_spec_rejects_empty_document() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path());
    let clock = FakeClock::new();
    let agents = agents(&config, clock, ScriptedRun::success(["[]"]));

    let err = generate_initial_spec(&agents, &ProjectSlug::test("demo"), dir.path(), "   \n  ", 0.85, None)
        .await
        .unwrap_err();
    assert!(matches!(err, SpecPipelineError::EmptyDocument));
}

#[tokio::test]
async fn analyze_persists_analysis_with_coverage_and_matches() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path());
    let clock = FakeClock::new();
    let store = Store::new(&config, clock.clone());
    let slug = ProjectSlug::test("demo");
    store.create_project(slug.clone(), dir.path().join("ws"), SpecMethod::Natural).unwrap();

    let existing = store
        .create_feature(
            &slug,
            NewFeature {
                category: "core".into(),
                name: "Add button".into(),
                description: String::new(),
                steps: vec![],
                source_spec: Some(SourceSpec::Generated),
            },
        )
        .unwrap();

    let candidate_json = r#"[{"category":"core","name":"Add button","description":"d","steps":["s1"]}]"#;
    let merge_json = r#"{"merged_spec":"# Auth\nUpdated.","diff":[{"section":"Auth","change_type":"cosmetic"}]}"#;
    let adapter = FakeAgentAdapter::new();
    adapter.push_script(ScriptedRun::success([candidate_json]));
    adapter.push_script(ScriptedRun::success([merge_json]));
    let agents = AgentSession::new(adapter, clock, config.clone());

    let analysis = analyze(
        &agents,
        &store,
        &slug,
        dir.path(),
        &[existing.clone()],
        "# Auth\nUsers log in with email.\n",
        1_000,
        0.85,
        DEFAULT_MATCH_TOP_K,
    )
    .await
    .unwrap();

    assert_eq!(analysis.coverage.len(), 1);
    assert!(analysis.coverage[0].coverage_complete);
    assert_eq!(analysis.proposed_app_spec, "# Auth\nUpdated.");
    assert_eq!(analysis.diff[0].change_type, ChangeType::Cosmetic);
    assert_eq!(analysis.feature_candidates.len(), 1);

    let key = FeatureKey::new("core", "Add button");
    let matches = analysis.match_candidates.get(&key).unwrap();
    assert_eq!(matches[0].feature_id, existing.id);

    let reloaded = store.load_spec_analysis(&analysis.id).unwrap();
    assert_eq!(reloaded.id, analysis.id);
}

#[tokio::test]
async fn apply_creates_and_updates_through_event_bus() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path());
    let clock = FakeClock::new();
    let store = std::sync::Arc::new(Store::new(&config, clock.clone()));
    let bus = EventBus::new(store.clone());
    let slug = ProjectSlug::test("demo");
    store.create_project(slug.clone(), dir.path().join("ws"), SpecMethod::Natural).unwrap();

    let done_feature = store
        .create_feature(
            &slug,
            NewFeature {
                category: "core".into(),
                name: "Old feature".into(),
                description: "old".into(),
                steps: vec![],
                source_spec: Some(SourceSpec::Generated),
            },
        )
        .unwrap();
    store.transition_feature(&slug, done_feature.id, FeatureState::Done, true).unwrap();

    let mut analysis = SpecUpdateAnalysis::new(SpecUpdateAnalysisId::new(), slug.clone(), 1_000, "doc");
    analysis.proposed_app_spec = "# New spec".into();
    analysis.feature_candidates = vec![
        FeatureCandidate {
            category: "core".into(),
            name: "New feature".into(),
            description: "new".into(),
            steps: vec!["step".into()],
            source_spec: SourceSpec::SpecUpdate,
        },
        FeatureCandidate {
            category: "core".into(),
            name: "Old feature".into(),
            description: "rewritten".into(),
            steps: vec!["step2".into()],
            source_spec: SourceSpec::SpecUpdate,
        },
    ];
    store.save_spec_analysis(&slug, analysis.clone()).unwrap();

    let mapping = vec![
        CandidateMapping { candidate_index: 0, action: MappingAction::CreateNew, change_type: ChangeType::Logic },
        CandidateMapping {
            candidate_index: 1,
            action: MappingAction::UpdateExisting(done_feature.id),
            change_type: ChangeType::Logic,
        },
    ];

    apply(&store, &bus, analysis.id, &mapping).unwrap();

    let project = store.get_project(&slug).unwrap();
    assert_eq!(project.app_spec, "# New spec");

    let groups = store.list_features(&slug, None).unwrap();
    assert_eq!(groups.pending.len(), 2);
    let reopened = groups.pending.iter().find(|f| f.id == done_feature.id).unwrap();
    assert!(!reopened.passes);
    assert!(reopened.needs_review);
    assert_eq!(reopened.description, "rewritten");
}

#[tokio::test]
async fn applying_the_same_analysis_twice_does_not_duplicate_features() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path());
    let clock = FakeClock::new();
    let store = std::sync::Arc::new(Store::new(&config, clock.clone()));
    let bus = EventBus::new(store.clone());
    let slug = ProjectSlug::test("demo");
    store.create_project(slug.clone(), dir.path().join("ws"), SpecMethod::Natural).unwrap();

    let mut analysis = SpecUpdateAnalysis::new(SpecUpdateAnalysisId::new(), slug.clone(), 1_000, "doc");
    analysis.proposed_app_spec = "# New spec".into();
    analysis.feature_candidates = vec![FeatureCandidate {
        category: "core".into(),
        name: "New feature".into(),
        description: "new".into(),
        steps: vec!["step".into()],
        source_spec: SourceSpec::SpecUpdate,
    }];
    store.save_spec_analysis(&slug, analysis.clone()).unwrap();

    let mapping =
        vec![CandidateMapping { candidate_index: 0, action: MappingAction::CreateNew, change_type: ChangeType::Logic }];

    apply(&store, &bus, analysis.id, &mapping).unwrap();
    apply(&store, &bus, analysis.id, &mapping).unwrap();

    let project = store.get_project(&slug).unwrap();
    assert_eq!(project.app_spec, "# New spec");

    let groups = store.list_features(&slug, None).unwrap();
    assert_eq!(groups.pending.len(), 1, "re-applying the same analysis must not create a second feature");
}

#[tokio::test]
async fn apply_rejects_out_of_range_candidate_index() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path());
    let clock = FakeClock::new();
    let store = std::sync::Arc::new(Store::new(&config, clock.clone()));
    let bus = EventBus::new(store.clone());
    let slug = ProjectSlug::test("demo");
    store.create_project(slug.clone(), dir.path().join("ws"), SpecMethod::Natural).unwrap();

    let analysis = SpecUpdateAnalysis::new(SpecUpdateAnalysisId::new(), slug.clone(), 1_000, "doc");
    store.save_spec_analysis(&slug, analysis.clone()).unwrap();

    let mapping =
        vec![CandidateMapping { candidate_index: 0, action: MappingAction::CreateNew, change_type: ChangeType::Cosmetic }];
    let err = apply(&store, &bus, analysis.id, &mapping).unwrap_err();
    assert!(matches!(err, SpecPipelineError::CandidateIndexOutOfRange(0)));
}

#[tokio::test]
async fn apply_rejects_unknown_analysis_id() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path());
    let clock = FakeClock::new();
    let store = std::sync::Arc::new(Store::new(&config, clock));
    let bus = EventBus::new(store.clone());

    let missing = SpecUpdateAnalysisId::new();
    let err = apply(&store, &bus, missing, &[]).unwrap_err();
    assert!(matches!(err, SpecPipelineError::AnalysisNotFound(id) if id == missing));
}
