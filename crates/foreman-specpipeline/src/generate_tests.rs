// SPDX-License-Identifier: MIT

use super::*;
use foreman_agent::fake::{FakeAgentAdapter, ScriptedRun};
use foreman_core::{AgentBinaryConfig, Config, FakeClock};
use std::collections::HashMap;

fn agents(dir: &std::path::Path, script: ScriptedRun) -> AgentSession<FakeAgentAdapter, FakeClock> {
    let mut config = Config::new(dir.join("foreman.db"), dir.join("projects"));
    config.agent_binaries.insert(
        AgentRole::SpecAnalysis,
        AgentBinaryConfig { binary: "fake-agent".into(), args_template: Vec::new(), env_template: HashMap::new() },
    );
    let adapter = FakeAgentAdapter::new();
    adapter.push_script(script);
    AgentSession::new(adapter, FakeClock::new(), config)
}

#[tokio::test]
async fn parses_json_array_from_stdout() {
    let dir = tempfile::tempdir().unwrap();
    let json = r#"[{"category":"core","name":"Add button","description":"desc","steps":["s1","s2"]}]"#;
    let agents = agents(dir.path(), ScriptedRun::success([json]));
    let chunk = RequirementChunk { section: "Auth".into(), text: "Users log in".into() };

    let candidates = run_analysis_session(
        &agents,
        &ProjectSlug::test("demo"),
        dir.path(),
        compose_analysis_prompt(&chunk),
        SourceSpec::Generated,
    )
    .await
    .unwrap();

    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].name, "Add button");
    assert_eq!(candidates[0].steps, vec!["s1", "s2"]);
    assert_eq!(candidates[0].source_spec, SourceSpec::Generated);
}

#[tokio::test]
async fn empty_array_yields_no_candidates() {
    let dir = tempfile::tempdir().unwrap();
    let agents = agents(dir.path(), ScriptedRun::success(["[]"]));
    let candidates = run_analysis_session(
        &agents,
        &ProjectSlug::test("demo"),
        dir.path(),
        "prompt".into(),
        SourceSpec::Generated,
    )
    .await
    .unwrap();
    assert!(candidates.is_empty());
}

#[tokio::test]
async fn failed_session_surfaces_as_analysis_failed() {
    let dir = tempfile::tempdir().unwrap();
    let agents = agents(dir.path(), ScriptedRun::failure(["oops"], 1));
    let err = run_analysis_session(&agents, &ProjectSlug::test("demo"), dir.path(), "prompt".into(), SourceSpec::Generated)
        .await
        .unwrap_err();
    assert!(matches!(err, SpecPipelineError::AnalysisFailed));
}

#[tokio::test]
async fn malformed_stdout_surfaces_as_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let agents = agents(dir.path(), ScriptedRun::success(["not json"]));
    let err = run_analysis_session(&agents, &ProjectSlug::test("demo"), dir.path(), "prompt".into(), SourceSpec::Generated)
        .await
        .unwrap_err();
    assert!(matches!(err, SpecPipelineError::MalformedOutput(_)));
}
