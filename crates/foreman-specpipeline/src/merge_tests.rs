// SPDX-License-Identifier: MIT

use super::*;
use foreman_agent::fake::{FakeAgentAdapter, ScriptedRun};
use foreman_agent::AgentSession;
use foreman_core::{AgentBinaryConfig, Config, FakeClock, ProjectSlug};
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
async fn parses_merged_spec_and_diff() {
    let dir = tempfile::tempdir().unwrap();
    let json = r#"{"merged_spec":"# Auth\nUsers log in with a magic link.","diff":[{"section":"Auth","change_type":"logic"}]}"#;
    let agents = agents(dir.path(), ScriptedRun::success([json]));

    let (merged, diff) =
        run_merge_session(&agents, &ProjectSlug::test("demo"), dir.path(), "# Auth\nUsers log in.", "Add magic links")
            .await
            .unwrap();

    assert_eq!(merged, "# Auth\nUsers log in with a magic link.");
    assert_eq!(diff.len(), 1);
    assert_eq!(diff[0].section, "Auth");
    assert_eq!(diff[0].change_type, ChangeType::Logic);
}

#[tokio::test]
async fn failed_session_surfaces_as_analysis_failed() {
    let dir = tempfile::tempdir().unwrap();
    let agents = agents(dir.path(), ScriptedRun::failure(["oops"], 1));
    let err = run_merge_session(&agents, &ProjectSlug::test("demo"), dir.path(), "old", "new").await.unwrap_err();
    assert!(matches!(err, SpecPipelineError::AnalysisFailed));
}

#[tokio::test]
async fn malformed_stdout_surfaces_as_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let agents = agents(dir.path(), ScriptedRun::success(["not json"]));
    let err = run_merge_session(&agents, &ProjectSlug::test("demo"), dir.path(), "old", "new").await.unwrap_err();
    assert!(matches!(err, SpecPipelineError::MalformedOutput(_)));
}
