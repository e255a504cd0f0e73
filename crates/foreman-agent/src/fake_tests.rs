// SPDX-License-Identifier: MIT

use super::*;
use crate::types::StartOptions;
use foreman_core::{AgentBinaryConfig, AgentRole, ProjectSlug};

fn request() -> SpawnRequest {
    SpawnRequest {
        project: ProjectSlug::test("demo"),
        role: AgentRole::Coding,
        prompt: "do the thing".to_string(),
        workspace_path: "/tmp/demo".into(),
        binary: AgentBinaryConfig { binary: "fake".into(), args_template: vec![], env_template: Default::default() },
        options: StartOptions::default(),
    }
}

#[tokio::test]
async fn replays_scripted_lines_then_exit_code() {
    let adapter = FakeAgentAdapter::new();
    adapter.push_script(ScriptedRun::success(["one", "two"]));

    let mut process = adapter.spawn(request()).await.unwrap();
    assert_eq!(process.next_line().await, Some((OutputStream::Stdout, "one".to_string())));
    assert_eq!(process.next_line().await, Some((OutputStream::Stdout, "two".to_string())));
    assert_eq!(process.next_line().await, None);
    assert_eq!(process.wait().await.unwrap(), Some(0));
}

#[tokio::test]
async fn empty_script_queue_fails_spawn() {
    let adapter = FakeAgentAdapter::new();
    let err = adapter.spawn(request()).await.unwrap_err();
    assert!(matches!(err, AgentSessionError::SpawnFailed(_)));
}

#[tokio::test]
async fn hanging_script_only_resolves_after_kill() {
    let adapter = FakeAgentAdapter::new();
    adapter.push_script(ScriptedRun::hanging());
    let mut process = adapter.spawn(request()).await.unwrap();

    process.kill().await;
    assert_eq!(process.next_line().await, None);
    assert_eq!(process.wait().await.unwrap(), None);
}
