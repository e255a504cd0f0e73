// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn new_config_has_spec_defaults() {
    let config = Config::new(PathBuf::from("/var/lib/foreman/db"), PathBuf::from("/var/lib/foreman/projects"));
    assert_eq!(config.default_coding_timeout_s, 1800);
    assert_eq!(config.default_analysis_timeout_s, 300);
    assert_eq!(config.silence_timeout_s, 300);
    assert_eq!(config.session_grace_period_s, 10);
    assert_eq!(config.event_buffer_size, 256);
    assert_eq!(config.event_retention_per_project, 10_000);
    assert_eq!(config.retry_cap, 3);
    assert!((config.dedup_similarity_threshold - 0.85).abs() < f64::EPSILON);
    assert_eq!(config.spec_analysis_ttl_s, 3600);
}

#[test]
fn toml_with_only_required_fields_fills_in_defaults() {
    let toml_src = r#"
        database_path = "/data/foreman.db"
        projects_root = "/data/projects"
    "#;
    let config = Config::from_toml_str(toml_src).unwrap();
    assert_eq!(config.retry_cap, 3);
    assert_eq!(config.database_path, PathBuf::from("/data/foreman.db"));
}

#[test]
fn toml_rejects_unknown_fields() {
    let toml_src = r#"
        database_path = "/data/foreman.db"
        projects_root = "/data/projects"
        made_up_field = 1
    "#;
    assert!(Config::from_toml_str(toml_src).is_err());
}

#[test]
fn toml_can_override_timeouts_and_agent_binaries() {
    let toml_src = r#"
        database_path = "/data/foreman.db"
        projects_root = "/data/projects"
        default_coding_timeout_s = 60

        [agent_binaries.coding]
        binary = "claude"
        args_template = ["--role", "coding"]
    "#;
    let config = Config::from_toml_str(toml_src).unwrap();
    assert_eq!(config.default_coding_timeout_s, 60);
    let coding = config.agent_binaries.get(&AgentRole::Coding).unwrap();
    assert_eq!(coding.binary, "claude");
}
