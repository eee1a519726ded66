//! Argument parsing, configuration merging and output rendering.

use mhc2c_cli::{
    build_cli, execute, load_config, render_json, render_text, resolve_parameters, JsonLinesSink,
    RunArgs, ScorerKind,
};
use mhc2c_core::{
    FailurePolicy, PeerVisibility, StopHandle, Termination, TraceEvent, TraceSink,
};
use mhc2c_test_utils::{StubProposer, StubScorer};
use pretty_assertions::assert_eq;
use std::io::Write;

fn parse(argv: &[&str]) -> RunArgs {
    let matches = build_cli()
        .try_get_matches_from(argv)
        .expect("arguments should parse");
    let (name, sub) = matches.subcommand().expect("subcommand");
    assert_eq!(name, "run");
    RunArgs::from_matches(sub).expect("run args")
}

fn config_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn defaults_without_flags() {
    let args = parse(&["mh-c2c", "run", "--task", "2+2?"]);
    assert_eq!(args.task, "2+2?");
    assert_eq!(args.scorer, ScorerKind::Brevity);

    let params = resolve_parameters(&args).unwrap();
    assert_eq!(params.num_chains, 3);
    assert_eq!(params.max_rounds, 3);
    assert_eq!(params.beta, 1.0);
    assert_eq!(params.epsilon, 1e-3);
    assert_eq!(params.roles, vec!["Agent 1", "Agent 2", "Agent 3"]);
    assert_eq!(params.peer_visibility, PeerVisibility::Snapshot);
}

#[test]
fn flags_override_config_file() {
    let file = config_file(
        r#"
num_chains = 4
max_rounds = 7
beta = 2.0
seed = 11
failure_policy = "isolate_chain"
"#,
    );
    let path = file.path().to_str().unwrap();
    let args = parse(&[
        "mh-c2c", "run", "--task", "t", "--config", path, "--beta", "0.5", "--sequential",
    ]);

    let params = resolve_parameters(&args).unwrap();
    assert_eq!(params.num_chains, 4);
    assert_eq!(params.max_rounds, 7);
    assert_eq!(params.beta, 0.5);
    assert_eq!(params.seed, 11);
    assert_eq!(params.failure_policy, FailurePolicy::IsolateChain);
    assert_eq!(params.peer_visibility, PeerVisibility::Sequential);
}

#[test]
fn legacy_round_flag_is_accepted() {
    let args = parse(&["mh-c2c", "run", "--task", "t", "--T", "5", "--m", "2"]);
    assert_eq!(args.max_rounds, Some(5));
    assert_eq!(args.num_chains, Some(2));
}

#[test]
fn domain_supplies_roles() {
    let args = parse(&[
        "mh-c2c", "run", "--task", "t", "--m", "2", "--domain", "programming", "--isolate",
    ]);
    let params = resolve_parameters(&args).unwrap();
    assert_eq!(params.roles.len(), 2);
    assert!(params.roles[0].starts_with("Code Architect"));
    assert_eq!(params.failure_policy, FailurePolicy::IsolateChain);
}

#[test]
fn invalid_values_are_reported() {
    for argv in [
        ["mh-c2c", "run", "--task", "t", "--m", "0"],
        ["mh-c2c", "run", "--task", "t", "--rounds", "-1"],
        ["mh-c2c", "run", "--task", "t", "--beta", "0"],
    ] {
        let args = parse(&argv);
        assert!(resolve_parameters(&args).is_err(), "{argv:?}");
    }
}

#[test]
fn unknown_scorer_is_rejected_by_parser() {
    let result = build_cli().try_get_matches_from(["mh-c2c", "run", "--task", "t", "--scorer", "vibes"]);
    assert!(result.is_err());
}

#[test]
fn broken_config_names_the_file() {
    let file = config_file("num_chains = \"many\"");
    let err = load_config(file.path()).unwrap_err();
    assert!(err.to_string().contains("invalid config"));
}

#[test]
fn json_lines_sink_writes_one_event_per_line() {
    let sink = JsonLinesSink::new(Vec::new());
    sink.record(&TraceEvent::Initialized {
        chain: 0,
        role: "Agent 1".to_string(),
        score: -3.0,
    });
    sink.record(&TraceEvent::StepFailed {
        round: 1,
        chain: 0,
        error: "boom".to_string(),
    });

    let written = String::from_utf8(sink.into_inner()).unwrap();
    let lines: Vec<&str> = written.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains(r#""event":"initialized""#));
    assert!(lines[1].contains(r#""event":"step_failed""#));
}

#[tokio::test]
async fn execute_and_render() {
    let args = parse(&["mh-c2c", "run", "--task", "t", "--m", "2", "--rounds", "2"]);
    let params = resolve_parameters(&args).unwrap();
    let proposer = StubProposer::trim_one_char(&[("Agent 1", "hello"), ("Agent 2", "hey")]);

    let result = execute(
        params,
        proposer,
        StubScorer::negative_length(),
        false,
        StopHandle::new(),
    )
    .await
    .unwrap();

    assert_eq!(result.best_text, "h");
    assert_eq!(result.termination, Termination::Exhausted);

    let text = render_text(&result);
    assert!(text.starts_with("Best answer (chain 1, Agent 2):\nh\n"));
    assert!(text.contains("rounds: 2 (round budget exhausted)"));

    let json: serde_json::Value = serde_json::from_str(&render_json(&result).unwrap()).unwrap();
    assert_eq!(json["best_index"], 1);
    assert_eq!(json["termination"], "exhausted");
}
