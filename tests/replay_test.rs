//! End-to-end: recorded lifecycle events through the engine to a sink.

mod common;

use std::io::Cursor;
use std::sync::Arc;

use buildevents::error::Error;
use buildevents::replay::{LifecycleEvent, Replayer, parse_events};
use common::*;

const LOG: &str = r#"
{"event":"started","run":{"id":"app#1"}}
{"event":"checkout","run":{"id":"app#1"},"scm_env":{"GIT_COMMIT":"abc"}}
{"event":"started","run":{"id":"lib#9"}}
{"event":"task_started","run":"app#1","executor":{"name":"linux-1","kind":"agent","env":{"OS":"linux"}}}
{"event":"task_started","run":"lib#9","executor":{"name":"built-in","kind":"controller","env":{}}}
{"event":"task_started","executor":{"name":"linux-2","kind":"agent","env":{"OS":"linux"}}}
{"event":"task_started","run":"app#1","executor":{"name":"mac-1","kind":"agent","env":{"OS":"macos"}}}
{"event":"checkout","run":{"id":"lib#9"}}
{"event":"completed","run":{"id":"lib#9","number":9,"queue_id":77,"root_url":"https://ci.example.com/","url":"job/lib/9/","result":"FAILURE","started_at":"2024-01-01T00:00:00Z","duration_millis":1000,"env":{"JOB_NAME":"lib"}}}
{"event":"completed","run":{"id":"app#1","number":1,"queue_id":76,"root_url":"https://ci.example.com/","url":"job/app/1/","result":"SUCCESS","started_at":"2024-01-01T00:00:00Z","duration_millis":2000,"env":{"JOB_NAME":"app"},"parameters":{"TARGET":"prod"},"nodes":[{"kind":"stage","display_name":"Build","result":"SUCCESS"},{"kind":"step","display_name":"sh","result":"SUCCESS"},{"kind":"stage","display_name":"Test","result":"UNSTABLE"}]}}
"#;

fn events() -> Vec<LifecycleEvent> {
    parse_events(Cursor::new(LOG)).unwrap()
}

#[test]
fn parse_skips_blank_lines() {
    assert_eq!(events().len(), 10);
}

#[test]
fn parse_reports_the_offending_line() {
    let log = "{\"event\":\"started\",\"run\":{\"id\":\"a#1\"}}\n\n{\"event\":\"exploded\"}\n";
    match parse_events(Cursor::new(log)) {
        Err(Error::Replay { line, .. }) => assert_eq!(line, 3),
        other => panic!("expected Replay error, got {other:?}"),
    }
}

#[test]
fn sequential_replay_builds_one_summary_per_run() {
    let sink = RecordingSink::ok();
    let replayer = Replayer::new(sink.clone(), endpoint());

    let report = replayer.apply_all(events());
    assert_eq!(report.completed, 2);
    assert!(report.failures.is_empty());
    assert!(replayer.engine().observations().is_empty());

    let payloads = sink.payloads();
    assert_eq!(payloads.len(), 2);

    let lib = &payloads[0];
    assert_eq!(lib["url"], "https://ci.example.com/job/lib/9/");
    assert_eq!(lib["status"], "FAILURE");
    assert!(lib["agents"].is_null());
    assert!(lib["checkouts"].is_null());
    assert_eq!(lib["timestamp"], 1_704_067_200_000i64);

    let app = &payloads[1];
    assert_eq!(app["agents"][0]["name"], "linux-1");
    assert_eq!(app["agents"][1]["name"], "mac-1");
    assert_eq!(app["checkouts"][0]["scmEnvVars"]["GIT_COMMIT"], "abc");
    assert_eq!(app["buildParameters"]["TARGET"], "prod");
    assert_eq!(
        app["stages"],
        serde_json::json!([
            {"name": "Build", "status": "SUCCESS"},
            {"name": "Test", "status": "UNSTABLE"}
        ])
    );
}

#[test]
fn failed_hooks_are_reported_and_do_not_leak() {
    let log = r#"
{"event":"task_started","run":"app#2","executor":{"name":"flaky","kind":"agent"}}
{"event":"checkout","run":{"id":"app#2"},"scm_env":{"GIT_COMMIT":"abc"}}
{"event":"completed","run":{"id":"app#2","nodes":[{"kind":"stage","display_name":"Build","result":"SUCCESS"}]}}
"#;
    let sink = RecordingSink::ok();
    let replayer = Replayer::new(sink.clone(), endpoint());

    let report = replayer.apply_all(parse_events(Cursor::new(log)).unwrap());

    assert_eq!(report.completed, 0);
    assert_eq!(report.failures.len(), 2);
    assert!(sink.payloads().is_empty());
    assert!(replayer.engine().observations().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_replay_matches_sequential_outcome() {
    let sink = RecordingSink::ok();
    let replayer = Arc::new(Replayer::new(sink.clone(), endpoint()));

    let report = replayer.replay(events(), 4).await;

    assert_eq!(report.completed, 2);
    assert!(report.failures.is_empty());
    assert!(replayer.engine().observations().is_empty());

    let mut urls: Vec<String> = sink
        .payloads()
        .iter()
        .map(|payload| payload["url"].as_str().unwrap().to_string())
        .collect();
    urls.sort();
    assert_eq!(
        urls,
        vec![
            "https://ci.example.com/job/app/1/",
            "https://ci.example.com/job/lib/9/"
        ]
    );
}
