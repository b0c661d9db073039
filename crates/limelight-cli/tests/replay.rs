//! Integration tests for the headless replay command.
//!
//! Replay drives both engines on a virtual clock, so these assert real
//! lifecycle behavior (translation attachment, display clear, the winner
//! override) without any timing flakiness.


use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

#[test]
fn test_replay_prints_final_state() {
    let home = fixtures::temp_limelight_home();
    let events_path = home.path().join("session.jsonl");
    fixtures::write_events(
        &events_path,
        &[
            fixtures::transcript_expecting("t-1", "hola a todos", 1),
            fixtures::translation("t-1", "hello everyone", "en"),
            fixtures::participants(&[("alice", 2), ("bob", 1)]),
            fixtures::started(),
            fixtures::stopped(),
            fixtures::winner("bob"),
        ],
    );

    cargo_bin_cmd!("limelight")
        .env("LIMELIGHT_HOME", home.path())
        .args([
            "replay",
            "--events",
            events_path.to_str().unwrap(),
            "--step-ms",
            "100",
            "--pretty",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""winner": "bob""#))
        .stdout(predicate::str::contains("hola a todos"))
        .stdout(predicate::str::contains("hello everyone"))
        .stderr(predicate::str::contains("Replayed 6 events"));
}

#[test]
fn test_replay_settle_clears_captions() {
    let home = fixtures::temp_limelight_home();
    let events_path = home.path().join("session.jsonl");
    // One caption, one garbage line. 40s of settle crosses the 30s display
    // clear, so the board must come back empty; the untouched wheel stays
    // idle.
    fixtures::write_events(
        &events_path,
        &[
            fixtures::transcript("t-1", "this will be cleared"),
            "not an event".to_string(),
        ],
    );

    cargo_bin_cmd!("limelight")
        .env("LIMELIGHT_HOME", home.path())
        .args([
            "replay",
            "--events",
            events_path.to_str().unwrap(),
            "--step-ms",
            "100",
            "--settle-ms",
            "40000",
            "--pretty",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""lines": []"#))
        .stdout(predicate::str::contains(r#""phase": "idle""#))
        .stderr(predicate::str::contains("1 dropped"));
}

#[test]
fn test_replay_interim_survives_short_run() {
    let home = fixtures::temp_limelight_home();
    let events_path = home.path().join("session.jsonl");
    fixtures::write_events(
        &events_path,
        &[
            fixtures::transcript("t-1", "committed line"),
            fixtures::interim("t-2", "still speaking"),
        ],
    );

    // 100ms per step keeps us well inside the interim quiet period.
    cargo_bin_cmd!("limelight")
        .env("LIMELIGHT_HOME", home.path())
        .args([
            "replay",
            "--events",
            events_path.to_str().unwrap(),
            "--step-ms",
            "100",
            "--pretty",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("committed line"))
        .stdout(predicate::str::contains(r#""interim": "still speaking""#));
}

#[test]
fn test_replay_missing_file_fails() {
    let home = fixtures::temp_limelight_home();

    cargo_bin_cmd!("limelight")
        .env("LIMELIGHT_HOME", home.path())
        .args(["replay", "--events", "no-such-file.jsonl"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("read events"));
}
