//! CLI end-to-end tests
//!
//! Tests for the discnav command-line interface.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

/// Get a command for the discnav binary
#[allow(deprecated)]
fn discnav_cmd() -> Command {
    Command::cargo_bin("discnav").unwrap()
}

const REPLAY_SCRIPT: &str = r#"{
    "package": {
        "disc": { "first_play_supported": true, "title_count": 1 },
        "first_play": { "playlist": 1, "duration_ms": 0 },
        "titles": [
            { "playlist": 10, "duration_ms": 5400000,
              "chapters": [ { "start_ms": 0, "duration_ms": 1800000 },
                            { "start_ms": 1800000, "duration_ms": 3600000 } ] }
        ],
        "steps": [
            { "step": "event", "event": { "kind": "still_frame_indefinite" } },
            { "step": "event", "event": { "raw": { "code": 5, "param": 1 } } },
            { "step": "data", "len": 6144 }
        ]
    },
    "mode": "menu",
    "actions": [
        { "action": "read" },
        { "action": "skip_hold" },
        { "action": "read", "count": 3 },
        { "action": "save" }
    ]
}"#;

#[test]
fn test_cli_no_args_shows_help() {
    let mut cmd = discnav_cmd();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_version_command() {
    let mut cmd = discnav_cmd();
    cmd.arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("discnav"));
}

#[test]
fn test_cli_inspect_directory_tree() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("BDMV/PLAYLIST")).unwrap();
    fs::write(dir.path().join("BDMV/PLAYLIST/00800.mpls"), b"MPLS").unwrap();

    let mut cmd = discnav_cmd();
    cmd.arg("inspect")
        .arg(dir.path().join("BDMV/PLAYLIST/00800.mpls"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Origin: directory"))
        .stdout(predicate::str::contains("Playlist: 00800.mpls"));
}

#[test]
fn test_cli_inspect_json_image() {
    let dir = tempdir().unwrap();
    let iso = dir.path().join("movie.iso");
    fs::write(&iso, b"").unwrap();

    let mut cmd = discnav_cmd();
    cmd.arg("inspect")
        .arg(&iso)
        .arg("--json")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"origin\": \"image\""));
}

#[test]
fn test_cli_inspect_rejects_plain_file() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("notes.txt");
    fs::write(&file, b"hello").unwrap();

    let mut cmd = discnav_cmd();
    cmd.arg("inspect")
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a disc package"));
}

#[test]
fn test_cli_resume_round_trip() {
    let mut cmd = discnav_cmd();
    cmd.args(["resume", "encode", "--playlist", "800"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"{"playlist_id":800,"version":1}"#));

    let mut cmd = discnav_cmd();
    cmd.args(["resume", "decode", r#"{"version":1,"playlist_id":800}"#])
        .assert()
        .success()
        .stdout(predicate::str::contains("playlist 00800"));

    let mut cmd = discnav_cmd();
    cmd.args(["resume", "decode", "not json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid resume record"));
}

#[test]
fn test_cli_replay_script() {
    let dir = tempdir().unwrap();
    let script = dir.path().join("menu.json");
    fs::write(&script, REPLAY_SCRIPT).unwrap();

    let mut cmd = discnav_cmd();
    cmd.arg("replay")
        .arg(&script)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""type":"opened""#))
        .stdout(predicate::str::contains(r#""message":"still_indefinite""#))
        .stdout(predicate::str::contains(r#""hold":"still""#))
        .stdout(predicate::str::contains(r#""result":6144"#))
        .stdout(predicate::str::contains(r#"\"playlist_id\":10"#));
}

#[test]
fn test_cli_replay_protected_disc_fails() {
    let dir = tempdir().unwrap();
    let script = dir.path().join("protected.json");
    fs::write(
        &script,
        r#"{ "package": { "disc": { "first_play_supported": true,
              "protection": { "bdplus": { "detected": true, "handled": false } } } } }"#,
    )
    .unwrap();

    let mut cmd = discnav_cmd();
    cmd.arg("replay")
        .arg(&script)
        .assert()
        .failure()
        .stdout(predicate::str::contains("content_protection_failure"))
        .stderr(predicate::str::contains("protected disc (BD+)"));
}

#[test]
fn test_cli_validate_config() {
    let dir = tempdir().unwrap();
    let good = dir.path().join("good.toml");
    fs::write(&good, "[player]\nregion_code = \"B\"\n").unwrap();
    let bad = dir.path().join("bad.toml");
    fs::write(&bad, "[engine]\nread_retry_limit = 0\n").unwrap();

    let mut cmd = discnav_cmd();
    cmd.arg("validate")
        .arg(&good)
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"))
        .stdout(predicate::str::contains("Region: B"));

    let mut cmd = discnav_cmd();
    cmd.arg("validate")
        .arg(&bad)
        .assert()
        .failure()
        .stderr(predicate::str::contains("read_retry_limit"));
}
