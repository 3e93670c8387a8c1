#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const MOOD: &str = r#"
id: mood-check
title: Daily Mood Check
initial_answers:
  selectedItems: []
steps:
  - id: rate
    title: Rate your mood
    fields:
      - path: rating
        kind: scale
        constraints: { min: 1, max: 10 }
  - id: pick
    title: What helped today?
    fields:
      - path: selectedItems
        kind: multi_select
        constraints:
          options: [sleep, water, walk]
"#;

const JOURNAL: &str = r#"
id: journal
title: Journal
steps:
  - id: intro
    title: Intro
  - id: write
    title: Write
    complete_when: { type: non_empty, path: entry }
"#;

fn stepform(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("stepform").unwrap();
    cmd.current_dir(dir.path())
        .env("STEPFORM_DIR", dir.path().join("wizards"))
        .env_remove("RUST_LOG");
    cmd
}

fn write_wizard(dir: &TempDir, name: &str, body: &str) {
    let wizards = dir.path().join("wizards");
    std::fs::create_dir_all(&wizards).unwrap();
    std::fs::write(wizards.join(name), body).unwrap();
}

fn write_script(dir: &TempDir, body: &str) -> std::path::PathBuf {
    let path = dir.path().join("script.yaml");
    std::fs::write(&path, body).unwrap();
    path
}

// ---------------------------------------------------------------------------
// stepform list
// ---------------------------------------------------------------------------

#[test]
fn list_empty_dir() {
    let dir = TempDir::new().unwrap();
    stepform(&dir)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No wizards"));
}

#[test]
fn list_shows_wizards_in_id_order() {
    let dir = TempDir::new().unwrap();
    write_wizard(&dir, "mood.yaml", MOOD);
    write_wizard(&dir, "journal.yml", JOURNAL);

    let out = stepform(&dir).arg("list").assert().success();
    let stdout = String::from_utf8(out.get_output().stdout.clone()).unwrap();
    let journal = stdout.find("journal").unwrap();
    let mood = stdout.find("mood-check").unwrap();
    assert!(journal < mood);
    assert!(stdout.contains("Daily Mood Check"));
}

#[test]
fn list_json() {
    let dir = TempDir::new().unwrap();
    write_wizard(&dir, "mood.yaml", MOOD);

    let out = stepform(&dir).args(["list", "--json"]).assert().success();
    let rows: serde_json::Value = serde_json::from_slice(&out.get_output().stdout).unwrap();
    assert_eq!(rows[0]["id"], "mood-check");
    assert_eq!(rows[0]["steps"], 2);
}

#[test]
fn dir_found_by_walking_up() {
    let dir = TempDir::new().unwrap();
    let wizards = dir.path().join(".stepform/wizards");
    std::fs::create_dir_all(&wizards).unwrap();
    std::fs::write(wizards.join("mood.yaml"), MOOD).unwrap();
    let nested = dir.path().join("app/src");
    std::fs::create_dir_all(&nested).unwrap();

    Command::cargo_bin("stepform")
        .unwrap()
        .current_dir(&nested)
        .env_remove("STEPFORM_DIR")
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("mood-check"));
}

#[test]
fn duplicate_ids_fail_loading() {
    let dir = TempDir::new().unwrap();
    write_wizard(&dir, "a.yaml", MOOD);
    write_wizard(&dir, "b.yaml", MOOD);
    stepform(&dir)
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("mood-check"));
}

// ---------------------------------------------------------------------------
// stepform show
// ---------------------------------------------------------------------------

#[test]
fn show_lists_fields() {
    let dir = TempDir::new().unwrap();
    write_wizard(&dir, "mood.yaml", MOOD);
    stepform(&dir)
        .args(["show", "mood-check"])
        .assert()
        .success()
        .stdout(predicate::str::contains("selectedItems"))
        .stdout(predicate::str::contains("multi_select"));
}

#[test]
fn show_unknown_wizard_fails() {
    let dir = TempDir::new().unwrap();
    write_wizard(&dir, "mood.yaml", MOOD);
    stepform(&dir)
        .args(["show", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ghost"));
}

// ---------------------------------------------------------------------------
// stepform validate
// ---------------------------------------------------------------------------

#[test]
fn validate_reports_warnings_but_succeeds() {
    let dir = TempDir::new().unwrap();
    write_wizard(&dir, "mood.yaml", MOOD);
    write_wizard(&dir, "journal.yaml", JOURNAL);
    stepform(&dir)
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("mood-check: ok"))
        .stdout(predicate::str::contains("journal: warning"));
}

#[test]
fn validate_fails_on_errors() {
    let dir = TempDir::new().unwrap();
    write_wizard(
        &dir,
        "bad.yaml",
        "id: bad\ntitle: Bad\nsteps:\n  - id: a\n    title: A\n  - id: a\n    title: Again\n",
    );
    stepform(&dir)
        .args(["validate", "bad"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("bad: error"))
        .stderr(predicate::str::contains("definition error"));
}

// ---------------------------------------------------------------------------
// stepform run
// ---------------------------------------------------------------------------

#[test]
fn run_completes_and_prints_payload() {
    let dir = TempDir::new().unwrap();
    write_wizard(&dir, "mood.yaml", MOOD);
    let script = write_script(
        &dir,
        r#"
- action: next
- action: set
  path: rating
  value: 7
- action: next
- action: toggle
  path: selectedItems
  item: water
- action: complete
"#,
    );

    let out = stepform(&dir)
        .args(["run", "mood-check", "--json", "--script"])
        .arg(&script)
        .assert()
        .success();
    let report: serde_json::Value = serde_json::from_slice(&out.get_output().stdout).unwrap();
    assert_eq!(report["status"], "completed");
    assert_eq!(report["step"], "pick");
    assert_eq!(report["outcomes"][0]["accepted"], false);
    assert_eq!(report["outcomes"][4]["accepted"], true);
    assert_eq!(report["payload"]["id"], "mood-check");
    assert_eq!(
        report["payload"]["data"],
        serde_json::json!({"rating": 7, "selectedItems": ["water"]})
    );
}

#[test]
fn run_close_without_completing() {
    let dir = TempDir::new().unwrap();
    write_wizard(&dir, "mood.yaml", MOOD);
    let script = write_script(&dir, "- action: close\n- action: next\n");

    stepform(&dir)
        .args(["run", "mood-check", "--script"])
        .arg(&script)
        .assert()
        .success()
        .stdout(predicate::str::contains("cancelled"))
        .stdout(predicate::str::contains("Closed without completing"));
}

#[test]
fn run_aborts_on_bad_path() {
    let dir = TempDir::new().unwrap();
    write_wizard(&dir, "mood.yaml", MOOD);
    let script = write_script(&dir, "- action: set\n  path: \"a..b\"\n  value: 1\n");

    stepform(&dir)
        .args(["run", "mood-check", "--script"])
        .arg(&script)
        .assert()
        .failure()
        .stderr(predicate::str::contains("script aborted"));
}
