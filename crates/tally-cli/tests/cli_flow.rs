//! End-to-end tests driving the `tally` binary against a temporary database.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::TempDir;

const OWNER: &str = "00000000-0000-0000-0000-0000000000a1";
const WORKSPACE: &str = "00000000-0000-0000-0000-0000000000b1";
const PROJECT: &str = "00000000-0000-0000-0000-0000000000c1";
const TASK: &str = "00000000-0000-0000-0000-0000000000d1";

fn tally_binary() -> String {
    env!("CARGO_BIN_EXE_tally").to_string()
}

/// A temp home with a config file pointing at a fresh database.
struct Env {
    temp: TempDir,
    config: PathBuf,
}

impl Env {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let config = temp.path().join("tally.toml");
        let db_path = temp.path().join("data").join("tally.db");
        std::fs::write(
            &config,
            format!(
                "database_path = {:?}\nuser_id = \"{OWNER}\"\nworkspace_id = \"{WORKSPACE}\"\n",
                db_path.display().to_string()
            ),
        )
        .unwrap();
        Self { temp, config }
    }

    fn home(&self) -> &Path {
        self.temp.path()
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(tally_binary());
        cmd.env("HOME", self.home())
            .env("XDG_CONFIG_HOME", self.home().join("config"))
            .env("XDG_DATA_HOME", self.home().join("share"))
            .env_remove("RUST_LOG")
            .arg("--config")
            .arg(&self.config)
            .args(args);
        cmd
    }

    fn run(&self, args: &[&str]) -> Output {
        self.command(args).output().expect("failed to run tally")
    }

    fn ok(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert!(
            output.status.success(),
            "tally {args:?} should succeed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8(output.stdout).unwrap()
    }

    fn json(&self, args: &[&str]) -> Value {
        let mut args = args.to_vec();
        args.push("--json");
        serde_json::from_str(&self.ok(&args)).expect("valid JSON output")
    }

    fn seed_records(&self) {
        self.ok(&[
            "projects",
            "add",
            "Backend",
            "--auto-estimates",
            "--id",
            PROJECT,
        ]);
        self.ok(&[
            "tasks",
            "add",
            "Sync engine",
            "--project",
            PROJECT,
            "--id",
            TASK,
        ]);
    }
}

#[test]
fn test_created_entry_updates_task_and_project() {
    let env = Env::new();
    env.seed_records();

    let entry = env.json(&[
        "create",
        "--start",
        "2021-10-01T00:00:00Z",
        "--duration",
        "28800",
        "--project",
        PROJECT,
        "--task",
        TASK,
        "--created-with",
        "API",
    ]);
    assert_eq!(entry["stop"], "2021-10-01T08:00:00Z");
    assert_eq!(entry["duration"], 28_800);
    assert_eq!(entry["created_with"], "API");

    let task = env.json(&["tasks", "show", TASK]);
    assert_eq!(task["tracked_seconds"], 28_800);
    let project = env.json(&["projects", "show", PROJECT]);
    assert_eq!(project["estimated_hours"], 8.0);
}

#[test]
fn test_start_stop_and_delete_flow() {
    let env = Env::new();
    env.seed_records();

    let started = env.json(&["start", "--task", TASK, "--project", PROJECT]);
    let id = started["id"].as_str().unwrap().to_string();
    assert_eq!(started["duration"], -1);
    assert_eq!(started["created_with"], "tally-cli");

    let running = env.json(&["running"]);
    assert_eq!(running.as_array().unwrap().len(), 1);
    assert_eq!(running[0]["id"], id.as_str());

    let stopped = env.json(&["stop", &id]);
    assert!(stopped["duration"].as_i64().unwrap() >= 0);
    assert!(env.json(&["running"]).as_array().unwrap().is_empty());

    env.ok(&["tag", &id, "deep-work,review"]);
    let shown = env.json(&["show", &id]);
    assert_eq!(shown["tags"], serde_json::json!(["deep-work", "review"]));

    env.ok(&["delete", &id]);
    let output = env.run(&["show", &id]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("time entry not found"), "stderr: {stderr}");
}

#[test]
fn test_invalid_id_is_rejected() {
    let env = Env::new();
    let output = env.run(&["stop", "not-a-uuid"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid time entry ID"), "stderr: {stderr}");
}

#[test]
fn test_single_timer_policy_from_environment() {
    let env = Env::new();
    env.ok(&["start"]);

    let output = env
        .command(&["start"])
        .env("TALLY_ENGINE__SINGLE_RUNNING_TIMER", "true")
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("already has a running time entry"),
        "stderr: {stderr}"
    );

    env.ok(&["start"]);
    assert_eq!(env.json(&["running"]).as_array().unwrap().len(), 2);
}

#[test]
fn test_missing_owner_is_reported() {
    let env = Env::new();
    std::fs::write(&env.config, "").unwrap();
    let output = env
        .command(&["running"])
        .env("TALLY_DATABASE_PATH", env.home().join("other.db"))
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("user_id is not configured"),
        "stderr: {stderr}"
    );
}

#[test]
fn test_range_pages_do_not_overlap() {
    let env = Env::new();
    for _ in 0..3 {
        env.ok(&["start"]);
    }
    let first = env.json(&[
        "range",
        "--from",
        "1 hour ago",
        "--page",
        "1",
        "--page-size",
        "2",
    ]);
    let second = env.json(&[
        "range",
        "--from",
        "1 hour ago",
        "--page",
        "2",
        "--page-size",
        "2",
    ]);
    assert_eq!(first.as_array().unwrap().len(), 2);
    assert_eq!(second.as_array().unwrap().len(), 1);
    assert!(
        first
            .as_array()
            .unwrap()
            .iter()
            .all(|entry| entry["id"] != second[0]["id"])
    );
}
