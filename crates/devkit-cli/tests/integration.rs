#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn data_dir(dir: &TempDir) -> PathBuf {
    dir.path().join("data")
}

fn devkit(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("devkit").unwrap();
    cmd.current_dir(dir.path())
        .env("DEVKIT_HOME", data_dir(dir))
        .env_remove("GEMINI_API_KEY")
        .env_remove("RUST_LOG");
    cmd
}

fn json(cmd: &mut Command) -> serde_json::Value {
    let out = cmd.output().unwrap();
    assert!(
        out.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    serde_json::from_slice(&out.stdout).unwrap()
}

fn save(dir: &TempDir, name: &str, command: &str, tags: &str) {
    devkit(dir)
        .args(["snippet", "save", name, command, "--tags", tags])
        .assert()
        .success();
}

fn store_file(dir: &TempDir) -> PathBuf {
    data_dir(dir).join("store.json")
}

fn git_available() -> bool {
    std::process::Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn git(dir: &Path, args: &[&str]) {
    let status = std::process::Command::new("git")
        .args(args)
        .current_dir(dir)
        .status()
        .unwrap();
    assert!(status.success(), "git {args:?} failed");
}

// ---------------------------------------------------------------------------
// devkit snippet save / get / list / search / delete
// ---------------------------------------------------------------------------

#[test]
fn snippet_save_and_get() {
    let dir = TempDir::new().unwrap();
    devkit(&dir)
        .args(["snippet", "save", "up", "docker compose up -d", "--tags", "Docker, dev"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved snippet: up (tags: dev, docker)"));

    let v = json(devkit(&dir).args(["--json", "snippet", "get", "up"]));
    assert_eq!(v["name"], "up");
    assert_eq!(v["command"], "docker compose up -d");
    assert_eq!(v["tags"], serde_json::json!(["dev", "docker"]));
}

#[test]
fn snippet_save_refuses_overwrite_without_force() {
    let dir = TempDir::new().unwrap();
    save(&dir, "build", "make", "ci");

    devkit(&dir)
        .args(["snippet", "save", "build", "cargo build"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    devkit(&dir)
        .args(["snippet", "save", "build", "cargo build", "--force"])
        .assert()
        .success();
    let v = json(devkit(&dir).args(["-j", "snippet", "get", "build"]));
    assert_eq!(v["command"], "cargo build");
    assert_eq!(v["tags"], serde_json::json!([]));
}

#[test]
fn snippet_save_rejects_bad_input() {
    let dir = TempDir::new().unwrap();
    devkit(&dir)
        .args(["snippet", "save", "  ", "ls"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error: invalid input"));
    devkit(&dir)
        .args(["snippet", "save", "x", "ls", "--tags", "two words"])
        .assert()
        .failure();
    assert!(!store_file(&dir).exists());
}

#[test]
fn snippet_get_missing_suggests_similar() {
    let dir = TempDir::new().unwrap();
    save(&dir, "docker-clean", "docker system prune -a", "docker");

    devkit(&dir)
        .args(["snippet", "get", "docker"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("snippet 'docker' not found"))
        .stderr(predicate::str::contains("did you mean: docker-clean"));
}

#[test]
fn snippet_list_sorted_and_filtered_by_tag() {
    let dir = TempDir::new().unwrap();
    save(&dir, "zeta", "echo z", "misc");
    save(&dir, "alpha", "echo a", "Docker");
    save(&dir, "mid", "echo m", "docker,misc");

    let v = json(devkit(&dir).args(["--json", "snippet", "list"]));
    let names: Vec<&str> = v.as_array().unwrap().iter().map(|s| s["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["alpha", "mid", "zeta"]);

    let v = json(devkit(&dir).args(["--json", "snippet", "list", "--tag", "DOCKER"]));
    let names: Vec<&str> = v.as_array().unwrap().iter().map(|s| s["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["alpha", "mid"]);

    devkit(&dir)
        .args(["snippet", "list", "--tag", "nope"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No snippets tagged 'nope'"));
}

#[test]
fn snippet_list_empty() {
    let dir = TempDir::new().unwrap();
    devkit(&dir)
        .args(["snippet", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No snippets saved yet."));
}

#[test]
fn snippet_search_matches_name_command_and_tags() {
    let dir = TempDir::new().unwrap();
    save(&dir, "logs", "kubectl logs -f web", "k8s");
    save(&dir, "prune", "docker system prune", "cleanup");
    save(&dir, "web", "npm start", "frontend");

    let v = json(devkit(&dir).args(["--json", "snippet", "search", "WEB"]));
    assert_eq!(v.as_array().unwrap().len(), 2);

    let v = json(devkit(&dir).args(["--json", "snippet", "search", "cleanup"]));
    assert_eq!(v[0]["name"], "prune");
}

#[test]
fn snippet_delete() {
    let dir = TempDir::new().unwrap();
    save(&dir, "tmp", "ls /tmp", "x");

    devkit(&dir)
        .args(["snippet", "delete", "tmp"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted snippet: tmp"));
    devkit(&dir).args(["snippet", "get", "tmp"]).assert().failure();
    devkit(&dir)
        .args(["snippet", "delete", "tmp"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

// ---------------------------------------------------------------------------
// devkit snippet export / import
// ---------------------------------------------------------------------------

#[test]
fn export_then_import_into_fresh_store() {
    let src = TempDir::new().unwrap();
    save(&src, "build", "cargo build --release", "rust,ci");
    save(&src, "serve", "python -m http.server", "web");

    for file in ["out.json", "out.txt"] {
        let path = src.path().join(file);
        devkit(&src)
            .args(["snippet", "export"])
            .arg(&path)
            .assert()
            .success()
            .stdout(predicate::str::contains("Exported 2 snippets"));

        let dst = TempDir::new().unwrap();
        let report = json(devkit(&dst).args(["--json", "snippet", "import"]).arg(&path));
        assert_eq!(report["imported"], 2);
        assert_eq!(report["skipped"], 0);

        let v = json(devkit(&dst).args(["--json", "snippet", "get", "build"]));
        assert_eq!(v["command"], "cargo build --release");
        assert_eq!(v["tags"], serde_json::json!(["ci", "rust"]));
    }
}

#[test]
fn import_reports_conflicts_unless_overwrite() {
    let dir = TempDir::new().unwrap();
    save(&dir, "build", "make", "old");
    let file = dir.path().join("in.json");
    std::fs::write(
        &file,
        r#"[{"name": "build", "command": "cargo build", "tags": []},
            {"name": "test", "command": "cargo test", "tags": ["rust"]}]"#,
    )
    .unwrap();

    let report = json(devkit(&dir).args(["--json", "snippet", "import"]).arg(&file));
    assert_eq!(report["imported"], 1);
    assert_eq!(report["skipped"], 1);
    assert_eq!(report["conflicts"], serde_json::json!(["build"]));
    let v = json(devkit(&dir).args(["--json", "snippet", "get", "build"]));
    assert_eq!(v["command"], "make");

    let report = json(
        devkit(&dir)
            .args(["--json", "snippet", "import", "--overwrite"])
            .arg(&file),
    );
    assert_eq!(report["imported"], 2);
    let v = json(devkit(&dir).args(["--json", "snippet", "get", "build"]));
    assert_eq!(v["command"], "cargo build");
}

#[test]
fn malformed_import_writes_nothing() {
    let dir = TempDir::new().unwrap();
    save(&dir, "keep", "ls", "x");
    let before = std::fs::read_to_string(store_file(&dir)).unwrap();

    let file = dir.path().join("bad.json");
    std::fs::write(&file, "[{\"name\": \"a\"").unwrap();
    devkit(&dir)
        .args(["snippet", "import"])
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to import"));

    assert_eq!(std::fs::read_to_string(store_file(&dir)).unwrap(), before);
}

#[test]
fn export_rejects_unknown_format() {
    let dir = TempDir::new().unwrap();
    devkit(&dir)
        .args(["snippet", "export", "x.out", "--format", "yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown export format"));
}

// ---------------------------------------------------------------------------
// Legacy store upgrade
// ---------------------------------------------------------------------------

#[test]
fn legacy_store_is_readable_and_upgraded_on_write() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(data_dir(&dir)).unwrap();
    std::fs::write(
        store_file(&dir),
        r#"{"build": "npm run build", "lint": {"command": "npm run lint", "tags": ["js"], "created": "2024-03-01T10:00:00"}}"#,
    )
    .unwrap();

    let v = json(devkit(&dir).args(["--json", "snippet", "list"]));
    assert_eq!(v[0]["name"], "build");
    assert_eq!(v[0]["command"], "npm run build");
    assert_eq!(v[1]["tags"], serde_json::json!(["js"]));

    save(&dir, "new", "echo new", "x");
    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(store_file(&dir)).unwrap()).unwrap();
    assert_eq!(raw["version"], 1);
    assert_eq!(raw["snippets"]["build"]["command"], "npm run build");
    assert_eq!(raw["snippets"].as_object().unwrap().len(), 3);
}

#[test]
fn corrupt_store_is_reported() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(data_dir(&dir)).unwrap();
    std::fs::write(store_file(&dir), "{ nope").unwrap();
    devkit(&dir)
        .args(["snippet", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("corrupt data"));
}

// ---------------------------------------------------------------------------
// devkit run / snippet run / rewind
// ---------------------------------------------------------------------------

#[test]
fn run_records_history() {
    let dir = TempDir::new().unwrap();
    devkit(&dir)
        .args(["run", "echo", "hello"])
        .assert()
        .success()
        .stdout(predicate::str::contains("hello"));

    let v = json(devkit(&dir).args(["--json", "rewind"]));
    let records = v.as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["command"], "echo hello");
    assert_eq!(records[0]["success"], true);
    assert_eq!(records[0]["exit_code"], 0);
    assert_eq!(records[0]["source"]["kind"], "ad_hoc");
    assert!(records[0]["output"].as_str().unwrap().contains("hello"));
}

#[test]
fn failed_run_exits_nonzero_and_is_recorded() {
    let dir = TempDir::new().unwrap();
    devkit(&dir).args(["run", "true"]).assert().success();
    devkit(&dir)
        .args(["run", "exit", "7"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed (7)"));

    let v = json(devkit(&dir).args(["--json", "rewind", "--failures"]));
    let records = v.as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["exit_code"], 7);
    assert_eq!(records[0]["success"], false);
}

#[test]
fn rewind_is_newest_first_and_limited() {
    let dir = TempDir::new().unwrap();
    for i in 0..4 {
        devkit(&dir)
            .args(["run", "echo", &i.to_string()])
            .assert()
            .success();
    }
    let v = json(devkit(&dir).args(["--json", "rewind", "-n", "2"]));
    let cmds: Vec<&str> = v.as_array().unwrap().iter().map(|r| r["command"].as_str().unwrap()).collect();
    assert_eq!(cmds, vec!["echo 3", "echo 2"]);

    let v = json(devkit(&dir).args(["--json", "rewind", "-n", "0"]));
    assert_eq!(v.as_array().unwrap().len(), 4);
}

#[test]
fn snippet_run_records_snippet_source() {
    let dir = TempDir::new().unwrap();
    save(&dir, "greet", "echo hi from snippet", "demo");
    devkit(&dir)
        .args(["snippet", "run", "greet"])
        .assert()
        .success()
        .stdout(predicate::str::contains("hi from snippet"));

    let v = json(devkit(&dir).args(["--json", "rewind"]));
    assert_eq!(v[0]["source"], serde_json::json!({"kind": "snippet", "name": "greet"}));
}

#[test]
fn history_can_be_disabled() {
    let dir = TempDir::new().unwrap();
    devkit(&dir).args(["config", "history", "off"]).assert().success();
    devkit(&dir).args(["run", "echo", "quiet"]).assert().success();
    devkit(&dir)
        .args(["rewind"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No command history yet."));
}

#[test]
fn clear_requires_confirmation_and_keeps_snippets() {
    let dir = TempDir::new().unwrap();
    save(&dir, "keep", "ls", "x");
    devkit(&dir).args(["run", "true"]).assert().success();

    devkit(&dir)
        .args(["clear"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--yes"));

    let v = json(devkit(&dir).args(["--json", "clear", "--yes"]));
    assert_eq!(v["cleared"], 1);
    let v = json(devkit(&dir).args(["--json", "rewind"]));
    assert_eq!(v.as_array().unwrap().len(), 0);
    devkit(&dir).args(["snippet", "get", "keep"]).assert().success();
}

// ---------------------------------------------------------------------------
// devkit panic
// ---------------------------------------------------------------------------

#[test]
fn panic_flags_force_push_once() {
    let dir = TempDir::new().unwrap();
    devkit(&dir).args(["run", "echo", "ok"]).assert().success();
    // Matching is textual, so an echo of the command is enough.
    devkit(&dir)
        .args(["run", "echo", "git", "push", "--force", "origin", "main"])
        .assert()
        .success()
        .stderr(predicate::str::contains("force_push"));

    let v = json(devkit(&dir).args(["--json", "panic"]));
    let matches = v["matches"].as_array().unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0]["category"], "force_push");

    devkit(&dir)
        .args(["panic"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Rollback hints:"))
        .stdout(predicate::str::contains("git reflog"));
}

#[test]
fn panic_with_safe_history() {
    let dir = TempDir::new().unwrap();
    devkit(&dir).args(["run", "ls"]).assert().success();
    devkit(&dir)
        .args(["panic"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No dangerous commands"));
}

#[test]
fn panic_stats() {
    let dir = TempDir::new().unwrap();
    devkit(&dir).args(["run", "echo", "rm", "-rf", "build"]).assert().success();
    devkit(&dir).args(["run", "echo", "fine"]).assert().success();

    let v = json(devkit(&dir).args(["--json", "panic", "--stats"]));
    assert_eq!(v["total"], 2);
    assert_eq!(v["dangerous"], 1);
    assert_eq!(v["by_category"]["recursive_delete"], 1);
}

// ---------------------------------------------------------------------------
// AI commands without a usable backend
// ---------------------------------------------------------------------------

#[test]
fn ask_without_key_is_not_configured() {
    let dir = TempDir::new().unwrap();
    devkit(&dir)
        .args(["ask", "list", "large", "files"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("AI is not configured"));
}

#[test]
fn unreachable_backend_is_a_network_error() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(data_dir(&dir)).unwrap();
    std::fs::write(
        data_dir(&dir).join("config.yaml"),
        "api_key: test-key\nbase_url: http://127.0.0.1:9\n",
    )
    .unwrap();
    devkit(&dir)
        .args(["explain", "ls", "-la"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("network error"));
}

// ---------------------------------------------------------------------------
// devkit config / status
// ---------------------------------------------------------------------------

#[test]
fn config_set_key_is_masked_in_show() {
    let dir = TempDir::new().unwrap();
    devkit(&dir)
        .args(["config", "set-key", "AIzaSyVERYSECRET1234"])
        .assert()
        .success();
    devkit(&dir).args(["config", "set-model", "gemini-1.5-pro"]).assert().success();

    let v = json(devkit(&dir).args(["--json", "config", "show"]));
    assert_eq!(v["api_key"], "AIza...1234");
    assert_eq!(v["api_key_source"], "config");
    assert_eq!(v["model"], "gemini-1.5-pro");

    let raw = std::fs::read_to_string(data_dir(&dir).join("config.yaml")).unwrap();
    assert!(raw.contains("AIzaSyVERYSECRET1234"));
}

#[test]
fn status_reports_counts() {
    let dir = TempDir::new().unwrap();
    save(&dir, "a", "echo a", "x");
    devkit(&dir).args(["run", "false"]).assert().failure();

    let v = json(devkit(&dir).args(["--json", "status"]));
    assert_eq!(v["snippets"], 1);
    assert_eq!(v["history"]["total"], 1);
    assert_eq!(v["history"]["failed"], 1);
    assert_eq!(v["ai_configured"], false);
}

// ---------------------------------------------------------------------------
// devkit init / logs
// ---------------------------------------------------------------------------

#[test]
fn init_creates_workspace_once() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir(dir.path().join(".git")).unwrap();
    std::fs::write(dir.path().join("Cargo.toml"), "[package]\nname = \"demo-crate\"\n").unwrap();

    devkit(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("demo-crate"))
        .stdout(predicate::str::contains("rust"));
    assert!(dir.path().join(".devkit/project.yaml").exists());
    let gitignore = std::fs::read_to_string(dir.path().join(".gitignore")).unwrap();
    assert!(gitignore.contains(".devkit/"));

    devkit(&dir)
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));
    devkit(&dir).args(["init", "--force"]).assert().success();
}

#[test]
fn logs_analyze_without_ai() {
    let dir = TempDir::new().unwrap();
    let log = dir.path().join("app.log");
    std::fs::write(
        &log,
        "INFO up\nWARN slow\nERROR db down\njava.lang.IllegalStateException: boom\n    at App.main(App.java:1)\n",
    )
    .unwrap();

    let v = json(devkit(&dir).args(["--json", "logs", "analyze", "--no-ai"]).arg(&log));
    assert_eq!(v["findings"]["warnings"].as_array().unwrap().len(), 1);
    assert_eq!(v["findings"]["errors"].as_array().unwrap().len(), 1);
    assert_eq!(v["findings"]["exceptions"][0]["line"], 4);
    assert_eq!(v["findings"]["stack_traces"].as_array().unwrap().len(), 1);
    assert!(v["analysis"].is_null());
}

#[test]
fn logs_analyze_reads_stdin() {
    let dir = TempDir::new().unwrap();
    devkit(&dir)
        .args(["logs", "analyze", "--no-ai"])
        .write_stdin("ERROR: disk full\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Exceptions:   1"));
}

// ---------------------------------------------------------------------------
// devkit commit
// ---------------------------------------------------------------------------

#[test]
fn commit_dry_run_previews_staged_files() {
    if !git_available() {
        return;
    }
    let dir = TempDir::new().unwrap();
    git(dir.path(), &["init", "-q"]);
    std::fs::write(dir.path().join("README.md"), "hi\n").unwrap();

    devkit(&dir)
        .args(["commit", "-m", "docs: add readme", "--dry-run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no staged changes"));

    git(dir.path(), &["add", "README.md"]);
    devkit(&dir)
        .args(["commit", "-m", "docs: add readme", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Message: docs: add readme"))
        .stdout(predicate::str::contains("A README.md"));
}

#[test]
fn commit_outside_repo_fails() {
    if !git_available() {
        return;
    }
    let dir = TempDir::new().unwrap();
    devkit(&dir)
        .env("GIT_CEILING_DIRECTORIES", dir.path().parent().unwrap())
        .args(["commit", "-m", "x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not in a git repository"));
}
