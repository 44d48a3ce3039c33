use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use tempfile::TempDir;

fn write_file(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("write file");
    path
}

#[test]
fn config_init_writes_example_file() {
    let dir = TempDir::new().expect("temp dir");
    let config_path = dir.path().join("config.toml");

    let mut cmd = cargo_bin_cmd!("newsrelay");
    cmd.current_dir(dir.path())
        .args(["config", "init", "--path"])
        .arg(&config_path)
        .assert()
        .success();

    let content = fs::read_to_string(&config_path).expect("read config");
    assert!(content.contains("[[sources]]"));
    assert!(content.contains("bot_token_env = \"TELEGRAM_TOKEN\""));

    let mut again = cargo_bin_cmd!("newsrelay");
    again
        .current_dir(dir.path())
        .args(["config", "init", "--path"])
        .arg(&config_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));
}

#[test]
fn taxonomy_validate_fails_on_bad_regex() {
    let dir = TempDir::new().expect("temp dir");
    let path = write_file(
        &dir,
        "taxonomy.toml",
        "[[categories]]\nid = \"broken\"\nlabel = \"Broken\"\nregexes = [\"(unclosed\"]\n",
    );

    let mut cmd = cargo_bin_cmd!("newsrelay");
    cmd.current_dir(dir.path())
        .args(["taxonomy", "validate", "--path"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Validation failed"));
}

#[test]
fn taxonomy_list_shows_builtin_categories() {
    let dir = TempDir::new().expect("temp dir");

    let mut cmd = cargo_bin_cmd!("newsrelay");
    let output = cmd
        .current_dir(dir.path())
        .args(["taxonomy", "list", "--json"])
        .output()
        .expect("run taxonomy list");

    assert!(output.status.success());

    let value: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(value["origin"], "builtin");
    assert_eq!(value["categories"][0]["id"], "military");
}

#[test]
fn classify_outputs_matching_category() {
    let dir = TempDir::new().expect("temp dir");

    let mut cmd = cargo_bin_cmd!("newsrelay");
    let output = cmd
        .current_dir(dir.path())
        .args(["classify", "--text", "Russia imposes new sanctions", "--json"])
        .output()
        .expect("run classify");

    assert!(output.status.success());

    let value: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(value["matched"], true);
    assert_eq!(value["category"], "sanctions_economy");
}

#[test]
fn classify_reports_no_match() {
    let dir = TempDir::new().expect("temp dir");

    let mut cmd = cargo_bin_cmd!("newsrelay");
    let output = cmd
        .current_dir(dir.path())
        .args(["classify", "--text", "Local bakery wins pie contest", "--json"])
        .output()
        .expect("run classify");

    assert!(output.status.success());

    let value: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(value["matched"], false);
    assert!(value["category"].is_null());
}

#[test]
fn run_without_sources_fails_at_startup() {
    let dir = TempDir::new().expect("temp dir");
    let config = write_file(
        &dir,
        "config.toml",
        "[dedup]\nbackend = \"memory\"\n\n[telegram]\nchannels = [\"@news\"]\n",
    );

    let mut cmd = cargo_bin_cmd!("newsrelay");
    cmd.current_dir(dir.path())
        .arg("--config")
        .arg(&config)
        .args(["run", "--once", "--dry-run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No sources configured"));
}

#[test]
fn run_rejects_duplicate_source_names() {
    let dir = TempDir::new().expect("temp dir");
    let config = write_file(
        &dir,
        "config.toml",
        r#"
[dedup]
backend = "memory"

[[sources]]
name = "wire"
url = "https://example.com/a.xml"

[[sources]]
name = "wire"
url = "https://example.com/b.xml"
"#,
    );

    let mut cmd = cargo_bin_cmd!("newsrelay");
    cmd.current_dir(dir.path())
        .arg("--config")
        .arg(&config)
        .args(["run", "--once", "--dry-run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Duplicate source name"));
}

#[test]
fn doctor_reports_json() {
    let dir = TempDir::new().expect("temp dir");
    let config = write_file(
        &dir,
        "config.toml",
        r#"
[dedup]
backend = "memory"

[telegram]
bot_token_env = "NEWSRELAY_TEST_TOKEN_NOT_SET"
channels = ["@news"]

[[sources]]
name = "wire"
url = "https://example.com/feed.xml"
"#,
    );

    let mut cmd = cargo_bin_cmd!("newsrelay");
    let output = cmd
        .current_dir(dir.path())
        .env_remove("NEWSRELAY_TEST_TOKEN_NOT_SET")
        .arg("--config")
        .arg(&config)
        .args(["doctor", "--json"])
        .output()
        .expect("run doctor");

    assert!(output.status.success());

    let value: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(value["overall"], "warn");
    assert_eq!(value["sources"]["status"], "ok");
    assert_eq!(value["taxonomy"]["status"], "ok");
    assert_eq!(value["telegram"]["status"], "warn");
}

#[test]
fn run_rejects_invalid_scrape_selector() {
    let dir = TempDir::new().expect("temp dir");
    let config = write_file(
        &dir,
        "config.toml",
        r#"
[dedup]
backend = "memory"

[[sources]]
name = "page"
kind = "scrape"
url = "https://example.com/latest"

[sources.selectors]
block = "div[["
"#,
    );

    let mut cmd = cargo_bin_cmd!("newsrelay");
    cmd.current_dir(dir.path())
        .arg("--config")
        .arg(&config)
        .args(["run", "--once", "--dry-run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid selectors"));
}
