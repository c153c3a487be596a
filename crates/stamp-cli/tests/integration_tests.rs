//! Integration tests for the `stamp` binary.

use std::fs;
use std::path::Path;

use assert_cmd::{Command, cargo};
use predicates::prelude::*;
use tempfile::TempDir;

const DESCRIPTOR: &str = r#"
[[remotes]]
name = "shell"
root = "apps/shell"
builtin = "mfe-shell"

[[remotes.units]]
kind = "import"
region = "imports"
name = "Cart"
from = "checkout"
file = "src/App.jsx"

[[remotes.units]]
kind = "usage"
region = "usages"
name = "Cart"
file = "src/App.jsx"

[[remotes]]
name = "checkout"
root = "apps/checkout"
builtin = "mfe-remote"

[[remotes.units]]
kind = "component"
region = "exposes"
name = "Cart"
"#;

/// A `stamp` invocation isolated from the user's config and environment.
fn stamp(dir: &Path) -> Command {
    let mut cmd = cargo::cargo_bin_cmd!("stamp");
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env("XDG_CONFIG_HOME", dir.join(".config"))
        .env("NO_COLOR", "true")
        .env_remove("STAMP_TEMPLATES_DIR")
        .env_remove("RUST_LOG");
    cmd
}

fn workspace() -> TempDir {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("stamp.toml"), DESCRIPTOR).unwrap();
    tmp
}

#[test]
fn test_help_flag() {
    let tmp = TempDir::new().unwrap();
    stamp(tmp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("generate"))
        .stdout(predicate::str::contains("validate-name"));
}

#[test]
fn test_version_flag() {
    let tmp = TempDir::new().unwrap();
    stamp(tmp.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_list_names() {
    let tmp = TempDir::new().unwrap();
    stamp(tmp.path())
        .args(["list", "--format", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("mfe-shell"))
        .stdout(predicate::str::contains("mfe-remote"))
        .stdout(predicate::str::contains("rest-api"));
}

#[test]
fn test_list_json() {
    let tmp = TempDir::new().unwrap();
    let out = stamp(tmp.path())
        .args(["list", "--format", "json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let sets: serde_json::Value = serde_json::from_slice(&out).unwrap();
    let names: Vec<&str> = sets
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["mfe-shell", "mfe-remote", "rest-api"]);
}

#[test]
fn test_validate_name_accepts_package() {
    let tmp = TempDir::new().unwrap();
    stamp(tmp.path())
        .args(["validate-name", "@acme/checkout"])
        .assert()
        .success()
        .stdout(predicate::str::contains("valid name"));
}

#[test]
fn test_validate_name_component_json() {
    let tmp = TempDir::new().unwrap();
    let out = stamp(tmp.path())
        .args(["--output-format", "json", "validate-name", "CartButton", "--component"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(value["valid"], true);
    assert_eq!(value["kind"], "component");
}

#[test]
fn test_generate_creates_files() {
    let tmp = workspace();

    stamp(tmp.path())
        .arg("generate")
        .assert()
        .success()
        .stdout(predicate::str::contains("created"));

    let app = fs::read_to_string(tmp.path().join("apps/shell/src/App.jsx")).unwrap();
    assert!(app.contains("import Cart from 'checkout/Cart';"));
    assert!(app.contains("<Cart />"));

    let webpack = fs::read_to_string(tmp.path().join("apps/checkout/webpack.config.js")).unwrap();
    assert!(webpack.contains("'./Cart': './src/components/Cart',"));
}

#[test]
fn test_generate_twice_is_idempotent() {
    let tmp = workspace();
    stamp(tmp.path()).arg("generate").assert().success();
    let first = fs::read_to_string(tmp.path().join("apps/shell/src/App.jsx")).unwrap();

    stamp(tmp.path())
        .arg("generate")
        .assert()
        .success()
        .stdout(predicate::str::contains("0 created, 0 updated"));
    let second = fs::read_to_string(tmp.path().join("apps/shell/src/App.jsx")).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_generate_keeps_hand_edits() {
    let tmp = workspace();
    stamp(tmp.path()).arg("generate").assert().success();

    let path = tmp.path().join("apps/shell/src/App.jsx");
    let edited = format!("// owned by the shell team\n{}", fs::read_to_string(&path).unwrap());
    fs::write(&path, &edited).unwrap();

    stamp(tmp.path()).arg("generate").assert().success();
    assert_eq!(fs::read_to_string(&path).unwrap(), edited);
}

#[test]
fn test_dry_run_writes_nothing() {
    let tmp = workspace();
    stamp(tmp.path())
        .args(["generate", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("would create"));

    assert!(!tmp.path().join("apps").exists());
}

#[test]
fn test_generate_json_report() {
    let tmp = workspace();
    let out = stamp(tmp.path())
        .args(["--output-format", "json", "generate", "--dry-run"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let report: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(report["dry_run"], true);
    assert_eq!(report["sub_projects"].as_array().unwrap().len(), 2);
    assert!(!report["created"].as_array().unwrap().is_empty());
}

#[test]
fn test_check_passes_after_generate() {
    let tmp = workspace();
    stamp(tmp.path()).arg("generate").assert().success();

    stamp(tmp.path())
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("up to date"));
}

#[test]
fn test_check_reports_drift_after_region_edit() {
    let tmp = workspace();
    stamp(tmp.path()).arg("generate").assert().success();

    let path = tmp.path().join("apps/shell/src/App.jsx");
    let tampered = fs::read_to_string(&path)
        .unwrap()
        .replace("<Cart />", "<Basket />");
    fs::write(&path, tampered).unwrap();

    stamp(tmp.path()).arg("check").assert().code(5);

    // check never writes
    assert!(fs::read_to_string(&path).unwrap().contains("<Basket />"));
}

#[test]
fn test_new_creates_sub_project() {
    let tmp = TempDir::new().unwrap();

    stamp(tmp.path())
        .args(["new", "checkout", "--template", "mfe-remote"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Sub-project 'checkout' created!"));

    let dir = tmp.path().join("checkout");
    assert!(dir.join("stamp.toml").exists());
    assert!(dir.join("webpack.config.js").exists());
    assert!(dir.join("src/index.js").exists());

    stamp(&dir).arg("check").assert().success();
}

#[test]
fn test_new_dry_run_writes_nothing() {
    let tmp = TempDir::new().unwrap();

    stamp(tmp.path())
        .args(["new", "orders", "--template", "rest-api", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Dry run"));

    assert!(!tmp.path().join("orders").exists());
}

#[test]
fn test_config_path_honours_flag() {
    let tmp = TempDir::new().unwrap();
    let cfg = tmp.path().join("custom.toml");
    fs::write(&cfg, "[generation]\nconcurrency = 3\n").unwrap();

    stamp(tmp.path())
        .args(["-c", cfg.to_str().unwrap(), "config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("custom.toml"));

    stamp(tmp.path())
        .args(["-c", cfg.to_str().unwrap(), "config", "get", "generation.concurrency"])
        .assert()
        .success()
        .stdout(predicate::str::contains("3"));
}

#[test]
fn test_config_from_environment() {
    let tmp = TempDir::new().unwrap();
    stamp(tmp.path())
        .env("STAMP_MARKERS__START", "@gen:begin")
        .args(["config", "get", "markers.start"])
        .assert()
        .success()
        .stdout(predicate::str::contains("@gen:begin"));
}

#[test]
fn test_init_writes_config() {
    let tmp = TempDir::new().unwrap();
    let cfg = tmp.path().join("stamp-config.toml");

    stamp(tmp.path())
        .args(["-c", cfg.to_str().unwrap(), "init"])
        .assert()
        .success();

    let written = fs::read_to_string(&cfg).unwrap();
    assert!(written.contains("[markers]"));
    assert!(written.contains("GENERATOR:START"));
}

#[test]
fn test_completions_bash() {
    let tmp = TempDir::new().unwrap();
    stamp(tmp.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("stamp"));
}
