//! CLI の動作テスト

use assert_cmd::Command;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::fs;

fn cli() -> Command {
    Command::cargo_bin("route-flattener").unwrap()
}

const NESTED: &str = r#"[
  { "path": "/", "component": "Home" },
  { "path": "/settings", "meta": { "group": true }, "children": [
    { "path": "profile", "component": "Profile" },
    { "path": "security", "children": [
      { "path": "2fa", "component": "TwoFactor" }
    ]}
  ]}
]"#;

#[test]
fn test_flatten_from_stdin() {
    let output = cli().write_stdin(NESTED).assert().success().get_output().clone();
    let value: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        value,
        json!([
            { "path": "/", "component": "Home" },
            { "path": "/settings/profile", "component": "Profile" },
            { "path": "/settings/security/2fa", "component": "TwoFactor" }
        ])
    );
}

#[test]
fn test_flatten_from_file_compact() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("routes.json");
    fs::write(&input, NESTED).unwrap();

    let output = cli()
        .arg(&input)
        .arg("--compact")
        .assert()
        .success()
        .get_output()
        .clone();
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout.trim_end().lines().count(), 1);
}

#[test]
fn test_check_mode() {
    cli().arg("--check").write_stdin(NESTED).assert().code(1);
    cli()
        .arg("--check")
        .write_stdin(r#"[{ "path": "/", "component": "Home" }]"#)
        .assert()
        .success()
        .stdout("");
}

#[test]
fn test_invalid_json_fails() {
    cli().write_stdin("{ not json").assert().failure();
    cli()
        .write_stdin(r#"[{ "path": "/", "component": "A", "components": { "default": "B" } }]"#)
        .assert()
        .failure();
}

#[test]
fn test_project_root() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("src/router")).unwrap();
    fs::write(
        dir.path().join("src/router/index.ts"),
        r#"
        const routes = [
          { path: "/shop", children: [{ path: "cart", component: Cart }] },
        ];
        export default createRouter({ history: createWebHistory(), routes });
        "#,
    )
    .unwrap();

    let output = cli()
        .arg("--project-root")
        .arg(dir.path())
        .assert()
        .success()
        .get_output()
        .clone();
    let tables: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(tables[0]["routes"], json!([{ "path": "/shop/cart", "component": "Cart" }]));
    assert!(tables[0]["source_file"].as_str().unwrap().ends_with("index.ts"));
}

#[test]
fn test_project_root_without_router_files() {
    let dir = tempfile::tempdir().unwrap();
    cli().arg("-r").arg(dir.path()).assert().failure();
}
