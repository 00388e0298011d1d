use std::fs;
use std::net::TcpListener;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;

use storehours_core::{ConfigStore, CredentialVault};
use tempfile::TempDir;

fn storehours_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("storehours"));
    cmd.current_dir(dir).env_remove("RUST_LOG");
    cmd
}

fn sealed_values(dir: &Path, global: &str, key: &str, password: &str) -> (String, String) {
    let output = storehours_cmd(dir)
        .args(["seal", "--global", global, "--key", key, "--password", password])
        .output()
        .expect("run storehours seal");
    assert!(output.status.success(), "seal failed: {output:?}");
    let stdout = String::from_utf8(output.stdout).unwrap();
    let value = |name: &str| {
        stdout
            .lines()
            .find_map(|l| l.strip_prefix(&format!("{name} = ")))
            .map(str::to_string)
            .unwrap_or_else(|| panic!("missing {name} in {stdout:?}"))
    };
    (value("pwd"), value("token"))
}

#[test]
fn seal_output_unwraps_to_the_password() {
    let dir = TempDir::new().unwrap();
    let (pwd, token) = sealed_values(dir.path(), "global-secret", "intermediate", "hunter2");

    let config = ConfigStore::parse(&format!(
        "[MAIN]\nGLOBAL = global-secret\n[ITSM]\nuser = acme-it\npwd = {pwd}\ntoken = {token}\n"
    ))
    .unwrap();
    let creds = CredentialVault::new(&config).credentials("ITSM").unwrap();
    assert_eq!(creds.login, "acme-it");
    assert_eq!(creds.secret, "hunter2");
}

#[test]
fn seal_rejects_empty_global() {
    let dir = TempDir::new().unwrap();
    storehours_cmd(dir.path())
        .args(["seal", "--global", "", "--key", "k", "--password", "p"])
        .assert()
        .failure()
        .stderr(contains("could not seal"));
}

#[test]
fn missing_config_fails_with_one_terminal_line() {
    let dir = TempDir::new().unwrap();
    let output = storehours_cmd(dir.path())
        .args(["run", "--config", "absent.cfg"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert!(lines[0].ends_with("\t:: START ::"), "got {stdout:?}");
    assert_eq!(
        lines.iter().filter(|l| l.contains(":: FAILED ::")).count(),
        1,
        "got {stdout:?}"
    );
    assert!(stdout.contains("absent.cfg"));
    assert!(!stdout.contains(":: SUCCESS ::"));
}

#[test]
fn log_file_mirrors_stdout() {
    let dir = TempDir::new().unwrap();
    let log_path = dir.path().join("run.logs");
    fs::write(&log_path, "previous run\n").unwrap();

    storehours_cmd(dir.path())
        .args(["run", "--config", "absent.cfg", "--log-file"])
        .arg(&log_path)
        .assert()
        .code(1)
        .stdout(contains(":: START ::").and(contains(":: FAILED ::")));

    let contents = fs::read_to_string(&log_path).unwrap();
    assert!(!contents.contains("previous run"), "log file must be truncated");
    assert!(contents.lines().next().unwrap().ends_with(":: START ::"));
    assert!(contents.contains(":: FAILED ::"));
}

#[test]
fn unreachable_origin_fails_the_run() {
    let dir = TempDir::new().unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let mut text = String::from("[MAIN]\nGLOBAL = global-secret\n");
    for (section, user) in [("ITSM", "acme-it"), ("ORIGIN", "svc"), ("ORIGIN2", "client")] {
        let (pwd, token) = sealed_values(dir.path(), "global-secret", "k", "secret");
        text.push_str(&format!("[{section}]\nuser = {user}\npwd = {pwd}\ntoken = {token}\n"));
        if section == "ORIGIN" {
            text.push_str(&format!("origin_url = http://127.0.0.1:{port}\n"));
        }
    }
    fs::write(dir.path().join("itsm.cfg"), text).unwrap();

    storehours_cmd(dir.path())
        .arg("run")
        .assert()
        .code(1)
        .stdout(contains("Synchronization of store opening hours failed"))
        .stdout(contains(":: SUCCESS ::").not());
}

#[test]
fn unknown_environment_is_a_usage_error() {
    let dir = TempDir::new().unwrap();
    storehours_cmd(dir.path())
        .args(["run", "--env", "staging"])
        .assert()
        .code(2)
        .stderr(contains("expected: PROD, QA"));
}
