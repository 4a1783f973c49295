//! Tests for profile load/save and resolution driven through the CLI (non-interactive paths only)
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

fn run_stattop(config: &Path, args: &[&str]) -> (bool, String) {
    let exe = env!("CARGO_BIN_EXE_stattop");
    let output = Command::new(exe)
        .args(args)
        .env("XDG_CONFIG_HOME", config)
        .output()
        .expect("run stattop");
    let ok = output.status.success();
    let text = format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    (ok, text)
}

fn profiles_path(config: &Path) -> PathBuf {
    config.join("stattop").join("profiles.json")
}

#[test]
fn test_profile_created_on_first_use() {
    let td = tempfile::tempdir().unwrap();
    let (ok, out) = run_stattop(
        td.path(),
        &["--profile", "unittest", "--url", "ws://example:1", "--dry-run", "web"],
    );
    assert!(ok, "{out}");
    let data = fs::read_to_string(profiles_path(td.path())).expect("profiles.json created");
    assert!(
        data.contains("unittest"),
        "profiles.json missing profile entry: {data}"
    );
}

#[test]
fn test_profile_overwrite_only_when_changed() {
    let td = tempfile::tempdir().unwrap();
    let dir = td.path();
    let (_ok, _out) = run_stattop(dir, &["-P", "prod", "--url", "ws://one", "--dry-run", "web"]);
    let first = fs::read_to_string(profiles_path(dir)).unwrap();

    // identical input must not rewrite the file
    let (_ok, _out) = run_stattop(dir, &["-P", "prod", "--url", "ws://one", "--dry-run", "web"]);
    let second = fs::read_to_string(profiles_path(dir)).unwrap();
    assert_eq!(first, second, "Profile file changed despite identical input");

    // a different URL without --save keeps the stored one
    let (_ok, _out) = run_stattop(dir, &["-P", "prod", "--url", "ws://two", "--dry-run", "web"]);
    let third = fs::read_to_string(profiles_path(dir)).unwrap();
    assert_eq!(first, third);

    let (_ok, _out) = run_stattop(
        dir,
        &["-P", "prod", "--save", "--url", "ws://two", "--dry-run", "web"],
    );
    let fourth = fs::read_to_string(profiles_path(dir)).unwrap();
    assert!(fourth.contains("two"), "Updated URL not written: {fourth}");
}

#[test]
fn test_saved_profile_is_loaded() {
    let td = tempfile::tempdir().unwrap();
    let dir = td.path();
    let (ok, out) = run_stattop(
        dir,
        &[
            "--profile",
            "secureX",
            "--tls-ca",
            "/tmp/cert.pem",
            "--url",
            "wss://host:8443",
            "--dry-run",
            "web",
        ],
    );
    assert!(ok, "{out}");
    let data = fs::read_to_string(profiles_path(dir)).unwrap();
    assert!(data.contains("secureX"));
    assert!(data.contains("cert.pem"));

    let (ok, out) = run_stattop(dir, &["-P", "secureX", "--dry-run", "web"]);
    assert!(ok, "{out}");
    assert!(out.contains("agent: wss://host:8443/"), "{out}");
    assert!(out.contains("tls-ca: /tmp/cert.pem"), "{out}");
}

#[test]
fn test_unknown_profile_is_an_error() {
    let td = tempfile::tempdir().unwrap();
    let (ok, out) = run_stattop(td.path(), &["-P", "nope", "--dry-run", "web"]);
    assert!(!ok);
    assert!(out.contains("profile 'nope' does not exist"), "{out}");
    assert!(!profiles_path(td.path()).exists());
}
