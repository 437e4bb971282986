//! Config file layering and logging destinations, through the binary.

use std::fs;
use tempfile::TempDir;

use crate::integration::test_utils::nodectl;

#[test]
fn test_global_config_sets_format() {
    let temp = TempDir::new().unwrap();
    let config_dir = temp.path().join("config").join("nodectl");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(config_dir.join("config.toml"), "format = \"json\"\n").unwrap();

    let output = nodectl(&temp).args(["agent", "status"]).output().unwrap();
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "{\"status\":\"DEAD\"}\n"
    );

    let output = nodectl(&temp)
        .args(["--format", "human", "agent", "status"])
        .output()
        .unwrap();
    assert_eq!(String::from_utf8_lossy(&output.stdout), "status\t\"DEAD\"\n");
}

#[test]
fn test_missing_explicit_config_is_config_error() {
    let temp = TempDir::new().unwrap();
    let output = nodectl(&temp)
        .arg("--config")
        .arg(temp.path().join("absent.toml"))
        .args(["agent", "status"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(78));
    assert!(String::from_utf8_lossy(&output.stderr).starts_with("ErrorCLIConfig"));
}

#[test]
fn test_verbose_logs_to_file_not_stdout() {
    let temp = TempDir::new().unwrap();
    let log_file = temp.path().join("logs").join("nodectl.log");

    let output = nodectl(&temp)
        .args(["--verbose", "--log-output", "file", "--log-file"])
        .arg(&log_file)
        .args(["agent", "status"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "status\t\"DEAD\"\n");

    let content = fs::read_to_string(&log_file).unwrap();
    assert!(
        content.contains("nodectl starting"),
        "log file should contain a startup message; got: {}",
        content
    );
}

#[test]
fn test_quiet_by_default() {
    let temp = TempDir::new().unwrap();
    let output = nodectl(&temp).args(["agent", "status"]).output().unwrap();
    assert!(output.stderr.is_empty());
}
