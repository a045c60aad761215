use assert_cmd::cargo;
use predicates::prelude::*;

#[test]
fn test_cli_help() {
    let mut cmd = cargo::cargo_bin_cmd!("seoaudit");
    let assert = cmd.arg("--help").assert();

    let expected_pattern = if cfg!(windows) {
        "seoaudit.exe [OPTIONS] <URL>"
    } else {
        "seoaudit [OPTIONS] <URL>"
    };

    assert
        .success()
        .stderr(predicate::str::is_empty())
        .stdout(predicate::str::contains(expected_pattern))
        .stdout(predicate::str::contains("--max-pages"))
        .stdout(predicate::str::contains("--top-n"));
}

#[test]
fn test_cli_requires_url() {
    let mut cmd = cargo::cargo_bin_cmd!("seoaudit");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("<URL>"));
}

#[test]
fn test_cli_rejects_zero_page_budget() {
    let mut cmd = cargo::cargo_bin_cmd!("seoaudit");
    cmd.args(["https://example.com", "--max-pages", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--max-pages must be at least 1"));
}

#[test]
fn test_cli_rejects_unknown_output_format() {
    let mut cmd = cargo::cargo_bin_cmd!("seoaudit");
    cmd.args(["https://example.com", "--output", "xml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--output must be 'text' or 'json'"));
}

#[test]
fn test_cli_missing_config_file() {
    let mut cmd = cargo::cargo_bin_cmd!("seoaudit");
    cmd.args(["https://example.com", "--config", "does-not-exist.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read config file"));
}

#[test]
fn test_cli_invalid_seed() {
    let mut cmd = cargo::cargo_bin_cmd!("seoaudit");
    cmd.args(["ftp://example.com", "--delay-ms", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid seed URL"));
}
