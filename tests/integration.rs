//! End-to-end tests driving the `xka` binary.

mod common;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use common::{dead_base_url, serve, FakeSource};
use tempfile::TempDir;

fn xka_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("xka");
    path
}

fn setup_test_env(base_url: &str) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let config_content = format!(
        r#"[db]
path = "{}/data/xka.sqlite"

[source]
base_url = "{}"
user_agent = "XKCD-archive/integration"
concurrency = 2

[search]
min_score = 0.0
limit = 10
"#,
        root.display(),
        base_url
    );

    let config_path = config_dir.join("xka.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_xka(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = xka_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run xka binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

/// Run the binary off the async runtime so the fake source keeps serving.
async fn run_xka_async(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let config_path = config_path.to_path_buf();
    let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
    tokio::task::spawn_blocking(move || {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        run_xka(&config_path, &args)
    })
    .await
    .unwrap()
}

#[test]
fn test_init_creates_database() {
    let (tmp, config_path) = setup_test_env("http://127.0.0.1:1");

    let (stdout, stderr, success) = run_xka(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert_eq!(stdout.trim(), "Index initialized");
    assert!(tmp.path().join("data/xka.sqlite").exists());
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env("http://127.0.0.1:1");

    let (_, _, success1) = run_xka(&config_path, &["init"]);
    assert!(success1, "First init failed");
    let (_, _, success2) = run_xka(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");
}

#[test]
fn test_missing_config_uses_defaults() {
    let tmp = TempDir::new().unwrap();
    let binary = xka_binary();
    let output = Command::new(&binary)
        .current_dir(tmp.path())
        .args(["--config", "does-not-exist.toml", "stats"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(tmp.path().join("data/xka.sqlite").exists());
}

#[test]
fn test_stats_empty() {
    let (_tmp, config_path) = setup_test_env("http://127.0.0.1:1");

    let (stdout, stderr, success) = run_xka(&config_path, &["stats"]);
    assert!(success, "stats failed: {}", stderr);
    assert!(stdout.contains("Strips:      0"));
    assert!(stdout.contains("(empty)"));
}

#[test]
fn test_search_no_results() {
    let (_tmp, config_path) = setup_test_env("http://127.0.0.1:1");

    let (stdout, _, success) = run_xka(&config_path, &["search", "anything"]);
    assert!(success);
    assert!(stdout.contains("No results."));
}

#[test]
fn test_lucky_no_results_fails() {
    let (_tmp, config_path) = setup_test_env("http://127.0.0.1:1");

    let (stdout, _, success) = run_xka(&config_path, &["search", "--lucky", "anything"]);
    assert!(!success);
    assert!(stdout.contains("No result matching the query above the minimum score"));
}

#[test]
fn test_get_missing_fails() {
    let (_tmp, config_path) = setup_test_env("http://127.0.0.1:1");

    let (_, stderr, success) = run_xka(&config_path, &["get", "42"]);
    assert!(!success);
    assert!(stderr.contains("strip not found: 42"));
}

#[test]
fn test_refresh_rejects_zero_concurrency() {
    let (_tmp, config_path) = setup_test_env("http://127.0.0.1:1");

    let (_, stderr, success) = run_xka(&config_path, &["refresh", "--concurrency", "0"]);
    assert!(!success);
    assert!(stderr.contains("concurrency"));
}

#[test]
fn test_refresh_unreachable_source() {
    let (_tmp, config_path) = setup_test_env(&dead_base_url());

    let (stdout, stderr, success) = run_xka(&config_path, &["refresh"]);
    assert!(!success, "refresh should fail: {}", stdout);
    assert!(stderr.contains("Could not determine the newest item"));
    assert!(!stdout.contains("ok"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_refresh_then_search() {
    let fake = FakeSource::with_strips(12);
    let base = serve(Arc::clone(&fake)).await;
    let (_tmp, config_path) = setup_test_env(&base);

    let (stdout, stderr, success) = run_xka_async(&config_path, &["refresh"]).await;
    assert!(success, "refresh failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("  latest: 12"));
    assert!(stdout.contains("  indexed: 12"));
    assert!(stdout.contains("  failed: 0"));
    assert!(stdout.contains("ok"));
    assert!(fake
        .user_agents
        .lock()
        .unwrap()
        .iter()
        .all(|ua| ua == "XKCD-archive/integration"));

    let (stdout, _, success) = run_xka_async(&config_path, &["search", "strip number 7"]).await;
    assert!(success);
    assert!(stdout.starts_with("Your search results:\n0 - ("));
    assert!(stdout.contains("XKCD 7 (2020-01-08): Strip number 7"));

    let (stdout, _, success) =
        run_xka_async(&config_path, &["search", "--lucky", "strip number 7"]).await;
    assert!(success);
    assert_eq!(stdout.trim(), format!("{}/7", base));

    let (stdout, _, success) = run_xka_async(&config_path, &["get", "7"]).await;
    assert!(success);
    assert!(stdout.contains("Strip number 7"));
    assert!(stdout.contains("Wednesday, January 8, 2020"));
    assert!(stdout.contains(&format!("url:        {}/7\n", base)));

    let (stdout, _, success) = run_xka_async(&config_path, &["stats"]).await;
    assert!(success);
    assert!(stdout.contains("Strips:      12"));
    assert!(stdout.contains("Highest ID:  12"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_refresh_twice_is_noop() {
    let fake = FakeSource::with_strips(5);
    let base = serve(Arc::clone(&fake)).await;
    let (_tmp, config_path) = setup_test_env(&base);

    let (_, stderr, success) = run_xka_async(&config_path, &["refresh"]).await;
    assert!(success, "first refresh failed: {}", stderr);
    let served = fake.requests().len();

    let (stdout, _, success) = run_xka_async(&config_path, &["refresh"]).await;
    assert!(success);
    assert!(stdout.contains("Nothing to download"));
    // Only the newest-item lookup went out.
    assert_eq!(fake.requests().len(), served + 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_refresh_max_records_flag() {
    let fake = FakeSource::with_strips(10);
    let base = serve(fake).await;
    let (_tmp, config_path) = setup_test_env(&base);

    let (stdout, stderr, success) =
        run_xka_async(&config_path, &["refresh", "--max-records", "4"]).await;
    assert!(success, "refresh failed: {}", stderr);
    assert!(stdout.contains("  missing: 4"));
    assert!(stdout.contains("  indexed: 4"));

    let (stdout, _, _) = run_xka_async(&config_path, &["stats"]).await;
    assert!(stdout.contains("Highest ID:  4"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_item_failures_logged_only_when_verbose() {
    let fake = FakeSource::with_strips(4);
    fake.break_id(2);
    let base = serve(Arc::clone(&fake)).await;
    let (_tmp, config_path) = setup_test_env(&base);

    let (stdout, stderr, success) = run_xka_async(&config_path, &["refresh"]).await;
    assert!(success, "refresh failed: {}", stderr);
    assert!(stdout.contains("  indexed: 3"));
    assert!(stdout.contains("  failed: 1"));
    assert!(!stderr.contains("fetch failed"), "stderr: {}", stderr);
    assert!(!stderr.contains("HTTP 500"), "stderr: {}", stderr);

    // Strip 2 is still missing, so the next run asks for it again.
    let (stdout, stderr, success) = run_xka_async(&config_path, &["-v", "refresh"]).await;
    assert!(success);
    assert!(stdout.contains("  missing: 1"));
    assert!(stderr.contains("fetch failed"), "stderr: {}", stderr);
    assert!(stderr.contains("HTTP 500"), "stderr: {}", stderr);
}
