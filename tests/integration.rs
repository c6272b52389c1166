use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn dix_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_dix"))
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let docs_dir = root.join("docs");
    fs::create_dir_all(&docs_dir).unwrap();
    fs::write(
        docs_dir.join("alpha.md"),
        "# Alpha Document\n\nThis is the alpha document about Rust programming.\n\nIt contains information about cargo and crates.",
    )
    .unwrap();
    fs::write(
        docs_dir.join("beta.md"),
        "# Beta Document\n\nThis document discusses Python and machine learning.\n\nDeep learning frameworks like PyTorch are covered.",
    )
    .unwrap();
    fs::write(
        docs_dir.join("gamma.txt"),
        "Gamma plain text file.\n\nContains notes about deployment and infrastructure.\n\nKubernetes and Docker are mentioned here.",
    )
    .unwrap();

    let config_content = format!(
        r#"[paths]
docs_dir = "{root}/docs"
index_path = "{root}/data/index.json"

[chunking]
size = 700
overlap = 150

[embedding]
backend = "local"
local_dims = 128
api_key_env = "DIX_TEST_UNSET_KEY"

[retrieval]
top_k = 3

[server]
bind = "127.0.0.1:7341"
"#,
        root = root.display()
    );

    let config_path = config_dir.join("dix.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_dix(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = dix_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .env_remove("DIX_TEST_UNSET_KEY")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run dix binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

fn read_index(config_path: &Path) -> serde_json::Value {
    let root = config_path.parent().unwrap().parent().unwrap();
    let raw = fs::read_to_string(root.join("data").join("index.json")).unwrap();
    serde_json::from_str(&raw).unwrap()
}

fn records_for<'a>(index: &'a serde_json::Value, source: &str) -> Vec<&'a serde_json::Value> {
    index["records"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|r| r["source_path"] == source)
        .collect()
}

#[test]
fn test_ingest_creates_index() {
    let (tmp, config) = setup_test_env();
    let (stdout, stderr, success) = run_dix(&config, &["ingest"]);
    assert!(success, "ingest failed: {}", stderr);
    assert!(stdout.contains("files processed: 3"));
    assert!(stdout.contains("backend: local"));
    assert!(stdout.contains("ok"));

    assert!(tmp.path().join("data").join("index.json").exists());
    assert!(!tmp.path().join("data").join("index.json.tmp").exists());

    let index = read_index(&config);
    assert_eq!(index["meta"]["embed_backend"], "local");
    assert_eq!(index["meta"]["dims"], 128);
    assert_eq!(index["meta"]["count"], 3);
    assert!(index["meta"]["only_file"].is_null());
    for record in index["records"].as_array().unwrap() {
        assert_eq!(record["embedding"].as_array().unwrap().len(), 128);
    }
}

#[test]
fn test_search_finds_exact_chunk() {
    let (_tmp, config) = setup_test_env();
    let (_, stderr, success) = run_dix(&config, &["ingest"]);
    assert!(success, "ingest failed: {}", stderr);

    let index = read_index(&config);
    let gamma_text = records_for(&index, "gamma.txt")[0]["text"]
        .as_str()
        .unwrap()
        .to_string();

    let (stdout, stderr, success) =
        run_dix(&config, &["search", &gamma_text, "--top-k", "1", "--json"]);
    assert!(success, "search failed: {}", stderr);
    let response: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let results = response["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["source_path"], "gamma.txt");
    assert!((results[0]["score"].as_f64().unwrap() - 1.0).abs() < 1e-6);
    assert_eq!(response["meta"]["embed_backend"], "local");
}

#[test]
fn test_search_human_output() {
    let (_tmp, config) = setup_test_env();
    run_dix(&config, &["ingest"]);
    let (stdout, _, success) = run_dix(&config, &["search", "Kubernetes Docker deployment"]);
    assert!(success);
    assert!(stdout.contains("1. ["));
    assert!(stdout.contains("gamma.txt"));
    assert!(stdout.contains("excerpt:"));
}

#[test]
fn test_search_before_ingest_is_empty() {
    let (_tmp, config) = setup_test_env();
    let (stdout, stderr, success) = run_dix(&config, &["search", "anything"]);
    assert!(success, "search failed: {}", stderr);
    assert!(stdout.contains("No results."));
}

#[test]
fn test_search_empty_query_fails() {
    let (_tmp, config) = setup_test_env();
    let (_, stderr, success) = run_dix(&config, &["search", "   "]);
    assert!(!success);
    assert!(stderr.contains("query must not be empty"));
}

#[test]
fn test_filtered_ingest_only_touches_one_file() {
    let (tmp, config) = setup_test_env();
    run_dix(&config, &["ingest"]);
    let before = read_index(&config);

    fs::write(
        tmp.path().join("docs").join("beta.md"),
        "# Beta Revised\n\nNow about hydroponics and irrigation schedules.",
    )
    .unwrap();
    let (stdout, stderr, success) = run_dix(&config, &["ingest", "--only-file", "beta.md"]);
    assert!(success, "filtered ingest failed: {}", stderr);
    assert!(stdout.contains("files processed: 1"));

    let after = read_index(&config);
    assert_eq!(after["meta"]["only_file"], "beta.md");
    for source in ["alpha.md", "gamma.txt"] {
        assert_eq!(records_for(&before, source), records_for(&after, source));
    }
    let beta = records_for(&after, "beta.md");
    assert_eq!(beta.len(), 1);
    assert!(beta[0]["text"].as_str().unwrap().contains("hydroponics"));
}

#[test]
fn test_filtered_ingest_missing_file_is_reported() {
    let (_tmp, config) = setup_test_env();
    run_dix(&config, &["ingest"]);
    let before = read_index(&config);

    let (stdout, stderr, success) = run_dix(&config, &["ingest", "--only-file", "nope.md"]);
    assert!(success, "filtered ingest failed: {}", stderr);
    assert!(stdout.contains("only_file 'nope.md' not found"));
    assert_eq!(read_index(&config), before);
}

#[test]
fn test_new_file_is_added_by_filtered_ingest() {
    let (tmp, config) = setup_test_env();
    run_dix(&config, &["ingest"]);
    fs::write(
        tmp.path().join("docs").join("delta.txt"),
        "Delta notes on greenhouse ventilation.",
    )
    .unwrap();
    let (_, stderr, success) = run_dix(&config, &["ingest", "--only-file", "delta.txt"]);
    assert!(success, "{}", stderr);
    let index = read_index(&config);
    assert_eq!(index["meta"]["count"], 4);
    assert_eq!(records_for(&index, "delta.txt").len(), 1);
}

#[test]
fn test_forced_remote_without_key_fails() {
    let (_tmp, config) = setup_test_env();
    let (_, stderr, success) = run_dix(&config, &["ingest", "--backend", "remote"]);
    assert!(!success);
    assert!(stderr.contains("DIX_TEST_UNSET_KEY"));
}

#[test]
fn test_stats_output() {
    let (_tmp, config) = setup_test_env();
    run_dix(&config, &["ingest"]);
    let (stdout, stderr, success) = run_dix(&config, &["stats"]);
    assert!(success, "stats failed: {}", stderr);
    assert!(stdout.contains("Records:     3"));
    assert!(stdout.contains("Backend:     local"));
    assert!(stdout.contains("128 (3 records)"));
    assert!(stdout.contains("alpha.md"));
}

#[test]
fn test_stats_without_index() {
    let (_tmp, config) = setup_test_env();
    let (stdout, _, success) = run_dix(&config, &["stats"]);
    assert!(success);
    assert!(stdout.contains("Records:     0"));
    assert!(stdout.contains("never"));
}

#[test]
fn test_invalid_config_rejected() {
    let (tmp, _) = setup_test_env();
    let bad = tmp.path().join("config").join("bad.toml");
    fs::write(&bad, "[chunking]\nsize = 0\n").unwrap();
    let (_, stderr, success) = run_dix(&bad, &["stats"]);
    assert!(!success);
    assert!(stderr.contains("chunking.size"));
}

#[test]
fn test_missing_explicit_config_fails() {
    let tmp = TempDir::new().unwrap();
    let (_, stderr, success) = run_dix(&tmp.path().join("missing.toml"), &["stats"]);
    assert!(!success);
    assert!(stderr.contains("Failed to read config file"));
}
