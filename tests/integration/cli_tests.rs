//! Тесты CLI и загрузки конфигурации

use clap::Parser;
use rustdb_query::cli::Cli;
use rustdb_query::common::{EngineConfig, Result};
use rustdb_query::planner::JoinPolicy;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_config_file_is_loaded() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("rustdb.toml");
    fs::write(
        &path,
        "[storage]\nblock_size = 256\n\n[planner]\njoin_policy = \"product_only\"\n",
    )?;

    let path_arg = path.to_string_lossy().to_string();
    let cli = Cli::try_parse_from(["rustdb-query", "--config", path_arg.as_str(), "config"])
        .expect("arguments parse");
    let config = cli.load_config()?;
    assert_eq!(config.storage.block_size, 256);
    assert_eq!(config.planner.join_policy, JoinPolicy::ProductOnly);

    let mut out = Vec::new();
    cli.execute(&config, &mut out)?;
    let text = String::from_utf8(out).expect("utf-8 output");
    assert_eq!(EngineConfig::from_file(&path)?.storage.block_size, 256);
    assert!(text.contains("block_size = 256"));
    Ok(())
}

#[test]
fn test_invalid_config_file_is_rejected() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("broken.toml");
    fs::write(&path, "[storage]\nbuffer_pool_size = 0\n")?;
    let path_arg = path.to_string_lossy().to_string();
    let cli = Cli::try_parse_from(["rustdb-query", "--config", path_arg.as_str(), "config"])
        .expect("arguments parse");
    assert!(cli.load_config().is_err());
    Ok(())
}

#[test]
fn test_demo_table_output() -> Result<()> {
    let cli = Cli::try_parse_from([
        "rustdb-query",
        "demo",
        "--query",
        "graduation_years",
        "--strategy",
        "hash",
    ])
    .expect("arguments parse");
    let mut out = Vec::new();
    cli.execute(&EngineConfig::default(), &mut out)?;
    let text = String::from_utf8(out).expect("utf-8 output");
    assert!(text.starts_with("-- graduation_years: select distinct gradyear from student"));
    assert!(text.contains("(4 rows)"));
    Ok(())
}

#[test]
fn test_explain_json_output() -> Result<()> {
    let cli = Cli::try_parse_from([
        "rustdb-query",
        "--format",
        "json",
        "explain",
        "--query",
        "students_with_departments",
        "--policy",
        "product_only",
    ])
    .expect("arguments parse");
    let mut out = Vec::new();
    cli.execute(&EngineConfig::default(), &mut out)?;
    let report: serde_json::Value = serde_json::from_slice(&out)?;
    let plan = report[0]["plan"].as_array().cloned().unwrap_or_default();
    assert!(plan
        .iter()
        .any(|line| line.as_str().is_some_and(|l| l.contains("MultibufferProduct"))));
    Ok(())
}
