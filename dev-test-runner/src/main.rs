//! Runs the golden fixtures and prints a pass/fail table.
//!
//! usage: dev-test-runner [FIXTURES_GLOB]   (default: fixtures/*/input.json)
use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use schemabind::{NamingConfig, compile_value};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

enum Outcome {
    Pass,
    Fail(String),
}

fn read_json(path: &Path) -> Result<Value> {
    let src = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&src).with_context(|| format!("failed to parse {}", path.display()))
}

fn run_case(dir: &Path) -> Result<Outcome> {
    let input = read_json(&dir.join("input.json"))?;
    let result = compile_value(&input, &NamingConfig::default());

    let error_file = dir.join("error.txt");
    if error_file.is_file() {
        let want = std::fs::read_to_string(&error_file)?.trim().to_string();
        return Ok(match result {
            Err(err) if err.kind() == want => Outcome::Pass,
            Err(err) => Outcome::Fail(format!("expected {want}, got {}: {err}", err.kind())),
            Ok(_) => Outcome::Fail(format!("expected {want}, compiled successfully")),
        });
    }

    let expected = read_json(&dir.join("expected.json"))?;
    Ok(match result {
        Err(err) => Outcome::Fail(format!("unexpected error: {err}")),
        Ok(schema) if schema.to_json()? == expected => Outcome::Pass,
        Ok(schema) => Outcome::Fail(format!(
            "schema mismatch\n--- expected\n{}\n--- actual\n{}",
            serde_json::to_string_pretty(&expected)?,
            schema.to_json_pretty()?
        )),
    })
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let pattern = std::env::args().nth(1).unwrap_or_else(|| "fixtures/*/input.json".to_string());
    let mut inputs = glob::glob(&pattern)?.collect::<Result<Vec<_>, _>>()?;
    inputs.sort();

    let mut failed = 0usize;
    for input in &inputs {
        let Some(dir) = input.parent() else { continue };
        let case = dir.file_name().map(|s| s.to_string_lossy().to_string()).unwrap_or_default();
        match run_case(dir)? {
            Outcome::Pass => eprintln!("{} {case}", "✅ pass".green()),
            Outcome::Fail(why) => {
                failed += 1;
                eprintln!("{} {case}\n{why}", "❌ fail".red());
            }
        }
    }

    eprintln!("—— {} cases, {} failed ——", inputs.len(), failed);
    if failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}
