use anyhow::Result;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs::File;
use std::io::Write;
use tempfile::{tempdir, TempDir};

fn write_customers(dir: &TempDir) -> Result<std::path::PathBuf> {
    let path = dir.path().join("customers.json");
    let mut file = File::create(&path)?;
    writeln!(
        file,
        r#"[
            {{"name": "Acme Corp", "city": "Atlanta", "state": "GA", "sector": "Financial Services",
              "revenue_2024": 50000, "revenue_2023": 40000, "products": {{"mq": true}}}},
            {{"name": "Globex", "city": "Johns Creek", "state": "GA", "sector": "Retail",
              "revenue_2024": 20000, "products": {{"cics": true}}}}
        ]"#
    )?;
    Ok(path)
}

fn cli(dir: &TempDir) -> Result<Command> {
    let mut cmd = Command::cargo_bin("custscout-cli")?;
    cmd.current_dir(dir.path()).env_remove("RUST_LOG");
    Ok(cmd)
}

#[test]
fn test_interactive_session_from_pipe() -> Result<()> {
    let temp_dir = tempdir()?;
    let data = write_customers(&temp_dir)?;

    cli(&temp_dir)?
        .args(["--no-color", "--data", data.to_str().unwrap(), "interactive"])
        .write_stdin("city:Atlanta\nwho uses cics\nEXIT\ncity:Johns Creek\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Loaded 2 customer records."))
        .stdout(predicate::str::contains("1. Acme Corp"))
        .stdout(predicate::str::contains("1. Globex"))
        .stdout(predicate::str::contains("Found 1 customer matching the criteria.").count(2));
    Ok(())
}

#[test]
fn test_interactive_is_default_command() -> Result<()> {
    let temp_dir = tempdir()?;
    let data = write_customers(&temp_dir)?;

    cli(&temp_dir)?
        .args(["--no-color", "--data", data.to_str().unwrap()])
        .write_stdin("help\ncity:Marietta\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Example queries:"))
        .stdout(predicate::str::contains(
            "No customers found matching the criteria.",
        ));
    Ok(())
}
