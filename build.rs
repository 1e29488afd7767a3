use anyhow::{Context, Result};
use chrono::TimeZone;
use std::env;
use std::fs;
use std::process::Command;
use vergen_gitcl::{Emitter, GitclBuilder};

fn main() -> Result<()> {
    // Generate git information
    let gitcl = GitclBuilder::default()
        .describe(true, true, Some("[0-9]*"))
        .build()?;

    let gitcl_res = Emitter::default()
        .idempotent()
        .fail_on_error()
        .add_instructions(&gitcl)
        .and_then(|emitter| emitter.emit());

    if let Err(e) = gitcl_res {
        eprintln!("error occurred while generating instructions: {e:?}");
        Emitter::default().idempotent().fail_on_error().emit()?;
    }

    // Add build timestamp
    let now = match env::var("SOURCE_DATE_EPOCH") {
        Ok(val) => {
            let secs = val
                .parse::<i64>()
                .context("SOURCE_DATE_EPOCH is not an integer")?;
            chrono::Utc
                .timestamp_opt(secs, 0)
                .single()
                .context("SOURCE_DATE_EPOCH is out of range")?
        }
        Err(_) => chrono::Utc::now(),
    };

    println!(
        "cargo:rustc-env=BUILD_TIMESTAMP={}",
        now.format("%Y-%m-%d %H:%M:%S UTC")
    );

    // Get codecpar library version using cargo metadata
    let codecpar_version = get_codecpar_version_from_metadata().unwrap_or_else(|_| {
        read_codecpar_version_fallback().unwrap_or_else(|_| "unknown".to_string())
    });
    println!("cargo:rustc-env=CODECPAR_VERSION={codecpar_version}");

    println!("cargo:rerun-if-changed=codecpar/Cargo.toml");

    Ok(())
}

/// Get the codecpar version from cargo metadata (workspace member or registry dependency)
fn get_codecpar_version_from_metadata() -> Result<String> {
    let output = Command::new("cargo")
        .args(["metadata", "--format-version", "1"])
        .output()?;

    if !output.status.success() {
        anyhow::bail!("cargo metadata failed");
    }

    let metadata: serde_json::Value = serde_json::from_slice(&output.stdout)?;

    let packages = metadata["packages"].as_array().into_iter().flatten();
    for package in packages {
        if package["name"].as_str() == Some("codecpar") {
            if let Some(version) = package["version"].as_str() {
                return Ok(version.to_string());
            }
        }
    }

    anyhow::bail!("codecpar package not found in metadata");
}

/// Fallback: read the version line of codecpar/Cargo.toml
fn read_codecpar_version_fallback() -> Result<String> {
    let toml_content = fs::read_to_string("codecpar/Cargo.toml")?;

    for line in toml_content.lines() {
        let line = line.trim();
        if let Some(value) = line.strip_prefix("version") {
            if let Some(version) = value.trim_start().strip_prefix('=') {
                return Ok(version.trim().trim_matches('"').to_string());
            }
        }
    }

    anyhow::bail!("Could not find version in codecpar/Cargo.toml");
}
