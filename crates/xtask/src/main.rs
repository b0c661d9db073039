use std::fs;
use std::path::PathBuf;
use std::process::Command;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

mod codebase;

#[derive(Debug, Parser)]
#[command(name = "xtask", about = "Limelight maintainer tasks")]
struct Cli {
    #[command(subcommand)]
    command: Option<CommandName>,
}

#[derive(Debug, Subcommand)]
enum CommandName {
    /// Update default_config.toml by running `limelight config generate`.
    UpdateDefaultConfig,
    /// Generate codebase.txt with all source files.
    Codebase {
        /// Directories to include (defaults to the workspace source dirs)
        dirs: Vec<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(CommandName::UpdateDefaultConfig) {
        CommandName::UpdateDefaultConfig => update_default_config(),
        CommandName::Codebase { dirs } => codebase::run(dirs),
    }
}

/// Regenerates the checked-in default config from the Rust defaults, so the
/// template comments and the code never drift apart.
fn update_default_config() -> Result<()> {
    let root = project_root()?;
    let dest = root
        .join("crates")
        .join("limelight-core")
        .join("default_config.toml");

    let output = Command::new("cargo")
        .current_dir(&root)
        .arg("run")
        .arg("-p")
        .arg("limelight")
        .arg("--")
        .arg("config")
        .arg("generate")
        .output()
        .context("run `cargo run -p limelight -- config generate`")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("config generate failed: {}", stderr);
    }

    fs::write(&dest, &output.stdout)
        .with_context(|| format!("write config to {}", dest.display()))?;

    println!("Updated {}", dest.display());
    Ok(())
}

fn project_root() -> Result<PathBuf> {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let root = manifest_dir
        .parent()
        .and_then(|crates| crates.parent())
        .context("locate workspace root from CARGO_MANIFEST_DIR")?;
    Ok(root.to_path_buf())
}
