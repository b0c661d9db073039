//! Concatenates the workspace sources into one reviewable text file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

const DEFAULT_DIRS: &[&str] = &[
    "docs",
    "crates/limelight-cli",
    "crates/limelight-core",
    "crates/limelight-tui",
    "crates/xtask",
];

const SKIP_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "ico", "svg", "pdf", "zip", "gz", "lock",
];
const SKIP_FILES: &[&str] = &["codebase.txt"];

/// Generates codebase.txt for the given directories (or the defaults).
pub fn run(dirs: Vec<String>) -> Result<()> {
    let root = std::env::current_dir()?;
    let output_path = root.join("codebase.txt");

    let dirs = if dirs.is_empty() {
        DEFAULT_DIRS.iter().map(|&d| d.to_string()).collect()
    } else {
        dirs
    };

    let mut files = Vec::new();
    for dir in &dirs {
        let path = root.join(dir);
        if !path.exists() {
            eprintln!("Warning: directory '{dir}' not found, skipping");
            continue;
        }
        collect(&path, &mut files)?;
    }
    files.sort();

    if files.is_empty() {
        anyhow::bail!("no files found under {dirs:?}");
    }

    let mut output = String::new();
    output.push_str("CODEBASE CONTENTS\n\nDirectories included:\n");
    for dir in &dirs {
        output.push_str(&format!("  - {dir}\n"));
    }
    output.push_str(&format!("\nTotal files: {}\n\n", files.len()));

    for path in &files {
        let Ok(content) = std::fs::read_to_string(path) else {
            eprintln!("Skipped {} (not utf-8)", path.display());
            continue;
        };
        let rel = path.strip_prefix(&root).unwrap_or(path);
        output.push_str(&"=".repeat(80));
        output.push_str(&format!("\nFILE: {}\n", rel.display()));
        output.push_str(&"=".repeat(80));
        output.push_str("\n\n");
        output.push_str(&content);
        output.push_str("\n\n");
    }

    std::fs::write(&output_path, &output)
        .with_context(|| format!("write {}", output_path.display()))?;

    println!(
        "Generated {} ({} files, {} bytes)",
        output_path.display(),
        files.len(),
        output.len()
    );
    Ok(())
}

fn collect(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(dir).with_context(|| format!("read {}", dir.display()))? {
        let path = entry?.path();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        if path.is_dir() {
            if name.starts_with('.') || name == "target" {
                continue;
            }
            collect(&path, files)?;
        } else if !skip(&path, &name) {
            files.push(path);
        }
    }
    Ok(())
}

fn skip(path: &Path, name: &str) -> bool {
    if SKIP_FILES.contains(&name) {
        return true;
    }
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| SKIP_EXTENSIONS.contains(&ext.as_str()))
}
