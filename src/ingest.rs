//! Index build orchestration.
//!
//! Coordinates the build flow: CSV exports → raw rows → merged course
//! index → JSON document at `index.path`. Malformed rows are dropped and
//! only counted.

use anyhow::{bail, Result};
use std::path::PathBuf;
use tracing::info;

use crate::config::Config;
use crate::connector_csv;
use crate::index::CourseIndex;

pub fn run_build(config: &Config, inputs: &[PathBuf], dry_run: bool) -> Result<()> {
    let scan = if inputs.is_empty() {
        connector_csv::scan_exports(config)?
    } else {
        connector_csv::scan_files(inputs)?
    };

    if scan.files.is_empty() {
        bail!(
            "No CSV exports found under {} (include_globs: {:?})",
            config.catalog.root.display(),
            config.catalog.include_globs
        );
    }

    let files = scan.files.len();
    let (index, stats) = CourseIndex::from_scan(scan);

    info!(
        files,
        rows = stats.rows,
        courses = stats.courses,
        dropped = stats.dropped,
        "index build finished"
    );

    if dry_run {
        println!("build (dry-run)");
    } else {
        index.save(&config.index.path)?;
        println!("build");
    }
    println!("  files: {}", files);
    println!("  rows: {}", stats.rows);
    println!("  courses: {}", stats.courses);
    println!("  dropped rows: {}", stats.dropped);
    if !dry_run {
        println!("  written: {}", config.index.path.display());
    }
    println!("ok");

    Ok(())
}
