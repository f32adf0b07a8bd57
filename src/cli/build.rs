use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::info;

use crate::config::Config;
use crate::pipeline::{self, RunOptions};
use crate::validator::Severity;

/// Run a corpus build. Returns true when validation passed (no
/// error-severity issues).
pub async fn run(
    base_path: Option<String>,
    config_path: Option<String>,
    out: Option<String>,
    dry_run: bool,
) -> Result<bool> {
    let mut config = Config::load_with_path(config_path)?;

    if let Some(base) = base_path {
        info!("CLI override: base path = {}", base);
        rebase(&mut config, &base);
    }
    if let Some(out) = &out {
        info!("CLI override: output dir = {}", out);
    }
    if dry_run {
        info!("Dry run: no files will be written");
    }

    let opts = RunOptions {
        dry_run,
        out_dir: out.map(PathBuf::from),
        date: None,
    };
    let report = pipeline::run(&config, &opts).await?;

    print_report(&report);
    Ok(report.passed())
}

/// Apply a CLI base-path override: relative project source paths are
/// resolved against it, and it becomes the sole auto-detection root.
fn rebase(config: &mut Config, base: &str) {
    let base_path = Path::new(base);
    for project in &mut config.projects {
        if Path::new(&project.source_path).is_relative() {
            project.source_path = base_path.join(&project.source_path).display().to_string();
        }
    }
    config.scan.base_paths = vec![base.to_string()];
}

fn print_report(report: &pipeline::RunReport) {
    for issue in &report.issues {
        let tag = match issue.severity {
            Severity::Error => "ERROR",
            Severity::Warning => "WARN ",
        };
        println!("  {} [{}] {}: {}", tag, issue.rule, issue.location, issue.message);
    }

    let summary = &report.summary;
    println!();
    println!(
        "Corpus: {} documents ({} synthetic) from {} projects, {} files scanned",
        summary.documents, summary.synthetic_documents, summary.projects, summary.files_scanned
    );
    if summary.errors > 0 {
        println!("✗ Validation failed: {} error(s), {} warning(s)", summary.errors, summary.warnings);
    } else {
        println!("✓ Validation passed ({} warning(s))", summary.warnings);
    }
}
