//! Corpus build pipeline.
//!
//! Orchestrates discovery, classification, extraction, generation and
//! validation. Each project is processed independently into an immutable
//! outcome; outcomes are merged once at the end, so a failing project can
//! never corrupt another project's results.

pub mod discovery;
pub mod extractor;
pub mod generator;
pub mod navigation;
pub mod sanitizer;

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use crate::classifier::{self, DocCategory};
use crate::config::{Config, LimitsConfig, ProjectDescriptor};
use crate::pipeline::generator::{GeneratedDocument, Generator};
use crate::pipeline::navigation::{NavigationBuilder, NavigationTree};
use crate::validator::{self, CorpusValidator, Severity, ValidationIssue};

/// A source file after classification and extraction.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Absolute path on disk.
    pub path: PathBuf,
    /// Path relative to the project root.
    pub rel_path: String,
    pub category: DocCategory,
    pub preamble: HashMap<String, String>,
    pub fragments: Vec<String>,
    /// File content with any preamble stripped.
    pub body: String,
    pub size: u64,
    /// Filesystem modification time, when the platform reports one.
    pub modified: Option<SystemTime>,
}

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Run the full pipeline including pre-publication checks, but write
    /// nothing and skip the on-disk corpus validation.
    pub dry_run: bool,
    /// Overrides the configured output directory.
    pub out_dir: Option<PathBuf>,
    /// Pins `last_updated` and the summary date for deterministic output.
    pub date: Option<NaiveDate>,
}

/// Per-project partial result. Merged exactly once, after every project has
/// been processed.
struct ProjectOutcome {
    project_id: String,
    group: String,
    documents: Vec<GeneratedDocument>,
    issues: Vec<ValidationIssue>,
    files_scanned: usize,
    category_counts: BTreeMap<String, usize>,
}

#[derive(Debug, Serialize)]
pub struct CorpusSummary {
    pub generated_at: String,
    pub projects: usize,
    pub files_scanned: usize,
    pub documents: usize,
    pub synthetic_documents: usize,
    pub errors: usize,
    pub warnings: usize,
    pub category_counts: BTreeMap<String, usize>,
    pub project_file_counts: BTreeMap<String, usize>,
}

pub struct RunReport {
    pub summary: CorpusSummary,
    pub navigation: NavigationTree,
    pub issues: Vec<ValidationIssue>,
}

impl RunReport {
    /// True when no error-severity issue was recorded anywhere in the run.
    pub fn passed(&self) -> bool {
        validator::passed(&self.issues)
    }
}

/// Build the corpus: discover projects, generate documents, write the
/// navigation manifest and summary, then validate the published corpus.
pub async fn run(config: &Config, opts: &RunOptions) -> Result<RunReport> {
    let out_dir = opts
        .out_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.output_dir));
    let date = opts.date.unwrap_or_else(|| chrono::Local::now().date_naive());

    let (projects, mut issues) = discovery::discover(config).await;

    let mut outcomes = Vec::new();
    for descriptor in &projects {
        match process_project(descriptor, config, &out_dir, opts, date).await {
            Ok(outcome) => outcomes.push(outcome),
            Err(err) => {
                warn!("Project '{}' failed: {:#}", descriptor.id, err);
                issues.push(ValidationIssue::error(
                    "pipeline/project-failed",
                    &descriptor.id,
                    format!("{:#}", err),
                ));
            }
        }
    }

    // Merge the per-project partials in one pass.
    let mut nav_builder = NavigationBuilder::new();
    let mut category_counts = BTreeMap::new();
    let mut project_file_counts = BTreeMap::new();
    let mut files_scanned = 0usize;
    let mut documents = 0usize;
    let mut synthetic_documents = 0usize;

    for outcome in outcomes {
        nav_builder.add_project(&outcome.group, &outcome.documents);
        files_scanned += outcome.files_scanned;
        documents += outcome.documents.len();
        synthetic_documents += outcome.documents.iter().filter(|d| d.synthetic).count();
        for (category, count) in outcome.category_counts {
            *category_counts.entry(category).or_insert(0) += count;
        }
        project_file_counts.insert(outcome.project_id.clone(), outcome.files_scanned);
        issues.extend(outcome.issues);
    }
    let navigation = nav_builder.build();

    if !opts.dry_run {
        tokio::fs::create_dir_all(&out_dir)
            .await
            .with_context(|| format!("Failed to create {}", out_dir.display()))?;
        write_json(&out_dir.join("navigation.json"), &navigation).await?;

        let corpus_validator = CorpusValidator::new(&out_dir);
        issues.extend(corpus_validator.validate(&navigation).await?);
    }

    let summary = CorpusSummary {
        generated_at: date.format("%Y-%m-%d").to_string(),
        projects: projects.len(),
        files_scanned,
        documents,
        synthetic_documents,
        errors: issues.iter().filter(|i| i.severity == Severity::Error).count(),
        warnings: issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
            .count(),
        category_counts,
        project_file_counts,
    };

    if !opts.dry_run {
        write_json(&out_dir.join("summary.json"), &summary).await?;
    }

    info!(
        "Corpus build finished: {} documents across {} projects, {} errors, {} warnings",
        summary.documents, summary.projects, summary.errors, summary.warnings
    );
    Ok(RunReport {
        summary,
        navigation,
        issues,
    })
}

async fn process_project(
    descriptor: &ProjectDescriptor,
    config: &Config,
    out_dir: &PathBuf,
    opts: &RunOptions,
    date: NaiveDate,
) -> Result<ProjectOutcome> {
    let paths = discovery::list_files(descriptor, &config.scan).await?;
    let root = PathBuf::from(&descriptor.source_path);

    let mut files = Vec::new();
    let mut issues = Vec::new();
    let mut category_counts: BTreeMap<String, usize> = BTreeMap::new();

    for path in &paths {
        match read_source_file(path, &root, &config.limits).await {
            Ok(file) => {
                *category_counts
                    .entry(file.category.as_str().to_string())
                    .or_insert(0) += 1;
                files.push(file);
            }
            Err(issue) => issues.push(issue),
        }
    }

    let mut generator =
        Generator::new(descriptor.clone(), out_dir.clone()).with_dry_run(opts.dry_run);
    generator = generator.with_date(date);
    let (documents, generation_issues) = generator.generate(&files).await?;
    issues.extend(generation_issues);

    Ok(ProjectOutcome {
        project_id: descriptor.id.clone(),
        group: descriptor.display_name().to_string(),
        documents,
        issues,
        files_scanned: files.len(),
        category_counts,
    })
}

/// Read, classify and extract a single candidate file. Unreadable or
/// oversized files come back as a warning issue, never an error.
async fn read_source_file(
    path: &Path,
    root: &Path,
    limits: &LimitsConfig,
) -> std::result::Result<SourceFile, ValidationIssue> {
    let rel_path = crate::util::rel_display(path, root);

    let metadata = tokio::fs::metadata(path).await.map_err(|err| {
        ValidationIssue::warning("read/unreadable", &rel_path, format!("cannot stat file: {}", err))
    })?;
    if metadata.len() > limits.max_file_bytes {
        return Err(ValidationIssue::warning(
            "read/oversized",
            &rel_path,
            format!(
                "file is {} bytes, limit is {}",
                metadata.len(),
                limits.max_file_bytes
            ),
        ));
    }

    let content = tokio::fs::read_to_string(path).await.map_err(|err| {
        ValidationIssue::warning("read/unreadable", &rel_path, format!("cannot read file: {}", err))
    })?;

    let category = classifier::classify(path, Some(&content));
    let extraction = extractor::extract(
        &content,
        category == DocCategory::Code,
        limits.min_fragment_len,
    );

    Ok(SourceFile {
        path: path.to_path_buf(),
        rel_path,
        category,
        preamble: extraction.preamble,
        fragments: extraction.fragments,
        body: extraction.body,
        size: metadata.len(),
        modified: metadata.modified().ok(),
    })
}

async fn write_json<T: Serialize>(path: &PathBuf, value: &T) -> Result<()> {
    let mut json = serde_json::to_string_pretty(value)
        .with_context(|| format!("Failed to serialize {}", path.display()))?;
    json.push('\n');
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
