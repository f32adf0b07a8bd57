//! Project discovery.
//!
//! Resolves configured project descriptors, or (legacy mode) walks base
//! directories one level deep looking for project indicators, and lists each
//! project's candidate files. A missing descriptor path is an error-severity
//! issue, never a fatal one; zero discovered projects yields an empty corpus.

use anyhow::Result;
use glob::Pattern;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::{Config, ProjectDescriptor, ScanConfig};
use crate::validator::ValidationIssue;

/// Resolve the configured (or auto-detected) projects, in order. Descriptors
/// with nonexistent paths are skipped with an issue; processing continues.
pub async fn discover(config: &Config) -> (Vec<ProjectDescriptor>, Vec<ValidationIssue>) {
    let mut issues = Vec::new();

    if !config.projects.is_empty() {
        let mut projects = Vec::new();
        for descriptor in &config.projects {
            let exists = tokio::fs::try_exists(&descriptor.source_path)
                .await
                .unwrap_or(false);
            if !exists {
                warn!(
                    "Skipping project '{}': source path {} does not exist",
                    descriptor.id, descriptor.source_path
                );
                issues.push(ValidationIssue::error(
                    "discovery/missing-path",
                    &descriptor.source_path,
                    format!(
                        "project '{}' source path does not exist",
                        descriptor.id
                    ),
                ));
                continue;
            }
            projects.push(descriptor.clone());
        }
        info!("Discovered {} configured projects", projects.len());
        return (projects, issues);
    }

    // Legacy mode: walk base paths one level, match on project indicators.
    let mut projects = Vec::new();
    for base in &config.scan.base_paths {
        let base_path = Path::new(base);
        let mut entries = match tokio::fs::read_dir(base_path).await {
            Ok(entries) => entries,
            Err(err) => {
                warn!("Skipping base path {}: {}", base, err);
                issues.push(ValidationIssue::error(
                    "discovery/missing-path",
                    base.as_str(),
                    format!("base scan path is not readable: {}", err),
                ));
                continue;
            }
        };

        let mut subdirs = Vec::new();
        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            if path.is_dir() {
                subdirs.push(path);
            }
        }
        // Deterministic directory-listing order
        subdirs.sort();

        for dir in subdirs {
            if !is_project_dir(&dir, &config.scan).await {
                continue;
            }
            let id = dir
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("unknown")
                .to_string();
            debug!("Auto-detected project '{}' at {}", id, dir.display());
            projects.push(ProjectDescriptor {
                id: id.clone(),
                name: None,
                source_path: dir.display().to_string(),
                category: "general".to_string(),
                priority: 100,
                document_types: config.scan.default_document_types.clone(),
                include_globs: crate::config::default_include_globs(),
                skip_patterns: Vec::new(),
            });
        }
    }

    info!("Auto-detected {} projects", projects.len());
    (projects, issues)
}

/// A subdirectory counts as a project when it carries any configured
/// indicator (manifest, README-like file, AI-context file, or docs dir).
async fn is_project_dir(dir: &Path, scan: &ScanConfig) -> bool {
    for indicator in &scan.indicator_files {
        if tokio::fs::try_exists(dir.join(indicator))
            .await
            .unwrap_or(false)
        {
            return true;
        }
    }
    false
}

/// List a project's candidate files: a depth-bounded walk filtered through
/// the descriptor's include globs and skip patterns, excluding configured
/// directory names. Returned paths are sorted for deterministic processing.
pub async fn list_files(descriptor: &ProjectDescriptor, scan: &ScanConfig) -> Result<Vec<PathBuf>> {
    let root = PathBuf::from(&descriptor.source_path);
    let include: Vec<Pattern> = compile_patterns(&descriptor.include_globs);
    let skip: Vec<Pattern> = compile_patterns(&descriptor.skip_patterns);

    let mut files = Vec::new();
    let mut stack = vec![(root.clone(), 0usize)];

    while let Some((dir, depth)) = stack.pop() {
        if depth > scan.max_depth {
            continue;
        }
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(err) => {
                warn!("Skipping unreadable directory {}: {}", dir.display(), err);
                continue;
            }
        };

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.is_dir() {
                let name = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or_default();
                if scan.exclude_dirs.iter().any(|d| d == name) {
                    continue;
                }
                stack.push((path, depth + 1));
                continue;
            }

            let rel = match path.strip_prefix(&root) {
                Ok(rel) => rel,
                Err(_) => continue,
            };
            if !include.iter().any(|p| p.matches_path(rel)) {
                continue;
            }
            if skip.iter().any(|p| p.matches_path(rel)) {
                continue;
            }
            files.push(path);
        }
    }

    files.sort();
    debug!(
        "Project '{}': {} candidate files",
        descriptor.id,
        files.len()
    );
    Ok(files)
}

fn compile_patterns(globs: &[String]) -> Vec<Pattern> {
    globs
        .iter()
        .filter_map(|g| match Pattern::new(g) {
            Ok(pattern) => Some(pattern),
            Err(err) => {
                warn!("Ignoring malformed glob '{}': {}", g, err);
                None
            }
        })
        .collect()
}
