//! Document generation.
//!
//! For each document type a project requests, picks the best-matching source
//! file (by category preference), sanitizes its body, and assembles a
//! frontmatter-led document. When no source matches, a synthetic fallback
//! document is generated so the requested page always exists. Every assembled
//! document is pre-checked against the syntax rules before it is written;
//! a failing document is rejected, never published.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::classifier::DocCategory;
use crate::config::{DocumentType, ProjectDescriptor};
use crate::pipeline::sanitizer::{sanitize, sanitize_inline};
use crate::pipeline::SourceFile;
use crate::util::truncate_str;
use crate::validator::{self, Severity, ValidationIssue};

const MAX_DESCRIPTION_LEN: usize = 160;
const MAX_SYNTHETIC_FRAGMENTS: usize = 3;

/// A fully assembled document, written (or about to be written) under the
/// corpus output directory.
#[derive(Debug, Clone)]
pub struct GeneratedDocument {
    pub project_id: String,
    pub doc_type: DocumentType,
    pub title: String,
    pub description: String,
    /// Path relative to the corpus root, e.g. `p1/readme.mdx`.
    pub rel_path: String,
    pub category: DocCategory,
    /// True when no source file matched and a fallback template was used.
    pub synthetic: bool,
    pub content: String,
}

pub struct Generator {
    project: ProjectDescriptor,
    out_dir: PathBuf,
    date: NaiveDate,
    dry_run: bool,
}

impl Generator {
    pub fn new(project: ProjectDescriptor, out_dir: PathBuf) -> Self {
        Self {
            project,
            out_dir,
            date: chrono::Local::now().date_naive(),
            dry_run: false,
        }
    }

    /// Pin the `last_updated` date. Generation is deterministic for a fixed
    /// date and input set.
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = date;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Generate one document per requested type. Rejected documents are
    /// reported as issues and skipped; the rest of the project proceeds.
    pub async fn generate(
        &self,
        files: &[SourceFile],
    ) -> Result<(Vec<GeneratedDocument>, Vec<ValidationIssue>)> {
        let mut documents = Vec::new();
        let mut issues = Vec::new();

        for doc_type in &self.project.document_types {
            let document = match self.best_match(*doc_type, files) {
                Some(source) => self.from_source(*doc_type, source),
                None => {
                    debug!(
                        "Project '{}': no source for {}, using synthetic fallback",
                        self.project.id, doc_type
                    );
                    self.synthetic(*doc_type, files)
                }
            };

            let syntax_issues = validator::check_syntax(&document.content, &document.rel_path);
            if syntax_issues.iter().any(|i| i.severity == Severity::Error) {
                warn!(
                    "Rejecting {}: failed pre-publication syntax check",
                    document.rel_path
                );
                issues.push(ValidationIssue::error(
                    "generator/rejected",
                    &document.rel_path,
                    format!("document failed pre-publication syntax check ({} issues)", syntax_issues.len()),
                ));
                issues.extend(syntax_issues);
                continue;
            }
            // Accepted documents are re-checked by the corpus validator, which
            // owns warning reporting. A dry run skips that pass, so surface
            // pre-check warnings here instead.
            if self.dry_run {
                issues.extend(syntax_issues);
            }

            if !self.dry_run {
                self.write(&document).await?;
            }
            documents.push(document);
        }

        info!(
            "Project '{}': generated {} documents ({} synthetic)",
            self.project.id,
            documents.len(),
            documents.iter().filter(|d| d.synthetic).count()
        );
        Ok((documents, issues))
    }

    /// Pick the best source for a document type: walk the type's category
    /// preference list in order, and within a category prefer the shallowest
    /// path, then lexicographic order.
    fn best_match<'a>(&self, doc_type: DocumentType, files: &'a [SourceFile]) -> Option<&'a SourceFile> {
        for category in doc_type.source_categories() {
            let mut candidates: Vec<&SourceFile> = files
                .iter()
                .filter(|f| f.category == *category)
                .collect();
            if candidates.is_empty() {
                continue;
            }
            candidates.sort_by_key(|f| (f.rel_path.matches('/').count(), f.rel_path.clone()));
            return Some(candidates[0]);
        }
        None
    }

    fn from_source(&self, doc_type: DocumentType, source: &SourceFile) -> GeneratedDocument {
        let body = sanitize(&source.body);

        let title = source
            .preamble
            .get("title")
            .map(|t| sanitize_inline(t))
            .filter(|t| !t.is_empty())
            .or_else(|| first_heading(&body))
            .unwrap_or_else(|| self.default_title(doc_type));

        let description = source
            .preamble
            .get("description")
            .map(|d| sanitize_inline(d))
            .filter(|d| !d.is_empty())
            .or_else(|| first_paragraph(&body))
            .unwrap_or_else(|| self.default_description(doc_type));

        let tags = source.preamble.get("tags").map(|t| sanitize_inline(t));

        self.assemble(
            doc_type,
            title,
            description,
            body,
            Some(source.rel_path.clone()),
            tags,
            false,
        )
    }

    fn synthetic(&self, doc_type: DocumentType, files: &[SourceFile]) -> GeneratedDocument {
        let title = self.default_title(doc_type);
        let description = self.default_description(doc_type);
        let mut body = synthetic_body(doc_type, self.project.display_name());

        let fragments: Vec<&str> = files
            .iter()
            .flat_map(|f| f.fragments.iter())
            .map(|f| f.as_str())
            .take(MAX_SYNTHETIC_FRAGMENTS)
            .collect();
        if !fragments.is_empty() {
            body.push_str("\n## Notes\n");
            for fragment in fragments {
                body.push('\n');
                body.push_str(fragment);
                body.push('\n');
            }
        }

        self.assemble(doc_type, title, description, sanitize(&body), None, None, true)
    }

    #[allow(clippy::too_many_arguments)]
    fn assemble(
        &self,
        doc_type: DocumentType,
        title: String,
        description: String,
        body: String,
        source_file: Option<String>,
        tags: Option<String>,
        synthetic: bool,
    ) -> GeneratedDocument {
        let category = doc_type.category();
        let rel_path = format!("{}/{}", self.project.id, doc_type.file_name());

        let mut content = String::new();
        content.push_str("---\n");
        content.push_str(&format!("title: {}\n", title));
        content.push_str(&format!("description: {}\n", description));
        content.push_str(&format!("category: {}\n", category));
        content.push_str(&format!("project: {}\n", self.project.id));
        content.push_str(&format!("tags: {}\n", tags.unwrap_or_else(|| self.project.category.clone())));
        content.push_str(&format!("last_updated: {}\n", self.date.format("%Y-%m-%d")));
        if let Some(source) = &source_file {
            content.push_str(&format!("source_file: {}\n", source));
        }
        content.push_str("---\n\n");
        content.push_str(body.trim_start_matches('\n'));
        if !content.ends_with('\n') {
            content.push('\n');
        }

        GeneratedDocument {
            project_id: self.project.id.clone(),
            doc_type,
            title,
            description,
            rel_path,
            category,
            synthetic,
            content,
        }
    }

    fn default_title(&self, doc_type: DocumentType) -> String {
        match doc_type {
            DocumentType::Introduction | DocumentType::Readme => {
                self.project.display_name().to_string()
            }
            other => format!("{} {}", self.project.display_name(), human_name(other)),
        }
    }

    fn default_description(&self, doc_type: DocumentType) -> String {
        format!(
            "{} documentation for {}.",
            human_name(doc_type),
            self.project.display_name()
        )
    }

    async fn write(&self, document: &GeneratedDocument) -> Result<()> {
        let path = self.out_dir.join(&document.rel_path);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        tokio::fs::write(&path, &document.content)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        debug!("Wrote {}", path.display());
        Ok(())
    }
}

fn human_name(doc_type: DocumentType) -> &'static str {
    match doc_type {
        DocumentType::Introduction => "Introduction",
        DocumentType::Readme => "Overview",
        DocumentType::Quickstart => "Quickstart",
        DocumentType::Guide => "Guide",
        DocumentType::Architecture => "Architecture",
        DocumentType::ApiReference => "API Reference",
        DocumentType::Development => "Development",
        DocumentType::Deployment => "Deployment",
        DocumentType::Security => "Security",
        DocumentType::Migration => "Migration",
        DocumentType::Changelog => "Changelog",
    }
}

/// First ATX heading text in the body, cleaned for frontmatter use.
fn first_heading(body: &str) -> Option<String> {
    body.lines()
        .map(str::trim_start)
        .find(|line| line.starts_with('#'))
        .map(|line| sanitize_inline(line.trim_start_matches('#').trim()))
        .filter(|t| !t.is_empty())
}

/// First non-heading prose line, truncated to description length.
fn first_paragraph(body: &str) -> Option<String> {
    let mut in_code_block = false;
    for line in body.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("```") {
            in_code_block = !in_code_block;
            continue;
        }
        if in_code_block || trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let cleaned = sanitize_inline(trimmed);
        if cleaned.is_empty() {
            continue;
        }
        return Some(truncate_str(&cleaned, MAX_DESCRIPTION_LEN).to_string());
    }
    None
}

fn synthetic_body(doc_type: DocumentType, project_name: &str) -> String {
    match doc_type {
        DocumentType::Introduction | DocumentType::Readme => format!(
            "# {name}\n\n\
             Documentation for {name} has not been written yet. This page was \
             generated as a placeholder from the project's configuration.\n",
            name = project_name
        ),
        DocumentType::Quickstart => format!(
            "# Quickstart\n\n\
             A quickstart guide for {} is not available yet. Check the project \
             overview for current setup instructions.\n",
            project_name
        ),
        DocumentType::Guide => format!(
            "# Guide\n\n\
             No usage guide exists for {} yet. The overview page covers the \
             basics until one is written.\n",
            project_name
        ),
        DocumentType::Architecture => format!(
            "# Architecture\n\n\
             No architecture documentation was found for {}. This placeholder \
             marks where the design overview belongs.\n",
            project_name
        ),
        DocumentType::ApiReference => format!(
            "# API Reference\n\n\
             {} does not publish an API reference yet.\n",
            project_name
        ),
        DocumentType::Development => format!(
            "# Development\n\n\
             Contributor documentation for {} has not been written. See the \
             project repository for build instructions.\n",
            project_name
        ),
        DocumentType::Deployment => format!(
            "# Deployment\n\n\
             Deployment documentation for {} is not available yet.\n",
            project_name
        ),
        DocumentType::Security => format!(
            "# Security\n\n\
             {} has no published security policy. Report issues through the \
             project's standard contact channel.\n",
            project_name
        ),
        DocumentType::Migration => format!(
            "# Migration\n\n\
             No migration notes exist for {} yet.\n",
            project_name
        ),
        DocumentType::Changelog => format!(
            "# Changelog\n\n\
             {} does not maintain a changelog in its repository.\n",
            project_name
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn project(id: &str, types: Vec<DocumentType>) -> ProjectDescriptor {
        ProjectDescriptor {
            id: id.to_string(),
            name: Some("Test Project".to_string()),
            source_path: "/tmp/unused".to_string(),
            category: "general".to_string(),
            priority: 100,
            document_types: types,
            include_globs: Vec::new(),
            skip_patterns: Vec::new(),
        }
    }

    fn source(rel_path: &str, category: DocCategory, body: &str) -> SourceFile {
        SourceFile {
            path: PathBuf::from(rel_path),
            rel_path: rel_path.to_string(),
            category,
            preamble: HashMap::new(),
            fragments: Vec::new(),
            body: body.to_string(),
            size: body.len() as u64,
            modified: None,
        }
    }

    fn generator(project: ProjectDescriptor, dir: &TempDir) -> Generator {
        Generator::new(project, dir.path().to_path_buf())
            .with_date(NaiveDate::from_ymd_opt(2026, 3, 14).unwrap())
    }

    #[tokio::test]
    async fn test_source_backed_document() {
        let dir = TempDir::new().unwrap();
        let gen = generator(project("p1", vec![DocumentType::Readme]), &dir);
        let files = vec![source(
            "README.md",
            DocCategory::Readme,
            "# My Library\n\nA small library for testing.\n",
        )];

        let (docs, issues) = gen.generate(&files).await.unwrap();
        assert!(issues.is_empty());
        assert_eq!(docs.len(), 1);
        assert!(!docs[0].synthetic);
        assert_eq!(docs[0].title, "My Library");
        assert_eq!(docs[0].description, "A small library for testing.");
        assert_eq!(docs[0].rel_path, "p1/readme.mdx");
        assert!(docs[0].content.starts_with("---\ntitle: My Library\n"));
        assert!(docs[0].content.contains("last_updated: 2026-03-14"));
        assert!(docs[0].content.contains("source_file: README.md"));
        assert!(dir.path().join("p1/readme.mdx").exists());
    }

    #[tokio::test]
    async fn test_synthetic_fallback_when_no_source() {
        let dir = TempDir::new().unwrap();
        let gen = generator(project("p1", vec![DocumentType::Architecture]), &dir);

        let (docs, issues) = gen.generate(&[]).await.unwrap();
        assert!(issues.is_empty());
        assert_eq!(docs.len(), 1);
        assert!(docs[0].synthetic);
        assert!(docs[0].content.contains("# Architecture"));
        assert!(!docs[0].content.contains("source_file:"));
    }

    #[tokio::test]
    async fn test_best_match_prefers_shallower_path() {
        let dir = TempDir::new().unwrap();
        let gen = generator(project("p1", vec![DocumentType::Readme]), &dir);
        let files = vec![
            source("docs/sub/README.md", DocCategory::Readme, "# Deep\n"),
            source("README.md", DocCategory::Readme, "# Root\n"),
        ];

        let (docs, _) = gen.generate(&files).await.unwrap();
        assert_eq!(docs[0].title, "Root");
    }

    #[tokio::test]
    async fn test_category_preference_order() {
        let dir = TempDir::new().unwrap();
        let gen = generator(project("p1", vec![DocumentType::ApiReference]), &dir);
        let files = vec![
            source("openapi.yaml.md", DocCategory::ApiSpec, "# Spec\n"),
            source("docs/api-reference.md", DocCategory::ApiReference, "# Ref\n"),
        ];

        let (docs, _) = gen.generate(&files).await.unwrap();
        assert_eq!(docs[0].title, "Ref");
    }

    #[tokio::test]
    async fn test_preamble_wins_over_heading() {
        let dir = TempDir::new().unwrap();
        let gen = generator(project("p1", vec![DocumentType::Readme]), &dir);
        let mut file = source("README.md", DocCategory::Readme, "# Heading Title\n\nBody.\n");
        file.preamble.insert("title".to_string(), "Preamble Title".to_string());
        file.preamble
            .insert("description".to_string(), "From the preamble.".to_string());

        let (docs, _) = gen.generate(&[file]).await.unwrap();
        assert_eq!(docs[0].title, "Preamble Title");
        assert_eq!(docs[0].description, "From the preamble.");
    }

    #[tokio::test]
    async fn test_body_is_sanitized() {
        let dir = TempDir::new().unwrap();
        let gen = generator(project("p1", vec![DocumentType::Readme]), &dir);
        let files = vec![source(
            "README.md",
            DocCategory::Readme,
            "# Doc\n\nexpr {n * 3} and an {open one\n",
        )];

        let (docs, issues) = gen.generate(&files).await.unwrap();
        assert_eq!(docs.len(), 1);
        assert!(issues.is_empty());
        assert!(docs[0].content.contains("{/* expr */}"));
        assert!(docs[0].content.contains("&#123;open"));
    }

    #[tokio::test]
    async fn test_dry_run_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let gen = generator(project("p1", vec![DocumentType::Readme]), &dir).with_dry_run(true);
        let files = vec![source("README.md", DocCategory::Readme, "# Doc\n\nBody.\n")];

        let (docs, _) = gen.generate(&files).await.unwrap();
        assert_eq!(docs.len(), 1);
        assert!(!dir.path().join("p1").exists());
    }

    #[tokio::test]
    async fn test_synthetic_includes_code_fragments() {
        let dir = TempDir::new().unwrap();
        let gen = generator(project("p1", vec![DocumentType::Guide]), &dir);
        let mut file = source("src/lib.rs", DocCategory::Code, "fn main() {}\n");
        file.fragments = vec![
            "This crate wraps the widget service behind a typed client.".to_string(),
        ];

        let (docs, _) = gen.generate(&[file]).await.unwrap();
        assert!(docs[0].synthetic);
        assert!(docs[0].content.contains("## Notes"));
        assert!(docs[0].content.contains("typed client"));
    }

    #[tokio::test]
    async fn test_generated_documents_pass_syntax_check() {
        let dir = TempDir::new().unwrap();
        let types = vec![
            DocumentType::Readme,
            DocumentType::Quickstart,
            DocumentType::Architecture,
            DocumentType::Changelog,
        ];
        let gen = generator(project("p1", types), &dir);

        let (docs, issues) = gen.generate(&[]).await.unwrap();
        assert_eq!(docs.len(), 4);
        assert!(issues.is_empty());
        for doc in &docs {
            let found = crate::validator::check_syntax(&doc.content, &doc.rel_path);
            assert!(found.is_empty(), "{}: {:?}", doc.rel_path, found);
        }
    }

    #[tokio::test]
    async fn test_precheck_warnings_deferred_to_corpus_validation() {
        let dir = TempDir::new().unwrap();
        // Empty link text is a warning, not a rejection
        let files = vec![source(
            "README.md",
            DocCategory::Readme,
            "# Doc\n\nSee [](./other.md) for details.\n",
        )];

        let gen = generator(project("p1", vec![DocumentType::Readme]), &dir);
        let (docs, issues) = gen.generate(&files).await.unwrap();
        assert_eq!(docs.len(), 1);
        // Written corpus gets validated separately; no duplicate report here
        assert!(issues.is_empty(), "unexpected issues: {:?}", issues);

        let dry_dir = TempDir::new().unwrap();
        let dry = generator(project("p1", vec![DocumentType::Readme]), &dry_dir)
            .with_dry_run(true);
        let (_, dry_issues) = dry.generate(&files).await.unwrap();
        assert_eq!(
            dry_issues
                .iter()
                .filter(|i| i.rule == "syntax/empty-link-text")
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn test_deterministic_for_fixed_date() {
        let dir_a = TempDir::new().unwrap();
        let dir_b = TempDir::new().unwrap();
        let files = vec![source("README.md", DocCategory::Readme, "# Doc\n\nBody.\n")];

        let gen_a = generator(project("p1", vec![DocumentType::Readme]), &dir_a);
        let gen_b = generator(project("p1", vec![DocumentType::Readme]), &dir_b);
        let (docs_a, _) = gen_a.generate(&files).await.unwrap();
        let (docs_b, _) = gen_b.generate(&files).await.unwrap();

        assert_eq!(docs_a[0].content, docs_b[0].content);
    }
}
