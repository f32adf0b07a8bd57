//! Corpus validator - independent final pass over the written corpus.
//!
//! Read-only: checks syntax, link/image integrity, frontmatter completeness
//! and navigation consistency, and never mutates the corpus. The syntax rule
//! family is also reused by the generator as a pre-write check.

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

use crate::pipeline::navigation::NavigationTree;
use crate::util::{is_external_target, strip_anchor};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Severity {
    #[default]
    Error, // Blocks publication
    Warning, // Reported, never blocks
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

impl FromStr for Severity {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "error" => Ok(Severity::Error),
            "warning" => Ok(Severity::Warning),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidationIssue {
    pub severity: Severity,
    /// `path` or `path:line` of the offending location.
    pub location: String,
    pub message: String,
    pub rule: String,
}

impl ValidationIssue {
    pub fn error(rule: &str, location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            location: location.into(),
            message: message.into(),
            rule: rule.to_string(),
        }
    }

    pub fn warning(rule: &str, location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            location: location.into(),
            message: message.into(),
            rule: rule.to_string(),
        }
    }
}

/// Overall result is "pass" iff no error-severity issue exists.
pub fn passed(issues: &[ValidationIssue]) -> bool {
    !issues.iter().any(|i| i.severity == Severity::Error)
}

static LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(!?)\[([^\]]*)\]\(([^)\s]*)(?:\s+[^)]*)?\)").unwrap());

static HEADING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s{0,3}(#{1,6})\s+(.*)$").unwrap());

/// Per-line marker of lines inside fenced code blocks and frontmatter.
/// Syntax and link rules never apply to those regions.
fn excluded_lines(content: &str) -> Vec<bool> {
    let lines: Vec<&str> = content.lines().collect();
    let mut excluded = Vec::with_capacity(lines.len());

    let mut in_frontmatter = false;
    let mut frontmatter_done = false;
    let mut in_code_block = false;

    for (idx, line) in lines.iter().enumerate() {
        let trimmed = line.trim();
        if !frontmatter_done && idx == 0 && trimmed == "---" {
            in_frontmatter = true;
            excluded.push(true);
            continue;
        }
        if in_frontmatter {
            excluded.push(true);
            if trimmed == "---" {
                in_frontmatter = false;
                frontmatter_done = true;
            }
            continue;
        }
        if trimmed.starts_with("```") {
            in_code_block = !in_code_block;
            excluded.push(true);
            continue;
        }
        excluded.push(in_code_block);
    }

    excluded
}

/// Syntax rule family. Pure function over document content; reused by the
/// generator as a pre-write check.
pub fn check_syntax(content: &str, location: &str) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let excluded = excluded_lines(content);

    for (idx, line) in content.lines().enumerate() {
        if excluded[idx] {
            continue;
        }
        let line_no = idx + 1;
        let at = format!("{}:{}", location, line_no);

        // Heading lines must not start with a digit
        if let Some(caps) = HEADING_RE.captures(line) {
            let text = caps.get(2).map(|m| m.as_str().trim()).unwrap_or_default();
            if text.starts_with(|c: char| c.is_ascii_digit()) {
                issues.push(ValidationIssue::error(
                    "syntax/digit-heading",
                    &at,
                    format!("heading starts with a digit: '{}'", text),
                ));
            }
        }

        // Inline-expression delimiters must pair up within the line
        let mut depth: i32 = 0;
        let mut unmatched_close = false;
        for ch in line.chars() {
            match ch {
                '{' => depth += 1,
                '}' => {
                    if depth == 0 {
                        unmatched_close = true;
                    } else {
                        depth -= 1;
                    }
                }
                _ => {}
            }
        }
        if depth != 0 || unmatched_close {
            issues.push(ValidationIssue::error(
                "syntax/unbalanced-expression",
                &at,
                "unbalanced inline-expression delimiter",
            ));
        }

        // Empty link text / target (plain links only; images have their own rules)
        for caps in LINK_RE.captures_iter(line) {
            let is_image = &caps[1] == "!";
            if is_image {
                continue;
            }
            let text = caps[2].trim();
            let target = caps[3].trim();
            if text.is_empty() {
                issues.push(ValidationIssue::warning(
                    "syntax/empty-link-text",
                    &at,
                    "link has empty text",
                ));
            }
            if target.is_empty() {
                issues.push(ValidationIssue::error(
                    "syntax/empty-link-target",
                    &at,
                    "link has empty target",
                ));
            }
        }
    }

    issues
}

/// Parse the key:value frontmatter block at the top of a document.
/// Lines that cannot be parsed as key:value are skipped.
pub fn parse_frontmatter(content: &str) -> HashMap<String, String> {
    let mut frontmatter = HashMap::new();

    let mut lines = content.lines();
    match lines.next() {
        Some(first) if first.trim() == "---" => {}
        _ => return frontmatter,
    }

    for line in lines {
        if line.trim() == "---" {
            break;
        }
        if let Some((key, value)) = line.split_once(':') {
            let key = key.trim();
            if !key.is_empty() {
                frontmatter.insert(key.to_string(), value.trim().to_string());
            }
        }
    }

    frontmatter
}

/// Validates the written corpus and its navigation tree. Never touches
/// source projects and never writes.
pub struct CorpusValidator {
    corpus_dir: PathBuf,
}

impl CorpusValidator {
    pub fn new(corpus_dir: &Path) -> Self {
        Self {
            corpus_dir: corpus_dir.to_path_buf(),
        }
    }

    /// Run every rule family over the corpus; returns all collected issues.
    pub async fn validate(&self, navigation: &NavigationTree) -> Result<Vec<ValidationIssue>> {
        let mut issues = Vec::new();

        let documents = self.collect_documents().await?;
        info!("Validating {} generated documents", documents.len());

        for path in &documents {
            let rel = crate::util::rel_display(path, &self.corpus_dir);
            let content = match tokio::fs::read_to_string(path).await {
                Ok(content) => content,
                Err(err) => {
                    issues.push(ValidationIssue::error(
                        "read/unreadable",
                        &rel,
                        format!("failed to read generated document: {}", err),
                    ));
                    continue;
                }
            };

            issues.extend(check_syntax(&content, &rel));
            issues.extend(self.check_references(&content, path, &rel).await);
            issues.extend(check_frontmatter_fields(&content, &rel));
        }

        issues.extend(self.check_navigation(navigation).await);

        debug!("Validation produced {} issues", issues.len());
        Ok(issues)
    }

    /// All generated `.mdx` documents under the corpus root.
    async fn collect_documents(&self) -> Result<Vec<PathBuf>> {
        let mut documents = Vec::new();
        let mut stack = vec![self.corpus_dir.clone()];

        while let Some(dir) = stack.pop() {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(_) => continue, // empty corpus (e.g. zero projects) is fine
            };
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if path.is_dir() {
                    stack.push(path);
                } else if path.extension().and_then(|e| e.to_str()) == Some("mdx") {
                    documents.push(path);
                }
            }
        }

        documents.sort();
        Ok(documents)
    }

    /// Link and image integrity: every relative reference must resolve to an
    /// existing file relative to the document's directory.
    async fn check_references(
        &self,
        content: &str,
        doc_path: &Path,
        rel: &str,
    ) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        let doc_dir = doc_path.parent().unwrap_or(&self.corpus_dir);
        let excluded = excluded_lines(content);

        for (idx, line) in content.lines().enumerate() {
            if excluded[idx] {
                continue;
            }
            let at = format!("{}:{}", rel, idx + 1);

            for caps in LINK_RE.captures_iter(line) {
                let is_image = &caps[1] == "!";
                let text = caps[2].trim();
                let target = caps[3].trim();

                if is_image && text.is_empty() {
                    issues.push(ValidationIssue::warning(
                        "images/missing-alt",
                        &at,
                        format!("image '{}' is missing alt text", target),
                    ));
                }

                if target.is_empty() || is_external_target(target) {
                    continue;
                }
                let file_part = strip_anchor(target);
                if file_part.is_empty() {
                    continue; // pure anchor
                }

                let resolved = doc_dir.join(file_part);
                let exists = tokio::fs::try_exists(&resolved).await.unwrap_or(false);
                if !exists {
                    if is_image {
                        issues.push(ValidationIssue::error(
                            "images/missing-image",
                            &at,
                            format!("image reference '{}' does not resolve", target),
                        ));
                    } else {
                        issues.push(ValidationIssue::error(
                            "links/broken-link",
                            &at,
                            format!("broken link '{}': target does not exist", target),
                        ));
                    }
                }
            }
        }

        issues
    }

    /// Navigation integrity: every page path must correspond to an existing
    /// generated document; groups must carry their required fields.
    async fn check_navigation(&self, navigation: &NavigationTree) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();

        for group in &navigation.groups {
            if group.group.trim().is_empty() {
                issues.push(ValidationIssue::warning(
                    "navigation/incomplete-group",
                    "navigation.json",
                    "navigation group is missing its name",
                ));
            }

            for page in &group.pages {
                if page.title.trim().is_empty() {
                    issues.push(ValidationIssue::warning(
                        "navigation/incomplete-group",
                        "navigation.json",
                        format!("navigation entry '{}' is missing its title", page.path),
                    ));
                }
                if page.path.trim().is_empty() {
                    issues.push(ValidationIssue::warning(
                        "navigation/incomplete-group",
                        "navigation.json",
                        format!("navigation entry '{}' is missing its path", page.title),
                    ));
                    continue;
                }
                let resolved = self.corpus_dir.join(&page.path);
                let exists = tokio::fs::try_exists(&resolved).await.unwrap_or(false);
                if !exists {
                    issues.push(ValidationIssue::error(
                        "navigation/missing-page",
                        "navigation.json",
                        format!(
                            "navigation page '{}' has no generated document",
                            page.path
                        ),
                    ));
                }
            }
        }

        issues
    }
}

/// Frontmatter completeness: title/description required, category/tags/
/// last_updated recommended.
pub fn check_frontmatter_fields(content: &str, location: &str) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let frontmatter = parse_frontmatter(content);

    for field in ["title", "description"] {
        let missing = frontmatter
            .get(field)
            .map(|v| v.trim().is_empty())
            .unwrap_or(true);
        if missing {
            issues.push(ValidationIssue::error(
                "frontmatter/missing-required",
                location,
                format!("required frontmatter field '{}' is missing or empty", field),
            ));
        }
    }

    for field in ["category", "tags", "last_updated"] {
        if !frontmatter.contains_key(field) {
            issues.push(ValidationIssue::warning(
                "frontmatter/missing-recommended",
                location,
                format!("recommended frontmatter field '{}' is missing", field),
            ));
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_display_and_parse() {
        assert_eq!(Severity::Error.to_string(), "error");
        assert_eq!(Severity::Warning.to_string(), "warning");
        assert_eq!(Severity::from_str("Warning").unwrap(), Severity::Warning);
        assert!(Severity::from_str("info").is_err());
    }

    #[test]
    fn test_passed() {
        assert!(passed(&[]));
        assert!(passed(&[ValidationIssue::warning("x", "a.mdx", "w")]));
        assert!(!passed(&[
            ValidationIssue::warning("x", "a.mdx", "w"),
            ValidationIssue::error("y", "a.mdx", "e"),
        ]));
    }

    #[test]
    fn test_digit_heading_flagged() {
        let issues = check_syntax("### 1 Getting Started\n", "p1/guide.mdx");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Error);
        assert_eq!(issues[0].rule, "syntax/digit-heading");
        assert!(issues[0].location.starts_with("p1/guide.mdx:1"));
    }

    #[test]
    fn test_normal_heading_not_flagged() {
        let issues = check_syntax("# Getting Started\n## Step one\n", "a.mdx");
        assert!(issues.is_empty());
    }

    #[test]
    fn test_unbalanced_braces_flagged() {
        let issues = check_syntax("an {open expression\n", "a.mdx");
        assert!(issues
            .iter()
            .any(|i| i.rule == "syntax/unbalanced-expression"));

        let issues = check_syntax("a closing} only\n", "a.mdx");
        assert!(issues
            .iter()
            .any(|i| i.rule == "syntax/unbalanced-expression"));
    }

    #[test]
    fn test_balanced_braces_pass() {
        let issues = check_syntax("inline {expr} is fine\n", "a.mdx");
        assert!(issues.is_empty());
    }

    #[test]
    fn test_braces_in_code_fence_ignored() {
        let content = "```rust\nfn main() {\n```\n";
        let issues = check_syntax(content, "a.mdx");
        assert!(issues.is_empty());
    }

    #[test]
    fn test_empty_link_text_and_target() {
        let issues = check_syntax("[](./target.mdx) and [text]()\n", "a.mdx");
        assert!(issues
            .iter()
            .any(|i| i.rule == "syntax/empty-link-text" && i.severity == Severity::Warning));
        assert!(issues
            .iter()
            .any(|i| i.rule == "syntax/empty-link-target" && i.severity == Severity::Error));
    }

    #[test]
    fn test_frontmatter_region_skipped() {
        let content = "---\ntitle: 1 things {\n---\n\n# Body\n";
        let issues = check_syntax(content, "a.mdx");
        assert!(issues.is_empty());
    }

    #[test]
    fn test_parse_frontmatter() {
        let content = "---\ntitle: Hello\ndescription: World\nnot a pair\n---\n\nbody";
        let fm = parse_frontmatter(content);
        assert_eq!(fm.get("title").unwrap(), "Hello");
        assert_eq!(fm.get("description").unwrap(), "World");
        assert_eq!(fm.len(), 2);
    }

    #[test]
    fn test_parse_frontmatter_absent() {
        assert!(parse_frontmatter("# Just a body\n").is_empty());
    }

    #[test]
    fn test_frontmatter_completeness() {
        let content = "---\ntitle: Hi\n---\nbody\n";
        let issues = check_frontmatter_fields(content, "a.mdx");
        // description missing -> error; category/tags/last_updated -> warnings
        assert_eq!(
            issues
                .iter()
                .filter(|i| i.severity == Severity::Error)
                .count(),
            1
        );
        assert_eq!(
            issues
                .iter()
                .filter(|i| i.severity == Severity::Warning)
                .count(),
            3
        );
    }

    #[test]
    fn test_frontmatter_complete_document() {
        let content = "---\ntitle: Hi\ndescription: There\ncategory: readme\ntags: a, b\nlast_updated: 2026-08-30\n---\nbody\n";
        let issues = check_frontmatter_fields(content, "a.mdx");
        assert!(issues.is_empty());
    }

    #[test]
    fn test_link_with_title_attribute() {
        let issues = check_syntax("[doc](./a.mdx \"the doc\")\n", "a.mdx");
        assert!(issues.is_empty());
    }
}
