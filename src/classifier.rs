//! Heuristic file classification.
//!
//! Maps a file (path + optional content) to a semantic document category via
//! an ordered rule table: filename-substring rules first, then content-heading
//! rules, then extension defaults. First match wins. Filename rules precede
//! content rules deliberately — explicit naming is a stronger signal than
//! content sniffing.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::bail;

/// Navigation-order sentinel for categories that never appear in navigation.
pub const NAV_ORDER_UNRANKED: u32 = 9999;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocCategory {
    Readme,
    AiContext,
    Changelog,
    ApiReference,
    Guide,
    Quickstart,
    Architecture,
    Deployment,
    Development,
    Security,
    Migration,
    Documentation,
    Code,
    Config,
    ApiSpec,
    Misc,
}

impl DocCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocCategory::Readme => "readme",
            DocCategory::AiContext => "ai-context",
            DocCategory::Changelog => "changelog",
            DocCategory::ApiReference => "api-reference",
            DocCategory::Guide => "guide",
            DocCategory::Quickstart => "quickstart",
            DocCategory::Architecture => "architecture",
            DocCategory::Deployment => "deployment",
            DocCategory::Development => "development",
            DocCategory::Security => "security",
            DocCategory::Migration => "migration",
            DocCategory::Documentation => "documentation",
            DocCategory::Code => "code",
            DocCategory::Config => "config",
            DocCategory::ApiSpec => "api-spec",
            DocCategory::Misc => "misc",
        }
    }

    /// Fixed navigation-order integer; lower sorts first. Categories that are
    /// excluded from navigation get a large sentinel so they sort last.
    pub fn nav_order(&self) -> u32 {
        match self {
            DocCategory::Readme => 0,
            DocCategory::Quickstart => 10,
            DocCategory::Guide => 20,
            DocCategory::Architecture => 30,
            DocCategory::ApiReference => 40,
            DocCategory::ApiSpec => 45,
            DocCategory::Development => 50,
            DocCategory::Deployment => 60,
            DocCategory::Security => 70,
            DocCategory::Migration => 80,
            DocCategory::Changelog => 90,
            DocCategory::AiContext => 95,
            DocCategory::Documentation => 100,
            DocCategory::Code | DocCategory::Config | DocCategory::Misc => NAV_ORDER_UNRANKED,
        }
    }

    /// Categories that never become navigation pages.
    pub fn is_navigable(&self) -> bool {
        !matches!(
            self,
            DocCategory::Code | DocCategory::Misc | DocCategory::Config
        )
    }
}

impl fmt::Display for DocCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DocCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "readme" => Ok(DocCategory::Readme),
            "ai-context" => Ok(DocCategory::AiContext),
            "changelog" => Ok(DocCategory::Changelog),
            "api-reference" => Ok(DocCategory::ApiReference),
            "guide" => Ok(DocCategory::Guide),
            "quickstart" => Ok(DocCategory::Quickstart),
            "architecture" => Ok(DocCategory::Architecture),
            "deployment" => Ok(DocCategory::Deployment),
            "development" => Ok(DocCategory::Development),
            "security" => Ok(DocCategory::Security),
            "migration" => Ok(DocCategory::Migration),
            "documentation" => Ok(DocCategory::Documentation),
            "code" => Ok(DocCategory::Code),
            "config" => Ok(DocCategory::Config),
            "api-spec" => Ok(DocCategory::ApiSpec),
            "misc" => Ok(DocCategory::Misc),
            _ => bail!("Unknown document category: {}", s),
        }
    }
}

/// One classification rule. Evaluated top-to-bottom; first match wins.
#[derive(Debug, Clone, Copy)]
enum Rule {
    /// Case-insensitive substring match against the file name.
    NameContains(&'static str, DocCategory),
    /// Case-insensitive substring match against any heading line.
    HeadingContains(&'static str, DocCategory),
    /// Exact (lowercased) extension match.
    Extension(&'static str, DocCategory),
}

/// The ordered rule table. Stored as data so it is independently testable;
/// ordering within each block matters (e.g. "api-reference" before "api").
const RULES: &[Rule] = &[
    // Filename rules — explicit naming beats content sniffing.
    Rule::NameContains("readme", DocCategory::Readme),
    Rule::NameContains("claude.md", DocCategory::AiContext),
    Rule::NameContains("agents.md", DocCategory::AiContext),
    Rule::NameContains("ai-context", DocCategory::AiContext),
    Rule::NameContains("changelog", DocCategory::Changelog),
    Rule::NameContains("history", DocCategory::Changelog),
    Rule::NameContains("releases", DocCategory::Changelog),
    Rule::NameContains("openapi", DocCategory::ApiSpec),
    Rule::NameContains("swagger", DocCategory::ApiSpec),
    Rule::NameContains("api-reference", DocCategory::ApiReference),
    Rule::NameContains("api_reference", DocCategory::ApiReference),
    Rule::NameContains("reference", DocCategory::ApiReference),
    Rule::NameContains("quickstart", DocCategory::Quickstart),
    Rule::NameContains("quick-start", DocCategory::Quickstart),
    Rule::NameContains("getting-started", DocCategory::Quickstart),
    Rule::NameContains("getting_started", DocCategory::Quickstart),
    Rule::NameContains("architecture", DocCategory::Architecture),
    Rule::NameContains("design", DocCategory::Architecture),
    Rule::NameContains("deploy", DocCategory::Deployment),
    Rule::NameContains("contributing", DocCategory::Development),
    Rule::NameContains("development", DocCategory::Development),
    Rule::NameContains("hacking", DocCategory::Development),
    Rule::NameContains("security", DocCategory::Security),
    Rule::NameContains("migration", DocCategory::Migration),
    Rule::NameContains("upgrading", DocCategory::Migration),
    Rule::NameContains("upgrade", DocCategory::Migration),
    Rule::NameContains("tutorial", DocCategory::Guide),
    Rule::NameContains("howto", DocCategory::Guide),
    Rule::NameContains("how-to", DocCategory::Guide),
    Rule::NameContains("guide", DocCategory::Guide),
    Rule::NameContains("faq", DocCategory::Guide),
    // Content-heading rules — only consulted when no filename rule matched.
    Rule::HeadingContains("architecture", DocCategory::Architecture),
    Rule::HeadingContains("getting started", DocCategory::Quickstart),
    Rule::HeadingContains("installation", DocCategory::Quickstart),
    Rule::HeadingContains("deployment", DocCategory::Deployment),
    Rule::HeadingContains("migration", DocCategory::Migration),
    Rule::HeadingContains("api reference", DocCategory::ApiReference),
    Rule::HeadingContains("contributing", DocCategory::Development),
    // Extension defaults.
    Rule::Extension("md", DocCategory::Documentation),
    Rule::Extension("mdx", DocCategory::Documentation),
    Rule::Extension("rst", DocCategory::Documentation),
    Rule::Extension("txt", DocCategory::Documentation),
    Rule::Extension("rs", DocCategory::Code),
    Rule::Extension("py", DocCategory::Code),
    Rule::Extension("js", DocCategory::Code),
    Rule::Extension("jsx", DocCategory::Code),
    Rule::Extension("ts", DocCategory::Code),
    Rule::Extension("tsx", DocCategory::Code),
    Rule::Extension("go", DocCategory::Code),
    Rule::Extension("java", DocCategory::Code),
    Rule::Extension("c", DocCategory::Code),
    Rule::Extension("cpp", DocCategory::Code),
    Rule::Extension("h", DocCategory::Code),
    Rule::Extension("toml", DocCategory::Config),
    Rule::Extension("yaml", DocCategory::Config),
    Rule::Extension("yml", DocCategory::Config),
    Rule::Extension("json", DocCategory::Config),
    Rule::Extension("ini", DocCategory::Config),
    Rule::Extension("cfg", DocCategory::Config),
];

/// Classify a file from its path and (optionally) its content.
///
/// Pure and deterministic: identical input always yields the same label.
pub fn classify(path: &Path, content: Option<&str>) -> DocCategory {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_lowercase();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_lowercase();

    // Heading lines are lowercased once; only consulted by heading rules.
    let headings: Vec<String> = content
        .map(|c| {
            c.lines()
                .filter(|l| l.trim_start().starts_with('#'))
                .map(|l| l.to_lowercase())
                .collect()
        })
        .unwrap_or_default();

    for rule in RULES {
        match rule {
            Rule::NameContains(needle, label) => {
                if file_name.contains(needle) {
                    return *label;
                }
            }
            Rule::HeadingContains(needle, label) => {
                if headings.iter().any(|h| h.contains(needle)) {
                    return *label;
                }
            }
            Rule::Extension(ext, label) => {
                if extension == *ext {
                    return *label;
                }
            }
        }
    }

    DocCategory::Misc
}
