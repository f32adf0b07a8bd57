use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

use crate::classifier::DocCategory;

/// Configuration loading failures. A bad descriptor inside a valid file is
/// NOT a loading failure — discovery reports it as an issue and skips the
/// project.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Explicit project descriptors. When empty, the legacy directory walk
    /// over `scan.base_paths` is used instead.
    #[serde(default)]
    pub projects: Vec<ProjectDescriptor>,

    #[serde(default)]
    pub scan: ScanConfig,

    #[serde(default)]
    pub limits: LimitsConfig,

    /// Root directory for the generated corpus.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            projects: Vec::new(),
            scan: ScanConfig::default(),
            limits: LimitsConfig::default(),
            output_dir: default_output_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectDescriptor {
    pub id: String,

    /// Display name; defaults to the id.
    #[serde(default)]
    pub name: Option<String>,

    pub source_path: String,

    /// Frontmatter category when a document has no better signal.
    #[serde(default = "default_project_category")]
    pub category: String,

    /// Relative ordering among projects (lower first).
    #[serde(default = "default_priority")]
    pub priority: u32,

    /// Document types this project must always produce.
    #[serde(default = "default_document_types")]
    pub document_types: Vec<DocumentType>,

    /// Globs (relative to source_path) selecting candidate files.
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,

    /// Globs excluding files that would otherwise match.
    #[serde(default)]
    pub skip_patterns: Vec<String>,
}

impl ProjectDescriptor {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Base directories walked one level deep to auto-detect projects
    /// (legacy mode, used when no explicit descriptors are configured).
    #[serde(default)]
    pub base_paths: Vec<String>,

    /// A subdirectory is a project if it contains any of these entries.
    #[serde(default = "default_indicator_files")]
    pub indicator_files: Vec<String>,

    /// Directory names never descended into.
    #[serde(default = "default_exclude_dirs")]
    pub exclude_dirs: Vec<String>,

    /// Recursion bound for file scans inside a project.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Document types assigned to auto-detected projects.
    #[serde(default = "default_document_types")]
    pub default_document_types: Vec<DocumentType>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            base_paths: Vec::new(),
            indicator_files: default_indicator_files(),
            exclude_dirs: default_exclude_dirs(),
            max_depth: default_max_depth(),
            default_document_types: default_document_types(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Files above this size are skipped before extraction.
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,

    /// Doc-comment fragments below this length are discarded as noise.
    #[serde(default = "default_min_fragment_len")]
    pub min_fragment_len: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: default_max_file_bytes(),
            min_fragment_len: default_min_fragment_len(),
        }
    }
}

fn default_output_dir() -> String {
    "corpus".to_string()
}

fn default_project_category() -> String {
    "general".to_string()
}

fn default_priority() -> u32 {
    100
}

fn default_document_types() -> Vec<DocumentType> {
    vec![DocumentType::Readme]
}

pub(crate) fn default_include_globs() -> Vec<String> {
    vec![
        "*.md".to_string(),
        "*.mdx".to_string(),
        "*.rst".to_string(),
        "*.txt".to_string(),
        "docs/**/*".to_string(),
        "src/**/*.rs".to_string(),
        "src/**/*.py".to_string(),
        "src/**/*.ts".to_string(),
    ]
}

fn default_indicator_files() -> Vec<String> {
    vec![
        "Cargo.toml".to_string(),
        "package.json".to_string(),
        "pyproject.toml".to_string(),
        "go.mod".to_string(),
        "README.md".to_string(),
        "README.rst".to_string(),
        "CLAUDE.md".to_string(),
        "AGENTS.md".to_string(),
        "docs".to_string(),
    ]
}

fn default_exclude_dirs() -> Vec<String> {
    vec![
        ".git".to_string(),
        ".hg".to_string(),
        ".svn".to_string(),
        "node_modules".to_string(),
        "target".to_string(),
        "build".to_string(),
        "dist".to_string(),
        "__pycache__".to_string(),
        ".venv".to_string(),
        "venv".to_string(),
        ".tox".to_string(),
        ".eggs".to_string(),
        "vendor".to_string(),
    ]
}

fn default_max_depth() -> usize {
    8
}

fn default_max_file_bytes() -> u64 {
    1_048_576 // 1 MiB
}

fn default_min_fragment_len() -> usize {
    40
}

impl Config {
    /// Load config from the working directory or user config directory.
    #[allow(dead_code)]
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_path(None)
    }

    /// Load configuration from a specific path, or use default search paths.
    pub fn load_with_path(path: Option<String>) -> Result<Self, ConfigError> {
        if let Some(config_path) = path {
            debug!("Loading config from explicit path: {}", config_path);
            return Self::load_from_path(&config_path);
        }

        // Per-tree config first
        if Path::new("docforge.toml").exists() {
            debug!("Loaded config from ./docforge.toml");
            return Self::load_from_path("docforge.toml");
        }

        // Then the user config directory
        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join("docforge").join("config.toml");
            if config_path.exists() {
                debug!("Loaded config from {:?}", config_path);
                return Self::load_from_path(&config_path);
            }
        }

        debug!("Using default config");
        Ok(Self::default())
    }

    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let display = path.as_ref().display().to_string();
        let content = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: display.clone(),
            source,
        })?;
        let config: Config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: display,
            source,
        })?;
        Ok(config)
    }
}

/// Logical document type a project declares. Every declared type always
/// yields exactly one output document (synthesized when no source matches).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentType {
    Introduction,
    Readme,
    Quickstart,
    Guide,
    Architecture,
    ApiReference,
    Development,
    Deployment,
    Security,
    Migration,
    Changelog,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Introduction => "introduction",
            DocumentType::Readme => "readme",
            DocumentType::Quickstart => "quickstart",
            DocumentType::Guide => "guide",
            DocumentType::Architecture => "architecture",
            DocumentType::ApiReference => "api-reference",
            DocumentType::Development => "development",
            DocumentType::Deployment => "deployment",
            DocumentType::Security => "security",
            DocumentType::Migration => "migration",
            DocumentType::Changelog => "changelog",
        }
    }

    /// Output file name inside the project's corpus subdirectory.
    pub fn file_name(&self) -> String {
        format!("{}.mdx", self.as_str())
    }

    /// Primary frontmatter/navigation category for this type.
    pub fn category(&self) -> DocCategory {
        match self {
            DocumentType::Introduction | DocumentType::Readme => DocCategory::Readme,
            DocumentType::Quickstart => DocCategory::Quickstart,
            DocumentType::Guide => DocCategory::Guide,
            DocumentType::Architecture => DocCategory::Architecture,
            DocumentType::ApiReference => DocCategory::ApiReference,
            DocumentType::Development => DocCategory::Development,
            DocumentType::Deployment => DocCategory::Deployment,
            DocumentType::Security => DocCategory::Security,
            DocumentType::Migration => DocCategory::Migration,
            DocumentType::Changelog => DocCategory::Changelog,
        }
    }

    /// Source classifications that can fill this document type, in
    /// preference order.
    pub fn source_categories(&self) -> &'static [DocCategory] {
        match self {
            DocumentType::Introduction => &[DocCategory::Readme, DocCategory::Documentation],
            DocumentType::Readme => &[DocCategory::Readme],
            DocumentType::Quickstart => &[DocCategory::Quickstart],
            DocumentType::Guide => &[DocCategory::Guide, DocCategory::Documentation],
            DocumentType::Architecture => &[DocCategory::Architecture],
            DocumentType::ApiReference => &[DocCategory::ApiReference, DocCategory::ApiSpec],
            DocumentType::Development => &[DocCategory::Development],
            DocumentType::Deployment => &[DocCategory::Deployment],
            DocumentType::Security => &[DocCategory::Security],
            DocumentType::Migration => &[DocCategory::Migration],
            DocumentType::Changelog => &[DocCategory::Changelog],
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "introduction" | "intro" => Ok(DocumentType::Introduction),
            "readme" => Ok(DocumentType::Readme),
            "quickstart" | "quick-start" => Ok(DocumentType::Quickstart),
            "guide" => Ok(DocumentType::Guide),
            "architecture" => Ok(DocumentType::Architecture),
            "api-reference" | "api_reference" | "reference" => Ok(DocumentType::ApiReference),
            "development" => Ok(DocumentType::Development),
            "deployment" => Ok(DocumentType::Deployment),
            "security" => Ok(DocumentType::Security),
            "migration" => Ok(DocumentType::Migration),
            "changelog" => Ok(DocumentType::Changelog),
            _ => anyhow::bail!("Unknown document type: {}", s),
        }
    }
}
