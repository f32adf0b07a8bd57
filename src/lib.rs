//! docforge - Documentation ingestion and validation pipeline
//!
//! Discovers source projects, classifies and extracts their documentation
//! artifacts, rewrites them into a renderer-safe corpus with generated
//! frontmatter, assembles a navigation tree, and validates the finished
//! corpus (syntax, links, images, navigation) before publication.

pub mod classifier;
pub mod cli;
pub mod config;
pub mod pipeline;
pub mod util;
pub mod validator;
