//! Navigation tree assembly.
//!
//! One navigation group per project, pages stably ordered by category rank.
//! Non-navigable categories never make it into the tree; empty groups are
//! kept so every processed project stays visible in the manifest.

use serde::{Deserialize, Serialize};

use crate::classifier::DocCategory;
use crate::pipeline::generator::GeneratedDocument;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NavigationEntry {
    pub title: String,
    pub path: String,
    pub category: DocCategory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationGroup {
    pub group: String,
    pub pages: Vec<NavigationEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NavigationTree {
    pub groups: Vec<NavigationGroup>,
}

impl NavigationTree {
    pub fn page_count(&self) -> usize {
        self.groups.iter().map(|g| g.pages.len()).sum()
    }
}

/// Accumulates per-project page groups in processing order.
#[derive(Debug, Default)]
pub struct NavigationBuilder {
    groups: Vec<NavigationGroup>,
}

impl NavigationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a project's documents as one group. Pages are filtered to
    /// navigable categories and stably sorted by category rank, so documents
    /// sharing a rank keep their generation order.
    pub fn add_project(&mut self, group: &str, documents: &[GeneratedDocument]) {
        let mut pages: Vec<NavigationEntry> = documents
            .iter()
            .filter(|doc| doc.category.is_navigable())
            .map(|doc| NavigationEntry {
                title: doc.title.clone(),
                path: doc.rel_path.clone(),
                category: doc.category,
            })
            .collect();
        pages.sort_by_key(|entry| entry.category.nav_order());

        self.groups.push(NavigationGroup {
            group: group.to_string(),
            pages,
        });
    }

    pub fn build(self) -> NavigationTree {
        NavigationTree {
            groups: self.groups,
        }
    }
}
