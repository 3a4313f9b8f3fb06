//! Focus filtering: deciding which nodes to visually de-emphasize for the
//! currently selected projects and tags.

use std::collections::HashSet;

use crate::graph::Node;

/// Active filter criteria. Replaced wholesale on every change; tag
/// entries are held lowercased so membership checks are
/// case-insensitive.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterState {
    projects: HashSet<String>,
    tags: HashSet<String>,
}

impl FilterState {
    pub fn new<P, T>(projects: P, tags: T) -> Self
    where
        P: IntoIterator<Item = String>,
        T: IntoIterator<Item = String>,
    {
        Self {
            projects: projects.into_iter().collect(),
            tags: tags.into_iter().map(|t| t.to_lowercase()).collect(),
        }
    }

    pub fn is_active(&self) -> bool {
        !self.projects.is_empty() || !self.tags.is_empty()
    }

    pub fn projects(&self) -> &HashSet<String> {
        &self.projects
    }

    pub fn tags(&self) -> &HashSet<String> {
        &self.tags
    }
}

/// Whether a node should be dimmed under the given filter. An inactive
/// filter dims nothing; otherwise a node stays highlighted when its
/// project is selected or any of its tags matches.
pub fn should_dim(node: &Node, filter: &FilterState) -> bool {
    if !filter.is_active() {
        return false;
    }

    if let Some(project_id) = &node.project_id {
        if filter.projects.contains(project_id) {
            return false;
        }
    }

    if node
        .tags
        .iter()
        .any(|tag| filter.tags.contains(&tag.to_lowercase()))
    {
        return false;
    }

    true
}
