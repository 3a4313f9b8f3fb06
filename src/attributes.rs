use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::graph::GraphStore;

/// Catalog entry for a mutually-exclusive node status (e.g. "planned",
/// "shipped").
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Status {
    pub id: String,
    pub name: String,
    pub color: String,
}

/// Catalog entry for a feature project a node may be assigned to.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FeatureProject {
    pub id: String,
    pub name: String,
    pub color: String,
}

impl Status {
    pub fn new(id: &str, name: &str, color: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            color: color.to_string(),
        }
    }
}

impl FeatureProject {
    pub fn new(id: &str, name: &str, color: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            color: color.to_string(),
        }
    }
}

/// Owner of the status and project catalogs. Nodes never own catalog
/// entries, they hold id back-references; the registry keeps those
/// references resolvable by nulling out any reference whose entry has
/// left the catalog. A catalog that only grows never needs a node scan,
/// which is what keeps replacement linear in node count.
#[derive(Clone, Debug, Default)]
pub struct AttributeRegistry {
    statuses: Vec<Status>,
    projects: Vec<FeatureProject>,
}

impl AttributeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn statuses(&self) -> &[Status] {
        &self.statuses
    }

    pub fn projects(&self) -> &[FeatureProject] {
        &self.projects
    }

    pub fn status(&self, id: &str) -> Option<&Status> {
        self.statuses.iter().find(|s| s.id == id)
    }

    pub fn project(&self, id: &str) -> Option<&FeatureProject> {
        self.projects.iter().find(|p| p.id == id)
    }

    pub fn has_status(&self, id: &str) -> bool {
        self.status(id).is_some()
    }

    pub fn has_project(&self, id: &str) -> bool {
        self.project(id).is_some()
    }

    /// Replace the status catalog and null out any node status reference
    /// that is no longer a member. Idempotent.
    pub fn set_statuses(&mut self, catalog: Vec<Status>, store: &mut GraphStore) {
        self.statuses = catalog;
        let node_ids: Vec<String> = store.nodes().iter().map(|n| n.id.clone()).collect();
        for id in node_ids {
            let dangling = store
                .node(&id)
                .and_then(|n| n.status_id.as_deref())
                .map(|sid| !self.has_status(sid))
                .unwrap_or(false);
            if dangling {
                if let Some(node) = store.node_mut(&id) {
                    debug!("Status of node {} left the catalog, resetting", id);
                    node.status_id = None;
                }
            }
        }
    }

    /// Replace the project catalog, symmetrically to `set_statuses`.
    /// Callers must re-run the focus filter for every node afterwards,
    /// since dimming depends on project membership.
    pub fn set_projects(&mut self, catalog: Vec<FeatureProject>, store: &mut GraphStore) {
        self.projects = catalog;
        let node_ids: Vec<String> = store.nodes().iter().map(|n| n.id.clone()).collect();
        for id in node_ids {
            let dangling = store
                .node(&id)
                .and_then(|n| n.project_id.as_deref())
                .map(|pid| !self.has_project(pid))
                .unwrap_or(false);
            if dangling {
                if let Some(node) = store.node_mut(&id) {
                    debug!("Project of node {} left the catalog, resetting", id);
                    node.project_id = None;
                }
            }
        }
    }

    /// Assign a status to a node. An id outside the current catalog is
    /// coerced to null rather than rejected, so a stale picker can never
    /// leave a broken reference behind.
    pub fn set_node_status(&self, store: &mut GraphStore, node_id: &str, status_id: Option<&str>) {
        let resolved = status_id.filter(|sid| self.has_status(sid));
        if status_id.is_some() && resolved.is_none() {
            debug!("Ignoring unknown status {:?} for node {}", status_id, node_id);
        }
        if let Some(node) = store.node_mut(node_id) {
            node.status_id = resolved.map(str::to_string);
        }
    }

    /// Assign a project to a node, with the same coercion rule as
    /// `set_node_status`. Callers re-run the focus filter for the node.
    pub fn set_node_project(&self, store: &mut GraphStore, node_id: &str, project_id: Option<&str>) {
        let resolved = project_id.filter(|pid| self.has_project(pid));
        if project_id.is_some() && resolved.is_none() {
            debug!(
                "Ignoring unknown project {:?} for node {}",
                project_id, node_id
            );
        }
        if let Some(node) = store.node_mut(node_id) {
            node.project_id = resolved.map(str::to_string);
        }
    }
}
