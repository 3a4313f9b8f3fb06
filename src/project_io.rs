//! Project record import/export.
//!
//! The record is the unit exchanged with the storage collaborator: a JSON
//! document holding the status/project catalogs, every node, and every
//! connection. Importing never reuses record identities: each import
//! allocates fresh live ids and rewires connections through a remap table.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::attributes::{AttributeRegistry, FeatureProject, Status};
use crate::graph::{Connection, GraphStore, Node};

/// Persisted form of one editor project.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub statuses: Vec<Status>,
    #[serde(default)]
    pub feature_projects: Vec<FeatureProject>,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub connections: Vec<Connection>,
}

/// What an import did, for logging and CLI reporting.
#[derive(Debug, Clone, Default)]
pub struct ImportSummary {
    pub nodes_imported: usize,
    pub connections_imported: usize,
    /// Connections in the record whose endpoints could not be resolved
    pub connections_dropped: usize,
    pub warnings: Vec<String>,
}

/// Snapshot the live graph and catalogs into a record. Does not mutate
/// the graph; the transient selection flag is not carried over.
pub fn export(store: &GraphStore, registry: &AttributeRegistry, name: &str) -> ProjectRecord {
    let mut connections: Vec<Connection> = store.connections().to_vec();
    for connection in &mut connections {
        connection.selected = false;
    }

    ProjectRecord {
        name: name.to_string(),
        statuses: registry.statuses().to_vec(),
        feature_projects: registry.projects().to_vec(),
        nodes: store.nodes().to_vec(),
        connections,
    }
}

/// Rebuild the live graph from a record.
///
/// Catalogs are installed before node creation so status/project
/// assignments validate against the right universe, and re-applied after
/// everything exists to null out references the record itself left
/// dangling. Connections whose endpoints are missing from the record are
/// dropped silently.
pub fn import(
    record: &ProjectRecord,
    store: &mut GraphStore,
    registry: &mut AttributeRegistry,
) -> ImportSummary {
    let mut summary = ImportSummary::default();

    store.clear();
    registry.set_statuses(record.statuses.clone(), store);
    registry.set_projects(record.feature_projects.clone(), store);

    let mut id_map: HashMap<String, String> = HashMap::new();
    for node_record in &record.nodes {
        let live_id = store.create_node(&node_record.name).id.clone();
        if let Some(node) = store.node_mut(&live_id) {
            node.label = node_record.label.clone();
            node.notes = node_record.notes.clone();
            node.tags = node_record.tags.clone();
            node.attributes = node_record.attributes.clone();
            node.position = node_record.position;
        }
        registry.set_node_status(store, &live_id, node_record.status_id.as_deref());
        registry.set_node_project(store, &live_id, node_record.project_id.as_deref());
        id_map.insert(node_record.id.clone(), live_id);
        summary.nodes_imported += 1;
    }

    for connection_record in &record.connections {
        let source = id_map.get(&connection_record.source);
        let target = id_map.get(&connection_record.target);
        let (source, target) = match (source, target) {
            (Some(source), Some(target)) => (source.clone(), target.clone()),
            _ => {
                debug!(
                    "Dropping connection {} -> {}: endpoint not in record",
                    connection_record.source, connection_record.target
                );
                summary.connections_dropped += 1;
                summary.warnings.push(format!(
                    "Dropped connection {} -> {}: endpoint not found",
                    connection_record.source, connection_record.target
                ));
                continue;
            }
        };

        match store.create_connection(
            &source,
            &connection_record.source_output,
            &target,
            &connection_record.target_input,
        ) {
            Ok(connection) => {
                let id = connection.id.clone();
                if let Some(live) = store.connection_mut(&id) {
                    live.pins = connection_record.pins.clone();
                }
                summary.connections_imported += 1;
            }
            Err(err) => {
                summary.connections_dropped += 1;
                summary.warnings.push(err.to_string());
            }
        }
    }

    // Second reconciliation pass now that both catalogs and nodes exist.
    registry.set_statuses(record.statuses.clone(), store);
    registry.set_projects(record.feature_projects.clone(), store);

    debug!(
        "Imported project '{}': {} nodes, {} connections ({} dropped)",
        record.name, summary.nodes_imported, summary.connections_imported,
        summary.connections_dropped
    );

    summary
}

/// Read a record from a JSON file.
pub fn read_record(path: &Path) -> Result<ProjectRecord> {
    debug!("Reading project record from: {}", path.display());
    let content = fs::read_to_string(path)?;
    let record: ProjectRecord = serde_json::from_str(&content)?;
    Ok(record)
}

/// Write a record to a JSON file.
pub fn write_record(path: &Path, record: &ProjectRecord, pretty: bool) -> Result<()> {
    debug!("Writing project record to: {}", path.display());
    let json = if pretty {
        serde_json::to_string_pretty(record)?
    } else {
        serde_json::to_string(record)?
    };
    fs::write(path, json)?;
    Ok(())
}
