use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;
use uuid::Uuid;

use crate::errors::{GraphError, GraphResult};

/// Port key of the single input socket every feature node exposes.
pub const INPUT_PORT: &str = "in";
/// Port key of the single output socket every feature node exposes.
pub const OUTPUT_PORT: &str = "out";

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// One key/value pair on a node. Pairs are ordered and duplicate keys are
/// allowed, so this is a list entry rather than a map entry.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AttributePair {
    pub key: String,
    pub value: String,
}

/// An attachment point on a node. Ports are fixed per node (one input,
/// one output) and are not part of the persisted record.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Port {
    pub key: String,
    /// Whether more than one connection may attach to this port at once
    pub multiple_connections: bool,
}

impl Port {
    pub fn default_input() -> Self {
        Self {
            key: INPUT_PORT.to_string(),
            multiple_connections: false,
        }
    }

    pub fn default_output() -> Self {
        Self {
            key: OUTPUT_PORT.to_string(),
            multiple_connections: false,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    pub label: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notes: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub attributes: Vec<AttributePair>,
    #[serde(default)]
    pub position: Position,
    #[serde(skip, default = "Port::default_input")]
    pub input: Port,
    #[serde(skip, default = "Port::default_output")]
    pub output: Port,
}

impl Node {
    /// A fresh node with a store-assigned identity. The internal name
    /// starts out equal to the label; later label edits leave it alone.
    pub fn new(label: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            label: label.to_string(),
            name: label.to_string(),
            status_id: None,
            project_id: None,
            notes: String::new(),
            tags: Vec::new(),
            attributes: Vec::new(),
            position: Position::default(),
            input: Port::default_input(),
            output: Port::default_output(),
        }
    }

    /// Look up one of the node's ports by key.
    pub fn port(&self, key: &str) -> Option<&Port> {
        if self.input.key == key {
            Some(&self.input)
        } else if self.output.key == key {
            Some(&self.output)
        } else {
            None
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "sourceId")]
    pub source: String,
    pub source_output: String,
    #[serde(rename = "targetId")]
    pub target: String,
    pub target_input: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pins: Vec<Position>,
    /// Transient UI selection state, never persisted
    #[serde(skip)]
    pub selected: bool,
}

/// Canonical owner of node and connection existence. The store enforces
/// identity and endpoint-existence invariants only; port multiplicity is
/// layered on top by the connection policy, and node removal does not
/// cascade so that callers can batch teardown themselves.
#[derive(Clone, Debug, Default)]
pub struct GraphStore {
    nodes: Vec<Node>,
    connections: Vec<Connection>,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_node(&mut self, label: &str) -> &Node {
        let node = Node::new(label);
        debug!("Creating node {} ({})", node.id, node.label);
        let idx = self.nodes.len();
        self.nodes.push(node);
        &self.nodes[idx]
    }

    /// Remove a node. No-op when the id is absent. Connections that
    /// reference the node are left to the caller; see
    /// `connections_touching` for collecting them first.
    pub fn remove_node(&mut self, id: &str) {
        self.nodes.retain(|n| n.id != id);
    }

    pub fn create_connection(
        &mut self,
        source: &str,
        source_output: &str,
        target: &str,
        target_input: &str,
    ) -> GraphResult<&Connection> {
        if self.node(source).is_none() {
            return Err(GraphError::InvalidEndpoint(source.to_string()));
        }
        if self.node(target).is_none() {
            return Err(GraphError::InvalidEndpoint(target.to_string()));
        }

        let connection = Connection {
            id: Uuid::new_v4().to_string(),
            source: source.to_string(),
            source_output: source_output.to_string(),
            target: target.to_string(),
            target_input: target_input.to_string(),
            pins: Vec::new(),
            selected: false,
        };
        debug!(
            "Creating connection {} -> {} ({})",
            connection.source, connection.target, connection.id
        );
        let idx = self.connections.len();
        self.connections.push(connection);
        Ok(&self.connections[idx])
    }

    pub fn remove_connection(&mut self, id: &str) {
        self.connections.retain(|c| c.id != id);
    }

    /// Drop all connections, then all nodes.
    pub fn clear(&mut self) {
        debug!(
            "Clearing graph: {} nodes, {} connections",
            self.nodes.len(),
            self.connections.len()
        );
        self.connections.clear();
        self.nodes.clear();
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    pub fn connection(&self, id: &str) -> Option<&Connection> {
        self.connections.iter().find(|c| c.id == id)
    }

    pub fn connection_mut(&mut self, id: &str) -> Option<&mut Connection> {
        self.connections.iter_mut().find(|c| c.id == id)
    }

    /// Connections leaving a given (node, output port) pair.
    pub fn connections_from(&self, node_id: &str, output: &str) -> Vec<&Connection> {
        self.connections
            .iter()
            .filter(|c| c.source == node_id && c.source_output == output)
            .collect()
    }

    /// Connections arriving at a given (node, input port) pair.
    pub fn connections_into(&self, node_id: &str, input: &str) -> Vec<&Connection> {
        self.connections
            .iter()
            .filter(|c| c.target == node_id && c.target_input == input)
            .collect()
    }

    /// Ids of every connection with the node on either end.
    pub fn connections_touching(&self, node_id: &str) -> Vec<String> {
        self.connections
            .iter()
            .filter(|c| c.source == node_id || c.target == node_id)
            .map(|c| c.id.clone())
            .collect()
    }

    pub fn stats(&self) -> String {
        format!(
            "Nodes: {}, Connections: {}",
            self.nodes.len(),
            self.connections.len()
        )
    }

    /// Check identity and endpoint invariants, collecting every violation
    /// rather than stopping at the first.
    pub fn verify_integrity(&self) -> Result<(), Vec<String>> {
        let node_ids: HashSet<&str> = self.nodes.iter().map(|n| n.id.as_str()).collect();
        let mut errors = Vec::new();

        if node_ids.len() != self.nodes.len() {
            errors.push("Duplicate node ids present".to_string());
        }

        let mut connection_ids = HashSet::new();
        for connection in &self.connections {
            if !connection_ids.insert(connection.id.as_str()) {
                errors.push(format!("Duplicate connection id: [{}]", connection.id));
            }
            if !node_ids.contains(connection.source.as_str()) {
                errors.push(format!(
                    "Connection id:[{}] source {:?} not found in nodes",
                    connection.id, connection.source
                ));
            }
            if !node_ids.contains(connection.target.as_str()) {
                errors.push(format!(
                    "Connection id:[{}] target {:?} not found in nodes",
                    connection.id, connection.target
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_node_store() -> (GraphStore, String, String) {
        let mut store = GraphStore::new();
        let a = store.create_node("Feature A").id.clone();
        let b = store.create_node("Feature B").id.clone();
        (store, a, b)
    }

    #[test]
    fn test_create_node_defaults() {
        let mut store = GraphStore::new();
        let node = store.create_node("Login flow");
        assert_eq!(node.label, "Login flow");
        assert_eq!(node.name, "Login flow");
        assert!(node.status_id.is_none());
        assert!(node.project_id.is_none());
        assert!(node.tags.is_empty());
        assert_eq!(node.position, Position::default());
        assert_eq!(node.input.key, INPUT_PORT);
        assert_eq!(node.output.key, OUTPUT_PORT);
        assert!(!node.output.multiple_connections);
    }

    #[test]
    fn test_node_ids_are_unique() {
        let mut store = GraphStore::new();
        let a = store.create_node("A").id.clone();
        let b = store.create_node("A").id.clone();
        assert_ne!(a, b);
    }

    #[test]
    fn test_remove_node_is_noop_when_absent() {
        let (mut store, a, _) = two_node_store();
        store.remove_node("not-a-node");
        assert_eq!(store.nodes().len(), 2);
        store.remove_node(&a);
        assert_eq!(store.nodes().len(), 1);
    }

    #[test]
    fn test_create_connection_requires_both_endpoints() {
        let (mut store, a, b) = two_node_store();
        assert!(store
            .create_connection(&a, OUTPUT_PORT, &b, INPUT_PORT)
            .is_ok());
        let err = store
            .create_connection(&a, OUTPUT_PORT, "missing", INPUT_PORT)
            .unwrap_err();
        assert!(matches!(err, GraphError::InvalidEndpoint(id) if id == "missing"));
        assert_eq!(store.connections().len(), 1);
    }

    #[test]
    fn test_remove_connection_is_noop_when_absent() {
        let (mut store, a, b) = two_node_store();
        let id = store
            .create_connection(&a, OUTPUT_PORT, &b, INPUT_PORT)
            .unwrap()
            .id
            .clone();
        store.remove_connection("missing");
        assert_eq!(store.connections().len(), 1);
        store.remove_connection(&id);
        assert!(store.connections().is_empty());
    }

    #[test]
    fn test_clear_removes_everything() {
        let (mut store, a, b) = two_node_store();
        store
            .create_connection(&a, OUTPUT_PORT, &b, INPUT_PORT)
            .unwrap();
        store.clear();
        assert!(store.nodes().is_empty());
        assert!(store.connections().is_empty());
    }

    #[test]
    fn test_connections_from_and_into() {
        let (mut store, a, b) = two_node_store();
        store
            .create_connection(&a, OUTPUT_PORT, &b, INPUT_PORT)
            .unwrap();
        assert_eq!(store.connections_from(&a, OUTPUT_PORT).len(), 1);
        assert_eq!(store.connections_into(&b, INPUT_PORT).len(), 1);
        assert!(store.connections_from(&b, OUTPUT_PORT).is_empty());
    }

    #[test]
    fn test_connections_touching_covers_both_ends() {
        let (mut store, a, b) = two_node_store();
        let c = store.create_node("C").id.clone();
        store
            .create_connection(&a, OUTPUT_PORT, &b, INPUT_PORT)
            .unwrap();
        store
            .create_connection(&b, OUTPUT_PORT, &c, INPUT_PORT)
            .unwrap();
        assert_eq!(store.connections_touching(&b).len(), 2);
        assert_eq!(store.connections_touching(&a).len(), 1);
    }

    #[test]
    fn test_verify_integrity_reports_dangling_endpoint() {
        let (mut store, a, b) = two_node_store();
        store
            .create_connection(&a, OUTPUT_PORT, &b, INPUT_PORT)
            .unwrap();
        store.remove_node(&b);
        let errors = store.verify_integrity().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("target"));
    }
}
