//! Session-scoped editor context.
//!
//! One `EditorSession` holds everything a single open editor owns: the
//! graph store, the attribute catalogs, the focus filter, the socket
//! index, and the transient selection. Nothing here is process-global, so
//! multiple sessions can coexist without cross-talk. The rendering
//! collaborator sits behind the `RenderBridge` trait and receives style
//! directives instead of the core reaching into presentation state.

use std::collections::HashSet;
use tracing::debug;

use crate::attributes::{AttributeRegistry, FeatureProject, Status};
use crate::filter::{should_dim, FilterState};
use crate::graph::{AttributePair, GraphStore, Position, INPUT_PORT, OUTPUT_PORT};
use crate::policy::{self, SocketIndex, SocketRef, DEFAULT_MAGNET_RADIUS};
use crate::project_io::{self, ImportSummary, ProjectRecord};

/// One style instruction for the rendering collaborator.
#[derive(Clone, Debug, PartialEq)]
pub struct StyleDirective {
    pub node_id: String,
    pub dimmed: bool,
}

/// Contract consumed from the rendering collaborator. The core never
/// reads layout or z-order internals; it issues commands and hit-test
/// queries through this trait and receives socket positions via
/// `EditorSession::update_socket`.
pub trait RenderBridge {
    fn apply_style(&mut self, directive: StyleDirective);
    fn translate_node(&mut self, node_id: &str, position: Position);
    fn zoom_to_fit(&mut self, node_ids: &[String]);
    /// Which connection (if any) a screen point hits.
    fn hit_connection(&self, point: Position) -> Option<String>;
    /// Fallback socket scan, consulted only when the socket index has no
    /// entries (covers sockets not yet reported into the index).
    fn scan_sockets(&self) -> Vec<(SocketRef, Position)>;
}

/// Bridge that renders nowhere. Used headless (CLI validation) and in
/// tests that don't care about style output.
#[derive(Default, Clone, Copy, Debug)]
pub struct HeadlessBridge;

impl RenderBridge for HeadlessBridge {
    fn apply_style(&mut self, _directive: StyleDirective) {}
    fn translate_node(&mut self, _node_id: &str, _position: Position) {}
    fn zoom_to_fit(&mut self, _node_ids: &[String]) {}
    fn hit_connection(&self, _point: Position) -> Option<String> {
        None
    }
    fn scan_sockets(&self) -> Vec<(SocketRef, Position)> {
        Vec::new()
    }
}

pub struct EditorSession<R: RenderBridge> {
    store: GraphStore,
    registry: AttributeRegistry,
    filter: FilterState,
    sockets: SocketIndex,
    selected_pins: HashSet<(String, usize)>,
    magnet_radius: f64,
    node_count: u32,
    renderer: R,
}

impl<R: RenderBridge> EditorSession<R> {
    pub fn new(renderer: R) -> Self {
        Self {
            store: GraphStore::new(),
            registry: AttributeRegistry::new(),
            filter: FilterState::default(),
            sockets: SocketIndex::new(),
            selected_pins: HashSet::new(),
            magnet_radius: DEFAULT_MAGNET_RADIUS,
            node_count: 0,
            renderer,
        }
    }

    pub fn with_magnet_radius(renderer: R, magnet_radius: f64) -> Self {
        let mut session = Self::new(renderer);
        session.magnet_radius = magnet_radius;
        session
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    pub fn registry(&self) -> &AttributeRegistry {
        &self.registry
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    // ---------------------------------------------------------------
    // Node lifecycle
    // ---------------------------------------------------------------

    pub fn add_node(&mut self, label: &str) -> String {
        let id = self.store.create_node(label).id.clone();
        self.recompute_node_style(&id);
        id
    }

    /// Add a node with the next sequential "Feature N" label, placed in a
    /// simple cascade so fresh nodes don't stack on top of each other.
    pub fn add_feature_node(&mut self) -> String {
        self.node_count += 1;
        let label = format!("Feature {}", self.node_count);
        let id = self.add_node(&label);
        let position = Position::new(100.0 + 40.0 * self.node_count as f64, 100.0);
        if let Some(node) = self.store.node_mut(&id) {
            node.position = position;
        }
        self.renderer.translate_node(&id, position);
        id
    }

    /// Remove a node together with every connection that references it,
    /// connections first so no dangling endpoint is ever observable.
    pub fn remove_node(&mut self, id: &str) {
        for connection_id in self.store.connections_touching(id) {
            self.selected_pins.retain(|(cid, _)| cid != &connection_id);
            self.store.remove_connection(&connection_id);
        }
        self.store.remove_node(id);
        self.sockets.remove_node(id);
    }

    pub fn move_node(&mut self, id: &str, position: Position) {
        if let Some(node) = self.store.node_mut(id) {
            node.position = position;
        }
    }

    pub fn set_node_label(&mut self, id: &str, label: &str) {
        if let Some(node) = self.store.node_mut(id) {
            node.label = label.to_string();
        }
    }

    pub fn set_node_notes(&mut self, id: &str, notes: &str) {
        if let Some(node) = self.store.node_mut(id) {
            node.notes = notes.to_string();
        }
    }

    pub fn set_node_attributes(&mut self, id: &str, attributes: Vec<AttributePair>) {
        if let Some(node) = self.store.node_mut(id) {
            node.attributes = attributes;
        }
    }

    /// Replace a node's tags and re-evaluate its dim state, since tag
    /// membership feeds the focus filter.
    pub fn set_node_tags(&mut self, id: &str, tags: Vec<String>) {
        if let Some(node) = self.store.node_mut(id) {
            node.tags = tags;
        }
        self.recompute_node_style(id);
    }

    /// Drop the whole graph. Catalogs and filter survive a clear; the
    /// sequential label counter resets.
    pub fn clear(&mut self) {
        self.store.clear();
        self.sockets.clear();
        self.selected_pins.clear();
        self.node_count = 0;
    }

    // ---------------------------------------------------------------
    // Catalogs and assignment
    // ---------------------------------------------------------------

    pub fn set_statuses(&mut self, catalog: Vec<Status>) {
        self.registry.set_statuses(catalog, &mut self.store);
    }

    pub fn set_projects(&mut self, catalog: Vec<FeatureProject>) {
        self.registry.set_projects(catalog, &mut self.store);
        // dimming depends on project membership, so every node is re-evaluated
        self.recompute_all_styles();
    }

    pub fn set_node_status(&mut self, node_id: &str, status_id: Option<&str>) {
        self.registry
            .set_node_status(&mut self.store, node_id, status_id);
    }

    pub fn set_node_project(&mut self, node_id: &str, project_id: Option<&str>) {
        self.registry
            .set_node_project(&mut self.store, node_id, project_id);
        self.recompute_node_style(node_id);
    }

    // ---------------------------------------------------------------
    // Focus filter
    // ---------------------------------------------------------------

    /// Replace the filter wholesale and re-style every node.
    pub fn set_filter(&mut self, filter: FilterState) {
        self.filter = filter;
        self.recompute_all_styles();
    }

    fn recompute_node_style(&mut self, node_id: &str) {
        if let Some(node) = self.store.node(node_id) {
            let directive = StyleDirective {
                node_id: node.id.clone(),
                dimmed: should_dim(node, &self.filter),
            };
            self.renderer.apply_style(directive);
        }
    }

    fn recompute_all_styles(&mut self) {
        let directives: Vec<StyleDirective> = self
            .store
            .nodes()
            .iter()
            .map(|node| StyleDirective {
                node_id: node.id.clone(),
                dimmed: should_dim(node, &self.filter),
            })
            .collect();
        for directive in directives {
            self.renderer.apply_style(directive);
        }
    }

    // ---------------------------------------------------------------
    // Connections and gestures
    // ---------------------------------------------------------------

    /// Record a socket's current screen position, reported by the
    /// rendering collaborator whenever it lays a socket out.
    pub fn update_socket(&mut self, socket: SocketRef, center: Position) {
        self.sockets.update(socket, center);
    }

    /// Exact drop on a compatible socket: connect source.out -> target.in
    /// through the eviction rule. Stale ids make this a no-op.
    pub fn connect(&mut self, source_id: &str, target_id: &str) -> Option<String> {
        match policy::connect(&mut self.store, source_id, OUTPUT_PORT, target_id, INPUT_PORT) {
            Ok(id) => Some(id),
            Err(err) => {
                debug!("Connect gesture dropped: {}", err);
                None
            }
        }
    }

    /// Drag released over empty canvas: magnetic completion against the
    /// socket index, falling back to a renderer scan when the index has
    /// no entries yet.
    pub fn complete_drag(&mut self, origin: &SocketRef, drop_point: Position) -> Option<String> {
        let scanned;
        let index = if self.sockets.is_empty() {
            scanned = SocketIndex::from_entries(self.renderer.scan_sockets());
            &scanned
        } else {
            &self.sockets
        };
        policy::complete_drag(&mut self.store, index, origin, drop_point, self.magnet_radius)
    }

    // ---------------------------------------------------------------
    // Selection and deletion
    // ---------------------------------------------------------------

    /// Pointer-down over the canvas: hit-test connections through the
    /// renderer. Returns the hit connection id, if any. A miss with a
    /// non-additive click clears the selection.
    pub fn select_connection_at(&mut self, point: Position, additive: bool) -> Option<String> {
        match self.renderer.hit_connection(point) {
            Some(id) => {
                self.select_connection(&id, additive);
                Some(id)
            }
            None => {
                if !additive {
                    self.clear_selection();
                }
                None
            }
        }
    }

    /// Select a connection. Non-additive selection is exclusive; additive
    /// selection toggles.
    pub fn select_connection(&mut self, id: &str, additive: bool) {
        if !additive {
            self.clear_selection();
        }
        if let Some(connection) = self.store.connection_mut(id) {
            connection.selected = if additive { !connection.selected } else { true };
        }
    }

    /// Append a reroute pin to a connection's waypoint list.
    pub fn add_pin(&mut self, connection_id: &str, position: Position) -> Option<usize> {
        let connection = self.store.connection_mut(connection_id)?;
        connection.pins.push(position);
        Some(connection.pins.len() - 1)
    }

    pub fn select_pin(&mut self, connection_id: &str, pin_index: usize, additive: bool) {
        let exists = self
            .store
            .connection(connection_id)
            .map(|c| pin_index < c.pins.len())
            .unwrap_or(false);
        if !additive {
            self.clear_selection();
        }
        if !exists {
            return;
        }
        let key = (connection_id.to_string(), pin_index);
        if additive && self.selected_pins.contains(&key) {
            self.selected_pins.remove(&key);
        } else {
            self.selected_pins.insert(key);
        }
    }

    pub fn clear_selection(&mut self) {
        let selected: Vec<String> = self
            .store
            .connections()
            .iter()
            .filter(|c| c.selected)
            .map(|c| c.id.clone())
            .collect();
        for id in selected {
            if let Some(connection) = self.store.connection_mut(&id) {
                connection.selected = false;
            }
        }
        self.selected_pins.clear();
    }

    /// Delete every selected connection and selected reroute pin.
    /// Returns whether anything was actually removed, so the caller can
    /// leave the platform's default key behavior alone on a no-op.
    pub fn delete_selected(&mut self) -> bool {
        let selected_connections: Vec<String> = self
            .store
            .connections()
            .iter()
            .filter(|c| c.selected)
            .map(|c| c.id.clone())
            .collect();

        let mut pin_removals: Vec<(String, usize)> = self
            .selected_pins
            .iter()
            .filter(|(cid, _)| !selected_connections.contains(cid))
            .cloned()
            .collect();
        // highest index first, so earlier removals don't shift later ones
        pin_removals.sort_by(|a, b| b.1.cmp(&a.1));

        let mut removed = false;
        for (connection_id, pin_index) in pin_removals {
            if let Some(connection) = self.store.connection_mut(&connection_id) {
                if pin_index < connection.pins.len() {
                    connection.pins.remove(pin_index);
                    removed = true;
                }
            }
        }
        for id in &selected_connections {
            self.store.remove_connection(id);
            removed = true;
        }
        self.selected_pins.clear();
        removed
    }

    // ---------------------------------------------------------------
    // Persistence boundary
    // ---------------------------------------------------------------

    pub fn export(&self, name: &str) -> ProjectRecord {
        project_io::export(&self.store, &self.registry, name)
    }

    pub fn import(&mut self, record: &ProjectRecord) -> ImportSummary {
        self.sockets.clear();
        self.selected_pins.clear();
        let summary = project_io::import(record, &mut self.store, &mut self.registry);
        self.node_count = self.store.nodes().len() as u32;
        self.recompute_all_styles();
        let ids: Vec<String> = self.store.nodes().iter().map(|n| n.id.clone()).collect();
        if !ids.is_empty() {
            self.renderer.zoom_to_fit(&ids);
        }
        summary
    }
}
