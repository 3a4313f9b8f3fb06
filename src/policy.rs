//! Connection admission rules: single-valued port eviction and magnetic
//! completion of drag gestures that end near, but not on, a socket.

use indexmap::IndexMap;
use tracing::debug;

use crate::errors::{GraphError, GraphResult};
use crate::graph::{GraphStore, Position};

/// Default search radius, in screen pixels, for magnetic completion.
pub const DEFAULT_MAGNET_RADIUS: f64 = 40.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PortSide {
    Input,
    Output,
}

impl PortSide {
    pub fn opposite(self) -> PortSide {
        match self {
            PortSide::Input => PortSide::Output,
            PortSide::Output => PortSide::Input,
        }
    }
}

/// Identity of one on-screen socket: (node, port key, side).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SocketRef {
    pub node: String,
    pub port: String,
    pub side: PortSide,
}

impl SocketRef {
    pub fn input(node: &str) -> Self {
        Self {
            node: node.to_string(),
            port: crate::graph::INPUT_PORT.to_string(),
            side: PortSide::Input,
        }
    }

    pub fn output(node: &str) -> Self {
        Self {
            node: node.to_string(),
            port: crate::graph::OUTPUT_PORT.to_string(),
            side: PortSide::Output,
        }
    }
}

/// Last-known screen positions of sockets, maintained by explicit update
/// calls from the rendering collaborator. Enumeration order is insertion
/// order, which doubles as the tie-break for equidistant candidates:
/// first registered wins.
#[derive(Clone, Debug, Default)]
pub struct SocketIndex {
    positions: IndexMap<SocketRef, Position>,
}

impl SocketIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<(SocketRef, Position)>) -> Self {
        Self {
            positions: entries.into_iter().collect(),
        }
    }

    /// Record the current screen center of a socket. Repeated updates for
    /// the same socket keep its original enumeration slot.
    pub fn update(&mut self, socket: SocketRef, center: Position) {
        self.positions.insert(socket, center);
    }

    /// Drop every socket belonging to a node, e.g. when it is removed.
    pub fn remove_node(&mut self, node_id: &str) {
        self.positions.retain(|socket, _| socket.node != node_id);
    }

    pub fn clear(&mut self) {
        self.positions.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Nearest socket of the opposite side within `radius` of `point`,
    /// excluding the socket the drag originated from. The boundary is
    /// inclusive: a candidate exactly at `radius` is accepted.
    pub fn nearest_opposite(
        &self,
        origin: &SocketRef,
        point: Position,
        radius: f64,
    ) -> Option<SocketRef> {
        let wanted = origin.side.opposite();
        let mut best: Option<(f64, &SocketRef)> = None;

        for (socket, center) in &self.positions {
            if socket.side != wanted || socket == origin {
                continue;
            }
            let distance = point.distance_to(*center);
            if distance > radius {
                continue;
            }
            match best {
                Some((best_distance, _)) if distance >= best_distance => {}
                _ => best = Some((distance, socket)),
            }
        }

        best.map(|(_, socket)| socket.clone())
    }
}

/// Create a connection, first evicting any existing connection on a
/// single-valued endpoint so the store never transiently violates port
/// multiplicity. Endpoints are validated before eviction; a failed
/// attempt leaves the graph untouched.
pub fn connect(
    store: &mut GraphStore,
    source: &str,
    source_output: &str,
    target: &str,
    target_input: &str,
) -> GraphResult<String> {
    if store.node(source).is_none() {
        return Err(GraphError::InvalidEndpoint(source.to_string()));
    }
    if store.node(target).is_none() {
        return Err(GraphError::InvalidEndpoint(target.to_string()));
    }

    // Unknown port keys fall back to the single-valued default.
    let source_single = store
        .node(source)
        .and_then(|n| n.port(source_output))
        .map(|p| !p.multiple_connections)
        .unwrap_or(true);
    let target_single = store
        .node(target)
        .and_then(|n| n.port(target_input))
        .map(|p| !p.multiple_connections)
        .unwrap_or(true);

    if source_single {
        for id in evicted_ids(store.connections_from(source, source_output)) {
            debug!("Evicting connection {} from single-valued output", id);
            store.remove_connection(&id);
        }
    }
    if target_single {
        for id in evicted_ids(store.connections_into(target, target_input)) {
            debug!("Evicting connection {} from single-valued input", id);
            store.remove_connection(&id);
        }
    }

    let connection = store.create_connection(source, source_output, target, target_input)?;
    Ok(connection.id.clone())
}

fn evicted_ids(connections: Vec<&crate::graph::Connection>) -> Vec<String> {
    connections.iter().map(|c| c.id.clone()).collect()
}

/// Resolve a drag gesture that ended over empty canvas. Searches the
/// socket index for the nearest opposite-side socket within `radius` and
/// completes the connection through the eviction rule. Returns the new
/// connection id, or `None` when the gesture was abandoned (no candidate
/// in range, or an endpoint disappeared mid-gesture). An abandoned drag
/// leaves the graph exactly as it was before the drag began.
pub fn complete_drag(
    store: &mut GraphStore,
    index: &SocketIndex,
    origin: &SocketRef,
    drop_point: Position,
    radius: f64,
) -> Option<String> {
    let candidate = match index.nearest_opposite(origin, drop_point, radius) {
        Some(candidate) => candidate,
        None => {
            debug!("No socket within {}px of drop point, abandoning drag", radius);
            return None;
        }
    };

    let (source, target) = match origin.side {
        PortSide::Output => (origin, &candidate),
        PortSide::Input => (&candidate, origin),
    };

    match connect(
        store,
        &source.node,
        &source.port,
        &target.node,
        &target.port,
    ) {
        Ok(id) => Some(id),
        Err(err) => {
            // Stale drop events (socket removed a frame earlier) are
            // expected during gesture-driven mutation; treat as no-op.
            debug!("Magnetic completion dropped: {}", err);
            None
        }
    }
}
