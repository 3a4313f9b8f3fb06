//! End-to-end editor flow tests
//!
//! Exercises the graph store, attribute registry, connection policy,
//! focus filter, and serializer together through the session API.

use featuremap::attributes::{FeatureProject, Status};
use featuremap::filter::should_dim;
use featuremap::graph::{Position, INPUT_PORT, OUTPUT_PORT};
use featuremap::policy::{SocketRef, DEFAULT_MAGNET_RADIUS};
use featuremap::session::{EditorSession, HeadlessBridge};

fn session() -> EditorSession<HeadlessBridge> {
    EditorSession::new(HeadlessBridge)
}

/// Build a small populated session: two connected nodes with catalogs,
/// assignments, tags, and a reroute pin.
fn populated_session() -> EditorSession<HeadlessBridge> {
    let mut session = session();
    session.set_statuses(vec![
        Status::new("todo", "To do", "999999"),
        Status::new("done", "Done", "33aa33"),
    ]);
    session.set_projects(vec![
        FeatureProject::new("pay", "Payments", "3366ff"),
        FeatureProject::new("auth", "Auth", "ff6633"),
    ]);

    let a = session.add_node("Card vault");
    let b = session.add_node("Checkout");
    session.set_node_status(&a, Some("todo"));
    session.set_node_project(&a, Some("pay"));
    session.set_node_tags(&a, vec!["Backend".to_string()]);
    session.set_node_notes(&a, "PCI scope");
    session.move_node(&a, Position::new(40.0, 60.0));

    let ab = session.connect(&a, &b).unwrap();
    session.add_pin(&ab, Position::new(90.0, 70.0));
    session
}

#[test]
fn test_roundtrip_preserves_relational_structure() {
    let original = populated_session();
    let record = original.export("roadmap");

    let mut restored = session();
    let summary = restored.import(&record);
    assert_eq!(summary.nodes_imported, 2);
    assert_eq!(summary.connections_imported, 1);
    assert_eq!(summary.connections_dropped, 0);

    let vault = restored
        .store()
        .nodes()
        .iter()
        .find(|n| n.label == "Card vault")
        .expect("node survives the round-trip");
    assert_eq!(vault.status_id.as_deref(), Some("todo"));
    assert_eq!(vault.project_id.as_deref(), Some("pay"));
    assert_eq!(vault.tags, vec!["Backend"]);
    assert_eq!(vault.notes, "PCI scope");
    assert_eq!(vault.position, Position::new(40.0, 60.0));

    // identities are renumbered, structure is equal
    let original_vault = original
        .store()
        .nodes()
        .iter()
        .find(|n| n.label == "Card vault")
        .unwrap();
    assert_ne!(vault.id, original_vault.id);
    let connection = &restored.store().connections()[0];
    assert_eq!(connection.source, vault.id);
    assert_eq!(connection.pins, vec![Position::new(90.0, 70.0)]);
    assert_eq!(restored.registry().statuses().len(), 2);
    assert_eq!(restored.registry().projects().len(), 2);
}

#[test]
fn test_catalog_shrink_invariant_holds_for_all_nodes() {
    let mut session = populated_session();
    session.set_statuses(vec![Status::new("done", "Done", "33aa33")]);
    for node in session.store().nodes() {
        let ok = match node.status_id.as_deref() {
            None => true,
            Some(id) => id == "done",
        };
        assert!(ok, "node {} kept a status outside the catalog", node.id);
    }
}

#[test]
fn test_single_valued_port_invariant_after_connection_churn() {
    let mut session = session();
    let a = session.add_node("A");
    let b = session.add_node("B");
    let c = session.add_node("C");
    let d = session.add_node("D");

    let _ = session.connect(&a, &b);
    let _ = session.connect(&c, &b);
    let _ = session.connect(&c, &d);
    let _ = session.connect(&a, &d);
    let _ = session.connect(&a, &b);

    for node in [&a, &c] {
        assert!(session.store().connections_from(node, OUTPUT_PORT).len() <= 1);
    }
    for node in [&b, &d] {
        assert!(session.store().connections_into(node, INPUT_PORT).len() <= 1);
    }
}

#[test]
fn test_eviction_scenario_second_source_wins() {
    let mut session = session();
    let a = session.add_node("A");
    let b = session.add_node("B");
    let c = session.add_node("C");

    session.connect(&a, &b).unwrap();
    session.connect(&c, &b).unwrap();

    let into_b = session.store().connections_into(&b, INPUT_PORT);
    assert_eq!(into_b.len(), 1);
    assert_eq!(into_b[0].source, c);
}

#[test]
fn test_magnetic_boundary_through_session() {
    let mut session = session();
    let a = session.add_node("A");
    let b = session.add_node("B");
    session.update_socket(SocketRef::output(&a), Position::new(0.0, 0.0));
    session.update_socket(
        SocketRef::input(&b),
        Position::new(DEFAULT_MAGNET_RADIUS, 0.0),
    );

    // drop exactly at the boundary distance: accepted
    let origin = SocketRef::output(&a);
    let id = session.complete_drag(&origin, Position::new(0.0, 0.0));
    assert!(id.is_some());

    // one unit beyond: rejected, graph untouched
    let mut far_session = EditorSession::new(HeadlessBridge);
    let a = far_session.add_node("A");
    let b = far_session.add_node("B");
    far_session.update_socket(SocketRef::output(&a), Position::new(0.0, 0.0));
    far_session.update_socket(
        SocketRef::input(&b),
        Position::new(DEFAULT_MAGNET_RADIUS + 1.0, 0.0),
    );
    let origin = SocketRef::output(&a);
    assert!(far_session
        .complete_drag(&origin, Position::new(0.0, 0.0))
        .is_none());
    assert!(far_session.store().connections().is_empty());
}

#[test]
fn test_node_removal_leaves_no_dangling_connections() {
    let mut session = populated_session();
    let checkout = session
        .store()
        .nodes()
        .iter()
        .find(|n| n.label == "Checkout")
        .unwrap()
        .id
        .clone();

    session.remove_node(&checkout);
    assert!(session.store().connections().is_empty());
    assert!(session.store().verify_integrity().is_ok());
}

#[test]
fn test_project_catalog_emptied_undims_everything() {
    let mut session = populated_session();

    session.set_projects(vec![]);
    for node in session.store().nodes() {
        assert!(node.project_id.is_none());
        // filter and catalogs are now both empty, so nothing is dimmed
        assert!(!should_dim(node, session.filter()));
    }
}

#[test]
fn test_import_drops_connection_with_absent_source() {
    let mut record = populated_session().export("roadmap");
    record.connections[0].source = "no-such-node".to_string();

    let mut restored = session();
    let summary = restored.import(&record);
    assert_eq!(summary.connections_dropped, 1);
    assert!(restored.store().connections().is_empty());
    assert_eq!(restored.store().nodes().len(), 2);
}
