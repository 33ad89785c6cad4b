//! Integration tests: editor session driven by raw input (lcf-editor).
//!
//! Feeds pointer, wheel and keyboard events through `EditorSession` and
//! checks the diagram, the cached connection curves and the selection.

use lcf_core::NodeId;
use lcf_core::model::*;
use lcf_core::placement::{PLACEMENT_PADDING, nodes_overlap};
use lcf_editor::{DiagramEngine, EditorSession, InputEvent, Modifiers, Selection, ToolKind};
use lcf_render::CanvasTheme;
use lcf_render::paint::DrawOp;
use pretty_assertions::assert_eq;

const NONE: Modifiers = Modifiers::NONE;

fn make_session() -> EditorSession {
    let mut engine = DiagramEngine::new();
    engine
        .load_json(include_str!("fixtures/daily_plan.json"))
        .unwrap();
    EditorSession::with_engine(engine, 800.0, 600.0)
}

fn click(s: &mut EditorSession, x: f64, y: f64, modifiers: Modifiers) {
    s.handle(&InputEvent::pointer_down(x, y, modifiers));
    s.handle(&InputEvent::pointer_up(x, y, modifiers));
}

fn drag(s: &mut EditorSession, from: (f64, f64), to: (f64, f64)) {
    s.handle(&InputEvent::pointer_down(from.0, from.1, NONE));
    s.handle(&InputEvent::pointer_move(to.0, to.1, NONE));
    s.handle(&InputEvent::pointer_up(to.0, to.1, NONE));
}

fn sorted(ids: &[NodeId]) -> Vec<&str> {
    let mut out: Vec<&str> = ids.iter().map(|id| id.as_str()).collect();
    out.sort_unstable();
    out
}

// ─── Live connection updates ────────────────────────────────────────────

#[test]
fn dragging_node_recomputes_touching_connections() {
    let mut s = make_session();
    let untouched = NodeId::intern("c_morning_read");
    let before = s.engine.path(untouched);

    drag(&mut s, (330.0, 30.0), (350.0, 40.0));

    let gym = s.engine.diagram().node(NodeId::intern("gym")).unwrap();
    assert_eq!((gym.x, gym.y), (320.0, 10.0));
    assert_eq!(
        sorted(s.engine.last_recomputed()),
        vec!["c_gym_sleep", "c_morning_gym"]
    );
    for id in ["c_gym_sleep", "c_morning_gym"] {
        let id = NodeId::intern(id);
        assert_eq!(s.engine.path(id), s.engine.diagram().connection_path(id));
    }
    assert_eq!(s.engine.path(untouched), before);
    assert!(s.engine.is_dirty());
}

#[test]
fn arrow_tracks_moved_target() {
    let mut s = make_session();
    let conn = NodeId::intern("c_morning_gym");
    drag(&mut s, (330.0, 30.0), (330.0, 230.0));

    let path = s.engine.path(conn).unwrap();
    let gym = s.engine.diagram().node(NodeId::intern("gym")).unwrap();
    // Circle boundary: the tip sits on the radius.
    assert!((path.end.distance(gym.center()) - gym.radius()).abs() < 1e-6);
}

#[test]
fn dragging_group_moves_every_selected_node() {
    let mut s = make_session();
    click(&mut s, 50.0, 25.0, NONE);
    click(&mut s, 50.0, 225.0, Modifiers::new(true, false, false, false));
    assert_eq!(sorted(s.engine.selection.nodes()), vec!["morning", "read"]);

    drag(&mut s, (50.0, 25.0), (60.0, 35.0));

    let d = s.engine.diagram();
    let morning = d.node(NodeId::intern("morning")).unwrap();
    let read = d.node(NodeId::intern("read")).unwrap();
    assert_eq!((morning.x, morning.y), (10.0, 10.0));
    assert_eq!((read.x, read.y), (10.0, 210.0));
}

// ─── Deletion ───────────────────────────────────────────────────────────

#[test]
fn deleting_hub_cascades_connections() {
    let mut s = make_session();
    click(&mut s, 50.0, 25.0, NONE);
    assert_eq!(s.engine.selection, Selection::node(NodeId::intern("morning")));

    assert!(s.handle_key("Delete", NONE));

    let d = s.engine.diagram();
    assert_eq!(d.node_count(), 3);
    assert_eq!(
        d.connections().map(|c| c.id.as_str()).collect::<Vec<_>>(),
        vec!["c_gym_sleep"]
    );
    assert_eq!(s.engine.path(NodeId::intern("c_morning_gym")), None);
    assert_eq!(s.engine.selection, Selection::None);
}

#[test]
fn deleting_connection_keeps_nodes() {
    let mut s = make_session();
    let path = s.engine.path(NodeId::intern("c_gym_sleep")).unwrap();
    let mid = path.eval(0.5);
    click(&mut s, mid.x, mid.y, NONE);
    assert_eq!(
        s.engine.selection,
        Selection::Connection(NodeId::intern("c_gym_sleep"))
    );

    assert!(s.handle_key("Backspace", NONE));
    assert_eq!(s.engine.diagram().node_count(), 4);
    assert_eq!(s.engine.diagram().connection_count(), 2);
}

// ─── Creation ───────────────────────────────────────────────────────────

#[test]
fn shape_tool_places_node_and_returns_to_select() {
    let mut s = make_session();
    assert!(s.handle_key("r", NONE));
    assert_eq!(s.active_tool(), ToolKind::Rectangle);

    click(&mut s, 600.0, 450.0, NONE);

    assert_eq!(s.active_tool(), ToolKind::Select);
    assert_eq!(s.engine.diagram().node_count(), 5);
    let [id] = s.engine.selection.nodes() else {
        panic!("expected one selected node, got {:?}", s.engine.selection);
    };
    let node = s.engine.diagram().node(*id).unwrap();
    assert_eq!(node.shape, NodeShape::Rectangle);
    assert_eq!((node.width, node.height), NodeShape::Rectangle.default_size());
    assert_eq!(node.center(), Point::new(600.0, 450.0));
}

#[test]
fn new_node_is_nudged_off_neighbours() {
    let mut s = make_session();
    s.handle_key("c", NONE);
    // Empty point, but a circle centered here would overlap "morning".
    click(&mut s, 150.0, 25.0, NONE);

    let id = s.engine.selection.nodes()[0];
    let d = s.engine.diagram();
    let placed = d.node(id).unwrap();
    assert_ne!(placed.center(), Point::new(150.0, 25.0));
    for other in d.nodes().filter(|n| n.id != id) {
        assert!(
            !nodes_overlap(placed, other, PLACEMENT_PADDING),
            "{} overlaps {}",
            placed.id,
            other.id
        );
    }
}

#[test]
fn connect_tool_uses_active_color() {
    let mut s = make_session();
    s.engine.active_color = ConnectionColor::Red;
    s.set_tool(ToolKind::Connect);

    s.handle(&InputEvent::pointer_down(50.0, 225.0, NONE));
    s.handle(&InputEvent::pointer_move(200.0, 230.0, NONE));
    assert!(s.overlay().preview.is_some());
    s.handle(&InputEvent::pointer_up(380.0, 240.0, NONE));

    assert!(s.overlay().preview.is_none());
    let d = s.engine.diagram();
    assert_eq!(d.connection_count(), 4);
    let conn = d
        .connections()
        .find(|c| c.source == NodeId::intern("read"))
        .unwrap();
    assert_eq!(conn.target, NodeId::intern("sleep"));
    assert_eq!(conn.color, ConnectionColor::Red);
    assert!(s.engine.path(conn.id).is_some());
    assert_eq!(s.active_tool(), ToolKind::Connect);
}

#[test]
fn duplicate_connection_is_ignored() {
    let mut s = make_session();
    s.set_tool(ToolKind::Connect);
    drag(&mut s, (50.0, 25.0), (330.0, 30.0));
    assert_eq!(s.engine.diagram().connection_count(), 3);

    // The reverse direction is a different connection.
    drag(&mut s, (330.0, 30.0), (50.0, 25.0));
    assert_eq!(s.engine.diagram().connection_count(), 4);
}

// ─── Clipboard ──────────────────────────────────────────────────────────

#[test]
fn paste_offsets_and_reselects() {
    let mut s = make_session();
    let cmd = Modifiers::new(false, true, false, false);
    click(&mut s, 50.0, 25.0, NONE);
    assert!(s.handle_key("c", cmd));
    assert!(s.handle_key("v", cmd));

    let first = s.engine.selection.nodes().to_vec();
    assert_eq!(first.len(), 1);
    assert_ne!(first[0], NodeId::intern("morning"));
    let copy = s.engine.diagram().node(first[0]).unwrap();
    assert_eq!((copy.x, copy.y), (20.0, 20.0));
    assert_eq!(copy.text, "Morning");

    assert!(s.handle_key("v", cmd));
    let second = s.engine.selection.nodes()[0];
    let copy = s.engine.diagram().node(second).unwrap();
    assert_eq!((copy.x, copy.y), (40.0, 40.0));

    assert_eq!(s.engine.diagram().node_count(), 6);
    assert_eq!(s.engine.diagram().connection_count(), 3);
}

#[test]
fn cut_removes_then_paste_restores_shape() {
    let mut s = make_session();
    let cmd = Modifiers::new(false, false, false, true);
    click(&mut s, 380.0, 240.0, NONE);
    assert!(s.handle_key("x", cmd));
    assert_eq!(s.engine.diagram().node_count(), 3);
    assert_eq!(s.engine.diagram().connection_count(), 2);

    assert!(s.handle_key("v", cmd));
    let id = s.engine.selection.nodes()[0];
    assert_eq!(s.engine.diagram().node(id).unwrap().shape, NodeShape::Cloud);
}

// ─── View ───────────────────────────────────────────────────────────────

#[test]
fn wheel_zoom_keeps_point_under_cursor() {
    let mut s = make_session();
    let anchor = Point::new(330.0, 30.0);
    let before = s.engine.viewport().screen_to_model(anchor);
    assert!(s.handle(&InputEvent::Wheel {
        x: anchor.x,
        y: anchor.y,
        delta_y: -120.0,
    }));
    let after = s.engine.viewport().screen_to_model(anchor);
    assert!(before.distance(after) < 1e-9);
    assert!(s.engine.viewport().scale > 1.0);

    // The node under the cursor is still hit after zooming.
    click(&mut s, anchor.x, anchor.y, NONE);
    assert_eq!(s.engine.selection, Selection::node(NodeId::intern("gym")));
}

#[test]
fn pan_tool_moves_view_not_nodes() {
    let mut s = make_session();
    s.handle_key("h", NONE);
    drag(&mut s, (100.0, 100.0), (140.0, 70.0));
    let vp = s.engine.viewport();
    assert_eq!((vp.x, vp.y), (40.0, -30.0));
    let morning = s.engine.diagram().node(NodeId::intern("morning")).unwrap();
    assert_eq!((morning.x, morning.y), (0.0, 0.0));
}

#[test]
fn marquee_is_drawn_while_dragging() {
    let mut s = make_session();
    s.handle(&InputEvent::pointer_down(-20.0, -20.0, NONE));
    s.handle(&InputEvent::pointer_move(120.0, 270.0, NONE));

    let ops = s.draw_list(&CanvasTheme::dark());
    let dashed = ops
        .iter()
        .filter(|op| matches!(op, DrawOp::Stroke { dashed: true, .. }))
        .count();
    assert!(dashed >= 1);

    s.handle(&InputEvent::pointer_up(120.0, 270.0, NONE));
    assert_eq!(sorted(s.engine.selection.nodes()), vec!["morning", "read"]);
    assert!(s.overlay().marquee.is_none());
}

// ─── Persistence ────────────────────────────────────────────────────────

#[test]
fn save_and_reload_preserves_diagram() {
    let mut s = make_session();
    assert!(!s.engine.is_dirty());
    drag(&mut s, (330.0, 30.0), (350.0, 30.0));
    s.handle(&InputEvent::Wheel {
        x: 0.0,
        y: 0.0,
        delta_y: -1.0,
    });

    let json = s.engine.to_json();
    s.engine.mark_saved();
    assert!(!s.engine.is_dirty());

    let mut reloaded = DiagramEngine::new();
    reloaded.load_json(&json).unwrap();
    assert_eq!(reloaded.to_content(), s.engine.to_content());
    let gym = reloaded.diagram().node(NodeId::intern("gym")).unwrap();
    assert_eq!(gym.x, 320.0);
    assert!((reloaded.viewport().scale - 1.1).abs() < 1e-12);
}

#[test]
fn bad_json_leaves_session_untouched() {
    let mut s = make_session();
    assert!(s.engine.load_json("{ \"nodes\": [ {").is_err());
    assert_eq!(s.engine.diagram().node_count(), 4);
    assert_eq!(s.engine.diagram().connection_count(), 3);
}
