use std::cell::RefCell;

use path_loom::graph_utils::graph::{EdgeKey, GraphView, NodeKey, RenderedGraph, decode_edge_key};
use path_loom::graph_utils::layered::{Align, DagreGraph, GraphLabel, LayeredGraph, NodeLabel, RankDir, Ranker};
use path_loom::graph_utils::layout::{DEFAULT_NODE_SIZE, LayoutAssigner, LayoutConfig, layout_dagre};

fn chain(keys: &[&str], label: &str) -> RenderedGraph {
    let mut g = RenderedGraph::new();
    for k in keys {
        g.add_node(k.to_string(), k.to_uppercase(), "User".into(), None);
    }
    for w in keys.windows(2) {
        g.add_edge(w[0], w[1], label);
    }
    g
}

fn pos(g: &RenderedGraph, key: &str) -> (f64, f64) {
    g.node_position(key).unwrap()
}

// ── adapter ──────────────────────────────────────────────────────────

#[test]
fn absent_or_empty_graph_is_a_noop() {
    let mut assigner = layout_dagre::<RenderedGraph>(None, LayoutConfig::default());
    assert!(assigner.is_noop());
    assert_eq!(assigner.assign(), 0);

    let mut empty = RenderedGraph::new();
    let mut assigner = layout_dagre(Some(&mut empty), LayoutConfig::default());
    assert!(assigner.is_noop());
    assert_eq!(assigner.assign(), 0);
}

#[test]
fn left_to_right_chain_advances_along_x() {
    let mut g = chain(&["a", "b", "c"], "MemberOf");
    let n = layout_dagre(Some(&mut g), LayoutConfig::new(RankDir::LR, 100.0)).assign();
    assert_eq!(n, 3);
    let (a, b, c) = (pos(&g, "a"), pos(&g, "b"), pos(&g, "c"));
    assert!(a.0 < b.0 && b.0 < c.0, "{:?} {:?} {:?}", a, b, c);
    assert!((a.1 - b.1).abs() < 1.0 && (b.1 - c.1).abs() < 1.0);
    // default size 30 keeps neighbouring ranks apart
    assert!(b.0 - a.0 >= DEFAULT_NODE_SIZE);
}

#[test]
fn layout_is_idempotent() {
    let mut g = chain(&["a", "b", "c", "d"], "AdminTo");
    g.add_edge("a", "d", "HasSession");
    g.add_edge("b", "d", "CanRDP");
    let cfg = LayoutConfig::new(RankDir::TB, 50.0);

    layout_dagre(Some(&mut g), cfg.clone()).assign();
    let first: Vec<(f64, f64)> = g.node_keys().iter().map(|k| pos(&g, k)).collect();
    layout_dagre(Some(&mut g), cfg).assign();
    let second: Vec<(f64, f64)> = g.node_keys().iter().map(|k| pos(&g, k)).collect();
    assert_eq!(first, second);
}

#[test]
fn layout_never_touches_edges_or_other_attributes() {
    let mut g = chain(&["a", "b"], "MemberOf");
    g.set_node_size("a", Some(40.0));
    if let Some(e) = g.edge_mut("a_MemberOf_b") {
        e.color = Some("#444".into());
    }
    let edges_before = g.edges().to_vec();
    layout_dagre(Some(&mut g), LayoutConfig::default()).assign();
    assert_eq!(g.edges(), edges_before.as_slice());
    assert_eq!(g.order(), 2);
    assert_eq!(g.node("a").and_then(|n| n.size), Some(40.0));
    assert_eq!(g.node("a").map(|n| n.label.as_str()), Some("A"));
}

thread_local! {
    static SEEN_NODES: RefCell<Vec<(String, NodeLabel)>> = const { RefCell::new(Vec::new()) };
    static SEEN_EDGES: RefCell<Vec<(String, String, String)>> = const { RefCell::new(Vec::new()) };
    static SEEN_GRAPH: RefCell<Option<GraphLabel>> = const { RefCell::new(None) };
}

// Records what the adapter hands the engine and places nodes at fixed spots,
// except "lost" which gets no coordinates.
#[derive(Default)]
struct RecordingEngine {
    nodes: Vec<(String, NodeLabel)>,
}

impl LayeredGraph for RecordingEngine {
    fn new_multigraph() -> Self {
        SEEN_NODES.with(|s| s.borrow_mut().clear());
        SEEN_EDGES.with(|s| s.borrow_mut().clear());
        Self::default()
    }

    fn set_graph(&mut self, label: GraphLabel) {
        SEEN_GRAPH.with(|s| *s.borrow_mut() = Some(label));
    }

    fn graph(&self) -> &GraphLabel {
        unimplemented!()
    }

    fn set_node(&mut self, id: &str, label: NodeLabel) {
        SEEN_NODES.with(|s| s.borrow_mut().push((id.to_string(), label.clone())));
        self.nodes.push((id.to_string(), label));
    }

    fn set_edge(&mut self, source: &str, target: &str, name: &str) {
        SEEN_EDGES.with(|s| s.borrow_mut().push((source.to_string(), target.to_string(), name.to_string())));
    }

    fn layout(&mut self) {
        for (i, (id, label)) in self.nodes.iter_mut().enumerate() {
            if id == "lost" {
                continue;
            }
            label.x = Some(100.0 * (i as f64 + 1.0));
            label.y = Some(if id == "nan" { f64::NAN } else { 7.0 });
        }
    }

    fn node(&self, id: &str) -> Option<&NodeLabel> {
        self.nodes.iter().find(|(k, _)| k == id).map(|(_, l)| l)
    }

    fn node_ids(&self) -> Vec<String> {
        self.nodes.iter().map(|(k, _)| k.clone()).collect()
    }

    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn edge_count(&self) -> usize {
        SEEN_EDGES.with(|s| s.borrow().len())
    }
}

#[test]
fn adapter_copies_sizes_with_default_fallback() {
    let mut g = RenderedGraph::new();
    g.add_node("sized".into(), "Sized".into(), "User".into(), Some(48.0));
    g.add_node("unset".into(), "Unset".into(), "User".into(), None);
    g.add_node("zero".into(), "Zero".into(), "User".into(), Some(0.0));

    LayoutAssigner::<RenderedGraph, RecordingEngine>::new(Some(&mut g), LayoutConfig::default()).assign();

    let seen = SEEN_NODES.with(|s| s.borrow().clone());
    let size_of = |key: &str| {
        let (_, l) = seen.iter().find(|(k, _)| k == key).unwrap();
        (l.width, l.height, l.label.clone())
    };
    assert_eq!(size_of("sized"), (48.0, 48.0, "Sized".to_string()));
    assert_eq!(size_of("unset"), (DEFAULT_NODE_SIZE, DEFAULT_NODE_SIZE, "Unset".to_string()));
    assert_eq!(size_of("zero"), (DEFAULT_NODE_SIZE, DEFAULT_NODE_SIZE, "Zero".to_string()));
}

#[test]
fn adapter_copies_edges_and_passes_options() {
    let mut g = chain(&["a", "b"], "MemberOf");
    g.add_edge_with_key("opaque".into(), "b", "a", "Contains");

    let mut cfg = LayoutConfig::new(RankDir::BT, 120.0);
    cfg.align = Some(Align::UR);
    cfg.nodesep = Some(10.0);
    cfg.ranker = Some(Ranker::LongestPath);
    LayoutAssigner::<RenderedGraph, RecordingEngine>::new(Some(&mut g), cfg).assign();

    let edges = SEEN_EDGES.with(|s| s.borrow().clone());
    assert_eq!(
        edges,
        vec![
            ("a".to_string(), "b".to_string(), "MemberOf".to_string()),
            ("b".to_string(), "a".to_string(), "Contains".to_string()),
        ]
    );

    let label = SEEN_GRAPH.with(|s| s.borrow().clone()).unwrap();
    assert_eq!(label.rankdir, RankDir::BT);
    assert_eq!(label.ranksep, 120.0);
    assert_eq!(label.align, Some(Align::UR));
    assert_eq!(label.nodesep, 10.0);
    assert_eq!(label.ranker, Ranker::LongestPath);
    // unset options keep the engine defaults
    assert_eq!(label.edgesep, GraphLabel::default().edgesep);
}

#[test]
fn adapter_keeps_underscored_node_keys_intact() {
    let mut g = chain(&["n_1", "n_2"], "MemberOf");
    LayoutAssigner::<RenderedGraph, RecordingEngine>::new(Some(&mut g), LayoutConfig::default()).assign();

    let nodes: Vec<String> = SEEN_NODES.with(|s| s.borrow().iter().map(|(k, _)| k.clone()).collect());
    assert_eq!(nodes, vec!["n_1".to_string(), "n_2".to_string()]);
    let edges = SEEN_EDGES.with(|s| s.borrow().clone());
    assert_eq!(edges, vec![("n_1".to_string(), "n_2".to_string(), "MemberOf".to_string())]);
}

// A view that only knows edges by key, like a renderer without edge attributes.
struct KeyOnlyGraph {
    nodes: Vec<(NodeKey, f64, f64)>,
    edges: Vec<EdgeKey>,
}

impl GraphView for KeyOnlyGraph {
    fn order(&self) -> usize { self.nodes.len() }
    fn size(&self) -> usize { self.edges.len() }
    fn node_keys(&self) -> Vec<NodeKey> { self.nodes.iter().map(|n| n.0.clone()).collect() }
    fn node_label(&self, key: &str) -> Option<&str> { self.nodes.iter().find(|n| n.0 == key).map(|n| n.0.as_str()) }
    fn node_size(&self, _key: &str) -> Option<f64> { None }
    fn node_position(&self, key: &str) -> Option<(f64, f64)> {
        self.nodes.iter().find(|n| n.0 == key).map(|n| (n.1, n.2))
    }
    fn set_node_position(&mut self, key: &str, x: f64, y: f64) -> bool {
        match self.nodes.iter_mut().find(|n| n.0 == key) {
            Some(n) => {
                n.1 = x;
                n.2 = y;
                true
            }
            None => false,
        }
    }
    fn edge_keys(&self) -> Vec<EdgeKey> { self.edges.clone() }
    fn decode_edge(&self, key: &str) -> Option<(NodeKey, NodeKey, String)> { decode_edge_key(key) }
}

#[test]
fn adapter_skips_undecodable_edges() {
    let mut g = KeyOnlyGraph {
        nodes: vec![("a".into(), 0.0, 0.0), ("b".into(), 0.0, 0.0)],
        edges: vec!["a_MemberOf_b".into(), "opaque".into(), "a__b".into()],
    };
    let n = LayoutAssigner::<KeyOnlyGraph, RecordingEngine>::new(Some(&mut g), LayoutConfig::default()).assign();
    assert_eq!(n, 2);
    let edges = SEEN_EDGES.with(|s| s.borrow().clone());
    assert_eq!(edges, vec![("a".to_string(), "b".to_string(), "MemberOf".to_string())]);
}

#[test]
fn adapter_skips_reserved_and_unpositioned_nodes() {
    let mut g = RenderedGraph::new();
    for k in ["ok", "ReadWrite", "lost", "nan"] {
        g.add_node(k.into(), k.into(), "AZApp".into(), None);
        g.set_node_position(k, -1.0, -1.0);
    }

    let n = LayoutAssigner::<RenderedGraph, RecordingEngine>::new(Some(&mut g), LayoutConfig::default()).assign();
    assert_eq!(n, 1);
    assert_eq!(pos(&g, "ok"), (100.0, 7.0));
    assert_eq!(pos(&g, "ReadWrite"), (-1.0, -1.0));
    assert_eq!(pos(&g, "lost"), (-1.0, -1.0));
    assert_eq!(pos(&g, "nan"), (-1.0, -1.0));
}

// ── engine ───────────────────────────────────────────────────────────

fn engine(label: GraphLabel) -> DagreGraph {
    let mut e = DagreGraph::new_multigraph();
    e.set_graph(label);
    e
}

fn center(e: &DagreGraph, id: &str) -> (f64, f64) {
    let n = e.node(id).unwrap();
    (n.x.unwrap(), n.y.unwrap())
}

fn fan_out(label: GraphLabel) -> DagreGraph {
    let mut e = engine(label);
    for id in ["a", "b", "c"] {
        e.set_node(id, NodeLabel::new(id, 30.0, 30.0));
    }
    e.set_edge("a", "b", "MemberOf");
    e.set_edge("a", "c", "MemberOf");
    e.layout();
    e
}

#[test]
fn engine_separates_ranks_and_siblings() {
    let e = fan_out(GraphLabel { ranksep: 40.0, nodesep: 50.0, ..Default::default() });
    let (a, b, c) = (center(&e, "a"), center(&e, "b"), center(&e, "c"));
    assert!(b.1 - a.1 >= 30.0, "{:?} {:?}", a, b);
    assert!((b.1 - c.1).abs() < 1.0);
    assert!((c.0 - b.0).abs() >= 30.0, "siblings overlap: {:?} {:?}", b, c);

    let rank = |id: &str| e.node(id).and_then(|n| n.rank);
    assert_eq!((rank("a"), rank("b"), rank("c")), (Some(0), Some(1), Some(1)));
    let orders: Vec<Option<usize>> = ["b", "c"].iter().map(|id| e.node(id).and_then(|n| n.order)).collect();
    assert!(orders.contains(&Some(0)) && orders.contains(&Some(1)));
}

#[test]
fn engine_honors_direction() {
    let dirs = [RankDir::TB, RankDir::BT, RankDir::LR, RankDir::RL];
    let mut results = Vec::new();
    for dir in dirs {
        let mut e = engine(GraphLabel { rankdir: dir, ..Default::default() });
        e.set_node("a", NodeLabel::new("a", 20.0, 20.0));
        e.set_node("b", NodeLabel::new("b", 20.0, 20.0));
        e.set_edge("a", "b", "AdminTo");
        e.layout();
        results.push((center(&e, "a"), center(&e, "b")));
    }
    let [tb, bt, lr, rl] = [results[0], results[1], results[2], results[3]];
    assert!(tb.0.1 < tb.1.1);
    assert!(bt.0.1 > bt.1.1);
    assert!(lr.0.0 < lr.1.0);
    assert!(rl.0.0 > rl.1.0);
}

#[test]
fn engine_applies_margins_to_top_left_corner() {
    let mut e = engine(GraphLabel { marginx: 25.0, marginy: 10.0, ..Default::default() });
    e.set_node("a", NodeLabel::new("a", 40.0, 20.0));
    e.layout();
    assert_eq!(center(&e, "a"), (25.0 + 20.0, 10.0 + 10.0));
    assert_eq!(e.graph().width, 40.0 + 50.0);
    assert_eq!(e.graph().height, 20.0 + 20.0);
}

#[test]
fn engine_aligns_ranks_to_one_side() {
    let left = fan_out(GraphLabel { align: Some(Align::UL), ..Default::default() });
    let (a, b, c) = (center(&left, "a"), center(&left, "b"), center(&left, "c"));
    assert!((a.0 - b.0.min(c.0)).abs() < 1e-9, "{:?} {:?} {:?}", a, b, c);

    let right = fan_out(GraphLabel { align: Some(Align::DR), ..Default::default() });
    let (a, b, c) = (center(&right, "a"), center(&right, "b"), center(&right, "c"));
    assert!((a.0 - b.0.max(c.0)).abs() < 1e-9, "{:?} {:?} {:?}", a, b, c);
}

#[test]
fn engine_places_cycles_and_self_loops() {
    let mut e = engine(GraphLabel::default());
    e.set_edge("a", "b", "GenericAll");
    e.set_edge("b", "c", "GenericAll");
    e.set_edge("c", "a", "GenericAll");
    e.set_edge("c", "c", "Owns");
    e.layout();
    assert_eq!(e.edge_count(), 4);
    for id in ["a", "b", "c"] {
        let (x, y) = center(&e, id);
        assert!(x.is_finite() && y.is_finite());
    }
}

#[test]
fn edges_create_missing_nodes_with_zero_size() {
    let mut e = engine(GraphLabel::default());
    e.set_edge("x", "y", "Contains");
    e.set_edge("x", "y", "GPLink");
    e.set_edge("x", "y", "GPLink");
    assert_eq!(e.node_count(), 2);
    assert_eq!(e.edge_count(), 2);
    assert_eq!(e.node("y").map(|n| (n.width, n.height)), Some((0.0, 0.0)));
}

#[test]
fn long_edges_keep_ranks_in_order() {
    let mut e = engine(GraphLabel { ranksep: 10.0, ..Default::default() });
    for id in ["a", "b", "c"] {
        e.set_node(id, NodeLabel::new(id, 10.0, 10.0));
    }
    e.set_edge("a", "b", "AdminTo");
    e.set_edge("b", "c", "AdminTo");
    e.set_edge("a", "c", "AdminTo");
    e.layout();
    let (a, b, c) = (center(&e, "a"), center(&e, "b"), center(&e, "c"));
    assert!(a.1 < b.1 && b.1 < c.1);
}

#[test]
fn engine_is_deterministic() {
    let run = || {
        let mut e = engine(GraphLabel::default());
        for (s, t) in [("u1", "g1"), ("u2", "g1"), ("u3", "g2"), ("g1", "da"), ("g2", "da"), ("u1", "g2")] {
            e.set_edge(s, t, "MemberOf");
        }
        e.layout();
        e.node_ids().iter().map(|id| center(&e, id)).collect::<Vec<_>>()
    };
    assert_eq!(run(), run());
}
