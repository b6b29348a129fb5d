//! Bridge between the rendered graph and the layered layout engine.
//!
//! `LayoutAssigner::assign` copies nodes and edges into a fresh engine graph,
//! runs the layered layout and writes the resulting centers back. Only node
//! positions are ever written.

use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

use crate::graph_utils::graph::GraphView;
use crate::graph_utils::layered::{Align, DagreGraph, GraphLabel, LayeredGraph, NodeLabel, RankDir, Ranker};

pub const DEFAULT_NODE_SIZE: f64 = 30.0;

// Reserved node key; never repositioned
const PINNED_NODE_KEY: &str = "ReadWrite";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub rankdir: RankDir,
    pub ranksep: f64,
    #[serde(default)]
    pub align: Option<Align>,
    #[serde(default)]
    pub marginx: Option<f64>,
    #[serde(default)]
    pub marginy: Option<f64>,
    #[serde(default)]
    pub nodesep: Option<f64>,
    #[serde(default)]
    pub edgesep: Option<f64>,
    #[serde(default)]
    pub ranker: Option<Ranker>,
}

impl LayoutConfig {
    pub fn new(rankdir: RankDir, ranksep: f64) -> Self {
        Self { rankdir, ranksep, align: None, marginx: None, marginy: None, nodesep: None, edgesep: None, ranker: None }
    }

    // Optional settings only override the engine defaults when present
    fn graph_label(&self) -> GraphLabel {
        let mut label = GraphLabel { rankdir: self.rankdir, ranksep: self.ranksep, ..Default::default() };
        label.align = self.align;
        if let Some(v) = self.marginx { label.marginx = v; }
        if let Some(v) = self.marginy { label.marginy = v; }
        if let Some(v) = self.nodesep { label.nodesep = v; }
        if let Some(v) = self.edgesep { label.edgesep = v; }
        if let Some(r) = self.ranker { label.ranker = r; }
        label
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self::new(RankDir::LR, 500.0)
    }
}

/// Positions a rendered graph on demand. Built by [`layout_dagre`]; holds
/// nothing when there was no graph (or an empty one) to lay out.
pub struct LayoutAssigner<'g, G: GraphView, E: LayeredGraph = DagreGraph> {
    graph: Option<&'g mut G>,
    config: LayoutConfig,
    _engine: PhantomData<E>,
}

pub fn layout_dagre<'g, G: GraphView>(graph: Option<&'g mut G>, config: LayoutConfig) -> LayoutAssigner<'g, G> {
    LayoutAssigner::new(graph, config)
}

impl<'g, G: GraphView, E: LayeredGraph> LayoutAssigner<'g, G, E> {
    pub fn new(graph: Option<&'g mut G>, config: LayoutConfig) -> Self {
        let graph = graph.filter(|g| g.order() > 0);
        Self { graph, config, _engine: PhantomData }
    }

    pub fn is_noop(&self) -> bool {
        self.graph.is_none()
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Run the layered layout and write node centers back to the graph.
    /// Returns how many nodes were positioned.
    pub fn assign(&mut self) -> usize {
        let Some(graph) = self.graph.as_deref_mut() else { return 0 };

        let mut engine = E::new_multigraph();
        let node_keys = graph.node_keys();
        for key in &node_keys {
            let label = graph.node_label(key).unwrap_or_default().to_string();
            let size = match graph.node_size(key) {
                Some(s) if s != 0.0 => s,
                _ => DEFAULT_NODE_SIZE,
            };
            engine.set_node(key, NodeLabel::new(label, size, size));
        }

        for key in graph.edge_keys() {
            let Some((source, target, label)) = graph.decode_edge(&key) else { continue };
            engine.set_edge(&source, &target, &label);
        }

        engine.set_graph(self.config.graph_label());
        engine.layout();

        let mut positioned = 0;
        for key in &node_keys {
            if key == PINNED_NODE_KEY {
                continue;
            }
            let coords = engine.node(key).map(|n| (n.x, n.y));
            match coords {
                Some((Some(x), Some(y))) if x.is_finite() && y.is_finite() => {
                    if graph.set_node_position(key, x, y) {
                        positioned += 1;
                    }
                }
                _ => log::warn!("layout produced no position for node {}; leaving it in place", key),
            }
        }
        log::debug!("layered layout positioned {} of {} nodes", positioned, node_keys.len());
        positioned
    }
}
