//! Layered layout engine.
//!
//! The engine is driven through the [`LayeredGraph`] trait: build a directed
//! multigraph, set graph-level options, add nodes and edges, run [`layout`],
//! then read node centers back. [`DagreGraph`] backs the trait with the
//! `dagre_rs` layered layout over a `petgraph` graph.
//!
//! [`layout`]: LayeredGraph::layout

use std::collections::{HashMap, HashSet};

use dagre_rs::{DagreLayout, LayoutOptions};
use petgraph::Graph as PetGraph;
use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};

// Node centers closer than this along the rank axis share a rank
const RANK_TOLERANCE: f64 = 0.5;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RankDir {
    #[default]
    TB,
    BT,
    LR,
    RL,
}

impl RankDir {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TB" | "TD" => Some(RankDir::TB),
            "BT" => Some(RankDir::BT),
            "LR" => Some(RankDir::LR),
            "RL" => Some(RankDir::RL),
            _ => None,
        }
    }

    fn is_horizontal(self) -> bool {
        matches!(self, RankDir::LR | RankDir::RL)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Align {
    UL,
    UR,
    DL,
    DR,
}

/// Rank assignment requested of the engine. `DagreGraph` records it on the
/// label; dagre itself always ranks with network simplex.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ranker {
    #[default]
    NetworkSimplex,
    TightTree,
    LongestPath,
}

/// Graph-level layout options plus the computed extent.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphLabel {
    pub rankdir: RankDir,
    pub ranksep: f64,
    pub nodesep: f64,
    pub edgesep: f64,
    pub align: Option<Align>,
    pub marginx: f64,
    pub marginy: f64,
    pub ranker: Ranker,
    pub width: f64,
    pub height: f64,
}

impl Default for GraphLabel {
    fn default() -> Self {
        Self {
            rankdir: RankDir::TB,
            ranksep: 50.0,
            nodesep: 50.0,
            edgesep: 20.0,
            align: None,
            marginx: 0.0,
            marginy: 0.0,
            ranker: Ranker::NetworkSimplex,
            width: 0.0,
            height: 0.0,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeLabel {
    pub label: String,
    pub width: f64,
    pub height: f64,
    // Center coordinates, set by layout()
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub rank: Option<usize>,
    pub order: Option<usize>,
}

impl NodeLabel {
    pub fn new(label: impl Into<String>, width: f64, height: f64) -> Self {
        Self { label: label.into(), width, height, ..Default::default() }
    }
}

/// Narrow interface of a layered layout engine.
pub trait LayeredGraph {
    /// An empty directed multigraph.
    fn new_multigraph() -> Self
    where
        Self: Sized;
    fn set_graph(&mut self, label: GraphLabel);
    fn graph(&self) -> &GraphLabel;
    fn set_node(&mut self, id: &str, label: NodeLabel);
    /// Add an edge; `name` distinguishes parallel edges between the same pair.
    fn set_edge(&mut self, source: &str, target: &str, name: &str);
    fn layout(&mut self);
    fn node(&self, id: &str) -> Option<&NodeLabel>;
    fn node_ids(&self) -> Vec<String>;
    fn node_count(&self) -> usize;
    fn edge_count(&self) -> usize;
}

/// `dagre_rs` behind [`LayeredGraph`]. Node weights in the petgraph are
/// indices into `nodes`.
#[derive(Clone, Debug, Default)]
pub struct DagreGraph {
    label: GraphLabel,
    graph: PetGraph<usize, ()>,
    ids: Vec<String>,
    handles: Vec<NodeIndex>,
    index: HashMap<String, usize>,
    nodes: Vec<NodeLabel>,
    edges: HashSet<(usize, usize, String)>,
}

impl DagreGraph {
    fn ensure_node(&mut self, id: &str) -> usize {
        if let Some(&i) = self.index.get(id) {
            return i;
        }
        let i = self.nodes.len();
        self.handles.push(self.graph.add_node(i));
        self.ids.push(id.to_string());
        self.index.insert(id.to_string(), i);
        self.nodes.push(NodeLabel::default());
        i
    }

    // dagre spaces centers, so the largest node extent is folded into the
    // separations, measured in the top-to-bottom frame.
    fn options(&self) -> LayoutOptions {
        let horizontal = self.label.rankdir.is_horizontal();
        let (across, along) = self.nodes.iter().fold((0.0f64, 0.0f64), |(a, b), n| {
            let (w, h) = if horizontal { (n.height, n.width) } else { (n.width, n.height) };
            (a.max(w), b.max(h))
        });
        LayoutOptions {
            rank_dir: dagre_rs::RankDir::TopToBottom,
            node_sep: (across + self.label.nodesep) as f32,
            rank_sep: (along + self.label.ranksep) as f32,
            ..Default::default()
        }
    }
}

impl LayeredGraph for DagreGraph {
    fn new_multigraph() -> Self {
        Self::default()
    }

    fn set_graph(&mut self, label: GraphLabel) {
        self.label = label;
    }

    fn graph(&self) -> &GraphLabel {
        &self.label
    }

    fn set_node(&mut self, id: &str, label: NodeLabel) {
        let i = self.ensure_node(id);
        self.nodes[i] = label;
    }

    // Unknown endpoints are created with zero size. Self loops are kept in
    // the edge set but never reach dagre; they do not affect placement.
    fn set_edge(&mut self, source: &str, target: &str, name: &str) {
        let u = self.ensure_node(source);
        let v = self.ensure_node(target);
        if self.edges.insert((u, v, name.to_string())) && u != v {
            self.graph.add_edge(self.handles[u], self.handles[v], ());
        }
    }

    fn layout(&mut self) {
        if self.nodes.is_empty() {
            return;
        }
        let opts = self.label.clone();
        let result = DagreLayout::with_options(self.options()).compute(&self.graph);

        // Top-to-bottom frame: (node, across, along, extent across)
        let horizontal = opts.rankdir.is_horizontal();
        let mut placed: Vec<(usize, f64, f64, f64)> = Vec::with_capacity(self.nodes.len());
        for (i, handle) in self.handles.iter().enumerate() {
            let Some(&(x, y)) = result.node_positions.get(handle) else { continue };
            let node = &self.nodes[i];
            let across = if horizontal { node.height } else { node.width };
            placed.push((i, x as f64, y as f64, across));
        }
        if placed.is_empty() {
            log::warn!("dagre returned no positions for {} nodes", self.nodes.len());
            return;
        }

        let ranks = group_ranks(&mut placed);
        if let Some(align) = opts.align {
            align_ranks(&mut placed, &ranks, align);
        }

        let oriented: Vec<(usize, f64, f64)> = placed
            .iter()
            .map(|&(v, x, y, _)| match opts.rankdir {
                RankDir::TB => (v, x, y),
                RankDir::BT => (v, x, -y),
                RankDir::LR => (v, y, x),
                RankDir::RL => (v, -y, x),
            })
            .collect();

        // Translate so the top-left corner sits at the margins
        let mut min_x = f64::INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        for &(v, x, y) in &oriented {
            let node = &self.nodes[v];
            min_x = min_x.min(x - node.width / 2.0);
            max_x = max_x.max(x + node.width / 2.0);
            min_y = min_y.min(y - node.height / 2.0);
            max_y = max_y.max(y + node.height / 2.0);
        }
        let dx = opts.marginx - min_x;
        let dy = opts.marginy - min_y;

        for (slot, &(v, x, y)) in oriented.iter().enumerate() {
            let (rank, order) = ranks[slot];
            let node = &mut self.nodes[v];
            node.x = Some(x + dx);
            node.y = Some(y + dy);
            node.rank = Some(rank);
            node.order = Some(order);
        }
        self.label.width = max_x - min_x + 2.0 * opts.marginx;
        self.label.height = max_y - min_y + 2.0 * opts.marginy;
    }

    fn node(&self, id: &str) -> Option<&NodeLabel> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    fn node_ids(&self) -> Vec<String> {
        self.ids.clone()
    }

    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

// Sorts `placed` by (along, across) and returns (rank, order) per slot.
fn group_ranks(placed: &mut [(usize, f64, f64, f64)]) -> Vec<(usize, usize)> {
    placed.sort_by(|a, b| a.2.total_cmp(&b.2).then(a.1.total_cmp(&b.1)).then(a.0.cmp(&b.0)));
    let mut out = Vec::with_capacity(placed.len());
    let mut rank = 0;
    let mut order = 0;
    let mut rank_y = placed.first().map_or(0.0, |p| p.2);
    for p in placed.iter() {
        if p.2 - rank_y > RANK_TOLERANCE {
            rank += 1;
            order = 0;
            rank_y = p.2;
        }
        out.push((rank, order));
        order += 1;
    }
    out
}

// Packs every rank against the left or right edge of the widest rank.
fn align_ranks(placed: &mut [(usize, f64, f64, f64)], ranks: &[(usize, usize)], align: Align) {
    let rank_count = ranks.last().map_or(0, |r| r.0 + 1);
    let mut bounds = vec![(f64::INFINITY, f64::NEG_INFINITY); rank_count];
    for (p, &(r, _)) in placed.iter().zip(ranks) {
        bounds[r].0 = bounds[r].0.min(p.1 - p.3 / 2.0);
        bounds[r].1 = bounds[r].1.max(p.1 + p.3 / 2.0);
    }
    let left = bounds.iter().map(|b| b.0).fold(f64::INFINITY, f64::min);
    let right = bounds.iter().map(|b| b.1).fold(f64::NEG_INFINITY, f64::max);
    for (p, &(r, _)) in placed.iter_mut().zip(ranks) {
        p.1 += match align {
            Align::UL | Align::DL => left - bounds[r].0,
            Align::UR | Align::DR => right - bounds[r].1,
        };
    }
}
