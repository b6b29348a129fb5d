use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::api::types::GraphData;
use crate::graph_utils::colors::{map_to_range, to_graph_link_color, to_width};

// Identity of an edge as the renderer keys it: "{source}_{label}_{target}"
pub type EdgeKey = String;
pub type NodeKey = String;

const EDGE_KEY_SEPARATOR: char = '_';
const IMPACT_PERCENT_KEY: &str = "composite_risk_impact_percent";
pub const DEFAULT_LINK_LUMINANCE: f64 = 0.4;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RenderedNode {
    pub key: NodeKey,
    pub label: String,
    pub kind: String,
    // Visual size; None until the renderer styles the node
    pub size: Option<f64>,
    pub x: f64,
    pub y: f64,
    pub color: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RenderedEdge {
    pub key: EdgeKey,
    pub source: NodeKey,
    pub target: NodeKey,
    pub label: String,
    pub color: Option<String>,
    pub width: Option<f64>,
    pub impact_percent: Option<f64>,
    pub impact_weighted: Option<f64>,
}

/// The renderer-facing graph model: what is on screen right now. Serialized
/// for export only; the lookup tables are not part of the output.
#[derive(Clone, Debug, Default, Serialize)]
pub struct RenderedGraph {
    nodes: Vec<RenderedNode>,
    edges: Vec<RenderedEdge>,
    #[serde(skip)]
    node_index: HashMap<NodeKey, usize>,
    #[serde(skip)]
    edge_index: HashMap<EdgeKey, usize>,
}

/// Read/write surface of a rendered graph that the layout adapter relies on.
pub trait GraphView {
    fn order(&self) -> usize;
    fn size(&self) -> usize;
    fn node_keys(&self) -> Vec<NodeKey>;
    fn node_label(&self, key: &str) -> Option<&str>;
    fn node_size(&self, key: &str) -> Option<f64>;
    fn node_position(&self, key: &str) -> Option<(f64, f64)>;
    fn set_node_position(&mut self, key: &str, x: f64, y: f64) -> bool;
    fn edge_keys(&self) -> Vec<EdgeKey>;
    /// Decode an edge identity back into (source, target, label).
    fn decode_edge(&self, key: &str) -> Option<(NodeKey, NodeKey, String)>;
}

pub fn edge_key(source: &str, label: &str, target: &str) -> EdgeKey {
    format!("{}{}{}{}{}", source, EDGE_KEY_SEPARATOR, label, EDGE_KEY_SEPARATOR, target)
}

// Source is everything before the first separator, target everything after the
// last one; labels may themselves contain separators.
pub fn decode_edge_key(key: &str) -> Option<(NodeKey, NodeKey, String)> {
    let first = key.find(EDGE_KEY_SEPARATOR)?;
    let last = key.rfind(EDGE_KEY_SEPARATOR)?;
    if first == last {
        return None;
    }
    let source = &key[..first];
    let label = &key[first + 1..last];
    let target = &key[last + 1..];
    if source.is_empty() || label.is_empty() || target.is_empty() {
        return None;
    }
    Some((source.to_string(), target.to_string(), label.to_string()))
}

impl RenderedGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the on-screen graph from a backend payload. Nodes come in id order,
    /// edges in payload order; duplicate edge identities collapse to one.
    pub fn from_graph_data(data: &GraphData) -> Self {
        let mut graph = Self::new();
        for (id, node) in &data.nodes {
            let label = if node.label.is_empty() { node.object_id.clone() } else { node.label.clone() };
            graph.add_node(id.clone(), label, node.kind.clone(), None);
        }
        for edge in &data.edges {
            let label = if edge.kind.is_empty() { edge.label.clone() } else { edge.kind.clone() };
            let key = edge_key(&edge.source, &label, &edge.target);
            if graph.add_edge_with_key(key.clone(), &edge.source, &edge.target, &label).is_some() {
                let impact = edge
                    .data
                    .as_ref()
                    .and_then(|d| d.get(IMPACT_PERCENT_KEY))
                    .and_then(|v| v.as_f64())
                    .or(edge.impact_percent);
                if let Some(e) = graph.edge_mut(&key) {
                    e.impact_percent = impact;
                }
            }
        }
        graph
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.node_index.clear();
        self.edge_index.clear();
    }

    // Add or replace a node; returns false when the key already existed.
    pub fn add_node(&mut self, key: NodeKey, label: String, kind: String, size: Option<f64>) -> bool {
        if let Some(&idx) = self.node_index.get(&key) {
            let node = &mut self.nodes[idx];
            node.label = label;
            node.kind = kind;
            node.size = size;
            return false;
        }
        self.node_index.insert(key.clone(), self.nodes.len());
        self.nodes.push(RenderedNode { key, label, kind, size, x: 0.0, y: 0.0, color: None });
        true
    }

    // Add an edge if both ends exist; returns its key
    pub fn add_edge(&mut self, source: &str, target: &str, label: &str) -> Option<EdgeKey> {
        self.add_edge_with_key(edge_key(source, label, target), source, target, label)
    }

    /// Add an edge under an explicit identity. Used for payloads whose edge keys
    /// do not follow the "{source}_{label}_{target}" format.
    pub fn add_edge_with_key(&mut self, key: EdgeKey, source: &str, target: &str, label: &str) -> Option<EdgeKey> {
        if !self.node_index.contains_key(source) || !self.node_index.contains_key(target) {
            return None;
        }
        if self.edge_index.contains_key(&key) {
            return None;
        }
        self.edge_index.insert(key.clone(), self.edges.len());
        self.edges.push(RenderedEdge {
            key: key.clone(),
            source: source.to_string(),
            target: target.to_string(),
            label: label.to_string(),
            color: None,
            width: None,
            impact_percent: None,
            impact_weighted: None,
        });
        Some(key)
    }

    pub fn node(&self, key: &str) -> Option<&RenderedNode> {
        self.node_index.get(key).map(|&i| &self.nodes[i])
    }

    pub fn node_mut(&mut self, key: &str) -> Option<&mut RenderedNode> {
        match self.node_index.get(key) {
            Some(&i) => Some(&mut self.nodes[i]),
            None => None,
        }
    }

    pub fn edge(&self, key: &str) -> Option<&RenderedEdge> {
        self.edge_index.get(key).map(|&i| &self.edges[i])
    }

    pub fn edge_mut(&mut self, key: &str) -> Option<&mut RenderedEdge> {
        match self.edge_index.get(key) {
            Some(&i) => Some(&mut self.edges[i]),
            None => None,
        }
    }

    pub fn nodes(&self) -> &[RenderedNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[RenderedEdge] {
        &self.edges
    }

    pub fn set_node_size(&mut self, key: &str, size: Option<f64>) -> bool {
        if let Some(node) = self.node_mut(key) {
            node.size = size;
            true
        } else {
            false
        }
    }

    /// Color and width every edge by its composite risk impact, relative to the
    /// other edges on screen. Edges without an impact value are left untouched.
    pub fn apply_impact_styling(&mut self, luminance: f64) {
        let impact = |pct: f64| (pct * 100.0).round().log10().max(0.0);

        let mut weights: Vec<f64> = self.edges.iter().filter_map(|e| e.impact_percent).map(impact).collect();
        if weights.is_empty() {
            return;
        }
        weights.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let range = (weights[0], weights[weights.len() - 1]);

        for edge in self.edges.iter_mut() {
            let Some(pct) = edge.impact_percent else { continue };
            let imp = impact(pct);
            edge.color = Some(to_graph_link_color(imp, range, Some(luminance)));
            edge.width = Some(to_width(imp, range));
            let weighted = map_to_range(imp, range, (0.0, 100.0));
            edge.impact_weighted = if weighted.is_finite() { Some(weighted) } else { None };
        }
    }
}

impl GraphView for RenderedGraph {
    fn order(&self) -> usize { self.nodes.len() }
    fn size(&self) -> usize { self.edges.len() }

    fn node_keys(&self) -> Vec<NodeKey> {
        self.nodes.iter().map(|n| n.key.clone()).collect()
    }

    fn node_label(&self, key: &str) -> Option<&str> {
        self.node(key).map(|n| n.label.as_str())
    }

    fn node_size(&self, key: &str) -> Option<f64> {
        self.node(key).and_then(|n| n.size)
    }

    fn node_position(&self, key: &str) -> Option<(f64, f64)> {
        self.node(key).map(|n| (n.x, n.y))
    }

    fn set_node_position(&mut self, key: &str, x: f64, y: f64) -> bool {
        if let Some(node) = self.node_mut(key) {
            node.x = x;
            node.y = y;
            true
        } else {
            false
        }
    }

    fn edge_keys(&self) -> Vec<EdgeKey> {
        self.edges.iter().map(|e| e.key.clone()).collect()
    }

    // Stored endpoints win; node keys may contain the separator.
    fn decode_edge(&self, key: &str) -> Option<(NodeKey, NodeKey, String)> {
        match self.edge(key) {
            Some(e) => Some((e.source.clone(), e.target.clone(), e.label.clone())),
            None => decode_edge_key(key),
        }
    }
}
