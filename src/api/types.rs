use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A graph entity as returned by the search endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Node {
    #[serde(rename = "objectid")]
    pub object_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

impl Node {
    pub fn new(object_id: impl Into<String>, name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self { object_id: object_id.into(), name: name.into(), kind: kind.into() }
    }

    // Text shown in a search box once the node is selected
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() { &self.object_id } else { &self.name }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub kind: String,
    #[serde(rename = "objectId", default)]
    pub object_id: String,
    #[serde(rename = "isTierZero", default)]
    pub is_tier_zero: bool,
    #[serde(rename = "isOwnedObject", default)]
    pub is_owned_object: bool,
    #[serde(rename = "lastSeen", default, skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub kind: String,
    #[serde(rename = "lastSeen", default, skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<String>,
    #[serde(rename = "impactPercent", default, skip_serializing_if = "Option::is_none")]
    pub impact_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Value>>,
}

/// Backend graph payload: nodes keyed by id, edges in response order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphData {
    #[serde(default)]
    pub nodes: BTreeMap<String, GraphNode>,
    #[serde(default)]
    pub edges: Vec<GraphEdge>,
}

impl GraphData {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

// Envelope used by the pathfinding and cypher endpoints
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphResponse {
    #[serde(default)]
    pub data: GraphData,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub data: Vec<Node>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(default)]
    pub context: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub http_status: Option<u16>,
    #[serde(default)]
    pub errors: Vec<ApiErrorDetail>,
}

impl ApiErrorBody {
    pub fn first_message(&self) -> Option<String> {
        self.errors.iter().map(|e| e.message.trim()).find(|m| !m.is_empty()).map(str::to_string)
    }
}

const FLAT_EDGE_PREFIX: &str = "rel_";

fn label_text(item: &Value) -> String {
    match item.get("label") {
        Some(Value::Object(l)) => l.get("text").and_then(Value::as_str).unwrap_or_default().to_string(),
        Some(Value::String(s)) => s.clone(),
        _ => String::new(),
    }
}

fn str_field(data: Option<&Map<String, Value>>, key: &str) -> String {
    data.and_then(|d| d.get(key)).and_then(Value::as_str).unwrap_or_default().to_string()
}

/// Convert the flat, renderer-styled response of the single node search into
/// [`GraphData`]. Keys starting with `rel_` are edges (`id1` -> `id2`), every
/// other key is a node. Items that do not match either shape are dropped.
pub fn transform_flat_graph_response(flat: &Map<String, Value>) -> GraphData {
    let mut out = GraphData::default();

    for (key, item) in flat {
        if key.starts_with(FLAT_EDGE_PREFIX) {
            continue;
        }
        let Some(obj) = item.as_object() else { continue };
        let data = obj.get("data").and_then(Value::as_object);
        let object_id = str_field(data, "objectid");
        let mut label = label_text(item);
        if label.is_empty() {
            label = str_field(data, "name");
        }
        let is_tier_zero = data
            .and_then(|d| d.get("system_tags"))
            .and_then(Value::as_str)
            .is_some_and(|tags| tags.split_whitespace().any(|t| t == "admin_tier_0"));
        out.nodes.insert(
            key.clone(),
            GraphNode {
                label,
                kind: str_field(data, "nodetype"),
                object_id,
                is_tier_zero,
                is_owned_object: false,
                last_seen: data.and_then(|d| d.get("lastseen")).and_then(Value::as_str).map(str::to_string),
                properties: data.cloned(),
            },
        );
    }

    for (key, item) in flat {
        if !key.starts_with(FLAT_EDGE_PREFIX) {
            continue;
        }
        let source = item.get("id1").and_then(Value::as_str);
        let target = item.get("id2").and_then(Value::as_str);
        let (Some(source), Some(target)) = (source, target) else { continue };
        let label = label_text(item);
        let data = item.get("data").and_then(Value::as_object).cloned();
        let last_seen = data.as_ref().and_then(|d| d.get("lastseen")).and_then(Value::as_str).map(str::to_string);
        out.edges.push(GraphEdge {
            source: source.to_string(),
            target: target.to_string(),
            kind: label.clone(),
            label,
            last_seen,
            impact_percent: None,
            data,
        });
    }

    out
}
