//! Attack-path explore core.
//!
//! Search coordination for node, pathfinding and Cypher queries against a
//! BloodHound-style API, a layered layout adapter for the rendered graph, and
//! the risk grading used to style edges.

pub mod api;
pub mod graph_utils;
pub mod persistence;
pub mod search;
pub mod session;

pub use api::types::{GraphData, Node};
pub use graph_utils::graph::RenderedGraph;
pub use search::coordinator::{GraphQuery, coordinate};
pub use search::state::{SearchAction, SearchState, SearchTrigger};
pub use session::explore::ExploreSession;
