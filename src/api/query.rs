//! Executes a coordinated `GraphQuery` and maps backend failures to the
//! notices the explore view shows.

use crate::api::types::GraphData;
use crate::api::{ApiError, GraphApi};
use crate::search::coordinator::GraphQuery;

pub const PATH_NOT_FOUND: &str = "Path not found.";
pub const PATH_OUT_OF_MEMORY: &str =
    "Calculating the requested Attack Path exceeded memory limitations due to the complexity of paths involved.";
pub const PATH_TIMEOUT: &str = "The results took too long to compute, possibly due to the complexity of paths involved.";
pub const PATH_UNKNOWN_ERROR: &str = "An unknown error occurred. Please try again.";
pub const CYPHER_ONLY_EDGES: &str = "The results are not rendered since only edges were returned";
pub const CYPHER_EMPTY: &str = "No results match your criteria";
pub const CYPHER_ERROR: &str = "An error occured. Please try again";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoticeKey {
    ShortestPathNotFound,
    ShortestPathOutOfMemory,
    ShortestPathTimeout,
    ShortestPathUnknown,
    CypherSearchOnlyContainsEdges,
    CypherSearchEmptyResponse,
    CypherSearchBadRequest,
    CypherSearch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub key: NoticeKey,
}

impl Notice {
    fn new(message: impl Into<String>, key: NoticeKey) -> Self {
        Self { message: message.into(), key }
    }
}

/// Result of one query: the graph to display (possibly empty), an optional
/// user-facing notice and the underlying error when the request failed.
#[derive(Debug, Clone, Default)]
pub struct GraphOutcome {
    pub graph: GraphData,
    pub notice: Option<Notice>,
    pub error: Option<ApiError>,
}

impl GraphOutcome {
    fn data(graph: GraphData) -> Self {
        Self { graph, ..Default::default() }
    }

    fn notice(message: impl Into<String>, key: NoticeKey, error: Option<ApiError>) -> Self {
        Self { graph: GraphData::default(), notice: Some(Notice::new(message, key)), error }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

pub fn pathfinding_notice(err: &ApiError) -> Notice {
    match err.status() {
        Some(404) => Notice::new(PATH_NOT_FOUND, NoticeKey::ShortestPathNotFound),
        Some(503) => Notice::new(PATH_OUT_OF_MEMORY, NoticeKey::ShortestPathOutOfMemory),
        Some(504) => Notice::new(PATH_TIMEOUT, NoticeKey::ShortestPathTimeout),
        _ => Notice::new(PATH_UNKNOWN_ERROR, NoticeKey::ShortestPathUnknown),
    }
}

pub fn cypher_notice(err: &ApiError) -> Notice {
    let message = err.api_message().filter(|m| !m.is_empty());
    match err.status() {
        Some(400) => Notice::new(message.unwrap_or(CYPHER_ERROR), NoticeKey::CypherSearchBadRequest),
        _ => Notice::new(message.unwrap_or(CYPHER_ERROR), NoticeKey::CypherSearch),
    }
}

pub struct QueryRunner<A: GraphApi> {
    api: A,
    last_response: Option<GraphData>,
}

impl<A: GraphApi> QueryRunner<A> {
    pub fn new(api: A) -> Self {
        Self { api, last_response: None }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    // Most recent non-empty successful payload, kept for export
    pub fn last_response(&self) -> Option<&GraphData> {
        self.last_response.as_ref()
    }

    pub async fn run(&mut self, query: &GraphQuery) -> GraphOutcome {
        let outcome = match query {
            GraphQuery::NodeSearch { object_id, search_type } => {
                match self.api.single_node_search(object_id, *search_type).await {
                    Ok(graph) => GraphOutcome::data(graph),
                    Err(e) => {
                        log::error!("node search for {} failed: {}", object_id, e);
                        GraphOutcome { error: Some(e), ..Default::default() }
                    }
                }
            }
            GraphQuery::Pathfinding { start, end, edge_types } => {
                match self.api.pathfinding_search(start, end, edge_types).await {
                    Ok(graph) => GraphOutcome::data(graph),
                    Err(e) => {
                        log::error!("pathfinding {} -> {} failed: {}", start, end, e);
                        let notice = pathfinding_notice(&e);
                        GraphOutcome::notice(notice.message, notice.key, Some(e))
                    }
                }
            }
            GraphQuery::Cypher { query } => match self.api.cypher_search(query).await {
                Ok(graph) if graph.nodes.is_empty() && !graph.edges.is_empty() => {
                    GraphOutcome::notice(CYPHER_ONLY_EDGES, NoticeKey::CypherSearchOnlyContainsEdges, None)
                }
                Ok(graph) if graph.is_empty() => GraphOutcome::notice(CYPHER_EMPTY, NoticeKey::CypherSearchEmptyResponse, None),
                Ok(graph) => GraphOutcome::data(graph),
                Err(e) => {
                    log::error!("cypher query failed: {}", e);
                    let notice = cypher_notice(&e);
                    GraphOutcome::notice(notice.message, notice.key, Some(e))
                }
            },
        };
        if outcome.is_ok() && !outcome.graph.is_empty() {
            self.last_response = Some(outcome.graph.clone());
        }
        outcome
    }
}
