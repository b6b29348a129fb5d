//! Decides which single backend query a search trigger turns into.

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use crate::search::filters::enabled_edge_types;
use crate::search::state::{SearchState, SearchTrigger, SearchType};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphQuery {
    NodeSearch { object_id: String, search_type: SearchType },
    Pathfinding { start: String, end: String, edge_types: Vec<String> },
    Cypher { query: String },
}

impl GraphQuery {
    fn exact(object_id: &str) -> Self {
        GraphQuery::NodeSearch { object_id: object_id.to_string(), search_type: SearchType::Exact }
    }
}

/// Where coordinated queries go.
pub trait QueryDispatcher {
    fn dispatch(&mut self, query: GraphQuery);
}

// Recording dispatcher
impl QueryDispatcher for Vec<GraphQuery> {
    fn dispatch(&mut self, query: GraphQuery) {
        self.push(query);
    }
}

impl QueryDispatcher for UnboundedSender<GraphQuery> {
    fn dispatch(&mut self, query: GraphQuery) {
        if self.send(query).is_err() {
            log::warn!("query receiver closed; dropping query");
        }
    }
}

/// Pure decision: the query a trigger implies for the current state, if any.
pub fn coordinate(state: &SearchState, trigger: &SearchTrigger) -> Option<GraphQuery> {
    let primary = state.primary.value.as_ref();
    let secondary = state.secondary.value.as_ref();

    match trigger {
        SearchTrigger::Primary { do_pathfinding } => match (primary, secondary) {
            (Some(p), Some(s)) if *do_pathfinding => Some(GraphQuery::Pathfinding {
                start: p.object_id.clone(),
                end: s.object_id.clone(),
                edge_types: enabled_edge_types(&state.path_filters),
            }),
            (Some(p), _) => Some(GraphQuery::exact(&p.object_id)),
            (None, _) => None,
        },
        SearchTrigger::Pathfinding => match (primary, secondary) {
            (Some(p), Some(s)) => Some(GraphQuery::Pathfinding {
                start: p.object_id.clone(),
                end: s.object_id.clone(),
                edge_types: enabled_edge_types(&state.path_filters),
            }),
            (None, Some(s)) => Some(GraphQuery::exact(&s.object_id)),
            (Some(p), None) => Some(GraphQuery::exact(&p.object_id)),
            (None, None) => None,
        },
        SearchTrigger::Cypher(explicit) => {
            let query = explicit.as_deref().filter(|q| !q.is_empty()).unwrap_or(state.cypher.search_term.as_str());
            if query.is_empty() {
                None
            } else {
                Some(GraphQuery::Cypher { query: query.to_string() })
            }
        }
    }
}

/// Coordinate and dispatch at most one query. Returns whether one was sent.
pub fn handle_trigger<D: QueryDispatcher + ?Sized>(state: &SearchState, trigger: &SearchTrigger, dispatcher: &mut D) -> bool {
    match coordinate(state, trigger) {
        Some(query) => {
            log::debug!("dispatching {:?}", query);
            dispatcher.dispatch(query);
            true
        }
        None => false,
    }
}

/// Take the newest pending query, discarding anything queued before it.
pub fn drain_latest(rx: &mut UnboundedReceiver<GraphQuery>) -> Option<GraphQuery> {
    let mut latest = None;
    while let Ok(query) = rx.try_recv() {
        latest = Some(query);
    }
    latest
}
