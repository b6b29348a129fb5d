//! The explore page without a screen: search state, one query at a time, and
//! the rendered graph that results from it.

use std::path::{Path, PathBuf};

use crate::api::query::{GraphOutcome, Notice, NoticeKey, QueryRunner};
use crate::api::types::{GraphData, Node};
use crate::api::{ApiError, GraphApi};
use crate::graph_utils::graph::{DEFAULT_LINK_LUMINANCE, RenderedGraph};
use crate::graph_utils::layered::RankDir;
use crate::graph_utils::layout::{LayoutConfig, layout_dagre};
use crate::persistence::export::{GraphExport, save_export};
use crate::search::coordinator::{GraphQuery, handle_trigger};
use crate::search::state::{SearchAction, SearchState, SlotId};

pub struct ExploreSession<A: GraphApi> {
    pub state: SearchState,
    runner: QueryRunner<A>,
    graph: RenderedGraph,
    layout: LayoutConfig,
    link_luminance: f64,
    last_query: Option<GraphQuery>,
    last_notice: Option<Notice>,
}

impl<A: GraphApi> ExploreSession<A> {
    pub fn new(api: A) -> Self {
        Self::with_layout(api, LayoutConfig::default(), DEFAULT_LINK_LUMINANCE)
    }

    pub fn with_layout(api: A, layout: LayoutConfig, link_luminance: f64) -> Self {
        Self {
            state: SearchState::default(),
            runner: QueryRunner::new(api),
            graph: RenderedGraph::new(),
            layout,
            link_luminance,
            last_query: None,
            last_notice: None,
        }
    }

    pub fn api(&self) -> &A {
        self.runner.api()
    }

    pub fn graph(&self) -> &RenderedGraph {
        &self.graph
    }

    pub fn layout_config(&self) -> &LayoutConfig {
        &self.layout
    }

    pub fn last_query(&self) -> Option<&GraphQuery> {
        self.last_query.as_ref()
    }

    pub fn last_notice(&self) -> Option<&Notice> {
        self.last_notice.as_ref()
    }

    pub fn last_response(&self) -> Option<&GraphData> {
        self.runner.last_response()
    }

    /// Apply an action and, when it implies a search, run the one query the
    /// coordinator picks. Returns None when nothing was queried.
    pub async fn dispatch(&mut self, action: SearchAction) -> Option<GraphOutcome> {
        let trigger = self.state.apply(action)?;
        let mut pending: Vec<GraphQuery> = Vec::new();
        if !handle_trigger(&self.state, &trigger, &mut pending) {
            return None;
        }
        let query = pending.pop()?;
        let outcome = self.runner.run(&query).await;

        // Failed requests leave the current graph alone, except a missing path
        // which clears it.
        let path_not_found = outcome.notice.as_ref().is_some_and(|n| n.key == NoticeKey::ShortestPathNotFound);
        if outcome.error.is_none() || path_not_found {
            self.load_graph(&outcome.graph);
        }
        self.last_query = Some(query);
        self.last_notice = outcome.notice.clone();
        Some(outcome)
    }

    /// Replace the rendered graph with `data`, styled and laid out.
    pub fn load_graph(&mut self, data: &GraphData) {
        self.graph = RenderedGraph::from_graph_data(data);
        self.graph.apply_impact_styling(self.link_luminance);
        layout_dagre(Some(&mut self.graph), self.layout.clone()).assign();
    }

    /// Lookahead: edit the slot's term and fill its options.
    pub async fn lookup(&mut self, slot: SlotId, term: &str) -> Result<&[Node], ApiError> {
        let edit = match slot {
            SlotId::Primary => SearchAction::SourceNodeEdited(term.to_string()),
            SlotId::Secondary => SearchAction::DestinationNodeEdited(term.to_string()),
        };
        self.state.apply(edit);
        self.state.apply(SearchAction::OptionsRequested(slot));
        let result = self.runner.api().search_nodes(term, self.state.search_type).await;
        let (nodes, err) = match result {
            Ok(nodes) => (nodes, None),
            Err(e) => (Vec::new(), Some(e)),
        };
        self.state.apply(SearchAction::OptionsLoaded(slot, nodes));
        match err {
            Some(e) => Err(e),
            None => Ok(self.state.slot(slot).options.as_slice()),
        }
    }

    /// Re-run the layout, optionally in a new direction.
    pub fn relayout(&mut self, rankdir: Option<RankDir>) -> usize {
        if let Some(dir) = rankdir {
            self.layout.rankdir = dir;
        }
        layout_dagre(Some(&mut self.graph), self.layout.clone()).assign()
    }

    pub fn reset(&mut self) {
        self.state.apply(SearchAction::Reset);
        self.graph.clear();
        self.last_query = None;
        self.last_notice = None;
    }

    pub fn export(&self, dir: &Path) -> anyhow::Result<PathBuf> {
        let Some(data) = self.runner.last_response() else {
            anyhow::bail!("nothing to export; run a search first");
        };
        save_export(dir, &GraphExport::new(data, Some(&self.graph)))
    }
}
