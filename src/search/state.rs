use serde::{Deserialize, Serialize};

use crate::api::types::Node;
use crate::search::filters::{PathFilter, default_path_filters};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchSlot {
    #[serde(rename = "searchTerm")]
    pub search_term: String,
    pub loading: bool,
    pub value: Option<Node>,
    pub options: Vec<Node>,
}

impl SearchSlot {
    // Typing invalidates any previous selection
    pub fn edit(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
        self.value = None;
    }

    pub fn select(&mut self, node: Node) {
        self.search_term = node.display_name().to_string();
        self.value = Some(node);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    Exact,
    #[default]
    Fuzzy,
}

impl SearchType {
    pub fn as_str(self) -> &'static str {
        match self {
            SearchType::Exact => "exact",
            SearchType::Fuzzy => "fuzzy",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exact" => Some(SearchType::Exact),
            "fuzzy" => Some(SearchType::Fuzzy),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchTab {
    #[default]
    Search,
    Pathfinding,
    Cypher,
}

impl SearchTab {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "search" => Some(SearchTab::Search),
            "pathfinding" | "path" => Some(SearchTab::Pathfinding),
            "cypher" => Some(SearchTab::Cypher),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotId {
    Primary,
    Secondary,
}

/// A request for the coordinator to decide on a backend query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchTrigger {
    Primary { do_pathfinding: bool },
    Pathfinding,
    Cypher(Option<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchAction {
    SourceNodeEdited(String),
    SourceNodeSelected { node: Node, do_pathfinding: bool },
    DestinationNodeEdited(String),
    DestinationNodeSelected(Node),
    PrimarySearch,
    PathfindingSearch,
    CypherQueryEdited(String),
    CypherSearch(Option<String>),
    TabChanged(SearchTab),
    SlotsSwapped,
    PathFiltersSaved(Vec<PathFilter>),
    SearchTypeChanged(SearchType),
    OptionsRequested(SlotId),
    OptionsLoaded(SlotId, Vec<Node>),
    Reset,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchState {
    pub primary: SearchSlot,
    pub secondary: SearchSlot,
    pub cypher: SearchSlot,
    #[serde(rename = "pathFilters")]
    pub path_filters: Vec<PathFilter>,
    #[serde(rename = "searchType")]
    pub search_type: SearchType,
    #[serde(rename = "activeTab")]
    pub active_tab: SearchTab,
}

impl Default for SearchState {
    fn default() -> Self {
        Self {
            primary: SearchSlot::default(),
            secondary: SearchSlot::default(),
            cypher: SearchSlot::default(),
            path_filters: default_path_filters(),
            search_type: SearchType::default(),
            active_tab: SearchTab::default(),
        }
    }
}

impl SearchState {
    pub fn slot(&self, id: SlotId) -> &SearchSlot {
        match id {
            SlotId::Primary => &self.primary,
            SlotId::Secondary => &self.secondary,
        }
    }

    pub fn slot_mut(&mut self, id: SlotId) -> &mut SearchSlot {
        match id {
            SlotId::Primary => &mut self.primary,
            SlotId::Secondary => &mut self.secondary,
        }
    }

    /// Apply one reducer action. Returns the search the action implies, if any;
    /// callers hand it to the coordinator.
    pub fn apply(&mut self, action: SearchAction) -> Option<SearchTrigger> {
        match action {
            SearchAction::SourceNodeEdited(term) => {
                self.primary.edit(term);
                None
            }
            SearchAction::SourceNodeSelected { node, do_pathfinding } => {
                self.primary.select(node);
                Some(SearchTrigger::Primary { do_pathfinding })
            }
            SearchAction::DestinationNodeEdited(term) => {
                self.secondary.edit(term);
                None
            }
            SearchAction::DestinationNodeSelected(node) => {
                self.secondary.select(node);
                Some(SearchTrigger::Pathfinding)
            }
            SearchAction::PrimarySearch => Some(SearchTrigger::Primary { do_pathfinding: false }),
            SearchAction::PathfindingSearch => Some(SearchTrigger::Pathfinding),
            SearchAction::CypherQueryEdited(query) => {
                self.cypher.search_term = query;
                None
            }
            SearchAction::CypherSearch(query) => {
                // An empty explicit query keeps the stored term as the fallback
                let query = query.filter(|q| !q.is_empty());
                if let Some(q) = &query {
                    self.cypher.search_term = q.clone();
                }
                Some(SearchTrigger::Cypher(query))
            }
            SearchAction::TabChanged(tab) => {
                self.active_tab = tab;
                Some(match tab {
                    SearchTab::Search => SearchTrigger::Primary { do_pathfinding: false },
                    SearchTab::Pathfinding => SearchTrigger::Pathfinding,
                    SearchTab::Cypher => SearchTrigger::Cypher(None),
                })
            }
            SearchAction::SlotsSwapped => {
                if self.primary.value.is_none() || self.secondary.value.is_none() {
                    return None;
                }
                std::mem::swap(&mut self.primary, &mut self.secondary);
                Some(SearchTrigger::Pathfinding)
            }
            SearchAction::PathFiltersSaved(filters) => {
                self.path_filters = filters;
                None
            }
            SearchAction::SearchTypeChanged(search_type) => {
                self.search_type = search_type;
                None
            }
            SearchAction::OptionsRequested(slot) => {
                self.slot_mut(slot).loading = true;
                None
            }
            SearchAction::OptionsLoaded(slot, nodes) => {
                let slot = self.slot_mut(slot);
                slot.loading = false;
                slot.options = nodes;
                None
            }
            SearchAction::Reset => {
                *self = Self::default();
                None
            }
        }
    }
}
