//! Backend graph API: the `GraphApi` seam, its HTTP implementation and the
//! runner that turns one coordinated query into a displayable outcome.

use async_trait::async_trait;
use thiserror::Error;

use crate::api::types::{GraphData, Node};
use crate::search::state::SearchType;

pub mod query;
pub mod types;

#[cfg(feature = "client")]
pub mod client;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("request failed with status {status}{}", .message.as_deref().map(|m| format!(": {}", m)).unwrap_or_default())]
    Status { status: u16, message: Option<String> },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("could not decode response: {0}")]
    Decode(String),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    // Message the backend attached to the failure, if any
    pub fn api_message(&self) -> Option<&str> {
        match self {
            ApiError::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

#[async_trait]
pub trait GraphApi: Send + Sync {
    /// Lookahead search used to fill a search box's options.
    async fn search_nodes(&self, term: &str, search_type: SearchType) -> Result<Vec<Node>, ApiError>;
    async fn single_node_search(&self, object_id: &str, search_type: SearchType) -> Result<GraphData, ApiError>;
    async fn pathfinding_search(&self, start: &str, end: &str, edge_types: &[String]) -> Result<GraphData, ApiError>;
    async fn cypher_search(&self, query: &str) -> Result<GraphData, ApiError>;
}

/// Relationship kinds excluded from pathfinding when no edge filter narrows
/// the search.
pub const STANDARD_EXCLUSIONS: &[&str] = &[
    "LocalToComputer",
    "RemoteInteractiveLogonPrivilege",
    "MemberOfLocalGroup",
    "GetChanges",
    "GetChangesAll",
    "RootCAFor",
    "PublishedTo",
    "ManageCertificates",
    "ManageCA",
    "DelegatedEnrollmentAgent",
    "Enroll",
    "WritePKIEnrollmentFlag",
    "WritePKINameFlag",
    "NTAuthStoreFor",
    "TrustedForNTAuth",
    "EnterpriseCAFor",
    "IssuedSignedBy",
    "EnrollOnBehalfOf",
    "HostsCAService",
    "AZMGApplication_ReadWrite_All",
    "AZMGAppRoleAssignment_ReadWrite_All",
    "AZMGDirectory_ReadWrite_All",
    "AZMGGroup_ReadWrite_All",
    "AZMGGroupMember_ReadWrite_All",
    "AZMGRoleManagement_ReadWrite_Directory",
    "AZMGServicePrincipalEndpoint_ReadWrite_All",
];

/// `relationship_kinds` query value. An empty selection is treated like
/// "everything" minus the standard exclusions.
pub fn relationship_kinds_filter(edge_types: &[String]) -> String {
    if edge_types.is_empty() {
        format!("nin:{}", STANDARD_EXCLUSIONS.join(","))
    } else {
        format!("in:{}", edge_types.join(","))
    }
}
