use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use url::Url;

use crate::api::types::{ApiErrorBody, GraphData, GraphResponse, Node, SearchResponse, transform_flat_graph_response};
use crate::api::{ApiError, GraphApi, relationship_kinds_filter};
use crate::search::state::SearchType;

const SEARCH_PATH: &str = "api/v2/search";
const GRAPH_SEARCH_PATH: &str = "api/v2/graph-search";
const SHORTEST_PATH_PATH: &str = "api/v2/graphs/shortest-path";
const CYPHER_PATH: &str = "api/v2/graphs/cypher";

#[derive(Serialize)]
struct CypherRequest<'a> {
    query: &'a str,
    include_properties: bool,
}

/// reqwest-backed client for the explore endpoints.
#[derive(Debug, Clone)]
pub struct HttpGraphApi {
    client: Client,
    base: Url,
    token: Option<String>,
}

impl HttpGraphApi {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self, ApiError> {
        let mut base = Url::parse(base_url).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        // Url::join drops the last segment unless the base ends in '/'
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let client = Client::builder().timeout(timeout).build().map_err(|e| ApiError::Transport(e.to_string()))?;
        Ok(Self { client, base, token })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base.join(path).map_err(|e| ApiError::InvalidUrl(e.to_string()))
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(t) => req.bearer_auth(t),
            None => req,
        }
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ApiError> {
        let resp = self.authorize(req).send().await.map_err(|e| ApiError::Transport(e.to_string()))?;
        let resp = check_status(resp).await?;
        resp.json::<T>().await.map_err(|e| ApiError::Decode(e.to_string()))
    }
}

// Non-2xx responses carry `{ errors: [{ message }] }` bodies
async fn check_status(resp: Response) -> Result<Response, ApiError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let message = match resp.text().await {
        Ok(body) => serde_json::from_str::<ApiErrorBody>(&body).ok().and_then(|b| b.first_message()),
        Err(_) => None,
    };
    Err(ApiError::Status { status: status.as_u16(), message })
}

#[async_trait]
impl GraphApi for HttpGraphApi {
    async fn search_nodes(&self, term: &str, search_type: SearchType) -> Result<Vec<Node>, ApiError> {
        let url = self.endpoint(SEARCH_PATH)?;
        let req = self.client.get(url).query(&[("q", term), ("type", search_type.as_str())]);
        let resp: SearchResponse = self.send(req).await?;
        Ok(resp.data)
    }

    async fn single_node_search(&self, object_id: &str, search_type: SearchType) -> Result<GraphData, ApiError> {
        let url = self.endpoint(GRAPH_SEARCH_PATH)?;
        let req = self.client.get(url).query(&[("query", object_id), ("type", search_type.as_str())]);
        let resp: Value = self.send(req).await?;
        // Either the flat styled map itself or wrapped in `data`
        let flat: Map<String, Value> = match resp {
            Value::Object(mut obj) => match obj.remove("data") {
                Some(Value::Object(inner)) => inner,
                Some(other) => {
                    obj.insert("data".to_string(), other);
                    obj
                }
                None => obj,
            },
            Value::Null => Map::new(),
            other => return Err(ApiError::Decode(format!("unexpected graph-search payload: {}", other))),
        };
        Ok(transform_flat_graph_response(&flat))
    }

    async fn pathfinding_search(&self, start: &str, end: &str, edge_types: &[String]) -> Result<GraphData, ApiError> {
        let url = self.endpoint(SHORTEST_PATH_PATH)?;
        let kinds = relationship_kinds_filter(edge_types);
        let req = self
            .client
            .get(url)
            .query(&[("start_node", start), ("end_node", end), ("relationship_kinds", kinds.as_str())]);
        let resp: GraphResponse = self.send(req).await?;
        Ok(resp.data)
    }

    async fn cypher_search(&self, query: &str) -> Result<GraphData, ApiError> {
        let url = self.endpoint(CYPHER_PATH)?;
        let req = self.client.post(url).json(&CypherRequest { query, include_properties: true });
        let resp: GraphResponse = self.send(req).await?;
        Ok(resp.data)
    }
}
