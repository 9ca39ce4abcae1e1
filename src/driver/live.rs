//! REST client for the automation platform
//!
//! Talks to the public API (`/api/v1`) of an n8n-compatible instance.
//! Transport and HTTP failures are always returned as errors, never
//! replaced by default data.

use super::traits::WorkflowApi;
use super::types::{ExecutionRecord, TriggerResponse, WorkflowDescriptor, WorkflowList};
use crate::error::{HarnessError, HarnessResult};
use crate::utils::config::HarnessConfig;
use async_trait::async_trait;
use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Duration;

/// Header carrying the platform API key
pub const API_KEY_HEADER: &str = "x-n8n-api-key";

/// HTTP client bound to one platform instance
pub struct LiveApi {
    /// Base URL including the API prefix (e.g. "http://localhost:5678/api/v1")
    base_url: Url,
    client: reqwest::Client,
}

impl LiveApi {
    pub fn new(base_url: &str, api_key: Option<&str>, timeout: Duration) -> HarnessResult<Self> {
        let base = Url::parse(base_url)
            .map_err(|e| HarnessError::config(format!("invalid API URL {}: {}", base_url, e)))?;
        if base.cannot_be_a_base() {
            return Err(HarnessError::config(format!("invalid API URL {}", base_url)));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(key) = api_key.filter(|k| !k.is_empty()) {
            let value = HeaderValue::from_str(key)
                .map_err(|_| HarnessError::config("API key contains invalid header characters"))?;
            headers.insert(API_KEY_HEADER, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            base_url: base,
            client,
        })
    }

    pub fn from_config(config: &HarnessConfig) -> HarnessResult<Self> {
        Self::new(
            &config.base_url,
            config.api_key.as_deref(),
            config.request_timeout,
        )
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Endpoint below the API prefix; each segment is percent-encoded, so
    /// ids containing `/` or `?` stay inside their own segment
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Turn a response into `T`, mapping 404 through `not_found`
    async fn decode<T: DeserializeOwned>(
        resp: Response,
        not_found: impl FnOnce() -> HarnessError,
    ) -> HarnessResult<T> {
        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(not_found());
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(HarnessError::Api {
                status: status.as_u16(),
                message: api_message(&body, status),
            });
        }
        Ok(resp.json::<T>().await?)
    }
}

/// Best-effort extraction of the platform's error text
fn api_message(body: &str, status: StatusCode) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .or_else(|| {
            let trimmed = body.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string())
}

#[async_trait]
impl WorkflowApi for LiveApi {
    fn name(&self) -> &str {
        "live"
    }

    async fn get_workflow(&self, workflow_id: &str) -> HarnessResult<WorkflowDescriptor> {
        let url = self.url(&["workflows", workflow_id]);
        debug!("GET {}", url);
        let resp = self.client.get(url.clone()).send().await?;
        Self::decode(resp, || HarnessError::workflow_not_found(workflow_id)).await
    }

    async fn list_workflows(&self, tag: Option<&str>) -> HarnessResult<Vec<WorkflowDescriptor>> {
        let url = self.url(&["workflows"]);
        let mut request = self.client.get(url.clone());
        if let Some(tag) = tag {
            request = request.query(&[("filter", format!("tag:{}", tag))]);
        }
        debug!("GET {} (tag: {:?})", url, tag);
        let resp = request.send().await?;
        let list: WorkflowList = Self::decode(resp, || HarnessError::NotFound {
            kind: "Workflow list",
            id: url.to_string(),
        })
        .await?;
        Ok(list.into_vec())
    }

    async fn execute_workflow(
        &self,
        workflow_id: &str,
        input: &Value,
    ) -> HarnessResult<TriggerResponse> {
        let url = self.url(&["workflows", workflow_id, "execute"]);
        debug!("POST {}", url);
        let resp = self
            .client
            .post(url.clone())
            .json(&json!({ "data": input }))
            .send()
            .await?;
        Self::decode(resp, || HarnessError::workflow_not_found(workflow_id)).await
    }

    async fn get_execution(&self, execution_id: &str) -> HarnessResult<ExecutionRecord> {
        let url = self.url(&["executions", execution_id]);
        debug!("GET {}", url);
        let resp = self.client.get(url.clone()).send().await?;
        Self::decode(resp, || HarnessError::execution_not_found(execution_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::types::ExecutionStatus;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer, key: Option<&str>) -> LiveApi {
        LiveApi::new(
            &format!("{}/api/v1", server.uri()),
            key,
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_get_workflow_sends_api_key() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/workflows/wf-1"))
            .and(header(API_KEY_HEADER, "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "wf-1",
                "name": "Email digest",
                "nodes": [{ "name": "Send", "type": "n8n-nodes-base.emailSend" }]
            })))
            .mount(&server)
            .await;

        let api = client(&server, Some("secret"));
        let workflow = api.get_workflow("wf-1").await.unwrap();
        assert_eq!(workflow.name.as_deref(), Some("Email digest"));
        assert_eq!(workflow.nodes.len(), 1);
    }

    #[tokio::test]
    async fn test_get_workflow_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/workflows/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let api = client(&server, None);
        let err = api.get_workflow("missing").await.unwrap_err();
        assert!(matches!(err, HarnessError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_server_error_is_not_swallowed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/executions/7"))
            .respond_with(
                ResponseTemplate::new(500).set_body_json(json!({ "message": "database locked" })),
            )
            .mount(&server)
            .await;

        let api = client(&server, None);
        match api.get_execution("7").await {
            Err(HarnessError::Api { status, message }) => {
                assert_eq!(status, 500);
                assert_eq!(message, "database locked");
            }
            other => panic!("expected API error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_list_workflows_with_tag_filter() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/workflows"))
            .and(query_param("filter", "tag:ai"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{ "id": "1", "name": "A" }, { "id": "2", "name": "B" }]
            })))
            .mount(&server)
            .await;

        let api = client(&server, None);
        let list = api.list_workflows(Some("ai")).await.unwrap();
        let ids: Vec<_> = list.iter().filter_map(|w| w.id.as_deref()).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[tokio::test]
    async fn test_execute_wraps_input() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/workflows/wf-1/execute"))
            .and(body_json(json!({ "data": { "url": "https://example.com" } })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "executionId": "55" })))
            .mount(&server)
            .await;

        let api = client(&server, None);
        let resp = api
            .execute_workflow("wf-1", &json!({ "url": "https://example.com" }))
            .await
            .unwrap();
        assert_eq!(resp.handle(), Some("55"));
    }

    #[tokio::test]
    async fn test_get_execution_decodes_record() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/executions/55"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "55",
                "status": "error",
                "nodeExecutions": {
                    "OpenAI": [{ "error": { "message": "rate limit" } }]
                }
            })))
            .mount(&server)
            .await;

        let api = client(&server, None);
        let record = api.get_execution("55").await.unwrap();
        assert_eq!(record.status, ExecutionStatus::Error);
        assert_eq!(record.node_executions[0].name, "OpenAI");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        // Port 9 (discard) is closed on test machines
        let api = LiveApi::new(
            "http://127.0.0.1:9/api/v1",
            None,
            Duration::from_millis(500),
        )
        .unwrap();
        let err = api.get_workflow("wf-1").await.unwrap_err();
        assert!(matches!(err, HarnessError::Transport(_)));
    }

    #[tokio::test]
    async fn test_ids_are_escaped_in_paths() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/workflows/team%2Fa%3Fdraft/execute"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "executionId": "9" })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/executions/9%2F..%2Fworkflows"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "success" })))
            .mount(&server)
            .await;

        let api = client(&server, None);
        let resp = api.execute_workflow("team/a?draft", &json!({})).await.unwrap();
        assert_eq!(resp.handle(), Some("9"));
        let record = api.get_execution("9/../workflows").await.unwrap();
        assert_eq!(record.status, ExecutionStatus::Success);
    }

    #[test]
    fn test_base_url_is_validated() {
        assert!(LiveApi::new("not a url", None, Duration::from_secs(1)).is_err());
        let api = LiveApi::new("http://localhost:5678/api/v1/", None, Duration::from_secs(1)).unwrap();
        assert_eq!(
            api.url(&["workflows", "a b"]).as_str(),
            "http://localhost:5678/api/v1/workflows/a%20b"
        );
    }

    #[test]
    fn test_api_message_fallbacks() {
        assert_eq!(api_message("plain text", StatusCode::BAD_GATEWAY), "plain text");
        assert_eq!(api_message("", StatusCode::BAD_GATEWAY), "Bad Gateway");
    }
}
