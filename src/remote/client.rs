use super::types::{
    CreateRunRequest, CreateTasksRequest, CreateTasksResponse, ResultsPage, RunInfo, TaskInput,
};
use super::JobApi;
use crate::error::{RemoteError, RemoteResult};
use async_trait::async_trait;
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.lobstr.io/v1";

/// REST client for the squid/run/results scrape service
pub struct LobstrClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl LobstrClient {
    pub fn new(token: String) -> RemoteResult<Self> {
        Self::with_base_url(token, DEFAULT_BASE_URL.to_string())
    }

    pub fn with_base_url(token: String, base_url: String) -> RemoteResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> RemoteResult<T> {
        let resp = request
            .header("Authorization", format!("Token {}", self.token))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RemoteError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = resp.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl JobApi for LobstrClient {
    async fn create_task(&self, squid_id: &str, search_url: Option<&str>) -> RemoteResult<String> {
        let body = CreateTasksRequest {
            squid: squid_id.to_string(),
            tasks: search_url
                .map(|url| vec![TaskInput { url: url.to_string() }])
                .unwrap_or_default(),
        };
        let url = format!("{}/tasks", self.base_url);
        let created: CreateTasksResponse = self.send(self.client.post(&url).json(&body)).await?;
        created
            .task_id()
            .ok_or_else(|| RemoteError::Parse("task creation returned no task id".to_string()))
    }

    async fn create_run(&self, squid_id: &str) -> RemoteResult<RunInfo> {
        let body = CreateRunRequest {
            squid: squid_id.to_string(),
        };
        let url = format!("{}/runs", self.base_url);
        self.send(self.client.post(&url).json(&body)).await
    }

    async fn get_run(&self, run_id: &str) -> RemoteResult<RunInfo> {
        let url = format!("{}/runs/{}", self.base_url, run_id);
        self.send(self.client.get(&url)).await
    }

    async fn get_results(
        &self,
        squid_id: &str,
        run_id: &str,
        page: u32,
        page_size: u32,
    ) -> RemoteResult<ResultsPage> {
        let url = format!("{}/results", self.base_url);
        let query = [
            ("squid", squid_id.to_string()),
            ("run", run_id.to_string()),
            ("page", page.to_string()),
            ("page_size", page_size.to_string()),
        ];
        self.send(self.client.get(&url).query(&query)).await
    }
}
