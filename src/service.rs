//! Game Service seam: an async trait plus the REST implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::{ServiceError, ServiceResult};
use crate::protocol::{
    CheckTimerResponse, CommandReference, CommandResponse, CreateGameRequest, CreateGameResponse,
    ExecuteCommandRequest, FhsReference, HintResponse, TimerStatus,
};

const REQUEST_TIMEOUT_SECS: u64 = 10;
const TREES_RESOURCE: &str = "filesystem-trees";

#[async_trait]
pub trait GameService: Send + Sync {
    async fn create_game(&self, request: &CreateGameRequest) -> ServiceResult<CreateGameResponse>;

    async fn execute_command(
        &self,
        tree_id: i64,
        request: &ExecuteCommandRequest,
    ) -> ServiceResult<CommandResponse>;

    async fn timer_status(&self, tree_id: i64) -> ServiceResult<TimerStatus>;

    async fn check_timer(
        &self,
        tree_id: i64,
        session_id: Option<i64>,
    ) -> ServiceResult<CheckTimerResponse>;

    async fn hint(&self, tree_id: i64) -> ServiceResult<HintResponse>;

    async fn command_reference(&self) -> ServiceResult<CommandReference>;

    async fn fhs_reference(&self) -> ServiceResult<FhsReference>;
}

pub struct HttpGameService {
    http: Client,
    base_url: String,
}

impl HttpGameService {
    pub fn new(base_url: &str) -> ServiceResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, suffix: &str) -> String {
        format!("{}/{TREES_RESOURCE}/{suffix}", self.base_url)
    }

    async fn get<T: DeserializeOwned>(&self, url: String) -> ServiceResult<T> {
        debug!(%url, "GET");
        let response = self.http.get(&url).send().await?;
        decode(response).await
    }

    async fn post<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        url: String,
        body: &B,
    ) -> ServiceResult<T> {
        debug!(%url, "POST");
        let response = self.http.post(&url).json(body).send().await?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> ServiceResult<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ServiceError::Status {
            status: status.as_u16(),
            body: body.chars().take(200).collect(),
        });
    }
    Ok(response.json().await?)
}

#[async_trait]
impl GameService for HttpGameService {
    async fn create_game(&self, request: &CreateGameRequest) -> ServiceResult<CreateGameResponse> {
        self.post(self.url("create_game/"), request).await
    }

    async fn execute_command(
        &self,
        tree_id: i64,
        request: &ExecuteCommandRequest,
    ) -> ServiceResult<CommandResponse> {
        self.post(self.url(&format!("{tree_id}/execute_command/")), request)
            .await
    }

    async fn timer_status(&self, tree_id: i64) -> ServiceResult<TimerStatus> {
        self.get(self.url(&format!("{tree_id}/timer_status/"))).await
    }

    async fn check_timer(
        &self,
        tree_id: i64,
        session_id: Option<i64>,
    ) -> ServiceResult<CheckTimerResponse> {
        let mut url = self.url(&format!("{tree_id}/check_timer/"));
        if let Some(session_id) = session_id {
            url.push_str(&format!("?session_id={session_id}"));
        }
        self.get(url).await
    }

    async fn hint(&self, tree_id: i64) -> ServiceResult<HintResponse> {
        self.get(self.url(&format!("{tree_id}/hint/"))).await
    }

    async fn command_reference(&self) -> ServiceResult<CommandReference> {
        self.get(self.url("command_reference/")).await
    }

    async fn fhs_reference(&self) -> ServiceResult<FhsReference> {
        self.get(self.url("fhs_reference/")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_nest_under_the_trees_resource() {
        let service = HttpGameService::new("http://localhost:8000/api/").expect("client");
        assert_eq!(service.base_url(), "http://localhost:8000/api");
        assert_eq!(
            service.url("7/execute_command/"),
            "http://localhost:8000/api/filesystem-trees/7/execute_command/"
        );
    }

    #[test]
    fn status_errors_are_not_transport_failures() {
        let err = ServiceError::Status {
            status: 500,
            body: "boom".to_string(),
        };
        assert!(!err.is_transport());
        assert!(ServiceError::Unavailable("down".to_string()).is_transport());
        assert_eq!(err.to_string(), "game service returned 500: boom");
    }
}
