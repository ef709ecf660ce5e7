//! HTTP client for the studyloop backend.
//!
//! One client speaks to all three collaborator endpoints:
//! `POST /api/generate-dynamic-test`, `POST /api/generate-test`,
//! `POST /api/submit-test`, and `GET /api/analytics`.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::instrument;

use studyloop_core::error::{GenerationError, ServiceError};
use studyloop_core::model::{AttemptSubmission, ConceptAnalysis, QuizPayload, TestResult};
use studyloop_core::traits::{GradingService, HistorySource, QuestionGenerator, RetestRequest};
use studyloop_core::validation::RecordPolicy;

use crate::config::ServiceConfig;

/// Client for the grading, generation, and analytics services.
pub struct ServiceClient {
    base_url: String,
    api_key: Option<String>,
    timeout_secs: u64,
    policy: RecordPolicy,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct FreshTestRequest<'a> {
    topic: &'a str,
}

/// Transport-level outcome shared by every endpoint.
enum CallError {
    Status { status: u16, body: String },
    Timeout,
    Network(String),
    Decode(String),
}

impl ServiceClient {
    pub fn new(config: &ServiceConfig, policy: RecordPolicy) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            timeout_secs: config.timeout_secs,
            policy,
            client,
        })
    }

    fn with_auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => req.header("Authorization", format!("Bearer {key}")),
            None => req,
        }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        req: reqwest::RequestBuilder,
    ) -> std::result::Result<T, CallError> {
        let response = self.with_auth(req).send().await.map_err(|e| {
            if e.is_timeout() {
                CallError::Timeout
            } else {
                CallError::Network(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(CallError::Status { status, body });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| CallError::Decode(e.to_string()))
    }

    async fn post_quiz<B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> std::result::Result<QuizPayload, GenerationError> {
        let req = self
            .client
            .post(format!("{}{path}", self.base_url))
            .json(body);
        self.send::<QuizPayload>(req)
            .await
            .map_err(|e| self.generation_error(e))
    }

    fn generation_error(&self, e: CallError) -> GenerationError {
        match e {
            CallError::Status { status, body } => GenerationError::Service {
                status,
                message: error_message(&body),
            },
            CallError::Timeout => GenerationError::Timeout(self.timeout_secs),
            CallError::Network(msg) => GenerationError::Network(msg),
            CallError::Decode(msg) => GenerationError::InvalidResponse(msg),
        }
    }

    fn service_error(&self, e: CallError) -> ServiceError {
        match e {
            CallError::Status { status, body } => ServiceError::Api {
                status,
                message: error_message(&body),
            },
            CallError::Timeout => ServiceError::Timeout(self.timeout_secs),
            CallError::Network(msg) => ServiceError::Network(msg),
            CallError::Decode(msg) => ServiceError::Decode(msg),
        }
    }
}

/// Pull the `error` field out of a JSON error body, else return the body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

#[async_trait]
impl QuestionGenerator for ServiceClient {
    #[instrument(skip(self, request), fields(topic = %request.topic, concepts = request.weak_concepts.len()))]
    async fn generate_retest(
        &self,
        request: &RetestRequest,
    ) -> std::result::Result<QuizPayload, GenerationError> {
        self.post_quiz("/api/generate-dynamic-test", request).await
    }

    #[instrument(skip(self))]
    async fn generate_fresh(&self, topic: &str) -> std::result::Result<QuizPayload, GenerationError> {
        self.post_quiz("/api/generate-test", &FreshTestRequest { topic })
            .await
    }
}

#[async_trait]
impl GradingService for ServiceClient {
    #[instrument(skip(self, submission), fields(topic = %submission.topic, user = %submission.username))]
    async fn submit(
        &self,
        submission: &AttemptSubmission,
    ) -> std::result::Result<Vec<ConceptAnalysis>, ServiceError> {
        let req = self
            .client
            .post(format!("{}/api/submit-test", self.base_url))
            .json(submission);
        let analyses: Vec<ConceptAnalysis> =
            self.send(req).await.map_err(|e| self.service_error(e))?;
        self.policy.check_analyses(&analyses)?;
        tracing::debug!(count = analyses.len(), "attempt graded");
        Ok(analyses)
    }
}

#[async_trait]
impl HistorySource for ServiceClient {
    #[instrument(skip(self))]
    async fn fetch_history(
        &self,
        username: &str,
    ) -> std::result::Result<Vec<TestResult>, ServiceError> {
        let url = reqwest::Url::parse_with_params(
            &format!("{}/api/analytics", self.base_url),
            &[("username", username)],
        )
        .map_err(|e| ServiceError::Network(format!("invalid analytics URL: {e}")))?;
        let req = self.client.get(url);
        let results: Vec<TestResult> = match self.send(req).await {
            Ok(results) => results,
            // The analytics service answers 404 when the user has no results.
            Err(CallError::Status { status: 404, .. }) => {
                tracing::debug!("no history stored for user");
                Vec::new()
            }
            Err(e) => return Err(self.service_error(e)),
        };
        self.policy.check_results(&results)?;
        Ok(results)
    }
}
