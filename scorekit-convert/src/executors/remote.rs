//! HTTP delegation to an external recognition service
//!
//! Each stage is one `POST {endpoint}/stages/{index}` request. The document
//! bytes travel (base64) with the upload stage only; later stages refer to the
//! job id. The service answers with an optional element update and an optional
//! failure message, which the controller classifies.

use anyhow::Context;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use super::{StageContext, StageExecutor, StageOutcome};
use crate::models::{DetectedElements, ProcessingOptions};
use crate::services::FailureSignal;

const USER_AGENT: &str = concat!("scorekit-convert/", env!("CARGO_PKG_VERSION"));

/// Request body for one stage
#[derive(Debug, Serialize)]
pub struct StageRequest<'a> {
    pub job_id: Uuid,
    pub stage_index: usize,
    pub stage_label: &'a str,
    pub document_name: &'a str,
    /// Base64 document, upload stage only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<String>,
    pub options: &'a ProcessingOptions,
}

/// Response body for one stage
#[derive(Debug, Default, Deserialize)]
pub struct StageResponse {
    #[serde(default)]
    pub elements: Option<DetectedElements>,
    /// Human-readable failure, classified by keyword
    #[serde(default)]
    pub failure: Option<String>,
    /// Service certainty in its failure diagnosis
    #[serde(default)]
    pub certainty: Option<f64>,
}

impl StageResponse {
    fn into_outcome(self) -> StageOutcome {
        let failure = self.failure.map(|message| {
            let signal = FailureSignal::message(message);
            match self.certainty {
                Some(certainty) => signal.with_certainty(certainty),
                None => signal,
            }
        });
        StageOutcome {
            elements: self.elements.filter(|e| !e.is_empty()),
            failure,
        }
    }
}

pub struct RemoteRecognizer {
    http_client: reqwest::Client,
    endpoint: String,
}

impl RemoteRecognizer {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .context("Failed to build recognition HTTP client")?;

        Ok(Self {
            http_client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        })
    }

    fn stage_url(&self, index: usize) -> String {
        format!("{}/stages/{}", self.endpoint, index)
    }
}

#[async_trait::async_trait]
impl StageExecutor for RemoteRecognizer {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn execute(&self, ctx: &StageContext) -> anyhow::Result<StageOutcome> {
        let document = (ctx.stage_index == 0)
            .then(|| base64::engine::general_purpose::STANDARD.encode(&ctx.document.bytes));

        let request = StageRequest {
            job_id: ctx.job_id,
            stage_index: ctx.stage_index,
            stage_label: ctx.stage.label,
            document_name: &ctx.document.file_name,
            document,
            options: &ctx.options,
        };

        let url = self.stage_url(ctx.stage_index);
        tracing::debug!(job_id = %ctx.job_id, url = %url, "Calling recognition service");

        let response = self
            .http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .with_context(|| format!("Recognition service unreachable at {}", url))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Recognition service returned {}: {}", status.as_u16(), body);
        }

        let reply: StageResponse = response
            .json()
            .await
            .context("Malformed recognition service response")?;

        Ok(reply.into_outcome())
    }
}
