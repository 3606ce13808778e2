use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::config::BackendConfig;
use crate::errors::SubmitError;
use crate::reasons::ReportReason;
use crate::report::ReportRequest;
use crate::submitter::ReportSubmitter;

/// Report submitter talking to the moderation JSON API
#[derive(Debug, Clone)]
pub struct HttpReportSubmitter {
    client: Client,
    base_url: Url,
    api_token: Option<String>,
}

#[derive(Debug, Serialize)]
struct ReportBody<'a> {
    reason: ReportReason,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

impl HttpReportSubmitter {
    /// Create a submitter; `timeout` bounds each report call end to end
    pub fn new(base_url: &str, api_token: Option<String>, timeout: Duration) -> anyhow::Result<Self> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("Moderation API URL cannot be used as a base: {base_url}");
        }

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url,
            api_token,
        })
    }

    pub fn from_config(backend: &BackendConfig) -> anyhow::Result<Self> {
        Self::new(&backend.base_url, backend.api_token.clone(), backend.timeout())
    }

    /// `{base}/routines/{routine_id}/reports`, with the id percent-encoded
    pub fn report_url(&self, routine_id: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["routines", routine_id, "reports"]);
        }
        url
    }
}

fn classify_send_error(err: reqwest::Error) -> SubmitError {
    if err.is_builder() {
        SubmitError::Unexpected {
            message: err.to_string(),
        }
    } else {
        SubmitError::transport(err.to_string())
    }
}

#[async_trait]
impl ReportSubmitter for HttpReportSubmitter {
    async fn submit_report(&self, request: &ReportRequest) -> Result<(), SubmitError> {
        let url = self.report_url(&request.routine_id);
        let body = ReportBody {
            reason: request.reason,
            details: request.details.as_deref(),
        };

        let mut builder = self.client.post(url).json(&body);
        if let Some(token) = &self.api_token {
            builder = builder.bearer_auth(token);
        }

        debug!(routine_id = %request.routine_id, "Sending report to moderation API");
        let response = builder.send().await.map_err(classify_send_error)?;
        let status = response.status();

        if status.is_success() {
            debug!(status = status.as_u16(), "Moderation API accepted report");
            return Ok(());
        }

        // Body is best effort; a rejection stays a rejection without it
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .ok()
            .and_then(|body| body.message.or(body.error));

        Err(SubmitError::Rejected {
            status: Some(status.as_u16()),
            message,
        })
    }
}
