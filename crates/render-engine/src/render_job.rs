//! Render jobs: submit a customization to the render service and poll it.
//!
//! The render service receives the *unresolved* customization and renders
//! out of process. This side only submits and polls; the deliverable is the
//! `output_url` of a completed job.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use karo_common::config::RenderServiceConfig;
use karo_common::{KaroError, KaroResult};
use karo_template_model::customization::Customization;
use serde::{Deserialize, Serialize};

/// Status of a render job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RenderState {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl RenderState {
    /// Parse a status string. The service's `draft` and `rendering` map to
    /// `Pending` and `Processing`; unknown strings are treated as still
    /// processing.
    pub fn from_name(name: &str) -> Self {
        match name {
            "pending" | "draft" | "queued" => Self::Pending,
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            "processing" | "rendering" => Self::Processing,
            other => {
                tracing::warn!(status = other, "Unknown render status, treating as processing");
                Self::Processing
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl From<String> for RenderState {
    fn from(name: String) -> Self {
        Self::from_name(&name)
    }
}

impl From<RenderState> for String {
    fn from(state: RenderState) -> Self {
        state.as_str().to_string()
    }
}

impl fmt::Display for RenderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status report for a render job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderStatus {
    pub status: RenderState,

    /// Percent complete, 0-100.
    #[serde(default)]
    pub progress: u8,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_time_remaining: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl RenderStatus {
    pub fn new(status: RenderState, progress: u8) -> Self {
        Self {
            status,
            progress: progress.min(100),
            output_url: None,
            thumbnail_url: None,
            estimated_time_remaining: None,
            error_message: None,
        }
    }

    pub fn completed(output_url: impl Into<String>) -> Self {
        Self {
            output_url: Some(output_url.into()),
            ..Self::new(RenderState::Completed, 100)
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            error_message: Some(message.into()),
            ..Self::new(RenderState::Failed, 0)
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Output container requested from the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Mp4,
    Webm,
    Gif,
}

/// Encoder quality preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    Low,
    Medium,
    #[default]
    High,
    Ultra,
}

/// Everything needed to start a render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderRequest {
    pub template_id: String,
    pub title: String,
    pub customization: Customization,
    pub output_format: OutputFormat,
    pub quality: Quality,
    pub watermark: bool,
}

impl RenderRequest {
    pub fn new(template_id: impl Into<String>, customization: Customization) -> Self {
        let template_id = template_id.into();
        Self {
            title: template_id.clone(),
            template_id,
            customization,
            output_format: OutputFormat::default(),
            quality: Quality::default(),
            watermark: false,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    pub fn with_quality(mut self, quality: Quality) -> Self {
        self.quality = quality;
        self
    }
}

/// A submitted job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderJobHandle {
    pub job_id: String,
    pub submitted_at: DateTime<Utc>,
}

/// Errors from the render-job collaborator.
#[derive(Debug, thiserror::Error)]
pub enum RenderJobError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Render service returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Failed to parse render service response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Gave up after {polls} status polls")]
    TimedOut { polls: u32 },

    #[error("{0}")]
    Other(String),
}

impl From<RenderJobError> for KaroError {
    fn from(err: RenderJobError) -> Self {
        KaroError::render(err.to_string())
    }
}

/// Submit/poll interface of the render service.
#[async_trait]
pub trait RenderJobClient: Send + Sync {
    /// Start rendering. Returns the job handle to poll.
    async fn submit(&self, request: &RenderRequest) -> Result<RenderJobHandle, RenderJobError>;

    /// Current status of a job.
    async fn status(&self, job_id: &str) -> Result<RenderStatus, RenderJobError>;

    /// Client name for logs.
    fn name(&self) -> &str;
}

/// Progress callback invoked with every polled status.
pub type ProgressCallback = Box<dyn Fn(&RenderStatus) + Send + Sync>;

/// Polling cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    pub interval: Duration,
    /// Stop with [`RenderJobError::TimedOut`] after this many polls.
    pub max_polls: Option<u32>,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(1500),
            max_polls: None,
        }
    }
}

impl From<&RenderServiceConfig> for PollOptions {
    fn from(config: &RenderServiceConfig) -> Self {
        Self {
            interval: config.poll_interval(),
            max_polls: None,
        }
    }
}

/// Poll `job_id` until it completes or fails.
///
/// Returns `Ok(None)` without any request when `job_id` is absent. The
/// first terminal status ends polling immediately. Transport errors are
/// returned as-is; there is no automatic retry.
pub async fn poll_render_job(
    client: &dyn RenderJobClient,
    job_id: Option<&str>,
    options: PollOptions,
    on_progress: Option<&ProgressCallback>,
) -> Result<Option<RenderStatus>, RenderJobError> {
    let Some(job_id) = job_id.filter(|id| !id.is_empty()) else {
        tracing::debug!("No render job id, skipping poll");
        return Ok(None);
    };

    let mut polls = 0u32;
    loop {
        let status = client.status(job_id).await?;
        polls += 1;

        tracing::debug!(
            client = client.name(),
            job_id,
            status = %status.status,
            progress = status.progress,
            "Polled render job"
        );
        if let Some(cb) = on_progress {
            cb(&status);
        }

        if status.is_terminal() {
            match status.status {
                RenderState::Completed => tracing::info!(
                    job_id,
                    output = ?status.output_url,
                    "Render completed"
                ),
                _ => tracing::warn!(
                    job_id,
                    error = ?status.error_message,
                    "Render failed"
                ),
            }
            return Ok(Some(status));
        }

        if options.max_polls.is_some_and(|max| polls >= max) {
            return Err(RenderJobError::TimedOut { polls });
        }
        tokio::time::sleep(options.interval).await;
    }
}

/// Submit `request` and poll it to a terminal status.
///
/// Resolves to the completed status. A job the service reports as failed
/// becomes [`KaroError::Render`] carrying the service's error message.
pub async fn render_and_wait(
    client: &dyn RenderJobClient,
    request: &RenderRequest,
    options: PollOptions,
    on_progress: Option<&ProgressCallback>,
) -> KaroResult<RenderStatus> {
    let handle = client.submit(request).await?;
    let status = poll_render_job(client, Some(&handle.job_id), options, on_progress).await?;

    match status {
        Some(status) if status.status == RenderState::Completed => Ok(status),
        Some(status) => Err(KaroError::render(format!(
            "job {} failed: {}",
            handle.job_id,
            status.error_message.as_deref().unwrap_or("no error message")
        ))),
        None => Err(KaroError::render("render service returned an empty job id")),
    }
}

/// HTTP client for the render service.
pub struct HttpRenderJobClient {
    client: reqwest::Client,
    base_url: String,
    api_token: Option<String>,
}

impl fmt::Debug for HttpRenderJobClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpRenderJobClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct UseTemplateBody<'a> {
    template_id: &'a str,
    title: &'a str,
    customizations: &'a Customization,
}

#[derive(Deserialize)]
struct UseTemplateResponse {
    id: String,
}

#[derive(Serialize)]
struct RenderBody<'a> {
    user_template_id: &'a str,
    output_format: OutputFormat,
    quality: Quality,
    watermark: bool,
}

impl HttpRenderJobClient {
    pub fn new(config: &RenderServiceConfig) -> Result<Self, RenderJobError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
        })
    }

    fn use_url(&self, template_id: &str) -> String {
        format!("{}/templates/{}/use", self.base_url, template_id)
    }

    fn render_url(&self) -> String {
        format!("{}/templates/render", self.base_url)
    }

    fn status_url(&self, job_id: &str) -> String {
        format!("{}/templates/render/{}/status", self.base_url, job_id)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, RenderJobError> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(RenderJobError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl RenderJobClient for HttpRenderJobClient {
    async fn submit(&self, request: &RenderRequest) -> Result<RenderJobHandle, RenderJobError> {
        let created: UseTemplateResponse = Self::read_json(
            self.authorize(self.client.post(self.use_url(&request.template_id)))
                .json(&UseTemplateBody {
                    template_id: &request.template_id,
                    title: &request.title,
                    customizations: &request.customization,
                })
                .send()
                .await?,
        )
        .await?;

        let accepted: RenderStatus = Self::read_json(
            self.authorize(self.client.post(self.render_url()))
                .json(&RenderBody {
                    user_template_id: &created.id,
                    output_format: request.output_format,
                    quality: request.quality,
                    watermark: request.watermark,
                })
                .send()
                .await?,
        )
        .await?;

        tracing::info!(
            job_id = %created.id,
            status = %accepted.status,
            "Render job submitted"
        );
        Ok(RenderJobHandle {
            job_id: created.id,
            submitted_at: Utc::now(),
        })
    }

    async fn status(&self, job_id: &str) -> Result<RenderStatus, RenderJobError> {
        Self::read_json(
            self.authorize(self.client.get(self.status_url(job_id)))
                .send()
                .await?,
        )
        .await
    }

    fn name(&self) -> &str {
        "http"
    }
}
