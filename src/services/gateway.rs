use crate::core::config::GatewayConfig;
use crate::core::error::{WorkflowError, WorkflowResult};
use crate::core::model::{Audience, PainPointCard, VideoScript, VoiceConfig};
use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::Arc;
use url::Url;

/// Client-side contract for the remote generation service. One method
/// per remote operation; implementations own transport and decoding.
#[async_trait]
pub trait GenerationGateway: Send + Sync + Debug {
    async fn analyze(&self, request: &AnalyzeRequest) -> WorkflowResult<Vec<PainPointCard>>;
    async fn generate_script(&self, request: &ScriptRequest) -> WorkflowResult<VideoScript>;
    async fn generate_video(&self, request: &VideoRequest) -> WorkflowResult<VideoSubmission>;
    async fn video_status(&self, job_id: &str) -> WorkflowResult<VideoStatus>;
    async fn social_copies(&self, request: &SocialCopyRequest) -> WorkflowResult<Vec<String>>;
}

pub fn create_gateway(config: &GatewayConfig) -> Result<Arc<dyn GenerationGateway>> {
    Ok(Arc::new(HttpGateway::new(config)?))
}

// --- Request bodies ---

#[derive(Serialize, Clone, Debug)]
pub struct AnalyzeRequest {
    pub product_name: String,
    pub persona: String,
    pub target_customer: String,
    pub audience_type: Audience,
    pub product_keywords: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_context: Option<String>,
}

#[derive(Serialize, Clone, Debug)]
pub struct ScriptRequest {
    pub selected_card: PainPointCard,
    pub voice: VoiceConfig,
    pub video_style: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

#[derive(Serialize, Clone, Debug)]
pub struct VideoRequest {
    pub script: VideoScript,
    pub voice: VoiceConfig,
    pub video_style: String,
}

#[derive(Serialize, Clone, Debug)]
pub struct SocialCopyRequest {
    pub selected_card: PainPointCard,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

// --- Response bodies ---

/// What a video submission returns right away. Synchronous backends fill
/// the URLs; asynchronous ones return a job id and empty URL strings
/// until polling resolves them.
#[derive(Deserialize, Default, Clone, Debug, PartialEq)]
pub struct VideoSubmission {
    #[serde(default)]
    pub video_url: String,
    #[serde(default)]
    pub audio_url: String,
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct VideoStatus {
    pub job_id: String,
    pub status: String,
    #[serde(default)]
    pub video_url: Option<String>,
    /// Untouched provider payload, logged for diagnosis only.
    #[serde(default)]
    pub raw: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct AnalyzeResponse {
    #[serde(default)]
    cards: Vec<PainPointCard>,
}

#[derive(Deserialize)]
struct ScriptResponse {
    script: VideoScript,
}

#[derive(Deserialize)]
struct SocialCopyResponse {
    #[serde(default)]
    copies: Vec<String>,
}

// --- HTTP implementation ---

#[derive(Debug)]
pub struct HttpGateway {
    base: Url,
    client: reqwest::Client,
}

impl HttpGateway {
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        let base = Url::parse(&config.base_url)
            .with_context(|| format!("Invalid gateway base url: {}", config.base_url))?;
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .context("Failed to build http client")?;
        Ok(Self { base, client })
    }

    fn endpoint(&self, path: &str) -> WorkflowResult<Url> {
        Ok(self.base.join(path)?)
    }

    /// Job ids are opaque wire strings; the query pair percent-encodes
    /// them.
    fn status_endpoint(&self, job_id: &str) -> WorkflowResult<Url> {
        let mut url = self.endpoint("/api/video_status")?;
        url.query_pairs_mut().append_pair("video_id", job_id);
        Ok(url)
    }

    /// Rewrites server-relative media paths against the gateway base so
    /// callers always get an absolute URL.
    fn resolve_media(&self, media_url: &str) -> WorkflowResult<String> {
        if media_url.starts_with('/') {
            Ok(self.base.join(media_url)?.to_string())
        } else {
            Ok(media_url.to_string())
        }
    }

    async fn post_json<Req, Resp>(
        &self,
        op: &'static str,
        path: &str,
        body: &Req,
    ) -> WorkflowResult<Resp>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        debug!("posting {} request to {}", op, url);
        let resp = self.client.post(url).json(body).send().await?;
        let http_status = resp.status();
        if !http_status.is_success() {
            let detail = resp.text().await?;
            return Err(gateway_error(op, http_status, &detail));
        }
        Ok(resp.json::<Resp>().await?)
    }
}

fn gateway_error(op: &str, status: reqwest::StatusCode, detail: &str) -> WorkflowError {
    let detail = detail.trim();
    if detail.is_empty() {
        WorkflowError::Gateway(format!("{} request failed: {}", op, status))
    } else {
        WorkflowError::Gateway(format!("{} request failed: {}: {}", op, status, detail))
    }
}

#[async_trait]
impl GenerationGateway for HttpGateway {
    async fn analyze(&self, request: &AnalyzeRequest) -> WorkflowResult<Vec<PainPointCard>> {
        let result: AnalyzeResponse = self.post_json("analyze", "/api/analyze", request).await?;
        Ok(result.cards)
    }

    async fn generate_script(&self, request: &ScriptRequest) -> WorkflowResult<VideoScript> {
        let result: ScriptResponse = self
            .post_json("script", "/api/generate_script", request)
            .await?;
        Ok(result.script)
    }

    async fn generate_video(&self, request: &VideoRequest) -> WorkflowResult<VideoSubmission> {
        let mut submission: VideoSubmission = self
            .post_json("video", "/api/generate_video", request)
            .await?;
        submission.video_url = self.resolve_media(&submission.video_url)?;
        submission.audio_url = self.resolve_media(&submission.audio_url)?;
        Ok(submission)
    }

    async fn video_status(&self, job_id: &str) -> WorkflowResult<VideoStatus> {
        let url = self.status_endpoint(job_id)?;
        debug!("querying status for job {}", job_id);
        let resp = self.client.get(url).send().await?;
        let http_status = resp.status();
        if !http_status.is_success() {
            let detail = resp.text().await?;
            return Err(gateway_error("video status", http_status, &detail));
        }
        let mut payload: VideoStatus = resp.json().await?;
        if let Some(video_url) = payload.video_url.take() {
            payload.video_url = Some(self.resolve_media(&video_url)?);
        }
        Ok(payload)
    }

    async fn social_copies(&self, request: &SocialCopyRequest) -> WorkflowResult<Vec<String>> {
        let result: SocialCopyResponse = self
            .post_json("social copy", "/api/generate_xhs_copies", request)
            .await?;
        Ok(result.copies)
    }
}
