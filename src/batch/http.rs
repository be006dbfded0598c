use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde_json::json;
use std::env;
use std::sync::Arc;
use std::time::Duration;

use super::{
    BatchApi, BatchConfig, BatchError, BlobStore, BlockingJob, DownloadLinks, Job, JobStatus,
    UploadLinks,
};

const SUBSCRIPTION_HEADER: &str = "api-subscription-key";
const BLOB_TYPE_HEADER: &str = "x-ms-blob-type";

/// reqwest-backed implementation of both collaborator seams: the
/// link-issuing/job-control API and the raw storage transport.
pub struct HttpBatchClient {
    base_url: String,
    api_key: String,
    http: HttpClient,
}

impl HttpBatchClient {
    /// The subscription key comes from the config, falling back to the
    /// `VAANI_API_KEY` environment variable.
    pub fn new(config: &BatchConfig) -> Self {
        let api_key = config
            .api_subscription_key
            .clone()
            .or_else(|| env::var("VAANI_API_KEY").ok())
            .unwrap_or_default();
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            http: HttpClient::new(),
        }
    }

    /// Async handle for an existing job id. The handle must be used with
    /// the client that owns the job's subscription key.
    pub fn job(self: &Arc<Self>, job_id: impl Into<String>) -> Job {
        let api: Arc<dyn BatchApi> = self.clone();
        let store: Arc<dyn BlobStore> = self.clone();
        Job::new(job_id, api, store)
    }

    /// Blocking handle for an existing job id.
    pub fn blocking_job(
        self: &Arc<Self>,
        job_id: impl Into<String>,
    ) -> Result<BlockingJob, BatchError> {
        let api: Arc<dyn BatchApi> = self.clone();
        let store: Arc<dyn BlobStore> = self.clone();
        BlockingJob::new(job_id, api, store)
    }

    fn job_url(&self, job_id: &str, tail: &str) -> String {
        format!("{}/jobs/{}/{}", self.base_url, job_id, tail)
    }

    async fn parse_job_response(
        &self,
        job_id: &str,
        response: reqwest::Response,
    ) -> Result<JobStatus, BatchError> {
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(BatchError::NotFound {
                job_id: job_id.to_string(),
            });
        }
        if !status.is_success() {
            return Err(BatchError::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl BatchApi for HttpBatchClient {
    async fn get_upload_links(
        &self,
        job_id: &str,
        files: &[String],
    ) -> Result<UploadLinks, BatchError> {
        let response = self
            .http
            .post(self.job_url(job_id, "upload-links"))
            .header(SUBSCRIPTION_HEADER, &self.api_key)
            .json(&json!({ "files": files }))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(BatchError::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }
        Ok(response.json().await?)
    }

    async fn get_download_links(
        &self,
        job_id: &str,
        files: &[String],
    ) -> Result<DownloadLinks, BatchError> {
        let response = self
            .http
            .post(self.job_url(job_id, "download-links"))
            .header(SUBSCRIPTION_HEADER, &self.api_key)
            .json(&json!({ "files": files }))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(BatchError::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }
        Ok(response.json().await?)
    }

    async fn get_status(&self, job_id: &str) -> Result<JobStatus, BatchError> {
        let response = self
            .http
            .get(self.job_url(job_id, "status"))
            .header(SUBSCRIPTION_HEADER, &self.api_key)
            .send()
            .await?;
        self.parse_job_response(job_id, response).await
    }

    async fn start(&self, job_id: &str) -> Result<JobStatus, BatchError> {
        let response = self
            .http
            .post(self.job_url(job_id, "start"))
            .header(SUBSCRIPTION_HEADER, &self.api_key)
            .send()
            .await?;
        self.parse_job_response(job_id, response).await
    }
}

#[async_trait]
impl BlobStore for HttpBatchClient {
    async fn put(
        &self,
        url: &str,
        body: Vec<u8>,
        content_type: &str,
        timeout: Duration,
    ) -> Result<u16, BatchError> {
        let response = self
            .http
            .put(url)
            .header(BLOB_TYPE_HEADER, "BlockBlob")
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .timeout(timeout)
            .body(body)
            .send()
            .await?;
        Ok(response.status().as_u16())
    }

    async fn get(&self, url: &str) -> Result<(u16, Vec<u8>), BatchError> {
        let response = self.http.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();
        Ok((status, body))
    }
}
