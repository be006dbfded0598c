use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

mod blocking;
mod http;
mod job;
pub use blocking::BlockingJob;
pub use http::HttpBatchClient;
pub use job::Job;

#[cfg(test)]
mod tests;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BatchConfig {
    pub base_url: String,
    pub api_subscription_key: Option<String>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.sarvam.ai".to_string(),
            api_subscription_key: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FileRecord {
    pub file_name: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct JobDetail {
    #[serde(default)]
    pub inputs: Vec<FileRecord>,
    #[serde(default)]
    pub outputs: Vec<FileRecord>,
}

/// Snapshot of a job as reported by the remote authority. Never cached
/// locally: every predicate on [`Job`] re-fetches one of these.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JobStatus {
    pub job_id: String,
    pub job_state: String,
    #[serde(default)]
    pub job_details: Vec<JobDetail>,
}

impl JobStatus {
    /// Terminal means no further transitions are expected. The remote state
    /// string is compared case-insensitively.
    pub fn is_terminal(&self) -> bool {
        self.is_successful() || self.is_failed()
    }

    pub fn is_successful(&self) -> bool {
        self.job_state.eq_ignore_ascii_case("completed")
    }

    pub fn is_failed(&self) -> bool {
        self.job_state.eq_ignore_ascii_case("failed")
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FileUrl {
    pub file_url: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UploadLinks {
    pub upload_urls: HashMap<String, FileUrl>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DownloadLinks {
    pub download_urls: HashMap<String, FileUrl>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputMapping {
    pub input_file: String,
    pub output_file: String,
}

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("upload failed for {file}: {status}")]
    Upload { file: String, status: u16 },
    #[error("download failed for {file}: {status}")]
    Download { file: String, status: u16 },
    #[error("job {job_id} did not complete within {timeout:?}")]
    DeadlineExceeded { job_id: String, timeout: Duration },
    #[error("job {job_id} not found")]
    NotFound { job_id: String },
    #[error("no storage link issued for {file}")]
    MissingLink { file: String },
    #[error("api error {status}: {message}")]
    Api { status: u16, message: String },
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Link-issuing and job-control endpoints of the batch service.
#[async_trait]
pub trait BatchApi: Send + Sync {
    async fn get_upload_links(
        &self,
        job_id: &str,
        files: &[String],
    ) -> Result<UploadLinks, BatchError>;

    async fn get_download_links(
        &self,
        job_id: &str,
        files: &[String],
    ) -> Result<DownloadLinks, BatchError>;

    async fn get_status(&self, job_id: &str) -> Result<JobStatus, BatchError>;

    async fn start(&self, job_id: &str) -> Result<JobStatus, BatchError>;
}

/// Raw PUT/GET against the short-lived storage URLs issued by the service.
/// Implementations report the response status code; success policy lives in
/// [`Job`].
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(
        &self,
        url: &str,
        body: Vec<u8>,
        content_type: &str,
        timeout: Duration,
    ) -> Result<u16, BatchError>;

    async fn get(&self, url: &str) -> Result<(u16, Vec<u8>), BatchError>;
}

// The storage endpoints answer 2xx on success, including 226 IM Used.
pub(crate) fn is_success(status: u16) -> bool {
    (200..=226).contains(&status)
}
