use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::sleep;

use super::{is_success, BatchApi, BatchError, BlobStore, JobStatus, OutputMapping};

const DEFAULT_CONTENT_TYPE: &str = "audio/wav";

/// Handle to one remote batch job.
///
/// The handle is a thin wrapper around the job id and the two collaborator
/// seams; it holds no job state of its own. Every status predicate asks the
/// remote authority again, so consecutive calls may observe different
/// answers. A handle is meant for single-owner sequential use; invoking
/// multiple operations on the same handle concurrently is the caller's
/// problem.
///
/// Nothing here retries. A failed upload or download aborts the operation
/// and leaves already-transferred files in place; re-invoking the operation
/// is safe.
pub struct Job {
    job_id: String,
    api: Arc<dyn BatchApi>,
    store: Arc<dyn BlobStore>,
}

impl Job {
    pub fn new(
        job_id: impl Into<String>,
        api: Arc<dyn BatchApi>,
        store: Arc<dyn BlobStore>,
    ) -> Self {
        Self {
            job_id: job_id.into(),
            api,
            store,
        }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Upload local files as job inputs, one sequential PUT per file.
    ///
    /// One upload URL is requested per file basename. The content type is
    /// inferred from each file name, falling back to `audio/wav`. The first
    /// non-2xx answer aborts with the failing file named; files uploaded
    /// before that point stay uploaded.
    pub async fn upload_files<P: AsRef<Path>>(
        &self,
        paths: &[P],
        timeout: Duration,
    ) -> Result<(), BatchError> {
        let names: Vec<String> = paths.iter().map(|p| basename(p.as_ref())).collect();
        let links = self.api.get_upload_links(&self.job_id, &names).await?;

        for (path, name) in paths.iter().zip(&names) {
            let link = links
                .upload_urls
                .get(name)
                .ok_or_else(|| BatchError::MissingLink { file: name.clone() })?;
            let body = tokio::fs::read(path.as_ref()).await?;
            let content_type = mime_guess::from_path(path.as_ref())
                .first_raw()
                .unwrap_or(DEFAULT_CONTENT_TYPE);
            let status = self
                .store
                .put(&link.file_url, body, content_type, timeout)
                .await?;
            if !is_success(status) {
                return Err(BatchError::Upload {
                    file: name.clone(),
                    status,
                });
            }
        }
        Ok(())
    }

    pub async fn start(&self) -> Result<JobStatus, BatchError> {
        self.api.start(&self.job_id).await
    }

    pub async fn get_status(&self) -> Result<JobStatus, BatchError> {
        self.api.get_status(&self.job_id).await
    }

    /// Poll status at a fixed interval until the job reaches a terminal
    /// state, returning that status.
    ///
    /// The deadline is measured from the first poll and checked after each
    /// status fetch, so the overrun can exceed `timeout` by up to one
    /// `poll_interval`. No backoff.
    pub async fn wait_until_complete(
        &self,
        poll_interval: Duration,
        timeout: Duration,
    ) -> Result<JobStatus, BatchError> {
        let start = Instant::now();
        loop {
            let status = self.get_status().await?;
            if status.is_terminal() {
                return Ok(status);
            }
            if start.elapsed() > timeout {
                return Err(BatchError::DeadlineExceeded {
                    job_id: self.job_id.clone(),
                    timeout,
                });
            }
            sleep(poll_interval).await;
        }
    }

    /// Map input file names to output file names from a fresh status fetch.
    ///
    /// Details that do not yet carry both an input and an output record are
    /// left out: the mapping is only meaningful once outputs exist. Order
    /// follows the remote response.
    pub async fn get_output_mappings(&self) -> Result<Vec<OutputMapping>, BatchError> {
        let status = self.get_status().await?;
        Ok(status
            .job_details
            .iter()
            .filter_map(|detail| match (detail.inputs.first(), detail.outputs.first()) {
                (Some(input), Some(output)) => Some(OutputMapping {
                    input_file: input.file_name.clone(),
                    output_file: output.file_name.clone(),
                }),
                _ => None,
            })
            .collect())
    }

    /// Download every mapped output into `output_dir`, one sequential GET
    /// per file, written as `<input_file>.json`.
    ///
    /// The directory is created if missing. The first non-2xx answer aborts
    /// with the failing output named; files written before that point stay
    /// on disk.
    pub async fn download_outputs(&self, output_dir: impl AsRef<Path>) -> Result<(), BatchError> {
        let mappings = self.get_output_mappings().await?;
        let names: Vec<String> = mappings.iter().map(|m| m.output_file.clone()).collect();
        let links = self.api.get_download_links(&self.job_id, &names).await?;

        tokio::fs::create_dir_all(output_dir.as_ref()).await?;
        for mapping in &mappings {
            let link = links
                .download_urls
                .get(&mapping.output_file)
                .ok_or_else(|| BatchError::MissingLink {
                    file: mapping.output_file.clone(),
                })?;
            let (status, body) = self.store.get(&link.file_url).await?;
            if !is_success(status) {
                return Err(BatchError::Download {
                    file: mapping.output_file.clone(),
                    status,
                });
            }
            let target = output_dir
                .as_ref()
                .join(format!("{}.json", mapping.input_file));
            tokio::fs::write(&target, &body).await?;
        }
        Ok(())
    }

    /// Whether the job is known to the remote service. A not-found or any
    /// other non-2xx status answer means `false`; transport failures
    /// propagate.
    pub async fn exists(&self) -> Result<bool, BatchError> {
        match self.get_status().await {
            Ok(_) => Ok(true),
            Err(BatchError::NotFound { .. }) | Err(BatchError::Api { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub async fn is_complete(&self) -> Result<bool, BatchError> {
        Ok(self.get_status().await?.is_terminal())
    }

    pub async fn is_successful(&self) -> Result<bool, BatchError> {
        Ok(self.get_status().await?.is_successful())
    }

    pub async fn is_failed(&self) -> Result<bool, BatchError> {
        Ok(self.get_status().await?.is_failed())
    }
}

fn basename(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}
