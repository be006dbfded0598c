use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::{Builder, Runtime};

use super::{BatchApi, BatchError, BlobStore, Job, JobStatus, OutputMapping};

/// Blocking facade over [`Job`].
///
/// Each handle owns a private current-thread runtime and drives the async
/// core to completion on the calling thread; there is exactly one
/// implementation of the job state machine. Inter-poll waits in
/// [`BlockingJob::wait_until_complete`] block the caller.
///
/// Must not be constructed or used from inside an async context; use
/// [`Job`] there instead.
pub struct BlockingJob {
    inner: Job,
    runtime: Runtime,
}

impl BlockingJob {
    pub fn new(
        job_id: impl Into<String>,
        api: Arc<dyn BatchApi>,
        store: Arc<dyn BlobStore>,
    ) -> Result<Self, BatchError> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        Ok(Self {
            inner: Job::new(job_id, api, store),
            runtime,
        })
    }

    pub fn job_id(&self) -> &str {
        self.inner.job_id()
    }

    pub fn upload_files<P: AsRef<Path>>(
        &self,
        paths: &[P],
        timeout: Duration,
    ) -> Result<(), BatchError> {
        self.runtime.block_on(self.inner.upload_files(paths, timeout))
    }

    pub fn start(&self) -> Result<JobStatus, BatchError> {
        self.runtime.block_on(self.inner.start())
    }

    pub fn get_status(&self) -> Result<JobStatus, BatchError> {
        self.runtime.block_on(self.inner.get_status())
    }

    pub fn wait_until_complete(
        &self,
        poll_interval: Duration,
        timeout: Duration,
    ) -> Result<JobStatus, BatchError> {
        self.runtime
            .block_on(self.inner.wait_until_complete(poll_interval, timeout))
    }

    pub fn get_output_mappings(&self) -> Result<Vec<OutputMapping>, BatchError> {
        self.runtime.block_on(self.inner.get_output_mappings())
    }

    pub fn download_outputs(&self, output_dir: impl AsRef<Path>) -> Result<(), BatchError> {
        self.runtime.block_on(self.inner.download_outputs(output_dir))
    }

    pub fn exists(&self) -> Result<bool, BatchError> {
        self.runtime.block_on(self.inner.exists())
    }

    pub fn is_complete(&self) -> Result<bool, BatchError> {
        self.runtime.block_on(self.inner.is_complete())
    }

    pub fn is_successful(&self) -> Result<bool, BatchError> {
        self.runtime.block_on(self.inner.is_successful())
    }

    pub fn is_failed(&self) -> Result<bool, BatchError> {
        self.runtime.block_on(self.inner.is_failed())
    }
}
