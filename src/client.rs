use crate::error::WorkerError;
use crate::models::{
    CompressionConfig, HistoryEntry, JobRequest, JobStatus, LinkPayload, RetryRequest,
    SubmitResponse,
};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Duration;
use url::Url;

/// Where a status request is sent; implemented by [`WorkerClient`] and by
/// test doubles.
pub trait StatusSource: Send + Sync {
    fn status(
        &self,
        run_id: &str,
        job_id: &str,
    ) -> impl Future<Output = Result<JobStatus, WorkerError>> + Send;
}

/// A job the worker accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSession {
    pub job_id: String,
    pub run_id: String,
}

#[derive(Clone)]
pub struct WorkerClient {
    client: Client,
    base_url: String,
}

impl WorkerClient {
    pub fn new(
        base_url: &str,
        proxy: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, WorkerError> {
        let parsed = Url::parse(base_url)?;

        let mut client_builder = Client::builder().timeout(timeout);

        if let Some(proxy_url) = proxy {
            client_builder = client_builder.proxy(reqwest::Proxy::all(proxy_url)?);
        }

        let client = client_builder.build()?;

        Ok(Self {
            client,
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, WorkerError> {
        let status = response.status();
        if !status.is_success() {
            return Err(WorkerError::Status(status));
        }
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    fn accepted(reply: SubmitResponse) -> Result<String, WorkerError> {
        if !reply.ok {
            return Err(WorkerError::Rejected);
        }
        reply
            .run_id
            .filter(|id| !id.is_empty())
            .ok_or(WorkerError::MissingRunId)
    }

    /// Submits a new job under a fresh random job id.
    pub async fn submit(
        &self,
        links: Vec<LinkPayload>,
        notes: &str,
        compression: CompressionConfig,
    ) -> Result<JobSession, WorkerError> {
        let request = JobRequest {
            job_id: uuid::Uuid::new_v4().to_string(),
            links,
            notes: notes.to_string(),
            compression,
        };

        log::info!(
            "Submitting job {} with {} link(s)",
            request.job_id,
            request.links.len()
        );

        let response = self
            .client
            .post(self.endpoint(""))
            .json(&request)
            .send()
            .await?;
        let run_id = Self::accepted(Self::read_json(response).await?)?;

        log::info!("Job {} started as run {}", request.job_id, run_id);

        Ok(JobSession {
            job_id: request.job_id,
            run_id,
        })
    }

    pub async fn fetch_status(&self, run_id: &str, job_id: &str) -> Result<JobStatus, WorkerError> {
        let response = self
            .client
            .get(self.endpoint("status"))
            .query(&[("run_id", run_id), ("job_id", job_id)])
            .send()
            .await?;
        Self::read_json(response).await
    }

    pub async fn history(&self) -> Result<Vec<HistoryEntry>, WorkerError> {
        let response = self.client.get(self.endpoint("history")).send().await?;
        Self::read_json(response).await
    }

    /// Asks the worker to run the named files of an existing job again.
    pub async fn retry(
        &self,
        session: &JobSession,
        files: Vec<String>,
    ) -> Result<JobSession, WorkerError> {
        log::info!(
            "Retrying {} file(s) of job {}",
            files.len(),
            session.job_id
        );

        let request = RetryRequest {
            job_id: session.job_id.clone(),
            run_id: session.run_id.clone(),
            files,
        };

        let response = self
            .client
            .post(self.endpoint("retry"))
            .json(&request)
            .send()
            .await?;
        let run_id = Self::accepted(Self::read_json(response).await?)?;

        Ok(JobSession {
            job_id: session.job_id.clone(),
            run_id,
        })
    }
}

impl StatusSource for WorkerClient {
    fn status(
        &self,
        run_id: &str,
        job_id: &str,
    ) -> impl Future<Output = Result<JobStatus, WorkerError>> + Send {
        self.fetch_status(run_id, job_id)
    }
}
