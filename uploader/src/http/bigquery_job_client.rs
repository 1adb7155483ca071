use std::sync::Arc;
use std::time::Duration;

use crate::http::bigquery_client::BigqueryClient;
use crate::http::error::Error;
use crate::http::job;
use crate::http::job::get::GetJobRequest;
use crate::http::job::{Job, JobState};

#[derive(Debug, Clone)]
pub struct BigqueryJobClient {
    inner: Arc<BigqueryClient>,
}

impl BigqueryJobClient {
    pub fn new(inner: Arc<BigqueryClient>) -> Self {
        Self { inner }
    }

    /// https://cloud.google.com/bigquery/docs/reference/rest/v2/jobs/insert
    #[cfg_attr(feature = "trace", tracing::instrument(skip_all))]
    pub async fn create(&self, metadata: &Job) -> Result<Job, Error> {
        let builder = job::insert::build(self.inner.endpoint(), self.inner.http(), metadata);
        self.inner.send(builder).await
    }

    /// Inserts the job with the source data carried in the request body.
    #[cfg_attr(feature = "trace", tracing::instrument(skip_all))]
    pub async fn upload(&self, metadata: &Job, source: &[u8]) -> Result<Job, Error> {
        let builder = job::upload::build(self.inner.upload_endpoint(), self.inner.http(), metadata, source)?;
        self.inner.send(builder).await
    }

    /// https://cloud.google.com/bigquery/docs/reference/rest/v2/jobs/get
    #[cfg_attr(feature = "trace", tracing::instrument(skip_all))]
    pub async fn get(&self, project_id: &str, job_id: &str, req: &GetJobRequest) -> Result<Job, Error> {
        let builder = job::get::build(self.inner.endpoint(), self.inner.http(), project_id, job_id, req);
        self.inner.send(builder).await
    }

    /// Polls the job every `interval` until it reaches the DONE state.
    /// A finished job carrying an error result is returned as [`Error::JobFailed`].
    pub async fn wait(&self, job: Job, interval: Duration) -> Result<Job, Error> {
        let mut job = job;
        while job.status.state != JobState::Done {
            tokio::time::sleep(interval).await;
            let jr = &job.job_reference;
            let req = GetJobRequest {
                location: jr.location.clone(),
            };
            job = self.get(&jr.project_id, &jr.job_id, &req).await?;
            tracing::debug!("job {} state = {:?}", job.job_reference.job_id, job.status.state);
        }
        match job.status.error_result {
            Some(error) => Err(Error::JobFailed {
                job_id: job.job_reference.job_id,
                error,
            }),
            None => Ok(job),
        }
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;
    use std::time::Duration;

    use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::http::bigquery_client::test::create_client;
    use crate::http::bigquery_job_client::BigqueryJobClient;
    use crate::http::error::Error;
    use crate::http::job::{Job, JobConfiguration, JobConfigurationLoad, JobReference, JobState};
    use crate::http::table::{SourceFormat, TableReference};

    fn load_job(job_id: &str) -> Job {
        Job {
            job_reference: JobReference {
                project_id: "p1".to_string(),
                job_id: job_id.to_string(),
                location: Some("US".to_string()),
            },
            configuration: JobConfiguration {
                load: Some(JobConfigurationLoad {
                    source_uris: vec!["gs://bucket/rows.json".to_string()],
                    destination_table: TableReference::new("p1", "d1", "t1"),
                    source_format: Some(SourceFormat::NewlineDelimitedJson),
                    autodetect: Some(false),
                    ..Default::default()
                }),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn job_json(job_id: &str, state: &str) -> serde_json::Value {
        serde_json::json!({
            "jobReference": {"projectId": "p1", "jobId": job_id, "location": "US"},
            "configuration": {"jobType": "LOAD", "load": {
                "destinationTable": {"projectId": "p1", "datasetId": "d1", "tableId": "t1"}
            }},
            "status": {"state": state},
            "statistics": {"load": {"inputFiles": "1", "outputRows": "47"}}
        })
    }

    #[tokio::test]
    async fn create_load_job() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bigquery/v2/projects/p1/jobs"))
            .and(body_partial_json(serde_json::json!({
                "jobReference": {"projectId": "p1", "jobId": "job1"},
                "configuration": {"load": {
                    "sourceUris": ["gs://bucket/rows.json"],
                    "sourceFormat": "NEWLINE_DELIMITED_JSON",
                    "autodetect": false
                }}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(job_json("job1", "RUNNING")))
            .expect(1)
            .mount(&server)
            .await;

        let client = BigqueryJobClient::new(Arc::new(create_client(&server)));
        let job = client.create(&load_job("job1")).await.unwrap();
        assert_eq!(JobState::Running, job.status.state);
        assert_eq!(Some("LOAD".to_string()), job.configuration.job_type);
    }

    #[tokio::test]
    async fn upload_sends_multipart_related() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload/bigquery/v2/projects/p1/jobs"))
            .and(query_param("uploadType", "multipart"))
            .and(header(
                "Content-Type",
                "multipart/related; boundary=gcloud_bq_uploader_boundary",
            ))
            .and(body_string_contains("campaign_id,campaign_name"))
            .respond_with(ResponseTemplate::new(200).set_body_json(job_json("job2", "DONE")))
            .expect(1)
            .mount(&server)
            .await;

        let client = BigqueryJobClient::new(Arc::new(create_client(&server)));
        let job = client
            .upload(&load_job("job2"), b"campaign_id,campaign_name\n1,a\n")
            .await
            .unwrap();
        assert_eq!(Some(47), job.output_rows());
    }

    #[tokio::test]
    async fn wait_until_done() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/bigquery/v2/projects/p1/jobs/job3"))
            .and(query_param("location", "US"))
            .respond_with(ResponseTemplate::new(200).set_body_json(job_json("job3", "DONE")))
            .expect(1)
            .mount(&server)
            .await;

        let client = BigqueryJobClient::new(Arc::new(create_client(&server)));
        let mut pending = load_job("job3");
        pending.status.state = JobState::Pending;
        let done = client.wait(pending, Duration::from_millis(1)).await.unwrap();
        assert_eq!(JobState::Done, done.status.state);
        assert_eq!(Some(47), done.output_rows());
    }

    #[tokio::test]
    async fn wait_surfaces_error_result() {
        let server = MockServer::start().await;
        let mut failed = job_json("job4", "DONE");
        failed["status"]["errorResult"] = serde_json::json!({"reason": "invalid", "message": "bad row"});
        Mock::given(method("GET"))
            .and(path("/bigquery/v2/projects/p1/jobs/job4"))
            .respond_with(ResponseTemplate::new(200).set_body_json(failed))
            .mount(&server)
            .await;

        let client = BigqueryJobClient::new(Arc::new(create_client(&server)));
        let err = client
            .wait(load_job("job4"), Duration::from_millis(1))
            .await
            .unwrap_err();
        match err {
            Error::JobFailed { job_id, error } => {
                assert_eq!("job4", job_id);
                assert_eq!(Some("invalid".to_string()), error.reason);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
