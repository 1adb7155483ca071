use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use time::OffsetDateTime;
use token_source::TokenSourceProvider;

use crate::chunk;
use crate::http;
use crate::http::bigquery_client::BigqueryClient;
use crate::http::bigquery_dataset_client::BigqueryDatasetClient;
use crate::http::bigquery_job_client::BigqueryJobClient;
use crate::http::bigquery_table_client::BigqueryTableClient;
use crate::http::bigquery_tabledata_client::BigqueryTabledataClient;
use crate::http::dataset::delete::DeleteDatasetRequest;
use crate::http::dataset::{Dataset, DatasetReference};
use crate::http::job::{Job, JobConfiguration, JobReference};
use crate::http::objects::delete::DeleteObjectRequest;
use crate::http::objects::upload::UploadObjectRequest;
use crate::http::storage_client::StorageClient;
use crate::http::table::list::{ListTablesRequest, TableOverview};
use crate::http::table::{Table, TableReference, TableSchema, TimePartitionType, TimePartitioning};
use crate::http::tabledata::insert_all::{InsertAllRequest, InsertAllResponse};
use crate::load;
use crate::load::LoadJobConfig;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Http(#[from] http::error::Error),
    #[error(transparent)]
    Chunk(#[from] chunk::Error),
    #[error(transparent)]
    Load(#[from] load::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug)]
pub struct ClientConfig {
    pub http: Option<reqwest_middleware::ClientWithMiddleware>,
    pub bigquery_endpoint: String,
    pub storage_endpoint: String,
    pub token_source_provider: Box<dyn TokenSourceProvider>,
    pub project_id: String,
    /// Location of created datasets and submitted jobs.
    pub location: String,
    /// Interval between job status checks while waiting for a load to finish.
    pub job_poll_interval: Duration,
}

impl ClientConfig {
    pub fn new(project_id: &str, token_source_provider: Box<dyn TokenSourceProvider>) -> Self {
        Self {
            http: None,
            bigquery_endpoint: "https://bigquery.googleapis.com".to_string(),
            storage_endpoint: "https://storage.googleapis.com".to_string(),
            token_source_provider,
            project_id: project_id.to_string(),
            location: "US".to_string(),
            job_poll_interval: Duration::from_secs(1),
        }
    }

    /// Routes both BigQuery and Cloud Storage requests to `endpoint`, e.g. an emulator.
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.bigquery_endpoint = endpoint.to_string();
        self.storage_endpoint = endpoint.to_string();
        self
    }

    pub fn with_location(mut self, location: &str) -> Self {
        self.location = location.to_string();
        self
    }

    pub fn with_job_poll_interval(mut self, interval: Duration) -> Self {
        self.job_poll_interval = interval;
        self
    }
}

/// Result of a finished load job.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct LoadOutcome {
    pub job_id: String,
    /// Rows written by this job.
    pub output_rows: i64,
    /// Rows in the destination table after the load.
    pub total_rows: Option<u64>,
}

#[derive(Clone)]
pub struct Client {
    dataset_client: BigqueryDatasetClient,
    table_client: BigqueryTableClient,
    tabledata_client: BigqueryTabledataClient,
    job_client: BigqueryJobClient,
    storage_client: StorageClient,
    project_id: String,
    location: String,
    job_poll_interval: Duration,
}

impl Client {
    pub fn new(config: ClientConfig) -> Self {
        let ts = config.token_source_provider.token_source();
        let http = config
            .http
            .unwrap_or_else(|| reqwest_middleware::ClientBuilder::new(reqwest::Client::default()).build());
        let client = Arc::new(BigqueryClient::new(
            ts.clone(),
            config.bigquery_endpoint.as_str(),
            http.clone(),
        ));
        Self {
            dataset_client: BigqueryDatasetClient::new(client.clone()),
            table_client: BigqueryTableClient::new(client.clone()),
            tabledata_client: BigqueryTabledataClient::new(client.clone()),
            job_client: BigqueryJobClient::new(client),
            storage_client: StorageClient::new(ts, config.storage_endpoint.as_str(), http),
            project_id: config.project_id,
            location: config.location,
            job_poll_interval: config.job_poll_interval,
        }
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn dataset(&self) -> &BigqueryDatasetClient {
        &self.dataset_client
    }

    pub fn table(&self) -> &BigqueryTableClient {
        &self.table_client
    }

    pub fn tabledata(&self) -> &BigqueryTabledataClient {
        &self.tabledata_client
    }

    pub fn job(&self) -> &BigqueryJobClient {
        &self.job_client
    }

    pub fn storage(&self) -> &StorageClient {
        &self.storage_client
    }

    /// Reference to a table in this client's project.
    pub fn table_ref(&self, dataset_id: &str, table_id: &str) -> TableReference {
        TableReference::new(&self.project_id, dataset_id, table_id)
    }

    pub async fn dataset_exists(&self, dataset_id: &str) -> Result<bool, Error> {
        match self.dataset_client.get(&self.project_id, dataset_id).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn table_exists(&self, dataset_id: &str, table_id: &str) -> Result<bool, Error> {
        self.exists(&self.table_ref(dataset_id, table_id)).await
    }

    async fn exists(&self, table: &TableReference) -> Result<bool, Error> {
        match self
            .table_client
            .get(&table.project_id, &table.dataset_id, &table.table_id)
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Creates the dataset in the configured location.
    /// Returns `None` when it already exists.
    pub async fn create_dataset(&self, dataset_id: &str, description: Option<&str>) -> Result<Option<Dataset>, Error> {
        let dataset = Dataset {
            dataset_reference: DatasetReference {
                dataset_id: dataset_id.to_string(),
                project_id: self.project_id.clone(),
            },
            description: description.map(str::to_string),
            location: self.location.clone(),
        };
        match self.dataset_client.create(&dataset).await {
            Ok(created) => {
                tracing::info!("created dataset {}.{}", self.project_id, dataset_id);
                Ok(Some(created))
            }
            Err(e) if e.is_conflict() => {
                tracing::warn!("dataset {}.{} already exists", self.project_id, dataset_id);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Deletes the dataset together with its tables. A missing dataset is not an error.
    pub async fn delete_dataset(&self, dataset_id: &str) -> Result<(), Error> {
        let req = DeleteDatasetRequest { delete_contents: true };
        match self.dataset_client.delete(&self.project_id, dataset_id, &req).await {
            Ok(()) => {
                tracing::info!("deleted dataset {}.{}", self.project_id, dataset_id);
                Ok(())
            }
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => {
                if e.is_bad_request() {
                    tracing::warn!("couldn't delete dataset {}.{}, delete the tables first", self.project_id, dataset_id);
                }
                Err(e.into())
            }
        }
    }

    /// Creates the table unless it already exists, in which case rows are
    /// appended to the existing table and `None` is returned.
    /// With `partition_by` the table is partitioned by day on that column.
    pub async fn create_table(
        &self,
        dataset_id: &str,
        table_id: &str,
        schema: &TableSchema,
        partition_by: Option<&str>,
        description: Option<&str>,
    ) -> Result<Option<Table>, Error> {
        let table = self.table_ref(dataset_id, table_id);
        self.ensure_table(&table, schema, partition_by, description).await
    }

    pub async fn ensure_table(
        &self,
        table: &TableReference,
        schema: &TableSchema,
        partition_by: Option<&str>,
        description: Option<&str>,
    ) -> Result<Option<Table>, Error> {
        if self.exists(table).await? {
            tracing::info!("table {} already exists, appending data", table);
            return Ok(None);
        }
        let metadata = Table {
            table_reference: table.clone(),
            description: description.map(str::to_string),
            schema: Some(schema.clone()),
            time_partitioning: partition_by.map(|field| TimePartitioning {
                partition_type: TimePartitionType::Day,
                field: Some(field.to_string()),
            }),
            ..Default::default()
        };
        self.table_client.create(&metadata).await?;
        match partition_by {
            Some(field) => tracing::info!("created table {} partitioned by {}", table, field),
            None => tracing::info!("created table {}", table),
        }
        let created = self
            .table_client
            .get(&table.project_id, &table.dataset_id, &table.table_id)
            .await?;
        Ok(Some(created))
    }

    pub async fn list_tables(&self, dataset_id: &str) -> Result<Vec<TableOverview>, Error> {
        let tables = self
            .table_client
            .list(&self.project_id, dataset_id, &ListTablesRequest::default())
            .await?;
        tracing::info!("tables contained in {}.{}: {}", self.project_id, dataset_id, tables.len());
        for table in &tables {
            tracing::info!("{}", table.table_reference);
        }
        Ok(tables)
    }

    pub async fn get_table(&self, dataset_id: &str, table_id: &str) -> Result<Table, Error> {
        let table = self.table_client.get(&self.project_id, dataset_id, table_id).await?;
        tracing::info!("got table {}", table.table_reference);
        tracing::debug!("table schema: {:?}", table.schema);
        tracing::debug!("table description: {:?}", table.description);
        tracing::info!("table has {} rows", table.num_rows.unwrap_or_default());
        Ok(table)
    }

    /// Deletes the table. A missing table is logged and not an error.
    pub async fn delete_table(&self, dataset_id: &str, table_id: &str) -> Result<(), Error> {
        let table = self.table_ref(dataset_id, table_id);
        match self
            .table_client
            .delete(&table.project_id, &table.dataset_id, &table.table_id)
            .await
        {
            Ok(()) => {
                tracing::info!("deleted table {}", table);
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                tracing::warn!("couldn't delete table {}, table doesn't exist", table);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Uploads a local file and returns its `gs://` URI.
    pub async fn upload_file_to_bucket(&self, bucket: &str, object: &str, path: impl AsRef<Path>) -> Result<String, Error> {
        let path = path.as_ref();
        let body = tokio::fs::read(path).await?;
        let req = UploadObjectRequest {
            bucket: bucket.to_string(),
            name: object.to_string(),
            content_type: Some(content_type(path).to_string()),
        };
        let uploaded = self.storage_client.upload_object(&req, body).await?;
        let uri = uploaded.uri();
        tracing::info!("uploaded {} to {}", path.display(), uri);
        Ok(uri)
    }

    pub async fn delete_object(&self, bucket: &str, object: &str) -> Result<(), Error> {
        let req = DeleteObjectRequest {
            bucket: bucket.to_string(),
            object: object.to_string(),
        };
        self.storage_client.delete_object(&req).await?;
        tracing::info!("blob {} deleted", object);
        Ok(())
    }

    /// Loads files already in Cloud Storage and waits for the job to finish.
    pub async fn load_table_from_uri(
        &self,
        uri: &str,
        config: LoadJobConfig,
        dataset_id: &str,
        table_id: &str,
    ) -> Result<LoadOutcome, Error> {
        let job = self.load_job(config, dataset_id, table_id, vec![uri.to_string()]);
        let job = self.job_client.create(&job).await?;
        self.finish_load(job).await
    }

    /// Loads a local file through a media upload and waits for the job to finish.
    pub async fn load_table_from_file(
        &self,
        path: impl AsRef<Path>,
        config: LoadJobConfig,
        dataset_id: &str,
        table_id: &str,
    ) -> Result<LoadOutcome, Error> {
        let source = tokio::fs::read(path.as_ref()).await?;
        let job = self.load_job(config, dataset_id, table_id, vec![]);
        let job = self.job_client.upload(&job, &source).await?;
        self.finish_load(job).await
    }

    fn load_job(&self, config: LoadJobConfig, dataset_id: &str, table_id: &str, source_uris: Vec<String>) -> Job {
        let job_id = format!("bq_uploader_load_{}", OffsetDateTime::now_utc().unix_timestamp_nanos());
        Job {
            job_reference: JobReference {
                project_id: self.project_id.clone(),
                job_id,
                location: Some(self.location.clone()),
            },
            configuration: JobConfiguration {
                load: Some(config.into_load_configuration(self.table_ref(dataset_id, table_id), source_uris)),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    async fn finish_load(&self, job: Job) -> Result<LoadOutcome, Error> {
        tracing::info!("starting job {}", job.job_reference.job_id);
        let job = self.job_client.wait(job, self.job_poll_interval).await?;
        let output_rows = job.output_rows().unwrap_or_default();
        let destination = job
            .configuration
            .load
            .as_ref()
            .map(|load| load.destination_table.clone())
            .unwrap_or_default();
        tracing::info!("job finished, loaded {} rows into {}", output_rows, destination);
        let table = self
            .table_client
            .get(&destination.project_id, &destination.dataset_id, &destination.table_id)
            .await?;
        tracing::info!("total {} rows", table.num_rows.unwrap_or_default());
        Ok(LoadOutcome {
            job_id: job.job_reference.job_id,
            output_rows,
            total_rows: table.num_rows,
        })
    }

    /// Streams the rows with a single `insertAll` call.
    pub async fn insert_rows<T: Serialize>(&self, table: &TableReference, rows: &[T]) -> Result<InsertAllResponse, Error> {
        let req = InsertAllRequest::from_records(rows.iter());
        let response = self
            .tabledata_client
            .insert(&table.project_id, &table.dataset_id, &table.table_id, &req)
            .await?;
        Ok(response)
    }
}

fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") | Some("jsonl") | Some("ndjson") => "application/json",
        Some("csv") => "text/csv",
        _ => "application/octet-stream",
    }
}
