//! Streams an in-memory batch of records into a table chunk by chunk.

use async_trait::async_trait;
use serde::Serialize;

use crate::chunk;
use crate::chunk::DeepSize;
use crate::client::{Client, Error};
use crate::http;
use crate::http::bigquery_tabledata_client::BigqueryTabledataClient;
use crate::http::table::{TableReference, TableSchema};
use crate::http::tabledata::insert_all::{ErrorMessage, InsertAllRequest, InsertAllResponse};

pub const DEFAULT_CHUNK_MB: f64 = 9.0;

/// Where and how a batch is streamed.
#[derive(Clone, PartialEq, Debug)]
pub struct StreamConfig {
    pub project_id: String,
    pub dataset_id: String,
    pub table_id: String,
    /// Upper bound of a single `insertAll` request, in megabytes.
    pub chunk_mb: f64,
    /// Partitions a newly created table by day on this column.
    pub partition_by: Option<String>,
}

impl StreamConfig {
    pub fn new(project_id: &str, dataset_id: &str, table_id: &str) -> Self {
        Self {
            project_id: project_id.to_string(),
            dataset_id: dataset_id.to_string(),
            table_id: table_id.to_string(),
            chunk_mb: DEFAULT_CHUNK_MB,
            partition_by: None,
        }
    }

    pub fn with_chunk_mb(mut self, chunk_mb: f64) -> Self {
        self.chunk_mb = chunk_mb;
        self
    }

    pub fn with_partition_by(mut self, column: &str) -> Self {
        self.partition_by = Some(column.to_string());
        self
    }

    pub fn table(&self) -> TableReference {
        TableReference::new(&self.project_id, &self.dataset_id, &self.table_id)
    }

    /// `project.dataset.table`
    pub fn qualified_table(&self) -> String {
        self.table().to_string()
    }
}

/// Sends one chunk of rows to a table.
#[async_trait]
pub trait RowInserter: Send + Sync {
    async fn insert_rows<T: Serialize + Sync>(
        &self,
        table: &TableReference,
        rows: &[T],
    ) -> Result<InsertAllResponse, http::error::Error>;
}

#[async_trait]
impl RowInserter for BigqueryTabledataClient {
    async fn insert_rows<T: Serialize + Sync>(
        &self,
        table: &TableReference,
        rows: &[T],
    ) -> Result<InsertAllResponse, http::error::Error> {
        let req = InsertAllRequest::from_records(rows.iter());
        self.insert(&table.project_id, &table.dataset_id, &table.table_id, &req)
            .await
    }
}

/// A row the service refused.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct RowError {
    /// Position of the row in the whole batch, not in its chunk.
    pub index: usize,
    pub errors: Vec<ErrorMessage>,
}

#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct UploadSummary {
    pub chunks: usize,
    pub rows: usize,
    pub row_errors: Vec<RowError>,
}

impl UploadSummary {
    pub fn is_complete(&self) -> bool {
        self.row_errors.is_empty()
    }
}

/// Inserts `records` in chunks of at most `chunk_mb` megabytes, one request per chunk.
///
/// Rows rejected by the service are collected in the summary. A failed request
/// stops the upload; chunks already sent are not rolled back.
pub async fn upload_chunks<I, T>(
    inserter: &I,
    table: &TableReference,
    records: &[T],
    chunk_mb: f64,
) -> Result<UploadSummary, Error>
where
    I: RowInserter + ?Sized,
    T: DeepSize + Serialize + Sync,
{
    let plan = chunk::plan(records, chunk_mb)?;
    tracing::info!(
        "streaming {} rows into {} in {} chunks of up to {} rows (~{} bytes per row)",
        records.len(),
        table,
        plan.chunk_count(),
        plan.records_per_chunk(),
        plan.avg_record_bytes()
    );

    let mut summary = UploadSummary::default();
    let mut offset = 0;
    for chunk in plan.iter() {
        let response = inserter.insert_rows(table, chunk).await?;
        for rejected in response.insert_errors.unwrap_or_default() {
            summary.row_errors.push(RowError {
                index: offset + rejected.index as usize,
                errors: rejected.errors,
            });
        }
        offset += chunk.len();
        summary.chunks += 1;
        summary.rows += chunk.len();
        tracing::debug!("sent chunk {}/{}", summary.chunks, plan.chunk_count());
    }

    if summary.is_complete() {
        tracing::info!("streamed {} rows into {}", summary.rows, table);
    } else {
        tracing::warn!(
            "streamed {} rows into {}, {} rejected",
            summary.rows,
            table,
            summary.row_errors.len()
        );
    }
    Ok(summary)
}

/// Creates the destination table when missing, then streams the records into it.
pub async fn stream_records<T>(
    client: &Client,
    config: &StreamConfig,
    schema: &TableSchema,
    records: &[T],
) -> Result<UploadSummary, Error>
where
    T: DeepSize + Serialize + Sync,
{
    let table = config.table();
    client
        .ensure_table(&table, schema, config.partition_by.as_deref(), None)
        .await?;
    upload_chunks(client.tabledata(), &table, records, config.chunk_mb).await
}
