#![allow(clippy::result_large_err)]
//! # gcloud-bq-uploader
//!
//! Moves data into BigQuery: manages datasets and tables, stages files in
//! Cloud Storage, runs load jobs and streams in-memory rows in size-bounded chunks.
//!
//! ## Quick Start
//!
//! ### CreateClient
//!
//! Credentials are not resolved here. Pass any `token_source::TokenSourceProvider`,
//! for example the one from `google-cloud-auth`.
//!
//! ```rust
//! use google_cloud_bq_uploader::client::{Client, ClientConfig};
//! use token_source::TokenSourceProvider;
//!
//! fn create(tsp: Box<dyn TokenSourceProvider>) -> Client {
//!     let config = ClientConfig::new("my-project", tsp).with_location("US");
//!     Client::new(config)
//! }
//! ```
//!
//! ### Stream Rows
//!
//! Records are split into chunks whose estimated size fits `chunk_mb`, and each
//! chunk is sent with one `insertAll` request.
//!
//! ```rust
//! use google_cloud_bq_uploader::chunk::Record;
//! use google_cloud_bq_uploader::client::Client;
//! use google_cloud_bq_uploader::http::table::TableSchema;
//! use google_cloud_bq_uploader::stream::{stream_records, StreamConfig};
//!
//! async fn run(client: &Client, schema: &TableSchema, records: Vec<Record>) {
//!     let config = StreamConfig::new("my-project", "my_dataset", "campaigns").with_chunk_mb(9.0);
//!     let summary = stream_records(client, &config, schema, &records).await.unwrap();
//!     for rejected in summary.row_errors {
//!         println!("row {} rejected: {:?}", rejected.index, rejected.errors);
//!     }
//! }
//! ```
//!
//! ### Load Files
//!
//! ```rust
//! use google_cloud_bq_uploader::client::Client;
//! use google_cloud_bq_uploader::http::table::TableSchema;
//! use google_cloud_bq_uploader::load::LoadJobConfig;
//!
//! async fn run(client: &Client, schema: TableSchema) {
//!     let uri = client.upload_file_to_bucket("my-bucket", "in/campaigns.csv", "campaigns.csv").await.unwrap();
//!     let config = LoadJobConfig::build(schema, "CSV", 1).unwrap();
//!     let outcome = client.load_table_from_uri(&uri, config, "my_dataset", "campaigns").await.unwrap();
//!     println!("loaded {} rows", outcome.output_rows);
//! }
//! ```
//!
//! ## Features
//! ### HTTP API
//! * [x] [datasets](https://cloud.google.com/bigquery/docs/reference/rest/v2/datasets) insert, get, delete
//! * [x] [tables](https://cloud.google.com/bigquery/docs/reference/rest/v2/tables) insert, get, delete, list
//! * [x] [tabledata](https://cloud.google.com/bigquery/docs/reference/rest/v2/tabledata) insertAll
//! * [x] [jobs](https://cloud.google.com/bigquery/docs/reference/rest/v2/jobs) insert, get, multipart upload
//! * [x] [objects](https://cloud.google.com/storage/docs/json_api/v1/objects) media upload, delete

pub mod chunk;
pub mod client;
pub mod http;
pub mod load;
pub mod stream;
