pub mod get;
pub mod insert;
pub mod upload;

use std::fmt;

use crate::http::table::{SourceFormat, TableReference, TableSchema};

#[derive(Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize, Debug, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CreateDisposition {
    /// If the table does not exist, BigQuery creates the table.
    #[default]
    CreateIfNeeded,
    /// The table must already exist. If it does not, a 'notFound' error is returned in the job result.
    CreateNever,
}

#[derive(Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize, Debug, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WriteDisposition {
    /// If the table already exists, BigQuery overwrites the table data.
    WriteTruncate,
    /// If the table already exists, BigQuery appends the data to the table.
    #[default]
    WriteAppend,
    /// If the table already exists and contains data, a 'duplicate' error is returned in the job result.
    WriteEmpty,
}

#[derive(Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct JobConfigurationLoad {
    /// [Required] The fully-qualified URIs that point to your data in Google Cloud.
    /// Empty when the data is sent with a media upload.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub source_uris: Vec<String>,
    /// Optional. The schema for the destination table.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<TableSchema>,
    /// [Required] The destination table to load the data into.
    pub destination_table: TableReference,
    /// Optional. Specifies whether the job is allowed to create new tables.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_disposition: Option<CreateDisposition>,
    /// Optional. Specifies the action that occurs if the destination table already exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub write_disposition: Option<WriteDisposition>,
    /// Optional. The number of rows at the top of a CSV file that BigQuery will skip when loading the data.
    #[serde(deserialize_with = "crate::http::from_str_option")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_leading_rows: Option<i64>,
    /// Optional. The format of the data files. The default value is CSV.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_format: Option<SourceFormat>,
    /// Optional. Indicates if we should automatically infer the options and schema for CSV and JSON sources.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autodetect: Option<bool>,
}

#[derive(Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct JobConfiguration {
    /// Output only. The type of the job. Can be QUERY, LOAD, EXTRACT, COPY or UNKNOWN.
    #[serde(default, skip_serializing)]
    pub job_type: Option<String>,
    /// Configures a load job.
    pub load: Option<JobConfigurationLoad>,
}

#[derive(Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct JobReference {
    /// Required. The ID of the project containing this job.
    pub project_id: String,
    /// Required. The ID of the job. The ID must contain only letters (a-z, A-Z), numbers (0-9), underscores (_), or dashes (-).
    pub job_id: String,
    /// Optional. The geographic location of the job. The default value is US.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

#[derive(Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize, Debug, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    #[default]
    Pending,
    Running,
    Done,
}

#[derive(Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ErrorProto {
    /// A short error code that summarizes the error.
    pub reason: Option<String>,
    /// Specifies where the error occurred, if present.
    pub location: Option<String>,
    /// A human-readable description of the error.
    pub message: Option<String>,
}

impl fmt::Display for ErrorProto {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}",
            self.reason.as_deref().unwrap_or("unknown"),
            self.message.as_deref().unwrap_or_default()
        )
    }
}

#[derive(Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct JobStatus {
    /// Output only. Final error result of the job. If present, indicates that the job has completed and was unsuccessful.
    pub error_result: Option<ErrorProto>,
    /// Output only. The first errors encountered during the running of the job.
    pub errors: Option<Vec<ErrorProto>>,
    /// Output only. Running state of the job. Valid states include 'PENDING', 'RUNNING', and 'DONE'.
    pub state: JobState,
}

#[derive(Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct JobStatisticsLoad {
    /// Output only. Number of source files in a load job.
    #[serde(deserialize_with = "crate::http::from_str_option")]
    #[serde(default)]
    pub input_files: Option<i64>,
    /// Output only. Number of bytes of source data in a load job.
    #[serde(deserialize_with = "crate::http::from_str_option")]
    #[serde(default)]
    pub input_file_bytes: Option<i64>,
    /// Output only. Number of rows imported in a load job.
    /// Note that while an import job is in the running state, this value may change.
    #[serde(deserialize_with = "crate::http::from_str_option")]
    #[serde(default)]
    pub output_rows: Option<i64>,
    /// Output only. The number of bad records encountered.
    #[serde(deserialize_with = "crate::http::from_str_option")]
    #[serde(default)]
    pub bad_records: Option<i64>,
}

#[derive(Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct JobStatistics {
    /// Output only. Statistics for a load job.
    pub load: Option<JobStatisticsLoad>,
}

#[derive(Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    /// Required. Describes the job configuration.
    pub configuration: JobConfiguration,
    /// Optional. Reference describing the unique-per-user name of the job.
    pub job_reference: JobReference,
    /// Output only. Information about the job, including starting time and ending time of the job.
    #[serde(default, skip_serializing)]
    pub statistics: Option<JobStatistics>,
    /// Output only. The status of this job.
    #[serde(default, skip_serializing)]
    pub status: JobStatus,
}

impl Job {
    /// Number of rows the load job wrote, once statistics are available.
    pub fn output_rows(&self) -> Option<i64> {
        self.statistics.as_ref()?.load.as_ref()?.output_rows
    }
}
