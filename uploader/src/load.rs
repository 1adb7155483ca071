use std::fmt;
use std::str::FromStr;

use crate::http::job::JobConfigurationLoad;
use crate::http::table::{SourceFormat, TableReference, TableSchema};

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("unsupported source format: {0}")]
    UnsupportedFormat(String),
}

/// The file formats a load can be requested for.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LoadFormat {
    /// Newline-delimited JSON.
    Json,
    /// CSV whose header rows are skipped as requested.
    Csv,
    /// CSV with a single header row and an autodetected schema.
    LocalCsv,
    Orc,
    Parquet,
}

impl LoadFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadFormat::Json => "JSON",
            LoadFormat::Csv => "CSV",
            LoadFormat::LocalCsv => "LOCAL_CSV",
            LoadFormat::Orc => "ORC",
            LoadFormat::Parquet => "PARQUET",
        }
    }
}

impl fmt::Display for LoadFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoadFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "JSON" => Ok(LoadFormat::Json),
            "CSV" => Ok(LoadFormat::Csv),
            "LOCAL_CSV" => Ok(LoadFormat::LocalCsv),
            "ORC" => Ok(LoadFormat::Orc),
            "PARQUET" => Ok(LoadFormat::Parquet),
            other => Err(Error::UnsupportedFormat(other.to_string())),
        }
    }
}

/// How a load job interprets its source. Built once per load and consumed by
/// [`LoadJobConfig::into_load_configuration`].
///
/// The schema is attached as given for every format, including the ones for
/// which BigQuery reads the schema from the file or detects it.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct LoadJobConfig {
    schema: TableSchema,
    source_format: SourceFormat,
    skip_leading_rows: Option<i64>,
    autodetect: bool,
}

impl LoadJobConfig {
    /// Builds the configuration for a format tag such as `"JSON"` or `"LOCAL_CSV"`.
    pub fn build(schema: TableSchema, format: &str, skip_leading_rows: u32) -> Result<Self, Error> {
        Ok(Self::new(schema, format.parse()?, skip_leading_rows))
    }

    /// `skip_leading_rows` only applies to [`LoadFormat::Csv`]; `LocalCsv` always skips one header row.
    pub fn new(schema: TableSchema, format: LoadFormat, skip_leading_rows: u32) -> Self {
        let (source_format, skip_leading_rows, autodetect) = match format {
            LoadFormat::Json => (SourceFormat::NewlineDelimitedJson, None, false),
            LoadFormat::Csv => (SourceFormat::Csv, Some(i64::from(skip_leading_rows)), false),
            LoadFormat::LocalCsv => (SourceFormat::Csv, Some(1), true),
            LoadFormat::Orc => (SourceFormat::Orc, None, false),
            LoadFormat::Parquet => (SourceFormat::Parquet, None, false),
        };
        Self {
            schema,
            source_format,
            skip_leading_rows,
            autodetect,
        }
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    pub fn source_format(&self) -> SourceFormat {
        self.source_format
    }

    pub fn skip_leading_rows(&self) -> Option<i64> {
        self.skip_leading_rows
    }

    pub fn autodetect(&self) -> bool {
        self.autodetect
    }

    pub fn into_load_configuration(
        self,
        destination_table: TableReference,
        source_uris: Vec<String>,
    ) -> JobConfigurationLoad {
        JobConfigurationLoad {
            source_uris,
            schema: Some(self.schema),
            destination_table,
            skip_leading_rows: self.skip_leading_rows,
            source_format: Some(self.source_format),
            autodetect: Some(self.autodetect),
            ..Default::default()
        }
    }
}
