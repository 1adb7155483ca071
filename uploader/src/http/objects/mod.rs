pub mod delete;
pub mod upload;

/// An object stored in a Cloud Storage bucket.
#[derive(Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct Object {
    /// The name of the bucket containing this object.
    pub bucket: String,
    /// The name of the object.
    pub name: String,
    /// Content-Length of the data in bytes.
    #[serde(deserialize_with = "crate::http::from_str_option")]
    #[serde(default)]
    pub size: Option<i64>,
    /// Content-Type of the object data.
    pub content_type: Option<String>,
}

impl Object {
    /// The `gs://` URI load jobs use to address this object.
    pub fn uri(&self) -> String {
        format!("gs://{}/{}", self.bucket, self.name)
    }
}
