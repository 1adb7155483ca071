use reqwest_middleware::{ClientWithMiddleware as Client, RequestBuilder};

use crate::http::Escape;

#[derive(Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct UploadObjectRequest {
    #[serde(skip_serializing)]
    pub bucket: String,
    /// Name of the object, sent as the `name` query parameter.
    pub name: String,
    #[serde(skip_serializing)]
    pub content_type: Option<String>,
}

pub(crate) fn build(base_url: &str, client: &Client, req: &UploadObjectRequest, body: Vec<u8>) -> RequestBuilder {
    let url = format!("{}/b/{}/o", base_url, req.bucket.escape());
    let content_type = req.content_type.as_deref().unwrap_or("application/octet-stream");
    client
        .post(url)
        .query(&[("uploadType", "media")])
        .query(req)
        .header(reqwest::header::CONTENT_TYPE, content_type)
        .body(body)
}
