use std::sync::Arc;

use reqwest_middleware::{ClientWithMiddleware as Client, RequestBuilder};

use token_source::TokenSource;

use crate::http::bigquery_client::check_response_status;
use crate::http::error::Error;
use crate::http::objects;
use crate::http::objects::delete::DeleteObjectRequest;
use crate::http::objects::upload::UploadObjectRequest;
use crate::http::objects::Object;

pub const SCOPES: [&str; 2] = [
    "https://www.googleapis.com/auth/cloud-platform",
    "https://www.googleapis.com/auth/devstorage.full_control",
];

/// Cloud Storage JSON API client limited to the object calls the uploader needs.
#[derive(Debug, Clone)]
pub struct StorageClient {
    ts: Arc<dyn TokenSource>,
    endpoint: String,
    upload_endpoint: String,
    http: Client,
}

impl StorageClient {
    pub fn new(ts: Arc<dyn TokenSource>, endpoint: &str, http: Client) -> Self {
        Self {
            ts,
            endpoint: format!("{endpoint}/storage/v1"),
            upload_endpoint: format!("{endpoint}/upload/storage/v1"),
            http,
        }
    }

    /// Uploads the body as a single media request.
    #[cfg_attr(feature = "trace", tracing::instrument(skip_all))]
    pub async fn upload_object(&self, req: &UploadObjectRequest, body: Vec<u8>) -> Result<Object, Error> {
        let builder = objects::upload::build(self.upload_endpoint.as_str(), &self.http, req, body);
        self.send(builder).await
    }

    /// Deletes the object.
    #[cfg_attr(feature = "trace", tracing::instrument(skip_all))]
    pub async fn delete_object(&self, req: &DeleteObjectRequest) -> Result<(), Error> {
        let builder = objects::delete::build(self.endpoint.as_str(), &self.http, req);
        self.send_get_empty(builder).await
    }

    async fn with_headers(&self, builder: RequestBuilder) -> Result<RequestBuilder, Error> {
        let token = self.ts.token().await.map_err(Error::TokenSource)?;
        Ok(builder
            .header("X-Goog-Api-Client", "rust")
            .header(reqwest::header::USER_AGENT, "gcloud-bq-uploader")
            .header(reqwest::header::AUTHORIZATION, token))
    }

    async fn send<T: serde::de::DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, Error> {
        let builder = self.with_headers(builder).await?;
        let response = builder.send().await?;
        let response = check_response_status(response).await?;
        Ok(response.json().await?)
    }

    async fn send_get_empty(&self, builder: RequestBuilder) -> Result<(), Error> {
        let builder = self.with_headers(builder).await?;
        let response = builder.send().await?;
        check_response_status(response).await?;
        Ok(())
    }
}
