use std::fmt;

use crate::http::job::ErrorProto;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// An error returned from the BigQuery or Cloud Storage service.
    #[error(transparent)]
    Response(#[from] ErrorResponse),

    /// An error from the HTTP client.
    #[error(transparent)]
    HttpClient(#[from] reqwest::Error),

    /// An error from one of the middleware used.
    #[error(transparent)]
    HttpMiddleware(anyhow::Error),

    /// The request body could not be encoded.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// An error from a token source.
    #[error("token source failed: {0}")]
    TokenSource(Box<dyn std::error::Error + Send + Sync>),

    /// The job reached the DONE state with an error result.
    #[error("job {job_id} failed: {error}")]
    JobFailed { job_id: String, error: ErrorProto },
}

impl From<reqwest_middleware::Error> for Error {
    fn from(error: reqwest_middleware::Error) -> Self {
        match error {
            reqwest_middleware::Error::Middleware(err) => Error::HttpMiddleware(err),
            reqwest_middleware::Error::Reqwest(err) => Error::HttpClient(err),
        }
    }
}

impl Error {
    /// The HTTP status returned by the service, if the error came from a response.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Response(e) => Some(e.code),
            Error::HttpClient(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(404)
    }

    pub fn is_conflict(&self) -> bool {
        self.status_code() == Some(409)
    }

    pub fn is_bad_request(&self) -> bool {
        self.status_code() == Some(400)
    }
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// An HTTP status value, without the textual description.
    ///
    /// Example values include: `400` (Bad Request), `401` (Unauthorized), and `404` (Not Found).
    pub code: u16,

    /// Description of the error. Same as `errors.message`.
    pub message: String,
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.message.fmt(f)
    }
}

impl std::error::Error for ErrorResponse {}

#[derive(serde::Deserialize)]
pub(crate) struct ErrorWrapper {
    pub(crate) error: ErrorResponse,
}

#[cfg(test)]
mod test {
    use crate::http::error::{Error, ErrorResponse, ErrorWrapper};

    #[test]
    fn parse_error_body() {
        let body = r#"{"error":{"code":404,"message":"Not found: Table p:d.t","errors":[],"status":"NOT_FOUND"}}"#;
        let wrapper: ErrorWrapper = serde_json::from_str(body).unwrap();
        let error = Error::Response(wrapper.error);
        assert!(error.is_not_found());
        assert!(!error.is_conflict());
        assert_eq!("Not found: Table p:d.t", error.to_string());
    }

    #[test]
    fn status_of_non_response_error() {
        let error = Error::TokenSource("no token".into());
        assert_eq!(None, error.status_code());
        let error = Error::Response(ErrorResponse {
            code: 409,
            message: "Already Exists".to_string(),
        });
        assert!(error.is_conflict());
    }
}
