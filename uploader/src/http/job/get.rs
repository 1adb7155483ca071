use reqwest_middleware::{ClientWithMiddleware as Client, RequestBuilder};

#[derive(Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct GetJobRequest {
    /// The geographic location of the job. Required when the job does not
    /// run in the US or EU multi-regional location.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

pub fn build(base_url: &str, client: &Client, project_id: &str, job_id: &str, data: &GetJobRequest) -> RequestBuilder {
    let url = format!("{base_url}/projects/{project_id}/jobs/{job_id}");
    client.get(url).query(data)
}
