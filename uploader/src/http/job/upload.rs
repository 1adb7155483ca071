use bytes::{BufMut, Bytes, BytesMut};
use reqwest_middleware::{ClientWithMiddleware as Client, RequestBuilder};

use crate::http::job::Job;

const BOUNDARY: &str = "gcloud_bq_uploader_boundary";

/// Encodes the job metadata and the source bytes as a `multipart/related` body.
pub(crate) fn multipart_body(data: &Job, source: &[u8]) -> Result<Bytes, serde_json::Error> {
    let metadata = serde_json::to_vec(data)?;
    let mut body = BytesMut::with_capacity(metadata.len() + source.len() + 256);
    body.put_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.put_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
    body.put_slice(&metadata);
    body.put_slice(format!("\r\n--{BOUNDARY}\r\n").as_bytes());
    body.put_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.put_slice(source);
    body.put_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    Ok(body.freeze())
}

pub fn build(upload_url: &str, client: &Client, data: &Job, source: &[u8]) -> Result<RequestBuilder, serde_json::Error> {
    let url = format!("{}/projects/{}/jobs", upload_url, data.job_reference.project_id);
    let body = multipart_body(data, source)?;
    Ok(client
        .post(url)
        .query(&[("uploadType", "multipart")])
        .header(
            reqwest::header::CONTENT_TYPE,
            format!("multipart/related; boundary={BOUNDARY}"),
        )
        .body(body))
}

#[cfg(test)]
mod test {
    use crate::http::job::upload::multipart_body;
    use crate::http::job::{Job, JobReference};

    #[test]
    fn encode_metadata_then_source() {
        let job = Job {
            job_reference: JobReference {
                project_id: "p".to_string(),
                job_id: "j".to_string(),
                location: None,
            },
            ..Default::default()
        };
        let body = multipart_body(&job, b"a,b\n1,2\n").unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        let metadata = text.find("\"jobId\":\"j\"").unwrap();
        let source = text.find("a,b\n1,2\n").unwrap();
        assert!(metadata < source);
        assert!(text.starts_with("--gcloud_bq_uploader_boundary\r\n"));
        assert!(text.ends_with("\r\n--gcloud_bq_uploader_boundary--\r\n"));
    }
}
