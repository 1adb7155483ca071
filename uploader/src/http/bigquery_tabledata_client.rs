use std::sync::Arc;

use serde::Serialize;

use crate::http::bigquery_client::BigqueryClient;
use crate::http::error::Error;
use crate::http::tabledata;
use crate::http::tabledata::insert_all::{InsertAllRequest, InsertAllResponse};

#[derive(Debug, Clone)]
pub struct BigqueryTabledataClient {
    inner: Arc<BigqueryClient>,
}

impl BigqueryTabledataClient {
    pub fn new(inner: Arc<BigqueryClient>) -> Self {
        Self { inner }
    }

    /// https://cloud.google.com/bigquery/docs/reference/rest/v2/tabledata/insertAll
    #[cfg_attr(feature = "trace", tracing::instrument(skip_all))]
    pub async fn insert<T: Serialize>(
        &self,
        project_id: &str,
        dataset_id: &str,
        table_id: &str,
        req: &InsertAllRequest<T>,
    ) -> Result<InsertAllResponse, Error> {
        let builder = tabledata::insert_all::build(
            self.inner.endpoint(),
            self.inner.http(),
            project_id,
            dataset_id,
            table_id,
            req,
        );
        self.inner.send(builder).await
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::http::bigquery_client::test::create_client;
    use crate::http::bigquery_tabledata_client::BigqueryTabledataClient;
    use crate::http::tabledata::insert_all::InsertAllRequest;

    #[derive(serde::Serialize)]
    struct Campaign {
        campaign_name: String,
        campaign_id: i64,
    }

    #[tokio::test]
    async fn insert_reports_row_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bigquery/v2/projects/p1/datasets/d1/tables/t1/insertAll"))
            .and(body_json(serde_json::json!({
                "rows": [
                    {"json": {"campaign_name": "a", "campaign_id": 1}},
                    {"json": {"campaign_name": "b", "campaign_id": 2}}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "kind": "bigquery#tableDataInsertAllResponse",
                "insertErrors": [{"index": 1, "errors": [{"reason": "invalid", "message": "no such field"}]}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = BigqueryTabledataClient::new(Arc::new(create_client(&server)));
        let req = InsertAllRequest::from_records(vec![
            Campaign {
                campaign_name: "a".to_string(),
                campaign_id: 1,
            },
            Campaign {
                campaign_name: "b".to_string(),
                campaign_id: 2,
            },
        ]);
        let response = client.insert("p1", "d1", "t1", &req).await.unwrap();
        let errors = response.insert_errors.unwrap();
        assert_eq!(1, errors.len());
        assert_eq!(1, errors[0].index);
        assert_eq!("invalid", errors[0].errors[0].reason);
    }
}
