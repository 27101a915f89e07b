//! HTTP result source

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::{DataSource, FetchError};
use crate::series::{decode_payload, Series};

/// Fetches the result document with a GET request
pub struct HttpSource {
    client: Client,
    url: String,
}

impl HttpSource {
    /// Create a source for the given URL with a per-request timeout
    pub fn new(url: impl Into<String>, request_timeout_ms: u64) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(request_timeout_ms))
            .build()?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl DataSource for HttpSource {
    fn describe(&self) -> String {
        self.url.clone()
    }

    async fn fetch(&self) -> Result<Series, FetchError> {
        let response = self
            .client
            .get(&self.url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout
                } else {
                    FetchError::Request(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout
            } else {
                FetchError::Request(e)
            }
        })?;

        Ok(decode_payload(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::AnimalCount;
    use crate::source::FailureKind;
    use httpmock::prelude::*;

    #[tokio::test]
    async fn test_fetch_success() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/result.json");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({
                    "res": [
                        {"year": 2020, "num_herbs": 10, "num_carns": 2},
                        {"year": 2021, "num_herbs": 12, "num_carns": 3}
                    ]
                }));
        });

        let source = HttpSource::new(server.url("/result.json"), 2000).unwrap();
        let series = source.fetch().await.unwrap();

        mock.assert();
        assert_eq!(
            series.samples(),
            &[AnimalCount::new(2020, 10, 2), AnimalCount::new(2021, 12, 3)]
        );
    }

    #[tokio::test]
    async fn test_fetch_non_success_status() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/result.json");
            then.status(404);
        });

        let source = HttpSource::new(server.url("/result.json"), 2000).unwrap();
        let err = source.fetch().await.unwrap_err();

        assert!(matches!(err, FetchError::Status { status: 404 }));
        assert_eq!(err.kind(), FailureKind::Status);
    }

    #[tokio::test]
    async fn test_fetch_malformed_body() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/result.json");
            then.status(200).body("{\"res\": [ {\"year\": ");
        });

        let source = HttpSource::new(server.url("/result.json"), 2000).unwrap();
        let err = source.fetch().await.unwrap_err();

        assert_eq!(err.kind(), FailureKind::Malformed);
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        // Port 9 (discard) is not expected to be listening on test hosts
        let source = HttpSource::new("http://127.0.0.1:9/result.json", 2000).unwrap();
        let err = source.fetch().await.unwrap_err();

        assert_eq!(err.kind(), FailureKind::Transport);
    }
}
