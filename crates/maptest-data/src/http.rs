//! Reqwest-backed Dataverse API adapter.
//!
//! This adapter owns transport details only: endpoint construction, the API
//! key header, TLS policy and timeout, status checks, and JSON decoding. The
//! client is configured once and never changed per request.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::api::{CreatedDataset, DataverseApi, PublishResult};
use crate::error::PublishError;
use crate::payload::SerializedPayload;

const API_KEY_HEADER: &str = "X-Dataverse-key";
const CREATE: &str = "create";
const PUBLISH: &str = "publish";

/// Settings applied to the HTTP client at construction.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Base URL of the Dataverse installation.
    pub server_url: Url,
    /// API token sent with every request.
    pub api_token: String,
    /// Verify server TLS certificates; disable for self-signed test servers.
    pub verify_tls: bool,
    /// Timeout applied to each request.
    pub timeout: Duration,
}

/// Dataverse API client performing one HTTP POST per operation.
#[derive(Debug, Clone)]
pub struct HttpDataverseApi {
    client: Client,
    server_url: Url,
    api_token: String,
}

impl HttpDataverseApi {
    /// Builds the adapter and its underlying reqwest client.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::Transport`] when the client cannot be
    /// constructed.
    pub fn new(settings: ClientSettings) -> Result<Self, PublishError> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .danger_accept_invalid_certs(!settings.verify_tls)
            .build()
            .map_err(|err| PublishError::Transport {
                operation: "client setup",
                message: err.to_string(),
            })?;
        Ok(Self {
            client,
            server_url: settings.server_url,
            api_token: settings.api_token,
        })
    }

    /// Server URL extended with the given path segments.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, PublishError> {
        let mut url = self.server_url.clone();
        url.path_segments_mut()
            .map_err(|()| PublishError::InvalidEndpoint {
                server_url: self.server_url.to_string(),
                message: "URL cannot be a base".to_owned(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

#[async_trait]
impl DataverseApi for HttpDataverseApi {
    async fn create_dataset(
        &self,
        parent: &str,
        payload: &SerializedPayload,
    ) -> Result<CreatedDataset, PublishError> {
        let url = self.endpoint(&["api", "dataverses", parent, "datasets"])?;
        debug!(%url, "creating dataset");
        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, self.api_token.as_str())
            .header(CONTENT_TYPE, "application/json")
            .body(payload.as_str().to_owned())
            .send()
            .await
            .map_err(|err| transport_error(CREATE, &err))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| transport_error(CREATE, &err))?;
        if status != StatusCode::CREATED {
            return Err(remote_error(CREATE, status, body));
        }
        parse_created(&body)
    }

    async fn publish_dataset(&self, persistent_id: &str) -> Result<PublishResult, PublishError> {
        let url = self.endpoint(&["api", "datasets", ":persistentId", "actions", ":publish"])?;
        debug!(%url, persistent_id, "publishing dataset");
        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, self.api_token.as_str())
            .query(&[("persistentId", persistent_id), ("type", "major")])
            .send()
            .await
            .map_err(|err| transport_error(PUBLISH, &err))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| transport_error(PUBLISH, &err))?;
        if !status.is_success() {
            return Err(remote_error(PUBLISH, status, body));
        }
        parse_published(persistent_id, &body)
    }
}

#[derive(Debug, Deserialize)]
struct CreateResponseDto {
    data: CreatedDatasetDto,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedDatasetDto {
    id: u64,
    persistent_id: String,
}

fn parse_created(body: &str) -> Result<CreatedDataset, PublishError> {
    let decoded: CreateResponseDto =
        serde_json::from_str(body).map_err(|err| PublishError::Decode {
            operation: CREATE,
            message: err.to_string(),
        })?;
    Ok(CreatedDataset {
        id: decoded.data.id,
        persistent_id: decoded.data.persistent_id,
    })
}

fn parse_published(persistent_id: &str, body: &str) -> Result<PublishResult, PublishError> {
    let response: Value = serde_json::from_str(body).map_err(|err| PublishError::Decode {
        operation: PUBLISH,
        message: err.to_string(),
    })?;
    let status = response
        .get("status")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned();
    let id = response
        .get("data")
        .and_then(|data| data.get("id"))
        .and_then(Value::as_u64);
    Ok(PublishResult {
        id,
        persistent_id: persistent_id.to_owned(),
        status,
        response,
    })
}

fn remote_error(operation: &'static str, status: StatusCode, body: String) -> PublishError {
    PublishError::Remote {
        operation,
        status: status.as_u16(),
        body,
    }
}

fn transport_error(operation: &'static str, error: &reqwest::Error) -> PublishError {
    PublishError::Transport {
        operation,
        message: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    //! Adapter coverage against a one-shot local HTTP listener.

    use rstest::rstest;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    use super::*;

    fn api(server_url: &str) -> HttpDataverseApi {
        HttpDataverseApi::new(ClientSettings {
            server_url: Url::parse(server_url).expect("valid URL"),
            api_token: "secret-token".to_owned(),
            verify_tls: true,
            timeout: Duration::from_secs(5),
        })
        .expect("client builds")
    }

    fn payload() -> SerializedPayload {
        SerializedPayload::from_json_text(r#"{"datasetVersion":{}}"#)
    }

    /// Accepts one connection, records the raw request, and replies with
    /// `status_line` and `body`.
    async fn serve_once(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind listener");
        let address = listener.local_addr().expect("local address");
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept");
            let request = read_request(&mut socket).await;
            let response = format!(
                "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\n\
                 content-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.expect("write response");
            socket.shutdown().await.expect("shutdown");
            request
        });
        (format!("http://{address}"), handle)
    }

    async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
        let mut buffer = Vec::new();
        let mut chunk = [0_u8; 4096];
        loop {
            let read = socket.read(&mut chunk).await.expect("read request");
            if read == 0 {
                break;
            }
            buffer.extend_from_slice(chunk.get(..read).unwrap_or_default());
            let text = String::from_utf8_lossy(&buffer);
            if let Some(split) = text.find("\r\n\r\n") {
                let content_length = text
                    .get(..split)
                    .unwrap_or_default()
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if buffer.len() >= split + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buffer).into_owned()
    }

    #[rstest]
    #[case("https://dv.example.org", "https://dv.example.org/api/dataverses/root/datasets")]
    #[case("https://dv.example.org/", "https://dv.example.org/api/dataverses/root/datasets")]
    #[case("https://example.org/dv", "https://example.org/dv/api/dataverses/root/datasets")]
    fn endpoint_appends_segments(#[case] base: &str, #[case] expected: &str) {
        let url = api(base)
            .endpoint(&["api", "dataverses", "root", "datasets"])
            .expect("endpoint builds");
        assert_eq!(url.as_str(), expected);
    }

    #[test]
    fn endpoint_keeps_colon_prefixed_segments() {
        let url = api("https://dv.example.org")
            .endpoint(&["api", "datasets", ":persistentId", "actions", ":publish"])
            .expect("endpoint builds");
        assert_eq!(
            url.as_str(),
            "https://dv.example.org/api/datasets/:persistentId/actions/:publish"
        );
    }

    #[test]
    fn parses_created_dataset() {
        let created =
            parse_created(r#"{"status":"OK","data":{"id":42,"persistentId":"doi:10.5072/FK2/X1"}}"#)
                .expect("decodes");
        assert_eq!(
            created,
            CreatedDataset {
                id: 42,
                persistent_id: "doi:10.5072/FK2/X1".to_owned(),
            }
        );
    }

    #[test]
    fn rejects_created_response_without_persistent_id() {
        let err = parse_created(r#"{"status":"OK","data":{"id":42}}"#).expect_err("must fail");
        assert!(matches!(err, PublishError::Decode { operation: "create", .. }));
    }

    #[test]
    fn parses_publish_envelope() {
        let result = parse_published(
            "doi:10.5072/FK2/X1",
            r#"{"status":"OK","data":{"id":42,"protocol":"doi"}}"#,
        )
        .expect("decodes");
        assert_eq!(result.status, "OK");
        assert_eq!(result.id, Some(42));
        assert_eq!(result.persistent_id, "doi:10.5072/FK2/X1");
    }

    #[tokio::test]
    async fn create_posts_payload_with_api_key() {
        let (base, server) = serve_once(
            "201 Created",
            r#"{"status":"OK","data":{"id":7,"persistentId":"doi:10.5072/FK2/AB"}}"#,
        )
        .await;

        let created = api(&base)
            .create_dataset("root", &payload())
            .await
            .expect("create succeeds");
        let request = server.await.expect("server task");

        assert_eq!(created.id, 7);
        assert!(request.starts_with("POST /api/dataverses/root/datasets HTTP/1.1"));
        assert!(request.to_ascii_lowercase().contains("x-dataverse-key: secret-token"));
        assert!(request.contains("content-type: application/json"));
        assert!(request.ends_with(r#"{"datasetVersion":{}}"#));
    }

    #[tokio::test]
    async fn create_rejects_non_created_status_with_raw_body() {
        let (base, server) = serve_once("400 Bad Request", r#"{"message":"bad request"}"#).await;

        let err = api(&base)
            .create_dataset("root", &payload())
            .await
            .expect_err("create fails");
        server.await.expect("server task");

        assert_eq!(
            err,
            PublishError::Remote {
                operation: "create",
                status: 400,
                body: r#"{"message":"bad request"}"#.to_owned(),
            }
        );
    }

    #[tokio::test]
    async fn create_treats_plain_success_as_remote_error() {
        let (base, server) = serve_once("200 OK", r#"{"status":"OK"}"#).await;

        let err = api(&base)
            .create_dataset("root", &payload())
            .await
            .expect_err("only 201 is accepted");
        server.await.expect("server task");

        assert!(matches!(err, PublishError::Remote { status: 200, .. }));
    }

    #[tokio::test]
    async fn publish_requests_major_version() {
        let (base, server) = serve_once("200 OK", r#"{"status":"OK","data":{"id":7}}"#).await;

        let result = api(&base)
            .publish_dataset("doi:10.5072/FK2/AB")
            .await
            .expect("publish succeeds");
        let request = server.await.expect("server task");

        assert_eq!(result.id, Some(7));
        let request_line = request.lines().next().expect("request line");
        assert!(request_line.starts_with("POST /api/datasets/:persistentId/actions/:publish?"));
        assert!(request_line.contains("persistentId=doi%3A10.5072%2FFK2%2FAB"));
        assert!(request_line.contains("type=major"));
    }

    #[tokio::test]
    async fn publish_fails_on_server_error() {
        let (base, server) = serve_once("500 Internal Server Error", "boom").await;

        let err = api(&base)
            .publish_dataset("doi:10.5072/FK2/AB")
            .await
            .expect_err("publish fails");
        server.await.expect("server task");

        assert_eq!(err.remote_body(), Some("boom"));
    }
}
