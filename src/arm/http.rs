//! HTTP transport for the resource-management REST API

use super::auth::Credentials;
use super::transport::{Invocation, Operation, Page, PageCursor, PageRequest, Transport};
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

/// Public cloud management endpoint
pub const DEFAULT_ENDPOINT: &str = "https://management.azure.com";

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Sanitize response body for logging
/// Truncates long responses and strips control characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let mut end = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... [truncated, {} bytes total]", &body[..end], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// Error envelope returned by the API
#[derive(Deserialize, Default)]
struct ErrorEnvelope {
    #[serde(default)]
    error: ErrorBody,
}

#[derive(Deserialize, Default)]
struct ErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

/// Listing response shape
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    value: Vec<Value>,
    #[serde(default)]
    next_link: Option<String>,
}

/// Map a failed response onto the error taxonomy
fn classify(status: StatusCode, body: &str, kind: &str, name: &str) -> Error {
    let ErrorBody { code, message } = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error)
        .unwrap_or_default();

    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            Error::ValidationRejected { code, message }
        }
        StatusCode::NOT_FOUND => Error::not_found(kind, name),
        StatusCode::CONFLICT | StatusCode::PRECONDITION_FAILED => Error::Conflict { code, message },
        _ => Error::Transport {
            status: Some(status.as_u16()),
            message: if code.is_empty() {
                status.to_string()
            } else {
                code
            },
        },
    }
}

/// Transport speaking the REST API over HTTPS
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    endpoint: Url,
    credentials: Credentials,
}

impl HttpTransport {
    pub fn new(endpoint: &str, credentials: Credentials) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("armnet/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let endpoint = Url::parse(endpoint)
            .map_err(|e| Error::Transport {
                status: None,
                message: format!("Invalid endpoint {endpoint}: {e}"),
            })?;

        Ok(Self {
            client,
            endpoint,
            credentials,
        })
    }

    fn url_for(&self, path: &str, api_version: &str) -> Result<Url> {
        let mut url = self.endpoint.join(path).map_err(|e| Error::Transport {
            status: None,
            message: format!("Invalid request path: {e}"),
        })?;
        url.query_pairs_mut().append_pair("api-version", api_version);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url, body: Option<&Value>, token: &str) -> RequestBuilder {
        let request = self
            .client
            .request(method, url)
            .bearer_auth(token)
            .header("x-ms-client-request-id", uuid::Uuid::new_v4().to_string());

        match body {
            Some(body) => request.json(body),
            None => request,
        }
    }

    /// Send a request and return the body of a successful response
    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<&Value>,
        kind: &str,
        name: &str,
    ) -> Result<Option<Value>> {
        tracing::debug!("{} {}", method, url);

        let token = self.credentials.get_token().await?;
        let mut response = self.request(method.clone(), url.clone(), body, &token).send().await?;

        // A token revoked before its expiry gets one retry with a fresh token
        if response.status() == StatusCode::UNAUTHORIZED {
            tracing::debug!("Token rejected, refreshing and retrying {} {}", method, url);
            let token = self.credentials.refresh_token().await?;
            response = self.request(method, url, body, &token).send().await?;
        }

        let status = response.status();
        let response_body = response.text().await?;

        if !status.is_success() {
            // Security: Only log sanitized/truncated error body to avoid leaking sensitive data
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&response_body));
            return Err(classify(status, &response_body, kind, name));
        }

        if response_body.is_empty() {
            return Ok(None);
        }

        Ok(Some(serde_json::from_str(&response_body)?))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn invoke(&self, invocation: Invocation) -> Result<Option<Value>> {
        let id = &invocation.resource_id;
        let (method, path) = match invocation.operation {
            Operation::Get => (Method::GET, id.encoded_path()),
            Operation::CreateOrUpdate => (Method::PUT, id.encoded_path()),
            Operation::Delete => (Method::DELETE, id.encoded_path()),
            Operation::Action(action) => (Method::POST, format!("{}/{}", id.encoded_path(), action)),
        };
        let url = self.url_for(&path, invocation.api_version)?;

        self.send(
            method,
            url,
            invocation.payload.as_ref(),
            invocation.resource_type,
            id.name(),
        )
        .await
    }

    async fn page(&self, request: PageRequest) -> Result<Page> {
        let url = match &request.cursor {
            PageCursor::First(path) => self.url_for(path, request.api_version)?,
            // Continuation links already carry the api-version
            PageCursor::Next(link) => Url::parse(link).map_err(|e| Error::Transport {
                status: None,
                message: format!("Invalid continuation link: {e}"),
            })?,
        };

        let body = self
            .send(Method::GET, url, None, request.resource_type, "")
            .await?
            .unwrap_or(Value::Null);
        if body.is_null() {
            return Ok(Page::default());
        }

        let list: ListResponse = serde_json::from_value(body)?;
        Ok(Page {
            items: list.value,
            next_link: list.next_link.filter(|l| !l.is_empty()),
        })
    }
}
