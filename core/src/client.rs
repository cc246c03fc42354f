//! The request client seam and the bundled ureq-backed client.
//!
//! # Design
//! The adapter only knows `RequestClient`: one async entry point taking a
//! `Method`, plus `supports` so a client can decline verbs it cannot perform.
//! `HttpClient` implements it over `ureq`. Every call is split so the I/O
//! sits between two pure steps:
//! `build_request` produces an `HttpRequest`, `execute` performs the blocking
//! round-trip on tokio's blocking pool, and `parse_response` classifies the
//! `HttpResponse`.

use std::future::Future;

use serde_json::{Map, Value};

use crate::config::ClientConfig;
use crate::error::{ClientError, ConfigError, NETWORK_CODE};
use crate::http::{HttpRequest, HttpResponse, Method};

/// Code for a payload the client cannot encode for the chosen verb.
pub const INVALID_PARAMS_CODE: &str = "INVALID_PARAMS";

/// An HTTP client the adapter can drive.
pub trait RequestClient: Send + Sync {
    /// Whether this client can perform `method`. The adapter never calls
    /// `request` for a method that returns false.
    fn supports(&self, _method: Method) -> bool {
        true
    }

    fn request(
        &self,
        method: Method,
        url: &str,
        params: Option<&Value>,
    ) -> impl Future<Output = Result<Value, ClientError>> + Send;
}

/// `RequestClient` over a `ureq` agent.
///
/// # Panics
/// The future returned by `request` runs the round-trip with
/// `tokio::task::spawn_blocking` and panics if polled outside a Tokio
/// runtime.
pub struct HttpClient {
    config: ClientConfig,
    base_url: String,
    agent: ureq::Agent,
}

impl HttpClient {
    pub fn new(config: ClientConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let base_url = config.base_url.trim().trim_end_matches('/').to_string();
        // Status codes are classified by `parse_response`, not by ureq.
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Ok(Self {
            config,
            base_url,
            agent,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn build_request(
        &self,
        method: Method,
        path: &str,
        params: Option<&Value>,
    ) -> Result<HttpRequest, ClientError> {
        let mut headers: Vec<(String, String)> = self
            .config
            .headers
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        let mut query = Vec::new();
        let mut body = None;
        match params {
            None | Some(Value::Null) => {}
            Some(payload) if method.sends_body() => {
                let encoded = serde_json::to_string(payload).map_err(|e| {
                    ClientError::new(format!("body could not be encoded: {e}"))
                        .with_code(INVALID_PARAMS_CODE)
                })?;
                headers.push(("content-type".to_string(), "application/json".to_string()));
                body = Some(encoded);
            }
            Some(Value::Object(fields)) => query = query_pairs(fields),
            Some(_) => {
                return Err(ClientError::new(format!(
                    "{method} parameters must be a JSON object"
                ))
                .with_code(INVALID_PARAMS_CODE));
            }
        }

        Ok(HttpRequest {
            method,
            url: self.resolve(path),
            query,
            headers,
            body,
        })
    }

    /// Turn a response into a payload or a `ClientError`.
    ///
    /// Failure bodies shaped `{"message", "code"?, "params"?}` are taken as
    /// the error; anything else becomes `HTTP <status>` with the status in
    /// `params`.
    pub fn parse_response(&self, response: HttpResponse) -> Result<Value, ClientError> {
        if response.is_success() {
            if response.body.trim().is_empty() {
                return Ok(Value::Null);
            }
            return Ok(serde_json::from_str(&response.body).unwrap_or(Value::String(response.body)));
        }

        if let Ok(err) = serde_json::from_str::<ClientError>(&response.body) {
            return Err(err);
        }
        let mut params = Map::new();
        params.insert("status".to_string(), Value::from(response.status));
        Err(ClientError::new(format!("HTTP {}", response.status)).with_params(params))
    }

    fn resolve(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            self.base_url.clone()
        } else {
            format!("{}/{path}", self.base_url)
        }
    }

    fn log_request(&self, request: &HttpRequest) {
        if self.config.debug {
            tracing::info!(target: "req_state::http", method = %request.method, url = %request.url, "request");
        } else {
            tracing::trace!(target: "req_state::http", method = %request.method, url = %request.url, "request");
        }
    }

    fn log_response(&self, method: Method, url: &str, response: &HttpResponse) {
        if self.config.debug {
            tracing::info!(target: "req_state::http", %method, url, status = response.status, "response");
        } else {
            tracing::trace!(target: "req_state::http", %method, url, status = response.status, "response");
        }
    }
}

impl RequestClient for HttpClient {
    async fn request(
        &self,
        method: Method,
        url: &str,
        params: Option<&Value>,
    ) -> Result<Value, ClientError> {
        let request = self.build_request(method, url, params)?;
        self.log_request(&request);
        let resolved = request.url.clone();

        let agent = self.agent.clone();
        let response = tokio::task::spawn_blocking(move || execute(&agent, request))
            .await
            .map_err(|e| {
                ClientError::new(format!("request task failed: {e}")).with_code(NETWORK_CODE)
            })?
            .map_err(|e| ClientError::new(e.to_string()).with_code(NETWORK_CODE))?;

        self.log_response(method, &resolved, &response);
        self.parse_response(response)
    }
}

fn query_pairs(fields: &Map<String, Value>) -> Vec<(String, String)> {
    fields
        .iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(name, value)| {
            let rendered = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (name.clone(), rendered)
        })
        .collect()
}

/// Blocking round-trip for a built request.
fn execute(agent: &ureq::Agent, request: HttpRequest) -> Result<HttpResponse, ureq::Error> {
    let HttpRequest {
        method,
        url,
        query,
        headers,
        body,
    } = request;

    let mut response = match method {
        Method::Get => with_parts(agent.get(&url), &query, &headers).call(),
        Method::Delete => with_parts(agent.delete(&url), &query, &headers).call(),
        Method::Post => {
            let builder = with_parts(agent.post(&url), &query, &headers);
            match body {
                Some(body) => builder.send(body.as_bytes()),
                None => builder.send_empty(),
            }
        }
        Method::Put => {
            let builder = with_parts(agent.put(&url), &query, &headers);
            match body {
                Some(body) => builder.send(body.as_bytes()),
                None => builder.send_empty(),
            }
        }
    }?;

    let status = response.status().as_u16();
    let body = response.body_mut().read_to_string()?;
    Ok(HttpResponse { status, body })
}

fn with_parts<B>(
    mut builder: ureq::RequestBuilder<B>,
    query: &[(String, String)],
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    for (name, value) in query {
        builder = builder.query(name, value);
    }
    for (name, value) in headers {
        builder = builder.header(name, value);
    }
    builder
}
