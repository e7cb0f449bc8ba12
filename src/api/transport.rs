use crate::error::{Error, Result};
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        })
    }
}

/// A request relative to the API base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub path: String,
    pub bearer: Option<String>,
    pub body: Option<serde_json::Value>,
}

/// Status and raw body. Non-2xx statuses are responses, not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Moves one request over the wire.
///
/// Implementations return `Err(Error::Network)` only when no response was
/// received; any HTTP status, including 4xx/5xx, comes back as `Ok`.
pub trait Transport {
    fn send(&mut self, request: &HttpRequest) -> Result<HttpResponse>;
}

/// Blocking HTTP transport backed by a `ureq` agent.
pub struct UreqTransport {
    agent: ureq::Agent,
    base_url: String,
}

impl UreqTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();

        UreqTransport {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn with_headers<B>(
    builder: ureq::RequestBuilder<B>,
    request: &HttpRequest,
) -> ureq::RequestBuilder<B> {
    let builder = builder
        .header("Content-Type", "application/json")
        .header("Accept", "application/json");
    match &request.bearer {
        Some(token) => builder.header("Authorization", format!("Bearer {}", token)),
        None => builder,
    }
}

impl Transport for UreqTransport {
    fn send(&mut self, request: &HttpRequest) -> Result<HttpResponse> {
        let url = self.url(&request.path);
        let body = request
            .body
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| Error::Decode(format!("Failed to encode request body: {}", e)))?;

        let sent = match request.method {
            Method::Get => with_headers(self.agent.get(&url), request).call(),
            Method::Delete => with_headers(self.agent.delete(&url), request).call(),
            Method::Post | Method::Put => {
                let builder = if request.method == Method::Post {
                    self.agent.post(&url)
                } else {
                    self.agent.put(&url)
                };
                let builder = with_headers(builder, request);
                match &body {
                    Some(json) => builder.send(json),
                    None => builder.send_empty(),
                }
            }
        };

        let mut response = sent.map_err(|e| {
            tracing::debug!(error = %e, %url, "transport failure");
            Error::Network(e.to_string())
        })?;

        let status = response.status().as_u16();
        let text = response
            .body_mut()
            .read_to_string()
            .map_err(|e| Error::Network(format!("Failed to read response body: {}", e)))?;

        Ok(HttpResponse { status, body: text })
    }
}

#[cfg(any(test, feature = "test-util"))]
pub mod scripted {
    //! Transport double that replays canned responses and records requests.
    //!
    //! Clones share one script, so a test keeps a handle after moving a clone
    //! into an `ApiClient`.

    use super::*;
    use serde_json::{json, Value};
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    pub struct ScriptedTransport {
        responses: Rc<RefCell<VecDeque<Result<HttpResponse>>>>,
        requests: Rc<RefCell<Vec<HttpRequest>>>,
    }

    impl ScriptedTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn respond(&self, status: u16, body: Value) -> &Self {
            self.responses.borrow_mut().push_back(Ok(HttpResponse {
                status,
                body: body.to_string(),
            }));
            self
        }

        /// `200` with a successful envelope around `data`.
        pub fn ok(&self, data: Value) -> &Self {
            self.respond(200, json!({"status": true, "data": data, "message": "ok"}))
        }

        pub fn fail_network(&self) -> &Self {
            self.responses
                .borrow_mut()
                .push_back(Err(Error::Network("connection refused".to_string())));
            self
        }

        pub fn sent(&self) -> Vec<HttpRequest> {
            self.requests.borrow().clone()
        }

        pub fn sent_paths(&self) -> Vec<String> {
            self.sent().into_iter().map(|r| r.path).collect()
        }
    }

    impl Transport for ScriptedTransport {
        fn send(&mut self, request: &HttpRequest) -> Result<HttpResponse> {
            self.requests.borrow_mut().push(request.clone());
            self.responses
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err(Error::Network("no scripted response".to_string())))
        }
    }
}
