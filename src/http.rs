use std::thread;
use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use tracing::debug;

use crate::config::Settings;
use crate::error::PangaeaError;

/// Per-call request options merged over the client defaults.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub headers: Vec<(String, String)>,
    pub timeout: Option<Duration>,
    pub basic_auth: Option<(String, Option<String>)>,
    pub bearer_token: Option<String>,
}

impl RequestOptions {
    /// Parses `Name: value` pairs as given on the command line.
    pub fn with_header_line(mut self, line: &str) -> Result<Self, PangaeaError> {
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| PangaeaError::InvalidHeader(line.to_string()))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(PangaeaError::InvalidHeader(line.to_string()));
        }
        self.headers
            .push((name.to_string(), value.trim().to_string()));
        Ok(self)
    }

    fn apply(&self, mut request: RequestBuilder) -> Result<RequestBuilder, PangaeaError> {
        if !self.headers.is_empty() {
            let mut headers = HeaderMap::new();
            for (name, value) in &self.headers {
                let name = HeaderName::from_bytes(name.as_bytes())
                    .map_err(|err| PangaeaError::InvalidHeader(format!("{name}: {err}")))?;
                let value = HeaderValue::from_str(value)
                    .map_err(|err| PangaeaError::InvalidHeader(format!("{name}: {err}")))?;
                headers.insert(name, value);
            }
            request = request.headers(headers);
        }
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }
        if let Some((user, password)) = &self.basic_auth {
            request = request.basic_auth(user, password.as_ref());
        }
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }
        Ok(request)
    }
}

/// A fully buffered response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Fails with [`PangaeaError::HttpStatus`] unless the status is 2xx.
    pub fn error_for_status(self) -> Result<Self, PangaeaError> {
        if self.is_success() {
            return Ok(self);
        }
        Err(PangaeaError::HttpStatus {
            status: self.status,
            url: self.url,
        })
    }

    /// Body as text; invalid UTF-8 sequences become U+FFFD.
    pub fn text(&self) -> String {
        match std::str::from_utf8(&self.body) {
            Ok(text) => text.to_string(),
            Err(err) => {
                debug!(url = %self.url, error = %err, "body is not valid UTF-8; replacing invalid bytes");
                String::from_utf8_lossy(&self.body).into_owned()
            }
        }
    }
}

pub trait RepositoryClient: Send + Sync {
    fn get(&self, url: &str, options: &RequestOptions) -> Result<HttpResponse, PangaeaError>;
}

#[derive(Clone)]
pub struct PangaeaHttpClient {
    client: Client,
}

impl PangaeaHttpClient {
    pub fn new(settings: &Settings) -> Result<Self, PangaeaError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&settings.user_agent)
                .map_err(|err| PangaeaError::InvalidHeader(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(settings.timeout)
            .build()
            .map_err(|err| PangaeaError::Http(err.to_string()))?;
        Ok(Self { client })
    }

    fn send_with_retries<F>(
        &self,
        mut make_req: F,
    ) -> Result<reqwest::blocking::Response, PangaeaError>
    where
        F: FnMut() -> Result<RequestBuilder, PangaeaError>,
    {
        const MAX_RETRIES: usize = 3;
        const BASE_DELAY_MS: u64 = 200;
        let mut attempt = 0usize;
        loop {
            let response = make_req()?.send();
            match response {
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    if attempt < MAX_RETRIES && is_retryable_status(status) {
                        let delay = BASE_DELAY_MS * (attempt as u64 + 1);
                        debug!(status, attempt, "retrying after transient status");
                        thread::sleep(Duration::from_millis(delay));
                        attempt += 1;
                        continue;
                    }
                    return Ok(resp);
                }
                Err(err) => {
                    if attempt < MAX_RETRIES && is_retryable_error(&err) {
                        let delay = BASE_DELAY_MS * (attempt as u64 + 1);
                        debug!(error = %err, attempt, "retrying after transport error");
                        thread::sleep(Duration::from_millis(delay));
                        attempt += 1;
                        continue;
                    }
                    return Err(PangaeaError::Http(err.to_string()));
                }
            }
        }
    }
}

impl RepositoryClient for PangaeaHttpClient {
    fn get(&self, url: &str, options: &RequestOptions) -> Result<HttpResponse, PangaeaError> {
        debug!(%url, "GET");
        let response = self.send_with_retries(|| options.apply(self.client.get(url)))?;
        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());
        let body = response
            .bytes()
            .map_err(|err| PangaeaError::Http(err.to_string()))?
            .to_vec();
        Ok(HttpResponse {
            url: final_url,
            status,
            content_type,
            body,
        })
    }
}

fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect()
}
