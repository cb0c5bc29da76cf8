// src/core/http.rs

//! A thin outbound HTTP helper: send a request, get the response body back.

use crate::core::errors::StoreError;
use bytes::Bytes;
use lazy_static::lazy_static;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method};
use std::collections::HashMap;
use tracing::debug;

const CONTENT_TYPE_JSON: &str = "application/json";

lazy_static! {
    static ref SHARED_CLIENT: Client = Client::new();
}

/// Sends requests through a reusable `reqwest::Client`.
#[derive(Debug, Clone, Default)]
pub struct RequestSender {
    client: Client,
}

impl RequestSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Sends `body` to `url` with the given method and headers and returns the
    /// raw response body, whatever the status code. `Content-Type` defaults to
    /// JSON when the caller does not set it.
    pub async fn send(
        &self,
        method: &str,
        url: &str,
        body: impl Into<Bytes>,
        headers: &HashMap<String, String>,
    ) -> Result<Bytes, StoreError> {
        let method = Method::from_bytes(method.as_bytes())
            .map_err(|_| StoreError::InvalidRequest(format!("invalid HTTP method '{method}'")))?;
        let headers = build_headers(headers)?;

        debug!("Sending {} request to {}.", method, url);
        let response = self
            .client
            .request(method, url)
            .headers(headers)
            .body(body.into())
            .send()
            .await?;

        Ok(response.bytes().await?)
    }
}

fn build_headers(headers: &HashMap<String, String>) -> Result<HeaderMap, StoreError> {
    let mut map = HeaderMap::with_capacity(headers.len() + 1);
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| StoreError::InvalidRequest(format!("invalid header name '{name}'")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| StoreError::InvalidRequest(format!("invalid value for header '{name}'")))?;
        map.insert(name, value);
    }
    if !map.contains_key(CONTENT_TYPE) {
        map.insert(CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE_JSON));
    }
    Ok(map)
}

/// Sends a request with a process-wide shared client. See `RequestSender::send`.
pub async fn send_request(
    method: &str,
    url: &str,
    body: impl Into<Bytes>,
    headers: &HashMap<String, String>,
) -> Result<Bytes, StoreError> {
    RequestSender::with_client(SHARED_CLIENT.clone())
        .send(method, url, body, headers)
        .await
}
