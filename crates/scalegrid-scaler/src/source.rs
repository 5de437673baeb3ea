//! Trigger metric sources.
//!
//! Each trigger names a metric and a source for its value. Resolving a
//! metric query performs exactly one `fetch` round trip per matching
//! trigger; there is no background polling or caching here.

use std::time::Duration;

use async_trait::async_trait;
use http_body_util::BodyExt;
use tracing::debug;

use crate::error::{ScalerError, ScalerResult};
use crate::types::TriggerSource;

/// Timeout applied to HTTP sources that do not configure one.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(2);

/// One metric source behind a trigger.
#[async_trait]
pub trait MetricSource: Send + Sync {
    /// Fetch the current metric value. One bounded round trip;
    /// implementations must not retry or poll.
    async fn fetch(&self) -> ScalerResult<f64>;
}

/// Build the source for a trigger. Fails on unusable configuration
/// such as an unparseable timeout.
pub fn build_source(source: &TriggerSource) -> ScalerResult<Box<dyn MetricSource>> {
    match source {
        TriggerSource::Static { value } => Ok(Box::new(StaticSource::new(*value))),
        TriggerSource::Http { endpoint, value_path, timeout } => {
            let timeout = match timeout {
                Some(text) => parse_duration(text).ok_or_else(|| {
                    ScalerError::InvalidTrigger(format!("unparseable timeout {text:?}"))
                })?,
                None => DEFAULT_HTTP_TIMEOUT,
            };
            Ok(Box::new(HttpSource::new(endpoint.clone(), value_path.clone(), timeout)))
        }
    }
}

// ── Static source ──────────────────────────────────────────────────

/// A source that always reports a fixed value.
pub struct StaticSource {
    value: f64,
}

impl StaticSource {
    pub fn new(value: f64) -> Self {
        Self { value }
    }
}

#[async_trait]
impl MetricSource for StaticSource {
    async fn fetch(&self) -> ScalerResult<f64> {
        Ok(self.value)
    }
}

// ── HTTP source ────────────────────────────────────────────────────

/// A source that GETs an HTTP endpoint and reads a number out of the
/// response body: either the whole body as a bare number, or the value
/// at a JSON pointer.
pub struct HttpSource {
    endpoint: String,
    value_path: Option<String>,
    timeout: Duration,
}

impl HttpSource {
    pub fn new(endpoint: impl Into<String>, value_path: Option<String>, timeout: Duration) -> Self {
        Self { endpoint: endpoint.into(), value_path, timeout }
    }

    async fn fetch_inner(&self) -> ScalerResult<f64> {
        let uri: http::Uri = self.endpoint.parse().map_err(|e| {
            ScalerError::InvalidTrigger(format!("bad endpoint {}: {e}", self.endpoint))
        })?;
        let authority = uri
            .authority()
            .ok_or_else(|| {
                ScalerError::InvalidTrigger(format!("endpoint {} has no host", self.endpoint))
            })?
            .clone();
        let address = format!("{}:{}", authority.host(), uri.port_u16().unwrap_or(80));

        let stream = tokio::net::TcpStream::connect(&address).await.map_err(|e| {
            debug!(error = %e, endpoint = %self.endpoint, "metric source connection failed");
            ScalerError::Connection(format!("{address}: {e}"))
        })?;
        let io = hyper_util::rt::TokioIo::new(stream);
        let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
            .await
            .map_err(|e| ScalerError::Connection(format!("handshake with {address}: {e}")))?;

        // Drive the connection in the background.
        tokio::spawn(async move {
            let _ = conn.await;
        });

        let path = uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| "/".to_string());
        let req = http::Request::builder()
            .method("GET")
            .uri(&path)
            .header("host", authority.as_str())
            .header("user-agent", "scalegrid-scaler/0.1")
            .body(http_body_util::Empty::<bytes::Bytes>::new())
            .unwrap();

        let resp = sender
            .send_request(req)
            .await
            .map_err(|e| ScalerError::Connection(format!("request to {}: {e}", self.endpoint)))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ScalerError::InvalidPayload(format!(
                "{} answered {status}",
                self.endpoint
            )));
        }
        let body = resp
            .into_body()
            .collect()
            .await
            .map_err(|e| {
                ScalerError::Connection(format!("reading body from {}: {e}", self.endpoint))
            })?
            .to_bytes();
        self.parse_value(&body)
    }

    fn parse_value(&self, body: &[u8]) -> ScalerResult<f64> {
        let Some(pointer) = &self.value_path else {
            let text = std::str::from_utf8(body).map_err(|_| {
                ScalerError::InvalidPayload(format!("{} returned a non-UTF-8 body", self.endpoint))
            })?;
            return text.trim().parse::<f64>().map_err(|_| {
                ScalerError::InvalidPayload(format!(
                    "{} returned a non-numeric body {:?}",
                    self.endpoint,
                    snippet(text)
                ))
            });
        };

        let json: serde_json::Value = serde_json::from_slice(body).map_err(|e| {
            ScalerError::InvalidPayload(format!("{} returned invalid JSON: {e}", self.endpoint))
        })?;
        let value = json.pointer(pointer).ok_or_else(|| {
            ScalerError::InvalidPayload(format!("{}: nothing at {pointer}", self.endpoint))
        })?;
        match value {
            serde_json::Value::Number(n) => n.as_f64().ok_or_else(|| {
                ScalerError::InvalidPayload(format!("{}: {pointer} is out of range", self.endpoint))
            }),
            serde_json::Value::String(s) => s.trim().parse::<f64>().map_err(|_| {
                ScalerError::InvalidPayload(format!(
                    "{}: {pointer} holds a non-numeric string {s:?}",
                    self.endpoint
                ))
            }),
            other => Err(ScalerError::InvalidPayload(format!(
                "{}: {pointer} holds {other}, expected a number",
                self.endpoint
            ))),
        }
    }
}

#[async_trait]
impl MetricSource for HttpSource {
    async fn fetch(&self) -> ScalerResult<f64> {
        match tokio::time::timeout(self.timeout, self.fetch_inner()).await {
            Ok(result) => result,
            Err(_) => Err(ScalerError::Timeout(self.timeout)),
        }
    }
}

fn snippet(text: &str) -> String {
    text.trim().chars().take(80).collect()
}

/// Parse durations like "5s", "500ms", "2m", or plain seconds.
pub(crate) fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(secs) = s.strip_suffix('s') {
        if let Some(ms) = secs.strip_suffix('m') {
            ms.parse::<u64>().ok().map(Duration::from_millis)
        } else {
            secs.parse::<u64>().ok().map(Duration::from_secs)
        }
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
    } else {
        s.parse::<u64>().ok().map(Duration::from_secs)
    }
}
