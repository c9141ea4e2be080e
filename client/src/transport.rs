use std::error::Error as _;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use cam_viewer_common::config::{ControlConfig, StreamConfig};
use futures_util::stream::{self, BoxStream, StreamExt};
use tracing::debug;

/// Response body of the streaming GET, chunked however the network delivers it.
pub type ByteStream = BoxStream<'static, Result<Bytes, TransportError>>;

/// HTTP access to the device: one long-lived stream plus one-shot commands.
#[async_trait]
pub trait DeviceTransport: Send + Sync {
    /// Open the MJPEG stream. Resolves once the response headers are in.
    async fn open_stream(&self, url: &str) -> Result<ByteStream, TransportError>;

    /// Issue a short-lived GET and report the response status code.
    async fn send_command(&self, url: &str) -> Result<u16, TransportError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("failed to build HTTP client: {0}")]
    Client(String),
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("stream error: {0}")]
    Stream(String),
    #[error("HTTP status {0}")]
    HttpStatus(u16),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

/// [`DeviceTransport`] backed by `reqwest`.
///
/// Streaming and command requests use separate clients so the command
/// timeouts never cut a long-lived stream short.
pub struct HttpTransport {
    stream_client: reqwest::Client,
    command_client: reqwest::Client,
    stream_read_timeout: Duration,
    command_timeout: Duration,
}

impl HttpTransport {
    pub fn new(stream: &StreamConfig, control: &ControlConfig) -> Result<Self, TransportError> {
        let stream_client = reqwest::Client::builder()
            .connect_timeout(stream.connect_timeout())
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;
        let command_client = reqwest::Client::builder()
            .connect_timeout(control.connect_timeout())
            .read_timeout(control.read_timeout())
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;

        Ok(Self {
            stream_client,
            command_client,
            stream_read_timeout: stream.read_timeout(),
            command_timeout: control.read_timeout(),
        })
    }
}

#[async_trait]
impl DeviceTransport for HttpTransport {
    async fn open_stream(&self, url: &str) -> Result<ByteStream, TransportError> {
        let timeout = self.stream_read_timeout;
        let response = tokio::time::timeout(timeout, self.stream_client.get(url).send())
            .await
            .map_err(|_| TransportError::Timeout(timeout))?
            .map_err(|e| request_error(e, timeout))?;

        if !response.status().is_success() {
            return Err(TransportError::HttpStatus(response.status().as_u16()));
        }

        debug!(url, status = %response.status(), "stream response headers received");

        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| TransportError::Stream(describe(&e))))
            .boxed();
        Ok(with_idle_timeout(body, timeout))
    }

    async fn send_command(&self, url: &str) -> Result<u16, TransportError> {
        let response = self
            .command_client
            .get(url)
            .send()
            .await
            .map_err(|e| request_error(e, self.command_timeout))?;
        Ok(response.status().as_u16())
    }
}

/// Fail the stream if no chunk arrives within `idle`. The stream ends after
/// yielding the timeout error.
pub fn with_idle_timeout(inner: ByteStream, idle: Duration) -> ByteStream {
    stream::unfold(Some(inner), move |state| async move {
        let mut inner = state?;
        match tokio::time::timeout(idle, inner.next()).await {
            Ok(Some(item)) => Some((item, Some(inner))),
            Ok(None) => None,
            Err(_) => Some((Err(TransportError::Timeout(idle)), None)),
        }
    })
    .boxed()
}

fn request_error(e: reqwest::Error, timeout: Duration) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout(timeout)
    } else {
        TransportError::Connect(describe(&e))
    }
}

// reqwest's Display stops at the outermost layer; the cause is usually deeper.
fn describe(e: &reqwest::Error) -> String {
    let mut message = e.to_string();
    let mut source = e.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
