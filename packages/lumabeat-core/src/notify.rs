//! Text messages on the display device.
//!
//! The display firmware exposes `POST /message` taking a form-encoded body
//! with the text and how long to show it. [`DeviceNotifier`] is the real
//! implementation; services depend on the [`MessageSink`] trait so tests can
//! record posts instead of performing them.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;

use crate::context::DisplayContext;

/// Errors that can occur while posting a message to the display.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The HTTP request itself failed.
    #[error("post message request: {0}")]
    Request(#[source] reqwest::Error),

    /// Reading the response body failed.
    #[error("post message response: {0}")]
    Response(#[source] reqwest::Error),
}

/// Trait for showing a transient text message on the display.
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// Shows `text` on the display for `show_time`.
    ///
    /// # Errors
    ///
    /// Returns a [`NotifyError`] on transport or body-read failure. The
    /// caller decides whether that is fatal; no retry is attempted here.
    async fn post_message(&self, text: &str, show_time: Duration) -> Result<(), NotifyError>;
}

/// Posts messages to the display device's HTTP endpoint.
pub struct DeviceNotifier {
    client: Client,
    url: String,
}

impl DeviceNotifier {
    /// Creates a notifier for the given display, sharing the bootstrap's
    /// HTTP client for connection pooling.
    #[must_use]
    pub fn new(client: Client, context: &DisplayContext) -> Self {
        Self {
            client,
            url: context.message_url(),
        }
    }
}

#[async_trait]
impl MessageSink for DeviceNotifier {
    async fn post_message(&self, text: &str, show_time: Duration) -> Result<(), NotifyError> {
        let show_time_ms = show_time.as_millis().to_string();
        let params = [("text", text), ("showTime", show_time_ms.as_str())];

        let response = self
            .client
            .post(&self.url)
            .form(&params)
            .send()
            .await
            .map_err(NotifyError::Request)?;

        // Drain and discard the body so the connection can be reused.
        response.bytes().await.map_err(NotifyError::Response)?;
        Ok(())
    }
}

/// Sink that drops messages, for tests and headless development.
pub struct NoopMessageSink;

#[async_trait]
impl MessageSink for NoopMessageSink {
    async fn post_message(&self, text: &str, show_time: Duration) -> Result<(), NotifyError> {
        tracing::debug!(text, ?show_time, "message dropped (noop sink)");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Accepts one HTTP request, answers 200, and returns the raw request.
    async fn one_shot_http_server(listener: TcpListener) -> String {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        loop {
            let n = stream.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
            // Stop once the form body (no trailing newline) has arrived.
            let text = String::from_utf8_lossy(&request);
            if let Some(headers_end) = text.find("\r\n\r\n") {
                let content_length = text
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length: "))
                    .or_else(|| text.lines().find_map(|l| l.strip_prefix("Content-Length: ")))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if request.len() >= headers_end + 4 + content_length {
                    break;
                }
            }
        }
        stream
            .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 0\r\n\r\n")
            .await
            .unwrap();
        String::from_utf8_lossy(&request).to_string()
    }

    #[tokio::test]
    async fn posts_form_encoded_text_and_show_time() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(one_shot_http_server(listener));

        // message_url assumes port 80; build the notifier against the
        // fixture address directly instead.
        let notifier = DeviceNotifier {
            client: Client::new(),
            url: format!("http://{addr}/message"),
        };

        notifier
            .post_message("hi", Duration::from_millis(5000))
            .await
            .unwrap();

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /message"));
        assert!(request.contains("text=hi"));
        assert!(request.contains("showTime=5000"));
    }

    #[tokio::test]
    async fn transport_failure_is_a_request_error() {
        // Nothing listens on this address.
        let notifier = DeviceNotifier {
            client: Client::new(),
            url: "http://127.0.0.1:9/message".to_string(),
        };
        let err = notifier
            .post_message("hi", Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(matches!(err, NotifyError::Request(_)));
    }
}
