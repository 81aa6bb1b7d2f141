//! WebSocket event source.

use std::sync::Arc;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{self, Message};
use tracing::{debug, info, warn};
use url::Url;

use chorus_core::config::ConnectionConfig;
use chorus_core::error::{AppError, ErrorKind};
use chorus_core::result::AppResult;
use chorus_core::traits::{EventSource, SourceCommand, SourceEvent, SourceHandle};

use crate::message::ClientMessage;
use crate::message::serializer::serialize_client;
use crate::metrics::PipelineMetrics;

use super::event_from_frame;

/// Connects to the notification socket with `tokio-tungstenite`.
///
/// The auth token travels as the `token` query parameter. Each `connect`
/// opens a fresh socket; reconnecting is left to the caller.
#[derive(Debug, Clone)]
pub struct WebSocketSource {
    url: String,
    event_buffer: usize,
    metrics: Option<Arc<PipelineMetrics>>,
}

impl WebSocketSource {
    /// Source for the configured endpoint.
    pub fn new(config: &ConnectionConfig) -> Self {
        Self {
            url: config.url.clone(),
            event_buffer: config.event_buffer.max(1),
            metrics: None,
        }
    }

    /// Count malformed frames in `metrics`.
    pub fn with_metrics(mut self, metrics: Arc<PipelineMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Endpoint URL with the token attached.
    pub fn endpoint(&self, auth_token: &str) -> AppResult<Url> {
        let mut url = Url::parse(&self.url).map_err(|e| {
            AppError::with_source(
                ErrorKind::Configuration,
                format!("Invalid WebSocket URL '{}'", self.url),
                e,
            )
        })?;
        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(AppError::configuration(format!(
                "WebSocket URL must use ws or wss, got '{}'",
                url.scheme()
            )));
        }
        url.query_pairs_mut().append_pair("token", auth_token);
        Ok(url)
    }
}

#[async_trait]
impl EventSource for WebSocketSource {
    async fn connect(&self, auth_token: &str) -> AppResult<SourceHandle> {
        let url = self.endpoint(auth_token)?;

        let (socket, _response) = connect_async(url.as_str()).await.map_err(|e| {
            let status = match &e {
                tungstenite::Error::Http(response) => Some(response.status().as_u16()),
                _ => None,
            };
            if matches!(status, Some(401 | 403)) {
                AppError::with_source(ErrorKind::Authentication, "Socket handshake rejected", e)
            } else {
                AppError::with_source(ErrorKind::Transport, "Failed to connect socket", e)
            }
        })?;
        info!(host = url.host_str().unwrap_or_default(), "Notification socket connected");

        let (mut write, mut read) = socket.split();
        let (events_tx, events_rx) = mpsc::channel(self.event_buffer);
        let (commands_tx, mut commands_rx) = mpsc::channel::<SourceCommand>(self.event_buffer);

        events_tx
            .send(SourceEvent::Connected)
            .await
            .map_err(|_| AppError::internal("Event receiver dropped during connect"))?;

        let metrics = self.metrics.clone();
        tokio::spawn(async move {
            let mut reason = None;
            while let Some(frame) = read.next().await {
                match frame {
                    Ok(Message::Text(text)) => {
                        let Some(event) = event_from_frame(text.as_str(), metrics.as_deref()) else {
                            continue;
                        };
                        if events_tx.send(event).await.is_err() {
                            debug!("Event receiver dropped, closing reader");
                            return;
                        }
                    }
                    Ok(Message::Close(frame)) => {
                        reason = frame.map(|f| f.reason.as_str().to_string());
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        reason = Some(e.to_string());
                        break;
                    }
                }
            }
            info!(reason = ?reason, "Notification socket disconnected");
            let _ = events_tx.send(SourceEvent::Disconnected { reason }).await;
        });

        tokio::spawn(async move {
            while let Some(command) = commands_rx.recv().await {
                let text = match serialize_client(&ClientMessage::from(command)) {
                    Ok(text) => text,
                    Err(e) => {
                        warn!(error = %e, "Failed to serialize client message");
                        continue;
                    }
                };
                if let Err(e) = write.send(Message::Text(text.into())).await {
                    warn!(error = %e, "Socket write failed");
                    break;
                }
            }
            let _ = write.close().await;
        });

        Ok(SourceHandle::new(events_rx, commands_tx))
    }
}
