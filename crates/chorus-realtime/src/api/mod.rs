//! REST backend client.
//!
//! Fetches the authoritative notification list and persists read receipts
//! when configured to use REST instead of the socket.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use chorus_core::config::ApiConfig;
use chorus_core::error::{AppError, ErrorKind};
use chorus_core::result::AppResult;
use chorus_core::traits::{ReadReceiptSink, SessionProvider};
use chorus_core::types::{NotificationEvent, NotificationId};

use crate::message::RawNotification;
use crate::message::validator::validate_notification;

/// List responses come either bare or wrapped.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ListResponse {
    Bare(Vec<RawNotification>),
    Wrapped { notifications: Vec<RawNotification> },
}

/// Client for the notification REST endpoints.
pub struct NotificationApi {
    http: reqwest::Client,
    base_url: Url,
    session: Arc<dyn SessionProvider>,
}

impl std::fmt::Debug for NotificationApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationApi")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

impl NotificationApi {
    /// Build a client for `config.base_url`, authenticating with `session`.
    pub fn new(config: &ApiConfig, session: Arc<dyn SessionProvider>) -> AppResult<Self> {
        let mut base_url = Url::parse(&config.base_url).map_err(|e| {
            AppError::with_source(
                ErrorKind::Configuration,
                format!("Invalid API base URL '{}'", config.base_url),
                e,
            )
        })?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::configuration("API base URL cannot be a base"));
        }
        // Treat the configured path as a directory regardless of trailing slash.
        if let Ok(mut segments) = base_url.path_segments_mut() {
            segments.pop_if_empty();
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds.max(1)))
            .build()
            .map_err(|e| {
                AppError::with_source(ErrorKind::Configuration, "Failed to build HTTP client", e)
            })?;

        Ok(Self {
            http,
            base_url,
            session,
        })
    }

    /// `GET {base}/notifications`.
    ///
    /// Entries that fail validation are skipped.
    pub async fn list_notifications(&self) -> AppResult<Vec<NotificationEvent>> {
        let url = self.endpoint(&["notifications"]);
        let response = self
            .authorized(self.http.get(url))?
            .send()
            .await
            .map_err(request_error)?;
        let response = check_status(response).await?;

        let body: ListResponse = response.json().await.map_err(|e| {
            AppError::with_source(ErrorKind::Serialization, "Invalid notification list", e)
        })?;
        let raw = match body {
            ListResponse::Bare(list) => list,
            ListResponse::Wrapped { notifications } => notifications,
        };

        let total = raw.len();
        let notifications: Vec<NotificationEvent> = raw
            .into_iter()
            .filter_map(|item| match validate_notification(item) {
                Ok(event) => Some(event),
                Err(e) => {
                    warn!(error = %e, "Skipping invalid notification in list");
                    None
                }
            })
            .collect();
        debug!(total, valid = notifications.len(), "Fetched notifications");
        Ok(notifications)
    }

    /// `PUT {base}/notifications/{id}/read`.
    pub async fn mark_read(&self, id: &NotificationId) -> AppResult<()> {
        let url = self.endpoint(&["notifications", id.as_str(), "read"]);
        let response = self
            .authorized(self.http.put(url))?
            .send()
            .await
            .map_err(request_error)?;
        check_status(response).await?;
        Ok(())
    }

    /// Base URL with `segments` appended, each percent-encoded.
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.extend(segments);
        }
        url
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> AppResult<reqwest::RequestBuilder> {
        let token = self
            .session
            .auth_token()
            .ok_or_else(|| AppError::authentication("No authenticated user"))?;
        Ok(request.bearer_auth(token))
    }
}

#[async_trait]
impl ReadReceiptSink for NotificationApi {
    async fn mark_notification_read(&self, id: &NotificationId) -> AppResult<()> {
        self.mark_read(id).await
    }
}

fn request_error(e: reqwest::Error) -> AppError {
    AppError::with_source(ErrorKind::ExternalService, "Notification API request failed", e)
}

async fn check_status(response: reqwest::Response) -> AppResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let kind = if status.as_u16() == 401 || status.as_u16() == 403 {
        ErrorKind::Authentication
    } else {
        ErrorKind::ExternalService
    };
    Err(AppError::new(
        kind,
        format!("Notification API returned {status}: {body}"),
    ))
}
