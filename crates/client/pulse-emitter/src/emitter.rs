//! Event sending

use crate::config::EmitterConfig;
use crate::error::{EmitterError, Result};
use pulse_core::payload::{ErrorPayload, ReplacementPayload, UserActionPayload};
use pulse_core::{EventId, EventKind};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::debug;

/// A text replacement attempt, as observed by the application
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    /// Whether the replacement went through
    pub success: bool,
    /// Strategy used, e.g. `Win32DirectReplacer`
    pub method: String,
    /// Process name of the target application
    pub target_app: String,
    /// Length of the replaced text
    pub text_length: Option<u64>,
    /// Time taken in milliseconds
    pub response_time_ms: Option<u64>,
}

/// An error raised inside the application
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    /// Error class
    pub error_type: String,
    /// Human readable message
    pub error_message: String,
    /// Application the error relates to
    pub target_app: Option<String>,
    /// Stack trace
    pub stack_trace: Option<String>,
}

/// A user interaction worth counting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAction {
    /// Kind of action, e.g. `hotkey_pressed`
    pub action_type: String,
    /// Application the action relates to
    pub target_app: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Accepted {
    id: EventId,
}

#[derive(Debug, Deserialize)]
struct Rejection {
    error: String,
}

struct Inner {
    client: reqwest::Client,
    config: EmitterConfig,
    user_id: String,
    enabled: AtomicBool,
}

/// Sends telemetry for one installation. Cheap to clone.
#[derive(Clone)]
pub struct Emitter {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Emitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Emitter")
            .field("endpoint", &self.inner.config.endpoint)
            .field("user_id", &self.inner.user_id)
            .field("enabled", &self.is_enabled())
            .finish_non_exhaustive()
    }
}

impl Emitter {
    /// Build an emitter that tags every event with `user_id`
    pub fn new(config: EmitterConfig, user_id: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            inner: Arc::new(Inner {
                client,
                enabled: AtomicBool::new(config.enabled),
                config,
                user_id: user_id.into(),
            }),
        })
    }

    /// Turn sending on or off
    pub fn set_enabled(&self, enabled: bool) {
        self.inner.enabled.store(enabled, Ordering::Relaxed);
    }

    /// Whether events are currently sent
    pub fn is_enabled(&self) -> bool {
        self.inner.enabled.load(Ordering::Relaxed)
    }

    /// The id attached to outgoing events
    pub fn user_id(&self) -> &str {
        &self.inner.user_id
    }

    /// Record a replacement in the background
    pub fn track_replacement(&self, event: Replacement) {
        self.spawn(EventKind::Replacement, self.replacement_payload(event));
    }

    /// Record an error in the background
    pub fn track_error(&self, event: ErrorReport) {
        self.spawn(EventKind::Error, self.error_payload(event));
    }

    /// Record a user action in the background
    pub fn track_user_action(&self, event: UserAction) {
        self.spawn(EventKind::UserAction, self.action_payload(event));
    }

    /// Send a replacement and wait for the assigned id
    pub async fn send_replacement(&self, event: Replacement) -> Result<EventId> {
        let payload = self.replacement_payload(event);
        self.send(EventKind::Replacement, &payload).await
    }

    /// Send an error and wait for the assigned id
    pub async fn send_error(&self, event: ErrorReport) -> Result<EventId> {
        let payload = self.error_payload(event);
        self.send(EventKind::Error, &payload).await
    }

    /// Send a user action and wait for the assigned id
    pub async fn send_user_action(&self, event: UserAction) -> Result<EventId> {
        let payload = self.action_payload(event);
        self.send(EventKind::UserAction, &payload).await
    }

    fn replacement_payload(&self, event: Replacement) -> ReplacementPayload {
        ReplacementPayload {
            user_id: self.inner.user_id.clone(),
            app_version: self.inner.config.app_version.clone(),
            os: Some(self.inner.config.os.clone()),
            success: event.success,
            method: event.method,
            target_app: event.target_app,
            text_length: event.text_length,
            response_time_ms: event.response_time_ms,
            user_agent: None,
            ip_address: None,
        }
    }

    fn error_payload(&self, event: ErrorReport) -> ErrorPayload {
        ErrorPayload {
            user_id: self.inner.user_id.clone(),
            app_version: self.inner.config.app_version.clone(),
            os: Some(self.inner.config.os.clone()),
            error_type: event.error_type,
            error_message: event.error_message,
            target_app: event.target_app,
            stack_trace: event.stack_trace,
        }
    }

    fn action_payload(&self, event: UserAction) -> UserActionPayload {
        UserActionPayload {
            user_id: self.inner.user_id.clone(),
            action_type: event.action_type,
            target_app: event.target_app,
            app_version: self.inner.config.app_version.clone(),
            os: Some(self.inner.config.os.clone()),
        }
    }

    fn spawn<P>(&self, kind: EventKind, payload: P)
    where
        P: Serialize + Send + Sync + 'static,
    {
        if !self.is_enabled() {
            return;
        }
        let Ok(handle) = Handle::try_current() else {
            debug!(kind = kind.as_str(), "No Tokio runtime; dropping event");
            return;
        };

        let emitter = self.clone();
        handle.spawn(async move {
            if let Err(err) = emitter.send(kind, &payload).await {
                debug!(
                    kind = kind.as_str(),
                    error = %err,
                    transient = err.is_transient(),
                    "Analytics send failed"
                );
            }
        });
    }

    async fn send<P: Serialize>(&self, kind: EventKind, payload: &P) -> Result<EventId> {
        if !self.is_enabled() {
            return Err(EmitterError::Disabled);
        }

        let response = self
            .inner
            .client
            .post(self.inner.config.url(path_for(kind)))
            .bearer_auth(&self.inner.config.api_key)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<Rejection>()
                .await
                .map(|r| r.error)
                .unwrap_or_else(|_| status.to_string());
            return Err(EmitterError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let accepted: Accepted = response
            .json()
            .await
            .map_err(|e| EmitterError::InvalidResponse(e.to_string()))?;
        debug!(kind = kind.as_str(), id = accepted.id.0, "Event delivered");
        Ok(accepted.id)
    }
}

fn path_for(kind: EventKind) -> &'static str {
    match kind {
        EventKind::Replacement => "/api/analytics/text-replacement",
        EventKind::Error => "/api/analytics/error",
        EventKind::UserAction => "/api/analytics/user-action",
    }
}
