//! Notifier implementations
//!
//! The engine reports through the [`Notifier`] boundary; these are the
//! two stock implementations. Notifier failures are never escalated to
//! pipeline failures by callers.

use crate::engine::traits::Notifier;
use crate::pipeline::NotifierError;
use async_trait::async_trait;
use url::Url;

/// Notifier that POSTs the JSON report to an HTTP channel
///
/// The channel reference is the target URL, e.g. a pull-request
/// comment webhook.
#[derive(Debug, Clone)]
pub struct HttpNotifier {
    client: reqwest::Client,
}

impl HttpNotifier {
    /// Creates an HTTP notifier with a default client
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn post(&self, channel: &str, report: &serde_json::Value) -> Result<(), NotifierError> {
        let url = Url::parse(channel).map_err(|e| NotifierError::Channel(e.to_string()))?;

        let response = self
            .client
            .post(url)
            .json(report)
            .send()
            .await
            .map_err(|e| NotifierError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifierError::Rejected {
                status: status.as_u16(),
            });
        }

        tracing::debug!(channel = %channel, "Report posted");
        Ok(())
    }
}

/// Notifier that writes the report to the log
///
/// Useful for local runs and as a stand-in when no channel is
/// configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl LogNotifier {
    /// Creates a log notifier
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn post(&self, channel: &str, report: &serde_json::Value) -> Result<(), NotifierError> {
        tracing::info!(channel = %channel, report = %report, "Report");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_http_notifier_rejects_bad_channel() {
        let notifier = HttpNotifier::new();
        let err = notifier
            .post("not a url", &serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, NotifierError::Channel(_)));
    }

    #[tokio::test]
    async fn test_log_notifier_always_succeeds() {
        let notifier = LogNotifier::new();
        let result = notifier.post("#ci", &serde_json::json!({"ok": true})).await;
        assert!(result.is_ok());
    }
}
