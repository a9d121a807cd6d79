// FCM send client
//
// Implementation of Notifier for the FCM HTTP send API. Topic broadcasts use
// the "/topics/{name}" target form; token sends address the device directly.
// Auth is the server key in the Authorization header.

use std::collections::HashMap;

use async_trait::async_trait;
use herald_core::{HeraldError, Notifier, PushMessage, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

const DEFAULT_API_URL: &str = "https://fcm.googleapis.com/fcm/send";

/// FCM push transport
///
/// Implements `Notifier` against the FCM HTTP send endpoint.
///
/// # Example
///
/// ```ignore
/// use herald_fcm::FcmNotifier;
///
/// let notifier = FcmNotifier::from_env()?;
/// // or
/// let notifier = FcmNotifier::new("your-server-key");
/// // or with custom endpoint (tests, proxies)
/// let notifier = FcmNotifier::with_base_url("your-server-key", "http://localhost:8089/fcm/send");
/// ```
#[derive(Clone)]
pub struct FcmNotifier {
    client: Client,
    server_key: String,
    api_url: String,
}

impl FcmNotifier {
    /// Create a new notifier with the given server key
    pub fn new(server_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            server_key: server_key.into(),
            api_url: DEFAULT_API_URL.to_string(),
        }
    }

    /// Create a new notifier from the FCM_SERVER_KEY environment variable
    pub fn from_env() -> Result<Self> {
        let server_key = std::env::var("FCM_SERVER_KEY")
            .map_err(|_| HeraldError::config("FCM_SERVER_KEY environment variable not set"))?;
        Ok(Self::new(server_key))
    }

    /// Create a new notifier with a custom API URL
    pub fn with_base_url(server_key: impl Into<String>, api_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            server_key: server_key.into(),
            api_url: api_url.into(),
        }
    }

    async fn send(&self, to: String, message: &PushMessage) -> Result<String> {
        let request = FcmRequest {
            to,
            notification: FcmNotification {
                title: &message.title,
                body: &message.body,
            },
            data: &message.data,
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("key={}", self.server_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| HeraldError::dispatch(format!("Failed to send request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(HeraldError::dispatch(format!(
                "FCM API error ({}): {}",
                status, error_text
            )));
        }

        let body: FcmResponse = response
            .json()
            .await
            .map_err(|e| HeraldError::dispatch(format!("Invalid FCM response: {}", e)))?;

        body.message_id()
            .ok_or_else(|| HeraldError::dispatch(format!("FCM rejected message: {}", body.error())))
    }
}

#[async_trait]
impl Notifier for FcmNotifier {
    async fn send_to_topic(&self, topic: &str, message: &PushMessage) -> Result<String> {
        let message_id = self.send(format!("/topics/{}", topic), message).await?;
        tracing::debug!(topic = %topic, message_id = %message_id, "Topic broadcast accepted");
        Ok(message_id)
    }

    async fn send_to_token(&self, token: &str, message: &PushMessage) -> Result<String> {
        let message_id = self.send(token.to_string(), message).await?;
        tracing::debug!(message_id = %message_id, "Token send accepted");
        Ok(message_id)
    }
}

#[derive(Debug, Serialize)]
struct FcmRequest<'a> {
    to: String,
    notification: FcmNotification<'a>,
    data: &'a HashMap<String, String>,
}

#[derive(Debug, Serialize)]
struct FcmNotification<'a> {
    title: &'a str,
    body: &'a str,
}

/// Send response. Topic sends return a top-level message id; token sends
/// return a results array with one entry per token.
#[derive(Debug, Deserialize)]
struct FcmResponse {
    #[serde(default)]
    message_id: Option<serde_json::Value>,
    #[serde(default)]
    results: Vec<FcmResult>,
}

#[derive(Debug, Deserialize)]
struct FcmResult {
    #[serde(default)]
    message_id: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl FcmResponse {
    fn message_id(&self) -> Option<String> {
        if let Some(id) = &self.message_id {
            return Some(match id {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            });
        }
        self.results
            .first()
            .and_then(|result| result.message_id.clone())
    }

    fn error(&self) -> String {
        self.results
            .first()
            .and_then(|result| result.error.clone())
            .unwrap_or_else(|| "unknown error".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn message() -> PushMessage {
        PushMessage::new("New Event: Launch", "Mon, Jun 2 at 10:00 AM • Main Hall")
            .with_data("type", "new_event")
            .with_data("eventId", "evt-1")
    }

    #[tokio::test]
    async fn test_topic_send_posts_expected_shape() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/fcm/send"))
            .and(header("Authorization", "key=test-key"))
            .and(body_partial_json(serde_json::json!({
                "to": "/topics/events",
                "notification": {
                    "title": "New Event: Launch",
                    "body": "Mon, Jun 2 at 10:00 AM • Main Hall"
                },
                "data": {"type": "new_event", "eventId": "evt-1"}
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"message_id": 7123})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let notifier =
            FcmNotifier::with_base_url("test-key", format!("{}/fcm/send", server.uri()));
        let message_id = notifier.send_to_topic("events", &message()).await.unwrap();

        assert_eq!(message_id, "7123");
    }

    #[tokio::test]
    async fn test_token_send_reads_results_array() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/fcm/send"))
            .and(body_partial_json(serde_json::json!({"to": "device-token-1"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": 1,
                "failure": 0,
                "results": [{"message_id": "0:1748772000"}]
            })))
            .mount(&server)
            .await;

        let notifier =
            FcmNotifier::with_base_url("test-key", format!("{}/fcm/send", server.uri()));
        let message_id = notifier
            .send_to_token("device-token-1", &message())
            .await
            .unwrap();

        assert_eq!(message_id, "0:1748772000");
    }

    #[tokio::test]
    async fn test_http_error_becomes_dispatch_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/fcm/send"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid key"))
            .mount(&server)
            .await;

        let notifier =
            FcmNotifier::with_base_url("bad-key", format!("{}/fcm/send", server.uri()));
        let result = notifier.send_to_topic("events", &message()).await;

        assert!(matches!(result, Err(HeraldError::Dispatch(_))));
    }

    #[tokio::test]
    async fn test_transport_rejection_becomes_dispatch_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/fcm/send"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": 0,
                "failure": 1,
                "results": [{"error": "NotRegistered"}]
            })))
            .mount(&server)
            .await;

        let notifier =
            FcmNotifier::with_base_url("test-key", format!("{}/fcm/send", server.uri()));
        let result = notifier.send_to_token("stale-token", &message()).await;

        match result {
            Err(HeraldError::Dispatch(msg)) => assert!(msg.contains("NotRegistered")),
            other => panic!("expected dispatch error, got {:?}", other.map(|_| ())),
        }
    }
}
