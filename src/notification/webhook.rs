use anyhow::Result;
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::models::request::Request;

// ── Webhook Event Types ───────────────────────────────────────

/// A structured event payload sent to webhook endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookEvent {
    /// "request_approved" or "request_rejected".
    pub event_type: String,
    pub timestamp: String,
    /// "leave" or "visitor" for request events.
    pub kind: String,
    pub subject_id: String,
    pub subject_name: String,
    pub details: serde_json::Value,
}

impl WebhookEvent {
    pub fn request_approved(request: &Request, pass_id: &str) -> Self {
        Self {
            event_type: "request_approved".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            kind: request.kind.as_str().to_string(),
            subject_id: request.subject_id.clone(),
            subject_name: request.subject_name.clone(),
            details: serde_json::json!({
                "request_id": request.request_id,
                "pass_id": pass_id,
                "room": request.room,
                "decided_by": request.decided_by,
            }),
        }
    }

    pub fn request_rejected(request: &Request) -> Self {
        Self {
            event_type: "request_rejected".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            kind: request.kind.as_str().to_string(),
            subject_id: request.subject_id.clone(),
            subject_name: request.subject_name.clone(),
            details: serde_json::json!({
                "request_id": request.request_id,
                "reason": request.rejection_reason,
                "decided_by": request.decided_by,
            }),
        }
    }
}

// ── HMAC Signing ─────────────────────────────────────────────

/// `sha256=<hex>` HMAC of `payload`.
fn hmac_sha256_hex(secret: &str, payload: &[u8]) -> Option<String> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(payload);
    Some(format!("sha256={}", hex::encode(mac.finalize().into_bytes())))
}

// ── Webhook Notifier ──────────────────────────────────────────

/// Posts events to the configured URLs.
/// Signs bodies in `x-hostel-signature` when a secret is set, and retries
/// with back-off (1s, 5s, 25s by default).
#[derive(Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    urls: Vec<String>,
    secret: Option<String>,
    backoff_secs: Vec<u64>,
}

impl WebhookNotifier {
    pub fn new(urls: Vec<String>, secret: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent("hostel-webhook/1.0")
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "webhook client builder failed, using defaults");
                reqwest::Client::new()
            });
        Self {
            client,
            urls,
            secret,
            backoff_secs: vec![0, 1, 5, 25],
        }
    }

    /// Replace the retry schedule. The first entry is the delay before the
    /// first attempt.
    pub fn with_backoff(mut self, backoff_secs: Vec<u64>) -> Self {
        self.backoff_secs = backoff_secs;
        self
    }

    pub fn is_enabled(&self) -> bool {
        !self.urls.is_empty()
    }

    /// Deliver one event to one URL, retrying on failure.
    pub async fn send(&self, url: &str, event: &WebhookEvent) -> Result<()> {
        let payload = serde_json::to_vec(event)
            .map_err(|e| anyhow::anyhow!("webhook serialize error: {}", e))?;
        let delivery_id = uuid::Uuid::new_v4().to_string();
        let signature = self
            .secret
            .as_deref()
            .and_then(|s| hmac_sha256_hex(s, &payload));

        for (attempt, &delay) in self.backoff_secs.iter().enumerate() {
            if delay > 0 {
                debug!(
                    url,
                    attempt,
                    delay_secs = delay,
                    event_type = %event.event_type,
                    "retrying webhook delivery"
                );
                tokio::time::sleep(Duration::from_secs(delay)).await;
            }

            let mut req = self
                .client
                .post(url)
                .header("content-type", "application/json")
                .header("x-hostel-delivery-id", &delivery_id)
                .header("x-hostel-event", &event.event_type);
            if let Some(ref sig) = signature {
                req = req.header("x-hostel-signature", sig.as_str());
            }

            match req.body(payload.clone()).send().await {
                Ok(resp) if resp.status().is_success() => {
                    info!(
                        url,
                        event_type = %event.event_type,
                        delivery_id = %delivery_id,
                        attempt,
                        "webhook delivered"
                    );
                    return Ok(());
                }
                Ok(resp) => {
                    warn!(
                        url,
                        event_type = %event.event_type,
                        attempt,
                        status = %resp.status(),
                        "webhook delivery failed (non-2xx)"
                    );
                }
                Err(e) => {
                    warn!(
                        url,
                        event_type = %event.event_type,
                        attempt,
                        error = %e,
                        "webhook request error"
                    );
                }
            }
        }

        Err(anyhow::anyhow!(
            "webhook delivery failed after {} attempts: {}",
            self.backoff_secs.len(),
            url
        ))
    }

    /// Deliver to every configured URL in the background.
    pub fn dispatch(&self, event: WebhookEvent) {
        if !self.is_enabled() {
            debug!(event_type = %event.event_type, "no webhook urls configured, event dropped");
            return;
        }
        let notifier = self.clone();
        tokio::spawn(async move {
            for url in &notifier.urls {
                if let Err(e) = notifier.send(url, &event).await {
                    warn!(url, error = %e, "webhook dispatch ultimately failed");
                }
            }
        });
    }
}

// ── Tests ─────────────────────────────────────────────────────
