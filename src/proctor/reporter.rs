use crate::models::integrity_log::IntegrityEventType;
use serde_json::{json, Value as JsonValue};
use std::collections::HashMap;
use uuid::Uuid;

/// Best-effort integrity telemetry. Contract: at most one attempt per
/// event, no retry, no error surfaced to the caller — a failed report must
/// never block the exam.
#[cfg_attr(test, mockall::automock)]
pub trait IntegrityReporter: Send + Sync {
    fn report(&self, attempt_id: Uuid, event: IntegrityEventType, metadata: JsonValue);
}

/// Seam for the lifecycle-critical submit call fired by termination or
/// timer expiry. Unlike reporting, failures here are logged at error level;
/// the server-side submit path is idempotent, so a caller may safely issue
/// the request again.
#[cfg_attr(test, mockall::automock)]
pub trait SubmitHandle: Send + Sync {
    fn force_submit(
        &self,
        attempt_id: Uuid,
        answers: HashMap<Uuid, String>,
        termination_reason: Option<String>,
    );
}

/// Fire-and-forget HTTP reporter posting to the integrity-log endpoint.
#[derive(Clone)]
pub struct HttpReporter {
    client: reqwest::Client,
    base_url: String,
    bearer_token: String,
}

impl HttpReporter {
    pub fn new(client: reqwest::Client, base_url: String, bearer_token: String) -> Self {
        Self {
            client,
            base_url,
            bearer_token,
        }
    }
}

impl IntegrityReporter for HttpReporter {
    fn report(&self, attempt_id: Uuid, event: IntegrityEventType, metadata: JsonValue) {
        let request = self
            .client
            .post(format!("{}/integrity/log", self.base_url))
            .bearer_auth(&self.bearer_token)
            .json(&json!({
                "attempt_id": attempt_id,
                "type": event,
                "metadata": metadata,
            }));
        tokio::spawn(async move {
            if let Err(err) = request.send().await {
                tracing::debug!(%attempt_id, event = %event, error = %err, "integrity report dropped");
            }
        });
    }
}

/// HTTP submit handle posting to the attempt submit endpoint.
#[derive(Clone)]
pub struct HttpSubmitHandle {
    client: reqwest::Client,
    base_url: String,
    bearer_token: String,
}

impl HttpSubmitHandle {
    pub fn new(client: reqwest::Client, base_url: String, bearer_token: String) -> Self {
        Self {
            client,
            base_url,
            bearer_token,
        }
    }
}

impl SubmitHandle for HttpSubmitHandle {
    fn force_submit(
        &self,
        attempt_id: Uuid,
        answers: HashMap<Uuid, String>,
        termination_reason: Option<String>,
    ) {
        let request = self
            .client
            .post(format!("{}/attempts/submit", self.base_url))
            .bearer_auth(&self.bearer_token)
            .json(&json!({
                "attempt_id": attempt_id,
                "answers": answers,
                "is_termination": termination_reason.is_some(),
                "termination_reason": termination_reason,
            }));
        tokio::spawn(async move {
            match request.send().await {
                Ok(resp) if resp.status().is_success() => {
                    tracing::info!(%attempt_id, "forced submission accepted");
                }
                Ok(resp) => {
                    tracing::error!(%attempt_id, status = %resp.status(), "forced submission rejected");
                }
                Err(err) => {
                    tracing::error!(%attempt_id, error = %err, "forced submission failed");
                }
            }
        });
    }
}
