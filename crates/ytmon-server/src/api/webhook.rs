use axum::{
    body::Bytes,
    extract::{Query, State},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use ytmon_ingest::NotificationReport;

use crate::middleware::RequestId;

use super::AppState;

#[derive(Debug, Deserialize)]
pub(super) struct VerifyQuery {
    #[serde(rename = "hub.mode")]
    mode: Option<String>,
    #[serde(rename = "hub.topic")]
    topic: Option<String>,
    #[serde(rename = "hub.challenge")]
    challenge: Option<String>,
    #[serde(rename = "hub.lease_seconds")]
    lease_seconds: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct Received {
    status: &'static str,
    #[serde(flatten)]
    report: NotificationReport,
}

#[derive(Debug, Serialize)]
pub(super) struct Rejected {
    status: &'static str,
    detail: String,
}

/// Hub verification handshake. Echoes `hub.challenge` as plain text.
pub(super) async fn verify(Query(query): Query<VerifyQuery>) -> String {
    match query.mode.as_deref() {
        Some("denied") => {
            tracing::warn!(topic = ?query.topic, "hub denied subscription");
        }
        mode => {
            tracing::info!(
                mode = ?mode,
                topic = ?query.topic,
                lease_seconds = ?query.lease_seconds,
                "hub verification request"
            );
        }
    }

    query.challenge.unwrap_or_else(|| "no challenge".to_string())
}

/// Push notification delivery. Per-entry failures are absorbed; only an
/// unparseable body produces the `error` shape.
pub(super) async fn receive(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Bytes,
) -> Response {
    match state.pipeline.handle_notification(&body).await {
        Ok(report) => Json(Received {
            status: "received",
            report,
        })
        .into_response(),
        Err(e) => {
            tracing::error!(request_id = %req_id.0, error = %e, "error processing notification");
            Json(Rejected {
                status: "error",
                detail: e.to_string(),
            })
            .into_response()
        }
    }
}
