use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use ytmon_ingest::SubscriptionOutcome;

use crate::middleware::RequestId;

use super::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct SubscribeQuery {
    callback_url: String,
}

#[derive(Debug, Serialize)]
pub(super) struct SubscribeResponse {
    results: Vec<SubscriptionOutcome>,
}

/// Ask the hub to push upload notifications for every configured channel
/// to `callback_url`.
pub(super) async fn subscribe(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<SubscribeQuery>,
) -> Result<Json<SubscribeResponse>, ApiError> {
    let callback_url = query.callback_url.trim();
    if !(callback_url.starts_with("http://") || callback_url.starts_with("https://")) {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "callback_url must be an absolute http(s) URL",
        ));
    }

    let results = state.hub.subscribe_all(&state.channels, callback_url).await;
    let requested = results.iter().filter(|r| r.is_requested()).count();
    tracing::info!(
        request_id = %req_id.0,
        callback_url,
        requested,
        total = results.len(),
        "hub subscription round complete"
    );

    Ok(Json(SubscribeResponse { results }))
}
