//! Engagement callback handlers: the open pixel and the click redirect

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use mailloom_common::Error;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::handlers::{error_response, ErrorResponse};
use crate::state::AppState;

/// 1x1 transparent GIF served to open-pixel requests
const TRANSPARENT_GIF: [u8; 43] = [
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x01, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00,
    0x00, 0xff, 0xff, 0xff, 0x21, 0xf9, 0x04, 0x01, 0x00, 0x00, 0x00, 0x00, 0x2c, 0x00, 0x00,
    0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x02, 0x02, 0x44, 0x01, 0x00, 0x3b,
];

/// Query parameters on a click redirect
#[derive(Debug, Deserialize)]
pub struct ClickQuery {
    pub redirect: Option<String>,
    pub recipient: Option<String>,
}

/// Open-pixel callback. Marks the row opened and always answers with the
/// pixel so broken ids degrade to a 404, never a visible error in the
/// mail client.
pub async fn track_open(
    State(state): State<Arc<AppState>>,
    Path(tracking_id): Path<Uuid>,
) -> Result<Response, (StatusCode, Json<ErrorResponse>)> {
    let log = state
        .tracking
        .find_by_open_tracking_id(tracking_id)
        .await
        .map_err(|e| error_response(&e))?
        .ok_or_else(|| {
            error_response(&Error::NotFound(format!("Tracking id {}", tracking_id)))
        })?;

    state
        .tracking
        .mark_opened(log.id)
        .await
        .map_err(|e| error_response(&e))?;
    debug!(tracking_id = %tracking_id, recipient = %log.recipient_email, "open recorded");

    Ok((
        [(header::CONTENT_TYPE, "image/gif")],
        TRANSPARENT_GIF.to_vec(),
    )
        .into_response())
}

/// Click callback. Marks the row clicked and bounces the visitor to the
/// original destination when one was embedded.
pub async fn track_click(
    State(state): State<Arc<AppState>>,
    Path(tracking_id): Path<Uuid>,
    Query(query): Query<ClickQuery>,
) -> Result<Response, (StatusCode, Json<ErrorResponse>)> {
    let log = state
        .tracking
        .find_by_click_tracking_id(tracking_id)
        .await
        .map_err(|e| error_response(&e))?
        .ok_or_else(|| {
            error_response(&Error::NotFound(format!("Tracking id {}", tracking_id)))
        })?;

    state
        .tracking
        .mark_clicked(log.id)
        .await
        .map_err(|e| error_response(&e))?;
    debug!(tracking_id = %tracking_id, recipient = %log.recipient_email, "click recorded");

    match query.redirect.as_deref().filter(|r| !r.is_empty()) {
        Some(redirect) => {
            let location = header::HeaderValue::from_str(redirect).map_err(|_| {
                warn!(tracking_id = %tracking_id, "unusable redirect target");
                error_response(&Error::Validation("Invalid redirect target".to_string()))
            })?;
            Ok((StatusCode::FOUND, [(header::LOCATION, location)]).into_response())
        }
        None => Ok(StatusCode::OK.into_response()),
    }
}
