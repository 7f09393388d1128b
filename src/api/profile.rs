use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;

use crate::{api::ErrorResponse, app::AppState, pipeline::LookupError};

/// GET /v1/articles/{title}/profile
pub(crate) async fn article_profile(
    State(state): State<AppState>,
    Path(title): Path<String>,
) -> Response {
    let today = Utc::now().date_naive();

    match state.profiles().lookup(&title, today).await {
        Ok(profile) => Json(profile).into_response(),
        Err(error) => {
            let (status, message) = match &error {
                LookupError::NotFound { .. } => {
                    (StatusCode::NOT_FOUND, "article not found".to_string())
                }
                LookupError::TimedOut(_) => (StatusCode::GATEWAY_TIMEOUT, error.to_string()),
                LookupError::Failed(_) => (StatusCode::BAD_GATEWAY, error.to_string()),
            };
            (status, ErrorResponse::json(message)).into_response()
        }
    }
}
