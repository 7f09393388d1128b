use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::{api::ErrorResponse, app::AppState, pipeline::contestation::TopicFilter};

#[derive(Debug, Deserialize)]
pub(crate) struct RadarQuery {
    #[serde(default)]
    filter: TopicFilter,
}

/// GET /v1/radar
/// 最新のスナップショットを返す。係争リストのみ `filter` で絞り込む。
pub(crate) async fn latest(
    State(state): State<AppState>,
    Query(query): Query<RadarQuery>,
) -> Response {
    let Some(snapshot) = state.board().latest() else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            ErrorResponse::json("no radar pass has completed yet"),
        )
            .into_response();
    };

    if query.filter == TopicFilter::All {
        return Json(&*snapshot).into_response();
    }

    let mut body = (*snapshot).clone();
    body.contested = query.filter.apply(&snapshot.contested);
    Json(body).into_response()
}
