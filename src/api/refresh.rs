use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    app::AppState,
    scheduler::{PassContext, PassTrigger},
};

#[derive(Debug, Serialize)]
struct RefreshResponse {
    pass_id: Uuid,
    status: &'static str,
}

/// POST /v1/radar/refresh
/// パスをバックグラウンドで起動し、結果を待たずに 202 を返す。
pub(crate) async fn trigger(State(state): State<AppState>) -> impl IntoResponse {
    state.telemetry().record_manual_refresh_invocation();

    let pass_id = Uuid::new_v4();
    let context = PassContext::new(pass_id, PassTrigger::Manual);
    let scheduler = state.scheduler().clone();

    tokio::spawn(async move {
        match scheduler.run_pass(context).await {
            Ok(_) => info!(%pass_id, "manual radar pass completed"),
            Err(error) => error!(%pass_id, error = ?error, "manual radar pass failed"),
        }
    });

    (
        StatusCode::ACCEPTED,
        Json(RefreshResponse {
            pass_id,
            status: "accepted",
        }),
    )
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::{body::Body, http::Request, http::StatusCode};
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::{
        api::test_support::json_body,
        app::{build_router, test_support},
        clients::fakes::{Canned, FakeFeed},
    };

    #[tokio::test]
    async fn trigger_returns_accepted_and_publishes_in_background() {
        let registry = test_support::registry(
            FakeFeed::new(Canned::Ok(Vec::new())),
            test_support::idle_views(),
            test_support::missing_articles(),
        );
        let board = registry.scheduler().board().clone();
        let mut published = board.subscribe();
        let app = build_router(registry);

        let request = Request::post("/v1/radar/refresh")
            .body(Body::empty())
            .expect("request builds");
        let response = app.oneshot(request).await.expect("request succeeds");

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let payload = json_body(response).await;
        let pass_id = payload["pass_id"]
            .as_str()
            .and_then(|id| Uuid::parse_str(id).ok())
            .expect("pass id is a uuid");
        assert_eq!(payload["status"], "accepted");

        tokio::time::timeout(Duration::from_secs(5), published.changed())
            .await
            .expect("background pass within deadline")
            .expect("board alive");
        assert_eq!(board.latest().map(|s| s.pass_id), Some(pass_id));
    }
}
