use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use engine::{AnalyticsService, BehaviorAnalyzer, ReportAssembler, TradeJournal};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

pub mod error;
pub mod handlers;
pub mod owner;

pub use owner::{OWNER_HEADER, Owner};

/// The shared application state that all handlers can access.
pub struct AppState {
    pub analytics: AnalyticsService,
    pub journal: TradeJournal,
    pub analyzer: Arc<BehaviorAnalyzer>,
    pub reports: ReportAssembler,
}

/// Builds the API router. Every route except the health check expects the
/// owner id in the `x-owner-id` header.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods(Any)
        .allow_headers(AllowHeaders::any());

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route(
            "/api/trades",
            get(handlers::list_trades).post(handlers::create_trade),
        )
        .route("/api/trades/import", post(handlers::import_trades))
        .route(
            "/api/trades/:id",
            get(handlers::get_trade)
                .patch(handlers::update_trade)
                .delete(handlers::delete_trade),
        )
        .route("/api/analytics/summary", get(handlers::get_summary))
        .route("/api/analytics/equity", get(handlers::get_equity_curve))
        .route("/api/analytics/sessions", get(handlers::get_session_performance))
        .route("/api/analytics/strategies", get(handlers::get_strategy_performance))
        .route("/api/analytics/daily", get(handlers::get_daily_pnl))
        .route("/api/analytics/mistakes", get(handlers::get_mistake_breakdown))
        .route("/api/analytics/emotions", get(handlers::get_emotion_performance))
        .route("/api/behavior/analyze", post(handlers::analyze_behavior))
        .route("/api/behavior/summary", get(handlers::get_behavior_summary))
        .route(
            "/api/reports",
            get(handlers::list_reports).post(handlers::generate_report),
        )
        .route("/api/reports/:id", get(handlers::get_report))
        .with_state(state)
        .layer(cors)
        // Logs every incoming request.
        .layer(TraceLayer::new_for_http())
        // Bulk imports of 500 trades fit comfortably.
        .layer(DefaultBodyLimit::max(1024 * 1024 * 5))
}

/// Serves the API until the process is stopped.
pub async fn run_server(addr: SocketAddr, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = router(state);

    tracing::info!("Web server listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use cache::{Cache, MemoryCache};
    use configuration::{BehaviorSettings, CacheSettings};
    use database::{MemoryStore, RecordStore};
    use serde_json::{Value, json};
    use tower::ServiceExt;
    use uuid::Uuid;

    fn app() -> Router {
        let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
        let cache: Arc<dyn Cache> = Arc::new(MemoryCache::new());
        let state = AppState {
            analytics: AnalyticsService::new(
                store.clone(),
                cache.clone(),
                CacheSettings::default(),
            ),
            journal: TradeJournal::new(store.clone(), cache, CacheSettings::default(), None),
            analyzer: Arc::new(BehaviorAnalyzer::new(
                store.clone(),
                behavior::BehaviorEngine::new(BehaviorSettings::default()),
            )),
            reports: ReportAssembler::new(store, None),
        };
        router(Arc::new(state))
    }

    fn request(method: &str, uri: &str, owner: Option<Uuid>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(owner) = owner {
            builder = builder.header(OWNER_HEADER, owner.to_string());
        }
        match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn health_needs_no_owner() {
        let (status, _) = send(&app(), request("GET", "/api/health", None, None)).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn missing_owner_is_unauthorized() {
        let (status, body) = send(&app(), request("GET", "/api/trades", None, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["error"].as_str().unwrap().contains(OWNER_HEADER));
    }

    #[tokio::test]
    async fn trade_lifecycle_over_http() {
        let app = app();
        let owner = Uuid::new_v4();

        let (status, created) = send(
            &app,
            request(
                "POST",
                "/api/trades",
                Some(owner),
                Some(json!({
                    "symbol": " eurusd ",
                    "direction": "LONG",
                    "entry_price": "1.1000",
                    "exit_price": "1.1050",
                    "position_size": "10000"
                })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["symbol"], "EURUSD");
        assert_eq!(created["status"], "win");
        let id = created["id"].as_str().unwrap().to_string();

        let (status, page) = send(
            &app,
            request("GET", "/api/trades?limit=5", Some(owner), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["total"], 1);

        let (status, _) = send(
            &app,
            request("GET", &format!("/api/trades/{id}"), Some(Uuid::new_v4()), None),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, edited) = send(
            &app,
            request(
                "PATCH",
                &format!("/api/trades/{id}"),
                Some(owner),
                Some(json!({ "exit_price": null })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(edited["status"], "open");

        let (status, _) = send(
            &app,
            request("DELETE", &format!("/api/trades/{id}"), Some(owner), None),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn invalid_input_is_a_bad_request() {
        let app = app();
        let owner = Uuid::new_v4();

        let (status, _) = send(
            &app,
            request(
                "POST",
                "/api/trades",
                Some(owner),
                Some(json!({
                    "symbol": "EURUSD",
                    "direction": "LONG",
                    "entry_price": "0",
                    "position_size": "1"
                })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app,
            request("GET", "/api/analytics/daily?year=2024&month=13", Some(owner), None),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn empty_owner_gets_defaults_not_errors() {
        let app = app();
        let owner = Uuid::new_v4();

        let (status, summary) = send(
            &app,
            request("GET", "/api/analytics/summary?range=7d", Some(owner), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(summary["total_trades"], 0);
        assert!(summary["streak_type"].is_null());

        let (status, trend) = send(
            &app,
            request("GET", "/api/behavior/summary", Some(owner), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(trend["data"].is_null());

        let (status, report) = send(&app, request("POST", "/api/reports", Some(owner), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["message"], "No closed trades in this period.");
    }

    #[tokio::test]
    async fn paging_is_clamped_and_never_overflows() {
        let app = app();
        let owner = Uuid::new_v4();
        for symbol in ["EURUSD", "GBPUSD", "USDJPY"] {
            let (status, _) = send(
                &app,
                request(
                    "POST",
                    "/api/trades",
                    Some(owner),
                    Some(json!({
                        "symbol": symbol,
                        "direction": "SHORT",
                        "entry_price": "1.2",
                        "position_size": "1000"
                    })),
                ),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (status, first) =
            send(&app, request("GET", "/api/trades?page=0&limit=2", Some(owner), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["offset"], 0);
        assert_eq!(first["trades"].as_array().unwrap().len(), 2);

        let (status, capped) =
            send(&app, request("GET", "/api/trades?limit=1000", Some(owner), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(capped["limit"], 100);
        assert_eq!(capped["trades"].as_array().unwrap().len(), 3);

        let (status, beyond) = send(
            &app,
            request(
                "GET",
                "/api/trades?page=18446744073709551615&limit=1000",
                Some(owner),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(beyond["limit"], 100);
        assert_eq!(beyond["total"], 3);
        assert!(beyond["trades"].as_array().unwrap().is_empty());

        let (status, reports) = send(
            &app,
            request(
                "GET",
                "/api/reports?page=18446744073709551615&limit=1000",
                Some(owner),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(reports.as_array().unwrap().is_empty());
    }
}
