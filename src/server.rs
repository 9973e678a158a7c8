use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::{
    ApiBacktestRequest, ApiHealthResponse, ApiRecommendationRequest, ApiRecommendationResponse,
};
use trend_scout::backtest::{run_backtest_job, BacktestOutcome};
use trend_scout::{EngineConfig, RecommendationRanker};

#[derive(Clone)]
struct AppState {
    config: Arc<EngineConfig>,
    ranker: Arc<RecommendationRanker>,
}

pub async fn serve(args: crate::ServeArgs, config: EngineConfig) -> Result<(), String> {
    let host = args.host.unwrap_or_else(|| config.server.host.clone());
    let port = args.port.unwrap_or(config.server.port);

    let state = AppState {
        ranker: Arc::new(RecommendationRanker::new(config.ranker.clone())),
        config: Arc::new(config),
    };

    let app = Router::new()
        .route("/api/health", get(health))
        .route("/api/recommendations", post(recommendations_handler))
        .route("/api/backtest", post(backtest_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .map_err(|err| format!("invalid bind address: {}", err))?;

    info!(%addr, "listening");
    axum::serve(tokio::net::TcpListener::bind(addr).await.map_err(|err| {
        format!("failed to bind server: {}", err)
    })?, app)
    .await
    .map_err(|err| format!("server error: {}", err))?;

    Ok(())
}

async fn health() -> Json<ApiHealthResponse> {
    Json(ApiHealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn recommendations_handler(
    State(state): State<AppState>,
    Json(request): Json<ApiRecommendationRequest>,
) -> Result<Json<ApiRecommendationResponse>, (StatusCode, String)> {
    let ranker_config = state.ranker.config();
    let max_count = request
        .max_count(ranker_config.max_recommendations)
        .map_err(|err| (StatusCode::BAD_REQUEST, err))?;

    let recommendations = state
        .ranker
        .rank(&request.trends, &request.channel, max_count)
        .map_err(|err| (StatusCode::BAD_REQUEST, err.to_string()))?;

    Ok(Json(ApiRecommendationResponse::new(
        recommendations,
        request.trends.len(),
        ranker_config.min_match_score,
    )))
}

async fn backtest_handler(
    State(state): State<AppState>,
    Json(request): Json<ApiBacktestRequest>,
) -> Json<BacktestOutcome> {
    let outcome = run_backtest_job(
        state.config.backtest.clone(),
        request.videos,
        request.channel,
        request.use_ml.unwrap_or(false),
    )
    .await;
    Json(outcome)
}
