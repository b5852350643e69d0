use axum::{
    Json, Router,
    extract::Query,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use tower::limit::ConcurrencyLimitLayer;

use crate::config::{SchedulingConfig, ServerConfig};
use crate::data::{CandidateSlot, ScheduleRequest, ScheduleResponse, ScoreRequest, ScoreResponse};
use crate::error::ScheduleError;
use crate::solver;

/// Error body returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

#[derive(Debug)]
pub enum AppError {
    Schedule(ScheduleError),
    Internal(String),
}

impl From<ScheduleError> for AppError {
    fn from(err: ScheduleError) -> Self {
        AppError::Schedule(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Schedule(err) => {
                warn!("Rejected schedule request: {}", err);
                (
                    StatusCode::BAD_REQUEST,
                    ApiError {
                        code: err.code().to_string(),
                        message: err.to_string(),
                    },
                )
            }
            AppError::Internal(msg) => {
                error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError {
                        code: "INTERNAL".to_string(),
                        message: msg,
                    },
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

async fn solve_handler(Json(input): Json<ScheduleRequest>) -> Result<Json<ScheduleResponse>, AppError> {
    // the search is CPU-bound; keep it off the async workers
    let output = tokio::task::spawn_blocking(move || solver::solve(&input))
        .await
        .map_err(|e| AppError::Internal(format!("solver task failed: {}", e)))??;
    Ok(Json(output))
}

async fn score_handler(Json(input): Json<ScoreRequest>) -> Json<ScoreResponse> {
    Json(solver::rescore(&input))
}

async fn slots_handler(Query(config): Query<SchedulingConfig>) -> Result<Json<Vec<CandidateSlot>>, AppError> {
    config.validate()?;
    Ok(Json(config.candidate_slots()))
}

pub fn router(max_concurrent_solves: usize) -> Router {
    Router::new()
        .route("/v1/timetable/solve", post(solve_handler))
        .route("/v1/timetable/score", post(score_handler))
        .route("/v1/timetable/slots", get(slots_handler))
        .layer(ConcurrencyLimitLayer::new(max_concurrent_solves))
}

pub async fn run_server(config: ServerConfig) -> std::io::Result<()> {
    let app = router(config.max_concurrent_solves);

    let listener = tokio::net::TcpListener::bind(&config.addr).await?;
    info!("Server running at http://{}", listener.local_addr()?);

    axum::serve(listener, app).await
}
