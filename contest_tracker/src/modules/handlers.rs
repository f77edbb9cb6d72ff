use axum::{extract::Extension, http::StatusCode, Json};
use contest_tracker_libs::{
    clist::{ClistError, ContestSource},
    contest::{aggregate, Contest},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::time::Instant;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ContestsResponse = Result<Json<Vec<Contest>>, (StatusCode, Json<ErrorResponse>)>;

pub async fn list_contests<S>(Extension(source): Extension<Arc<S>>) -> ContestsResponse
where
    S: ContestSource + Send + Sync + 'static,
{
    let start_process = Instant::now();

    let upstream = match source.upcoming().await {
        Ok(upstream) => upstream,
        Err(e) => {
            match &e {
                ClistError::UnexpectedStatus { status, body } => {
                    tracing::error!("clist request failed with status {}: {}", status, body);
                }
                other => tracing::error!("clist request failed cause: {:?}", other),
            }
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: String::from("Failed to fetch contests"),
                }),
            ));
        }
    };

    let total = upstream.len();
    let contests = aggregate(upstream);
    let time = Instant::now().duration_since(start_process).as_millis();

    tracing::info!(
        target: "querylog",
        "elapsed_time={} upstream={} contests={}",
        time, total, contests.len()
    );

    Ok(Json(contests))
}

pub async fn liveness() -> StatusCode {
    StatusCode::OK
}
