use crate::error::AppError;
use crate::handlers::AppState;
use crate::models::leaderboard::*;
use ntex::http::StatusCode;
use ntex::web::{self, HttpResponse};
use std::sync::Arc;

pub async fn submit_score(
    state: web::types::State<Arc<AppState>>,
    body: web::types::Json<ScoreSubmission>,
) -> Result<HttpResponse, AppError> {
    let req = body.into_inner();
    let result = state.leaderboard.submit(&req);
    let response = match &result.outcome {
        SubmitResult::Accepted { .. } | SubmitResult::RejectedNotBetter { .. } => {
            HttpResponse::Ok().json(&result)
        }
        SubmitResult::RejectedCooldown { retry_after_secs } => {
            HttpResponse::build(StatusCode::TOO_MANY_REQUESTS)
                .header("retry-after", retry_after_secs.to_string())
                .json(&result)
        }
        SubmitResult::RejectedInvalidInput { .. } => {
            HttpResponse::build(StatusCode::BAD_REQUEST).json(&result)
        }
    };
    Ok(response)
}

pub async fn get_scope(
    state: web::types::State<Arc<AppState>>,
    path: web::types::Path<(String, String, String)>,
) -> Result<HttpResponse, AppError> {
    let (category, course, variant) = path.into_inner();
    let view = state
        .leaderboard
        .query_scope(&category, &course, &variant)?;
    Ok(HttpResponse::Ok().json(&view))
}

pub async fn get_category(
    state: web::types::State<Arc<AppState>>,
    path: web::types::Path<String>,
) -> Result<HttpResponse, AppError> {
    let view = state.leaderboard.query_category_totals(&path.into_inner())?;
    Ok(HttpResponse::Ok().json(&view))
}

pub async fn get_overall(
    state: web::types::State<Arc<AppState>>,
) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(&state.leaderboard.query_grand_total()))
}

pub async fn get_submitter(
    state: web::types::State<Arc<AppState>>,
    path: web::types::Path<String>,
) -> Result<HttpResponse, AppError> {
    let submitter = path.into_inner();
    match state.leaderboard.query_submitter_stats(&submitter)? {
        Some(stats) => Ok(HttpResponse::Ok().json(&stats)),
        None => Err(AppError::NotFound(format!("No scores yet for {}", submitter))),
    }
}
