use crate::error::AppError;
use crate::handlers::AppState;
use crate::models::leaderboard::DeleteScoreRequest;
use ntex::web::{self, HttpRequest, HttpResponse};
use std::sync::Arc;

const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

fn require_admin(state: &AppState, req: &HttpRequest) -> Result<(), AppError> {
    let presented = req
        .headers()
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok());
    if state.config.is_admin(presented) {
        Ok(())
    } else {
        Err(AppError::Forbidden("Admin only".into()))
    }
}

pub async fn delete_score(
    state: web::types::State<Arc<AppState>>,
    req: HttpRequest,
    body: web::types::Json<DeleteScoreRequest>,
) -> Result<HttpResponse, AppError> {
    require_admin(&state, &req)?;
    let body = body.into_inner();
    let result = state.leaderboard.admin_delete(
        &body.category,
        &body.course,
        &body.variant,
        &body.submitter,
    )?;
    Ok(HttpResponse::Ok().json(&result))
}

pub async fn reset_category(
    state: web::types::State<Arc<AppState>>,
    req: HttpRequest,
    path: web::types::Path<String>,
) -> Result<HttpResponse, AppError> {
    require_admin(&state, &req)?;
    let result = state.leaderboard.admin_clear_category(&path.into_inner())?;
    Ok(HttpResponse::Ok().json(&result))
}

pub async fn reset_all(
    state: web::types::State<Arc<AppState>>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    require_admin(&state, &req)?;
    Ok(HttpResponse::Ok().json(&state.leaderboard.admin_clear_all()))
}
