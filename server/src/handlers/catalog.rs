use crate::error::AppError;
use crate::handlers::AppState;
use crate::models::leaderboard::SuggestQuery;
use ntex::web::{self, HttpResponse};
use std::sync::Arc;

pub async fn list_categories(state: web::types::State<Arc<AppState>>) -> HttpResponse {
    HttpResponse::Ok().json(&state.leaderboard.catalog().list_categories())
}

pub async fn list_courses(state: web::types::State<Arc<AppState>>) -> HttpResponse {
    HttpResponse::Ok().json(&state.leaderboard.catalog().list_courses())
}

pub async fn list_variants(
    state: web::types::State<Arc<AppState>>,
    path: web::types::Path<String>,
) -> Result<HttpResponse, AppError> {
    let course = path.into_inner();
    let catalog = state.leaderboard.catalog();
    if !catalog.is_valid_course(&course) {
        return Err(AppError::NotFound(format!("Unknown course: {}", course)));
    }
    Ok(HttpResponse::Ok().json(&catalog.list_variants(&course)))
}

pub async fn suggest(
    state: web::types::State<Arc<AppState>>,
    query: web::types::Query<SuggestQuery>,
) -> Result<HttpResponse, AppError> {
    let catalog = state.leaderboard.catalog();
    let fragment = query.q.as_deref().unwrap_or("");
    let suggestions = match query.kind.as_str() {
        "category" => catalog.suggest_categories(fragment),
        "course" => catalog.suggest_courses(fragment),
        "variant" => {
            let course = query
                .course
                .as_deref()
                .ok_or_else(|| AppError::BadRequest("course required for variant suggestions".into()))?;
            catalog.suggest_variants(course, fragment)
        }
        other => return Err(AppError::BadRequest(format!("Unknown suggestion kind: {}", other))),
    };
    Ok(HttpResponse::Ok().json(&suggestions))
}
