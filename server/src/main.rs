mod catalog;
mod config;
mod db;
mod error;
mod handlers;
mod models;
mod persistence;
mod ranking;
mod rate_limit;
mod services;
mod store;
mod validation;

use catalog::Catalog;
use config::Config;
use handlers::AppState;
use ntex::web;
use ntex_cors::Cors;
use persistence::Persistence;
use services::leaderboard::Leaderboard;
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

fn init_logging(log_level: &str) {
    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

#[ntex::main]
async fn main() -> std::io::Result<()> {
    let config = Config::from_env();
    init_logging(&config.log_level);

    let persistence =
        Persistence::open(config.storage, &config.data_path).map_err(std::io::Error::other)?;
    let leaderboard = Leaderboard::open(
        Arc::new(Catalog::builtin()),
        persistence,
        config.settings(),
    );

    let bind = format!("{}:{}", config.host, config.port);
    tracing::info!(
        address = %bind,
        cooldown_secs = config.cooldown_secs,
        admin_enabled = config.admin_token.is_some(),
        "leaderboard server starting"
    );

    let state = Arc::new(AppState {
        leaderboard,
        config,
    });

    web::HttpServer::new(move || {
        web::App::new()
            .state(state.clone())
            .wrap(
                Cors::new()
                    .allowed_origin("*")
                    .allowed_methods(vec!["GET", "POST", "DELETE", "OPTIONS"])
                    .allowed_headers(vec!["Content-Type", "X-Admin-Token"])
                    .max_age(3600)
                    .finish(),
            )
            .route("/api/health", web::get().to(health))
            // Catalog
            .route("/api/catalog/categories", web::get().to(handlers::catalog::list_categories))
            .route("/api/catalog/courses", web::get().to(handlers::catalog::list_courses))
            .route("/api/catalog/courses/{course}", web::get().to(handlers::catalog::list_variants))
            .route("/api/catalog/suggest", web::get().to(handlers::catalog::suggest))
            // Scores and rankings
            .route("/api/scores", web::post().to(handlers::leaderboard::submit_score))
            .route("/api/leaderboard", web::get().to(handlers::leaderboard::get_overall))
            .route("/api/leaderboard/{category}", web::get().to(handlers::leaderboard::get_category))
            .route(
                "/api/leaderboard/{category}/{course}/{variant}",
                web::get().to(handlers::leaderboard::get_scope),
            )
            .route("/api/submitters/{submitter}", web::get().to(handlers::leaderboard::get_submitter))
            // Admin
            .route("/api/admin/scores", web::delete().to(handlers::admin::delete_score))
            .route("/api/admin/reset", web::post().to(handlers::admin::reset_all))
            .route("/api/admin/reset/{category}", web::post().to(handlers::admin::reset_category))
    })
    .bind(bind)?
    .run()
    .await
}

async fn health() -> web::HttpResponse {
    web::HttpResponse::Ok().json(&serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
