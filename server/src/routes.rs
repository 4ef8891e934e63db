mod auth;
mod config;
mod folders;
mod images;
mod playlist;
mod proxy;
mod upload;

use crate::serve::AppState;
use axum::extract::DefaultBodyLimit;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::Router;
use http::header::{AUTHORIZATION, COOKIE, SET_COOKIE};
use http::StatusCode;
use tower_http::sensitive_headers::SetSensitiveHeadersLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub fn build_router(state: AppState) -> Router<()> {
    let media_root = state.service().media().root().to_path_buf();
    let media_prefix = state.service().media().public_prefix().to_string();
    let max_upload_bytes = state.config().media.max_upload_bytes;

    Router::new()
        // -- INSERT ROUTES HERE --
        .nest("/api/v1", api_router())
        // media files, read-only
        .nest_service(&media_prefix, ServeDir::new(media_root))
        // utility
        .fallback(not_found)
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(SetSensitiveHeadersLayer::new([
            AUTHORIZATION,
            COOKIE,
            SET_COOKIE,
        ]))
}

fn api_router() -> Router<AppState> {
    Router::new()
        // session group
        //  POST /auth/login
        // This is the only mutating route which does not require a session.
        .route("/auth/login", post(auth::login))
        //  GET /auth/check
        .route("/auth/check", get(auth::check))
        //  POST /auth/logout
        .route("/auth/logout", post(auth::logout))
        // route configuration group
        //  GET /config?route=
        //  POST /config
        .route("/config", get(config::get).post(config::update))
        // media tree group
        //  GET /folders?year=&route=
        .route("/folders", get(folders::list))
        //  GET /images?folder=&route=&all=
        .route("/images", get(images::list))
        //  POST /images/meta
        .route("/images/meta", post(images::meta))
        //  DELETE /images/:id
        .route("/images/:id", delete(images::delete))
        //  POST /upload
        .route("/upload", post(upload::upload))
        // viewer group
        //  GET /routes/:route/playlist
        .route("/routes/:route/playlist", get(playlist::get))
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "no such route")
}
