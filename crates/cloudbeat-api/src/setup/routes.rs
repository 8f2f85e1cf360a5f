//! Route configuration and setup.

use crate::handlers;
use crate::setup::health;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Room for multipart boundaries and the text fields around the file part.
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Routes that need a caller identity. Both the bare and trailing-slash forms are served.
fn song_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/songs",
            get(handlers::songs::list_songs).post(handlers::songs::upload_song),
        )
        .route(
            "/api/songs/",
            get(handlers::songs::list_songs).post(handlers::songs::upload_song),
        )
        .route(
            "/api/songs/{id}/favourite",
            post(handlers::songs::toggle_favourite),
        )
        .route("/api/songs/{id}/url", get(handlers::songs::get_song_url))
}

fn playlist_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/playlists",
            get(handlers::playlists::list_playlists).post(handlers::playlists::create_playlist),
        )
        .route(
            "/api/playlists/",
            get(handlers::playlists::list_playlists).post(handlers::playlists::create_playlist),
        )
        .route("/api/playlists/{id}", get(handlers::playlists::get_playlist))
        .route(
            "/api/playlists/{id}/songs",
            post(handlers::playlists::add_song),
        )
}

fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(handlers::root::banner))
        .route("/api/auth", get(handlers::root::auth_status))
        .route("/api/auth/", get(handlers::root::auth_status))
        .route("/health", get(health::liveness_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/files/{*key}", get(handlers::public_file::get_public_file))
}

/// Setup all application routes
pub fn setup_routes(state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(&state.config.cors_origins);

    let protected = song_routes().layer(axum::middleware::from_fn_with_state(
        state.clone(),
        crate::auth::middleware::auth_middleware,
    ));

    let body_limit = state
        .config
        .max_upload_size_bytes
        .saturating_add(FORM_OVERHEAD_BYTES);

    let app = public_routes()
        .merge(playlist_routes())
        .merge(protected)
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(DefaultBodyLimit::disable())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}

fn setup_cors(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    if origins.iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        cors.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|o| match o.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        cors.allow_origin(origins)
    }
}
