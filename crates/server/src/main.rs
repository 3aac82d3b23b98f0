use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use server_api::{
    authenticate_guest, create_guest, ensure_admin, get_guest_by_user_name, list_guests,
    update_guest, ApiContext, TokenConfig,
};
use shared::{
    domain::GuestId,
    error::{ApiError, ErrorCode},
    protocol::{AuthRequest, AuthResponse, Guest, GuestUpdate, NewGuest},
};
use storage::Storage;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod app_state;
mod config;

use app_state::AppState;
use config::{load_settings, prepare_database_url};

const MAX_BODY_BYTES: usize = 64 * 1024;

type HttpError = (StatusCode, Json<ApiError>);

#[derive(Debug, Deserialize)]
struct GuestQuery {
    user_name: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = load_settings();
    let secret = settings.require_jwt_secret()?;
    let database_url = prepare_database_url(&settings.database_url)?;
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;
    let api = ApiContext::new(
        storage,
        TokenConfig {
            secret,
            ttl_seconds: settings.token_ttl_seconds,
        },
    );

    match settings.admin_password.as_deref().filter(|p| !p.is_empty()) {
        Some(password) => {
            ensure_admin(&api, password).await?;
        }
        None => warn!("no admin password configured; skipping admin bootstrap"),
    }

    let app = build_router(Arc::new(AppState { api }));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server stopped");
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/auth", post(http_authenticate))
        .route("/guests", get(http_get_guests).post(http_create_guest))
        .route("/guests/:id", put(http_update_guest));

    Router::new()
        .route("/healthz", get(healthz))
        .nest("/api", api)
        .layer(cors_layer())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .max_age(Duration::from_secs(60 * 60))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            error!(%error, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
        info!("received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("received terminate signal, shutting down");
            }
            Err(error) => {
                error!(%error, "failed to install terminate handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

async fn healthz(State(state): State<Arc<AppState>>) -> Result<&'static str, HttpError> {
    state.api.storage.health_check().await.map_err(|e| {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiError::new(ErrorCode::Internal, e.to_string())),
        )
    })?;
    Ok("ok")
}

async fn http_authenticate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AuthRequest>,
) -> Result<Json<AuthResponse>, HttpError> {
    let auth = authenticate_guest(&state.api, &req)
        .await
        .map_err(to_http)?;
    Ok(Json(auth))
}

async fn http_get_guests(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(q): Query<GuestQuery>,
) -> Result<Response, HttpError> {
    let authorization = authorization_header(&headers);
    match q.user_name {
        Some(user_name) => {
            let guest = get_guest_by_user_name(&state.api, authorization, &user_name)
                .await
                .map_err(to_http)?;
            Ok(Json(guest).into_response())
        }
        None => {
            let guests = list_guests(&state.api, authorization)
                .await
                .map_err(to_http)?;
            Ok(Json(guests).into_response())
        }
    }
}

async fn http_create_guest(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<NewGuest>,
) -> Result<Json<Guest>, HttpError> {
    let guest = create_guest(&state.api, authorization_header(&headers), req)
        .await
        .map_err(to_http)?;
    Ok(Json(guest))
}

async fn http_update_guest(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<GuestUpdate>,
) -> Result<Json<Guest>, HttpError> {
    let guest = update_guest(
        &state.api,
        authorization_header(&headers),
        &GuestId(id),
        req,
    )
    .await
    .map_err(to_http)?;
    Ok(Json(guest))
}

fn authorization_header(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
}

fn to_http(err: ApiError) -> HttpError {
    let status = match err.code {
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::Forbidden => StatusCode::FORBIDDEN,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::Conflict => StatusCode::CONFLICT,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        error!(message = %err.message, "request failed");
    }
    (status, Json(err))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
