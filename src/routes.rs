use axum::{
    Json, Router,
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

use crate::{
    error::ApiError,
    extract::{ApiJson, ApiPath},
    image_input::{accept_upload, ImageInputError},
    models::{OccasionRequest, Presets, Profile, RefineRequest},
    orchestrator::Orchestrator,
    view::Snapshot,
};

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Orchestrator,
    pub max_upload_bytes: usize,
}

type ApiResult = Result<Json<Snapshot>, ApiError>;

pub fn router(state: AppState) -> Router {
    // multipart framing on top of the raw file
    let body_limit = state.max_upload_bytes + 64 * 1024;
    Router::new()
        .route("/health", get(health))
        .route("/api/presets", get(presets))
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id", get(get_session).delete(delete_session))
        .route("/api/sessions/:id/image", post(upload_image))
        .route("/api/sessions/:id/occasion", post(submit_occasion))
        .route("/api/sessions/:id/suggestions/skip", post(skip_suggestions))
        .route("/api/sessions/:id/suggestions/:index", post(choose_suggestion))
        .route("/api/sessions/:id/profile", post(submit_profile))
        .route("/api/sessions/:id/looks/next", post(next_look))
        .route("/api/sessions/:id/looks/prev", post(prev_look))
        .route("/api/sessions/:id/looks/refine/open", post(open_refine))
        .route("/api/sessions/:id/looks/refine", post(refine_look))
        .route("/api/sessions/:id/looks/accessorize", post(accessorize))
        .route("/api/sessions/:id/looks/panel/close", post(close_panel))
        .route("/api/sessions/:id/reset", post(reset))
        .layer(
            ServiceBuilder::new()
                .layer(DefaultBodyLimit::max(body_limit))
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any)
                )
        )
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn presets() -> Json<Presets> {
    Json(Presets::default())
}

async fn create_session(State(state): State<AppState>) -> (StatusCode, Json<Snapshot>) {
    (StatusCode::CREATED, Json(state.orchestrator.create_session()))
}

async fn get_session(ApiPath(id): ApiPath<Uuid>, State(state): State<AppState>) -> ApiResult {
    state.orchestrator.snapshot(id).map(Json)
}

async fn delete_session(ApiPath(id): ApiPath<Uuid>, State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    state.orchestrator.delete_session(id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn upload_image(ApiPath(id): ApiPath<Uuid>, State(state): State<AppState>, multipart: Result<Multipart, MultipartRejection>) -> ApiResult {
    // reject unknown sessions before reading the body
    state.orchestrator.snapshot(id)?;
    let mut multipart = multipart?;
    while let Some(field) = multipart.next_field().await.map_err(|e| ApiError::BadRequest(e.to_string()))? {
        if field.name() != Some("file") {
            continue;
        }
        let content_type = field.content_type().map(str::to_owned);
        let bytes: bytes::Bytes = field.bytes().await.map_err(|e| ApiError::BadRequest(e.to_string()))?;
        let image = accept_upload(content_type.as_deref(), &bytes, state.max_upload_bytes)?;
        return state.orchestrator.upload_image(id, image).map(Json);
    }
    Err(ImageInputError::Missing.into())
}

async fn submit_occasion(ApiPath(id): ApiPath<Uuid>, State(state): State<AppState>, ApiJson(body): ApiJson<OccasionRequest>) -> ApiResult {
    tracing::info!("🚀 Session {} occasion: {}", id, body.occasion);
    state.orchestrator.submit_occasion(id, &body.occasion).map(Json)
}

async fn choose_suggestion(ApiPath((id, index)): ApiPath<(Uuid, usize)>, State(state): State<AppState>) -> ApiResult {
    state.orchestrator.choose_suggestion(id, index).map(Json)
}

async fn skip_suggestions(ApiPath(id): ApiPath<Uuid>, State(state): State<AppState>) -> ApiResult {
    state.orchestrator.skip_suggestions(id).map(Json)
}

async fn submit_profile(ApiPath(id): ApiPath<Uuid>, State(state): State<AppState>, ApiJson(profile): ApiJson<Profile>) -> ApiResult {
    tracing::info!("🚀 Session {} generating looks (vibe '{}')", id, profile.vibe);
    state.orchestrator.submit_profile(id, profile).map(Json)
}

async fn next_look(ApiPath(id): ApiPath<Uuid>, State(state): State<AppState>) -> ApiResult {
    state.orchestrator.next_look(id).map(Json)
}

async fn prev_look(ApiPath(id): ApiPath<Uuid>, State(state): State<AppState>) -> ApiResult {
    state.orchestrator.prev_look(id).map(Json)
}

async fn open_refine(ApiPath(id): ApiPath<Uuid>, State(state): State<AppState>) -> ApiResult {
    state.orchestrator.open_refine(id).map(Json)
}

async fn refine_look(ApiPath(id): ApiPath<Uuid>, State(state): State<AppState>, ApiJson(body): ApiJson<RefineRequest>) -> ApiResult {
    state.orchestrator.refine_look(id, &body.instruction).map(Json)
}

async fn accessorize(ApiPath(id): ApiPath<Uuid>, State(state): State<AppState>) -> ApiResult {
    state.orchestrator.accessorize(id).map(Json)
}

async fn close_panel(ApiPath(id): ApiPath<Uuid>, State(state): State<AppState>) -> ApiResult {
    state.orchestrator.close_panel(id).map(Json)
}

async fn reset(ApiPath(id): ApiPath<Uuid>, State(state): State<AppState>) -> ApiResult {
    tracing::info!("🔄 Session {} reset", id);
    state.orchestrator.reset(id).map(Json)
}
