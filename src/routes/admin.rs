use axum::{
    Extension, Json, Router,
    body::{Body, Bytes},
    extract::{Path, Query, State},
    http::Request,
    middleware::{self, Next},
    response::Response,
    routing::{delete, post, put},
};
use axum_valid::Valid;

use crate::{
    dto::{
        players::{
            PhoneRequest, PhoneResponse, RenamePlayerRequest, RenamePlayerResponse,
            RenamePreviewRequest, RenamePreviewResponse,
        },
        results::{ClearResultsResponse, ConfirmQuery},
        schedule::ScheduleUploadResponse,
    },
    error::AppError,
    routes::extract::SESSION_HEADER,
    services::{auth_service, player_service, rename_service, result_service, schedule_loader},
    state::{SharedState, session::Session},
};

/// Admin-only maintenance endpoints: result removal, schedule upload and player directory.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route("/admin/results", delete(delete_all_results))
        .route("/admin/results/{match_id}", delete(delete_result))
        .route("/admin/schedule", post(upload_schedule))
        .route("/admin/players/rename", post(rename_player))
        .route("/admin/players/rename/preview", post(preview_rename))
        .route("/admin/players/{name}/phone", put(set_phone))
        .route_layer(middleware::from_fn_with_state(state, require_admin_session))
}

/// Remove the result of one match.
#[utoipa::path(
    delete,
    path = "/admin/results/{match_id}",
    tag = "admin",
    params(
        ("x-session-token" = String, Header, description = "Admin session token"),
        ("match_id" = String, Path, description = "Match whose result is removed"),
        ConfirmQuery
    ),
    responses(
        (status = 200, description = "Result deleted", body = ClearResultsResponse),
        (status = 404, description = "No result to delete"),
        (status = 428, description = "Confirmation required")
    )
)]
pub async fn delete_result(
    State(state): State<SharedState>,
    Extension(session): Extension<Session>,
    Path(match_id): Path<String>,
    Query(query): Query<ConfirmQuery>,
) -> Result<Json<ClearResultsResponse>, AppError> {
    let store = state.guarded_store(&session).await?;
    Ok(Json(
        result_service::delete_result(&store, &match_id, query.confirm).await?,
    ))
}

/// Remove every recorded result.
#[utoipa::path(
    delete,
    path = "/admin/results",
    tag = "admin",
    params(
        ("x-session-token" = String, Header, description = "Admin session token"),
        ConfirmQuery
    ),
    responses(
        (status = 200, description = "All results deleted", body = ClearResultsResponse),
        (status = 428, description = "Confirmation required"),
        (status = 500, description = "Failed after some batches were committed")
    )
)]
pub async fn delete_all_results(
    State(state): State<SharedState>,
    Extension(session): Extension<Session>,
    Query(query): Query<ConfirmQuery>,
) -> Result<Json<ClearResultsResponse>, AppError> {
    let store = state.guarded_store(&session).await?;
    Ok(Json(
        result_service::delete_all_results(&store, query.confirm).await?,
    ))
}

/// Replace the schedule with the uploaded JSON array and clear every result.
#[utoipa::path(
    post,
    path = "/admin/schedule",
    tag = "admin",
    params(
        ("x-session-token" = String, Header, description = "Admin session token"),
        ConfirmQuery
    ),
    request_body(content = Vec<crate::dto::schedule::ScheduleEntry>, description = "Schedule file", content_type = "application/json"),
    responses(
        (status = 200, description = "Schedule uploaded", body = ScheduleUploadResponse),
        (status = 400, description = "Invalid JSON or not an array"),
        (status = 428, description = "Confirmation required")
    )
)]
pub async fn upload_schedule(
    State(state): State<SharedState>,
    Extension(session): Extension<Session>,
    Query(query): Query<ConfirmQuery>,
    body: Bytes,
) -> Result<Json<ScheduleUploadResponse>, AppError> {
    let store = state.guarded_store(&session).await?;
    Ok(Json(
        schedule_loader::load(&store, &body, query.confirm).await?,
    ))
}

/// Rename a player in every match.
#[utoipa::path(
    post,
    path = "/admin/players/rename",
    tag = "admin",
    params(("x-session-token" = String, Header, description = "Admin session token")),
    request_body = RenamePlayerRequest,
    responses(
        (status = 200, description = "Rename applied", body = RenamePlayerResponse),
        (status = 428, description = "Confirmation required"),
        (status = 500, description = "Failed after some batches were committed")
    )
)]
pub async fn rename_player(
    State(state): State<SharedState>,
    Extension(session): Extension<Session>,
    Valid(Json(payload)): Valid<Json<RenamePlayerRequest>>,
) -> Result<Json<RenamePlayerResponse>, AppError> {
    let store = state.guarded_store(&session).await?;
    Ok(Json(rename_service::rename_player(&store, &payload).await?))
}

/// List the matches a rename would touch.
#[utoipa::path(
    post,
    path = "/admin/players/rename/preview",
    tag = "admin",
    params(("x-session-token" = String, Header, description = "Admin session token")),
    request_body = RenamePreviewRequest,
    responses((status = 200, description = "Affected matches", body = RenamePreviewResponse))
)]
pub async fn preview_rename(
    State(state): State<SharedState>,
    Extension(session): Extension<Session>,
    Valid(Json(payload)): Valid<Json<RenamePreviewRequest>>,
) -> Result<Json<RenamePreviewResponse>, AppError> {
    let store = state.guarded_store(&session).await?;
    Ok(Json(rename_service::preview(&store, &payload).await?))
}

/// Set, replace or clear a player's phone.
#[utoipa::path(
    put,
    path = "/admin/players/{name}/phone",
    tag = "admin",
    params(
        ("x-session-token" = String, Header, description = "Admin session token"),
        ("name" = String, Path, description = "Player display name")
    ),
    request_body = PhoneRequest,
    responses(
        (status = 200, description = "Phone updated", body = PhoneResponse),
        (status = 428, description = "Confirmation required to clear the phone")
    )
)]
pub async fn set_phone(
    State(state): State<SharedState>,
    Extension(session): Extension<Session>,
    Path(name): Path<String>,
    Json(payload): Json<PhoneRequest>,
) -> Result<Json<PhoneResponse>, AppError> {
    let store = state.guarded_store(&session).await?;
    Ok(Json(
        player_service::set_phone(&store, &name, &payload).await?,
    ))
}

async fn require_admin_session(
    State(state): State<SharedState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_owned())
        .ok_or_else(|| {
            AppError::Unauthorized(format!("missing session header `{SESSION_HEADER}`"))
        })?;

    match auth_service::resolve(&state, Some(&token)) {
        Some(session) if session.role.is_admin() => {
            req.extensions_mut().insert(session);
            Ok(next.run(req).await)
        }
        Some(_) => Err(AppError::Unauthorized("admin privileges required".into())),
        None => Err(AppError::Unauthorized("unknown or expired session".into())),
    }
}
