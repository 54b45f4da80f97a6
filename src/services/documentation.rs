use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the scoreboard backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::scoreboard_stream,
        crate::routes::auth::anonymous,
        crate::routes::auth::sign_in,
        crate::routes::auth::sign_out,
        crate::routes::auth::me,
        crate::routes::public::get_scoreboard,
        crate::routes::public::get_matches,
        crate::routes::public::get_match,
        crate::routes::public::get_standings,
        crate::routes::results::submit_result,
        crate::routes::admin::delete_result,
        crate::routes::admin::delete_all_results,
        crate::routes::admin::upload_schedule,
        crate::routes::admin::rename_player,
        crate::routes::admin::preview_rename,
        crate::routes::admin::set_phone,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::auth::SignInRequest,
            crate::dto::auth::SessionResponse,
            crate::dto::scoreboard::ScoreboardView,
            crate::dto::scoreboard::MatchOption,
            crate::dto::scoreboard::MatchRow,
            crate::dto::scoreboard::MatchStatus,
            crate::dto::scoreboard::StandingRow,
            crate::dto::scoreboard::MatchDetail,
            crate::dto::scoreboard::PreviousResult,
            crate::dto::results::SubmitResultRequest,
            crate::dto::results::SubmitResultResponse,
            crate::dto::results::ClearResultsResponse,
            crate::dto::schedule::ScheduleEntry,
            crate::dto::schedule::ScheduleUploadResponse,
            crate::dto::players::RenamePlayerRequest,
            crate::dto::players::RenamePreviewRequest,
            crate::dto::players::RenamePreviewResponse,
            crate::dto::players::RenameCandidateDto,
            crate::dto::players::RenamePlayerResponse,
            crate::dto::players::PhoneRequest,
            crate::dto::players::PhoneResponse,
            crate::dao::models::TeamSide,
            crate::dao::models::SetScore,
            crate::state::session::Role,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "auth", description = "Anonymous sessions and email sign-in"),
        (name = "public", description = "Read-only scoreboard views"),
        (name = "results", description = "Result submission"),
        (name = "admin", description = "Admin maintenance operations"),
    )
)]
pub struct ApiDoc;
