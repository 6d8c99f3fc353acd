use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Quizbox Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::game::get_game_state,
        crate::routes::player::join,
        crate::routes::player::buzz,
        crate::routes::player::submit_answer,
        crate::routes::player::mark_spoken,
        crate::routes::player::get_player_summary,
        crate::routes::admin::list_sessions,
        crate::routes::admin::create_session,
        crate::routes::admin::get_session,
        crate::routes::admin::delete_session,
        crate::routes::admin::start_game,
        crate::routes::admin::show_options,
        crate::routes::admin::reveal,
        crate::routes::admin::next_question,
        crate::routes::admin::soft_reset,
        crate::routes::admin::full_reset,
        crate::routes::admin::update_questions,
        crate::routes::admin::answer_stats,
        crate::routes::admin::save_session,
        crate::routes::admin::load_session,
        crate::routes::admin::list_snapshots,
        crate::routes::admin::delete_snapshot,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::phase::VisiblePhase,
            crate::dto::game::GameSnapshot,
            crate::dto::game::GameStateView,
            crate::dto::game::QuestionView,
            crate::dto::game::BuzzerView,
            crate::dto::game::AnswerView,
            crate::dto::game::PlayerView,
            crate::dto::player::JoinRequest,
            crate::dto::player::JoinResponse,
            crate::dto::player::BuzzRequest,
            crate::dto::player::BuzzResponse,
            crate::dto::player::AnswerRequest,
            crate::dto::player::AnswerResponse,
            crate::dto::player::SpokenRequest,
            crate::dto::player::SpokenResponse,
            crate::dto::player::RejectReason,
            crate::dto::player::PlayerSummaryResponse,
            crate::dto::player::SummaryLine,
            crate::dto::admin::CreateSessionRequest,
            crate::dto::admin::SessionSummary,
            crate::dto::admin::TransitionResponse,
            crate::dto::admin::AdvanceRequest,
            crate::dto::admin::QuestionInput,
            crate::dto::admin::UpdateQuestionsRequest,
            crate::dto::admin::QuestionsUpdatedResponse,
            crate::dto::admin::AnswerStatsResponse,
            crate::dto::admin::SaveSessionRequest,
            crate::dto::admin::LoadSessionRequest,
            crate::dto::admin::SnapshotInfo,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "game", description = "Polled game state"),
        (name = "player", description = "Player join and in-game actions"),
        (name = "admin", description = "Session management and game flow"),
    )
)]
pub struct ApiDoc;
