use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::question::lookup_sign;
use crate::room;
use crate::scoring::handlers as scoring;
use crate::session::handlers as session;
use crate::shared::AppState;

/// Builds the HTTP API over the shared application state
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/rooms", post(room::create_room).get(room::list_rooms))
        .route("/rooms/join", post(room::join_room))
        .route("/rooms/:room_id", get(room::get_room))
        .route("/rooms/:room_id/start", post(session::start_session))
        .route("/rooms/:room_id/question", get(session::current_question))
        .route("/rooms/:room_id/answer", post(session::answer))
        .route("/rooms/:room_id/answer_option", post(session::answer_option))
        .route("/rooms/:room_id/skip", post(session::skip_question))
        .route("/rooms/:room_id/leave", post(session::leave))
        .route("/rooms/:room_id/finalize", post(session::finalize))
        .route("/rooms/:room_id/events", get(session::room_events))
        .route("/leaderboard", get(scoring::leaderboard))
        .route("/users/:participant_id/rank", get(scoring::user_rank))
        .route("/dictionary/:word", get(lookup_sign))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
