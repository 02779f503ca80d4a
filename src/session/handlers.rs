use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::{stream, Stream, StreamExt};
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{info, instrument, warn};

use super::types::{
    AnswerOutcome, AnswerRequest, FinalResult, LeaveOutcome, OptionAnswerRequest,
    ParticipantRequest, QuestionView, SkipOutcome,
};
use crate::event::RoomEvent;
use crate::shared::{AppError, AppState};

/// HTTP handler for starting a room's game
///
/// POST /rooms/:room_id/start
#[instrument(name = "start_session", skip(state))]
pub async fn start_session(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Json(request): Json<ParticipantRequest>,
) -> Result<Json<QuestionView>, AppError> {
    let view = state
        .session_service
        .start_session(&room_id, request.participant_id)
        .await?;
    Ok(Json(view))
}

/// GET /rooms/:room_id/question
#[instrument(name = "current_question", skip(state))]
pub async fn current_question(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Result<Json<Option<QuestionView>>, AppError> {
    let view = state.session_service.current_question_view(&room_id).await?;
    Ok(Json(view))
}

/// HTTP handler for a free-text answer
///
/// POST /rooms/:room_id/answer
#[instrument(name = "answer", skip(state))]
pub async fn answer(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Json(request): Json<AnswerRequest>,
) -> Result<Json<AnswerOutcome>, AppError> {
    let outcome = state
        .session_service
        .answer(
            &room_id,
            request.participant_id,
            &request.answer,
            request.elapsed_ms.map(Duration::from_millis),
        )
        .await?;

    info!(
        is_correct = outcome.answer.is_correct,
        points = outcome.answer.points,
        "Answer handled"
    );
    Ok(Json(outcome))
}

/// HTTP handler for an option-button answer
///
/// POST /rooms/:room_id/answer_option
#[instrument(name = "answer_option", skip(state))]
pub async fn answer_option(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Json(request): Json<OptionAnswerRequest>,
) -> Result<Json<AnswerOutcome>, AppError> {
    let outcome = state
        .session_service
        .answer_option(&room_id, request.participant_id, request.payload)
        .await?;
    Ok(Json(outcome))
}

/// POST /rooms/:room_id/skip
#[instrument(name = "skip_question", skip(state))]
pub async fn skip_question(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Json(request): Json<ParticipantRequest>,
) -> Result<Json<SkipOutcome>, AppError> {
    let outcome = state
        .session_service
        .skip_question(&room_id, request.participant_id)
        .await?;
    Ok(Json(outcome))
}

/// POST /rooms/:room_id/leave
#[instrument(name = "leave_room", skip(state))]
pub async fn leave(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Json(request): Json<ParticipantRequest>,
) -> Result<Json<LeaveOutcome>, AppError> {
    let outcome = state
        .session_service
        .leave(&room_id, request.participant_id)
        .await?;
    Ok(Json(outcome))
}

/// POST /rooms/:room_id/finalize
#[instrument(name = "finalize", skip(state))]
pub async fn finalize(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Result<Json<FinalResult>, AppError> {
    let result = state.session_service.finalize(&room_id).await?;
    Ok(Json(result))
}

/// Server-sent stream of a room's events, ending when the room closes
///
/// GET /rooms/:room_id/events
#[instrument(name = "room_events", skip(state))]
pub async fn room_events(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let receiver = subscribe_live(&state, &room_id).await?;
    info!(room_id = %room_id, "Event stream opened");

    let events = stream::unfold(receiver, move |mut receiver| async move {
        loop {
            match receiver.recv().await {
                Ok(event) => return Some((event, receiver)),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Event stream lagging, events dropped");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    })
    .map(|event| Ok(to_sse_event(&event)));

    Ok(Sse::new(events).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    ))
}

/// Subscribes to a room's events, failing if the room is already gone
///
/// Rooms leave the registry before their terminal event is emitted, so a
/// subscription taken while the room is still registered always sees the
/// channel close.
async fn subscribe_live(
    state: &AppState,
    room_id: &str,
) -> Result<broadcast::Receiver<RoomEvent>, AppError> {
    let receiver = state.event_bus.subscribe_to_room(room_id).await;

    if state.room_repository.room_handle(room_id).await.is_none() {
        // The room closed before the subscription landed
        state.event_bus.close_room(room_id).await;
        return Err(AppError::NotFound(format!("Room {room_id}")));
    }

    // Attaching a transport counts as activity
    state.room_repository.update_last_activity(room_id).await?;
    Ok(receiver)
}

fn to_sse_event(event: &RoomEvent) -> Event {
    Event::default()
        .event(event.event_type())
        .json_data(event)
        .unwrap_or_else(|_| Event::default().comment("unserializable event"))
}
