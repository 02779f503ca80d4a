use axum::{
    extract::{Path, State},
    Json,
};
use tracing::{info, instrument};

use super::models::MediaDescriptor;
use crate::shared::{AppError, AppState};

/// HTTP handler for looking up the sign media of a dictionary word
///
/// GET /dictionary/:word
#[instrument(name = "lookup_sign", skip(state))]
pub async fn lookup_sign(
    State(state): State<AppState>,
    Path(word): Path<String>,
) -> Result<Json<MediaDescriptor>, AppError> {
    let media = state
        .question_bank
        .lookup(&word)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Sign for \"{word}\"")))?;

    info!(word = %media.word, "Sign found");
    Ok(Json(media))
}
