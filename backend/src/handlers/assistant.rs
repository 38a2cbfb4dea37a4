//! HTTP handler for the business assistant

use axum::{extract::State, Json};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::assistant::{ChatInput, ChatReply};
use crate::AppState;

pub async fn chat(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<ChatInput>,
) -> AppResult<Json<ChatReply>> {
    let reply = state
        .assistant_service()?
        .chat(current_user.0.business_id, input)
        .await?;
    Ok(Json(reply))
}
