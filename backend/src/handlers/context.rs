//! HTTP handler for the business context snapshot

use axum::{extract::State, Json};
use shared::BusinessSnapshot;

use crate::middleware::CurrentUser;
use crate::AppState;

/// Dashboard summary; degrades instead of failing
pub async fn get_snapshot(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> Json<BusinessSnapshot> {
    Json(
        state
            .context_service()
            .get_snapshot(current_user.0.business_id)
            .await,
    )
}
