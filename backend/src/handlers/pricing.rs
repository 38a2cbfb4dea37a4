//! HTTP handler for the live pricing preview

use axum::{extract::State, Json};

use crate::middleware::CurrentUser;
use crate::services::pricing::{self, PricingPreview, PricingPreviewInput};
use crate::AppState;

/// Price a draft recipe without saving it
pub async fn preview_pricing(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Json(input): Json<PricingPreviewInput>,
) -> Json<PricingPreview> {
    let config = &state.config.pricing;
    Json(pricing::preview(
        &input,
        config.default_hourly_rate,
        &config.currency,
    ))
}
