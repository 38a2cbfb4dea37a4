//! Business assistant: answers free-text questions with the business
//! context snapshot as background

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use shared::{currency, BusinessSnapshot};
use uuid::Uuid;
use validator::Validate;

use crate::error::AppResult;
use crate::external::TextCompletion;
use crate::services::ContextService;

#[derive(Clone)]
pub struct AssistantService {
    context: ContextService,
    completion: Arc<dyn TextCompletion>,
    currency: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChatInput {
    #[validate(length(min = 1, max = 4000, message = "Message must be between 1 and 4000 characters"))]
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub reply: String,
    pub snapshot: BusinessSnapshot,
}

/// Describe the snapshot for the model
pub fn build_system_prompt(snapshot: &BusinessSnapshot, currency_code: &str) -> String {
    let mut prompt = String::from(
        "You are a helpful assistant for a small business owner. \
         Answer briefly and practically using the business figures below.\n\n",
    );

    if snapshot.products_available {
        prompt.push_str(&format!(
            "Products: {}\nAverage profit margin: {}%\n",
            snapshot.total_products, snapshot.avg_margin_percent
        ));
    } else {
        prompt.push_str("Products: unavailable\n");
    }

    if snapshot.inventory_available {
        prompt.push_str(&format!(
            "Inventory items: {}\nItems at or below their low-stock alert: {}\nInventory value at cost: {}\n",
            snapshot.total_inventory_items,
            snapshot.low_stock_items,
            currency::format(snapshot.inventory_value, currency_code)
        ));
    } else {
        prompt.push_str("Inventory: unavailable\n");
    }

    prompt
}

impl AssistantService {
    pub fn new(
        context: ContextService,
        completion: Arc<dyn TextCompletion>,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            context,
            completion,
            currency: currency.into(),
        }
    }

    pub async fn chat(&self, business_id: Uuid, input: ChatInput) -> AppResult<ChatReply> {
        input.validate()?;

        let snapshot = self.context.get_snapshot(business_id).await;
        let system_prompt = build_system_prompt(&snapshot, &self.currency);

        let reply = self
            .completion
            .complete(&system_prompt, input.message.trim())
            .await?;

        tracing::debug!(business_id = %business_id, "Assistant replied");
        Ok(ChatReply { reply, snapshot })
    }
}
