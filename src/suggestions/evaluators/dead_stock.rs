use chrono::{DateTime, Utc};
use serde_json::json;

use crate::suggestions::config::DeadStockConfig;
use crate::suggestions::models::CandidateSuggestion;
use crate::suggestions::snapshot::ProductSnapshot;
use crate::suggestions::types::{Priority, SubjectRef, SuggestionType};

/// Flags products sitting on stock that has not sold for the configured
/// number of days. Products that never sold fall back to their creation
/// date, so a freshly listed item gets its grace period before it counts
/// as dead. Long idle spells or a lot of tied-up value raise the priority.
pub fn evaluate(
    products: &[ProductSnapshot],
    config: &DeadStockConfig,
    now: DateTime<Utc>,
) -> Vec<CandidateSuggestion> {
    let mut candidates = Vec::new();

    for product in products {
        if product.on_hand <= 0 {
            continue;
        }
        let idle_since = product.last_sale_at.unwrap_or(product.created_at);
        let idle_days = (now - idle_since).num_days();
        if idle_days < config.stale_days {
            continue;
        }

        let tied_up = product.inventory_value();
        let priority = if idle_days >= config.stale_days * 2 || tied_up >= config.high_value {
            Priority::High
        } else {
            Priority::Medium
        };

        candidates.push(CandidateSuggestion::new(
            SuggestionType::DeadStock,
            SubjectRef::Product(product.product_id),
            priority,
            format!(
                "'{}' (SKU {}) has not sold in {} days, with {} units worth {} on hand",
                product.name,
                product.sku,
                idle_days,
                product.on_hand,
                tied_up.round_dp(2)
            ),
            json!({
                "idle_days": idle_days,
                "on_hand": product.on_hand,
                "inventory_value": tied_up,
                "last_sale_at": product.last_sale_at,
            }),
        ));
    }

    candidates
}
