use rust_decimal::Decimal;
use serde_json::json;

use crate::suggestions::config::MarginConfig;
use crate::suggestions::models::CandidateSuggestion;
use crate::suggestions::snapshot::ProductSnapshot;
use crate::suggestions::types::{Priority, SubjectRef, SuggestionType};

/// Flags products selling below the margin floor. Margin is
/// `(price - unit_cost) / price`; products without a positive price are
/// skipped since the ratio is undefined for them. A negative margin means
/// every sale loses money and is escalated to critical.
pub fn evaluate(products: &[ProductSnapshot], config: &MarginConfig) -> Vec<CandidateSuggestion> {
    let mut candidates = Vec::new();

    for product in products {
        if product.price <= Decimal::ZERO {
            continue;
        }
        let margin = (product.price - product.unit_cost) / product.price;
        if margin >= config.floor {
            continue;
        }

        let priority = if margin < Decimal::ZERO {
            Priority::Critical
        } else if margin < config.floor / Decimal::TWO {
            Priority::High
        } else {
            Priority::Medium
        };

        let margin_pct = (margin * Decimal::ONE_HUNDRED).round_dp(1);
        let floor_pct = (config.floor * Decimal::ONE_HUNDRED).round_dp(1);
        candidates.push(CandidateSuggestion::new(
            SuggestionType::MarginAlert,
            SubjectRef::Product(product.product_id),
            priority,
            format!(
                "Margin on '{}' (SKU {}) is {}%, below the {}% floor",
                product.name, product.sku, margin_pct, floor_pct
            ),
            json!({
                "price": product.price,
                "unit_cost": product.unit_cost,
                "margin": margin.round_dp(4),
                "floor": config.floor,
            }),
        ));
    }

    candidates
}
