use serde_json::json;

use crate::suggestions::models::CandidateSuggestion;
use crate::suggestions::snapshot::ProductSnapshot;
use crate::suggestions::types::{Priority, SubjectRef, SuggestionType};

/// Flags active, sellable products with no available stock. Always critical:
/// an item customers can order but the warehouse cannot ship loses the sale
/// outright, regardless of how fast it was moving.
pub fn evaluate(products: &[ProductSnapshot]) -> Vec<CandidateSuggestion> {
    let mut candidates = Vec::new();

    for product in products {
        if !product.is_active || !product.is_sellable {
            continue;
        }
        let available = product.available();
        if available > 0 {
            continue;
        }

        candidates.push(CandidateSuggestion::new(
            SuggestionType::StockoutAlert,
            SubjectRef::Product(product.product_id),
            Priority::Critical,
            format!(
                "'{}' (SKU {}) is listed for sale but has no available stock",
                product.name, product.sku
            ),
            json!({
                "available": available,
                "on_hand": product.on_hand,
                "reserved": product.reserved,
            }),
        ));
    }

    candidates
}
