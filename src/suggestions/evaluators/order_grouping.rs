use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde_json::json;
use uuid::Uuid;

use crate::suggestions::config::OrderGroupingConfig;
use crate::suggestions::models::CandidateSuggestion;
use crate::suggestions::snapshot::PurchaseDraftSnapshot;
use crate::suggestions::types::{Priority, SubjectRef, SuggestionType};

#[derive(Default)]
struct SupplierDrafts {
    supplier_name: String,
    draft_ids: Vec<Uuid>,
    combined_value: Decimal,
    free_shipping_threshold: Option<Decimal>,
}

/// Spots suppliers with several draft purchase orders whose combined value
/// clears the free-shipping threshold. Sending one order instead of many
/// saves shipping either way; the threshold keeps the nudge to cases where
/// the combined order actually changes the terms.
pub fn evaluate(
    drafts: &[PurchaseDraftSnapshot],
    config: &OrderGroupingConfig,
) -> Vec<CandidateSuggestion> {
    let mut by_supplier: BTreeMap<Uuid, SupplierDrafts> = BTreeMap::new();

    for draft in drafts {
        let entry = by_supplier.entry(draft.supplier_id).or_default();
        entry.supplier_name = draft.supplier_name.clone();
        entry.draft_ids.push(draft.purchase_order_id);
        entry.combined_value += draft.total_value;
        if entry.free_shipping_threshold.is_none() {
            entry.free_shipping_threshold = draft.free_shipping_threshold;
        }
    }

    let mut candidates = Vec::new();

    for (supplier_id, group) in by_supplier {
        if group.draft_ids.len() < 2 {
            continue;
        }
        let threshold = group
            .free_shipping_threshold
            .unwrap_or(config.default_volume_threshold);
        if group.combined_value < threshold {
            continue;
        }

        candidates.push(CandidateSuggestion::new(
            SuggestionType::OrderGrouping,
            SubjectRef::Supplier(supplier_id),
            Priority::Medium,
            format!(
                "Combine {} draft orders to {}: together they reach \u{20ac}{}, past the \u{20ac}{} free-shipping threshold",
                group.draft_ids.len(),
                group.supplier_name,
                group.combined_value.round_dp(2),
                threshold.round_dp(2)
            ),
            json!({
                "draft_count": group.draft_ids.len(),
                "combined_value": group.combined_value,
                "threshold": threshold,
                "purchase_order_ids": group.draft_ids,
            }),
        ));
    }

    candidates
}
