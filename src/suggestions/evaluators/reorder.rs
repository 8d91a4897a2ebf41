use serde_json::json;

use crate::suggestions::config::ReorderConfig;
use crate::suggestions::models::CandidateSuggestion;
use crate::suggestions::snapshot::{ActivityWindow, ProductSnapshot};
use crate::suggestions::types::{Priority, SubjectRef, SuggestionType};

/// Flags sellable products whose remaining stock will not outlast a
/// replenishment cycle.
///
/// Coverage is available stock divided by recent sales velocity; the
/// replenishment window is the supplier lead time stretched by the safety
/// factor. Products already at or below zero availability belong to the
/// stockout rule and are skipped here, as are products with no recent sales.
pub fn evaluate(
    products: &[ProductSnapshot],
    config: &ReorderConfig,
    window: &ActivityWindow,
) -> Vec<CandidateSuggestion> {
    let mut candidates = Vec::new();

    for product in products {
        if !product.is_active || !product.is_sellable {
            continue;
        }
        let available = product.available();
        if available <= 0 {
            continue;
        }
        let velocity = window.velocity_per_day(product.units_current);
        if velocity <= 0.0 {
            continue;
        }
        let replenishment_days = product.lead_time_days as f64 * config.safety_factor;
        if replenishment_days <= 0.0 {
            continue;
        }

        let coverage_days = available as f64 / velocity;
        let ratio = coverage_days / replenishment_days;
        if ratio >= 1.0 {
            continue;
        }

        let priority = if ratio < 0.5 {
            Priority::Critical
        } else {
            Priority::High
        };

        candidates.push(CandidateSuggestion::new(
            SuggestionType::Reorder,
            SubjectRef::Product(product.product_id),
            priority,
            format!(
                "Reorder '{}' (SKU {}): {:.1} days of stock left, resupply takes {:.0} days",
                product.name, product.sku, coverage_days, replenishment_days
            ),
            json!({
                "available": available,
                "velocity_per_day": velocity,
                "coverage_days": coverage_days,
                "replenishment_days": replenishment_days,
                "coverage_ratio": ratio,
            }),
        ));
    }

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suggestions::evaluators::fixtures::product;
    use chrono::Utc;

    fn window_30d() -> ActivityWindow {
        ActivityWindow::ending_at(Utc::now(), 30)
    }

    /// Velocity 10/day, 20 available, 5-day lead: two days of cover against
    /// a five-day resupply gives ratio 0.4, inside the critical band.
    #[test]
    fn low_coverage_is_critical() {
        let mut p = product("Espresso cups", "CUP-01");
        p.units_current = 300;
        p.on_hand = 20;
        p.reserved = 0;
        p.lead_time_days = 5;

        let config = ReorderConfig { safety_factor: 1.0 };
        let out = evaluate(&[p], &config, &window_30d());

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].priority, Priority::Critical);
        assert_eq!(out[0].suggestion_type, SuggestionType::Reorder);
        assert_eq!(out[0].metadata["coverage_ratio"], 0.4);
    }

    #[test]
    fn half_coverage_lands_on_high_band() {
        let mut p = product("Espresso cups", "CUP-01");
        p.units_current = 300;
        p.on_hand = 25;
        p.reserved = 0;
        p.lead_time_days = 5;

        let out = evaluate(&[p], &ReorderConfig { safety_factor: 1.0 }, &window_30d());

        // ratio is exactly 0.5: not below it, so high rather than critical
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].priority, Priority::High);
    }

    #[test]
    fn full_coverage_stays_quiet() {
        let mut p = product("Espresso cups", "CUP-01");
        p.units_current = 300;
        p.on_hand = 50;
        p.reserved = 0;
        p.lead_time_days = 5;

        let out = evaluate(&[p], &ReorderConfig { safety_factor: 1.0 }, &window_30d());

        // ratio is exactly 1.0, the first value that does not fire
        assert!(out.is_empty());
    }

    #[test]
    fn safety_factor_widens_the_window() {
        let mut p = product("Espresso cups", "CUP-01");
        p.units_current = 300;
        p.on_hand = 50;
        p.reserved = 0;
        p.lead_time_days = 5;

        // same stock position as above, but resupply window doubled
        let out = evaluate(&[p], &ReorderConfig { safety_factor: 2.0 }, &window_30d());

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].priority, Priority::Critical);
    }

    #[test]
    fn skips_products_without_sales() {
        let mut p = product("Shelf warmer", "SW-01");
        p.units_current = 0;
        p.on_hand = 3;
        p.reserved = 0;

        let out = evaluate(&[p], &ReorderConfig::default(), &window_30d());

        assert!(out.is_empty());
    }

    #[test]
    fn skips_exhausted_stock() {
        let mut p = product("Espresso cups", "CUP-01");
        p.units_current = 300;
        p.on_hand = 5;
        p.reserved = 5;

        // available is zero: the stockout rule owns this case
        let out = evaluate(&[p], &ReorderConfig::default(), &window_30d());

        assert!(out.is_empty());
    }

    #[test]
    fn skips_inactive_and_unsellable() {
        let mut inactive = product("Retired blend", "RB-01");
        inactive.is_active = false;
        inactive.units_current = 300;
        inactive.on_hand = 2;

        let mut internal = product("Raw beans", "RAW-01");
        internal.is_sellable = false;
        internal.units_current = 300;
        internal.on_hand = 2;

        let out = evaluate(&[inactive, internal], &ReorderConfig::default(), &window_30d());

        assert!(out.is_empty());
    }
}
