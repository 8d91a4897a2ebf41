use serde_json::json;

use crate::suggestions::config::TrendConfig;
use crate::suggestions::models::CandidateSuggestion;
use crate::suggestions::snapshot::{ActivityWindow, ProductSnapshot};
use crate::suggestions::types::{Priority, SubjectRef, SuggestionType};

/// Compares the current sales window against the one before it and flags
/// swings past the configured threshold, upward or downward. Products whose
/// prior window moved fewer than `min_prior_units` are skipped: against a
/// near-zero base every ratio looks dramatic.
pub fn evaluate(
    products: &[ProductSnapshot],
    config: &TrendConfig,
    window: &ActivityWindow,
) -> Vec<CandidateSuggestion> {
    let mut candidates = Vec::new();

    for product in products {
        if product.units_prior < config.min_prior_units {
            continue;
        }
        let change = (product.units_current - product.units_prior) as f64
            / product.units_prior as f64;

        let suggestion_type = if change >= config.threshold_pct {
            SuggestionType::TrendUp
        } else if change <= -config.threshold_pct {
            SuggestionType::TrendDown
        } else {
            continue;
        };

        let priority = if change.abs() >= config.threshold_pct * 2.0 {
            Priority::High
        } else {
            Priority::Medium
        };

        let direction = if change > 0.0 { "up" } else { "down" };
        candidates.push(CandidateSuggestion::new(
            suggestion_type,
            SubjectRef::Product(product.product_id),
            priority,
            format!(
                "Sales of '{}' (SKU {}) are {} {:.0}% on the previous {} days",
                product.name,
                product.sku,
                direction,
                change.abs() * 100.0,
                window.lookback_days
            ),
            json!({
                "units_current": product.units_current,
                "units_prior": product.units_prior,
                "change_pct": change,
                "window_days": window.lookback_days,
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

    fn config() -> TrendConfig {
        TrendConfig {
            threshold_pct: 0.30,
            min_prior_units: 5,
        }
    }

    fn window_30d() -> ActivityWindow {
        ActivityWindow::ending_at(Utc::now(), 30)
    }

    #[test]
    fn surge_past_threshold_trends_up() {
        let mut p = product("Cold brew kit", "CB-01");
        p.units_prior = 100;
        p.units_current = 140;

        let out = evaluate(&[p], &config(), &window_30d());

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].suggestion_type, SuggestionType::TrendUp);
        assert_eq!(out[0].priority, Priority::Medium);
    }

    #[test]
    fn doubling_escalates_to_high() {
        let mut p = product("Cold brew kit", "CB-01");
        p.units_prior = 100;
        p.units_current = 200;

        let out = evaluate(&[p], &config(), &window_30d());

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].suggestion_type, SuggestionType::TrendUp);
        assert_eq!(out[0].priority, Priority::High);
    }

    #[test]
    fn collapse_past_threshold_trends_down() {
        let mut p = product("Mocha pot", "MP-03");
        p.units_prior = 100;
        p.units_current = 60;

        let out = evaluate(&[p], &config(), &window_30d());

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].suggestion_type, SuggestionType::TrendDown);
        assert_eq!(out[0].priority, Priority::Medium);
    }

    #[test]
    fn steep_collapse_is_high() {
        let mut p = product("Mocha pot", "MP-03");
        p.units_prior = 100;
        p.units_current = 30;

        let out = evaluate(&[p], &config(), &window_30d());

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].suggestion_type, SuggestionType::TrendDown);
        assert_eq!(out[0].priority, Priority::High);
    }

    #[test]
    fn threshold_is_inclusive_both_ways() {
        let mut up = product("Cold brew kit", "CB-01");
        up.units_prior = 100;
        up.units_current = 130;

        let mut down = product("Mocha pot", "MP-03");
        down.units_prior = 100;
        down.units_current = 70;

        let out = evaluate(&[up, down], &config(), &window_30d());

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].suggestion_type, SuggestionType::TrendUp);
        assert_eq!(out[1].suggestion_type, SuggestionType::TrendDown);
    }

    #[test]
    fn ordinary_wobble_stays_quiet() {
        let mut p = product("Cold brew kit", "CB-01");
        p.units_prior = 100;
        p.units_current = 120;

        let out = evaluate(&[p], &config(), &window_30d());

        assert!(out.is_empty());
    }

    #[test]
    fn tiny_prior_volume_is_ignored() {
        let mut p = product("Niche grinder", "NG-09");
        p.units_prior = 2;
        p.units_current = 10;

        let out = evaluate(&[p], &config(), &window_30d());

        assert!(out.is_empty());
    }
}
