use serde_json::json;

use crate::suggestions::config::SeasonalConfig;
use crate::suggestions::models::CandidateSuggestion;
use crate::suggestions::snapshot::{ActivityWindow, ProductSnapshot};
use crate::suggestions::types::{Priority, SubjectRef, SuggestionType};

/// Flags products whose current window outsells the same window one year
/// earlier by the configured ratio. A seasonal spike is advance notice, not
/// an emergency, so the priority is capped at medium. Products without a
/// meaningful year-ago baseline are skipped.
pub fn evaluate(
    products: &[ProductSnapshot],
    config: &SeasonalConfig,
    window: &ActivityWindow,
) -> Vec<CandidateSuggestion> {
    let mut candidates = Vec::new();

    for product in products {
        if product.units_year_ago < config.min_baseline_units {
            continue;
        }
        let ratio = product.units_current as f64 / product.units_year_ago as f64;
        if ratio < config.spike_ratio {
            continue;
        }

        let priority = if ratio >= 2.0 {
            Priority::Medium
        } else {
            Priority::Low
        };

        candidates.push(CandidateSuggestion::new(
            SuggestionType::SeasonalPeak,
            SubjectRef::Product(product.product_id),
            priority,
            format!(
                "'{}' (SKU {}) is selling {:.1}x its volume from this time last year",
                product.name, product.sku, ratio
            ),
            json!({
                "units_current": product.units_current,
                "units_year_ago": product.units_year_ago,
                "ratio": ratio,
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

    fn config() -> SeasonalConfig {
        SeasonalConfig {
            spike_ratio: 1.3,
            min_baseline_units: 10,
        }
    }

    fn window_30d() -> ActivityWindow {
        ActivityWindow::ending_at(Utc::now(), 30)
    }

    #[test]
    fn modest_spike_is_low() {
        let mut p = product("Panettone blend", "PB-12");
        p.units_year_ago = 100;
        p.units_current = 140;

        let out = evaluate(&[p], &config(), &window_30d());

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].suggestion_type, SuggestionType::SeasonalPeak);
        assert_eq!(out[0].priority, Priority::Low);
    }

    #[test]
    fn doubled_volume_is_medium_at_most() {
        let mut p = product("Panettone blend", "PB-12");
        p.units_year_ago = 100;
        p.units_current = 250;

        let out = evaluate(&[p], &config(), &window_30d());

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].priority, Priority::Medium);
    }

    #[test]
    fn ratio_below_spike_stays_quiet() {
        let mut p = product("Panettone blend", "PB-12");
        p.units_year_ago = 100;
        p.units_current = 120;

        let out = evaluate(&[p], &config(), &window_30d());

        assert!(out.is_empty());
    }

    #[test]
    fn thin_baseline_is_ignored() {
        let mut p = product("New arrival", "NA-01");
        p.units_year_ago = 4;
        p.units_current = 40;

        let out = evaluate(&[p], &config(), &window_30d());

        assert!(out.is_empty());
    }
}
