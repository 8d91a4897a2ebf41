// Rule evaluators
//
// One module per suggestion category. Every evaluator is a pure function
// over a snapshot slice and its config: no I/O, no clocks other than the
// passed-in window, no calls between evaluators. The orchestrator decides
// which ones run and persists whatever they emit.

pub mod batch_production;
pub mod dead_stock;
pub mod margin;
pub mod order_grouping;
pub mod payment_due;
pub mod reorder;
pub mod seasonal;
pub mod stockout;
pub mod supplier_issue;
pub mod trend;

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{Duration, Utc};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    use crate::suggestions::snapshot::ProductSnapshot;

    /// A healthy product: in stock, selling steadily, decent margin.
    /// Tests tweak the fields that matter to their rule.
    pub fn product(name: &str, sku: &str) -> ProductSnapshot {
        ProductSnapshot {
            product_id: Uuid::new_v4(),
            sku: sku.to_string(),
            name: name.to_string(),
            is_active: true,
            is_sellable: true,
            price: dec!(24.00),
            unit_cost: dec!(9.50),
            lead_time_days: 7,
            created_at: Utc::now() - Duration::days(400),
            on_hand: 120,
            reserved: 10,
            units_current: 45,
            units_prior: 42,
            units_year_ago: 40,
            last_sale_at: Some(Utc::now() - Duration::days(1)),
        }
    }
}
