// Data snapshots consumed by the rule evaluators
//
// Each snapshot row is plain data: evaluators never touch the database, they
// receive slices of these structs. The DataFacade trait is the single seam
// between the engine and the store, so tests can substitute a synthetic
// facade.

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use super::error::SuggestionResult;
use super::models::{CandidateSuggestion, Suggestion, SuggestionFilter};
use super::types::{SuggestionStatus, SuggestionType};

/// Scope of one engine run.
///
/// The deployment is single-tenant; the optional warehouse narrows inventory
/// reads to one location. A tenant discriminator would slot in here.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ToSchema)]
pub struct RunScope {
    pub warehouse_id: Option<Uuid>,
}

/// Time boundaries shared by the product-activity evaluators.
///
/// `current` is the trailing lookback window, `prior` the window of equal
/// length before it, and `year_ago` the current window shifted back one
/// year for the seasonal comparison.
#[derive(Debug, Clone, Copy)]
pub struct ActivityWindow {
    pub now: DateTime<Utc>,
    pub lookback_days: i64,
    pub current_start: DateTime<Utc>,
    pub prior_start: DateTime<Utc>,
    pub year_ago_start: DateTime<Utc>,
    pub year_ago_end: DateTime<Utc>,
}

impl ActivityWindow {
    /// Build the window set ending at `now` with the configured lookback.
    pub fn ending_at(now: DateTime<Utc>, lookback_days: i64) -> Self {
        let current_start = now - Duration::days(lookback_days);
        let prior_start = now - Duration::days(2 * lookback_days);
        let year_ago_end = now - Duration::days(365);
        let year_ago_start = year_ago_end - Duration::days(lookback_days);
        Self {
            now,
            lookback_days,
            current_start,
            prior_start,
            year_ago_start,
            year_ago_end,
        }
    }

    /// Units per day over the current window
    pub fn velocity_per_day(&self, units: i64) -> f64 {
        units as f64 / self.lookback_days as f64
    }
}

/// Per-product activity row: catalog fields, stock position, and unit sales
/// aggregated over the three windows. Feeds six evaluators from one load.
#[derive(Debug, Clone, FromRow)]
pub struct ProductSnapshot {
    pub product_id: Uuid,
    pub sku: String,
    pub name: String,
    pub is_active: bool,
    pub is_sellable: bool,
    pub price: Decimal,
    pub unit_cost: Decimal,
    pub lead_time_days: i32,
    pub created_at: DateTime<Utc>,
    pub on_hand: i64,
    pub reserved: i64,
    pub units_current: i64,
    pub units_prior: i64,
    pub units_year_ago: i64,
    /// Latest sale inside the activity horizon; None means no sale within it
    pub last_sale_at: Option<DateTime<Utc>>,
}

impl ProductSnapshot {
    /// Quantity actually available to sell
    pub fn available(&self) -> i64 {
        self.on_hand - self.reserved
    }

    /// Value of stock on hand at unit cost
    pub fn inventory_value(&self) -> Decimal {
        Decimal::from(self.on_hand) * self.unit_cost
    }
}

/// Unsettled payment obligation inside the due-date horizon
#[derive(Debug, Clone, FromRow)]
pub struct PaymentDueSnapshot {
    pub payment_due_id: Uuid,
    pub supplier_id: Option<Uuid>,
    pub counterparty: String,
    pub amount: Decimal,
    pub due_date: NaiveDate,
}

/// One purchase-order receipt (or still-open order) in the lookback window
#[derive(Debug, Clone, FromRow)]
pub struct SupplierReceiptSnapshot {
    pub purchase_order_id: Uuid,
    pub supplier_id: Uuid,
    pub supplier_name: String,
    pub ordered_at: DateTime<Utc>,
    /// Agreed arrival date (explicit, or ordered_at + supplier lead time)
    pub expected_by: NaiveDate,
    pub received_at: Option<DateTime<Utc>>,
}

/// Pending production order, keyed by the component it consumes
#[derive(Debug, Clone, FromRow)]
pub struct ProductionDemandSnapshot {
    pub production_order_id: Uuid,
    pub component_id: Uuid,
    pub component_name: String,
    pub operation: String,
    pub quantity: i32,
    pub setup_minutes: i32,
}

/// Draft purchase order awaiting placement, with its supplier's threshold
#[derive(Debug, Clone, FromRow)]
pub struct PurchaseDraftSnapshot {
    pub purchase_order_id: Uuid,
    pub supplier_id: Uuid,
    pub supplier_name: String,
    pub total_value: Decimal,
    pub free_shipping_threshold: Option<Decimal>,
}

/// Read and write interface between the engine and the store.
///
/// Reads return the minimal snapshot slice one evaluator group needs;
/// writes cover the suggestion lifecycle. Injected into the engine so unit
/// tests run against a synthetic in-memory facade.
#[async_trait]
pub trait DataFacade: Send + Sync {
    /// Product catalog, stock position, and windowed sales in one pass
    async fn product_activity(
        &self,
        scope: RunScope,
        window: &ActivityWindow,
    ) -> SuggestionResult<Vec<ProductSnapshot>>;

    /// Unsettled payment dues with `due_date <= horizon` (overdue included)
    async fn payment_dues(&self, horizon: NaiveDate) -> SuggestionResult<Vec<PaymentDueSnapshot>>;

    /// Purchase orders placed since `since`, for receipt-delay history
    async fn supplier_receipts(
        &self,
        since: DateTime<Utc>,
    ) -> SuggestionResult<Vec<SupplierReceiptSnapshot>>;

    /// Pending production orders with their shared components
    async fn production_demand(&self) -> SuggestionResult<Vec<ProductionDemandSnapshot>>;

    /// Draft purchase orders grouped later by supplier
    async fn draft_purchase_orders(&self) -> SuggestionResult<Vec<PurchaseDraftSnapshot>>;

    /// Insert the candidate as PENDING, or refresh the existing PENDING row
    /// with the same (type, subject) key
    async fn upsert_suggestion(
        &self,
        candidate: &CandidateSuggestion,
        computed_at: DateTime<Utc>,
    ) -> SuggestionResult<Suggestion>;

    /// All PENDING suggestions of the given types
    async fn pending_for_types(
        &self,
        types: &[SuggestionType],
    ) -> SuggestionResult<Vec<Suggestion>>;

    /// Bulk-transition still-PENDING suggestions to RESOLVED
    async fn resolve_suggestions(&self, ids: &[Uuid]) -> SuggestionResult<u64>;

    /// Point lookup
    async fn get_suggestion(&self, id: Uuid) -> SuggestionResult<Option<Suggestion>>;

    /// Persist a status transition already vetted by the status machine
    async fn set_suggestion_status(
        &self,
        id: Uuid,
        status: SuggestionStatus,
    ) -> SuggestionResult<Suggestion>;

    /// Filtered listing for the HTTP layer, ranked by priority then recency
    async fn list_suggestions(&self, filter: &SuggestionFilter)
        -> SuggestionResult<Vec<Suggestion>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn sample_product() -> ProductSnapshot {
        ProductSnapshot {
            product_id: Uuid::new_v4(),
            sku: "TZ-01".to_string(),
            name: "Tazza Toscana".to_string(),
            is_active: true,
            is_sellable: true,
            price: dec!(24.00),
            unit_cost: dec!(9.50),
            lead_time_days: 7,
            created_at: Utc.with_ymd_and_hms(2024, 1, 10, 8, 0, 0).unwrap(),
            on_hand: 12,
            reserved: 4,
            units_current: 30,
            units_prior: 28,
            units_year_ago: 25,
            last_sale_at: None,
        }
    }

    #[test]
    fn test_window_boundaries() {
        let now = Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap();
        let window = ActivityWindow::ending_at(now, 30);

        assert_eq!(window.current_start, now - Duration::days(30));
        assert_eq!(window.prior_start, now - Duration::days(60));
        assert_eq!(window.year_ago_end, now - Duration::days(365));
        assert_eq!(window.year_ago_start, now - Duration::days(395));
        // Prior window has the same length as the current one.
        assert_eq!(
            window.current_start - window.prior_start,
            now - window.current_start
        );
    }

    #[test]
    fn test_velocity_per_day() {
        let now = Utc::now();
        let window = ActivityWindow::ending_at(now, 30);
        assert!((window.velocity_per_day(300) - 10.0).abs() < f64::EPSILON);
        assert!((window.velocity_per_day(0)).abs() < f64::EPSILON);
    }

    #[test]
    fn test_available_subtracts_reserved() {
        let product = sample_product();
        assert_eq!(product.available(), 8);
    }

    #[test]
    fn test_inventory_value() {
        let product = sample_product();
        assert_eq!(product.inventory_value(), dec!(114.00));
    }
}
