use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};

use crate::dashboard::error::DashboardResult;
use crate::suggestions::snapshot::PaymentDueSnapshot;

/// Headline figures for the owner
#[derive(Debug, Clone, FromRow)]
pub struct OwnerStats {
    pub revenue_month: Decimal,
    pub orders_month: i64,
    pub pending_suggestions: i64,
    pub overdue_count: i64,
    pub overdue_amount: Decimal,
}

/// Headline figures for the warehouse
#[derive(Debug, Clone, FromRow)]
pub struct WarehouseStats {
    pub active_products: i64,
    pub out_of_stock: i64,
    pub units_on_hand: i64,
    pub inbound_orders: i64,
}

/// Headline figures for accounting
#[derive(Debug, Clone, FromRow)]
pub struct AccountingStats {
    pub overdue_count: i64,
    pub overdue_amount: Decimal,
    pub due_week_amount: Decimal,
    pub open_amount: Decimal,
}

/// Headline figures for production
#[derive(Debug, Clone, FromRow)]
pub struct ProductionStats {
    pub pending_runs: i64,
    pub queued_units: i64,
    pub components_in_demand: i64,
}

/// Aggregate queries behind the dashboard. Each role costs one round trip.
#[derive(Clone)]
pub struct DashboardRepository {
    pool: PgPool,
}

impl DashboardRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn owner_stats(&self) -> DashboardResult<OwnerStats> {
        let stats = sqlx::query_as::<_, OwnerStats>(
            r#"
            SELECT
                (SELECT COALESCE(SUM(total_amount), 0) FROM orders
                 WHERE status <> 'cancelled' AND placed_at >= date_trunc('month', NOW())) AS revenue_month,
                (SELECT COUNT(*) FROM orders
                 WHERE status <> 'cancelled' AND placed_at >= date_trunc('month', NOW())) AS orders_month,
                (SELECT COUNT(*) FROM suggestions WHERE status = 'pending') AS pending_suggestions,
                (SELECT COUNT(*) FROM payment_dues
                 WHERE settled_at IS NULL AND due_date < CURRENT_DATE) AS overdue_count,
                (SELECT COALESCE(SUM(amount), 0) FROM payment_dues
                 WHERE settled_at IS NULL AND due_date < CURRENT_DATE) AS overdue_amount
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(stats)
    }

    pub async fn warehouse_stats(&self) -> DashboardResult<WarehouseStats> {
        let stats = sqlx::query_as::<_, WarehouseStats>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM products WHERE is_active = TRUE) AS active_products,
                (SELECT COUNT(*) FROM products p
                 LEFT JOIN (
                     SELECT product_id, SUM(on_hand - reserved) AS available
                     FROM inventory_levels
                     GROUP BY product_id
                 ) inv ON inv.product_id = p.id
                 WHERE p.is_active = TRUE AND p.is_sellable = TRUE
                   AND COALESCE(inv.available, 0) <= 0) AS out_of_stock,
                (SELECT COALESCE(SUM(on_hand), 0) FROM inventory_levels) AS units_on_hand,
                (SELECT COUNT(*) FROM purchase_orders
                 WHERE status NOT IN ('draft', 'cancelled') AND received_at IS NULL) AS inbound_orders
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(stats)
    }

    pub async fn accounting_stats(&self) -> DashboardResult<AccountingStats> {
        let stats = sqlx::query_as::<_, AccountingStats>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM payment_dues
                 WHERE settled_at IS NULL AND due_date < CURRENT_DATE) AS overdue_count,
                (SELECT COALESCE(SUM(amount), 0) FROM payment_dues
                 WHERE settled_at IS NULL AND due_date < CURRENT_DATE) AS overdue_amount,
                (SELECT COALESCE(SUM(amount), 0) FROM payment_dues
                 WHERE settled_at IS NULL
                   AND due_date >= CURRENT_DATE AND due_date <= CURRENT_DATE + 7) AS due_week_amount,
                (SELECT COALESCE(SUM(amount), 0) FROM payment_dues
                 WHERE settled_at IS NULL) AS open_amount
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(stats)
    }

    pub async fn production_stats(&self) -> DashboardResult<ProductionStats> {
        let stats = sqlx::query_as::<_, ProductionStats>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM production_orders WHERE status = 'pending') AS pending_runs,
                (SELECT COALESCE(SUM(quantity), 0) FROM production_orders
                 WHERE status = 'pending') AS queued_units,
                (SELECT COUNT(DISTINCT component_id) FROM production_orders
                 WHERE status = 'pending') AS components_in_demand
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(stats)
    }

    /// Unsettled payment deadlines already past their due date
    pub async fn overdue_dues(&self) -> DashboardResult<Vec<PaymentDueSnapshot>> {
        let dues = sqlx::query_as::<_, PaymentDueSnapshot>(
            r#"
            SELECT pd.id AS payment_due_id,
                   pd.supplier_id,
                   pd.counterparty,
                   pd.amount,
                   pd.due_date
            FROM payment_dues pd
            WHERE pd.settled_at IS NULL AND pd.due_date < CURRENT_DATE
            ORDER BY pd.due_date
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(dues)
    }
}
