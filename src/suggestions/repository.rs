use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::suggestions::error::SuggestionResult;
use crate::suggestions::models::{CandidateSuggestion, Suggestion, SuggestionFilter};
use crate::suggestions::snapshot::{
    ActivityWindow, DataFacade, PaymentDueSnapshot, ProductSnapshot, ProductionDemandSnapshot,
    PurchaseDraftSnapshot, RunScope, SupplierReceiptSnapshot,
};
use crate::suggestions::types::{SuggestionStatus, SuggestionType};

const SUGGESTION_COLUMNS: &str = "id, suggestion_type, priority, status, subject_kind, \
     subject_id, message, metadata, computed_at, created_at, updated_at";

/// Postgres-backed data facade. Every read is one query shaped for the
/// evaluators that consume it, so a run touches the database a fixed number
/// of times no matter how many products are in scope.
#[derive(Clone)]
pub struct PgDataFacade {
    pool: PgPool,
}

impl PgDataFacade {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DataFacade for PgDataFacade {
    /// Active products with stock position and sales aggregated over the
    /// current, prior and year-ago windows. Last sale is tracked within the
    /// same horizon; older history never loads.
    async fn product_activity(
        &self,
        scope: RunScope,
        window: &ActivityWindow,
    ) -> SuggestionResult<Vec<ProductSnapshot>> {
        let products = sqlx::query_as::<_, ProductSnapshot>(
            r#"
            SELECT p.id AS product_id,
                   p.sku,
                   p.name,
                   p.is_active,
                   p.is_sellable,
                   p.price,
                   p.unit_cost,
                   p.lead_time_days,
                   p.created_at,
                   COALESCE(inv.on_hand, 0) AS on_hand,
                   COALESCE(inv.reserved, 0) AS reserved,
                   COALESCE(sales.units_current, 0) AS units_current,
                   COALESCE(sales.units_prior, 0) AS units_prior,
                   COALESCE(sales.units_year_ago, 0) AS units_year_ago,
                   sales.last_sale_at
            FROM products p
            LEFT JOIN (
                SELECT product_id,
                       SUM(on_hand) AS on_hand,
                       SUM(reserved) AS reserved
                FROM inventory_levels
                WHERE $1::uuid IS NULL OR warehouse_id = $1
                GROUP BY product_id
            ) inv ON inv.product_id = p.id
            LEFT JOIN (
                SELECT oi.product_id,
                       SUM(oi.quantity) FILTER (WHERE o.placed_at >= $2) AS units_current,
                       SUM(oi.quantity) FILTER (WHERE o.placed_at >= $3 AND o.placed_at < $2) AS units_prior,
                       SUM(oi.quantity) FILTER (WHERE o.placed_at >= $4 AND o.placed_at < $5) AS units_year_ago,
                       MAX(o.placed_at) AS last_sale_at
                FROM order_items oi
                JOIN orders o ON o.id = oi.order_id
                WHERE o.status <> 'cancelled' AND o.placed_at >= $4
                GROUP BY oi.product_id
            ) sales ON sales.product_id = p.id
            WHERE p.is_active = TRUE
            ORDER BY p.sku
            "#,
        )
        .bind(scope.warehouse_id)
        .bind(window.current_start)
        .bind(window.prior_start)
        .bind(window.year_ago_start)
        .bind(window.year_ago_end)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    async fn payment_dues(&self, horizon: NaiveDate) -> SuggestionResult<Vec<PaymentDueSnapshot>> {
        let dues = sqlx::query_as::<_, PaymentDueSnapshot>(
            r#"
            SELECT pd.id AS payment_due_id,
                   pd.supplier_id,
                   pd.counterparty,
                   pd.amount,
                   pd.due_date
            FROM payment_dues pd
            WHERE pd.settled_at IS NULL AND pd.due_date <= $1
            ORDER BY pd.due_date
            "#,
        )
        .bind(horizon)
        .fetch_all(&self.pool)
        .await?;

        Ok(dues)
    }

    async fn supplier_receipts(
        &self,
        since: DateTime<Utc>,
    ) -> SuggestionResult<Vec<SupplierReceiptSnapshot>> {
        let receipts = sqlx::query_as::<_, SupplierReceiptSnapshot>(
            r#"
            SELECT po.id AS purchase_order_id,
                   po.supplier_id,
                   s.name AS supplier_name,
                   po.ordered_at,
                   po.expected_by,
                   po.received_at
            FROM purchase_orders po
            JOIN suppliers s ON s.id = po.supplier_id
            WHERE po.status NOT IN ('draft', 'cancelled') AND po.ordered_at >= $1
            ORDER BY po.ordered_at
            "#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(receipts)
    }

    async fn production_demand(&self) -> SuggestionResult<Vec<ProductionDemandSnapshot>> {
        let demand = sqlx::query_as::<_, ProductionDemandSnapshot>(
            r#"
            SELECT pr.id AS production_order_id,
                   pr.component_id,
                   p.name AS component_name,
                   pr.operation,
                   pr.quantity,
                   pr.setup_minutes
            FROM production_orders pr
            JOIN products p ON p.id = pr.component_id
            WHERE pr.status = 'pending'
            ORDER BY pr.component_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(demand)
    }

    async fn draft_purchase_orders(&self) -> SuggestionResult<Vec<PurchaseDraftSnapshot>> {
        let drafts = sqlx::query_as::<_, PurchaseDraftSnapshot>(
            r#"
            SELECT po.id AS purchase_order_id,
                   po.supplier_id,
                   s.name AS supplier_name,
                   po.total_value,
                   s.free_shipping_threshold
            FROM purchase_orders po
            JOIN suppliers s ON s.id = po.supplier_id
            WHERE po.status = 'draft'
            ORDER BY po.supplier_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(drafts)
    }

    /// Insert-or-refresh keyed on the pending partial index: one pending row
    /// per (type, subject) at any time. A second candidate for the same key
    /// refreshes priority, message, metadata and timestamp in place.
    async fn upsert_suggestion(
        &self,
        candidate: &CandidateSuggestion,
        computed_at: DateTime<Utc>,
    ) -> SuggestionResult<Suggestion> {
        let query = format!(
            r#"
            INSERT INTO suggestions
                (suggestion_type, priority, status, subject_kind, subject_id, message, metadata, computed_at)
            VALUES ($1, $2, 'pending', $3, $4, $5, $6, $7)
            ON CONFLICT (suggestion_type, subject_kind, subject_id) WHERE status = 'pending'
            DO UPDATE SET priority = EXCLUDED.priority,
                          message = EXCLUDED.message,
                          metadata = EXCLUDED.metadata,
                          computed_at = EXCLUDED.computed_at,
                          updated_at = NOW()
            RETURNING {SUGGESTION_COLUMNS}
            "#
        );

        let suggestion = sqlx::query_as::<_, Suggestion>(&query)
            .bind(candidate.suggestion_type)
            .bind(candidate.priority)
            .bind(candidate.subject.kind())
            .bind(candidate.subject.id())
            .bind(&candidate.message)
            .bind(&candidate.metadata)
            .bind(computed_at)
            .fetch_one(&self.pool)
            .await?;

        Ok(suggestion)
    }

    async fn pending_for_types(
        &self,
        types: &[SuggestionType],
    ) -> SuggestionResult<Vec<Suggestion>> {
        if types.is_empty() {
            return Ok(Vec::new());
        }
        let names: Vec<String> = types.iter().map(|t| t.as_str().to_string()).collect();

        let query = format!(
            "SELECT {SUGGESTION_COLUMNS} FROM suggestions \
             WHERE status = 'pending' AND suggestion_type = ANY($1)"
        );
        let suggestions = sqlx::query_as::<_, Suggestion>(&query)
            .bind(&names)
            .fetch_all(&self.pool)
            .await?;

        Ok(suggestions)
    }

    async fn resolve_suggestions(&self, ids: &[Uuid]) -> SuggestionResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query(
            "UPDATE suggestions SET status = 'resolved', updated_at = NOW() \
             WHERE id = ANY($1) AND status = 'pending'",
        )
        .bind(ids)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn get_suggestion(&self, id: Uuid) -> SuggestionResult<Option<Suggestion>> {
        let query = format!("SELECT {SUGGESTION_COLUMNS} FROM suggestions WHERE id = $1");
        let suggestion = sqlx::query_as::<_, Suggestion>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(suggestion)
    }

    async fn set_suggestion_status(
        &self,
        id: Uuid,
        status: SuggestionStatus,
    ) -> SuggestionResult<Suggestion> {
        let query = format!(
            "UPDATE suggestions SET status = $2, updated_at = NOW() \
             WHERE id = $1 RETURNING {SUGGESTION_COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Suggestion>(&query)
            .bind(id)
            .bind(status)
            .fetch_optional(&self.pool)
            .await?;

        updated.ok_or(crate::suggestions::error::SuggestionError::SuggestionNotFound(id))
    }

    async fn list_suggestions(
        &self,
        filter: &SuggestionFilter,
    ) -> SuggestionResult<Vec<Suggestion>> {
        let status = filter.status.map(|s| s.as_str().to_string());
        let types = filter
            .types
            .as_ref()
            .map(|ts| ts.iter().map(|t| t.as_str().to_string()).collect::<Vec<_>>());

        let query = format!(
            r#"
            SELECT {SUGGESTION_COLUMNS}
            FROM suggestions
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::text[] IS NULL OR suggestion_type = ANY($2))
            ORDER BY CASE priority
                         WHEN 'critical' THEN 4
                         WHEN 'high' THEN 3
                         WHEN 'medium' THEN 2
                         ELSE 1
                     END DESC,
                     computed_at DESC
            LIMIT $3
            "#
        );
        let suggestions = sqlx::query_as::<_, Suggestion>(&query)
            .bind(status)
            .bind(types)
            .bind(filter.limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(suggestions)
    }
}
