// Domain type definitions for the Suggestion Engine
// Shared across evaluators, the orchestrator, and the HTTP layer

use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

/// Suggestion category produced by the rule evaluators.
///
/// The trend evaluator emits two distinct types (`TrendUp` and `TrendDown`),
/// so there are eleven suggestion types backed by ten evaluators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SuggestionType {
    Reorder,
    StockoutAlert,
    MarginAlert,
    TrendUp,
    TrendDown,
    SeasonalPeak,
    BatchProduction,
    OrderGrouping,
    DeadStock,
    PaymentDue,
    SupplierIssue,
}

impl SuggestionType {
    /// Convert type to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestionType::Reorder => "reorder",
            SuggestionType::StockoutAlert => "stockout_alert",
            SuggestionType::MarginAlert => "margin_alert",
            SuggestionType::TrendUp => "trend_up",
            SuggestionType::TrendDown => "trend_down",
            SuggestionType::SeasonalPeak => "seasonal_peak",
            SuggestionType::BatchProduction => "batch_production",
            SuggestionType::OrderGrouping => "order_grouping",
            SuggestionType::DeadStock => "dead_stock",
            SuggestionType::PaymentDue => "payment_due",
            SuggestionType::SupplierIssue => "supplier_issue",
        }
    }

    /// The evaluator that owns this suggestion type
    pub fn evaluator(&self) -> EvaluatorKind {
        match self {
            SuggestionType::Reorder => EvaluatorKind::Reorder,
            SuggestionType::StockoutAlert => EvaluatorKind::Stockout,
            SuggestionType::MarginAlert => EvaluatorKind::Margin,
            SuggestionType::TrendUp | SuggestionType::TrendDown => EvaluatorKind::Trend,
            SuggestionType::SeasonalPeak => EvaluatorKind::Seasonal,
            SuggestionType::BatchProduction => EvaluatorKind::BatchProduction,
            SuggestionType::OrderGrouping => EvaluatorKind::OrderGrouping,
            SuggestionType::DeadStock => EvaluatorKind::DeadStock,
            SuggestionType::PaymentDue => EvaluatorKind::PaymentDue,
            SuggestionType::SupplierIssue => EvaluatorKind::SupplierIssue,
        }
    }
}

impl fmt::Display for SuggestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SuggestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reorder" => Ok(SuggestionType::Reorder),
            "stockout_alert" => Ok(SuggestionType::StockoutAlert),
            "margin_alert" => Ok(SuggestionType::MarginAlert),
            "trend_up" => Ok(SuggestionType::TrendUp),
            "trend_down" => Ok(SuggestionType::TrendDown),
            "seasonal_peak" => Ok(SuggestionType::SeasonalPeak),
            "batch_production" => Ok(SuggestionType::BatchProduction),
            "order_grouping" => Ok(SuggestionType::OrderGrouping),
            "dead_stock" => Ok(SuggestionType::DeadStock),
            "payment_due" => Ok(SuggestionType::PaymentDue),
            "supplier_issue" => Ok(SuggestionType::SupplierIssue),
            _ => Err(format!("Invalid suggestion type: {}", s)),
        }
    }
}

/// One of the ten rule evaluators the engine can run.
///
/// This is the unit of selection for `POST /suggestions/run` and for the
/// role-based dashboard subsets, and the unit of failure isolation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EvaluatorKind {
    Reorder,
    Stockout,
    Margin,
    Trend,
    Seasonal,
    BatchProduction,
    OrderGrouping,
    DeadStock,
    PaymentDue,
    SupplierIssue,
}

impl EvaluatorKind {
    /// Every evaluator, in the order they are reported.
    pub const ALL: [EvaluatorKind; 10] = [
        EvaluatorKind::Reorder,
        EvaluatorKind::Stockout,
        EvaluatorKind::Margin,
        EvaluatorKind::Trend,
        EvaluatorKind::Seasonal,
        EvaluatorKind::BatchProduction,
        EvaluatorKind::OrderGrouping,
        EvaluatorKind::DeadStock,
        EvaluatorKind::PaymentDue,
        EvaluatorKind::SupplierIssue,
    ];

    /// Convert evaluator kind to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            EvaluatorKind::Reorder => "reorder",
            EvaluatorKind::Stockout => "stockout",
            EvaluatorKind::Margin => "margin",
            EvaluatorKind::Trend => "trend",
            EvaluatorKind::Seasonal => "seasonal",
            EvaluatorKind::BatchProduction => "batch_production",
            EvaluatorKind::OrderGrouping => "order_grouping",
            EvaluatorKind::DeadStock => "dead_stock",
            EvaluatorKind::PaymentDue => "payment_due",
            EvaluatorKind::SupplierIssue => "supplier_issue",
        }
    }

    /// The suggestion types this evaluator may emit
    pub fn suggestion_types(&self) -> &'static [SuggestionType] {
        match self {
            EvaluatorKind::Reorder => &[SuggestionType::Reorder],
            EvaluatorKind::Stockout => &[SuggestionType::StockoutAlert],
            EvaluatorKind::Margin => &[SuggestionType::MarginAlert],
            EvaluatorKind::Trend => &[SuggestionType::TrendUp, SuggestionType::TrendDown],
            EvaluatorKind::Seasonal => &[SuggestionType::SeasonalPeak],
            EvaluatorKind::BatchProduction => &[SuggestionType::BatchProduction],
            EvaluatorKind::OrderGrouping => &[SuggestionType::OrderGrouping],
            EvaluatorKind::DeadStock => &[SuggestionType::DeadStock],
            EvaluatorKind::PaymentDue => &[SuggestionType::PaymentDue],
            EvaluatorKind::SupplierIssue => &[SuggestionType::SupplierIssue],
        }
    }
}

impl fmt::Display for EvaluatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for EvaluatorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reorder" => Ok(EvaluatorKind::Reorder),
            "stockout" => Ok(EvaluatorKind::Stockout),
            "margin" => Ok(EvaluatorKind::Margin),
            "trend" => Ok(EvaluatorKind::Trend),
            "seasonal" => Ok(EvaluatorKind::Seasonal),
            "batch_production" => Ok(EvaluatorKind::BatchProduction),
            "order_grouping" => Ok(EvaluatorKind::OrderGrouping),
            "dead_stock" => Ok(EvaluatorKind::DeadStock),
            "payment_due" => Ok(EvaluatorKind::PaymentDue),
            "supplier_issue" => Ok(EvaluatorKind::SupplierIssue),
            _ => Err(format!("Invalid evaluator category: {}", s)),
        }
    }
}

/// Suggestion priority, totally ordered.
///
/// Variant order matters: the derived `Ord` gives
/// `Low < Medium < High < Critical`, which ranking and the urgent-task
/// threshold rely on.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    sqlx::Type,
    ToSchema,
)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    /// Convert priority to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Critical => "critical",
        }
    }

    /// True for priorities that belong on the urgent-task list
    pub fn is_urgent(&self) -> bool {
        *self >= Priority::High
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "critical" => Ok(Priority::Critical),
            _ => Err(format!("Invalid priority: {}", s)),
        }
    }
}

/// Suggestion lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SuggestionStatus {
    Pending,
    Acknowledged,
    Resolved,
    Dismissed,
}

impl SuggestionStatus {
    /// Convert status to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestionStatus::Pending => "pending",
            SuggestionStatus::Acknowledged => "acknowledged",
            SuggestionStatus::Resolved => "resolved",
            SuggestionStatus::Dismissed => "dismissed",
        }
    }

    /// Parse status from string
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(SuggestionStatus::Pending),
            "acknowledged" => Ok(SuggestionStatus::Acknowledged),
            "resolved" => Ok(SuggestionStatus::Resolved),
            "dismissed" => Ok(SuggestionStatus::Dismissed),
            _ => Err(format!("Invalid suggestion status: {}", s)),
        }
    }

    /// Terminal statuses are kept for audit and admit no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, SuggestionStatus::Resolved | SuggestionStatus::Dismissed)
    }
}

impl Default for SuggestionStatus {
    fn default() -> Self {
        SuggestionStatus::Pending
    }
}

impl fmt::Display for SuggestionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind half of a suggestion subject, as stored alongside the id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SubjectKind {
    Product,
    Supplier,
    PurchaseOrder,
    PaymentDue,
}

impl SubjectKind {
    /// Convert subject kind to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            SubjectKind::Product => "product",
            SubjectKind::Supplier => "supplier",
            SubjectKind::PurchaseOrder => "purchase_order",
            SubjectKind::PaymentDue => "payment_due",
        }
    }
}

impl fmt::Display for SubjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a suggestion is about: a tagged reference to a business entity.
///
/// Modeled as an enum rather than a bare foreign key so the
/// evaluator-to-subject mapping stays exhaustive and type-checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum SubjectRef {
    Product(Uuid),
    Supplier(Uuid),
    PurchaseOrder(Uuid),
    PaymentDue(Uuid),
}

impl SubjectRef {
    /// Kind half of the (kind, id) pair
    pub fn kind(&self) -> SubjectKind {
        match self {
            SubjectRef::Product(_) => SubjectKind::Product,
            SubjectRef::Supplier(_) => SubjectKind::Supplier,
            SubjectRef::PurchaseOrder(_) => SubjectKind::PurchaseOrder,
            SubjectRef::PaymentDue(_) => SubjectKind::PaymentDue,
        }
    }

    /// Id half of the (kind, id) pair
    pub fn id(&self) -> Uuid {
        match self {
            SubjectRef::Product(id)
            | SubjectRef::Supplier(id)
            | SubjectRef::PurchaseOrder(id)
            | SubjectRef::PaymentDue(id) => *id,
        }
    }

    /// Rebuild a subject from its stored (kind, id) columns
    pub fn from_parts(kind: SubjectKind, id: Uuid) -> Self {
        match kind {
            SubjectKind::Product => SubjectRef::Product(id),
            SubjectKind::Supplier => SubjectRef::Supplier(id),
            SubjectKind::PurchaseOrder => SubjectRef::PurchaseOrder(id),
            SubjectKind::PaymentDue => SubjectRef::PaymentDue(id),
        }
    }
}

impl fmt::Display for SubjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.id())
    }
}
