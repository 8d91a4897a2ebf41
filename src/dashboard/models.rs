// Dashboard read models and DTOs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::suggestions::models::SuggestionResponse;
use crate::suggestions::types::{EvaluatorKind, Priority};

/// Workshop roles the dashboard is scoped to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Titolare,
    Magazziniere,
    Contabile,
    Operatore,
}

impl Role {
    /// Convert role to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Titolare => "titolare",
            Role::Magazziniere => "magazziniere",
            Role::Contabile => "contabile",
            Role::Operatore => "operatore",
        }
    }

    /// The evaluator categories this role works with. The owner sees
    /// everything; the others get the slice of the engine that matches
    /// their responsibilities.
    pub fn categories(&self) -> Vec<EvaluatorKind> {
        match self {
            Role::Titolare => EvaluatorKind::ALL.to_vec(),
            Role::Magazziniere => vec![
                EvaluatorKind::Reorder,
                EvaluatorKind::Stockout,
                EvaluatorKind::DeadStock,
                EvaluatorKind::OrderGrouping,
                EvaluatorKind::SupplierIssue,
            ],
            Role::Contabile => vec![EvaluatorKind::PaymentDue, EvaluatorKind::Margin],
            Role::Operatore => vec![EvaluatorKind::BatchProduction],
        }
    }

    /// Roles that track payment deadlines directly
    pub fn sees_payments(&self) -> bool {
        matches!(self, Role::Titolare | Role::Contabile)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "titolare" => Ok(Role::Titolare),
            "magazziniere" => Ok(Role::Magazziniere),
            "contabile" => Ok(Role::Contabile),
            "operatore" => Ok(Role::Operatore),
            _ => Err(format!("unknown role: {}", s)),
        }
    }
}

/// A headline figure, either a count or a money amount
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(untagged)]
pub enum KpiValue {
    Count(i64),
    Amount(Decimal),
}

/// One headline figure on the dashboard
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Kpi {
    pub key: String,
    pub label: String,
    pub value: KpiValue,
}

impl Kpi {
    pub fn count(key: &str, label: &str, value: i64) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            value: KpiValue::Count(value),
        }
    }

    pub fn amount(key: &str, label: &str, value: Decimal) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            value: KpiValue::Amount(value),
        }
    }
}

/// Where an urgent task came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum UrgentRef {
    Suggestion { id: Uuid },
    PaymentDue { id: Uuid },
}

/// An item that needs attention today: a high-or-critical suggestion, or an
/// overdue payment deadline not already covered by one.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UrgentTask {
    pub priority: Priority,
    pub label: String,
    pub due_date: Option<NaiveDate>,
    #[serde(flatten)]
    pub origin: UrgentRef,
}

/// One line of the suggested plan for the day
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PlanEntry {
    pub position: usize,
    pub task: String,
}

/// The assembled dashboard for one role
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DashboardView {
    pub greeting: String,
    pub role: Role,
    pub generated_at: DateTime<Utc>,
    pub kpis: Vec<Kpi>,
    pub urgent: Vec<UrgentTask>,
    pub suggestions: Vec<SuggestionResponse>,
    pub plan: Vec<PlanEntry>,
    /// Sections that could not be loaded this time
    pub warnings: Vec<String>,
}

/// Query DTO for GET /api/dashboard
#[derive(Debug, Deserialize, ToSchema)]
pub struct DashboardQuery {
    /// One of titolare, magazziniere, contabile, operatore
    pub role: String,
    /// Optional display name for the greeting
    pub name: Option<String>,
}
