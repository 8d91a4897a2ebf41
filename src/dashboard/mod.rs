// Role-scoped dashboard
//
// One read model per role: a greeting, headline figures straight from SQL,
// the urgent-task list, the role's pending suggestions, and a short plan
// for the day. Sections degrade independently; a failed read becomes a
// warning on the response instead of an error.

pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod service;

pub use error::{DashboardError, DashboardResult};
pub use models::{DashboardView, Kpi, KpiValue, PlanEntry, Role, UrgentRef, UrgentTask};
pub use repository::DashboardRepository;
pub use service::DashboardService;
