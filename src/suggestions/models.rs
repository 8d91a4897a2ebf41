// Suggestion records, evaluator candidates, and HTTP DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::error::{SuggestionError, SuggestionResult};
use super::types::{
    EvaluatorKind, Priority, SubjectKind, SubjectRef, SuggestionStatus, SuggestionType,
};

/// Dedup key for the "one PENDING per (type, subject)" invariant
pub type SuggestionKey = (SuggestionType, SubjectKind, Uuid);

/// Persisted suggestion row.
///
/// The subject is stored as (kind, id) columns; `subject()` rebuilds the
/// typed reference.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Suggestion {
    pub id: Uuid,
    pub suggestion_type: SuggestionType,
    pub priority: Priority,
    pub status: SuggestionStatus,
    pub subject_kind: SubjectKind,
    pub subject_id: Uuid,
    pub message: String,
    pub metadata: serde_json::Value,
    pub computed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Suggestion {
    /// Typed subject reference
    pub fn subject(&self) -> SubjectRef {
        SubjectRef::from_parts(self.subject_kind, self.subject_id)
    }

    /// Dedup key shared with candidates
    pub fn key(&self) -> SuggestionKey {
        (self.suggestion_type, self.subject_kind, self.subject_id)
    }
}

/// What an evaluator emits: a suggestion that is not persisted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateSuggestion {
    pub suggestion_type: SuggestionType,
    pub subject: SubjectRef,
    pub priority: Priority,
    pub message: String,
    pub metadata: serde_json::Value,
}

impl CandidateSuggestion {
    pub fn new(
        suggestion_type: SuggestionType,
        subject: SubjectRef,
        priority: Priority,
        message: String,
        metadata: serde_json::Value,
    ) -> Self {
        Self {
            suggestion_type,
            subject,
            priority,
            message,
            metadata,
        }
    }

    /// Dedup key shared with persisted suggestions
    pub fn key(&self) -> SuggestionKey {
        (self.suggestion_type, self.subject.kind(), self.subject.id())
    }
}

/// Sort suggestions in place: priority descending, then most recently
/// (re)computed first as the tie-break.
pub fn rank(suggestions: &mut [Suggestion]) {
    suggestions.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then(b.computed_at.cmp(&a.computed_at))
    });
}

/// Listing filter used by the facade and the GET endpoint
#[derive(Debug, Clone)]
pub struct SuggestionFilter {
    pub status: Option<SuggestionStatus>,
    pub types: Option<Vec<SuggestionType>>,
    pub limit: i64,
}

impl Default for SuggestionFilter {
    fn default() -> Self {
        Self {
            status: None,
            types: None,
            limit: 50,
        }
    }
}

/// Response DTO for a suggestion
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SuggestionResponse {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub suggestion_type: SuggestionType,
    pub priority: Priority,
    pub status: SuggestionStatus,
    pub subject: SubjectRef,
    pub message: String,
    pub metadata: serde_json::Value,
    pub computed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Suggestion> for SuggestionResponse {
    fn from(s: Suggestion) -> Self {
        let subject = s.subject();
        Self {
            id: s.id,
            suggestion_type: s.suggestion_type,
            priority: s.priority,
            status: s.status,
            subject,
            message: s.message,
            metadata: s.metadata,
            computed_at: s.computed_at,
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}

/// Outcome of one engine run
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EngineRunReport {
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub requested: Vec<EvaluatorKind>,
    /// Categories whose snapshot load or evaluation failed, or whose
    /// candidates the deadline cut off before they were all persisted
    pub failed: Vec<EvaluatorKind>,
    pub candidates: usize,
    pub persisted: usize,
    pub resolved: usize,
    pub upsert_failures: usize,
    /// Suggestions this run persisted, ranked
    pub suggestions: Vec<SuggestionResponse>,
}

/// Request DTO for POST /api/suggestions/run
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct RunSuggestionsRequest {
    /// Evaluator categories to run; omitted means all ten
    #[validate(custom = "crate::validation::validate_categories")]
    pub categories: Option<Vec<String>>,
    /// Soft deadline for the run in milliseconds
    #[validate(range(min = 50, max = 60000, message = "deadline_ms must be between 50 and 60000"))]
    pub deadline_ms: Option<u64>,
    /// Restrict inventory reads to one warehouse
    pub warehouse_id: Option<Uuid>,
}

impl RunSuggestionsRequest {
    /// Parse the requested categories, deduplicated in request order
    pub fn evaluator_kinds(&self) -> SuggestionResult<Option<Vec<EvaluatorKind>>> {
        let Some(raw) = &self.categories else {
            return Ok(None);
        };
        let mut kinds = Vec::new();
        for name in raw {
            let kind: EvaluatorKind = name
                .parse()
                .map_err(SuggestionError::ValidationError)?;
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
        Ok(Some(kinds))
    }
}

/// Request DTO for PATCH /api/suggestions/:id
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateSuggestionStatusRequest {
    /// Target status: acknowledged, resolved, or dismissed
    #[validate(length(min = 1, message = "status is required"))]
    pub status: String,
}

/// Query DTO for GET /api/suggestions
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ListSuggestionsQuery {
    pub status: Option<String>,
    pub category: Option<String>,
    pub limit: Option<i64>,
}

impl ListSuggestionsQuery {
    /// Turn the raw query into a typed filter
    pub fn into_filter(self) -> SuggestionResult<SuggestionFilter> {
        let status = match self.status.as_deref() {
            Some(raw) => Some(
                SuggestionStatus::from_str(raw).map_err(SuggestionError::ValidationError)?,
            ),
            None => None,
        };
        let types = match self.category.as_deref() {
            Some(raw) => {
                let kind: EvaluatorKind =
                    raw.parse().map_err(SuggestionError::ValidationError)?;
                Some(kind.suggestion_types().to_vec())
            }
            None => None,
        };
        let limit = self.limit.unwrap_or(50);
        if !(1..=200).contains(&limit) {
            return Err(SuggestionError::ValidationError(
                "limit must be between 1 and 200".to_string(),
            ));
        }
        Ok(SuggestionFilter {
            status,
            types,
            limit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    pub(super) fn suggestion_at(priority: Priority, computed_at: DateTime<Utc>) -> Suggestion {
        let now = Utc::now();
        Suggestion {
            id: Uuid::new_v4(),
            suggestion_type: SuggestionType::Reorder,
            priority,
            status: SuggestionStatus::Pending,
            subject_kind: SubjectKind::Product,
            subject_id: Uuid::new_v4(),
            message: "refill".to_string(),
            metadata: json!({}),
            computed_at,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_ranking_priority_then_recency() {
        let t1 = Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2025, 3, 2, 8, 0, 0).unwrap();
        let t3 = Utc.with_ymd_and_hms(2025, 3, 3, 8, 0, 0).unwrap();

        let mut suggestions = vec![
            suggestion_at(Priority::Critical, t1),
            suggestion_at(Priority::High, t2),
            suggestion_at(Priority::Critical, t3),
        ];
        rank(&mut suggestions);

        let ordered: Vec<(Priority, DateTime<Utc>)> = suggestions
            .iter()
            .map(|s| (s.priority, s.computed_at))
            .collect();
        assert_eq!(
            ordered,
            vec![
                (Priority::Critical, t3),
                (Priority::Critical, t1),
                (Priority::High, t2),
            ]
        );
    }

    #[test]
    fn test_candidate_and_row_share_key() {
        let product_id = Uuid::new_v4();
        let candidate = CandidateSuggestion::new(
            SuggestionType::StockoutAlert,
            SubjectRef::Product(product_id),
            Priority::Critical,
            "out of stock".to_string(),
            json!({"available": 0}),
        );

        let mut row = suggestion_at(Priority::Critical, Utc::now());
        row.suggestion_type = SuggestionType::StockoutAlert;
        row.subject_id = product_id;

        assert_eq!(candidate.key(), row.key());
    }

    #[test]
    fn test_response_carries_typed_subject() {
        let row = suggestion_at(Priority::Medium, Utc::now());
        let subject = row.subject();
        let response = SuggestionResponse::from(row);
        assert_eq!(response.subject, subject);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["type"], "reorder");
        assert_eq!(json["subject"]["kind"], "product");
    }

    #[test]
    fn test_run_request_parses_categories() {
        let request = RunSuggestionsRequest {
            categories: Some(vec![
                "reorder".to_string(),
                "payment_due".to_string(),
                "reorder".to_string(),
            ]),
            deadline_ms: None,
            warehouse_id: None,
        };
        let kinds = request.evaluator_kinds().unwrap().unwrap();
        assert_eq!(kinds, vec![EvaluatorKind::Reorder, EvaluatorKind::PaymentDue]);

        let request = RunSuggestionsRequest {
            categories: Some(vec!["banana".to_string()]),
            deadline_ms: None,
            warehouse_id: None,
        };
        assert!(request.evaluator_kinds().is_err());

        let request = RunSuggestionsRequest::default();
        assert!(request.evaluator_kinds().unwrap().is_none());
    }

    #[test]
    fn test_list_query_into_filter() {
        let query = ListSuggestionsQuery {
            status: Some("pending".to_string()),
            category: Some("trend".to_string()),
            limit: Some(10),
        };
        let filter = query.into_filter().unwrap();
        assert_eq!(filter.status, Some(SuggestionStatus::Pending));
        assert_eq!(
            filter.types,
            Some(vec![SuggestionType::TrendUp, SuggestionType::TrendDown])
        );
        assert_eq!(filter.limit, 10);

        let query = ListSuggestionsQuery {
            status: None,
            category: None,
            limit: Some(0),
        };
        assert!(query.into_filter().is_err());

        let query = ListSuggestionsQuery {
            status: Some("archived".to_string()),
            category: None,
            limit: None,
        };
        assert!(query.into_filter().is_err());
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn priority_strategy() -> impl Strategy<Value = Priority> {
        prop_oneof![
            Just(Priority::Low),
            Just(Priority::Medium),
            Just(Priority::High),
            Just(Priority::Critical),
        ]
    }

    proptest! {
        #[test]
        fn ranking_is_total_and_stable(entries in proptest::collection::vec(
            (priority_strategy(), 0i64..1_000_000),
            0..40,
        )) {
            let base = Utc::now();
            let mut suggestions: Vec<Suggestion> = entries
                .iter()
                .map(|(priority, offset)| {
                    let mut s = super::tests::suggestion_at(
                        *priority,
                        base + chrono::Duration::seconds(*offset),
                    );
                    s.subject_id = Uuid::new_v4();
                    s
                })
                .collect();

            rank(&mut suggestions);

            for pair in suggestions.windows(2) {
                let (a, b) = (&pair[0], &pair[1]);
                prop_assert!(a.priority >= b.priority);
                if a.priority == b.priority {
                    prop_assert!(a.computed_at >= b.computed_at);
                }
            }
        }
    }
}
