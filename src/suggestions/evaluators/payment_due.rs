use chrono::NaiveDate;
use serde_json::json;

use crate::suggestions::config::PaymentDueConfig;
use crate::suggestions::models::CandidateSuggestion;
use crate::suggestions::snapshot::PaymentDueSnapshot;
use crate::suggestions::types::{Priority, SubjectRef, SuggestionType};

/// Flags open payment deadlines. Anything already past its due date is
/// critical; deadlines inside the due-soon band are high and the rest of
/// the lookahead horizon is medium. Deadlines beyond the horizon are left
/// alone until a later run.
pub fn evaluate(
    dues: &[PaymentDueSnapshot],
    config: &PaymentDueConfig,
    today: NaiveDate,
) -> Vec<CandidateSuggestion> {
    let mut candidates = Vec::new();

    for due in dues {
        let days_until = (due.due_date - today).num_days();
        if days_until > config.lookahead_days {
            continue;
        }

        let priority = if days_until < 0 {
            Priority::Critical
        } else if days_until <= config.due_soon_days {
            Priority::High
        } else {
            Priority::Medium
        };

        let message = if days_until < 0 {
            format!(
                "Payment of \u{20ac}{} to {} is {} days overdue",
                due.amount, due.counterparty, -days_until
            )
        } else if days_until == 0 {
            format!(
                "Payment of \u{20ac}{} to {} is due today",
                due.amount, due.counterparty
            )
        } else {
            format!(
                "Payment of \u{20ac}{} to {} is due in {} days",
                due.amount, due.counterparty, days_until
            )
        };

        candidates.push(CandidateSuggestion::new(
            SuggestionType::PaymentDue,
            SubjectRef::PaymentDue(due.payment_due_id),
            priority,
            message,
            json!({
                "amount": due.amount,
                "due_date": due.due_date,
                "days_until_due": days_until,
                "counterparty": due.counterparty,
                "supplier_id": due.supplier_id,
            }),
        ));
    }

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn due_in(days: i64) -> PaymentDueSnapshot {
        let today = today();
        PaymentDueSnapshot {
            payment_due_id: Uuid::new_v4(),
            supplier_id: Some(Uuid::new_v4()),
            counterparty: "Torrefazione Alba".to_string(),
            amount: dec!(1250.00),
            due_date: today + chrono::Duration::days(days),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    }

    fn config() -> PaymentDueConfig {
        PaymentDueConfig {
            lookahead_days: 14,
            due_soon_days: 3,
        }
    }

    #[test]
    fn due_in_two_days_is_high() {
        let out = evaluate(&[due_in(2)], &config(), today());

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].suggestion_type, SuggestionType::PaymentDue);
        assert_eq!(out[0].priority, Priority::High);
    }

    #[test]
    fn due_in_ten_days_is_medium() {
        let out = evaluate(&[due_in(10)], &config(), today());

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].priority, Priority::Medium);
    }

    #[test]
    fn overdue_is_critical() {
        let out = evaluate(&[due_in(-1)], &config(), today());

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].priority, Priority::Critical);
        assert!(out[0].message.contains("1 days overdue"));
    }

    #[test]
    fn due_today_is_high() {
        let out = evaluate(&[due_in(0)], &config(), today());

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].priority, Priority::High);
        assert!(out[0].message.contains("due today"));
    }

    #[test]
    fn due_soon_boundary_is_inclusive() {
        let out = evaluate(&[due_in(3)], &config(), today());

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].priority, Priority::High);
    }

    #[test]
    fn beyond_the_horizon_is_ignored() {
        let out = evaluate(&[due_in(15)], &config(), today());

        assert!(out.is_empty());
    }

    #[test]
    fn horizon_boundary_is_inclusive() {
        let out = evaluate(&[due_in(14)], &config(), today());

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].priority, Priority::Medium);
    }

    #[test]
    fn subject_is_the_deadline_itself() {
        let due = due_in(2);
        let id = due.payment_due_id;

        let out = evaluate(&[due], &config(), today());

        assert_eq!(out[0].subject, SubjectRef::PaymentDue(id));
    }
}
