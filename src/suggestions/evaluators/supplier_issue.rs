use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde_json::json;
use uuid::Uuid;

use crate::suggestions::config::SupplierIssueConfig;
use crate::suggestions::models::CandidateSuggestion;
use crate::suggestions::snapshot::SupplierReceiptSnapshot;
use crate::suggestions::types::{Priority, SubjectRef, SuggestionType};

#[derive(Default)]
struct SupplierRecord {
    supplier_name: String,
    total: usize,
    late: usize,
    late_delay_days: i64,
}

/// Scores supplier reliability over the recent receipt history. A receipt is
/// late once its goods arrive after the expected date, or once that date has
/// passed with nothing received yet. Suppliers need a minimum number of
/// receipts before they are judged at all; past that, a late ratio over the
/// floor fires, escalating when lateness is chronic or the delays are long.
pub fn evaluate(
    receipts: &[SupplierReceiptSnapshot],
    config: &SupplierIssueConfig,
    today: NaiveDate,
) -> Vec<CandidateSuggestion> {
    let mut by_supplier: BTreeMap<Uuid, SupplierRecord> = BTreeMap::new();

    for receipt in receipts {
        let record = by_supplier.entry(receipt.supplier_id).or_default();
        record.supplier_name = receipt.supplier_name.clone();
        record.total += 1;

        let delay_days = match receipt.received_at {
            Some(received) => (received.date_naive() - receipt.expected_by).num_days(),
            None => (today - receipt.expected_by).num_days(),
        };
        if delay_days > 0 {
            record.late += 1;
            record.late_delay_days += delay_days;
        }
    }

    let mut candidates = Vec::new();

    for (supplier_id, record) in by_supplier {
        if (record.total as i64) < config.min_receipts || record.late == 0 {
            continue;
        }
        let late_ratio = record.late as f64 / record.total as f64;
        if late_ratio < config.late_ratio_floor {
            continue;
        }
        let avg_delay_days = record.late_delay_days as f64 / record.late as f64;

        let priority = if late_ratio >= config.severe_late_ratio
            || avg_delay_days >= config.severe_avg_delay_days
        {
            Priority::High
        } else {
            Priority::Medium
        };

        candidates.push(CandidateSuggestion::new(
            SuggestionType::SupplierIssue,
            SubjectRef::Supplier(supplier_id),
            priority,
            format!(
                "{}: {} of {} deliveries late in the last {} days, average delay {:.1} days",
                record.supplier_name,
                record.late,
                record.total,
                config.lookback_days,
                avg_delay_days
            ),
            json!({
                "receipts": record.total,
                "late": record.late,
                "late_ratio": late_ratio,
                "avg_delay_days": avg_delay_days,
                "lookback_days": config.lookback_days,
            }),
        ));
    }

    candidates
}
