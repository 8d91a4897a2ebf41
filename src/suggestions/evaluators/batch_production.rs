use std::collections::BTreeMap;

use serde_json::json;
use uuid::Uuid;

use crate::suggestions::config::BatchProductionConfig;
use crate::suggestions::models::CandidateSuggestion;
use crate::suggestions::snapshot::ProductionDemandSnapshot;
use crate::suggestions::types::{Priority, SubjectRef, SuggestionType};

#[derive(Default)]
struct ComponentDemand {
    component_name: String,
    run_count: usize,
    total_quantity: i64,
    // operation -> setup minutes of each pending run
    operations: BTreeMap<String, Vec<i64>>,
}

/// Looks for pending production runs that share a component and could be
/// batched. Batching runs of the same operation pays its setup once, so the
/// saving for an operation is every setup minute except the largest single
/// one. Components whose total saving clears the configured minimum get a
/// suggestion, with priority scaled by how much bench time is on the table.
pub fn evaluate(
    demand: &[ProductionDemandSnapshot],
    config: &BatchProductionConfig,
) -> Vec<CandidateSuggestion> {
    let mut by_component: BTreeMap<Uuid, ComponentDemand> = BTreeMap::new();

    for entry in demand {
        let component = by_component.entry(entry.component_id).or_default();
        component.component_name = entry.component_name.clone();
        component.run_count += 1;
        component.total_quantity += entry.quantity as i64;
        component
            .operations
            .entry(entry.operation.clone())
            .or_default()
            .push(entry.setup_minutes as i64);
    }

    let mut candidates = Vec::new();

    for (component_id, component) in by_component {
        if component.run_count < 2 {
            continue;
        }
        let saved_minutes: i64 = component
            .operations
            .values()
            .map(|setups| setups.iter().sum::<i64>() - setups.iter().max().copied().unwrap_or(0))
            .sum();
        if saved_minutes < config.min_setup_saving_minutes {
            continue;
        }

        let priority = if saved_minutes >= config.min_setup_saving_minutes * 4 {
            Priority::High
        } else if saved_minutes >= config.min_setup_saving_minutes * 2 {
            Priority::Medium
        } else {
            Priority::Low
        };

        candidates.push(CandidateSuggestion::new(
            SuggestionType::BatchProduction,
            SubjectRef::Product(component_id),
            priority,
            format!(
                "{} pending runs use '{}': batching them saves about {} minutes of setup",
                component.run_count, component.component_name, saved_minutes
            ),
            json!({
                "run_count": component.run_count,
                "total_quantity": component.total_quantity,
                "operations": component.operations.len(),
                "setup_minutes_saved": saved_minutes,
            }),
        ));
    }

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(component_id: Uuid, operation: &str, quantity: i32, setup: i32) -> ProductionDemandSnapshot {
        ProductionDemandSnapshot {
            production_order_id: Uuid::new_v4(),
            component_id,
            component_name: "Oak panel".to_string(),
            operation: operation.to_string(),
            quantity,
            setup_minutes: setup,
        }
    }

    fn config() -> BatchProductionConfig {
        BatchProductionConfig {
            min_setup_saving_minutes: 30,
        }
    }

    #[test]
    fn shared_operation_runs_get_batched() {
        let component = Uuid::new_v4();
        let demand = vec![
            run(component, "cut", 10, 20),
            run(component, "cut", 5, 20),
            run(component, "cut", 8, 20),
        ];

        let out = evaluate(&demand, &config());

        // three cuts pay one setup instead of three: 40 minutes back
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].suggestion_type, SuggestionType::BatchProduction);
        assert_eq!(out[0].priority, Priority::Low);
        assert_eq!(out[0].metadata["setup_minutes_saved"], 40);
        assert_eq!(out[0].subject, SubjectRef::Product(component));
    }

    #[test]
    fn savings_add_up_across_operations() {
        let component = Uuid::new_v4();
        let demand = vec![
            run(component, "cut", 10, 20),
            run(component, "cut", 5, 20),
            run(component, "sand", 10, 45),
            run(component, "sand", 5, 45),
        ];

        let out = evaluate(&demand, &config());

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].metadata["setup_minutes_saved"], 65);
        assert_eq!(out[0].priority, Priority::Medium);
    }

    #[test]
    fn big_savings_escalate_to_high() {
        let component = Uuid::new_v4();
        let demand = vec![
            run(component, "cut", 10, 60),
            run(component, "cut", 5, 60),
            run(component, "cut", 8, 60),
        ];

        let out = evaluate(&demand, &config());

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].metadata["setup_minutes_saved"], 120);
        assert_eq!(out[0].priority, Priority::High);
    }

    #[test]
    fn distinct_operations_save_nothing() {
        let component = Uuid::new_v4();
        let demand = vec![
            run(component, "cut", 10, 90),
            run(component, "sand", 5, 90),
        ];

        let out = evaluate(&demand, &config());

        assert!(out.is_empty());
    }

    #[test]
    fn small_savings_stay_below_the_bar() {
        let component = Uuid::new_v4();
        let demand = vec![run(component, "cut", 10, 20), run(component, "cut", 5, 20)];

        let out = evaluate(&demand, &config());

        // only 20 minutes back, under the 30-minute bar
        assert!(out.is_empty());
    }

    #[test]
    fn lone_runs_are_ignored() {
        let out = evaluate(&[run(Uuid::new_v4(), "cut", 10, 200)], &config());
        assert!(out.is_empty());
    }

    #[test]
    fn components_are_grouped_independently() {
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        let demand = vec![
            run(first, "cut", 10, 40),
            run(first, "cut", 5, 40),
            run(second, "glue", 2, 35),
            run(second, "glue", 3, 35),
        ];

        let out = evaluate(&demand, &config());

        assert_eq!(out.len(), 2);
    }
}
