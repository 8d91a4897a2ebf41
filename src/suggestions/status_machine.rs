use crate::suggestions::SuggestionStatus;

/// Lifecycle rules for suggestion statuses
pub struct StatusMachine;

impl StatusMachine {
    /// Check if a status transition is valid
    ///
    /// # Arguments
    /// * `from` - Current suggestion status
    /// * `to` - Desired new status
    ///
    /// # Returns
    /// `true` if the transition is valid, `false` otherwise
    ///
    /// # Valid Transitions
    /// - Pending → Acknowledged, Resolved, Dismissed
    /// - Acknowledged → Resolved, Dismissed
    /// - Resolved → (terminal, kept for audit)
    /// - Dismissed → (terminal, kept for audit)
    /// - Any status → Same status (idempotent)
    pub fn is_valid_transition(from: SuggestionStatus, to: SuggestionStatus) -> bool {
        // Same status is always valid (idempotent)
        if from == to {
            return true;
        }

        match (from, to) {
            // From Pending
            (SuggestionStatus::Pending, SuggestionStatus::Acknowledged) => true,
            (SuggestionStatus::Pending, SuggestionStatus::Resolved) => true,
            (SuggestionStatus::Pending, SuggestionStatus::Dismissed) => true,

            // From Acknowledged
            (SuggestionStatus::Acknowledged, SuggestionStatus::Resolved) => true,
            (SuggestionStatus::Acknowledged, SuggestionStatus::Dismissed) => true,

            // Terminal states admit no exits (same status handled above)
            (SuggestionStatus::Resolved, _) => false,
            (SuggestionStatus::Dismissed, _) => false,

            // All other transitions are invalid
            _ => false,
        }
    }

    /// Attempt to transition from one status to another
    ///
    /// # Returns
    /// `Ok(to)` if the transition is valid, `Err(message)` otherwise
    pub fn transition(
        from: SuggestionStatus,
        to: SuggestionStatus,
    ) -> Result<SuggestionStatus, String> {
        if Self::is_valid_transition(from, to) {
            Ok(to)
        } else {
            Err(format!("Invalid status transition from {} to {}", from, to))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_to_acknowledged() {
        assert!(StatusMachine::is_valid_transition(
            SuggestionStatus::Pending,
            SuggestionStatus::Acknowledged
        ));
    }

    #[test]
    fn test_pending_to_resolved() {
        // The orchestrator auto-resolves stale suggestions straight from Pending.
        assert!(StatusMachine::is_valid_transition(
            SuggestionStatus::Pending,
            SuggestionStatus::Resolved
        ));
    }

    #[test]
    fn test_pending_to_dismissed() {
        assert!(StatusMachine::is_valid_transition(
            SuggestionStatus::Pending,
            SuggestionStatus::Dismissed
        ));
    }

    #[test]
    fn test_acknowledged_to_resolved() {
        assert!(StatusMachine::is_valid_transition(
            SuggestionStatus::Acknowledged,
            SuggestionStatus::Resolved
        ));
    }

    #[test]
    fn test_acknowledged_to_dismissed() {
        assert!(StatusMachine::is_valid_transition(
            SuggestionStatus::Acknowledged,
            SuggestionStatus::Dismissed
        ));
    }

    #[test]
    fn test_acknowledged_cannot_return_to_pending() {
        assert!(!StatusMachine::is_valid_transition(
            SuggestionStatus::Acknowledged,
            SuggestionStatus::Pending
        ));
    }

    #[test]
    fn test_resolved_is_terminal() {
        assert!(!StatusMachine::is_valid_transition(
            SuggestionStatus::Resolved,
            SuggestionStatus::Pending
        ));
        assert!(!StatusMachine::is_valid_transition(
            SuggestionStatus::Resolved,
            SuggestionStatus::Acknowledged
        ));
        assert!(!StatusMachine::is_valid_transition(
            SuggestionStatus::Resolved,
            SuggestionStatus::Dismissed
        ));
    }

    #[test]
    fn test_dismissed_is_terminal() {
        assert!(!StatusMachine::is_valid_transition(
            SuggestionStatus::Dismissed,
            SuggestionStatus::Pending
        ));
        assert!(!StatusMachine::is_valid_transition(
            SuggestionStatus::Dismissed,
            SuggestionStatus::Acknowledged
        ));
        assert!(!StatusMachine::is_valid_transition(
            SuggestionStatus::Dismissed,
            SuggestionStatus::Resolved
        ));
    }

    #[test]
    fn test_transition_returns_target_status() {
        let result = StatusMachine::transition(
            SuggestionStatus::Pending,
            SuggestionStatus::Acknowledged,
        );
        assert_eq!(result, Ok(SuggestionStatus::Acknowledged));
    }

    #[test]
    fn test_transition_error_names_both_statuses() {
        let err = StatusMachine::transition(
            SuggestionStatus::Resolved,
            SuggestionStatus::Pending,
        )
        .unwrap_err();
        assert!(err.contains("resolved"));
        assert!(err.contains("pending"));
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn status_strategy() -> impl Strategy<Value = SuggestionStatus> {
        prop_oneof![
            Just(SuggestionStatus::Pending),
            Just(SuggestionStatus::Acknowledged),
            Just(SuggestionStatus::Resolved),
            Just(SuggestionStatus::Dismissed),
        ]
    }

    /// Property: Same status transitions are always valid (idempotent)
    #[test]
    fn prop_same_status_is_valid() {
        proptest!(|(status in status_strategy())| {
            prop_assert!(StatusMachine::is_valid_transition(status, status));
        });
    }

    /// Property: terminal statuses admit no transitions to a different status
    #[test]
    fn prop_terminal_statuses_have_no_exits() {
        proptest!(|(from in status_strategy(), to in status_strategy())| {
            if from.is_terminal() && from != to {
                prop_assert!(!StatusMachine::is_valid_transition(from, to));
            }
        });
    }

    /// Property: every non-terminal status can reach both terminal states
    #[test]
    fn prop_terminal_states_reachable() {
        proptest!(|(from in status_strategy())| {
            if !from.is_terminal() {
                prop_assert!(StatusMachine::is_valid_transition(from, SuggestionStatus::Resolved));
                prop_assert!(StatusMachine::is_valid_transition(from, SuggestionStatus::Dismissed));
            }
        });
    }

    /// Property: transition() and is_valid_transition() agree
    #[test]
    fn prop_transition_consistency() {
        proptest!(|(
            from in status_strategy(),
            to in status_strategy()
        )| {
            let is_valid = StatusMachine::is_valid_transition(from, to);
            let result = StatusMachine::transition(from, to);

            if is_valid {
                prop_assert_eq!(result, Ok(to));
            } else {
                prop_assert!(result.is_err());
            }
        });
    }
}
