// Validation utilities module
// Provides custom validation functions for domain-specific rules

use validator::ValidationError;

use crate::suggestions::EvaluatorKind;

/// Validates that a requested category list is non-empty and every entry
/// names a known evaluator (e.g. "reorder", "payment_due")
pub fn validate_categories(categories: &[String]) -> Result<(), ValidationError> {
    if categories.is_empty() {
        let mut error = ValidationError::new("categories_empty");
        error.message = Some("categories must not be empty when provided".into());
        return Err(error);
    }
    for name in categories {
        if name.parse::<EvaluatorKind>().is_err() {
            let mut error = ValidationError::new("unknown_category");
            error.message = Some(format!("unknown category: {}", name).into());
            return Err(error);
        }
    }
    Ok(())
}
