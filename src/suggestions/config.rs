// Evaluator threshold configuration
//
// Every numeric cutoff the evaluators use lives here with a documented
// default. Values can be overridden per deployment through SUGGEST_* env
// vars; validation happens once at engine construction, never mid-run.

use rust_decimal::Decimal;

use super::error::{SuggestionError, SuggestionResult};

/// Reorder evaluator thresholds.
///
/// Coverage ratio = coverage days / (lead time * safety factor).
/// ratio < 0.5 => CRITICAL, ratio < 1.0 => HIGH, otherwise no candidate.
#[derive(Debug, Clone)]
pub struct ReorderConfig {
    /// Multiplier applied to the product lead time (default 1.0)
    pub safety_factor: f64,
}

impl Default for ReorderConfig {
    fn default() -> Self {
        Self { safety_factor: 1.0 }
    }
}

/// Margin evaluator thresholds.
///
/// margin = (price - cost) / price, only for price > 0.
/// margin < 0 => CRITICAL, margin < floor/2 => HIGH, margin < floor => MEDIUM.
#[derive(Debug, Clone)]
pub struct MarginConfig {
    /// Minimum acceptable margin fraction (default 0.15)
    pub floor: Decimal,
}

impl Default for MarginConfig {
    fn default() -> Self {
        Self {
            floor: Decimal::new(15, 2),
        }
    }
}

/// Trend evaluator thresholds.
///
/// Compares unit sales in the current window against the prior window of
/// equal length. |change| >= threshold fires; |change| >= 2x threshold
/// escalates to HIGH.
#[derive(Debug, Clone)]
pub struct TrendConfig {
    /// Symmetric percentage-change trigger (default 0.30)
    pub threshold_pct: f64,
    /// Prior-window volume below this is too noisy to call a trend; the
    /// prior units also divide the change, so at least 1 (default 5)
    pub min_prior_units: i64,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            threshold_pct: 0.30,
            min_prior_units: 5,
        }
    }
}

/// Seasonal evaluator thresholds.
///
/// Compares the current window against the same calendar window one year
/// prior. Advisory only, so priority is capped at MEDIUM.
#[derive(Debug, Clone)]
pub struct SeasonalConfig {
    /// current / year-ago ratio that counts as a spike (default 1.3)
    pub spike_ratio: f64,
    /// Year-ago volume below this is not a usable baseline; the baseline
    /// also divides the ratio, so at least 1 (default 10)
    pub min_baseline_units: i64,
}

impl Default for SeasonalConfig {
    fn default() -> Self {
        Self {
            spike_ratio: 1.3,
            min_baseline_units: 10,
        }
    }
}

/// Batch-production evaluator thresholds.
///
/// Pending production demand that shares a component can be run as one
/// batch; the saving is (runs - 1) * setup minutes per operation.
#[derive(Debug, Clone)]
pub struct BatchProductionConfig {
    /// Minimum total setup minutes saved before suggesting a batch (default 30)
    pub min_setup_saving_minutes: i64,
}

impl Default for BatchProductionConfig {
    fn default() -> Self {
        Self {
            min_setup_saving_minutes: 30,
        }
    }
}

/// Order-grouping evaluator thresholds.
#[derive(Debug, Clone)]
pub struct OrderGroupingConfig {
    /// Fallback free-shipping threshold for suppliers without one (default 500)
    pub default_volume_threshold: Decimal,
}

impl Default for OrderGroupingConfig {
    fn default() -> Self {
        Self {
            default_volume_threshold: Decimal::new(500, 0),
        }
    }
}

/// Dead-stock evaluator thresholds.
///
/// Positive inventory with no sale for stale_days fires; doubling the
/// staleness or crossing high_value in tied-up stock escalates to HIGH.
#[derive(Debug, Clone)]
pub struct DeadStockConfig {
    /// Days without a sale before stock counts as dead (default 90)
    pub stale_days: i64,
    /// Tied-up inventory value that escalates the candidate (default 500)
    pub high_value: Decimal,
}

impl Default for DeadStockConfig {
    fn default() -> Self {
        Self {
            stale_days: 90,
            high_value: Decimal::new(500, 0),
        }
    }
}

/// Payment-due evaluator thresholds.
///
/// overdue => CRITICAL, due within due_soon_days => HIGH, due within
/// lookahead_days => MEDIUM, later dues are ignored.
#[derive(Debug, Clone)]
pub struct PaymentDueConfig {
    /// Horizon for upcoming dues (default 14)
    pub lookahead_days: i64,
    /// HIGH band edge in days before the due date (default 3)
    pub due_soon_days: i64,
}

impl Default for PaymentDueConfig {
    fn default() -> Self {
        Self {
            lookahead_days: 14,
            due_soon_days: 3,
        }
    }
}

/// Supplier-issue evaluator thresholds.
///
/// Looks at receipt history in the lookback window; a supplier fires when
/// enough receipts ran late, with HIGH reserved for chronic or severe delay.
#[derive(Debug, Clone)]
pub struct SupplierIssueConfig {
    /// Receipt history window in days (default 90)
    pub lookback_days: i64,
    /// Minimum receipts before judging a supplier (default 3)
    pub min_receipts: i64,
    /// Late-receipt ratio that fires a candidate (default 0.30)
    pub late_ratio_floor: f64,
    /// Late-receipt ratio that escalates to HIGH (default 0.60)
    pub severe_late_ratio: f64,
    /// Average delay in days that escalates to HIGH (default 7.0)
    pub severe_avg_delay_days: f64,
}

impl Default for SupplierIssueConfig {
    fn default() -> Self {
        Self {
            lookback_days: 90,
            min_receipts: 3,
            late_ratio_floor: 0.30,
            severe_late_ratio: 0.60,
            severe_avg_delay_days: 7.0,
        }
    }
}

/// Full engine configuration: one sub-config per evaluator plus the shared
/// sales lookback window.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Trailing window for sales velocity and trend comparison (default 30)
    pub sales_lookback_days: i64,
    pub reorder: ReorderConfig,
    pub margin: MarginConfig,
    pub trend: TrendConfig,
    pub seasonal: SeasonalConfig,
    pub batch: BatchProductionConfig,
    pub grouping: OrderGroupingConfig,
    pub dead_stock: DeadStockConfig,
    pub payment: PaymentDueConfig,
    pub supplier: SupplierIssueConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sales_lookback_days: 30,
            reorder: ReorderConfig::default(),
            margin: MarginConfig::default(),
            trend: TrendConfig::default(),
            seasonal: SeasonalConfig::default(),
            batch: BatchProductionConfig::default(),
            grouping: OrderGroupingConfig::default(),
            dead_stock: DeadStockConfig::default(),
            payment: PaymentDueConfig::default(),
            supplier: SupplierIssueConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Build the configuration from defaults plus SUGGEST_* env overrides.
    ///
    /// Unparsable values are logged and ignored; out-of-range values are
    /// caught by `validate` when the engine is constructed.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            sales_lookback_days: env_i64("SUGGEST_SALES_LOOKBACK_DAYS", defaults.sales_lookback_days),
            reorder: ReorderConfig {
                safety_factor: env_f64("SUGGEST_REORDER_SAFETY_FACTOR", defaults.reorder.safety_factor),
            },
            margin: MarginConfig {
                floor: env_decimal("SUGGEST_MARGIN_FLOOR", defaults.margin.floor),
            },
            trend: TrendConfig {
                threshold_pct: env_f64("SUGGEST_TREND_THRESHOLD_PCT", defaults.trend.threshold_pct),
                min_prior_units: env_i64("SUGGEST_TREND_MIN_PRIOR_UNITS", defaults.trend.min_prior_units),
            },
            seasonal: SeasonalConfig {
                spike_ratio: env_f64("SUGGEST_SEASONAL_SPIKE_RATIO", defaults.seasonal.spike_ratio),
                min_baseline_units: env_i64(
                    "SUGGEST_SEASONAL_MIN_BASELINE_UNITS",
                    defaults.seasonal.min_baseline_units,
                ),
            },
            batch: BatchProductionConfig {
                min_setup_saving_minutes: env_i64(
                    "SUGGEST_BATCH_MIN_SETUP_SAVING_MINUTES",
                    defaults.batch.min_setup_saving_minutes,
                ),
            },
            grouping: OrderGroupingConfig {
                default_volume_threshold: env_decimal(
                    "SUGGEST_GROUPING_VOLUME_THRESHOLD",
                    defaults.grouping.default_volume_threshold,
                ),
            },
            dead_stock: DeadStockConfig {
                stale_days: env_i64("SUGGEST_DEAD_STOCK_DAYS", defaults.dead_stock.stale_days),
                high_value: env_decimal("SUGGEST_DEAD_STOCK_HIGH_VALUE", defaults.dead_stock.high_value),
            },
            payment: PaymentDueConfig {
                lookahead_days: env_i64("SUGGEST_PAYMENT_LOOKAHEAD_DAYS", defaults.payment.lookahead_days),
                due_soon_days: env_i64("SUGGEST_PAYMENT_DUE_SOON_DAYS", defaults.payment.due_soon_days),
            },
            supplier: SupplierIssueConfig {
                lookback_days: env_i64("SUGGEST_SUPPLIER_LOOKBACK_DAYS", defaults.supplier.lookback_days),
                min_receipts: env_i64("SUGGEST_SUPPLIER_MIN_RECEIPTS", defaults.supplier.min_receipts),
                late_ratio_floor: env_f64(
                    "SUGGEST_SUPPLIER_LATE_RATIO_FLOOR",
                    defaults.supplier.late_ratio_floor,
                ),
                severe_late_ratio: env_f64(
                    "SUGGEST_SUPPLIER_SEVERE_LATE_RATIO",
                    defaults.supplier.severe_late_ratio,
                ),
                severe_avg_delay_days: env_f64(
                    "SUGGEST_SUPPLIER_SEVERE_AVG_DELAY_DAYS",
                    defaults.supplier.severe_avg_delay_days,
                ),
            },
        }
    }

    /// Check every threshold for sanity.
    ///
    /// Called once when the engine is constructed so a bad deployment
    /// configuration refuses to start instead of corrupting a run.
    pub fn validate(&self) -> SuggestionResult<()> {
        require_min_days("sales_lookback_days", self.sales_lookback_days)?;
        require_positive_f64("reorder.safety_factor", self.reorder.safety_factor)?;
        require_fraction("margin.floor", self.margin.floor)?;
        require_positive_f64("trend.threshold_pct", self.trend.threshold_pct)?;
        require_min_days("trend.min_prior_units", self.trend.min_prior_units)?;
        if self.seasonal.spike_ratio <= 1.0 || !self.seasonal.spike_ratio.is_finite() {
            return Err(invalid(
                "seasonal.spike_ratio",
                "must be a finite ratio greater than 1.0",
            ));
        }
        require_min_days("seasonal.min_baseline_units", self.seasonal.min_baseline_units)?;
        require_min_days(
            "batch.min_setup_saving_minutes",
            self.batch.min_setup_saving_minutes,
        )?;
        require_positive_decimal(
            "grouping.default_volume_threshold",
            self.grouping.default_volume_threshold,
        )?;
        require_min_days("dead_stock.stale_days", self.dead_stock.stale_days)?;
        require_positive_decimal("dead_stock.high_value", self.dead_stock.high_value)?;
        require_non_negative_i64("payment.lookahead_days", self.payment.lookahead_days)?;
        require_non_negative_i64("payment.due_soon_days", self.payment.due_soon_days)?;
        if self.payment.due_soon_days > self.payment.lookahead_days {
            return Err(invalid(
                "payment.due_soon_days",
                "must not exceed payment.lookahead_days",
            ));
        }
        require_min_days("supplier.lookback_days", self.supplier.lookback_days)?;
        require_min_days("supplier.min_receipts", self.supplier.min_receipts)?;
        require_fraction_f64("supplier.late_ratio_floor", self.supplier.late_ratio_floor)?;
        if self.supplier.severe_late_ratio < self.supplier.late_ratio_floor
            || self.supplier.severe_late_ratio > 1.0
        {
            return Err(invalid(
                "supplier.severe_late_ratio",
                "must lie between late_ratio_floor and 1.0",
            ));
        }
        require_positive_f64(
            "supplier.severe_avg_delay_days",
            self.supplier.severe_avg_delay_days,
        )?;
        Ok(())
    }
}

fn invalid(field: &str, reason: &str) -> SuggestionError {
    SuggestionError::InvalidConfiguration(format!("{}: {}", field, reason))
}

fn require_min_days(field: &str, value: i64) -> SuggestionResult<()> {
    if value < 1 {
        return Err(invalid(field, "must be at least 1"));
    }
    Ok(())
}

fn require_non_negative_i64(field: &str, value: i64) -> SuggestionResult<()> {
    if value < 0 {
        return Err(invalid(field, "must not be negative"));
    }
    Ok(())
}

fn require_positive_f64(field: &str, value: f64) -> SuggestionResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid(field, "must be a finite positive number"));
    }
    Ok(())
}

fn require_fraction_f64(field: &str, value: f64) -> SuggestionResult<()> {
    if !value.is_finite() || value <= 0.0 || value >= 1.0 {
        return Err(invalid(field, "must lie strictly between 0 and 1"));
    }
    Ok(())
}

fn require_fraction(field: &str, value: Decimal) -> SuggestionResult<()> {
    if value <= Decimal::ZERO || value >= Decimal::ONE {
        return Err(invalid(field, "must lie strictly between 0 and 1"));
    }
    Ok(())
}

fn require_positive_decimal(field: &str, value: Decimal) -> SuggestionResult<()> {
    if value <= Decimal::ZERO {
        return Err(invalid(field, "must be positive"));
    }
    Ok(())
}

fn env_i64(key: &str, default: i64) -> i64 {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring unparsable {}={}", key, raw);
            default
        }),
        Err(_) => default,
    }
}

fn env_f64(key: &str, default: f64) -> f64 {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring unparsable {}={}", key, raw);
            default
        }),
        Err(_) => default,
    }
}

fn env_decimal(key: &str, default: Decimal) -> Decimal {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring unparsable {}={}", key, raw);
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.sales_lookback_days, 30);
        assert_eq!(config.margin.floor, dec!(0.15));
        assert_eq!(config.dead_stock.stale_days, 90);
        assert_eq!(config.payment.lookahead_days, 14);
    }

    #[test]
    fn test_negative_lookback_rejected() {
        let mut config = EngineConfig::default();
        config.sales_lookback_days = -5;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("sales_lookback_days"));
    }

    #[test]
    fn test_margin_floor_bounds() {
        let mut config = EngineConfig::default();
        config.margin.floor = dec!(0);
        assert!(config.validate().is_err());

        config.margin.floor = dec!(1);
        assert!(config.validate().is_err());

        config.margin.floor = dec!(0.35);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_seasonal_spike_ratio_must_exceed_one() {
        let mut config = EngineConfig::default();
        config.seasonal.spike_ratio = 1.0;
        assert!(config.validate().is_err());

        config.seasonal.spike_ratio = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_volume_guards_must_be_positive() {
        // both guards divide in their evaluators; zero would let a ratio
        // through as inf or NaN
        let mut config = EngineConfig::default();
        config.trend.min_prior_units = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("trend.min_prior_units"));

        let mut config = EngineConfig::default();
        config.seasonal.min_baseline_units = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("seasonal.min_baseline_units"));
    }

    #[test]
    fn test_payment_windows_must_nest() {
        let mut config = EngineConfig::default();
        config.payment.due_soon_days = 20;
        config.payment.lookahead_days = 14;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("due_soon_days"));
    }

    #[test]
    fn test_supplier_ratios_must_order() {
        let mut config = EngineConfig::default();
        config.supplier.severe_late_ratio = 0.1;
        assert!(config.validate().is_err());

        config.supplier.severe_late_ratio = 0.9;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides_apply() {
        std::env::set_var("SUGGEST_DEAD_STOCK_DAYS", "120");
        std::env::set_var("SUGGEST_MARGIN_FLOOR", "0.20");
        std::env::set_var("SUGGEST_TREND_THRESHOLD_PCT", "not-a-number");

        let config = EngineConfig::from_env();
        assert_eq!(config.dead_stock.stale_days, 120);
        assert_eq!(config.margin.floor, dec!(0.20));
        // Unparsable override falls back to the default.
        assert_eq!(config.trend.threshold_pct, 0.30);

        std::env::remove_var("SUGGEST_DEAD_STOCK_DAYS");
        std::env::remove_var("SUGGEST_MARGIN_FLOOR");
        std::env::remove_var("SUGGEST_TREND_THRESHOLD_PCT");
    }
}
