// Suggestion engine
//
// Turns operational data into ranked, actionable suggestions. Snapshot
// loads and rule evaluation run concurrently per category; persistence is
// serialized afterwards so the one-pending-per-subject invariant never
// races. A category that fails to load or evaluate is reported and skipped,
// it never takes the rest of the run down with it.

pub mod config;
pub mod error;
pub mod evaluators;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod repository;
pub mod snapshot;
pub mod status_machine;
pub mod types;

pub use config::EngineConfig;
pub use error::{SuggestionError, SuggestionResult};
pub use metrics::EngineMetrics;
pub use models::{
    CandidateSuggestion, EngineRunReport, Suggestion, SuggestionFilter, SuggestionResponse,
};
pub use repository::PgDataFacade;
pub use snapshot::{ActivityWindow, DataFacade, RunScope};
pub use status_machine::StatusMachine;
pub use types::{
    EvaluatorKind, Priority, SubjectKind, SubjectRef, SuggestionStatus, SuggestionType,
};

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, NaiveDate, Utc};
use tokio::task::JoinSet;
use tracing::{error, info, warn};
use uuid::Uuid;

use models::SuggestionKey;
use snapshot::{
    PaymentDueSnapshot, ProductSnapshot, ProductionDemandSnapshot, PurchaseDraftSnapshot,
    SupplierReceiptSnapshot,
};

const UPSERT_RETRY_BACKOFF: Duration = Duration::from_millis(100);

/// The snapshot each evaluator reads. Several evaluators share the product
/// feed, so sources are loaded once per run, not once per category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceKind {
    Products,
    Dues,
    Receipts,
    Demand,
    Drafts,
}

fn source_for(kind: EvaluatorKind) -> SourceKind {
    match kind {
        EvaluatorKind::Reorder
        | EvaluatorKind::Stockout
        | EvaluatorKind::Margin
        | EvaluatorKind::Trend
        | EvaluatorKind::Seasonal
        | EvaluatorKind::DeadStock => SourceKind::Products,
        EvaluatorKind::PaymentDue => SourceKind::Dues,
        EvaluatorKind::SupplierIssue => SourceKind::Receipts,
        EvaluatorKind::BatchProduction => SourceKind::Demand,
        EvaluatorKind::OrderGrouping => SourceKind::Drafts,
    }
}

/// Loaded snapshots, shared across evaluator tasks without copying.
#[derive(Default, Clone)]
struct LoadedSources {
    products: Option<Arc<Vec<ProductSnapshot>>>,
    dues: Option<Arc<Vec<PaymentDueSnapshot>>>,
    receipts: Option<Arc<Vec<SupplierReceiptSnapshot>>>,
    demand: Option<Arc<Vec<ProductionDemandSnapshot>>>,
    drafts: Option<Arc<Vec<PurchaseDraftSnapshot>>>,
}

fn evaluate_category(
    kind: EvaluatorKind,
    config: &EngineConfig,
    sources: &LoadedSources,
    window: &ActivityWindow,
    today: NaiveDate,
    now: DateTime<Utc>,
) -> Vec<CandidateSuggestion> {
    match kind {
        EvaluatorKind::Reorder => sources
            .products
            .as_deref()
            .map(|p| evaluators::reorder::evaluate(p, &config.reorder, window))
            .unwrap_or_default(),
        EvaluatorKind::Stockout => sources
            .products
            .as_deref()
            .map(|p| evaluators::stockout::evaluate(p))
            .unwrap_or_default(),
        EvaluatorKind::Margin => sources
            .products
            .as_deref()
            .map(|p| evaluators::margin::evaluate(p, &config.margin))
            .unwrap_or_default(),
        EvaluatorKind::Trend => sources
            .products
            .as_deref()
            .map(|p| evaluators::trend::evaluate(p, &config.trend, window))
            .unwrap_or_default(),
        EvaluatorKind::Seasonal => sources
            .products
            .as_deref()
            .map(|p| evaluators::seasonal::evaluate(p, &config.seasonal, window))
            .unwrap_or_default(),
        EvaluatorKind::DeadStock => sources
            .products
            .as_deref()
            .map(|p| evaluators::dead_stock::evaluate(p, &config.dead_stock, now))
            .unwrap_or_default(),
        EvaluatorKind::PaymentDue => sources
            .dues
            .as_deref()
            .map(|d| evaluators::payment_due::evaluate(d, &config.payment, today))
            .unwrap_or_default(),
        EvaluatorKind::SupplierIssue => sources
            .receipts
            .as_deref()
            .map(|r| evaluators::supplier_issue::evaluate(r, &config.supplier, today))
            .unwrap_or_default(),
        EvaluatorKind::BatchProduction => sources
            .demand
            .as_deref()
            .map(|d| evaluators::batch_production::evaluate(d, &config.batch))
            .unwrap_or_default(),
        EvaluatorKind::OrderGrouping => sources
            .drafts
            .as_deref()
            .map(|d| evaluators::order_grouping::evaluate(d, &config.grouping))
            .unwrap_or_default(),
    }
}

async fn with_deadline<T, F>(
    deadline_at: Option<Instant>,
    label: &str,
    fut: F,
) -> SuggestionResult<T>
where
    F: Future<Output = SuggestionResult<T>>,
{
    match deadline_at {
        Some(at) => {
            let remaining = at.saturating_duration_since(Instant::now());
            match tokio::time::timeout(remaining, fut).await {
                Ok(result) => result,
                Err(_) => Err(SuggestionError::DeadlineExceeded(format!(
                    "{} load timed out",
                    label
                ))),
            }
        }
        None => fut.await,
    }
}

fn deadline_expired(deadline_at: Option<Instant>) -> bool {
    deadline_at.map(|at| Instant::now() >= at).unwrap_or(false)
}

/// Orchestrates the rule evaluators over a data facade.
pub struct SuggestionEngine {
    facade: Arc<dyn DataFacade>,
    config: EngineConfig,
    metrics: Arc<EngineMetrics>,
}

impl SuggestionEngine {
    /// Builds an engine, rejecting an invalid configuration up front rather
    /// than at first use.
    pub fn new(facade: Arc<dyn DataFacade>, config: EngineConfig) -> SuggestionResult<Self> {
        config.validate()?;
        Ok(Self {
            facade,
            config,
            metrics: Arc::new(EngineMetrics::new()),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn metrics(&self) -> &Arc<EngineMetrics> {
        &self.metrics
    }

    /// Runs the requested categories (all ten when `categories` is `None`)
    /// and refreshes the suggestion store.
    ///
    /// Snapshots load concurrently, evaluators run as parallel tasks, then
    /// upserts are applied one at a time. Under a deadline the run returns
    /// whatever it managed to persist instead of hanging; categories that
    /// could not run are listed in the report.
    pub async fn run(
        &self,
        scope: RunScope,
        categories: Option<Vec<EvaluatorKind>>,
        deadline: Option<Duration>,
    ) -> SuggestionResult<EngineRunReport> {
        let _timer = self.metrics.start_run();
        let started = Instant::now();
        let started_at = Utc::now();
        let deadline_at = deadline.map(|d| started + d);

        let mut requested: Vec<EvaluatorKind> = Vec::new();
        for kind in categories.unwrap_or_else(|| EvaluatorKind::ALL.to_vec()) {
            if !requested.contains(&kind) {
                requested.push(kind);
            }
        }

        let now = started_at;
        let today = now.date_naive();
        let window = ActivityWindow::ending_at(now, self.config.sales_lookback_days);

        let mut failed: Vec<EvaluatorKind> = Vec::new();
        let sources = self
            .load_sources(&requested, scope, &window, today, now, deadline_at, &mut failed)
            .await;

        // Evaluate each runnable category as its own task. A panicking
        // evaluator surfaces as a join error and only loses its own category.
        let mut eval_set: JoinSet<(EvaluatorKind, Vec<CandidateSuggestion>)> = JoinSet::new();
        for kind in requested.iter().copied() {
            if failed.contains(&kind) {
                continue;
            }
            let config = self.config.clone();
            let sources = sources.clone();
            eval_set.spawn(async move {
                let candidates = evaluate_category(kind, &config, &sources, &window, today, now);
                (kind, candidates)
            });
        }

        let mut candidates_by_kind: HashMap<EvaluatorKind, Vec<CandidateSuggestion>> =
            HashMap::new();
        while let Some(joined) = eval_set.join_next().await {
            match joined {
                Ok((kind, candidates)) => {
                    self.metrics.record_evaluator(kind, candidates.len() as u64);
                    candidates_by_kind.insert(kind, candidates);
                }
                Err(join_error) => {
                    error!(error = %join_error, "evaluator task failed");
                }
            }
        }
        // A requested category with neither output nor a load failure lost
        // its task; mark it failed.
        for kind in requested.iter().copied() {
            if !candidates_by_kind.contains_key(&kind) && !failed.contains(&kind) {
                self.metrics.record_evaluator_failure(kind);
                failed.push(kind);
            }
        }

        let total_candidates: usize = candidates_by_kind.values().map(Vec::len).sum();
        let mut fresh_keys: HashSet<SuggestionKey> = HashSet::new();
        for candidates in candidates_by_kind.values() {
            for candidate in candidates {
                fresh_keys.insert(candidate.key());
            }
        }

        // Serialized persistence. One writer at a time keeps upserts from
        // racing on the pending-key index.
        let mut persisted: Vec<Suggestion> = Vec::new();
        let mut attempted_by_kind: HashMap<EvaluatorKind, usize> = HashMap::new();
        let mut upsert_failures = 0usize;
        let mut deadline_hit = false;
        'kinds: for kind in requested.iter().copied() {
            let Some(candidates) = candidates_by_kind.get(&kind) else {
                continue;
            };
            for candidate in candidates {
                if deadline_expired(deadline_at) {
                    warn!("deadline reached during persistence, returning partial results");
                    deadline_hit = true;
                    break 'kinds;
                }
                *attempted_by_kind.entry(kind).or_default() += 1;
                match self.upsert_with_retry(candidate, now).await {
                    Ok(suggestion) => persisted.push(suggestion),
                    Err(e) => {
                        error!(
                            category = %kind,
                            subject = %candidate.subject,
                            error = %e,
                            "failed to persist suggestion"
                        );
                        upsert_failures += 1;
                    }
                }
            }
        }

        // Categories the deadline cut off mid-persistence count as failed:
        // part of their output never reached the store.
        if deadline_hit {
            for kind in requested.iter().copied() {
                if failed.contains(&kind) {
                    continue;
                }
                let total = candidates_by_kind.get(&kind).map(Vec::len).unwrap_or(0);
                let attempted = attempted_by_kind.get(&kind).copied().unwrap_or(0);
                if attempted < total {
                    self.metrics.record_evaluator_failure(kind);
                    failed.push(kind);
                }
            }
        }

        // Pending rows no longer backed by the data get auto-resolved, but
        // only for categories that actually evaluated this run.
        let mut resolved = 0usize;
        if !deadline_hit {
            let mut reconcile_types: Vec<SuggestionType> = Vec::new();
            for kind in requested.iter().copied() {
                if !failed.contains(&kind) {
                    reconcile_types.extend_from_slice(kind.suggestion_types());
                }
            }
            match self.reconcile_stale(&reconcile_types, &fresh_keys).await {
                Ok(count) => resolved = count as usize,
                Err(e) => warn!(error = %e, "stale suggestion reconciliation failed"),
            }
        }

        models::rank(&mut persisted);
        let report = EngineRunReport {
            started_at,
            duration_ms: started.elapsed().as_millis() as u64,
            requested,
            failed,
            candidates: total_candidates,
            persisted: persisted.len(),
            resolved,
            upsert_failures,
            suggestions: persisted.into_iter().map(SuggestionResponse::from).collect(),
        };

        self.metrics.record_persisted(report.persisted as u64);
        self.metrics.record_resolved(report.resolved as u64);
        if report.failed.is_empty() {
            self.metrics.record_run_completed();
        } else {
            self.metrics.record_run_failed();
        }
        info!(
            requested = report.requested.len(),
            failed = report.failed.len(),
            persisted = report.persisted,
            resolved = report.resolved,
            duration_ms = report.duration_ms,
            "suggestion run finished"
        );

        Ok(report)
    }

    #[allow(clippy::too_many_arguments)]
    async fn load_sources(
        &self,
        requested: &[EvaluatorKind],
        scope: RunScope,
        window: &ActivityWindow,
        today: NaiveDate,
        now: DateTime<Utc>,
        deadline_at: Option<Instant>,
        failed: &mut Vec<EvaluatorKind>,
    ) -> LoadedSources {
        let needs = |source: SourceKind| requested.iter().any(|k| source_for(*k) == source);

        let (products, dues, receipts, demand, drafts) = tokio::join!(
            async {
                if !needs(SourceKind::Products) {
                    return None;
                }
                Some(
                    with_deadline(
                        deadline_at,
                        "product activity",
                        self.facade.product_activity(scope, window),
                    )
                    .await,
                )
            },
            async {
                if !needs(SourceKind::Dues) {
                    return None;
                }
                let horizon = today + chrono::Duration::days(self.config.payment.lookahead_days);
                Some(with_deadline(deadline_at, "payment dues", self.facade.payment_dues(horizon)).await)
            },
            async {
                if !needs(SourceKind::Receipts) {
                    return None;
                }
                let since = now - chrono::Duration::days(self.config.supplier.lookback_days);
                Some(
                    with_deadline(
                        deadline_at,
                        "supplier receipts",
                        self.facade.supplier_receipts(since),
                    )
                    .await,
                )
            },
            async {
                if !needs(SourceKind::Demand) {
                    return None;
                }
                Some(
                    with_deadline(
                        deadline_at,
                        "production demand",
                        self.facade.production_demand(),
                    )
                    .await,
                )
            },
            async {
                if !needs(SourceKind::Drafts) {
                    return None;
                }
                Some(
                    with_deadline(
                        deadline_at,
                        "draft purchase orders",
                        self.facade.draft_purchase_orders(),
                    )
                    .await,
                )
            },
        );

        let mut sources = LoadedSources::default();
        let mut mark_failed = |source: SourceKind, error: &SuggestionError| {
            for kind in requested.iter().copied() {
                if source_for(kind) == source && !failed.contains(&kind) {
                    warn!(category = %kind, error = %error, "snapshot load failed, category skipped");
                    self.metrics.record_evaluator_failure(kind);
                    failed.push(kind);
                }
            }
        };

        match products {
            Some(Ok(rows)) => sources.products = Some(Arc::new(rows)),
            Some(Err(e)) => mark_failed(SourceKind::Products, &e),
            None => {}
        }
        match dues {
            Some(Ok(rows)) => sources.dues = Some(Arc::new(rows)),
            Some(Err(e)) => mark_failed(SourceKind::Dues, &e),
            None => {}
        }
        match receipts {
            Some(Ok(rows)) => sources.receipts = Some(Arc::new(rows)),
            Some(Err(e)) => mark_failed(SourceKind::Receipts, &e),
            None => {}
        }
        match demand {
            Some(Ok(rows)) => sources.demand = Some(Arc::new(rows)),
            Some(Err(e)) => mark_failed(SourceKind::Demand, &e),
            None => {}
        }
        match drafts {
            Some(Ok(rows)) => sources.drafts = Some(Arc::new(rows)),
            Some(Err(e)) => mark_failed(SourceKind::Drafts, &e),
            None => {}
        }

        sources
    }

    /// One immediate retry on transient database failures, then give up on
    /// this candidate and let the run continue.
    async fn upsert_with_retry(
        &self,
        candidate: &CandidateSuggestion,
        computed_at: DateTime<Utc>,
    ) -> SuggestionResult<Suggestion> {
        match self.facade.upsert_suggestion(candidate, computed_at).await {
            Err(e) if e.is_transient() => {
                self.metrics.record_upsert_retry();
                warn!(error = %e, "transient upsert failure, retrying once");
                tokio::time::sleep(UPSERT_RETRY_BACKOFF).await;
                self.facade.upsert_suggestion(candidate, computed_at).await
            }
            other => other,
        }
    }

    async fn reconcile_stale(
        &self,
        types: &[SuggestionType],
        fresh: &HashSet<SuggestionKey>,
    ) -> SuggestionResult<u64> {
        let pending = self.facade.pending_for_types(types).await?;
        let stale: Vec<Uuid> = pending
            .iter()
            .filter(|s| !fresh.contains(&s.key()))
            .map(|s| s.id)
            .collect();
        if stale.is_empty() {
            return Ok(0);
        }
        let resolved = self.facade.resolve_suggestions(&stale).await?;
        info!(resolved, "auto-resolved suggestions no longer supported by the data");
        Ok(resolved)
    }

    /// Ranked listing straight from the store.
    pub async fn list(&self, filter: &SuggestionFilter) -> SuggestionResult<Vec<Suggestion>> {
        self.facade.list_suggestions(filter).await
    }

    pub async fn get(&self, id: Uuid) -> SuggestionResult<Suggestion> {
        self.facade
            .get_suggestion(id)
            .await?
            .ok_or(SuggestionError::SuggestionNotFound(id))
    }

    /// Applies a status change through the transition rules. Re-applying the
    /// current status is accepted without touching the row.
    pub async fn transition(
        &self,
        id: Uuid,
        target: SuggestionStatus,
    ) -> SuggestionResult<Suggestion> {
        let current = self.get(id).await?;
        let next = StatusMachine::transition(current.status, target)
            .map_err(SuggestionError::InvalidTransition)?;
        if next == current.status {
            return Ok(current);
        }
        self.facade.set_suggestion_status(id, next).await
    }
}
