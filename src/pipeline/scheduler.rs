//! Tier-by-tier pipeline execution.
//!
//! Tiers run strictly sequentially; members of a tier run concurrently,
//! bounded by a semaphore. A failed or timed-out dependency never blocks a
//! dependent: the dependent is scheduled regardless and observes the failure
//! in its snapshot. The run always completes and always yields a result for
//! every scheduled agent.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::agent::AgentRegistry;
use super::context::DealInput;
use super::envelope::{run_agent, EnvelopeParams};
use super::ledger::CostLedger;
use super::resolver::{PipelineError, TierPlan};
use super::result::{AgentResult, FailureKind};
use super::store::ResultStore;
use crate::config::Config;
use crate::llm::ReasoningClient;

/// Run-level summary returned by every pipeline run, success or not.
#[derive(Debug)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    /// Result for every scheduled agent; failures included as data.
    pub results: ResultStore,
    /// Aggregate of all per-agent ledgers.
    pub totals: CostLedger,
    pub wall_time_ms: u64,
    pub agents_succeeded: usize,
    pub agents_failed: usize,
}

impl RunReport {
    /// Total spend for the run in cents. Always equals the sum of the
    /// per-agent costs: totals are built by folding agent ledgers.
    pub fn total_cost_cents(&self) -> u64 {
        self.totals.cost_cents
    }

    /// JSON rendering for reporting surfaces.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "run_id": self.run_id,
            "started_at": self.started_at.to_rfc3339(),
            "wall_time_ms": self.wall_time_ms,
            "total_cost_cents": self.total_cost_cents(),
            "calls": self.totals.calls,
            "input_tokens": self.totals.input_tokens,
            "output_tokens": self.totals.output_tokens,
            "agents_succeeded": self.agents_succeeded,
            "agents_failed": self.agents_failed,
            "results": self.results.iter().collect::<Vec<_>>(),
        })
    }
}

/// The due-diligence pipeline: a resolved tier plan over a registry of
/// agents, executed against one deal at a time.
pub struct Pipeline {
    registry: AgentRegistry,
    plan: TierPlan,
    llm: Arc<dyn ReasoningClient>,
    default_timeout_ms: u64,
    max_tier_concurrency: usize,
    pipeline_deadline_ms: Option<u64>,
    temperature: f64,
}

impl Pipeline {
    /// Build a pipeline. Configuration errors (cycles, unknown or duplicate
    /// dependencies) are fatal here; the pipeline never starts with a bad
    /// graph.
    pub fn new(
        registry: AgentRegistry,
        config: &Config,
        llm: Arc<dyn ReasoningClient>,
    ) -> Result<Self, PipelineError> {
        let plan = TierPlan::build(&registry.descriptors())?;
        tracing::info!(
            agents = plan.agent_count(),
            tiers = plan.tiers().len(),
            "Pipeline plan resolved"
        );
        Ok(Self {
            registry,
            plan,
            llm,
            default_timeout_ms: config.agent_timeout_ms,
            max_tier_concurrency: config.max_tier_concurrency,
            pipeline_deadline_ms: config.pipeline_deadline_ms,
            temperature: config.temperature,
        })
    }

    /// The resolved tier plan.
    pub fn plan(&self) -> &TierPlan {
        &self.plan
    }

    /// Run the pipeline for one deal. Never fails: per-agent errors settle
    /// as failed results, and a configured deadline settles unstarted
    /// agents as timeouts.
    pub async fn run(&self, deal: DealInput) -> RunReport {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let start = Instant::now();
        let deal = Arc::new(deal);
        let run_cancel = CancellationToken::new();
        let semaphore = Arc::new(Semaphore::new(self.max_tier_concurrency));
        let mut store = ResultStore::new();

        tracing::info!(%run_id, company = %deal.company, "Pipeline run started");

        for (tier_index, tier) in self.plan.tiers().iter().enumerate() {
            let remaining_budget_ms = self.remaining_budget_ms(&start);
            if remaining_budget_ms == Some(0) {
                // Deadline exhausted: settle the rest of the plan without
                // starting anything, so every scheduled agent still reports.
                for name in tier {
                    store.insert(AgentResult::failure(
                        name.clone(),
                        FailureKind::Timeout,
                        "pipeline deadline exceeded",
                        CostLedger::default(),
                        0,
                        0,
                    ));
                }
                continue;
            }

            tracing::debug!(tier_index, members = tier.len(), "Tier started");
            let snapshot = store.snapshot();

            let invocations = tier.iter().filter_map(|name| {
                let agent = self.registry.get(name)?;
                let params = EnvelopeParams {
                    deal: Arc::clone(&deal),
                    previous: snapshot.clone(),
                    llm: Arc::clone(&self.llm),
                    default_timeout_ms: self.default_timeout_ms,
                    remaining_budget_ms,
                    temperature: self.temperature,
                    run_cancel: run_cancel.clone(),
                };
                let semaphore = Arc::clone(&semaphore);
                Some(async move {
                    let _permit = semaphore.acquire().await.ok();
                    run_agent(agent, params).await
                })
            });

            // Tier latency is the max of its members, and the tier fully
            // settles before the next one starts.
            for result in join_all(invocations).await {
                store.insert(result);
            }
        }

        let mut totals = CostLedger::new();
        let mut agents_succeeded = 0;
        let mut agents_failed = 0;
        for result in store.iter() {
            totals.absorb(&result.cost);
            if result.success {
                agents_succeeded += 1;
            } else {
                agents_failed += 1;
            }
        }

        let wall_time_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            %run_id,
            wall_time_ms,
            total_cost_cents = totals.cost_cents,
            agents_succeeded,
            agents_failed,
            "Pipeline run settled"
        );

        RunReport {
            run_id,
            started_at,
            results: store,
            totals,
            wall_time_ms,
            agents_succeeded,
            agents_failed,
        }
    }

    /// Remaining deadline budget in ms; `None` when no deadline configured.
    fn remaining_budget_ms(&self, start: &Instant) -> Option<u64> {
        self.pipeline_deadline_ms
            .map(|deadline| deadline.saturating_sub(start.elapsed().as_millis() as u64))
    }
}
