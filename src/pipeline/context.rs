//! Per-invocation execution context.
//!
//! The read-only bundle handed to an agent: domain inputs, the prior-tier
//! snapshot, and a costed, cancellable handle to the reasoning service. One
//! `RunContext` exists per agent invocation; nothing in it is shared mutable
//! state between sibling agents except the snapshot, which is read-only by
//! contract.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use super::ledger::CostLedger;
use super::result::AgentError;
use super::store::ResultSnapshot;
use crate::llm::{
    Completion, ModelComplexity, ReasoningClient, ReasoningError, RequestOptions,
};

/// One document excerpt supplied by the ingestion collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentExcerpt {
    pub title: String,
    pub excerpt: String,
}

/// Inert domain inputs for one due-diligence run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DealInput {
    /// Company under diligence
    pub company: String,
    /// Funding stage (e.g. "Seed", "Series A")
    pub stage: String,
    /// Sector / vertical
    pub sector: String,
    /// One-paragraph description of the opportunity
    pub description: String,
    /// Structured metrics supplied by enrichment providers (opaque here)
    #[serde(default)]
    pub metrics: serde_json::Value,
    /// Excerpts from the data room
    #[serde(default)]
    pub documents: Vec<DocumentExcerpt>,
    /// Externally-enriched data (opaque here)
    #[serde(default)]
    pub enrichment: serde_json::Value,
}

impl DealInput {
    /// Shared prompt block describing the deal, used by every agent.
    pub fn briefing(&self) -> String {
        let mut briefing = format!(
            "Company: {}\nStage: {}\nSector: {}\n\n{}\n",
            self.company, self.stage, self.sector, self.description
        );
        if !self.metrics.is_null() {
            briefing.push_str(&format!("\nMetrics:\n{}\n", self.metrics));
        }
        if !self.enrichment.is_null() {
            briefing.push_str(&format!("\nEnriched data:\n{}\n", self.enrichment));
        }
        for doc in &self.documents {
            briefing.push_str(&format!("\n--- {} ---\n{}\n", doc.title, doc.excerpt));
        }
        briefing
    }
}

/// Per-invocation context: deal inputs, prior results, and a reasoning
/// handle that enforces per-call timeouts, observes cancellation, and
/// records every call's cost into the invocation ledger.
pub struct RunContext {
    /// Domain inputs for this run
    pub deal: Arc<DealInput>,
    /// Snapshot of everything settled in earlier tiers
    pub previous: ResultSnapshot,

    llm: Arc<dyn ReasoningClient>,
    ledger: Arc<Mutex<CostLedger>>,
    agent: String,
    complexity: ModelComplexity,
    call_timeout: Duration,
    temperature: f64,
    cancel: CancellationToken,
}

impl RunContext {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        deal: Arc<DealInput>,
        previous: ResultSnapshot,
        llm: Arc<dyn ReasoningClient>,
        ledger: Arc<Mutex<CostLedger>>,
        agent: String,
        complexity: ModelComplexity,
        call_timeout: Duration,
        temperature: f64,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            deal,
            previous,
            llm,
            ledger,
            agent,
            complexity,
            call_timeout,
            temperature,
            cancel,
        }
    }

    /// Name of the agent this context belongs to. Used for explicit cost
    /// attribution on every outgoing call.
    pub fn agent(&self) -> &str {
        &self.agent
    }

    /// Request options pre-filled with this invocation's attribution,
    /// complexity hint, and temperature.
    pub fn options(&self) -> RequestOptions {
        RequestOptions::new(self.agent.clone(), self.complexity)
            .with_temperature(self.temperature)
    }

    /// Check if cancellation was requested (agent timeout or pipeline
    /// deadline).
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Text completion with the default per-call timeout.
    pub async fn reason(
        &self,
        prompt: &str,
        opts: &RequestOptions,
    ) -> Result<Completion, AgentError> {
        self.reason_with_timeout(prompt, opts, self.call_timeout)
            .await
    }

    /// Text completion with a caller-supplied timeout override.
    pub async fn reason_with_timeout(
        &self,
        prompt: &str,
        opts: &RequestOptions,
        timeout: Duration,
    ) -> Result<Completion, AgentError> {
        let completion = self
            .race(timeout, self.llm.complete(prompt, opts))
            .await?;
        self.ledger
            .lock()
            .await
            .record(completion.cost_cents, completion.usage);
        Ok(completion)
    }

    /// JSON-mode completion with the default per-call timeout. Returns the
    /// raw, untrusted payload; callers must normalize it.
    pub async fn reason_json(
        &self,
        prompt: &str,
        opts: &RequestOptions,
    ) -> Result<serde_json::Value, AgentError> {
        self.reason_json_with_timeout(prompt, opts, self.call_timeout)
            .await
    }

    /// JSON-mode completion with a caller-supplied timeout override.
    pub async fn reason_json_with_timeout(
        &self,
        prompt: &str,
        opts: &RequestOptions,
        timeout: Duration,
    ) -> Result<serde_json::Value, AgentError> {
        let completion = self
            .race(timeout, self.llm.complete_json(prompt, opts))
            .await?;
        // JSON mode: cost always recorded; token breakdown only when reported.
        self.ledger
            .lock()
            .await
            .record(completion.cost_cents, completion.usage);
        Ok(completion.data)
    }

    /// Current ledger totals for this invocation.
    pub async fn ledger_snapshot(&self) -> CostLedger {
        self.ledger.lock().await.snapshot()
    }

    /// Race a reasoning call against the per-call timeout and the
    /// invocation's cancellation token. Losing the race drops the call
    /// future, aborting the underlying request.
    async fn race<T>(
        &self,
        timeout: Duration,
        call: impl std::future::Future<Output = Result<T, ReasoningError>>,
    ) -> Result<T, AgentError> {
        tokio::select! {
            _ = self.cancel.cancelled() => {
                Err(AgentError::Reasoning(ReasoningError::cancelled(
                    "invocation cancelled",
                )))
            }
            outcome = tokio::time::timeout(timeout, call) => match outcome {
                Ok(result) => result.map_err(AgentError::Reasoning),
                Err(_) => Err(AgentError::Reasoning(ReasoningError::timed_out(
                    format!("reasoning call timed out after {}ms", timeout.as_millis()),
                ))),
            },
        }
    }
}
