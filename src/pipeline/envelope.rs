//! Execution envelope: wraps one agent invocation.
//!
//! Owns the timeout race, cancellation propagation, bounded retry, and
//! uniform result construction. Every exit path - normal return, domain
//! error, timeout, cancellation - produces an `AgentResult` carrying the
//! final ledger and wall-clock timing, and cancels the invocation's child
//! token so no in-flight reasoning call outlives it.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use super::agent::AgentRef;
use super::context::{DealInput, RunContext};
use super::ledger::CostLedger;
use super::result::{AgentError, AgentResult, FailureKind};
use super::store::ResultSnapshot;
use crate::llm::{ReasoningClient, ReasoningErrorKind};

/// Everything the envelope needs beyond the agent itself.
pub(crate) struct EnvelopeParams {
    pub deal: Arc<DealInput>,
    pub previous: ResultSnapshot,
    pub llm: Arc<dyn ReasoningClient>,
    /// Pipeline default timeout for agents that don't declare their own.
    pub default_timeout_ms: u64,
    /// Remaining pipeline budget, when a deadline is configured. The
    /// agent's own timeout is clamped to this.
    pub remaining_budget_ms: Option<u64>,
    pub temperature: f64,
    /// Run-level token; cancelling it aborts every in-flight invocation.
    pub run_cancel: CancellationToken,
}

/// Run one agent under the envelope and return its settled result.
pub(crate) async fn run_agent(agent: AgentRef, params: EnvelopeParams) -> AgentResult {
    let descriptor = agent.descriptor().clone();
    let name = descriptor.name;

    let mut timeout_ms = descriptor.effective_timeout_ms(params.default_timeout_ms);
    if let Some(remaining) = params.remaining_budget_ms {
        timeout_ms = timeout_ms.min(remaining);
    }

    // Fresh ledger per invocation: cost state never outlives the run.
    let ledger = Arc::new(Mutex::new(CostLedger::new()));
    let cancel = params.run_cancel.child_token();
    let ctx = RunContext::new(
        params.deal,
        params.previous,
        params.llm,
        Arc::clone(&ledger),
        name.to_string(),
        descriptor.complexity,
        Duration::from_millis(timeout_ms),
        params.temperature,
        cancel.clone(),
    );

    let start = Instant::now();
    let max_attempts = descriptor.max_retries.saturating_add(1);
    let attempts = Arc::new(AtomicU32::new(0));

    let domain = {
        let attempts = Arc::clone(&attempts);
        let agent = Arc::clone(&agent);
        async move {
            loop {
                let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
                match agent.execute(&ctx).await {
                    Ok(output) => return Ok(output),
                    Err(e) if e.is_transient() && attempt < max_attempts => {
                        tracing::warn!(
                            agent = %name,
                            attempt,
                            max_attempts,
                            "Transient failure, retrying: {}",
                            e
                        );
                    }
                    Err(e) => return Err(e),
                }
            }
        }
    };

    let outcome = tokio::time::timeout(Duration::from_millis(timeout_ms), domain).await;

    // Cancel on every exit path: a lost race must also abort the underlying
    // call, not just stop waiting for it.
    cancel.cancel();

    let cost = ledger.lock().await.snapshot();
    let execution_time_ms = start.elapsed().as_millis() as u64;
    let attempts = attempts.load(Ordering::SeqCst).max(1);

    match outcome {
        Ok(Ok(data)) => {
            tracing::info!(
                agent = %name,
                cost_cents = cost.cost_cents,
                execution_time_ms,
                "Agent succeeded"
            );
            AgentResult::success(name, data, cost, execution_time_ms, attempts)
        }
        Ok(Err(error)) => {
            let kind = classify(&error);
            // The per-call race inside RunContext can elapse before the
            // outer timeout polls; both surface the same way.
            let message = if kind == FailureKind::Timeout {
                format!("timed out after {}ms", timeout_ms)
            } else {
                error.to_string()
            };
            tracing::warn!(
                agent = %name,
                cost_cents = cost.cost_cents,
                execution_time_ms,
                "Agent failed: {}",
                error
            );
            AgentResult::failure(name, kind, message, cost, execution_time_ms, attempts)
        }
        Err(_elapsed) => {
            tracing::warn!(
                agent = %name,
                timeout_ms,
                cost_cents = cost.cost_cents,
                "Agent timed out"
            );
            AgentResult::failure(
                name,
                FailureKind::Timeout,
                format!("timed out after {}ms", timeout_ms),
                cost,
                execution_time_ms,
                attempts,
            )
        }
    }
}

fn classify(error: &AgentError) -> FailureKind {
    match error {
        AgentError::Reasoning(e) => match e.kind {
            ReasoningErrorKind::Cancelled => FailureKind::Cancelled,
            ReasoningErrorKind::Timeout => FailureKind::Timeout,
            _ => FailureKind::Domain,
        },
        AgentError::InvalidResponse(_) => FailureKind::Domain,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{
        Completion, JsonCompletion, ModelComplexity, ReasoningError, RequestOptions,
    };
    use crate::normalize::AnalysisOutput;
    use crate::pipeline::agent::DiligenceAgent;
    use crate::pipeline::descriptor::AgentDescriptor;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    struct StubClient {
        delay: Duration,
        fail_first: AtomicUsize,
    }

    #[async_trait]
    impl ReasoningClient for StubClient {
        async fn complete(
            &self,
            _prompt: &str,
            _opts: &RequestOptions,
        ) -> Result<Completion, ReasoningError> {
            unimplemented!("tests use JSON mode")
        }

        async fn complete_json(
            &self,
            _prompt: &str,
            _opts: &RequestOptions,
        ) -> Result<JsonCompletion, ReasoningError> {
            tokio::time::sleep(self.delay).await;
            if self
                .fail_first
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                    (n > 0).then(|| n - 1)
                })
                .is_ok()
            {
                return Err(ReasoningError::server_error(503, "overloaded"));
            }
            Ok(JsonCompletion {
                data: json!({"meta": {"data_completeness": "adequate"}, "score": {"value": 60}}),
                cost_cents: 2,
                usage: None,
            })
        }
    }

    struct StubAgent {
        descriptor: AgentDescriptor,
    }

    #[async_trait]
    impl DiligenceAgent for StubAgent {
        fn descriptor(&self) -> &AgentDescriptor {
            &self.descriptor
        }

        async fn execute(&self, ctx: &RunContext) -> Result<AnalysisOutput, AgentError> {
            let raw = ctx.reason_json("analyze", &ctx.options()).await?;
            Ok(AnalysisOutput::from_raw(&raw))
        }
    }

    fn params(client: Arc<StubClient>) -> EnvelopeParams {
        EnvelopeParams {
            deal: Arc::new(DealInput {
                company: "Acme".into(),
                stage: "Seed".into(),
                sector: "SaaS".into(),
                description: "test".into(),
                metrics: serde_json::Value::Null,
                documents: vec![],
                enrichment: serde_json::Value::Null,
            }),
            previous: ResultSnapshot::default(),
            llm: client,
            default_timeout_ms: 60_000,
            remaining_budget_ms: None,
            temperature: 0.0,
            run_cancel: CancellationToken::new(),
        }
    }

    fn agent(timeout_ms: u64, max_retries: u32) -> AgentRef {
        let mut descriptor = AgentDescriptor::root("stub", ModelComplexity::Low);
        descriptor.timeout_ms = timeout_ms;
        descriptor.max_retries = max_retries;
        Arc::new(StubAgent { descriptor })
    }

    #[tokio::test]
    async fn test_success_carries_cost_and_timing() {
        let client = Arc::new(StubClient {
            delay: Duration::from_millis(0),
            fail_first: AtomicUsize::new(0),
        });
        let result = run_agent(agent(5_000, 0), params(client)).await;
        assert!(result.success);
        assert_eq!(result.cost_cents(), 2);
        assert_eq!(result.attempts, 1);
        assert_eq!(result.data.as_ref().unwrap().score.value, 60);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_produces_failure_within_budget() {
        let client = Arc::new(StubClient {
            delay: Duration::from_secs(3600),
            fail_first: AtomicUsize::new(0),
        });
        let start = Instant::now();
        let result = run_agent(agent(2_000, 0), params(client)).await;
        assert!(!result.success);
        assert_eq!(result.failure, Some(FailureKind::Timeout));
        assert_eq!(result.error.as_deref(), Some("timed out after 2000ms"));
        // Paused clock: elapsed real time stays far below the virtual budget.
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_never_retried() {
        let client = Arc::new(StubClient {
            delay: Duration::from_secs(3600),
            fail_first: AtomicUsize::new(0),
        });
        let result = run_agent(agent(2_000, 3), params(client)).await;
        assert!(!result.success);
        assert_eq!(result.failure, Some(FailureKind::Timeout));
        assert_eq!(result.error.as_deref(), Some("timed out after 2000ms"));
        assert_eq!(result.attempts, 1);
    }

    #[tokio::test]
    async fn test_transient_errors_retried_within_bound() {
        let client = Arc::new(StubClient {
            delay: Duration::from_millis(0),
            fail_first: AtomicUsize::new(2),
        });
        let result = run_agent(agent(5_000, 2), params(client)).await;
        assert!(result.success);
        assert_eq!(result.attempts, 3);
        // Errored calls return before the ledger records; only the final
        // successful call lands in it.
        assert_eq!(result.cost.calls, 1);
    }

    #[tokio::test]
    async fn test_retries_exhausted_becomes_domain_failure() {
        let client = Arc::new(StubClient {
            delay: Duration::from_millis(0),
            fail_first: AtomicUsize::new(10),
        });
        let result = run_agent(agent(5_000, 1), params(client)).await;
        assert!(!result.success);
        assert_eq!(result.failure, Some(FailureKind::Domain));
        assert_eq!(result.attempts, 2);
    }

    #[tokio::test]
    async fn test_cancelled_run_classified_as_cancelled() {
        let client = Arc::new(StubClient {
            delay: Duration::from_millis(50),
            fail_first: AtomicUsize::new(0),
        });
        let p = params(client);
        p.run_cancel.cancel();
        let result = run_agent(agent(5_000, 0), p).await;
        assert!(!result.success);
        assert_eq!(result.failure, Some(FailureKind::Cancelled));
    }
}
