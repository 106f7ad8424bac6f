//! Per-agent results and the local failure taxonomy.

use serde::{Deserialize, Serialize};

use super::ledger::CostLedger;
use crate::llm::ReasoningError;
use crate::normalize::AnalysisOutput;

/// Why an agent invocation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// Exceeded its wall-clock budget
    Timeout,
    /// Pipeline deadline or external cancellation
    Cancelled,
    /// The agent's domain logic returned an error (including JSON-parse
    /// failures from the reasoning service)
    Domain,
}

/// Result of one agent invocation.
///
/// # Invariants
/// - Created exactly once per agent per run, immutable thereafter.
/// - `cost` and `execution_time_ms` are present regardless of outcome.
/// - `success == true` iff `data` is `Some` and `error` is `None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResult {
    /// Agent name (the graph node id)
    pub agent: String,

    /// Whether the invocation produced normalized data
    pub success: bool,

    /// Normalized output (present on success)
    pub data: Option<AnalysisOutput>,

    /// Error message, captured verbatim (present on failure)
    pub error: Option<String>,

    /// Failure classification (present on failure)
    pub failure: Option<FailureKind>,

    /// Final per-invocation ledger snapshot
    pub cost: CostLedger,

    /// Wall-clock duration of the invocation in milliseconds
    pub execution_time_ms: u64,

    /// Number of domain attempts made (1 = no retries)
    pub attempts: u32,
}

impl AgentResult {
    /// Create a successful result.
    pub fn success(
        agent: impl Into<String>,
        data: AnalysisOutput,
        cost: CostLedger,
        execution_time_ms: u64,
        attempts: u32,
    ) -> Self {
        Self {
            agent: agent.into(),
            success: true,
            data: Some(data),
            error: None,
            failure: None,
            cost,
            execution_time_ms,
            attempts,
        }
    }

    /// Create a failure result.
    pub fn failure(
        agent: impl Into<String>,
        kind: FailureKind,
        error: impl Into<String>,
        cost: CostLedger,
        execution_time_ms: u64,
        attempts: u32,
    ) -> Self {
        Self {
            agent: agent.into(),
            success: false,
            data: None,
            error: Some(error.into()),
            failure: Some(kind),
            cost,
            execution_time_ms,
            attempts,
        }
    }

    /// Cost of this invocation in cents.
    pub fn cost_cents(&self) -> u64 {
        self.cost.cost_cents
    }
}

/// Error from an agent's domain logic. Never crosses an agent boundary as an
/// error: the envelope converts it into a failed `AgentResult`.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AgentError {
    #[error("Reasoning call failed: {0}")]
    Reasoning(#[from] ReasoningError),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl AgentError {
    /// Whether the envelope may retry this error within the agent's budget.
    pub fn is_transient(&self) -> bool {
        match self {
            AgentError::Reasoning(e) => e.is_transient(),
            AgentError::InvalidResponse(_) => false,
        }
    }
}
