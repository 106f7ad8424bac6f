//! Per-invocation cost and usage accounting.

use serde::{Deserialize, Serialize};

use crate::pricing::TokenCounts;

/// Accumulator of call count, token usage, and spend for one agent
/// invocation.
///
/// A ledger is a value created fresh per invocation, never a field on a
/// long-lived agent singleton, so overlapping runs of the same agent type
/// cannot contaminate each other's accounting. Costs recorded on calls that
/// ultimately failed or timed out stay recorded: money was still spent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostLedger {
    pub calls: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cost_cents: u64,
}

impl CostLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero all counters.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Record one reasoning call. `usage` is absent for calls where the
    /// provider reported cost without a token breakdown.
    pub fn record(&mut self, cost_cents: u64, usage: Option<TokenCounts>) {
        self.calls += 1;
        self.cost_cents = self.cost_cents.saturating_add(cost_cents);
        if let Some(usage) = usage {
            self.input_tokens = self.input_tokens.saturating_add(usage.input_tokens);
            self.output_tokens = self.output_tokens.saturating_add(usage.output_tokens);
        }
    }

    /// Current totals. `calls` equals the number of `record` invocations
    /// since the last reset; `cost_cents` the sum of all recorded costs.
    pub fn snapshot(&self) -> CostLedger {
        *self
    }

    /// Fold another ledger into this one (for run-level aggregation).
    pub fn absorb(&mut self, other: &CostLedger) {
        self.calls += other.calls;
        self.input_tokens = self.input_tokens.saturating_add(other.input_tokens);
        self.output_tokens = self.output_tokens.saturating_add(other.output_tokens);
        self.cost_cents = self.cost_cents.saturating_add(other.cost_cents);
    }
}
