//! Static per-agent configuration.

use serde::Serialize;

use crate::llm::ModelComplexity;

/// Immutable description of one agent: its graph identity, dependencies,
/// and execution budget. Created once per agent type, never mutated.
#[derive(Debug, Clone, Serialize)]
pub struct AgentDescriptor {
    /// Unique name; the dependency-graph node id.
    pub name: &'static str,
    /// Names of agents that must have been attempted before this one runs.
    /// Attempted, not succeeded: a failed dependency does not block this agent.
    pub dependencies: &'static [&'static str],
    /// Per-invocation wall-clock budget in milliseconds. 0 = use the
    /// pipeline's configured default.
    pub timeout_ms: u64,
    /// Max retries of transient reasoning failures within one invocation.
    pub max_retries: u32,
    /// Model complexity hint forwarded to the reasoning client.
    pub complexity: ModelComplexity,
}

impl AgentDescriptor {
    /// Descriptor with no dependencies and default budgets.
    pub const fn root(name: &'static str, complexity: ModelComplexity) -> Self {
        Self {
            name,
            dependencies: &[],
            timeout_ms: 0,
            max_retries: 1,
            complexity,
        }
    }

    /// Descriptor depending on earlier agents.
    pub const fn dependent(
        name: &'static str,
        dependencies: &'static [&'static str],
        complexity: ModelComplexity,
    ) -> Self {
        Self {
            name,
            dependencies,
            timeout_ms: 0,
            max_retries: 1,
            complexity,
        }
    }

    /// Effective timeout given the pipeline default.
    pub fn effective_timeout_ms(&self, default_ms: u64) -> u64 {
        if self.timeout_ms > 0 {
            self.timeout_ms
        } else {
            default_ms
        }
    }
}
