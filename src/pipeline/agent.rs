//! The agent trait and the registry the scheduler executes.

use std::sync::Arc;

use async_trait::async_trait;

use super::context::RunContext;
use super::descriptor::AgentDescriptor;
use super::result::AgentError;
use crate::normalize::AnalysisOutput;

/// One self-contained analysis unit.
///
/// Implementations are stateless: all per-run state (ledger, snapshot,
/// cancellation) lives in the `RunContext`, so one agent instance can serve
/// overlapping runs safely.
#[async_trait]
pub trait DiligenceAgent: Send + Sync {
    /// Static configuration: name, dependencies, budgets.
    fn descriptor(&self) -> &AgentDescriptor;

    /// Run the analysis. Errors are recovered by the execution envelope and
    /// become failed results; they never abort the run.
    async fn execute(&self, ctx: &RunContext) -> Result<AnalysisOutput, AgentError>;
}

pub type AgentRef = Arc<dyn DiligenceAgent>;

/// The static set of agents a pipeline executes.
#[derive(Default)]
pub struct AgentRegistry {
    agents: Vec<AgentRef>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an agent. Name collisions are caught later by the resolver.
    pub fn register(mut self, agent: AgentRef) -> Self {
        self.agents.push(agent);
        self
    }

    /// Descriptors in declaration order (the resolver's tie-break order).
    pub fn descriptors(&self) -> Vec<AgentDescriptor> {
        self.agents.iter().map(|a| a.descriptor().clone()).collect()
    }

    /// Look up an agent by name.
    pub fn get(&self, name: &str) -> Option<AgentRef> {
        self.agents
            .iter()
            .find(|a| a.descriptor().name == name)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}
