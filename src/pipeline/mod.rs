//! The orchestration core: dependency scheduling, execution envelopes,
//! partial-failure-tolerant result storage, and cost accounting.

pub mod agent;
pub mod context;
pub mod descriptor;
mod envelope;
pub mod ledger;
pub mod resolver;
pub mod result;
pub mod scheduler;
pub mod store;

pub use agent::{AgentRef, AgentRegistry, DiligenceAgent};
pub use context::{DealInput, DocumentExcerpt, RunContext};
pub use descriptor::AgentDescriptor;
pub use ledger::CostLedger;
pub use resolver::{PipelineError, TierPlan};
pub use result::{AgentError, AgentResult, FailureKind};
pub use scheduler::{Pipeline, RunReport};
pub use store::{DependencyState, ResultSnapshot, ResultStore};
