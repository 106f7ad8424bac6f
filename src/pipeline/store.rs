//! Run-scoped result storage and dependency lookup.
//!
//! Only the scheduler writes; agents see an immutable snapshot taken at the
//! moment their tier starts. A dependency lookup distinguishes "never ran"
//! from "ran and failed" from "ran and produced data" so downstream agents
//! cannot mistake absence for emptiness.

use std::collections::HashMap;
use std::sync::Arc;

use super::result::AgentResult;
use crate::normalize::AnalysisOutput;

/// Append-only, run-scoped map from agent name to its result.
#[derive(Debug, Default)]
pub struct ResultStore {
    results: HashMap<String, Arc<AgentResult>>,
    // Insertion order, kept for deterministic reporting.
    order: Vec<String>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an agent's result. Write-once: a second insert for the same
    /// name is a no-op (the first result stands).
    pub fn insert(&mut self, result: AgentResult) {
        let name = result.agent.clone();
        if self.results.contains_key(&name) {
            tracing::warn!(agent = %name, "Duplicate result insert ignored; first result stands");
            return;
        }
        self.order.push(name.clone());
        self.results.insert(name, Arc::new(result));
    }

    /// Look up a result by agent name.
    pub fn get(&self, name: &str) -> Option<&AgentResult> {
        self.results.get(name).map(Arc::as_ref)
    }

    /// Number of settled agents.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Results in settlement order.
    pub fn iter(&self) -> impl Iterator<Item = &AgentResult> {
        self.order.iter().filter_map(|name| self.get(name))
    }

    /// Immutable snapshot of everything settled so far. Cheap: results are
    /// shared via `Arc`, only the map itself is cloned.
    pub fn snapshot(&self) -> ResultSnapshot {
        ResultSnapshot {
            results: Arc::new(self.results.clone()),
        }
    }
}

/// Read-only view of prior-tier results, handed to agents.
#[derive(Debug, Clone, Default)]
pub struct ResultSnapshot {
    results: Arc<HashMap<String, Arc<AgentResult>>>,
}

/// Three-state dependency lookup.
#[derive(Debug, Clone, Copy)]
pub enum DependencyState<'a> {
    /// The dependency has not been attempted (earlier tier skipped, or the
    /// name was never scheduled).
    NotRun,
    /// The dependency was attempted and failed; its result carries the error.
    Failed(&'a AgentResult),
    /// The dependency succeeded; normalized data is available.
    Succeeded(&'a AnalysisOutput),
}

impl<'a> DependencyState<'a> {
    pub fn is_succeeded(&self) -> bool {
        matches!(self, DependencyState::Succeeded(_))
    }
}

impl ResultSnapshot {
    /// Look up a raw result.
    pub fn get(&self, name: &str) -> Option<&AgentResult> {
        self.results.get(name).map(Arc::as_ref)
    }

    /// Explicit three-state lookup of a dependency.
    pub fn dependency(&self, name: &str) -> DependencyState<'_> {
        match self.results.get(name) {
            None => DependencyState::NotRun,
            Some(result) => match &result.data {
                Some(data) if result.success => DependencyState::Succeeded(data),
                _ => DependencyState::Failed(result),
            },
        }
    }

    /// Number of settled results visible in this snapshot.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::ledger::CostLedger;
    use crate::pipeline::result::FailureKind;

    fn ok(name: &str) -> AgentResult {
        AgentResult::success(
            name,
            AnalysisOutput::insufficient_data("test fixture"),
            CostLedger::default(),
            1,
            1,
        )
    }

    fn failed(name: &str) -> AgentResult {
        AgentResult::failure(
            name,
            FailureKind::Domain,
            "boom",
            CostLedger::default(),
            1,
            1,
        )
    }

    #[test]
    fn test_write_once() {
        let mut store = ResultStore::new();
        store.insert(ok("a"));
        store.insert(failed("a")); // ignored
        assert_eq!(store.len(), 1);
        assert!(store.get("a").unwrap().success);
    }

    #[test]
    fn test_snapshot_is_a_point_in_time_view() {
        let mut store = ResultStore::new();
        store.insert(ok("a"));
        let snapshot = store.snapshot();
        store.insert(ok("b"));

        assert_eq!(snapshot.len(), 1);
        assert!(snapshot.get("b").is_none());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_three_state_dependency_lookup() {
        let mut store = ResultStore::new();
        store.insert(ok("good"));
        store.insert(failed("bad"));
        let snapshot = store.snapshot();

        assert!(matches!(
            snapshot.dependency("good"),
            DependencyState::Succeeded(_)
        ));
        assert!(matches!(
            snapshot.dependency("bad"),
            DependencyState::Failed(_)
        ));
        assert!(matches!(
            snapshot.dependency("never"),
            DependencyState::NotRun
        ));
    }

    #[test]
    fn test_iteration_in_settlement_order() {
        let mut store = ResultStore::new();
        store.insert(ok("z"));
        store.insert(ok("a"));
        store.insert(ok("m"));
        let names: Vec<&str> = store.iter().map(|r| r.agent.as_str()).collect();
        assert_eq!(names, vec!["z", "a", "m"]);
    }
}
