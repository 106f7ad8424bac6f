//! Dependency resolution: topological leveling of the agent graph.
//!
//! An agent belongs to the earliest tier strictly after the maximum tier of
//! its dependencies; agents with no dependencies form tier 0. Tier
//! assignment is deterministic for a fixed descriptor set: ties are broken
//! by declaration order, never by hash iteration order.

use std::collections::HashMap;

use thiserror::Error;

use super::descriptor::AgentDescriptor;

/// Configuration errors. All fatal at build time: the pipeline never starts.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error("Duplicate agent name: {0}")]
    DuplicateAgent(String),

    #[error("Agent '{agent}' depends on unknown agent '{dependency}'")]
    UnknownDependency { agent: String, dependency: String },

    #[error("Dependency cycle detected: {}", cycle.join(" -> "))]
    CycleDetected { cycle: Vec<String> },
}

/// Ordered list of tiers. Every agent in tier n depends only on agents in
/// tiers < n; members of a tier have no edges between them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierPlan {
    tiers: Vec<Vec<String>>,
}

impl TierPlan {
    /// Build a tier plan from a descriptor set.
    pub fn build(descriptors: &[AgentDescriptor]) -> Result<Self, PipelineError> {
        let mut index: HashMap<&str, usize> = HashMap::with_capacity(descriptors.len());
        for (i, descriptor) in descriptors.iter().enumerate() {
            if index.insert(descriptor.name, i).is_some() {
                return Err(PipelineError::DuplicateAgent(descriptor.name.to_string()));
            }
        }

        // A dependency naming a nonexistent agent is a configuration error,
        // caught here rather than at run time.
        for descriptor in descriptors {
            for dep in descriptor.dependencies {
                if !index.contains_key(dep) {
                    return Err(PipelineError::UnknownDependency {
                        agent: descriptor.name.to_string(),
                        dependency: dep.to_string(),
                    });
                }
            }
        }

        // Level assignment by repeated passes in declaration order: an agent
        // is placed once all of its dependencies are placed. A pass with no
        // progress means the unplaced remainder contains a cycle.
        let mut levels: Vec<Option<usize>> = vec![None; descriptors.len()];
        let mut placed = 0;
        while placed < descriptors.len() {
            let mut progressed = false;
            for (i, descriptor) in descriptors.iter().enumerate() {
                if levels[i].is_some() {
                    continue;
                }
                let mut level = 0;
                let mut ready = true;
                for dep in descriptor.dependencies {
                    match levels[index[dep]] {
                        Some(dep_level) => level = level.max(dep_level + 1),
                        None => {
                            ready = false;
                            break;
                        }
                    }
                }
                if ready {
                    levels[i] = Some(level);
                    placed += 1;
                    progressed = true;
                }
            }
            if !progressed {
                return Err(PipelineError::CycleDetected {
                    cycle: find_cycle(descriptors, &index, &levels),
                });
            }
        }

        let max_level = levels.iter().filter_map(|l| *l).max().unwrap_or(0);
        let mut tiers = vec![Vec::new(); if descriptors.is_empty() { 0 } else { max_level + 1 }];
        for (i, descriptor) in descriptors.iter().enumerate() {
            if let Some(level) = levels[i] {
                tiers[level].push(descriptor.name.to_string());
            }
        }

        Ok(Self { tiers })
    }

    /// The ordered tiers.
    pub fn tiers(&self) -> &[Vec<String>] {
        &self.tiers
    }

    /// Total number of agents across all tiers.
    pub fn agent_count(&self) -> usize {
        self.tiers.iter().map(Vec::len).sum()
    }

    /// Tier index of an agent, if present in the plan.
    pub fn tier_of(&self, name: &str) -> Option<usize> {
        self.tiers
            .iter()
            .position(|tier| tier.iter().any(|n| n == name))
    }
}

/// Walk the unplaced subgraph to name the offending cycle.
fn find_cycle(
    descriptors: &[AgentDescriptor],
    index: &HashMap<&str, usize>,
    levels: &[Option<usize>],
) -> Vec<String> {
    let start = match levels.iter().position(|l| l.is_none()) {
        Some(i) => i,
        None => return Vec::new(),
    };

    // Follow the first unplaced dependency from each node; within a finite
    // unplaced subgraph this walk must revisit a node, closing the cycle.
    let mut path: Vec<usize> = Vec::new();
    let mut current = start;
    loop {
        if let Some(pos) = path.iter().position(|&n| n == current) {
            let mut cycle: Vec<String> = path[pos..]
                .iter()
                .map(|&n| descriptors[n].name.to_string())
                .collect();
            cycle.push(descriptors[current].name.to_string());
            return cycle;
        }
        path.push(current);
        let next = descriptors[current]
            .dependencies
            .iter()
            .map(|dep| index[dep])
            .find(|&dep_idx| levels[dep_idx].is_none());
        match next {
            Some(n) => current = n,
            None => return Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ModelComplexity;

    fn desc(
        name: &'static str,
        dependencies: &'static [&'static str],
    ) -> AgentDescriptor {
        AgentDescriptor::dependent(name, dependencies, ModelComplexity::Standard)
    }

    #[test]
    fn test_chain_produces_one_tier_per_agent() {
        let plan = TierPlan::build(&[
            desc("a", &[]),
            desc("b", &["a"]),
            desc("c", &["b"]),
        ])
        .unwrap();
        assert_eq!(
            plan.tiers(),
            &[
                vec!["a".to_string()],
                vec!["b".to_string()],
                vec!["c".to_string()]
            ]
        );
    }

    #[test]
    fn test_diamond() {
        let plan = TierPlan::build(&[
            desc("root", &[]),
            desc("left", &["root"]),
            desc("right", &["root"]),
            desc("join", &["left", "right"]),
        ])
        .unwrap();
        assert_eq!(plan.tiers().len(), 3);
        assert_eq!(plan.tier_of("root"), Some(0));
        assert_eq!(plan.tier_of("left"), Some(1));
        assert_eq!(plan.tier_of("right"), Some(1));
        assert_eq!(plan.tier_of("join"), Some(2));
    }

    #[test]
    fn test_agent_never_at_or_below_dependency_tier() {
        let descriptors = [
            desc("a", &[]),
            desc("b", &[]),
            desc("c", &["a", "b"]),
            desc("d", &["c", "a"]),
            desc("e", &["d", "b"]),
        ];
        let plan = TierPlan::build(&descriptors).unwrap();
        for descriptor in &descriptors {
            let tier = plan.tier_of(descriptor.name).unwrap();
            for dep in descriptor.dependencies {
                assert!(tier > plan.tier_of(dep).unwrap());
            }
        }
    }

    #[test]
    fn test_declaration_order_within_tier() {
        let plan = TierPlan::build(&[
            desc("zeta", &[]),
            desc("alpha", &[]),
            desc("mid", &[]),
        ])
        .unwrap();
        // Declaration order, not alphabetical or hash order.
        assert_eq!(
            plan.tiers()[0],
            vec!["zeta".to_string(), "alpha".to_string(), "mid".to_string()]
        );
    }

    #[test]
    fn test_cycle_detected_and_named() {
        let err = TierPlan::build(&[
            desc("a", &["c"]),
            desc("b", &["a"]),
            desc("c", &["b"]),
        ])
        .unwrap_err();
        match err {
            PipelineError::CycleDetected { cycle } => {
                assert!(cycle.len() >= 3);
                assert_eq!(cycle.first(), cycle.last());
            }
            other => panic!("expected cycle error, got {:?}", other),
        }
    }

    #[test]
    fn test_self_dependency_is_a_cycle() {
        let err = TierPlan::build(&[desc("a", &["a"])]).unwrap_err();
        assert!(matches!(err, PipelineError::CycleDetected { .. }));
    }

    #[test]
    fn test_unknown_dependency() {
        let err = TierPlan::build(&[desc("a", &["ghost"])]).unwrap_err();
        assert_eq!(
            err,
            PipelineError::UnknownDependency {
                agent: "a".to_string(),
                dependency: "ghost".to_string()
            }
        );
    }

    #[test]
    fn test_duplicate_agent() {
        let err = TierPlan::build(&[desc("a", &[]), desc("a", &[])]).unwrap_err();
        assert_eq!(err, PipelineError::DuplicateAgent("a".to_string()));
    }

    #[test]
    fn test_stable_across_rebuilds() {
        let descriptors = [
            desc("a", &[]),
            desc("b", &["a"]),
            desc("c", &["a"]),
            desc("d", &["b", "c"]),
        ];
        let first = TierPlan::build(&descriptors).unwrap();
        for _ in 0..10 {
            assert_eq!(TierPlan::build(&descriptors).unwrap(), first);
        }
    }
}
