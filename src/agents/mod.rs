//! Domain agents: one self-contained analysis unit per diligence angle.
//!
//! Tier 0 holds the independent investigation agents; `risk` aggregates
//! them in tier 1; `memo` synthesizes the investment memo in tier 2. Each
//! agent is a thin wrapper around one JSON-mode reasoning call whose output
//! goes straight through the normalizer - agents never hand raw model JSON
//! to anyone.

mod cap_table;
mod financials;
mod legal;
mod market;
mod memo;
mod product;
mod risk;
mod team;

pub use cap_table::CapTableAgent;
pub use financials::FinancialsAgent;
pub use legal::LegalAgent;
pub use market::MarketAgent;
pub use memo::MemoAgent;
pub use product::ProductAgent;
pub use risk::RiskAgent;
pub use team::TeamAgent;

use std::sync::Arc;

use crate::normalize::AnalysisOutput;
use crate::pipeline::{AgentError, AgentRegistry, RunContext};

/// The full default agent set, in declaration order.
pub fn default_registry() -> AgentRegistry {
    AgentRegistry::new()
        .register(Arc::new(FinancialsAgent::new()))
        .register(Arc::new(TeamAgent::new()))
        .register(Arc::new(MarketAgent::new()))
        .register(Arc::new(LegalAgent::new()))
        .register(Arc::new(CapTableAgent::new()))
        .register(Arc::new(ProductAgent::new()))
        .register(Arc::new(RiskAgent::new()))
        .register(Arc::new(MemoAgent::new()))
}

/// Response contract shared by every agent prompt. The normalizer enforces
/// all of this in code regardless; stating it in the prompt just raises the
/// odds of getting usable output on the first call.
pub(crate) const RESPONSE_CONTRACT: &str = r#"Respond ONLY with a JSON object of this exact shape:
{
    "meta": {
        "data_completeness": "comprehensive" | "adequate" | "partial" | "minimal",
        "confidence": "low" | "moderate" | "high",
        "limitations": ["known gaps in what you could assess"]
    },
    "score": {"value": <0-100>, "rationale": "one paragraph"},
    "findings": [{"title": "...", "detail": "...", "severity": "low" | "medium" | "high"}],
    "red_flags": [{"description": "...", "severity": "low" | "medium" | "high"}],
    "open_questions": ["questions the deal team should put to the founders"],
    "alert_level": "none" | "advisory" | "elevated" | "critical",
    "narrative": "2-3 paragraph assessment"
}

Score honestly: 50 is an unremarkable company at this stage, above 80 is exceptional.
If the provided material does not cover something, say so in limitations rather than guessing."#;

/// Render upstream dependency results into a prompt block. Failed and
/// never-run dependencies are stated explicitly so the synthesis model
/// reasons about the gap instead of hallucinating around it.
pub(crate) fn dependency_digest(ctx: &RunContext, names: &[&str]) -> String {
    use crate::pipeline::DependencyState;

    let mut digest = String::new();
    for name in names {
        digest.push_str(&format!("\n## {name}\n"));
        match ctx.previous.dependency(name) {
            DependencyState::Succeeded(data) => {
                digest.push_str(&format!(
                    "Score: {}/100 ({:?} completeness, {:?} confidence, alert level {:?})\n",
                    data.score.value,
                    data.meta.data_completeness,
                    data.meta.confidence,
                    data.alert_level,
                ));
                for flag in &data.red_flags {
                    digest.push_str(&format!(
                        "Red flag [{:?}]: {}\n",
                        flag.severity, flag.description
                    ));
                }
                for finding in &data.findings {
                    digest.push_str(&format!(
                        "Finding [{:?}]: {} - {}\n",
                        finding.severity, finding.title, finding.detail
                    ));
                }
                if !data.narrative.is_empty() {
                    digest.push_str(&format!("Assessment: {}\n", data.narrative));
                }
            }
            DependencyState::Failed(result) => {
                digest.push_str(&format!(
                    "Analysis FAILED ({}). Treat this dimension as unassessed.\n",
                    result.error.as_deref().unwrap_or("unknown error"),
                ));
            }
            DependencyState::NotRun => {
                digest.push_str("Analysis was not run. Treat this dimension as unassessed.\n");
            }
        }
    }
    digest
}

/// One JSON-mode call, normalized. The shared body of every agent.
pub(crate) async fn run_analysis(
    ctx: &RunContext,
    system_prompt: &str,
    user_prompt: &str,
) -> Result<AnalysisOutput, AgentError> {
    let opts = ctx.options().with_system_prompt(system_prompt);
    let raw = ctx.reason_json(user_prompt, &opts).await?;
    Ok(AnalysisOutput::from_raw(&raw))
}
