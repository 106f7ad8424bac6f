//! Cross-cutting risk aggregation over the investigation tier.
//!
//! Runs after every independent investigation has settled and looks for
//! compound risks no single dimension surfaces on its own, e.g. short
//! runway combined with a single-customer revenue base.

use async_trait::async_trait;

use super::{dependency_digest, run_analysis, RESPONSE_CONTRACT};
use crate::llm::ModelComplexity;
use crate::normalize::AnalysisOutput;
use crate::pipeline::{AgentDescriptor, AgentError, DiligenceAgent, RunContext};

const INVESTIGATIONS: &[&str] = &[
    "financials",
    "team",
    "market",
    "legal",
    "cap_table",
    "product",
];

const SYSTEM_PROMPT: &str =
    "You are the risk officer on a venture deal team. You synthesize the \
     specialist analyses into an overall risk picture, paying particular \
     attention to risks that interact across dimensions.";

pub struct RiskAgent {
    descriptor: AgentDescriptor,
}

impl RiskAgent {
    pub fn new() -> Self {
        Self {
            descriptor: AgentDescriptor::dependent("risk", INVESTIGATIONS, ModelComplexity::High),
        }
    }
}

impl Default for RiskAgent {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DiligenceAgent for RiskAgent {
    fn descriptor(&self) -> &AgentDescriptor {
        &self.descriptor
    }

    async fn execute(&self, ctx: &RunContext) -> Result<AnalysisOutput, AgentError> {
        let prompt = format!(
            r#"Aggregate the specialist analyses below into an overall risk assessment.

{briefing}

# Specialist analyses
{digest}

Evaluate:
- Compound risks: combinations of findings across dimensions that are worse together than apart.
- Coverage gaps: dimensions that failed or went unassessed are themselves a risk; weigh them explicitly.
- Severity ranking: which three risks most threaten this investment, in order.
- Mitigants: conditions or milestones that would materially reduce the top risks.

Your score reflects overall risk-adjusted quality: heavy unmitigated risk
pushes it down even when individual dimension scores are high.

{contract}"#,
            briefing = ctx.deal.briefing(),
            digest = dependency_digest(ctx, INVESTIGATIONS),
            contract = RESPONSE_CONTRACT,
        );

        run_analysis(ctx, SYSTEM_PROMPT, &prompt).await
    }
}
