//! Investment memo synthesis, the terminal agent.
//!
//! Depends on every other agent. If the entire investigation tier failed
//! there is nothing to synthesize, so it short-circuits to an explicit
//! insufficient-data output instead of asking the model to invent a memo.

use async_trait::async_trait;

use super::{dependency_digest, run_analysis, RESPONSE_CONTRACT};
use crate::llm::ModelComplexity;
use crate::normalize::AnalysisOutput;
use crate::pipeline::{AgentDescriptor, AgentError, DiligenceAgent, RunContext};

const UPSTREAM: &[&str] = &[
    "financials",
    "team",
    "market",
    "legal",
    "cap_table",
    "product",
    "risk",
];

const INVESTIGATIONS: &[&str] = &[
    "financials",
    "team",
    "market",
    "legal",
    "cap_table",
    "product",
];

const SYSTEM_PROMPT: &str =
    "You are a general partner writing the final investment memo. You weigh \
     the specialist analyses, state a clear recommendation, and are explicit \
     about what remains unknown.";

pub struct MemoAgent {
    descriptor: AgentDescriptor,
}

impl MemoAgent {
    pub fn new() -> Self {
        Self {
            descriptor: AgentDescriptor::dependent("memo", UPSTREAM, ModelComplexity::High),
        }
    }
}

impl Default for MemoAgent {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DiligenceAgent for MemoAgent {
    fn descriptor(&self) -> &AgentDescriptor {
        &self.descriptor
    }

    async fn execute(&self, ctx: &RunContext) -> Result<AnalysisOutput, AgentError> {
        let usable = INVESTIGATIONS
            .iter()
            .filter(|name| ctx.previous.dependency(name).is_succeeded())
            .count();
        if usable == 0 {
            tracing::warn!(agent = ctx.agent(), "No investigation succeeded; skipping synthesis");
            return Ok(AnalysisOutput::insufficient_data(
                "every investigation agent failed; no analyses to synthesize",
            ));
        }

        let prompt = format!(
            r#"Write the investment memo for this opportunity from the analyses below.

{briefing}

# Analyses ({usable} of {total} investigations usable)
{digest}

The memo narrative should cover:
- Thesis: why this could be a fund-returning investment, in the strongest honest form.
- Concerns: the case against, led by the risk assessment.
- Diligence gaps: dimensions that failed or were unassessed, and what to do about them before closing.
- Recommendation: proceed, proceed with conditions, or pass, with the conditions spelled out.

Your score is the overall investment attractiveness. Carry forward the
highest alert level raised by any upstream analysis unless you can justify
downgrading it.

{contract}"#,
            briefing = ctx.deal.briefing(),
            usable = usable,
            total = INVESTIGATIONS.len(),
            digest = dependency_digest(ctx, UPSTREAM),
            contract = RESPONSE_CONTRACT,
        );

        run_analysis(ctx, SYSTEM_PROMPT, &prompt).await
    }
}
