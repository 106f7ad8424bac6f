//! Financial health analysis.
//!
//! Reads whatever the data room exposes - P&L excerpts, bank statements,
//! founder-reported metrics - and assesses burn, runway, revenue quality,
//! and unit economics.

use async_trait::async_trait;

use super::{run_analysis, RESPONSE_CONTRACT};
use crate::llm::ModelComplexity;
use crate::normalize::AnalysisOutput;
use crate::pipeline::{AgentDescriptor, AgentError, DiligenceAgent, RunContext};

const SYSTEM_PROMPT: &str =
    "You are a financial analyst at a venture fund performing due diligence. \
     You are rigorous about distinguishing reported numbers from verified ones.";

pub struct FinancialsAgent {
    descriptor: AgentDescriptor,
}

impl FinancialsAgent {
    pub fn new() -> Self {
        Self {
            descriptor: AgentDescriptor::root("financials", ModelComplexity::Standard),
        }
    }
}

impl Default for FinancialsAgent {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DiligenceAgent for FinancialsAgent {
    fn descriptor(&self) -> &AgentDescriptor {
        &self.descriptor
    }

    async fn execute(&self, ctx: &RunContext) -> Result<AnalysisOutput, AgentError> {
        let prompt = format!(
            r#"Assess the financial health of this investment opportunity.

{briefing}

Evaluate:
- Burn rate and runway: how many months of operation do current reserves cover, and is the burn justified by what it buys?
- Revenue quality: recurring vs one-off, concentration in a few customers, churn if visible.
- Unit economics: gross margin, CAC/LTV if derivable from the material.
- Plausibility: do the reported figures reconcile with each other and with the stage?

Treat founder-supplied projections as claims, not facts. Flag any figure that
cannot be traced to a document excerpt.

{contract}"#,
            briefing = ctx.deal.briefing(),
            contract = RESPONSE_CONTRACT,
        );

        run_analysis(ctx, SYSTEM_PROMPT, &prompt).await
    }
}
