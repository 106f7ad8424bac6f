//! Legal and corporate hygiene review.

use async_trait::async_trait;

use super::{run_analysis, RESPONSE_CONTRACT};
use crate::llm::ModelComplexity;
use crate::normalize::AnalysisOutput;
use crate::pipeline::{AgentDescriptor, AgentError, DiligenceAgent, RunContext};

const SYSTEM_PROMPT: &str =
    "You are legal counsel reviewing a venture investment. You identify issues \
     and their severity; you do not give legal advice to the target.";

pub struct LegalAgent {
    descriptor: AgentDescriptor,
}

impl LegalAgent {
    pub fn new() -> Self {
        Self {
            descriptor: AgentDescriptor::root("legal", ModelComplexity::Standard),
        }
    }
}

impl Default for LegalAgent {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DiligenceAgent for LegalAgent {
    fn descriptor(&self) -> &AgentDescriptor {
        &self.descriptor
    }

    async fn execute(&self, ctx: &RunContext) -> Result<AnalysisOutput, AgentError> {
        let prompt = format!(
            r#"Review the legal and corporate position of this company.

{briefing}

Evaluate:
- Corporate structure: jurisdiction, subsidiaries, anything unusual for the stage.
- IP ownership: are assignments from founders, employees, and contractors in place? Any university or prior-employer entanglement?
- Litigation and disputes: pending, threatened, or visible in the material.
- Regulatory exposure: licenses, data-protection obligations, sector-specific regimes.
- Material contracts: change-of-control clauses, exclusivity, unusual liabilities.

Severity should reflect deal impact: a missing IP assignment from a core
founder is high, a stale filing is low.

{contract}"#,
            briefing = ctx.deal.briefing(),
            contract = RESPONSE_CONTRACT,
        );

        run_analysis(ctx, SYSTEM_PROMPT, &prompt).await
    }
}
