//! Founder and team assessment.

use async_trait::async_trait;

use super::{run_analysis, RESPONSE_CONTRACT};
use crate::llm::ModelComplexity;
use crate::normalize::AnalysisOutput;
use crate::pipeline::{AgentDescriptor, AgentError, DiligenceAgent, RunContext};

const SYSTEM_PROMPT: &str =
    "You are a venture partner assessing founding teams. You weigh evidence of \
     execution over credentials and self-description.";

pub struct TeamAgent {
    descriptor: AgentDescriptor,
}

impl TeamAgent {
    pub fn new() -> Self {
        Self {
            descriptor: AgentDescriptor::root("team", ModelComplexity::Standard),
        }
    }
}

impl Default for TeamAgent {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DiligenceAgent for TeamAgent {
    fn descriptor(&self) -> &AgentDescriptor {
        &self.descriptor
    }

    async fn execute(&self, ctx: &RunContext) -> Result<AnalysisOutput, AgentError> {
        let prompt = format!(
            r#"Assess the founding team behind this opportunity.

{briefing}

Evaluate:
- Founder-market fit: does the team's background map to this problem?
- Completeness: are the critical functions (product, engineering, commercial) covered, and what key hires are missing?
- Track record: prior exits, relevant operating experience, evidence of shipping.
- Stability signals: co-founder history, equity disputes, unusual departures if visible in the material.

{contract}"#,
            briefing = ctx.deal.briefing(),
            contract = RESPONSE_CONTRACT,
        );

        run_analysis(ctx, SYSTEM_PROMPT, &prompt).await
    }
}
