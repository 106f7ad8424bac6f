//! Market size, timing, and competitive position.

use async_trait::async_trait;

use super::{run_analysis, RESPONSE_CONTRACT};
use crate::llm::ModelComplexity;
use crate::normalize::AnalysisOutput;
use crate::pipeline::{AgentDescriptor, AgentError, DiligenceAgent, RunContext};

const SYSTEM_PROMPT: &str =
    "You are a market analyst at a venture fund. You are skeptical of top-down \
     TAM figures and look for bottom-up evidence of demand.";

pub struct MarketAgent {
    descriptor: AgentDescriptor,
}

impl MarketAgent {
    pub fn new() -> Self {
        Self {
            descriptor: AgentDescriptor::root("market", ModelComplexity::Standard),
        }
    }
}

impl Default for MarketAgent {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DiligenceAgent for MarketAgent {
    fn descriptor(&self) -> &AgentDescriptor {
        &self.descriptor
    }

    async fn execute(&self, ctx: &RunContext) -> Result<AnalysisOutput, AgentError> {
        let prompt = format!(
            r#"Assess the market this company is selling into.

{briefing}

Evaluate:
- Market size: is the claimed TAM credible, and what does a bottom-up estimate look like from the segments actually served?
- Timing: what has changed (technology, regulation, buyer behavior) that makes this winnable now?
- Competition: who else serves this need, including the status quo of doing nothing, and what is the durable differentiation?
- Go-to-market: does the sales motion in the material match how this market actually buys?

{contract}"#,
            briefing = ctx.deal.briefing(),
            contract = RESPONSE_CONTRACT,
        );

        run_analysis(ctx, SYSTEM_PROMPT, &prompt).await
    }
}
