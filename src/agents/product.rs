//! Product and technology assessment.

use async_trait::async_trait;

use super::{run_analysis, RESPONSE_CONTRACT};
use crate::llm::ModelComplexity;
use crate::normalize::AnalysisOutput;
use crate::pipeline::{AgentDescriptor, AgentError, DiligenceAgent, RunContext};

const SYSTEM_PROMPT: &str =
    "You are a product and technology diligence specialist. You distinguish \
     genuine technical moats from engineering effort any funded competitor \
     could replicate.";

pub struct ProductAgent {
    descriptor: AgentDescriptor,
}

impl ProductAgent {
    pub fn new() -> Self {
        Self {
            descriptor: AgentDescriptor::root("product", ModelComplexity::Standard),
        }
    }
}

impl Default for ProductAgent {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DiligenceAgent for ProductAgent {
    fn descriptor(&self) -> &AgentDescriptor {
        &self.descriptor
    }

    async fn execute(&self, ctx: &RunContext) -> Result<AnalysisOutput, AgentError> {
        let prompt = format!(
            r#"Assess the product and underlying technology of this company.

{briefing}

Evaluate:
- Maturity: shipped and in production use, or still a demo? What does usage evidence in the material show?
- Defensibility: what would it cost a well-funded competitor to reach parity, and what compounds with time (data, network effects, switching costs)?
- Technical risk: dependencies on third-party platforms, scaling unknowns, unproven core claims.
- Roadmap credibility: does the stated roadmap match the team size and burn?

{contract}"#,
            briefing = ctx.deal.briefing(),
            contract = RESPONSE_CONTRACT,
        );

        run_analysis(ctx, SYSTEM_PROMPT, &prompt).await
    }
}
