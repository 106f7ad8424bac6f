//! Cap table and ownership structure analysis.

use async_trait::async_trait;

use super::{run_analysis, RESPONSE_CONTRACT};
use crate::llm::ModelComplexity;
use crate::normalize::AnalysisOutput;
use crate::pipeline::{AgentDescriptor, AgentError, DiligenceAgent, RunContext};

const SYSTEM_PROMPT: &str =
    "You are a venture investor reviewing cap tables. You care about founder \
     incentives after this round, not just the headline ownership split.";

pub struct CapTableAgent {
    descriptor: AgentDescriptor,
}

impl CapTableAgent {
    pub fn new() -> Self {
        Self {
            descriptor: AgentDescriptor::root("cap_table", ModelComplexity::Standard),
        }
    }
}

impl Default for CapTableAgent {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DiligenceAgent for CapTableAgent {
    fn descriptor(&self) -> &AgentDescriptor {
        &self.descriptor
    }

    async fn execute(&self, ctx: &RunContext) -> Result<AnalysisOutput, AgentError> {
        let prompt = format!(
            r#"Analyze the ownership structure of this company.

{briefing}

Evaluate:
- Founder ownership: is enough equity left to keep the founders motivated through future rounds?
- Prior investors: unusual preferences, super pro-rata rights, or blocking rights from earlier rounds.
- Option pool: size relative to the hiring plan, and whether it is pre- or post-money in this round.
- Dead equity: departed founders or inactive holders with significant stakes.
- Dilution path: model roughly where founders land after two more financings at typical terms.

{contract}"#,
            briefing = ctx.deal.briefing(),
            contract = RESPONSE_CONTRACT,
        );

        run_analysis(ctx, SYSTEM_PROMPT, &prompt).await
    }
}
