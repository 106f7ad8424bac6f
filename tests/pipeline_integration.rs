//! End-to-end pipeline tests against a scripted reasoning client.
//!
//! No network: the client fakes per-agent behavior keyed off the request's
//! attribution, which also exercises the attribution path itself.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use diligence::llm::{
    Completion, JsonCompletion, ModelComplexity, ReasoningClient, ReasoningError, RequestOptions,
};
use diligence::normalize::AnalysisOutput;
use diligence::pipeline::{
    AgentDescriptor, AgentError, AgentRegistry, DependencyState, DiligenceAgent, FailureKind,
    Pipeline, RunContext,
};
use diligence::{agents, Config, DealInput};

/// What the scripted client does when a given agent calls it.
#[derive(Clone)]
enum Script {
    /// Return valid analysis JSON at the given cost after the given delay.
    Succeed { cost_cents: u64, delay: Duration },
    /// Fail every call with a non-transient error.
    Fail,
    /// Return the given raw payload verbatim (for normalization tests).
    Raw(serde_json::Value),
}

struct ScriptedClient {
    scripts: Vec<(&'static str, Script)>,
    default: Script,
}

impl ScriptedClient {
    fn uniform(cost_cents: u64) -> Self {
        Self {
            scripts: vec![],
            default: Script::Succeed {
                cost_cents,
                delay: Duration::from_millis(0),
            },
        }
    }

    fn with(mut self, agent: &'static str, script: Script) -> Self {
        self.scripts.push((agent, script));
        self
    }

    fn script_for(&self, agent: &str) -> Script {
        self.scripts
            .iter()
            .find(|(name, _)| *name == agent)
            .map(|(_, s)| s.clone())
            .unwrap_or_else(|| self.default.clone())
    }
}

#[async_trait]
impl ReasoningClient for ScriptedClient {
    async fn complete(
        &self,
        _prompt: &str,
        _opts: &RequestOptions,
    ) -> Result<Completion, ReasoningError> {
        unimplemented!("pipeline agents use JSON mode")
    }

    async fn complete_json(
        &self,
        _prompt: &str,
        opts: &RequestOptions,
    ) -> Result<JsonCompletion, ReasoningError> {
        match self.script_for(&opts.agent) {
            Script::Succeed { cost_cents, delay } => {
                tokio::time::sleep(delay).await;
                Ok(JsonCompletion {
                    data: json!({
                        "meta": {"data_completeness": "adequate", "confidence": "moderate"},
                        "score": {"value": 65, "rationale": "scripted"},
                        "narrative": "scripted analysis"
                    }),
                    cost_cents,
                    usage: None,
                })
            }
            Script::Fail => Err(ReasoningError::client_error(400, "scripted failure")),
            Script::Raw(data) => Ok(JsonCompletion {
                data,
                cost_cents: 1,
                usage: None,
            }),
        }
    }
}

fn deal() -> DealInput {
    DealInput {
        company: "Northwind Robotics".into(),
        stage: "Series A".into(),
        sector: "Industrial automation".into(),
        description: "Autonomous warehouse picking.".into(),
        metrics: json!({"arr_usd": 900_000}),
        documents: vec![],
        enrichment: serde_json::Value::Null,
    }
}

fn config() -> Config {
    Config::default()
}

#[tokio::test]
async fn full_default_roster_settles_every_agent() {
    let client = Arc::new(ScriptedClient::uniform(5));
    let pipeline = Pipeline::new(agents::default_registry(), &config(), client).unwrap();

    let report = pipeline.run(deal()).await;

    assert_eq!(report.results.len(), 8);
    assert_eq!(report.agents_succeeded, 8);
    assert_eq!(report.agents_failed, 0);

    // Run totals are exactly the fold of per-agent ledgers.
    let summed: u64 = report.results.iter().map(|r| r.cost_cents()).sum();
    assert_eq!(report.total_cost_cents(), summed);
    assert_eq!(summed, 40);
}

#[tokio::test]
async fn failed_investigation_does_not_block_synthesis() {
    let client = Arc::new(ScriptedClient::uniform(1).with("financials", Script::Fail));
    let pipeline = Pipeline::new(agents::default_registry(), &config(), client).unwrap();

    let report = pipeline.run(deal()).await;

    let financials = report.results.get("financials").unwrap();
    assert!(!financials.success);
    assert_eq!(financials.failure, Some(FailureKind::Domain));

    // risk and memo ran anyway and produced data.
    for name in ["risk", "memo"] {
        let result = report.results.get(name).unwrap();
        assert!(result.success, "{name} should still run");
    }
    assert_eq!(report.agents_succeeded, 7);
    assert_eq!(report.agents_failed, 1);
}

#[tokio::test]
async fn memo_short_circuits_when_every_investigation_fails() {
    let client = Arc::new(
        ScriptedClient::uniform(1)
            .with("financials", Script::Fail)
            .with("team", Script::Fail)
            .with("market", Script::Fail)
            .with("legal", Script::Fail)
            .with("cap_table", Script::Fail)
            .with("product", Script::Fail)
            .with("risk", Script::Fail),
    );
    let pipeline = Pipeline::new(agents::default_registry(), &config(), client).unwrap();

    let report = pipeline.run(deal()).await;

    // The memo succeeds without a reasoning call: explicit insufficient-data
    // output, zero spend, score not evaluated.
    let memo = report.results.get("memo").unwrap();
    assert!(memo.success);
    assert_eq!(memo.cost_cents(), 0);
    let data = memo.data.as_ref().unwrap();
    assert_eq!(data.score.value, 0);
    assert!(!data.meta.limitations.is_empty());
}

#[tokio::test]
async fn out_of_contract_output_is_normalized_before_storage() {
    let raw = json!({
        "meta": {"data_completeness": "minimal"},
        "score": {"value": 140},
        "findings": [{"title": "claim", "severity": "CATASTROPHIC"}],
        "red_flags": null,
        "alert_level": "PANIC"
    });
    let client = Arc::new(ScriptedClient::uniform(1).with("team", Script::Raw(raw)));
    let pipeline = Pipeline::new(agents::default_registry(), &config(), client).unwrap();

    let report = pipeline.run(deal()).await;
    let data = report.results.get("team").unwrap().data.as_ref().unwrap();

    // Clamped to the minimal-completeness ceiling, enums whitelisted,
    // arrays defaulted.
    assert_eq!(data.score.value, 40);
    assert_eq!(data.findings.len(), 1);
    assert!(data.red_flags.is_empty());
    assert_eq!(data.alert_level, diligence::normalize::AlertLevel::None);
}

#[tokio::test(start_paused = true)]
async fn timed_out_investigation_settles_and_the_run_continues() {
    let client = Arc::new(ScriptedClient::uniform(1).with(
        "legal",
        Script::Succeed {
            cost_cents: 1,
            delay: Duration::from_secs(3600),
        },
    ));
    let config = Config {
        agent_timeout_ms: 5_000,
        ..Config::default()
    };
    let pipeline = Pipeline::new(agents::default_registry(), &config, client).unwrap();

    let report = pipeline.run(deal()).await;

    let legal = report.results.get("legal").unwrap();
    assert!(!legal.success);
    assert_eq!(legal.failure, Some(FailureKind::Timeout));

    // Everyone else settled normally, including the dependents.
    assert_eq!(report.results.len(), 8);
    assert_eq!(report.agents_succeeded, 7);
}

#[tokio::test]
async fn tier_concurrency_bound_of_one_serializes_a_tier() {
    // With concurrency 1 and a per-call delay, the run still settles every
    // agent; this pins the semaphore path rather than measuring wall time.
    let client = Arc::new(ScriptedClient {
        scripts: vec![],
        default: Script::Succeed {
            cost_cents: 2,
            delay: Duration::from_millis(5),
        },
    });
    let config = Config {
        max_tier_concurrency: 1,
        ..Config::default()
    };
    let pipeline = Pipeline::new(agents::default_registry(), &config, client).unwrap();

    let report = pipeline.run(deal()).await;
    assert_eq!(report.agents_succeeded, 8);
    assert_eq!(report.total_cost_cents(), 16);
}

/// Probe agent that records the three-state view of its dependency.
struct ProbeAgent {
    descriptor: AgentDescriptor,
}

#[async_trait]
impl DiligenceAgent for ProbeAgent {
    fn descriptor(&self) -> &AgentDescriptor {
        &self.descriptor
    }

    async fn execute(&self, ctx: &RunContext) -> Result<AnalysisOutput, AgentError> {
        let observed = match ctx.previous.dependency("upstream") {
            DependencyState::NotRun => "not_run",
            DependencyState::Failed(_) => "failed",
            DependencyState::Succeeded(_) => "succeeded",
        };
        Ok(AnalysisOutput::insufficient_data(observed))
    }
}

struct UpstreamAgent {
    descriptor: AgentDescriptor,
}

#[async_trait]
impl DiligenceAgent for UpstreamAgent {
    fn descriptor(&self) -> &AgentDescriptor {
        &self.descriptor
    }

    async fn execute(&self, ctx: &RunContext) -> Result<AnalysisOutput, AgentError> {
        let raw = ctx.reason_json("analyze", &ctx.options()).await?;
        Ok(AnalysisOutput::from_raw(&raw))
    }
}

fn probe_registry() -> AgentRegistry {
    AgentRegistry::new()
        .register(Arc::new(UpstreamAgent {
            descriptor: AgentDescriptor::root("upstream", ModelComplexity::Low),
        }))
        .register(Arc::new(ProbeAgent {
            descriptor: AgentDescriptor::dependent(
                "probe",
                &["upstream"],
                ModelComplexity::Low,
            ),
        }))
}

#[tokio::test]
async fn dependent_observes_failed_state_not_absence() {
    let client = Arc::new(ScriptedClient::uniform(1).with("upstream", Script::Fail));
    let pipeline = Pipeline::new(probe_registry(), &config(), client).unwrap();

    let report = pipeline.run(deal()).await;
    let probe = report.results.get("probe").unwrap();
    let data = probe.data.as_ref().unwrap();
    assert_eq!(data.meta.limitations, vec!["failed".to_string()]);
}

#[tokio::test]
async fn dependent_observes_succeeded_state() {
    let client = Arc::new(ScriptedClient::uniform(1));
    let pipeline = Pipeline::new(probe_registry(), &config(), client).unwrap();

    let report = pipeline.run(deal()).await;
    let probe = report.results.get("probe").unwrap();
    let data = probe.data.as_ref().unwrap();
    assert_eq!(data.meta.limitations, vec!["succeeded".to_string()]);
}
