//! # diligence
//!
//! Multi-agent due-diligence pipeline for venture deals.
//!
//! A registry of analysis agents declares a dependency graph; the pipeline
//! resolves it into tiers, runs each tier's agents concurrently against a
//! reasoning service, and settles a result for every agent whether it
//! succeeded, failed, timed out, or was never started. Raw model output is
//! forced through a single normalizer before anything downstream sees it.
//!
//! ## Execution model
//!
//! ```text
//!  tier 0   financials  team  market  legal  cap_table  product
//!               \      \    |      |      /       /
//!  tier 1                      risk
//!                               |
//!  tier 2                      memo
//! ```
//!
//! Tiers run sequentially; a tier fully settles before the next starts. A
//! failed dependency never blocks a dependent: the dependent runs and sees
//! the failure through a three-state lookup.
//!
//! ## Modules
//! - `agents`: the built-in agent roster
//! - `pipeline`: scheduling, execution envelopes, results, cost accounting
//! - `normalize`: the strict output contract and its normalizer
//! - `llm`: reasoning-service client (OpenRouter)
//! - `pricing`: model pricing tables and cost computation
//! - `config`: environment-driven configuration

pub mod agents;
pub mod config;
pub mod llm;
pub mod normalize;
pub mod pipeline;
pub mod pricing;

pub use config::Config;
pub use normalize::AnalysisOutput;
pub use pipeline::{DealInput, Pipeline, RunReport};
