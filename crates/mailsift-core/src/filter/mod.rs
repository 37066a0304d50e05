//! Include/exclude filtering of messages against an effective policy.
//!
//! Evaluation is a pure function of the policy, the message, its enrichment
//! and the evaluation time. It never fails: every problem a policy can have
//! is caught when the policy is loaded.

mod evaluator;
mod rule;

pub use evaluator::{FilterDecision, RejectReason, evaluate};
pub use rule::{NameRule, PatternRule, compile_pattern};
