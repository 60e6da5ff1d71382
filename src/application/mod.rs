//! Application layer - the orchestrating services.
//!
//! # Module Organization
//!
//! - `executor` - Sequential action execution with timeouts, condition
//!   gating, output binding, and quota halts
//! - `validation` - Static checks applied before a spec is accepted
//! - `preflight` - Live dry-run of the polling source tool at deploy time
//! - `deploy` - The validate → preflight → persist → activate workflow

mod deploy;
mod executor;
mod preflight;
mod validation;

pub use deploy::{format_summary, DeployError, Deployed, DeploymentService};
pub use executor::{
    build_context, AutomationExecutor, ExecutionRequest, DEFAULT_ACTION_TIMEOUT,
};
pub use preflight::{PollingPreflight, PreflightOutcome};
pub use validation::{AutomationValidator, BuilderContext, FetchedToolSchema, ValidationOutcome};
