//! Taskchain - asynchronous task-chain execution core
//!
//! Taskchain drives deployment steps (Helm chart rollouts, serverless deploys and
//! their rollbacks) as a chain of remote operations executed by an out-of-process
//! agent. The chain itself never waits on I/O: every call to
//! [`chain::ChainController::advance`] returns either the next remote call to
//! dispatch or a terminal context, and [`chain::ChainController::finalize`] turns
//! the terminal context into a user-visible [`chain::StepOutcome`].
//!
//! ## Components
//!
//! 1. **Source resolution** ([`source`]): manifest store plus connector into an
//!    agent-ready fetch instruction.
//! 2. **Chain control** ([`chain`]): context store, task dispatch, response
//!    classification and release version bookkeeping.
//! 3. **Driver** ([`driver`]): an async loop that submits calls to a
//!    [`driver::TaskDelegate`] and feeds responses back into the chain.

pub mod chain;
pub mod config;
pub mod domain;
pub mod driver;
pub mod error;
pub mod source;
pub mod store;

pub use domain::*;
pub use error::{ChainError, Result};
