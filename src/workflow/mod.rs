//! Session workflow: `input → search → analysis`.
//!
//! [`Workflow`] owns the only mutable copy of the session state. Every
//! transition either publishes new data and clears `error`, or records the
//! failure and leaves the stage unchanged. `loading` is cleared when the
//! attempt ends, whether it succeeds, fails or is dropped mid-flight.
//!
//! # Supersession
//!
//! Each attempt gets a generation number. Starting a new attempt, or going
//! back, bumps it; a response that arrives for an older generation is
//! discarded with [`WorkflowError::Superseded`].

pub mod error;
mod machine;
pub mod state;

#[cfg(test)]
mod tests;

pub use error::WorkflowError;
pub use machine::Workflow;
pub use state::{Stage, WorkflowSnapshot};
