//! Ticket orchestration: validate, guard, dispatch.
//!
//! [`TicketOrchestrator::create_ticket`] runs the three steps strictly in order
//! and returns exactly one [`TicketOutcome`] per call. Steps after the first
//! terminal result are never started.

mod runner;
mod types;

pub use runner::TicketOrchestrator;
pub use types::{CreateTicketOptions, PipelineStage, SubmissionProfile, TicketOutcome};
