//! Ticket submission handler.

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use std::sync::Arc;
use ticketgate_core::{CreateTicketOptions, Record, TicketOutcome};

use crate::state::AppState;

/// Request body for submitting a ticket
#[derive(Debug, Deserialize)]
pub struct CreateTicketBody {
    /// Ticket fields, validated against the active rule set
    pub record: Record,
    /// Validation extensions, debug flag and idempotency lock parameters
    #[serde(default)]
    pub options: CreateTicketOptions,
}

/// Submit a ticket. The response body is the outcome, tagged by `outcome`.
pub async fn create_ticket(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateTicketBody>,
) -> (StatusCode, Json<TicketOutcome>) {
    let outcome = state
        .orchestrator()
        .create_ticket(&body.record, body.options)
        .await;
    (status_for(&outcome), Json(outcome))
}

fn status_for(outcome: &TicketOutcome) -> StatusCode {
    match outcome {
        TicketOutcome::Created { .. } | TicketOutcome::DebugEcho { .. } => StatusCode::CREATED,
        TicketOutcome::Invalid { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        TicketOutcome::Duplicate { .. } => StatusCode::CONFLICT,
        TicketOutcome::LockUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        TicketOutcome::Failed { .. } => StatusCode::BAD_GATEWAY,
        TicketOutcome::Cancelled { .. } => StatusCode::GATEWAY_TIMEOUT,
    }
}
