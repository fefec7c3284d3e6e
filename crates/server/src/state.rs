use std::sync::Arc;
use ticketgate_core::{Config, SanitizedConfig, TicketOrchestrator};

/// Shared application state
pub struct AppState {
    config: Config,
    orchestrator: Arc<TicketOrchestrator>,
}

impl AppState {
    pub fn new(config: Config, orchestrator: Arc<TicketOrchestrator>) -> Self {
        Self {
            config,
            orchestrator,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn orchestrator(&self) -> &TicketOrchestrator {
        self.orchestrator.as_ref()
    }
}
