pub mod config;
pub mod dispatch;
pub mod lock;
pub mod metrics;
pub mod orchestrator;
pub mod testing;
pub mod validation;

pub use config::{
    load_config, load_config_from_str, validate_config, ClientConfig, Config, ConfigError,
    LockBackend, LockConfig, ProfileConfig, SanitizedConfig, ServerConfig,
};
pub use dispatch::{
    DispatchParams, DispatchRequest, DispatchResult, Dispatcher, EchoPayload, HeaderMap,
    HttpTransport, TicketTransport, TransportError, TransportResponse,
};
pub use lock::{
    create_lock_store, LockError, LockOutcome, LockRequest, LockStore, MemoryLockStore,
    SqliteLockStore,
};
pub use orchestrator::{
    CreateTicketOptions, PipelineStage, SubmissionProfile, TicketOrchestrator, TicketOutcome,
};
pub use validation::{base_rules, validate, FieldRule, FieldType, Record, ValidationError};
