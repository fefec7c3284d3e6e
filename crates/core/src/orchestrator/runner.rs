//! Ticket orchestrator implementation.
//!
//! Each call runs independently: validation is synchronous, while the lock
//! acquire and the dispatch are the only suspension points. Concurrent calls
//! sharing a key are serialized only by the lock store.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::config::{validate_config, Config, ConfigError};
use crate::dispatch::{DispatchParams, Dispatcher, HttpTransport, TicketTransport};
use crate::lock::{create_lock_store, LockOutcome, LockRequest, LockStore};
use crate::metrics::{LOCK_ATTEMPTS, SUBMISSIONS_TOTAL};
use crate::validation::{validate, Record};

use super::types::{CreateTicketOptions, PipelineStage, SubmissionProfile, TicketOutcome};

/// Composes validation, the idempotency lock and dispatch into `create_ticket`.
pub struct TicketOrchestrator {
    dispatcher: Dispatcher,
    lock_store: Arc<dyn LockStore>,
    profile: SubmissionProfile,
    default_ttl: Duration,
}

impl TicketOrchestrator {
    pub fn new(dispatcher: Dispatcher, lock_store: Arc<dyn LockStore>) -> Self {
        Self {
            dispatcher,
            lock_store,
            profile: SubmissionProfile::default(),
            default_ttl: Duration::from_secs(60),
        }
    }

    /// Build from validated configuration with a real HTTP transport and the
    /// configured lock store. Fails fast on bad configuration.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        validate_config(config)?;

        let transport = HttpTransport::new(config.client.timeout()).map_err(|e| {
            ConfigError::ValidationError(format!("Failed to build HTTP client: {}", e))
        })?;
        let lock_store = create_lock_store(&config.lock).map_err(|e| {
            ConfigError::ValidationError(format!("Failed to open lock store: {}", e))
        })?;

        Ok(Self::from_parts(config, Arc::new(transport), lock_store))
    }

    /// Build from configuration with caller-supplied collaborators.
    pub fn from_parts(
        config: &Config,
        transport: Arc<dyn TicketTransport>,
        lock_store: Arc<dyn LockStore>,
    ) -> Self {
        let profile = SubmissionProfile::from(&config.profile);
        let dispatcher = Dispatcher::from_config(&config.client, transport)
            .with_default_path(profile.path.clone());

        Self::new(dispatcher, lock_store)
            .with_profile(profile)
            .with_default_ttl(config.lock.default_ttl())
    }

    pub fn with_profile(mut self, profile: SubmissionProfile) -> Self {
        self.profile = profile;
        self
    }

    /// TTL used when a call passes no `expires`.
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Toggle client-wide debug mode at runtime.
    pub fn set_debug_mode(&self, enabled: bool) {
        self.dispatcher.set_debug_mode(enabled);
    }

    pub fn debug_mode(&self) -> bool {
        self.dispatcher.debug_mode()
    }

    pub fn profile(&self) -> &SubmissionProfile {
        &self.profile
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn lock_store(&self) -> &Arc<dyn LockStore> {
        &self.lock_store
    }

    /// Validate, optionally guard with the idempotency lock, then dispatch.
    ///
    /// Honors `options.timeout_ms` as a deadline for the whole call.
    pub async fn create_ticket(
        &self,
        record: &Record,
        options: CreateTicketOptions,
    ) -> TicketOutcome {
        match options.timeout() {
            Some(limit) => {
                self.create_ticket_with_cancel(record, options, tokio::time::sleep(limit))
                    .await
            }
            None => {
                self.create_ticket_with_cancel(record, options, std::future::pending::<()>())
                    .await
            }
        }
    }

    /// Like [`create_ticket`](Self::create_ticket), abandoning the remaining
    /// steps as soon as `cancel` resolves.
    ///
    /// A lock acquired before cancellation is not released; it lapses with
    /// its TTL.
    pub async fn create_ticket_with_cancel<C>(
        &self,
        record: &Record,
        options: CreateTicketOptions,
        cancel: C,
    ) -> TicketOutcome
    where
        C: Future<Output = ()>,
    {
        let outcome = self.run(record, options, cancel).await;
        SUBMISSIONS_TOTAL
            .with_label_values(&[outcome.label()])
            .inc();
        outcome
    }

    async fn run<C>(&self, record: &Record, options: CreateTicketOptions, cancel: C) -> TicketOutcome
    where
        C: Future<Output = ()>,
    {
        tokio::pin!(cancel);

        let rules = self.profile.rules(&options.fields_to_check);
        let sanitized = match validate(record, &rules) {
            Ok(sanitized) => sanitized,
            Err(error) => {
                debug!(field = error.field(), code = error.code(), "Ticket rejected: {}", error);
                return TicketOutcome::Invalid { error };
            }
        };

        if let Some(key) = options.lock_key() {
            let ttl = options
                .expires
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(self.default_ttl);
            let value = options
                .value
                .clone()
                .unwrap_or_else(|| Value::String(Uuid::new_v4().to_string()));
            let request = LockRequest::new(key, value, ttl);

            let acquired = tokio::select! {
                biased;
                _ = &mut cancel => {
                    debug!(key = %request.key, "Cancelled while acquiring lock");
                    return TicketOutcome::Cancelled { stage: PipelineStage::Lock };
                }
                result = self.lock_store.acquire(&request) => result,
            };

            match acquired {
                Ok(LockOutcome::Acquired) => {
                    LOCK_ATTEMPTS.with_label_values(&["acquired"]).inc();
                    debug!(key = %request.key, ttl_secs = ttl.as_secs(), "Idempotency lock acquired");
                }
                Ok(LockOutcome::Held { status }) => {
                    LOCK_ATTEMPTS.with_label_values(&["held"]).inc();
                    warn!(key = %request.key, status, "Duplicate submission suppressed");
                    return TicketOutcome::Duplicate {
                        key: request.key,
                        status,
                    };
                }
                Err(e) => {
                    LOCK_ATTEMPTS.with_label_values(&["error"]).inc();
                    error!(
                        key = %request.key,
                        store = self.lock_store.name(),
                        "Lock store failure, ticket not sent: {}",
                        e
                    );
                    return TicketOutcome::LockUnavailable {
                        key: request.key,
                        message: e.to_string(),
                    };
                }
            }
        }

        let mut params = DispatchParams::new(self.profile.shape(sanitized))
            .with_path(self.profile.path.clone())
            .with_debug(options.debug);
        params.headers = options.headers;

        tokio::select! {
            biased;
            _ = &mut cancel => {
                debug!("Cancelled while dispatching ticket");
                TicketOutcome::Cancelled { stage: PipelineStage::Dispatch }
            }
            result = self.dispatcher.dispatch(params) => result.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::TransportResponse;
    use crate::lock::{LockError, MemoryLockStore};
    use crate::testing::{fixtures, MockLockStore, MockTransport};
    use crate::validation::{FieldRule, FieldType};
    use serde_json::json;

    struct Harness {
        transport: Arc<MockTransport>,
        locks: Arc<MockLockStore>,
        orchestrator: TicketOrchestrator,
    }

    fn harness() -> Harness {
        let transport = Arc::new(MockTransport::new());
        let locks = Arc::new(MockLockStore::new());
        let orchestrator = TicketOrchestrator::from_parts(
            &fixtures::test_config(),
            Arc::clone(&transport) as Arc<dyn TicketTransport>,
            Arc::clone(&locks) as Arc<dyn LockStore>,
        );
        Harness {
            transport,
            locks,
            orchestrator,
        }
    }

    #[tokio::test]
    async fn test_missing_name_short_circuits() {
        let h = harness();
        let mut record = fixtures::valid_record();
        record.remove("name");

        let outcome = h
            .orchestrator
            .create_ticket(&record, CreateTicketOptions::new().with_key("tx-1"))
            .await;

        match outcome {
            TicketOutcome::Invalid { error } => assert_eq!(error.field(), "name"),
            other => panic!("expected invalid, got {:?}", other),
        }
        assert_eq!(h.locks.call_count().await, 0);
        assert_eq!(h.transport.call_count().await, 0);
    }

    #[test]
    fn test_validation_does_not_suspend() {
        let h = harness();
        let record = Record::new();
        let mut task = tokio_test::task::spawn(
            h.orchestrator
                .create_ticket(&record, CreateTicketOptions::new().with_key("tx-0")),
        );

        let outcome = tokio_test::assert_ready!(task.poll());
        assert_eq!(outcome.label(), "invalid");
    }

    #[tokio::test]
    async fn test_no_key_skips_lock() {
        let h = harness();
        let outcome = h
            .orchestrator
            .create_ticket(&fixtures::valid_record(), CreateTicketOptions::new())
            .await;

        assert!(matches!(outcome, TicketOutcome::Created { .. }));
        assert_eq!(h.locks.call_count().await, 0);
        assert_eq!(h.transport.call_count().await, 1);
    }

    #[tokio::test]
    async fn test_held_key_is_duplicate() {
        let h = harness();
        h.locks.hold("tx-9").await;

        let outcome = h
            .orchestrator
            .create_ticket(
                &fixtures::valid_record(),
                CreateTicketOptions::new().with_key("tx-9"),
            )
            .await;

        assert_eq!(
            outcome,
            TicketOutcome::Duplicate {
                key: "tx-9".to_string(),
                status: 423
            }
        );
        assert_eq!(h.transport.call_count().await, 0);
    }

    #[tokio::test]
    async fn test_lock_store_failure_does_not_dispatch() {
        let h = harness();
        h.locks
            .set_next_error(LockError::Unavailable("connection refused".to_string()))
            .await;

        let outcome = h
            .orchestrator
            .create_ticket(
                &fixtures::valid_record(),
                CreateTicketOptions::new().with_key("tx-2"),
            )
            .await;

        match outcome {
            TicketOutcome::LockUnavailable { key, message } => {
                assert_eq!(key, "tx-2");
                assert!(message.contains("connection refused"));
            }
            other => panic!("expected lock unavailable, got {:?}", other),
        }
        assert_eq!(h.transport.call_count().await, 0);
    }

    #[tokio::test]
    async fn test_lock_request_parameters() {
        let h = harness();
        h.orchestrator
            .create_ticket(
                &fixtures::valid_record(),
                CreateTicketOptions::new()
                    .with_key("tx-3")
                    .with_value(json!({"order": 1}))
                    .with_expires(90),
            )
            .await;

        let requests = h.locks.requests().await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].key, "tx-3");
        assert_eq!(requests[0].value, json!({"order": 1}));
        assert_eq!(requests[0].ttl, Duration::from_secs(90));
    }

    #[tokio::test]
    async fn test_lock_defaults_for_value_and_ttl() {
        let h = harness();
        h.orchestrator
            .create_ticket(
                &fixtures::valid_record(),
                CreateTicketOptions::new().with_key("tx-4").with_expires(0),
            )
            .await;

        let requests = h.locks.requests().await;
        assert_eq!(requests[0].ttl, Duration::from_secs(60));
        let token = requests[0].value.as_str().unwrap();
        assert!(Uuid::parse_str(token).is_ok());
    }

    #[tokio::test]
    async fn test_max_expires_still_returns_outcome() {
        let transport = Arc::new(MockTransport::new());
        let orchestrator = TicketOrchestrator::from_parts(
            &fixtures::test_config(),
            Arc::clone(&transport) as Arc<dyn TicketTransport>,
            Arc::new(MemoryLockStore::new()),
        );
        let options: CreateTicketOptions =
            serde_json::from_value(json!({"key": "tx-max", "expires": u64::MAX})).unwrap();

        let first = orchestrator
            .create_ticket(&fixtures::valid_record(), options.clone())
            .await;
        let second = orchestrator
            .create_ticket(&fixtures::valid_record(), options)
            .await;

        assert_eq!(first.label(), "created");
        assert_eq!(second.label(), "duplicate");
        assert_eq!(transport.call_count().await, 1);
    }

    #[tokio::test]
    async fn test_per_call_rule_is_enforced() {
        let h = harness();
        let options = CreateTicketOptions::new()
            .with_fields(vec![FieldRule::required("priority", FieldType::Integer)]);

        let outcome = h
            .orchestrator
            .create_ticket(&fixtures::valid_record(), options)
            .await;
        match outcome {
            TicketOutcome::Invalid { error } => assert_eq!(error.field(), "priority"),
            other => panic!("expected invalid, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_dispatch_failure_after_lock_keeps_lock() {
        let h = harness();
        h.transport
            .set_response(TransportResponse::new(500, "Internal error"))
            .await;

        let options = CreateTicketOptions::new().with_key("tx-5");
        let outcome = h
            .orchestrator
            .create_ticket(&fixtures::valid_record(), options.clone())
            .await;
        assert!(matches!(outcome, TicketOutcome::Failed { status: Some(500), .. }));

        let retry = h
            .orchestrator
            .create_ticket(&fixtures::valid_record(), options)
            .await;
        assert!(matches!(retry, TicketOutcome::Duplicate { .. }));
        assert_eq!(h.transport.call_count().await, 1);
    }

    #[tokio::test]
    async fn test_header_override_is_forwarded() {
        let h = harness();
        let headers = crate::dispatch::HeaderMap::from([(
            "x-api-key".to_string(),
            "other-key".to_string(),
        )]);
        h.orchestrator
            .create_ticket(
                &fixtures::valid_record(),
                CreateTicketOptions::new().with_headers(headers.clone()),
            )
            .await;

        let sent = h.transport.requests().await;
        assert_eq!(sent[0].headers, headers);
    }

    #[tokio::test]
    async fn test_runtime_debug_toggle() {
        let h = harness();
        h.orchestrator.set_debug_mode(true);
        assert!(h.orchestrator.debug_mode());

        let outcome = h
            .orchestrator
            .create_ticket(&fixtures::valid_record(), CreateTicketOptions::new())
            .await;
        assert!(matches!(outcome, TicketOutcome::DebugEcho { .. }));
        assert_eq!(h.transport.call_count().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_during_lock_is_cancelled() {
        let h = harness();
        h.locks.set_delay(Duration::from_secs(10)).await;

        let outcome = h
            .orchestrator
            .create_ticket(
                &fixtures::valid_record(),
                CreateTicketOptions::new()
                    .with_key("tx-6")
                    .with_timeout(Duration::from_millis(100)),
            )
            .await;

        assert_eq!(
            outcome,
            TicketOutcome::Cancelled {
                stage: PipelineStage::Lock
            }
        );
        assert_eq!(h.transport.call_count().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_during_dispatch_is_cancelled() {
        let h = harness();
        h.transport.set_delay(Duration::from_secs(10)).await;

        let outcome = h
            .orchestrator
            .create_ticket(
                &fixtures::valid_record(),
                CreateTicketOptions::new().with_timeout(Duration::from_millis(100)),
            )
            .await;

        assert_eq!(
            outcome,
            TicketOutcome::Cancelled {
                stage: PipelineStage::Dispatch
            }
        );
    }

    #[tokio::test]
    async fn test_explicit_cancel_signal() {
        let h = harness();
        let outcome = h
            .orchestrator
            .create_ticket_with_cancel(
                &fixtures::valid_record(),
                CreateTicketOptions::new().with_key("tx-7"),
                std::future::ready(()),
            )
            .await;

        assert_eq!(
            outcome,
            TicketOutcome::Cancelled {
                stage: PipelineStage::Lock
            }
        );
        assert_eq!(h.locks.call_count().await, 0);
    }
}
