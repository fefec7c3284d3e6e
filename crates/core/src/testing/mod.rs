//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the external collaborator
//! traits, allowing the whole submission pipeline to be exercised without a
//! ticketing endpoint or a shared lock store.
//!
//! # Example
//!
//! ```rust,ignore
//! use ticketgate_core::testing::{fixtures, MockLockStore, MockTransport};
//!
//! let transport = Arc::new(MockTransport::new());
//! let locks = Arc::new(MockLockStore::new());
//! let orchestrator = TicketOrchestrator::from_parts(&fixtures::test_config(), transport.clone(), locks.clone());
//!
//! orchestrator.create_ticket(&fixtures::valid_record(), CreateTicketOptions::new()).await;
//! assert_eq!(transport.call_count().await, 1);
//! ```

mod mock_lock_store;
mod mock_transport;

pub use mock_lock_store::MockLockStore;
pub use mock_transport::MockTransport;

/// Test fixtures and helper functions.
pub mod fixtures {
    use serde_json::{json, Value};

    use crate::config::{ClientConfig, Config, LockConfig, ProfileConfig, ServerConfig};
    use crate::validation::Record;

    /// Turn a JSON object literal into a record.
    pub fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            other => panic!("record fixture must be a JSON object, got {}", other),
        }
    }

    /// A record that passes the base rules unchanged.
    pub fn valid_record() -> Record {
        record(json!({
            "email": "a@b.com",
            "name": "A",
            "subject": "S",
            "message": "M"
        }))
    }

    /// Configuration pointing at a host that is never contacted by mocks.
    pub fn test_config() -> Config {
        let mut client = ClientConfig::new("test-key");
        client.base_url = "http://ticketing.test/".to_string();
        Config {
            client,
            lock: LockConfig::default(),
            profile: ProfileConfig::default(),
            server: ServerConfig::default(),
        }
    }
}
