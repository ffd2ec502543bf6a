//! Test fixtures and registry helpers.
//!
//! Every fixture owns a fresh [`InMemoryBackend`] and a fresh
//! [`Registry`], so tests never share types or stored data.

use kvrecord_backend::{InMemoryBackend, KvBackend};
use kvrecord_core::{Config, Connection, Model, Registry};
use std::sync::{Arc, Once};
use tracing_subscriber::EnvFilter;

/// A registry over an in-memory backend, with direct backend access.
pub struct TestRegistry {
    /// The registry instance.
    pub registry: Arc<Registry>,
    /// The default connection of the registry.
    pub connection: Connection,
}

impl TestRegistry {
    /// Creates a registry with the default configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates a registry with a custom configuration.
    pub fn with_config(config: Config) -> Self {
        let connection = Connection::named("test", InMemoryBackend::new());
        Self {
            registry: Registry::with_config(connection.clone(), config),
            connection,
        }
    }

    /// Defines `User` with a plain `name` and a searchable `email`.
    pub fn user_model(&self) -> Model {
        let users = self
            .registry
            .define_model("User", None)
            .expect("Failed to define User");
        if users.properties().map(|p| p.len()).unwrap_or(0) == 1 {
            users.property("name").expect("Failed to declare name");
            users.searchable("email").expect("Failed to declare email");
        }
        users
    }

    /// Returns the raw value at `key` on the default connection.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.connection.get(key).expect("Failed to read key")
    }

    /// Returns true if `key` exists on the default connection.
    pub fn exists(&self, key: &str) -> bool {
        self.connection.exists(key).expect("Failed to check key")
    }
}

impl Default for TestRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Deref for TestRegistry {
    type Target = Arc<Registry>;

    fn deref(&self) -> &Self::Target {
        &self.registry
    }
}

/// Runs a test with a fresh registry.
///
/// # Example
///
/// ```rust,ignore
/// use kvrecord_testkit::with_registry;
///
/// #[test]
/// fn my_test() {
///     with_registry(|fx| {
///         let users = fx.user_model();
///         assert_eq!(users.all().unwrap().count(), 0);
///     });
/// }
/// ```
pub fn with_registry<F, R>(f: F) -> R
where
    F: FnOnce(&TestRegistry) -> R,
{
    init_tracing();
    let fixture = TestRegistry::new();
    f(&fixture)
}

/// Creates a standalone in-memory connection.
pub fn memory_connection(name: &str) -> Connection {
    Connection::named(name, InMemoryBackend::new())
}

/// Installs a test-friendly tracing subscriber once per process.
///
/// The filter comes from `RUST_LOG`, defaulting to `warn`.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}
