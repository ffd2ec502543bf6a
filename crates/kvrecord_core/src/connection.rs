//! Backend connections and their resolution per model type.
//!
//! A type uses its own override if one is set, else the nearest
//! ancestor's override, else the registry-wide default. Resolution
//! happens on every call so that changing an override is seen by all
//! existing records without an override of their own.

use crate::error::CoreResult;
use crate::schema::SchemaRegistry;
use crate::types::TypeName;
use kvrecord_backend::KvBackend;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;
use tracing::debug;

/// A shareable handle to a key-value backend.
///
/// Clones share the same backend. Two connections are equal when they
/// point at the same backend instance.
#[derive(Clone)]
pub struct Connection {
    name: Arc<str>,
    backend: Arc<dyn KvBackend>,
}

impl Connection {
    /// Wraps a backend under the name `"default"`.
    pub fn new(backend: impl KvBackend + 'static) -> Self {
        Self::named("default", backend)
    }

    /// Wraps a backend under a name used in diagnostics.
    pub fn named(name: impl AsRef<str>, backend: impl KvBackend + 'static) -> Self {
        Self::from_arc(name, Arc::new(backend))
    }

    /// Wraps an already shared backend.
    pub fn from_arc(name: impl AsRef<str>, backend: Arc<dyn KvBackend>) -> Self {
        Self {
            name: Arc::from(name.as_ref()),
            backend,
        }
    }

    /// Returns the connection name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true if both handles share one backend.
    pub fn same_backend(&self, other: &Connection) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.backend), Arc::as_ptr(&other.backend))
    }
}

impl Deref for Connection {
    type Target = dyn KvBackend;

    fn deref(&self) -> &Self::Target {
        &*self.backend
    }
}

impl PartialEq for Connection {
    fn eq(&self, other: &Self) -> bool {
        self.same_backend(other)
    }
}

impl Eq for Connection {}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Connection").field(&self.name).finish()
    }
}

/// Resolves the connection for a model type.
pub struct ConnectionResolver {
    default: RwLock<Connection>,
    overrides: RwLock<HashMap<TypeName, Connection>>,
}

impl ConnectionResolver {
    /// Creates a resolver with the given default connection.
    pub fn new(default: Connection) -> Self {
        Self {
            default: RwLock::new(default),
            overrides: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the default connection.
    pub fn default_connection(&self) -> Connection {
        self.default.read().clone()
    }

    /// Replaces the default connection.
    pub fn set_default_connection(&self, connection: Connection) {
        debug!(connection = connection.name(), "default connection replaced");
        *self.default.write() = connection;
    }

    /// Returns the override bound to exactly this type.
    pub fn override_for(&self, model: &TypeName) -> Option<Connection> {
        self.overrides.read().get(model).cloned()
    }

    /// Sets the override for exactly this type, or clears it with `None`.
    ///
    /// Overrides of subtypes are left alone.
    pub fn set_override(&self, model: &TypeName, connection: Option<Connection>) {
        let mut overrides = self.overrides.write();
        match connection {
            Some(connection) => {
                debug!(model = %model, connection = connection.name(), "connection override set");
                overrides.insert(model.clone(), connection);
            }
            None => {
                debug!(model = %model, "connection override cleared");
                overrides.remove(model);
            }
        }
    }

    /// Resolves the connection for a type by walking its parent chain.
    pub fn connection_for(
        &self,
        schemas: &SchemaRegistry,
        model: &TypeName,
    ) -> CoreResult<Connection> {
        let lineage = schemas.lineage(model)?;
        let overrides = self.overrides.read();
        for ty in &lineage {
            if let Some(connection) = overrides.get(ty) {
                return Ok(connection.clone());
            }
        }
        Ok(self.default_connection())
    }
}

impl fmt::Debug for ConnectionResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionResolver")
            .field("default", &*self.default.read())
            .field("overrides", &*self.overrides.read())
            .finish()
    }
}
