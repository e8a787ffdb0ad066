//! Per-handler capability containers.
//!
//! A [`Capabilities`] set holds `Arc`-wrapped services keyed by type. Each bound
//! handler owns its own set; there is no global registry. Handlers read from
//! their set through `Input::service::<T>()`.
//!
//! # Example
//!
//! ```
//! use accord_core::di::Capabilities;
//! use std::sync::Arc;
//!
//! struct Clock {
//!     offset_secs: i64,
//! }
//!
//! let mut caps = Capabilities::new();
//! caps.insert(Arc::new(Clock { offset_secs: 3 }));
//!
//! let clock: Arc<Clock> = caps.get().unwrap();
//! assert_eq!(clock.offset_secs, 3);
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// A capability was requested but never provided.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("capability {type_name} was not provided to this handler")]
pub struct MissingCapability {
    /// The requested type.
    pub type_name: &'static str,
}

impl MissingCapability {
    /// Creates the error for `T`.
    #[must_use]
    pub fn of<T>() -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
        }
    }
}

/// A type-keyed set of shared services.
///
/// Cloning is cheap: services are shared, not copied.
#[derive(Clone, Default)]
pub struct Capabilities {
    services: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl Capabilities {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a service, replacing any previous one of the same type.
    pub fn insert<T: Send + Sync + 'static>(&mut self, service: Arc<T>) {
        self.services.insert(TypeId::of::<T>(), service);
    }

    /// Returns the service of type `T`, if provided.
    #[must_use]
    pub fn get<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.services
            .get(&TypeId::of::<T>())
            .and_then(|s| s.clone().downcast::<T>().ok())
    }

    /// Returns the service of type `T` or a [`MissingCapability`] error.
    pub fn require<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, MissingCapability> {
        self.get().ok_or_else(MissingCapability::of::<T>)
    }

    /// Checks whether a service of type `T` is present.
    #[must_use]
    pub fn contains<T: Send + Sync + 'static>(&self) -> bool {
        self.services.contains_key(&TypeId::of::<T>())
    }

    /// Returns the number of services.
    #[must_use]
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Returns `true` if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capabilities")
            .field("service_count", &self.services.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Database {
        url: String,
    }

    #[derive(Debug)]
    struct Cache;

    #[test]
    fn test_insert_and_get() {
        let mut caps = Capabilities::new();
        caps.insert(Arc::new(Database {
            url: "postgres://localhost".into(),
        }));

        let db: Arc<Database> = caps.get().unwrap();
        assert_eq!(db.url, "postgres://localhost");
        assert!(caps.get::<Cache>().is_none());
    }

    #[test]
    fn test_require_missing() {
        let caps = Capabilities::new();
        let err = caps.require::<Cache>().unwrap_err();
        assert!(err.type_name.ends_with("Cache"));
        assert!(err.to_string().contains("was not provided"));
    }

    #[test]
    fn test_insert_replaces_same_type() {
        let mut caps = Capabilities::new();
        caps.insert(Arc::new(Database { url: "a".into() }));
        caps.insert(Arc::new(Database { url: "b".into() }));

        assert_eq!(caps.len(), 1);
        assert_eq!(caps.require::<Database>().unwrap().url, "b");
    }

    #[test]
    fn test_clone_shares_services() {
        let mut caps = Capabilities::new();
        caps.insert(Arc::new(Cache));
        let copy = caps.clone();

        caps.insert(Arc::new(Database { url: "x".into() }));
        assert!(copy.contains::<Cache>());
        assert!(!copy.contains::<Database>());
        assert!(!copy.is_empty());
    }

    #[test]
    fn test_debug_shows_count() {
        let caps = Capabilities::new();
        assert_eq!(format!("{:?}", caps), "Capabilities { service_count: 0 }");
    }
}
