//! Exhaustive handler registration.
//!
//! A [`Registry`] starts with every endpoint of its [`Api`] unimplemented.
//! Each successful [`bind`](Registry::bind) moves exactly one id from the
//! unimplemented set to the bound handlers. [`assemble`](Registry::assemble)
//! succeeds only when nothing is left unimplemented.
//!
//! At every step:
//!
//! - unimplemented ∪ bound = the API's ids
//! - unimplemented ∩ bound = ∅
//!
//! # Example
//!
//! ```rust
//! use accord_core::fixtures;
//! use accord_server::handler::Output;
//! use accord_server::Registry;
//! use http::StatusCode;
//!
//! let registry = Registry::new(fixtures::hello_api().unwrap());
//! assert!(!registry.is_complete());
//!
//! let service = registry
//!     .bind("hello", |_input| async {
//!         Ok(Output::new(12)
//!             .status(StatusCode::CREATED)
//!             .header("x-hello-world", "test"))
//!     })
//!     .unwrap()
//!     .assemble()
//!     .unwrap();
//!
//! assert_eq!(service.api().name(), "hello-service");
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use accord_core::api::Api;
use accord_core::di::Capabilities;
use accord_core::error::{ApiResult, ConfigError};
use accord_core::format::ErrorFormatter;
use accord_telemetry::Logger;
use indexmap::{IndexMap, IndexSet};

use crate::handler::{handler_fn, HandlerFn, Input, Output};
use crate::service::Service;

/// A bound handler and the capabilities it was given.
#[derive(Clone)]
pub(crate) struct Binding {
    pub(crate) handler: HandlerFn,
    pub(crate) capabilities: Capabilities,
}

/// Tracks which endpoints have handlers and assembles the service.
pub struct Registry {
    api: Arc<Api>,
    unimplemented: IndexSet<String>,
    bindings: IndexMap<String, Binding>,
    formatter: ErrorFormatter,
    logger: Logger,
    name: Option<String>,
    version: Option<String>,
}

impl Registry {
    /// Creates a registry with every endpoint unimplemented.
    #[must_use]
    pub fn new(api: impl Into<Arc<Api>>) -> Self {
        let api = api.into();
        let unimplemented = api.ids().map(str::to_string).collect();
        Self {
            api,
            unimplemented,
            bindings: IndexMap::new(),
            formatter: ErrorFormatter::default(),
            logger: Logger::default(),
            name: None,
            version: None,
        }
    }

    /// Binds a handler to an endpoint.
    ///
    /// Fails with [`ConfigError::UnknownEndpoint`] for an id the API does not
    /// declare and with [`ConfigError::AlreadyBound`] for an id that already
    /// has a handler.
    pub fn bind<F, Fut>(self, id: &str, handler: F) -> Result<Self, ConfigError>
    where
        F: Fn(Input) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ApiResult<Output>> + Send + 'static,
    {
        self.bind_erased(id, handler_fn(handler))
    }

    /// Binds an already-erased handler.
    pub fn bind_erased(mut self, id: &str, handler: HandlerFn) -> Result<Self, ConfigError> {
        if !self.api.contains(id) {
            return Err(ConfigError::UnknownEndpoint { id: id.to_string() });
        }
        if !self.unimplemented.shift_remove(id) {
            return Err(ConfigError::AlreadyBound { id: id.to_string() });
        }

        tracing::debug!(endpoint_id = %id, remaining = self.unimplemented.len(), "handler bound");
        self.bindings.insert(
            id.to_string(),
            Binding {
                handler,
                capabilities: Capabilities::new(),
            },
        );
        Ok(self)
    }

    /// Provides a capability to every handler bound so far.
    ///
    /// Handlers bound later do not see it.
    #[must_use]
    pub fn provide<T: Send + Sync + 'static>(mut self, service: Arc<T>) -> Self {
        for binding in self.bindings.values_mut() {
            binding.capabilities.insert(Arc::clone(&service));
        }
        self
    }

    /// Replaces every bound handler with `transform(handler)`.
    ///
    /// Bindings are neither added nor removed.
    #[must_use]
    pub fn reconfigure<T>(mut self, transform: T) -> Self
    where
        T: Fn(HandlerFn) -> HandlerFn,
    {
        for binding in self.bindings.values_mut() {
            binding.handler = transform(Arc::clone(&binding.handler));
        }
        self
    }

    /// Sets the error formatter.
    #[must_use]
    pub fn error_formatter(mut self, formatter: ErrorFormatter) -> Self {
        self.formatter = formatter;
        self
    }

    /// Sets the logger.
    #[must_use]
    pub fn logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    /// Sets the service name reported on dispatch spans.
    ///
    /// Defaults to the API name.
    #[must_use]
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the service version reported on dispatch spans.
    ///
    /// Defaults to the API version.
    #[must_use]
    pub fn service_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Returns the API.
    #[must_use]
    pub fn api(&self) -> &Api {
        &self.api
    }

    /// Returns the ids still missing a handler, in declaration order.
    pub fn unimplemented(&self) -> impl Iterator<Item = &str> + '_ {
        self.unimplemented.iter().map(String::as_str)
    }

    /// Returns the ids with a handler, in binding order.
    pub fn bound(&self) -> impl Iterator<Item = &str> + '_ {
        self.bindings.keys().map(String::as_str)
    }

    /// Returns whether every endpoint has a handler.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.unimplemented.is_empty()
    }

    /// Assembles the service.
    ///
    /// Fails with [`ConfigError::Unimplemented`] listing the missing ids.
    pub fn assemble(self) -> Result<Service, ConfigError> {
        if !self.unimplemented.is_empty() {
            return Err(ConfigError::Unimplemented {
                ids: self.unimplemented.into_iter().collect(),
            });
        }

        let name = self.name.unwrap_or_else(|| self.api.name().to_string());
        let version = self.version.unwrap_or_else(|| self.api.version().to_string());
        Ok(Service::new(
            self.api,
            self.bindings,
            self.formatter,
            self.logger,
            (name, version),
        ))
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("api", &self.api.name())
            .field("unimplemented", &self.unimplemented)
            .field("bound", &self.bindings.keys().collect::<Vec<_>>())
            .field("formatter", &self.formatter)
            .field("logger", &self.logger)
            .finish()
    }
}
