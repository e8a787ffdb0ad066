//! The assembled, immutable service.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use accord_core::api::{Api, Endpoint};
use accord_core::di::Capabilities;
use accord_core::error::{ApiError, ApiResult};
use accord_core::format::{ErrorFormatter, RenderedError};
use accord_core::RequestId;
use accord_telemetry::Logger;
use bytes::Bytes;
use indexmap::IndexMap;
use tracing::instrument::WithSubscriber;
use tracing::{Dispatch, Instrument};

use crate::decode::{RawRequest, RequestDecoder};
use crate::encode::{ApiResponse, ResponseEncoder};
use crate::handler::{HandlerFn, Input};
use crate::registry::Binding;

/// Everything needed to serve one endpoint, resolved at assembly.
struct Route {
    endpoint: Arc<Endpoint>,
    decoder: RequestDecoder,
    encoder: ResponseEncoder,
    handler: HandlerFn,
    capabilities: Capabilities,
}

impl Route {
    async fn handle(&self, request_id: RequestId, raw: RawRequest) -> ApiResult<ApiResponse> {
        let started = Instant::now();

        let decoded = match self.decoder.decode(&raw) {
            Ok(decoded) => decoded,
            Err(failure) => {
                tracing::debug!(
                    group = %failure.group,
                    error = %failure.diagnostic,
                    "request rejected"
                );
                return Err(failure.into_api_error());
            }
        };

        let input = Input::new(
            Arc::clone(&self.endpoint),
            request_id,
            decoded,
            self.capabilities.clone(),
        );

        let output = match (self.handler)(input).await {
            Ok(output) => output,
            Err(err) => {
                tracing::warn!(
                    error_kind = %err.kind(),
                    status = err.status_code().as_u16(),
                    error = %err,
                    "handler failed"
                );
                return Err(err);
            }
        };

        match self.encoder.encode(output) {
            Ok(response) => {
                tracing::debug!(
                    status = response.status.as_u16(),
                    duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
                    "request completed"
                );
                Ok(response)
            }
            Err(err) => {
                tracing::error!(error_kind = %err.kind(), error = %err, "response rejected");
                Err(err)
            }
        }
    }
}

struct Inner {
    api: Arc<Api>,
    name: String,
    version: String,
    routes: HashMap<String, Route>,
    formatter: ErrorFormatter,
    logger: Logger,
    dispatch: Option<Dispatch>,
}

/// A fully implemented API, ready to serve.
///
/// Cloning is cheap; clones share the same routes. Safe for any number of
/// concurrent dispatches.
///
/// # Example
///
/// ```rust
/// use accord_core::fixtures;
/// use accord_server::decode::RawRequest;
/// use accord_server::handler::Output;
/// use accord_server::Registry;
/// use http::StatusCode;
/// use serde_json::json;
///
/// # tokio_test::block_on(async {
/// let service = Registry::new(fixtures::hello_api().unwrap())
///     .bind("hello", |_input| async {
///         Ok(Output::new(12)
///             .status(StatusCode::CREATED)
///             .header("x-hello-world", "test"))
///     })
///     .unwrap()
///     .assemble()
///     .unwrap();
///
/// let response = service.dispatch("hello", RawRequest::new()).await.unwrap();
/// assert_eq!(response.status, StatusCode::CREATED);
/// assert_eq!(response.content, json!(12));
/// # });
/// ```
#[derive(Clone)]
pub struct Service {
    inner: Arc<Inner>,
}

impl Service {
    pub(crate) fn new(
        api: Arc<Api>,
        bindings: IndexMap<String, Binding>,
        formatter: ErrorFormatter,
        logger: Logger,
        (name, version): (String, String),
    ) -> Self {
        let routes = bindings
            .into_iter()
            .filter_map(|(id, binding)| {
                let endpoint = Arc::clone(api.endpoint(&id)?);
                let route = Route {
                    decoder: RequestDecoder::new(endpoint.request()),
                    encoder: ResponseEncoder::new(endpoint.response()),
                    endpoint,
                    handler: binding.handler,
                    capabilities: binding.capabilities,
                };
                Some((id, route))
            })
            .collect();

        let dispatch = logger.dispatch();
        Self {
            inner: Arc::new(Inner {
                api,
                name,
                version,
                routes,
                formatter,
                logger,
                dispatch,
            }),
        }
    }

    /// Returns the API this service implements.
    #[must_use]
    pub fn api(&self) -> &Api {
        &self.inner.api
    }

    /// Returns the name reported on dispatch spans.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Returns the version reported on dispatch spans.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.inner.version
    }

    /// Returns the error formatter.
    #[must_use]
    pub fn formatter(&self) -> &ErrorFormatter {
        &self.inner.formatter
    }

    /// Returns the logger preset.
    #[must_use]
    pub fn logger(&self) -> &Logger {
        &self.inner.logger
    }

    /// Serves one already-routed request.
    ///
    /// Decodes the raw groups, runs the handler and encodes its output. The
    /// whole dispatch, handler included, runs under the service's logger.
    pub async fn dispatch(&self, id: &str, raw: RawRequest) -> ApiResult<ApiResponse> {
        match &self.inner.dispatch {
            Some(dispatch) => self.run(id, raw).with_subscriber(dispatch.clone()).await,
            None => self.run(id, raw).await,
        }
    }

    /// Serves one request and renders any error with the formatter.
    pub async fn respond(&self, id: &str, raw: RawRequest) -> http::Response<Bytes> {
        match self.dispatch(id, raw).await {
            Ok(response) => response.into_http(),
            Err(err) => self.render(&err).into_http(),
        }
    }

    /// Renders an error with the service's formatter.
    #[must_use]
    pub fn render(&self, err: &ApiError) -> RenderedError {
        self.inner.formatter.format(err)
    }

    async fn run(&self, id: &str, raw: RawRequest) -> ApiResult<ApiResponse> {
        let Some(route) = self.inner.routes.get(id) else {
            tracing::warn!(endpoint_id = %id, "dispatch to unknown endpoint");
            return Err(ApiError::UnknownEndpoint { id: id.to_string() });
        };

        let request_id = RequestId::new();
        let span = tracing::info_span!(
            "accord.dispatch",
            service = %self.inner.name,
            service_version = %self.inner.version,
            endpoint_id = %id,
            request_id = %request_id
        );
        route.handle(request_id, raw).instrument(span).await
    }
}

impl fmt::Debug for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Service")
            .field("name", &self.inner.name)
            .field("api", &self.inner.api.name())
            .field("endpoints", &self.inner.api.ids().collect::<Vec<_>>())
            .field("formatter", &self.inner.formatter)
            .field("logger", &self.inner.logger)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::Output;
    use crate::Registry;
    use accord_core::fixtures;
    use http::StatusCode;
    use serde_json::json;

    fn hello_service(formatter: ErrorFormatter) -> Service {
        Registry::new(fixtures::hello_api().unwrap())
            .bind("hello", |_input| async {
                Ok(Output::new(12)
                    .status(StatusCode::CREATED)
                    .header("x-hello-world", "test"))
            })
            .unwrap()
            .error_formatter(formatter)
            .logger(Logger::Silent)
            .assemble()
            .unwrap()
    }

    #[tokio::test]
    async fn test_dispatch() {
        let response = hello_service(ErrorFormatter::Default)
            .dispatch("hello", RawRequest::new())
            .await
            .unwrap();

        assert_eq!(response.status, StatusCode::CREATED);
        assert_eq!(response.content, json!(12));
        assert_eq!(response.header("x-hello-world"), Some("test"));
    }

    #[tokio::test]
    async fn test_dispatch_unknown_endpoint() {
        let err = hello_service(ErrorFormatter::Default)
            .dispatch("goodbye", RawRequest::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::UnknownEndpoint { ref id } if id == "goodbye"));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_respond_renders_errors() {
        let service = hello_service(ErrorFormatter::Pretty);
        let response = service.respond("goodbye", RawRequest::new()).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.body().as_ref(),
            b"404 Not Found: unknown endpoint 'goodbye'"
        );
    }

    #[tokio::test]
    async fn test_respond_success() {
        let response = hello_service(ErrorFormatter::Default)
            .respond("hello", RawRequest::new())
            .await;

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()["x-hello-world"], "test");
        assert_eq!(response.body().as_ref(), b"12");
    }

    #[test]
    fn test_service_is_send_sync_clone() {
        fn assert_traits<T: Send + Sync + Clone>() {}
        assert_traits::<Service>();
    }

    #[test]
    fn test_debug() {
        let service = hello_service(ErrorFormatter::Structured);
        let debug = format!("{service:?}");
        assert!(debug.contains("hello-service"));
        assert!(debug.contains("structured"));
    }
}
