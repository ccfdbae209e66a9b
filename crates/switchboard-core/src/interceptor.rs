//! # Interceptor Chain
//!
//! Before/after hooks wrapped around a single-result handler invocation.
//!
//! Each handler registration may declare an ordered list of
//! [`InterceptorBinding`]s. At dispatch time the chain instantiates one fresh
//! interceptor per binding (no cross-call state is retained by the mediator
//! on an interceptor's behalf), runs every `before` hook in declaration
//! order, lets the handler run, then runs every `after` hook in declaration
//! order.
//!
//! Failure semantics are fail-fast: the first failing hook aborts the
//! remaining steps of the chain for that dispatch, unlike the
//! independent-handler fan-out used for notifications. Notifications bypass
//! the chain entirely.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use switchboard_types::{DispatchError, InterceptorStage, MethodDescriptor, TypeDescriptor};

use crate::handler::AnyMessage;

/// A cross-cutting hook pair wrapped around a handler invocation.
///
/// The async hooks default to delegating to their sync counterparts, so an
/// interceptor written for the synchronous path participates in asynchronous
/// dispatch unchanged; interceptors that need to suspend override the async
/// variants.
#[async_trait]
pub trait Interceptor: Send + Sync {
    /// Runs before the handler. A failure here prevents the handler from
    /// being invoked.
    fn before_invoke(
        &self,
        method: &MethodDescriptor,
        request: &AnyMessage,
        request_type: TypeDescriptor,
    ) -> anyhow::Result<()>;

    /// Runs after the handler, receiving the erased result value.
    fn after_invoke(
        &self,
        method: &MethodDescriptor,
        request: &AnyMessage,
        request_type: TypeDescriptor,
        response: &AnyMessage,
    ) -> anyhow::Result<()>;

    /// Async equivalent of [`before_invoke`](Self::before_invoke).
    async fn before_invoke_async(
        &self,
        method: &MethodDescriptor,
        request: &AnyMessage,
        request_type: TypeDescriptor,
    ) -> anyhow::Result<()> {
        self.before_invoke(method, request, request_type)
    }

    /// Async equivalent of [`after_invoke`](Self::after_invoke).
    async fn after_invoke_async(
        &self,
        method: &MethodDescriptor,
        request: &AnyMessage,
        request_type: TypeDescriptor,
        response: &AnyMessage,
    ) -> anyhow::Result<()> {
        self.after_invoke(method, request, request_type, response)
    }
}

type InterceptorFactory = Arc<dyn Fn(&serde_json::Value) -> Box<dyn Interceptor> + Send + Sync>;

/// Declares one interceptor on a handler registration.
///
/// The binding carries the interceptor's type name, its configuration data,
/// and a factory producing a fresh instance per dispatch call.
#[derive(Clone)]
pub struct InterceptorBinding {
    name: &'static str,
    config: serde_json::Value,
    factory: InterceptorFactory,
}

impl InterceptorBinding {
    /// Binds an interceptor type with no configuration data.
    pub fn new<I, F>(factory: F) -> Self
    where
        I: Interceptor + 'static,
        F: Fn() -> I + Send + Sync + 'static,
    {
        Self::with_config(serde_json::Value::Null, move |_| factory())
    }

    /// Binds an interceptor type with configuration data handed to the
    /// factory on every resolution.
    pub fn with_config<I, F>(config: serde_json::Value, factory: F) -> Self
    where
        I: Interceptor + 'static,
        F: Fn(&serde_json::Value) -> I + Send + Sync + 'static,
    {
        Self {
            name: std::any::type_name::<I>(),
            config,
            factory: Arc::new(move |config| Box::new(factory(config))),
        }
    }

    /// The bound interceptor type's name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The binding's configuration data.
    #[must_use]
    pub fn config(&self) -> &serde_json::Value {
        &self.config
    }

    fn resolve(&self) -> Box<dyn Interceptor> {
        (self.factory)(&self.config)
    }
}

impl fmt::Debug for InterceptorBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptorBinding")
            .field("name", &self.name)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// The resolved interceptors of one dispatch call, in declaration order.
///
/// Lives only for the duration of that call.
pub(crate) struct InterceptorChain {
    interceptors: Vec<(&'static str, Box<dyn Interceptor>)>,
}

impl InterceptorChain {
    /// Instantiates one fresh interceptor per binding, in declaration order.
    pub(crate) fn resolve(bindings: &[InterceptorBinding]) -> Self {
        Self {
            interceptors: bindings
                .iter()
                .map(|binding| (binding.name(), binding.resolve()))
                .collect(),
        }
    }

    /// Runs every `before` hook in order, fail-fast.
    pub(crate) fn run_before(
        &self,
        method: &MethodDescriptor,
        request: &AnyMessage,
        request_type: TypeDescriptor,
    ) -> Result<(), DispatchError> {
        for (name, interceptor) in &self.interceptors {
            interceptor
                .before_invoke(method, request, request_type)
                .map_err(|source| DispatchError::InterceptorFailure {
                    interceptor: name,
                    stage: InterceptorStage::Before,
                    source,
                })?;
        }
        Ok(())
    }

    /// Runs every `after` hook in order, fail-fast.
    pub(crate) fn run_after(
        &self,
        method: &MethodDescriptor,
        request: &AnyMessage,
        request_type: TypeDescriptor,
        response: &AnyMessage,
    ) -> Result<(), DispatchError> {
        for (name, interceptor) in &self.interceptors {
            interceptor
                .after_invoke(method, request, request_type, response)
                .map_err(|source| DispatchError::InterceptorFailure {
                    interceptor: name,
                    stage: InterceptorStage::After,
                    source,
                })?;
        }
        Ok(())
    }

    /// Runs every `before` hook in order, awaiting each, fail-fast.
    pub(crate) async fn run_before_async(
        &self,
        method: &MethodDescriptor,
        request: &AnyMessage,
        request_type: TypeDescriptor,
    ) -> Result<(), DispatchError> {
        for (name, interceptor) in &self.interceptors {
            interceptor
                .before_invoke_async(method, request, request_type)
                .await
                .map_err(|source| DispatchError::InterceptorFailure {
                    interceptor: name,
                    stage: InterceptorStage::Before,
                    source,
                })?;
        }
        Ok(())
    }

    /// Runs every `after` hook in order, awaiting each, fail-fast.
    pub(crate) async fn run_after_async(
        &self,
        method: &MethodDescriptor,
        request: &AnyMessage,
        request_type: TypeDescriptor,
        response: &AnyMessage,
    ) -> Result<(), DispatchError> {
        for (name, interceptor) in &self.interceptors {
            interceptor
                .after_invoke_async(method, request, request_type, response)
                .await
                .map_err(|source| DispatchError::InterceptorFailure {
                    interceptor: name,
                    stage: InterceptorStage::After,
                    source,
                })?;
        }
        Ok(())
    }
}

/// Built-in interceptor that logs each invocation via `tracing`.
pub struct TracingInterceptor;

impl Interceptor for TracingInterceptor {
    fn before_invoke(
        &self,
        method: &MethodDescriptor,
        _request: &AnyMessage,
        request_type: TypeDescriptor,
    ) -> anyhow::Result<()> {
        debug!(method = %method, request_type = %request_type, "Invoking handler");
        Ok(())
    }

    fn after_invoke(
        &self,
        method: &MethodDescriptor,
        _request: &AnyMessage,
        _request_type: TypeDescriptor,
        _response: &AnyMessage,
    ) -> anyhow::Result<()> {
        debug!(method = %method, "Handler returned");
        Ok(())
    }
}
