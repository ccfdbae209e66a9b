//! # Dispatch Plan
//!
//! Per-call resolution of a request to the concrete handler method that will
//! service it. A plan is created fresh for every dispatch, owned exclusively
//! by that call, and never cached or shared. The resolver may cache handler
//! instances; the plan does not.
//!
//! Resolution performs exactly one resolver lookup and validates the full
//! handler contract: the request type must have a registered handler, of the
//! shape the operation asked for, producing the result type the caller
//! expects. Every violation is a [`DispatchError`] value that the mediator
//! captures into the envelope; resolution never panics.

use std::sync::Arc;

use tracing::debug;

use switchboard_types::{DispatchError, DispatchShape, MethodDescriptor, TypeDescriptor};

use crate::interceptor::InterceptorBinding;
use crate::registry::{RequestEntry, RequestHandlerSlot};
use crate::resolver::Resolver;

/// The resolved binding of one request dispatch: concrete method, handler
/// instance, and the interceptor bindings declared on that method.
pub struct DispatchPlan {
    entry: Arc<RequestEntry>,
}

impl DispatchPlan {
    /// Resolves the handler for `(request, response)` with the given shape.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::HandlerNotFound`] when no handler is registered
    ///   for the request type.
    /// - [`DispatchError::HandlerShapeMismatch`] when the registered handler
    ///   has the other sync/async shape.
    /// - [`DispatchError::ResponseTypeMismatch`] when the registered handler
    ///   produces a different result type.
    pub fn resolve(
        resolver: &dyn Resolver,
        request: TypeDescriptor,
        response: TypeDescriptor,
        shape: DispatchShape,
    ) -> Result<Self, DispatchError> {
        let entry = resolver.resolve_request_handler(request.id()).ok_or(
            DispatchError::HandlerNotFound {
                request_type: request.name(),
            },
        )?;

        if entry.shape() != shape {
            return Err(DispatchError::HandlerShapeMismatch {
                request_type: request.name(),
                expected: shape,
                found: entry.shape(),
            });
        }

        if entry.response_type().id() != response.id() {
            return Err(DispatchError::ResponseTypeMismatch {
                request_type: request.name(),
                expected: response.name(),
                found: entry.response_type().name(),
            });
        }

        debug!(method = %entry.method(), "Dispatch plan resolved");
        Ok(Self { entry })
    }

    /// The concrete method this plan dispatches to.
    #[must_use]
    pub fn method(&self) -> &MethodDescriptor {
        self.entry.method()
    }

    /// The interceptor bindings declared on the resolved method, in order.
    #[must_use]
    pub fn interceptor_bindings(&self) -> &[InterceptorBinding] {
        self.entry.interceptors()
    }

    pub(crate) fn handler(&self) -> &RequestHandlerSlot {
        &self.entry.handler
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{AsyncRequestHandler, RequestHandler};
    use crate::registry::RegistryBuilder;
    use async_trait::async_trait;
    use switchboard_types::Request;

    struct Ping;

    impl Request for Ping {
        type Response = String;
    }

    struct PingHandler;

    impl RequestHandler<Ping> for PingHandler {
        fn handle(&self, _request: &Ping) -> anyhow::Result<String> {
            Ok("pong".to_string())
        }
    }

    struct Sleep;

    impl Request for Sleep {
        type Response = u64;
    }

    struct SleepHandler;

    #[async_trait]
    impl AsyncRequestHandler<Sleep> for SleepHandler {
        async fn handle(&self, _request: &Sleep) -> anyhow::Result<u64> {
            Ok(0)
        }
    }

    fn registry() -> crate::registry::HandlerRegistry {
        let mut builder = RegistryBuilder::new();
        builder.register_request_handler::<Ping, _>(PingHandler).unwrap();
        builder.register_async_request_handler::<Sleep, _>(SleepHandler).unwrap();
        builder.build()
    }

    #[test]
    fn test_resolve_success() {
        let registry = registry();

        let plan = DispatchPlan::resolve(
            &registry,
            TypeDescriptor::of::<Ping>(),
            TypeDescriptor::of::<String>(),
            DispatchShape::Sync,
        )
        .unwrap();

        assert!(plan.method().handler().contains("PingHandler"));
        assert!(plan.interceptor_bindings().is_empty());
    }

    #[test]
    fn test_resolve_unknown_request_type() {
        let registry = registry();

        struct Unknown;
        let result = DispatchPlan::resolve(
            &registry,
            TypeDescriptor::of::<Unknown>(),
            TypeDescriptor::of::<String>(),
            DispatchShape::Sync,
        );

        assert!(matches!(
            result,
            Err(DispatchError::HandlerNotFound { .. })
        ));
    }

    #[test]
    fn test_resolve_shape_mismatch() {
        let registry = registry();

        // Sleep is registered async; a sync dispatch must not resolve it.
        let result = DispatchPlan::resolve(
            &registry,
            TypeDescriptor::of::<Sleep>(),
            TypeDescriptor::of::<u64>(),
            DispatchShape::Sync,
        );

        assert!(matches!(
            result,
            Err(DispatchError::HandlerShapeMismatch {
                expected: DispatchShape::Sync,
                found: DispatchShape::Async,
                ..
            })
        ));
    }

    #[test]
    fn test_resolve_response_type_mismatch() {
        let registry = registry();

        let result = DispatchPlan::resolve(
            &registry,
            TypeDescriptor::of::<Ping>(),
            TypeDescriptor::of::<u64>(),
            DispatchShape::Sync,
        );

        assert!(matches!(
            result,
            Err(DispatchError::ResponseTypeMismatch { .. })
        ));
    }
}
