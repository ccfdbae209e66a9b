//! # Mediator Facade
//!
//! The single entry point through which callers issue typed requests and
//! notifications without holding a reference to the component that handles
//! them.
//!
//! ```text
//! caller ──▶ Mediator ──▶ DispatchPlan ──▶ [before hooks] ──▶ handler
//!                                                                │
//! caller ◀── ResponseEnvelope ◀──────────── [after hooks] ◀──────┘
//! ```
//!
//! Every failure raised anywhere in a dispatch (resolution, hook, handler)
//! is caught here and becomes the envelope's failure; the four public
//! operations never raise past their own boundary and always return an
//! envelope.
//!
//! Request dispatch is fail-fast: the first failing stage aborts the rest.
//! Notification fan-out is the opposite: every handler runs regardless of
//! sibling failures, and the failures are aggregated afterwards.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future;
use tracing::{debug, warn};
use uuid::Uuid;

use switchboard_types::{
    AggregateFailure, DispatchError, DispatchShape, MethodDescriptor, Notification, Request,
    ResponseEnvelope, TypeDescriptor,
};

use crate::handler::{AnyMessage, AnyResponse, ErasedAsyncNotificationHandler};
use crate::interceptor::InterceptorChain;
use crate::plan::DispatchPlan;
use crate::registry::{NotificationHandlerSlot, RequestHandlerSlot};
use crate::resolver::Resolver;

/// The mediator facade.
///
/// Holds only the resolver and a dispatch counter. No state is carried
/// across calls, and no lock is held across a dispatch.
pub struct Mediator {
    resolver: Arc<dyn Resolver>,

    /// Total dispatches attempted (requests and notifications).
    dispatches: AtomicU64,
}

impl Mediator {
    /// Creates a mediator over the given resolver.
    #[must_use]
    pub fn new(resolver: Arc<dyn Resolver>) -> Self {
        Self {
            resolver,
            dispatches: AtomicU64::new(0),
        }
    }

    /// Total number of dispatches attempted.
    #[must_use]
    pub fn dispatch_count(&self) -> u64 {
        self.dispatches.load(Ordering::Relaxed)
    }

    /// Dispatches a request to its single synchronous handler, running the
    /// interceptor chain around the invocation.
    ///
    /// Runs entirely on the caller's thread with no suspension points.
    pub fn request<R: Request>(&self, request: R) -> ResponseEnvelope<R::Response> {
        let correlation_id = Uuid::new_v4();
        self.dispatches.fetch_add(1, Ordering::Relaxed);
        let request_type = TypeDescriptor::of::<R>();

        match self.dispatch_request(&request, request_type) {
            Ok(data) => {
                debug!(
                    correlation_id = %correlation_id,
                    request_type = %request_type,
                    "Request dispatched"
                );
                ResponseEnvelope::ok(correlation_id, data)
            }
            Err(failure) => {
                warn!(
                    correlation_id = %correlation_id,
                    request_type = %request_type,
                    failure = %failure,
                    "Request dispatch failed"
                );
                ResponseEnvelope::failed(correlation_id, failure)
            }
        }
    }

    /// Dispatches a request to its single asynchronous handler.
    ///
    /// Ordering is strict: every before-hook completes, in order, before the
    /// handler starts; the handler completes before any after-hook starts.
    /// The returned envelope resolves exactly once.
    pub async fn request_async<R: Request>(&self, request: R) -> ResponseEnvelope<R::Response> {
        let correlation_id = Uuid::new_v4();
        self.dispatches.fetch_add(1, Ordering::Relaxed);
        let request_type = TypeDescriptor::of::<R>();

        match self.dispatch_request_async(&request, request_type).await {
            Ok(data) => {
                debug!(
                    correlation_id = %correlation_id,
                    request_type = %request_type,
                    "Request dispatched"
                );
                ResponseEnvelope::ok(correlation_id, data)
            }
            Err(failure) => {
                warn!(
                    correlation_id = %correlation_id,
                    request_type = %request_type,
                    failure = %failure,
                    "Request dispatch failed"
                );
                ResponseEnvelope::failed(correlation_id, failure)
            }
        }
    }

    /// Broadcasts a notification to all of its synchronous handlers, in
    /// registration order.
    ///
    /// Each handler's failure is captured independently; one failure never
    /// prevents subsequent handlers from running. When any failed, the
    /// envelope carries an [`AggregateFailure`] with every captured failure
    /// in invocation order.
    pub fn notify<N: Notification>(&self, notification: N) -> ResponseEnvelope<()> {
        let correlation_id = Uuid::new_v4();
        self.dispatches.fetch_add(1, Ordering::Relaxed);
        let notification_type = TypeDescriptor::of::<N>();
        let message: &AnyMessage = &notification;

        let entries = self
            .resolver
            .resolve_notification_handlers(notification_type.id());

        let mut attempted = 0usize;
        let mut failures = Vec::new();
        for entry in &entries {
            let NotificationHandlerSlot::Sync(handler) = &entry.handler else {
                continue;
            };
            attempted += 1;
            if let Err(source) = handler.handle(message) {
                failures.push(DispatchError::HandlerFailed {
                    handler: entry.method().handler(),
                    message_type: notification_type.name(),
                    source,
                });
            }
        }

        self.finish_fanout(correlation_id, notification_type, attempted, failures)
    }

    /// Broadcasts a notification to all of its asynchronous handlers,
    /// invoked concurrently.
    ///
    /// All invocations are launched before suspending; the call completes
    /// only once every handler has completed or failed. The aggregate's
    /// content follows registration order, independent of completion order.
    pub async fn notify_async<N: Notification>(&self, notification: N) -> ResponseEnvelope<()> {
        let correlation_id = Uuid::new_v4();
        self.dispatches.fetch_add(1, Ordering::Relaxed);
        let notification_type = TypeDescriptor::of::<N>();
        let message: &AnyMessage = &notification;

        let entries = self
            .resolver
            .resolve_notification_handlers(notification_type.id());

        let targets: Vec<(&'static str, Arc<dyn ErasedAsyncNotificationHandler>)> = entries
            .iter()
            .filter_map(|entry| match &entry.handler {
                NotificationHandlerSlot::Async(handler) => {
                    Some((entry.method().handler(), Arc::clone(handler)))
                }
                NotificationHandlerSlot::Sync(_) => None,
            })
            .collect();

        let attempted = targets.len();
        let invocations = targets.into_iter().map(|(handler_name, handler)| async move {
            handler
                .handle(message)
                .await
                .map_err(|source| DispatchError::HandlerFailed {
                    handler: handler_name,
                    message_type: notification_type.name(),
                    source,
                })
        });

        // Scatter then barrier: one handler's failure never cancels its
        // siblings.
        let results = future::join_all(invocations).await;
        let failures: Vec<DispatchError> =
            results.into_iter().filter_map(Result::err).collect();

        self.finish_fanout(correlation_id, notification_type, attempted, failures)
    }

    fn dispatch_request<R: Request>(
        &self,
        request: &R,
        request_type: TypeDescriptor,
    ) -> Result<R::Response, DispatchError> {
        let response_type = TypeDescriptor::of::<R::Response>();
        let plan = DispatchPlan::resolve(
            self.resolver.as_ref(),
            request_type,
            response_type,
            DispatchShape::Sync,
        )?;
        let chain = InterceptorChain::resolve(plan.interceptor_bindings());
        let message: &AnyMessage = request;

        chain.run_before(plan.method(), message, request_type)?;

        let RequestHandlerSlot::Sync(handler) = plan.handler() else {
            return Err(DispatchError::HandlerShapeMismatch {
                request_type: request_type.name(),
                expected: DispatchShape::Sync,
                found: DispatchShape::Async,
            });
        };
        let response =
            handler
                .handle(message)
                .map_err(|source| DispatchError::HandlerFailed {
                    handler: plan.method().handler(),
                    message_type: request_type.name(),
                    source,
                })?;

        chain.run_after(plan.method(), message, request_type, response.as_ref())?;

        downcast_response::<R>(response, plan.method(), request_type)
    }

    async fn dispatch_request_async<R: Request>(
        &self,
        request: &R,
        request_type: TypeDescriptor,
    ) -> Result<R::Response, DispatchError> {
        let response_type = TypeDescriptor::of::<R::Response>();
        let plan = DispatchPlan::resolve(
            self.resolver.as_ref(),
            request_type,
            response_type,
            DispatchShape::Async,
        )?;
        let chain = InterceptorChain::resolve(plan.interceptor_bindings());
        let message: &AnyMessage = request;

        chain
            .run_before_async(plan.method(), message, request_type)
            .await?;

        let RequestHandlerSlot::Async(handler) = plan.handler() else {
            return Err(DispatchError::HandlerShapeMismatch {
                request_type: request_type.name(),
                expected: DispatchShape::Async,
                found: DispatchShape::Sync,
            });
        };
        let response = handler.handle(message).await.map_err(|source| {
            DispatchError::HandlerFailed {
                handler: plan.method().handler(),
                message_type: request_type.name(),
                source,
            }
        })?;

        chain
            .run_after_async(plan.method(), message, request_type, response.as_ref())
            .await?;

        downcast_response::<R>(response, plan.method(), request_type)
    }

    fn finish_fanout(
        &self,
        correlation_id: Uuid,
        notification_type: TypeDescriptor,
        attempted: usize,
        failures: Vec<DispatchError>,
    ) -> ResponseEnvelope<()> {
        if attempted == 0 {
            warn!(
                notification_type = %notification_type,
                "Notification dropped (no handlers)"
            );
            return ResponseEnvelope::empty(correlation_id);
        }

        if failures.is_empty() {
            debug!(
                correlation_id = %correlation_id,
                notification_type = %notification_type,
                handlers = attempted,
                "Notification dispatched"
            );
            ResponseEnvelope::empty(correlation_id)
        } else {
            let aggregate = AggregateFailure::new(attempted, failures);
            warn!(
                correlation_id = %correlation_id,
                notification_type = %notification_type,
                handlers = attempted,
                failed = aggregate.len(),
                "Notification dispatch failed"
            );
            ResponseEnvelope::failed(correlation_id, DispatchError::Aggregate(aggregate))
        }
    }
}

fn downcast_response<R: Request>(
    response: AnyResponse,
    method: &MethodDescriptor,
    request_type: TypeDescriptor,
) -> Result<R::Response, DispatchError> {
    response
        .downcast::<R::Response>()
        .map(|boxed| *boxed)
        .map_err(|_| DispatchError::HandlerFailed {
            handler: method.handler(),
            message_type: request_type.name(),
            source: anyhow::anyhow!(
                "handler returned a response that is not a {}",
                std::any::type_name::<R::Response>()
            ),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{
        AsyncNotificationHandler, AsyncRequestHandler, NotificationHandler, RequestHandler,
    };
    use crate::registry::RegistryBuilder;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use switchboard_types::FailureKind;

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

    struct FailingHandler;

    impl RequestHandler<Ping> for FailingHandler {
        fn handle(&self, _request: &Ping) -> anyhow::Result<String> {
            Err(anyhow!("boom"))
        }
    }

    struct PingAsyncHandler;

    #[async_trait]
    impl AsyncRequestHandler<Ping> for PingAsyncHandler {
        async fn handle(&self, _request: &Ping) -> anyhow::Result<String> {
            tokio::task::yield_now().await;
            Ok("pong".to_string())
        }
    }

    struct Counted;

    impl Notification for Counted {}

    struct CountingHandler {
        counter: Arc<AtomicUsize>,
    }

    impl NotificationHandler<Counted> for CountingHandler {
        fn handle(&self, _notification: &Counted) -> anyhow::Result<()> {
            self.counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct AlwaysFails;

    impl NotificationHandler<Counted> for AlwaysFails {
        fn handle(&self, _notification: &Counted) -> anyhow::Result<()> {
            Err(anyhow!("boom"))
        }
    }

    struct AsyncCounting {
        counter: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl AsyncNotificationHandler<Counted> for AsyncCounting {
        async fn handle(&self, _notification: &Counted) -> anyhow::Result<()> {
            tokio::task::yield_now().await;
            self.counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct AsyncAlwaysFails;

    #[async_trait]
    impl AsyncNotificationHandler<Counted> for AsyncAlwaysFails {
        async fn handle(&self, _notification: &Counted) -> anyhow::Result<()> {
            Err(anyhow!("boom"))
        }
    }

    fn mediator_with(builder: RegistryBuilder) -> Mediator {
        Mediator::new(Arc::new(builder.build()))
    }

    #[test]
    fn test_request_returns_handler_data() {
        let mut builder = RegistryBuilder::new();
        builder.register_request_handler::<Ping, _>(PingHandler).unwrap();
        let mediator = mediator_with(builder);

        let envelope = mediator.request(Ping);

        assert!(envelope.is_success());
        assert_eq!(envelope.data().map(String::as_str), Some("pong"));
    }

    #[test]
    fn test_request_without_handler_is_resolution_failure() {
        let mediator = mediator_with(RegistryBuilder::new());

        let envelope = mediator.request(Ping);

        assert!(envelope.data().is_none());
        let failure = envelope.failure().unwrap();
        assert_eq!(failure.kind(), FailureKind::Resolution);
    }

    #[test]
    fn test_handler_failure_is_captured() {
        let mut builder = RegistryBuilder::new();
        builder
            .register_request_handler::<Ping, _>(FailingHandler)
            .unwrap();
        let mediator = mediator_with(builder);

        let envelope = mediator.request(Ping);

        let failure = envelope.failure().unwrap();
        assert_eq!(failure.kind(), FailureKind::Execution);
        assert!(failure.to_string().contains("boom"));
    }

    #[tokio::test]
    async fn test_request_async_round_trip() {
        let mut builder = RegistryBuilder::new();
        builder
            .register_async_request_handler::<Ping, _>(PingAsyncHandler)
            .unwrap();
        let mediator = mediator_with(builder);

        let envelope = mediator.request_async(Ping).await;

        assert_eq!(envelope.data().map(String::as_str), Some("pong"));
    }

    #[tokio::test]
    async fn test_sync_request_does_not_resolve_async_handler() {
        let mut builder = RegistryBuilder::new();
        builder
            .register_async_request_handler::<Ping, _>(PingAsyncHandler)
            .unwrap();
        let mediator = mediator_with(builder);

        let envelope = mediator.request(Ping);

        assert!(matches!(
            envelope.failure(),
            Some(DispatchError::HandlerShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_notify_isolates_failures() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut builder = RegistryBuilder::new();
        builder.register_notification_handler::<Counted, _>(AlwaysFails);
        builder.register_notification_handler::<Counted, _>(CountingHandler {
            counter: Arc::clone(&counter),
        });
        let mediator = mediator_with(builder);

        let envelope = mediator.notify(Counted);

        // The failing handler did not stop the counting one.
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        let Some(DispatchError::Aggregate(aggregate)) = envelope.failure() else {
            panic!("expected aggregate failure");
        };
        assert_eq!(aggregate.len(), 1);
        assert_eq!(aggregate.attempted(), 2);
    }

    #[test]
    fn test_notify_without_handlers_succeeds_empty() {
        let mediator = mediator_with(RegistryBuilder::new());

        let envelope = mediator.notify(Counted);

        assert!(envelope.is_success());
        assert!(envelope.data().is_none());
    }

    #[tokio::test]
    async fn test_notify_async_joins_all_handlers() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut builder = RegistryBuilder::new();
        builder.register_async_notification_handler::<Counted, _>(AsyncAlwaysFails);
        builder.register_async_notification_handler::<Counted, _>(AsyncCounting {
            counter: Arc::clone(&counter),
        });
        builder.register_async_notification_handler::<Counted, _>(AsyncCounting {
            counter: Arc::clone(&counter),
        });
        let mediator = mediator_with(builder);

        let envelope = mediator.notify_async(Counted).await;

        assert_eq!(counter.load(Ordering::SeqCst), 2);
        let Some(DispatchError::Aggregate(aggregate)) = envelope.failure() else {
            panic!("expected aggregate failure");
        };
        assert_eq!(aggregate.len(), 1);
        assert_eq!(aggregate.attempted(), 3);
    }

    #[test]
    fn test_mediator_keeps_no_state_across_calls() {
        let mut builder = RegistryBuilder::new();
        builder.register_request_handler::<Ping, _>(PingHandler).unwrap();
        let mediator = mediator_with(builder);

        let first = mediator.request(Ping);
        let second = mediator.request(Ping);

        assert_eq!(first.data(), second.data());
        assert_ne!(first.correlation_id(), second.correlation_id());
        assert_eq!(mediator.dispatch_count(), 2);
    }
}
