//! # Handler Capabilities
//!
//! The four shapes application code can register with the mediator:
//! sync/async single-result request handlers and sync/async notification
//! handlers. The shapes form a closed set selected at registration time.
//!
//! Handlers borrow the message: request and notification values are
//! caller-owned and read-only to the mediator. Failures use `anyhow::Error`;
//! the mediator captures them into the response envelope, so a handler fault
//! never crosses the mediator's public boundary.
//!
//! Internally each typed handler is wrapped into a type-erased form so the
//! registry can store heterogeneous handlers behind one entry type. The
//! wrappers downcast the erased message back to its concrete type before
//! delegating.

use std::any::Any;
use std::marker::PhantomData;

use anyhow::anyhow;
use async_trait::async_trait;

use switchboard_types::{Notification, Request};

/// A type-erased message value as passed through the dispatch pipeline.
pub type AnyMessage = dyn Any + Send + Sync;

/// A type-erased handler return value.
pub(crate) type AnyResponse = Box<dyn Any + Send + Sync>;

/// Synchronous single-result handler: `handle(request) -> result`.
pub trait RequestHandler<R: Request>: Send + Sync {
    /// Services the request, producing its typed result.
    fn handle(&self, request: &R) -> anyhow::Result<R::Response>;
}

/// Asynchronous single-result handler: `handle(request) -> deferred result`.
#[async_trait]
pub trait AsyncRequestHandler<R: Request>: Send + Sync {
    /// Services the request, suspending cooperatively as needed.
    async fn handle(&self, request: &R) -> anyhow::Result<R::Response>;
}

/// Synchronous notification handler: `handle(notification) -> ()`.
pub trait NotificationHandler<N: Notification>: Send + Sync {
    /// Reacts to the notification.
    fn handle(&self, notification: &N) -> anyhow::Result<()>;
}

/// Asynchronous notification handler: `handle(notification) -> deferred ()`.
#[async_trait]
pub trait AsyncNotificationHandler<N: Notification>: Send + Sync {
    /// Reacts to the notification, suspending cooperatively as needed.
    async fn handle(&self, notification: &N) -> anyhow::Result<()>;
}

// =============================================================================
// TYPE-ERASED FORMS (registry storage)
// =============================================================================

pub(crate) trait ErasedRequestHandler: Send + Sync {
    fn handle(&self, request: &AnyMessage) -> anyhow::Result<AnyResponse>;
}

#[async_trait]
pub(crate) trait ErasedAsyncRequestHandler: Send + Sync {
    async fn handle(&self, request: &AnyMessage) -> anyhow::Result<AnyResponse>;
}

pub(crate) trait ErasedNotificationHandler: Send + Sync {
    fn handle(&self, notification: &AnyMessage) -> anyhow::Result<()>;
}

#[async_trait]
pub(crate) trait ErasedAsyncNotificationHandler: Send + Sync {
    async fn handle(&self, notification: &AnyMessage) -> anyhow::Result<()>;
}

fn downcast<T: Any>(message: &AnyMessage) -> anyhow::Result<&T> {
    message
        .downcast_ref::<T>()
        .ok_or_else(|| anyhow!("message value is not a {}", std::any::type_name::<T>()))
}

/// Wraps a typed sync request handler into its erased form.
pub(crate) struct TypedRequestHandler<R, H> {
    inner: H,
    _marker: PhantomData<fn(R)>,
}

impl<R, H> TypedRequestHandler<R, H>
where
    R: Request,
    H: RequestHandler<R>,
{
    pub(crate) fn new(inner: H) -> Self {
        Self {
            inner,
            _marker: PhantomData,
        }
    }
}

impl<R, H> ErasedRequestHandler for TypedRequestHandler<R, H>
where
    R: Request,
    H: RequestHandler<R> + 'static,
{
    fn handle(&self, request: &AnyMessage) -> anyhow::Result<AnyResponse> {
        let request = downcast::<R>(request)?;
        let response = self.inner.handle(request)?;
        Ok(Box::new(response))
    }
}

/// Wraps a typed async request handler into its erased form.
pub(crate) struct TypedAsyncRequestHandler<R, H> {
    inner: H,
    _marker: PhantomData<fn(R)>,
}

impl<R, H> TypedAsyncRequestHandler<R, H>
where
    R: Request,
    H: AsyncRequestHandler<R>,
{
    pub(crate) fn new(inner: H) -> Self {
        Self {
            inner,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<R, H> ErasedAsyncRequestHandler for TypedAsyncRequestHandler<R, H>
where
    R: Request,
    H: AsyncRequestHandler<R> + 'static,
{
    async fn handle(&self, request: &AnyMessage) -> anyhow::Result<AnyResponse> {
        let request = downcast::<R>(request)?;
        let response = self.inner.handle(request).await?;
        Ok(Box::new(response))
    }
}

/// Wraps a typed sync notification handler into its erased form.
pub(crate) struct TypedNotificationHandler<N, H> {
    inner: H,
    _marker: PhantomData<fn(N)>,
}

impl<N, H> TypedNotificationHandler<N, H>
where
    N: Notification,
    H: NotificationHandler<N>,
{
    pub(crate) fn new(inner: H) -> Self {
        Self {
            inner,
            _marker: PhantomData,
        }
    }
}

impl<N, H> ErasedNotificationHandler for TypedNotificationHandler<N, H>
where
    N: Notification,
    H: NotificationHandler<N> + 'static,
{
    fn handle(&self, notification: &AnyMessage) -> anyhow::Result<()> {
        let notification = downcast::<N>(notification)?;
        self.inner.handle(notification)
    }
}

/// Wraps a typed async notification handler into its erased form.
pub(crate) struct TypedAsyncNotificationHandler<N, H> {
    inner: H,
    _marker: PhantomData<fn(N)>,
}

impl<N, H> TypedAsyncNotificationHandler<N, H>
where
    N: Notification,
    H: AsyncNotificationHandler<N>,
{
    pub(crate) fn new(inner: H) -> Self {
        Self {
            inner,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<N, H> ErasedAsyncNotificationHandler for TypedAsyncNotificationHandler<N, H>
where
    N: Notification,
    H: AsyncNotificationHandler<N> + 'static,
{
    async fn handle(&self, notification: &AnyMessage) -> anyhow::Result<()> {
        let notification = downcast::<N>(notification)?;
        self.inner.handle(notification).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    struct Counted;

    impl Notification for Counted {}

    struct CountedHandler;

    impl NotificationHandler<Counted> for CountedHandler {
        fn handle(&self, _notification: &Counted) -> anyhow::Result<()> {
            Ok(())
        }
    }

    struct EchoAsync;

    #[async_trait]
    impl AsyncRequestHandler<Ping> for EchoAsync {
        async fn handle(&self, _request: &Ping) -> anyhow::Result<String> {
            Ok("pong".to_string())
        }
    }

    #[test]
    fn test_erased_request_round_trip() {
        let erased = TypedRequestHandler::new(PingHandler);

        let request = Ping;
        let response = erased.handle(&request as &AnyMessage).unwrap();
        let response = response.downcast::<String>().unwrap();

        assert_eq!(*response, "pong");
    }

    #[test]
    fn test_erased_request_rejects_wrong_type() {
        let erased = TypedRequestHandler::new(PingHandler);

        let not_a_ping = Counted;
        let result = erased.handle(&not_a_ping as &AnyMessage);

        assert!(result.is_err());
    }

    #[test]
    fn test_erased_notification_round_trip() {
        let erased = TypedNotificationHandler::new(CountedHandler);

        let notification = Counted;
        assert!(erased.handle(&notification as &AnyMessage).is_ok());
    }

    #[tokio::test]
    async fn test_erased_async_request_round_trip() {
        let erased = TypedAsyncRequestHandler::new(EchoAsync);

        let request = Ping;
        let response = erased.handle(&request as &AnyMessage).await.unwrap();

        assert_eq!(*response.downcast::<String>().unwrap(), "pong");
    }
}
