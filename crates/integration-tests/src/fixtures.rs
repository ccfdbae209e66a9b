//! Shared messages, handlers, and interceptors for the scenario tests.
//!
//! Handlers record their side effects through `Arc`'d counters and logs so
//! tests can assert which handlers ran and in what order.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;

use switchboard_core::handler::AnyMessage;
use switchboard_core::{
    AsyncNotificationHandler, AsyncRequestHandler, Interceptor, NotificationHandler,
    RequestHandler,
};
use switchboard_types::{MethodDescriptor, Notification, Request, TypeDescriptor};

/// An append-only event log shared between handlers, interceptors, and the
/// test body.
pub type EventLog = Arc<Mutex<Vec<String>>>;

/// Creates an empty event log.
#[must_use]
pub fn event_log() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// Drains the log into a plain vector.
#[must_use]
pub fn drain(log: &EventLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

fn record(log: &EventLog, entry: impl Into<String>) {
    log.lock().unwrap().push(entry.into());
}

// =============================================================================
// MESSAGES
// =============================================================================

/// Request expecting a `String` result.
pub struct Ping;

impl Request for Ping {
    type Response = String;
}

/// Request expecting a numeric result.
pub struct Add {
    pub lhs: u64,
    pub rhs: u64,
}

impl Request for Add {
    type Response = u64;
}

/// Notification with no result.
pub struct Counted;

impl Notification for Counted {}

// =============================================================================
// REQUEST HANDLERS
// =============================================================================

/// Sync handler returning `"pong"`, optionally recording the invocation.
pub struct PingHandler {
    pub log: Option<EventLog>,
}

impl PingHandler {
    #[must_use]
    pub fn new() -> Self {
        Self { log: None }
    }

    #[must_use]
    pub fn recording(log: &EventLog) -> Self {
        Self {
            log: Some(Arc::clone(log)),
        }
    }
}

impl Default for PingHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestHandler<Ping> for PingHandler {
    fn handle(&self, _request: &Ping) -> anyhow::Result<String> {
        if let Some(log) = &self.log {
            record(log, "handle");
        }
        Ok("pong".to_string())
    }
}

/// Sync handler that always fails.
pub struct FailingPingHandler {
    pub log: EventLog,
}

impl RequestHandler<Ping> for FailingPingHandler {
    fn handle(&self, _request: &Ping) -> anyhow::Result<String> {
        record(&self.log, "handle");
        Err(anyhow!("boom"))
    }
}

/// Async handler computing `lhs + rhs` after yielding once.
pub struct AddAsyncHandler;

#[async_trait]
impl AsyncRequestHandler<Add> for AddAsyncHandler {
    async fn handle(&self, request: &Add) -> anyhow::Result<u64> {
        tokio::task::yield_now().await;
        Ok(request.lhs + request.rhs)
    }
}

/// Async handler returning `"pong"`, recording the invocation.
pub struct PingAsyncHandler {
    pub log: EventLog,
}

#[async_trait]
impl AsyncRequestHandler<Ping> for PingAsyncHandler {
    async fn handle(&self, _request: &Ping) -> anyhow::Result<String> {
        tokio::task::yield_now().await;
        record(&self.log, "handle");
        Ok("pong".to_string())
    }
}

// =============================================================================
// NOTIFICATION HANDLERS
// =============================================================================

/// Sync notification handler incrementing a shared counter.
pub struct CountingHandler {
    pub counter: Arc<AtomicUsize>,
}

impl NotificationHandler<Counted> for CountingHandler {
    fn handle(&self, _notification: &Counted) -> anyhow::Result<()> {
        self.counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Sync notification handler that always fails with `"boom"`.
pub struct BoomHandler;

impl NotificationHandler<Counted> for BoomHandler {
    fn handle(&self, _notification: &Counted) -> anyhow::Result<()> {
        Err(anyhow!("boom"))
    }
}

/// Async notification handler that sleeps, then records its label.
pub struct DelayedHandler {
    pub label: &'static str,
    pub delay: Duration,
    pub log: EventLog,
}

#[async_trait]
impl AsyncNotificationHandler<Counted> for DelayedHandler {
    async fn handle(&self, _notification: &Counted) -> anyhow::Result<()> {
        tokio::time::sleep(self.delay).await;
        record(&self.log, self.label);
        Ok(())
    }
}

/// Async notification handler incrementing a shared counter.
pub struct AsyncCountingHandler {
    pub counter: Arc<AtomicUsize>,
}

#[async_trait]
impl AsyncNotificationHandler<Counted> for AsyncCountingHandler {
    async fn handle(&self, _notification: &Counted) -> anyhow::Result<()> {
        tokio::task::yield_now().await;
        self.counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Async notification handler that sleeps, then fails with `"boom"`.
pub struct AsyncBoomHandler {
    pub delay: Duration,
}

#[async_trait]
impl AsyncNotificationHandler<Counted> for AsyncBoomHandler {
    async fn handle(&self, _notification: &Counted) -> anyhow::Result<()> {
        tokio::time::sleep(self.delay).await;
        Err(anyhow!("boom"))
    }
}

// =============================================================================
// INTERCEPTORS
// =============================================================================

/// Records `before:<label>` / `after:<label>` into the shared log.
pub struct RecordingInterceptor {
    pub label: String,
    pub log: EventLog,
}

impl Interceptor for RecordingInterceptor {
    fn before_invoke(
        &self,
        _method: &MethodDescriptor,
        _request: &AnyMessage,
        _request_type: TypeDescriptor,
    ) -> anyhow::Result<()> {
        record(&self.log, format!("before:{}", self.label));
        Ok(())
    }

    fn after_invoke(
        &self,
        _method: &MethodDescriptor,
        _request: &AnyMessage,
        _request_type: TypeDescriptor,
        _response: &AnyMessage,
    ) -> anyhow::Result<()> {
        record(&self.log, format!("after:{}", self.label));
        Ok(())
    }
}

/// Fails in its `before` hook.
pub struct RejectingInterceptor;

impl Interceptor for RejectingInterceptor {
    fn before_invoke(
        &self,
        _method: &MethodDescriptor,
        _request: &AnyMessage,
        _request_type: TypeDescriptor,
    ) -> anyhow::Result<()> {
        Err(anyhow!("rejected"))
    }

    fn after_invoke(
        &self,
        _method: &MethodDescriptor,
        _request: &AnyMessage,
        _request_type: TypeDescriptor,
        _response: &AnyMessage,
    ) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Fails in its `after` hook.
pub struct SpoilingInterceptor;

impl Interceptor for SpoilingInterceptor {
    fn before_invoke(
        &self,
        _method: &MethodDescriptor,
        _request: &AnyMessage,
        _request_type: TypeDescriptor,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    fn after_invoke(
        &self,
        _method: &MethodDescriptor,
        _request: &AnyMessage,
        _request_type: TypeDescriptor,
        _response: &AnyMessage,
    ) -> anyhow::Result<()> {
        Err(anyhow!("spoiled"))
    }
}

/// Yields at every hook before delegating, to exercise the async chain.
pub struct YieldingInterceptor {
    pub label: String,
    pub log: EventLog,
}

#[async_trait]
impl Interceptor for YieldingInterceptor {
    fn before_invoke(
        &self,
        _method: &MethodDescriptor,
        _request: &AnyMessage,
        _request_type: TypeDescriptor,
    ) -> anyhow::Result<()> {
        record(&self.log, format!("before:{}", self.label));
        Ok(())
    }

    fn after_invoke(
        &self,
        _method: &MethodDescriptor,
        _request: &AnyMessage,
        _request_type: TypeDescriptor,
        _response: &AnyMessage,
    ) -> anyhow::Result<()> {
        record(&self.log, format!("after:{}", self.label));
        Ok(())
    }

    async fn before_invoke_async(
        &self,
        method: &MethodDescriptor,
        request: &AnyMessage,
        request_type: TypeDescriptor,
    ) -> anyhow::Result<()> {
        tokio::task::yield_now().await;
        self.before_invoke(method, request, request_type)
    }

    async fn after_invoke_async(
        &self,
        method: &MethodDescriptor,
        request: &AnyMessage,
        request_type: TypeDescriptor,
        response: &AnyMessage,
    ) -> anyhow::Result<()> {
        tokio::task::yield_now().await;
        self.after_invoke(method, request, request_type, response)
    }
}
