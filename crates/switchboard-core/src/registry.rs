//! # Handler Registry
//!
//! Explicit type-indexed registry mapping each request type to the single
//! handler registered for it, and each notification type to all of its
//! handlers. Populated at startup by application wiring through
//! [`RegistryBuilder`]; immutable afterwards, so concurrent lookups need no
//! locking.
//!
//! Interceptor bindings are stored alongside the handler entry they belong
//! to, in declaration order: the registration-time equivalent of metadata
//! attached to the concrete handler method.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use switchboard_types::{
    DispatchShape, MethodDescriptor, Notification, Request, TypeDescriptor,
};

use crate::handler::{
    AsyncNotificationHandler, AsyncRequestHandler, ErasedAsyncNotificationHandler,
    ErasedAsyncRequestHandler, ErasedNotificationHandler, ErasedRequestHandler,
    NotificationHandler, RequestHandler, TypedAsyncNotificationHandler,
    TypedAsyncRequestHandler, TypedNotificationHandler, TypedRequestHandler,
};
use crate::interceptor::InterceptorBinding;

/// Errors from registry wiring.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A single-result request type may have exactly one handler.
    #[error("A handler is already registered for request type '{request_type}'")]
    AlreadyRegistered {
        /// The request type registered twice.
        request_type: &'static str,
    },
}

pub(crate) enum RequestHandlerSlot {
    Sync(Arc<dyn ErasedRequestHandler>),
    Async(Arc<dyn ErasedAsyncRequestHandler>),
}

pub(crate) enum NotificationHandlerSlot {
    Sync(Arc<dyn ErasedNotificationHandler>),
    Async(Arc<dyn ErasedAsyncNotificationHandler>),
}

/// The registry's record for one request type: the single handler, its
/// concrete method identity, and the interceptor bindings declared on it.
pub struct RequestEntry {
    pub(crate) method: MethodDescriptor,
    pub(crate) response_type: TypeDescriptor,
    pub(crate) handler: RequestHandlerSlot,
    pub(crate) interceptors: Vec<InterceptorBinding>,
}

impl RequestEntry {
    /// The concrete method this entry dispatches to.
    #[must_use]
    pub fn method(&self) -> &MethodDescriptor {
        &self.method
    }

    /// The result type the registered handler produces.
    #[must_use]
    pub fn response_type(&self) -> TypeDescriptor {
        self.response_type
    }

    /// Whether the handler was registered for sync or async dispatch.
    #[must_use]
    pub fn shape(&self) -> DispatchShape {
        match self.handler {
            RequestHandlerSlot::Sync(_) => DispatchShape::Sync,
            RequestHandlerSlot::Async(_) => DispatchShape::Async,
        }
    }

    /// The interceptor bindings declared on the handler, in order.
    #[must_use]
    pub fn interceptors(&self) -> &[InterceptorBinding] {
        &self.interceptors
    }
}

/// The registry's record for one notification handler.
pub struct NotificationEntry {
    pub(crate) method: MethodDescriptor,
    pub(crate) handler: NotificationHandlerSlot,
}

impl NotificationEntry {
    /// The concrete method this entry dispatches to.
    #[must_use]
    pub fn method(&self) -> &MethodDescriptor {
        &self.method
    }

    /// Whether the handler was registered for sync or async dispatch.
    #[must_use]
    pub fn shape(&self) -> DispatchShape {
        match self.handler {
            NotificationHandlerSlot::Sync(_) => DispatchShape::Sync,
            NotificationHandlerSlot::Async(_) => DispatchShape::Async,
        }
    }
}

/// Immutable type-indexed handler registry.
///
/// Built once by [`RegistryBuilder`] and shared behind `Arc`; lookups are
/// lock-free, which keeps concurrent resolution safe during fan-out.
pub struct HandlerRegistry {
    requests: HashMap<TypeId, Arc<RequestEntry>>,
    notifications: HashMap<TypeId, Vec<Arc<NotificationEntry>>>,
}

impl HandlerRegistry {
    /// Number of registered request handlers.
    #[must_use]
    pub fn request_handler_count(&self) -> usize {
        self.requests.len()
    }

    /// Number of handlers registered for a notification type.
    #[must_use]
    pub fn notification_handler_count(&self, notification: TypeDescriptor) -> usize {
        self.notifications
            .get(&notification.id())
            .map_or(0, Vec::len)
    }

    /// Names of all registered request types.
    #[must_use]
    pub fn request_types(&self) -> Vec<&'static str> {
        self.requests
            .values()
            .map(|entry| entry.method.request().name())
            .collect()
    }

    pub(crate) fn request_entry(&self, request: TypeId) -> Option<Arc<RequestEntry>> {
        self.requests.get(&request).cloned()
    }

    pub(crate) fn notification_entries(&self, notification: TypeId) -> Vec<Arc<NotificationEntry>> {
        self.notifications
            .get(&notification)
            .cloned()
            .unwrap_or_default()
    }
}

/// Application wiring surface: registers handlers, then builds the immutable
/// [`HandlerRegistry`].
pub struct RegistryBuilder {
    requests: HashMap<TypeId, Arc<RequestEntry>>,
    notifications: HashMap<TypeId, Vec<Arc<NotificationEntry>>>,
}

impl RegistryBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            requests: HashMap::new(),
            notifications: HashMap::new(),
        }
    }

    /// Registers a synchronous request handler.
    pub fn register_request_handler<R, H>(&mut self, handler: H) -> Result<(), RegistryError>
    where
        R: Request,
        H: RequestHandler<R> + 'static,
    {
        self.register_request_handler_with(handler, Vec::new())
    }

    /// Registers a synchronous request handler with interceptor bindings,
    /// in declaration order.
    pub fn register_request_handler_with<R, H>(
        &mut self,
        handler: H,
        interceptors: Vec<InterceptorBinding>,
    ) -> Result<(), RegistryError>
    where
        R: Request,
        H: RequestHandler<R> + 'static,
    {
        let slot = RequestHandlerSlot::Sync(Arc::new(TypedRequestHandler::new(handler)));
        self.insert_request::<R, H>(DispatchShape::Sync, slot, interceptors)
    }

    /// Registers an asynchronous request handler.
    pub fn register_async_request_handler<R, H>(&mut self, handler: H) -> Result<(), RegistryError>
    where
        R: Request,
        H: AsyncRequestHandler<R> + 'static,
    {
        self.register_async_request_handler_with(handler, Vec::new())
    }

    /// Registers an asynchronous request handler with interceptor bindings,
    /// in declaration order.
    pub fn register_async_request_handler_with<R, H>(
        &mut self,
        handler: H,
        interceptors: Vec<InterceptorBinding>,
    ) -> Result<(), RegistryError>
    where
        R: Request,
        H: AsyncRequestHandler<R> + 'static,
    {
        let slot = RequestHandlerSlot::Async(Arc::new(TypedAsyncRequestHandler::new(handler)));
        self.insert_request::<R, H>(DispatchShape::Async, slot, interceptors)
    }

    /// Registers a synchronous notification handler. Any number of handlers
    /// may be registered for the same notification type.
    pub fn register_notification_handler<N, H>(&mut self, handler: H)
    where
        N: Notification,
        H: NotificationHandler<N> + 'static,
    {
        let slot = NotificationHandlerSlot::Sync(Arc::new(TypedNotificationHandler::new(handler)));
        self.insert_notification::<N, H>(DispatchShape::Sync, slot);
    }

    /// Registers an asynchronous notification handler. Any number of
    /// handlers may be registered for the same notification type.
    pub fn register_async_notification_handler<N, H>(&mut self, handler: H)
    where
        N: Notification,
        H: AsyncNotificationHandler<N> + 'static,
    {
        let slot =
            NotificationHandlerSlot::Async(Arc::new(TypedAsyncNotificationHandler::new(handler)));
        self.insert_notification::<N, H>(DispatchShape::Async, slot);
    }

    /// Builds the immutable registry.
    #[must_use]
    pub fn build(self) -> HandlerRegistry {
        HandlerRegistry {
            requests: self.requests,
            notifications: self.notifications,
        }
    }

    fn insert_request<R: Request, H>(
        &mut self,
        shape: DispatchShape,
        slot: RequestHandlerSlot,
        interceptors: Vec<InterceptorBinding>,
    ) -> Result<(), RegistryError> {
        let request = TypeDescriptor::of::<R>();
        if self.requests.contains_key(&request.id()) {
            return Err(RegistryError::AlreadyRegistered {
                request_type: request.name(),
            });
        }

        let response = TypeDescriptor::of::<R::Response>();
        let method = MethodDescriptor::new(
            std::any::type_name::<H>(),
            "handle",
            shape,
            request,
            response,
        );

        debug!(
            request_type = request.name(),
            handler = method.handler(),
            interceptors = interceptors.len(),
            "Registered request handler"
        );

        self.requests.insert(
            request.id(),
            Arc::new(RequestEntry {
                method,
                response_type: response,
                handler: slot,
                interceptors,
            }),
        );
        Ok(())
    }

    fn insert_notification<N: Notification, H>(
        &mut self,
        shape: DispatchShape,
        slot: NotificationHandlerSlot,
    ) {
        let notification = TypeDescriptor::of::<N>();
        let method = MethodDescriptor::new(
            std::any::type_name::<H>(),
            "handle",
            shape,
            notification,
            TypeDescriptor::of::<()>(),
        );

        debug!(
            notification_type = notification.name(),
            handler = method.handler(),
            "Registered notification handler"
        );

        self.notifications
            .entry(notification.id())
            .or_default()
            .push(Arc::new(NotificationEntry {
                method,
                handler: slot,
            }));
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}
