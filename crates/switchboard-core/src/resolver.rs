//! # Resolver Port
//!
//! The dependency-resolution capability the dispatch engine consumes: given
//! a message type, produce the single handler entry registered for it, or
//! all entries registered for it. The engine only calls this port; how
//! instances come to exist is the resolver's business.
//!
//! [`HandlerRegistry`] is the in-memory implementation. A resolver may cache
//! instances across calls (the registry does: entries are shared `Arc`s);
//! the per-call [`DispatchPlan`](crate::plan::DispatchPlan) never does.

use std::any::TypeId;
use std::sync::Arc;

use crate::registry::{HandlerRegistry, NotificationEntry, RequestEntry};

/// Maps a message type to the handler instance(s) registered for it.
///
/// Implementations must be safe for concurrent lookups: asynchronous
/// notification fan-out may resolve from multiple logical flows at once.
pub trait Resolver: Send + Sync {
    /// The single handler entry for a request type, or `None`.
    ///
    /// Exactly-one-handler-per-request-type is the resolver's invariant to
    /// enforce; the registry does so at registration time.
    fn resolve_request_handler(&self, request: TypeId) -> Option<Arc<RequestEntry>>;

    /// All handler entries for a notification type, in registration order.
    /// May be empty.
    fn resolve_notification_handlers(&self, notification: TypeId) -> Vec<Arc<NotificationEntry>>;
}

impl Resolver for HandlerRegistry {
    fn resolve_request_handler(&self, request: TypeId) -> Option<Arc<RequestEntry>> {
        self.request_entry(request)
    }

    fn resolve_notification_handlers(&self, notification: TypeId) -> Vec<Arc<NotificationEntry>> {
        self.notification_entries(notification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{NotificationHandler, RequestHandler};
    use crate::registry::RegistryBuilder;
    use switchboard_types::{Notification, Request};

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

    #[test]
    fn test_registry_resolves_as_port() {
        let mut builder = RegistryBuilder::new();
        builder.register_request_handler::<Ping, _>(PingHandler).unwrap();
        builder.register_notification_handler::<Counted, _>(CountedHandler);

        let resolver: Arc<dyn Resolver> = Arc::new(builder.build());

        assert!(resolver.resolve_request_handler(TypeId::of::<Ping>()).is_some());
        assert!(resolver.resolve_request_handler(TypeId::of::<Counted>()).is_none());
        assert_eq!(
            resolver.resolve_notification_handlers(TypeId::of::<Counted>()).len(),
            1
        );
    }

    #[test]
    fn test_resolution_is_repeatable() {
        let mut builder = RegistryBuilder::new();
        builder.register_request_handler::<Ping, _>(PingHandler).unwrap();
        let resolver: Arc<dyn Resolver> = Arc::new(builder.build());

        let first = resolver.resolve_request_handler(TypeId::of::<Ping>()).unwrap();
        let second = resolver.resolve_request_handler(TypeId::of::<Ping>()).unwrap();

        // Same cached instance behind both lookups.
        assert!(Arc::ptr_eq(&first, &second));
    }
}
