//! Message contracts and dispatch descriptors.
//!
//! A [`Request`] expects exactly one typed result from exactly one handler; a
//! [`Notification`] is broadcast to zero or more handlers and carries no
//! result. Both are plain application types tagged through a marker trait.
//!
//! [`TypeDescriptor`] and [`MethodDescriptor`] replace runtime reflection:
//! the identity of every message type and every concrete handler method is
//! captured explicitly at registration time.

use std::any::{Any, TypeId};
use std::fmt;

/// A message that expects exactly one typed result from exactly one handler.
///
/// The associated `Response` type is fixed by the request type itself, so a
/// caller cannot ask the mediator for a result type the handler does not
/// produce.
pub trait Request: Send + Sync + 'static {
    /// The result type this request expects from its handler.
    type Response: Send + Sync + 'static;
}

/// A message broadcast to zero or more independent handlers, with no result.
pub trait Notification: Send + Sync + 'static {}

/// Whether a handler was registered for synchronous or asynchronous dispatch.
///
/// The capability variants form a closed set: a handler is one shape or the
/// other, selected at registration time. A dispatch operation only resolves
/// handlers of its own shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DispatchShape {
    /// Runs entirely on the caller's thread with no suspension points.
    Sync,
    /// May suspend cooperatively at each await point.
    Async,
}

impl fmt::Display for DispatchShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchShape::Sync => write!(f, "sync"),
            DispatchShape::Async => write!(f, "async"),
        }
    }
}

/// Identity of a message type: its `TypeId` plus a human-readable name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeDescriptor {
    id: TypeId,
    name: &'static str,
}

impl TypeDescriptor {
    /// Builds the descriptor for `T`.
    #[must_use]
    pub fn of<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// The type's unique runtime identifier.
    #[must_use]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// The type's fully qualified name, for diagnostics.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Identity of the concrete handler method a dispatch resolved to.
///
/// Interceptors receive this descriptor in every hook, so they can tell which
/// implementing method they are wrapped around, not merely which contract the
/// handler satisfies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodDescriptor {
    handler: &'static str,
    method: &'static str,
    shape: DispatchShape,
    request: TypeDescriptor,
    response: TypeDescriptor,
}

impl MethodDescriptor {
    /// Builds a descriptor for a concrete handler method.
    #[must_use]
    pub fn new(
        handler: &'static str,
        method: &'static str,
        shape: DispatchShape,
        request: TypeDescriptor,
        response: TypeDescriptor,
    ) -> Self {
        Self {
            handler,
            method,
            shape,
            request,
            response,
        }
    }

    /// The handler type's fully qualified name.
    #[must_use]
    pub fn handler(&self) -> &'static str {
        self.handler
    }

    /// The handler method's name.
    #[must_use]
    pub fn method(&self) -> &'static str {
        self.method
    }

    /// Whether the method is the sync or async variant of its contract.
    #[must_use]
    pub fn shape(&self) -> DispatchShape {
        self.shape
    }

    /// Descriptor of the message type the method accepts.
    #[must_use]
    pub fn request(&self) -> TypeDescriptor {
        self.request
    }

    /// Descriptor of the result type the method produces.
    #[must_use]
    pub fn response(&self) -> TypeDescriptor {
        self.response
    }
}

impl fmt::Display for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}::{}({}) [{}]",
            self.handler, self.method, self.request, self.shape
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Ping;

    impl Request for Ping {
        type Response = String;
    }

    struct Counted;

    impl Notification for Counted {}

    #[test]
    fn test_type_descriptor_identity() {
        let a = TypeDescriptor::of::<Ping>();
        let b = TypeDescriptor::of::<Ping>();
        let c = TypeDescriptor::of::<Counted>();

        assert_eq!(a, b);
        assert_ne!(a.id(), c.id());
        assert!(a.name().ends_with("Ping"));
    }

    #[test]
    fn test_method_descriptor_display() {
        let method = MethodDescriptor::new(
            "app::PingHandler",
            "handle",
            DispatchShape::Sync,
            TypeDescriptor::of::<Ping>(),
            TypeDescriptor::of::<String>(),
        );

        let rendered = method.to_string();
        assert!(rendered.contains("app::PingHandler::handle"));
        assert!(rendered.contains("[sync]"));
    }

    #[test]
    fn test_dispatch_shape_display() {
        assert_eq!(DispatchShape::Sync.to_string(), "sync");
        assert_eq!(DispatchShape::Async.to_string(), "async");
    }
}
