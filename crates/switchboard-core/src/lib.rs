//! # Switchboard Core - In-Process Typed Mediator
//!
//! A single entry point through which callers issue typed requests or
//! notifications without holding a direct reference to the component that
//! handles them.
//!
//! ## Dispatch Flow
//!
//! ```text
//! ┌──────────────┐                       ┌──────────────┐
//! │    Caller    │                       │   Handler    │
//! │              │  request(Ping)        │              │
//! │              │ ──────┐               │              │
//! └──────────────┘       │               └──────────────┘
//!                        ▼                       ↑
//!                  ┌──────────────┐             │
//!                  │   Mediator   │ ────────────┘
//!                  │              │   resolve → before hooks
//!                  └──────────────┘   → invoke → after hooks
//! ```
//!
//! ## Semantics
//!
//! - **Requests**: exactly one handler per request type; the interceptor
//!   chain wraps the invocation; the first failure at any stage aborts the
//!   remaining stages (fail-fast).
//! - **Notifications**: zero or more handlers; every handler runs regardless
//!   of sibling failures; failures are aggregated in registration order.
//! - **Envelopes**: every operation returns a
//!   [`ResponseEnvelope`](switchboard_types::ResponseEnvelope); no failure
//!   ever escapes the mediator's boundary.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod handler;
pub mod interceptor;
pub mod mediator;
pub mod plan;
pub mod registry;
pub mod resolver;

// Re-export main types
pub use handler::{
    AnyMessage, AsyncNotificationHandler, AsyncRequestHandler, NotificationHandler,
    RequestHandler,
};
pub use interceptor::{Interceptor, InterceptorBinding, TracingInterceptor};
pub use mediator::Mediator;
pub use plan::DispatchPlan;
pub use registry::{
    HandlerRegistry, NotificationEntry, RegistryBuilder, RegistryError, RequestEntry,
};
pub use resolver::Resolver;
