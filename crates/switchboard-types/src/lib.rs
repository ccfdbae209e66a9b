//! # Switchboard Types Crate
//!
//! This crate contains the contract types shared by the mediator engine and
//! its callers: the message marker traits, type/method descriptors, the
//! `ResponseEnvelope<T>` result wrapper, and the dispatch failure taxonomy.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: Every type that crosses the mediator
//!   boundary is defined here.
//! - **Envelope Integrity**: `ResponseEnvelope<T>` is the sole result wrapper
//!   for all mediator operations; at most one of `data`/`failure` is set.
//! - **No Runtime Reflection**: Handlers are located through explicit
//!   [`TypeDescriptor`]s captured at registration, never through type-name
//!   parsing or dynamic discovery.

pub mod envelope;
pub mod errors;
pub mod message;

pub use envelope::ResponseEnvelope;
pub use errors::{AggregateFailure, DispatchError, FailureKind, InterceptorStage};
pub use message::{DispatchShape, MethodDescriptor, Notification, Request, TypeDescriptor};
