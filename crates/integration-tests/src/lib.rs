//! # Integration Tests Crate
//!
//! Cross-crate scenarios that verify the mediator facade, registry, dispatch
//! plan, and interceptor chain work together correctly.
//!
//! ## Structure
//!
//! ```text
//! integration-tests/
//! ├── src/
//! │   ├── lib.rs                 # This file
//! │   ├── fixtures.rs            # Shared messages, handlers, interceptors
//! │   ├── request_flows.rs       # Single-result dispatch, sync and async
//! │   ├── interception.rs        # Hook ordering and fail-fast semantics
//! │   └── notification_flows.rs  # Fan-out, isolation, failure aggregation
//! ```
//!
//! ## Covered Flows
//!
//! 1. **Request round-trips**: resolution → hooks → handler → envelope, on
//!    both the sync and async paths.
//! 2. **Fail-fast interception**: a failing stage aborts the remaining
//!    stages of a single-result dispatch.
//! 3. **Isolated fan-out**: a failing notification handler never prevents
//!    its siblings from running, on both paths, and the aggregate reports
//!    every captured failure in registration order.

pub mod fixtures;
pub mod interception;
pub mod notification_flows;
pub mod request_flows;
