//! Dispatch failure taxonomy.
//!
//! Every failure originating inside a dispatch call is caught at the mediator
//! boundary and converted into a [`DispatchError`] carried by the response
//! envelope; the mediator's public operations never raise past their own
//! boundary. Handlers and interceptors fail with [`anyhow::Error`], which is
//! captured here together with the dispatch context.

use std::fmt;

use thiserror::Error;

use crate::message::DispatchShape;

/// The four failure categories a dispatch can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// No handler, or a handler of the wrong shape/result type, was found.
    Resolution,
    /// The handler itself raised.
    Execution,
    /// A before/after hook raised.
    Interception,
    /// One or more independent notification handlers failed.
    Aggregation,
}

/// Which hook pass an interceptor failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterceptorStage {
    /// The hook ran before the handler invocation.
    Before,
    /// The hook ran after the handler invocation.
    After,
}

impl fmt::Display for InterceptorStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterceptorStage::Before => write!(f, "before"),
            InterceptorStage::After => write!(f, "after"),
        }
    }
}

/// A failure captured during a single mediator dispatch.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No handler is registered for the request type.
    #[error("No handler registered for request type '{request_type}'")]
    HandlerNotFound {
        /// The request type that failed to resolve.
        request_type: &'static str,
    },

    /// A handler exists but was registered for the other dispatch shape.
    #[error(
        "Handler for '{request_type}' is registered as {found}, \
         but a {expected} dispatch was requested"
    )]
    HandlerShapeMismatch {
        /// The request type that failed to resolve.
        request_type: &'static str,
        /// The shape the operation asked for.
        expected: DispatchShape,
        /// The shape the registered handler has.
        found: DispatchShape,
    },

    /// The registered handler produces a different result type.
    #[error("Handler for '{request_type}' produces '{found}', expected '{expected}'")]
    ResponseTypeMismatch {
        /// The request type that failed to resolve.
        request_type: &'static str,
        /// The result type the caller expected.
        expected: &'static str,
        /// The result type the registered handler produces.
        found: &'static str,
    },

    /// The handler raised while servicing the message.
    #[error("Handler '{handler}' failed for '{message_type}': {source}")]
    HandlerFailed {
        /// The failing handler type's name.
        handler: &'static str,
        /// The request or notification type being serviced.
        message_type: &'static str,
        /// The handler's failure.
        #[source]
        source: anyhow::Error,
    },

    /// A before/after hook raised, aborting the remaining chain stages.
    #[error("Interceptor '{interceptor}' failed in {stage} hook: {source}")]
    InterceptorFailure {
        /// The failing interceptor type's name.
        interceptor: &'static str,
        /// Which hook pass raised.
        stage: InterceptorStage,
        /// The hook's failure.
        #[source]
        source: anyhow::Error,
    },

    /// One or more independent notification handlers failed during fan-out.
    #[error(transparent)]
    Aggregate(#[from] AggregateFailure),
}

impl DispatchError {
    /// Classifies the failure into its taxonomy category.
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            DispatchError::HandlerNotFound { .. }
            | DispatchError::HandlerShapeMismatch { .. }
            | DispatchError::ResponseTypeMismatch { .. } => FailureKind::Resolution,
            DispatchError::HandlerFailed { .. } => FailureKind::Execution,
            DispatchError::InterceptorFailure { .. } => FailureKind::Interception,
            DispatchError::Aggregate(_) => FailureKind::Aggregation,
        }
    }
}

/// An ordered collection of failures from independent notification handlers.
///
/// Fan-out always completes every handler regardless of individual failures;
/// the aggregate therefore reflects the full run, never a truncated one. The
/// wrapped failures are ordered by handler registration, independent of
/// completion order under concurrent dispatch.
#[derive(Debug, Error)]
#[error("{} of {} notification handler(s) failed", .failures.len(), .attempted)]
pub struct AggregateFailure {
    attempted: usize,
    failures: Vec<DispatchError>,
}

impl AggregateFailure {
    /// Wraps the captured failures of a completed fan-out.
    #[must_use]
    pub fn new(attempted: usize, failures: Vec<DispatchError>) -> Self {
        Self {
            attempted,
            failures,
        }
    }

    /// How many handlers the fan-out invoked in total.
    #[must_use]
    pub fn attempted(&self) -> usize {
        self.attempted
    }

    /// Number of captured failures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.failures.len()
    }

    /// True when no failure was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// The captured failures, in handler registration order.
    #[must_use]
    pub fn failures(&self) -> &[DispatchError] {
        &self.failures
    }

    /// Consumes the aggregate, yielding the captured failures.
    #[must_use]
    pub fn into_failures(self) -> Vec<DispatchError> {
        self.failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_failure_kind_classification() {
        let not_found = DispatchError::HandlerNotFound {
            request_type: "app::Ping",
        };
        assert_eq!(not_found.kind(), FailureKind::Resolution);

        let shape = DispatchError::HandlerShapeMismatch {
            request_type: "app::Ping",
            expected: DispatchShape::Sync,
            found: DispatchShape::Async,
        };
        assert_eq!(shape.kind(), FailureKind::Resolution);

        let failed = DispatchError::HandlerFailed {
            handler: "app::PingHandler",
            message_type: "app::Ping",
            source: anyhow!("boom"),
        };
        assert_eq!(failed.kind(), FailureKind::Execution);

        let hook = DispatchError::InterceptorFailure {
            interceptor: "app::Audit",
            stage: InterceptorStage::Before,
            source: anyhow!("denied"),
        };
        assert_eq!(hook.kind(), FailureKind::Interception);

        let aggregate = DispatchError::Aggregate(AggregateFailure::new(3, vec![failed_error()]));
        assert_eq!(aggregate.kind(), FailureKind::Aggregation);
    }

    #[test]
    fn test_display_carries_context() {
        let err = DispatchError::HandlerNotFound {
            request_type: "app::Ping",
        };
        assert!(err.to_string().contains("app::Ping"));

        let err = DispatchError::HandlerShapeMismatch {
            request_type: "app::Ping",
            expected: DispatchShape::Async,
            found: DispatchShape::Sync,
        };
        let rendered = err.to_string();
        assert!(rendered.contains("async"));
        assert!(rendered.contains("sync"));
    }

    #[test]
    fn test_aggregate_preserves_order() {
        let aggregate = AggregateFailure::new(
            3,
            vec![
                DispatchError::HandlerFailed {
                    handler: "app::First",
                    message_type: "app::Counted",
                    source: anyhow!("first"),
                },
                DispatchError::HandlerFailed {
                    handler: "app::Second",
                    message_type: "app::Counted",
                    source: anyhow!("second"),
                },
            ],
        );

        assert_eq!(aggregate.attempted(), 3);
        assert_eq!(aggregate.len(), 2);
        assert!(!aggregate.is_empty());
        assert!(aggregate.failures()[0].to_string().contains("First"));
        assert!(aggregate.failures()[1].to_string().contains("Second"));
        assert!(aggregate.to_string().contains("2 of 3"));
    }

    fn failed_error() -> DispatchError {
        DispatchError::HandlerFailed {
            handler: "app::Handler",
            message_type: "app::Counted",
            source: anyhow!("boom"),
        }
    }
}
