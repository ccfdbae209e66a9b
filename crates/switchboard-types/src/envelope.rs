//! # `ResponseEnvelope` Result Wrapper
//!
//! The uniform wrapper returned by every mediator operation.
//!
//! ## Contract
//!
//! - **Single Outcome**: At most one of `data`/`failure` is set. When
//!   `failure` is set, `data` must be treated as undefined by the caller.
//! - **Correlation**: Every dispatch is stamped with a fresh correlation id
//!   so log lines and envelopes can be matched up.
//! - **No Silent Partial State**: Either the call fully succeeded and `data`
//!   holds the handler's return, or `failure` explains why not.

use uuid::Uuid;

use crate::errors::DispatchError;

/// The uniform success-or-failure result of one mediator dispatch.
///
/// Callers must inspect [`failure`](Self::failure) after every call; a
/// present failure means `data` is not meaningful. Notification dispatches
/// have no result payload, so their success envelopes carry neither data nor
/// failure.
#[derive(Debug)]
#[must_use = "the envelope's failure field must be inspected"]
pub struct ResponseEnvelope<T> {
    /// Correlates this envelope with the dispatch that produced it.
    correlation_id: Uuid,

    /// The handler's return value, when the call fully succeeded.
    data: Option<T>,

    /// The captured failure, when any stage of the dispatch raised.
    failure: Option<DispatchError>,
}

impl<T> ResponseEnvelope<T> {
    /// A fully successful dispatch carrying the handler's return value.
    pub fn ok(correlation_id: Uuid, data: T) -> Self {
        Self {
            correlation_id,
            data: Some(data),
            failure: None,
        }
    }

    /// A successful dispatch with no result payload (notifications).
    pub fn empty(correlation_id: Uuid) -> Self {
        Self {
            correlation_id,
            data: None,
            failure: None,
        }
    }

    /// A dispatch whose failure was captured at the mediator boundary.
    pub fn failed(correlation_id: Uuid, failure: DispatchError) -> Self {
        Self {
            correlation_id,
            data: None,
            failure: Some(failure),
        }
    }

    /// The dispatch's correlation id.
    #[must_use]
    pub fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    /// True when no failure was captured.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    /// The handler's return value, if the call succeeded with a payload.
    #[must_use]
    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    /// The captured failure, if any stage of the dispatch raised.
    #[must_use]
    pub fn failure(&self) -> Option<&DispatchError> {
        self.failure.as_ref()
    }

    /// Converts the envelope into a plain `Result`.
    ///
    /// Success without a payload (a notification envelope) yields
    /// `Ok(None)`.
    pub fn into_result(self) -> Result<Option<T>, DispatchError> {
        match self.failure {
            Some(failure) => Err(failure),
            None => Ok(self.data),
        }
    }

    /// Consumes the envelope, yielding the payload when present.
    #[must_use]
    pub fn into_data(self) -> Option<T> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_envelope() {
        let envelope = ResponseEnvelope::ok(Uuid::new_v4(), "pong".to_string());

        assert!(envelope.is_success());
        assert_eq!(envelope.data().map(String::as_str), Some("pong"));
        assert!(envelope.failure().is_none());
        assert_eq!(envelope.into_data(), Some("pong".to_string()));
    }

    #[test]
    fn test_empty_envelope() {
        let envelope = ResponseEnvelope::<()>::empty(Uuid::new_v4());

        assert!(envelope.is_success());
        assert!(envelope.data().is_none());
        assert!(matches!(envelope.into_result(), Ok(None)));
    }

    #[test]
    fn test_failed_envelope() {
        let envelope = ResponseEnvelope::<String>::failed(
            Uuid::new_v4(),
            DispatchError::HandlerNotFound {
                request_type: "app::Ping",
            },
        );

        assert!(!envelope.is_success());
        assert!(envelope.data().is_none());
        assert!(matches!(
            envelope.failure(),
            Some(DispatchError::HandlerNotFound { .. })
        ));
        assert!(envelope.into_result().is_err());
    }
}
