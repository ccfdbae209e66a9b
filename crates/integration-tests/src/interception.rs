//! Interceptor chain ordering and fail-fast semantics around request
//! dispatch.
