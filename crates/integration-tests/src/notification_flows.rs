//! Notification fan-out: isolation, aggregation, and concurrency.
