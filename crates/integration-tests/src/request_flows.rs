//! Single-result request dispatch, sync and async.
