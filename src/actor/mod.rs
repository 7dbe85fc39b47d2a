//! Shared utilities for the per-account worker tasks.

pub mod retry;

pub use retry::{RetryPolicy, with_retry};
