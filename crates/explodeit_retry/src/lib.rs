//! Retry wrapper for flaky provider calls.
//!
//! Every failure is retried the same way: after attempt `i` fails the
//! wrapper sleeps `base_delay * 2^i` and tries again, until the attempt
//! budget is spent. The last error is returned unchanged.
//!
//! ```no_run
//! use explodeit_retry::{RetryPolicy, call_with_retry};
//! use std::time::Duration;
//!
//! # async fn fetch() -> Result<String, std::io::Error> { Ok(String::new()) }
//! # async fn run() -> Result<(), std::io::Error> {
//! let policy = RetryPolicy::new(3, Duration::from_millis(1000));
//! let body = call_with_retry(&policy, "Fetch page", fetch).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod policy;

pub use policy::{RetryPolicy, call_with_retry};
