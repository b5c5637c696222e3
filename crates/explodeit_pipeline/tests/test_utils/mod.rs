//! Test utilities for ExplodeIt pipeline tests.
//!
//! This module provides a scripted backend and config helpers.

pub mod mock_backend;

#[allow(unused_imports)]
pub use mock_backend::{MockBackend, WRISTWATCH_PARTS, test_config, wristwatch_plan};
