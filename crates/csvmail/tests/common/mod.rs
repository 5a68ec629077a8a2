//! Shared test utilities for csvmail integration tests.
//!
//! This module provides:
//! - `TestHarness` for isolated test execution with temp directories
//! - `MessageBuilder` for creating RFC 5322 messages with attachments
//! - In-memory fakes of the mail server and object store

pub mod builders;
pub mod fakes;
pub mod harness;

pub use builders::*;
pub use fakes::*;
pub use harness::{TestHarness, BUCKET};
