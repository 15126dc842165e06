//! Shared test utilities for vidinsight integration tests.
//!
//! This module provides:
//! - `FakeClient`, a scripted analytics backend that counts its calls
//! - `FakeSurface`, a chart surface with per-chart capture behavior
//! - Builders for records, raw charts and server listings

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::{CaptureBehavior, FakeClient, FakeSurface};
