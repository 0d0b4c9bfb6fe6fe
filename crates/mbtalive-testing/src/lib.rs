//! Testing utilities for MBTALive
//!
//! This crate provides testing tools including:
//! - An in-memory host with failure injection
//! - Scratch host directories with a bundled card in place

pub mod mock_host;
pub mod test_utils;

pub use mock_host::{MockHost, StaticPathRegistration, UnloadBehavior};
pub use test_utils::{HostFixture, TEST_BUNDLE};
