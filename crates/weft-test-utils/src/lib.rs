//! Shared mocks and fixtures for weft tests.

pub mod fixtures;
pub mod mocks;

pub use mocks::{MemoryDslLoader, MockChatModel, MockPluginInvoker, RecordingSink};
