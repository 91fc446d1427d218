pub mod config;
pub mod dsl;
pub mod error;
pub mod event;
pub mod traits;
pub mod types;

pub use config::AppConfig;
pub use dsl::WorkflowDsl;
pub use error::{Result, WeftError};
pub use event::{ChannelSink, EventBus, EventSink, WorkflowEvent};
pub use types::*;
