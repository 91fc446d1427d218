//! Workflow execution: graph validation, the variable store, node executors
//! and the engine that drives them.

pub mod context;
pub mod engine;
pub mod executor;
pub mod graph;
pub mod loader;
pub mod plugins;
pub mod service;
pub mod variables;

pub use context::ExecutionContext;
pub use engine::{ExecutionReport, WorkflowEngine};
pub use executor::{ExecutorRegistry, NodeExecutor, NodeValues};
pub use graph::{Graph, GraphNode, NodeKind};
pub use loader::FileDslLoader;
pub use plugins::AiToolsClient;
pub use service::WorkflowService;
pub use variables::VariableStore;
