//! Ordered backlog of calls awaiting an operator.

pub mod manager;

pub use manager::QueueManager;
