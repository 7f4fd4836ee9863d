//! Workflow execution - action graph ordering, condition evaluation,
//! concurrent action tasks

mod condition;
mod executor;
mod graph;

pub use condition::ConditionEvaluator;
pub use executor::WorkflowExecutor;
pub use graph::execution_order;
