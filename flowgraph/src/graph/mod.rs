//! Graph engine: nodes, edges, conditional routing, retries, middleware, interrupts.

pub mod compile_error;
pub mod compiled;
pub mod conditional;
pub mod interrupt;
pub mod logging;
pub mod logging_middleware;
pub mod next;
pub mod node;
pub mod node_middleware;
pub mod retry;
pub mod state_graph;

pub use compile_error::CompilationError;
pub use compiled::CompiledStateGraph;
pub use conditional::{ConditionalRouter, ConditionalRouterFn, NextEntry};
pub use interrupt::{DefaultInterruptHandler, GraphInterrupt, Interrupt, InterruptHandler};
pub use logging_middleware::LoggingNodeMiddleware;
pub use next::Next;
pub use node::Node;
pub use node_middleware::{NodeMiddleware, NodeRunFn};
pub use retry::RetryPolicy;
pub use state_graph::{StateGraph, END, START};
