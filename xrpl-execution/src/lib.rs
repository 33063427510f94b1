//! The transaction application engine.
//!
//! The single entry point is [`Engine::apply`]: it runs a signed
//! transaction through the three-phase pipeline (preflight, preclaim,
//! doApply) against an apply view, and returns the result code together
//! with the metadata describing every entry the transaction touched.
//!
//! Preflight is stateless; preclaim reads the base view only; doApply runs
//! inside a sandbox that is either applied whole (`tes`) or replaced by a
//! minimal fee-and-sequence commit (`tec`). No phase suspends; the engine
//! never awaits anything.

mod common;
mod engine;
mod error;
mod flow;
mod handlers;
mod signature_check;
mod types;

#[cfg(test)]
mod tests;

pub use engine::Engine;
pub use error::ExecutionError;
pub use types::{AffectedNode, ApplyResult, Metadata, NodeChange};
