//! Event envelope parsing for the orchestrator's chunked SSE stream

mod parser;
mod wire;

pub use parser::EventParser;
