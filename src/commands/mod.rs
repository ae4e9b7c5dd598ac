//! One-shot command handlers.

pub mod plan;
