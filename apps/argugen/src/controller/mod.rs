//! Shell layer: command parsing, event rendering, and dispatch onto the workflow controller.

pub mod commands;
pub mod events;
pub mod orchestration;
