//! Interactive CLI chat for Parley.
//!
//! Renders a [`parley_core::client::controller::ChatController`]: banner,
//! transcript bubbles, a thinking spinner while a message is in flight, and
//! slash commands for session management. Entry point:
//! `loop_runner::run_chat`.

pub mod banner;
pub mod commands;
pub mod input;
pub mod loop_runner;
pub mod renderer;
