//! Shared domain types for Parley.
//!
//! This crate contains the core domain types used across the Parley workspace:
//! chat sessions and messages, the History REST wire shapes, the
//! generative-language request/response shapes, user records, configuration,
//! and the error enums shared by every layer.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod api;
pub mod config;
pub mod error;
pub mod history;
pub mod llm;
pub mod user;
