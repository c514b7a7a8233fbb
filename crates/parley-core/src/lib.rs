//! Business logic and repository trait definitions for Parley.
//!
//! This crate defines the "ports" (repository and collaborator traits) that
//! the infrastructure layer implements, the History Service, and the chat
//! client controller. It depends only on `parley-types` -- never on
//! `parley-infra` or any database/IO crate.

pub mod client;
pub mod history;
pub mod llm;
