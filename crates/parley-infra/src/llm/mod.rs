//! Language model provider implementations.

pub mod gemini;
