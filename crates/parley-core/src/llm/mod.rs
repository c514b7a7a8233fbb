//! Language model abstraction.

pub mod provider;
