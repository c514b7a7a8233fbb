//! Session Store port, the in-memory store and the History Service.

pub mod memory;
pub mod repository;
pub mod service;
