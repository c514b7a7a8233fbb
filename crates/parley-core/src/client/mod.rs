//! Chat client side: the History Service port, the session context, and the
//! controller that keeps the local transcript and the remote store in step.

pub mod backend;
pub mod context;
pub mod controller;
pub mod local;
pub mod transcript;
