//! Adapters implementing the ports against real services.

pub mod esi;
pub mod github;
