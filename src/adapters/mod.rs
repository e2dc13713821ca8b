//! Adapters: concrete implementations of the ports.

pub mod esewa;
pub mod http;
pub mod khalti;
pub mod postgres;
pub mod stripe;
