//! Khalti gateway adapter.

mod gateway;

pub use gateway::{KhaltiGateway, KhaltiGatewayConfig};
