//! eSewa gateway adapter.

mod gateway;

pub use gateway::{EsewaGateway, EsewaGatewayConfig};
