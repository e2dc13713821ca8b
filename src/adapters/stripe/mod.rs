//! Stripe gateway adapter.

mod events;
mod gateway;

pub use events::{parse_event, SignatureHeader};
pub use gateway::{StripeGateway, StripeGatewayConfig};
