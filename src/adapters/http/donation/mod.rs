//! HTTP adapter for the donation module.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::{AdminUser, DonationAppState};
pub use routes::donation_router;
