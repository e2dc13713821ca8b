//! Sahayog - Nonprofit Website Backend
//!
//! This crate implements the donation pipeline of the Sahayog Foundation
//! website: payment initiation across Stripe, Khalti, and eSewa, and
//! idempotent reconciliation of their asynchronous callbacks.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
