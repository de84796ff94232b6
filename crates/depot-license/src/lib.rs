//! Depot License Verification
//!
//! This crate provides the client for the license server that Depot
//! consults before activating a licensed setup.

pub mod client;
pub mod error;

pub use client::{LicenseClient, LicenseClientConfig};
pub use error::LicenseClientError;
