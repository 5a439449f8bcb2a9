//! Core domain concepts shared across all subdomains.
//!
//! - [`ids`]: session, user and suggestion identifiers
//! - [`error::DomainError`]: domain-level errors

pub mod error;
pub mod ids;
