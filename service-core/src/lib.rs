//! service-core: Shared infrastructure for the payment microservices.
pub mod config;
pub mod error;
pub mod middleware;
pub mod observability;

