//! Library exports for orderpulse, shared between the binary and tests.

pub mod config;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod price_client;
pub mod routes;
pub mod simulation;
pub mod startup;
pub mod state;
pub mod store;
pub mod utils;
