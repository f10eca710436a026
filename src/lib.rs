// lib.rs
// Library root so integration tests can build the same router as the binary.

pub mod billing;
pub mod config;
pub mod models;
pub mod reports;
pub mod routes;
pub mod session;
pub mod state;
pub mod totp;

pub use routes::build_app;
