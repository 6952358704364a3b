//! Quoter-api: HTTP API layer for the quoter
//!
//! Exposes swap quotes, tick array addressing and pool routing over JSON.

pub mod dto;
pub mod routes;
pub mod server;
pub mod state;

pub use server::*;
pub use state::AppState;
