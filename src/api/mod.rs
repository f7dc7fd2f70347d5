//! API Module - Boundary Contract
//!
//! Request/response surface consumed by the external presentation and
//! assistant layers. Everything here is a thin mapping into `logic::*`.

pub mod commands;

pub use commands::FireService;
