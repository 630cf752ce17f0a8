//! Core business logic for ludus.

pub mod services;

pub use services::*;
