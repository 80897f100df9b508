//! Core types shared across the service

pub mod error;

pub use error::*;
