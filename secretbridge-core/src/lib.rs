//! Core types for secretbridge
//!
//! This crate provides the boundary error type shared by the adaptor, the
//! emulator and the CLI host.

pub mod error;

pub use error::{BoxError, Error, Operation, Result};
