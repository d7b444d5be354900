//! Shared types for the launchpad program.
//!
//! Errors, amount aliases and the fee split configuration used by both the
//! program and its integration tests.

#![no_std]

extern crate alloc;

pub mod errors;
pub mod types;

pub use errors::*;
pub use types::*;
