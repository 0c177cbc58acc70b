//! Agon core: transport-agnostic chat payloads, prompt types, and the shared
//! error surface.
//!
//! This crate defines the wire-level contracts used by the gateway and by test
//! tooling. It carries no HTTP or runtime dependencies so the payload and
//! error rules can be reused without pulling in a server stack.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths must surface as `AgonError`/`Result`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;

/// Shared result type.
pub use error::{AgonError, Result};
